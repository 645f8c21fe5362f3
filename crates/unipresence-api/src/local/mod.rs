// Local controller client modules
//
// Talks to gateway-OS consoles (UDM, UCG, UX) through their
// `/proxy/network` path and to classic Network Application installs at
// the root. Which one answers is discovered per session.

pub mod client;
pub mod clients;
pub mod devices;
pub mod discovery;
pub mod system;

pub use client::LocalClient;
pub use discovery::{BackendProfile, Endpoint, Resource};
