// ── Domain model ──

pub mod mac;
pub mod presence;
pub mod snapshot;

pub use mac::MacAddress;
pub use presence::{Device, Location, Resident};
pub use snapshot::{DeviceStatus, LocationStatus, PresenceSnapshot, ResidentStatus};

/// Lowercase ASCII slug: alphanumerics kept, every other run collapsed to `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("unnamed");
    }
    slug
}
