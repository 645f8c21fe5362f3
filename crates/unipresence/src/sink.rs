//! Logging presence sink.
//!
//! Stands in for a home-automation bridge: every transition is logged at
//! info, unchanged state at debug.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use unipresence_core::{CoreError, PresenceSink, SinkUpdate};

#[derive(Debug, Default)]
pub struct LogSink {
    last: Mutex<HashMap<String, bool>>,
}

impl PresenceSink for LogSink {
    fn notify(&self, update: &SinkUpdate) -> Result<(), CoreError> {
        let previous = self
            .last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(update.id.clone(), update.occupied);

        if previous == Some(update.occupied) {
            debug!(
                id = %update.id,
                name = %update.display_name,
                occupied = update.occupied,
                summary = %update.summary,
                "presence unchanged"
            );
        } else {
            info!(
                id = %update.id,
                name = %update.display_name,
                occupied = update.occupied,
                summary = %update.summary,
                "presence changed"
            );
        }
        Ok(())
    }
}
