//! Correlation id generation

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

/// Generates `<prefix>.<unix-millis>.<counter>` ids.
///
/// The counter alone keeps ids unique within a session, the timestamp and the installation
/// prefix keep them apart across reloads and across extensions sharing a page.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), counter: AtomicU64::new(0) }
    }

    /// Returns the next id
    pub fn next_id(&self) -> String {
        let count = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        format!("{}.{now}.{count}", self.prefix)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new("")
    }
}
