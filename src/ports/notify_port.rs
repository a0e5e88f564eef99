//! Notification port trait.

use crate::domain::error::TrailguardError;

/// Fire-and-forget text channel. Callers log failures and carry on.
pub trait NotifyPort {
    fn notify(&self, message: &str) -> Result<(), TrailguardError>;
}
