use thiserror::Error;
use tracing::{debug, info};

use crate::error::PayrollError;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("worker has no registered address")]
    NoAddress,

    #[error("unable to prepare notification: {0}")]
    Prepare(#[from] PayrollError),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Delivers rendered payroll summaries to workers
pub trait Notifier: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Writes notifications to the trace log instead of delivering them
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(to, subject, "Payroll notification");
        debug!(to, body, "Payroll notification body");

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Keeps everything it was asked to send
    #[derive(Debug, Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) sent: Mutex<Vec<(String, String, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push((to.to_owned(), subject.to_owned(), body.to_owned()));
            Ok(())
        }
    }

    pub(crate) struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn send(&self, _: &str, _: &str, _: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("mailbox unavailable".to_owned()))
        }
    }

    #[test]
    fn test_log_notifier_accepts() {
        assert!(LogNotifier.send("agent@example.com", "subject", "body").is_ok());
    }
}
