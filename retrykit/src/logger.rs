//! Plain-text sink for retry notices.
//!
//! The proxy reports each retry that is about to back off as a single
//! informational line. Structured diagnostics go through `tracing`
//! independently of this sink.

use tracing::info;

/// Receives informational retry messages.
pub trait RetryLogger {
    /// Log an informational message.
    fn info(&self, message: &str);
}

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl RetryLogger for NullLogger {
    fn info(&self, _message: &str) {}
}

/// Logger that forwards messages to `tracing` at INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl RetryLogger for TracingLogger {
    fn info(&self, message: &str) {
        info!(target: "retrykit", "{}", message);
    }
}

impl<F> RetryLogger for F
where
    F: Fn(&str),
{
    fn info(&self, message: &str) {
        self(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::Write;
    use std::sync::Arc;

    #[test]
    fn test_closure_logger() {
        let lines = Mutex::new(Vec::new());
        let logger = |message: &str| lines.lock().push(message.to_string());

        logger.info("first");
        RetryLogger::info(&logger, "second");

        assert_eq!(*lines.lock(), vec!["first", "second"]);
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_logger() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            TracingLogger.info("boom. Retrying... [1x]");
        });

        let output = String::from_utf8(capture.0.lock().clone()).unwrap();
        assert!(output.contains("INFO"));
        assert!(output.contains("boom. Retrying... [1x]"));
    }

    #[test]
    fn test_null_logger() {
        NullLogger.info("ignored");
    }
}
