use log::Level;

/// Log target used by the default sink
pub const LOG_TARGET: &str = "floatplane.player";

/// Receives the controller's diagnostic messages
///
/// Injected into the controller so hosts can route diagnostics without a
/// global logger. `LogSink` forwards to the `log` facade.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.record(Level::Debug, message);
    }

    fn warn(&self, message: &str) {
        self.record(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }
}

/// Forwards diagnostics to the `log` facade under a fixed target
#[derive(Debug, Clone)]
pub struct LogSink {
    target: &'static str,
}

impl LogSink {
    pub fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(LOG_TARGET)
    }
}

impl DiagnosticSink for LogSink {
    fn record(&self, level: Level, message: &str) {
        log::log!(target: self.target, level, "{}", message);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every record for assertions
    #[derive(Default)]
    pub struct CollectingSink {
        pub records: Mutex<Vec<(Level, String)>>,
    }

    impl CollectingSink {
        pub fn count(&self, level: Level) -> usize {
            self.records.lock().unwrap().iter().filter(|(l, _)| *l == level).count()
        }
    }

    impl DiagnosticSink for CollectingSink {
        fn record(&self, level: Level, message: &str) {
            self.records.lock().unwrap().push((level, message.to_string()));
        }
    }
}
