//! Test-only logger: forwards to `env_logger` and keeps each thread's
//! messages so tests can assert on what was logged.

use log::{LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::OnceLock;

thread_local! {
    static CAPTURED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger {
    inner: env_logger::Logger,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED.with(|lines| lines.borrow_mut().push(record.args().to_string()));
        if self.inner.enabled(record.metadata()) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

static LOGGER: OnceLock<CaptureLogger> = OnceLock::new();

pub(crate) fn init_logging() {
    let logger = LOGGER.get_or_init(|| CaptureLogger {
        inner: env_logger::Builder::from_default_env().is_test(true).build(),
    });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
}

/// Messages logged on the current thread since the last call
pub(crate) fn take_logs() -> Vec<String> {
    CAPTURED.with(|lines| std::mem::take(&mut *lines.borrow_mut()))
}
