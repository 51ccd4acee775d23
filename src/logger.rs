//! `log` sink writing to the browser console.

use std::sync::Once;

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsValue;

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;
static INSTALL: Once = Once::new();

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&record.args().to_string());
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Install the console sink (first call only) and set the level.
pub fn init(level: LevelFilter) {
    INSTALL.call_once(|| {
        // Fails only when the embedding crate installed its own logger.
        let _ = log::set_logger(&LOGGER);
    });
    log::set_max_level(level);
}

/// Install the sink at `info` unless logging was already initialized.
pub fn ensure_installed() {
    if !INSTALL.is_completed() {
        init(LevelFilter::Info);
    }
}

/// Parse a level name; unknown names mean `info`.
pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}
