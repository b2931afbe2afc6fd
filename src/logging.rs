use std::io::stderr;
use std::io::Write;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use slog::o;
use slog::Drain;
use slog::FnValue;
use slog::IgnoreResult;
use slog::Logger;
use slog::OwnedKVList;
use slog::Record;
use slog_async::Async;
use slog_json::Json;

/// Drop records below the configured level.
#[derive(Debug, Clone)]
struct LevelFilter<D: Drain>(pub D, pub slog::Level);
impl<D: Drain> Drain for LevelFilter<D> {
    type Ok = ();
    type Err = D::Err;
    fn log(
        &self,
        record: &Record,
        logger_values: &OwnedKVList,
    ) -> std::result::Result<Self::Ok, Self::Err> {
        if record.level().is_at_least(self.1) {
            self.0.log(record, logger_values)?;
        }
        Ok(())
    }
}

/// Enumerate valid log verbosity levels.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
}

impl Default for LogLevel {
    #[cfg(debug_assertions)]
    fn default() -> LogLevel {
        LogLevel::Debug
    }

    #[cfg(not(debug_assertions))]
    fn default() -> LogLevel {
        LogLevel::Info
    }
}

impl From<LogLevel> for slog::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Critical => slog::Level::Critical,
            LogLevel::Error => slog::Level::Error,
            LogLevel::Warning => slog::Level::Warning,
            LogLevel::Info => slog::Level::Info,
            LogLevel::Debug => slog::Level::Debug,
        }
    }
}

/// Creates a JSON [`Logger`] writing to standard error.
///
/// Standard output is left free for command results.
/// Records are flushed from a background thread when `asynchronous` is set.
pub fn configure(level: LogLevel, asynchronous: bool) -> Logger {
    build_logger(stderr(), level, asynchronous)
}

fn build_logger<W>(writer: W, level: LogLevel, asynchronous: bool) -> Logger
where
    W: Write + Send + 'static,
{
    let drain = Json::new(writer)
        .set_newlines(true)
        .set_pretty(false)
        .add_default_keys()
        .build();
    let drain = Mutex::new(drain).map(IgnoreResult::new);
    let drain = LevelFilter(drain, level.into());
    let values = o!("module" => FnValue(|rinfo: &Record| rinfo.module()));
    match asynchronous {
        true => Logger::root(Async::new(drain).build().ignore_res(), values),
        false => Logger::root(drain, values),
    }
}
