/// Structured logging for the flood forecast service
///
/// Provides context-rich logging tagged with the provider (or pipeline stage)
/// that produced the message, an optional step detail, timestamps, and
/// severity levels. Supports console output and an append-only log file.
///
/// Nothing is printed until `init_logger` has been called, so library users
/// and tests stay silent by default.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::ProviderId;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Provider(ProviderId),
    Model,
    System,
}

impl From<ProviderId> for DataSource {
    fn from(provider: ProviderId) -> Self {
        DataSource::Provider(provider)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Provider(provider) => write!(f, "{}", provider),
            DataSource::Model => write!(f, "MODEL"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - a precondition was never met (no URL, no nearby stations)
    Expected,
    /// Unexpected failure - indicates service degradation or an API change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, source: DataSource, detail: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let detail_part = detail.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!("{} {} {}{}: {}", timestamp, level, source, detail_part, message);

        // Console output goes to stderr so stdout stays clean for response bodies.
        if self.console_timestamps {
            eprintln!("{}", log_entry);
        } else {
            match level {
                LogLevel::Error => eprintln!("✗ {}{}: {}", source, detail_part, message),
                LogLevel::Warning => eprintln!("⚠ {}{}: {}", source, detail_part, message),
                LogLevel::Info => eprintln!("✓ {}{}: {}", source, detail_part, message),
                LogLevel::Debug => {}
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, source: DataSource, detail: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, source, detail, message);
        }
    }
}

/// Log a general informational message
pub fn info(source: impl Into<DataSource>, detail: Option<&str>, message: &str) {
    emit(LogLevel::Info, source.into(), detail, message);
}

/// Log a warning message
pub fn warn(source: impl Into<DataSource>, detail: Option<&str>, message: &str) {
    emit(LogLevel::Warning, source.into(), detail, message);
}

/// Log an error message
pub fn error(source: impl Into<DataSource>, detail: Option<&str>, message: &str) {
    emit(LogLevel::Error, source.into(), detail, message);
}

/// Log a debug message
pub fn debug(source: impl Into<DataSource>, detail: Option<&str>, message: &str) {
    emit(LogLevel::Debug, source.into(), detail, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a provider failure from its error text
pub fn classify_source_failure(error_message: &str) -> FailureType {
    if error_message.starts_with("No URL available")
        || error_message.contains("No stations within")
        || error_message.contains("No radar objects")
    {
        FailureType::Expected
    }
    // HTTP errors and parse errors point at service issues or API drift
    else if error_message.contains("HTTP error") || error_message.contains("Parse error") {
        FailureType::Unexpected
    } else {
        // Timeouts and connection resets can be either
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Source Logging
// ---------------------------------------------------------------------------

/// Log a successful fetch for a provider step
pub fn log_source_success(provider: ProviderId, step: Option<&str>) {
    info(provider, step, "Success");
}

/// Log a provider failure with automatic classification
pub fn log_source_failure(provider: ProviderId, step: Option<&str>, error_message: &str) {
    let failure_type = classify_source_failure(error_message);
    let message = format!("failed [{}]: {}", failure_type, error_message);

    match failure_type {
        FailureType::Expected => debug(provider, step, &message),
        FailureType::Unexpected => error(provider, step, &message),
        FailureType::Unknown => warn(provider, step, &message),
    }
}

/// Log a summary of one collection pass
pub fn log_collection_summary(active: usize, total: usize) {
    let message = format!("Collection complete: {}/{} sources active", active, total);

    if active == total {
        info(DataSource::System, None, &message);
    } else if active == 0 {
        error(DataSource::System, None, &message);
    } else {
        warn(DataSource::System, None, &message);
    }
}
