//! Logging initialisation built on flexi_logger
//!
//! Library code logs through the `log` facade only. Applications embedding
//! the queue call [`init_logging`] once at startup to install a
//! flexi_logger backend with one of the supported record formats.

use colored::Colorize;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use strum_macros::{Display, EnumString};

// Global logger handle, kept so the level can be adjusted at runtime
static LOGGER_HANDLE: OnceLock<Mutex<flexi_logger::LoggerHandle>> = OnceLock::new();

/// Record layout for console and file output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// "timestamp LVL message"
    #[default]
    Text,
    /// "timestamp LVL message (module/path.rs:line)"
    Ext,
    /// One compact JSON object per record
    Json,
}

/// Initialise the global logger
///
/// `log_level` accepts any flexi_logger spec string ("debug",
/// "info, eventq::queue=trace", ...) and defaults to "info".
pub fn init_logging(
    log_level: Option<&str>,
    log_format: LogFormat,
    log_file: Option<&Path>,
    color_enabled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use flexi_logger::{FileSpec, Logger};

    let mut logger = Logger::try_with_str(log_level.unwrap_or("info"))?;

    logger = match (log_format, color_enabled) {
        (LogFormat::Json, _) => logger.format(json_format),
        (LogFormat::Ext, true) => logger.format(extended_color_format),
        (LogFormat::Ext, false) => logger.format(extended_format),
        (LogFormat::Text, true) => logger.format(simple_color_format),
        (LogFormat::Text, false) => logger.format(simple_format),
    };

    if let Some(file_path) = log_file {
        logger = logger.log_to_file(FileSpec::try_from(file_path)?);
    }

    let handle = logger.start()?;
    let _ = LOGGER_HANDLE.set(Mutex::new(handle));

    Ok(())
}

/// Temporarily override the log level spec
///
/// Format and output target are fixed at initialisation; only the level
/// spec can change at runtime. Undo with [`reset_log_level`].
pub fn set_log_level(log_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let handle_mutex = LOGGER_HANDLE
        .get()
        .ok_or("Logger handle not initialised. Call init_logging first.")?;
    let mut handle = handle_mutex
        .lock()
        .map_err(|_| "Could not acquire logger handle lock")?;
    handle.parse_and_push_temp_spec(log_level)?;
    Ok(())
}

/// Revert the most recent [`set_log_level`] override
pub fn reset_log_level() {
    if let Some(handle_mutex) = LOGGER_HANDLE.get() {
        if let Ok(mut handle) = handle_mutex.lock() {
            handle.pop_temp_spec();
        }
    }
}

fn level_abbr(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

fn simple_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args()
    )
}

fn simple_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        colored_level(record.level()),
        record.args()
    )
}

fn extended_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    // Format: "YYYY-MM-DD HH:mm:ss.fff INF message (queue/base.rs:42)"
    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args(),
        format_target_as_path(record.target(), record.line())
    )
}

fn extended_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        colored_level(record.level()),
        record.args(),
        format_target_as_path(record.target(), record.line()).dimmed()
    )
}

fn json_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use serde_json::json;

    let json_obj = json!({
        "timestamp": now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "level": level_abbr(record.level()),
        "message": record.args().to_string(),
        "target": format_target_as_path(record.target(), record.line())
    });

    match serde_json::to_string(&json_obj) {
        Ok(json_string) => w.write_all(json_string.as_bytes()),
        Err(_) => w.write_all(b"{\"error\":\"Failed to serialize log message\"}"),
    }
}

fn colored_level(level: log::Level) -> colored::ColoredString {
    let abbr = level_abbr(level);
    match level {
        log::Level::Error => abbr.red().bold(),
        log::Level::Warn => abbr.yellow(),
        log::Level::Info => abbr.green(),
        log::Level::Debug => abbr.blue(),
        log::Level::Trace => abbr.magenta(),
    }
}

// eventq::queue::base -> queue/base.rs:42
fn format_target_as_path(target: &str, line: Option<u32>) -> String {
    let path_like = match target.strip_prefix("eventq::") {
        Some(module_path) => module_path.replace("::", "/") + ".rs",
        None => target.replace("::", "/"),
    };

    match line {
        Some(line_num) => format!("{}:{}", path_like, line_num),
        None => path_like,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexi_logger::DeferredNow;
    use serial_test::serial;
    use std::str::FromStr;

    fn render(
        format: fn(
            &mut dyn std::io::Write,
            &mut DeferredNow,
            &log::Record,
        ) -> Result<(), std::io::Error>,
        target: &str,
        level: log::Level,
    ) -> String {
        let mut buffer = Vec::new();
        let mut now = DeferredNow::new();
        let record = log::Record::builder()
            .level(level)
            .target(target)
            .line(Some(42))
            .args(format_args!("Queue 'flows' is full"))
            .build();

        format(&mut buffer, &mut now, &record).expect("Format function should succeed");
        String::from_utf8(buffer).expect("Output should be valid UTF-8")
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_str("text").unwrap(), LogFormat::Text);
        assert_eq!(LogFormat::from_str("EXT").unwrap(), LogFormat::Ext);
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("yaml").is_err());
        assert_eq!(LogFormat::default().to_string(), "text");
    }

    #[test]
    fn test_format_target_as_path() {
        assert_eq!(
            format_target_as_path("eventq::queue::base", Some(42)),
            "queue/base.rs:42"
        );
        assert_eq!(format_target_as_path("tokio::runtime", None), "tokio/runtime");
    }

    #[test]
    fn test_simple_format_layout() {
        let output = render(simple_format, "eventq::queue::base", log::Level::Warn);

        assert!(
            output.contains("WRN Queue 'flows' is full"),
            "Should have 'WRN message' structure, got: {}",
            output
        );
        assert!(!output.contains("queue/base.rs"), "Text format has no target");
    }

    #[test]
    fn test_extended_format_includes_target() {
        let output = render(extended_format, "eventq::queue::base", log::Level::Info);

        assert!(output.contains("INF Queue 'flows' is full"));
        assert!(
            output.ends_with("(queue/base.rs:42)"),
            "Should end with target path, got: {}",
            output
        );
    }

    #[test]
    fn test_json_format_is_valid_json() {
        let output = render(json_format, "eventq::queue::channel", log::Level::Debug);

        let parsed: serde_json::Value =
            serde_json::from_str(&output).expect("JSON format should produce valid JSON");
        assert_eq!(parsed["level"], "DBG");
        assert_eq!(parsed["message"], "Queue 'flows' is full");
        assert_eq!(parsed["target"], "queue/channel.rs:42");
    }

    #[test]
    #[serial]
    fn test_init_logging_to_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("eventq.log");

        match init_logging(Some("debug"), LogFormat::Ext, Some(log_path.as_path()), false) {
            Ok(()) => {
                log::info!("logging initialised");
                assert!(set_log_level("trace").is_ok());
                reset_log_level();
            }
            Err(e) => {
                // Another test already installed a global logger
                assert!(
                    e.to_string().contains("already initialized")
                        || e.to_string().contains("Logger initialization failed"),
                    "Expected initialization error, got: {}",
                    e
                );
            }
        }
    }
}
