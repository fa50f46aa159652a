//! logger initialisation shared by the command-line driver and by anyone embedding the crate
use chrono::Local;
use simplelog::*;
use std::fs::File;
use std::io;
use std::path::PathBuf;

/// what the `logging` section of a task file configures
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    /// prefix of the log file; the file is named `<prefix>_<date_and_time>.log`
    pub file: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: LevelFilter::Info,
            file: None,
        }
    }
}

/// "debug" | "info" | "warn" | "error" | "off", case-insensitive
pub fn level_from_str(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        "off" | "none" => Some(LevelFilter::Off),
        _ => None,
    }
}

pub fn log_file_name(prefix: &str) -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("{}_{}.log", prefix, date_and_time)
}

/// Installs a terminal logger, plus a file logger when `settings.file` is set.
/// Returns the path of the log file if one was created. A logger that is already
/// installed is reported on stderr and left in place.
pub fn init_logger(settings: &LoggingSettings) -> io::Result<Option<PathBuf>> {
    if settings.level == LevelFilter::Off {
        return Ok(None);
    }
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        settings.level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    let mut path = None;
    if let Some(prefix) = &settings.file {
        let name = log_file_name(prefix);
        let file = File::create(&name)?;
        loggers.push(WriteLogger::new(settings.level, Config::default(), file));
        path = Some(PathBuf::from(name));
    }
    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("logger already initialised, keeping it: {}", e);
        return Ok(None);
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        assert_eq!(level_from_str("debug"), Some(LevelFilter::Debug));
        assert_eq!(level_from_str(" WARN "), Some(LevelFilter::Warn));
        assert_eq!(level_from_str("off"), Some(LevelFilter::Off));
        assert_eq!(level_from_str("verbose"), None);
    }

    #[test]
    fn test_log_file_name() {
        let name = log_file_name("green");
        assert!(name.starts_with("green_"));
        assert!(name.ends_with(".log"));
        // green_YYYY-mm-dd_HH-MM-SS.log
        assert_eq!(name.len(), "green_".len() + 19 + ".log".len());
    }

    #[test]
    fn test_repeated_init_is_not_fatal() {
        let settings = LoggingSettings {
            level: LevelFilter::Warn,
            file: None,
        };
        assert!(init_logger(&settings).is_ok());
        assert!(init_logger(&settings).is_ok());
        assert_eq!(init_logger(&LoggingSettings { level: LevelFilter::Off, file: None }).unwrap(), None);
    }
}
