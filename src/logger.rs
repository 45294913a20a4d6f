use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

static COMIC_LOGGER: Lazy<ComicLogger> = Lazy::new(ComicLogger::new);

pub fn init() -> Result<(), String> {
    init_with_config(LoggerConfig::default())
}

pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let max_level = config.min_level.to_level_filter();
    COMIC_LOGGER.update_config(config);

    log::set_logger(&*COMIC_LOGGER).map_err(|e| format!("Failed to set logger: {:?}", e))?;
    log::set_max_level(max_level);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LogLevel::Trace => "🔍",
            LogLevel::Debug => "🐛",
            LogLevel::Info => "💡",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    fn to_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::Trace,
            LogLevel::Debug => Level::Debug,
            LogLevel::Info => Level::Info,
            LogLevel::Warn => Level::Warn,
            LogLevel::Error => Level::Error,
        }
    }

    fn to_level_filter(self) -> LevelFilter {
        self.to_level().to_level_filter()
    }

    fn from_level(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

/// One line of log output, also the shape of JSON lines.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl LogEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level: LogLevel::from_level(record.level()),
            target: record.target().to_string(),
            message: record.args().to_string(),
            file: record.file().map(String::from),
            line: record.line(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_target: bool,
    pub show_file_location: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_file_path: Option<String>,
    /// Records from these target prefixes are dropped below `Warn`.
    pub quiet_targets: Vec<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_emojis: true,
            show_target: true,
            show_file_location: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_file_path: None,
            quiet_targets: vec![
                "hyper".to_string(),
                "reqwest".to_string(),
                "mio".to_string(),
            ],
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_file_output(mut self, path: &str) -> Self {
        self.log_file_path = Some(path.to_string());
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn production() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: false,
            show_emojis: false,
            output_json: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            show_file_location: true,
            ..Default::default()
        }
    }

    /// `LOG_FORMAT=json` picks the production preset, anything else the
    /// development one. `LOG_LEVEL` and `LOG_FILE` override either.
    pub fn from_env() -> Self {
        let mut config = match env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") => Self::production(),
            _ => Self::development(),
        };
        if let Some(level) = env::var("LOG_LEVEL").ok().and_then(|v| LogLevel::parse(&v)) {
            config.min_level = level;
        }
        if let Ok(path) = env::var("LOG_FILE") {
            config.log_file_path = Some(path);
        }
        config
    }

    fn is_quiet(&self, target: &str, level: Level) -> bool {
        level > Level::Warn
            && self
                .quiet_targets
                .iter()
                .any(|prefix| target.starts_with(prefix.as_str()))
    }
}

pub struct ComicLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
}

impl ComicLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
        }
    }

    fn update_config(&self, new_config: LoggerConfig) {
        if let Some(path) = &new_config.log_file_path {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => {
                    if let Ok(mut log_file) = self.log_file.lock() {
                        *log_file = Some(file);
                    }
                }
                Err(e) => eprintln!("Could not open log file {}: {}", path, e),
            }
        }
        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
    }

    fn format_line(entry: &LogEntry, config: &LoggerConfig) -> String {
        let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
        let level = if config.show_emojis {
            format!("{} {}", entry.level.emoji(), entry.level.as_str())
        } else {
            entry.level.as_str().to_string()
        };

        let mut parts = Vec::with_capacity(4);
        if config.show_colors {
            parts.push(timestamp.bright_black().to_string());
            parts.push(format!("[{}]", level.color(entry.level.color()).bold()));
        } else {
            parts.push(timestamp);
            parts.push(format!("[{}]", level));
        }

        let mut message = String::new();
        if config.show_target && !entry.target.is_empty() {
            if config.show_colors {
                message.push_str(&format!("{}: ", entry.target.bright_blue()));
            } else {
                message.push_str(&format!("{}: ", entry.target));
            }
        }
        message.push_str(&entry.message);
        parts.push(message);

        if config.show_file_location {
            if let (Some(file), Some(line)) = (&entry.file, entry.line) {
                let location = format!("({}:{})", file, line);
                if config.show_colors {
                    parts.push(location.bright_black().to_string());
                } else {
                    parts.push(location);
                }
            }
        }

        parts.join(" ")
    }

    fn render(entry: &LogEntry, config: &LoggerConfig) -> String {
        if config.output_json {
            serde_json::to_string(entry).unwrap_or_default()
        } else {
            Self::format_line(entry, config)
        }
    }
}

impl log::Log for ComicLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => {
                metadata.level() <= config.min_level.to_level()
                    && !config.is_quiet(metadata.target(), metadata.level())
            }
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_record(record);

        let Ok(config) = self.config.lock() else {
            return;
        };
        let line = Self::render(&entry, &config);
        if entry.level >= LogLevel::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }

        if config.log_file_path.is_some() {
            let file_line = if config.output_json {
                line
            } else {
                Self::format_line(&entry, &config.clone().with_colors(false))
            };
            if let Ok(mut guard) = self.log_file.lock() {
                if let Some(file) = guard.as_mut() {
                    let _ = writeln!(file, "{}", file_line);
                }
            }
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Logs how long a stage took when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!("⏱️  {} finished in {}ms", self.name, self.elapsed().as_millis());
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_startup_info(app_name: &str, version: &str, host: &str, port: u16) {
    log::info!("🚀 Starting {} v{}", app_name, version);
    log::info!("🌐 Listening on http://{}:{}", host, port);
    log::info!("   POST /api/generate_plot   - comic script");
    log::info!("   POST /api/generate        - render one panel");
    log::info!("   GET  /api/generate?id=    - prediction status");
    log::info!("   POST /api/comic           - full comic");
    log::info!("   GET  /api/history         - generation history");
}

pub fn log_config_info(config: &crate::config::Config) {
    use crate::config::mask_secret;

    log::info!("⚙️  Configuration loaded:");
    log::info!(
        "   Chat model: {} at {} (key {})",
        config.openai.model,
        config.openai.base_url,
        config.openai.api_key.as_deref().map(mask_secret).unwrap_or_else(|| "❌".into())
    );
    log::info!(
        "   Image model version: {} (token {})",
        config.replicate.model_version,
        config
            .replicate
            .api_token
            .as_deref()
            .map(mask_secret)
            .unwrap_or_else(|| "❌".into())
    );
    log::info!(
        "   Polling every {}ms, giving up after {}s",
        config.replicate.poll_interval.as_millis(),
        config.replicate.timeout.as_secs()
    );
    log::info!("   History store: {}", config.history.base_url);
    log::info!(
        "   Story: {} panels about {}, captions for {}",
        config.story.panel_count,
        config.story.subject,
        config.story.persona
    );
}
