//! Layered configuration for menu-mailer.
//!
//! Settings start from built-in defaults, are optionally read from a TOML
//! file, and are then overridden field by field from environment variables
//! (`MENU_IMAGE_DIR`, `SEND_HOUR`, `SMTP_HOST`, ...). The SMTP password is
//! never stored in the file: `smtp.password_env` names the variable that
//! holds it and the value is resolved into [`SmtpConfig::password`].

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveTime;
use chrono_tz::Tz;
use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

/// Upper bound for the retry window: one day.
const MAX_RETRY_WINDOW_MINUTES: u64 = 24 * 60;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Menu image directory settings.
    pub menu: MenuConfig,

    /// Daily send time and retry policy.
    pub schedule: ScheduleConfig,

    /// SMTP server settings.
    pub smtp: SmtpConfig,

    /// Sender, recipients and viewer link.
    pub mail: MailConfig,

    /// ntfy notification settings.
    pub notifications: NotificationConfig,

    /// Status server settings.
    pub web: WebConfig,

    /// Logging settings.
    pub daemon: DaemonConfig,
}

// ---------------------------------------------------------------------------
// Menu images
// ---------------------------------------------------------------------------

/// Where menu images are found and how often the scheduler looks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Directory containing `YYYY-MM-DD_<Wkd>.png` files.
    pub image_dir: PathBuf,

    /// Seconds between scheduler evaluations (default 300).
    pub scan_interval_secs: u64,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("/mnt/menu-images"),
            scan_interval_secs: 300,
        }
    }
}

impl MenuConfig {
    pub fn scan_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.scan_interval_secs)
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Daily send time, timezone and retry window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub send_hour: u32,
    pub send_minute: u32,

    /// IANA timezone name used to decide "today" and the send time.
    pub timezone: String,

    /// Skip automatic sends on Saturday and Sunday.
    pub skip_weekends: bool,

    /// Minutes after the send time during which failures are retried.
    pub retry_window_minutes: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            send_hour: 7,
            send_minute: 0,
            timezone: "Europe/London".into(),
            skip_weekends: true,
            retry_window_minutes: 60,
        }
    }
}

impl ScheduleConfig {
    /// Parse the configured timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "schedule.timezone".into(),
                detail: e.to_string(),
            })
    }

    /// The local send time.
    pub fn send_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::from_hms_opt(self.send_hour, self.send_minute, 0).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "schedule.send_hour".into(),
                detail: format!(
                    "{:02}:{:02} is not a valid time of day",
                    self.send_hour, self.send_minute
                ),
            }
        })
    }

    /// The retry window, rejected when longer than a day.
    pub fn retry_window(&self) -> Result<chrono::Duration, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            field: "schedule.retry_window_minutes".into(),
            detail: format!(
                "{} is out of range (0-{})",
                self.retry_window_minutes, MAX_RETRY_WINDOW_MINUTES
            ),
        };
        if self.retry_window_minutes > MAX_RETRY_WINDOW_MINUTES {
            return Err(invalid());
        }
        i64::try_from(self.retry_window_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .ok_or_else(invalid)
    }
}

// ---------------------------------------------------------------------------
// SMTP
// ---------------------------------------------------------------------------

/// SMTP server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,

    /// Login user. Empty means no authentication.
    pub username: String,

    /// Environment variable holding the SMTP password.
    pub password_env: String,

    /// Use TLS: implicit TLS on port 465, STARTTLS otherwise.
    pub use_tls: bool,

    /// Resolved password (populated from `password_env`).
    #[serde(skip)]
    pub password: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            username: String::new(),
            password_env: "SMTP_PASSWORD".into(),
            use_tls: true,
            password: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Mail
// ---------------------------------------------------------------------------

/// Sender, recipients and the calendar viewer link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub from: String,
    pub to: Vec<String>,

    /// Base URL of the menu calendar viewer. Empty disables links.
    pub viewer_base_url: String,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// ntfy notification settings. Both fields must be set to enable it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub ntfy_base_url: String,
    pub ntfy_topic: String,
}

impl NotificationConfig {
    pub fn is_enabled(&self) -> bool {
        !self.ntfy_base_url.trim().is_empty() && !self.ntfy_topic.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Web
// ---------------------------------------------------------------------------

/// Status server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind_host: String,
    pub bind_port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".into(),
            bind_port: 8082,
        }
    }
}

impl WebConfig {
    /// `host:port` string suitable for binding.
    pub fn listen_addr(&self) -> String {
        if self.bind_host.contains(':') && !self.bind_host.starts_with('[') {
            format!("[{}]:{}", self.bind_host, self.bind_port)
        } else {
            format!("{}:{}", self.bind_host, self.bind_port)
        }
    }
}

// ---------------------------------------------------------------------------
// Daemon
// ---------------------------------------------------------------------------

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            log_format: LogFormat::Text,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// Missing sections and fields fall back to their defaults. This does
    /// **not** apply environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Override fields from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    ///
    /// Empty values are treated as unset, except for `MAIL_TO` and the
    /// URL / credential fields where empty is meaningful.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string());
        let non_empty = |name: &str| get(name).filter(|v| !v.is_empty());

        if let Some(v) = non_empty("MENU_IMAGE_DIR") {
            self.menu.image_dir = PathBuf::from(v);
        }
        if let Some(v) = non_empty("SCAN_INTERVAL_SECONDS") {
            self.menu.scan_interval_secs = parse_var("SCAN_INTERVAL_SECONDS", &v)?;
        }

        if let Some(v) = non_empty("SEND_HOUR") {
            self.schedule.send_hour = parse_var("SEND_HOUR", &v)?;
        }
        if let Some(v) = non_empty("SEND_MINUTE") {
            self.schedule.send_minute = parse_var("SEND_MINUTE", &v)?;
        }
        if let Some(v) = non_empty("TIMEZONE") {
            self.schedule.timezone = v;
        }
        if let Some(v) = non_empty("SKIP_WEEKENDS") {
            self.schedule.skip_weekends = parse_bool("SKIP_WEEKENDS", &v)?;
        }
        if let Some(v) = non_empty("RETRY_WINDOW_MINUTES") {
            self.schedule.retry_window_minutes = parse_var("RETRY_WINDOW_MINUTES", &v)?;
        }

        if let Some(v) = get("SMTP_HOST") {
            self.smtp.host = v;
        }
        if let Some(v) = non_empty("SMTP_PORT") {
            self.smtp.port = parse_var("SMTP_PORT", &v)?;
        }
        if let Some(v) = get("SMTP_USERNAME") {
            self.smtp.username = v;
        }
        if let Some(v) = non_empty("SMTP_USE_TLS") {
            self.smtp.use_tls = parse_bool("SMTP_USE_TLS", &v)?;
        }
        // Passwords may legitimately carry surrounding whitespace.
        self.smtp.password = lookup(&self.smtp.password_env).filter(|v| !v.is_empty());

        if let Some(v) = get("MAIL_FROM") {
            self.mail.from = v;
        }
        if let Some(v) = get("MAIL_TO") {
            self.mail.to = split_recipients(&v);
        }
        if let Some(v) = get("MENU_WEB_BASE_URL") {
            self.mail.viewer_base_url = v;
        }

        if let Some(v) = get("NTFY_BASE_URL") {
            self.notifications.ntfy_base_url = v;
        }
        if let Some(v) = get("NTFY_TOPIC") {
            self.notifications.ntfy_topic = v;
        }

        if let Some(v) = non_empty("BIND_HOST") {
            self.web.bind_host = v;
        }
        if let Some(v) = non_empty("BIND_PORT") {
            self.web.bind_port = parse_var("BIND_PORT", &v)?;
        }

        if let Some(v) = non_empty("LOG_LEVEL") {
            self.daemon.log_level = v.to_ascii_lowercase();
        }
        if let Some(v) = non_empty("LOG_FORMAT") {
            self.daemon.log_format = v.parse().map_err(|detail| ConfigError::InvalidEnvVar {
                var: "LOG_FORMAT".into(),
                value: v.clone(),
                detail,
            })?;
        }

        debug!("environment overrides applied");
        Ok(())
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.menu.scan_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "menu.scan_interval_secs".into(),
                detail: "scan interval must be > 0".into(),
            });
        }
        if self.schedule.send_hour > 23 {
            return Err(ConfigError::InvalidValue {
                field: "schedule.send_hour".into(),
                detail: format!("{} is not an hour of the day (0-23)", self.schedule.send_hour),
            });
        }
        if self.schedule.send_minute > 59 {
            return Err(ConfigError::InvalidValue {
                field: "schedule.send_minute".into(),
                detail: format!("{} is not a minute (0-59)", self.schedule.send_minute),
            });
        }
        self.schedule.tz()?;
        self.schedule.retry_window()?;

        if self.smtp.host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "smtp.host".into(),
                detail: "SMTP host must not be empty".into(),
            });
        }
        if !self.smtp.username.is_empty() && self.smtp.password.is_none() {
            warn!(
                env_name = %self.smtp.password_env,
                "SMTP username is set but the password is empty"
            );
        }

        if self.mail.from.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "mail.from".into(),
                detail: "sender address must not be empty".into(),
            });
        }
        self.mail
            .from
            .parse::<Mailbox>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "mail.from".into(),
                detail: format!("'{}': {}", self.mail.from, e),
            })?;

        if self.mail.to.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "mail.to".into(),
                detail: "at least one recipient is required".into(),
            });
        }
        for addr in &self.mail.to {
            addr.parse::<Mailbox>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: "mail.to".into(),
                    detail: format!("'{}': {}", addr, e),
                })?;
        }

        self.web
            .listen_addr()
            .parse::<std::net::SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "web.bind_host".into(),
                detail: format!("'{}': {}", self.web.listen_addr(), e),
            })?;

        Ok(())
    }

    /// Convenience: defaults or file, then environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.into(),
        value: value.into(),
        detail: e.to_string(),
    })
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvVar {
            var: var.into(),
            value: value.into(),
            detail: "expected a boolean (true/false, 1/0, yes/no, on/off)".into(),
        }),
    }
}

/// Split a comma-separated recipient list, dropping blanks.
pub fn split_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[menu]
image_dir = "/srv/menus"
scan_interval_secs = 120

[schedule]
send_hour = 6
send_minute = 45
timezone = "Europe/Paris"
skip_weekends = false
retry_window_minutes = 90

[smtp]
host = "smtp.example.com"
port = 465
username = "mailer"
password_env = "MENU_SMTP_PW"
use_tls = true

[mail]
from = "Menus <menus@example.com>"
to = ["parent1@example.com", "parent2@example.com"]
viewer_base_url = "https://menus.example.com"

[notifications]
ntfy_base_url = "https://ntfy.example.com"
ntfy_topic = "school-menu"

[web]
bind_host = "127.0.0.1"
bind_port = 9000

[daemon]
log_level = "debug"
log_format = "json"
"#
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn valid_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SMTP_HOST", "smtp.example.com"),
            ("MAIL_FROM", "menus@example.com"),
            ("MAIL_TO", "a@example.com, b@example.com ,"),
        ]
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.menu.scan_interval_secs, 120);
        assert_eq!(config.schedule.timezone, "Europe/Paris");
        assert!(!config.schedule.skip_weekends);
        assert_eq!(config.smtp.port, 465);
        assert_eq!(config.mail.to.len(), 2);
        assert_eq!(config.daemon.log_format, LogFormat::Json);
        assert_eq!(config.web.listen_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu-mailer.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = AppConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.daemon.log_level, "debug");
        assert_eq!(config.menu.image_dir, PathBuf::from("/srv/menus"));
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/menu-mailer.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.menu.image_dir, PathBuf::from("/mnt/menu-images"));
        assert_eq!(config.menu.scan_interval_secs, 300);
        assert_eq!(config.schedule.send_hour, 7);
        assert_eq!(config.schedule.send_minute, 0);
        assert_eq!(config.schedule.timezone, "Europe/London");
        assert!(config.schedule.skip_weekends);
        assert_eq!(config.schedule.retry_window_minutes, 60);
        assert_eq!(config.smtp.port, 587);
        assert!(config.smtp.use_tls);
        assert_eq!(config.web.listen_addr(), "0.0.0.0:8082");
        assert!(!config.notifications.is_enabled());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        let mut pairs = valid_env();
        pairs.extend([
            ("SEND_HOUR", "8"),
            ("SEND_MINUTE", "30"),
            ("SKIP_WEEKENDS", "no"),
            ("SMTP_USE_TLS", "0"),
            ("SMTP_PASSWORD", "hunter2"),
            ("TIMEZONE", "America/New_York"),
            ("LOG_LEVEL", "DEBUG"),
        ]);
        config.apply_overrides(env(&pairs)).unwrap();

        assert_eq!(config.schedule.send_hour, 8);
        assert_eq!(config.schedule.send_minute, 30);
        assert!(!config.schedule.skip_weekends);
        assert!(!config.smtp.use_tls);
        assert_eq!(config.smtp.password.as_deref(), Some("hunter2"));
        assert_eq!(config.mail.to, vec!["a@example.com", "b@example.com"]);
        assert_eq!(config.daemon.log_level, "debug");
        config.validate().unwrap();
        assert_eq!(config.schedule.tz().unwrap(), chrono_tz::America::New_York);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config
            .apply_overrides(env(&[("MENU_SMTP_PW", "s3cret"), ("BIND_PORT", "8082")]))
            .unwrap();
        assert_eq!(config.smtp.password.as_deref(), Some("s3cret"));
        assert_eq!(config.web.bind_port, 8082);
        assert_eq!(config.schedule.send_hour, 6);
    }

    #[test]
    fn test_invalid_env_number() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(env(&[("SEND_HOUR", "seven")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SEND_HOUR"
        ));
    }

    #[test]
    fn test_invalid_env_bool() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(env(&[("SKIP_WEEKENDS", "sometimes")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_timezone() {
        let mut config = AppConfig::default();
        config.apply_overrides(env(&valid_env())).unwrap();
        config.schedule.timezone = "Mars/Olympus_Mons".into();
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "schedule.timezone"
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_retry_window() {
        for raw in ["18446744073709551615", "1000000000000000", "1441"] {
            let mut config = AppConfig::default();
            config.apply_overrides(env(&valid_env())).unwrap();
            config
                .apply_overrides(env(&[("RETRY_WINDOW_MINUTES", raw)]))
                .unwrap();
            assert!(
                matches!(
                    config.validate(),
                    Err(ConfigError::InvalidValue { ref field, .. })
                        if field == "schedule.retry_window_minutes"
                ),
                "RETRY_WINDOW_MINUTES={} should be rejected",
                raw
            );
        }

        let mut config = AppConfig::default();
        config.apply_overrides(env(&valid_env())).unwrap();
        config.schedule.retry_window_minutes = 1440;
        config.validate().unwrap();
        assert_eq!(
            config.schedule.retry_window().unwrap(),
            chrono::Duration::minutes(1440)
        );
    }

    #[test]
    fn test_validate_rejects_bad_hour() {
        let mut config = AppConfig::default();
        config.apply_overrides(env(&valid_env())).unwrap();
        config.schedule.send_hour = 24;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_smtp_and_recipients() {
        let config = AppConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "smtp.host"
        ));

        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[
                ("SMTP_HOST", "smtp.example.com"),
                ("MAIL_FROM", "menus@example.com"),
                ("MAIL_TO", " , "),
            ]))
            .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "mail.to"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_recipient() {
        let mut config = AppConfig::default();
        config.apply_overrides(env(&valid_env())).unwrap();
        config.mail.to.push("not an address".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_split_recipients() {
        assert_eq!(
            split_recipients("a@x.org,, b@x.org "),
            vec!["a@x.org".to_string(), "b@x.org".to_string()]
        );
        assert!(split_recipients("").is_empty());
    }

    #[test]
    fn test_ipv6_listen_addr() {
        let web = WebConfig {
            bind_host: "::".into(),
            bind_port: 8082,
        };
        assert_eq!(web.listen_addr(), "[::]:8082");
        assert!(web.listen_addr().parse::<std::net::SocketAddr>().is_ok());
    }
}
