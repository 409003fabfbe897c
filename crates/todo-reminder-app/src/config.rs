//! Layered configuration: defaults, TOML file, environment.

use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use time::{Duration, UtcOffset};
use todo_reminder_core::parse_offset;
use todo_reminder_mail::{MailConfig, MailSecurity};

use crate::reminder::ReminderConfig;
use crate::service::OverdueScope;

const DATA_DIR: &str = "todo-reminder";
const DATABASE_FILE: &str = "todo.db";
const SQLITE_SCHEME: &str = "sqlite://";
const MAX_FLASH_TTL_SECS: u64 = 366 * 24 * 60 * 60;

/// Address the HTTP server binds when nothing else is configured.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8989";

/// Runtime configuration, read from an optional TOML file and the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database path; `sqlite://` prefixes are accepted.
    pub database_url: Option<String>,
    /// HTTP listen address.
    pub listen: String,
    /// Offset deadlines are entered and displayed in, e.g. `+09:00`.
    pub deadline_offset: String,
    /// Lifetime of an unread flash message in seconds.
    pub flash_ttl_secs: u64,
    /// Reminder workflow switches.
    pub reminder: ReminderSettings,
    /// Outbound mail settings; checked lazily when a reminder is sent.
    pub mail: MailConfig,
}

/// `[reminder]` block.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// Only remind about deadlines at or before the current time.
    pub past_due_only: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            listen: DEFAULT_LISTEN.to_owned(),
            deadline_offset: "+00:00".to_owned(),
            flash_ttl_secs: 60,
            reminder: ReminderSettings::default(),
            mail: MailConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load the optional file at `path`, then apply the process environment.
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed, or a value is malformed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without consulting the environment.
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Override fields with values returned by `lookup`, keyed by env variable name.
    ///
    /// # Errors
    /// Fails when a numeric, boolean or enum value cannot be parsed.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("DATABASE_URL") {
            self.database_url = Some(value);
        }
        if let Some(value) = lookup("LISTEN_ADDR") {
            self.listen = value;
        }
        if let Some(value) = lookup("DEADLINE_OFFSET") {
            self.deadline_offset = value;
        }
        if let Some(value) = lookup("FLASH_TTL_SECS") {
            self.flash_ttl_secs = value
                .trim()
                .parse()
                .with_context(|| format!("FLASH_TTL_SECS must be a number of seconds, got '{value}'"))?;
        }
        if let Some(value) = lookup("REMINDER_PAST_DUE_ONLY") {
            self.reminder.past_due_only = parse_flag("REMINDER_PAST_DUE_ONLY", &value)?;
        }

        let mail = &mut self.mail;
        for (key, slot) in [
            ("MAIL_FROM", &mut mail.from),
            ("MAIL_TO", &mut mail.to),
            ("MAIL_SERVER", &mut mail.server),
            ("MAIL_USER", &mut mail.user),
            ("MAIL_PASSWORD", &mut mail.password),
            ("MAIL_DOMAIN", &mut mail.helo_domain),
        ] {
            if let Some(value) = lookup(key) {
                *slot = Some(value);
            }
        }
        if let Some(value) = lookup("MAIL_FROM_NAME") {
            mail.from_name = value;
        }
        if let Some(value) = lookup("MAIL_SECURITY") {
            mail.security = MailSecurity::from_name(&value)
                .ok_or_else(|| anyhow!("MAIL_SECURITY must be starttls, tls or none, got '{value}'"))?;
        }
        if let Some(value) = lookup("MAIL_TIMEOUT_SECS") {
            mail.timeout_secs = value
                .trim()
                .parse()
                .with_context(|| format!("MAIL_TIMEOUT_SECS must be a number of seconds, got '{value}'"))?;
        }
        Ok(())
    }

    /// Reject values that would only fail later at startup.
    ///
    /// Mail settings are only checked when a reminder is sent.
    ///
    /// # Errors
    /// Fails on a malformed offset or listen address.
    pub fn validate(&self) -> Result<()> {
        self.offset()?;
        self.listen_addr()?;
        Ok(())
    }

    /// Resolved database location.
    ///
    /// # Errors
    /// Fails when no path is configured and the platform has no data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(url) = self.database_url.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            let path = url.strip_prefix(SQLITE_SCHEME).unwrap_or(url);
            return Ok(PathBuf::from(path));
        }
        let Some(data_dir) = dirs::data_dir() else {
            bail!("no data directory available; set DATABASE_URL");
        };
        Ok(data_dir.join(DATA_DIR).join(DATABASE_FILE))
    }

    /// Parsed listen address.
    ///
    /// # Errors
    /// Fails when `listen` is not `ip:port`.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .trim()
            .parse()
            .with_context(|| format!("invalid listen address '{}'", self.listen))
    }

    /// Parsed deadline offset.
    ///
    /// # Errors
    /// Fails when `deadline_offset` is not `Z`, `UTC` or `±HH:MM`.
    pub fn offset(&self) -> Result<UtcOffset> {
        parse_offset(&self.deadline_offset).context("invalid DEADLINE_OFFSET")
    }

    /// Flash message lifetime.
    #[must_use]
    pub fn flash_ttl(&self) -> Duration {
        let secs = self.flash_ttl_secs.min(MAX_FLASH_TTL_SECS);
        Duration::seconds(i64::try_from(secs).unwrap_or_default())
    }

    /// Settings for [`crate::ReminderService`].
    ///
    /// # Errors
    /// Fails when the deadline offset is malformed.
    pub fn reminder_config(&self) -> Result<ReminderConfig> {
        Ok(ReminderConfig {
            deadline_offset: self.offset()?,
            scope: if self.reminder.past_due_only {
                OverdueScope::PastDue
            } else {
                OverdueScope::AnyDeadline
            },
        })
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("{key} must be true or false, got '{value}'")),
    }
}
