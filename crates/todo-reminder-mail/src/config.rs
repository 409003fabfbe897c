//! Mail configuration

use serde::{Deserialize, Serialize};

use crate::{MailAddress, MailError, Result};

/// Display name used for the sender when none is configured
pub const DEFAULT_FROM_NAME: &str = "TODO Reminder";

/// Connection security for the SMTP session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailSecurity {
    /// Plain connection upgraded with STARTTLS (submission, port 587)
    #[default]
    StartTls,
    /// Implicit TLS from the first byte (port 465)
    Tls,
    /// No encryption; only for local relays and test servers
    None,
}

impl MailSecurity {
    /// Port used when the server setting carries none
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::StartTls => 587,
            Self::Tls => 465,
            Self::None => 25,
        }
    }

    /// Parse `starttls`, `tls` or `none` (case-insensitive)
    #[must_use]
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "starttls" => Some(Self::StartTls),
            "tls" | "ssl" => Some(Self::Tls),
            "none" | "plain" => Some(Self::None),
            _ => None,
        }
    }
}

/// Settings for outbound mail
///
/// Every value is optional at load time; missing values are only reported
/// when a message is actually sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Sender address
    pub from: Option<String>,

    /// Sender display name
    pub from_name: String,

    /// Recipient address
    pub to: Option<String>,

    /// SMTP server as `host` or `host:port`
    pub server: Option<String>,

    /// SMTP user name
    pub user: Option<String>,

    /// SMTP password
    pub password: Option<String>,

    /// Name announced in EHLO
    pub helo_domain: Option<String>,

    /// Connection security
    pub security: MailSecurity,

    /// Timeout in seconds for the whole SMTP exchange
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: None,
            from_name: DEFAULT_FROM_NAME.to_owned(),
            to: None,
            server: None,
            user: None,
            password: None,
            helo_domain: None,
            security: MailSecurity::default(),
            timeout_secs: 10,
        }
    }
}

impl MailConfig {
    /// Sender mailbox
    ///
    /// # Errors
    /// Returns [`MailError::Config`] when no sender is configured.
    pub fn sender(&self) -> Result<MailAddress> {
        let email = required(self.from.as_deref(), "sender address (MAIL_FROM)")?;
        let name = self.from_name.trim();
        Ok(if name.is_empty() {
            MailAddress::bare(email)
        } else {
            MailAddress::named(name, email)
        })
    }

    /// Recipient mailbox
    ///
    /// # Errors
    /// Returns [`MailError::Config`] when no recipient is configured.
    pub fn recipient(&self) -> Result<MailAddress> {
        required(self.to.as_deref(), "recipient address (MAIL_TO)").map(MailAddress::bare)
    }

    /// SMTP host and port
    ///
    /// # Errors
    /// Returns [`MailError::Config`] when the server is missing or the port is malformed.
    pub fn endpoint(&self) -> Result<(String, u16)> {
        let server = required(self.server.as_deref(), "SMTP server (MAIL_SERVER)")?;
        match server.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| MailError::Config(format!("invalid SMTP port in '{server}'")))?;
                Ok((host.to_owned(), port))
            }
            Some(_) => Err(MailError::Config(format!("missing SMTP host in '{server}'"))),
            None => Ok((server.to_owned(), self.security.default_port())),
        }
    }

    /// Check that everything needed to send is present
    ///
    /// # Errors
    /// Returns the first [`MailError::Config`] found.
    pub fn validate(&self) -> Result<()> {
        self.sender()?;
        self.recipient()?;
        self.endpoint()?;
        Ok(())
    }

    /// User name and password, when both are set
    #[must_use]
    pub fn credentials(&self) -> Option<(String, String)> {
        let user = self.user.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
        let password = self.password.as_deref().filter(|v| !v.is_empty())?;
        Some((user.to_owned(), password.to_owned()))
    }
}

fn required<'a>(value: Option<&'a str>, what: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MailError::Config(format!("{what} is not set")))
}
