//! Message types

use std::fmt;

/// A mailbox: optional display name plus address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAddress {
    /// Display name, e.g. `TODO Reminder`
    pub name: Option<String>,
    /// Bare address, e.g. `me@example.com`
    pub email: String,
}

impl MailAddress {
    /// Mailbox without a display name
    #[must_use]
    pub fn bare(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Mailbox with a display name
    #[must_use]
    pub fn named(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }
}

impl fmt::Display for MailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.email),
            None => f.write_str(&self.email),
        }
    }
}

/// A plain-text message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Sender
    pub from: MailAddress,
    /// Single recipient
    pub to: MailAddress,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}
