//! Outbound mail delivery for todo-reminder
//!
//! This crate provides the transport seam used by the reminder workflow and an
//! SMTP implementation of it.

mod config;
mod error;
mod smtp;
mod types;

pub use config::{MailConfig, MailSecurity};
pub use error::{MailError, Result};
pub use smtp::SmtpMailer;
pub use types::{MailAddress, OutgoingMail};

/// Synchronous delivery of a single message.
pub trait MailTransport {
    /// Deliver `mail`, blocking until the transport accepts or rejects it.
    ///
    /// # Errors
    /// Returns a [`MailError`] when the message cannot be built or delivered.
    fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

impl<T> MailTransport for &T
where
    T: MailTransport + ?Sized,
{
    fn send(&self, mail: &OutgoingMail) -> Result<()> {
        (*self).send(mail)
    }
}

impl<T> MailTransport for std::sync::Arc<T>
where
    T: MailTransport + ?Sized,
{
    fn send(&self, mail: &OutgoingMail) -> Result<()> {
        (**self).send(mail)
    }
}
