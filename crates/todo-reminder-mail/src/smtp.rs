//! SMTP delivery via lettre

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::extension::ClientId;
use lettre::{SmtpTransport, Transport};
use tracing::{debug, info};

use crate::{MailAddress, MailConfig, MailError, MailSecurity, MailTransport, OutgoingMail, Result};

/// Transport that opens one SMTP session per message
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    config: MailConfig,
}

impl SmtpMailer {
    /// Create a mailer; the configuration is checked on each send
    #[must_use]
    pub const fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// Borrow the configuration
    #[must_use]
    pub const fn config(&self) -> &MailConfig {
        &self.config
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let (host, port) = self.config.endpoint()?;
        let mut builder = match self.config.security {
            MailSecurity::StartTls => SmtpTransport::starttls_relay(&host)?,
            MailSecurity::Tls => SmtpTransport::relay(&host)?,
            MailSecurity::None => SmtpTransport::builder_dangerous(host.as_str()),
        }
        .port(port)
        .timeout(Some(Duration::from_secs(self.config.timeout_secs)));

        if let Some(domain) = &self.config.helo_domain {
            builder = builder.hello_name(ClientId::Domain(domain.clone()));
        }
        if let Some((user, password)) = self.config.credentials() {
            builder = builder.credentials(Credentials::new(user, password));
        }
        debug!(%host, port, security = ?self.config.security, "prepared SMTP transport");
        Ok(builder.build())
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let message = build_message(mail)?;
        let transport = self.transport()?;
        let response = transport.send(&message)?;
        info!(to = %mail.to, code = %response.code(), "mail accepted by SMTP server");
        Ok(())
    }
}

/// Assemble a plain-text RFC 5322 message
pub(crate) fn build_message(mail: &OutgoingMail) -> Result<Message> {
    let message = Message::builder()
        .from(mailbox(&mail.from)?)
        .to(mailbox(&mail.to)?)
        .subject(mail.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(mail.body.clone())?;
    Ok(message)
}

fn mailbox(address: &MailAddress) -> Result<Mailbox> {
    let email = address
        .email
        .parse()
        .map_err(|err: lettre::address::AddressError| MailError::InvalidAddress {
            address: address.email.clone(),
            reason: err.to_string(),
        })?;
    Ok(Mailbox::new(address.name.clone(), email))
}
