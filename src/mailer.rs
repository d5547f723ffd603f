//! Delivers a rendered agenda, either to the mail server or to a preview output

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;
use crate::error::AgendaError;
use crate::render::RenderedAgenda;

/// The port of SMTP submission with STARTTLS. Any other port uses implicit TLS.
pub const STARTTLS_PORT: u16 = 587;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Print the HTML agenda, do not send anything
    Preview,
    Send,
}

/// Something that is able to send a message
#[async_trait]
pub trait MailTransport {
    async fn send(&self, message: Message) -> Result<(), AgendaError>;
}

/// A [`MailTransport`] that talks to an authenticated SMTP server.
///
/// The lettre transport (and its TLS setup) is only built when a message is actually sent.
pub struct SmtpMailer {
    host: String,
    port: u16,
    credentials: Credentials,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.smtp_host().to_string(),
            port: config.smtp_port(),
            credentials: Credentials::new(config.username().to_string(), config.password().to_string()),
            timeout: config.timeout(),
        }
    }

    /// Implicit TLS, or STARTTLS on the submission port. No connection is made yet.
    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, AgendaError> {
        let builder = if self.port == STARTTLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)?
        };

        Ok(builder
            .port(self.port)
            .credentials(self.credentials.clone())
            .timeout(Some(self.timeout))
            .build())
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: Message) -> Result<(), AgendaError> {
        log::debug!("Connecting to {}:{}", self.host, self.port);
        let response = self.transport()?.send(message).await?;
        log::debug!("SMTP server answered {:?}", response.code());
        Ok(())
    }
}


/// Build the `multipart/alternative` message (plain text first, then HTML) of an agenda
pub fn build_message(rendered: &RenderedAgenda, config: &Config) -> Result<Message, AgendaError> {
    let from: Mailbox = config.username().parse()?;
    let to: Mailbox = config.send_to().parse()?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(rendered.subject.clone())
        .multipart(MultiPart::alternative_plain_html(rendered.text.clone(), rendered.html.clone()))?;
    Ok(message)
}

/// Deliver an agenda.
///
/// In preview mode, the HTML is written to `out` and `transport` is never used.
pub async fn deliver<T, W>(rendered: &RenderedAgenda, config: &Config, mode: DeliveryMode, transport: &T, out: &mut W) -> Result<(), AgendaError>
where
    T: MailTransport + Sync + ?Sized,
    W: Write,
{
    match mode {
        DeliveryMode::Preview => {
            writeln!(out, "{}", rendered.html)
                .and_then(|_| out.flush())
                .map_err(|err| AgendaError::Delivery(format!("unable to write the preview: {}", err)))?;
            log::info!("Preview written, no email sent");
            Ok(())
        },
        DeliveryMode::Send => {
            let message = build_message(rendered, config)?;
            log::info!("Sending email to {}...", config.send_to());
            transport.send(message).await?;
            log::info!("Email sent successfully!");
            Ok(())
        },
    }
}
