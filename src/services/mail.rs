use async_trait::async_trait;
use derive_more::Display;
use log::warn;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use crate::config::MailSettings;

// This is the only error type the contact form swallows.
#[derive(Debug, Display)]
pub enum MailError {
  #[display(fmt = "Invalid mail address {}", _0)]
  Address(String),
  #[display(fmt = "Could not build mail - {}", _0)]
  Build(String),
  #[display(fmt = "SMTP error - {}", _0)]
  Transport(String)
}

impl std::error::Error for MailError {}

#[derive(Debug, Clone)]
pub struct MailMessage {
  pub subject: String,
  pub body: String,
  pub reply_to: Option<String>,
  pub recipients: Vec<String>
}

#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

// A bare address, what visitors type in forms.
pub fn is_valid_address(address: &str) -> bool {
  address.trim().parse::<Address>().is_ok()
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
  address.trim()
    .parse::<Mailbox>()
    .map_err(|_| MailError::Address(String::from(address)))
}

pub struct SmtpMailer {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  sender: Mailbox
}

impl SmtpMailer {
  // STARTTLS relay, e.g. smtp.gmail.com on port 587.
  pub fn open(settings: &MailSettings) -> Result<Self, MailError> {
    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
      .map_err(|e| MailError::Transport(e.to_string()))?
      .port(settings.smtp_port)
      .credentials(Credentials::new(
        settings.smtp_username.clone(),
        settings.smtp_password.clone()
      ))
      .build();
    Ok(Self {
      transport,
      sender: parse_mailbox(&settings.sender)?
    })
  }
}

/**
 * A reply-to we can't parse is left out rather than
 * losing the whole message. Bad recipients are still
 * an error.
 */
fn build_email(sender: &Mailbox, message: &MailMessage) -> Result<Message, MailError> {
  let mut builder = Message::builder()
    .from(sender.clone())
    .subject(message.subject.clone());
  if let Some(reply_to) = &message.reply_to {
    match parse_mailbox(reply_to) {
      Ok(mailbox) => builder = builder.reply_to(mailbox),
      Err(e) => warn!("Sending without Reply-To - {}", e)
    }
  }
  for recipient in &message.recipients {
    builder = builder.to(parse_mailbox(recipient)?);
  }
  builder.body(message.body.clone())
    .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
  async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
    let email = build_email(&self.sender, message)?;
    self.transport.send(email)
      .await
      .map_err(|e| MailError::Transport(e.to_string()))?;
    Ok(())
  }
}
