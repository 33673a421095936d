//! Mail delivery module
//!
//! SMTP delivery behind a small sender trait so handlers (and tests) never
//! talk to a transport directly. An empty mail host in the configuration
//! selects the in-process recorder instead of a real connection.

use std::sync::{Arc, Mutex};

use lettre::message::header::ContentType;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::MailConfig;
use crate::logger;

/// Addressing for one outgoing message
#[derive(Debug, Clone, Default)]
pub struct MailOptions {
    pub to: String,
    pub from: String,
    pub from_name: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
}

/// Content for one outgoing message
#[derive(Debug, Clone, Default)]
pub struct MailTemplate {
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

/// Mail sender abstraction
pub trait MailSender: Send + Sync {
    fn send(&self, options: &MailOptions, template: &MailTemplate) -> Result<(), String>;
}

/// Sanity check an address: an '@' past the first character and a dot after it
fn plausible_address(address: &str) -> bool {
    match address.find('@') {
        Some(at) if at > 0 => address[at..].find('.').is_some_and(|dot| dot > 0),
        _ => false,
    }
}

/// Reject messages missing mandatory fields or carrying implausible addresses
fn check_message(options: &MailOptions, template: &MailTemplate) -> Result<(), String> {
    if options.to.is_empty()
        || options.from.is_empty()
        || options.from_name.is_empty()
        || template.subject.is_empty()
        || template.html.is_empty()
    {
        let message = "To address, from address, from name, subject and HTML content \
                       are required to send an email"
            .to_string();
        logger::log_critical(&message);
        return Err(message);
    }

    for address in [Some(&options.to), Some(&options.from), options.cc.as_ref(), options.bcc.as_ref()]
        .into_iter()
        .flatten()
    {
        if !plausible_address(address) {
            let message = format!("The {address} address is not valid");
            logger::log_critical(&message);
            return Err(message);
        }
    }

    Ok(())
}

/// SMTP mail sender
pub struct SmtpMailer {
    config: MailConfig,
}

impl SmtpMailer {
    pub const fn new(config: MailConfig) -> Self {
        Self { config }
    }
}

impl MailSender for SmtpMailer {
    fn send(&self, options: &MailOptions, template: &MailTemplate) -> Result<(), String> {
        check_message(options, template)?;

        // The logical sender goes into Reply-To; the envelope uses the
        // configured account.
        let reply_to = format!("{} <{}>", options.from_name, options.from);
        let envelope_from = format!("{} <{}>", options.from_name, self.config.default_from);

        let mut builder = Message::builder()
            .from(
                envelope_from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .reply_to(
                reply_to
                    .parse()
                    .map_err(|e| format!("Invalid reply-to address: {e}"))?,
            )
            .to(options
                .to
                .parse()
                .map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(&template.subject);

        if let Some(cc) = &options.cc {
            builder = builder.cc(cc.parse().map_err(|e| format!("Invalid cc address: {e}"))?);
        }
        if let Some(bcc) = &options.bcc {
            builder = builder.bcc(bcc.parse().map_err(|e| format!("Invalid bcc address: {e}"))?);
        }

        let email = match &template.text {
            Some(text) => builder
                .multipart(MultiPart::alternative_plain_html(
                    text.clone(),
                    template.html.clone(),
                ))
                .map_err(|e| format!("Failed to build email: {e}"))?,
            None => builder
                .header(ContentType::TEXT_HTML)
                .body(template.html.clone())
                .map_err(|e| format!("Failed to build email: {e}"))?,
        };

        let mailer = if self.config.user.is_empty() {
            // No authentication (for local development SMTP servers)
            SmtpTransport::builder_dangerous(&self.config.host)
                .port(self.config.port)
                .build()
        } else {
            let creds = Credentials::new(self.config.user.clone(), self.config.password.clone());
            SmtpTransport::relay(&self.config.host)
                .map_err(|e| format!("SMTP relay error: {e}"))?
                .credentials(creds)
                .port(self.config.port)
                .build()
        };

        match mailer.send(&email) {
            Ok(_) => {
                logger::log_info(&format!(
                    "The '{}' email to {} was successfully sent",
                    template.subject, options.to
                ));
                Ok(())
            }
            Err(e) => {
                let message = format!(
                    "The '{}' email to {} couldn't be sent: {e}",
                    template.subject, options.to
                );
                logger::log_critical(&message);
                Err(message)
            }
        }
    }
}

/// In-process recorder used when delivery is disabled and in tests
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(MailOptions, MailTemplate)>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or(0)
    }
}

impl MailSender for RecordingMailer {
    fn send(&self, options: &MailOptions, template: &MailTemplate) -> Result<(), String> {
        check_message(options, template)?;
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((options.clone(), template.clone()));
        }
        Ok(())
    }
}

/// Pick the sender implied by the configuration
pub fn create_mailer(config: &MailConfig) -> Arc<dyn MailSender> {
    if config.host.is_empty() {
        Arc::new(RecordingMailer::new())
    } else {
        Arc::new(SmtpMailer::new(config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> MailOptions {
        MailOptions {
            to: "someone@example.com".to_string(),
            from: "sender@example.com".to_string(),
            from_name: "Sender".to_string(),
            cc: None,
            bcc: None,
        }
    }

    fn template() -> MailTemplate {
        MailTemplate {
            subject: "Hello".to_string(),
            html: "<p>Hi</p>".to_string(),
            text: None,
        }
    }

    #[test]
    fn test_address_plausibility() {
        assert!(plausible_address("user@example.com"));
        assert!(!plausible_address("userexample.com"));
        assert!(!plausible_address("@example.com"));
        assert!(!plausible_address("user@nodot"));
    }

    #[test]
    fn test_mandatory_fields_enforced() {
        let mailer = RecordingMailer::new();

        let mut broken = options();
        broken.to = String::new();
        assert!(mailer.send(&broken, &template()).is_err());

        let mut broken = template();
        broken.html = String::new();
        assert!(mailer.send(&options(), &broken).is_err());

        assert_eq!(mailer.sent_count(), 0);
    }

    #[test]
    fn test_invalid_cc_rejected() {
        let mailer = RecordingMailer::new();
        let mut opts = options();
        opts.cc = Some("not-an-address".to_string());
        assert!(mailer.send(&opts, &template()).is_err());
    }

    #[test]
    fn test_recorder_keeps_sent_mail() {
        let mailer = RecordingMailer::new();
        mailer.send(&options(), &template()).unwrap();
        assert_eq!(mailer.sent_count(), 1);
    }

    #[test]
    fn test_empty_host_selects_recorder() {
        let config = MailConfig {
            host: String::new(),
            port: 25,
            user: String::new(),
            password: String::new(),
            default_from: "apimap@localhost".to_string(),
        };
        let mailer = create_mailer(&config);
        assert!(mailer.send(&options(), &template()).is_ok());
    }
}
