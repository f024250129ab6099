use reqwest::blocking::Client;

use crate::config::Config;
use crate::errors::ServerError;

/// Outbound OTP mail. Without Mailgun credentials the server still runs;
/// codes are logged instead of mailed, which is what local development
/// and the router tests rely on.
pub enum Mailer {
    Mailgun(MailgunMailer),
    Log,
}

impl Mailer {
    pub fn from_config(cfg: &Config) -> Self {
        match &cfg.mailgun_api_key {
            Some(key) => Mailer::Mailgun(MailgunMailer::new(
                key.clone(),
                cfg.mailgun_domain.clone(),
                cfg.mailgun_from.clone(),
            )),
            None => Mailer::Log,
        }
    }

    pub fn send_otp(&self, to_email: &str, subject: &str, otp: &str) -> Result<(), ServerError> {
        match self {
            Mailer::Mailgun(mailgun) => mailgun.send_otp(to_email, subject, otp),
            Mailer::Log => {
                log::info!("mail disabled; OTP for {to_email}: {otp}");
                Ok(())
            }
        }
    }
}

pub struct MailgunMailer {
    api_key: String,
    domain: String,
    sender: String,
    client: Client,
}

impl MailgunMailer {
    pub fn new(api_key: String, domain: String, sender: String) -> Self {
        Self {
            api_key,
            domain,
            sender,
            client: Client::new(),
        }
    }

    fn send_otp(&self, to_email: &str, subject: &str, otp: &str) -> Result<(), ServerError> {
        let text = format!("Your OTP is {otp}. It is valid for 15 minutes.");
        let html = format!("<p>Your OTP is <strong>{otp}</strong>. It is valid for 15 minutes.</p>");
        let from = format!("\"NPS Bahrain\" <{}>", self.sender);

        let resp = self
            .client
            .post(format!("https://api.mailgun.net/v3/{}/messages", self.domain))
            .basic_auth("api", Some(&self.api_key))
            .form(&[
                ("from", from.as_str()),
                ("to", to_email),
                ("subject", subject),
                ("text", text.as_str()),
                ("html", html.as_str()),
            ])
            .send()
            .map_err(|e| {
                log::error!("mailgun request failed: {e}");
                ServerError::InternalError
            })?;

        if !resp.status().is_success() {
            let body = resp.text().unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("mailgun rejected message: {body}");
            return Err(ServerError::InternalError);
        }

        Ok(())
    }
}
