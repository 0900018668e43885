//! Outbound email — password reset codes and booking notifications.
//!
//! DESIGN
//! ======
//! Handlers talk to the [`Mailer`] trait so tests can capture messages
//! instead of calling the delivery provider. [`ResendMailer`] is the
//! production implementation. Templates are plain HTML with `{{KEY}}`
//! placeholders; substituted values are HTML-escaped.

use resend_rs::Resend;
use resend_rs::types::CreateEmailBaseOptions;

use crate::config::MailConfig;

const PASSWORD_RESET_TEMPLATE: &str = include_str!("../templates/password_reset.html");
const BOOKING_CONFIRMED_TEMPLATE: &str = include_str!("../templates/booking_confirmed.html");

#[derive(Debug, thiserror::Error)]
#[error("email delivery failed: {0}")]
pub struct MailError(pub String);

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

pub struct ResendMailer {
    client: Resend,
    from: String,
}

impl ResendMailer {
    #[must_use]
    pub fn new(config: &MailConfig) -> Self {
        Self { client: Resend::new(&config.api_key), from: config.from.clone() }
    }
}

#[async_trait::async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let to = [email.to.as_str()];
        let options = CreateEmailBaseOptions::new(&self.from, to, &email.subject).with_html(&email.html);
        self.client
            .emails
            .send(options)
            .await
            .map_err(|e| MailError(e.to_string()))?;
        Ok(())
    }
}

/// Escape text for an HTML body or attribute.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fill `{{KEY}}` placeholders. Values are escaped.
#[must_use]
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_owned(), |html, (key, value)| {
        html.replace(&format!("{{{{{key}}}}}"), &escape_html(value))
    })
}

#[must_use]
pub fn password_reset_email(to: &str, code: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_owned(),
        subject: "Your WanderLust password reset code".to_owned(),
        html: render(PASSWORD_RESET_TEMPLATE, &[("EMAIL", to), ("CODE", code)]),
    }
}

#[must_use]
pub fn booking_confirmed_email(to: &str, traveler: &str, guide: &str, tour_date: &str, total_bif: i64) -> OutgoingEmail {
    let total = format_bif(total_bif);
    OutgoingEmail {
        to: to.to_owned(),
        subject: format!("Your tour on {tour_date} is confirmed"),
        html: render(
            BOOKING_CONFIRMED_TEMPLATE,
            &[("TRAVELER", traveler), ("GUIDE", guide), ("DATE", tour_date), ("TOTAL", &total)],
        ),
    }
}

/// Format an amount as `12,500 BIF`.
#[must_use]
pub fn format_bif(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 5);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if amount < 0 {
        out.insert(0, '-');
    }
    out.push_str(" BIF");
    out
}

#[cfg(test)]
#[path = "mail_test.rs"]
mod tests;
