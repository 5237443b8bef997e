// mail/sendmail.rs
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use tokio::time::{sleep, Duration};

use crate::config::SmtpConfig;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

pub type MailResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Fills `{{key}}` placeholders. Values are escaped, the template is trusted.
pub fn render_template(template: &str, placeholders: &[(&str, String)]) -> String {
    let mut html = template.to_string();
    for (key, value) in placeholders {
        html = html.replace(&format!("{{{{{}}}}}", key), &ammonia::clean_text(value));
    }
    html
}

#[derive(Debug, Clone)]
pub struct Mailer {
    config: SmtpConfig,
}

impl Mailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_configured()
    }

    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        template: &str,
        placeholders: &[(&str, String)],
    ) -> MailResult {
        if !self.is_enabled() {
            tracing::debug!("SMTP not configured, skipping '{}' to {}", subject, to_email);
            return Ok(());
        }
        if to_email.is_empty() || !to_email.contains('@') {
            return Err(format!("Invalid email address: {}", to_email).into());
        }

        let html_body = render_template(template, placeholders);
        self.send_with_retries(to_email, subject, &html_body).await
    }

    async fn send_with_retries(&self, to_email: &str, subject: &str, html_body: &str) -> MailResult {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.send_via_smtp(to_email, subject, html_body).await {
                Ok(()) => {
                    tracing::info!("Email '{}' sent to {}", subject, to_email);
                    return Ok(());
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < MAX_RETRIES {
                        let delay = RETRY_DELAY_MS * 2_u64.pow(attempt - 1);
                        tracing::warn!(
                            "Email send attempt {} failed for {}. Retrying in {}ms...",
                            attempt,
                            to_email,
                            delay
                        );
                        sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        let error_msg = last_error
            .map(|e| format!("Failed after {} retries: {}", MAX_RETRIES, e))
            .unwrap_or_else(|| "Unknown email sending error".to_string());

        tracing::error!("Email failed for {}: {}", to_email, error_msg);
        Err(error_msg.into())
    }

    async fn send_via_smtp(&self, to_email: &str, subject: &str, html_body: &str) -> MailResult {
        let email = Message::builder()
            .from(self.config.from_email.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .multipart(
                MultiPart::alternative().singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body.to_string()),
                ),
            )?;

        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());
        let builder = if self.config.port == 465 {
            SmtpTransport::relay(&self.config.host)?
        } else {
            SmtpTransport::starttls_relay(&self.config.host)?
        };
        let transport = builder.port(self.config.port).credentials(creds).build();

        // lettre's SMTP transport blocks
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await??;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> SmtpConfig {
        SmtpConfig {
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_email: "Rentnest <noreply@rentnest.app>".into(),
        }
    }

    #[test]
    fn placeholders_are_filled_and_escaped() {
        let html = render_template(
            "<p>Hello {{name}}, room {{room}}</p>",
            &[("name", "<b>Ada</b>".to_string()), ("room", "4A".to_string())],
        );
        assert!(html.contains("room 4A"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;b&gt;Ada"));
    }

    #[tokio::test]
    async fn unconfigured_mailer_skips_sending() {
        let mailer = Mailer::new(unconfigured());
        assert!(!mailer.is_enabled());
        assert!(mailer
            .send_email("tenant@example.com", "Invoice", "<p>{{x}}</p>", &[])
            .await
            .is_ok());
    }
}
