use crate::{
    config::Config,
    error::{AppError, Result},
};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

pub fn otp_email(code: &str, ttl_minutes: i64) -> (String, String) {
    let subject = "Your password reset code".to_string();
    let body = format!(
        "Your verification code is {}.\n\nIt expires in {} minutes. If you did not request a password reset, ignore this email.",
        code, ttl_minutes
    );
    (subject, body)
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &Config) -> Result<Self> {
        let from: Mailbox = format!("{} <{}>", config.smtp_from_name, config.smtp_from_email)
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid sender address: {}", e)))?;

        // 未配置账号时视为本地调试用的 SMTP 服务
        let transport = if config.smtp_username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| AppError::Email(format!("Invalid SMTP relay: {}", e)))?
                .port(config.smtp_port)
                .credentials(Credentials::new(
                    config.smtp_username.clone(),
                    config.smtp_password.clone(),
                ))
                .build()
        };

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Email(format!("Failed to build email: {}", e)))?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!("Email sent to {}", to.email);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send email: {}", e);
                Err(AppError::Email("Failed to send email".to_string()))
            }
        }
    }
}
