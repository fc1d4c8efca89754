//! Email service for borrow/return receipts

use chrono::{DateTime, Utc};
use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send a receipt confirming a borrow
    pub async fn send_borrow_receipt(
        &self,
        to: &str,
        book_title: &str,
        borrowed_at: DateTime<Utc>,
        due_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let subject = "Book Borrowed Successfully";
        let body = format!(
            r#"
You have borrowed "{title}".

Borrowed on: {borrowed}
Due back on: {due}

Please return the book by the due date to avoid late fees.
"#,
            title = book_title,
            borrowed = borrowed_at.format("%Y-%m-%d"),
            due = due_at.format("%Y-%m-%d"),
        );

        self.send_email(to, subject, &body).await
    }

    /// Send a receipt confirming a return, including any assessed fine
    pub async fn send_return_receipt(
        &self,
        to: &str,
        book_title: &str,
        returned_at: DateTime<Utc>,
        fine_amount: Decimal,
    ) -> AppResult<()> {
        let subject = "Book Returned Successfully";
        let fine_line = if fine_amount > Decimal::ZERO {
            format!("A late fee of {} has been assessed on this loan.", fine_amount)
        } else {
            "No late fee was assessed.".to_string()
        };
        let body = format!(
            r#"
You have returned "{title}" on {returned}.

{fine_line}

Thank you for using the library.
"#,
            title = book_title,
            returned = returned_at.format("%Y-%m-%d"),
            fine_line = fine_line,
        );

        self.send_email(to, subject, &body).await
    }

    /// Generic email sending function
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Athenaeum Library");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                body.replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) = (
            &self.config.smtp_username,
            &self.config.smtp_password,
        ) {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        let mailer = mailer_builder.build();

        mailer
            .send(&email)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}
