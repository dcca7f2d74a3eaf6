//! Course update notifications.
//!
//! A course update hands the updated course to a [`CourseUpdateNotifier`] on a
//! detached task (see [`dispatch_course_updated`]). Delivery failures are
//! logged and never reach the request that triggered them.

use std::sync::Arc;

use async_trait::async_trait;
use html_escape::{encode_double_quoted_attribute, encode_text};
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{error, info, instrument, warn};

use lectern_config::EmailConfig;
use lectern_core::AppError;
use lectern_models::Course;

use crate::store::SubscriptionRepository;

#[async_trait]
pub trait CourseUpdateNotifier: Send + Sync {
    async fn course_updated(&self, course: Course);
}

/// Fires the notifier without waiting for it.
pub fn dispatch_course_updated(notifier: Arc<dyn CourseUpdateNotifier>, course: Course) {
    tokio::spawn(async move {
        notifier.course_updated(course).await;
    });
}

/// Notifier used when SMTP is disabled.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl CourseUpdateNotifier for LogNotifier {
    async fn course_updated(&self, course: Course) {
        info!(
            course.id = %course.id,
            course.title = %course.title,
            "Course updated, mail delivery disabled"
        );
    }
}

/// Mails every subscriber of the updated course.
pub struct EmailNotifier {
    config: EmailConfig,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig, subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self {
            config,
            subscriptions,
        }
    }

    fn course_link(&self, course: &Course) -> String {
        format!("{}/courses/{}", self.config.frontend_url, course.id)
    }

    fn update_template(&self, course: &Course, link: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Course updated</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h2>{title} has new content</h2>
    <p>A course you are subscribed to was just updated.</p>
    <p><a href="{link}">Open the course</a></p>
    <p style="color: #888; font-size: 12px;">You receive this because you subscribed to this course on {from_name}.</p>
</body>
</html>"#,
            title = encode_text(&course.title),
            link = encode_double_quoted_attribute(link),
            from_name = encode_text(&self.config.from_name),
        )
    }

    fn mailer(&self) -> Result<SmtpTransport, AppError> {
        if self.config.smtp_username.is_empty() {
            return Ok(SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build());
        }

        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        Ok(SmtpTransport::relay(&self.config.smtp_host)
            .map_err(|e| AppError::internal_error(format!("Failed to create SMTP relay: {}", e)))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build())
    }

    #[instrument(skip(self, course), fields(course.id = %course.id))]
    async fn send_update(&self, to_email: &str, course: &Course) -> Result<(), AppError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);
        let link = self.course_link(course);
        let text_body = format!(
            "Hi,\n\n\
             The course \"{}\" you are subscribed to was updated.\n\n\
             See what changed: {}\n\n\
             {} Team",
            course.title, link, self.config.from_name
        );
        let html_body = self.update_template(course, &link);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?)
            .subject(format!("Course updated: {}", course.title))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = self.mailer()?;

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal_error(format!("Task join error: {}", e)))?
            .map_err(|e| AppError::internal_error(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl CourseUpdateNotifier for EmailNotifier {
    async fn course_updated(&self, course: Course) {
        let recipients = match self.subscriptions.subscriber_emails(course.id).await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!(course.id = %course.id, error = ?e.error, "Failed to load subscribers");
                return;
            }
        };

        let mut failed = 0usize;
        for email in &recipients {
            if let Err(e) = self.send_update(email, &course).await {
                failed += 1;
                warn!(course.id = %course.id, error = %e.error, "Course update mail not sent");
            }
        }

        info!(
            course.id = %course.id,
            recipients = recipients.len(),
            failed,
            "Course update notifications sent"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use lectern_models::{CourseId, UserId};

    fn config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@lectern.dev".to_string(),
            from_name: "Lectern".to_string(),
            frontend_url: "https://app.lectern.dev".to_string(),
        }
    }

    fn course() -> Course {
        Course {
            id: CourseId::new(),
            title: "Async Rust".to_string(),
            description: None,
            preview: None,
            price: 0,
            owner_id: UserId::new(),
            last_update: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_course_link_and_template() {
        let notifier = EmailNotifier::new(config(), Arc::new(MemoryStore::new()));
        let course = course();

        let link = notifier.course_link(&course);
        assert_eq!(link, format!("https://app.lectern.dev/courses/{}", course.id));

        let html = notifier.update_template(&course, &link);
        assert!(html.contains("Async Rust"));
        assert!(html.contains(&link));
    }

    #[test]
    fn test_template_escapes_course_title() {
        let notifier = EmailNotifier::new(config(), Arc::new(MemoryStore::new()));
        let mut course = course();
        course.title = "<script>alert('x')</script> & friends".to_string();

        let html = notifier.update_template(&course, &notifier.course_link(&course));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert('x')&lt;/script&gt; &amp; friends has new content"));
    }

    #[test]
    fn test_mailer_without_credentials() {
        let notifier = EmailNotifier::new(config(), Arc::new(MemoryStore::new()));
        assert!(notifier.mailer().is_ok());
    }
}
