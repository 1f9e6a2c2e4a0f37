//! Fire-and-forget mail dispatch.

use lyceum_core::external::{Mailer, OutgoingMail};
use tracing::warn;

/// Template names resolved by the delivery collaborator.
pub const USER_ACTIVATION: &str = "USER_ACTIVATION";
pub const EMPLOYEE_ACTIVATION: &str = "EMPLOYEE_ACTIVATION";
pub const STUDENT_VALIDATION: &str = "STUDENT_VALIDATION";
pub const RESET_PASSWORD: &str = "RESET_PASSWORD";
pub const DOCUMENT_UPLOADED: &str = "DOCUMENT_UPLOAD_SUCCESSFULLY";

/// Dispatch a mail on a detached task. Delivery failures are logged
/// and never surfaced: a failed email must not roll back the mutation
/// that triggered it.
pub fn send_detached<M: Mailer + Clone>(mailer: &M, mail: OutgoingMail) {
    let mailer = mailer.clone();
    tokio::spawn(async move {
        let recipient = mail.recipient.clone();
        let template = mail.template;
        if let Err(err) = mailer.send(mail).await {
            warn!(recipient = %recipient, template, error = %err, "mail delivery failed");
        }
    });
}

/// Mailer that only logs. Stands in for real delivery in tests and
/// local runs.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), String> {
        tracing::info!(
            recipient = %mail.recipient,
            template = mail.template,
            subject = %mail.subject,
            "mail dispatched"
        );
        Ok(())
    }
}
