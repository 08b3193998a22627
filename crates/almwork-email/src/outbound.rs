//! SMTP dispatch: work-instruction emails and parsing-error notifications,
//! grounded on `email_service.py`'s `send_work_instruction`/
//! `_create_work_instruction_body`/`send_parsing_error`.

use almwork_config::SmtpConfig;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use crate::error::{EmailError, Result};
use crate::patterns::is_plausible_email;

pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    reply_to: String,
}

impl SmtpSender {
    pub fn new(config: &SmtpConfig, from: String, reply_to: String) -> Result<Self> {
        let builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        }
        .map_err(|e| EmailError::Send(e.to_string()))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.expose().to_string(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            reply_to,
        })
    }

    /// Splits `recipients` into valid/invalid and sends to the valid subset
    /// only, matching the original's "proceed with whoever is valid, report
    /// the rest" behavior.
    pub fn partition_recipients(recipients: &[String]) -> (Vec<String>, Vec<String>) {
        recipients
            .iter()
            .cloned()
            .partition(|addr| is_plausible_email(addr))
    }

    pub async fn send_plain_text(
        &self,
        to: &[String],
        subject: &str,
        body: &str,
        set_reply_to: bool,
    ) -> Result<String> {
        let message_id = generate_message_id(&self.from);

        let mut builder = Message::builder()
            .from(
                self.from
                    .parse::<Mailbox>()
                    .map_err(|e| EmailError::Send(format!("invalid from address: {e}")))?,
            )
            .subject(subject)
            .message_id(Some(message_id.clone()));

        for addr in to {
            builder = builder.to(addr
                .parse::<Mailbox>()
                .map_err(|e| EmailError::Send(format!("invalid recipient {addr}: {e}")))?);
        }
        if set_reply_to && !self.reply_to.is_empty() {
            builder = builder.reply_to(
                self.reply_to
                    .parse::<Mailbox>()
                    .map_err(|e| EmailError::Send(format!("invalid reply-to address: {e}")))?,
            );
        }

        let message = builder
            .body(body.to_string())
            .map_err(|e| EmailError::Send(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError::Send(e.to_string()))?;

        Ok(message_id)
    }
}

fn generate_message_id(from: &str) -> String {
    let domain = from.rsplit_once('@').map_or("almwork.local", |(_, d)| d);
    format!("<{}@{domain}>", Uuid::new_v4())
}

#[must_use]
pub fn work_instruction_subject(workitem_id: Uuid, title: &str) -> String {
    format!("[WorkItem-{workitem_id}] {title}")
}

#[must_use]
pub fn work_instruction_body(
    title: &str,
    description: Option<&str>,
    status: &str,
    priority: Option<u8>,
    workitem_id: Uuid,
) -> String {
    format!(
        "Work Instruction\n\
=================\n\n\
Title: {title}\n\
Status: {status}\n\
Priority: {priority}\n\
WorkItem ID: {workitem_id}\n\n\
Description:\n{description}\n\n\
To update this work item, reply with:\n\
STATUS: completed | COMMENT: Your update here | TIME: 2.5\n",
        priority = priority
            .map(|p| p.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        description = description.unwrap_or("No description provided"),
    )
}

#[must_use]
pub fn parsing_error_body(error_message: &str, workitem_id: Option<Uuid>) -> String {
    let mut body = format!(
        "Your email could not be processed.\n\n\
Error: {error_message}\n\n"
    );
    if let Some(id) = workitem_id {
        body.push_str(&format!("WorkItem ID: {id}\n\n"));
    }
    body.push_str(
        "To update a work item via email, please use one of these formats:\n\n\
1. Structured Format (recommended):\n\
   STATUS: completed | COMMENT: Your update here | TIME: 2.5\n\n\
2. Natural Language:\n\
   Simply describe your update in plain text. Our system will attempt\n\
   to extract the relevant information.\n\n\
Valid status values: draft, active, completed, archived, in_progress\n\n\
If you continue to experience issues, please contact support.\n",
    );
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_valid_and_invalid_recipients() {
        let recipients = vec!["ok@example.com".to_string(), "not-an-email".to_string()];
        let (valid, invalid) = SmtpSender::partition_recipients(&recipients);
        assert_eq!(valid, vec!["ok@example.com".to_string()]);
        assert_eq!(invalid, vec!["not-an-email".to_string()]);
    }

    #[test]
    fn subject_embeds_workitem_id_for_tracking() {
        let id = Uuid::new_v4();
        let subject = work_instruction_subject(id, "Implement login flow");
        assert_eq!(subject, format!("[WorkItem-{id}] Implement login flow"));
    }
}
