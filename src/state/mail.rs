use crate::{
    cfg::Settings,
    error::{ClubError, LettreAction, LettreEmailSnafu},
};
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use snafu::ResultExt;
use tokio::sync::{
    broadcast::Receiver as BroadcastReceiver,
    mpsc::{unbounded_channel, UnboundedSender},
};

///A contact form submission, already validated
#[derive(Debug, Clone)]
pub struct EmailToSend {
    pub from_name: String,
    pub from_email: String,
    pub subject: String,
    pub message: String,
}

impl EmailToSend {
    fn into_message(
        self,
        sender_address: &str,
        contact_inbox: &str,
        project_name: &str,
    ) -> Result<Message, ClubError> {
        let Self {
            from_name,
            from_email,
            subject,
            message,
        } = self;

        Message::builder()
            .from(format!("{project_name} Website <{sender_address}>").parse()?)
            .reply_to(format!("{from_name} <{from_email}>").parse()?)
            .to(format!("{project_name} <{contact_inbox}>").parse()?)
            .subject(format!("[{project_name} contact] {subject}"))
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                r#"New message from the contact form.

Name: {from_name}
Email: {from_email}

{message}
"#
            ))
            .context(LettreEmailSnafu {
                trying_to: LettreAction::BuildMessage,
            })
    }
}

pub fn email_sender_thread(
    settings: Settings,
    mut stop_rx: BroadcastReceiver<()>,
) -> UnboundedSender<EmailToSend> {
    let mail_settings = settings.mail.clone();
    let project_name = settings.brand.instance_name.clone();
    let (msg_tx, mut msg_rx) = unbounded_channel::<EmailToSend>();

    async fn send_email(
        email: EmailToSend,
        mailer: &AsyncSmtpTransport<Tokio1Executor>,
        sender_address: &str,
        contact_inbox: &str,
        project_name: &str,
    ) -> Result<(), ClubError> {
        let from = email.from_email.clone();
        let m = email.into_message(sender_address, contact_inbox, project_name)?;

        info!(%from, "Forwarding contact message.");

        mailer.send(m).await?;

        Ok(())
    }

    tokio::spawn(async move {
        let mailer = match AsyncSmtpTransport::<Tokio1Executor>::relay(&mail_settings.smtp) {
            Ok(relay) => relay
                .credentials(Credentials::new(
                    mail_settings.username.clone(),
                    mail_settings.password.clone(),
                ))
                .build(),
            Err(e) => {
                error!(?e, smtp = %mail_settings.smtp, "Unable to get SMTP relay, mail thread not starting");
                return;
            }
        };

        loop {
            if tokio::select! {
                _stop = stop_rx.recv() => {
                    info!("Mail thread stopping");
                    true
                },
                msg = msg_rx.recv() => match msg {
                    None => true,
                    Some(msg) => {
                        if let Err(e) = send_email(msg, &mailer, &mail_settings.username, &mail_settings.contact_inbox, &project_name).await {
                            error!(?e, "Error sending email");
                        }

                        false
                    }
                }
            } {
                return;
            }
        }
    });

    msg_tx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_messages_reply_to_the_visitor() {
        let message = EmailToSend {
            from_name: "Ada Obi".into(),
            from_email: "ada@example.com".into(),
            subject: "Partnership".into(),
            message: "We'd love to collaborate on SDG 4.".into(),
        }
        .into_message("noreply@example.org", "club@example.org", "AHSAC")
        .unwrap();

        let headers = message.headers().to_string();
        assert!(headers.contains("Reply-To: \"Ada Obi\" <ada@example.com>") || headers.contains("Reply-To: Ada Obi <ada@example.com>"));
        assert!(headers.contains("[AHSAC contact] Partnership"));
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        let res = EmailToSend {
            from_name: "Ada".into(),
            from_email: "not an address".into(),
            subject: "Hi".into(),
            message: "Hello".into(),
        }
        .into_message("noreply@example.org", "club@example.org", "AHSAC");

        assert!(matches!(res, Err(ClubError::LettreAddress { .. })));
    }
}
