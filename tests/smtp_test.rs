//! SMTP channel tests against an in-process SMTP server

use emailer::domain::{SenderProfile, SmtpConfig};
use emailer::email::{DeliveryError, Emailer, SmtpChannel};
use emailer::{EmailError, EmailMessage, MailTransport, SenderRegistry};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

mod common;

use common::welcome_renderer;

/// Commands the fake server received, in order
type CommandLog = Arc<Mutex<Vec<String>>>;

/// Accept one SMTP session on a random port, answering AUTH with `auth_reply`
async fn spawn_smtp_server(auth_reply: &'static str) -> (u16, CommandLog) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let log: CommandLog = Arc::new(Mutex::new(Vec::new()));
    let commands = log.clone();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        write.write_all(b"220 fake.local ESMTP ready\r\n").await.unwrap();

        let mut in_data = false;
        while let Ok(Some(line)) = lines.next_line().await {
            if in_data {
                if line == "." {
                    in_data = false;
                    write
                        .write_all(b"250 2.0.0 queued as fake-1\r\n")
                        .await
                        .unwrap();
                }
                continue;
            }

            commands.lock().unwrap().push(line.clone());
            let command = line.to_ascii_uppercase();
            let reply: &str = if command.starts_with("EHLO") {
                "250-fake.local\r\n250 AUTH PLAIN LOGIN\r\n"
            } else if command.starts_with("AUTH") {
                auth_reply
            } else if command.starts_with("DATA") {
                in_data = true;
                "354 End data with <CR><LF>.<CR><LF>\r\n"
            } else if command.starts_with("QUIT") {
                let _ = write.write_all(b"221 Bye\r\n").await;
                break;
            } else {
                "250 OK\r\n"
            };

            if write.write_all(reply.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    (port, log)
}

fn create_test_emailer(port: u16) -> Emailer<SmtpChannel> {
    let config = SmtpConfig {
        host: "127.0.0.1".to_string(),
        port,
        use_tls: false,
        timeout_ms: 5_000,
    };
    let senders: SenderRegistry = [
        (
            "default".to_string(),
            SenderProfile::new("a@x.com").with_name("A"),
        ),
        (
            "billing".to_string(),
            SenderProfile::new("billing@x.com").with_password("s3cret"),
        ),
        (
            "Brand".to_string(),
            SenderProfile::new("brand@x.com").with_name("Acme, Inc."),
        ),
    ]
    .into_iter()
    .collect();

    Emailer::new(
        SmtpChannel::from_config(&config).unwrap(),
        senders,
        Arc::new(welcome_renderer()),
    )
}

fn welcome() -> EmailMessage {
    EmailMessage::new("welcome", "Hi", "b@y.com")
}

fn sent_commands(log: &CommandLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[tokio::test]
async fn test_send_without_password_skips_auth() {
    let (port, log) = spawn_smtp_server("235 2.7.0 Accepted\r\n").await;
    let emailer = create_test_emailer(port);

    let result = emailer.send_default(&welcome()).await.unwrap();
    assert!(result
        .message_id
        .as_deref()
        .is_some_and(|id| id.contains("fake-1")));

    let commands = sent_commands(&log);
    assert!(!commands.iter().any(|c| c.starts_with("AUTH")));
    assert!(commands.iter().any(|c| c.contains("MAIL FROM:<a@x.com>")));
    assert!(commands.iter().any(|c| c.contains("RCPT TO:<b@y.com>")));
}

#[tokio::test]
async fn test_send_with_password_authenticates() {
    let (port, log) = spawn_smtp_server("235 2.7.0 Accepted\r\n").await;
    let emailer = create_test_emailer(port);

    emailer.send(&welcome(), "billing").await.unwrap();

    let commands = sent_commands(&log);
    assert!(commands.iter().any(|c| c.starts_with("AUTH")));
    assert!(commands.iter().any(|c| c.contains("MAIL FROM:<billing@x.com>")));
}

#[tokio::test]
async fn test_send_with_punctuated_display_name() {
    let (port, log) = spawn_smtp_server("235 2.7.0 Accepted\r\n").await;
    let emailer = create_test_emailer(port);

    emailer.send(&welcome(), "Brand").await.unwrap();

    let commands = sent_commands(&log);
    assert!(commands.iter().any(|c| c.contains("MAIL FROM:<brand@x.com>")));
}

#[tokio::test]
async fn test_rejected_credentials() {
    let (port, log) =
        spawn_smtp_server("535 5.7.8 Authentication credentials invalid\r\n").await;
    let emailer = create_test_emailer(port);

    let err = emailer.send(&welcome(), "billing").await.unwrap_err();
    assert!(matches!(
        err,
        EmailError::Delivery(DeliveryError::AuthenticationFailed(_))
    ));
    assert!(!sent_commands(&log).iter().any(|c| c.starts_with("MAIL FROM")));
}

#[tokio::test]
async fn test_unknown_sender_opens_no_session() {
    let (port, log) = spawn_smtp_server("235 2.7.0 Accepted\r\n").await;
    let emailer = create_test_emailer(port);

    let err = emailer.send(&welcome(), "mkt").await.unwrap_err();
    assert!(matches!(err, EmailError::UnknownSender(_)));
    assert!(sent_commands(&log).is_empty());
}
