//! IMAP polling: connect, fetch unseen messages, mark them seen. `imap` is
//! a blocking client, so every call here runs inside
//! [`tokio::task::spawn_blocking`], matching the "isolate the blocking
//! work, keep the async surface non-blocking" split `almwork-scheduler`
//! uses for its own CPU-bound solve.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use almwork_config::ImapConfig;
use mail_parser::MessageParser;
use tokio::task::JoinHandle;

use crate::error::{EmailError, Result};

/// One fetched, parsed inbound message.
#[derive(Debug, Clone)]
pub struct RawIncomingMessage {
    pub message_id: String,
    pub from_address: String,
    pub subject: String,
    pub body_text: String,
}

fn connect(config: &ImapConfig) -> Result<imap::Session<Box<dyn imap::ImapConnection>>> {
    let client = if config.tls {
        imap::ClientBuilder::new(&config.host, config.port)
            .connect()
            .map_err(|e| EmailError::ImapConnect(e.to_string()))?
    } else {
        imap::ClientBuilder::new(&config.host, config.port)
            .danger_skip_tls_verify(true)
            .connect()
            .map_err(|e| EmailError::ImapConnect(e.to_string()))?
    };

    client
        .login(&config.user, config.password.expose())
        .map_err(|(e, _client)| EmailError::ImapConnect(e.to_string()))
}

/// Fetches every `UNSEEN` message in `config.mailbox`, marks each `\Seen`,
/// and returns the plain-text body preferred over any other part (mirrors
/// `_get_email_body`'s "walk multipart, prefer text/plain, skip
/// attachments" behavior).
pub fn fetch_new_emails(config: &ImapConfig) -> Result<Vec<RawIncomingMessage>> {
    let mut session = connect(config)?;
    session
        .select(&config.mailbox)
        .map_err(|e| EmailError::Imap(e.to_string()))?;

    let uids = session
        .search("UNSEEN")
        .map_err(|e| EmailError::Imap(e.to_string()))?;

    let mut messages = Vec::with_capacity(uids.len());
    let parser = MessageParser::default();

    for uid in uids {
        let fetched = session
            .fetch(uid.to_string(), "RFC822")
            .map_err(|e| EmailError::Imap(e.to_string()))?;

        for item in fetched.iter() {
            let Some(body) = item.body() else { continue };
            let Some(parsed) = parser.parse(body) else {
                continue;
            };

            let message_id = parsed
                .message_id()
                .map(str::to_string)
                .unwrap_or_else(|| format!("<generated-{uid}@unknown>"));
            let from_address = parsed
                .from()
                .and_then(|addr| addr.first())
                .and_then(|a| a.address())
                .map(str::to_string)
                .unwrap_or_default();
            let subject = parsed.subject().unwrap_or_default().to_string();
            let body_text = parsed.body_text(0).map(|b| b.trim().to_string()).unwrap_or_default();

            messages.push(RawIncomingMessage {
                message_id,
                from_address,
                subject,
                body_text,
            });
        }

        session
            .store(uid.to_string(), "+FLAGS (\\Seen)")
            .map_err(|e| EmailError::Imap(e.to_string()))?;
    }

    session.logout().map_err(|e| EmailError::Imap(e.to_string()))?;
    Ok(messages)
}

/// Single-flight polling supervisor: a `start`/`stop` pair that never
/// double-spawns (`start` is a no-op if already active, `stop` aborts the
/// background task and joins it), mirroring `start_polling`/`stop_polling`
/// in the original.
pub struct Poller {
    active: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Default for Poller {
    fn default() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }
}

impl Poller {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Spawns a supervised background task that calls `on_tick` every
    /// `interval_secs`, until [`Self::stop`] is called. Returns
    /// [`EmailError::AlreadyPolling`] if a poll loop is already running.
    pub fn start<F, Fut>(&mut self, interval_secs: u64, on_tick: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        if self.active.swap(true, Ordering::SeqCst) {
            self.active.store(true, Ordering::SeqCst);
            return Err(EmailError::AlreadyPolling);
        }

        let active = self.active.clone();
        let handle = tokio::spawn(async move {
            while active.load(Ordering::SeqCst) {
                on_tick().await;
                tokio::time::sleep(std::time::Duration::from_secs(interval_secs)).await;
            }
        });
        self.handle = Some(handle);
        Ok(())
    }

    pub async fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}
