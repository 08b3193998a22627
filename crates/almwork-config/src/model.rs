use serde::Deserialize;

use crate::secret::Secret;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret,
    pub tls: bool,
}

#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret,
    pub tls: bool,
    pub mailbox: String,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub from: String,
    pub reply_to: String,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub enabled: bool,
    pub studio_url: String,
    pub model_name: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct KeyMaterialConfig {
    pub private_key_path: Option<String>,
    pub public_key_path: Option<String>,
    pub private_key_pem: Option<Secret>,
    pub public_key_pem: Option<String>,
}

/// Top-level application configuration, loaded once at process startup.
///
/// Precedence, lowest to highest: built-in defaults, the optional TOML
/// override file, then environment variables — the usual "override >
/// file > default" layering, with environment variables standing in for
/// CLI flags since this crate has no CLI surface of its own.
#[derive(Debug, Clone)]
pub struct AlmConfig {
    pub smtp: SmtpConfig,
    pub imap: ImapConfig,
    pub email: EmailConfig,
    pub llm: LlmConfig,
    pub keys: KeyMaterialConfig,
    pub graph_db_url: String,
    pub signature_db_url: String,
    pub jwt_secret: Secret,
    pub log_format: LogFormat,
    pub scheduler_solve_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl Default for AlmConfig {
    fn default() -> Self {
        Self {
            smtp: SmtpConfig {
                host: String::new(),
                port: 587,
                user: String::new(),
                password: Secret::default(),
                tls: true,
            },
            imap: ImapConfig {
                host: String::new(),
                port: 993,
                user: String::new(),
                password: Secret::default(),
                tls: true,
                mailbox: "INBOX".to_string(),
            },
            email: EmailConfig {
                from: String::new(),
                reply_to: String::new(),
                poll_interval_secs: 60,
            },
            llm: LlmConfig {
                enabled: false,
                studio_url: String::new(),
                model_name: String::new(),
                timeout_secs: 30,
            },
            keys: KeyMaterialConfig {
                private_key_path: None,
                public_key_path: None,
                private_key_pem: None,
                public_key_pem: None,
            },
            graph_db_url: String::new(),
            signature_db_url: String::new(),
            jwt_secret: Secret::default(),
            log_format: LogFormat::default(),
            scheduler_solve_timeout_secs: 60,
        }
    }
}

/// Sparse TOML overlay: every field optional so a file only needs to name
/// what it overrides. Field names match the supported environment
/// variables, lowercased with the component prefix as a table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileOverlay {
    #[serde(default)]
    pub smtp: SmtpOverlay,
    #[serde(default)]
    pub imap: ImapOverlay,
    #[serde(default)]
    pub email: EmailOverlay,
    #[serde(default)]
    pub llm: LlmOverlay,
    #[serde(default)]
    pub keys: KeysOverlay,
    pub graph_db_url: Option<String>,
    pub signature_db_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub log_format: Option<String>,
    pub scheduler_solve_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmtpOverlay {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub tls: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImapOverlay {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub tls: Option<bool>,
    pub mailbox: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailOverlay {
    pub from: Option<String>,
    pub reply_to: Option<String>,
    pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmOverlay {
    pub enabled: Option<bool>,
    pub studio_url: Option<String>,
    pub model_name: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysOverlay {
    pub private_key_path: Option<String>,
    pub public_key_path: Option<String>,
    pub private_key_pem: Option<String>,
    pub public_key_pem: Option<String>,
}

impl AlmConfig {
    pub(crate) fn apply_file_overlay(&mut self, overlay: FileOverlay) {
        if let Some(v) = overlay.smtp.host {
            self.smtp.host = v;
        }
        if let Some(v) = overlay.smtp.port {
            self.smtp.port = v;
        }
        if let Some(v) = overlay.smtp.user {
            self.smtp.user = v;
        }
        if let Some(v) = overlay.smtp.password {
            self.smtp.password = Secret::new(v);
        }
        if let Some(v) = overlay.smtp.tls {
            self.smtp.tls = v;
        }

        if let Some(v) = overlay.imap.host {
            self.imap.host = v;
        }
        if let Some(v) = overlay.imap.port {
            self.imap.port = v;
        }
        if let Some(v) = overlay.imap.user {
            self.imap.user = v;
        }
        if let Some(v) = overlay.imap.password {
            self.imap.password = Secret::new(v);
        }
        if let Some(v) = overlay.imap.tls {
            self.imap.tls = v;
        }
        if let Some(v) = overlay.imap.mailbox {
            self.imap.mailbox = v;
        }

        if let Some(v) = overlay.email.from {
            self.email.from = v;
        }
        if let Some(v) = overlay.email.reply_to {
            self.email.reply_to = v;
        }
        if let Some(v) = overlay.email.poll_interval_secs {
            self.email.poll_interval_secs = v;
        }

        if let Some(v) = overlay.llm.enabled {
            self.llm.enabled = v;
        }
        if let Some(v) = overlay.llm.studio_url {
            self.llm.studio_url = v;
        }
        if let Some(v) = overlay.llm.model_name {
            self.llm.model_name = v;
        }
        if let Some(v) = overlay.llm.timeout_secs {
            self.llm.timeout_secs = v;
        }

        if let Some(v) = overlay.keys.private_key_path {
            self.keys.private_key_path = Some(v);
        }
        if let Some(v) = overlay.keys.public_key_path {
            self.keys.public_key_path = Some(v);
        }
        if let Some(v) = overlay.keys.private_key_pem {
            self.keys.private_key_pem = Some(Secret::new(v));
        }
        if let Some(v) = overlay.keys.public_key_pem {
            self.keys.public_key_pem = Some(v);
        }

        if let Some(v) = overlay.graph_db_url {
            self.graph_db_url = v;
        }
        if let Some(v) = overlay.signature_db_url {
            self.signature_db_url = v;
        }
        if let Some(v) = overlay.jwt_secret {
            self.jwt_secret = Secret::new(v);
        }
        if let Some(v) = overlay.log_format {
            if let Some(parsed) = crate::model::LogFormat::parse(&v) {
                self.log_format = parsed;
            }
        }
        if let Some(v) = overlay.scheduler_solve_timeout_secs {
            self.scheduler_solve_timeout_secs = v;
        }
    }
}
