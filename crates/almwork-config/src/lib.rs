//! Startup configuration for the almwork process.
//!
//! Layering, lowest to highest precedence: [`AlmConfig::default`] built-in
//! defaults, an optional TOML override file, then environment variables
//! (which take the place a dedicated CLI-argument layer would otherwise
//! hold, since this repo has no use for one).

pub mod env;
pub mod error;
pub mod file;
pub mod model;
pub mod secret;

pub use error::ConfigError;
pub use model::{AlmConfig, EmailConfig, ImapConfig, KeyMaterialConfig, LlmConfig, LogFormat, SmtpConfig};
pub use secret::Secret;

use std::path::Path;

impl AlmConfig {
    /// Loads configuration from defaults, an optional TOML file at
    /// `file_path` (skipped silently if it does not exist), and environment
    /// variables, in that order of increasing precedence.
    pub fn load(file_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = file_path {
            if path.exists() {
                let overlay = file::load_overlay(path)?;
                config.apply_file_overlay(overlay);
            }
        }

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.smtp.host = env::var_or("SMTP_HOST", &self.smtp.host);
        self.smtp.port = env::var_parsed("SMTP_PORT", self.smtp.port)?;
        self.smtp.user = env::var_or("SMTP_USER", &self.smtp.user);
        if let Some(password) = env::var_opt("SMTP_PASSWORD") {
            self.smtp.password = Secret::new(password);
        }
        self.smtp.tls = env::var_bool("SMTP_TLS", self.smtp.tls)?;

        self.imap.host = env::var_or("IMAP_HOST", &self.imap.host);
        self.imap.port = env::var_parsed("IMAP_PORT", self.imap.port)?;
        self.imap.user = env::var_or("IMAP_USER", &self.imap.user);
        if let Some(password) = env::var_opt("IMAP_PASSWORD") {
            self.imap.password = Secret::new(password);
        }
        self.imap.tls = env::var_bool("IMAP_TLS", self.imap.tls)?;
        self.imap.mailbox = env::var_or("IMAP_MAILBOX", &self.imap.mailbox);

        self.email.from = env::var_or("EMAIL_FROM", &self.email.from);
        self.email.reply_to = env::var_or("EMAIL_REPLY_TO", &self.email.reply_to);
        self.email.poll_interval_secs =
            env::var_parsed("EMAIL_POLL_INTERVAL_SECONDS", self.email.poll_interval_secs)?;

        self.llm.enabled = env::var_bool("LLM_ENABLED", self.llm.enabled)?;
        self.llm.studio_url = env::var_or("LLM_STUDIO_URL", &self.llm.studio_url);
        self.llm.model_name = env::var_or("LLM_MODEL_NAME", &self.llm.model_name);

        if let Some(path) = env::var_opt("RSA_PRIVATE_KEY_PATH") {
            self.keys.private_key_path = Some(path);
        }
        if let Some(path) = env::var_opt("RSA_PUBLIC_KEY_PATH") {
            self.keys.public_key_path = Some(path);
        }
        if let Some(pem) = env::var_opt("RSA_PRIVATE_KEY_PEM") {
            self.keys.private_key_pem = Some(Secret::new(pem));
        }
        if let Some(pem) = env::var_opt("RSA_PUBLIC_KEY_PEM") {
            self.keys.public_key_pem = Some(pem);
        }

        self.graph_db_url = env::var_or("GRAPH_DB_URL", &self.graph_db_url);
        self.signature_db_url = env::var_or("SIGNATURE_DB_URL", &self.signature_db_url);
        if let Some(secret) = env::var_opt("JWT_SECRET") {
            self.jwt_secret = Secret::new(secret);
        }

        if let Some(raw) = env::var_opt("LOG_FORMAT") {
            self.log_format = LogFormat::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "LOG_FORMAT".to_string(),
                reason: format!("expected \"pretty\" or \"json\", found {raw:?}"),
            })?;
        }

        self.scheduler_solve_timeout_secs = env::var_parsed(
            "SCHEDULER_SOLVE_TIMEOUT_SECS",
            self.scheduler_solve_timeout_secs,
        )?;

        Ok(())
    }
}
