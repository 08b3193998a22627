use std::path::Path;

use crate::error::ConfigError;
use crate::model::FileOverlay;

/// Loads a [`FileOverlay`] from a TOML file at `path`. Callers decide
/// whether a missing file is fatal; this function only distinguishes
/// "file present but unreadable/unparseable" from "file present and valid".
pub fn load_overlay(path: &Path) -> Result<FileOverlay, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_partial_overlay() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            graph_db_url = "memory://graph"
            log_format = "json"

            [smtp]
            host = "smtp.example.com"
            port = 2525
            "#
        )
        .unwrap();

        let overlay = load_overlay(file.path()).unwrap();
        assert_eq!(overlay.graph_db_url.as_deref(), Some("memory://graph"));
        assert_eq!(overlay.log_format.as_deref(), Some("json"));
        assert_eq!(overlay.smtp.host.as_deref(), Some("smtp.example.com"));
        assert_eq!(overlay.smtp.port, Some(2525));
        assert_eq!(overlay.imap.host, None);
    }

    #[test]
    fn reports_missing_file() {
        let result = load_overlay(Path::new("/nonexistent/almwork.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn reports_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not = [valid toml").unwrap();
        let result = load_overlay(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
