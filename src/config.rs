use std::fs;
use std::path::{Path, PathBuf};

use crate::twitch::{Result, TwitchError};

/// Persisted credentials, one `key=value` per line so the file stays
/// shell-sourceable. Tokens and the broadcaster ID are filled in lazily.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub twitch_username: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_token: Option<String>,
    pub refresh_token: Option<String>,
    pub broadcaster_id: Option<String>,
}

impl Credentials {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            TwitchError::ConfigError(format!(
                "cannot read {}: {} (run with --setup first)",
                path.as_ref().display(),
                e
            ))
        })?;
        let creds = Self::parse(&content)?;
        if creds.twitch_username.is_empty()
            || creds.client_id.is_empty()
            || creds.client_secret.is_empty()
        {
            return Err(TwitchError::ConfigError(
                "store is missing twitch_username, client_id or client_secret; run --setup"
                    .to_string(),
            ));
        }
        Ok(creds)
    }

    fn parse(content: &str) -> Result<Self> {
        let mut creds = Credentials::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(value.trim()).to_string();
            match key.trim() {
                "twitch_username" => creds.twitch_username = value,
                "client_id" => creds.client_id = value,
                "client_secret" => creds.client_secret = value,
                "auth_token" => creds.auth_token = non_empty(value),
                "refresh_token" => creds.refresh_token = non_empty(value),
                "broadcaster_id" => creds.broadcaster_id = non_empty(value),
                other => log::debug!("Ignoring unknown store key '{}'", other),
            }
        }
        Ok(creds)
    }

    /// Rewrite the whole store atomically: write to a temp file next to
    /// the target, then rename over it. Each key appears at most once.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut content = String::new();
        content.push_str(&format!("twitch_username={}\n", self.twitch_username));
        content.push_str(&format!("client_id={}\n", self.client_id));
        content.push_str(&format!("client_secret={}\n", self.client_secret));
        if let Some(token) = &self.auth_token {
            content.push_str(&format!("auth_token={}\n", token));
        }
        if let Some(token) = &self.refresh_token {
            content.push_str(&format!("refresh_token={}\n", token));
        }
        if let Some(id) = &self.broadcaster_id {
            content.push_str(&format!("broadcaster_id={}\n", id));
        }

        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Replace both token keys in one step
    pub fn set_tokens(&mut self, access_token: String, refresh_token: String) {
        self.auth_token = Some(access_token);
        self.refresh_token = Some(refresh_token);
    }
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Default store location: `<config_dir>/twitch-say/twitch-say.env`
pub fn default_store_path() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| TwitchError::ConfigError("no config directory on this system".to_string()))?;
    Ok(base.join("twitch-say").join("twitch-say.env"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_creds() -> Credentials {
        Credentials {
            twitch_username: "somestreamer".to_string(),
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            auth_token: Some("tok".to_string()),
            refresh_token: Some("ref".to_string()),
            broadcaster_id: None,
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("twitch-say.env");

        let creds = sample_creds();
        creds.to_file(&path).expect("write store");
        let loaded = Credentials::from_file(&path).expect("read store");
        assert_eq!(loaded, creds);
    }

    #[test]
    fn test_parse_quotes_and_comments() {
        let content = "\
# credentials
twitch_username=\"somestreamer\"
client_id='cid'
client_secret=secret

unknown_key=ignored
auth_token=
";
        let creds = Credentials::parse(content).unwrap();
        assert_eq!(creds.twitch_username, "somestreamer");
        assert_eq!(creds.client_id, "cid");
        assert_eq!(creds.client_secret, "secret");
        assert_eq!(creds.auth_token, None);
    }

    #[test]
    fn test_save_replaces_keys_without_duplicates() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("twitch-say.env");

        let mut creds = sample_creds();
        creds.to_file(&path).expect("write store");

        creds.set_tokens("new-tok".to_string(), "new-ref".to_string());
        creds.to_file(&path).expect("rewrite store");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("auth_token=").count(), 1);
        assert_eq!(content.matches("refresh_token=").count(), 1);
        assert!(content.contains("auth_token=new-tok"));
        assert!(content.contains("refresh_token=new-ref"));
        assert!(!content.contains("auth_token=tok\n"));
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("twitch-say.env");

        sample_creds().to_file(&path).expect("write store");
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_missing_required_keys_is_config_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("twitch-say.env");
        std::fs::write(&path, "twitch_username=somestreamer\n").unwrap();

        let err = Credentials::from_file(&path).unwrap_err();
        assert!(matches!(err, TwitchError::ConfigError(_)));
    }

    #[test]
    fn test_missing_file_points_at_setup() {
        let dir = tempdir().expect("tempdir");
        let err = Credentials::from_file(dir.path().join("nope.env")).unwrap_err();
        match err {
            TwitchError::ConfigError(msg) => assert!(msg.contains("--setup")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }
}
