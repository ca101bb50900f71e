use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A session cookie as kept between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

impl StoredCookie {
    /// `name=value`, with no attributes so the jar scopes it to the url it is added under.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl From<reqwest::cookie::Cookie<'_>> for StoredCookie {
    fn from(c: reqwest::cookie::Cookie<'_>) -> Self {
        Self {
            name: c.name().to_string(),
            value: c.value().to_string(),
            domain: c.domain().map(str::to_string),
            path: c.path().map(str::to_string),
            secure: c.secure(),
            http_only: c.http_only(),
        }
    }
}

/// Persisted-session port. Loading is best-effort; callers fall back to a fresh login.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Vec<StoredCookie>, StoreError>;
    fn save(&self, cookies: &[StoredCookie]) -> Result<(), StoreError>;
}

/// JSON file of cookies, readable only by owner and group.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Vec<StoredCookie>, StoreError> {
        let raw = std::fs::read(&self.path)?;
        let cookies: Vec<StoredCookie> = serde_json::from_slice(&raw)?;
        if cookies.is_empty() {
            return Err(StoreError::Empty);
        }
        Ok(cookies)
    }

    fn save(&self, cookies: &[StoredCookie]) -> Result<(), StoreError> {
        let data = serde_json::to_vec(cookies)?;
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o640);
        }
        let mut file = options.open(&self.path)?;
        file.write_all(&data)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(name: &str, value: &str) -> StoredCookie {
        StoredCookie {
            name: name.into(),
            value: value.into(),
            domain: Some("www.crunchbase.com".into()),
            path: Some("/".into()),
            secure: true,
            http_only: true,
        }
    }

    #[test]
    fn file_store_keeps_cookies_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        FileSessionStore::new(&path)
            .save(&[cookie("cid", "abc"), cookie("authcookie", "xyz")])
            .unwrap();

        let loaded = FileSessionStore::new(&path).load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].pair(), "authcookie=xyz");
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_not_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        FileSessionStore::new(&path).save(&[cookie("cid", "abc")]).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o007, 0);
    }

    #[test]
    fn missing_or_empty_file_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        assert!(matches!(FileSessionStore::new(&path).load(), Err(StoreError::Io(_))));

        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(FileSessionStore::new(&path).load(), Err(StoreError::Empty)));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(FileSessionStore::new(&path).load(), Err(StoreError::Json(_))));
    }
}
