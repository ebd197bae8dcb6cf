use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::auth::token_store::TokenStore;
use crate::config::config_dir;

/// Contents of ~/.config/mail_portal/session.json
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SessionFile {
    pub token: Option<String>,
}

/// Token kept in a JSON file next to the config.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn open_default() -> Result<Self> {
        let mut p = config_dir()?;
        fs::create_dir_all(&p)?;
        p.push("session.json");
        Ok(Self::at(p))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SessionFile> {
        if !self.path.exists() {
            return Ok(SessionFile::default());
        }
        let s = fs::read_to_string(&self.path)?;
        if s.trim().is_empty() {
            return Ok(SessionFile::default());
        }
        Ok(serde_json::from_str(&s)?)
    }

    fn write(&self, sf: &SessionFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let s = serde_json::to_string_pretty(sf)?;
        let mut f = open_private(&self.path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.read()?.token)
    }

    fn save(&self, token: &str) -> Result<()> {
        self.write(&SessionFile {
            token: Some(token.to_string()),
        })
    }

    fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.write(&SessionFile::default())
    }
}

/// Open for rewriting, owner-only from creation. A file left behind with a
/// wider mode is tightened before anything is written to it.
#[cfg(unix)]
fn open_private(path: &Path) -> Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let f = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    f.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(f)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> Result<File> {
    Ok(File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::at(dir.path().join("session.json"));
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn save_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::at(dir.path().join("nested").join("session.json"));

        store.save("jwt-1").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("jwt-1"));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"token\": \"jwt-1\""));

        store.save("jwt-2").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("jwt-2"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(FileTokenStore::at(path).load().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::at(dir.path().join("session.json"));
        store.save("jwt").unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn existing_readable_file_is_tightened() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileTokenStore::at(&path);
        store.save("jwt").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap().as_deref(), Some("jwt"));
    }
}
