use std::{io::Write, path::PathBuf};

use crate::errors::TodoError;

/// Login token persisted between runs as `{"token": "..."}`
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Get saved token, `None` when nobody is logged in
    pub fn load(&self) -> Result<Option<String>, TodoError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)?;

        let json: serde_json::Value = serde_json::from_str(contents.as_str())?;

        let token = json
            .get("token")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(String::from);

        Ok(token)
    }

    /// Saves the login token, replacing any previous one
    pub fn save(&self, token: &str) -> Result<(), TodoError> {
        use serde_json::json;

        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true) // Create new file if doesn't exist
            .write(true)
            .truncate(true)
            .open(&self.path)?;

        let data = json!({ "token": token });

        file.write_all(data.to_string().as_bytes())?;

        Ok(())
    }

    pub fn clear(&self) -> Result<(), TodoError> {
        match std::fs::remove_file(&self.path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Joins the api base url and a resource path with exactly one `/`
pub fn make_api_url(base: &str, resource: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        resource.trim_start_matches('/')
    )
}
