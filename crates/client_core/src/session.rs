use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("token store {path}: {source}")]
pub struct TokenStoreError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Option<String>, TokenStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(self.error(source)),
        }
    }

    pub async fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.error(source))?;
        }
        tokio::fs::write(&self.path, token)
            .await
            .map_err(|source| self.error(source))?;
        debug!(path = %self.path.display(), "token saved");
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), TokenStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.error(source)),
        }
    }

    fn error(&self, source: std::io::Error) -> TokenStoreError {
        TokenStoreError {
            path: self.path.clone(),
            source,
        }
    }
}
