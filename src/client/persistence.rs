use crate::domain_model::AccessToken;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

/// Durable home of the session across restarts.
#[async_trait::async_trait]
pub trait SessionPersistence: Send + Sync {
    async fn load(&self) -> anyhow::Result<Option<AccessToken>>;
    async fn save(&self, token: Option<&AccessToken>) -> anyhow::Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    #[serde(rename = "accessToken")]
    access_token: Option<AccessToken>,
}

/// JSON file holding `{ "accessToken": ... }`. A missing file is an absent session.
pub struct FileSessionPersistence {
    path: PathBuf,
}

impl FileSessionPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionPersistence { path: path.into() }
    }
}

#[async_trait::async_trait]
impl SessionPersistence for FileSessionPersistence {
    async fn load(&self) -> anyhow::Result<Option<AccessToken>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {:?}", self.path)),
        };
        let persisted: PersistedSession = serde_json::from_str(&content)
            .with_context(|| format!("parsing {:?}", self.path))?;
        Ok(persisted.access_token)
    }

    async fn save(&self, token: Option<&AccessToken>) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let content = serde_json::to_string(&PersistedSession {
            access_token: token.cloned(),
        })?;

        // write-then-rename so a crash never leaves a torn file
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionPersistence {
    slot: Mutex<Option<AccessToken>>,
}

impl MemorySessionPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: AccessToken) -> Self {
        MemorySessionPersistence {
            slot: Mutex::new(Some(token)),
        }
    }

    pub fn stored(&self) -> Option<AccessToken> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl SessionPersistence for MemorySessionPersistence {
    async fn load(&self) -> anyhow::Result<Option<AccessToken>> {
        Ok(self.stored())
    }

    async fn save(&self, token: Option<&AccessToken>) -> anyhow::Result<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = token.cloned();
        Ok(())
    }
}
