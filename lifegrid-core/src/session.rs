//! Who is signed in.
//!
//! Authentication itself happens elsewhere; the core only needs the current
//! user id and a way to hear about sign-in and sign-out.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use crate::error::{LifeGridError, LifeGridResult};
use crate::event::UserId;

pub trait SessionProvider {
    fn current_user_id(&self) -> Option<UserId>;

    /// Receives the new user id (or `None`) on every sign-in and sign-out.
    fn subscribe(&self) -> watch::Receiver<Option<UserId>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,
}

/// A session remembered in a `session.toml` file.
#[derive(Debug)]
pub struct LocalSession {
    path: PathBuf,
    tx: watch::Sender<Option<UserId>>,
}

impl LocalSession {
    /// Open the session stored at `path`. A missing file means signed out.
    pub fn open(path: impl Into<PathBuf>) -> LifeGridResult<Self> {
        let path = path.into();

        let file: SessionFile = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| {
                LifeGridError::Serialization(format!("Failed to parse {}: {e}", path.display()))
            })?
        } else {
            SessionFile::default()
        };

        let (tx, _) = watch::channel(file.user_id);
        Ok(LocalSession { path, tx })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sign_in(&self, user: UserId) -> LifeGridResult<()> {
        self.write(&SessionFile {
            user_id: Some(user.clone()),
        })?;
        info!(user = %user, "signed in");
        self.tx.send_replace(Some(user));
        Ok(())
    }

    pub fn sign_out(&self) -> LifeGridResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        if let Some(user) = self.tx.send_replace(None) {
            info!(user = %user, "signed out");
        }
        Ok(())
    }

    fn write(&self, file: &SessionFile) -> LifeGridResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(file).map_err(|e| LifeGridError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SessionProvider for LocalSession {
    fn current_user_id(&self) -> Option<UserId> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.tx.subscribe()
    }
}

/// The signed-in user, or `NotAuthenticated`.
pub fn require_user(session: &impl SessionProvider) -> LifeGridResult<UserId> {
    session
        .current_user_id()
        .ok_or(LifeGridError::NotAuthenticated)
}
