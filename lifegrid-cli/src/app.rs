//! Everything a command needs, built once from the global config.

use anyhow::{Result, bail};
use lifegrid_core::{
    Grid, LifeGridConfig, LifeHistory, LocalSession, LocalStore, SessionProvider,
    UserId,
};
use tracing::debug;

pub struct App {
    pub config: LifeGridConfig,
    pub session: LocalSession,
    pub history: LifeHistory<LocalStore, LocalStore>,
}

impl App {
    pub fn load() -> Result<Self> {
        let config = LifeGridConfig::load()?;
        let data_path = config.data_path();

        let store = LocalStore::open(&data_path)?;
        let session = LocalSession::open(data_path.join("session.toml"))?;
        let history = LifeHistory::new(store.clone(), store, config.grid_settings());
        debug!(data = %data_path.display(), "opened data directory");

        Ok(App {
            config,
            session,
            history,
        })
    }

    /// The signed-in user, or an error telling how to sign in.
    pub fn user(&self) -> Result<UserId> {
        match self.session.current_user_id() {
            Some(user) => Ok(user),
            None => bail!(
                "Not signed in.\n\n\
                Sign in with:\n  \
                lifegrid login <user>"
            ),
        }
    }

    /// The user's grid, or an error telling how to onboard.
    pub async fn grid(&self, user: &UserId) -> Result<Grid> {
        match self.history.load(user).await? {
            Some(grid) => Ok(grid),
            None => bail!(
                "No birth date set yet.\n\n\
                Set it with:\n  \
                lifegrid onboard YYYY-MM-DD"
            ),
        }
    }
}
