//! Persistence collaborators.
//!
//! The grid never talks to storage. Whatever orchestrates it is handed an
//! [`EventStore`] and a [`UserProfileStore`] explicitly; there are no
//! process-wide clients.

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::LifeGridResult;
use crate::event::{Event, EventId, EventPatch, NewEvent, UserId};

/// Remote persistence for events and their attached images.
#[allow(async_fn_in_trait)]
pub trait EventStore {
    /// All events owned by `owner`, with image URLs resolved.
    async fn list_events(&self, owner: &UserId) -> LifeGridResult<Vec<Event>>;

    async fn get_event(&self, id: EventId) -> LifeGridResult<Event>;

    /// Persist a new event and upload its image files under
    /// `owner/event_id/`. Returns the assigned id.
    async fn create_event(&self, owner: &UserId, event: NewEvent) -> LifeGridResult<EventId>;

    /// Apply `patch` and bump `last_modified`. Also used for relocation.
    async fn update_event(&self, id: EventId, patch: EventPatch) -> LifeGridResult<Event>;

    /// Remove the event together with its stored files.
    async fn delete_event(&self, id: EventId) -> LifeGridResult<()>;
}

/// A user's profile as the application sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Unset until onboarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}

impl UserProfile {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        UserProfile {
            id,
            display_name: display_name.into(),
            avatar_url: None,
            birth_date: None,
        }
    }

    pub fn needs_onboarding(&self) -> bool {
        self.birth_date.is_none()
    }
}

#[allow(async_fn_in_trait)]
pub trait UserProfileStore {
    async fn get_profile(&self, id: &UserId) -> LifeGridResult<UserProfile>;

    /// Create or replace a profile (first sign-in).
    async fn save_profile(&self, profile: &UserProfile) -> LifeGridResult<()>;

    async fn set_birth_date(&self, id: &UserId, date: NaiveDate) -> LifeGridResult<()>;
}
