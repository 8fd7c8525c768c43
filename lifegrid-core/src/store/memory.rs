//! In-memory store, used in tests and as a stand-in backend.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};

use crate::error::{LifeGridError, LifeGridResult};
use crate::event::{Event, EventContent, EventId, EventPatch, ImageRef, NewEvent, UserId};
use crate::store::{EventStore, UserProfile, UserProfileStore};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    events: BTreeMap<EventId, Event>,
    profiles: HashMap<UserId, UserProfile>,
    last_id: i64,
    fail_writes: bool,
}

impl MemoryState {
    fn check_writable(&self) -> LifeGridResult<()> {
        if self.fail_writes {
            return Err(LifeGridError::Store("store is unavailable".into()));
        }
        Ok(())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every write fails with a store error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Seed an event as-is, keeping its id.
    pub fn insert(&self, event: Event) {
        let mut state = self.state();
        state.last_id = state.last_id.max(event.id.0);
        state.events.insert(event.id, event);
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn image_refs(owner: &UserId, id: EventId, files: &[PathBuf]) -> Vec<ImageRef> {
    files
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| {
            let name = name.to_string_lossy().into_owned();
            ImageRef {
                url: format!("memory://{owner}/{id}/{name}"),
                name,
            }
        })
        .collect()
}

impl EventStore for MemoryStore {
    async fn list_events(&self, owner: &UserId) -> LifeGridResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .state()
            .events
            .values()
            .filter(|e| &e.owner_id == owner)
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.date, e.id));
        Ok(events)
    }

    async fn get_event(&self, id: EventId) -> LifeGridResult<Event> {
        self.state()
            .events
            .get(&id)
            .cloned()
            .ok_or(LifeGridError::UnknownEvent(id))
    }

    async fn create_event(&self, owner: &UserId, event: NewEvent) -> LifeGridResult<EventId> {
        event.validate()?;

        let mut state = self.state();
        state.check_writable()?;

        state.last_id += 1;
        let id = EventId(state.last_id);
        let content = EventContent::classify(event.text, image_refs(owner, id, &event.image_files))?;

        state.events.insert(
            id,
            Event::new(id, owner.clone(), event.date, content, Utc::now()),
        );
        Ok(id)
    }

    async fn update_event(&self, id: EventId, patch: EventPatch) -> LifeGridResult<Event> {
        let mut state = self.state();
        state.check_writable()?;

        let current = state
            .events
            .get(&id)
            .ok_or(LifeGridError::UnknownEvent(id))?;

        let text = patch
            .text
            .or_else(|| current.content.text().map(String::from));
        let mut images = current.content.images().to_vec();
        images.extend(image_refs(&current.owner_id, id, &patch.image_files));

        let updated = Event {
            date: patch.date.unwrap_or(current.date),
            content: EventContent::classify(text, images)?,
            last_modified: Utc::now(),
            ..current.clone()
        };

        state.events.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_event(&self, id: EventId) -> LifeGridResult<()> {
        let mut state = self.state();
        state.check_writable()?;

        state
            .events
            .remove(&id)
            .map(|_| ())
            .ok_or(LifeGridError::UnknownEvent(id))
    }
}

impl UserProfileStore for MemoryStore {
    async fn get_profile(&self, id: &UserId) -> LifeGridResult<UserProfile> {
        self.state()
            .profiles
            .get(id)
            .cloned()
            .ok_or_else(|| LifeGridError::UserNotFound(id.to_string()))
    }

    async fn save_profile(&self, profile: &UserProfile) -> LifeGridResult<()> {
        let mut state = self.state();
        state.check_writable()?;
        state.profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn set_birth_date(&self, id: &UserId, date: NaiveDate) -> LifeGridResult<()> {
        let mut state = self.state();
        state.check_writable()?;

        let profile = state
            .profiles
            .get_mut(id)
            .ok_or_else(|| LifeGridError::UserNotFound(id.to_string()))?;
        profile.birth_date = Some(date);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let owner = UserId::new("u1");

        let a = store
            .create_event(&owner, NewEvent::text(date(2020, 1, 1), "a"))
            .await
            .unwrap();
        let b = store
            .create_event(&owner, NewEvent::text(date(2020, 1, 2), "b"))
            .await
            .unwrap();
        assert!(b > a);

        store.delete_event(b).await.unwrap();
        let c = store
            .create_event(&owner, NewEvent::text(date(2020, 1, 3), "c"))
            .await
            .unwrap();
        assert!(c > b, "ids are never reused");
    }

    #[tokio::test]
    async fn list_only_returns_owned_events() {
        let store = MemoryStore::new();
        store
            .create_event(&UserId::new("u1"), NewEvent::text(date(2020, 1, 1), "mine"))
            .await
            .unwrap();
        store
            .create_event(&UserId::new("u2"), NewEvent::text(date(2020, 1, 1), "theirs"))
            .await
            .unwrap();

        let events = store.list_events(&UserId::new("u1")).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].content.text(), Some("mine"));
    }

    #[tokio::test]
    async fn update_appends_images_and_keeps_text() {
        let store = MemoryStore::new();
        let owner = UserId::new("u1");
        let id = store
            .create_event(&owner, NewEvent::text(date(2020, 1, 1), "beach"))
            .await
            .unwrap();

        let updated = store
            .update_event(
                id,
                EventPatch {
                    image_files: vec![PathBuf::from("/tmp/photo.jpg")],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.content.text(), Some("beach"));
        assert_eq!(updated.content.images()[0].url, format!("memory://u1/{id}/photo.jpg"));
        assert!(matches!(updated.content, EventContent::Mixed { .. }));
    }

    #[tokio::test]
    async fn clearing_the_only_content_is_rejected() {
        let store = MemoryStore::new();
        let owner = UserId::new("u1");
        let id = store
            .create_event(&owner, NewEvent::text(date(2020, 1, 1), "note"))
            .await
            .unwrap();

        let result = store
            .update_event(
                id,
                EventPatch {
                    text: Some(String::new()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(LifeGridError::InvalidContent)));
        assert_eq!(
            store.get_event(id).await.unwrap().content.text(),
            Some("note")
        );
    }

    #[tokio::test]
    async fn failing_writes_leave_data_alone() {
        let store = MemoryStore::new();
        let owner = UserId::new("u1");
        let id = store
            .create_event(&owner, NewEvent::text(date(2020, 1, 1), "note"))
            .await
            .unwrap();

        store.set_fail_writes(true);
        let result = store.update_event(id, EventPatch::date(date(2021, 5, 15))).await;
        assert!(matches!(result, Err(LifeGridError::Store(_))));
        assert_eq!(store.get_event(id).await.unwrap().date, date(2020, 1, 1));
    }

    #[tokio::test]
    async fn birth_date_requires_profile() {
        let store = MemoryStore::new();
        let id = UserId::new("u1");

        assert!(matches!(
            store.set_birth_date(&id, date(1990, 6, 15)).await,
            Err(LifeGridError::UserNotFound(_))
        ));

        store
            .save_profile(&UserProfile::new(id.clone(), "Ada"))
            .await
            .unwrap();
        store.set_birth_date(&id, date(1990, 6, 15)).await.unwrap();

        let profile = store.get_profile(&id).await.unwrap();
        assert_eq!(profile.birth_date, Some(date(1990, 6, 15)));
        assert!(!profile.needs_onboarding());
    }
}
