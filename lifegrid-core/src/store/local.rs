//! Directory-backed store.
//!
//! Layout under the data directory:
//!
//! ```text
//! events/<id>.toml            one file per event
//! events/next_id              last id handed out
//! bucket/<owner>/<id>/<file>  uploaded images
//! users/<id>.toml             profiles
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::error::{LifeGridError, LifeGridResult};
use crate::event::{Event, EventContent, EventId, EventPatch, ImageRef, NewEvent, UserId};
use crate::store::{EventStore, UserProfile, UserProfileStore};

const NEXT_ID_FILE: &str = "next_id";

/// How an event is written to disk. Images are kept as bucket file names
/// and resolved to URLs on read.
#[derive(Debug, Serialize, Deserialize)]
struct EventRecord {
    id: EventId,
    owner_id: UserId,
    date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    id_lock: Arc<Mutex<()>>,
}

impl LocalStore {
    pub fn open(root: impl AsRef<Path>) -> LifeGridResult<Self> {
        let root = std::path::absolute(root.as_ref())?;

        for dir in ["events", "bucket", "users"] {
            std::fs::create_dir_all(root.join(dir))?;
        }

        Ok(LocalStore {
            root,
            id_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn events_dir(&self) -> PathBuf {
        self.root.join("events")
    }

    fn event_path(&self, id: EventId) -> PathBuf {
        self.events_dir().join(format!("{id}.toml"))
    }

    fn bucket_path(&self, owner: &UserId, id: EventId) -> LifeGridResult<PathBuf> {
        Ok(self
            .root
            .join("bucket")
            .join(path_component(owner.as_str())?)
            .join(id.to_string()))
    }

    fn profile_path(&self, id: &UserId) -> LifeGridResult<PathBuf> {
        Ok(self
            .root
            .join("users")
            .join(format!("{}.toml", path_component(id.as_str())?)))
    }

    async fn read_record(&self, id: EventId) -> LifeGridResult<EventRecord> {
        let path = self.event_path(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LifeGridError::UnknownEvent(id));
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content).map_err(|e| {
            LifeGridError::Serialization(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    async fn write_record(&self, record: &EventRecord) -> LifeGridResult<()> {
        let content = toml::to_string_pretty(record)
            .map_err(|e| LifeGridError::Serialization(e.to_string()))?;
        write_atomic(&self.event_path(record.id), &content).await
    }

    /// Allocate the next id. Ids only grow, so deleted ids are never reused.
    async fn next_id(&self) -> LifeGridResult<EventId> {
        let _guard = self.id_lock.lock().await;
        let path = self.events_dir().join(NEXT_ID_FILE);

        let last: i64 = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content.trim().parse().map_err(|_| {
                LifeGridError::Store(format!("Corrupt id counter in {}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let next = last + 1;
        write_atomic(&path, &next.to_string()).await?;
        Ok(EventId(next))
    }

    /// Copy `files` into the event's bucket folder. Returns the stored names.
    /// On failure, files copied by this call are removed again.
    async fn upload(
        &self,
        owner: &UserId,
        id: EventId,
        files: &[PathBuf],
    ) -> LifeGridResult<Vec<String>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let bucket = self.bucket_path(owner, id)?;
        tokio::fs::create_dir_all(&bucket).await?;

        let mut names = Vec::with_capacity(files.len());
        for file in files {
            match copy_into_bucket(&bucket, file).await {
                Ok(name) => {
                    debug!(event = %id, file = %name, "uploaded image");
                    names.push(name);
                }
                Err(e) => {
                    discard_uploads(&bucket, &names).await;
                    return Err(e);
                }
            }
        }

        Ok(names)
    }

    fn resolve(&self, record: EventRecord) -> LifeGridResult<Event> {
        let bucket = self.bucket_path(&record.owner_id, record.id)?;

        let images = record
            .images
            .into_iter()
            .map(|name| {
                let path = bucket.join(&name);
                let url = Url::from_file_path(&path).map_err(|_| {
                    LifeGridError::Store(format!("Cannot build a URL for {}", path.display()))
                })?;
                Ok(ImageRef {
                    name,
                    url: url.to_string(),
                })
            })
            .collect::<LifeGridResult<Vec<_>>>()?;

        Ok(Event::new(
            record.id,
            record.owner_id,
            record.date,
            EventContent::classify(record.text, images)?,
            record.last_modified,
        ))
    }
}

impl EventStore for LocalStore {
    async fn list_events(&self, owner: &UserId) -> LifeGridResult<Vec<Event>> {
        let mut entries = tokio::fs::read_dir(self.events_dir()).await?;
        let mut events = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let id = path
                .extension()
                .filter(|ext| *ext == "toml")
                .and_then(|_| path.file_stem())
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<i64>().ok());

            let Some(id) = id else {
                continue;
            };

            match self.read_record(EventId(id)).await {
                Ok(record) if &record.owner_id == owner => match self.resolve(record) {
                    Ok(event) => events.push(event),
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable event"),
                },
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable event"),
            }
        }

        events.sort_by_key(|e| (e.date, e.id));
        Ok(events)
    }

    async fn get_event(&self, id: EventId) -> LifeGridResult<Event> {
        let record = self.read_record(id).await?;
        self.resolve(record)
    }

    async fn create_event(&self, owner: &UserId, event: NewEvent) -> LifeGridResult<EventId> {
        event.validate()?;
        path_component(owner.as_str())?;

        let id = self.next_id().await?;
        let images = self.upload(owner, id, &event.image_files).await?;

        let record = EventRecord {
            id,
            owner_id: owner.clone(),
            date: event.date,
            text: event.text.filter(|t| !t.trim().is_empty()),
            images,
            last_modified: Utc::now(),
        };
        if let Err(e) = self.write_record(&record).await {
            discard_uploads(&self.bucket_path(owner, id)?, &record.images).await;
            return Err(e);
        }

        debug!(event = %id, owner = %owner, "created event");
        Ok(id)
    }

    async fn update_event(&self, id: EventId, patch: EventPatch) -> LifeGridResult<Event> {
        let mut record = self.read_record(id).await?;

        let text = patch.text.or(record.text.take());
        let has_text = text.as_deref().is_some_and(|t| !t.trim().is_empty());
        if !has_text && record.images.is_empty() && patch.image_files.is_empty() {
            return Err(LifeGridError::InvalidContent);
        }

        let uploaded = self
            .upload(&record.owner_id, id, &patch.image_files)
            .await?;

        record.text = text.filter(|t| !t.trim().is_empty());
        record.images.extend(uploaded.iter().cloned());
        if let Some(date) = patch.date {
            record.date = date;
        }
        record.last_modified = Utc::now();

        if let Err(e) = self.write_record(&record).await {
            discard_uploads(&self.bucket_path(&record.owner_id, id)?, &uploaded).await;
            return Err(e);
        }
        self.resolve(record)
    }

    async fn delete_event(&self, id: EventId) -> LifeGridResult<()> {
        let record = self.read_record(id).await?;

        tokio::fs::remove_file(self.event_path(id)).await?;

        let bucket = self.bucket_path(&record.owner_id, id)?;
        if tokio::fs::try_exists(&bucket).await? {
            tokio::fs::remove_dir_all(&bucket).await?;
        }

        debug!(event = %id, "deleted event");
        Ok(())
    }
}

impl UserProfileStore for LocalStore {
    async fn get_profile(&self, id: &UserId) -> LifeGridResult<UserProfile> {
        let path = self.profile_path(id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LifeGridError::UserNotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content).map_err(|e| {
            LifeGridError::Serialization(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    async fn save_profile(&self, profile: &UserProfile) -> LifeGridResult<()> {
        let content = toml::to_string_pretty(profile)
            .map_err(|e| LifeGridError::Serialization(e.to_string()))?;
        write_atomic(&self.profile_path(&profile.id)?, &content).await
    }

    async fn set_birth_date(&self, id: &UserId, date: NaiveDate) -> LifeGridResult<()> {
        let mut profile = self.get_profile(id).await?;
        profile.birth_date = Some(date);
        self.save_profile(&profile).await
    }
}

/// Reject ids that would escape their directory.
fn path_component(s: &str) -> LifeGridResult<&str> {
    if s.is_empty() || s == "." || s == ".." || s.contains(['/', '\\']) {
        return Err(LifeGridError::InvalidInput(format!(
            "'{s}' cannot be used as an identifier"
        )));
    }
    Ok(s)
}

/// Write through a temp file so readers never see a half-written file.
async fn write_atomic(path: &Path, content: &str) -> LifeGridResult<()> {
    let temp = path.with_extension("tmp");
    tokio::fs::write(&temp, content).await?;
    tokio::fs::rename(&temp, path).await?;
    Ok(())
}

async fn copy_into_bucket(bucket: &Path, file: &Path) -> LifeGridResult<String> {
    let base = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| LifeGridError::InvalidInput(format!("Not a file: {}", file.display())))?;
    let name = unique_file_name(bucket, &base)?;

    tokio::fs::copy(file, bucket.join(&name))
        .await
        .map_err(|e| LifeGridError::Store(format!("Failed to upload {}: {e}", file.display())))?;

    Ok(name)
}

/// Remove images uploaded for a write that did not land, then the bucket
/// folder if nothing else is left in it.
async fn discard_uploads(bucket: &Path, names: &[String]) {
    for name in names {
        if let Err(e) = tokio::fs::remove_file(bucket.join(name)).await {
            warn!(file = %name, error = %e, "could not remove uploaded image");
        }
    }
    // Fails when the folder still holds earlier images.
    let _ = tokio::fs::remove_dir(bucket).await;
}

/// `photo.jpg`, then `photo-2.jpg`, `photo-3.jpg`, ... if taken.
fn unique_file_name(dir: &Path, base: &str) -> LifeGridResult<String> {
    if !dir.join(base).exists() {
        return Ok(base.to_string());
    }

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (base, None),
    };

    for n in 2..=100 {
        let candidate = match ext {
            Some(ext) => format!("{stem}-{n}.{ext}"),
            None => format!("{stem}-{n}"),
        };
        if !dir.join(&candidate).exists() {
            return Ok(candidate);
        }
    }

    Err(LifeGridError::Store(format!(
        "Too many file name collisions for '{base}'"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_components_cannot_escape() {
        assert!(path_component("user-1").is_ok());
        assert!(path_component("").is_err());
        assert!(path_component("..").is_err());
        assert!(path_component("a/b").is_err());
        assert!(path_component("a\\b").is_err());
    }

    #[test]
    fn unique_file_name_adds_suffix() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(unique_file_name(dir.path(), "photo.jpg").unwrap(), "photo.jpg");

        std::fs::write(dir.path().join("photo.jpg"), b"x").unwrap();
        assert_eq!(unique_file_name(dir.path(), "photo.jpg").unwrap(), "photo-2.jpg");

        std::fs::write(dir.path().join("photo-2.jpg"), b"x").unwrap();
        assert_eq!(unique_file_name(dir.path(), "photo.jpg").unwrap(), "photo-3.jpg");

        std::fs::write(dir.path().join("README"), b"x").unwrap();
        assert_eq!(unique_file_name(dir.path(), "README").unwrap(), "README-2");
    }

    #[test]
    fn record_round_trips_through_toml() {
        let record = EventRecord {
            id: EventId(7),
            owner_id: UserId::new("u1"),
            date: NaiveDate::from_ymd_opt(2020, 3, 10).unwrap(),
            text: Some("trip".into()),
            images: vec!["a.png".into()],
            last_modified: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        let toml = toml::to_string_pretty(&record).unwrap();
        assert!(toml.contains("date = \"2020-03-10\""));

        let back: EventRecord = toml::from_str(&toml).unwrap();
        assert_eq!(back.id, EventId(7));
        assert_eq!(back.images, vec!["a.png".to_string()]);
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn events_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let owner = UserId::new("u1");

        let id = {
            let store = LocalStore::open(dir.path()).unwrap();
            store
                .create_event(&owner, NewEvent::text(date(2020, 3, 10), "trip"))
                .await
                .unwrap()
        };

        let store = LocalStore::open(dir.path()).unwrap();
        let events = store.list_events(&owner).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, id);
        assert_eq!(events[0].date, date(2020, 3, 10));
        assert_eq!(events[0].content.text(), Some("trip"));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        let owner = UserId::new("u1");

        let a = store
            .create_event(&owner, NewEvent::text(date(2020, 1, 1), "a"))
            .await
            .unwrap();
        store.delete_event(a).await.unwrap();
        let b = store
            .create_event(&owner, NewEvent::text(date(2020, 1, 2), "b"))
            .await
            .unwrap();

        assert!(b > a);
        assert!(matches!(
            store.get_event(a).await,
            Err(LifeGridError::UnknownEvent(_))
        ));
    }

    #[tokio::test]
    async fn images_are_uploaded_into_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("data")).unwrap();
        let owner = UserId::new("u1");

        let photo = dir.path().join("photo.jpg");
        std::fs::write(&photo, b"jpeg").unwrap();

        let id = store
            .create_event(
                &owner,
                NewEvent {
                    date: date(2020, 3, 10),
                    text: None,
                    image_files: vec![photo.clone(), photo],
                },
            )
            .await
            .unwrap();

        let event = store.get_event(id).await.unwrap();
        assert!(matches!(event.content, EventContent::Images { .. }));

        let names: Vec<_> = event.content.images().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["photo.jpg", "photo-2.jpg"]);
        assert!(event.content.images()[0].url.starts_with("file://"));

        let bucket = store.root().join("bucket").join("u1").join(id.to_string());
        assert!(bucket.join("photo-2.jpg").exists());

        store.delete_event(id).await.unwrap();
        assert!(!bucket.exists());
    }

    #[tokio::test]
    async fn failed_create_leaves_no_uploads_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("data")).unwrap();
        let owner = UserId::new("u1");

        let photo = dir.path().join("photo.jpg");
        std::fs::write(&photo, b"jpeg").unwrap();

        let result = store
            .create_event(
                &owner,
                NewEvent {
                    date: date(2020, 3, 10),
                    text: None,
                    image_files: vec![photo, dir.path().join("missing.jpg")],
                },
            )
            .await;
        assert!(matches!(result, Err(LifeGridError::Store(_))));

        let owner_bucket = store.root().join("bucket").join("u1");
        let leftovers = std::fs::read_dir(&owner_bucket)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
        assert!(store.list_events(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_update_keeps_earlier_images_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("data")).unwrap();
        let owner = UserId::new("u1");

        let photo = dir.path().join("photo.jpg");
        std::fs::write(&photo, b"jpeg").unwrap();

        let id = store
            .create_event(
                &owner,
                NewEvent {
                    date: date(2020, 3, 10),
                    text: None,
                    image_files: vec![photo.clone()],
                },
            )
            .await
            .unwrap();

        let result = store
            .update_event(
                id,
                EventPatch {
                    image_files: vec![photo, dir.path().join("missing.jpg")],
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_err());

        let bucket = store.root().join("bucket").join("u1").join(id.to_string());
        let mut files: Vec<String> = std::fs::read_dir(&bucket)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(files, vec!["photo.jpg"]);

        let event = store.get_event(id).await.unwrap();
        assert_eq!(event.content.images().len(), 1);
    }

    #[tokio::test]
    async fn update_moves_date_and_bumps_last_modified() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        let owner = UserId::new("u1");

        let id = store
            .create_event(&owner, NewEvent::text(date(2020, 3, 10), "trip"))
            .await
            .unwrap();
        let before = store.get_event(id).await.unwrap();

        let after = store
            .update_event(id, EventPatch::date(date(2021, 7, 15)))
            .await
            .unwrap();

        assert_eq!(after.date, date(2021, 7, 15));
        assert_eq!(after.content.text(), Some("trip"));
        assert!(after.last_modified >= before.last_modified);
        assert_eq!(store.get_event(id).await.unwrap().date, date(2021, 7, 15));
    }

    #[tokio::test]
    async fn unreadable_records_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        let owner = UserId::new("u1");

        store
            .create_event(&owner, NewEvent::text(date(2020, 3, 10), "trip"))
            .await
            .unwrap();
        std::fs::write(store.root().join("events").join("99.toml"), "not = [valid").unwrap();

        let events = store.list_events(&owner).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn profiles_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        let id = UserId::new("ada");

        assert!(matches!(
            store.get_profile(&id).await,
            Err(LifeGridError::UserNotFound(_))
        ));

        store
            .save_profile(&UserProfile::new(id.clone(), "Ada"))
            .await
            .unwrap();
        assert!(store.get_profile(&id).await.unwrap().needs_onboarding());

        store.set_birth_date(&id, date(1990, 6, 15)).await.unwrap();
        let profile = store.get_profile(&id).await.unwrap();
        assert_eq!(profile.birth_date, Some(date(1990, 6, 15)));
        assert_eq!(profile.display_name, "Ada");
    }
}
