//! Life history events.
//!
//! An event is a dated note owned by one user. Its content is classified
//! once, when the event is constructed, into text, images or both.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LifeGridError, LifeGridResult};
use crate::month_key::{MonthKey, date_key};

/// Store-assigned event identifier. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user who owns an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored image attached to an event, resolved to a retrievable URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub name: String,
    pub url: String,
}

/// What an event holds. Decided at ingestion, never re-derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventContent {
    Text { text: String },
    Images { images: Vec<ImageRef> },
    Mixed { text: String, images: Vec<ImageRef> },
}

impl EventContent {
    /// Classify raw fields. Blank text counts as no text.
    pub fn classify(text: Option<String>, images: Vec<ImageRef>) -> LifeGridResult<Self> {
        let text = text.filter(|t| !t.trim().is_empty());

        match (text, images.is_empty()) {
            (Some(text), true) => Ok(EventContent::Text { text }),
            (None, false) => Ok(EventContent::Images { images }),
            (Some(text), false) => Ok(EventContent::Mixed { text, images }),
            (None, true) => Err(LifeGridError::InvalidContent),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            EventContent::Text { text } | EventContent::Mixed { text, .. } => Some(text),
            EventContent::Images { .. } => None,
        }
    }

    pub fn images(&self) -> &[ImageRef] {
        match self {
            EventContent::Images { images } | EventContent::Mixed { images, .. } => images,
            EventContent::Text { .. } => &[],
        }
    }

    pub fn is_text(&self) -> bool {
        self.text().is_some()
    }

    pub fn has_images(&self) -> bool {
        !self.images().is_empty()
    }
}

/// A dated note in a user's life history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub owner_id: UserId,
    pub date: NaiveDate,
    pub content: EventContent,
    pub last_modified: DateTime<Utc>,
}

impl Event {
    pub fn new(
        id: EventId,
        owner_id: UserId,
        date: NaiveDate,
        content: EventContent,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Event {
            id,
            owner_id,
            date,
            content,
            last_modified,
        }
    }

    /// `YYYY-MM-DD` key the grid groups by.
    pub fn date_key(&self) -> String {
        date_key(self.date)
    }

    pub fn month_key(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }

    /// Copy of this event moved to `date`, touched at `now`.
    pub fn moved_to(&self, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Event {
            date,
            last_modified: now,
            ..self.clone()
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.content {
            EventContent::Text { text } => write!(f, "{text}"),
            EventContent::Images { images } => write!(f, "[{} image(s)]", images.len()),
            EventContent::Mixed { text, images } => {
                write!(f, "{text} [{} image(s)]", images.len())
            }
        }
    }
}

/// Input for creating an event. The owner comes from the session.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub date: NaiveDate,
    pub text: Option<String>,
    /// Local files to upload into the event's bucket folder.
    pub image_files: Vec<PathBuf>,
}

impl NewEvent {
    pub fn text(date: NaiveDate, text: impl Into<String>) -> Self {
        NewEvent {
            date,
            text: Some(text.into()),
            image_files: Vec::new(),
        }
    }

    /// Checks the "text or at least one image" rule before anything is stored.
    pub fn validate(&self) -> LifeGridResult<()> {
        let has_text = self.text.as_deref().is_some_and(|t| !t.trim().is_empty());
        if has_text || !self.image_files.is_empty() {
            Ok(())
        } else {
            Err(LifeGridError::InvalidContent)
        }
    }
}

/// Partial update. `None` leaves a field as it is; new image files are
/// appended to the existing ones.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub date: Option<NaiveDate>,
    pub text: Option<String>,
    pub image_files: Vec<PathBuf>,
}

impl EventPatch {
    pub fn date(date: NaiveDate) -> Self {
        EventPatch {
            date: Some(date),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.text.is_none() && self.image_files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str) -> ImageRef {
        ImageRef {
            name: name.to_string(),
            url: format!("file:///bucket/{name}"),
        }
    }

    #[test]
    fn classify_text_only() {
        let content = EventContent::classify(Some("trip".into()), vec![]).unwrap();
        assert_eq!(content, EventContent::Text { text: "trip".into() });
        assert!(content.is_text());
        assert!(!content.has_images());
    }

    #[test]
    fn classify_images_only() {
        let content = EventContent::classify(None, vec![image("a.png")]).unwrap();
        assert!(matches!(content, EventContent::Images { .. }));
        assert_eq!(content.text(), None);
        assert_eq!(content.images().len(), 1);
    }

    #[test]
    fn classify_mixed() {
        let content =
            EventContent::classify(Some("beach".into()), vec![image("a.png"), image("b.png")])
                .unwrap();
        assert!(matches!(content, EventContent::Mixed { .. }));
        assert_eq!(content.text(), Some("beach"));
        assert_eq!(content.images().len(), 2);
    }

    #[test]
    fn blank_text_without_images_is_rejected() {
        assert!(matches!(
            EventContent::classify(Some("   ".into()), vec![]),
            Err(LifeGridError::InvalidContent)
        ));
        assert!(matches!(
            EventContent::classify(None, vec![]),
            Err(LifeGridError::InvalidContent)
        ));
    }

    #[test]
    fn blank_text_with_images_is_image_event() {
        let content = EventContent::classify(Some("".into()), vec![image("a.png")]).unwrap();
        assert!(matches!(content, EventContent::Images { .. }));
    }

    #[test]
    fn content_serializes_with_kind_tag() {
        let content = EventContent::Text { text: "hi".into() };
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["kind"], "text");
        assert_eq!(json["text"], "hi");
    }
}
