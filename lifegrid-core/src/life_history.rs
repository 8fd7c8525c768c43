//! Ties the grid to its stores.
//!
//! [`LifeHistory`] is handed its stores when it is built and holds no other
//! state besides the relocation ledger.

use std::sync::{Mutex, PoisonError};

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::config::GridSettings;
use crate::error::{LifeGridError, LifeGridResult};
use crate::event::{Event, EventId, EventPatch, NewEvent, UserId};
use crate::grid::Grid;
use crate::month_key::MonthKey;
use crate::relocation::{Completion, Relocation, RelocationLedger};
use crate::store::{EventStore, UserProfile, UserProfileStore};

pub struct LifeHistory<E, P> {
    events: E,
    profiles: P,
    settings: GridSettings,
    ledger: Mutex<RelocationLedger>,
}

impl<E: EventStore, P: UserProfileStore> LifeHistory<E, P> {
    pub fn new(events: E, profiles: P, settings: GridSettings) -> Self {
        LifeHistory {
            events,
            profiles,
            settings,
            ledger: Mutex::new(RelocationLedger::new()),
        }
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn profiles(&self) -> &P {
        &self.profiles
    }

    pub fn settings(&self) -> GridSettings {
        self.settings
    }

    pub async fn profile(&self, user: &UserId) -> LifeGridResult<UserProfile> {
        self.profiles.get_profile(user).await
    }

    /// Create the profile on first sign-in. An existing profile keeps its
    /// birth date; name and avatar are refreshed.
    pub async fn register(&self, profile: UserProfile) -> LifeGridResult<UserProfile> {
        let profile = match self.profiles.get_profile(&profile.id).await {
            Ok(existing) => UserProfile {
                birth_date: existing.birth_date,
                ..profile
            },
            Err(LifeGridError::UserNotFound(_)) => {
                info!(user = %profile.id, "new user");
                profile
            }
            Err(e) => return Err(e),
        };

        self.profiles.save_profile(&profile).await?;
        Ok(profile)
    }

    /// The user's grid, or `None` if they have not given a birth date yet.
    pub async fn load(&self, user: &UserId) -> LifeGridResult<Option<Grid>> {
        let profile = self.profiles.get_profile(user).await?;
        let Some(birth_date) = profile.birth_date else {
            debug!(user = %user, "no birth date, no grid yet");
            return Ok(None);
        };

        let events = self.events.list_events(user).await?;
        Grid::build(birth_date, &events, self.settings.span_years).map(Some)
    }

    /// Store the birth date and build the first grid.
    pub async fn onboard(&self, user: &UserId, birth_date: NaiveDate) -> LifeGridResult<Grid> {
        self.profiles.set_birth_date(user, birth_date).await?;
        info!(user = %user, %birth_date, "onboarded");

        let events = self.events.list_events(user).await?;
        Grid::build(birth_date, &events, self.settings.span_years)
    }

    pub async fn events_of(&self, user: &UserId) -> LifeGridResult<Vec<Event>> {
        self.events.list_events(user).await
    }

    pub async fn create_event(&self, user: &UserId, event: NewEvent) -> LifeGridResult<EventId> {
        let id = self.events.create_event(user, event).await?;
        info!(user = %user, event = %id, "event created");
        Ok(id)
    }

    /// Fetch an event, treating other users' events as missing.
    pub async fn event(&self, user: &UserId, id: EventId) -> LifeGridResult<Event> {
        let event = self.events.get_event(id).await?;
        if &event.owner_id != user {
            return Err(LifeGridError::UnknownEvent(id));
        }
        Ok(event)
    }

    pub async fn update_event(
        &self,
        user: &UserId,
        id: EventId,
        patch: EventPatch,
    ) -> LifeGridResult<Event> {
        if patch.is_empty() {
            return Err(LifeGridError::InvalidInput("Nothing to update".into()));
        }

        self.event(user, id).await?;
        let event = self.events.update_event(id, patch).await?;
        info!(event = %id, "event updated");
        Ok(event)
    }

    pub async fn delete_event(&self, user: &UserId, id: EventId) -> LifeGridResult<()> {
        self.event(user, id).await?;
        self.events.delete_event(id).await?;
        info!(event = %id, "event deleted");
        Ok(())
    }

    /// Apply a move to `grid` locally and register it as pending.
    ///
    /// The returned relocation's optimistic grid can be shown right away;
    /// hand it to [`LifeHistory::persist_relocation`] afterwards.
    pub fn begin_relocation(
        &self,
        grid: &Grid,
        event_id: EventId,
        source: MonthKey,
        target: MonthKey,
    ) -> LifeGridResult<Relocation> {
        let relocated = grid.relocate(
            event_id,
            source,
            target,
            self.settings.canonical_day,
            Utc::now(),
        )?;

        let relocation = self.ledger().start(grid, relocated);
        debug!(
            seq = relocation.seq(),
            event = %event_id,
            %source,
            %target,
            "relocation pending"
        );
        Ok(relocation)
    }

    /// Write the relocation's date to the store and settle it.
    pub async fn persist_relocation(
        &self,
        mut relocation: Relocation,
    ) -> LifeGridResult<Completion> {
        let result = if relocation.source() == relocation.target() {
            Ok(())
        } else {
            self.events
                .update_event(relocation.event_id(), EventPatch::date(relocation.target_date()))
                .await
                .map(|_| ())
        };

        let completion = self.ledger().complete(&mut relocation, result)?;
        match &completion {
            Completion::Committed(_) => info!(
                event = %relocation.event_id(),
                target = %relocation.target(),
                date = %relocation.target_date(),
                "relocation committed"
            ),
            Completion::RolledBack { error, .. } => warn!(
                event = %relocation.event_id(),
                error = %error,
                "relocation rolled back"
            ),
            Completion::Stale => debug!(
                seq = relocation.seq(),
                state = %relocation.state(),
                "superseded relocation settled"
            ),
        }

        Ok(completion)
    }

    /// [`LifeHistory::begin_relocation`] followed by
    /// [`LifeHistory::persist_relocation`].
    pub async fn relocate(
        &self,
        grid: &Grid,
        event_id: EventId,
        source: MonthKey,
        target: MonthKey,
    ) -> LifeGridResult<Completion> {
        let relocation = self.begin_relocation(grid, event_id, source, target)?;
        self.persist_relocation(relocation).await
    }

    /// Relocations started but not yet settled.
    pub fn relocations_in_flight(&self) -> usize {
        self.ledger().in_flight()
    }

    fn ledger(&self) -> std::sync::MutexGuard<'_, RelocationLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
