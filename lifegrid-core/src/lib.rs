//! Core of lifegrid: a life history laid out as a grid of months.
//!
//! This crate provides everything the front ends share:
//! - `Event` and its content variants
//! - `Grid`, built from a birth date and events, and relocation of events
//!   between months
//! - `Relocation` bookkeeping for optimistic moves with rollback
//! - store and session traits, with in-memory and directory implementations
//! - configuration

pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod life_history;
pub mod month_key;
pub mod relocation;
pub mod session;
pub mod store;
pub mod units;

pub use config::{GridSettings, LifeGridConfig};
pub use error::{LifeGridError, LifeGridResult};
pub use event::*;
pub use grid::{Decade, Grid, Month, Relocated, Year};
pub use life_history::LifeHistory;
pub use month_key::{MonthKey, date_key, parse_birth_date, parse_date};
pub use relocation::{Completion, Relocation, RelocationLedger, RelocationState};
pub use session::{LocalSession, SessionProvider, require_user};
pub use store::{EventStore, LocalStore, MemoryStore, UserProfile, UserProfileStore};
pub use units::{LifeUnit, TimeUnit, time_unit_options};
