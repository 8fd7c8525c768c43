pub mod add;
pub mod config;
pub mod delete;
pub mod edit;
pub mod events;
pub mod grid;
pub mod onboard;
pub mod relocate;
pub mod session;
