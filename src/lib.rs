//! rxwatch - live operator console for a medication name confusion-risk service
//!
//! The library keeps one consistent dashboard view fed by two sources at once:
//! on-demand request/response calls to the risk backend, and a long-lived push
//! channel delivering metric updates.
//!
//! - [`state`] holds the shared [`state::StateStore`]; every write swaps in a
//!   whole new snapshot.
//! - [`stream`] runs the push channel and only talks to the rest of the
//!   system through store writes.
//! - [`analytics`] turns raw payloads into ranked, normalized and
//!   matrix-shaped view-models.
//! - [`interaction`] handles operator events and re-renders via [`view`].
//! - [`risk`] is the single place scores become categories.

pub mod analytics;
pub mod cli;
pub mod client;
pub mod config;
pub mod interaction;
pub mod logging;
pub mod risk;
pub mod state;
pub mod stream;
pub mod view;
