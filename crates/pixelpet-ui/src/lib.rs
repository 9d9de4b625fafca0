//! TUI rendering layer for pixelpet.
//!
//! Layout, the half-block sprite face, vitals gauges, chat and log panels,
//! and the adoption and farewell cards. All rendering uses [`ratatui`]; this
//! crate owns presentation while [`pixelpet_core`] owns the pet.

pub mod cards;
pub mod chat;
pub mod face;
pub mod layout;
pub mod log_panel;
pub mod shell;
pub mod vitals;
