//! Core simulation for pixelpet.
//!
//! This crate holds the pet model and everything that drives it: the status
//! vocabulary, the time-driven lifecycle engine, care actions, the save
//! store, and the [`session::Session`] that ties a pet to a text/image
//! [`generate::Generator`]. It also carries the shared event bus and logging
//! subsystem used by the application shell.

pub mod adoption;
pub mod bus;
pub mod error;
pub mod event;
pub mod generate;
pub mod lifecycle;
pub mod logging;
pub mod pet;
pub mod prompt;
pub mod roster;
pub mod save;
pub mod session;
pub mod state;
pub mod status;
