//! Domain types and form state for the LifeMix song generator.
//!
//! Everything here is transport-agnostic: media selection, generation
//! parameters, the wire shapes exchanged with the generation service, and
//! the [`session::Session`] state machine that a front end drives.

pub mod error;
pub mod media;
pub mod params;
pub mod result;
pub mod session;
