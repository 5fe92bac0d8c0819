//! HTTP client for the LifeMix song-generation service.
//!
//! Provides the REST wrapper for the `/upload`, `/download` and `/health`
//! endpoints, a cancellable fixed-interval poll loop, platform event types,
//! and the [`workflow::JobClient`] that ties submission and polling to a
//! [`lifemix_core::session::Session`].

pub mod api;
pub mod backend;
pub mod events;
pub mod poller;
pub mod workflow;
