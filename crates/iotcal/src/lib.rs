//! E-paper dashboard built on the `iotcal_core` memoization cache.
//!
//! The dashboard lists calendar events, looks up the weather and renders an
//! image. Each step goes through a cached decorator so frequent refreshes
//! stay cheap for the remote APIs and the renderer.

pub mod cached;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod mock_data;
pub mod models;
pub mod sources;
