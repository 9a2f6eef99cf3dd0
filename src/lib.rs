//! Category posts sidebar widget backed by an event-invalidated render cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
