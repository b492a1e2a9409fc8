//! HTTP handlers for the relay routes.

pub mod compute;
pub mod health;
