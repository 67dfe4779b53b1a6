//! Workspace Cache - credential and session caching for the webinar dashboard
//!
//! Expiring caches in front of Supabase for integration credentials, bearer
//! tokens and workspace memberships, plus the HTTP service exposing them.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod supabase;
pub mod tasks;

pub use api::{AppState, Sources};
pub use cache::{CachePolicy, CacheSet, TtlCache};
pub use config::Config;
pub use error::{Result, ServiceError};
pub use tasks::spawn_sweep_task;
