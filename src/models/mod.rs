//! Domain types and HTTP request/response models
//!
//! This module defines the domain records held in the caches and the DTOs
//! used for serializing/deserializing HTTP bodies.

pub mod domain;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use domain::{
    AuthContext, Credentials, GoHighLevelCredentials, IntegrationStatus, Provider, WorkspaceRole,
    ZoomCredentials,
};
pub use requests::UpdateStatusRequest;
pub use responses::{
    CacheStatsResponse, HealthResponse, IntegrationResponse, InvalidateResponse, StatsResponse,
    UpdateResponse,
};
