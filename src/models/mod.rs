//! Request and Response models for the HTTP adapter
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{AdvanceRequest, BooksParams};
pub use responses::{
    AdvanceResponse, DeleteResponse, HealthResponse, LookupResponse, StatsResponse,
    VersionResponse, VersionsResponse,
};
