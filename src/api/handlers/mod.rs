//! HTTP request handlers for API endpoints.

pub mod functions;
pub mod health;
pub mod realtime;
