//! API module for HTTP handlers, middleware, and DTOs.
//!
//! Every edge function is mounted under `/functions/v1/<name>` and answers
//! with the `{ "success": ... }` JSON envelope.

pub mod doc;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

#[cfg(test)]
mod tests;
