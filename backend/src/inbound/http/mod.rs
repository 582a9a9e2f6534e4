//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod error;
pub mod health;
pub mod me;
mod requester;
pub mod routes;
pub mod schemas;
pub mod session;
pub mod state;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod users;
mod validation;

pub use crate::domain::ApiResult;
