//! Core TaskMaster client library (session, gateways, dashboard controller).

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod http;
pub mod projects;
pub mod session;

pub use error::{ApiError, ApiResult, ValidationError};
