//! HTTP client for the student registration service.
//!
//! Wraps the two endpoints the enrollment form needs (name-collision
//! lookup and enrollment submission) and plugs them into
//! [`turmas_core::controller::RegistrationService`].

pub mod api;
pub mod config;

pub use api::{RegistrationApi, RegistrationApiError};
pub use config::{ClientConfig, ConfigError};
