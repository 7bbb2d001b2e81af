//! `turmas-enroll` library crate.
//!
//! Draft loading and snapshot rendering for the command-line front end,
//! exposed for integration testing. The binary entrypoint lives in
//! `main.rs`.

pub mod draft;
pub mod render;
