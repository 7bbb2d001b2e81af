//! Student enrollment form logic.
//!
//! Pure field formatting and validation, the guardian list editor, the
//! form state reducer and wire payload, name-lookup sequencing, and the
//! [`controller::FormController`] that ties them to a remote
//! [`controller::RegistrationService`]. Nothing here depends on a
//! particular UI or HTTP stack.

pub mod controller;
pub mod error;
pub mod form;
pub mod guardians;
pub mod lookup;
pub mod phone;
pub mod types;
pub mod validation;
