//! Sequencing of "is this name already registered" lookups.
//!
//! Lookups fire on blur and may overlap. Each one is issued a
//! [`LookupTicket`] carrying a generation number; only the completion of the
//! most recently issued ticket is applied, so a slow early response can
//! never overwrite a newer one.

use serde::Serialize;
use serde_json::Value;

/// State of the name-collision check for the current child name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NameCheck {
    /// No lookup for the current name yet.
    #[default]
    Unchecked,
    Pending { name: String },
    Available { name: String },
    Taken { name: String },
    Failed { name: String, reason: String },
}

impl NameCheck {
    /// Whether the backend confirmed `name` (trimmed) is free.
    pub fn confirms_available(&self, name: &str) -> bool {
        matches!(self, Self::Available { name: checked } if checked == name.trim())
    }
}

/// Handle for one in-flight lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub generation: u64,
    /// Trimmed name sent to the backend.
    pub name: String,
}

/// Issues tickets and decides which completions are still current.
#[derive(Debug, Default)]
pub struct LookupSequencer {
    generation: u64,
}

impl LookupSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for `name`, or `None` when it is blank.
    pub fn issue(&mut self, name: &str) -> Option<LookupTicket> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.generation += 1;
        Some(LookupTicket {
            generation: self.generation,
            name: name.to_string(),
        })
    }

    /// Invalidate every outstanding ticket.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Whether `ticket` is the latest one issued.
    pub fn is_current(&self, ticket: &LookupTicket) -> bool {
        ticket.generation == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Interpret a lookup response body the way a loosely-typed client would.
///
/// `null`, `false`, `0`, `""` and `"false"` mean "not registered"; any other
/// value means the name is taken.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Interpret a raw response body. An empty body means "not registered";
/// a body that is not JSON is read as a plain string.
pub fn body_is_truthy(body: &str) -> bool {
    let body = body.trim();
    if body.is_empty() {
        return false;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => is_truthy(&value),
        Err(_) => is_truthy(&Value::String(body.to_string())),
    }
}
