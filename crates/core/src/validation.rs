//! Field validation for the enrollment form.
//!
//! Every rule is pure and field-local: it inspects one value and returns
//! the message to show next to that field, or `None`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::form::EnrollmentForm;
use crate::types::ClassCode;

/// Minimum length of the child's name, after trimming.
pub const MIN_NAME_CHARS: usize = 3;

pub const NAME_TOO_SHORT: &str = "O nome da criança deve ter pelo menos 3 caracteres";
pub const PHONE_INVALID: &str = "Informe o telefone no formato (DD) DDDDD-DDDD";
pub const TRANSPORT_REQUIRED: &str = "Informe o transporte escolar ou escreva \"Não Tem\"";
pub const CLASS_REQUIRED: &str = "Selecione a turma da criança";

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\([0-9]{2}\) [0-9]{5}-[0-9]{4}$").expect("valid regex"));

/// A form field that can carry an inline error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    ChildName,
    GuardianPhone,
    TransportNote,
    ClassCode,
}

/// Current inline error per field. A field without an entry is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationState {
    errors: BTreeMap<FormField, String>,
}

impl ValidationState {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn message(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn set(&mut self, field: FormField, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn clear(&mut self, field: FormField) {
        self.errors.remove(&field);
    }

    /// Set or clear `field` depending on `message`.
    pub fn put(&mut self, field: FormField, message: Option<&str>) {
        match message {
            Some(m) => self.set(field, m),
            None => self.clear(field),
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> + '_ {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

pub fn validate_name(name: &str) -> Option<&'static str> {
    (name.trim().chars().count() < MIN_NAME_CHARS).then_some(NAME_TOO_SHORT)
}

/// Accepts exactly `(DD) DDDDD-DDDD`.
pub fn validate_phone(display: &str) -> Option<&'static str> {
    (!PHONE_RE.is_match(display)).then_some(PHONE_INVALID)
}

/// The note is required; families without school transport write a
/// placeholder such as "Não Tem".
pub fn validate_transport_note(note: &str) -> Option<&'static str> {
    note.trim().is_empty().then_some(TRANSPORT_REQUIRED)
}

pub fn validate_class(class_code: Option<ClassCode>) -> Option<&'static str> {
    class_code.is_none().then_some(CLASS_REQUIRED)
}

/// Run every rule against `form`. No rule is skipped, so all messages are
/// available at once.
pub fn validate_form(form: &EnrollmentForm) -> ValidationState {
    let mut state = ValidationState::default();
    state.put(FormField::ChildName, validate_name(&form.child_name));
    state.put(FormField::GuardianPhone, validate_phone(&form.guardian_phone));
    state.put(FormField::TransportNote, validate_transport_note(&form.transport_note));
    state.put(FormField::ClassCode, validate_class(form.class_code));
    state
}
