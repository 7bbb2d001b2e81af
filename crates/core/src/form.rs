//! Enrollment form state, the edits that change it, and the wire payload.
//!
//! [`EnrollmentForm::apply`] is the single state-transition function for
//! field edits: it never mutates in place and always hands back a fresh
//! snapshot.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::guardians::{GuardianField, GuardianList, GuardianRecord};
use crate::phone::{format_phone, to_wire_phone};
use crate::types::ClassCode;

/// Everything the user has typed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrollmentForm {
    pub child_name: String,
    /// Display-formatted, e.g. `(34) 98765-4321`.
    pub guardian_phone: String,
    pub transport_note: String,
    pub class_code: Option<ClassCode>,
    pub guardians: GuardianList,
    /// Only meaningful while [`Self::shows_leave_alone_option`] is true.
    pub allowed_to_leave_alone: bool,
}

/// One user edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEdit {
    ChildName(String),
    /// Raw keystroke input; formatted before it is stored.
    GuardianPhone(String),
    TransportNote(String),
    ClassCode(Option<ClassCode>),
    AllowedToLeaveAlone(bool),
    AddGuardian,
    RemoveGuardian(usize),
    UpdateGuardian {
        index: usize,
        field: GuardianField,
        value: String,
    },
}

impl FormEdit {
    /// Whether this edit changes the child's name (and so invalidates any
    /// name lookup already made).
    pub fn touches_child_name(&self) -> bool {
        matches!(self, Self::ChildName(_))
    }
}

impl EnrollmentForm {
    /// Whether the "may leave school alone" checkbox is visible.
    pub fn shows_leave_alone_option(&self) -> bool {
        self.class_code.is_some_and(ClassCode::allows_leaving_alone)
    }

    /// Apply one edit, returning the next snapshot.
    pub fn apply(&self, edit: FormEdit) -> Result<Self, CoreError> {
        let mut next = self.clone();
        match edit {
            FormEdit::ChildName(name) => next.child_name = name,
            FormEdit::GuardianPhone(raw) => next.guardian_phone = format_phone(&raw),
            FormEdit::TransportNote(note) => next.transport_note = note,
            FormEdit::ClassCode(code) => {
                next.class_code = code;
                if !next.shows_leave_alone_option() {
                    next.allowed_to_leave_alone = false;
                }
            }
            FormEdit::AllowedToLeaveAlone(allowed) => {
                if allowed && !self.shows_leave_alone_option() {
                    return Err(CoreError::Validation(
                        "This class cannot be allowed to leave school alone".to_string(),
                    ));
                }
                next.allowed_to_leave_alone = allowed;
            }
            FormEdit::AddGuardian => next.guardians = self.guardians.add(),
            FormEdit::RemoveGuardian(index) => next.guardians = self.guardians.remove(index)?,
            FormEdit::UpdateGuardian {
                index,
                field,
                value,
            } => next.guardians = self.guardians.update(index, field, &value)?,
        }
        Ok(next)
    }

    /// Assemble the body posted to the registration service.
    pub fn to_payload(&self) -> Result<EnrollmentPayload, CoreError> {
        let class_code = self
            .class_code
            .ok_or_else(|| CoreError::Validation("A class must be selected".to_string()))?;

        Ok(EnrollmentPayload {
            child_name: self.child_name.trim().to_string(),
            phone: to_wire_phone(&self.guardian_phone),
            transport_note: self.transport_note.clone(),
            class_code,
            guardians: self.guardians.as_slice().to_vec(),
            allowed_to_leave_alone: self
                .shows_leave_alone_option()
                .then_some(self.allowed_to_leave_alone),
        })
    }
}

/// JSON body of `POST /alunos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentPayload {
    #[serde(rename = "nome")]
    pub child_name: String,
    /// Digits only.
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "transporteEscolar")]
    pub transport_note: String,
    #[serde(rename = "turmasEnum")]
    pub class_code: ClassCode,
    #[serde(rename = "adultosResponsaveis")]
    pub guardians: Vec<GuardianRecord>,
    #[serde(
        rename = "alunoPodeIrSozinho",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub allowed_to_leave_alone: Option<bool>,
}
