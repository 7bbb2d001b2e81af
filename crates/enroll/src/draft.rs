//! Enrollment drafts: a JSON file of raw field inputs replayed through a
//! [`FormController`] as if the user had typed them.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use turmas_core::controller::{FormController, FormError, RegistrationService};
use turmas_core::form::FormEdit;
use turmas_core::guardians::GuardianField;
use turmas_core::types::ClassCode;

/// Raw inputs, keyed like the wire body. The phone may be typed in any
/// format; it is reformatted on replay.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrollmentDraft {
    #[serde(rename = "nome")]
    pub child_name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "transporteEscolar")]
    pub transport_note: String,
    #[serde(rename = "turmasEnum")]
    pub class_code: Option<String>,
    #[serde(rename = "adultosResponsaveis")]
    pub guardians: Vec<DraftGuardian>,
    #[serde(rename = "alunoPodeIrSozinho")]
    pub allowed_to_leave_alone: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DraftGuardian {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "grauParentesco")]
    pub relationship: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Failed to read draft {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed draft: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown class code in draft: {0:?}")]
    UnknownClass(String),

    #[error("Draft could not be applied: {0}")]
    Apply(#[from] FormError),
}

impl EnrollmentDraft {
    pub fn load(path: &Path) -> Result<Self, DraftError> {
        let text = std::fs::read_to_string(path).map_err(|source| DraftError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, DraftError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The edits a user would make to fill the form in with this draft.
    ///
    /// An empty class code leaves the class unselected, for the form
    /// validator to report. A code that is not a known class is an error.
    pub fn edits(&self) -> Result<Vec<FormEdit>, DraftError> {
        let mut edits = vec![
            FormEdit::ChildName(self.child_name.clone()),
            FormEdit::GuardianPhone(self.phone.clone()),
            FormEdit::TransportNote(self.transport_note.clone()),
        ];

        let class_code = match self.class_code.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => Some(
                ClassCode::parse(code).map_err(|_| DraftError::UnknownClass(code.to_string()))?,
            ),
        };
        edits.push(FormEdit::ClassCode(class_code));

        for (index, guardian) in self.guardians.iter().enumerate() {
            if index > 0 {
                edits.push(FormEdit::AddGuardian);
            }
            edits.push(FormEdit::UpdateGuardian {
                index,
                field: GuardianField::Name,
                value: guardian.name.clone(),
            });
            edits.push(FormEdit::UpdateGuardian {
                index,
                field: GuardianField::Relationship,
                value: guardian.relationship.clone(),
            });
        }

        if let Some(allowed) = self.allowed_to_leave_alone {
            edits.push(FormEdit::AllowedToLeaveAlone(allowed));
        }
        Ok(edits)
    }

    /// Replay the draft into `controller`.
    pub fn apply_to<S: RegistrationService>(
        &self,
        controller: &mut FormController<S>,
    ) -> Result<(), DraftError> {
        let edits = self.edits()?;
        tracing::debug!(edits = edits.len(), "Replaying enrollment draft");
        for edit in edits {
            controller.edit(edit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn missing_keys_default_to_empty() {
        let draft = EnrollmentDraft::parse("{}").unwrap();
        assert!(draft.child_name.is_empty());
        assert!(draft.class_code.is_none());
        assert!(draft.guardians.is_empty());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert_matches!(EnrollmentDraft::parse("{"), Err(DraftError::Parse(_)));
    }

    #[test]
    fn edits_add_rows_for_extra_guardians() {
        let draft = EnrollmentDraft::parse(
            r#"{
                "nome": "Ana Souza",
                "turmasEnum": "TURMA_9A",
                "adultosResponsaveis": [
                    {"nome": "", "grauParentesco": ""},
                    {"nome": "Carlos Souza", "grauParentesco": "Pai"}
                ],
                "alunoPodeIrSozinho": true
            }"#,
        )
        .unwrap();

        let edits = draft.edits().unwrap();
        assert_eq!(
            edits
                .iter()
                .filter(|e| matches!(e, FormEdit::AddGuardian))
                .count(),
            1
        );
        assert!(edits.contains(&FormEdit::ClassCode(Some(ClassCode::Turma9A))));
        assert_eq!(edits.last(), Some(&FormEdit::AllowedToLeaveAlone(true)));
    }

    #[test]
    fn unknown_class_is_rejected_by_name() {
        let draft = EnrollmentDraft::parse(r#"{"turmasEnum": "TURMA_10A"}"#).unwrap();
        let err = draft.edits().unwrap_err();
        assert_matches!(&err, DraftError::UnknownClass(code) if code == "TURMA_10A");
        assert!(err.to_string().contains("TURMA_10A"));
    }

    #[test]
    fn empty_class_leaves_class_unselected() {
        let draft = EnrollmentDraft::parse(r#"{"turmasEnum": " "}"#).unwrap();
        assert!(draft.edits().unwrap().contains(&FormEdit::ClassCode(None)));
    }
}
