//! Authorized guardians: the repeated sub-record of the enrollment form.
//!
//! [`GuardianList`] is persistent in style: every edit returns a new list and
//! leaves the receiver untouched, so snapshots taken before an edit stay
//! valid. The list is never empty.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Relationship;

/// An adult authorized to pick the child up from school.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianRecord {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "grauParentesco")]
    pub relationship: Relationship,
}

/// The editable fields of a [`GuardianRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardianField {
    Name,
    Relationship,
}

/// Ordered, non-empty sequence of guardians.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GuardianList(Vec<GuardianRecord>);

impl GuardianList {
    /// A list holding a single empty row, as the form starts out.
    pub fn new() -> Self {
        Self(vec![GuardianRecord::default()])
    }

    /// Build a list from existing records. Fails on an empty vector.
    pub fn from_records(records: Vec<GuardianRecord>) -> Result<Self, CoreError> {
        if records.is_empty() {
            return Err(CoreError::Validation(
                "At least one guardian is required".to_string(),
            ));
        }
        Ok(Self(records))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GuardianRecord> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GuardianRecord> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[GuardianRecord] {
        &self.0
    }

    /// Append one empty row.
    pub fn add(&self) -> Self {
        let mut records = self.0.clone();
        records.push(GuardianRecord::default());
        Self(records)
    }

    /// Remove the row at `index`.
    ///
    /// Removing the only remaining row is refused so that a submission always
    /// names at least one guardian.
    pub fn remove(&self, index: usize) -> Result<Self, CoreError> {
        self.check_index(index)?;
        if self.0.len() == 1 {
            return Err(CoreError::Validation(
                "Cannot remove the last guardian".to_string(),
            ));
        }
        let records = self
            .0
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, g)| g.clone())
            .collect();
        Ok(Self(records))
    }

    /// Replace one field of the row at `index`.
    pub fn update(&self, index: usize, field: GuardianField, value: &str) -> Result<Self, CoreError> {
        self.check_index(index)?;
        let mut records = self.0.clone();
        let record = &mut records[index];
        match field {
            GuardianField::Name => record.name = value.to_string(),
            GuardianField::Relationship => record.relationship = Relationship::from_code(value),
        }
        Ok(Self(records))
    }

    fn check_index(&self, index: usize) -> Result<(), CoreError> {
        if index >= self.0.len() {
            return Err(CoreError::GuardianIndex {
                index,
                len: self.0.len(),
            });
        }
        Ok(())
    }
}

impl Default for GuardianList {
    fn default() -> Self {
        Self::new()
    }
}

impl<'de> Deserialize<'de> for GuardianList {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<GuardianRecord>::deserialize(deserializer)?;
        Self::from_records(records).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a GuardianList {
    type Item = &'a GuardianRecord;
    type IntoIter = std::slice::Iter<'a, GuardianRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
