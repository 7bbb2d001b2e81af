//! Closed enumerations shared by the form, its payload and the CLI.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

// ---------------------------------------------------------------------------
// Class codes
// ---------------------------------------------------------------------------

/// A school class section, e.g. `TURMA_9A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ClassCode {
    Turma1A,
    Turma1B,
    Turma1C,
    Turma2A,
    Turma2B,
    Turma2C,
    Turma2D,
    Turma3A,
    Turma3B,
    Turma3C,
    Turma4A,
    Turma4B,
    Turma4C,
    Turma5A,
    Turma5B,
    Turma5C,
    Turma6A,
    Turma6B,
    Turma6C,
    Turma7A,
    Turma7B,
    Turma7C,
    Turma8A,
    Turma8B,
    Turma8C,
    Turma9A,
    Turma9B,
    Turma9C,
}

/// First grade whose classes may be allowed to leave school unaccompanied.
pub const LEAVE_ALONE_MIN_GRADE: u8 = 6;

impl ClassCode {
    /// Every class code, in the order the form lists them.
    pub const ALL: [ClassCode; 28] = [
        Self::Turma1A,
        Self::Turma1B,
        Self::Turma1C,
        Self::Turma2A,
        Self::Turma2B,
        Self::Turma2C,
        Self::Turma2D,
        Self::Turma3A,
        Self::Turma3B,
        Self::Turma3C,
        Self::Turma4A,
        Self::Turma4B,
        Self::Turma4C,
        Self::Turma5A,
        Self::Turma5B,
        Self::Turma5C,
        Self::Turma6A,
        Self::Turma6B,
        Self::Turma6C,
        Self::Turma7A,
        Self::Turma7B,
        Self::Turma7C,
        Self::Turma8A,
        Self::Turma8B,
        Self::Turma8C,
        Self::Turma9A,
        Self::Turma9B,
        Self::Turma9C,
    ];

    /// Wire code sent to the registration service.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Turma1A => "TURMA_1A",
            Self::Turma1B => "TURMA_1B",
            Self::Turma1C => "TURMA_1C",
            Self::Turma2A => "TURMA_2A",
            Self::Turma2B => "TURMA_2B",
            Self::Turma2C => "TURMA_2C",
            Self::Turma2D => "TURMA_2D",
            Self::Turma3A => "TURMA_3A",
            Self::Turma3B => "TURMA_3B",
            Self::Turma3C => "TURMA_3C",
            Self::Turma4A => "TURMA_4A",
            Self::Turma4B => "TURMA_4B",
            Self::Turma4C => "TURMA_4C",
            Self::Turma5A => "TURMA_5A",
            Self::Turma5B => "TURMA_5B",
            Self::Turma5C => "TURMA_5C",
            Self::Turma6A => "TURMA_6A",
            Self::Turma6B => "TURMA_6B",
            Self::Turma6C => "TURMA_6C",
            Self::Turma7A => "TURMA_7A",
            Self::Turma7B => "TURMA_7B",
            Self::Turma7C => "TURMA_7C",
            Self::Turma8A => "TURMA_8A",
            Self::Turma8B => "TURMA_8B",
            Self::Turma8C => "TURMA_8C",
            Self::Turma9A => "TURMA_9A",
            Self::Turma9B => "TURMA_9B",
            Self::Turma9C => "TURMA_9C",
        }
    }

    /// Parse a wire code. Only the exact upper-case codes are accepted.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown class code '{s}'")))
    }

    /// School grade (1 through 9).
    pub fn grade(self) -> u8 {
        // Wire codes are `TURMA_<grade><section>`.
        self.as_str().as_bytes()[6] - b'0'
    }

    /// Section letter within the grade.
    pub fn section(self) -> char {
        char::from(self.as_str().as_bytes()[7])
    }

    /// Human-readable label, e.g. `Turma 9A`.
    pub fn label(self) -> String {
        format!("Turma {}{}", self.grade(), self.section())
    }

    /// Whether the "may leave school alone" option applies to this class.
    pub fn allows_leaving_alone(self) -> bool {
        self.grade() >= LEAVE_ALONE_MIN_GRADE
    }
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ClassCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClassCode> for String {
    fn from(code: ClassCode) -> Self {
        code.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Relationship
// ---------------------------------------------------------------------------

/// How an authorized adult relates to the child.
///
/// Deserializes through [`Relationship::from_code`], so unknown text is read
/// as [`Relationship::Outro`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Relationship {
    /// Nothing selected yet.
    #[default]
    Unset,
    Pai,
    Mae,
    Avo,
    Irmao,
    Irma,
    Tios,
    Primos,
    TransporteEscolar,
    Outro,
}

impl Relationship {
    /// Selectable values, in the order the form lists them.
    pub const OPTIONS: [Relationship; 9] = [
        Self::Pai,
        Self::Mae,
        Self::Avo,
        Self::Irmao,
        Self::Irma,
        Self::Tios,
        Self::Primos,
        Self::TransporteEscolar,
        Self::Outro,
    ];

    /// Map a submitted code to a relationship.
    ///
    /// Unknown non-empty text falls back to [`Relationship::Outro`].
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "" => Self::Unset,
            "Pai" => Self::Pai,
            "Mae" => Self::Mae,
            "Avo" => Self::Avo,
            "Irmao" => Self::Irmao,
            "Irma" => Self::Irma,
            "Tios" => Self::Tios,
            "Primos" => Self::Primos,
            "TransporteEscolar" => Self::TransporteEscolar,
            _ => Self::Outro,
        }
    }

    /// Wire code sent as `grauParentesco`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::Pai => "Pai",
            Self::Mae => "Mae",
            Self::Avo => "Avo",
            Self::Irmao => "Irmao",
            Self::Irma => "Irma",
            Self::Tios => "Tios",
            Self::Primos => "Primos",
            Self::TransporteEscolar => "TransporteEscolar",
            Self::Outro => "Outro",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unset => "Selecione",
            Self::Pai => "Pai",
            Self::Mae => "Mãe",
            Self::Avo => "Avó/Avô",
            Self::Irmao => "Irmão",
            Self::Irma => "Irmã",
            Self::Tios => "Tio/Tia",
            Self::Primos => "Primo/Prima",
            Self::TransporteEscolar => "Transporte Escolar",
            Self::Outro => "Outro",
        }
    }
}

impl From<String> for Relationship {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<Relationship> for String {
    fn from(rel: Relationship) -> Self {
        rel.as_str().to_string()
    }
}
