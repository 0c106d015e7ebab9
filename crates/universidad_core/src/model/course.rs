//! Course (materia) reference record.

use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// A catalog course identified by its unique code.
///
/// Students reference courses; they never own them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "codigoUnico")]
    pub code: String,
    #[serde(rename = "nombreMateria")]
    pub name: String,
    #[serde(rename = "creditos", default)]
    pub credits: u32,
}

impl Course {
    pub fn new(code: impl Into<String>, name: impl Into<String>, credits: u32) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            credits,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("codigoUnico", &self.code, None)?;
        require_text("nombreMateria", &self.name, None)?;
        Ok(())
    }

    /// Case-insensitive code comparison.
    pub fn has_code(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code)
    }
}
