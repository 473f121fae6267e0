use std::fmt;

use serde::{Deserialize, Serialize};

use super::question::default_true;
use super::validate::{validate_lesson_id, validate_lesson_name, ValidationError};
use crate::constants::{LESSON_ID_PADDING, LESSON_ID_PREFIX};

/// Missing `id` or `name` load as empty strings; [`Lesson::validate`] reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Lesson {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
        }
    }

    /// Check the id and name on their own, without the other lessons of the subject.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_lesson_id(&self.id)?;
        validate_lesson_name::<&str>(&self.name, &[])
    }

    /// Numeric part of an id such as `L007`, if it has one.
    pub fn sequence(&self) -> Option<u32> {
        self.id.strip_prefix(LESSON_ID_PREFIX)?.parse().ok()
    }
}

/// Lesson id for sequence number `n`: `L001`, `L002`, ...
pub fn lesson_id(n: u32) -> String {
    format!("{LESSON_ID_PREFIX}{n:0width$}", width = LESSON_ID_PADDING)
}

impl fmt::Display for Lesson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.enabled { '✓' } else { '✗' };
        write!(f, "{} ({}) [{mark}]", self.name, self.id)
    }
}
