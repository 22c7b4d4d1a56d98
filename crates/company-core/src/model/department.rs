use serde::{Deserialize, Serialize};
use std::fmt;

use super::display_id;

/// Department - an organisational unit that employees belong to
///
/// Names are not unique; lookups by name return whichever row the database
/// yields first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Database-assigned row id (None until first saved)
    pub id: Option<i64>,

    /// Department name
    pub name: String,
}

impl Department {
    /// Create a transient Department
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// Check whether this Department has been assigned a row id
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Department(id={}, name={})", display_id(self.id), self.name)
    }
}
