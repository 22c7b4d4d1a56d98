use serde::{Deserialize, Serialize};
use std::fmt;

use super::display_id;

/// Employee - a person working in a department
///
/// `department_id` is a raw foreign key; the referenced Department is not
/// checked for existence at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Database-assigned row id (None until first saved)
    pub id: Option<i64>,

    pub name: String,

    pub job_title: String,

    /// Row id of the owning Department
    pub department_id: i64,
}

impl Employee {
    /// Create a transient Employee
    pub fn new(name: impl Into<String>, job_title: impl Into<String>, department_id: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            job_title: job_title.into(),
            department_id,
        }
    }

    /// Check whether this Employee has been assigned a row id
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Employee(id={}, name={}, job_title={}, department_id={})",
            display_id(self.id),
            self.name,
            self.job_title,
            self.department_id
        )
    }
}
