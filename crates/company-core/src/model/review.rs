use serde::{Deserialize, Serialize};
use std::fmt;

use super::display_id;

/// Review - a yearly performance summary for one employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Database-assigned row id (None until first saved)
    pub id: Option<i64>,

    pub year: i64,

    pub summary: String,

    /// Row id of the reviewed Employee (not validated)
    pub employee_id: i64,
}

impl Review {
    /// Create a transient Review
    pub fn new(year: i64, summary: impl Into<String>, employee_id: i64) -> Self {
        Self {
            id: None,
            year,
            summary: summary.into(),
            employee_id,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Review(id={}, year={}, summary={}, employee_id={})",
            display_id(self.id),
            self.year,
            self.summary,
            self.employee_id
        )
    }
}
