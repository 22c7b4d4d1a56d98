//! Plain records for the three company entities
//!
//! Records carry no database state beyond their optional id. A `None` id marks
//! a transient record that has never been saved (or was deleted).

pub mod department;
pub mod employee;
pub mod review;

pub use department::Department;
pub use employee::Employee;
pub use review::Review;

/// Render an optional id the way records print it
pub(crate) fn display_id(id: Option<i64>) -> String {
    id.map_or_else(|| "None".to_string(), |id| id.to_string())
}
