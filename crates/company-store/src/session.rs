//! Session - one database and one repository per entity type
//!
//! A session defines the lifetime of the identity maps: objects loaded through
//! one session are canonical within it, and a new session starts with empty
//! maps. Create one per application run, or one per test.

#![allow(clippy::result_large_err)]

use crate::config::StoreConfig;
use crate::db::Database;
use crate::errors::Result;
use crate::repo::association;
use crate::repo::{EntityRef, SqliteRepo};
use company_core::model::{Department, Employee, Review};

pub struct Session {
    db: Database,
    pub departments: SqliteRepo<Department>,
    pub employees: SqliteRepo<Employee>,
    pub reviews: SqliteRepo<Review>,
}

impl Session {
    /// Open a session on the database described by `config`
    ///
    /// No connection is made until the first operation.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Ok(Self::with_database(Database::new(config)?))
    }

    pub fn with_database(db: Database) -> Self {
        Self {
            departments: SqliteRepo::new(db.clone()),
            employees: SqliteRepo::new(db.clone()),
            reviews: SqliteRepo::new(db.clone()),
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Create all three tables, referenced tables first
    pub fn create_all_tables(&self) -> Result<()> {
        self.departments.create_table()?;
        self.employees.create_table()?;
        self.reviews.create_table()
    }

    /// Drop all three tables, referencing tables first
    pub fn drop_all_tables(&self) -> Result<()> {
        self.reviews.drop_table()?;
        self.employees.drop_table()?;
        self.departments.drop_table()
    }

    /// Reviews of a persisted employee
    pub fn employee_reviews(
        &self,
        employee: &EntityRef<Employee>,
    ) -> Result<Vec<EntityRef<Review>>> {
        association::reviews_for_employee(&self.reviews, employee)
    }

    /// Employees of a persisted department
    pub fn department_employees(
        &self,
        department: &EntityRef<Department>,
    ) -> Result<Vec<EntityRef<Employee>>> {
        association::employees_for_department(&self.employees, department)
    }

    pub fn employee_department(
        &self,
        employee: &EntityRef<Employee>,
    ) -> Result<Option<EntityRef<Department>>> {
        association::department_of(&self.departments, employee)
    }

    pub fn review_employee(
        &self,
        review: &EntityRef<Review>,
    ) -> Result<Option<EntityRef<Employee>>> {
        association::employee_of(&self.employees, review)
    }

    /// Forget every mapped object in all three repositories
    pub fn clear_caches(&self) {
        self.departments.clear_cache();
        self.employees.clear_cache();
        self.reviews.clear_cache();
    }
}
