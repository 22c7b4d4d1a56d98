//! Row mapping for persisted records
//!
//! An `Entity` describes its table (name, non-key columns, DDL) and how to
//! convert between itself and a row. The repository builds every statement
//! from these constants; only values are bound as parameters.

use company_core::model::{Department, Employee, Review};
use rusqlite::types::{FromSql, Value};
use rusqlite::Row;

/// A record stored in one table with an `INTEGER PRIMARY KEY` named `id`
pub trait Entity: Clone + Send + Sync + 'static {
    /// Table name
    const TABLE: &'static str;

    /// Non-key columns, in the order `values()` binds them
    const COLUMNS: &'static [&'static str];

    /// Idempotent `CREATE TABLE IF NOT EXISTS` statement
    const CREATE_TABLE_SQL: &'static str;

    /// Row id, `None` while transient
    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: Option<i64>);

    /// Build a transient record from the non-key columns of `row`
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Values for `COLUMNS`, in order
    fn values(&self) -> Vec<Value>;
}

/// An entity with a `name` column that can be looked up by value
pub trait NamedEntity: Entity {
    const NAME_COLUMN: &'static str = "name";
}

/// Read a nullable column, taking the type's default for NULL
///
/// The tables declare no NOT NULL constraints, so rows written by other tools
/// may carry NULLs. A NULL text reads as `""`, a NULL integer as `0`; row ids
/// start at 1, so a 0 reference points at nothing.
pub(crate) fn nullable<T: FromSql + Default>(row: &Row<'_>, column: &str) -> rusqlite::Result<T> {
    Ok(row.get::<_, Option<T>>(column)?.unwrap_or_default())
}

pub(crate) fn select_sql<E: Entity>() -> String {
    format!("SELECT id, {} FROM {}", E::COLUMNS.join(", "), E::TABLE)
}

pub(crate) fn insert_sql<E: Entity>() -> String {
    let placeholders: Vec<String> = (1..=E::COLUMNS.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        E::TABLE,
        E::COLUMNS.join(", "),
        placeholders.join(", ")
    )
}

/// UPDATE of every non-key column; the id binds last
pub(crate) fn update_sql<E: Entity>() -> String {
    let assignments: Vec<String> = E::COLUMNS
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{} = ?{}", col, i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        E::TABLE,
        assignments.join(", "),
        E::COLUMNS.len() + 1
    )
}

pub(crate) fn delete_sql<E: Entity>() -> String {
    format!("DELETE FROM {} WHERE id = ?1", E::TABLE)
}

pub(crate) fn drop_table_sql<E: Entity>() -> String {
    format!("DROP TABLE IF EXISTS {}", E::TABLE)
}

impl Entity for Department {
    const TABLE: &'static str = "departments";
    const COLUMNS: &'static [&'static str] = &["name"];
    const CREATE_TABLE_SQL: &'static str = "CREATE TABLE IF NOT EXISTS departments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT
        )";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Department::new(nullable::<String>(row, "name")?))
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Text(self.name.clone())]
    }
}

impl NamedEntity for Department {}

impl Entity for Employee {
    const TABLE: &'static str = "employees";
    const COLUMNS: &'static [&'static str] = &["name", "job_title", "department_id"];
    const CREATE_TABLE_SQL: &'static str = "CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            job_title TEXT,
            department_id INTEGER,
            FOREIGN KEY (department_id) REFERENCES departments (id)
        )";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Employee::new(
            nullable::<String>(row, "name")?,
            nullable::<String>(row, "job_title")?,
            nullable::<i64>(row, "department_id")?,
        ))
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.job_title.clone()),
            Value::Integer(self.department_id),
        ]
    }
}

impl NamedEntity for Employee {}

impl Entity for Review {
    const TABLE: &'static str = "reviews";
    const COLUMNS: &'static [&'static str] = &["year", "summary", "employee_id"];
    const CREATE_TABLE_SQL: &'static str = "CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            year INTEGER,
            summary TEXT,
            employee_id INTEGER,
            FOREIGN KEY (employee_id) REFERENCES employees (id)
        )";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Review::new(
            nullable::<i64>(row, "year")?,
            nullable::<String>(row, "summary")?,
            nullable::<i64>(row, "employee_id")?,
        ))
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.year),
            Value::Text(self.summary.clone()),
            Value::Integer(self.employee_id),
        ]
    }
}
