//! Derived relationships between entities
//!
//! Nothing here is stored on the records themselves; each accessor runs a
//! foreign-key query and hydrates the results through the target
//! repository's identity map. Query failures are returned to the caller so
//! "no rows" and "query failed" stay distinguishable.

#![allow(clippy::result_large_err)]

use crate::errors::Result;
use crate::repo::hydration::EntityRef;
use crate::repo::sqlite_repo::SqliteRepo;
use company_core::model::{Department, Employee, Review};
use company_core::{log_op_end, log_op_error, log_op_start};
use rusqlite::types::Value;
use std::time::Instant;

/// Reviews written for `employee`; empty for a transient employee
pub fn reviews_for_employee(
    reviews: &SqliteRepo<Review>,
    employee: &EntityRef<Employee>,
) -> Result<Vec<EntityRef<Review>>> {
    let Some(employee_id) = employee.id() else {
        return Ok(Vec::new());
    };

    log_op_start!("employee_reviews", row_id = employee_id);
    let start = Instant::now();

    let result = reviews
        .find_where("employee_reviews", "employee_id", Value::Integer(employee_id))
        .map_err(|e| {
            log_op_error!(
                "employee_reviews",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                row_id = employee_id
            );
            e
        })?;

    log_op_end!(
        "employee_reviews",
        duration_ms = start.elapsed().as_millis() as u64,
        row_id = employee_id,
        row_count = result.len()
    );

    Ok(result)
}

/// Employees assigned to `department`; empty for a transient department
pub fn employees_for_department(
    employees: &SqliteRepo<Employee>,
    department: &EntityRef<Department>,
) -> Result<Vec<EntityRef<Employee>>> {
    let Some(department_id) = department.id() else {
        return Ok(Vec::new());
    };

    log_op_start!("department_employees", row_id = department_id);
    let start = Instant::now();

    let result = employees
        .find_where(
            "department_employees",
            "department_id",
            Value::Integer(department_id),
        )
        .map_err(|e| {
            log_op_error!(
                "department_employees",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                row_id = department_id
            );
            e
        })?;

    log_op_end!(
        "department_employees",
        duration_ms = start.elapsed().as_millis() as u64,
        row_id = department_id,
        row_count = result.len()
    );

    Ok(result)
}

/// Department an employee belongs to; `None` if that row does not exist
pub fn department_of(
    departments: &SqliteRepo<Department>,
    employee: &EntityRef<Employee>,
) -> Result<Option<EntityRef<Department>>> {
    let department_id = employee.read().department_id;
    departments.find_by_id(department_id)
}

/// Employee a review belongs to; `None` if that row does not exist
pub fn employee_of(
    employees: &SqliteRepo<Employee>,
    review: &EntityRef<Review>,
) -> Result<Option<EntityRef<Employee>>> {
    let employee_id = review.read().employee_id;
    employees.find_by_id(employee_id)
}
