// Integration tests for the generic repository
// Covers create/save/update/delete, identity-map reuse and lookup semantics

mod common;

use common::{raw_connection, row_count, setup_session};
use company_core::{Department, Employee, Review};
use company_store::{EntityRef, SaveOutcome};

#[test]
fn test_create_then_find_by_id_returns_same_object() {
    // Given: A department created through the repository
    let (_dir, session) = setup_session();
    let created = session
        .departments
        .create(Department::new("Engineering"))
        .unwrap();

    // When: We load it by id
    let id = created.id().unwrap();
    let found = session.departments.find_by_id(id).unwrap().unwrap();

    // Then: The loaded handle is the created object with identical fields
    assert!(found.ptr_eq(&created));
    assert_eq!(found.read().name, "Engineering");
    assert_eq!(found.id(), Some(id));
}

#[test]
fn test_find_by_id_missing_row_is_none() {
    let (_dir, session) = setup_session();

    assert!(session.employees.find_by_id(404).unwrap().is_none());
    assert!(session.reviews.find_by_id(404).unwrap().is_none());
}

#[test]
fn test_save_twice_updates_in_place() {
    // Given: A persisted employee
    let (_dir, session) = setup_session();
    let emp = session
        .employees
        .create(Employee::new("Ada", "Engineer", 1))
        .unwrap();
    let id = emp.id().unwrap();

    // When: We change it and save twice
    emp.write().job_title = "Principal Engineer".to_string();
    let first = session.employees.save(&emp).unwrap();
    let second = session.employees.save(&emp).unwrap();

    // Then: Both saves updated the same row and no row was added
    assert_eq!(
        first,
        SaveOutcome::Updated {
            id,
            rows_affected: 1
        }
    );
    assert_eq!(first, second);

    let conn = raw_connection(&session);
    assert_eq!(row_count(&conn, "employees"), 1);
    let (name, job_title, department_id): (String, String, i64) = conn
        .query_row(
            "SELECT name, job_title, department_id FROM employees WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(name, "Ada");
    assert_eq!(job_title, "Principal Engineer");
    assert_eq!(department_id, 1);
}

#[test]
fn test_cached_object_hides_out_of_band_update() {
    // Given: A department loaded into the identity map
    let (_dir, session) = setup_session();
    let dept = session
        .departments
        .create(Department::new("Engineering"))
        .unwrap();
    let id = dept.id().unwrap();

    // When: Another connection rewrites the row
    let conn = raw_connection(&session);
    conn.execute(
        "UPDATE departments SET name = 'Renamed' WHERE id = ?1",
        [id],
    )
    .unwrap();

    // Then: find_by_id still returns the cached, pre-update values
    let found = session.departments.find_by_id(id).unwrap().unwrap();
    assert!(found.ptr_eq(&dept));
    assert_eq!(found.read().name, "Engineering");

    // And: A fresh identity map sees the new values
    session.clear_caches();
    let reloaded = session.departments.find_by_id(id).unwrap().unwrap();
    assert!(!reloaded.ptr_eq(&dept));
    assert_eq!(reloaded.read().name, "Renamed");
}

#[test]
fn test_delete_clears_identity_and_resave_inserts_new_row() {
    // Given: A persisted review
    let (_dir, session) = setup_session();
    let review = session
        .reviews
        .create(Review::new(2023, "Solid year", 1))
        .unwrap();
    let old_id = review.id().unwrap();

    // When: We delete it
    session.reviews.delete(&review).unwrap();

    // Then: The object is transient and the row is gone
    assert_eq!(review.id(), None);
    assert!(session.reviews.find_by_id(old_id).unwrap().is_none());
    assert_eq!(session.reviews.cached_len(), 0);

    // And: Saving it again creates a new row with a new id
    let outcome = session.reviews.save(&review).unwrap();
    let new_id = outcome.id();
    assert!(matches!(outcome, SaveOutcome::Inserted { .. }));
    assert_ne!(new_id, old_id);
    assert_eq!(review.id(), Some(new_id));
    assert_eq!(session.reviews.count().unwrap(), 1);
}

#[test]
fn test_delete_transient_is_noop() {
    let (_dir, session) = setup_session();
    session
        .departments
        .create(Department::new("Keep me"))
        .unwrap();
    let transient = EntityRef::new(Department::new("Never saved"));

    session.departments.delete(&transient).unwrap();

    assert_eq!(session.departments.count().unwrap(), 1);
}

#[test]
fn test_update_transient_is_noop() {
    let (_dir, session) = setup_session();
    let transient = EntityRef::new(Employee::new("Grace", "Admiral", 2));

    let outcome = session.employees.update(&transient).unwrap();

    assert_eq!(outcome, None);
    assert_eq!(transient.id(), None);
    assert_eq!(session.employees.count().unwrap(), 0);
}

#[test]
fn test_update_persisted_delegates_to_save() {
    let (_dir, session) = setup_session();
    let dept = session.departments.create(Department::new("Ops")).unwrap();
    dept.write().name = "Platform".to_string();

    let outcome = session.departments.update(&dept).unwrap().unwrap();

    assert!(!outcome.is_stale());
    session.clear_caches();
    let reloaded = session
        .departments
        .find_by_id(outcome.id())
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.read().name, "Platform");
}

#[test]
fn test_update_of_stale_id_is_reported() {
    // Given: A persisted department whose row is removed out of band
    let (_dir, session) = setup_session();
    let dept = session.departments.create(Department::new("Ghost")).unwrap();
    let id = dept.id().unwrap();
    raw_connection(&session)
        .execute("DELETE FROM departments WHERE id = ?1", [id])
        .unwrap();

    // When: We save it again
    let outcome = session.departments.save(&dept).unwrap();

    // Then: The update matched nothing and no row was resurrected
    assert_eq!(
        outcome,
        SaveOutcome::Updated {
            id,
            rows_affected: 0
        }
    );
    assert!(outcome.is_stale());
    assert_eq!(session.departments.count().unwrap(), 0);
}

#[test]
fn test_get_all_tolerates_null_columns() {
    // Given: A row written outside the repositories with a NULL name
    let (_dir, session) = setup_session();
    session.departments.create(Department::new("Sales")).unwrap();
    raw_connection(&session)
        .execute("INSERT INTO departments (name) VALUES (NULL)", [])
        .unwrap();

    // When: We load the whole table
    let all = session.departments.get_all().unwrap();

    // Then: Both rows load; the NULL reads as an empty name
    let names: Vec<String> = all.iter().map(|d| d.read().name.clone()).collect();
    assert_eq!(names, vec!["Sales".to_string(), String::new()]);
}

#[test]
fn test_find_by_name() {
    let (_dir, session) = setup_session();
    let ada = session
        .employees
        .create(Employee::new("Ada", "Engineer", 1))
        .unwrap();
    session
        .employees
        .create(Employee::new("Grace", "Admiral", 1))
        .unwrap();

    let found = session.employees.find_by_name("Ada").unwrap().unwrap();

    assert!(found.ptr_eq(&ada));
    assert!(session.employees.find_by_name("Linus").unwrap().is_none());
}

#[test]
fn test_find_by_name_with_duplicates_returns_one_match() {
    let (_dir, session) = setup_session();
    let first = session.departments.create(Department::new("Sales")).unwrap();
    let second = session.departments.create(Department::new("Sales")).unwrap();

    let found = session.departments.find_by_name("Sales").unwrap().unwrap();

    assert!(found.ptr_eq(&first) || found.ptr_eq(&second));
}

#[test]
fn test_get_all_empty_table() {
    let (_dir, session) = setup_session();

    assert!(session.reviews.get_all().unwrap().is_empty());
}

#[test]
fn test_get_all_hydrates_through_identity_map() {
    // Given: Two departments created in this session
    let (_dir, session) = setup_session();
    let eng = session
        .departments
        .create(Department::new("Engineering"))
        .unwrap();
    let ops = session.departments.create(Department::new("Ops")).unwrap();

    // When: We load all rows
    let all = session.departments.get_all().unwrap();

    // Then: The created objects come back, not copies
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|d| d.ptr_eq(&eng)));
    assert!(all.iter().any(|d| d.ptr_eq(&ops)));
    assert_eq!(session.departments.cached_len(), 2);
}

#[test]
fn test_get_all_maps_rows_loaded_from_disk() {
    // Given: Rows inserted without going through the repository
    let (_dir, session) = setup_session();
    let conn = raw_connection(&session);
    conn.execute(
        "INSERT INTO reviews (year, summary, employee_id) VALUES (2022, 'Steady', 3)",
        [],
    )
    .unwrap();

    // When: We load them twice
    let first = session.reviews.get_all().unwrap();
    let second = session.reviews.get_all().unwrap();

    // Then: Both loads yield the same canonical object
    assert_eq!(first.len(), 1);
    assert!(first[0].ptr_eq(&second[0]));
    assert_eq!(
        first[0].to_string(),
        "Review(id=1, year=2022, summary=Steady, employee_id=3)"
    );
}

#[test]
fn test_create_table_is_idempotent() {
    let (_dir, session) = setup_session();
    session.departments.create(Department::new("Kept")).unwrap();

    session.create_all_tables().unwrap();

    assert_eq!(session.departments.count().unwrap(), 1);
}

#[test]
fn test_drop_table_is_idempotent() {
    let (_dir, session) = setup_session();

    session.drop_all_tables().unwrap();
    session.drop_all_tables().unwrap();

    assert!(session.departments.get_all().is_err());
}
