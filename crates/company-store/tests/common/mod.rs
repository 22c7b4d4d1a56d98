use company_store::{Session, StoreConfig};
use rusqlite::Connection;
use tempfile::TempDir;

/// Session on a fresh database file with all tables created
///
/// Keep the returned TempDir alive for as long as the session is used.
#[allow(dead_code)]
pub fn setup_session() -> (TempDir, Session) {
    setup_session_with(|config| config)
}

/// Like `setup_session`, with a chance to adjust the configuration
#[allow(dead_code)]
pub fn setup_session_with(adjust: impl FnOnce(StoreConfig) -> StoreConfig) -> (TempDir, Session) {
    let dir = tempfile::tempdir().unwrap();
    let config = adjust(StoreConfig::new(dir.path().join("company.db")));
    let session = Session::open(config).unwrap();
    session.create_all_tables().unwrap();
    (dir, session)
}

/// Plain connection that bypasses the repositories
#[allow(dead_code)]
pub fn raw_connection(session: &Session) -> Connection {
    Connection::open(session.database().path()).unwrap()
}

#[allow(dead_code)]
pub fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .unwrap()
}
