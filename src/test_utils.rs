use rusqlite::Connection;

use crate::{datastructures::*, db};

pub fn fixture_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::ensure_schema(&conn).unwrap();
    conn
}

pub fn add_instance(conn: &Connection, id: &str) {
    db::insert_instance(conn, &Instance::new(id, &format!("{id}.mps"), 0)).unwrap();
}

pub fn add_job(
    conn: &Connection,
    instance_id: &str,
    group_name: &str,
    created_at: i64,
    outcome: Outcome,
) -> JobId {
    let job_id =
        db::insert_job(conn, instance_id, group_name, created_at, 10).unwrap();
    db::insert_grb_attributes(conn, job_id, &outcome).unwrap();
    job_id
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
