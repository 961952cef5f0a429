#![allow(dead_code)]
use mip_curator::{datastructures::*, db};
use rusqlite::Connection;

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
    let job_id = db::insert_job(conn, instance_id, group_name, created_at, 10).unwrap();
    db::insert_grb_attributes(conn, job_id, &outcome).unwrap();
    job_id
}

pub fn refresh(conn: &mut Connection) {
    mip_curator::instance_selector::make_instance_selection(
        conn,
        &SelectionCriteria::default(),
    )
    .unwrap();
    mip_curator::best_objective::set_best_obj_val(conn).unwrap();
    mip_curator::primal_gap::set_primal_gap(conn, 1e-9).unwrap();
}

/// Instance "a" is re-run out of the gap band, "b" is selected and has
/// warm start and lns runs.
pub fn two_instance_db() -> (Connection, [JobId; 3]) {
    let conn = fixture_db();
    add_instance(&conn, "a");
    add_instance(&conn, "b");
    add_job(&conn, "a", "grb_only", 1, Outcome::solved(10.0, 0.2));
    add_job(&conn, "a", "grb_only", 2, Outcome::solved(10.0, 15.0));
    let grb = add_job(&conn, "b", "grb_only", 1, Outcome::solved(120.0, 1.0));
    let warm = add_job(&conn, "b", "warm_start", 2, Outcome::solved(100.0, 0.5));
    let lns = add_job(&conn, "b", "lns_0.05", 3, Outcome::solved(95.0, 0.4));
    (conn, [grb, warm, lns])
}
