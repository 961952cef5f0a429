use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{params, types::Value, Connection, OpenFlags, OptionalExtension};

use crate::datastructures::*;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS instances (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    num_bin_variables INTEGER,
    selected INTEGER NOT NULL DEFAULT 0,
    best_known_obj_val REAL
);
CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    instance_id TEXT NOT NULL REFERENCES instances(id),
    group_name TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    time_limit_s INTEGER NOT NULL DEFAULT 10
);
CREATE TABLE IF NOT EXISTS grb_attributes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER NOT NULL REFERENCES jobs(id),
    obj_val REAL,
    sol_count INTEGER NOT NULL DEFAULT 0,
    mip_gap REAL,
    solution TEXT,
    runtime REAL,
    primal_gap REAL
);
CREATE INDEX IF NOT EXISTS jobs_instance_group ON jobs(instance_id, group_name);
CREATE INDEX IF NOT EXISTS grb_attributes_job ON grb_attributes(job_id);
";

/// Opens an existing database, a missing file is an error.
pub fn open(path: &Path) -> Result<Connection> {
    debug!("Opening database {:?}", path);
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI,
    )
    .with_context(|| format!("failed to open database {path:?}"))
}

/// Opens or creates a database and makes sure all tables exist.
pub fn create(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)
        .with_context(|| format!("failed to create database {path:?}"))?;
    ensure_schema(&conn)?;
    info!("Database {:?} is ready", path);
    Ok(conn)
}

/// Creates missing tables and indices.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Inserts an instance with all its attributes.
pub fn insert_instance(conn: &Connection, instance: &Instance) -> Result<()> {
    conn.execute(
        "INSERT INTO instances (id, name, created_at, num_bin_variables, selected, best_known_obj_val)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            instance.id,
            instance.name,
            instance.created_at,
            instance.num_bin_variables,
            instance.selected,
            instance.best_known_obj_val,
        ],
    )?;
    Ok(())
}

/// Returns the id of the new job.
pub fn insert_job(
    conn: &Connection,
    instance_id: &str,
    group_name: &str,
    created_at: i64,
    time_limit_s: i64,
) -> Result<JobId> {
    conn.execute(
        "INSERT INTO jobs (instance_id, group_name, created_at, time_limit_s)
         VALUES (?1, ?2, ?3, ?4)",
        params![instance_id, group_name, created_at, time_limit_s],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Stores the outcome of a job, returns the id of the attributes row.
pub fn insert_grb_attributes(
    conn: &Connection,
    job_id: JobId,
    outcome: &Outcome,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO grb_attributes (job_id, obj_val, sol_count, mip_gap, solution, runtime)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            job_id,
            outcome.obj_val,
            outcome.sol_count,
            outcome.mip_gap,
            outcome.solution,
            outcome.runtime,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn instance_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Instance> {
    Ok(Instance {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        num_bin_variables: row.get(3)?,
        selected: row.get(4)?,
        best_known_obj_val: row.get(5)?,
    })
}

const INSTANCE_COLUMNS: &str =
    "id, name, created_at, num_bin_variables, selected, best_known_obj_val";

/// `None` if no instance has this id.
pub fn fetch_instance(conn: &Connection, id: &str) -> Result<Option<Instance>> {
    Ok(conn
        .query_row(
            &format!("SELECT {INSTANCE_COLUMNS} FROM instances WHERE id = ?1"),
            params![id],
            instance_from_row,
        )
        .optional()?)
}

/// All instances ordered by id.
pub fn fetch_instances(conn: &Connection) -> Result<Vec<Instance>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INSTANCE_COLUMNS} FROM instances ORDER BY id"
    ))?;
    let instances = stmt
        .query_map([], instance_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(instances)
}

/// Instances with the selected flag set, ordered by id.
pub fn fetch_selected_instances(conn: &Connection) -> Result<Vec<Instance>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INSTANCE_COLUMNS} FROM instances WHERE selected = 1 ORDER BY id"
    ))?;
    let instances = stmt
        .query_map([], instance_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(instances)
}

/// Jobs of one experiment group, oldest first.
pub fn fetch_jobs_in_group(conn: &Connection, group_name: &str) -> Result<Vec<Job>> {
    let mut stmt = conn.prepare(
        "SELECT id, instance_id, group_name, created_at, time_limit_s
         FROM jobs WHERE group_name = ?1 ORDER BY created_at, id",
    )?;
    let jobs = stmt
        .query_map(params![group_name], |row| {
            Ok(Job {
                id: row.get(0)?,
                instance_id: row.get(1)?,
                group_name: row.get(2)?,
                created_at: row.get(3)?,
                time_limit_s: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(jobs)
}

/// Primal gap stored for a job, `None` if unset or the job has no attributes.
pub fn fetch_primal_gap(conn: &Connection, job_id: JobId) -> Result<Option<f64>> {
    let gap: Option<Option<f64>> = conn
        .query_row(
            "SELECT primal_gap FROM grb_attributes WHERE job_id = ?1",
            params![job_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(gap.flatten())
}

/// User tables of the database, sqlite internals excluded.
pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

/// Number of rows in `table`.
pub fn row_count(conn: &Connection, table: &str) -> Result<i64> {
    let quoted = table.replace('"', "\"\"");
    Ok(conn.query_row(
        &format!("SELECT COUNT(*) FROM \"{quoted}\""),
        [],
        |row| row.get(0),
    )?)
}

fn render_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(b) => Some(format!("<{} bytes>", b.len())),
    }
}

/// Column names and the first `limit` rows of `table`, values rendered as
/// text.
pub fn table_preview(
    conn: &Connection,
    table: &str,
    limit: usize,
) -> Result<(Vec<String>, Vec<Vec<Option<String>>>)> {
    let quoted = table.replace('"', "\"\"");
    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{quoted}\" LIMIT ?1"))?;
    let columns: Vec<String> =
        stmt.column_names().into_iter().map(String::from).collect();
    let num_columns = columns.len();
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            (0..num_columns)
                .map(|i| row.get::<_, Value>(i).map(render_value))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok((columns, rows))
}
