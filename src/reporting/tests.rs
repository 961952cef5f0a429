use polars::prelude::TakeRandomUtf8;
use super::{
    instances_df, jobs_df, latest_jobs_df, overview_df, table_inventory_df, table_preview_df,
};
use crate::{
    datastructures::*,
    db,
    latest_jobs::{latest_job_overview, latest_jobs},
    test_utils::*,
};

#[test]
fn test_table_inventory() {
    let conn = fixture_db();
    add_instance(&conn, "a");
    add_job(&conn, "a", "grb_only", 1, Outcome::solved(1.0, 1.0));
    add_job(&conn, "a", "warm_start", 2, Outcome::solved(1.0, 1.0));
    let inventory = table_inventory_df(&conn).unwrap();
    let tables = inventory
        .column("table")
        .unwrap()
        .utf8()
        .unwrap()
        .into_no_null_iter()
        .collect::<Vec<_>>();
    assert_eq!(tables, vec!["grb_attributes", "instances", "jobs"]);
    let rows = inventory
        .column("rows")
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect::<Vec<_>>();
    assert_eq!(rows, vec![2, 1, 2]);
}

#[test]
fn test_listing_frames() {
    let conn = fixture_db();
    add_instance(&conn, "a");
    add_instance(&conn, "b");
    add_job(&conn, "a", "grb_only", 1, Outcome::solved(1.0, 1.0));
    add_job(&conn, "b", "grb_only", 1, Outcome::unsolved());
    add_job(&conn, "b", "warm_start", 1, Outcome::unsolved());

    let latest = latest_jobs_df(&latest_jobs(&conn, "grb_only").unwrap()).unwrap();
    assert_eq!(latest.shape(), (2, 9));
    let instances = instances_df(&db::fetch_instances(&conn).unwrap()).unwrap();
    assert_eq!(instances.height(), 2);
    let jobs = jobs_df(&db::fetch_jobs_in_group(&conn, "warm_start").unwrap()).unwrap();
    assert_eq!(jobs.height(), 1);
}

#[test]
fn test_table_preview_renders_values() {
    let conn = fixture_db();
    add_instance(&conn, "a");
    add_instance(&conn, "b");
    add_instance(&conn, "c");
    add_job(&conn, "a", "grb_only", 1, Outcome::unsolved());

    let preview = table_preview_df(&conn, "instances", 2).unwrap();
    assert_eq!(preview.shape(), (2, 6));
    let ids = preview
        .column("id")
        .unwrap()
        .utf8()
        .unwrap()
        .into_no_null_iter()
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["a", "b"]);
    let selected = preview.column("selected").unwrap().utf8().unwrap();
    assert_eq!(selected.get(0), Some("0"));
    let best = preview.column("best_known_obj_val").unwrap();
    assert_eq!(best.null_count(), 2);

    let attributes = table_preview_df(&conn, "grb_attributes", 1000).unwrap();
    assert_eq!(attributes.height(), 1);
    let runtime = attributes.column("runtime").unwrap().utf8().unwrap();
    assert_eq!(runtime.get(0), Some("1"));
}

#[test]
fn test_table_preview_of_unknown_table() {
    let conn = fixture_db();
    assert!(table_preview_df(&conn, "missing", 10).is_err());
}

#[test]
fn test_overview_frame() {
    let conn = fixture_db();
    add_instance(&conn, "a");
    add_instance(&conn, "b");
    add_job(&conn, "a", "grb_only", 1, Outcome::solved(1.0, 1.0));
    let overview = overview_df(&latest_job_overview(&conn).unwrap()).unwrap();
    assert_eq!(overview.shape(), (2, 10));
    assert_eq!(overview.column("job_id").unwrap().null_count(), 1);
}
