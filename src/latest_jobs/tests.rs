use super::{latest_job_overview, latest_jobs};
use crate::{datastructures::*, db, test_utils::*};

#[test]
fn test_latest_job_per_instance() {
    let conn = fixture_db();
    add_instance(&conn, "a");
    add_instance(&conn, "b");
    add_job(&conn, "a", "grb_only", 1, Outcome::solved(10.0, 0.2));
    let latest_a = add_job(&conn, "a", "grb_only", 2, Outcome::solved(9.0, 15.0));
    let latest_b = add_job(&conn, "b", "grb_only", 5, Outcome::solved(3.0, 1.0));
    add_job(&conn, "b", "grb_only", 4, Outcome::solved(4.0, 2.0));
    let jobs = latest_jobs(&conn, "grb_only").unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].instance_id, "a");
    assert_eq!(jobs[0].job_id, latest_a);
    assert_eq!(jobs[0].mip_gap, Some(15.0));
    assert_eq!(jobs[1].job_id, latest_b);
    assert!(jobs[1].has_solution);
}

#[test]
fn test_other_groups_are_ignored() {
    let conn = fixture_db();
    add_instance(&conn, "a");
    add_instance(&conn, "b");
    add_job(&conn, "a", "grb_only", 1, Outcome::solved(10.0, 0.2));
    add_job(&conn, "a", "warm_start", 9, Outcome::solved(8.0, 0.1));
    add_job(&conn, "b", "warm_start", 3, Outcome::solved(8.0, 0.1));
    let jobs = latest_jobs(&conn, "grb_only").unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].created_at, 1);
    assert_eq!(jobs[0].obj_val, Some(10.0));
    assert!(latest_jobs(&conn, "lns_0.05").unwrap().is_empty());
}

#[test]
fn test_equal_creation_time_prefers_highest_id() {
    let conn = fixture_db();
    add_instance(&conn, "a");
    let first = add_job(&conn, "a", "grb_only", 7, Outcome::solved(10.0, 0.2));
    let second = add_job(&conn, "a", "grb_only", 7, Outcome::solved(11.0, 0.3));
    assert!(second > first);
    let jobs = latest_jobs(&conn, "grb_only").unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].job_id, second);
}

#[test]
fn test_latest_job_without_attributes() {
    let conn = fixture_db();
    add_instance(&conn, "a");
    add_job(&conn, "a", "grb_only", 1, Outcome::solved(10.0, 0.2));
    let pending = db::insert_job(&conn, "a", "grb_only", 2, 10).unwrap();
    let jobs = latest_jobs(&conn, "grb_only").unwrap();
    assert_eq!(jobs[0].job_id, pending);
    assert_eq!(jobs[0].mip_gap, None);
    assert_eq!(jobs[0].sol_count, None);
    assert!(!jobs[0].has_solution);
}

#[test]
fn test_empty_solution_is_no_solution() {
    let conn = fixture_db();
    add_instance(&conn, "a");
    add_job(
        &conn,
        "a",
        "grb_only",
        1,
        Outcome {
            solution: Some(String::new()),
            ..Outcome::solved(10.0, 0.2)
        },
    );
    let jobs = latest_jobs(&conn, "grb_only").unwrap();
    assert!(!jobs[0].has_solution);
}

#[test]
fn test_overview_spans_all_groups() {
    let conn = fixture_db();
    add_instance(&conn, "a");
    add_instance(&conn, "b");
    add_instance(&conn, "idle");
    add_job(&conn, "a", "grb_only", 1, Outcome::solved(10.0, 0.2));
    let latest_a = add_job(&conn, "a", "warm_start", 3, Outcome::solved(9.0, 0.5));
    let latest_b = add_job(&conn, "b", "lns_0.05", 2, Outcome::solved(4.0, 0.1));
    add_job(&conn, "b", "grb_only", 1, Outcome::solved(5.0, 0.01));

    let overview = latest_job_overview(&conn).unwrap();
    let ids = overview.iter().map(|o| o.instance_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["idle", "b", "a"]);

    let idle = &overview[0];
    assert_eq!(idle.instance_name, "idle.mps");
    assert_eq!(idle.job_id, None);
    assert_eq!(idle.group_name, None);
    assert_eq!(idle.mip_gap, None);

    assert_eq!(overview[1].job_id, Some(latest_b));
    assert_eq!(overview[1].group_name.as_deref(), Some("lns_0.05"));
    assert_eq!(overview[2].job_id, Some(latest_a));
    assert_eq!(overview[2].time_limit_s, Some(10));
    assert_eq!(overview[2].obj_val, Some(9.0));
}
