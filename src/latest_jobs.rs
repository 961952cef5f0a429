use anyhow::Result;
use rusqlite::{params, Connection};

use crate::datastructures::*;

// Equal creation times resolve to the highest job id.
const LATEST_JOBS_QUERY: &str = "
WITH ranked_jobs AS (
    SELECT
        j.id,
        j.instance_id,
        j.created_at,
        ROW_NUMBER() OVER (
            PARTITION BY j.instance_id
            ORDER BY j.created_at DESC, j.id DESC
        ) AS rn
    FROM jobs j
    WHERE j.group_name = ?1
)
SELECT
    rj.instance_id,
    rj.id,
    rj.created_at,
    i.num_bin_variables,
    g.runtime,
    g.mip_gap,
    g.obj_val,
    g.sol_count,
    g.solution IS NOT NULL AND g.solution != '' AS has_solution
FROM ranked_jobs rj
JOIN instances i ON rj.instance_id = i.id
LEFT JOIN grb_attributes g ON rj.id = g.job_id
WHERE rj.rn = 1
ORDER BY rj.instance_id
";

/// Latest job of every instance that has at least one job in `group_name`.
///
/// Instances without a job in the group are not part of the result. A latest
/// job that never got an attributes row is reported with empty attributes.
pub fn latest_jobs(conn: &Connection, group_name: &str) -> Result<Vec<LatestJob>> {
    let mut stmt = conn.prepare(LATEST_JOBS_QUERY)?;
    let jobs = stmt
        .query_map(params![group_name], |row| {
            Ok(LatestJob {
                instance_id: row.get(0)?,
                job_id: row.get(1)?,
                created_at: row.get(2)?,
                num_bin_variables: row.get(3)?,
                runtime: row.get(4)?,
                mip_gap: row.get(5)?,
                obj_val: row.get(6)?,
                sol_count: row.get(7)?,
                has_solution: row.get::<_, Option<bool>>(8)?.unwrap_or(false),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(jobs)
}

const OVERVIEW_QUERY: &str = "
WITH ranked_jobs AS (
    SELECT
        j.*,
        ROW_NUMBER() OVER (
            PARTITION BY j.instance_id
            ORDER BY j.created_at DESC, j.id DESC
        ) AS rn
    FROM jobs j
)
SELECT
    i.id,
    i.name,
    rj.id,
    rj.group_name,
    rj.time_limit_s,
    rj.created_at,
    g.mip_gap,
    g.obj_val,
    g.sol_count,
    g.runtime
FROM instances i
LEFT JOIN ranked_jobs rj ON i.id = rj.instance_id AND rj.rn = 1
LEFT JOIN grb_attributes g ON rj.id = g.job_id
ORDER BY g.mip_gap ASC, i.id
";

/// Latest job of every instance regardless of its group. Instances without
/// any job are listed with empty job fields, unknown gaps sort first.
pub fn latest_job_overview(conn: &Connection) -> Result<Vec<InstanceOverview>> {
    let mut stmt = conn.prepare(OVERVIEW_QUERY)?;
    let overview = stmt
        .query_map([], |row| {
            Ok(InstanceOverview {
                instance_id: row.get(0)?,
                instance_name: row.get(1)?,
                job_id: row.get(2)?,
                group_name: row.get(3)?,
                time_limit_s: row.get(4)?,
                job_created_at: row.get(5)?,
                mip_gap: row.get(6)?,
                obj_val: row.get(7)?,
                sol_count: row.get(8)?,
                runtime: row.get(9)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(overview)
}

#[cfg(test)]
mod tests;
