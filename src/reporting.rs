use std::{fs, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;
use polars::prelude::*;
use rusqlite::Connection;

use crate::{datastructures::*, db};

/// One row per latest job.
pub fn latest_jobs_df(jobs: &[LatestJob]) -> Result<DataFrame> {
    Ok(df! {
        "instance_id" => jobs.iter().map(|j| j.instance_id.clone()).collect_vec(),
        "job_id" => jobs.iter().map(|j| j.job_id).collect_vec(),
        "created_at" => jobs.iter().map(|j| j.created_at).collect_vec(),
        "num_bin_variables" => jobs.iter().map(|j| j.num_bin_variables).collect_vec(),
        "runtime" => jobs.iter().map(|j| j.runtime).collect_vec(),
        "mip_gap" => jobs.iter().map(|j| j.mip_gap).collect_vec(),
        "obj_val" => jobs.iter().map(|j| j.obj_val).collect_vec(),
        "sol_count" => jobs.iter().map(|j| j.sol_count).collect_vec(),
        "has_solution" => jobs.iter().map(|j| j.has_solution).collect_vec(),
    }?)
}

/// One row per instance.
pub fn instances_df(instances: &[Instance]) -> Result<DataFrame> {
    Ok(df! {
        "id" => instances.iter().map(|i| i.id.clone()).collect_vec(),
        "name" => instances.iter().map(|i| i.name.clone()).collect_vec(),
        "created_at" => instances.iter().map(|i| i.created_at).collect_vec(),
        "num_bin_variables" => instances.iter().map(|i| i.num_bin_variables).collect_vec(),
        "selected" => instances.iter().map(|i| i.selected).collect_vec(),
        "best_known_obj_val" => instances.iter().map(|i| i.best_known_obj_val).collect_vec(),
    }?)
}

/// One row per job.
pub fn jobs_df(jobs: &[Job]) -> Result<DataFrame> {
    Ok(df! {
        "id" => jobs.iter().map(|j| j.id).collect_vec(),
        "instance_id" => jobs.iter().map(|j| j.instance_id.clone()).collect_vec(),
        "group_name" => jobs.iter().map(|j| j.group_name.clone()).collect_vec(),
        "created_at" => jobs.iter().map(|j| j.created_at).collect_vec(),
        "time_limit_s" => jobs.iter().map(|j| j.time_limit_s).collect_vec(),
    }?)
}

/// Every table of the database with its number of rows.
pub fn table_inventory_df(conn: &Connection) -> Result<DataFrame> {
    let tables = db::table_names(conn)?;
    let row_counts = tables
        .iter()
        .map(|table| db::row_count(conn, table))
        .collect::<Result<Vec<_>>>()?;
    Ok(df! {
        "table" => tables,
        "rows" => row_counts,
    }?)
}

/// First `limit` rows of `table` with every column as text.
pub fn table_preview_df(conn: &Connection, table: &str, limit: usize) -> Result<DataFrame> {
    let (columns, rows) = db::table_preview(conn, table, limit)?;
    let series = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values = rows.iter().map(|row| row[i].clone()).collect_vec();
            Series::new(name, values)
        })
        .collect_vec();
    Ok(DataFrame::new(series)?)
}

/// One row per instance, see [`crate::latest_jobs::latest_job_overview`].
pub fn overview_df(overview: &[InstanceOverview]) -> Result<DataFrame> {
    Ok(df! {
        "instance_id" => overview.iter().map(|o| o.instance_id.clone()).collect_vec(),
        "instance_name" => overview.iter().map(|o| o.instance_name.clone()).collect_vec(),
        "job_id" => overview.iter().map(|o| o.job_id).collect_vec(),
        "group_name" => overview.iter().map(|o| o.group_name.clone()).collect_vec(),
        "time_limit_s" => overview.iter().map(|o| o.time_limit_s).collect_vec(),
        "job_created_at" => overview.iter().map(|o| o.job_created_at).collect_vec(),
        "mip_gap" => overview.iter().map(|o| o.mip_gap).collect_vec(),
        "obj_val" => overview.iter().map(|o| o.obj_val).collect_vec(),
        "sol_count" => overview.iter().map(|o| o.sol_count).collect_vec(),
        "runtime" => overview.iter().map(|o| o.runtime).collect_vec(),
    }?)
}

/// Writes `df` with header, creating missing parent directories.
pub fn df_to_csv(mut df: DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)
        .with_context(|| format!("failed to create {path:?}"))?;
    CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;
    info!("Wrote {} rows to {:?}", df.height(), path);
    Ok(())
}

#[cfg(test)]
mod tests;
