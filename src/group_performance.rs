use anyhow::Result;
use itertools::{izip, Itertools};
use log::info;
use polars::prelude::*;
use rusqlite::Connection;

use crate::datastructures::*;

const SELECTED_JOBS_QUERY: &str = "
SELECT
    j.id,
    j.instance_id,
    j.group_name,
    ga.obj_val,
    COALESCE(ga.sol_count, 0) AS sol_count,
    ga.primal_gap
FROM jobs j
JOIN instances i ON j.instance_id = i.id
LEFT JOIN grb_attributes ga ON j.id = ga.job_id
WHERE i.selected = 1
ORDER BY j.id
";

const QUANTILES: [(f64, &str); 3] = [
    (0.25, "p25_primal_gap"),
    (0.5, "median_primal_gap"),
    (0.75, "p75_primal_gap"),
];

/// One row per job of a selected instance with the columns `job_id`,
/// `instance_id`, `group_name`, `obj_val`, `sol_count` and `primal_gap`.
pub fn selected_jobs_df(conn: &Connection) -> Result<DataFrame> {
    let mut stmt = conn.prepare(SELECTED_JOBS_QUERY)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<f64>>(5)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(df! {
        "job_id" => rows.iter().map(|r| r.0).collect_vec(),
        "instance_id" => rows.iter().map(|r| r.1.clone()).collect_vec(),
        "group_name" => rows.iter().map(|r| r.2.clone()).collect_vec(),
        "obj_val" => rows.iter().map(|r| r.3).collect_vec(),
        "sol_count" => rows.iter().map(|r| r.4).collect_vec(),
        "primal_gap" => rows.iter().map(|r| r.5).collect_vec(),
    }?)
}

/// Sample size, mean, max, sample standard deviation and quartiles of the
/// primal gap per group. Null gaps are not counted and the standard
/// deviation of a group with less than two gaps is null.
pub fn summary_statistics(df: LazyFrame) -> LazyFrame {
    let sample_size = || col("primal_gap").is_not_null().sum();
    let quantiles = QUANTILES.iter().map(|(q, name)| {
        col("primal_gap")
            .quantile(lit(*q), QuantileInterpolOptions::Linear)
            .alias(name)
    });
    let aggregations = [
        sample_size().cast(DataType::UInt32).alias("sample_size"),
        col("primal_gap").mean().alias("avg_primal_gap"),
        col("primal_gap").max().alias("max_primal_gap"),
        when(sample_size().gt(lit(1)))
            .then(col("primal_gap").std(1))
            .otherwise(lit(NULL).cast(DataType::Float64))
            .alias("std_primal_gap"),
    ]
    .into_iter()
    .chain(quantiles)
    .collect_vec();
    df.groupby_stable([col("group_name")]).agg(aggregations)
}

/// Number of instances on which a group reached the lowest objective value.
///
/// Every job matching the per instance minimum counts, so ties award a win to
/// each tied job. Groups without any win do not show up here.
pub fn wins_per_group(df: LazyFrame) -> LazyFrame {
    let solved = df.filter(
        col("sol_count")
            .gt(lit(0))
            .and(col("obj_val").is_not_null()),
    );
    let best_per_instance = solved
        .clone()
        .groupby([col("instance_id")])
        .agg([col("obj_val").min().alias("best_obj_val")]);
    solved
        .join(
            best_per_instance,
            [col("instance_id")],
            [col("instance_id")],
            JoinType::Inner,
        )
        .filter(col("obj_val").eq(col("best_obj_val")))
        .groupby([col("group_name")])
        .agg([count().alias("wins")])
}

/// Summary statistics joined with the wins, most wins first.
pub fn performance_table(df: LazyFrame) -> LazyFrame {
    summary_statistics(df.clone())
        .join(
            wins_per_group(df),
            [col("group_name")],
            [col("group_name")],
            JoinType::Left,
        )
        .with_column(col("wins").fill_null(lit(0)).cast(DataType::UInt32))
        .sort_by_exprs([col("wins"), col("group_name")], vec![true, false], false)
}

/// Performance of every experiment group on the selected instances.
pub fn group_performance(conn: &Connection) -> Result<DataFrame> {
    let jobs = selected_jobs_df(conn)?;
    if jobs.height() == 0 {
        info!("No jobs on selected instances");
        return empty_performance_table();
    }
    let table = performance_table(jobs.lazy()).collect()?;
    info!("Performance of {} groups", table.height());
    Ok(table)
}

fn empty_performance_table() -> Result<DataFrame> {
    let no_values: Vec<Option<f64>> = vec![];
    Ok(df! {
        "group_name" => Vec::<String>::new(),
        "sample_size" => Vec::<u32>::new(),
        "avg_primal_gap" => no_values.clone(),
        "max_primal_gap" => no_values.clone(),
        "std_primal_gap" => no_values.clone(),
        "p25_primal_gap" => no_values.clone(),
        "median_primal_gap" => no_values.clone(),
        "p75_primal_gap" => no_values,
        "wins" => Vec::<u32>::new(),
    }?)
}

/// Typed rows of a table built by [`group_performance`].
pub fn extract_group_performance(df: &DataFrame) -> Result<Vec<GroupPerformance>> {
    let f64_column = |name: &str| -> Result<Vec<Option<f64>>> {
        Ok(df.column(name)?.f64()?.into_iter().collect_vec())
    };
    let groups = df.column("group_name")?.utf8()?.into_no_null_iter();
    let sample_sizes = df.column("sample_size")?.u32()?.into_no_null_iter();
    let wins = df.column("wins")?.u32()?.into_no_null_iter();
    let stats = izip!(
        f64_column("avg_primal_gap")?,
        f64_column("max_primal_gap")?,
        f64_column("std_primal_gap")?,
        f64_column("p25_primal_gap")?,
        f64_column("median_primal_gap")?,
        f64_column("p75_primal_gap")?,
    );
    Ok(izip!(groups, sample_sizes, wins, stats)
        .map(
            |(group_name, sample_size, wins, (avg, max, std, p25, median, p75))| {
                GroupPerformance {
                    group_name: group_name.to_string(),
                    sample_size,
                    avg_primal_gap: avg,
                    max_primal_gap: max,
                    std_primal_gap: std,
                    p25_primal_gap: p25,
                    median_primal_gap: median,
                    p75_primal_gap: p75,
                    wins,
                }
            },
        )
        .collect())
}
