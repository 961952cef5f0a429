#![warn(missing_docs)]
//! Curate and analyze results of MIP solver experiments stored in SQLite.
//!
//! Solver runs ("jobs") are grouped by experiment strategy, e.g. `grb_only`,
//! `warm_start` or `lns_0.05`. This crate selects the instances of medium
//! difficulty based on the MIP gap of their latest `grb_only` run, stores the
//! best known objective value per instance, derives the primal gap of every
//! job and summarizes the strategies on the selected instances.
//!
//! All operations receive an explicit [`rusqlite::Connection`]. Writing
//! operations run in a single transaction each, a failure leaves the database
//! as it was. The binary `mip_curator` exposes every operation as a
//! subcommand, `data_generator` fills a database with synthetic results.
//!
//! Example
//! ```rust
//! use mip_curator::{best_objective, db, group_performance, instance_selector, primal_gap};
//! use mip_curator::datastructures::SelectionCriteria;
//! # use std::path::Path;
//! # use anyhow::Result;
//!
//! fn example() -> Result<()> {
//!     let mut conn = db::open(Path::new("data/db.sqlite"))?;
//!
//!     // 0.05 < mip_gap < 10 on the latest grb_only job
//!     let criteria = SelectionCriteria::default();
//!     instance_selector::make_instance_selection(&mut conn, &criteria)?;
//!
//!     // primal gaps are relative to the best objective, refresh it first
//!     best_objective::set_best_obj_val(&mut conn)?;
//!     primal_gap::set_primal_gap(&mut conn, 1e-9)?;
//!
//!     let table = group_performance::group_performance(&conn)?;
//!     for group in group_performance::extract_group_performance(&table)? {
//!         println!("{group}");
//!     }
//!     Ok(())
//! }
//! ```

/// Stores the minimum objective value of solved jobs per instance.
pub mod best_objective;

/// Record types, reports and the command line configuration.
pub mod datastructures;

/// Opening the database, schema and row level access.
pub mod db;

/// Primal gap statistics and win counts per experiment group.
pub mod group_performance;

/// Selection of medium difficulty instances by MIP gap.
pub mod instance_selector;

/// Latest job per instance within an experiment group.
pub mod latest_jobs;

/// Relative distance of every solved job to the best known objective.
pub mod primal_gap;

/// Data frames for listings and csv output.
pub mod reporting;

#[cfg(test)]
mod test_utils;
