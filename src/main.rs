use anyhow::Result;
use clap::Parser;
use log::{error, info};
use polars::prelude::DataFrame;

use mip_curator::best_objective;
use mip_curator::datastructures::*;
use mip_curator::db;
use mip_curator::group_performance;
use mip_curator::instance_selector;
use mip_curator::latest_jobs;
use mip_curator::primal_gap;
use mip_curator::reporting;

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();
    let config = {
        let config = match Config::from_cli(&args) {
            Ok(config) => config,
            Err(e) => {
                error!("Invalid configuration: {e:#}");
                std::process::exit(exitcode::CONFIG);
            }
        };
        CONFIG.set(config).ok();
        Config::global()
    };

    if let Command::InitDb = args.command {
        db::create(&config.db_path)?;
        return Ok(());
    }
    let mut conn = db::open(&config.db_path)?;
    let selection = &config.selection;
    let table = match &args.command {
        Command::InitDb => None,
        Command::Select => {
            instance_selector::make_instance_selection(&mut conn, selection)?;
            None
        }
        Command::BestObj => {
            best_objective::set_best_obj_val(&mut conn)?;
            None
        }
        Command::PrimalGap => {
            primal_gap::set_primal_gap(&mut conn, config.zero_tolerance)?;
            None
        }
        Command::Refresh => {
            let selected =
                instance_selector::make_instance_selection(&mut conn, selection)?;
            let best = best_objective::set_best_obj_val(&mut conn)?;
            let gaps = primal_gap::set_primal_gap(&mut conn, config.zero_tolerance)?;
            info!(
                "Refreshed: {} selected, {} best objectives, {gaps}",
                selected.selected, best.updated
            );
            None
        }
        Command::Performance => {
            let table = group_performance::group_performance(&conn)?;
            for group in group_performance::extract_group_performance(&table)? {
                info!("{group}");
            }
            Some(table)
        }
        Command::LatestJobs { group } => Some(reporting::latest_jobs_df(
            &latest_jobs::latest_jobs(&conn, group)?,
        )?),
        Command::Candidates => {
            let before = latest_jobs::latest_jobs(&conn, &selection.group_name)?;
            let after = instance_selector::selection_candidates(&conn, selection)?;
            info!(
                "{} of {} instances pass {} < mip_gap < {}",
                after.len(),
                before.len(),
                selection.min_mip_gap,
                selection.max_mip_gap
            );
            Some(reporting::latest_jobs_df(&after)?)
        }
        Command::Selected => Some(reporting::instances_df(
            &db::fetch_selected_instances(&conn)?,
        )?),
        Command::Jobs { group } => Some(reporting::jobs_df(
            &db::fetch_jobs_in_group(&conn, group)?,
        )?),
        Command::Tables => Some(reporting::table_inventory_df(&conn)?),
        Command::Preview { table, limit } => {
            Some(reporting::table_preview_df(&conn, table, *limit)?)
        }
        Command::Overview => Some(reporting::overview_df(
            &latest_jobs::latest_job_overview(&conn)?,
        )?),
    };
    if let Some(table) = table {
        emit(table, args.command.table_name(), config)?;
    }
    Ok(())
}

fn emit(table: DataFrame, name: &str, config: &Config) -> Result<()> {
    info!("{name}:\n{table}");
    if let Some(out_dir) = &config.out_dir {
        reporting::df_to_csv(table, &out_dir.join(format!("{name}.csv")))?;
    }
    Ok(())
}
