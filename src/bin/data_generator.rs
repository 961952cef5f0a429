use std::path::PathBuf;
use std::fs;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use log::info;
use mip_curator::datastructures::{Instance, Outcome, SELECTION_GROUP};
use mip_curator::db;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::{LogNormal, Normal};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Objective of a group relative to the hidden optimum of an instance.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct GroupConfig {
    name: String,
    /// mean of the objective factor, 1.0 is optimal
    mean: f64,
    std: f64,
    solve_probability: f64,
    runs_per_instance: usize,
}

impl GroupConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.solve_probability),
            "solve_probability must be in [0, 1], got {}",
            self.solve_probability
        );
        ensure!(
            self.std.is_finite() && self.std >= 0.0,
            "std must be finite and non-negative, got {}",
            self.std
        );
        ensure!(self.mean.is_finite(), "mean must be finite, got {}", self.mean);
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct DataGeneratorConfig {
    group_configs: Vec<GroupConfig>,
    num_instances: usize,
    seed: u64,
    out_path: PathBuf,
}

impl DataGeneratorConfig {
    fn validate(&self) -> Result<()> {
        for group in &self.group_configs {
            group
                .validate()
                .with_context(|| format!("invalid group config {:?}", group.name))?;
        }
        Ok(())
    }
}

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the json config
    #[arg(short, long)]
    pub config: PathBuf,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();
    let config_str = fs::read_to_string(&args.config)
        .with_context(|| format!("reading {:?}", args.config))?;
    let config: DataGeneratorConfig = serde_json::from_str(&config_str)
        .with_context(|| format!("parsing {:?}", args.config))?;
    config.validate()?;
    let mut conn = db::create(&config.out_path)?;
    let num_jobs = generate_data(&config, &mut conn)?;
    info!(
        "Generated {num_jobs} jobs on {} instances in {:?}",
        config.num_instances, config.out_path
    );
    Ok(())
}

fn generate_data(config: &DataGeneratorConfig, conn: &mut Connection) -> Result<usize> {
    config.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mip_gaps = LogNormal::new(0.0, 1.5)?;
    let tx = conn.transaction()?;
    let mut created_at = 0;
    let mut num_jobs = 0;
    for i in 0..config.num_instances {
        let instance_id = format!("instance{i}");
        let optimum = rng.gen_range(100.0..10_000.0_f64).round();
        db::insert_instance(
            &tx,
            &Instance {
                num_bin_variables: Some(rng.gen_range(1..5_000)),
                ..Instance::new(&instance_id, &format!("{instance_id}.mps"), created_at)
            },
        )?;
        for group in &config.group_configs {
            let objective_factor = Normal::new(group.mean, group.std)?;
            for _ in 0..group.runs_per_instance {
                created_at += 1;
                let outcome = if rng.gen_bool(group.solve_probability) {
                    let obj_val =
                        (optimum * objective_factor.sample(&mut rng).max(1.0)).round();
                    Outcome {
                        runtime: rng.gen_range(1.0..60.0),
                        ..Outcome::solved(obj_val, mip_gaps.sample(&mut rng))
                    }
                } else {
                    Outcome::unsolved()
                };
                let job_id = db::insert_job(&tx, &instance_id, &group.name, created_at, 60)?;
                db::insert_grb_attributes(&tx, job_id, &outcome)?;
                num_jobs += 1;
            }
        }
    }
    tx.commit()?;
    if !config
        .group_configs
        .iter()
        .any(|group| group.name == SELECTION_GROUP)
    {
        info!("No {SELECTION_GROUP} group configured, no instance will be selected");
    }
    Ok(num_jobs)
}
