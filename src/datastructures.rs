use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use core::fmt;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Primary key of `instances`.
pub type InstanceId = String;
/// Primary key of `jobs`.
pub type JobId = i64;

/// Experiment group whose latest run decides the instance selection.
pub const SELECTION_GROUP: &str = "grb_only";

/// Configuration of the running binary.
pub static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A row of `instances`.
pub struct Instance {
    pub id: InstanceId,
    pub name: String,
    /// unix seconds
    pub created_at: i64,
    pub num_bin_variables: Option<i64>,
    /// set by the instance selection
    pub selected: bool,
    /// lowest objective value of any solved job
    pub best_known_obj_val: Option<f64>,
}

impl Instance {
    /// Unselected instance without a reference objective.
    pub fn new(id: &str, name: &str, created_at: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            created_at,
            num_bin_variables: None,
            selected: false,
            best_known_obj_val: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A row of `jobs`, one solver run in an experiment group.
pub struct Job {
    pub id: JobId,
    pub instance_id: InstanceId,
    pub group_name: String,
    pub created_at: i64,
    pub time_limit_s: i64,
}

/// What a finished solver run reports, as stored in `grb_attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub obj_val: Option<f64>,
    /// 0 if no feasible solution was found
    pub sol_count: i64,
    pub mip_gap: Option<f64>,
    /// serialized solution payload
    pub solution: Option<String>,
    pub runtime: f64,
}

impl Outcome {
    /// A run with one solution of value `obj_val`.
    pub fn solved(obj_val: f64, mip_gap: f64) -> Self {
        Self {
            obj_val: Some(obj_val),
            sol_count: 1,
            mip_gap: Some(mip_gap),
            solution: Some(format!("obj={obj_val}")),
            runtime: 1.0,
        }
    }

    /// A run that terminated without a feasible solution.
    pub fn unsolved() -> Self {
        Self {
            obj_val: None,
            sol_count: 0,
            mip_gap: None,
            solution: None,
            runtime: 1.0,
        }
    }
}

/// The most recent job of an instance within one experiment group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestJob {
    pub instance_id: InstanceId,
    pub job_id: JobId,
    pub created_at: i64,
    pub num_bin_variables: Option<i64>,
    pub runtime: Option<f64>,
    pub mip_gap: Option<f64>,
    pub obj_val: Option<f64>,
    pub sol_count: Option<i64>,
    /// solution payload is present and not empty
    pub has_solution: bool,
}

/// Latest job of an instance over all groups, job fields are `None` for
/// instances that never ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceOverview {
    pub instance_id: InstanceId,
    pub instance_name: String,
    pub job_id: Option<JobId>,
    pub group_name: Option<String>,
    pub time_limit_s: Option<i64>,
    pub job_created_at: Option<i64>,
    pub mip_gap: Option<f64>,
    pub obj_val: Option<f64>,
    pub sol_count: Option<i64>,
    pub runtime: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Which latest jobs make their instance selected.
pub struct SelectionCriteria {
    #[serde(default = "default_group_name")]
    pub group_name: String,
    #[serde(default = "default_min_mip_gap")]
    pub min_mip_gap: f64,
    #[serde(default = "default_max_mip_gap")]
    pub max_mip_gap: f64,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            group_name: default_group_name(),
            min_mip_gap: default_min_mip_gap(),
            max_mip_gap: default_max_mip_gap(),
        }
    }
}

impl SelectionCriteria {
    /// Both gap bounds are exclusive.
    pub fn accepts(&self, job: &LatestJob) -> bool {
        let in_band = job
            .mip_gap
            .map_or(false, |gap| self.min_mip_gap < gap && gap < self.max_mip_gap);
        in_band && job.has_solution
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
/// Outcome of an instance selection.
pub struct SelectionReport {
    pub selected: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
/// Number of instances whose best known objective was written.
pub struct BestObjectiveReport {
    pub updated: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
/// Outcome of a primal gap update.
pub struct PrimalGapReport {
    pub updated: usize,
    /// gaps against a zero or missing reference objective
    pub infinite: usize,
    /// solved jobs without objective value
    pub skipped: usize,
}

impl fmt::Display for PrimalGapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "updated primal gap for {} jobs ({} infinite, {} skipped)",
            self.updated, self.infinite, self.skipped
        )
    }
}

/// One row of the group performance table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPerformance {
    pub group_name: String,
    pub sample_size: u32,
    pub avg_primal_gap: Option<f64>,
    pub max_primal_gap: Option<f64>,
    pub std_primal_gap: Option<f64>,
    pub p25_primal_gap: Option<f64>,
    pub median_primal_gap: Option<f64>,
    pub p75_primal_gap: Option<f64>,
    pub wins: u32,
}

impl fmt::Display for GroupPerformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{v:.4}"));
        write!(
            f,
            "{}: n={} avg={} median={} max={} wins={}",
            self.group_name,
            self.sample_size,
            show(self.avg_primal_gap),
            show(self.median_primal_gap),
            show(self.max_primal_gap),
            self.wins
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Json config of `mip_curator`, every field has a default.
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default)]
    pub selection: SelectionCriteria,
    /// reference objectives at most this far from zero give an infinite gap
    #[serde(default = "default_zero_tolerance")]
    pub zero_tolerance: f64,
    /// csv tables are only written if set
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            selection: SelectionCriteria::default(),
            zero_tolerance: default_zero_tolerance(),
            out_dir: None,
        }
    }
}

impl Config {
    /// Reads the optional json config and applies cli overrides.
    pub fn from_cli(args: &Args) -> Result<Config> {
        let mut config = match &args.config {
            Some(config_path) => {
                let config_str = fs::read_to_string(config_path)
                    .with_context(|| format!("reading {config_path:?}"))?;
                serde_json::from_str(&config_str)
                    .with_context(|| format!("parsing {config_path:?}"))?
            }
            None => Config::default(),
        };
        if let Some(db_path) = &args.db {
            config.db_path = db_path.to_path_buf();
        }
        if let Some(out_dir) = &args.out_dir {
            config.out_dir = Some(out_dir.to_path_buf());
        }
        if let Some(min_mip_gap) = args.min_mip_gap {
            config.selection.min_mip_gap = min_mip_gap;
        }
        if let Some(max_mip_gap) = args.max_mip_gap {
            config.selection.max_mip_gap = max_mip_gap;
        }
        Ok(config)
    }

    /// Panics before [`CONFIG`] is set.
    pub fn global() -> &'static Config {
        CONFIG.get().expect("config is not initialized")
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/db.sqlite")
}

fn default_group_name() -> String {
    SELECTION_GROUP.to_string()
}

fn default_min_mip_gap() -> f64 {
    0.05
}

fn default_max_mip_gap() -> f64 {
    10.0
}

fn default_zero_tolerance() -> f64 {
    1e-9
}

#[derive(Parser)]
#[command(author, version, about)]
/// Command line of `mip_curator`.
pub struct Args {
    /// Path to a json config, cli arguments take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the sqlite database
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Directory to write csv tables to
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Exclusive lower bound on the mip gap of selected instances
    #[arg(long)]
    pub min_mip_gap: Option<f64>,

    /// Exclusive upper bound on the mip gap of selected instances
    #[arg(long)]
    pub max_mip_gap: Option<f64>,

    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone)]
/// Operations of `mip_curator`.
pub enum Command {
    /// Create the tables of an empty database
    InitDb,
    /// Recompute the selected flag of all instances
    Select,
    /// Store the best objective value found per instance
    BestObj,
    /// Store the primal gap of every solved job
    PrimalGap,
    /// Run select, best-obj and primal-gap in this order
    Refresh,
    /// Primal gap statistics and wins per experiment group
    Performance,
    /// Latest job per instance within a group
    LatestJobs {
        #[arg(short, long, default_value = SELECTION_GROUP)]
        group: String,
    },
    /// Latest jobs that pass the selection criteria
    Candidates,
    /// Instances that are currently selected
    Selected,
    /// All jobs of an experiment group
    Jobs {
        #[arg(short, long)]
        group: String,
    },
    /// Tables of the database with their row counts
    Tables,
    /// First rows of a table
    Preview {
        table: String,
        #[arg(short, long, default_value_t = 1000)]
        limit: usize,
    },
    /// Latest job of every instance over all groups, lowest mip gap first
    Overview,
}

impl Command {
    /// File stem for csv output of tabular commands.
    pub fn table_name(&self) -> &'static str {
        match self {
            Command::InitDb => "init_db",
            Command::Select => "select",
            Command::BestObj => "best_obj",
            Command::PrimalGap => "primal_gap",
            Command::Refresh => "refresh",
            Command::Performance => "performance",
            Command::LatestJobs { .. } => "latest_jobs",
            Command::Candidates => "candidates",
            Command::Selected => "selected",
            Command::Jobs { .. } => "jobs",
            Command::Tables => "tables",
            Command::Preview { .. } => "preview",
            Command::Overview => "overview",
        }
    }
}
