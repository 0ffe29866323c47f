pub mod correction;
pub mod dose;
pub mod plan_id;
pub mod simulate;

use clap::{ArgAction, Args, Parser, Subcommand};
use eqd2_common::dose::{GridDimensions, RoundingPolicy};
use eqd2_common::fractionation::AlphaOverBeta;
use eqd2_common::plan::MAX_PLAN_ID_LENGTH;

#[derive(Parser)]
#[command(name = "eqd2")]
#[command(about = "Converts planned dose into equivalent dose in 2 Gy fractions.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Print less (repeat for results only)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,

    /// Rounding of EQD2 voxel values: half-even or half-away
    #[arg(long, global = true, default_value = "half-even")]
    pub rounding: RoundingPolicy,

    /// Longest plan identifier the planning system accepts
    #[arg(long, global = true, default_value_t = MAX_PLAN_ID_LENGTH)]
    pub max_id_length: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a total dose into EQD2
    #[command(alias = "d")]
    Dose {
        /// Total physical dose in Gy
        total_dose: f64,
        /// Number of fractions the dose is delivered in
        #[arg(short, long)]
        fractions: u32,
        /// Tissue alpha/beta in Gy (prompted for when omitted)
        #[arg(short, long)]
        alpha_beta: Option<AlphaOverBeta>,
    },
    /// Generate the identifier of an EQD2 plan
    #[command(alias = "id")]
    PlanId {
        /// Identifier of the source plan
        source_id: String,
        /// Identifiers already used in the course
        #[arg(short, long, value_delimiter = ',')]
        existing: Vec<String>,
    },
    /// Compute the duplication correction from two maximum doses
    #[command(alias = "c")]
    Correction {
        /// Maximum dose of the source plan in Gy
        source_max: f64,
        /// Maximum dose of the duplicated plan in Gy
        duplicate_max: f64,
    },
    /// Create an EQD2 plan for a synthetic course
    #[command(alias = "s")]
    Simulate(SimulateArgs),
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Tissue alpha/beta in Gy (prompted for when omitted)
    #[arg(short, long)]
    pub alpha_beta: Option<AlphaOverBeta>,

    /// Identifier of the source plan
    #[arg(long, default_value = "PlanA")]
    pub plan_id: String,

    /// Number of fractions of the source plan
    #[arg(short, long, default_value_t = 25)]
    pub fractions: u32,

    /// Dose per fraction of the source plan in Gy
    #[arg(short, long, default_value_t = 2.0)]
    pub dose_per_fraction: f64,

    /// Grid size as X,Y,Z
    #[arg(short, long, default_value = "48,48,32")]
    pub size: GridDimensions,

    /// Scale error introduced when the host duplicates a dose
    #[arg(long, default_value_t = 0.997)]
    pub skew: f64,

    /// Apply the duplication skew to the copied voxels instead of the scale
    #[arg(long)]
    pub requantize: bool,

    /// Relative dose noise, e.g. 0.02 for +/-2 %
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Seed of the dose noise
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Plans already present in the course
    #[arg(short, long, value_delimiter = ',')]
    pub existing: Vec<String>,

    /// Refuse write access, as an unapproved script would be
    #[arg(long)]
    pub read_only: bool,

    /// Leave the source plan without a structure set
    #[arg(long)]
    pub no_structure_set: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
