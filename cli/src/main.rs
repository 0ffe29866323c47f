mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, correction, dose, plan_id, simulate};
use eqd2_common::config::Config;
use terminal::{logging, print};
use tracing::error;

fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    if let Err(e) = logging::init_logging() {
        eprintln!("failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    let cfg = Config {
        no_banner: commands.no_banner,
        quiet: commands.quiet,
        rounding: commands.rounding,
        max_id_length: commands.max_id_length,
    };

    print::banner(cfg.no_banner, cfg.quiet);

    match run(commands.command, &cfg) {
        Ok(()) => {
            print::end_of_program(cfg.quiet);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, cfg: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Dose {
            total_dose,
            fractions,
            alpha_beta,
        } => dose::dose(total_dose, fractions, alpha_beta, cfg),
        Commands::PlanId { source_id, existing } => plan_id::plan_id(&source_id, &existing, cfg),
        Commands::Correction {
            source_max,
            duplicate_max,
        } => correction::correction(source_max, duplicate_max, cfg),
        Commands::Simulate(args) => simulate::simulate(args, cfg),
    }
}
