use anyhow::ensure;
use colored::*;
use tracing::info;

use eqd2_common::{config::Config, fractionation::{AlphaOverBeta, FractionationParameters}};

use crate::terminal::{format, print, prompt};

pub fn dose(
    total_dose: f64,
    fractions: u32,
    alpha_beta: Option<AlphaOverBeta>,
    cfg: &Config,
) -> anyhow::Result<()> {
    ensure!(
        total_dose.is_finite() && total_dose >= 0.0,
        "total dose must be a non-negative number, got {total_dose}"
    );

    let Some(alpha_beta) = prompt::alpha_over_beta(alpha_beta)? else {
        info!("No alfa/beta selected, nothing to convert");
        return Ok(());
    };
    let params = FractionationParameters::new(fractions, alpha_beta)?;
    let eqd2 = params.eqd2(total_dose);

    if cfg.quiet > 1 {
        print::print(&format!("{eqd2:.3}"));
        return Ok(());
    }

    print::header("equivalent dose", cfg.quiet);
    print::set_key_width(&["Dose per fraction", "Total dose", "Alfa/beta", "EQD2"]);
    print::aligned_line("Total dose", format::gy(total_dose));
    print::aligned_line("Fractions", fractions.to_string());
    print::aligned_line("Dose per fraction", format::gy(total_dose / f64::from(fractions)));
    print::aligned_line("Alfa/beta", format!("{alpha_beta} Gy").normal());
    print::aligned_line("EQD2", format::eqd2_gy(eqd2));
    Ok(())
}
