use eqd2_common::config::Config;
use eqd2_core::scaling::ScalingCorrector;

use crate::terminal::{format, print};

pub fn correction(source_max: f64, duplicate_max: f64, cfg: &Config) -> anyhow::Result<()> {
    let correction = ScalingCorrector::compute(source_max, duplicate_max)?;

    if cfg.quiet > 1 {
        print::print(&format!("{}", correction.factor()));
        return Ok(());
    }

    print::header("duplication correction", cfg.quiet);
    print::set_key_width(&["Duplicate maximum", "Source maximum"]);
    print::aligned_line("Source maximum", format::gy(source_max));
    print::aligned_line("Duplicate maximum", format::gy(duplicate_max));
    print::aligned_line("Factor", format::factor(correction.factor()));
    print::aligned_line("Deviation", format::deviation_percent(correction.factor()));
    Ok(())
}
