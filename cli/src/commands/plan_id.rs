use colored::*;

use eqd2_common::config::Config;
use eqd2_core::naming::PlanIdentifierGenerator;

use crate::terminal::{colors, print};

pub fn plan_id(source_id: &str, existing: &[String], cfg: &Config) -> anyhow::Result<()> {
    let generator = PlanIdentifierGenerator::with_max_length(cfg.max_id_length)?;
    let id = generator.generate(source_id, existing)?;

    if cfg.quiet > 1 {
        print::print(id.as_str());
        return Ok(());
    }

    print::header("plan identifier", cfg.quiet);
    print::set_key_width(&["Identifier", "Existing", "Source", "Length"]);
    print::aligned_line("Source", source_id.to_string());
    print::aligned_line("Existing", existing.len().to_string());
    print::aligned_line("Identifier", format!("'{id}'").color(colors::ACCENT).bold());
    print::aligned_line("Length", format!("{} / {}", id.len(), generator.max_length()));
    Ok(())
}
