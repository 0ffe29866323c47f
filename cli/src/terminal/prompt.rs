use colored::*;
use console::Term;
use tracing::warn;

use eqd2_common::fractionation::{AlphaOverBeta, MAX_ALPHA_OVER_BETA, MIN_ALPHA_OVER_BETA};

use crate::terminal::colors;

/// Returns `given`, or asks for an alpha/beta on the terminal.
///
/// Invalid entries are rejected and asked for again. An empty entry means no
/// selection and yields `None`.
pub fn alpha_over_beta(given: Option<AlphaOverBeta>) -> anyhow::Result<Option<AlphaOverBeta>> {
    if given.is_some() {
        return Ok(given);
    }

    let term = Term::stderr();
    loop {
        let prompt = format!(
            "Enter alfa/beta ({MIN_ALPHA_OVER_BETA}-{MAX_ALPHA_OVER_BETA}, empty to cancel): "
        );
        term.write_str(&format!("{}", prompt.color(colors::PRIMARY)))?;
        let line = term.read_line()?;

        match AlphaOverBeta::parse_input(&line) {
            Ok(selection) => return Ok(selection),
            Err(e) => warn!("{e}"),
        }
    }
}
