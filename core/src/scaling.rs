//! Dose containers duplicated by the planning host do not reproduce the
//! source dose exactly; their dose scale carries a small systematic error.
//! The ratio of the two maximum-dose readings undoes it.

use eqd2_common::error::{Eqd2Error, Result};

/// Multiplier applied to every voxel-derived dose before conversion.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ScalingCorrection(f64);

impl ScalingCorrection {
    /// No correction.
    pub const IDENTITY: ScalingCorrection = ScalingCorrection(1.0);

    pub fn factor(self) -> f64 {
        self.0
    }

    /// Relative deviation from 1, e.g. `0.004` for a factor of `0.996`.
    pub fn deviation(self) -> f64 {
        (self.0 - 1.0).abs()
    }
}

impl Default for ScalingCorrection {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pub struct ScalingCorrector;

impl ScalingCorrector {
    /// `source_max_dose / duplicate_max_dose`.
    ///
    /// Both readings must be finite and positive. A zero duplicate maximum is
    /// reported as [`Eqd2Error::DivisionByZero`].
    pub fn compute(source_max_dose: f64, duplicate_max_dose: f64) -> Result<ScalingCorrection> {
        if duplicate_max_dose == 0.0 {
            return Err(Eqd2Error::DivisionByZero);
        }
        check_reading("source", source_max_dose)?;
        check_reading("duplicate", duplicate_max_dose)?;

        Ok(ScalingCorrection(source_max_dose / duplicate_max_dose))
    }
}

fn check_reading(which: &str, dose: f64) -> Result<()> {
    if !dose.is_finite() || dose <= 0.0 {
        return Err(Eqd2Error::InvalidInput(format!(
            "{which} maximum dose must be a positive number, got {dose}"
        )));
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
