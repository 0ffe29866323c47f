//! # Fractionation Parameters
//!
//! The two radiobiological inputs of the EQD2 conversion and the validation
//! boundary they cross before the engine may run.

use std::fmt;
use std::str::FromStr;

use crate::error::{Eqd2Error, Result};

/// Lower bound of the accepted alpha/beta ratio, in Gy.
pub const MIN_ALPHA_OVER_BETA: f64 = 0.5;
/// Upper bound of the accepted alpha/beta ratio, in Gy.
pub const MAX_ALPHA_OVER_BETA: f64 = 10.0;

/// Tissue alpha/beta ratio, guaranteed to lie in [0.5, 10].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct AlphaOverBeta(f64);

impl AlphaOverBeta {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || !(MIN_ALPHA_OVER_BETA..=MAX_ALPHA_OVER_BETA).contains(&value) {
            return Err(Eqd2Error::InvalidInput(format!(
                "alpha/beta must be a number between {MIN_ALPHA_OVER_BETA} and {MAX_ALPHA_OVER_BETA}, got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Interprets free text typed by a user.
    ///
    /// Returns:
    /// * `Ok(None)` - nothing was entered (no selection).
    /// * `Ok(Some(_))` - a number inside the accepted range.
    /// * `Err(InvalidInput)` - non-numeric text or a value out of range.
    pub fn parse_input(text: &str) -> Result<Option<Self>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        text.parse().map(Some)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl FromStr for AlphaOverBeta {
    type Err = Eqd2Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s
            .trim()
            .parse::<f64>()
            .map_err(|_| Eqd2Error::InvalidInput(format!("'{s}' is not a number")))?;
        AlphaOverBeta::new(value)
    }
}

impl fmt::Display for AlphaOverBeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fraction count and alpha/beta of one conversion run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionationParameters {
    number_of_fractions: u32,
    alpha_over_beta: AlphaOverBeta,
}

impl FractionationParameters {
    pub fn new(number_of_fractions: u32, alpha_over_beta: AlphaOverBeta) -> Result<Self> {
        if number_of_fractions == 0 {
            return Err(Eqd2Error::InvalidFractionation(
                "number of fractions must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            number_of_fractions,
            alpha_over_beta,
        })
    }

    pub fn number_of_fractions(&self) -> u32 {
        self.number_of_fractions
    }

    pub fn alpha_over_beta(&self) -> AlphaOverBeta {
        self.alpha_over_beta
    }

    /// Linear-quadratic EQD2 of a total dose delivered over this fractionation.
    ///
    /// `EQD2 = D * (D / n + a/b) / (2 + a/b)`
    pub fn eqd2(&self, total_dose: f64) -> f64 {
        let ab = self.alpha_over_beta.value();
        total_dose * (total_dose / f64::from(self.number_of_fractions) + ab) / (2.0 + ab)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
