//! Error kinds shared by the conversion engine and its collaborators.

use std::fmt;

use crate::dose::GridDimensions;

/// Something the run needs before any computation may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prerequisite {
    Plan,
    Dose,
    StructureSet,
    NumberOfFractions,
}

impl fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            Prerequisite::Plan => "no plan is selected",
            Prerequisite::Dose => "the plan has no calculated dose",
            Prerequisite::StructureSet => "the plan has no structure set",
            Prerequisite::NumberOfFractions => "the plan has no number of fractions",
        };
        f.write_str(what)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Eqd2Error {
    /// Input rejected at the validation boundary (alpha/beta, dose readings, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(Prerequisite),

    /// The host refused write access to patient data.
    #[error("permission denied: the host does not allow data modification")]
    PermissionDenied,

    #[error("dimension mismatch: source grid is {source_grid}, target grid is {target_grid}")]
    DimensionMismatch {
        source_grid: GridDimensions,
        target_grid: GridDimensions,
    },

    #[error("invalid fractionation: {0}")]
    InvalidFractionation(String),

    #[error("division by zero: duplicate maximum dose is zero")]
    DivisionByZero,

    /// A collaborator's plane accessor or plan lookup failed.
    #[error("data access failed: {0}")]
    DataAccess(String),
}

pub type Result<T> = std::result::Result<T, Eqd2Error>;

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
