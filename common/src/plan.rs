//! # Treatment Plan Model
//!
//! Plan metadata exchanged with the planning host and the [`PlanHost`]
//! contract through which the engine creates and fills a derived plan.

use std::fmt;

use crate::dose::DoseMatrix;
use crate::error::Result;

/// Longest plan identifier the planning host accepts.
pub const MAX_PLAN_ID_LENGTH: usize = 13;

/// Identifier of a plan, unique (case-insensitively) within its course.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanIdentifier(String);

impl PlanIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, the unit the host's limit is expressed in.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.to_lowercase()
    }
}

impl fmt::Display for PlanIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PlanIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prescription {
    pub number_of_fractions: u32,
    /// Gy per fraction.
    pub dose_per_fraction: f64,
    /// Percentage of the prescription the plan treats.
    pub treatment_percentage: f64,
}

/// How the host displays a plan's dose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DosePresentation {
    #[default]
    Relative,
    Absolute,
}

/// What the host knows about the currently selected plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSummary {
    pub id: String,
    /// `None` when the plan was never given a fraction count.
    pub number_of_fractions: Option<u32>,
    pub dose_per_fraction: f64,
    pub treatment_percentage: f64,
    pub has_dose: bool,
    pub has_structure_set: bool,
}

/// Opaque reference to a plan created through [`PlanHost::create_derived_plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanHandle(pub usize);

/// Properties written to a freshly created derived plan.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedPlanProperties {
    pub id: PlanIdentifier,
    pub name: String,
    pub comment: String,
    pub prescription: Prescription,
    pub presentation: DosePresentation,
}

/// The planning system that owns patients, plans and dose containers.
///
/// Implementations decide how data is stored; the engine only reads the
/// selection, asks for write access, allocates one derived plan and fills
/// its dose through [`DoseMatrix`].
pub trait PlanHost {
    /// The plan the run was started from, if any.
    fn selected_plan(&self) -> Option<PlanSummary>;

    /// Whether the host allows patient data to be modified at all.
    fn can_modify_data(&self) -> bool;

    /// Opens the host's write session. Must precede any mutation.
    fn begin_modifications(&mut self) -> Result<()>;

    /// Identifiers of all plans in the selected plan's course.
    fn existing_sibling_ids(&self) -> Vec<String>;

    /// Adds a plan to the course whose dose is a duplicate of the selected
    /// plan's dose, with identical geometry.
    fn create_derived_plan(&mut self) -> Result<PlanHandle>;

    fn apply_properties(&mut self, handle: PlanHandle, properties: DerivedPlanProperties)
    -> Result<()>;

    /// The selected plan's dose (read-only) together with the derived plan's
    /// dose (writable).
    fn dose_pair(&mut self, handle: PlanHandle) -> Result<(&dyn DoseMatrix, &mut dyn DoseMatrix)>;
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
