//! # EQD2 Plan Service
//!
//! Implements the "create EQD2 plan" use case.
//!
//! Starting from the plan selected in a [`PlanHost`], the service adds a new
//! plan to the same course whose dose is the EQD2 of the selected plan's dose.
//!
//! Every check that can fail without touching the host runs first, so a
//! missing prerequisite or an invalid fractionation never leaves a half-built
//! plan behind. Once the derived plan exists, failures propagate immediately;
//! discarding the partial plan is up to the caller.

use eqd2_common::config::Config;
use eqd2_common::error::{Eqd2Error, Prerequisite, Result};
use eqd2_common::fractionation::{AlphaOverBeta, FractionationParameters};
use eqd2_common::plan::{
    DerivedPlanProperties, DosePresentation, PlanHandle, PlanHost, PlanIdentifier, PlanSummary,
    Prescription,
};
use tracing::{info, warn};

use crate::naming::PlanIdentifierGenerator;
use crate::scaling::{ScalingCorrection, ScalingCorrector};
use crate::transform::{self, ConversionStats, DoseGridTransformer};

/// Correction factors further than this from 1 are logged as suspicious.
const CORRECTION_WARN_THRESHOLD: f64 = 0.01;

/// What was created by a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct Eqd2PlanReport {
    pub handle: PlanHandle,
    pub id: PlanIdentifier,
    pub name: String,
    pub fractionation: FractionationParameters,
    pub correction: ScalingCorrection,
    pub stats: ConversionStats,
}

#[derive(Default)]
pub struct Eqd2Service {
    namer: PlanIdentifierGenerator,
    transformer: DoseGridTransformer,
}

impl Eqd2Service {
    pub fn new(namer: PlanIdentifierGenerator, transformer: DoseGridTransformer) -> Self {
        Self { namer, transformer }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::new(
            PlanIdentifierGenerator::with_max_length(cfg.max_id_length)?,
            DoseGridTransformer::new(cfg.rounding),
        ))
    }

    /// Creates the EQD2 plan for the host's selected plan.
    ///
    /// The process involves:
    /// 1. **Validation**: plan, dose, structure set and fraction count must exist.
    /// 2. **Permission**: the host must allow modifications.
    /// 3. **Creation**: a derived plan with a duplicated dose is added and named.
    /// 4. **Conversion**: the duplicated dose is overwritten with the EQD2 of
    ///    its own corrected voxels, reporting progress as a percentage
    ///    through `on_progress`.
    pub fn create_eqd2_plan(
        &self,
        host: &mut dyn PlanHost,
        alpha_over_beta: AlphaOverBeta,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<Eqd2PlanReport> {
        let (plan, number_of_fractions) = check_prerequisites(host)?;
        let fractionation = FractionationParameters::new(number_of_fractions, alpha_over_beta)?;

        if !host.can_modify_data() {
            return Err(Eqd2Error::PermissionDenied);
        }
        host.begin_modifications()?;

        let handle = host.create_derived_plan()?;
        let id = self
            .namer
            .generate(&plan.id, &host.existing_sibling_ids())?;
        let name = plan_name(alpha_over_beta);

        host.apply_properties(
            handle,
            DerivedPlanProperties {
                id: id.clone(),
                name: name.clone(),
                comment: plan_comment(number_of_fractions, plan.dose_per_fraction),
                prescription: Prescription {
                    number_of_fractions,
                    dose_per_fraction: plan.dose_per_fraction,
                    treatment_percentage: plan.treatment_percentage,
                },
                presentation: DosePresentation::Absolute,
            },
        )?;

        let (source, target) = host.dose_pair(handle)?;
        if source.dimensions() != target.dimensions() {
            return Err(Eqd2Error::DimensionMismatch {
                source_grid: source.dimensions(),
                target_grid: target.dimensions(),
            });
        }
        let correction = ScalingCorrector::compute(source.max_dose(), target.max_dose())?;
        if correction.deviation() > CORRECTION_WARN_THRESHOLD {
            warn!(
                factor = correction.factor(),
                "duplicated dose deviates from the source by more than 1 %"
            );
        }

        // The duplicate is converted from its own voxels so the correction
        // undoes whatever copy error it carries.
        let stats = self.transformer.convert_in_place(
            target,
            &fractionation,
            correction,
            |z, z_size| on_progress(transform::progress_percent(z, z_size)),
        )?;

        info!(id = %id, source = %plan.id, planes = stats.planes, "EQD2 plan created");

        Ok(Eqd2PlanReport {
            handle,
            id,
            name,
            fractionation,
            correction,
            stats,
        })
    }
}

fn check_prerequisites(host: &dyn PlanHost) -> Result<(PlanSummary, u32)> {
    let plan = host
        .selected_plan()
        .ok_or(Eqd2Error::MissingPrerequisite(Prerequisite::Plan))?;
    if !plan.has_dose {
        return Err(Eqd2Error::MissingPrerequisite(Prerequisite::Dose));
    }
    if !plan.has_structure_set {
        return Err(Eqd2Error::MissingPrerequisite(Prerequisite::StructureSet));
    }
    let fractions = plan
        .number_of_fractions
        .ok_or(Eqd2Error::MissingPrerequisite(Prerequisite::NumberOfFractions))?;
    Ok((plan, fractions))
}

pub fn plan_name(alpha_over_beta: AlphaOverBeta) -> String {
    format!("alfa/beta={alpha_over_beta}")
}

pub fn plan_comment(number_of_fractions: u32, dose_per_fraction: f64) -> String {
    format!(
        "Number of fractions: {number_of_fractions}\r\n\
         Dose per fraction: {dose_per_fraction:.2} Gy\r\n\
         The dose distribution must be evaluated in absolute values (Gy)!"
    )
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
