//! # In-Memory Planning Host
//!
//! A self-contained implementation of the [`PlanHost`] and [`DoseMatrix`]
//! contracts: one course of plans held in memory.
//!
//! The course reproduces the one quirk of real planning systems the engine
//! cares about: duplicating a dose container yields voxel-identical data
//! whose dose scale is off by a small factor (the *duplication skew*).

use std::ops::Range;

use eqd2_common::dose::{DoseMatrix, GridDimensions, RoundingPolicy, VoxelPlane};
use eqd2_common::error::{Eqd2Error, Prerequisite, Result};
use eqd2_common::plan::{
    DerivedPlanProperties, DosePresentation, PlanHandle, PlanHost, PlanSummary, Prescription,
};
use tracing::debug;

/// Dose stored as one flat arena of voxels, planes stacked along `z`.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryDose {
    dims: GridDimensions,
    /// Gy per voxel unit.
    scale: f64,
    voxels: Vec<i32>,
}

impl InMemoryDose {
    pub fn from_voxels(dims: GridDimensions, scale: f64, voxels: Vec<i32>) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Eqd2Error::InvalidInput(format!(
                "dose scale must be positive, got {scale}"
            )));
        }
        if voxels.len() != dims.voxel_count() {
            return Err(Eqd2Error::InvalidInput(format!(
                "grid {dims} needs {} voxels, got {}",
                dims.voxel_count(),
                voxels.len()
            )));
        }
        if voxels.iter().any(|&v| v < 0) {
            return Err(Eqd2Error::InvalidInput(
                "voxel values must not be negative".to_string(),
            ));
        }
        Ok(Self {
            dims,
            scale,
            voxels,
        })
    }

    /// Builds a grid by evaluating `voxel(x, y, z)` at every position.
    pub fn from_fn(
        dims: GridDimensions,
        scale: f64,
        mut voxel: impl FnMut(usize, usize, usize) -> i32,
    ) -> Result<Self> {
        let mut voxels = Vec::with_capacity(dims.voxel_count());
        for z in 0..dims.z_size {
            for y in 0..dims.y_size {
                for x in 0..dims.x_size {
                    voxels.push(voxel(x, y, z));
                }
            }
        }
        Self::from_voxels(dims, scale, voxels)
    }

    /// A copy with the same voxels whose dose scale is multiplied by `skew`.
    pub fn duplicate_with_skew(&self, skew: f64) -> Self {
        Self {
            dims: self.dims,
            scale: self.scale * skew,
            voxels: self.voxels.clone(),
        }
    }

    /// A copy on the same scale whose voxels are multiplied by `skew` and
    /// rounded back to whole units.
    pub fn duplicate_requantized(&self, skew: f64) -> Self {
        Self {
            dims: self.dims,
            scale: self.scale,
            voxels: self
                .voxels
                .iter()
                .map(|&v| RoundingPolicy::HalfToEven.quantize(f64::from(v) * skew).max(0))
                .collect(),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn voxels(&self) -> &[i32] {
        &self.voxels
    }

    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Option<i32> {
        if x >= self.dims.x_size || y >= self.dims.y_size || z >= self.dims.z_size {
            return None;
        }
        let idx = z * self.dims.plane_len() + y * self.dims.x_size + x;
        Some(self.voxels[idx])
    }

    /// Dose at a voxel position, in Gy.
    pub fn dose_at(&self, x: usize, y: usize, z: usize) -> Option<f64> {
        self.voxel(x, y, z).map(|v| self.voxel_to_dose(v))
    }

    fn plane_range(&self, z: usize, plane: &VoxelPlane) -> Result<Range<usize>> {
        if z >= self.dims.z_size {
            return Err(Eqd2Error::DataAccess(format!(
                "plane {z} is outside a grid of {} planes",
                self.dims.z_size
            )));
        }
        if !plane.fits(&self.dims) {
            return Err(Eqd2Error::DataAccess(format!(
                "plane buffer {}x{} does not fit grid {}",
                plane.x_size(),
                plane.y_size(),
                self.dims
            )));
        }
        let start = z * self.dims.plane_len();
        Ok(start..start + self.dims.plane_len())
    }
}

impl DoseMatrix for InMemoryDose {
    fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    fn voxel_to_dose(&self, voxel_value: i32) -> f64 {
        f64::from(voxel_value) * self.scale
    }

    fn max_dose(&self) -> f64 {
        let max_voxel = self.voxels.iter().copied().max().unwrap_or(0);
        self.voxel_to_dose(max_voxel)
    }

    fn read_plane(&self, z: usize, plane: &mut VoxelPlane) -> Result<()> {
        let range = self.plane_range(z, plane)?;
        plane.as_mut_slice().copy_from_slice(&self.voxels[range]);
        Ok(())
    }

    fn write_plane(&mut self, z: usize, plane: &VoxelPlane) -> Result<()> {
        let range = self.plane_range(z, plane)?;
        self.voxels[range].copy_from_slice(plane.as_slice());
        Ok(())
    }
}

/// A plan as stored in an [`InMemoryCourse`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPlan {
    pub id: String,
    pub name: String,
    pub comment: String,
    pub number_of_fractions: Option<u32>,
    pub dose_per_fraction: f64,
    pub treatment_percentage: f64,
    pub presentation: DosePresentation,
    pub dose: Option<InMemoryDose>,
}

impl StoredPlan {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            comment: String::new(),
            number_of_fractions: None,
            dose_per_fraction: 0.0,
            treatment_percentage: 1.0,
            presentation: DosePresentation::Relative,
            dose: None,
        }
    }

    pub fn with_fractions(mut self, number_of_fractions: u32, dose_per_fraction: f64) -> Self {
        self.number_of_fractions = Some(number_of_fractions);
        self.dose_per_fraction = dose_per_fraction;
        self
    }

    pub fn with_dose(mut self, dose: InMemoryDose) -> Self {
        self.dose = Some(dose);
        self
    }
}

/// A course of plans with one selected plan.
#[derive(Debug, Clone)]
pub struct InMemoryCourse {
    plans: Vec<StoredPlan>,
    selected: Option<usize>,
    structure_set: bool,
    writable: bool,
    modifying: bool,
    duplication_skew: f64,
    requantize: bool,
}

impl Default for InMemoryCourse {
    fn default() -> Self {
        Self {
            plans: Vec::new(),
            selected: None,
            structure_set: true,
            writable: true,
            modifying: false,
            duplication_skew: 1.0,
            requantize: false,
        }
    }
}

impl InMemoryCourse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `plan` and makes it the selected plan.
    pub fn with_selected_plan(mut self, plan: StoredPlan) -> Self {
        self.plans.push(plan);
        self.selected = Some(self.plans.len() - 1);
        self
    }

    /// Adds a sibling plan without dose.
    pub fn with_sibling(mut self, id: impl Into<String>) -> Self {
        self.plans.push(StoredPlan::new(id));
        self
    }

    pub fn with_structure_set(mut self, present: bool) -> Self {
        self.structure_set = present;
        self
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    pub fn with_duplication_skew(mut self, skew: f64) -> Self {
        self.duplication_skew = skew;
        self
    }

    /// Duplicates carry the skew in their voxels instead of their scale.
    pub fn requantizing_duplicates(mut self, requantize: bool) -> Self {
        self.requantize = requantize;
        self
    }

    pub fn plans(&self) -> &[StoredPlan] {
        &self.plans
    }

    pub fn plan(&self, handle: PlanHandle) -> Option<&StoredPlan> {
        self.plans.get(handle.0)
    }

    /// The selected plan, even when a sibling shares its identifier.
    pub fn source_plan(&self) -> Option<&StoredPlan> {
        self.plans.get(self.selected?)
    }

    pub fn find(&self, id: &str) -> Option<&StoredPlan> {
        self.plans.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }

    pub fn is_modifying(&self) -> bool {
        self.modifying
    }

    fn selected(&self) -> Result<usize> {
        self.selected
            .ok_or(Eqd2Error::MissingPrerequisite(Prerequisite::Plan))
    }

    /// First `PlanN` identifier not yet used in the course.
    fn default_plan_id(&self) -> String {
        (1..)
            .map(|n| format!("Plan{n}"))
            .find(|id| self.find(id).is_none())
            .unwrap_or_default()
    }
}

impl PlanHost for InMemoryCourse {
    fn selected_plan(&self) -> Option<PlanSummary> {
        let plan = &self.plans[self.selected?];
        Some(PlanSummary {
            id: plan.id.clone(),
            number_of_fractions: plan.number_of_fractions,
            dose_per_fraction: plan.dose_per_fraction,
            treatment_percentage: plan.treatment_percentage,
            has_dose: plan.dose.is_some(),
            has_structure_set: self.structure_set,
        })
    }

    fn can_modify_data(&self) -> bool {
        self.writable
    }

    fn begin_modifications(&mut self) -> Result<()> {
        if !self.writable {
            return Err(Eqd2Error::PermissionDenied);
        }
        self.modifying = true;
        Ok(())
    }

    fn existing_sibling_ids(&self) -> Vec<String> {
        self.plans.iter().map(|p| p.id.clone()).collect()
    }

    fn create_derived_plan(&mut self) -> Result<PlanHandle> {
        if !self.modifying {
            return Err(Eqd2Error::PermissionDenied);
        }
        let source = &self.plans[self.selected()?];
        let original = source
            .dose
            .as_ref()
            .ok_or(Eqd2Error::MissingPrerequisite(Prerequisite::Dose))?;
        let dose = if self.requantize {
            original.duplicate_requantized(self.duplication_skew)
        } else {
            original.duplicate_with_skew(self.duplication_skew)
        };

        let plan = StoredPlan::new(self.default_plan_id()).with_dose(dose);
        debug!(id = %plan.id, "derived plan created");
        self.plans.push(plan);
        Ok(PlanHandle(self.plans.len() - 1))
    }

    fn apply_properties(
        &mut self,
        handle: PlanHandle,
        properties: DerivedPlanProperties,
    ) -> Result<()> {
        let plan = self
            .plans
            .get_mut(handle.0)
            .ok_or_else(|| Eqd2Error::DataAccess(format!("no plan behind handle {}", handle.0)))?;

        let Prescription {
            number_of_fractions,
            dose_per_fraction,
            treatment_percentage,
        } = properties.prescription;

        plan.id = properties.id.to_string();
        plan.name = properties.name;
        plan.comment = properties.comment;
        plan.number_of_fractions = Some(number_of_fractions);
        plan.dose_per_fraction = dose_per_fraction;
        plan.treatment_percentage = treatment_percentage;
        plan.presentation = properties.presentation;
        Ok(())
    }

    fn dose_pair(&mut self, handle: PlanHandle) -> Result<(&dyn DoseMatrix, &mut dyn DoseMatrix)> {
        let source_idx = self.selected()?;
        let target_idx = handle.0;
        if target_idx == source_idx || target_idx >= self.plans.len() {
            return Err(Eqd2Error::DataAccess(format!(
                "handle {target_idx} does not refer to a derived plan"
            )));
        }

        let (source_plan, target_plan) = if source_idx < target_idx {
            let (head, tail) = self.plans.split_at_mut(target_idx);
            (&head[source_idx], &mut tail[0])
        } else {
            let (head, tail) = self.plans.split_at_mut(source_idx);
            (&tail[0], &mut head[target_idx])
        };

        let source: &dyn DoseMatrix = source_plan
            .dose
            .as_ref()
            .ok_or(Eqd2Error::MissingPrerequisite(Prerequisite::Dose))?;
        let target: &mut dyn DoseMatrix = target_plan
            .dose
            .as_mut()
            .ok_or_else(|| Eqd2Error::DataAccess(format!("derived plan {target_idx} has no dose")))?;

        Ok((source, target))
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
