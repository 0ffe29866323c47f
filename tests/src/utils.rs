#![cfg(test)]
use eqd2_common::dose::GridDimensions;
use eqd2_common::fractionation::AlphaOverBeta;
use eqd2_core::memory::{InMemoryCourse, InMemoryDose, StoredPlan};
use eqd2_core::phantom::Phantom;

pub const SCALE: f64 = 0.01;

pub fn ab(value: f64) -> AlphaOverBeta {
    AlphaOverBeta::new(value).unwrap()
}

pub fn dims(x: usize, y: usize, z: usize) -> GridDimensions {
    GridDimensions::new(x, y, z).unwrap()
}

/// Dose whose voxel value encodes its position: `1 + x + 10y + 100z`.
pub fn positional_dose(dims: GridDimensions) -> InMemoryDose {
    InMemoryDose::from_fn(dims, SCALE, |x, y, z| (1 + x + 10 * y + 100 * z) as i32).unwrap()
}

pub fn uniform_dose(dims: GridDimensions, voxel: i32) -> InMemoryDose {
    InMemoryDose::from_fn(dims, SCALE, |_, _, _| voxel).unwrap()
}

/// A writable course whose selected plan `id` carries `dose`.
pub fn course_with(id: &str, fractions: u32, dose: InMemoryDose) -> InMemoryCourse {
    InMemoryCourse::new().with_selected_plan(
        StoredPlan::new(id)
            .with_fractions(fractions, 2.0)
            .with_dose(dose),
    )
}

pub fn phantom_course(id: &str, fractions: u32, dose_per_fraction: f64) -> InMemoryCourse {
    let dose = Phantom::new(dims(24, 24, 12), dose_per_fraction * f64::from(fractions))
        .with_noise(0.01, 42)
        .build()
        .unwrap();
    InMemoryCourse::new().with_selected_plan(
        StoredPlan::new(id)
            .with_fractions(fractions, dose_per_fraction)
            .with_dose(dose),
    )
}

/// Reference EQD2 in Gy for a total dose `d` delivered in `n` fractions.
pub fn eqd2(d: f64, n: u32, ab: f64) -> f64 {
    d * (d / f64::from(n) + ab) / (2.0 + ab)
}
