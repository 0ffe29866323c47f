//! Synthetic dose distributions for demonstrations and tests.
//!
//! A phantom is a cube of dose with a spherical target at its centre. Inside
//! the target the dose equals the peak; outside it falls off as a Gaussian of
//! the distance to the target surface. Optional multiplicative noise is drawn
//! from a seeded generator, so a phantom is reproducible.

use eqd2_common::dose::{GridDimensions, RoundingPolicy};
use eqd2_common::error::{Eqd2Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::memory::InMemoryDose;

/// Default dose per voxel unit, in Gy.
pub const DEFAULT_SCALE: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct Phantom {
    dims: GridDimensions,
    peak_dose: f64,
    scale: f64,
    /// Target radius as a fraction of the smallest half-extent.
    target_radius: f64,
    /// Gaussian width of the fall-off, in voxels.
    falloff: f64,
    noise: f64,
    seed: u64,
}

impl Phantom {
    pub fn new(dims: GridDimensions, peak_dose: f64) -> Self {
        Self {
            dims,
            peak_dose,
            scale: DEFAULT_SCALE,
            target_radius: 0.4,
            falloff: 3.0,
            noise: 0.0,
            seed: 0,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_target_radius(mut self, fraction: f64) -> Self {
        self.target_radius = fraction;
        self
    }

    pub fn with_falloff(mut self, voxels: f64) -> Self {
        self.falloff = voxels;
        self
    }

    /// Relative noise amplitude, e.g. `0.02` for +/-2 %.
    pub fn with_noise(mut self, amplitude: f64, seed: u64) -> Self {
        self.noise = amplitude;
        self.seed = seed;
        self
    }

    pub fn build(&self) -> Result<InMemoryDose> {
        if !self.peak_dose.is_finite() || self.peak_dose <= 0.0 {
            return Err(Eqd2Error::InvalidInput(format!(
                "peak dose must be positive, got {}",
                self.peak_dose
            )));
        }
        if !(0.0..1.0).contains(&self.noise) {
            return Err(Eqd2Error::InvalidInput(format!(
                "noise amplitude must be in [0, 1), got {}",
                self.noise
            )));
        }

        let centre = |size: usize| (size as f64 - 1.0) / 2.0;
        let (cx, cy, cz) = (
            centre(self.dims.x_size),
            centre(self.dims.y_size),
            centre(self.dims.z_size),
        );
        let half_extent = cx.max(0.5).min(cy.max(0.5)).min(cz.max(0.5));
        let radius = self.target_radius * half_extent;
        let sigma = self.falloff.max(f64::EPSILON);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let rounding = RoundingPolicy::HalfToEven;

        InMemoryDose::from_fn(self.dims, self.scale, |x, y, z| {
            let r = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2) + (z as f64 - cz).powi(2))
                .sqrt();
            let outside = (r - radius).max(0.0);
            let mut dose = self.peak_dose * (-(outside * outside) / (2.0 * sigma * sigma)).exp();
            if self.noise > 0.0 {
                dose *= 1.0 + rng.random_range(-self.noise..=self.noise);
            }
            rounding.quantize(dose / self.scale).max(0)
        })
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
