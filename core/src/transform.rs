//! # Dose Grid Transformation
//!
//! Converts a physical dose grid into EQD2, one XY plane at a time.
//!
//! For every voxel `v` read from a grid:
//!
//! ```text
//! D     = v * read_scale * correction
//! EQD2  = D * (D / n + a/b) / (2 + a/b)
//! v'    = round(EQD2 / write_scale)
//! ```
//!
//! `read_scale` is the dose per voxel unit of the container the voxels come
//! from and `correction` the [`ScalingCorrection`] of that same container, so
//! a duplicated dose is corrected for its own copy error whether the host
//! skewed its scale or re-quantized its voxels. `write_scale` belongs to the
//! container written to. Rounding follows the configured [`RoundingPolicy`]
//! (half-to-even unless chosen otherwise).
//!
//! Planes are processed strictly in increasing `z`: each one is read,
//! converted and written before the next is touched, and the progress
//! callback fires once per written plane. The plane accessors of a host are
//! not assumed to be safe for concurrent use, so there is no parallelism here.

use eqd2_common::dose::{DoseMatrix, GridDimensions, RoundingPolicy, VoxelPlane};
use eqd2_common::error::{Eqd2Error, Result};
use eqd2_common::fractionation::FractionationParameters;
use tracing::{debug, trace};

use crate::scaling::ScalingCorrection;

/// Per-voxel arithmetic with all run constants folded in.
#[derive(Debug, Clone, Copy)]
pub struct VoxelConverter {
    voxel_to_dose: f64,
    dose_scale: f64,
    fractionation: FractionationParameters,
    rounding: RoundingPolicy,
}

impl VoxelConverter {
    pub fn new(
        read_scale: f64,
        write_scale: f64,
        correction: ScalingCorrection,
        fractionation: FractionationParameters,
        rounding: RoundingPolicy,
    ) -> Result<Self> {
        for scale in [read_scale, write_scale] {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(Eqd2Error::InvalidInput(format!(
                    "dose per voxel unit must be positive, got {scale}"
                )));
            }
        }
        Ok(Self {
            voxel_to_dose: read_scale * correction.factor(),
            dose_scale: write_scale,
            fractionation,
            rounding,
        })
    }

    pub fn absorbed_dose(&self, voxel_value: i32) -> f64 {
        f64::from(voxel_value) * self.voxel_to_dose
    }

    pub fn eqd2_dose(&self, voxel_value: i32) -> f64 {
        self.fractionation.eqd2(self.absorbed_dose(voxel_value))
    }

    pub fn convert(&self, voxel_value: i32) -> i32 {
        self.rounding
            .quantize(self.eqd2_dose(voxel_value) / self.dose_scale)
    }
}

/// Outcome of a completed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionStats {
    pub planes: usize,
    pub voxels: usize,
    pub max_voxel: i32,
}

/// Progress of a plane loop as a whole percentage, `round(100 * z / z_size)`.
///
/// Reported after plane `z` is written, so the last plane reports slightly
/// under 100.
pub fn progress_percent(z: usize, z_size: usize) -> u8 {
    if z_size == 0 {
        return 100;
    }
    let percent = (100.0 * z as f64 / z_size as f64).round_ties_even();
    percent.clamp(0.0, 100.0) as u8
}

/// Where planes are read from and written to.
enum Planes<'a> {
    Pair {
        source: &'a dyn DoseMatrix,
        target: &'a mut dyn DoseMatrix,
    },
    InPlace(&'a mut dyn DoseMatrix),
}

impl Planes<'_> {
    fn read(&self, z: usize, plane: &mut VoxelPlane) -> Result<()> {
        match self {
            Planes::Pair { source, .. } => source.read_plane(z, plane),
            Planes::InPlace(grid) => grid.read_plane(z, plane),
        }
    }

    fn write(&mut self, z: usize, plane: &VoxelPlane) -> Result<()> {
        match self {
            Planes::Pair { target, .. } => target.write_plane(z, plane),
            Planes::InPlace(grid) => grid.write_plane(z, plane),
        }
    }
}

#[derive(Debug, Default)]
pub struct DoseGridTransformer {
    rounding: RoundingPolicy,
}

impl DoseGridTransformer {
    pub fn new(rounding: RoundingPolicy) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    /// Writes the EQD2 of every voxel of `source` into `target`.
    ///
    /// `correction` applies to `source`; pass [`ScalingCorrection::IDENTITY`]
    /// when `source` is the original dose.
    ///
    /// Geometry is checked before the first plane is read; a mismatch leaves
    /// `target` untouched. An accessor failure stops the loop immediately and
    /// leaves the planes already written in place.
    ///
    /// `on_plane_done(z, z_size)` is called after each plane is written.
    pub fn convert(
        &self,
        source: &dyn DoseMatrix,
        target: &mut dyn DoseMatrix,
        fractionation: &FractionationParameters,
        correction: ScalingCorrection,
        on_plane_done: impl FnMut(usize, usize),
    ) -> Result<ConversionStats> {
        let dims = source.dimensions();
        let target_dims = target.dimensions();
        if dims != target_dims {
            return Err(Eqd2Error::DimensionMismatch {
                source_grid: dims,
                target_grid: target_dims,
            });
        }

        let converter = VoxelConverter::new(
            source.voxel_to_dose(1),
            target.voxel_to_dose(1),
            correction,
            *fractionation,
            self.rounding,
        )?;
        self.run(
            dims,
            Planes::Pair { source, target },
            &converter,
            correction,
            on_plane_done,
        )
    }

    /// Overwrites every voxel of `grid` with its EQD2.
    ///
    /// This is the conversion of a duplicated dose: its voxels are read with
    /// its own scale times `correction`, which undoes the copy error measured
    /// against the original.
    pub fn convert_in_place(
        &self,
        grid: &mut dyn DoseMatrix,
        fractionation: &FractionationParameters,
        correction: ScalingCorrection,
        on_plane_done: impl FnMut(usize, usize),
    ) -> Result<ConversionStats> {
        let dims = grid.dimensions();
        let scale = grid.voxel_to_dose(1);
        let converter =
            VoxelConverter::new(scale, scale, correction, *fractionation, self.rounding)?;
        self.run(
            dims,
            Planes::InPlace(grid),
            &converter,
            correction,
            on_plane_done,
        )
    }

    fn run(
        &self,
        dims: GridDimensions,
        mut planes: Planes<'_>,
        converter: &VoxelConverter,
        correction: ScalingCorrection,
        mut on_plane_done: impl FnMut(usize, usize),
    ) -> Result<ConversionStats> {
        debug!(
            grid = %dims,
            fractions = converter.fractionation.number_of_fractions(),
            alpha_over_beta = converter.fractionation.alpha_over_beta().value(),
            correction = correction.factor(),
            "converting dose grid to EQD2"
        );

        let mut voxels = VoxelPlane::for_grid(&dims);
        let mut max_voxel = 0;

        for z in 0..dims.z_size {
            planes.read(z, &mut voxels)?;

            for voxel in voxels.as_mut_slice() {
                *voxel = converter.convert(*voxel);
                max_voxel = max_voxel.max(*voxel);
            }

            planes.write(z, &voxels)?;
            trace!(z, "plane written");
            on_plane_done(z, dims.z_size);
        }

        Ok(ConversionStats {
            planes: dims.z_size,
            voxels: dims.voxel_count(),
            max_voxel,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDose;
    use crate::scaling::ScalingCorrector;
    use eqd2_common::dose::GridDimensions;
    use eqd2_common::fractionation::AlphaOverBeta;

    fn params(fractions: u32, ab: f64) -> FractionationParameters {
        FractionationParameters::new(fractions, AlphaOverBeta::new(ab).unwrap()).unwrap()
    }

    fn converter(scale: f64, fractions: u32, ab: f64) -> VoxelConverter {
        VoxelConverter::new(
            scale,
            scale,
            ScalingCorrection::IDENTITY,
            params(fractions, ab),
            RoundingPolicy::HalfToEven,
        )
        .unwrap()
    }

    /// Records plane writes of a wrapped grid and optionally fails on one plane.
    struct Recording {
        inner: InMemoryDose,
        writes: Vec<usize>,
        fail_on: Option<usize>,
    }

    impl DoseMatrix for Recording {
        fn dimensions(&self) -> GridDimensions {
            self.inner.dimensions()
        }

        fn voxel_to_dose(&self, voxel_value: i32) -> f64 {
            self.inner.voxel_to_dose(voxel_value)
        }

        fn max_dose(&self) -> f64 {
            self.inner.max_dose()
        }

        fn read_plane(&self, z: usize, plane: &mut VoxelPlane) -> Result<()> {
            self.inner.read_plane(z, plane)
        }

        fn write_plane(&mut self, z: usize, plane: &VoxelPlane) -> Result<()> {
            if self.fail_on == Some(z) {
                return Err(Eqd2Error::DataAccess(format!("plane {z} is locked")));
            }
            self.writes.push(z);
            self.inner.write_plane(z, plane)
        }
    }

    fn uniform(dims: GridDimensions, scale: f64, value: i32) -> InMemoryDose {
        InMemoryDose::from_fn(dims, scale, |_, _, _| value).unwrap()
    }

    #[test]
    fn test_reference_voxel() {
        let c = converter(0.01, 25, 3.0);
        assert!((c.absorbed_dose(100) - 1.0).abs() < 1e-12);
        assert!((c.eqd2_dose(100) - 0.608).abs() < 1e-12);
        assert_eq!(c.convert(100), 61);
    }

    #[test]
    fn test_zero_dose_stays_zero() {
        assert_eq!(converter(0.01, 25, 3.0).convert(0), 0);
    }

    #[test]
    fn test_correction_scales_absorbed_dose() {
        let c = VoxelConverter::new(
            0.01,
            0.01,
            ScalingCorrector::compute(2.0, 1.0).unwrap(),
            params(25, 3.0),
            RoundingPolicy::HalfToEven,
        )
        .unwrap();
        assert!((c.absorbed_dose(100) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_scale_rejected() {
        for scale in [0.0, -0.01, f64::NAN] {
            assert!(
                VoxelConverter::new(
                    scale,
                    0.01,
                    ScalingCorrection::IDENTITY,
                    params(25, 3.0),
                    RoundingPolicy::HalfToEven,
                )
                .is_err()
            );
            assert!(
                VoxelConverter::new(
                    0.01,
                    scale,
                    ScalingCorrection::IDENTITY,
                    params(25, 3.0),
                    RoundingPolicy::HalfToEven,
                )
                .is_err()
            );
        }
    }

    #[test]
    fn test_large_alpha_over_beta_approaches_physical_dose() {
        // 0.1 Gy per fraction is small against a/b = 10
        let c = converter(0.001, 30, 10.0);
        let physical = c.absorbed_dose(3_000);
        let eqd2 = c.eqd2_dose(3_000);
        assert!(eqd2 < physical);
        assert!((physical - eqd2) / physical < 0.2);
        // the ratio is exactly (d + a/b) / (2 + a/b)
        assert!((eqd2 / physical - (0.1 + 10.0) / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_monotonic_in_voxel_value() {
        let c = converter(0.005, 5, 0.5);
        let mut previous = c.eqd2_dose(0);
        let mut previous_voxel = c.convert(0);
        for v in (0..200_000).step_by(997) {
            let dose = c.eqd2_dose(v);
            let voxel = c.convert(v);
            assert!(dose >= previous);
            assert!(voxel >= previous_voxel);
            previous = dose;
            previous_voxel = voxel;
        }
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 10), 0);
        assert_eq!(progress_percent(5, 10), 50);
        assert_eq!(progress_percent(9, 10), 90);
        assert_eq!(progress_percent(1, 8), 12);
        assert_eq!(progress_percent(2, 3), 67);
    }

    #[test]
    fn test_every_plane_written_once_in_order() {
        let dims = GridDimensions::new(4, 3, 5).unwrap();
        let source = uniform(dims, 0.01, 100);
        let mut target = Recording {
            inner: uniform(dims, 0.01, 0),
            writes: Vec::new(),
            fail_on: None,
        };
        let mut notified = Vec::new();

        let stats = DoseGridTransformer::default()
            .convert(
                &source,
                &mut target,
                &params(25, 3.0),
                ScalingCorrection::IDENTITY,
                |z, z_size| notified.push((z, z_size)),
            )
            .unwrap();

        assert_eq!(target.writes, vec![0, 1, 2, 3, 4]);
        assert_eq!(notified, vec![(0, 5), (1, 5), (2, 5), (3, 5), (4, 5)]);
        assert_eq!(
            stats,
            ConversionStats {
                planes: 5,
                voxels: 60,
                max_voxel: 61
            }
        );
        assert!(target.inner.voxels().iter().all(|&v| v == 61));
    }

    #[test]
    fn test_dimension_mismatch_writes_nothing() {
        let source = uniform(GridDimensions::new(4, 3, 5).unwrap(), 0.01, 100);
        let mut target = Recording {
            inner: uniform(GridDimensions::new(4, 3, 6).unwrap(), 0.01, 7),
            writes: Vec::new(),
            fail_on: None,
        };
        let mut calls = 0;

        let result = DoseGridTransformer::default().convert(
            &source,
            &mut target,
            &params(25, 3.0),
            ScalingCorrection::IDENTITY,
            |_, _| calls += 1,
        );

        assert!(matches!(result, Err(Eqd2Error::DimensionMismatch { .. })));
        assert!(target.writes.is_empty());
        assert_eq!(calls, 0);
        assert!(target.inner.voxels().iter().all(|&v| v == 7));
    }

    #[test]
    fn test_access_failure_leaves_earlier_planes_written() {
        let dims = GridDimensions::new(2, 2, 4).unwrap();
        let source = uniform(dims, 0.01, 100);
        let mut target = Recording {
            inner: uniform(dims, 0.01, 0),
            writes: Vec::new(),
            fail_on: Some(2),
        };
        let mut notified = Vec::new();

        let result = DoseGridTransformer::default().convert(
            &source,
            &mut target,
            &params(25, 3.0),
            ScalingCorrection::IDENTITY,
            |z, _| notified.push(z),
        );

        assert!(matches!(result, Err(Eqd2Error::DataAccess(_))));
        assert_eq!(target.writes, vec![0, 1]);
        assert_eq!(notified, vec![0, 1]);
        assert_eq!(target.inner.voxel(0, 0, 1), Some(61));
        assert_eq!(target.inner.voxel(0, 0, 2), Some(0));
    }

    #[test]
    fn test_skewed_duplicate_is_corrected_in_place() {
        let dims = GridDimensions::new(3, 3, 2).unwrap();
        let source = InMemoryDose::from_fn(dims, 0.01, |x, y, z| (100 * (x + y + z)) as i32).unwrap();
        let mut duplicate = source.duplicate_with_skew(0.99);

        let correction = ScalingCorrector::compute(source.max_dose(), duplicate.max_dose()).unwrap();
        DoseGridTransformer::default()
            .convert_in_place(&mut duplicate, &params(25, 3.0), correction, |_, _| {})
            .unwrap();

        // 1 Gy in the source reads back as its EQD2 from the duplicate
        let eqd2 = duplicate.voxel_to_dose(duplicate.voxel(1, 0, 0).unwrap());
        assert!((eqd2 - 0.608).abs() < 0.01);
    }

    #[test]
    fn test_requantized_duplicate_is_corrected_in_place() {
        let dims = GridDimensions::new(1, 1, 1).unwrap();
        // 10 Gy copied 2 % high into the voxels, scale untouched
        let source = uniform(dims, 0.01, 1000);
        let mut duplicate = uniform(dims, 0.01, 1020);

        let correction = ScalingCorrector::compute(source.max_dose(), duplicate.max_dose()).unwrap();
        DoseGridTransformer::default()
            .convert_in_place(&mut duplicate, &params(5, 3.0), correction, |_, _| {})
            .unwrap();

        // 5 x 2 Gy is already EQD2
        assert_eq!(duplicate.voxel(0, 0, 0), Some(1000));
    }

    #[test]
    fn test_source_read_with_its_own_scale() {
        let dims = GridDimensions::new(2, 1, 1).unwrap();
        let source = uniform(dims, 0.01, 100);
        let mut target = uniform(dims, 0.02, 0);

        DoseGridTransformer::default()
            .convert(
                &source,
                &mut target,
                &params(25, 3.0),
                ScalingCorrection::IDENTITY,
                |_, _| {},
            )
            .unwrap();

        // 0.608 Gy at 0.02 Gy per unit
        assert!(target.voxels().iter().all(|&v| v == 30));
    }

    #[test]
    fn test_rounding_policy_decides_ties() {
        let dims = GridDimensions::new(1, 1, 1).unwrap();
        // 5 x 2 Gy is its own EQD2: 10 Gy is 2.5 units of 4 Gy
        let source = uniform(dims, 1.0, 10);
        let converted = |rounding: RoundingPolicy| {
            let mut target = uniform(dims, 4.0, 0);
            DoseGridTransformer::new(rounding)
                .convert(
                    &source,
                    &mut target,
                    &params(5, 2.0),
                    ScalingCorrection::IDENTITY,
                    |_, _| {},
                )
                .unwrap();
            target.voxel(0, 0, 0).unwrap()
        };

        assert_eq!(converted(RoundingPolicy::HalfToEven), 2);
        assert_eq!(converted(RoundingPolicy::HalfAwayFromZero), 3);
    }
}
