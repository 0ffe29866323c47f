//! # Dose Grid Model
//!
//! Geometry and storage primitives for voxelized dose.
//!
//! Voxel data is kept in flat, explicitly dimensioned buffers. Within a plane
//! `x` varies fastest: `index = y * x_size + x`. A 3D grid stacks planes along
//! `z`, so a plane starts at `z * x_size * y_size`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Eqd2Error, Result};

/// Size of a 3D dose grid. Every axis is at least one voxel long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridDimensions {
    pub x_size: usize,
    pub y_size: usize,
    pub z_size: usize,
}

impl GridDimensions {
    pub fn new(x_size: usize, y_size: usize, z_size: usize) -> Result<Self> {
        if x_size == 0 || y_size == 0 || z_size == 0 {
            return Err(Eqd2Error::InvalidInput(format!(
                "grid dimensions must be positive, got {x_size}x{y_size}x{z_size}"
            )));
        }
        Ok(Self {
            x_size,
            y_size,
            z_size,
        })
    }

    /// Number of voxels in one XY plane.
    pub fn plane_len(&self) -> usize {
        self.x_size * self.y_size
    }

    pub fn voxel_count(&self) -> usize {
        self.plane_len() * self.z_size
    }
}

impl fmt::Display for GridDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x_size, self.y_size, self.z_size)
    }
}

impl FromStr for GridDimensions {
    type Err = Eqd2Error;

    /// Parses `"X,Y,Z"` or `"XxYxZ"`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s
            .split(|c: char| c == ',' || c == 'x' || c == 'X')
            .map(str::trim)
            .collect();

        let [x, y, z] = parts.as_slice() else {
            return Err(Eqd2Error::InvalidInput(format!(
                "expected three grid sizes, got '{s}'"
            )));
        };

        let parse = |axis: &str| {
            axis.parse::<usize>()
                .map_err(|e| Eqd2Error::InvalidInput(format!("invalid grid size '{axis}': {e}")))
        };

        GridDimensions::new(parse(x)?, parse(y)?, parse(z)?)
    }
}

/// One XY cross-section of integer voxel values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelPlane {
    x_size: usize,
    y_size: usize,
    voxels: Vec<i32>,
}

impl VoxelPlane {
    /// Allocates a zero-filled plane.
    pub fn new(x_size: usize, y_size: usize) -> Self {
        Self {
            x_size,
            y_size,
            voxels: vec![0; x_size * y_size],
        }
    }

    /// A zero-filled plane matching the XY extent of `dims`.
    pub fn for_grid(dims: &GridDimensions) -> Self {
        Self::new(dims.x_size, dims.y_size)
    }

    pub fn from_vec(x_size: usize, y_size: usize, voxels: Vec<i32>) -> Result<Self> {
        if voxels.len() != x_size * y_size {
            return Err(Eqd2Error::InvalidInput(format!(
                "plane {x_size}x{y_size} needs {} voxels, got {}",
                x_size * y_size,
                voxels.len()
            )));
        }
        Ok(Self {
            x_size,
            y_size,
            voxels,
        })
    }

    pub fn x_size(&self) -> usize {
        self.x_size
    }

    pub fn y_size(&self) -> usize {
        self.y_size
    }

    pub fn get(&self, x: usize, y: usize) -> Option<i32> {
        self.index(x, y).map(|idx| self.voxels[idx])
    }

    pub fn set(&mut self, x: usize, y: usize, value: i32) -> Result<()> {
        let idx = self.index(x, y).ok_or_else(|| {
            Eqd2Error::DataAccess(format!(
                "voxel ({x}, {y}) is outside a {}x{} plane",
                self.x_size, self.y_size
            ))
        })?;
        self.voxels[idx] = value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.voxels
    }

    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut self.voxels
    }

    /// True when this buffer can hold a plane of a grid with `dims`.
    pub fn fits(&self, dims: &GridDimensions) -> bool {
        self.x_size == dims.x_size && self.y_size == dims.y_size
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.x_size && y < self.y_size).then(|| y * self.x_size + x)
    }
}

/// Rule used to quantize a real-valued voxel back into the integer word.
///
/// Ties are the only case where the policies differ: `2.5` becomes `2` under
/// [`RoundingPolicy::HalfToEven`] and `3` under [`RoundingPolicy::HalfAwayFromZero`].
/// Values beyond the `i32` range saturate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoundingPolicy {
    /// Banker's rounding, the default of the host scripting runtime.
    #[default]
    HalfToEven,
    HalfAwayFromZero,
}

impl RoundingPolicy {
    pub fn quantize(self, value: f64) -> i32 {
        let rounded = match self {
            RoundingPolicy::HalfToEven => value.round_ties_even(),
            RoundingPolicy::HalfAwayFromZero => value.round(),
        };
        // `as` saturates at the i32 bounds and maps NaN to 0
        rounded as i32
    }
}

impl FromStr for RoundingPolicy {
    type Err = Eqd2Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "half-even" | "even" | "bankers" => Ok(RoundingPolicy::HalfToEven),
            "half-away" | "away" => Ok(RoundingPolicy::HalfAwayFromZero),
            _ => Err(Eqd2Error::InvalidInput(format!(
                "unknown rounding policy '{s}' (expected half-even or half-away)"
            ))),
        }
    }
}

/// A dose container owned by the planning host.
///
/// The engine only ever talks to dose through this narrow surface: one plane
/// at a time, plus the scale and maximum readings.
pub trait DoseMatrix {
    fn dimensions(&self) -> GridDimensions;

    /// Dose represented by `voxel_value` (the host's `VoxelToDoseValue`).
    fn voxel_to_dose(&self, voxel_value: i32) -> f64;

    /// Largest dose anywhere in the container.
    fn max_dose(&self) -> f64;

    /// Copies plane `z` into `plane`.
    fn read_plane(&self, z: usize, plane: &mut VoxelPlane) -> Result<()>;

    /// Overwrites plane `z` with `plane`.
    fn write_plane(&mut self, z: usize, plane: &VoxelPlane) -> Result<()>;
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
