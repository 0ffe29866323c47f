//! # EQD2 Common
//!
//! Shared vocabulary of the workspace.
//!
//! * **[`dose`]**: grid geometry, voxel planes and the [`dose::DoseMatrix`] contract.
//! * **[`fractionation`]**: validated fractionation parameters and the alpha/beta input boundary.
//! * **[`plan`]**: plan identifiers, plan metadata and the [`plan::PlanHost`] contract.
//! * **[`error`]**: the error kinds surfaced by every fallible operation.
//! * **[`config`]**: runtime switches set from the command line.

pub mod config;
pub mod dose;
pub mod error;
pub mod fractionation;
pub mod plan;
