//! # EQD2 Core
//!
//! The conversion engine and its orchestration.
//!
//! * [`scaling`]: correction for the host's dose duplication error.
//! * [`naming`]: collision-free identifiers for derived plans.
//! * [`transform`]: plane-by-plane EQD2 conversion of a dose grid.
//! * [`service`]: the "create EQD2 plan" use case driving a [`PlanHost`].
//! * [`memory`]: an in-memory planning host.
//! * [`phantom`]: synthetic dose distributions.
//!
//! [`PlanHost`]: eqd2_common::plan::PlanHost

pub mod memory;
pub mod naming;
pub mod phantom;
pub mod scaling;
pub mod service;
pub mod transform;
