#![cfg(test)]
use eqd2_common::config::Config;
use eqd2_common::dose::{DoseMatrix, RoundingPolicy};
use eqd2_common::error::{Eqd2Error, Prerequisite};
use eqd2_common::plan::{DosePresentation, PlanHost};
use eqd2_core::memory::{InMemoryCourse, InMemoryDose, StoredPlan};
use eqd2_core::service::Eqd2Service;

use crate::utils::{ab, course_with, dims, eqd2, phantom_course, positional_dose, uniform_dose, SCALE};

/// End-to-end run on a positional grid: every voxel of the derived plan must
/// hold the EQD2 of the matching source voxel.
#[test]
fn converts_every_voxel_of_the_selected_plan() -> anyhow::Result<()> {
    let grid = dims(5, 4, 3);
    let mut course = course_with("Prostate", 25, positional_dose(grid));
    let service = Eqd2Service::default();

    let report = service.create_eqd2_plan(&mut course, ab(3.0), &mut |_| {})?;

    assert_eq!(report.stats.planes, 3);
    assert_eq!(report.stats.voxels, grid.voxel_count());

    let source = course.plans()[0].dose.as_ref().unwrap();
    let derived = course.plan(report.handle).unwrap().dose.as_ref().unwrap();

    for z in 0..grid.z_size {
        for y in 0..grid.y_size {
            for x in 0..grid.x_size {
                let d = source.dose_at(x, y, z).unwrap();
                let expected = eqd2(d, 25, 3.0);
                let got = derived.dose_at(x, y, z).unwrap();
                assert!(
                    (got - expected).abs() <= SCALE / 2.0 + 1e-12,
                    "voxel ({x},{y},{z}): expected {expected}, got {got}"
                );
            }
        }
    }
    Ok(())
}

#[test]
fn derived_plan_carries_prescription_and_metadata() -> anyhow::Result<()> {
    let mut course = phantom_course("Pelvis", 28, 1.8);
    let report = Eqd2Service::default().create_eqd2_plan(&mut course, ab(10.0), &mut |_| {})?;

    let plan = course.plan(report.handle).unwrap();
    assert_eq!(plan.id, "EQD2 Pelvis");
    assert_eq!(plan.name, "alfa/beta=10");
    assert_eq!(plan.number_of_fractions, Some(28));
    assert!((plan.dose_per_fraction - 1.8).abs() < 1e-12);
    assert_eq!(plan.presentation, DosePresentation::Absolute);
    assert!(plan.comment.starts_with("Number of fractions: 28\r\n"));
    assert!(plan.comment.contains("Dose per fraction: 1.80 Gy"));
    assert!(course.is_modifying());
    Ok(())
}

/// The duplicate reports a skewed maximum; the correction must bring the
/// converted dose back to the EQD2 of the true source dose.
#[test]
fn duplication_skew_is_corrected() -> anyhow::Result<()> {
    let grid = dims(4, 4, 2);
    let mut course = course_with("Lung", 5, uniform_dose(grid, 1200)).with_duplication_skew(0.98);

    let report = Eqd2Service::default().create_eqd2_plan(&mut course, ab(10.0), &mut |_| {})?;
    assert!((report.correction.factor() - 1.0 / 0.98).abs() < 1e-9);

    let derived = course.plan(report.handle).unwrap().dose.as_ref().unwrap();
    let expected = eqd2(12.0, 5, 10.0);
    let got = derived.max_dose();
    assert!(
        (got - expected).abs() <= derived.scale(),
        "expected {expected} Gy, got {got} Gy"
    );
    Ok(())
}

/// A host that copies the error into the voxels themselves; the correction
/// must still land on the true dose instead of applying the error twice.
#[test]
fn requantized_duplicate_is_corrected() -> anyhow::Result<()> {
    let grid = dims(1, 1, 1);
    // 10 Gy in 5 fractions, copied 2 % high
    let mut course = course_with("Boost", 5, uniform_dose(grid, 1000))
        .with_duplication_skew(1.02)
        .requantizing_duplicates(true);

    let report = Eqd2Service::default().create_eqd2_plan(&mut course, ab(3.0), &mut |_| {})?;
    assert!((report.correction.factor() - 1.0 / 1.02).abs() < 1e-9);

    let derived = course.plan(report.handle).unwrap().dose.as_ref().unwrap();
    // 5 x 2 Gy is already EQD2
    assert_eq!(derived.voxel(0, 0, 0), Some(1000));
    Ok(())
}

#[test]
fn progress_is_monotonic_and_ends_near_completion() -> anyhow::Result<()> {
    let mut course = phantom_course("Brain", 30, 2.0);
    let mut seen = Vec::new();

    Eqd2Service::default().create_eqd2_plan(&mut course, ab(2.0), &mut |p| seen.push(p))?;

    assert_eq!(seen.len(), 12);
    assert_eq!(seen[0], 0);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*seen.last().unwrap(), 92);
    Ok(())
}

#[test]
fn identity_at_two_gray_per_fraction() -> anyhow::Result<()> {
    let grid = dims(3, 3, 3);
    // 30 x 2 Gy: 6000 units at 0.01 Gy.
    let mut course = course_with("Breast", 30, uniform_dose(grid, 6000));

    let report = Eqd2Service::default().create_eqd2_plan(&mut course, ab(4.0), &mut |_| {})?;

    let derived = course.plan(report.handle).unwrap().dose.as_ref().unwrap();
    assert!(derived.voxels().iter().all(|&v| v == 6000));
    Ok(())
}

#[test]
fn existing_siblings_push_the_suffix_up() -> anyhow::Result<()> {
    let mut course = phantom_course("PlanA", 25, 2.0)
        .with_sibling("EQD2 PlanA")
        .with_sibling("eqd2 plana2");

    let report = Eqd2Service::default().create_eqd2_plan(&mut course, ab(3.0), &mut |_| {})?;
    assert_eq!(report.id.as_str(), "EQD2 PlanA3");

    // A second run sees the first derived plan as a sibling.
    let second = Eqd2Service::default().create_eqd2_plan(&mut course, ab(3.0), &mut |_| {})?;
    assert_eq!(second.id.as_str(), "EQD2 PlanA4");
    assert_eq!(course.plans().len(), 5);
    Ok(())
}

#[test]
fn configured_limits_flow_into_the_service() -> anyhow::Result<()> {
    let cfg = Config {
        max_id_length: 10,
        ..Config::default()
    };
    let service = Eqd2Service::from_config(&cfg)?;

    let grid = dims(2, 2, 1);
    let mut course = course_with("Prostate", 25, uniform_dose(grid, 7000));
    let report = service.create_eqd2_plan(&mut course, ab(3.0), &mut |_| {})?;

    assert_eq!(report.id.as_str(), "EQD2 Prost");
    assert!(report.id.len() <= 10);
    Ok(())
}

#[test]
fn missing_prerequisites_leave_the_course_untouched() {
    let service = Eqd2Service::default();
    let grid = dims(2, 2, 2);

    let mut no_plan = InMemoryCourse::new();
    assert_eq!(
        service.create_eqd2_plan(&mut no_plan, ab(3.0), &mut |_| {}),
        Err(Eqd2Error::MissingPrerequisite(Prerequisite::Plan))
    );

    let mut no_dose =
        InMemoryCourse::new().with_selected_plan(StoredPlan::new("Empty").with_fractions(5, 5.0));
    assert_eq!(
        service.create_eqd2_plan(&mut no_dose, ab(3.0), &mut |_| {}),
        Err(Eqd2Error::MissingPrerequisite(Prerequisite::Dose))
    );
    assert_eq!(no_dose.plans().len(), 1);

    let mut no_structures = course_with("Head", 5, uniform_dose(grid, 500)).with_structure_set(false);
    assert_eq!(
        service.create_eqd2_plan(&mut no_structures, ab(3.0), &mut |_| {}),
        Err(Eqd2Error::MissingPrerequisite(Prerequisite::StructureSet))
    );
    assert_eq!(no_structures.plans().len(), 1);

    let mut no_fractions = InMemoryCourse::new()
        .with_selected_plan(StoredPlan::new("Open").with_dose(uniform_dose(grid, 500)));
    assert_eq!(
        service.create_eqd2_plan(&mut no_fractions, ab(3.0), &mut |_| {}),
        Err(Eqd2Error::MissingPrerequisite(Prerequisite::NumberOfFractions))
    );
    assert!(!no_fractions.is_modifying());
}

#[test]
fn read_only_course_is_refused() {
    let mut course = phantom_course("Spine", 10, 3.0).writable(false);
    let mut progress = Vec::new();

    let result = Eqd2Service::default().create_eqd2_plan(&mut course, ab(2.0), &mut |p| {
        progress.push(p)
    });

    assert_eq!(result, Err(Eqd2Error::PermissionDenied));
    assert!(progress.is_empty());
    assert_eq!(course.plans().len(), 1);
    assert!(!course.can_modify_data());
}

#[test]
fn configured_rounding_decides_ties() -> anyhow::Result<()> {
    // 3 Gy in 3 fractions at a/b 4 is 2.5 Gy, exactly between two units
    let tie = |rounding: RoundingPolicy| -> anyhow::Result<i32> {
        let cfg = Config {
            rounding,
            ..Config::default()
        };
        let dose = InMemoryDose::from_voxels(dims(1, 1, 1), 1.0, vec![3])?;
        let mut course = InMemoryCourse::new()
            .with_selected_plan(StoredPlan::new("Tie").with_fractions(3, 1.0).with_dose(dose));

        let report = Eqd2Service::from_config(&cfg)?.create_eqd2_plan(&mut course, ab(4.0), &mut |_| {})?;
        Ok(report.stats.max_voxel)
    };

    assert_eq!(tie(RoundingPolicy::HalfToEven)?, 2);
    assert_eq!(tie(RoundingPolicy::HalfAwayFromZero)?, 3);
    Ok(())
}
