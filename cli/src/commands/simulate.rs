use std::time::{Duration, Instant};

use anyhow::{Context, ensure};
use colored::*;
use tracing::{info, warn};

use eqd2_common::{config::Config, dose::DoseMatrix, fractionation::AlphaOverBeta};
use eqd2_core::{
    memory::{InMemoryCourse, StoredPlan},
    phantom::Phantom,
    service::{Eqd2PlanReport, Eqd2Service},
};

use crate::commands::SimulateArgs;
use crate::terminal::{colors, format, print, progress, prompt};
use crate::tprint;

pub fn simulate(args: SimulateArgs, cfg: &Config) -> anyhow::Result<()> {
    ensure!(
        args.dose_per_fraction.is_finite() && args.dose_per_fraction > 0.0,
        "dose per fraction must be positive, got {}",
        args.dose_per_fraction
    );
    ensure!(
        args.skew.is_finite() && args.skew > 0.0,
        "duplication skew must be positive, got {}",
        args.skew
    );

    let Some(alpha_beta) = prompt::alpha_over_beta(args.alpha_beta)? else {
        info!("No alfa/beta selected, no plan created");
        return Ok(());
    };

    print::header("building synthetic course", cfg.quiet);
    let mut course = build_course(&args)?;
    let source_max = course
        .source_plan()
        .and_then(|plan| plan.dose.as_ref())
        .map(|dose| dose.max_dose())
        .unwrap_or_default();
    info!(
        "Source dose {} with {} maximum",
        args.size.to_string().color(colors::PRIMARY),
        format::gy(source_max)
    );

    print::header("creating eqd2 plan", cfg.quiet);
    let service = Eqd2Service::from_config(cfg)?;
    let start_time = Instant::now();

    let span = progress::conversion_span(&args.plan_id);
    let result = {
        let _guard = span.enter();
        let outcome = service.create_eqd2_plan(&mut course, alpha_beta, &mut |percent| {
            progress::report_conversion_progress(&span, percent)
        });
        if outcome.is_ok() {
            progress::finish(&span);
        }
        outcome
    };
    drop(span);

    let report = result.context("EQD2 plan was not created")?;
    simulation_ends(&course, &report, source_max, start_time.elapsed(), cfg)
}

fn build_course(args: &SimulateArgs) -> anyhow::Result<InMemoryCourse> {
    let peak_dose = args.dose_per_fraction * f64::from(args.fractions);
    let dose = Phantom::new(args.size, peak_dose)
        .with_noise(args.noise, args.seed)
        .build()?;

    let mut course = InMemoryCourse::new();
    for id in &args.existing {
        course = course.with_sibling(id.as_str());
    }

    Ok(course
        .with_selected_plan(
            StoredPlan::new(args.plan_id.as_str())
                .with_fractions(args.fractions, args.dose_per_fraction)
                .with_dose(dose),
        )
        .with_structure_set(!args.no_structure_set)
        .writable(!args.read_only)
        .with_duplication_skew(args.skew)
        .requantizing_duplicates(args.requantize))
}

fn simulation_ends(
    course: &InMemoryCourse,
    report: &Eqd2PlanReport,
    source_max: f64,
    total_time: Duration,
    cfg: &Config,
) -> anyhow::Result<()> {
    let plan = course
        .plan(report.handle)
        .context("derived plan missing from course")?;
    let eqd2_max = plan.dose.as_ref().map(|d| d.max_dose()).unwrap_or_default();

    if cfg.quiet > 1 {
        print::print(&format!("{}\t{eqd2_max:.3}", report.id));
        return Ok(());
    }

    if report.correction.deviation() > 0.01 {
        warn!("Check the duplicated dose before using this plan");
    }

    print::header("eqd2 plan", cfg.quiet);
    print::set_key_width(&["Planes converted", "Correction", "Source max"]);
    print::aligned_line("Identifier", report.id.as_str().color(colors::ACCENT).bold());
    print::aligned_line("Name", report.name.clone());
    print::aligned_line(
        "Fractions",
        report.fractionation.number_of_fractions().to_string(),
    );
    print::aligned_line("Correction", format::factor(report.correction.factor()));
    print::aligned_line("Deviation", format::deviation_percent(report.correction.factor()));
    print::aligned_line("Planes converted", report.stats.planes.to_string());
    print::aligned_line("Source max", format::gy(source_max));
    print::aligned_line("EQD2 max", format::eqd2_gy(eqd2_max));

    tprint!();
    print::header("course", cfg.quiet);
    print_course(course);

    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let voxels: ColoredString = format!("{} voxels", report.stats.voxels).bold().green();
    let output: &ColoredString =
        &format!("Conversion Complete: {voxels} converted in {total_time}").color(colors::TEXT_DEFAULT);

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output.to_string());
        }
        _ => info!("{}", output),
    }
    Ok(())
}

fn print_course(course: &InMemoryCourse) {
    for (idx, plan) in course.plans().iter().enumerate() {
        print::tree_head(idx, &plan.id);
        let fractions = plan
            .number_of_fractions
            .map(|n| format!("{n} x {:.2} Gy", plan.dose_per_fraction))
            .unwrap_or_default();
        let details: Vec<(String, ColoredString)> = vec![
            ("Name".to_string(), format::optional(&plan.name)),
            ("Fractions".to_string(), format::optional(&fractions)),
            (
                "Dose".to_string(),
                plan.dose
                    .as_ref()
                    .map(|d| format::gy(d.max_dose()))
                    .unwrap_or_else(|| format::optional("")),
            ),
        ];
        print::as_tree_one_level(details);
    }
}
