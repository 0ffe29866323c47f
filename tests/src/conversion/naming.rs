#![cfg(test)]
use eqd2_core::naming::PlanIdentifierGenerator;

#[test]
fn generated_identifiers_never_collide_with_a_growing_course() {
    let namer = PlanIdentifierGenerator::default();
    let mut course: Vec<String> = vec!["Prostate".into()];

    for _ in 0..40 {
        let id = namer.generate("Prostate", &course).unwrap();
        assert!(id.len() <= namer.max_length(), "{id} is too long");
        assert!(
            !course.iter().any(|existing| id.matches(existing)),
            "{id} collides with an existing plan"
        );
        course.push(id.to_string());
    }
}

#[test]
fn short_and_long_sources_truncate_differently() {
    let namer = PlanIdentifierGenerator::default();

    // Fits with its suffix: appended as is.
    assert_eq!(
        namer.generate("Pelvis", &["EQD2 Pelvis"]).unwrap().as_str(),
        "EQD2 Pelvis2"
    );
    // Base already at the limit: the source is cut to make room.
    assert_eq!(
        namer.generate("Prostate", &["EQD2 Prostate"]).unwrap().as_str(),
        "EQD2 Prostat2"
    );
}
