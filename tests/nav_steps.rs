use serde_json::json;

use planbookd::wizard::aggregate::{Action, CourseOutcome, WizardAggregate};
use planbookd::wizard::{completed_steps, compute_active_step, derived_completion, NavState, Step};

fn basic_setup_done() -> WizardAggregate {
    let mut agg = WizardAggregate::new();
    let fields = json!({
        "board": "CBSE",
        "grade": "7",
        "subject": "math",
        "name": "Unit A",
        "duration": "2 weeks",
        "marks": "25",
        "assessmentType": "formative",
        "selectedChapters": [{ "chapterId": "1", "chapterName": "One" }],
    });
    agg.apply(Action::Update(fields.as_object().expect("map").clone()))
        .expect("setup");
    agg
}

#[test]
fn active_step_follows_scroll_past_section_offsets() {
    let offsets = [0.0, 400.0, 900.0, 1400.0];
    assert_eq!(compute_active_step(&offsets, 0.0, 64.0), 0);
    assert_eq!(compute_active_step(&offsets, 350.0, 64.0), 1);
    assert_eq!(compute_active_step(&offsets, 900.0, 64.0), 2);
    assert_eq!(compute_active_step(&offsets, 5000.0, 64.0), 3);
    // Header height shifts the detection line.
    assert_eq!(compute_active_step(&offsets, 336.0, 64.0), 1);
    assert_eq!(compute_active_step(&offsets, 336.0, 0.0), 0);
    // No sections: stay on the first step.
    assert_eq!(compute_active_step(&[], 500.0, 64.0), 0);
}

#[test]
fn basic_setup_completes_only_when_every_field_is_filled() {
    let agg = basic_setup_done();
    assert!(derived_completion(&agg).contains(&Step::BasicSetup));

    let mut partial = basic_setup_done();
    partial.apply(Action::Update(
        json!({ "duration": "" }).as_object().expect("map").clone(),
    ))
    .expect("clear duration");
    assert!(!derived_completion(&partial).contains(&Step::BasicSetup));
}

#[test]
fn downstream_steps_derive_from_aggregate_contents() {
    let mut agg = basic_setup_done();
    let mut done = derived_completion(&agg);
    assert!(!done.contains(&Step::ObjectiveSelection));
    assert!(!done.contains(&Step::Review));

    agg.apply(Action::SetCourseOutcomes(vec![CourseOutcome {
        co_id: "co-1".into(),
        co_title: "t".into(),
        co_description: "d".into(),
        factor: 1.0,
    }]))
    .expect("outcomes");
    agg.apply(Action::ToggleElo("co-1".into())).expect("elo");
    agg.apply(Action::SetFinalizedUnitPlan(json!({ "title": "t" })))
        .expect("plan");

    done = derived_completion(&agg);
    assert!(done.contains(&Step::ObjectiveSelection));
    assert!(done.contains(&Step::EloSelection));
    assert!(done.contains(&Step::Review));
    // Assessment is never derived from data presence alone.
    assert!(!done.contains(&Step::Assessment));
}

#[test]
fn assessment_completion_is_explicit_and_sticky() {
    let agg = basic_setup_done();
    let mut nav = NavState::new();
    assert!(!completed_steps(&agg, &nav).contains(&Step::Assessment));

    nav.mark_step_complete(Step::Assessment);
    assert!(completed_steps(&agg, &nav).contains(&Step::Assessment));

    // Marking twice is idempotent; nothing ever unmarks it.
    nav.mark_step_complete(Step::Assessment);
    assert_eq!(nav.explicit_complete.len(), 1);
}

#[test]
fn jump_navigation_is_unconstrained() {
    let mut nav = NavState::new();
    nav.go_to_step(Step::Review.index());
    assert_eq!(nav.current_step, 5);
    nav.go_to_step(0);
    assert_eq!(nav.current_step, 0);
}

#[test]
fn cascade_reset_retracts_derived_completion() {
    let mut agg = basic_setup_done();
    agg.apply(Action::SetCourseOutcomes(vec![CourseOutcome {
        co_id: "co-1".into(),
        co_title: "t".into(),
        co_description: "d".into(),
        factor: 1.0,
    }]))
    .expect("outcomes");
    assert!(derived_completion(&agg).contains(&Step::ObjectiveSelection));

    agg.apply(Action::SetGrade("8".into())).expect("grade change");
    let done = derived_completion(&agg);
    assert!(!done.contains(&Step::ObjectiveSelection));
    assert!(!done.contains(&Step::BasicSetup), "subject was stranded");
}

#[test]
fn step_indices_round_trip() {
    for idx in 0..6 {
        let step = Step::from_index(idx).expect("valid index");
        assert_eq!(step.index(), idx);
    }
    assert!(Step::from_index(6).is_none());
}
