use serde_json::{json, Map, Value};

use planbookd::wizard::aggregate::{Action, ApplyError, WizardAggregate};

fn partial(value: Value) -> Map<String, Value> {
    value.as_object().expect("object literal").clone()
}

#[test]
fn empty_update_is_a_noop() {
    let mut agg = WizardAggregate::new();
    let outcome = agg.apply(Action::Update(Map::new())).expect("empty update");
    assert!(!outcome.changed);
    assert!(outcome.invalidated.is_empty());
}

#[test]
fn update_merges_shallow_and_leaves_other_keys_alone() {
    let mut agg = WizardAggregate::new();
    agg.apply(Action::Update(partial(json!({ "name": "Unit A", "marks": "25" }))))
        .expect("first update");
    agg.apply(Action::Update(partial(json!({ "duration": "2 weeks" }))))
        .expect("second update");

    assert_eq!(agg.name, "Unit A");
    assert_eq!(agg.marks, "25");
    assert_eq!(agg.duration, "2 weeks");
}

#[test]
fn array_keys_replace_wholesale_not_elementwise() {
    let mut agg = WizardAggregate::new();
    agg.apply(Action::Update(partial(json!({
        "selectedChapters": [
            { "chapterId": "1", "chapterName": "One" },
            { "chapterId": "2", "chapterName": "Two" },
        ]
    }))))
    .expect("first set");
    agg.apply(Action::Update(partial(json!({
        "selectedChapters": [{ "chapterId": "3", "chapterName": "Three" }]
    }))))
    .expect("replace");

    assert_eq!(agg.selected_chapters.len(), 1);
    assert_eq!(agg.selected_chapters[0].chapter_id, "3");
}

#[test]
fn unknown_keys_are_rejected() {
    let mut agg = WizardAggregate::new();
    let err = agg
        .apply(Action::Update(partial(json!({ "bogus": "x" }))))
        .expect_err("unknown key");
    assert!(matches!(err, ApplyError::UnknownField(k) if k == "bogus"));
}

#[test]
fn rejected_update_applies_none_of_the_partial() {
    let mut agg = WizardAggregate::new();
    agg.apply(Action::Update(partial(json!({ "name": "Unit A" }))))
        .expect("seed");

    // Good keys mixed with a bad one: the whole partial must be discarded.
    agg.apply(Action::Update(partial(json!({ "board": "CBSE", "zzz": "junk" }))))
        .expect_err("unknown key");
    assert_eq!(agg.board, "");
    assert_eq!(agg.name, "Unit A");

    agg.apply(Action::Update(partial(json!({ "marks": 25, "duration": "2 weeks" }))))
        .expect_err("non-string scalar");
    assert_eq!(agg.marks, "");
    assert_eq!(agg.duration, "");
}

#[test]
fn scalar_keys_must_be_strings() {
    let mut agg = WizardAggregate::new();
    let err = agg
        .apply(Action::Update(partial(json!({ "marks": 25 }))))
        .expect_err("non-string scalar");
    assert!(matches!(err, ApplyError::BadValue { field, .. } if field == "marks"));
}

#[test]
fn selection_keys_in_update_route_through_cascade() {
    let mut agg = WizardAggregate::new();
    agg.apply(Action::SetGrade("7".into())).expect("grade");
    agg.apply(Action::SetSubject("math".into())).expect("subject");

    let outcome = agg
        .apply(Action::Update(partial(json!({ "grade": "8" }))))
        .expect("grade via update");
    assert!(outcome.changed);
    assert_eq!(outcome.invalidated.len(), 2);
    assert!(agg.subject.is_empty());
}

#[test]
fn item_config_row_patch_rejects_unknown_key() {
    let mut agg = WizardAggregate::new();
    let row = planbookd::wizard::aggregate::ItemConfigRow::new();
    let row_id = row.id.clone();
    agg.apply(Action::AddItemConfigRow(row)).expect("add row");

    agg.apply(Action::UpdateItemConfigRow {
        row_id: row_id.clone(),
        patch: partial(json!({ "bloomsLevel": "Apply", "noOfItems": "3" })),
    })
    .expect("valid patch");
    assert_eq!(agg.item_configuration[0].blooms_level, "Apply");
    assert_eq!(agg.item_configuration[0].no_of_items, "3");

    let err = agg
        .apply(Action::UpdateItemConfigRow {
            row_id: row_id.clone(),
            patch: partial(json!({ "nope": "x" })),
        })
        .expect_err("unknown patch key");
    assert!(matches!(err, ApplyError::UnknownField(_)));

    // A patch mixing good and bad keys must not half-apply.
    agg.apply(Action::UpdateItemConfigRow {
        row_id,
        patch: partial(json!({ "difficulty": "hard", "nope": "x" })),
    })
    .expect_err("unknown patch key");
    assert_eq!(agg.item_configuration[0].difficulty, "");
    assert_eq!(agg.item_configuration[0].blooms_level, "Apply");
}

#[test]
fn removing_missing_row_reports_not_found() {
    let mut agg = WizardAggregate::new();
    let err = agg
        .apply(Action::RemoveItemConfigRow { row_id: "missing".into() })
        .expect_err("missing row");
    assert!(matches!(err, ApplyError::NotFound { .. }));
}
