use planbookd::wizard::aggregate::Elo;
use planbookd::wizard::assessment::{items_count, EloAssessment, RowPatch, MAX_ITEMS_PER_ELO};

fn elo(id: &str) -> Elo {
    Elo {
        id: id.to_string(),
        title: format!("Outcome {}", id),
        description: "Students can do the thing".to_string(),
        selected: true,
    }
}

fn patch(item_type: &str, count: &str) -> RowPatch {
    RowPatch {
        item_type: Some(item_type.to_string()),
        no_of_items: Some(count.to_string()),
        marks_per_item: Some("1".to_string()),
    }
}

#[test]
fn free_text_counts_parse_like_the_form() {
    assert_eq!(items_count("4"), 4);
    assert_eq!(items_count(" 7 "), 7);
    assert_eq!(items_count(""), 0);
    assert_eq!(items_count("abc"), 0);
    assert_eq!(items_count("-3"), 0);
}

#[test]
fn add_over_cap_keeps_row_but_unsets_count_and_warns() {
    let mut ea = EloAssessment::from_elo(&elo("e1"));
    assert!(ea.add_row(patch("MCQ", "6")).is_none());

    let warning = ea.add_row(patch("Short answer", "5"));
    assert!(warning.is_some(), "cap breach must warn");

    // The row lands anyway, minus the offending count.
    assert_eq!(ea.assessment_rows.len(), 2);
    assert_eq!(ea.assessment_rows[1].item_type, "Short answer");
    assert_eq!(ea.assessment_rows[1].no_of_items, "");
    assert_eq!(ea.row_item_total(), 6);
    assert_eq!(ea.warning, warning);
}

#[test]
fn duplicate_item_type_on_add_is_dropped_with_warning() {
    let mut ea = EloAssessment::from_elo(&elo("e1"));
    assert!(ea.add_row(patch("MCQ", "3")).is_none());

    let warning = ea.add_row(patch("MCQ", "2"));
    assert!(warning.is_some());
    assert_eq!(ea.assessment_rows[1].item_type, "");
    // The count was fine, so it sticks.
    assert_eq!(ea.assessment_rows[1].no_of_items, "2");
}

#[test]
fn violating_edit_is_rejected_wholesale() {
    let mut ea = EloAssessment::from_elo(&elo("e1"));
    ea.add_row(patch("MCQ", "6"));
    ea.add_row(patch("Short answer", "2"));
    let row_id = ea.assessment_rows[1].id.clone();

    let warning = ea
        .update_row(&row_id, RowPatch { no_of_items: Some("9".into()), ..RowPatch::default() })
        .expect("row exists");
    assert!(warning.is_some());
    // Prior value survives a rejected edit.
    assert_eq!(ea.assessment_rows[1].no_of_items, "2");
    assert!(ea.warning.is_some());

    // A conforming edit clears the warning.
    let warning = ea
        .update_row(&row_id, RowPatch { no_of_items: Some("4".into()), ..RowPatch::default() })
        .expect("row exists");
    assert!(warning.is_none());
    assert_eq!(ea.assessment_rows[1].no_of_items, "4");
    assert!(ea.warning.is_none());
}

#[test]
fn edit_to_duplicate_type_keeps_prior_type() {
    let mut ea = EloAssessment::from_elo(&elo("e1"));
    ea.add_row(patch("MCQ", "3"));
    ea.add_row(patch("Short answer", "2"));
    let row_id = ea.assessment_rows[1].id.clone();

    let warning = ea
        .update_row(&row_id, RowPatch { item_type: Some("MCQ".into()), ..RowPatch::default() })
        .expect("row exists");
    assert!(warning.is_some());
    assert_eq!(ea.assessment_rows[1].item_type, "Short answer");
}

#[test]
fn used_item_types_disable_but_never_repair_duplicates() {
    let mut ea = EloAssessment::from_elo(&elo("e1"));
    ea.add_row(patch("MCQ", "2"));
    ea.add_row(patch("True or False", "2"));
    // Duplicates loaded from elsewhere stay; the list just reports the type.
    ea.assessment_rows[1].item_type = "MCQ".to_string();

    assert_eq!(ea.used_item_types(), vec!["MCQ".to_string()]);
    assert_eq!(ea.assessment_rows.len(), 2);
}

#[test]
fn cap_boundary_is_inclusive() {
    let mut ea = EloAssessment::from_elo(&elo("e1"));
    ea.add_row(patch("MCQ", "6"));
    let warning = ea.add_row(patch("Short answer", "4"));
    assert!(warning.is_none(), "exactly the cap is allowed");
    assert_eq!(ea.row_item_total(), MAX_ITEMS_PER_ELO);
}

#[test]
fn sync_preserves_prior_work_for_still_selected_elos() {
    use planbookd::wizard::assessment::sync_with_elos;

    let mut first = EloAssessment::from_elo(&elo("e1"));
    first.add_row(patch("MCQ", "3"));
    let existing = vec![first, EloAssessment::from_elo(&elo("e2"))];

    let mut selection = vec![elo("e1"), elo("e3")];
    selection.push(Elo { selected: false, ..elo("e2") });

    let synced = sync_with_elos(existing, &selection);
    let ids: Vec<_> = synced.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["e1", "e3"]);
    // e1's rows survived the resync.
    assert_eq!(synced[0].assessment_rows.len(), 1);
    assert!(synced[1].assessment_rows.is_empty());
}
