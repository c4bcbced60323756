use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::aggregate::WizardAggregate;

/// Ordered wizard sections. The numeric order is the on-screen order and is
/// what `currentStep` indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    BasicSetup,
    ObjectiveSelection,
    EloSelection,
    ItemConfiguration,
    Assessment,
    Review,
}

pub const STEPS: [Step; 6] = [
    Step::BasicSetup,
    Step::ObjectiveSelection,
    Step::EloSelection,
    Step::ItemConfiguration,
    Step::Assessment,
    Step::Review,
];

impl Step {
    pub fn index(self) -> usize {
        STEPS.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        STEPS.get(idx).copied()
    }
}

/// Completion derived purely from aggregate contents, recomputed on every
/// read. The Assessment step is deliberately absent: data presence alone
/// cannot distinguish "not started" from "in progress" there, so it is
/// explicitly gated through [`NavState::mark_step_complete`].
pub fn derived_completion(agg: &WizardAggregate) -> BTreeSet<Step> {
    let mut done = BTreeSet::new();
    let basic = !agg.board.is_empty()
        && !agg.grade.is_empty()
        && !agg.subject.is_empty()
        && !agg.name.is_empty()
        && !agg.duration.is_empty()
        && !agg.marks.is_empty()
        && !agg.assessment_type.is_empty()
        && !agg.selected_chapters.is_empty();
    if basic {
        done.insert(Step::BasicSetup);
    }
    if !agg.generated_course_outcomes.is_empty() {
        done.insert(Step::ObjectiveSelection);
    }
    if agg.selected_elos.iter().any(|e| e.selected) {
        done.insert(Step::EloSelection);
    }
    if !agg.item_configuration.is_empty() {
        done.insert(Step::ItemConfiguration);
    }
    if !agg.finalized_unit_plan.is_null() {
        done.insert(Step::Review);
    }
    done
}

/// Scroll-position step detection as a pure function: the highest section
/// whose top offset is at or above the scroll position plus the sticky
/// header height. Offsets come in section order from the UI.
pub fn compute_active_step(section_offsets: &[f64], scroll_y: f64, header_height: f64) -> usize {
    let line = scroll_y + header_height;
    let mut active = 0;
    for (idx, offset) in section_offsets.iter().enumerate() {
        if *offset <= line {
            active = idx;
        }
    }
    active
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavState {
    pub current_step: usize,
    pub explicit_complete: BTreeSet<Step>,
    pub is_sticky: bool,
}

impl NavState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-linear navigation is allowed; any step may be visited directly.
    pub fn go_to_step(&mut self, step: usize) {
        self.current_step = step;
    }

    /// Idempotent, additive only. Explicit completion is never downgraded.
    pub fn mark_step_complete(&mut self, step: Step) {
        self.explicit_complete.insert(step);
    }

    pub fn on_scroll(&mut self, section_offsets: &[f64], scroll_y: f64, header_height: f64) {
        self.current_step = compute_active_step(section_offsets, scroll_y, header_height);
    }
}

/// Derived completion plus the explicitly gated steps.
pub fn completed_steps(agg: &WizardAggregate, nav: &NavState) -> BTreeSet<Step> {
    let mut done = derived_completion(agg);
    done.extend(nav.explicit_complete.iter().copied());
    done
}
