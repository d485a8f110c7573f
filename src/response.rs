//! Response composition: rendering a dispatch outcome as natural language
//!
//! A fixed template exists for every combination of target scope and
//! outcome class; the table is an exhaustive match, so a missing
//! combination cannot exist at runtime and the tests only need to assert
//! that each one renders. Composition is a pure function of the dispatch
//! result and the intent.

use crate::dispatch::{DeviceOutcome, DispatchResult};
use crate::intent::{CurtainAction, Intent};
use serde::{Deserialize, Serialize};

/// Whether the intent addressed one device or several
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetScope {
    Single,
    Multiple,
}

/// Outcome classes a reply template exists for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeClass {
    Success,
    PartialFailure,
    AllFailed,
    InvalidPosition,
    Ambiguous,
    NoTarget,
}

/// Classify a dispatch result into the template grid
pub fn classify(result: &DispatchResult) -> (TargetScope, OutcomeClass) {
    match result {
        DispatchResult::NeedsClarification { candidates } => {
            (scope_of(candidates.len()), OutcomeClass::Ambiguous)
        }
        DispatchResult::NoTarget { mentions } => {
            (scope_of(mentions.len()), OutcomeClass::NoTarget)
        }
        DispatchResult::Executed { outcomes } => {
            let scope = scope_of(outcomes.len());
            let class = if result.all_invalid_position() {
                OutcomeClass::InvalidPosition
            } else if result.all_succeeded() {
                OutcomeClass::Success
            } else if result.partial_failure() {
                OutcomeClass::PartialFailure
            } else {
                OutcomeClass::AllFailed
            };
            (scope, class)
        }
    }
}

fn scope_of(count: usize) -> TargetScope {
    if count > 1 {
        TargetScope::Multiple
    } else {
        TargetScope::Single
    }
}

/// Composes user-facing replies from dispatch outcomes
#[derive(Debug, Clone, Default)]
pub struct ResponseComposer;

impl ResponseComposer {
    /// Render the reply for a dispatch result
    pub fn compose(&self, result: &DispatchResult, intent: &Intent) -> String {
        let (scope, class) = classify(result);
        let template = self.template(scope, class);

        template
            .replace("{action}", action_phrase(intent.action))
            .replace("{position_clause}", &position_clause(intent))
            .replace("{position}", &position_text(intent))
            .replace("{device}", &first_name(result))
            .replace("{devices}", &joined_names(result))
            .replace("{succeeded}", &joined(successes(result)))
            .replace("{failed}", &joined(failures(result)))
            .replace("{candidates}", &candidate_list(result))
            .replace("{mentions}", &mention_list(result))
    }

    /// The fixed template for a scope/outcome combination
    ///
    /// Exhaustive over both enums: adding a variant without a template is a
    /// compile error.
    pub fn template(&self, scope: TargetScope, class: OutcomeClass) -> &'static str {
        use OutcomeClass::*;
        use TargetScope::*;
        match (scope, class) {
            (Single, Success) => "Okay, {action} {device}{position_clause}.",
            (Multiple, Success) => "Okay, {action} {devices}{position_clause}.",
            (Single, PartialFailure) => "Only partly done: {failed} did not respond.",
            (Multiple, PartialFailure) => {
                "Done for {succeeded}, but {failed} did not respond."
            }
            (Single, AllFailed) => "Sorry, I couldn't reach {device}.",
            (Multiple, AllFailed) => "Sorry, none of them responded: {devices}.",
            (Single, InvalidPosition) => {
                "{position} is not a valid position. Please use a value between 0 and 100."
            }
            (Multiple, InvalidPosition) => {
                "{position} is not a valid position. Please use a value between 0 and 100."
            }
            (Single, Ambiguous) => "Which one did you mean: {candidates}?",
            (Multiple, Ambiguous) => "Which one did you mean: {candidates}?",
            (Single, NoTarget) => "I couldn't find any curtains matching {mentions}.",
            (Multiple, NoTarget) => "I couldn't find any curtains matching {mentions}.",
        }
    }
}

fn action_phrase(action: CurtainAction) -> &'static str {
    match action {
        CurtainAction::Open => "opening",
        CurtainAction::Close => "closing",
        CurtainAction::Stop => "stopping",
        CurtainAction::SetPosition => "setting",
        CurtainAction::Unknown => "handling",
    }
}

fn position_clause(intent: &Intent) -> String {
    match (intent.action, intent.position) {
        (CurtainAction::SetPosition, Some(p)) => format!(" to {p} percent"),
        _ => String::new(),
    }
}

fn position_text(intent: &Intent) -> String {
    intent
        .position
        .map(|p| p.to_string())
        .unwrap_or_else(|| "that".to_string())
}

fn successes(result: &DispatchResult) -> Vec<&DeviceOutcome> {
    result.outcomes().iter().filter(|o| o.succeeded()).collect()
}

fn failures(result: &DispatchResult) -> Vec<&DeviceOutcome> {
    result.outcomes().iter().filter(|o| !o.succeeded()).collect()
}

fn joined(outcomes: Vec<&DeviceOutcome>) -> String {
    if outcomes.is_empty() {
        return "nothing".to_string();
    }
    outcomes
        .iter()
        .map(|o| o.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn joined_names(result: &DispatchResult) -> String {
    joined(result.outcomes().iter().collect())
}

fn first_name(result: &DispatchResult) -> String {
    result
        .outcomes()
        .first()
        .map(|o| o.name.clone())
        .unwrap_or_else(|| "the curtain".to_string())
}

fn candidate_list(result: &DispatchResult) -> String {
    match result {
        DispatchResult::NeedsClarification { candidates } => candidates.join(" or "),
        _ => String::new(),
    }
}

fn mention_list(result: &DispatchResult) -> String {
    match result {
        DispatchResult::NoTarget { mentions } if !mentions.is_empty() => mentions.join(", "),
        _ => "your request".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::OutcomeStatus;
    use crate::registry::MotionState;
    use pretty_assertions::assert_eq;

    fn outcome(name: &str, status: OutcomeStatus) -> DeviceOutcome {
        DeviceOutcome {
            key: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            room: "living room".to_string(),
            status,
            motion: MotionState::Opening,
            position: Some(0),
        }
    }

    #[test]
    fn every_combination_renders() {
        let composer = ResponseComposer;
        for scope in [TargetScope::Single, TargetScope::Multiple] {
            for class in [
                OutcomeClass::Success,
                OutcomeClass::PartialFailure,
                OutcomeClass::AllFailed,
                OutcomeClass::InvalidPosition,
                OutcomeClass::Ambiguous,
                OutcomeClass::NoTarget,
            ] {
                assert!(!composer.template(scope, class).is_empty());
            }
        }
    }

    #[test]
    fn single_success_names_the_device() {
        let composer = ResponseComposer;
        let intent = Intent::new(CurtainAction::Open, vec!["living room".to_string()]);
        let result = DispatchResult::Executed {
            outcomes: vec![outcome("Living Room Curtain", OutcomeStatus::Success)],
        };
        assert_eq!(
            composer.compose(&result, &intent),
            "Okay, opening Living Room Curtain."
        );
    }

    #[test]
    fn set_position_includes_the_target() {
        let composer = ResponseComposer;
        let intent =
            Intent::new(CurtainAction::SetPosition, vec!["bedroom".to_string()]).with_position(40);
        let result = DispatchResult::Executed {
            outcomes: vec![outcome("Bedroom Curtain", OutcomeStatus::Success)],
        };
        assert_eq!(
            composer.compose(&result, &intent),
            "Okay, setting Bedroom Curtain to 40 percent."
        );
    }

    #[test]
    fn partial_failure_lists_both_sides() {
        let composer = ResponseComposer;
        let intent = Intent::new(CurtainAction::Close, vec!["all".to_string()]);
        let result = DispatchResult::Executed {
            outcomes: vec![
                outcome("Bedroom Curtain", OutcomeStatus::Success),
                outcome("Office Blind", OutcomeStatus::Failed("timeout".to_string())),
            ],
        };
        let text = composer.compose(&result, &intent);
        assert!(text.contains("Bedroom Curtain"));
        assert!(text.contains("Office Blind"));
    }

    #[test]
    fn invalid_position_reports_the_value() {
        let composer = ResponseComposer;
        let intent = Intent::new(
            CurtainAction::SetPosition,
            vec!["Living Room Curtain".to_string()],
        )
        .with_position(150);
        let result = DispatchResult::Executed {
            outcomes: vec![outcome(
                "Living Room Curtain",
                OutcomeStatus::InvalidPosition,
            )],
        };
        assert_eq!(
            composer.compose(&result, &intent),
            "150 is not a valid position. Please use a value between 0 and 100."
        );
    }

    #[test]
    fn ambiguity_asks_for_clarification() {
        let composer = ResponseComposer;
        let intent = Intent::new(CurtainAction::Close, vec!["curtain".to_string()]);
        let result = DispatchResult::NeedsClarification {
            candidates: vec![
                "Living Room Curtain".to_string(),
                "Bedroom Curtain".to_string(),
            ],
        };
        assert_eq!(
            composer.compose(&result, &intent),
            "Which one did you mean: Living Room Curtain or Bedroom Curtain?"
        );
    }

    #[test]
    fn no_target_echoes_mentions() {
        let composer = ResponseComposer;
        let intent = Intent::new(CurtainAction::Open, vec!["aquarium".to_string()]);
        let result = DispatchResult::NoTarget {
            mentions: vec!["aquarium".to_string()],
        };
        assert_eq!(
            composer.compose(&result, &intent),
            "I couldn't find any curtains matching aquarium."
        );
    }
}
