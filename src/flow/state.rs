//! Conversation state machine — tracks which step of the flow a user is in.

use serde::{Deserialize, Serialize};

/// The steps of the selection-to-contact flow.
///
/// Progresses linearly: Idle → SelectingOrigin → SelectingDestination →
/// SelectingDate → ShowingResults → AwaitingContact → Idle. A start event
/// jumps to SelectingOrigin from anywhere; reset returns to Idle from
/// anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    SelectingOrigin,
    SelectingDestination,
    SelectingDate,
    ShowingResults,
    AwaitingContact,
}

impl FlowState {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: FlowState) -> bool {
        use FlowState::*;
        // Reset and new-search re-entry are valid from any state.
        if matches!(target, Idle | SelectingOrigin) {
            return true;
        }
        matches!(
            (self, target),
            (SelectingOrigin, SelectingDestination)
                | (SelectingDestination, SelectingDate)
                | (SelectingDate, ShowingResults)
                | (ShowingResults, AwaitingContact)
        )
    }
}

impl Default for FlowState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::SelectingOrigin => "selecting_origin",
            Self::SelectingDestination => "selecting_destination",
            Self::SelectingDate => "selecting_date",
            Self::ShowingResults => "showing_results",
            Self::AwaitingContact => "awaiting_contact",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions() {
        use FlowState::*;
        let transitions = [
            (Idle, SelectingOrigin),
            (SelectingOrigin, SelectingDestination),
            (SelectingDestination, SelectingDate),
            (SelectingDate, ShowingResults),
            (ShowingResults, AwaitingContact),
            (AwaitingContact, Idle),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should reach {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use FlowState::*;
        // Skipping steps
        assert!(!Idle.can_transition_to(SelectingDate));
        assert!(!SelectingOrigin.can_transition_to(ShowingResults));
        // Going backward (other than reset/new-search)
        assert!(!SelectingDate.can_transition_to(SelectingDestination));
        assert!(!AwaitingContact.can_transition_to(ShowingResults));
    }

    #[test]
    fn reset_and_restart_from_anywhere() {
        use FlowState::*;
        for state in [
            Idle,
            SelectingOrigin,
            SelectingDestination,
            SelectingDate,
            ShowingResults,
            AwaitingContact,
        ] {
            assert!(state.can_transition_to(Idle));
            assert!(state.can_transition_to(SelectingOrigin));
        }
    }

    #[test]
    fn display_matches_serde() {
        use FlowState::*;
        for state in [
            Idle,
            SelectingOrigin,
            SelectingDestination,
            SelectingDate,
            ShowingResults,
            AwaitingContact,
        ] {
            let display = format!("{state}");
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }
}
