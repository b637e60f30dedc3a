use tracing::debug;

use crate::risk::dataset::ObservationId;

/// Which observation, if any, has its detail popup open
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Empty,
    Selected(ObservationId),
}

impl SelectionState {
    pub fn selected(&self) -> Option<ObservationId> {
        match self {
            SelectionState::Empty => None,
            SelectionState::Selected(id) => Some(*id),
        }
    }
}

/// Two-state machine: `select` always replaces, `dismiss` always empties.
#[derive(Debug, Default)]
pub struct SelectionController {
    state: SelectionState,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn select(&mut self, id: ObservationId) {
        if let SelectionState::Selected(prev) = self.state {
            debug!(from = prev.0, to = id.0, "selection replaced");
        } else {
            debug!(to = id.0, "selection opened");
        }
        self.state = SelectionState::Selected(id);
    }

    pub fn dismiss(&mut self) {
        if let SelectionState::Selected(prev) = self.state {
            debug!(from = prev.0, "selection dismissed");
        }
        self.state = SelectionState::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        assert_eq!(SelectionController::new().state(), SelectionState::Empty);
    }

    #[test]
    fn test_select_replaces() {
        let mut sel = SelectionController::new();
        sel.select(ObservationId(0));
        sel.select(ObservationId(1));
        assert_eq!(sel.state(), SelectionState::Selected(ObservationId(1)));
    }

    #[test]
    fn test_dismiss_from_empty_is_noop() {
        let mut sel = SelectionController::new();
        sel.dismiss();
        assert_eq!(sel.state(), SelectionState::Empty);
    }

    #[test]
    fn test_double_dismiss_is_idempotent() {
        let mut sel = SelectionController::new();
        sel.select(ObservationId(3));
        sel.dismiss();
        sel.dismiss();
        assert_eq!(sel.state(), SelectionState::Empty);
        assert_eq!(sel.state().selected(), None);
    }
}
