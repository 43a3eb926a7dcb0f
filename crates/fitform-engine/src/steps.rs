//! Step sequence and cursor navigation.
//!
//! The declared steps form an ordered list. The request-completed step is a
//! virtual terminal that never appears in that list; it is represented by
//! [`Position::Completed`] rather than by an index.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;

use crate::config::{ConfigError, FormConfig};

/// Identifier of a form step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for StepId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StepId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StepId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Cursor position within a [`StepSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Index into the declared steps.
    Step(usize),
    /// The virtual request-completed step.
    Completed,
}

/// Ordered steps plus the two request-bearing identifiers.
#[derive(Debug, Clone)]
pub struct StepSequence {
    steps: Vec<StepId>,
    ordinals: HashMap<StepId, usize>,
    request_initiated: usize,
    request_completed: StepId,
}

impl StepSequence {
    /// Build a sequence from a validated configuration.
    pub fn from_config(config: &FormConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let steps: Vec<StepId> = config.steps.iter().map(StepId::new).collect();
        let ordinals: HashMap<StepId, usize> = steps
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index))
            .collect();

        let request_initiated = ordinals
            .get(config.request_initiated_step.as_str())
            .copied()
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "request_initiated_step '{}' is not one of the steps",
                    config.request_initiated_step
                ))
            })?;

        Ok(Self {
            steps,
            ordinals,
            request_initiated,
            request_completed: StepId::new(config.request_completed_step.clone()),
        })
    }

    /// Declared steps in traversal order.
    pub fn steps(&self) -> &[StepId] {
        &self.steps
    }

    /// Number of declared steps (the completed step is not counted).
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a validated sequence.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn first(&self) -> Position {
        Position::Step(0)
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Position of the step where a request may start.
    pub fn request_initiated(&self) -> Position {
        Position::Step(self.request_initiated)
    }

    pub fn request_completed_step(&self) -> &StepId {
        &self.request_completed
    }

    /// Resolve an identifier to a position, including the completed step.
    pub fn position_of(&self, id: &str) -> Option<Position> {
        if id == self.request_completed.as_str() {
            return Some(Position::Completed);
        }
        self.ordinals.get(id).copied().map(Position::Step)
    }

    /// Identifier at a position.
    pub fn id_at(&self, position: Position) -> &StepId {
        match position {
            Position::Step(index) => &self.steps[index.min(self.last_index())],
            Position::Completed => &self.request_completed,
        }
    }

    /// The position after `position`, or `None` at the end of the sequence.
    pub fn next(&self, position: Position) -> Option<Position> {
        match position {
            Position::Step(index) if index < self.last_index() => Some(Position::Step(index + 1)),
            Position::Step(_) | Position::Completed => None,
        }
    }

    /// The position before `position`, or `None` at the first step.
    ///
    /// Stepping back from the completed step returns to the last declared step.
    pub fn previous(&self, position: Position) -> Option<Position> {
        match position {
            Position::Step(0) => None,
            Position::Step(index) => Some(Position::Step(index - 1)),
            Position::Completed => Some(Position::Step(self.last_index())),
        }
    }
}

/// Form-wide errors from navigation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    /// Identifier is neither a declared step nor the completed step.
    #[error("Unknown step: {0}")]
    UnknownStep(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence() -> StepSequence {
        StepSequence::from_config(&FormConfig::default()).unwrap()
    }

    #[test]
    fn test_ordinals() {
        let seq = sequence();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.position_of("equipment"), Some(Position::Step(0)));
        assert_eq!(seq.position_of("preferences"), Some(Position::Step(2)));
        assert_eq!(seq.position_of("results"), Some(Position::Completed));
        assert_eq!(seq.position_of("unknown"), None);
        assert_eq!(seq.request_initiated(), Position::Step(2));
    }

    #[test]
    fn test_completed_step_is_not_declared() {
        let seq = sequence();
        assert!(!seq.steps().contains(seq.request_completed_step()));
        assert_eq!(seq.id_at(Position::Completed).as_str(), "results");
    }

    #[test]
    fn test_next_stops_at_last_step() {
        let seq = sequence();
        assert_eq!(seq.next(Position::Step(0)), Some(Position::Step(1)));
        assert_eq!(seq.next(Position::Step(1)), Some(Position::Step(2)));
        assert_eq!(seq.next(Position::Step(2)), None);
        assert_eq!(seq.next(Position::Completed), None);
    }

    #[test]
    fn test_previous() {
        let seq = sequence();
        assert_eq!(seq.previous(Position::Step(0)), None);
        assert_eq!(seq.previous(Position::Step(2)), Some(Position::Step(1)));
        assert_eq!(seq.previous(Position::Completed), Some(Position::Step(2)));
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = FormConfig::new(["a", "b"], "missing", "done");
        assert!(StepSequence::from_config(&config).is_err());
    }

    #[test]
    fn test_step_id_serializes_as_string() {
        let json = serde_json::to_string(&StepId::new("profile")).unwrap();
        assert_eq!(json, "\"profile\"");
    }
}
