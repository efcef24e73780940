// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Routing tag returned by a node's post phase.
///
/// The flow looks up `(node, action)` in its edge table to find the next node.
/// Two tags are well known: [`Action::Default`] is the conventional "continue to
/// the single next step" edge of linear segments, and [`Action::Done`] is an
/// explicit terminal that can never be wired. Anything else is carried as
/// [`Action::Named`].
///
/// # Example
/// ```
/// use nodeflow::engine::Action;
///
/// assert_eq!(Action::from("default"), Action::Default);
/// assert_eq!(Action::from("done"), Action::Done);
/// assert_eq!(Action::from("search"), Action::Named("search".to_string()));
/// assert_eq!(Action::from("search").as_str(), "search");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Action {
    #[default]
    Default,
    Done,
    Named(String),
}

pub const DEFAULT_ACTION: &str = "default";
pub const DONE_ACTION: &str = "done";

impl Action {
    pub fn named(tag: impl Into<String>) -> Self {
        Action::from(tag.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Default => DEFAULT_ACTION,
            Action::Done => DONE_ACTION,
            Action::Named(tag) => tag,
        }
    }

    /// True for the explicit terminal tag.
    pub fn is_done(&self) -> bool {
        matches!(self, Action::Done)
    }
}

impl From<&str> for Action {
    fn from(tag: &str) -> Self {
        match tag {
            DEFAULT_ACTION => Action::Default,
            DONE_ACTION => Action::Done,
            other => Action::Named(other.to_string()),
        }
    }
}

impl From<String> for Action {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            DEFAULT_ACTION => Action::Default,
            DONE_ACTION => Action::Done,
            _ => Action::Named(tag),
        }
    }
}

impl From<&Action> for Action {
    fn from(action: &Action) -> Self {
        action.clone()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_tags_normalise() {
        assert_eq!(Action::from("default".to_string()), Action::Default);
        assert_eq!(Action::named("done"), Action::Done);
        assert_eq!(Action::default(), Action::Default);
    }

    #[test]
    fn test_named_tags_round_trip_through_display() {
        let action = Action::named("process");
        assert_eq!(action.to_string(), "process");
        assert_eq!(Action::from(action.to_string()), action);
        assert!(!action.is_done());
        assert!(Action::Done.is_done());
    }
}
