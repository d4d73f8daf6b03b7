use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TodoId(pub i64);

/// Completion state of a todo. `Unset` is a todo whose flag was never set;
/// it counts as not complete.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Completion {
    #[default]
    Unset,
    Open,
    Done,
}

impl Completion {
    pub fn is_done(self) -> bool { matches!(self, Completion::Done) }

    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            None => Completion::Unset,
            Some(false) => Completion::Open,
            Some(true) => Completion::Done,
        }
    }

    pub fn as_flag(self) -> Option<bool> {
        match self {
            Completion::Unset => None,
            Completion::Open => Some(false),
            Completion::Done => Some(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    /// Assigned by the repository on first save.
    pub id: Option<TodoId>,
    pub title: String,
    pub completed: Completion,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn new(title: impl Into<String>, completed: Completion) -> Self {
        Self { id: None, title: title.into(), completed, completed_at: None }
    }

    /// Completion time for this todo once `previous` is replaced by it:
    /// stamped on a move into `Done`, kept while it stays `Done`, cleared otherwise.
    pub fn completion_time(&self, previous: &Todo, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match (previous.completed, self.completed) {
            (Completion::Done, Completion::Done) => self.completed_at.or(previous.completed_at),
            (_, Completion::Done) => Some(self.completed_at.unwrap_or(now)),
            (_, Completion::Open | Completion::Unset) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_done_counts_as_done() {
        assert!(Completion::Done.is_done());
        assert!(!Completion::Open.is_done());
        assert!(!Completion::Unset.is_done());
    }

    #[test]
    fn flag_conversion_is_lossless() {
        for c in [Completion::Unset, Completion::Open, Completion::Done] {
            assert_eq!(Completion::from_flag(c.as_flag()), c);
        }
    }

    #[test]
    fn new_todo_has_no_id() {
        let todo = Todo::new("write docs", Completion::Unset);
        assert_eq!(todo.id, None);
        assert_eq!(todo.title, "write docs");
        assert_eq!(todo.completed_at, None);
    }

    #[test]
    fn completion_time_follows_transitions() {
        let now = Utc::now();
        let earlier = now - chrono::Duration::hours(1);
        let open = Todo::new("t", Completion::Open);
        let done = Todo { completed_at: Some(earlier), ..Todo::new("t", Completion::Done) };

        assert_eq!(Todo::new("t", Completion::Done).completion_time(&open, now), Some(now));
        assert_eq!(Todo::new("t", Completion::Done).completion_time(&done, now), Some(earlier));
        assert_eq!(Todo::new("t", Completion::Unset).completion_time(&done, now), None);
        assert_eq!(open.completion_time(&done, now), None);
    }
}
