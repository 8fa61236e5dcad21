//! Per-user to-do list, stored remotely as one JSON blob

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub done: bool,
    /// Day the item is scheduled for
    pub day: NaiveDate,
}

/// The decoded blob
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    #[serde(default)]
    pub items: Vec<TodoItem>,
    /// Last day unfinished items were carried forward
    #[serde(default)]
    pub rolled_over_on: Option<NaiveDate>,
}

impl TodoList {
    /// Carry unfinished items from earlier days to `today` and drop finished ones.
    ///
    /// Returns `false` when the list was already rolled over today.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.rolled_over_on.is_some_and(|day| day >= today) {
            return false;
        }

        self.items.retain(|item| !(item.done && item.day < today));
        for item in &mut self.items {
            if item.day < today {
                item.day = today;
            }
        }
        self.rolled_over_on = Some(today);
        true
    }
}

/// A to-do list row as held by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRecord {
    pub owner_id: String,
    pub list: TodoList,
    pub version_num: i64,
    pub updated_at: i64,
}

impl TodoRecord {
    #[must_use]
    pub fn empty(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            list: TodoList::default(),
            version_num: 0,
            updated_at: 0,
        }
    }

    /// Whether `incoming` should replace this record.
    ///
    /// A newer version always wins. A rollover done on another device also wins,
    /// since it rewrites item days that a local edit would otherwise clobber.
    #[must_use]
    pub fn is_superseded_by(&self, incoming: &Self) -> bool {
        if incoming.version_num > self.version_num {
            return true;
        }
        match (incoming.list.rolled_over_on, self.list.rolled_over_on) {
            (Some(theirs), Some(ours)) => theirs > ours,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn item(id: &str, done: bool, on: NaiveDate) -> TodoItem {
        TodoItem {
            id: id.to_string(),
            text: id.to_string(),
            done,
            day: on,
        }
    }

    #[test]
    fn roll_over_carries_open_items_and_drops_finished() {
        let mut list = TodoList {
            items: vec![
                item("old-open", false, day(1)),
                item("old-done", true, day(1)),
                item("today-done", true, day(2)),
            ],
            rolled_over_on: Some(day(1)),
        };

        assert!(list.roll_over(day(2)));
        let ids: Vec<_> = list.items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["old-open", "today-done"]);
        assert_eq!(list.items[0].day, day(2));
        assert_eq!(list.rolled_over_on, Some(day(2)));
    }

    #[test]
    fn roll_over_is_noop_on_same_day() {
        let mut list = TodoList {
            items: vec![item("a", true, day(1))],
            rolled_over_on: Some(day(2)),
        };
        assert!(!list.roll_over(day(2)));
        assert_eq!(list.items.len(), 1);
    }

    #[test]
    fn newer_rollover_supersedes_equal_version() {
        let mut ours = TodoRecord::empty("u1");
        ours.version_num = 4;
        ours.list.rolled_over_on = Some(day(1));

        let mut theirs = ours.clone();
        assert!(!ours.is_superseded_by(&theirs));

        theirs.list.rolled_over_on = Some(day(2));
        assert!(ours.is_superseded_by(&theirs));

        theirs.list.rolled_over_on = Some(day(1));
        theirs.version_num = 5;
        assert!(ours.is_superseded_by(&theirs));
    }
}
