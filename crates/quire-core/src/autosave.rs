//! Coalescing autosave queue.
//!
//! The editor schedules a save on every edit; each schedule replaces the queued
//! content for that note and pushes its due time out by the queue delay, so a
//! burst of typing collapses into a single save.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::NoteId;

/// Default delay between the last edit and the save
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
struct QueuedSave {
    content: String,
    due: Instant,
}

#[derive(Debug, Clone)]
pub struct AutosaveQueue {
    delay: Duration,
    queued: HashMap<NoteId, QueuedSave>,
}

impl Default for AutosaveQueue {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSAVE_DELAY)
    }
}

impl AutosaveQueue {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            queued: HashMap::new(),
        }
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Queue `content` for `id`, replacing anything already queued
    pub fn schedule(&mut self, id: NoteId, content: impl Into<String>, now: Instant) {
        self.queued.insert(
            id,
            QueuedSave {
                content: content.into(),
                due: now + self.delay,
            },
        );
    }

    /// Drop the queued save for `id`. Returns whether one was queued.
    pub fn cancel(&mut self, id: &NoteId) -> bool {
        self.queued.remove(id).is_some()
    }

    /// Remove and return the queued content for `id`, due or not
    pub fn take(&mut self, id: &NoteId) -> Option<String> {
        self.queued.remove(id).map(|save| save.content)
    }

    /// Remove and return every save due at `now`, oldest due time first
    pub fn take_due(&mut self, now: Instant) -> Vec<(NoteId, String)> {
        let mut due: Vec<(NoteId, Instant)> = self
            .queued
            .iter()
            .filter(|(_, save)| save.due <= now)
            .map(|(id, save)| (*id, save.due))
            .collect();
        due.sort_by_key(|(id, at)| (*at, *id));

        due.into_iter()
            .filter_map(|(id, _)| self.queued.remove(&id).map(|save| (id, save.content)))
            .collect()
    }

    /// Remove and return every queued save regardless of due time
    pub fn drain(&mut self) -> Vec<(NoteId, String)> {
        let mut all: Vec<(NoteId, Instant, String)> = self
            .queued
            .drain()
            .map(|(id, save)| (id, save.due, save.content))
            .collect();
        all.sort_by_key(|(id, at, _)| (*at, *id));
        all.into_iter().map(|(id, _, content)| (id, content)).collect()
    }

    /// Earliest due time among queued saves
    pub fn next_due(&self) -> Option<Instant> {
        self.queued.values().map(|save| save.due).min()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn clear(&mut self) {
        self.queued.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DELAY: Duration = Duration::from_millis(1000);

    #[test]
    fn rapid_edits_coalesce_into_one_save() {
        let mut queue = AutosaveQueue::new(DELAY);
        let id = NoteId::new();
        let start = Instant::now();

        queue.schedule(id, "h", start);
        queue.schedule(id, "he", start + Duration::from_millis(300));
        queue.schedule(id, "hello", start + Duration::from_millis(600));

        assert!(queue.take_due(start + Duration::from_millis(1200)).is_empty());
        assert_eq!(
            queue.take_due(start + Duration::from_millis(1600)),
            vec![(id, "hello".to_string())]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn cancel_drops_queued_save() {
        let mut queue = AutosaveQueue::new(DELAY);
        let id = NoteId::new();
        let start = Instant::now();
        queue.schedule(id, "draft", start);

        assert!(queue.cancel(&id));
        assert!(!queue.cancel(&id));
        assert!(queue.take_due(start + DELAY * 2).is_empty());
    }

    #[test]
    fn take_returns_content_before_due() {
        let mut queue = AutosaveQueue::new(DELAY);
        let id = NoteId::new();
        let start = Instant::now();
        queue.schedule(id, "early", start);

        assert_eq!(queue.next_due(), Some(start + DELAY));
        assert_eq!(queue.take(&id), Some("early".to_string()));
        assert_eq!(queue.next_due(), None);
    }

    #[test]
    fn due_saves_come_out_oldest_first() {
        let mut queue = AutosaveQueue::new(DELAY);
        let first = NoteId::new();
        let second = NoteId::new();
        let start = Instant::now();
        queue.schedule(second, "b", start + Duration::from_millis(10));
        queue.schedule(first, "a", start);

        let due = queue.take_due(start + DELAY * 2);
        assert_eq!(due, vec![(first, "a".to_string()), (second, "b".to_string())]);
    }
}
