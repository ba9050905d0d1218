//! Component lifecycle bookkeeping.
//!
//! The `LifecycleTracker` records which components are mounted and queues
//! components whose bindings changed. Subscription callbacks only enqueue;
//! the tree drains the queue in [`ComponentTree::flush`](crate::tree::ComponentTree::flush).

use std::collections::HashSet;

use crate::tree::ComponentId;

/// Transitions reported by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Mount(ComponentId),
    Update(ComponentId),
    Destroy(ComponentId),
}

#[derive(Debug, Default)]
pub struct LifecycleTracker {
    mounted: HashSet<ComponentId>,
    /// Queued for update, in arrival order, without duplicates.
    dirty: Vec<ComponentId>,
    queued: HashSet<ComponentId>,
    /// Event log, kept only while recording.
    events: Option<Vec<LifecycleEvent>>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start keeping an event log for [`take_events`](Self::take_events).
    pub fn record_events(&mut self) {
        self.events.get_or_insert_with(Vec::new);
    }

    fn log(&mut self, event: LifecycleEvent) {
        if let Some(events) = &mut self.events {
            events.push(event);
        }
    }

    /// A second mount of the same id is ignored.
    pub fn on_mount(&mut self, id: ComponentId) {
        if self.mounted.insert(id) {
            self.log(LifecycleEvent::Mount(id));
        }
    }

    pub fn on_destroy(&mut self, id: ComponentId) {
        if self.mounted.remove(&id) {
            self.queued.remove(&id);
            self.dirty.retain(|d| *d != id);
            self.log(LifecycleEvent::Destroy(id));
        }
    }

    /// Queue a mounted component for update. Unmounted ids are ignored.
    pub fn mark_dirty(&mut self, id: ComponentId) {
        if self.mounted.contains(&id) && self.queued.insert(id) {
            self.dirty.push(id);
        }
    }

    /// Record that an update ran.
    pub fn on_update(&mut self, id: ComponentId) {
        if self.mounted.contains(&id) {
            self.log(LifecycleEvent::Update(id));
        }
    }

    pub fn is_mounted(&self, id: ComponentId) -> bool {
        self.mounted.contains(&id)
    }

    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Drain the update queue.
    pub fn take_dirty(&mut self) -> Vec<ComponentId> {
        self.queued.clear();
        std::mem::take(&mut self.dirty)
    }

    pub fn take_events(&mut self) -> Vec<LifecycleEvent> {
        self.events.as_mut().map(std::mem::take).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<ComponentId> {
        let mut sm: SlotMap<ComponentId, ()> = SlotMap::with_key();
        (0..n).map(|_| sm.insert(())).collect()
    }

    #[test]
    fn test_double_mount_is_noop() {
        let id = ids(1)[0];
        let mut tracker = LifecycleTracker::new();
        tracker.record_events();
        tracker.on_mount(id);
        tracker.on_mount(id);
        assert_eq!(tracker.mounted_count(), 1);
        assert_eq!(tracker.take_events(), [LifecycleEvent::Mount(id)]);
    }

    #[test]
    fn test_dirty_queue_dedups_and_keeps_order() {
        let v = ids(2);
        let mut tracker = LifecycleTracker::new();
        tracker.on_mount(v[0]);
        tracker.on_mount(v[1]);
        tracker.mark_dirty(v[1]);
        tracker.mark_dirty(v[0]);
        tracker.mark_dirty(v[1]);
        assert_eq!(tracker.take_dirty(), [v[1], v[0]]);
        assert!(!tracker.has_dirty());
    }

    #[test]
    fn test_unmounted_components_are_never_queued() {
        let v = ids(2);
        let mut tracker = LifecycleTracker::new();
        tracker.mark_dirty(v[0]);
        tracker.on_mount(v[1]);
        tracker.mark_dirty(v[1]);
        tracker.on_destroy(v[1]);
        assert!(tracker.take_dirty().is_empty());
        assert!(!tracker.is_mounted(v[1]));
    }

    #[test]
    fn test_events_only_while_recording() {
        let id = ids(1)[0];
        let mut tracker = LifecycleTracker::new();
        tracker.on_mount(id);
        assert!(tracker.take_events().is_empty());
        tracker.record_events();
        tracker.on_update(id);
        tracker.on_destroy(id);
        assert_eq!(
            tracker.take_events(),
            [LifecycleEvent::Update(id), LifecycleEvent::Destroy(id)]
        );
    }
}
