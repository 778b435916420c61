//! Cancelable one-shot timers on a virtual millisecond clock.
//!
//! Nothing here sleeps. The owner advances the clock explicitly and pops
//! due events one at a time, so each handler sees the state left by the
//! previous one and may schedule follow-ups relative to its own due time.

/// Handle for a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Pending<E> {
    id: TimerId,
    due_ms: u64,
    event: E,
}

/// A set of pending events ordered by due time.
#[derive(Debug)]
pub struct Scheduler<E> {
    now_ms: u64,
    next_id: u64,
    pending: Vec<Pending<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `event` to fire `delay_ms` after the current time.
    pub fn schedule_in(&mut self, delay_ms: u64, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due_ms = self.now_ms.saturating_add(delay_ms);
        log::debug!("timer {} scheduled for t={due_ms}ms", id.0);
        self.pending.push(Pending { id, due_ms, event });
        id
    }

    /// Drop a pending event. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        before != self.pending.len()
    }

    /// Drop every pending event.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return the earliest event due at or before `until_ms`,
    /// moving the clock to its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, E)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_ms <= until_ms)
            .min_by_key(|(_, p)| (p.due_ms, p.id))
            .map(|(i, _)| i)?;
        let pending = self.pending.remove(idx);
        self.now_ms = self.now_ms.max(pending.due_ms);
        Some((pending.id, pending.event))
    }

    /// Move the clock forward to `until_ms` (never backwards).
    pub fn advance_to(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule_in(300, "c");
        s.schedule_in(100, "a");
        s.schedule_in(200, "b");
        let mut fired = Vec::new();
        while let Some((_, e)) = s.pop_due(1_000) {
            fired.push((e, s.now_ms()));
        }
        assert_eq!(fired, vec![("a", 100), ("b", 200), ("c", 300)]);
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let mut s = Scheduler::new();
        s.schedule_in(50, 1);
        s.schedule_in(50, 2);
        assert_eq!(s.pop_due(50).map(|(_, e)| e), Some(1));
        assert_eq!(s.pop_due(50).map(|(_, e)| e), Some(2));
    }

    #[test]
    fn not_due_yet() {
        let mut s = Scheduler::new();
        s.schedule_in(500, ());
        assert!(s.pop_due(499).is_none());
        s.advance_to(499);
        assert_eq!(s.now_ms(), 499);
        assert!(s.pop_due(500).is_some());
    }

    #[test]
    fn cancel_and_clear() {
        let mut s = Scheduler::new();
        let a = s.schedule_in(10, 'a');
        s.schedule_in(20, 'b');
        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert!(!s.is_pending(a));
        assert_eq!(s.len(), 1);
        s.clear();
        assert!(s.is_empty());
        assert!(s.pop_due(u64::MAX).is_none());
    }

    #[test]
    fn follow_up_is_relative_to_due_time() {
        let mut s = Scheduler::new();
        s.schedule_in(1_000, 0u32);
        let mut seen = Vec::new();
        while let Some((_, n)) = s.pop_due(3_500) {
            seen.push(s.now_ms());
            if n < 5 {
                s.schedule_in(1_000, n + 1);
            }
        }
        assert_eq!(seen, vec![1_000, 2_000, 3_000]);
    }

    #[test]
    fn clock_never_goes_backwards() {
        let mut s: Scheduler<()> = Scheduler::new();
        s.advance_to(100);
        s.advance_to(50);
        assert_eq!(s.now_ms(), 100);
    }
}
