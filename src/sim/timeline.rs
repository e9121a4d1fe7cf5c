//! Timers and ordered timelines
//!
//! The core never sleeps. It asks a [`Scheduler`] to deliver a [`Cue`] after a
//! delay and keeps the returned handle in [`PendingTimers`] so that every
//! outstanding timer can be released at teardown.

use crate::error::TimelineError;

/// A delayed transition delivered back to the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Impact,
    CrackShrink,
    RevealContent,
    ShowMain,
    ShowCard,
    StartShake,
    EndShake,
    /// Start the n-th stat counter
    StatCounter(usize),
    /// Reveal the n-th skill bar
    SkillBar(usize),
}

/// Cancellation handle of a scheduled cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// One-shot wall-clock timers
pub trait Scheduler {
    fn schedule(&mut self, delay_ms: u32, cue: Cue) -> TimerHandle;
    /// Cancel a pending timer. Unknown or already-fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Handles of timers that have been scheduled but not yet delivered
#[derive(Debug, Default)]
pub struct PendingTimers {
    handles: Vec<TimerHandle>,
}

impl PendingTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, scheduler: &mut dyn Scheduler, delay_ms: u32, cue: Cue) {
        let handle = scheduler.schedule(delay_ms, cue);
        self.handles.push(handle);
    }

    /// Forget a delivered timer. Returns false if the handle isn't ours.
    pub fn settle(&mut self, handle: TimerHandle) -> bool {
        match self.handles.iter().position(|h| *h == handle) {
            Some(i) => {
                self.handles.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Cancel everything still outstanding
    pub fn cancel_all(&mut self, scheduler: &mut dyn Scheduler) {
        for handle in self.handles.drain(..) {
            scheduler.cancel(handle);
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Ordered (offset, cue) pairs relative to one epoch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    entries: Vec<(u32, Cue)>,
}

impl Timeline {
    /// Offsets must strictly increase
    pub fn new(entries: Vec<(u32, Cue)>) -> Result<Self, TimelineError> {
        if entries.is_empty() {
            return Err(TimelineError::Empty);
        }
        for (index, pair) in entries.windows(2).enumerate() {
            let (previous_ms, offset_ms) = (pair[0].0, pair[1].0);
            if offset_ms <= previous_ms {
                return Err(TimelineError::NotIncreasing {
                    index: index + 1,
                    previous_ms,
                    offset_ms,
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(u32, Cue)] {
        &self.entries
    }

    /// Schedule every entry relative to now
    pub fn schedule(&self, pending: &mut PendingTimers, scheduler: &mut dyn Scheduler) {
        for (offset, cue) in &self.entries {
            pending.schedule(scheduler, *offset, *cue);
        }
    }
}

/// A cue delivered by [`VirtualScheduler`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fired {
    pub handle: TimerHandle,
    pub cue: Cue,
    pub at_ms: f64,
}

#[derive(Debug, Clone)]
struct Entry {
    due_ms: f64,
    handle: TimerHandle,
    cue: Cue,
}

/// Deterministic scheduler on a manually advanced clock
///
/// Timers fire in due order; equal due times fire in scheduling order.
#[derive(Debug, Default)]
pub struct VirtualScheduler {
    now_ms: f64,
    next_id: u64,
    queue: Vec<Entry>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Move the clock forward without firing anything
    pub fn set_now(&mut self, now_ms: f64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pop the earliest timer due at or before `until_ms`, advancing the clock to it
    pub fn pop_due(&mut self, until_ms: f64) -> Option<Fired> {
        if self.queue.first()?.due_ms > until_ms {
            return None;
        }
        let entry = self.queue.remove(0);
        self.now_ms = self.now_ms.max(entry.due_ms);
        Some(Fired {
            handle: entry.handle,
            cue: entry.cue,
            at_ms: entry.due_ms,
        })
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&mut self, delay_ms: u32, cue: Cue) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let due_ms = self.now_ms + delay_ms as f64;
        // Insert after every entry due at or before this one (stable order)
        let at = self.queue.partition_point(|e| e.due_ms <= due_ms);
        self.queue.insert(at, Entry { due_ms, handle, cue });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.queue.retain(|e| e.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_requires_strictly_increasing_offsets() {
        assert!(Timeline::new(vec![(100, Cue::Impact), (200, Cue::CrackShrink)]).is_ok());
        assert_eq!(
            Timeline::new(vec![(100, Cue::Impact), (100, Cue::CrackShrink)]),
            Err(TimelineError::NotIncreasing {
                index: 1,
                previous_ms: 100,
                offset_ms: 100,
            })
        );
        assert_eq!(Timeline::new(vec![]), Err(TimelineError::Empty));
    }

    #[test]
    fn test_virtual_scheduler_fires_in_order() {
        let mut sched = VirtualScheduler::new();
        sched.schedule(2600, Cue::RevealContent);
        sched.schedule(1400, Cue::Impact);
        sched.schedule(1900, Cue::CrackShrink);

        let mut fired = Vec::new();
        while let Some(f) = sched.pop_due(10_000.0) {
            fired.push((f.at_ms, f.cue));
        }
        assert_eq!(
            fired,
            vec![
                (1400.0, Cue::Impact),
                (1900.0, Cue::CrackShrink),
                (2600.0, Cue::RevealContent),
            ]
        );
        assert_eq!(sched.now_ms(), 2600.0);
    }

    #[test]
    fn test_equal_due_times_keep_schedule_order() {
        let mut sched = VirtualScheduler::new();
        sched.schedule(0, Cue::SkillBar(0));
        sched.schedule(0, Cue::SkillBar(1));
        assert_eq!(sched.pop_due(0.0).map(|f| f.cue), Some(Cue::SkillBar(0)));
        assert_eq!(sched.pop_due(0.0).map(|f| f.cue), Some(Cue::SkillBar(1)));
    }

    #[test]
    fn test_pop_due_respects_horizon() {
        let mut sched = VirtualScheduler::new();
        sched.schedule(500, Cue::ShowMain);
        assert!(sched.pop_due(499.0).is_none());
        assert!(sched.pop_due(500.0).is_some());
    }

    #[test]
    fn test_cancel_all_releases_pending() {
        let mut sched = VirtualScheduler::new();
        let mut pending = PendingTimers::new();
        let timeline = Timeline::new(vec![(1, Cue::ShowCard), (2, Cue::StartShake)]).unwrap();
        timeline.schedule(&mut pending, &mut sched);
        assert_eq!(pending.len(), 2);
        assert_eq!(sched.pending(), 2);

        pending.cancel_all(&mut sched);
        assert!(pending.is_empty());
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_settle_only_known_handles() {
        let mut sched = VirtualScheduler::new();
        let mut pending = PendingTimers::new();
        pending.schedule(&mut sched, 10, Cue::EndShake);
        let fired = sched.pop_due(10.0).unwrap();
        assert!(pending.settle(fired.handle));
        assert!(!pending.settle(fired.handle));
    }
}
