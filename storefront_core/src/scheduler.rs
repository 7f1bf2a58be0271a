//! Virtual-clock timer queue used to drive telemetry sessions.
//!
//! Time only moves when the host calls [`TimerQueue::pop_due`] /
//! [`TimerQueue::settle`] (or the [`TimerQueue::advance`] shorthand), which keeps
//! every firing on the caller's thread and makes tests deterministic.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use serde::Serialize;

/// Shortest accepted repeat interval; shorter requests are raised to this.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerId(u64);

/// The clock/timer facility the core depends on.
pub trait Scheduler<T> {
    fn now(&self) -> Duration;

    /// Fire `payload` once after `delay`.
    fn schedule_once(&mut self, delay: Duration, payload: T) -> TimerId;

    /// Fire `payload` every `interval`, starting one interval from now.
    fn schedule_every(&mut self, interval: Duration, payload: T) -> TimerId;

    /// Cancel a timer. Unknown or already-finished ids are ignored; returns
    /// whether a pending timer was removed.
    fn cancel(&mut self, id: TimerId) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FiredTimer<T> {
    pub id: TimerId,
    pub at: Duration,
    pub payload: T,
}

#[derive(Debug)]
struct PendingTimer<T> {
    payload: T,
    due: Duration,
    every: Option<Duration>,
    sequence: u64,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    now: Duration,
    next_id: u64,
    next_sequence: u64,
    queue: BinaryHeap<Reverse<(Duration, u64, TimerId)>>,
    pending: HashMap<TimerId, PendingTimer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_sequence: 0,
            queue: BinaryHeap::new(),
            pending: HashMap::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.pending.values().map(|timer| timer.due).min()
    }

    /// Moves the clock forward to `until` once every due timer has been popped.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    fn insert(&mut self, due: Duration, every: Option<Duration>, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let sequence = self.push(due, id);
        self.pending.insert(
            id,
            PendingTimer {
                payload,
                due,
                every,
                sequence,
            },
        );
        id
    }

    fn push(&mut self, due: Duration, id: TimerId) -> u64 {
        let sequence = self.fresh_sequence();
        self.queue.push(Reverse((due, sequence, id)));
        sequence
    }

    fn fresh_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Re-arms `id` at `due`, or parks it when the clock cannot represent its
    /// next firing. A parked timer stays pending and cancelable but never fires.
    fn rearm(&mut self, id: TimerId, due: Option<Duration>) {
        let (due, sequence) = match due {
            Some(due) => (due, self.push(due, id)),
            None => (Duration::MAX, self.fresh_sequence()),
        };
        if let Some(timer) = self.pending.get_mut(&id) {
            timer.due = due;
            timer.sequence = sequence;
        }
    }

    /// Drops the backlog of every repeating timer due at or before `until`,
    /// moving it to its first slot after `until`.
    pub fn skip_missed(&mut self, until: Duration) {
        let behind: Vec<(TimerId, Option<Duration>)> = self
            .pending
            .iter()
            .filter(|(_, timer)| timer.due <= until)
            .filter_map(|(id, timer)| {
                let interval = timer.every?;
                Some((*id, first_slot_after(timer.due, interval, until)))
            })
            .collect();
        for (id, due) in behind {
            self.rearm(id, due);
        }
    }
}

fn first_slot_after(due: Duration, interval: Duration, until: Duration) -> Option<Duration> {
    let interval = interval.as_nanos();
    let missed = (until - due).as_nanos() / interval + 1;
    let nanos = interval
        .checked_mul(missed)?
        .checked_add(due.as_nanos())?;
    let secs = u64::try_from(nanos / 1_000_000_000).ok()?;
    Some(Duration::new(secs, (nanos % 1_000_000_000) as u32))
}

impl<T: Clone> TimerQueue<T> {
    /// Pops the earliest timer due at or before `until`, advancing the clock to
    /// its due time. Repeating timers are re-armed before being returned, so a
    /// caller looping on this sees every firing in order, including timers
    /// scheduled while handling earlier ones.
    pub fn pop_due(&mut self, until: Duration) -> Option<FiredTimer<T>> {
        while let Some(Reverse((due, sequence, id))) = self.queue.peek().copied() {
            if due > until {
                return None;
            }
            self.queue.pop();

            let Some(timer) = self.pending.get(&id) else {
                continue;
            };
            if timer.sequence != sequence {
                continue;
            }

            self.now = self.now.max(due);
            let every = timer.every;
            let payload = match every {
                Some(interval) => {
                    let payload = timer.payload.clone();
                    self.rearm(id, due.checked_add(interval));
                    payload
                }
                None => match self.pending.remove(&id) {
                    Some(timer) => timer.payload,
                    None => continue,
                },
            };
            return Some(FiredTimer {
                id,
                at: due,
                payload,
            });
        }
        None
    }

    /// Advances the clock by `delta` and returns every timer that fired.
    pub fn advance(&mut self, delta: Duration) -> Vec<FiredTimer<T>> {
        let until = self.now.saturating_add(delta);
        let mut fired = Vec::new();
        while let Some(timer) = self.pop_due(until) {
            fired.push(timer);
        }
        self.settle(until);
        fired
    }
}

impl<T> Scheduler<T> for TimerQueue<T> {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule_once(&mut self, delay: Duration, payload: T) -> TimerId {
        let due = self.now.saturating_add(delay);
        self.insert(due, None, payload)
    }

    fn schedule_every(&mut self, interval: Duration, payload: T) -> TimerId {
        let interval = interval.max(MIN_INTERVAL);
        let due = self.now.saturating_add(interval);
        self.insert(due, Some(interval), payload)
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id).is_some()
    }
}
