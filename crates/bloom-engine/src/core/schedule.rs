//! Cancellable one-shot and periodic tasks driven by simulated time.
//!
//! Activities never hold on to host timers. Each task is an owned
//! `TaskHandle`; cancelling it (or calling `cancel_all` on teardown)
//! guarantees the payload is never delivered afterwards.
//!
//! ```ignore
//! let mut timers: Scheduler<Tick> = Scheduler::new();
//! let countdown = timers.every(1.0, Tick::Second);
//! for task in timers.advance(dt) { /* handle */ }
//! timers.cancel(countdown);
//! ```

/// Slack for float drift when many fixed steps sum to a period.
const DUE_EPSILON: f32 = 1e-4;

/// Smallest accepted period; guards against a zero period spinning forever.
const MIN_PERIOD: f32 = 1e-3;

/// Owned handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u32);

#[derive(Debug, Clone)]
struct Entry<T> {
    handle: TaskHandle,
    remaining: f32,
    period: Option<f32>,
    task: T,
}

/// Timer wheel for a single activity.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    entries: Vec<Entry<T>>,
    next_id: u32,
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    fn push(&mut self, remaining: f32, period: Option<f32>, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.entries.push(Entry {
            handle,
            remaining: remaining.max(0.0),
            period,
            task,
        });
        handle
    }

    /// Deliver `task` once after `delay` seconds.
    pub fn once(&mut self, delay: f32, task: T) -> TaskHandle {
        self.push(delay, None, task)
    }

    /// Deliver `task` every `period` seconds until cancelled.
    pub fn every(&mut self, period: f32, task: T) -> TaskHandle {
        let period = period.max(MIN_PERIOD);
        self.push(period, Some(period), task)
    }

    /// Cancel a task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    /// Drop every pending task.
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance time and collect every task that came due, in scheduling order.
    /// A periodic task whose period fits several times into `dt` fires that many times.
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        let mut fired = Vec::new();
        self.entries.retain_mut(|entry| {
            entry.remaining -= dt;
            while entry.remaining <= DUE_EPSILON {
                fired.push(entry.task.clone());
                match entry.period {
                    Some(period) => entry.remaining += period,
                    None => return false,
                }
            }
            true
        });
        fired
    }
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
