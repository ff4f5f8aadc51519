//! Single-threaded delayed task queue on a virtual clock.
//!
//! The embedder advances the clock; due tasks come out in `(due, sequence)`
//! order, so tasks posted for the same instant run first-in first-out.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

struct PendingTask<T> {
    due: Duration,
    seq: u64,
    task: T,
}

pub struct TaskQueue<T> {
    now: Duration,
    next_seq: u64,
    pending: Vec<PendingTask<T>>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn post(&mut self, task: T) -> TaskHandle {
        self.post_delayed(task, Duration::ZERO)
    }

    pub fn post_delayed(&mut self, task: T, delay: Duration) -> TaskHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(PendingTask {
            due: self.now + delay,
            seq,
            task,
        });
        TaskHandle(seq)
    }

    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|pending| pending.seq != handle.0);
        before != self.pending.len()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|pending| pending.seq == handle.0)
    }

    /// Removes and returns the earliest task due at or before `until`,
    /// moving the clock to its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, pending)| pending.due <= until)
            .min_by_key(|(_, pending)| (pending.due, pending.seq))
            .map(|(idx, _)| idx)?;
        let pending = self.pending.swap_remove(idx);
        if pending.due > self.now {
            self.now = pending.due;
        }
        Some(pending.task)
    }

    pub fn advance_clock_to(&mut self, until: Duration) {
        if until > self.now {
            self.now = until;
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut TaskQueue<&'static str>, until: Duration) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(task) = queue.pop_due(until) {
            out.push(task);
        }
        queue.advance_clock_to(until);
        out
    }

    #[test]
    fn due_tasks_run_in_time_then_post_order() {
        let mut queue = TaskQueue::new();
        queue.post_delayed("late", Duration::from_millis(20));
        queue.post("first");
        queue.post_delayed("early", Duration::from_millis(5));
        queue.post("second");
        assert_eq!(
            drain(&mut queue, Duration::from_millis(10)),
            vec!["first", "second", "early"]
        );
        assert_eq!(queue.now(), Duration::from_millis(10));
        assert_eq!(drain(&mut queue, Duration::from_millis(30)), vec!["late"]);
    }

    #[test]
    fn cancelled_tasks_never_run() {
        let mut queue = TaskQueue::new();
        let handle = queue.post_delayed("blink", Duration::from_millis(500));
        assert!(queue.is_pending(handle));
        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        assert!(drain(&mut queue, Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn delays_are_relative_to_the_current_clock() {
        let mut queue = TaskQueue::new();
        queue.advance_clock_to(Duration::from_millis(100));
        queue.post_delayed("tick", Duration::from_millis(15));
        assert!(drain(&mut queue, Duration::from_millis(110)).is_empty());
        assert_eq!(drain(&mut queue, Duration::from_millis(115)), vec!["tick"]);
    }
}
