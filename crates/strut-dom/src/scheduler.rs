//! Scheduler
//!
//! Host timing primitives: timeouts, intervals and animation frames.
//! The host pumps `run_ready`/`run_frame` from its event loop.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Timeout/interval handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Animation frame handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

struct Timer {
    delay: Duration,
    repeat: bool,
    scheduled_at: Instant,
    /// Taken out while the callback runs so it can reschedule freely
    callback: Option<Box<dyn FnMut()>>,
}

#[derive(Default)]
struct SchedulerInner {
    next_id: u64,
    timers: HashMap<TimerId, Timer>,
    frames: Vec<(FrameId, Box<dyn FnOnce(f64)>)>,
}

/// Shared scheduler handle
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a one-shot timeout
    pub fn set_timeout(&self, delay_ms: u64, callback: impl FnOnce() + 'static) -> TimerId {
        let mut callback = Some(callback);
        self.insert_timer(delay_ms, false, Box::new(move || {
            if let Some(cb) = callback.take() {
                cb();
            }
        }))
    }

    /// Schedule a repeating interval
    pub fn set_interval(&self, delay_ms: u64, callback: impl FnMut() + 'static) -> TimerId {
        self.insert_timer(delay_ms, true, Box::new(callback))
    }

    fn insert_timer(&self, delay_ms: u64, repeat: bool, callback: Box<dyn FnMut()>) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = TimerId(inner.next_id);
        inner.timers.insert(
            id,
            Timer {
                delay: Duration::from_millis(delay_ms),
                repeat,
                scheduled_at: Instant::now(),
                callback: Some(callback),
            },
        );
        id
    }

    /// Cancel a timeout or interval. Unknown ids are ignored.
    pub fn clear(&self, id: TimerId) {
        self.inner.borrow_mut().timers.remove(&id);
    }

    /// Check if a timer is still scheduled
    pub fn has_timer(&self, id: TimerId) -> bool {
        self.inner.borrow().timers.contains_key(&id)
    }

    /// Number of scheduled timers
    pub fn timer_count(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Queue an animation frame callback
    pub fn request_frame(&self, callback: impl FnOnce(f64) + 'static) -> FrameId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = FrameId(inner.next_id);
        inner.frames.push((id, Box::new(callback)));
        id
    }

    /// Cancel a queued frame callback. Unknown ids are ignored.
    pub fn cancel_frame(&self, id: FrameId) {
        self.inner.borrow_mut().frames.retain(|(fid, _)| *fid != id);
    }

    /// Check if a frame callback is still queued
    pub fn has_frame(&self, id: FrameId) -> bool {
        self.inner.borrow().frames.iter().any(|(fid, _)| *fid == id)
    }

    /// Number of queued frame callbacks
    pub fn frame_count(&self) -> usize {
        self.inner.borrow().frames.len()
    }

    /// Fire every due timer. One-shot timers are removed before their
    /// callback runs; intervals are rescheduled from now. Callbacks may
    /// schedule or cancel timers freely.
    pub fn run_ready(&self) {
        let now = Instant::now();
        let due: Vec<TimerId> = {
            let inner = self.inner.borrow();
            inner
                .timers
                .iter()
                .filter(|(_, t)| now.duration_since(t.scheduled_at) >= t.delay)
                .map(|(id, _)| *id)
                .collect()
        };

        for id in due {
            let (repeat, callback) = {
                let mut inner = self.inner.borrow_mut();
                let Some(timer) = inner.timers.get_mut(&id) else {
                    continue; // cancelled by an earlier callback
                };
                let repeat = timer.repeat;
                let callback = timer.callback.take();
                if repeat {
                    timer.scheduled_at = now;
                } else {
                    inner.timers.remove(&id);
                }
                (repeat, callback)
            };

            let Some(mut callback) = callback else { continue };
            callback();

            if repeat {
                let mut inner = self.inner.borrow_mut();
                if let Some(timer) = inner.timers.get_mut(&id) {
                    timer.callback = Some(callback);
                }
            }
        }
    }

    /// Drain the frame queue, invoking each callback with `timestamp`
    pub fn run_frame(&self, timestamp: f64) {
        let frames = std::mem::take(&mut self.inner.borrow_mut().frames);
        for (_, callback) in frames {
            callback(timestamp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_timeout_fires_once() {
        let scheduler = Scheduler::new();
        let count = Rc::new(RefCell::new(0));

        let c = count.clone();
        let id = scheduler.set_timeout(0, move || *c.borrow_mut() += 1);

        scheduler.run_ready();
        scheduler.run_ready();

        assert_eq!(*count.borrow(), 1);
        assert!(!scheduler.has_timer(id));
    }

    #[test]
    fn test_clear_prevents_firing() {
        let scheduler = Scheduler::new();
        let count = Rc::new(RefCell::new(0));

        let c = count.clone();
        let id = scheduler.set_timeout(0, move || *c.borrow_mut() += 1);
        scheduler.clear(id);
        scheduler.run_ready();

        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_interval_repeats_until_cleared() {
        let scheduler = Scheduler::new();
        let count = Rc::new(RefCell::new(0));

        let c = count.clone();
        let id = scheduler.set_interval(0, move || *c.borrow_mut() += 1);

        scheduler.run_ready();
        scheduler.run_ready();
        assert_eq!(*count.borrow(), 2);
        assert!(scheduler.has_timer(id));

        scheduler.clear(id);
        scheduler.run_ready();
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_callback_may_schedule() {
        let scheduler = Scheduler::new();
        let fired = Rc::new(RefCell::new(false));

        let s = scheduler.clone();
        let f = fired.clone();
        scheduler.set_timeout(0, move || {
            let f = f.clone();
            s.set_timeout(0, move || *f.borrow_mut() = true);
        });

        scheduler.run_ready();
        assert!(!*fired.borrow()); // inner timer not due in the same pass snapshot
        scheduler.run_ready();
        assert!(*fired.borrow());
    }

    #[test]
    fn test_frames_drain() {
        let scheduler = Scheduler::new();
        let stamps = Rc::new(RefCell::new(Vec::new()));

        let s = stamps.clone();
        scheduler.request_frame(move |ts| s.borrow_mut().push(ts));
        let cancelled = scheduler.request_frame(|_ts| panic!("cancelled frame ran"));
        scheduler.cancel_frame(cancelled);

        scheduler.run_frame(16.0);
        scheduler.run_frame(32.0);

        assert_eq!(*stamps.borrow(), vec![16.0]);
        assert_eq!(scheduler.frame_count(), 0);
    }
}
