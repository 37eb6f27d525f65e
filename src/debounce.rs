use std::time::{Duration, Instant};

/// Identifies one scheduled run. A handle stops being live as soon as the run fires,
/// is cancelled, or is superseded by a newer `schedule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Pending<T> {
    handle: TaskHandle,
    due: Instant,
    payload: T,
}

/// Trailing-edge debouncer driven by the caller's tick.
///
/// Scheduling replaces the pending payload and restarts the quiet period; nothing
/// accumulates. `poll_at` hands the payload back once the quiet period has elapsed.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    next_handle: u64,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_handle: 0,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_live(&self, handle: TaskHandle) -> bool {
        self.pending
            .as_ref()
            .map(|pending| pending.handle == handle)
            .unwrap_or(false)
    }

    pub fn schedule(&mut self, payload: T) -> TaskHandle {
        self.schedule_at(payload, Instant::now())
    }

    pub fn schedule_at(&mut self, payload: T, now: Instant) -> TaskHandle {
        self.next_handle = self.next_handle.wrapping_add(1);
        let handle = TaskHandle(self.next_handle);
        self.pending = Some(Pending {
            handle,
            due: now + self.delay,
            payload,
        });
        handle
    }

    /// Cancels the run only if `handle` is still the live one.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        if self.is_live(handle) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn cancel_all(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.payload)
    }

    pub fn poll(&mut self) -> Option<T> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> Option<T> {
        let ready = self
            .pending
            .as_ref()
            .map(|pending| now >= pending.due)
            .unwrap_or(false);
        if ready {
            self.cancel_all()
        } else {
            None
        }
    }

    /// Fires the pending run immediately, skipping the rest of the quiet period.
    pub fn flush(&mut self) -> Option<T> {
        self.cancel_all()
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|pending| pending.due.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn rapid_schedules_fire_once_with_latest_payload() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        let mut fired = Vec::new();

        debouncer.schedule_at("d", start);
        fired.extend(debouncer.poll_at(start + Duration::from_millis(50)));
        debouncer.schedule_at("dr", start + Duration::from_millis(100));
        fired.extend(debouncer.poll_at(start + Duration::from_millis(150)));
        debouncer.schedule_at("dre", start + Duration::from_millis(200));

        // Would have been due for the first keystroke, but the timer was reset.
        fired.extend(debouncer.poll_at(start + Duration::from_millis(350)));
        assert!(fired.is_empty());

        fired.extend(debouncer.poll_at(start + Duration::from_millis(500)));
        fired.extend(debouncer.poll_at(start + Duration::from_millis(900)));
        assert_eq!(fired, vec!["dre"]);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn superseded_handle_cannot_cancel_newer_run() {
        let now = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        let first = debouncer.schedule_at(1, now);
        let second = debouncer.schedule_at(2, now);
        assert!(!debouncer.is_live(first));
        assert!(!debouncer.cancel(first));
        assert!(debouncer.is_live(second));
        assert!(debouncer.cancel(second));
        assert_eq!(debouncer.poll_at(now + DELAY * 2), None);
    }

    #[test]
    fn flush_fires_immediately() {
        let now = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule_at("query", now);
        assert_eq!(debouncer.time_until_due(now), Some(DELAY));
        assert_eq!(debouncer.flush(), Some("query"));
        assert_eq!(debouncer.flush(), None);
    }

    #[test]
    fn zero_delay_is_due_on_next_poll() {
        let now = Instant::now();
        let mut debouncer = Debouncer::new(Duration::ZERO);
        debouncer.schedule_at('x', now);
        assert_eq!(debouncer.poll_at(now), Some('x'));
    }
}
