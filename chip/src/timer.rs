use std::time::{Duration, Instant};

/// Counts how many fixed intervals elapsed since it was last asked, so that a single threaded
/// loop can run the cpu and the timers at their own rates.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    /// the point in time up to which all ticks were handed out
    last: Instant,
}

impl Ticker {
    /// The most ticks handed out at once, if the loop fell further behind the rest is dropped.
    pub const MAX_CATCH_UP: u32 = 64;

    /// Will create a new ticker with the given rate, starting at `now`.
    pub fn new(hertz: u32, now: Instant) -> Self {
        Self {
            interval: Self::interval_of(hertz),
            last: now,
        }
    }

    /// The time between two ticks at the given rate, zero hertz is treated as one.
    pub fn interval_of(hertz: u32) -> Duration {
        Duration::from_nanos((1_000_000_000 / hertz.max(1) as u64).max(1))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Will restart the counting at `now`.
    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    /// Returns the amount of ticks that are due at `now` and marks them as handed out.
    pub fn due(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last);
        let ticks = (elapsed.as_nanos() / self.interval.as_nanos()) as u64;

        if ticks > Self::MAX_CATCH_UP as u64 {
            log::warn!("fell behind, dropping {} ticks", ticks - Self::MAX_CATCH_UP as u64);
            self.last = now;
            return Self::MAX_CATCH_UP;
        }

        self.last += self.interval * ticks as u32;
        ticks as u32
    }

    /// The point in time where the next tick will be due.
    pub fn next_deadline(&self) -> Instant {
        self.last + self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::timer;

    #[test]
    fn test_interval() {
        assert_eq!(Duration::from_millis(2), Ticker::interval_of(500));
        assert_eq!(Duration::from_secs(1), Ticker::interval_of(0));
    }

    #[test]
    fn test_due() {
        let start = Instant::now();
        let mut ticker = Ticker::new(timer::HERTZ, start);
        let interval = ticker.interval();

        assert_eq!(0, ticker.due(start));
        assert_eq!(0, ticker.due(start + interval / 2));
        assert_eq!(1, ticker.due(start + interval));
        // the remainder is kept for the next call
        assert_eq!(2, ticker.due(start + interval * 3 + interval / 2));
        assert_eq!(1, ticker.due(start + interval * 4));
        assert_eq!(start + interval * 5, ticker.next_deadline());
    }

    #[test]
    fn test_due_full_second() {
        let start = Instant::now();
        let mut ticker = Ticker::new(timer::HERTZ, start);
        assert_eq!(timer::HERTZ, ticker.due(start + Duration::from_secs(1)));
    }

    #[test]
    fn test_catch_up_limit() {
        let start = Instant::now();
        let mut ticker = Ticker::new(1000, start);
        let later = start + Duration::from_secs(10);

        assert_eq!(Ticker::MAX_CATCH_UP, ticker.due(later));
        assert_eq!(0, ticker.due(later));
    }

    #[test]
    fn test_time_going_backwards() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut ticker = Ticker::new(60, start);
        assert_eq!(0, ticker.due(start - Duration::from_millis(500)));
    }
}
