// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

/// Opens at most once per `interval`; ticks in between are skipped rather
/// than queued.
#[derive(Clone, Debug)]
pub struct FrameGate {
    interval: Duration,
    last: Option<Instant>,
}

impl FrameGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn from_fps(fps: f64) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / fps.max(f64::MIN_POSITIVE)))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// How long the caller may block on input before the gate opens.
    pub fn until_next(&self, now: Instant) -> Duration {
        match self.last {
            Some(last) => (last + self.interval).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }
}

/// Milliseconds since start, not counting time spent paused.
#[derive(Clone, Debug)]
pub struct Clock {
    start: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl Clock {
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            paused_at: None,
            paused_total: Duration::ZERO,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn toggle_pause(&mut self, now: Instant) {
        match self.paused_at.take() {
            Some(at) => self.paused_total += now.saturating_duration_since(at),
            None => self.paused_at = Some(now),
        }
    }

    pub fn elapsed_ms(&self, now: Instant) -> f64 {
        let end = self.paused_at.unwrap_or(now);
        end.saturating_duration_since(self.start)
            .saturating_sub(self.paused_total)
            .as_secs_f64()
            * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn gate_opens_once_per_interval() {
        let t0 = Instant::now();
        let mut g = FrameGate::new(ms(50));
        assert!(g.ready(t0));
        assert!(!g.ready(t0 + ms(10)));
        assert!(!g.ready(t0 + ms(49)));
        assert!(g.ready(t0 + ms(50)));
        assert!(!g.ready(t0 + ms(99)));
        assert!(g.ready(t0 + ms(130)));
    }

    #[test]
    fn gate_cadence_over_a_second() {
        let t0 = Instant::now();
        let mut g = FrameGate::new(ms(33));
        let opened = (0..1000).filter(|i| g.ready(t0 + ms(*i))).count();
        assert_eq!(opened, 31);
    }

    #[test]
    fn until_next_counts_down() {
        let t0 = Instant::now();
        let mut g = FrameGate::from_fps(20.0);
        assert_eq!(g.until_next(t0), Duration::ZERO);
        g.ready(t0);
        assert_eq!(g.until_next(t0 + ms(20)), ms(30));
        assert_eq!(g.until_next(t0 + ms(80)), Duration::ZERO);
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn paused_time_is_excluded() {
        let t0 = Instant::now();
        let mut c = Clock::new(t0);
        assert!(approx(c.elapsed_ms(t0 + ms(100)), 100.0));
        c.toggle_pause(t0 + ms(100));
        assert!(c.is_paused());
        assert!(approx(c.elapsed_ms(t0 + ms(400)), 100.0));
        c.toggle_pause(t0 + ms(500));
        assert!(!c.is_paused());
        assert!(approx(c.elapsed_ms(t0 + ms(600)), 200.0));
    }
}
