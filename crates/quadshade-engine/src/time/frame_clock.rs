use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of recent frame deltas averaged by [`FrameClock::fps`].
pub const FPS_WINDOW: usize = 10;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds (clamped).
    pub dt: f32,

    /// Seconds since the clock was created. Never decreases.
    pub elapsed: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped to avoid pathological values when the application is paused
/// by the debugger, minimized, or stalls. The FPS average uses the raw deltas.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
    recent: VecDeque<Duration>,
}

impl FrameClock {
    /// Creates a new clock with default clamps, starting now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Creates a clock whose elapsed time is measured from `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last: start,
            frame_index: 0,
            dt_min: Duration::from_micros(100), // 0.0001s
            dt_max: Duration::from_millis(250), // 0.25s
            recent: VecDeque::with_capacity(FPS_WINDOW),
        }
    }

    /// Seconds since the clock started.
    pub fn elapsed(&self) -> f32 {
        self.elapsed_at(Instant::now())
    }

    /// Seconds between the clock start and `now`, saturating at zero.
    pub fn elapsed_at(&self, now: Instant) -> f32 {
        now.max(self.last)
            .saturating_duration_since(self.start)
            .as_secs_f32()
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    ///
    /// A `now` earlier than the previous tick is treated as the previous tick.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let now = now.max(self.last);
        let raw = now.saturating_duration_since(self.last);

        if self.recent.len() == FPS_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(raw);

        let dt = raw.clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: self.elapsed_at(now),
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }

    /// Average frames per second over the last [`FPS_WINDOW`] ticks.
    ///
    /// Returns `0.0` until a non-zero delta has been recorded.
    pub fn fps(&self) -> f32 {
        let total: Duration = self.recent.iter().sum();
        if total.is_zero() {
            return 0.0;
        }
        self.recent.len() as f32 / total.as_secs_f32()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    // ── elapsed ───────────────────────────────────────────────────────────

    #[test]
    fn elapsed_tracks_ticks() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let ft = clock.tick_at(t0 + ms(1500));
        assert!((ft.elapsed - 1.5).abs() < 1e-6);
        assert_eq!(ft.frame_index, 0);
        assert_eq!(clock.tick_at(t0 + ms(1600)).frame_index, 1);
    }

    #[test]
    fn elapsed_never_decreases_when_time_goes_backwards() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let a = clock.tick_at(t0 + ms(200));
        let b = clock.tick_at(t0 + ms(100));
        assert!(b.elapsed >= a.elapsed);
        assert_eq!(clock.elapsed_at(t0), a.elapsed);
    }

    // ── dt clamps ─────────────────────────────────────────────────────────

    #[test]
    fn dt_is_clamped_to_max_after_stall() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let ft = clock.tick_at(t0 + Duration::from_secs(5));
        assert!((ft.dt - 0.25).abs() < 1e-6);
        // Elapsed time is not clamped.
        assert!((ft.elapsed - 5.0).abs() < 1e-6);
    }

    #[test]
    fn dt_is_clamped_to_min_for_zero_delta() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let ft = clock.tick_at(t0);
        assert!((ft.dt - 0.0001).abs() < 1e-7);
    }

    // ── fps ───────────────────────────────────────────────────────────────

    #[test]
    fn fps_is_zero_before_first_tick() {
        assert_eq!(FrameClock::new().fps(), 0.0);
    }

    #[test]
    fn fps_averages_recent_deltas() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let mut t = t0;
        for _ in 0..4 {
            t += ms(20);
            clock.tick_at(t);
        }
        assert!((clock.fps() - 50.0).abs() < 0.01);
    }

    #[test]
    fn fps_only_keeps_the_last_window() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let mut t = t0;
        // A slow start that must fall out of the window.
        for _ in 0..5 {
            t += ms(100);
            clock.tick_at(t);
        }
        for _ in 0..FPS_WINDOW {
            t += ms(10);
            clock.tick_at(t);
        }
        assert!((clock.fps() - 100.0).abs() < 0.01);
    }
}
