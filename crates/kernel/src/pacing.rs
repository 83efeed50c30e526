use std::time::{Duration, Instant};

use serde::Serialize;

/// Which interval feeds the camera as delta-time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DeltaMode {
    /// Work plus sleep: the full loop period. Speeds are per wall-clock second.
    #[default]
    FrameTime,
    /// Work only, excluding the pacer's sleep.
    WorkTime,
}

/// Monotonic clock, measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// `Instant`-backed clock starting at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Timing of one completed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub work: Duration,
    pub slept: Option<Duration>,
    pub frame: Duration,
    /// Seconds handed to the next update.
    pub delta: f32,
}

/// Longest delta handed to the update. A stall (window drag, breakpoint)
/// should not teleport the camera.
const MAX_DELTA: f32 = 0.1;

/// Sleep-based pacer holding each loop iteration near a target duration.
#[derive(Debug)]
pub struct FramePacer {
    target: Duration,
    mode: DeltaMode,
    frame_start: Option<Duration>,
    last_end: Option<Duration>,
    delta: f32,
    timer: FrameTimer,
}

impl FramePacer {
    pub fn new(target_fps: f32, mode: DeltaMode) -> Self {
        let fps = if target_fps.is_finite() && target_fps > 0.0 {
            target_fps
        } else {
            60.0
        };
        let target = Duration::from_nanos((1e9 / f64::from(fps)).round() as u64);
        Self {
            target,
            mode,
            frame_start: None,
            last_end: None,
            delta: target.as_secs_f32(),
            timer: FrameTimer::new(120),
        }
    }

    pub fn target_frame_time(&self) -> Duration {
        self.target
    }

    pub fn mode(&self) -> DeltaMode {
        self.mode
    }

    /// Sleep needed after `work`, floored to whole milliseconds. `None` once
    /// the frame has used its whole budget.
    pub fn sleep_request(&self, work: Duration) -> Option<Duration> {
        if work >= self.target {
            return None;
        }
        let remaining = self.target - work;
        Some(Duration::from_millis(remaining.as_millis() as u64))
    }

    pub fn begin_frame(&mut self, clock: &impl Clock) {
        self.frame_start = Some(clock.now());
    }

    /// Measure the work since `begin_frame`, sleep off the remainder and
    /// compute the delta for the next update.
    pub fn end_frame(&mut self, clock: &impl Clock, sleeper: &mut impl Sleeper) -> FrameTiming {
        let work_end = clock.now();
        let start = self.frame_start.take().unwrap_or(work_end);
        let work = work_end.saturating_sub(start);

        let slept = self.sleep_request(work);
        if let Some(duration) = slept.filter(|d| !d.is_zero()) {
            sleeper.sleep(duration);
        }
        let end = clock.now();

        let frame = match self.last_end {
            Some(previous) => end.saturating_sub(previous),
            None => end.saturating_sub(start),
        };
        self.last_end = Some(end);
        self.timer.record(frame);

        let measured = match self.mode {
            DeltaMode::FrameTime => frame,
            DeltaMode::WorkTime => work,
        };
        self.delta = measured.as_secs_f32().min(MAX_DELTA);

        tracing::trace!(
            work_us = work.as_micros() as u64,
            frame_us = frame.as_micros() as u64,
            delta = self.delta,
            "frame paced"
        );

        FrameTiming {
            work,
            slept,
            frame,
            delta: self.delta,
        }
    }

    /// Seconds for the next update. Before the first frame completes this is
    /// the target frame time.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }
}

/// Ring buffer of recent frame durations.
#[derive(Debug)]
pub struct FrameTimer {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    fn samples(&self) -> &[Duration] {
        &self.history[..self.count()]
    }

    pub fn average(&self) -> Duration {
        let samples = self.samples();
        if samples.is_empty() {
            return Duration::ZERO;
        }
        samples.iter().sum::<Duration>() / samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.samples().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.samples().iter().copied().min().unwrap_or(Duration::ZERO)
    }

    /// Frames per second from the average, zero with no samples.
    pub fn fps(&self) -> f32 {
        let avg = self.average().as_secs_f32();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    pub fn count(&self) -> usize {
        if self.filled {
            self.capacity
        } else {
            self.index
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Manually advanced clock; the sleeper advances it too.
    #[derive(Clone, Default)]
    struct FakeClock(Rc<Cell<Duration>>);

    impl FakeClock {
        fn advance(&self, d: Duration) {
            self.0.set(self.0.get() + d);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Duration {
            self.0.get()
        }
    }

    struct FakeSleeper {
        clock: FakeClock,
        calls: Vec<Duration>,
    }

    impl Sleeper for FakeSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.calls.push(duration);
            self.clock.advance(duration);
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn sleep_fills_remaining_budget() {
        let pacer = FramePacer::new(60.0, DeltaMode::FrameTime);
        // 16.666ms - 5ms = 11.666ms, floored
        assert_eq!(pacer.sleep_request(ms(5)), Some(ms(11)));
        assert_eq!(pacer.sleep_request(Duration::ZERO), Some(ms(16)));
    }

    #[test]
    fn no_sleep_when_over_budget() {
        let pacer = FramePacer::new(60.0, DeltaMode::FrameTime);
        assert_eq!(pacer.sleep_request(ms(17)), None);
        assert_eq!(pacer.sleep_request(pacer.target_frame_time()), None);
        assert_eq!(pacer.sleep_request(ms(500)), None);
    }

    #[test]
    fn sleep_request_matches_target_minus_work() {
        let pacer = FramePacer::new(50.0, DeltaMode::FrameTime);
        for work in 0..20 {
            let request = pacer.sleep_request(ms(work)).map(|d| d.as_millis());
            assert_eq!(request, Some(u128::from(20 - work)));
        }
    }

    #[test]
    fn end_frame_sleeps_and_reports_frame_time() {
        let clock = FakeClock::default();
        let mut sleeper = FakeSleeper {
            clock: clock.clone(),
            calls: Vec::new(),
        };
        let mut pacer = FramePacer::new(50.0, DeltaMode::FrameTime);

        pacer.begin_frame(&clock);
        clock.advance(ms(5));
        let timing = pacer.end_frame(&clock, &mut sleeper);

        assert_eq!(sleeper.calls, vec![ms(15)]);
        assert_eq!(timing.work, ms(5));
        assert_eq!(timing.frame, ms(20));
        assert!((timing.delta - 0.020).abs() < 1e-6);
    }

    #[test]
    fn work_time_mode_excludes_sleep() {
        let clock = FakeClock::default();
        let mut sleeper = FakeSleeper {
            clock: clock.clone(),
            calls: Vec::new(),
        };
        let mut pacer = FramePacer::new(50.0, DeltaMode::WorkTime);

        pacer.begin_frame(&clock);
        clock.advance(ms(5));
        let timing = pacer.end_frame(&clock, &mut sleeper);
        assert!((timing.delta - 0.005).abs() < 1e-6);
    }

    #[test]
    fn slow_frame_is_not_paced_and_delta_is_capped() {
        let clock = FakeClock::default();
        let mut sleeper = FakeSleeper {
            clock: clock.clone(),
            calls: Vec::new(),
        };
        let mut pacer = FramePacer::new(60.0, DeltaMode::FrameTime);

        pacer.begin_frame(&clock);
        clock.advance(ms(400));
        let timing = pacer.end_frame(&clock, &mut sleeper);
        assert!(sleeper.calls.is_empty());
        assert_eq!(timing.slept, None);
        assert_eq!(timing.delta, MAX_DELTA);
    }

    #[test]
    fn initial_delta_is_target() {
        let pacer = FramePacer::new(60.0, DeltaMode::FrameTime);
        assert!((pacer.delta() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn frame_timer_tracks_stats() {
        let mut timer = FrameTimer::new(4);
        assert_eq!(timer.count(), 0);
        assert_eq!(timer.fps(), 0.0);
        for n in [10, 20, 30] {
            timer.record(ms(n));
        }
        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), ms(20));
        assert_eq!(timer.min(), ms(10));
        assert_eq!(timer.max(), ms(30));
        assert!((timer.fps() - 50.0).abs() < 0.01);
    }

    #[test]
    fn frame_timer_wraps() {
        let mut timer = FrameTimer::new(2);
        for n in [100, 10, 20] {
            timer.record(ms(n));
        }
        assert_eq!(timer.count(), 2);
        assert_eq!(timer.max(), ms(20));
    }
}
