use rand::Rng;
use sandscape_input::{InputEvent, InputQueue, InputState};
use sandscape_kernel::{Clock, FramePacer, FrameReport, FrameTiming, Scene, Sleeper};

/// How one pass through the loop ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Quit was requested; nothing was updated.
    Quit,
    /// The frame was updated, handed to the renderer and paced.
    Paced {
        report: FrameReport,
        timing: FrameTiming,
    },
}

/// Input, scene and pacing state owned by the window loop.
///
/// Every frame that updates the scene also goes through the pacer, whatever
/// the renderer did with it.
pub struct FrameDriver<C, S, R> {
    scene: Scene,
    queue: InputQueue,
    input: InputState,
    pacer: FramePacer,
    clock: C,
    sleeper: S,
    rng: R,
    show_overlay: bool,
}

impl<C: Clock, S: Sleeper, R: Rng> FrameDriver<C, S, R> {
    pub fn new(scene: Scene, clock: C, sleeper: S, rng: R) -> Self {
        let pacing = &scene.config().pacing;
        let pacer = FramePacer::new(pacing.target_fps, pacing.delta_mode);
        Self {
            scene,
            queue: InputQueue::new(),
            input: InputState::new(),
            pacer,
            clock,
            sleeper,
            rng,
            show_overlay: false,
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.queue.push(event);
    }

    /// Apply what is queued, then release every held intent. Presses of
    /// quit and the overlay toggle still take effect next frame.
    pub fn focus_lost(&mut self) {
        self.input.drain_from(&mut self.queue);
        self.input.clear();
    }

    /// Drain input, update, hand the frame to `render`, then pace.
    pub fn run_frame(&mut self, render: impl FnOnce(&Self)) -> FrameOutcome {
        self.pacer.begin_frame(&self.clock);

        self.input.drain_from(&mut self.queue);
        if self.input.take_debug_toggle() {
            self.show_overlay = !self.show_overlay;
            tracing::debug!(visible = self.show_overlay, "overlay toggled");
        }
        if self.input.quit_requested() {
            return FrameOutcome::Quit;
        }

        let report = self
            .scene
            .update(&self.input, self.pacer.delta(), &mut self.rng);
        if !report.flicker.lit {
            tracing::trace!(frame = report.frame, "point lights out");
        }

        render(self);

        let timing = self.pacer.end_frame(&self.clock, &mut self.sleeper);
        FrameOutcome::Paced { report, timing }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    pub fn show_overlay(&self) -> bool {
        self.show_overlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use sandscape_input::Intent;
    use sandscape_kernel::SceneConfig;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

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

    #[derive(Clone)]
    struct FakeSleeper {
        clock: FakeClock,
        calls: Rc<RefCell<Vec<Duration>>>,
    }

    impl Sleeper for FakeSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.calls.borrow_mut().push(duration);
            self.clock.advance(duration);
        }
    }

    fn driver() -> (
        FrameDriver<FakeClock, FakeSleeper, StdRng>,
        FakeClock,
        Rc<RefCell<Vec<Duration>>>,
    ) {
        let clock = FakeClock::default();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sleeper = FakeSleeper {
            clock: clock.clone(),
            calls: calls.clone(),
        };
        let scene = Scene::new(SceneConfig::desert());
        let driver = FrameDriver::new(scene, clock.clone(), sleeper, StdRng::seed_from_u64(3));
        (driver, clock, calls)
    }

    #[test]
    fn skipped_render_is_still_paced() {
        let (mut driver, clock, calls) = driver();
        driver.push(InputEvent::pressed(Intent::MoveForward));

        // Renderer bails out (surface lost) after 2 ms of work.
        let outcome = driver.run_frame(|_| clock.advance(Duration::from_millis(2)));

        let FrameOutcome::Paced { timing, .. } = outcome else {
            panic!("frame was not paced: {outcome:?}");
        };
        assert_eq!(timing.work, Duration::from_millis(2));
        assert_eq!(calls.borrow().as_slice(), &[Duration::from_millis(14)]);
        assert!(timing.frame >= Duration::from_millis(16));
    }

    #[test]
    fn repeated_skips_keep_wall_clock_speed() {
        let (mut driver, clock, _calls) = driver();
        driver.push(InputEvent::pressed(Intent::MoveForward));
        let start = driver.scene().camera().position();

        let frames = 60;
        for _ in 0..frames {
            driver.run_frame(|_| {});
        }

        let travelled = (driver.scene().camera().position() - start).length();
        let seconds = clock.now().as_secs_f32();
        let speed = driver.scene().camera().move_speed();
        // One frame of lag between measurement and use, nothing more.
        assert!(travelled <= speed * (seconds + 1.0 / 30.0) + 1e-4);
        assert!(seconds > frames as f32 * 0.015);
    }

    #[test]
    fn quit_stops_before_update() {
        let (mut driver, _clock, calls) = driver();
        driver.push(InputEvent::pressed(Intent::Quit));
        let mut rendered = false;

        let outcome = driver.run_frame(|_| rendered = true);

        assert_eq!(outcome, FrameOutcome::Quit);
        assert!(!rendered);
        assert_eq!(driver.scene().frames(), 0);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn overlay_toggle_is_edge_triggered() {
        let (mut driver, _clock, _calls) = driver();
        driver.push(InputEvent::pressed(Intent::ToggleDebug));
        driver.run_frame(|d| assert!(d.show_overlay()));
        driver.run_frame(|d| assert!(d.show_overlay()));
        driver.push(InputEvent::released(Intent::ToggleDebug));
        driver.push(InputEvent::pressed(Intent::ToggleDebug));
        driver.run_frame(|d| assert!(!d.show_overlay()));
    }

    #[test]
    fn focus_loss_keeps_queued_quit() {
        let (mut driver, _clock, _calls) = driver();
        driver.push(InputEvent::pressed(Intent::StrafeLeft));
        driver.push(InputEvent::pressed(Intent::Quit));

        driver.focus_lost();

        assert_eq!(driver.run_frame(|_| {}), FrameOutcome::Quit);
    }

    #[test]
    fn focus_loss_releases_held_movement() {
        let (mut driver, _clock, _calls) = driver();
        driver.push(InputEvent::pressed(Intent::StrafeLeft));
        driver.run_frame(|_| {});
        let before = driver.scene().camera().position();

        driver.focus_lost();
        driver.run_frame(|_| {});

        assert_eq!(driver.scene().camera().position(), before);
    }
}
