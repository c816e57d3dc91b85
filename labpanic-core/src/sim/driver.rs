//! Frame loop glue between a [`Game`] and its host. The core never reads a
//! clock, polls input or draws anything itself; hosts plug those in here.

use super::{Game, GameEvent, Phase, PointerState, WorldSnapshot};

/// Monotonic time source in milliseconds.
pub trait Clock {
    fn now_ms(&mut self) -> f64;
}

/// Pointer or touch state, sampled once per frame.
pub trait InputSource {
    fn pointer(&self) -> PointerState;
}

pub trait Renderer {
    fn render(&mut self, world: &WorldSnapshot);
}

/// Receives the final score once per run, typically to submit it.
pub trait GameOverSink {
    fn game_over(&mut self, final_score: u32);
}

pub struct FrameDriver<C, I, R, S> {
    game: Game,
    clock: C,
    input: I,
    renderer: R,
    sink: S,
    last_frame_ms: Option<f64>,
    game_over_sent: bool,
}

impl<C, I, R, S> FrameDriver<C, I, R, S>
where
    C: Clock,
    I: InputSource,
    R: Renderer,
    S: GameOverSink,
{
    pub fn new(game: Game, clock: C, input: I, renderer: R, sink: S) -> Self {
        Self {
            game,
            clock,
            input,
            renderer,
            sink,
            last_frame_ms: None,
            game_over_sent: false,
        }
    }

    /// Starts a new run and takes the current time as the frame baseline.
    pub fn start(&mut self) {
        self.game.start();
        self.game_over_sent = false;
        self.last_frame_ms = Some(self.clock.now_ms());
    }

    /// Runs one frame. Returns `false` once the game is no longer playing,
    /// so a host loop can stop scheduling frames.
    pub fn frame(&mut self) -> bool {
        if self.game.phase() != Phase::Playing {
            return false;
        }

        let now = self.clock.now_ms();
        let delta_ms = match self.last_frame_ms {
            Some(last) => now - last,
            None => 0.0,
        };
        self.last_frame_ms = Some(now);

        let pointer = self.input.pointer();
        let events = self.game.step(delta_ms, pointer);
        self.renderer.render(&self.game.snapshot());

        for event in events {
            if let GameEvent::GameOver { final_score } = event {
                if !self.game_over_sent {
                    self.game_over_sent = true;
                    self.sink.game_over(final_score);
                }
            }
        }

        self.game.phase() == Phase::Playing
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.game.pause();
        if paused {
            self.last_frame_ms = None;
        }
        paused
    }

    /// Resumes and resets the baseline so the paused span is never ticked.
    pub fn resume(&mut self) -> bool {
        let resumed = self.game.resume();
        if resumed {
            self.last_frame_ms = Some(self.clock.now_ms());
        }
        resumed
    }

    #[inline]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[inline]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::PlayArea;

    /// Clock whose time is advanced by the test through a shared handle.
    #[derive(Clone, Default)]
    struct ManualClock(Rc<Cell<f64>>);

    impl ManualClock {
        fn advance(&self, ms: f64) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&mut self) -> f64 {
            self.0.get()
        }
    }

    struct Idle;

    impl InputSource for Idle {
        fn pointer(&self) -> PointerState {
            PointerState::released()
        }
    }

    #[derive(Default)]
    struct FrameLog {
        frames: usize,
        last_elapsed_ms: f64,
    }

    impl Renderer for FrameLog {
        fn render(&mut self, world: &WorldSnapshot) {
            self.frames += 1;
            self.last_elapsed_ms = world.elapsed_ms;
        }
    }

    #[derive(Default)]
    struct Submissions(Vec<u32>);

    impl GameOverSink for Submissions {
        fn game_over(&mut self, final_score: u32) {
            self.0.push(final_score);
        }
    }

    fn driver(
        clock: &ManualClock,
        area: PlayArea,
    ) -> FrameDriver<ManualClock, Idle, FrameLog, Submissions> {
        FrameDriver::new(
            Game::new(5, area),
            clock.clone(),
            Idle,
            FrameLog::default(),
            Submissions::default(),
        )
    }

    #[test]
    fn frames_tick_by_clamped_clock_delta() {
        let clock = ManualClock::default();
        let mut driver = driver(&clock, PlayArea::new(0.0, 600.0));
        driver.start();

        clock.advance(16.0);
        assert!(driver.frame());
        assert_eq!(driver.game().elapsed_ms(), 16.0);

        // A long stall is clamped to one max tick.
        clock.advance(2_500.0);
        assert!(driver.frame());
        assert_eq!(driver.game().elapsed_ms(), 116.0);
        assert_eq!(driver.renderer().frames, 2);
        assert_eq!(driver.renderer().last_elapsed_ms, 116.0);
    }

    #[test]
    fn paused_span_is_never_ticked() {
        let clock = ManualClock::default();
        let mut driver = driver(&clock, PlayArea::new(0.0, 600.0));
        driver.start();
        clock.advance(50.0);
        driver.frame();

        assert!(driver.pause());
        clock.advance(60_000.0);
        assert!(!driver.frame());
        assert!(driver.resume());

        clock.advance(10.0);
        assert!(driver.frame());
        assert_eq!(driver.game().elapsed_ms(), 60.0);
    }

    #[test]
    fn game_over_reaches_sink_once() {
        let clock = ManualClock::default();
        let mut driver = driver(&clock, PlayArea::new(400.0, 100.0));
        driver.start();

        let mut frames = 0;
        while frames < 100_000 {
            clock.advance(100.0);
            if !driver.frame() {
                break;
            }
            frames += 1;
        }

        assert_eq!(driver.game().phase(), Phase::Over);
        assert_eq!(driver.sink().0, vec![driver.game().score()]);

        clock.advance(100.0);
        assert!(!driver.frame());
        assert_eq!(driver.sink().0.len(), 1);
    }
}
