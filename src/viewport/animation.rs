//! Zoom animation as a stepper.
//!
//! The animation never owns a timer. Whoever drives the viewport (an event
//! loop, a test, the `preview` command) passes in the current [`Instant`];
//! the stepper answers with the zoom for that moment. Interpolation is
//! linear over a fixed duration.
//!
//! ```text
//!          start(now)              tick: t >= 1
//!   Idle ─────────────► Animating ───────────────► Idle
//!                        │    ▲
//!                        └────┘ tick: t < 1
//! ```

use std::time::{Duration, Instant};

/// One frame of a zoom animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationStep {
    /// Progress in `[0, 1]`.
    pub t: f64,
    pub zoom: f64,
}

impl AnimationStep {
    pub fn is_final(&self) -> bool {
        self.t >= 1.0
    }
}

/// Zoom at `elapsed` into an animation from `start_zoom` to `target_zoom`.
///
/// A zero duration completes immediately.
pub fn step(start_zoom: f64, target_zoom: f64, elapsed: Duration, duration: Duration) -> AnimationStep {
    let t = if duration.is_zero() {
        1.0
    } else {
        (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
    };
    if t >= 1.0 {
        return AnimationStep {
            t: 1.0,
            zoom: target_zoom,
        };
    }
    AnimationStep {
        t,
        zoom: start_zoom + (target_zoom - start_zoom) * t,
    }
}

/// Every frame of an animation sampled once per `tick`, ending with the
/// final frame.
pub fn frames(
    start_zoom: f64,
    target_zoom: f64,
    duration: Duration,
    tick: Duration,
) -> impl Iterator<Item = AnimationStep> {
    let tick = tick.max(Duration::from_millis(1));
    let mut elapsed = Duration::ZERO;
    let mut finished = false;
    std::iter::from_fn(move || {
        if finished {
            return None;
        }
        elapsed += tick;
        let frame = step(start_zoom, target_zoom, elapsed, duration);
        finished = frame.is_final();
        Some(frame)
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    Animating { started: Instant, start_zoom: f64 },
}

/// Zoom animation state machine.
///
/// At most one animation runs at a time: [`start`](Self::start) while
/// animating is refused, and the running animation keeps its start point.
/// The target is read on every tick, so retargeting mid-flight bends the
/// running animation instead of starting a new one.
#[derive(Debug, Clone)]
pub struct ZoomAnimator {
    state: State,
    duration: Duration,
    tick: Duration,
}

impl ZoomAnimator {
    pub fn new(duration: Duration, tick: Duration) -> Self {
        Self {
            state: State::Idle,
            duration,
            tick,
        }
    }

    /// Begin animating from `start_zoom`. Returns `false` if an animation
    /// is already running.
    pub fn start(&mut self, now: Instant, start_zoom: f64) -> bool {
        if self.is_animating() {
            return false;
        }
        log::debug!("zoom animation started at {start_zoom:.3}");
        self.state = State::Animating {
            started: now,
            start_zoom,
        };
        true
    }

    /// Advance to `now`. Returns `None` when idle. The final step returns
    /// the animator to idle.
    pub fn tick(&mut self, now: Instant, target_zoom: f64) -> Option<AnimationStep> {
        let State::Animating {
            started,
            start_zoom,
        } = self.state
        else {
            return None;
        };
        let frame = step(
            start_zoom,
            target_zoom,
            now.saturating_duration_since(started),
            self.duration,
        );
        if frame.is_final() {
            log::debug!("zoom animation finished at {:.3}", frame.zoom);
            self.state = State::Idle;
        }
        Some(frame)
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, State::Animating { .. })
    }

    /// Interval at which the driver should call [`tick`](Self::tick).
    pub fn tick_interval(&self) -> Duration {
        self.tick
    }

    /// Stop without reaching the target.
    pub fn cancel(&mut self) {
        self.state = State::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DURATION: Duration = Duration::from_millis(200);
    const TICK: Duration = Duration::from_millis(10);

    #[test]
    fn step_interpolates_linearly() {
        let s = step(1.0, 2.0, Duration::from_millis(50), DURATION);
        assert!((s.t - 0.25).abs() < 1e-9);
        assert!((s.zoom - 1.25).abs() < 1e-9);
        assert!(!s.is_final());
    }

    #[test]
    fn step_past_duration_snaps_to_target() {
        let s = step(1.0, 0.5, Duration::from_millis(900), DURATION);
        assert_eq!(s, AnimationStep { t: 1.0, zoom: 0.5 });
        assert!(s.is_final());
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let s = step(1.0, 3.0, Duration::ZERO, Duration::ZERO);
        assert!(s.is_final());
        assert_eq!(s.zoom, 3.0);
    }

    #[test]
    fn frames_cover_duration_at_tick_rate() {
        let all: Vec<_> = frames(1.0, 1.1, DURATION, TICK).collect();
        assert_eq!(all.len(), 20);
        assert!(all.windows(2).all(|w| w[1].zoom >= w[0].zoom));
        assert_eq!(all.last().unwrap().zoom, 1.1);
        assert_eq!(all.iter().filter(|f| f.is_final()).count(), 1);
    }

    #[test]
    fn animator_runs_idle_animating_idle() {
        let t0 = Instant::now();
        let mut anim = ZoomAnimator::new(DURATION, TICK);
        assert!(anim.tick(t0, 2.0).is_none());

        assert!(anim.start(t0, 1.0));
        assert!(anim.is_animating());

        let mid = anim.tick(t0 + Duration::from_millis(100), 2.0).unwrap();
        assert!((mid.zoom - 1.5).abs() < 1e-9);
        assert!(anim.is_animating());

        let last = anim.tick(t0 + Duration::from_millis(250), 2.0).unwrap();
        assert!(last.is_final());
        assert_eq!(last.zoom, 2.0);
        assert!(!anim.is_animating());
    }

    #[test]
    fn second_start_is_refused() {
        let t0 = Instant::now();
        let mut anim = ZoomAnimator::new(DURATION, TICK);
        assert!(anim.start(t0, 1.0));
        assert!(!anim.start(t0 + TICK, 5.0));
        // Start point unchanged
        let s = anim.tick(t0 + Duration::from_millis(100), 3.0).unwrap();
        assert!((s.zoom - 2.0).abs() < 1e-9);
    }

    #[test]
    fn retarget_mid_flight_bends_the_curve() {
        let t0 = Instant::now();
        let mut anim = ZoomAnimator::new(DURATION, TICK);
        anim.start(t0, 1.0);
        anim.tick(t0 + Duration::from_millis(50), 2.0);
        let s = anim.tick(t0 + Duration::from_millis(200), 4.0).unwrap();
        assert_eq!(s.zoom, 4.0);
    }
}
