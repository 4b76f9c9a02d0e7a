//! The timer bank: independent countdown/count-up timers driven by the
//! fixed-step state machine.
//!
//! Every timer advances only through `tick_*` calls with the simulation's
//! `dt` and resets only through the documented transition rules, so timer
//! state is a pure function of the step sequence that produced it.

use bevy::prelude::*;

/// Countdown and count-up timers owned by the locomotion state machine.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct TimerBank {
    /// Counts down from `coyote_time` after leaving the ground. May go
    /// negative while airborne; only `> 0` is meaningful.
    coyote: f32,
    /// Counts down from `slide_duration` while sliding.
    slide: f32,
    /// Counts up while wall-running.
    wall_run: f32,
    /// Counts up after a wall-jump until the cooldown elapses.
    wall_jump_cooldown: f32,
}

impl TimerBank {
    /// Refill the coyote window (the character touched the ground).
    pub fn reset_coyote(&mut self, max: f32) {
        self.coyote = max;
    }

    /// Drain the coyote window while airborne.
    pub fn tick_coyote(&mut self, dt: f32) {
        self.coyote -= dt;
    }

    /// Spend the coyote window. Jump and slide share this single counter, so
    /// a borderline frame can grant at most one of them.
    pub fn consume_coyote(&mut self) {
        self.coyote = 0.0;
    }

    pub fn coyote_active(&self) -> bool {
        self.coyote > 0.0
    }

    /// Arm the slide countdown.
    pub fn arm_slide(&mut self, duration: f32) {
        self.slide = duration;
    }

    /// Advance the slide countdown. Returns true once it has fully elapsed.
    pub fn tick_slide(&mut self, dt: f32) -> bool {
        self.slide -= dt;
        self.slide <= 0.0
    }

    /// Disarm the slide countdown, for transitions that end a slide without
    /// waiting for it to expire.
    pub fn cancel_slide(&mut self) {
        self.slide = 0.0;
    }

    /// Accumulate wall-run time. Returns true once `max` is exceeded and the
    /// run must be force-stopped.
    pub fn tick_wall_run(&mut self, dt: f32, max: f32) -> bool {
        self.wall_run += dt;
        self.wall_run > max
    }

    pub fn reset_wall_run(&mut self) {
        self.wall_run = 0.0;
    }

    /// Accumulate time since the last wall-jump. Returns true once the
    /// suppression window has elapsed.
    pub fn tick_wall_jump_cooldown(&mut self, dt: f32, cooldown: f32) -> bool {
        self.wall_jump_cooldown += dt;
        self.wall_jump_cooldown >= cooldown
    }

    pub fn reset_wall_jump_cooldown(&mut self) {
        self.wall_jump_cooldown = 0.0;
    }

    #[cfg(test)]
    pub fn wall_run_elapsed(&self) -> f32 {
        self.wall_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coyote_resets_and_drains() {
        let mut timers = TimerBank::default();
        timers.reset_coyote(0.15);
        assert!(timers.coyote_active());

        timers.tick_coyote(0.1);
        assert!(timers.coyote_active());

        timers.tick_coyote(0.1);
        assert!(!timers.coyote_active());
    }

    #[test]
    fn coyote_may_go_negative_without_breaking_reset() {
        let mut timers = TimerBank::default();
        timers.reset_coyote(0.1);
        for _ in 0..100 {
            timers.tick_coyote(0.016);
        }
        assert!(!timers.coyote_active());

        timers.reset_coyote(0.1);
        assert!(timers.coyote_active());
    }

    #[test]
    fn consuming_coyote_closes_the_window() {
        let mut timers = TimerBank::default();
        timers.reset_coyote(0.15);
        timers.consume_coyote();
        assert!(!timers.coyote_active());
    }

    #[test]
    fn slide_expires_after_its_duration() {
        let mut timers = TimerBank::default();
        timers.arm_slide(1.0);

        let mut elapsed = 0.0;
        let dt = 1.0 / 60.0;
        while !timers.tick_slide(dt) {
            elapsed += dt;
            assert!(elapsed < 1.1, "slide did not expire");
        }
        // Expires on the step that crosses the armed duration.
        assert!((elapsed - 1.0).abs() < 2.0 * dt);
    }

    #[test]
    fn wall_run_reports_excess_only_past_max() {
        let mut timers = TimerBank::default();
        assert!(!timers.tick_wall_run(0.5, 1.5));
        assert!(!timers.tick_wall_run(0.5, 1.5));
        assert!(!timers.tick_wall_run(0.5, 1.5));
        assert!(timers.tick_wall_run(0.1, 1.5));

        timers.reset_wall_run();
        assert_eq!(timers.wall_run_elapsed(), 0.0);
    }

    #[test]
    fn wall_jump_cooldown_elapses_once() {
        let mut timers = TimerBank::default();
        timers.reset_wall_jump_cooldown();
        assert!(!timers.tick_wall_jump_cooldown(0.2, 0.4));
        assert!(timers.tick_wall_jump_cooldown(0.2, 0.4));
    }
}
