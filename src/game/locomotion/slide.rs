//! Slide shape animator: a timed, cancellable interpolation of the capsule
//! extents plus a delayed, eased cosmetic offset of the visual mesh.
//!
//! Both effects are small resumable state objects stepped once per
//! simulation tick. Starting a new effect replaces the running one, so the
//! shape and visual offset always converge to the last-requested target no
//! matter how quickly slide start/end alternate.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::game::player::{
    CapsuleShape, ColliderAttachment, LocomotionConfig, Player, VisualModel,
};

/// Which snapshot a requested transition drives toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideTarget {
    Slide,
    Original,
}

/// Linear-in-time interpolation of capsule height and center.
///
/// Always constructed from the *current* shape, not a stored snapshot, so a
/// re-entrant start mid-flight picks up where the previous effect left off.
#[derive(Debug, Clone, Copy)]
pub struct ShapeLerp {
    elapsed: f32,
    duration: f32,
    start_height: f32,
    start_center: f32,
    target_height: f32,
    target_center: f32,
}

impl ShapeLerp {
    pub fn new(
        duration: f32,
        start_height: f32,
        start_center: f32,
        target_height: f32,
        target_center: f32,
    ) -> Self {
        Self {
            elapsed: 0.0,
            duration,
            start_height,
            start_center,
            target_height,
            target_center,
        }
    }

    /// Advances by `dt`. Returns the sampled `(height, center)` and whether
    /// the interpolation has converged; the final sample is the exact target.
    pub fn step(&mut self, dt: f32) -> (f32, f32, bool) {
        self.elapsed += dt;
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        };
        let height = self.start_height + (self.target_height - self.start_height) * t;
        let center = self.start_center + (self.target_center - self.start_center) * t;
        (height, center, t >= 1.0)
    }
}

/// Waits a configured delay, then eases a local position toward a target
/// with a smoothstep curve.
#[derive(Debug, Clone, Copy)]
pub struct OffsetEase {
    delay: f32,
    elapsed: f32,
    duration: f32,
    start: Vec3,
    target: Vec3,
}

impl OffsetEase {
    pub fn new(delay: f32, duration: f32, start: Vec3, target: Vec3) -> Self {
        Self {
            delay,
            elapsed: 0.0,
            duration,
            start,
            target,
        }
    }

    /// Advances by `dt`. Time left over after the delay expires within a step
    /// carries into the ease, so a large `dt` never stalls the effect.
    pub fn step(&mut self, dt: f32) -> (Vec3, bool) {
        let mut dt = dt;
        if self.delay > 0.0 {
            if dt < self.delay {
                self.delay -= dt;
                return (self.start, false);
            }
            dt -= self.delay;
            self.delay = 0.0;
        }

        self.elapsed += dt;
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        };
        let eased = t * t * (3.0 - 2.0 * t);
        (self.start.lerp(self.target, eased), t >= 1.0)
    }
}

/// Per-player effect slots. At most one shape interpolation and one cosmetic
/// offset effect run at a time; a new request supersedes both.
#[derive(Component, Default)]
pub struct SlideEffects {
    pending: Option<SlideTarget>,
    shape: Option<ShapeLerp>,
    visual: Option<OffsetEase>,
    missing_visual_warned: bool,
}

impl SlideEffects {
    /// Queues a transition toward `target`. Applied on the next effect step,
    /// cancelling whatever was running.
    pub fn request(&mut self, target: SlideTarget) {
        self.pending = Some(target);
    }

    #[cfg(test)]
    pub(crate) fn pending_target(&self) -> Option<SlideTarget> {
        self.pending
    }
}

/// Steps the active slide effects and writes the results to the collider
/// child (physical shape) and the visual child (cosmetic offset).
pub(super) fn step_slide_effects(
    time: Res<Time>,
    mut players: Query<
        (&LocomotionConfig, &mut CapsuleShape, &mut SlideEffects, &Children),
        With<Player>,
    >,
    mut collider_children: Query<
        (&mut Collider, &mut Transform),
        (With<ColliderAttachment>, Without<VisualModel>),
    >,
    mut visual_children: Query<
        &mut Transform,
        (With<VisualModel>, Without<ColliderAttachment>),
    >,
) {
    let dt = time.delta_secs();
    for (config, mut shape, mut effects, children) in &mut players {
        // Resolve a pending request into fresh effects, cancelling any
        // running ones.
        if let Some(target) = effects.pending.take() {
            let (target_height, target_center, visual_target) = match target {
                SlideTarget::Slide => {
                    (shape.slide_height, shape.slide_center, config.visual_slide_offset)
                }
                SlideTarget::Original => (shape.original_height, shape.original_center, Vec3::ZERO),
            };
            effects.shape = Some(ShapeLerp::new(
                config.shape_lerp_duration,
                shape.height,
                shape.center,
                target_height,
                target_center,
            ));

            let visual_start = children
                .iter()
                .find_map(|child| visual_children.get(child).ok().map(|t| t.translation));
            match visual_start {
                Some(start) => {
                    effects.visual = Some(OffsetEase::new(
                        config.visual_offset_delay,
                        config.visual_offset_duration,
                        start,
                        visual_target,
                    ));
                }
                None => {
                    effects.visual = None;
                    if !effects.missing_visual_warned {
                        warn!("player has no visual model child, skipping slide visual offset");
                        effects.missing_visual_warned = true;
                    }
                }
            }
        }

        if let Some(lerp) = &mut effects.shape {
            let (height, center, done) = lerp.step(dt);
            shape.height = height;
            shape.center = center;
            for child in children.iter() {
                if let Ok((mut collider, mut transform)) = collider_children.get_mut(child) {
                    *collider = shape.collider();
                    transform.translation.y = center;
                }
            }
            if done {
                effects.shape = None;
            }
        }

        if let Some(ease) = &mut effects.visual {
            let (position, done) = ease.step(dt);
            for child in children.iter() {
                if let Ok(mut transform) = visual_children.get_mut(child) {
                    transform.translation = position;
                }
            }
            if done {
                effects.visual = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn shape_lerp_converges_to_exact_target() {
        let mut lerp = ShapeLerp::new(0.1, 1.8, 0.0, 0.9, -0.45);
        let mut result = (1.8, 0.0, false);
        for _ in 0..20 {
            result = lerp.step(DT);
            if result.2 {
                break;
            }
        }
        assert!(result.2, "lerp never finished");
        assert_eq!(result.0, 0.9);
        assert_eq!(result.1, -0.45);
    }

    #[test]
    fn shape_lerp_is_linear_in_time() {
        let mut lerp = ShapeLerp::new(0.1, 2.0, 0.0, 1.0, 0.0);
        let (height, _, done) = lerp.step(0.05);
        assert!(!done);
        assert!((height - 1.5).abs() < 1e-5);
    }

    #[test]
    fn reentrant_restart_converges_to_the_last_target() {
        // Start shrinking, interrupt halfway, restart toward the slide
        // target from the current sample. Exactly one interpolation is
        // active at a time and it must still land on the slide target.
        let mut lerp = ShapeLerp::new(0.1, 1.8, 0.0, 0.9, -0.45);
        let (height, center, done) = lerp.step(0.05);
        assert!(!done);

        let mut restarted = ShapeLerp::new(0.1, height, center, 0.9, -0.45);
        let mut result = (height, center, false);
        while !result.2 {
            result = restarted.step(DT);
        }
        assert_eq!(result.0, 0.9);
        assert_eq!(result.1, -0.45);
    }

    #[test]
    fn interrupted_then_reversed_returns_to_original() {
        let mut shrink = ShapeLerp::new(0.1, 1.8, 0.0, 0.9, -0.45);
        let (height, center, _) = shrink.step(0.03);

        let mut grow = ShapeLerp::new(0.1, height, center, 1.8, 0.0);
        let mut result = (height, center, false);
        while !result.2 {
            result = grow.step(DT);
        }
        assert_eq!(result.0, 1.8);
        assert_eq!(result.1, 0.0);
    }

    #[test]
    fn zero_duration_lerp_completes_immediately() {
        let mut lerp = ShapeLerp::new(0.0, 1.8, 0.0, 0.9, -0.45);
        let (height, center, done) = lerp.step(DT);
        assert!(done);
        assert_eq!(height, 0.9);
        assert_eq!(center, -0.45);
    }

    #[test]
    fn offset_ease_waits_out_its_delay() {
        let start = Vec3::ZERO;
        let target = Vec3::new(0.0, -0.35, 0.0);
        let mut ease = OffsetEase::new(0.1, 0.2, start, target);

        let (position, done) = ease.step(0.05);
        assert_eq!(position, start);
        assert!(!done);

        let mut result = (start, false);
        while !result.1 {
            result = ease.step(DT);
        }
        assert_eq!(result.0, target);
    }

    #[test]
    fn offset_ease_carries_leftover_time_past_the_delay() {
        let start = Vec3::ZERO;
        let target = Vec3::Y;
        // One big step covering the whole delay and the whole duration.
        let mut ease = OffsetEase::new(0.1, 0.2, start, target);
        let (position, done) = ease.step(0.5);
        assert!(done);
        assert_eq!(position, target);
    }

    #[test]
    fn superseding_ease_converges_to_the_new_target() {
        let slide_offset = Vec3::new(0.0, -0.35, 0.0);
        let mut to_slide = OffsetEase::new(0.0, 0.2, Vec3::ZERO, slide_offset);
        let (midway, done) = to_slide.step(0.1);
        assert!(!done);

        // Slide ends early: a reverse ease replaces the running one, starting
        // from the current offset.
        let mut to_original = OffsetEase::new(0.0, 0.2, midway, Vec3::ZERO);
        let mut result = (midway, false);
        while !result.1 {
            result = to_original.step(DT);
        }
        assert_eq!(result.0, Vec3::ZERO);
    }
}
