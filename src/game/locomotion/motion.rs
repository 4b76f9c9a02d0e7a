//! Velocity math for jumping, wall-running, and wall-jumping.
//!
//! Pure functions over vectors; the state machine decides *when* to apply
//! them, these decide *what* velocity results.

use bevy::prelude::*;

/// Initial vertical velocity that reaches `jump_height` at the apex under
/// `gravity` (a negative magnitude): the projectile-motion inversion
/// `v = sqrt(h * -2g)`.
pub fn jump_impulse(jump_height: f32, gravity: f32) -> f32 {
    (jump_height * -2.0 * gravity).sqrt()
}

/// The wall's outward normal, pointing away from the wall surface toward the
/// character: the negated right axis for a right-side wall, the right axis
/// for a left-side wall.
pub fn wall_outward_normal(right: Vec3, wall_on_right: bool) -> Vec3 {
    if wall_on_right { -right } else { right }
}

/// Horizontal direction to run along the wall.
///
/// Of the two candidates perpendicular to the wall normal, picks the one
/// aligned with the character's facing so the run never flips backwards.
pub fn wall_forward(wall_normal: Vec3, facing: Vec3) -> Vec3 {
    let mut along = wall_normal.cross(Vec3::Y).normalize_or_zero();
    if along.dot(facing) < 0.0 {
        along = -along;
    }
    along
}

/// Launch velocity for a wall-jump: up and away from the wall, biased by the
/// character's facing, at `wall_jump_force` magnitude on all three axes.
pub fn wall_jump_velocity(wall_normal: Vec3, facing: Vec3, wall_jump_force: f32) -> Vec3 {
    let direction = (wall_normal * 1.5 + Vec3::Y * 1.5 + facing).normalize_or_zero();
    direction * wall_jump_force
}

/// One gravity step on the vertical velocity component.
pub fn integrate_gravity(velocity_y: f32, gravity: f32, dt: f32) -> f32 {
    velocity_y + gravity * dt
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    #[test]
    fn jump_impulse_matches_projectile_inversion() {
        // gravity -9.81, height 2 => sqrt(2 * 2 * 9.81) ~= 6.264
        let impulse = jump_impulse(2.0, -9.81);
        assert!((impulse - 6.264).abs() < EPSILON, "got {impulse}");
    }

    #[test]
    fn outward_normal_points_away_from_the_wall() {
        let right = Vec3::X;
        assert_eq!(wall_outward_normal(right, true), Vec3::NEG_X);
        assert_eq!(wall_outward_normal(right, false), Vec3::X);
    }

    #[test]
    fn wall_forward_aligns_with_facing() {
        // Wall on the right of a character facing -Z: normal points -X.
        let normal = Vec3::NEG_X;
        let facing = Vec3::NEG_Z;
        let along = wall_forward(normal, facing);
        assert!(along.dot(facing) > 0.0, "run direction flipped: {along}");
        assert!((along.length() - 1.0).abs() < EPSILON);
        assert!(along.y.abs() < EPSILON, "wall-forward must be horizontal");
    }

    #[test]
    fn wall_forward_flips_for_opposite_facing() {
        let normal = Vec3::NEG_X;
        let a = wall_forward(normal, Vec3::NEG_Z);
        let b = wall_forward(normal, Vec3::Z);
        assert!((a + b).length() < EPSILON, "candidates must be opposites");
    }

    #[test]
    fn wall_run_speed_magnitude_is_preserved() {
        let normal = Vec3::NEG_X;
        let velocity = wall_forward(normal, Vec3::NEG_Z) * 7.0;
        assert!((velocity.length() - 7.0).abs() < EPSILON);
    }

    #[test]
    fn wall_jump_launches_up_and_away() {
        let normal = Vec3::NEG_X;
        let velocity = wall_jump_velocity(normal, Vec3::NEG_Z, 12.0);
        assert!((velocity.length() - 12.0).abs() < EPSILON);
        assert!(velocity.y > 0.0, "must launch upward");
        assert!(velocity.x < 0.0, "must launch away from a right-side wall");
    }

    #[test]
    fn gravity_accumulates_linearly() {
        let mut vy = 0.0;
        for _ in 0..60 {
            vy = integrate_gravity(vy, -9.81, 1.0 / 60.0);
        }
        assert!((vy + 9.81).abs() < 0.01, "after 1s vy should be -g, got {vy}");
    }
}
