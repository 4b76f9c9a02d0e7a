//! Environment probes: stateless ground and wall queries against the
//! collision world. "No hit" is an answer, not an error.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::game::player::CapsuleShape;

/// Ray origins are lifted slightly above the probed edge so a capsule resting
/// exactly on a surface still reports contact.
const PROBE_LIFT: f32 = 0.1;

/// Result of the sideways wall probes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WallContact {
    pub left: bool,
    pub right: bool,
}

impl WallContact {
    pub fn any(self) -> bool {
        self.left || self.right
    }
}

/// Casts a short ray downward from just above the capsule's feet. A hit
/// within `distance` means the character counts as grounded.
pub fn check_grounded(
    spatial_query: &SpatialQuery,
    transform: &Transform,
    shape: &CapsuleShape,
    distance: f32,
    filter: &SpatialQueryFilter,
) -> bool {
    let origin = transform.translation + Vec3::Y * (shape.feet_offset() + PROBE_LIFT);
    spatial_query
        .cast_ray(origin, Dir3::NEG_Y, distance + PROBE_LIFT, true, filter)
        .is_some()
}

/// Casts rays along the character's left and right axes, up to
/// `distance`, against wall-run-eligible geometry only.
pub fn check_walls(
    spatial_query: &SpatialQuery,
    transform: &Transform,
    distance: f32,
    filter: &SpatialQueryFilter,
) -> WallContact {
    let origin = transform.translation;
    let right = transform.right();
    WallContact {
        left: spatial_query
            .cast_ray(origin, -right, distance, true, filter)
            .is_some(),
        right: spatial_query
            .cast_ray(origin, right, distance, true, filter)
            .is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_contact_any() {
        assert!(!WallContact::default().any());
        assert!(WallContact { left: true, right: false }.any());
        assert!(WallContact { left: false, right: true }.any());
    }
}
