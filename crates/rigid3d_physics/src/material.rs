//! Surface material properties for contact response

use serde::{Deserialize, Serialize};

/// Surface material of a collider
///
/// Materials define how colliders interact in contact: friction (how much
/// they resist sliding) and restitution (bounciness).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    /// Friction coefficient, `>= 0` (0.0 = ice, ~1.0 = rubber)
    pub friction: f32,
    /// Restitution, `[0, 1]` (0.0 = no bounce, 1.0 = perfect bounce)
    pub restitution: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.3,
        }
    }
}

impl PhysicsMaterial {
    /// Very low friction, slight bounce
    pub const ICE: Self = Self {
        friction: 0.05,
        restitution: 0.1,
    };

    /// High friction, very bouncy
    pub const RUBBER: Self = Self {
        friction: 0.9,
        restitution: 0.8,
    };

    /// Moderate friction and bounce
    pub const METAL: Self = Self {
        friction: 0.3,
        restitution: 0.3,
    };

    /// Moderate friction, low bounce
    pub const WOOD: Self = Self {
        friction: 0.5,
        restitution: 0.2,
    };

    /// High friction, no bounce
    pub const CONCRETE: Self = Self {
        friction: 0.7,
        restitution: 0.0,
    };

    /// Create a material with custom friction and restitution
    ///
    /// Friction is clamped to be non-negative, restitution to `[0, 1]`.
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction: friction.max(0.0),
            restitution: restitution.clamp(0.0, 1.0),
        }
    }

    /// Combine two materials for a contact
    ///
    /// Geometric mean for friction, maximum for restitution.
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            friction: (self.friction * other.friction).sqrt(),
            restitution: self.restitution.max(other.restitution),
        }
    }
}
