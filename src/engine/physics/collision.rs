use rapier2d::prelude::*;

/// Collision groups for filtering what objects can collide with each other
///
/// Particles need to pile up against each other and against the container walls,
/// while the walls themselves are static and never need to test against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroups {
    /// Default group - interacts with everything
    Default = 0b0000_0001,

    /// Fluid particles
    Particle = 0b0000_0010,

    /// Static edge boxes
    Boundary = 0b0000_0100,
}

impl CollisionGroups {
    /// Convert to rapier2d's InteractionGroups
    pub fn to_interaction_groups(self) -> InteractionGroups {
        let memberships = Group::from_bits_truncate(self as u32);

        let filter = match self {
            // Particles collide with each other, with walls and with regular bodies
            CollisionGroups::Particle => Group::from_bits_truncate(
                CollisionGroups::Particle as u32
                    | CollisionGroups::Boundary as u32
                    | CollisionGroups::Default as u32,
            ),

            // Walls only ever need to stop moving things
            CollisionGroups::Boundary => Group::from_bits_truncate(
                CollisionGroups::Particle as u32 | CollisionGroups::Default as u32,
            ),

            CollisionGroups::Default => Group::ALL,
        };

        InteractionGroups::new(memberships, filter)
    }
}
