use super::collision::CollisionGroups;
use crate::core::math::{Size2D, Vector2D};
use rapier2d::prelude::*;

/// Builder for creating rigid bodies with common configurations
pub struct BodyBuilder {
    body_type: RigidBodyType,
    position: Isometry<Real>,
    linvel: Vector<Real>,
    gravity_scale: Real,
    linear_damping: Real,
    can_sleep: bool,
    locked_axes: LockedAxes,
}

impl BodyBuilder {
    /// Create a new dynamic body (affected by forces and collisions)
    pub fn new_dynamic() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            position: Isometry::identity(),
            linvel: Vector::zeros(),
            gravity_scale: 1.0,
            linear_damping: 0.0,
            can_sleep: true,
            locked_axes: LockedAxes::empty(),
        }
    }

    /// Create a new fixed (static) body (completely immovable)
    pub fn new_fixed() -> Self {
        Self {
            body_type: RigidBodyType::Fixed,
            position: Isometry::identity(),
            linvel: Vector::zeros(),
            gravity_scale: 0.0,
            linear_damping: 0.0,
            can_sleep: false,
            locked_axes: LockedAxes::empty(),
        }
    }

    /// Set the initial position of the body
    pub fn position(mut self, position: Vector2D) -> Self {
        self.position = Isometry::translation(position.x, position.y);
        self
    }

    /// Set the initial linear velocity
    pub fn linvel(mut self, velocity: Vector2D) -> Self {
        self.linvel = vector![velocity.x, velocity.y];
        self
    }

    /// Set the gravity scale (1.0 = normal gravity, 0.0 = no gravity)
    pub fn gravity_scale(mut self, scale: Real) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Set the linear damping (0.0 = none)
    pub fn linear_damping(mut self, damping: Real) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Set whether the body can sleep when inactive
    pub fn can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    /// Lock rotation
    pub fn lock_rotation(mut self) -> Self {
        self.locked_axes = LockedAxes::ROTATION_LOCKED;
        self
    }

    /// Build the rigid body
    pub fn build(self) -> RigidBody {
        RigidBodyBuilder::new(self.body_type)
            .position(self.position)
            .linvel(self.linvel)
            .gravity_scale(self.gravity_scale)
            .linear_damping(self.linear_damping)
            .can_sleep(self.can_sleep)
            .locked_axes(self.locked_axes)
            .build()
    }
}

/// Builder for creating colliders with common configurations
pub struct ColliderBuilder2D {
    shape: SharedShape,
    collision_groups: CollisionGroups,
    friction: Real,
    restitution: Real,
    density: Real,
}

impl ColliderBuilder2D {
    /// Create a circle-shaped collider
    pub fn circle(radius: Real) -> Self {
        Self {
            shape: SharedShape::ball(radius),
            collision_groups: CollisionGroups::Default,
            friction: 0.5,
            restitution: 0.0,
            density: 1.0,
        }
    }

    /// Create a line segment collider between two local points
    pub fn segment(a: Vector2D, b: Vector2D) -> Self {
        Self {
            shape: SharedShape::segment(point![a.x, a.y], point![b.x, b.y]),
            collision_groups: CollisionGroups::Default,
            friction: 0.5,
            restitution: 0.0,
            density: 0.0,
        }
    }

    /// Set the collision groups for filtering
    pub fn collision_groups(mut self, groups: CollisionGroups) -> Self {
        self.collision_groups = groups;
        self
    }

    /// Set friction coefficient (0.0 = no friction, 1.0 = high friction)
    pub fn friction(mut self, friction: Real) -> Self {
        self.friction = friction;
        self
    }

    /// Set restitution/bounciness (0.0 = no bounce, 1.0 = perfect bounce)
    pub fn restitution(mut self, restitution: Real) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set density (mass will be calculated from shape volume)
    pub fn density(mut self, density: Real) -> Self {
        self.density = density;
        self
    }

    /// Build the collider
    pub fn build(self) -> Collider {
        rapier2d::prelude::ColliderBuilder::new(self.shape)
            .collision_groups(self.collision_groups.to_interaction_groups())
            .friction(self.friction)
            .restitution(self.restitution)
            .density(self.density)
            .build()
    }
}

/// Body and collider configurations used by the simulation
pub mod presets {
    use super::*;
    use crate::engine::physics::particles::ParticleSystemDef;

    /// A single fluid particle: a dynamic ball that never rotates
    pub fn particle_body(
        position: Vector2D,
        velocity: Vector2D,
        def: &ParticleSystemDef,
    ) -> RigidBody {
        BodyBuilder::new_dynamic()
            .position(position)
            .linvel(velocity)
            .gravity_scale(def.gravity_scale)
            .linear_damping(def.damping_strength)
            .lock_rotation()
            .build()
    }

    /// Collider for a particle of the given system
    pub fn particle_collider(def: &ParticleSystemDef) -> Collider {
        ColliderBuilder2D::circle(def.radius)
            .collision_groups(CollisionGroups::Particle)
            .friction(0.0) // Fluids slide along walls
            .restitution(0.0)
            .density(def.density)
            .build()
    }

    /// Fixed anchor body for an edge box whose lower-left corner is `origin`
    pub fn boundary_body(origin: Vector2D) -> RigidBody {
        BodyBuilder::new_fixed().position(origin).build()
    }

    /// The four walls of an edge box, relative to its anchor body
    pub fn boundary_colliders(size: Size2D) -> [Collider; 4] {
        let Size2D { width, height } = size;
        let corners = [
            Vector2D::new(0.0, 0.0),
            Vector2D::new(width, 0.0),
            Vector2D::new(width, height),
            Vector2D::new(0.0, height),
        ];

        // bottom, right, top, left
        std::array::from_fn(|i| {
            ColliderBuilder2D::segment(corners[i], corners[(i + 1) % 4])
                .collision_groups(CollisionGroups::Boundary)
                .friction(0.3)
                .build()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::particles::ParticleSystemDef;

    #[test]
    fn test_body_builder_dynamic() {
        let body = BodyBuilder::new_dynamic()
            .position(Vector2D::new(10.0, 20.0))
            .linvel(Vector2D::new(5.0, 0.0))
            .build();

        assert_eq!(body.body_type(), RigidBodyType::Dynamic);
        assert_eq!(body.translation().x, 10.0);
        assert_eq!(body.translation().y, 20.0);
        assert_eq!(body.linvel().x, 5.0);
    }

    #[test]
    fn test_collider_builder_circle() {
        let collider = ColliderBuilder2D::circle(0.5).friction(0.3).build();

        assert!(!collider.is_sensor());
        assert_eq!(collider.friction(), 0.3);
        assert_eq!(collider.shape().shape_type(), ShapeType::Ball);
    }

    #[test]
    fn test_particle_preset() {
        let def = ParticleSystemDef::new(0.25, 0.2, 0.5, 1.2);
        let body = presets::particle_body(Vector2D::new(1.0, 2.0), Vector2D::ZERO, &def);
        let collider = presets::particle_collider(&def);

        assert_eq!(body.body_type(), RigidBodyType::Dynamic);
        assert!(body.is_rotation_locked());
        assert_eq!(body.gravity_scale(), 0.5);
        assert_eq!(body.linear_damping(), 0.2);
        assert_eq!(collider.density(), 1.2);
        assert_eq!(collider.shape().as_ball().map(|b| b.radius), Some(0.25));
    }

    #[test]
    fn test_boundary_preset() {
        let body = presets::boundary_body(Vector2D::new(1.0, 1.0));
        let walls = presets::boundary_colliders(Size2D::new(4.0, 3.0));

        assert_eq!(body.body_type(), RigidBodyType::Fixed);
        assert_eq!(walls.len(), 4);
        for wall in &walls {
            assert_eq!(wall.shape().shape_type(), ShapeType::Segment);
        }

        let top = walls[2].shape().as_segment().map(|s| (s.a, s.b));
        assert_eq!(top, Some((point![4.0, 3.0], point![0.0, 3.0])));
    }
}
