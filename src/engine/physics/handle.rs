// Generation-checked handles for objects owned by a physics world

use rapier2d::data::Index;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Storage behind handles; removal bumps the slot generation
pub use rapier2d::data::Arena;

/// Opaque handle to an object living inside a world
///
/// The `T` parameter ensures handles can only be used with the correct object kind.
/// `world` is the epoch of the world that issued the handle and `index` carries the
/// arena generation, so handles survive neither the destruction of their world nor
/// the removal of their object.
pub struct Handle<T> {
    world: u32,
    index: Index,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(world: u32, index: Index) -> Self {
        Self {
            world,
            index,
            _phantom: PhantomData,
        }
    }

    /// Epoch of the world that issued this handle
    pub fn world(&self) -> u32 {
        self.world
    }

    pub(crate) fn index(&self) -> Index {
        self.index
    }
}

// Manual impls so `T` does not need to implement these traits itself
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.world == other.world && self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.world.hash(state);
        self.index.into_raw_parts().hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (index, generation) = self.index.into_raw_parts();
        write!(f, "Handle({}:{}v{})", self.world, index, generation)
    }
}

// Marker types for the different object kinds
pub enum ParticleSystemObject {}
pub enum EdgeObject {}

/// Handle to a particle system
pub type ParticleSystemHandle = Handle<ParticleSystemObject>;

/// Handle to a static edge box
pub type EdgeHandle = Handle<EdgeObject>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_equality_includes_world() {
        let index = Index::from_raw_parts(0, 0);
        let h1: ParticleSystemHandle = Handle::new(1, index);
        let h2: ParticleSystemHandle = Handle::new(2, index);
        let h3: ParticleSystemHandle = Handle::new(1, index);

        assert_ne!(h1, h2, "Handles from different worlds must differ");
        assert_eq!(h1, h3);
    }

    #[test]
    fn test_reused_slot_rejects_old_handle() {
        let mut arena = Arena::new();
        let old: EdgeHandle = Handle::new(1, arena.insert(1));
        assert_eq!(arena.remove(old.index()), Some(1));

        let new: EdgeHandle = Handle::new(1, arena.insert(2));
        assert_ne!(old, new);
        assert!(arena.get(old.index()).is_none());
        assert_eq!(arena.get(new.index()), Some(&2));
    }

    #[test]
    fn test_debug_shows_generation() {
        let handle: ParticleSystemHandle = Handle::new(3, Index::from_raw_parts(7, 2));
        assert_eq!(format!("{handle:?}"), "Handle(3:7v2)");
    }
}
