use anyhow::Result;
use glam::Vec2;

use crate::pool::{Pool, PoolHandle};

/// Capabilities a pooled render entity must expose.
///
/// Everything else about the entity (animation, rendering) is left to the
/// concrete type.
pub trait PooledEntity {
    fn set_position(&mut self, position: Vec2);

    /// Clears transient state and marks the entity inactive.
    fn reset(&mut self);

    fn is_active(&self) -> bool;

    fn set_active(&mut self, active: bool);
}

impl<T: PooledEntity> Pool<T> {
    /// Acquires an entity, places it at `position` and marks it active.
    pub fn spawn_at(&mut self, position: Vec2) -> Result<PoolHandle> {
        let handle = self.acquire()?;
        if let Some(entity) = self.get_mut(handle) {
            entity.set_position(position);
            entity.set_active(true);
        }
        Ok(handle)
    }

    /// Resets the entity behind `handle` and releases it.
    ///
    /// Handles that are not checked out are ignored, as with [`Pool::release`].
    pub fn recycle(&mut self, handle: PoolHandle) -> bool {
        match self.get_mut(handle) {
            Some(entity) => entity.reset(),
            None => return false,
        }
        self.release(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Marker {
        position: Vec2,
        active: bool,
    }

    impl PooledEntity for Marker {
        fn set_position(&mut self, position: Vec2) {
            self.position = position;
        }

        fn reset(&mut self) {
            self.position = Vec2::ZERO;
            self.active = false;
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn set_active(&mut self, active: bool) {
            self.active = active;
        }
    }

    #[test]
    fn spawn_positions_and_activates() {
        let mut pool = Pool::new(|| Ok(Marker::default()), 1).unwrap();
        let handle = pool.spawn_at(Vec2::new(4.0, 2.0)).unwrap();
        let marker = pool.get(handle).unwrap();
        assert_eq!(marker.position, Vec2::new(4.0, 2.0));
        assert!(marker.is_active());
    }

    #[test]
    fn recycle_resets_before_release() {
        let mut pool = Pool::new(|| Ok(Marker::default()), 0).unwrap();
        let handle = pool.spawn_at(Vec2::new(1.0, 1.0)).unwrap();
        assert!(pool.recycle(handle));
        assert!(!pool.recycle(handle));

        let again = pool.acquire().unwrap();
        let marker = pool.get(again).unwrap();
        assert_eq!(marker.position, Vec2::ZERO);
        assert!(!marker.is_active());
        assert_eq!(pool.stats().total, 1);
    }
}
