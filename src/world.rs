use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec2;

use crate::entity::PooledEntity;
use crate::manifest::SkeletonData;
use crate::pool::{Pool, PoolHandle, PoolStats};
use crate::settings::GraphicsSettings;
use crate::skeleton::{
    acquire_skeleton, create_skeleton_pool, release_skeleton, Skeleton, SkeletonPoolOptions,
};

/// Render scale for skeletons spawned while low graphics mode is on.
pub const LOW_GRAPHICS_SCALE: f32 = 0.75;

/// A spawned skeleton, identified by its skeleton name and pool handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Character {
    skeleton: String,
    handle: PoolHandle,
}

impl Character {
    pub fn skeleton(&self) -> &str {
        &self.skeleton
    }
}

/// Main game scene: one skeleton pool per loaded skeleton plus the list of
/// characters currently in the world.
#[derive(Debug)]
pub struct World {
    skeletons: BTreeMap<String, Arc<SkeletonData>>,
    pools: BTreeMap<String, Pool<Skeleton>>,
    active: Vec<Character>,
    options: SkeletonPoolOptions,
}

impl World {
    /// Creates the world and a pool for every skeleton, sized and configured
    /// from `settings`.
    pub fn new<I>(skeletons: I, settings: &GraphicsSettings) -> Result<Self>
    where
        I: IntoIterator<Item = SkeletonData>,
    {
        let options = SkeletonPoolOptions {
            initial_size: settings.profile().initial_pool_size,
            low_graphics: settings.is_low_graphics(),
            low_graphics_scale: LOW_GRAPHICS_SCALE,
        };
        let skeletons = skeletons
            .into_iter()
            .map(|data| (data.name.clone(), Arc::new(data)))
            .collect();
        let mut world = Self {
            skeletons,
            pools: BTreeMap::new(),
            active: Vec::new(),
            options,
        };
        world.pools = world.build_pools()?;
        Ok(world)
    }

    fn build_pools(&self) -> Result<BTreeMap<String, Pool<Skeleton>>> {
        let mut pools = BTreeMap::new();
        for (name, data) in &self.skeletons {
            let pool = create_skeleton_pool(Arc::clone(data), self.options)
                .with_context(|| format!("failed to create pool for {name}"))?;
            log::info!(
                "Created pool for {name} (low-graphics: {})",
                self.options.low_graphics
            );
            pools.insert(name.clone(), pool);
        }
        Ok(pools)
    }

    pub fn is_low_graphics(&self) -> bool {
        self.options.low_graphics
    }

    pub fn pool_options(&self) -> &SkeletonPoolOptions {
        &self.options
    }

    pub fn skeleton_names(&self) -> impl Iterator<Item = &str> {
        self.skeletons.keys().map(String::as_str)
    }

    pub fn pool_stats(&self, skeleton: &str) -> Option<PoolStats> {
        self.pools.get(skeleton).map(Pool::stats)
    }

    pub fn active_characters(&self) -> &[Character] {
        &self.active
    }

    /// Borrows the skeleton behind a character still in the world.
    pub fn character(&self, character: &Character) -> Option<&Skeleton> {
        self.pools
            .get(&character.skeleton)
            .and_then(|pool| pool.get(character.handle))
    }

    /// Places a pooled skeleton in the world with a looping animation.
    ///
    /// Returns `Ok(None)` when no pool exists for `skeleton`.
    pub fn spawn(
        &mut self,
        skeleton: &str,
        position: Vec2,
        animation: &str,
    ) -> Result<Option<Character>> {
        let Some(pool) = self.pools.get_mut(skeleton) else {
            log::warn!("No pool found for skeleton {skeleton}");
            return Ok(None);
        };
        let handle = acquire_skeleton(pool, position, Some(animation), true)?;
        let character = Character {
            skeleton: skeleton.to_string(),
            handle,
        };
        self.active.push(character.clone());
        log::debug!("Spawned {skeleton} at ({}, {})", position.x, position.y);
        Ok(Some(character))
    }

    /// Removes a character from the world and returns its skeleton to the
    /// pool. Characters already despawned are ignored.
    pub fn despawn(&mut self, character: &Character) -> bool {
        if let Some(index) = self.active.iter().position(|active| active == character) {
            self.active.remove(index);
        }
        let Some(pool) = self.pools.get_mut(&character.skeleton) else {
            return false;
        };
        let released = release_skeleton(pool, character.handle);
        if released {
            log::debug!("Despawned {}", character.skeleton);
        }
        released
    }

    /// Advances one frame. Returns how many characters were due for an update;
    /// low graphics skeletons skip frames.
    pub fn update(&self, frame: u64) -> usize {
        self.active
            .iter()
            .filter_map(|character| {
                self.pools
                    .get(&character.skeleton)
                    .and_then(|pool| pool.get(character.handle))
            })
            .filter(|skeleton| skeleton.is_active() && skeleton.should_update(frame))
            .count()
    }

    /// Switches low graphics mode by tearing every pool down and rebuilding it.
    ///
    /// Existing pools cannot be reconfigured in place, so all characters are
    /// despawned first. Returns `Ok(false)` when the mode is unchanged.
    pub fn apply_low_graphics(&mut self, enabled: bool) -> Result<bool> {
        if self.options.low_graphics == enabled {
            return Ok(false);
        }
        self.despawn_all();
        for pool in self.pools.values_mut() {
            pool.clear();
        }
        self.options.low_graphics = enabled;
        self.pools = self.build_pools()?;
        Ok(true)
    }

    /// Despawns every character and drops all pools.
    pub fn shutdown(&mut self) {
        self.despawn_all();
        for pool in self.pools.values_mut() {
            pool.clear();
        }
        self.pools.clear();
    }

    fn despawn_all(&mut self) {
        while let Some(character) = self.active.last().cloned() {
            self.despawn(&character);
        }
    }
}
