use std::sync::Arc;

use anyhow::Result;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::PooledEntity;
use crate::manifest::SkeletonData;
use crate::pool::{Pool, PoolHandle};

/// Construction options for a skeleton pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkeletonPoolOptions {
    #[serde(default = "default_initial_size")]
    pub initial_size: usize,
    #[serde(default)]
    pub low_graphics: bool,
    /// Render scale applied to every skeleton while in low graphics mode.
    #[serde(default = "default_low_graphics_scale")]
    pub low_graphics_scale: f32,
}

impl Default for SkeletonPoolOptions {
    fn default() -> Self {
        Self {
            initial_size: default_initial_size(),
            low_graphics: false,
            low_graphics_scale: default_low_graphics_scale(),
        }
    }
}

fn default_initial_size() -> usize {
    10
}

fn default_low_graphics_scale() -> f32 {
    0.75
}

/// Animation most recently requested for a skeleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationState {
    pub track: usize,
    pub name: String,
    pub looping: bool,
}

/// Pooled skeleton instance.
///
/// Only the state the client manages itself is modelled here; playback belongs
/// to the animation runtime.
#[derive(Debug, Clone)]
pub struct Skeleton {
    data: Arc<SkeletonData>,
    position: Vec2,
    scale: f32,
    active: bool,
    low_graphics: bool,
    mesh_deformations: bool,
    update_interval: u32,
    animation: Option<AnimationState>,
}

impl Skeleton {
    pub fn new(data: Arc<SkeletonData>, options: &SkeletonPoolOptions) -> Self {
        let low_graphics = options.low_graphics;
        Self {
            data,
            position: Vec2::ZERO,
            scale: if low_graphics {
                options.low_graphics_scale
            } else {
                1.0
            },
            active: false,
            low_graphics,
            mesh_deformations: !low_graphics,
            update_interval: if low_graphics { 2 } else { 1 },
            animation: None,
        }
    }

    pub fn data(&self) -> &SkeletonData {
        &self.data
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    pub fn is_low_graphics(&self) -> bool {
        self.low_graphics
    }

    pub fn mesh_deformations_enabled(&self) -> bool {
        self.mesh_deformations
    }

    /// Number of frames between updates of this skeleton.
    pub fn update_interval(&self) -> u32 {
        self.update_interval
    }

    pub fn should_update(&self, frame: u64) -> bool {
        frame % u64::from(self.update_interval) == 0
    }

    pub fn animation(&self) -> Option<&AnimationState> {
        self.animation.as_ref()
    }

    pub fn set_animation(&mut self, track: usize, name: impl Into<String>, looping: bool) {
        let name = name.into();
        log::debug!(
            "{}: setting animation '{name}' on track {track} (loop: {looping})",
            self.data.name
        );
        self.animation = Some(AnimationState {
            track,
            name,
            looping,
        });
    }
}

impl PooledEntity for Skeleton {
    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn reset(&mut self) {
        self.position = Vec2::ZERO;
        self.active = false;
        self.animation = None;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Builds a pool of skeletons sharing `data`, configured by `options`.
pub fn create_skeleton_pool(
    data: Arc<SkeletonData>,
    options: SkeletonPoolOptions,
) -> Result<Pool<Skeleton>> {
    Pool::new(
        move || Ok(Skeleton::new(Arc::clone(&data), &options)),
        options.initial_size,
    )
}

/// Acquires a skeleton, places it at `position` and starts `animation` on
/// track zero when one is given.
pub fn acquire_skeleton(
    pool: &mut Pool<Skeleton>,
    position: Vec2,
    animation: Option<&str>,
    looping: bool,
) -> Result<PoolHandle> {
    let handle = pool.spawn_at(position)?;
    if let (Some(name), Some(skeleton)) = (animation, pool.get_mut(handle)) {
        skeleton.set_animation(0, name, looping);
    }
    Ok(handle)
}

/// Resets a skeleton and returns it to its pool.
pub fn release_skeleton(pool: &mut Pool<Skeleton>, handle: PoolHandle) -> bool {
    pool.recycle(handle)
}
