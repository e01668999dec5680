//! Core systems of the Etidorhpa game client.
//!
//! The crate provides the pieces of the client that do not depend on a
//! particular engine: a generic pool for expensive, frequently recycled render
//! entities, device quality classification with the profiles that size those
//! pools, and the scene orchestration built on top of them. Rendering and
//! animation playback stay outside of the crate so everything here runs
//! headless.

pub mod boot;
pub mod entity;
pub mod manifest;
pub mod observable;
pub mod pool;
pub mod preferences;
pub mod quality;
pub mod settings;
pub mod skeleton;
pub mod world;

pub use boot::{boot, BootFailure, BootReport};
pub use entity::PooledEntity;
pub use manifest::{LoadOptions, ManifestCache, ManifestError, SkeletonData, SkeletonManifest};
pub use observable::{Observable, Subscription};
pub use pool::{Pool, PoolHandle, PoolStats};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use quality::{classify, resolve_profile, HardwareSignals, QualityProfile, QualityTier};
pub use settings::GraphicsSettings;
pub use skeleton::{Skeleton, SkeletonPoolOptions};
pub use world::{Character, World};
