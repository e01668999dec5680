use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User agents of devices known to struggle, matched against the lower-cased
/// user agent string.
static LOW_END_DEVICES: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"android.*2\.",
        r"android.*3\.",
        r"android.*4\.[0-3]",
        r"windows phone",
        r"opera mini",
        r"opera mobi",
    ])
    .expect("low-end device patterns must compile")
});

static MOBILE_DEVICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"mobile|android|iphone|ipad|tablet").expect("mobile pattern must compile")
});

/// Read-only hardware signals. Any of them may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareSignals {
    /// Approximate device memory in gigabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_gb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_cores: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl HardwareSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory_gb(mut self, memory_gb: f64) -> Self {
        self.memory_gb = Some(memory_gb);
        self
    }

    pub fn with_logical_cores(mut self, cores: u32) -> Self {
        self.logical_cores = Some(cores);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Reads memory and core count from the host. The user agent stays unknown.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn detect() -> Self {
        const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

        let mut system = sysinfo::System::new();
        system.refresh_memory();
        let total_bytes = system.total_memory();
        let memory_gb = (total_bytes > 0).then(|| total_bytes as f64 / BYTES_PER_GB);
        let logical_cores = std::thread::available_parallelism()
            .ok()
            .and_then(|count| u32::try_from(count.get()).ok());

        Self {
            memory_gb,
            logical_cores,
            user_agent: None,
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn detect() -> Self {
        Self::default()
    }

    // Zero or non-finite readings carry no information.
    fn memory(&self) -> Option<f64> {
        self.memory_gb.filter(|memory| memory.is_finite() && *memory > 0.0)
    }

    fn cores(&self) -> Option<u32> {
        self.logical_cores.filter(|cores| *cores > 0)
    }
}

/// Coarse device capability classification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityTier {
    pub const ALL: [QualityTier; 3] = [QualityTier::Low, QualityTier::Medium, QualityTier::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn profile(self) -> QualityProfile {
        resolve_profile(self)
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown quality tier: {0}")]
pub struct UnknownTier(pub String);

impl FromStr for QualityTier {
    type Err = UnknownTier;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(UnknownTier(value.to_string())),
        }
    }
}

/// Shadow rendering quality requested by a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowQuality {
    Low,
    Medium,
    High,
}

impl fmt::Display for ShadowQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Immutable configuration bundle attached to a tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityProfile {
    pub low_graphics_default: bool,
    /// Fraction of the nominal particle budget, in `(0, 1]`.
    pub particle_multiplier: f32,
    pub shadow_quality: ShadowQuality,
    /// Texture variant to load, `1` or `2`.
    pub texture_scale: u8,
    /// Entities pre-built per pool.
    pub initial_pool_size: usize,
}

const HIGH_PROFILE: QualityProfile = QualityProfile {
    low_graphics_default: false,
    particle_multiplier: 1.0,
    shadow_quality: ShadowQuality::High,
    texture_scale: 2,
    initial_pool_size: 100,
};

const MEDIUM_PROFILE: QualityProfile = QualityProfile {
    low_graphics_default: false,
    particle_multiplier: 0.7,
    shadow_quality: ShadowQuality::Medium,
    texture_scale: 1,
    initial_pool_size: 50,
};

const LOW_PROFILE: QualityProfile = QualityProfile {
    low_graphics_default: true,
    particle_multiplier: 0.3,
    shadow_quality: ShadowQuality::Low,
    texture_scale: 1,
    initial_pool_size: 20,
};

/// Classifies a device from its hardware signals. First matching rule wins.
///
/// Never fails: absent signals skip the checks that need them, and the
/// fallback tier is [`QualityTier::Medium`].
pub fn classify(signals: &HardwareSignals) -> QualityTier {
    let memory = signals.memory();
    let cores = signals.cores();

    if memory.is_some_and(|memory| memory >= 8.0) {
        return QualityTier::High;
    }
    if cores.is_some_and(|cores| cores >= 8) {
        return QualityTier::High;
    }
    if memory.is_some_and(|memory| memory < 4.0) {
        return QualityTier::Low;
    }
    if cores.is_some_and(|cores| cores <= 2) {
        return QualityTier::Low;
    }

    let user_agent = signals
        .user_agent
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    if LOW_END_DEVICES.is_match(&user_agent) {
        return QualityTier::Low;
    }
    if MOBILE_DEVICE.is_match(&user_agent) {
        return if memory.is_some_and(|memory| memory >= 6.0) {
            QualityTier::High
        } else {
            QualityTier::Medium
        };
    }

    QualityTier::Medium
}

pub fn resolve_profile(tier: QualityTier) -> QualityProfile {
    match tier {
        QualityTier::High => HIGH_PROFILE,
        QualityTier::Medium => MEDIUM_PROFILE,
        QualityTier::Low => LOW_PROFILE,
    }
}

/// Resolves a profile from a tier name, using the medium profile for names
/// that are not a known tier.
pub fn resolve_profile_named(name: &str) -> QualityProfile {
    name.parse::<QualityTier>()
        .map(resolve_profile)
        .unwrap_or(MEDIUM_PROFILE)
}
