use crate::observable::{Observable, Subscription};
use crate::quality::{classify, resolve_profile, HardwareSignals, QualityProfile, QualityTier};

/// Prefix shared by every published style variable.
pub const STYLE_PREFIX: &str = "--etidorhpa";
/// Name the project shipped under before the rename; still published for
/// stylesheets that were not migrated.
pub const LEGACY_STYLE_PREFIX: &str = "--septerra";

/// Graphics configuration for one client session.
///
/// Built once by the orchestrator from the device tier and handed to whoever
/// needs it. Clones share the low-graphics flag.
#[derive(Debug, Clone)]
pub struct GraphicsSettings {
    tier: QualityTier,
    profile: QualityProfile,
    low_graphics: Observable<bool>,
}

impl GraphicsSettings {
    pub fn new(tier: QualityTier) -> Self {
        let profile = resolve_profile(tier);
        Self {
            tier,
            profile,
            low_graphics: Observable::new(profile.low_graphics_default),
        }
    }

    pub fn from_signals(signals: &HardwareSignals) -> Self {
        let tier = classify(signals);
        log::info!("Device quality classified as {tier}");
        Self::new(tier)
    }

    /// Classifies the host and builds settings for it.
    pub fn detect() -> Self {
        Self::from_signals(&HardwareSignals::detect())
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn profile(&self) -> &QualityProfile {
        &self.profile
    }

    pub fn is_low_graphics(&self) -> bool {
        self.low_graphics.get()
    }

    /// Overrides the profile's low-graphics default, e.g. from a user
    /// preference. Returns whether the value changed.
    pub fn set_low_graphics(&self, enabled: bool) -> bool {
        let changed = self.low_graphics.set(enabled);
        if changed {
            log::info!("Low graphics mode {}", if enabled { "enabled" } else { "disabled" });
        }
        changed
    }

    #[must_use = "dropping the subscription detaches the listener"]
    pub fn subscribe_low_graphics<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.low_graphics.subscribe(move |enabled| listener(*enabled))
    }

    /// Style variables describing the current settings, as name/value pairs.
    pub fn style_variables(&self) -> Vec<(String, String)> {
        let low_graphics = if self.is_low_graphics() { "1" } else { "0" };
        vec![
            (format!("{STYLE_PREFIX}-low-graphics"), low_graphics.to_string()),
            (format!("{LEGACY_STYLE_PREFIX}-low-graphics"), low_graphics.to_string()),
            (
                format!("{STYLE_PREFIX}-particle-multiplier"),
                self.profile.particle_multiplier.to_string(),
            ),
            (
                format!("{STYLE_PREFIX}-texture-scale"),
                self.profile.texture_scale.to_string(),
            ),
            (format!("{STYLE_PREFIX}-device-quality"), self.tier.to_string()),
        ]
    }
}
