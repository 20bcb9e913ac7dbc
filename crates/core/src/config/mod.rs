use std::{
    collections::BTreeMap,
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError, Weak},
};

use serde::{Deserialize, Serialize};

use crate::{
    PlaybackModePolicy, Result, SettingCallback, SettingKey, SettingsStore, StereoDetector,
    StereoMode,
};

/// Top-level configuration structure, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoConfig {
    pub playback: PlaybackConfig,
    pub detection: DetectionConfig,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            detection: DetectionConfig::default(),
        }
    }
}

impl StereoConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded stereo configuration");
        Ok(config)
    }

    /// File name detector with the configured extra markers.
    pub fn detector(&self) -> Result<StereoDetector> {
        StereoDetector::new(
            self.detection
                .markers
                .iter()
                .map(|(marker, mode)| (marker.as_str(), *mode)),
        )
    }
}

/// Persisted playback preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub policy: PlaybackModePolicy,
    /// Mode used when the user switches 3D on without a prior choice.
    pub preferred_mode: StereoMode,
    /// Last explicit user choice.
    pub user_mode: StereoMode,
    pub quit_stereo_mode_on_stop: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            policy: PlaybackModePolicy::Ask,
            preferred_mode: StereoMode::Auto,
            user_mode: StereoMode::Off,
            quit_stereo_mode_on_stop: false,
        }
    }
}

/// Extra file name markers, e.g. `"3dsbs" = "split_vertical"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub markers: BTreeMap<String, StereoMode>,
}

/// [`SettingsStore`] kept in memory. Setters fire the registered callbacks
/// when a value actually changes.
#[derive(Default)]
pub struct InMemorySettings {
    values: Mutex<PlaybackConfig>,
    callbacks: Mutex<Vec<Weak<dyn SettingCallback>>>,
}

impl InMemorySettings {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            values: Mutex::new(config),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> PlaybackConfig {
        self.lock_values().clone()
    }

    pub fn set_playback_policy(&self, policy: PlaybackModePolicy) {
        self.update(SettingKey::PlaybackPolicy, |values| {
            std::mem::replace(&mut values.policy, policy) != policy
        });
    }

    pub fn set_preferred_mode(&self, mode: StereoMode) {
        self.update(SettingKey::PreferredStereoMode, |values| {
            std::mem::replace(&mut values.preferred_mode, mode) != mode
        });
    }

    pub fn set_quit_stereo_mode_on_stop(&self, enabled: bool) {
        self.update(SettingKey::QuitStereoModeOnStop, |values| {
            std::mem::replace(&mut values.quit_stereo_mode_on_stop, enabled) != enabled
        });
    }

    fn update(&self, key: SettingKey, apply: impl FnOnce(&mut PlaybackConfig) -> bool) {
        let changed = apply(&mut self.lock_values());
        if changed {
            self.notify(key);
        }
    }

    fn notify(&self, key: SettingKey) {
        let listeners: Vec<_> = {
            let mut callbacks = self.lock_callbacks();
            callbacks.retain(|callback| callback.strong_count() > 0);
            callbacks.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in listeners {
            listener.on_setting_changed(key);
        }
    }

    fn lock_values(&self) -> MutexGuard<'_, PlaybackConfig> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_callbacks(&self) -> MutexGuard<'_, Vec<Weak<dyn SettingCallback>>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SettingsStore for InMemorySettings {
    fn playback_policy(&self) -> PlaybackModePolicy {
        self.lock_values().policy
    }

    fn user_mode(&self) -> StereoMode {
        self.lock_values().user_mode
    }

    fn set_user_mode(&self, mode: StereoMode) {
        self.update(SettingKey::UserStereoMode, |values| {
            std::mem::replace(&mut values.user_mode, mode) != mode
        });
    }

    fn preferred_mode(&self) -> StereoMode {
        self.lock_values().preferred_mode
    }

    fn quit_stereo_mode_on_stop(&self) -> bool {
        self.lock_values().quit_stereo_mode_on_stop
    }

    fn register_callback(&self, callback: Weak<dyn SettingCallback>) {
        self.lock_callbacks().push(callback);
    }
}

impl std::fmt::Debug for InMemorySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySettings")
            .field("values", &*self.lock_values())
            .field("callbacks", &self.lock_callbacks().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<SettingKey>>,
    }

    impl SettingCallback for Recorder {
        fn on_setting_changed(&self, setting: SettingKey) {
            self.seen.lock().unwrap().push(setting);
        }
    }

    #[test]
    fn parses_toml_with_synonyms_and_defaults() {
        let config = StereoConfig::from_toml_str(
            r#"
            [playback]
            policy = "prefer_content"
            user_mode = "tab"

            [detection.markers]
            "3dsbs" = "sbs"
            "#,
        )
        .unwrap();

        assert_eq!(config.playback.policy, PlaybackModePolicy::PreferContent);
        assert_eq!(config.playback.user_mode, StereoMode::TopBottom);
        assert_eq!(config.playback.preferred_mode, StereoMode::Auto);
        assert!(!config.playback.quit_stereo_mode_on_stop);
        assert_eq!(
            config.detection.markers.get("3dsbs"),
            Some(&StereoMode::SideBySide)
        );

        let detector = config.detector().unwrap();
        assert_eq!(detector.detect("clip.3dsbs.mkv"), Some(StereoMode::SideBySide));
    }

    #[test]
    fn empty_input_yields_defaults() {
        let config = StereoConfig::from_toml_str("").unwrap();
        assert_eq!(config, StereoConfig::default());
    }

    #[test]
    fn rejects_unknown_modes() {
        let err = StereoConfig::from_toml_str("[playback]\nuser_mode = \"wobble\"\n").unwrap_err();
        assert!(format!("{err}").contains("wobble"));
    }

    #[test]
    fn setters_notify_only_on_change() {
        let settings = InMemorySettings::default();
        let recorder = Arc::new(Recorder::default());
        let weak: Weak<dyn SettingCallback> = Arc::downgrade(&recorder) as Weak<dyn SettingCallback>;
        settings.register_callback(weak);

        settings.set_playback_policy(PlaybackModePolicy::Ignore);
        settings.set_playback_policy(PlaybackModePolicy::Ignore);
        settings.set_user_mode(StereoMode::SideBySide);
        settings.set_quit_stereo_mode_on_stop(false);

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![SettingKey::PlaybackPolicy, SettingKey::UserStereoMode]
        );
        assert_eq!(settings.user_mode(), StereoMode::SideBySide);
    }

    #[test]
    fn dropped_listeners_are_pruned() {
        let settings = InMemorySettings::default();
        {
            let recorder: Arc<dyn SettingCallback> = Arc::new(Recorder::default());
            settings.register_callback(Arc::downgrade(&recorder));
        }
        settings.set_preferred_mode(StereoMode::TopBottom);
        assert!(format!("{settings:?}").contains("callbacks: 0"));
    }
}
