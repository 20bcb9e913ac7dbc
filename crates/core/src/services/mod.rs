//! Narrow interfaces to the collaborators the coordinator is wired to.
//!
//! Every collaborator is injected as an `Arc<dyn Trait>` so the coordinator
//! can be driven by in-memory fakes in tests and by the console binary.

use std::sync::Weak;

use crate::{naming, GuiMessage, PlaybackModePolicy, StereoMode};

/// Persisted settings the coordinator reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// The mode the user picked last.
    UserStereoMode,
    /// Mode used when the user asks for "their" 3D mode.
    PreferredStereoMode,
    /// The [`PlaybackModePolicy`].
    PlaybackPolicy,
    /// Whether leaving playback also leaves stereo output.
    QuitStereoModeOnStop,
}

/// Persisted settings store.
pub trait SettingsStore: Send + Sync {
    fn playback_policy(&self) -> PlaybackModePolicy;
    fn user_mode(&self) -> StereoMode;
    fn set_user_mode(&self, mode: StereoMode);

    fn preferred_mode(&self) -> StereoMode {
        StereoMode::Auto
    }

    fn quit_stereo_mode_on_stop(&self) -> bool {
        false
    }

    /// Registers a listener for setting changes. The store must not keep the
    /// listener alive.
    fn register_callback(&self, callback: Weak<dyn SettingCallback>);
}

/// Render/display subsystem.
pub trait RenderSystem: Send + Sync {
    /// Mode currently on screen.
    fn current_mode(&self) -> StereoMode;
    fn apply_mode(&self, mode: StereoMode);
    /// Modes the backend can output, in ordinal order.
    fn supported_modes(&self) -> Vec<StereoMode>;

    fn supports(&self, mode: StereoMode) -> bool {
        mode.is_off() || self.supported_modes().contains(&mode)
    }
}

/// State of the currently playing item.
pub trait PlaybackInfo: Send + Sync {
    /// Raw stereo tag of the playing video stream, if any.
    fn current_video_stereo_mode(&self) -> Option<String>;

    /// File name of the playing item, used to detect stereo markers when the
    /// stream carries no tag.
    fn current_file_name(&self) -> Option<String> {
        None
    }

    /// Whether the playing item is stereoscopic. Sources that know this
    /// without a layout tag should override it.
    fn is_stereoscopic_content(&self) -> bool {
        self.current_video_stereo_mode()
            .and_then(|tag| naming::video_mode_for(&tag))
            .is_some_and(|mode| !mode.is_off())
    }
}

/// Entry offered by a [`ChoicePrompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub mode: StereoMode,
    pub label: String,
}

/// Modal selection dialog.
pub trait ChoicePrompt: Send + Sync {
    /// Returns the picked mode, or `None` when the user cancelled.
    fn ask_choice(&self, heading: &str, options: &[Choice]) -> Option<StereoMode>;
}

/// Fixed user interface strings besides the mode labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiText {
    /// Heading of the mode change notification.
    ModeChanged,
    /// Heading of the prompt shown when stereoscopic playback starts.
    PlaybackModeHeading,
    /// Heading of the plain mode selection prompt.
    SelectModeHeading,
    /// Prefix for the preferred-mode entry.
    PreferredMode,
    /// Prefix for the same-as-content entry.
    ContentMode,
}

/// Localization lookup.
pub trait Localizer: Send + Sync {
    fn label(&self, mode: StereoMode) -> String;

    fn text(&self, text: UiText) -> String {
        EnglishLabels.text(text)
    }
}

/// Change notification sink, typically a toast.
pub trait Notifier: Send + Sync {
    fn notify(&self, heading: &str, message: &str);
}

/// Capability: receives settings change notifications.
pub trait SettingCallback: Send + Sync {
    fn on_setting_changed(&self, setting: SettingKey);
}

/// Capability: receives messages from the GUI message bus.
pub trait MessageTarget: Send + Sync {
    /// Returns whether the message was consumed.
    fn on_message(&self, message: &GuiMessage) -> bool;
}

/// Built-in English strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishLabels;

impl Localizer for EnglishLabels {
    fn label(&self, mode: StereoMode) -> String {
        match mode {
            StereoMode::Off => "Disabled",
            StereoMode::TopBottom => "Over/Under",
            StereoMode::SideBySide => "Side by side",
            StereoMode::AnaglyphRedCyan => "Anaglyph red/cyan",
            StereoMode::AnaglyphGreenMagenta => "Anaglyph green/magenta",
            StereoMode::AnaglyphYellowBlue => "Anaglyph yellow/blue",
            StereoMode::Interlaced => "Interlaced",
            StereoMode::Checkerboard => "Checkerboard",
            StereoMode::HardwareBased => "Hardware based",
            StereoMode::Auto => "Same as movie",
        }
        .to_string()
    }

    fn text(&self, text: UiText) -> String {
        match text {
            UiText::ModeChanged => "Stereoscopic 3D mode",
            UiText::PlaybackModeHeading => "Select playback mode",
            UiText::SelectModeHeading => "Select stereoscopic 3D mode",
            UiText::PreferredMode => "Preferred mode",
            UiText::ContentMode => "Same as movie",
        }
        .to_string()
    }
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, heading: &str, message: &str) {
        tracing::info!(heading, message, "stereo notification");
    }
}

/// Prompt that cancels every request. Used where no dialog is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct CancelPrompt;

impl ChoicePrompt for CancelPrompt {
    fn ask_choice(&self, heading: &str, options: &[Choice]) -> Option<StereoMode> {
        tracing::debug!(heading, options = options.len(), "no prompt available, cancelling");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tagged(Option<&'static str>);

    impl PlaybackInfo for Tagged {
        fn current_video_stereo_mode(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[test]
    fn stereoscopic_content_requires_a_stereo_tag() {
        assert!(Tagged(Some("left_right")).is_stereoscopic_content());
        assert!(Tagged(Some("Top-Bottom")).is_stereoscopic_content());
        assert!(!Tagged(Some("mono")).is_stereoscopic_content());
        assert!(!Tagged(Some("col_interleaved_lr")).is_stereoscopic_content());
        assert!(!Tagged(Some("gibberish")).is_stereoscopic_content());
        assert!(!Tagged(None).is_stereoscopic_content());
    }

    #[test]
    fn every_mode_has_a_label() {
        for mode in StereoMode::ALL {
            assert!(!EnglishLabels.label(mode).is_empty());
        }
    }
}
