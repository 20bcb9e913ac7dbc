//! Core library for the stereo mode coordinator.
//!
//! The crate decides which stereoscopic (3D) output mode a media player shows.
//! [`StereoscopicsManager`] reconciles the user's persisted choice, the layout
//! reported by the playing content and transient user actions, and pushes the
//! result to the render backend. The remaining modules hold the value types,
//! the string vocabularies those values travel in, the collaborator traits and
//! small in-memory collaborators used by tests and the console binary.

pub mod action;
pub mod config;
pub mod error;
pub mod manager;
pub mod mode;
pub mod naming;
pub mod playback;
pub mod render;
pub mod services;

pub use action::{convert_action_command_to_action, Action, GuiMessage};
pub use config::{DetectionConfig, InMemorySettings, PlaybackConfig, StereoConfig};
pub use error::{Result, StereoError};
pub use manager::{CoordinatorState, StereoscopicsManager};
pub use mode::{PlaybackModePolicy, StereoMode, INVALID_MODE};
pub use naming::{
    convert_gui_stereo_mode_to_string, convert_string_to_gui_stereo_mode,
    convert_video_to_gui_stereo_mode, detect_stereo_mode_by_string, normalize_stereo_mode,
    StereoDetector,
};
pub use playback::{NowPlaying, PlaybackSnapshot};
pub use render::SimulatedDisplay;
pub use services::{
    CancelPrompt, Choice, ChoicePrompt, EnglishLabels, LogNotifier, Localizer, MessageTarget,
    Notifier, PlaybackInfo, RenderSystem, SettingCallback, SettingKey, SettingsStore, UiText,
};
