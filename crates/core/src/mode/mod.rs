use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{naming, StereoError};

/// Sentinel returned by the integer interop functions when a string names no
/// stereo mode.
pub const INVALID_MODE: i32 = -1;

/// Stereoscopic layout applied by the renderer.
///
/// Ordinals follow the numbering shared with action parameters and remote
/// callers. [`StereoMode::Auto`] is a pseudo mode that resolves to whatever
/// the playing content reports and is never itself on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StereoMode {
    #[default]
    Off,
    /// Left and right views stacked vertically (horizontal split line).
    TopBottom,
    /// Left and right views next to each other (vertical split line).
    SideBySide,
    AnaglyphRedCyan,
    AnaglyphGreenMagenta,
    AnaglyphYellowBlue,
    /// Row interleaved output for passive polarised panels.
    Interlaced,
    Checkerboard,
    /// Frame packing handled by the display driver.
    HardwareBased,
    /// Same layout as the playing content.
    Auto,
}

impl StereoMode {
    /// Every concrete mode in ordinal order. This is the order the
    /// "next mode" and "previous mode" actions walk through.
    pub const CYCLE: [StereoMode; 9] = [
        StereoMode::Off,
        StereoMode::TopBottom,
        StereoMode::SideBySide,
        StereoMode::AnaglyphRedCyan,
        StereoMode::AnaglyphGreenMagenta,
        StereoMode::AnaglyphYellowBlue,
        StereoMode::Interlaced,
        StereoMode::Checkerboard,
        StereoMode::HardwareBased,
    ];

    /// All variants, including the [`StereoMode::Auto`] pseudo mode.
    pub const ALL: [StereoMode; 10] = [
        StereoMode::Off,
        StereoMode::TopBottom,
        StereoMode::SideBySide,
        StereoMode::AnaglyphRedCyan,
        StereoMode::AnaglyphGreenMagenta,
        StereoMode::AnaglyphYellowBlue,
        StereoMode::Interlaced,
        StereoMode::Checkerboard,
        StereoMode::HardwareBased,
        StereoMode::Auto,
    ];

    /// Integer value used by external surfaces.
    pub fn ordinal(self) -> i32 {
        match self {
            StereoMode::Off => 0,
            StereoMode::TopBottom => 1,
            StereoMode::SideBySide => 2,
            StereoMode::AnaglyphRedCyan => 3,
            StereoMode::AnaglyphGreenMagenta => 4,
            StereoMode::AnaglyphYellowBlue => 5,
            StereoMode::Interlaced => 6,
            StereoMode::Checkerboard => 7,
            StereoMode::HardwareBased => 8,
            StereoMode::Auto => 100,
        }
    }

    /// Inverse of [`StereoMode::ordinal`].
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.ordinal() == ordinal)
    }

    /// Position of the mode inside [`StereoMode::CYCLE`].
    pub fn cycle_index(self) -> Option<usize> {
        Self::CYCLE.iter().position(|mode| *mode == self)
    }

    /// Machine readable token, see [`naming::convert_gui_stereo_mode_to_string`].
    pub fn token(self) -> &'static str {
        naming::convert_gui_stereo_mode_to_string(self)
    }

    pub fn is_off(self) -> bool {
        self == StereoMode::Off
    }
}

impl fmt::Display for StereoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for StereoMode {
    type Err = StereoError;

    /// Accepts canonical tokens, their synonyms and video metadata tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ordinal(naming::convert_video_to_gui_stereo_mode(s))
            .ok_or_else(|| StereoError::InvalidMode(s.to_string()))
    }
}

impl TryFrom<i32> for StereoMode {
    type Error = StereoError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_ordinal(value).ok_or_else(|| StereoError::InvalidMode(value.to_string()))
    }
}

impl TryFrom<String> for StereoMode {
    type Error = StereoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StereoMode> for String {
    fn from(value: StereoMode) -> Self {
        value.token().to_string()
    }
}

/// How a content-reported stereo mode is reconciled with the active mode
/// when playback starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackModePolicy {
    /// Prompt the user for the mode to use.
    #[default]
    Ask,
    /// Switch to the mode the content reports.
    PreferContent,
    /// Play stereoscopic content in 2D.
    ForceMono,
    /// Leave the display alone.
    Ignore,
}

impl PlaybackModePolicy {
    pub fn ordinal(self) -> i32 {
        match self {
            PlaybackModePolicy::Ask => 0,
            PlaybackModePolicy::PreferContent => 1,
            PlaybackModePolicy::ForceMono => 2,
            PlaybackModePolicy::Ignore => 100,
        }
    }
}

impl TryFrom<i32> for PlaybackModePolicy {
    type Error = StereoError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlaybackModePolicy::Ask),
            1 => Ok(PlaybackModePolicy::PreferContent),
            2 => Ok(PlaybackModePolicy::ForceMono),
            100 => Ok(PlaybackModePolicy::Ignore),
            other => Err(StereoError::InvalidPolicy(other)),
        }
    }
}

impl fmt::Display for PlaybackModePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackModePolicy::Ask => write!(f, "ask"),
            PlaybackModePolicy::PreferContent => write!(f, "prefer_content"),
            PlaybackModePolicy::ForceMono => write!(f, "force_mono"),
            PlaybackModePolicy::Ignore => write!(f, "ignore"),
        }
    }
}
