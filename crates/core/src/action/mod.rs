use crate::{naming, StereoMode};

/// Command name understood by [`convert_action_command_to_action`].
pub const SET_STEREO_MODE_COMMAND: &str = "setstereomode";

/// Input action delivered by the GUI, the command console or a remote caller.
///
/// Only the stereoscopic actions are modelled by name; any other action is
/// carried through as [`Action::Other`] so handlers can decline it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Unrecognised command.
    Invalid,
    NextStereoMode,
    PreviousStereoMode,
    ToggleStereoMode,
    SelectStereoMode,
    SetStereoMode(StereoMode),
    /// An action id owned by some other handler.
    Other(i32),
}

impl Action {
    /// Numeric action id. [`Action::Invalid`] maps to `-1`.
    pub fn id(&self) -> i32 {
        match self {
            Action::Invalid => -1,
            Action::NextStereoMode => 235,
            Action::PreviousStereoMode => 236,
            Action::ToggleStereoMode => 237,
            Action::SelectStereoMode => 238,
            Action::SetStereoMode(_) => 240,
            Action::Other(id) => *id,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Action::Invalid)
    }
}

/// Translates a console/remote command into an [`Action`].
///
/// The only command is `setstereomode`, whose parameter is either one of
/// `next`, `previous`, `toggle`, `select` or anything that names a stereo
/// mode. Matching ignores case.
pub fn convert_action_command_to_action(command: &str, parameter: &str) -> Action {
    if !command.trim().eq_ignore_ascii_case(SET_STEREO_MODE_COMMAND) {
        return Action::Invalid;
    }

    match parameter.trim().to_ascii_lowercase().as_str() {
        "next" => Action::NextStereoMode,
        "previous" => Action::PreviousStereoMode,
        "toggle" => Action::ToggleStereoMode,
        "select" => Action::SelectStereoMode,
        other => naming::string_mode_for(other)
            .map(Action::SetStereoMode)
            .unwrap_or(Action::Invalid),
    }
}

/// Messages on the GUI message bus the coordinator listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuiMessage {
    PlaybackStarted,
    PlaybackStopped,
    PlaylistStopped,
    Other(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_navigation_parameters() {
        assert_eq!(
            convert_action_command_to_action("SetStereoMode", "Next"),
            Action::NextStereoMode
        );
        assert_eq!(
            convert_action_command_to_action("setstereomode", "previous"),
            Action::PreviousStereoMode
        );
        assert_eq!(
            convert_action_command_to_action("setstereomode", "toggle"),
            Action::ToggleStereoMode
        );
        assert_eq!(
            convert_action_command_to_action("setstereomode", "select"),
            Action::SelectStereoMode
        );
    }

    #[test]
    fn maps_mode_parameters() {
        assert_eq!(
            convert_action_command_to_action("setstereomode", "split_vertical"),
            Action::SetStereoMode(StereoMode::SideBySide)
        );
        assert_eq!(
            convert_action_command_to_action("setstereomode", "Over-Under"),
            Action::SetStereoMode(StereoMode::TopBottom)
        );
        assert_eq!(
            convert_action_command_to_action("setstereomode", "off"),
            Action::SetStereoMode(StereoMode::Off)
        );
        assert_eq!(
            convert_action_command_to_action("setstereomode", "right_left"),
            Action::SetStereoMode(StereoMode::SideBySide)
        );
    }

    #[test]
    fn rejects_unknown_commands_and_parameters() {
        let invalid = convert_action_command_to_action("invalidcmd", "");
        assert_eq!(invalid, Action::Invalid);
        assert_eq!(invalid.id(), -1);
        assert!(!invalid.is_valid());

        assert_eq!(
            convert_action_command_to_action("setstereomode", "sideways"),
            Action::Invalid
        );
        assert_eq!(
            convert_action_command_to_action("setstereomode", ""),
            Action::Invalid
        );
    }
}
