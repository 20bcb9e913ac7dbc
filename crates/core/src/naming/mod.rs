//! Translation between [`StereoMode`] and the string vocabularies that refer
//! to it: canonical GUI tokens and their synonyms, video-stream metadata tags,
//! and stereo markers embedded in file names.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

use crate::{StereoError, StereoMode, INVALID_MODE};

/// Synonyms accepted wherever a GUI token is expected, keyed by lookup key.
const GUI_SYNONYMS: &[(&str, StereoMode)] = &[
    ("disabled", StereoMode::Off),
    ("none", StereoMode::Off),
    ("2d", StereoMode::Off),
    ("side_by_side", StereoMode::SideBySide),
    ("sbs", StereoMode::SideBySide),
    ("hsbs", StereoMode::SideBySide),
    ("half_sbs", StereoMode::SideBySide),
    ("fsbs", StereoMode::SideBySide),
    ("full_sbs", StereoMode::SideBySide),
    ("over_under", StereoMode::TopBottom),
    ("top_and_bottom", StereoMode::TopBottom),
    ("tab", StereoMode::TopBottom),
    ("htab", StereoMode::TopBottom),
    ("half_tab", StereoMode::TopBottom),
    ("half_ou", StereoMode::TopBottom),
    ("ftab", StereoMode::TopBottom),
    ("full_tab", StereoMode::TopBottom),
    ("interlaced", StereoMode::Interlaced),
    ("interleaved", StereoMode::Interlaced),
    ("checker_board", StereoMode::Checkerboard),
    ("anaglyph", StereoMode::AnaglyphRedCyan),
    ("anaglyph_red_cyan", StereoMode::AnaglyphRedCyan),
    ("anaglyph_magenta_green", StereoMode::AnaglyphGreenMagenta),
    ("anaglyph_blue_yellow", StereoMode::AnaglyphYellowBlue),
    ("hardware", StereoMode::HardwareBased),
];

/// Stereo layout tags carried by video containers. Layouts the renderer has
/// no output for map to [`StereoMode::Off`].
const VIDEO_TAGS: &[(&str, StereoMode)] = &[
    ("mono", StereoMode::Off),
    ("left_right", StereoMode::SideBySide),
    ("right_left", StereoMode::SideBySide),
    ("top_bottom", StereoMode::TopBottom),
    ("bottom_top", StereoMode::TopBottom),
    ("checkerboard_rl", StereoMode::Checkerboard),
    ("checkerboard_lr", StereoMode::Checkerboard),
    ("row_interleaved_rl", StereoMode::Interlaced),
    ("row_interleaved_lr", StereoMode::Interlaced),
    ("col_interleaved_rl", StereoMode::Off),
    ("col_interleaved_lr", StereoMode::Off),
    ("anaglyph_cyan_red", StereoMode::AnaglyphRedCyan),
    ("anaglyph_green_magenta", StereoMode::AnaglyphGreenMagenta),
    ("anaglyph_yellow_blue", StereoMode::AnaglyphYellowBlue),
    ("block_lr", StereoMode::Off),
    ("block_rl", StereoMode::Off),
];

/// Markers recognised inside file names and free-form metadata.
pub const DEFAULT_MARKERS: &[(&str, StereoMode)] = &[
    ("sbs", StereoMode::SideBySide),
    ("hsbs", StereoMode::SideBySide),
    ("half_sbs", StereoMode::SideBySide),
    ("fsbs", StereoMode::SideBySide),
    ("full_sbs", StereoMode::SideBySide),
    ("side_by_side", StereoMode::SideBySide),
    ("tab", StereoMode::TopBottom),
    ("htab", StereoMode::TopBottom),
    ("half_tab", StereoMode::TopBottom),
    ("ftab", StereoMode::TopBottom),
    ("full_tab", StereoMode::TopBottom),
    ("half_ou", StereoMode::TopBottom),
    ("over_under", StereoMode::TopBottom),
    ("top_bottom", StereoMode::TopBottom),
    ("top_and_bottom", StereoMode::TopBottom),
    ("anaglyph", StereoMode::AnaglyphRedCyan),
];

const DELIMITERS: &str = r"[-._ ()\[\]]";

static DEFAULT_DETECTOR: LazyLock<StereoDetector> = LazyLock::new(|| {
    StereoDetector::new(std::iter::empty::<(String, StereoMode)>())
        .expect("built-in stereo markers should compile")
});

/// Folds case, surrounding whitespace and punctuation variants so that
/// `Side-By-Side`, `side by side` and `side_by_side` compare equal.
pub fn lookup_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        let ch = match ch {
            '-' | '.' | '/' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        };
        if ch == '_' && key.ends_with('_') {
            continue;
        }
        key.push(ch);
    }
    key
}

fn find_in(table: &[(&str, StereoMode)], key: &str) -> Option<StereoMode> {
    table
        .iter()
        .find(|(token, _)| *token == key)
        .map(|(_, mode)| *mode)
}

/// Resolves a GUI token or one of its synonyms.
pub fn gui_mode_for(raw: &str) -> Option<StereoMode> {
    let key = lookup_key(raw);
    StereoMode::ALL
        .into_iter()
        .find(|mode| mode.token() == key)
        .or_else(|| find_in(GUI_SYNONYMS, &key))
}

/// Resolves a video metadata tag, falling back to the GUI vocabulary.
pub fn video_mode_for(raw: &str) -> Option<StereoMode> {
    find_in(VIDEO_TAGS, &lookup_key(raw)).or_else(|| gui_mode_for(raw))
}

/// Resolves any spelling [`normalize_stereo_mode`] understands.
pub fn string_mode_for(raw: &str) -> Option<StereoMode> {
    gui_mode_for(&normalize_stereo_mode(raw))
}

/// Maps a mode name to its ordinal, or [`INVALID_MODE`]. The input is
/// normalized first.
pub fn convert_string_to_gui_stereo_mode(mode: &str) -> i32 {
    string_mode_for(mode).map_or(INVALID_MODE, StereoMode::ordinal)
}

/// Maps a video metadata tag to its mode ordinal, or [`INVALID_MODE`].
pub fn convert_video_to_gui_stereo_mode(mode: &str) -> i32 {
    video_mode_for(mode).map_or(INVALID_MODE, StereoMode::ordinal)
}

/// Canonical machine readable token of a mode.
pub fn convert_gui_stereo_mode_to_string(mode: StereoMode) -> &'static str {
    match mode {
        StereoMode::Off => "off",
        StereoMode::TopBottom => "split_horizontal",
        StereoMode::SideBySide => "split_vertical",
        StereoMode::AnaglyphRedCyan => "anaglyph_cyan_red",
        StereoMode::AnaglyphGreenMagenta => "anaglyph_green_magenta",
        StereoMode::AnaglyphYellowBlue => "anaglyph_yellow_blue",
        StereoMode::Interlaced => "row_interleaved",
        StereoMode::Checkerboard => "checkerboard",
        StereoMode::HardwareBased => "hardware_based",
        StereoMode::Auto => "auto",
    }
}

/// Rewrites any recognised spelling to its canonical token. Input that names
/// no mode is returned unchanged.
pub fn normalize_stereo_mode(mode: &str) -> String {
    match video_mode_for(mode) {
        Some(resolved) => resolved.token().to_string(),
        None => mode.to_string(),
    }
}

/// Scans `needle` with the built-in markers. See [`StereoDetector::detect`].
pub fn detect_stereo_mode_by_string(needle: &str) -> String {
    DEFAULT_DETECTOR.detect_token(needle)
}

/// Finds stereo markers such as `HSBS` or `Half-OU` inside file names.
///
/// A marker only counts when it is bounded by the start or end of the input
/// or by one of `- . _ space ( ) [ ]`. The leftmost marker in the needle
/// wins; among markers starting at the same place the longest one wins.
#[derive(Debug, Clone)]
pub struct StereoDetector {
    pattern: Regex,
    markers: HashMap<String, StereoMode>,
}

impl StereoDetector {
    /// Builds a detector from the built-in markers plus `extra` ones. Extra
    /// markers override built-in markers with the same spelling.
    pub fn new<I, S>(extra: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (S, StereoMode)>,
        S: AsRef<str>,
    {
        let mut markers: HashMap<String, StereoMode> = DEFAULT_MARKERS
            .iter()
            .map(|(marker, mode)| (lookup_key(marker), *mode))
            .collect();
        for (marker, mode) in extra {
            let key = lookup_key(marker.as_ref());
            if key.trim_matches('_').is_empty() {
                return Err(StereoError::Config(format!(
                    "stereo marker `{}` is empty",
                    marker.as_ref()
                )));
            }
            markers.insert(key, mode);
        }

        let mut keys: Vec<&String> = markers.keys().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let joiner = format!("{DELIMITERS}?");
        let alternatives: Vec<String> = keys
            .iter()
            .map(|key| {
                key.split('_')
                    .filter(|word| !word.is_empty())
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(joiner.as_str())
            })
            .collect();
        let pattern = format!(
            "(?i)(?:^|{DELIMITERS})({})(?:{DELIMITERS}|$)",
            alternatives.join("|")
        );
        let pattern = Regex::new(&pattern).map_err(|err| StereoError::Config(err.to_string()))?;

        let markers = markers
            .into_iter()
            .map(|(key, mode)| (compact(&key), mode))
            .collect();
        Ok(Self { pattern, markers })
    }

    /// Mode of the first marker found in `needle`.
    pub fn detect(&self, needle: &str) -> Option<StereoMode> {
        let captures = self.pattern.captures(needle)?;
        let found = captures.get(1)?.as_str();
        self.markers.get(&compact(&lookup_key(found))).copied()
    }

    /// Canonical token of the first marker found, or an empty string.
    pub fn detect_token(&self, needle: &str) -> String {
        self.detect(needle)
            .map(|mode| mode.token().to_string())
            .unwrap_or_default()
    }
}

impl Default for StereoDetector {
    fn default() -> Self {
        DEFAULT_DETECTOR.clone()
    }
}

fn compact(key: &str) -> String {
    key.chars()
        .filter(|ch| !matches!(ch, '_' | '(' | ')' | '[' | ']'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gui_tokens_round_trip() {
        for mode in StereoMode::ALL {
            let token = convert_gui_stereo_mode_to_string(mode);
            assert_eq!(convert_string_to_gui_stereo_mode(token), mode.ordinal());
        }
    }

    #[test]
    fn unknown_strings_map_to_sentinel() {
        for raw in ["", "   ", "holographic", "split", "left_right_left", "3d"] {
            assert_eq!(convert_string_to_gui_stereo_mode(raw), INVALID_MODE, "{raw:?}");
        }
        assert_eq!(convert_video_to_gui_stereo_mode("wobble"), INVALID_MODE);
    }

    #[test]
    fn matching_ignores_case_and_punctuation() {
        let expected = StereoMode::SideBySide.ordinal();
        assert_eq!(convert_string_to_gui_stereo_mode("SBS"), expected);
        assert_eq!(convert_string_to_gui_stereo_mode("Side-By-Side"), expected);
        assert_eq!(convert_string_to_gui_stereo_mode(" side by  side "), expected);
        assert_eq!(convert_string_to_gui_stereo_mode("Split.Vertical"), expected);
    }

    #[test]
    fn video_tags_use_their_own_vocabulary() {
        assert_eq!(
            convert_video_to_gui_stereo_mode("right_left"),
            StereoMode::SideBySide.ordinal()
        );
        assert_eq!(
            convert_video_to_gui_stereo_mode("bottom_top"),
            StereoMode::TopBottom.ordinal()
        );
        assert_eq!(convert_video_to_gui_stereo_mode("block_lr"), 0);
        assert_eq!(convert_video_to_gui_stereo_mode("mono"), 0);
        // GUI tokens are still understood through the fallback.
        assert_eq!(
            convert_video_to_gui_stereo_mode("checkerboard"),
            StereoMode::Checkerboard.ordinal()
        );
    }

    #[test]
    fn string_conversion_agrees_with_normalization() {
        for raw in ["right_left", "mono", "Bottom-Top", "HSBS", "row_interleaved_lr"] {
            let normalized = normalize_stereo_mode(raw);
            assert_eq!(
                convert_string_to_gui_stereo_mode(raw),
                convert_string_to_gui_stereo_mode(&normalized),
                "{raw} -> {normalized}"
            );
        }
        assert_eq!(
            convert_string_to_gui_stereo_mode("right_left"),
            StereoMode::SideBySide.ordinal()
        );
        assert_eq!(convert_string_to_gui_stereo_mode("mono"), 0);
        assert_eq!(convert_string_to_gui_stereo_mode("Holo-Deck"), INVALID_MODE);
    }

    #[test]
    fn normalizes_synonyms_and_passes_unknown_input_through() {
        assert_eq!(normalize_stereo_mode("HSBS"), "split_vertical");
        assert_eq!(normalize_stereo_mode("top_bottom"), "split_horizontal");
        assert_eq!(normalize_stereo_mode("Interlaced"), "row_interleaved");
        assert_eq!(normalize_stereo_mode("mono"), "off");
        assert_eq!(normalize_stereo_mode("Holo-Deck"), "Holo-Deck");
        assert_eq!(normalize_stereo_mode(""), "");
    }

    #[test]
    fn detects_half_side_by_side_in_file_names() {
        assert_eq!(
            detect_stereo_mode_by_string("Movie.Name.HSBS.2019.mkv"),
            "split_vertical"
        );
        assert_eq!(
            detect_stereo_mode_by_string("Movie Name (2019) [Half-OU].mkv"),
            "split_horizontal"
        );
        assert_eq!(detect_stereo_mode_by_string("movie.3d.tab.mkv"), "split_horizontal");
        assert_eq!(detect_stereo_mode_by_string("sbs"), "split_vertical");
    }

    #[test]
    fn ignores_markers_inside_words() {
        assert_eq!(detect_stereo_mode_by_string("Tablet.Review.2019.mkv"), "");
        assert_eq!(detect_stereo_mode_by_string("Subsonic.mkv"), "");
        assert_eq!(detect_stereo_mode_by_string(""), "");
    }

    #[test]
    fn leftmost_marker_wins() {
        assert_eq!(
            detect_stereo_mode_by_string("Show.TAB.remux.SBS.mkv"),
            "split_horizontal"
        );
        assert_eq!(
            detect_stereo_mode_by_string("Show.SBS.remux.TAB.mkv"),
            "split_vertical"
        );
    }

    #[test]
    fn longest_marker_wins_at_same_position() {
        let detector = StereoDetector::new([("half", StereoMode::Checkerboard)]).unwrap();
        // `half` alone is a marker, but `half.sbs` is longer and starts at the same place.
        assert_eq!(
            detector.detect("Film.Half.SBS.mkv"),
            Some(StereoMode::SideBySide)
        );
        assert_eq!(
            detector.detect("Film.Half.2019.mkv"),
            Some(StereoMode::Checkerboard)
        );
    }

    #[test]
    fn extra_markers_extend_and_override() {
        let detector = StereoDetector::new([
            ("3dsbs", StereoMode::SideBySide),
            ("tab", StereoMode::Checkerboard),
        ])
        .unwrap();
        assert_eq!(detector.detect("clip_3DSBS.mp4"), Some(StereoMode::SideBySide));
        assert_eq!(detector.detect("clip.tab.mp4"), Some(StereoMode::Checkerboard));

        assert!(StereoDetector::new([(" - ", StereoMode::SideBySide)]).is_err());
    }
}
