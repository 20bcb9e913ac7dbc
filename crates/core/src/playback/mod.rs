use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::PlaybackInfo;

/// Item currently playing, as seen by the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NowPlaying {
    /// Raw stereo tag from the video stream.
    pub stereo_tag: Option<String>,
    pub file_name: Option<String>,
}

impl NowPlaying {
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            stereo_tag: Some(tag.into()),
            file_name: None,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self {
            stereo_tag: None,
            file_name: Some(name.into()),
        }
    }
}

/// In-memory [`PlaybackInfo`] that callers update as playback starts and
/// stops.
#[derive(Debug, Default)]
pub struct PlaybackSnapshot {
    playing: Mutex<Option<NowPlaying>>,
}

impl PlaybackSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, item: NowPlaying) {
        *self.lock() = Some(item);
    }

    pub fn stop(&self) {
        *self.lock() = None;
    }

    pub fn is_playing(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<NowPlaying>> {
        self.playing.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PlaybackInfo for PlaybackSnapshot {
    fn current_video_stereo_mode(&self) -> Option<String> {
        self.lock()
            .as_ref()
            .and_then(|item| item.stereo_tag.clone())
            .filter(|tag| !tag.trim().is_empty())
    }

    fn current_file_name(&self) -> Option<String> {
        self.lock().as_ref().and_then(|item| item.file_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_nothing_when_idle() {
        let playback = PlaybackSnapshot::new();
        assert!(!playback.is_playing());
        assert_eq!(playback.current_video_stereo_mode(), None);
        assert_eq!(playback.current_file_name(), None);
    }

    #[test]
    fn blank_tags_count_as_missing() {
        let playback = PlaybackSnapshot::new();
        playback.start(NowPlaying::tagged("  "));
        assert_eq!(playback.current_video_stereo_mode(), None);

        playback.start(NowPlaying::tagged("left_right"));
        assert_eq!(playback.current_video_stereo_mode().as_deref(), Some("left_right"));
        assert!(playback.is_stereoscopic_content());

        playback.stop();
        assert!(!playback.is_stereoscopic_content());
    }
}
