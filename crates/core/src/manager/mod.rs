//! The stereo mode coordinator.
//!
//! [`StereoscopicsManager`] decides which stereoscopic mode is on screen. It
//! reconciles three inputs:
//!
//! - the persisted user preference ([`SettingsStore::user_mode`]),
//! - the layout reported by the playing content, resolved according to the
//!   [`PlaybackModePolicy`],
//! - explicit user actions such as toggling or cycling through modes.
//!
//! The render backend is the source of truth for the mode on screen. The
//! coordinator only remembers what the user chose and, while content has
//! overridden that choice, which mode to go back to once playback stops.
//!
//! Nothing here fails loudly: unknown or unsupported modes fall back to
//! [`StereoMode::Off`] and are logged.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError, TryLockError,
};

use tracing::{debug, info, warn};

use crate::{
    naming, Action, CancelPrompt, Choice, ChoicePrompt, EnglishLabels, GuiMessage, Localizer,
    LogNotifier, MessageTarget, Notifier, PlaybackInfo, PlaybackModePolicy, RenderSystem,
    SettingCallback, SettingKey, SettingsStore, StereoDetector, StereoError, StereoMode, UiText,
};

/// Mutable part of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinatorState {
    /// Explicit last choice of the user, mirrored into the settings store.
    pub user_mode: StereoMode,
    /// The user choice before `user_mode`.
    pub last_user_mode: StereoMode,
    /// Mode on screen before content overrode it. `Some` while an override
    /// is active.
    pub override_restore: Option<StereoMode>,
}

/// Coordinates the active stereoscopic mode.
///
/// Operations that change the mode run one at a time under an operation
/// lock, so the user choice, the persisted setting and the mode on screen
/// agree once each call returns. The state lock is only held while fields
/// are read or written. A settings change reported while another operation
/// runs is queued and picked up by that operation before it releases the
/// operation lock, so a settings store may call back synchronously.
pub struct StereoscopicsManager {
    settings: Arc<dyn SettingsStore>,
    render: Arc<dyn RenderSystem>,
    playback: Arc<dyn PlaybackInfo>,
    prompt: Arc<dyn ChoicePrompt>,
    localizer: Arc<dyn Localizer>,
    notifier: Arc<dyn Notifier>,
    detector: StereoDetector,
    state: Mutex<CoordinatorState>,
    operation: Mutex<()>,
    resync_pending: AtomicBool,
}

impl StereoscopicsManager {
    /// Creates a coordinator with English labels, a logging notifier and no
    /// interactive prompt.
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        render: Arc<dyn RenderSystem>,
        playback: Arc<dyn PlaybackInfo>,
    ) -> Self {
        Self {
            settings,
            render,
            playback,
            prompt: Arc::new(CancelPrompt),
            localizer: Arc::new(EnglishLabels),
            notifier: Arc::new(LogNotifier),
            detector: StereoDetector::default(),
            state: Mutex::new(CoordinatorState::default()),
            operation: Mutex::new(()),
            resync_pending: AtomicBool::new(false),
        }
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn ChoicePrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = localizer;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_detector(mut self, detector: StereoDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Registers the coordinator for settings change notifications.
    pub fn subscribe(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.settings.register_callback(weak);
    }

    /// Loads the persisted user mode and puts it on screen.
    pub fn initialize(&self) {
        self.serialized(|| self.load_persisted_mode());
    }

    fn load_persisted_mode(&self) {
        let persisted = self.settings.user_mode();
        *self.lock() = CoordinatorState {
            user_mode: persisted,
            last_user_mode: persisted,
            override_restore: None,
        };
        info!(mode = %persisted, "initialising stereo mode from settings");
        self.set_stereo_mode(persisted, false);
    }

    /// Copy of the internal state.
    pub fn state(&self) -> CoordinatorState {
        *self.lock()
    }

    /// Mode currently on screen, as reported by the render backend.
    pub fn get_stereo_mode(&self) -> StereoMode {
        match self.render.current_mode() {
            StereoMode::Auto => StereoMode::Off,
            mode => mode,
        }
    }

    /// Records `mode` as the user's choice, persists it and applies it.
    pub fn set_stereo_mode_by_user(&self, mode: StereoMode) {
        self.serialized(|| self.select_user_mode(mode));
    }

    fn select_user_mode(&self, mode: StereoMode) {
        {
            let mut state = self.lock();
            if mode != state.user_mode {
                state.last_user_mode = state.user_mode;
            }
            state.user_mode = mode;
            state.override_restore = None;
        }
        debug!(mode = %mode, "stereo mode selected by user");
        self.settings.set_user_mode(mode);
        self.set_stereo_mode(mode, true);
    }

    /// Applies `mode` without touching the user's choice.
    ///
    /// [`StereoMode::Auto`] resolves to the layout of the playing content.
    /// Modes the display cannot show are replaced by [`StereoMode::Off`].
    pub fn set_stereo_mode(&self, mode: StereoMode, notify: bool) {
        let target = self.renderable(mode);
        self.apply_stereo_mode(target, notify);
    }

    /// Reconciles the display with the stream that just started.
    pub fn on_stream_change(&self) {
        self.serialized(|| self.reconcile_stream());
    }

    fn reconcile_stream(&self) {
        let Some(content) = self.content_mode() else {
            if self.playback.is_stereoscopic_content() {
                warn!("stereoscopic item has no recognised layout, leaving display alone");
            } else {
                debug!("playing item carries no stereo information");
            }
            return;
        };
        let current = self.get_stereo_mode();

        if content.is_off() {
            if !current.is_off() && self.settings.quit_stereo_mode_on_stop() {
                debug!("monoscopic content started, leaving stereo mode");
                self.set_stereo_mode(StereoMode::Off, true);
            }
            return;
        }

        let policy = self.settings.playback_policy();
        debug!(%policy, content = %content, current = %current, "resolving stereo mode for stream");
        if let Some(target) = self.target_for_policy(policy, content, true) {
            self.override_with(current, target);
        }
    }

    /// Puts back what content overrode, or leaves the user's choice alone.
    pub fn on_playback_stopped(&self) {
        self.serialized(|| self.restore_after_playback());
    }

    fn restore_after_playback(&self) {
        let restore = self.lock().override_restore.take();
        if self.settings.quit_stereo_mode_on_stop() {
            debug!("playback stopped, leaving stereo mode");
            self.set_stereo_mode(StereoMode::Off, true);
        } else if let Some(mode) = restore {
            debug!(mode = %mode, "playback stopped, restoring stereo mode");
            self.set_stereo_mode(mode, true);
        }
    }

    /// The preferred mode resolved to something the display can show. Has no
    /// side effects.
    pub fn get_preferred_playback_mode(&self) -> StereoMode {
        let preferred = self.settings.preferred_mode();
        let resolved = match preferred {
            StereoMode::Auto => self.get_stereo_mode_of_playing_video(),
            mode => mode,
        };
        if self.render.supports(resolved) {
            resolved
        } else {
            StereoMode::Off
        }
    }

    /// Steps through the supported modes in ordinal order.
    ///
    /// `step` may be negative and wraps around. The result is always a mode
    /// the display supports; [`StereoMode::Auto`] as a starting point counts
    /// as [`StereoMode::Off`].
    pub fn get_next_supported_stereo_mode(&self, current: StereoMode, step: i32) -> StereoMode {
        let cycle = StereoMode::CYCLE;
        let len = cycle.len() as i64;
        let mut index = current.cycle_index().unwrap_or(0) as i64;

        for _ in 0..cycle.len() {
            index = (index + i64::from(step)).rem_euclid(len);
            let candidate = cycle[index as usize];
            if self.render.supports(candidate) {
                return candidate;
            }
        }

        // Steps that share a factor with the cycle length skip some modes.
        cycle
            .into_iter()
            .find(|mode| self.render.supports(*mode))
            .unwrap_or(StereoMode::Off)
    }

    /// Layout of the playing content, [`StereoMode::Off`] when unknown.
    pub fn get_stereo_mode_of_playing_video(&self) -> StereoMode {
        let mode = self.content_mode().unwrap_or(StereoMode::Off);
        debug!(mode = %mode, "stereo mode of playing video");
        mode
    }

    /// Asks the user to pick any supported mode. Cancelling keeps the mode
    /// currently on screen.
    pub fn get_stereo_mode_by_user_choice(&self, heading: Option<&str>) -> StereoMode {
        self.ask_user_choice(heading)
            .unwrap_or_else(|| self.get_stereo_mode())
    }

    pub fn get_label_for_stereo_mode(&self, mode: StereoMode) -> String {
        self.localizer.label(mode)
    }

    /// See [`naming::detect_stereo_mode_by_string`]. Uses the configured
    /// markers.
    pub fn detect_stereo_mode_by_string(&self, needle: &str) -> String {
        self.detector.detect_token(needle)
    }

    /// Handles stereoscopic actions. Returns whether the action was consumed.
    pub fn on_action(&self, action: &Action) -> bool {
        let action = *action;
        if matches!(action, Action::Invalid | Action::Other(_)) {
            return false;
        }
        self.serialized(|| self.dispatch(action));
        true
    }

    fn dispatch(&self, action: Action) {
        match action {
            Action::NextStereoMode => {
                let next = self.get_next_supported_stereo_mode(self.get_stereo_mode(), 1);
                self.select_user_mode(next);
            }
            Action::PreviousStereoMode => {
                let previous = self.get_next_supported_stereo_mode(self.get_stereo_mode(), -1);
                self.select_user_mode(previous);
            }
            Action::ToggleStereoMode => {
                let target = self.toggle_target();
                self.select_user_mode(target);
            }
            Action::SelectStereoMode => {
                if let Some(mode) = self.ask_user_choice(None) {
                    self.select_user_mode(mode);
                }
            }
            Action::SetStereoMode(mode) => self.select_user_mode(mode),
            Action::Invalid | Action::Other(_) => {}
        }
    }

    /// Reacts to a persisted setting changing underneath the coordinator.
    pub fn on_setting_changed(&self, setting: SettingKey) {
        match setting {
            SettingKey::UserStereoMode => {
                let persisted = self.settings.user_mode();
                if self.lock().user_mode == persisted {
                    return;
                }
                self.resync_pending.store(true, Ordering::Release);
                self.drain_pending_resync();
            }
            SettingKey::PlaybackPolicy => self.serialized(|| self.reapply_policy()),
            SettingKey::PreferredStereoMode | SettingKey::QuitStereoModeOnStop => {
                debug!(?setting, "setting takes effect on next playback event");
            }
        }
    }

    /// Takes over a user mode written to the settings by someone else. Runs
    /// under the operation lock.
    fn adopt_persisted_user_mode(&self) {
        let persisted = self.settings.user_mode();
        let changed = {
            let mut state = self.lock();
            if state.user_mode == persisted {
                false
            } else {
                state.last_user_mode = state.user_mode;
                state.user_mode = persisted;
                state.override_restore = None;
                true
            }
        };
        if changed {
            debug!(mode = %persisted, "user stereo mode changed in settings");
            self.set_stereo_mode(persisted, false);
        }
    }

    fn reapply_policy(&self) {
        let policy = self.settings.playback_policy();
        let Some(content) = self.content_mode().filter(|mode| !mode.is_off()) else {
            return;
        };
        debug!(%policy, "playback policy changed during stereoscopic playback");
        let current = self.get_stereo_mode();
        if let Some(target) = self.target_for_policy(policy, content, false) {
            self.override_with(current, target);
        }
    }

    /// Observes playback start/stop. Never consumes the message.
    pub fn on_message(&self, message: &GuiMessage) -> bool {
        match message {
            GuiMessage::PlaybackStarted => self.on_stream_change(),
            GuiMessage::PlaybackStopped | GuiMessage::PlaylistStopped => {
                self.on_playback_stopped()
            }
            GuiMessage::Other(_) => {}
        }
        false
    }

    /// Mode chosen by `policy` for `content`, or `None` to leave the display
    /// alone.
    fn target_for_policy(
        &self,
        policy: PlaybackModePolicy,
        content: StereoMode,
        interactive: bool,
    ) -> Option<StereoMode> {
        match policy {
            PlaybackModePolicy::Ignore => None,
            PlaybackModePolicy::ForceMono => Some(StereoMode::Off),
            PlaybackModePolicy::PreferContent => Some(content),
            PlaybackModePolicy::Ask if interactive => Some(self.ask_playback_mode(content)),
            PlaybackModePolicy::Ask => None,
        }
    }

    fn override_with(&self, current: StereoMode, target: StereoMode) {
        {
            let mut state = self.lock();
            if state.override_restore.is_none() {
                state.override_restore = Some(current);
            }
        }
        self.set_stereo_mode(target, true);
    }

    fn ask_playback_mode(&self, content: StereoMode) -> StereoMode {
        let preferred = self.get_preferred_playback_mode();
        let mut options: Vec<Choice> = Vec::new();

        if self.render.supports(content) {
            options.push(Choice {
                mode: content,
                label: format!(
                    "{} ({})",
                    self.localizer.text(UiText::ContentMode),
                    self.localizer.label(content)
                ),
            });
        }
        if !options.iter().any(|choice| choice.mode == preferred) {
            options.push(Choice {
                mode: preferred,
                label: format!(
                    "{} ({})",
                    self.localizer.text(UiText::PreferredMode),
                    self.localizer.label(preferred)
                ),
            });
        }
        for mode in self.render.supported_modes() {
            if mode != StereoMode::Auto && !options.iter().any(|choice| choice.mode == mode) {
                options.push(Choice {
                    mode,
                    label: self.localizer.label(mode),
                });
            }
        }

        let heading = self.localizer.text(UiText::PlaybackModeHeading);
        match self.prompt.ask_choice(&heading, &options) {
            Some(mode) => mode,
            None => {
                debug!("stereo mode prompt cancelled, falling back to off");
                StereoMode::Off
            }
        }
    }

    fn ask_user_choice(&self, heading: Option<&str>) -> Option<StereoMode> {
        let mut options = vec![
            Choice {
                mode: StereoMode::Off,
                label: self.localizer.label(StereoMode::Off),
            },
            Choice {
                mode: StereoMode::Auto,
                label: self.localizer.label(StereoMode::Auto),
            },
        ];
        options.extend(
            self.render
                .supported_modes()
                .into_iter()
                .filter(|mode| !mode.is_off() && *mode != StereoMode::Auto)
                .map(|mode| Choice {
                    mode,
                    label: self.localizer.label(mode),
                }),
        );

        let heading = heading
            .map(str::to_string)
            .unwrap_or_else(|| self.localizer.text(UiText::SelectModeHeading));
        self.prompt.ask_choice(&heading, &options)
    }

    fn toggle_target(&self) -> StereoMode {
        if !self.get_stereo_mode().is_off() {
            return StereoMode::Off;
        }
        let state = self.state();
        if !state.user_mode.is_off() {
            state.user_mode
        } else if !state.last_user_mode.is_off() {
            state.last_user_mode
        } else {
            self.get_preferred_playback_mode()
        }
    }

    /// Layout reported by the playing item. A missing or unknown stream tag
    /// falls back to markers in the file name.
    fn content_mode(&self) -> Option<StereoMode> {
        if let Some(tag) = self.playback.current_video_stereo_mode() {
            match naming::video_mode_for(&tag) {
                Some(StereoMode::Auto) | None => {
                    warn!(tag = %tag, "ignoring unrecognised stereo tag");
                }
                Some(mode) => return Some(mode),
            }
        }
        let file_name = self.playback.current_file_name()?;
        self.detector.detect(&file_name)
    }

    fn renderable(&self, mode: StereoMode) -> StereoMode {
        let resolved = match mode {
            StereoMode::Auto => self.get_stereo_mode_of_playing_video(),
            mode => mode,
        };
        if self.render.supports(resolved) {
            resolved
        } else {
            warn!(error = %StereoError::UnsupportedMode(resolved), "falling back to off");
            StereoMode::Off
        }
    }

    fn apply_stereo_mode(&self, mode: StereoMode, notify: bool) {
        let current = self.get_stereo_mode();
        debug!(current = %current, target = %mode, "applying stereo mode");
        if current == mode {
            return;
        }

        self.render.apply_mode(mode);
        info!(mode = %mode, "stereo mode changed");
        if notify {
            self.notifier.notify(
                &self.localizer.text(UiText::ModeChanged),
                &self.get_label_for_stereo_mode(mode),
            );
        }
    }

    /// Runs `operation` under the operation lock, then applies any settings
    /// change that arrived meanwhile.
    fn serialized<R>(&self, operation: impl FnOnce() -> R) -> R {
        let result = {
            let _guard = self
                .operation
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            operation()
        };
        self.drain_pending_resync();
        result
    }

    /// Adopts the persisted user mode if a change is pending. When another
    /// operation holds the lock, that operation drains the flag on its way
    /// out.
    fn drain_pending_resync(&self) {
        while self.resync_pending.load(Ordering::Acquire) {
            let _guard = match self.operation.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };
            if self.resync_pending.swap(false, Ordering::AcqRel) {
                self.adopt_persisted_user_mode();
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("stereo coordinator state was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl SettingCallback for StereoscopicsManager {
    fn on_setting_changed(&self, setting: SettingKey) {
        StereoscopicsManager::on_setting_changed(self, setting);
    }
}

impl MessageTarget for StereoscopicsManager {
    fn on_message(&self, message: &GuiMessage) -> bool {
        StereoscopicsManager::on_message(self, message)
    }
}

impl std::fmt::Debug for StereoscopicsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StereoscopicsManager")
            .field("state", &self.state())
            .field("detector", &self.detector)
            .finish()
    }
}
