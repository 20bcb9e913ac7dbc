use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{RenderSystem, StereoMode};

/// In-memory display backend. It keeps track of the mode on screen, the
/// modes it claims to support and every mode it was asked to apply.
#[derive(Debug)]
pub struct SimulatedDisplay {
    supported: Vec<StereoMode>,
    state: Mutex<DisplayState>,
}

#[derive(Debug, Default)]
struct DisplayState {
    current: StereoMode,
    applied: Vec<StereoMode>,
}

impl SimulatedDisplay {
    /// Display that supports the given modes. [`StereoMode::Off`] is always
    /// supported, [`StereoMode::Auto`] is dropped and the list is kept in
    /// ordinal order.
    pub fn new(supported: impl IntoIterator<Item = StereoMode>) -> Self {
        let mut supported: Vec<StereoMode> = std::iter::once(StereoMode::Off)
            .chain(supported)
            .filter(|mode| *mode != StereoMode::Auto)
            .collect();
        supported.sort_by_key(|mode| mode.ordinal());
        supported.dedup();
        Self {
            supported,
            state: Mutex::new(DisplayState::default()),
        }
    }

    /// Display that supports every concrete mode.
    pub fn full() -> Self {
        Self::new(StereoMode::CYCLE)
    }

    /// Modes passed to [`RenderSystem::apply_mode`], oldest first.
    pub fn applied(&self) -> Vec<StereoMode> {
        self.lock().applied.clone()
    }

    fn lock(&self) -> MutexGuard<'_, DisplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatedDisplay {
    fn default() -> Self {
        Self::full()
    }
}

impl RenderSystem for SimulatedDisplay {
    fn current_mode(&self) -> StereoMode {
        self.lock().current
    }

    fn apply_mode(&self, mode: StereoMode) {
        let mut state = self.lock();
        state.current = mode;
        state.applied.push(mode);
    }

    fn supported_modes(&self) -> Vec<StereoMode> {
        self.supported.clone()
    }
}
