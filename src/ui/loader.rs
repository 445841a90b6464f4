//! Busy indicator shown while a backend request is in flight.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Reference-counted busy indicator. Every `show` must be paired with a `hide`.
pub trait Loader: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// Shows the loader on creation and hides it on drop.
pub struct LoaderGuard<'a> {
    loader: &'a dyn Loader,
}

impl<'a> LoaderGuard<'a> {
    pub fn new(loader: &'a dyn Loader) -> Self {
        loader.show();
        Self { loader }
    }
}

impl Drop for LoaderGuard<'_> {
    fn drop(&mut self) {
        self.loader.hide();
    }
}

#[derive(Debug, Default)]
pub struct NoopLoader;

impl Loader for NoopLoader {
    fn show(&self) {}
    fn hide(&self) {}
}

#[derive(Default)]
struct SpinnerState {
    depth: usize,
    bar: Option<ProgressBar>,
}

/// `indicatif` spinner; nested show/hide keeps a single spinner alive.
#[derive(Default)]
pub struct SpinnerLoader {
    state: Mutex<SpinnerState>,
}

impl SpinnerLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .depth
    }

    fn spinner() -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message("Working...");
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }
}

impl Loader for SpinnerLoader {
    fn show(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.depth += 1;
        if state.bar.is_none() {
            state.bar = Some(Self::spinner());
        }
    }

    fn hide(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 {
            if let Some(bar) = state.bar.take() {
                bar.finish_and_clear();
            }
        }
    }
}
