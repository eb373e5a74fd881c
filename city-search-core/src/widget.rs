use std::{fmt, sync::Arc, time::Duration};

use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    error::LoadError,
    loader::OptionLoader,
    model::{OptionPage, SelectableOption},
    session::{SearchSession, SearchUpdate},
};

pub const PLACEHOLDER: &str = "Search for city";

/// Idle time after the last keystroke before options are loaded.
pub const DEBOUNCE_TIMEOUT: Duration = Duration::from_millis(600);

/// Called with the new selection every time it changes.
pub type SearchChangeCallback = Box<dyn FnMut(Option<&SelectableOption>) + Send>;

/// What the dropdown list should currently show.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OptionsState {
    #[default]
    Idle,
    Ready(OptionPage),
    Failed { query: String, message: String },
}

/// Owns the selected city and forwards selection changes to the host.
pub struct SearchWidget {
    loader: Arc<dyn OptionLoader>,
    selection: Option<SelectableOption>,
    on_search_change: SearchChangeCallback,
    options: OptionsState,
    last_applied: u64,
}

impl SearchWidget {
    pub fn new(
        loader: Arc<dyn OptionLoader>,
        on_search_change: impl FnMut(Option<&SelectableOption>) + Send + 'static,
    ) -> Self {
        Self {
            loader,
            selection: None,
            on_search_change: Box::new(on_search_change),
            options: OptionsState::Idle,
            last_applied: 0,
        }
    }

    pub fn placeholder(&self) -> &'static str {
        PLACEHOLDER
    }

    pub fn debounce_timeout(&self) -> Duration {
        DEBOUNCE_TIMEOUT
    }

    /// The controlled value handed to the dropdown.
    pub fn value(&self) -> Option<&SelectableOption> {
        self.selection.as_ref()
    }

    pub fn loader(&self) -> Arc<dyn OptionLoader> {
        Arc::clone(&self.loader)
    }

    pub fn options(&self) -> &OptionsState {
        &self.options
    }

    /// Store the selection, then notify the host with the same value.
    ///
    /// `None` means the field was cleared and is forwarded as well.
    pub fn on_selection_change(&mut self, selected: Option<SelectableOption>) {
        tracing::debug!(selected = ?selected.as_ref().map(|s| &s.label), "selection changed");
        self.selection = selected;
        (self.on_search_change)(self.selection.as_ref());
    }

    pub async fn load_options(&self, input: &str) -> Result<OptionPage, LoadError> {
        self.loader.load_options(input).await
    }

    /// Start a debounced session feeding this widget's loader.
    ///
    /// Sequence numbers restart with every session, so the stale-update
    /// guard and the option list are reset too.
    pub fn start_session(&mut self) -> (SearchSession, UnboundedReceiver<SearchUpdate>) {
        self.last_applied = 0;
        self.options = OptionsState::Idle;
        SearchSession::spawn(self.loader(), DEBOUNCE_TIMEOUT)
    }

    /// Apply a session update. Returns `false` when a newer one was already applied.
    pub fn apply_update(&mut self, update: SearchUpdate) -> bool {
        if update.seq < self.last_applied {
            tracing::debug!(seq = update.seq, last = self.last_applied, "dropping stale update");
            return false;
        }
        self.last_applied = update.seq;

        self.options = match update.outcome {
            Ok(page) => OptionsState::Ready(page),
            Err(e) => OptionsState::Failed { query: update.query, message: e.user_message() },
        };
        true
    }
}

impl fmt::Debug for SearchWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchWidget")
            .field("loader", &self.loader)
            .field("selection", &self.selection)
            .field("options", &self.options)
            .field("last_applied", &self.last_applied)
            .finish_non_exhaustive()
    }
}
