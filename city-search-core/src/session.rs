//! Debounced option loading.
//!
//! A [`SearchSession`] receives the input value after every keystroke and
//! only asks the loader once the input has been idle for the debounce
//! timeout. Starting a load aborts the previous one, and dropping the
//! session aborts whatever is still in flight.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

use crate::{error::LoadError, loader::OptionLoader, model::OptionPage};

/// Result of one debounced load.
#[derive(Debug)]
pub struct SearchUpdate {
    /// Increases by one for every load the session starts.
    pub seq: u64,
    pub query: String,
    pub outcome: Result<OptionPage, LoadError>,
}

/// Input side of a running session.
#[derive(Debug)]
pub struct SearchSession {
    input: UnboundedSender<String>,
    worker: JoinHandle<()>,
}

impl SearchSession {
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        loader: Arc<dyn OptionLoader>,
        debounce: Duration,
    ) -> (Self, UnboundedReceiver<SearchUpdate>) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(run(loader, debounce, input_rx, update_tx));

        (Self { input: input_tx, worker }, update_rx)
    }

    /// Report the current text of the input field.
    pub fn input(&self, text: impl Into<String>) {
        // The worker only stops once this sender is dropped.
        let _ = self.input.send(text.into());
    }

    /// Stop the session, discarding pending input and aborting any load.
    pub async fn close(self) {
        let Self { input, worker } = self;
        drop(input);
        if let Err(e) = worker.await {
            tracing::warn!("search session worker failed: {e}");
        }
    }
}

async fn run(
    loader: Arc<dyn OptionLoader>,
    debounce: Duration,
    mut input: UnboundedReceiver<String>,
    updates: UnboundedSender<SearchUpdate>,
) {
    let mut seq = 0u64;
    let mut in_flight: Option<JoinHandle<()>> = None;

    while let Some(mut pending) = input.recv().await {
        let mut closed = false;

        loop {
            match tokio::time::timeout(debounce, input.recv()).await {
                Ok(Some(next)) => pending = next,
                Ok(None) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        if closed {
            break;
        }

        if let Some(previous) = in_flight.take() {
            previous.abort();
        }

        seq += 1;
        tracing::debug!(seq, query = %pending, "debounce elapsed, starting load");

        let loader = Arc::clone(&loader);
        let updates = updates.clone();
        let load_seq = seq;
        in_flight = Some(tokio::spawn(async move {
            let outcome = loader.load_options(&pending).await;
            let _ = updates.send(SearchUpdate { seq: load_seq, query: pending, outcome });
        }));
    }

    if let Some(previous) = in_flight.take() {
        previous.abort();
    }
    tracing::debug!("search session closed");
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::SelectableOption;
    use async_trait::async_trait;
    use std::{collections::HashMap, sync::Mutex};

    /// Answers every query with one option labelled after it.
    #[derive(Debug, Default)]
    pub(crate) struct FakeLoader {
        pub calls: Mutex<Vec<String>>,
        pub delays: HashMap<String, Duration>,
    }

    impl FakeLoader {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OptionLoader for FakeLoader {
        async fn load_options(&self, input: &str) -> Result<OptionPage, LoadError> {
            self.calls.lock().unwrap().push(input.to_string());
            if let Some(delay) = self.delays.get(input) {
                tokio::time::sleep(*delay).await;
            }
            Ok(OptionPage { options: vec![SelectableOption::new("0 0", input)] })
        }
    }

    const DEBOUNCE: Duration = Duration::from_millis(600);

    async fn pause(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_keystrokes_trigger_one_load() {
        let loader = Arc::new(FakeLoader::default());
        let (session, mut updates) = SearchSession::spawn(loader.clone(), DEBOUNCE);

        session.input("L");
        pause(100).await;
        session.input("Lo");
        pause(100).await;
        session.input("Lon");

        let update = updates.recv().await.expect("one update");
        assert_eq!(update.seq, 1);
        assert_eq!(update.query, "Lon");
        assert_eq!(update.outcome.unwrap().options[0].label, "Lon");
        assert_eq!(loader.calls(), ["Lon"]);
    }

    #[tokio::test(start_paused = true)]
    async fn each_idle_gap_triggers_a_load() {
        let loader = Arc::new(FakeLoader::default());
        let (session, mut updates) = SearchSession::spawn(loader.clone(), DEBOUNCE);

        session.input("Par");
        pause(700).await;
        session.input("Pari");
        pause(700).await;

        let first = updates.recv().await.unwrap();
        let second = updates.recv().await.unwrap();
        assert_eq!((first.seq, first.query.as_str()), (1, "Par"));
        assert_eq!((second.seq, second.query.as_str()), (2, "Pari"));
        assert_eq!(loader.calls(), ["Par", "Pari"]);
    }

    #[tokio::test(start_paused = true)]
    async fn no_load_before_timeout_elapses() {
        let loader = Arc::new(FakeLoader::default());
        let (session, mut updates) = SearchSession::spawn(loader.clone(), DEBOUNCE);

        session.input("Ber");
        pause(599).await;
        assert!(updates.try_recv().is_err());
        assert!(loader.calls().is_empty());

        pause(2).await;
        assert_eq!(updates.recv().await.unwrap().query, "Ber");
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_load_is_aborted() {
        let mut delays = HashMap::new();
        delays.insert("Par".to_string(), Duration::from_secs(5));
        let loader = Arc::new(FakeLoader { delays, ..FakeLoader::default() });
        let (session, mut updates) = SearchSession::spawn(loader.clone(), DEBOUNCE);

        session.input("Par");
        pause(700).await;
        session.input("Paris");

        let update = updates.recv().await.unwrap();
        assert_eq!(update.seq, 2);
        assert_eq!(update.query, "Paris");

        drop(session);
        assert!(updates.recv().await.is_none());
        assert_eq!(loader.calls(), ["Par", "Paris"]);
    }

    #[tokio::test(start_paused = true)]
    async fn close_discards_pending_input() {
        let loader = Arc::new(FakeLoader::default());
        let (session, mut updates) = SearchSession::spawn(loader.clone(), DEBOUNCE);

        session.input("Ma");
        session.close().await;

        assert!(updates.recv().await.is_none());
        assert!(loader.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn close_survives_failed_worker() {
        let loader = Arc::new(FakeLoader::default());
        let (session, mut updates) = SearchSession::spawn(loader.clone(), DEBOUNCE);

        session.input("Ro");
        session.worker.abort();
        session.close().await;

        assert!(updates.recv().await.is_none());
        assert!(loader.calls().is_empty());
    }
}
