/// Dashboard controller: owns the UI state, issues fetches, applies results
///
/// Fetches run as independent tokio tasks and report back over a channel.
/// Each request is tagged with a monotonically increasing sequence number and
/// only the outcome of the most recently issued request is applied, so a slow
/// response for a previously selected symbol can never overwrite newer data.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::client::ChainSource;
use super::error::FetchError;
use super::refresh::RefreshTimer;
use super::state::{DashboardConfig, DashboardState};
use super::types::ChainUpdate;
use super::view::{self, DashboardView};

/// Wall clock used for the "last update" stamp
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Result of one fetch, tagged with the request that produced it
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub seq: u64,
    pub symbol: String,
    pub result: Result<ChainUpdate, FetchError>,
}

/// Messages delivered to the controller
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// Auto-refresh timer fired
    Tick,
    Fetched(FetchOutcome),
}

pub struct DashboardController {
    state: DashboardState,
    source: Arc<dyn ChainSource>,
    clock: Arc<dyn Clock>,
    event_tx: mpsc::UnboundedSender<ControllerEvent>,
    event_rx: mpsc::UnboundedReceiver<ControllerEvent>,
    /// Sequence number of the most recently issued fetch
    latest_seq: u64,
    refresh: Option<RefreshTimer>,
}

impl DashboardController {
    pub fn new(
        config: DashboardConfig,
        source: Arc<dyn ChainSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            state: DashboardState::new(config),
            source,
            clock,
            event_tx,
            event_rx,
            latest_seq: 0,
            refresh: None,
        }
    }

    /// Initial fetch for the default symbol, then periodic refresh
    pub fn start(&mut self) {
        info!(
            symbol = %self.state.current_symbol,
            interval_ms = self.state.refresh_interval.as_millis() as u64,
            "Starting option chain dashboard"
        );
        self.load_data();
        self.start_auto_refresh();
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn view(&self) -> DashboardView {
        view::render(&self.state)
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Select `symbol` and fetch it immediately; any string is accepted
    pub fn switch_symbol(&mut self, symbol: impl Into<String>) -> u64 {
        let symbol = symbol.into();
        info!(from = %self.state.current_symbol, to = %symbol, "Switching symbol");
        self.state.select_symbol(symbol);
        self.load_data()
    }

    /// Fire-and-forget fetch for the current symbol, returns its sequence number
    pub fn load_data(&mut self) -> u64 {
        self.latest_seq += 1;
        let seq = self.latest_seq;
        let symbol = self.state.current_symbol.clone();
        self.state.fetching = true;

        let source = Arc::clone(&self.source);
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch(&symbol).await;
            if event_tx
                .send(ControllerEvent::Fetched(FetchOutcome { seq, symbol, result }))
                .is_err()
            {
                debug!(seq, "Controller dropped before fetch completed");
            }
        });

        seq
    }

    /// Apply one event; returns true when the view needs redrawing
    pub fn handle_event(&mut self, event: ControllerEvent) -> bool {
        match event {
            ControllerEvent::Tick => self.on_tick().is_some(),
            ControllerEvent::Fetched(outcome) => self.apply_outcome(outcome),
        }
    }

    /// Apply every event already queued without waiting
    pub fn drain(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.event_rx.try_recv() {
            changed |= self.handle_event(event);
        }
        changed
    }

    /// Wait for the next event and apply it
    pub async fn next_event(&mut self) -> bool {
        match self.event_rx.recv().await {
            Some(event) => self.handle_event(event),
            None => false,
        }
    }

    /// Timer tick: refresh only if auto-refresh is enabled right now
    pub fn on_tick(&mut self) -> Option<u64> {
        if self.state.auto_refresh_enabled {
            Some(self.load_data())
        } else {
            debug!("Auto-refresh disabled, skipping tick");
            None
        }
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) -> bool {
        let FetchOutcome { seq, symbol, result } = outcome;

        if seq != self.latest_seq {
            debug!(seq, latest = self.latest_seq, %symbol, "Discarding stale response");
            return false;
        }
        self.state.fetching = false;

        match result {
            Ok(update) => {
                self.state.last_payload = Some(update.snapshot);
                self.state.data_as_of = update.as_of;
                self.state.payload_symbol = Some(symbol);
                self.update_dashboard();
            }
            Err(e) => {
                error!(%symbol, status = e.status(), error = %e, "Error fetching data");
            }
        }
        true
    }

    /// Stamp the re-render time; the view itself is rebuilt from state on demand
    fn update_dashboard(&mut self) {
        self.state.last_updated = Some(self.clock.now());
    }

    /// Filter table rows by strike substring
    pub fn filter_strikes(&mut self, term: impl Into<String>) {
        self.state.search_term = term.into();
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.state.auto_refresh_enabled = enabled;
    }

    pub fn toggle_auto_refresh(&mut self) -> bool {
        self.state.auto_refresh_enabled = !self.state.auto_refresh_enabled;
        info!(enabled = self.state.auto_refresh_enabled, "Auto-refresh toggled");
        self.state.auto_refresh_enabled
    }

    /// Start the refresh timer if it is not already running
    pub fn start_auto_refresh(&mut self) {
        if self.refresh.as_ref().is_some_and(RefreshTimer::is_running) {
            return;
        }
        self.refresh = Some(RefreshTimer::start(
            self.state.refresh_interval,
            self.event_tx.clone(),
            ControllerEvent::Tick,
        ));
    }

    pub fn is_auto_refresh_running(&self) -> bool {
        self.refresh.as_ref().is_some_and(RefreshTimer::is_running)
    }

    /// Teardown: cancel the refresh timer
    pub fn stop(&mut self) {
        if let Some(mut timer) = self.refresh.take() {
            timer.stop();
            info!("Auto-refresh stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::{OptionChainSnapshot, PcrSummary, SkewPatterns};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::time::Duration;
    use tokio::sync::oneshot;

    type Responder = oneshot::Sender<Result<ChainUpdate, FetchError>>;

    /// Source whose responses are released by the test, in any order
    struct ScriptedSource {
        calls_tx: mpsc::UnboundedSender<(String, Responder)>,
    }

    impl ScriptedSource {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(String, Responder)>) {
            let (calls_tx, calls_rx) = mpsc::unbounded_channel();
            (Arc::new(Self { calls_tx }), calls_rx)
        }
    }

    #[async_trait]
    impl ChainSource for ScriptedSource {
        async fn fetch(&self, symbol: &str) -> Result<ChainUpdate, FetchError> {
            let (tx, rx) = oneshot::channel();
            self.calls_tx.send((symbol.to_string(), tx)).unwrap();
            rx.await
                .unwrap_or_else(|_| Err(FetchError::Transport("responder dropped".to_string())))
        }
    }

    struct FixedClock(DateTime<Local>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Local> {
            self.0
        }
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap()
    }

    fn update(spot_price: f64) -> ChainUpdate {
        ChainUpdate {
            snapshot: OptionChainSnapshot {
                spot_price,
                pcr: PcrSummary {
                    pcr_oi: 1.0,
                    total_ce_oi: 100_000.0,
                    total_pe_oi: 100_000.0,
                },
                max_pain: spot_price,
                skew_patterns: SkewPatterns::default(),
                strike_data: vec![],
            },
            as_of: None,
        }
    }

    /// Pull the BANKNIFTY and NIFTY responders regardless of task start order
    async fn responders(
        calls: &mut mpsc::UnboundedReceiver<(String, Responder)>,
    ) -> (Responder, Responder) {
        let first = calls.recv().await.unwrap();
        let second = calls.recv().await.unwrap();
        match (first.0.as_str(), second.0.as_str()) {
            ("BANKNIFTY", "NIFTY") => (first.1, second.1),
            ("NIFTY", "BANKNIFTY") => (second.1, first.1),
            other => panic!("unexpected fetches: {other:?}"),
        }
    }

    fn controller(source: Arc<ScriptedSource>) -> DashboardController {
        DashboardController::new(
            DashboardConfig::default(),
            source,
            Arc::new(FixedClock(fixed_time())),
        )
    }

    #[tokio::test]
    async fn test_start_fetches_default_symbol() {
        let (source, mut calls) = ScriptedSource::new();
        let mut controller = controller(source);
        controller.start();
        assert!(controller.state().fetching);
        assert!(controller.is_auto_refresh_running());

        let (symbol, responder) = calls.recv().await.unwrap();
        assert_eq!(symbol, "NIFTY");
        responder.send(Ok(update(17000.0))).unwrap();

        assert!(controller.next_event().await);
        let state = controller.state();
        assert_eq!(state.last_payload.as_ref().unwrap().spot_price, 17000.0);
        assert_eq!(state.payload_symbol.as_deref(), Some("NIFTY"));
        assert_eq!(state.last_updated, Some(fixed_time()));
        assert!(!state.fetching);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_payload() {
        let (source, mut calls) = ScriptedSource::new();
        let mut controller = controller(source);

        controller.load_data();
        let (_, responder) = calls.recv().await.unwrap();
        responder.send(Ok(update(17000.0))).unwrap();
        controller.next_event().await;

        controller.load_data();
        let (_, responder) = calls.recv().await.unwrap();
        responder
            .send(Err(FetchError::Status {
                status: 500,
                message: "Internal Server Error".to_string(),
            }))
            .unwrap();
        assert!(controller.next_event().await);

        let state = controller.state();
        assert_eq!(state.last_payload.as_ref().unwrap().spot_price, 17000.0);
        assert!(!state.fetching);
    }

    #[tokio::test]
    async fn test_stale_response_after_newer_is_discarded() {
        let (source, mut calls) = ScriptedSource::new();
        let mut controller = controller(source);

        // NIFTY -> BANKNIFTY -> NIFTY
        let seq_b = controller.switch_symbol("BANKNIFTY");
        let seq_a = controller.switch_symbol("NIFTY");
        assert!(seq_a > seq_b);

        let (responder_b, responder_a) = responders(&mut calls).await;

        // Newer request resolves first, older one later
        responder_a.send(Ok(update(17000.0))).unwrap();
        assert!(controller.next_event().await);
        responder_b.send(Ok(update(45000.0))).unwrap();
        assert!(!controller.next_event().await);

        let state = controller.state();
        assert_eq!(state.current_symbol, "NIFTY");
        assert_eq!(state.payload_symbol.as_deref(), Some("NIFTY"));
        assert_eq!(state.last_payload.as_ref().unwrap().spot_price, 17000.0);
    }

    #[tokio::test]
    async fn test_stale_response_before_newer_is_discarded() {
        let (source, mut calls) = ScriptedSource::new();
        let mut controller = controller(source);

        controller.switch_symbol("BANKNIFTY");
        controller.switch_symbol("NIFTY");
        let (responder_b, responder_a) = responders(&mut calls).await;

        responder_b.send(Ok(update(45000.0))).unwrap();
        assert!(!controller.next_event().await);
        assert!(controller.state().last_payload.is_none());
        assert!(controller.state().fetching);

        responder_a.send(Ok(update(17000.0))).unwrap();
        assert!(controller.next_event().await);
        assert_eq!(controller.state().last_payload.as_ref().unwrap().spot_price, 17000.0);
    }

    #[tokio::test]
    async fn test_switch_symbol_marks_single_active_tab() {
        let (source, _calls) = ScriptedSource::new();
        let mut controller = controller(source);

        controller.switch_symbol("RELIANCE");
        let view = controller.view();
        let active: Vec<_> = view.tabs.iter().filter(|t| t.active).map(|t| t.symbol.as_str()).collect();
        assert_eq!(active, vec!["RELIANCE"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_checks_auto_refresh_each_time() {
        let (source, mut calls) = ScriptedSource::new();
        let mut controller = controller(source);
        controller.start();

        let (_, responder) = calls.recv().await.unwrap();
        responder.send(Ok(update(17000.0))).unwrap();
        controller.next_event().await;
        let seq = controller.latest_seq();

        controller.set_auto_refresh(false);
        assert!(!controller.next_event().await); // tick at 30s, skipped
        assert_eq!(controller.latest_seq(), seq);

        controller.set_auto_refresh(true);
        assert!(controller.next_event().await); // tick at 60s, fetches
        assert_eq!(controller.latest_seq(), seq + 1);
        let (symbol, _responder) = calls.recv().await.unwrap();
        assert_eq!(symbol, "NIFTY");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_refresh() {
        let (source, _calls) = ScriptedSource::new();
        let mut controller = controller(source);
        controller.start_auto_refresh();
        assert!(controller.is_auto_refresh_running());

        controller.stop();
        assert!(!controller.is_auto_refresh_running());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!controller.drain());
        assert_eq!(controller.latest_seq(), 0);
    }

    #[tokio::test]
    async fn test_filter_strikes_updates_view() {
        let (source, _calls) = ScriptedSource::new();
        let mut controller = controller(source);
        controller.filter_strikes("250");
        assert_eq!(controller.view().footer.search_term, "250");
        assert!(!controller.toggle_auto_refresh());
    }
}
