/// Dashboard state owned by the controller

use std::time::Duration;

use chrono::{DateTime, Local};

use super::types::OptionChainSnapshot;

/// Symbol selected on startup
pub const DEFAULT_SYMBOL: &str = "NIFTY";

/// Auto-refresh period (30s)
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(30_000);

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Symbol selected on startup
    pub default_symbol: String,
    /// Symbols offered as tabs
    pub symbols: Vec<String>,
    /// Period of the auto-refresh timer
    pub refresh_interval: Duration,
    /// Initial auto-refresh flag
    pub auto_refresh: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_symbol: DEFAULT_SYMBOL.to_string(),
            symbols: vec!["NIFTY".to_string(), "BANKNIFTY".to_string()],
            refresh_interval: REFRESH_INTERVAL,
            auto_refresh: true,
        }
    }
}

impl DashboardConfig {
    /// Set the symbols offered as tabs
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }
}

/// Mutable UI state, only touched by the controller
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub current_symbol: String,
    /// Tab order; always contains `current_symbol` exactly once
    pub symbols: Vec<String>,
    /// Last successfully fetched snapshot, replaced whole on each fetch
    pub last_payload: Option<OptionChainSnapshot>,
    /// Symbol `last_payload` was fetched for
    pub payload_symbol: Option<String>,
    pub auto_refresh_enabled: bool,
    pub refresh_interval: Duration,
    /// Strike filter applied to table rows
    pub search_term: String,
    /// Local time of the last re-render triggered by a fetch
    pub last_updated: Option<DateTime<Local>>,
    /// Backend generation timestamp of `last_payload`
    pub data_as_of: Option<String>,
    /// A fetch for the latest request is outstanding
    pub fetching: bool,
}

impl DashboardState {
    pub fn new(config: DashboardConfig) -> Self {
        let mut state = Self {
            current_symbol: String::new(),
            symbols: Vec::new(),
            last_payload: None,
            payload_symbol: None,
            auto_refresh_enabled: config.auto_refresh,
            refresh_interval: config.refresh_interval,
            search_term: String::new(),
            last_updated: None,
            data_as_of: None,
            fetching: false,
        };
        for symbol in config.symbols {
            if !symbol.is_empty() && !state.symbols.contains(&symbol) {
                state.symbols.push(symbol);
            }
        }
        state.select_symbol(config.default_symbol);
        state
    }

    /// Make `symbol` current; unknown symbols get a tab of their own
    pub fn select_symbol(&mut self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        if !self.symbols.contains(&symbol) {
            self.symbols.push(symbol.clone());
        }
        self.current_symbol = symbol;
    }

    /// Index of the active tab
    pub fn active_tab(&self) -> Option<usize> {
        self.symbols.iter().position(|s| *s == self.current_symbol)
    }

    /// Symbol `offset` tabs away from the current one, wrapping around
    pub fn cycle_symbol(&self, offset: isize) -> Option<&str> {
        let len = self.symbols.len() as isize;
        if len == 0 {
            return None;
        }
        let current = self.active_tab().unwrap_or(0) as isize;
        let next = (current + offset).rem_euclid(len) as usize;
        self.symbols.get(next).map(String::as_str)
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = DashboardState::default();
        assert_eq!(state.current_symbol, "NIFTY");
        assert!(state.auto_refresh_enabled);
        assert_eq!(state.refresh_interval, Duration::from_millis(30_000));
        assert!(state.last_payload.is_none());
        assert_eq!(state.active_tab(), Some(0));
    }

    #[test]
    fn test_default_symbol_added_to_tabs() {
        let state = DashboardState::new(DashboardConfig::default().with_symbols(["BANKNIFTY", "FINNIFTY"]));
        assert_eq!(state.symbols, vec!["BANKNIFTY", "FINNIFTY", "NIFTY"]);
        assert_eq!(state.active_tab(), Some(2));
    }

    #[test]
    fn test_select_unknown_symbol() {
        let mut state = DashboardState::default();
        state.select_symbol("RELIANCE");
        assert_eq!(state.current_symbol, "RELIANCE");
        assert_eq!(state.symbols.iter().filter(|s| *s == "RELIANCE").count(), 1);

        state.select_symbol("RELIANCE");
        assert_eq!(state.symbols.len(), 3);
    }

    #[test]
    fn test_cycle_symbol() {
        let state = DashboardState::default();
        assert_eq!(state.cycle_symbol(1), Some("BANKNIFTY"));
        assert_eq!(state.cycle_symbol(-1), Some("BANKNIFTY"));
        assert_eq!(state.cycle_symbol(2), Some("NIFTY"));
    }
}
