/// Option Chain TUI - Shared Library
///
/// Terminal dashboard over a pre-computed option chain analytics backend:
/// open interest, put-call ratio, max pain and OI skew per strike.
///
/// The library includes:
/// - Wire types for the `/api/data/{symbol}` payload
/// - HTTP client and the `ChainSource` seam it implements
/// - Dashboard controller with sequence-tagged fetches and a cancellable refresh timer
/// - Pure view model (`render(state)`) and the ratatui adapter that draws it
pub mod shared;

// Re-export commonly used types for convenience
pub use shared::types::{
    Buildup, ChainPayload, ChainUpdate, OptionChainSnapshot, PcrSummary, SkewPatterns, StrikeRow,
};

pub use shared::client::{ChainSource, ClientConfig, HttpChainClient};
pub use shared::controller::{
    Clock, ControllerEvent, DashboardController, FetchOutcome, SystemClock,
};
pub use shared::error::FetchError;
pub use shared::refresh::RefreshTimer;
pub use shared::state::{DashboardConfig, DashboardState, DEFAULT_SYMBOL, REFRESH_INTERVAL};

pub use shared::format::{format_number, CellClass, Signal};
pub use shared::view::{render, DashboardView};
pub use shared::widget::render_dashboard;
