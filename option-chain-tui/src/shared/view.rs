/// Pure projection of [`DashboardState`] into a renderable view model
///
/// Nothing in here touches the terminal. Every call rebuilds the whole view
/// from the stored snapshot; there is no diffing against the previous frame.

use chrono::{DateTime, Local};

use super::format::{
    buildup_cell, change_oi_cell, format_lakh, format_number, format_plain, oi_skew_cell,
    pcr_signal, ratio_text, skew_label, skew_signal, to_fixed, CellClass, Signal,
};
use super::state::DashboardState;
use super::types::{OptionChainSnapshot, StrikeRow};

/// Rows reserved for each chart
pub const CHART_HEIGHT: u16 = 14;

/// Table column headers, CE side mirrored around OI skew
pub const TABLE_HEADERS: [&str; 12] = [
    "Strike", "CE OI", "CE ΔOI", "CE Vol", "CE V/OI", "CE Build", "OI Skew", "PE Build",
    "PE V/OI", "PE Vol", "PE ΔOI", "PE OI",
];

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub tabs: Vec<TabView>,
    /// Empty until the first snapshot arrives
    pub metrics: Vec<MetricCard>,
    pub oi_skew_chart: Option<ChartSpec>,
    pub volume_oi_chart: Option<ChartSpec>,
    pub table: Vec<TableRowView>,
    pub footer: FooterView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabView {
    pub symbol: String,
    pub active: bool,
}

/// Colour of a metric card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardTone {
    Primary,
    Info,
    Secondary,
    Signal(Signal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: String,
    pub tone: CardTone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Scatter,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceMode {
    LinesMarkers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceColor {
    Blue,
    Red,
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarMode {
    Group,
}

/// One data series handed to the chart adapter
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: &'static str,
    pub kind: TraceKind,
    pub mode: Option<TraceMode>,
    pub color: TraceColor,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Traces plus layout for one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: &'static str,
    pub x_title: &'static str,
    pub y_title: &'static str,
    pub height: u16,
    pub show_legend: bool,
    pub bar_mode: Option<BarMode>,
    pub traces: Vec<Trace>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub text: String,
    pub class: CellClass,
}

impl TableCell {
    fn plain(text: String) -> Self {
        Self {
            text,
            class: CellClass::None,
        }
    }

    fn styled((text, class): (String, CellClass)) -> Self {
        Self { text, class }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowView {
    /// One cell per entry of [`TABLE_HEADERS`]
    pub cells: Vec<TableCell>,
    pub visible: bool,
}

impl TableRowView {
    /// Text of the strike column, matched by [`filter_strikes`]
    pub fn strike_text(&self) -> &str {
        self.cells.first().map(|c| c.text.as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FooterView {
    /// Symbol the displayed data belongs to
    pub data_symbol: Option<String>,
    pub last_update: Option<String>,
    pub data_as_of: Option<String>,
    pub auto_refresh: bool,
    pub fetching: bool,
    pub search_term: String,
    pub visible_rows: usize,
    pub total_rows: usize,
}

/// Build the full view: metrics, both charts, table, then timestamp
pub fn render(state: &DashboardState) -> DashboardView {
    let tabs = state
        .symbols
        .iter()
        .map(|symbol| TabView {
            symbol: symbol.clone(),
            active: *symbol == state.current_symbol,
        })
        .collect();

    let (metrics, oi_skew, volume_oi, mut table) = match &state.last_payload {
        Some(snapshot) => (
            key_metrics(snapshot),
            Some(oi_skew_chart(snapshot)),
            Some(volume_oi_chart(snapshot)),
            option_chain_rows(snapshot),
        ),
        None => (Vec::new(), None, None, Vec::new()),
    };
    filter_strikes(&mut table, &state.search_term);

    let footer = FooterView {
        data_symbol: state.payload_symbol.clone(),
        last_update: state.last_updated.as_ref().map(format_timestamp),
        data_as_of: state.data_as_of.clone(),
        auto_refresh: state.auto_refresh_enabled,
        fetching: state.fetching,
        search_term: state.search_term.clone(),
        visible_rows: table.iter().filter(|row| row.visible).count(),
        total_rows: table.len(),
    };

    DashboardView {
        tabs,
        metrics,
        oi_skew_chart: oi_skew,
        volume_oi_chart: volume_oi,
        table,
        footer,
    }
}

/// Six headline cards: spot, PCR, max pain, skew, CE OI total, PE OI total
pub fn key_metrics(snapshot: &OptionChainSnapshot) -> Vec<MetricCard> {
    let pcr = &snapshot.pcr;
    let skew = &snapshot.skew_patterns;

    vec![
        MetricCard {
            title: "Spot Price",
            value: to_fixed(snapshot.spot_price, 2),
            tone: CardTone::Primary,
        },
        MetricCard {
            title: "PCR OI",
            value: to_fixed(pcr.pcr_oi, 2),
            tone: CardTone::Signal(pcr_signal(pcr.pcr_oi)),
        },
        MetricCard {
            title: "Max Pain",
            value: format_plain(snapshot.max_pain),
            tone: CardTone::Info,
        },
        MetricCard {
            title: "OI Skew",
            value: skew_label(skew).to_string(),
            tone: CardTone::Signal(skew_signal(skew)),
        },
        MetricCard {
            title: "Total CE OI",
            value: format_lakh(pcr.total_ce_oi),
            tone: CardTone::Secondary,
        },
        MetricCard {
            title: "Total PE OI",
            value: format_lakh(pcr.total_pe_oi),
            tone: CardTone::Secondary,
        },
    ]
}

fn strikes(snapshot: &OptionChainSnapshot) -> Vec<f64> {
    snapshot.strike_data.iter().map(|s| s.strike).collect()
}

pub fn oi_skew_chart(snapshot: &OptionChainSnapshot) -> ChartSpec {
    ChartSpec {
        title: "OI Skew Across Strikes",
        x_title: "Strike Price",
        y_title: "OI Skew Ratio",
        height: CHART_HEIGHT,
        show_legend: false,
        bar_mode: None,
        traces: vec![Trace {
            name: "OI Skew",
            kind: TraceKind::Scatter,
            mode: Some(TraceMode::LinesMarkers),
            color: TraceColor::Blue,
            x: strikes(snapshot),
            y: snapshot.strike_data.iter().map(|s| s.oi_skew).collect(),
        }],
    }
}

pub fn volume_oi_chart(snapshot: &OptionChainSnapshot) -> ChartSpec {
    let strikes = strikes(snapshot);
    ChartSpec {
        title: "Volume-OI Efficiency Ratio",
        x_title: "Strike Price",
        y_title: "Volume/OI Ratio",
        height: CHART_HEIGHT,
        show_legend: true,
        bar_mode: Some(BarMode::Group),
        traces: vec![
            Trace {
                name: "CE Volume/OI",
                kind: TraceKind::Bar,
                mode: None,
                color: TraceColor::Red,
                x: strikes.clone(),
                y: snapshot
                    .strike_data
                    .iter()
                    .map(|s| s.ce_volume_oi_ratio.unwrap_or(0.0))
                    .collect(),
            },
            Trace {
                name: "PE Volume/OI",
                kind: TraceKind::Bar,
                mode: None,
                color: TraceColor::Green,
                x: strikes,
                y: snapshot
                    .strike_data
                    .iter()
                    .map(|s| s.pe_volume_oi_ratio.unwrap_or(0.0))
                    .collect(),
            },
        ],
    }
}

/// One row per strike, in backend order
pub fn option_chain_rows(snapshot: &OptionChainSnapshot) -> Vec<TableRowView> {
    snapshot.strike_data.iter().map(strike_row).collect()
}

fn strike_row(row: &StrikeRow) -> TableRowView {
    TableRowView {
        cells: vec![
            TableCell::plain(format_plain(row.strike)),
            TableCell::plain(format_number(row.ce_oi)),
            TableCell::styled(change_oi_cell(row.ce_change_oi)),
            TableCell::plain(format_number(row.ce_volume)),
            TableCell::plain(ratio_text(row.ce_volume_oi_ratio)),
            TableCell::styled(buildup_cell(row.ce_buildup.as_ref())),
            TableCell::styled(oi_skew_cell(row.oi_skew)),
            TableCell::styled(buildup_cell(row.pe_buildup.as_ref())),
            TableCell::plain(ratio_text(row.pe_volume_oi_ratio)),
            TableCell::plain(format_number(row.pe_volume)),
            TableCell::styled(change_oi_cell(row.pe_change_oi)),
            TableCell::plain(format_number(row.pe_oi)),
        ],
        visible: true,
    }
}

/// Show rows whose strike text contains `term` (case-sensitive), hide the rest
pub fn filter_strikes(rows: &mut [TableRowView], term: &str) {
    for row in rows.iter_mut() {
        row.visible = row.strike_text().contains(term);
    }
}

pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format("%H:%M:%S").to_string()
}
