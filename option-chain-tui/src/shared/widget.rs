//! Ratatui adapter drawing a [`DashboardView`] - tabs, cards, charts, chain table, footer

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType,
        LegendPosition, Paragraph, Row, Table, TableState, Tabs,
    },
    Frame,
};

use super::format::{format_plain, CellClass, Signal};
use super::view::{
    CardTone, ChartSpec, DashboardView, FooterView, MetricCard, TraceColor, TraceKind,
    TraceMode, CHART_HEIGHT, TABLE_HEADERS,
};

// Colors matching the scalper palette
const C_BUY: Color = Color::Rgb(100, 220, 100);
const C_SELL: Color = Color::Rgb(220, 100, 100);
const C_NEUTRAL: Color = Color::Rgb(180, 180, 100);
const C_DIM: Color = Color::Rgb(120, 120, 120);
const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
const C_ACCENT: Color = Color::Rgb(100, 180, 220);
const C_HEADER: Color = Color::Rgb(180, 130, 220);
const C_INFO: Color = Color::Rgb(100, 200, 200);

// Cell fills for highlighted table cells
const BG_SUCCESS: Color = Color::Rgb(30, 80, 30);
const BG_DANGER: Color = Color::Rgb(90, 30, 30);
const BG_WARNING: Color = Color::Rgb(90, 80, 20);
const BG_INFO: Color = Color::Rgb(20, 60, 90);

/// Draw the whole dashboard
///
/// `table_state` carries the table scroll position between frames;
/// `searching` highlights the search prompt while the user types.
pub fn render_dashboard(
    f: &mut Frame,
    view: &DashboardView,
    table_state: &mut TableState,
    searching: bool,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(CHART_HEIGHT),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_tabs(f, view, chunks[0]);
    render_metrics(f, &view.metrics, chunks[1]);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    render_chart(f, view.oi_skew_chart.as_ref(), charts[0]);
    render_chart(f, view.volume_oi_chart.as_ref(), charts[1]);

    render_chain_table(f, view, table_state, chunks[3]);
    render_footer(f, &view.footer, searching, chunks[4]);
}

fn render_tabs(f: &mut Frame, view: &DashboardView, area: Rect) {
    let titles: Vec<Line> = view
        .tabs
        .iter()
        .map(|tab| Line::from(format!(" {} ", tab.symbol)))
        .collect();
    let selected = view.tabs.iter().position(|tab| tab.active).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .block(
            Block::default()
                .title(" OPTION CHAIN ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(C_HEADER)),
        )
        .style(Style::default().fg(C_DIM))
        .highlight_style(
            Style::default()
                .fg(C_BRIGHT)
                .bg(Color::Rgb(60, 60, 90))
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn tone_color(tone: CardTone) -> Color {
    match tone {
        CardTone::Primary => C_ACCENT,
        CardTone::Info => C_INFO,
        CardTone::Secondary => C_DIM,
        CardTone::Signal(signal) => signal_color(signal),
    }
}

fn signal_color(signal: Signal) -> Color {
    match signal {
        Signal::Success => C_BUY,
        Signal::Warning => C_NEUTRAL,
        Signal::Danger => C_SELL,
    }
}

fn render_metrics(f: &mut Frame, metrics: &[MetricCard], area: Rect) {
    if metrics.is_empty() {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            "Waiting for data...",
            Style::default().fg(C_DIM),
        )))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(C_DIM)));
        f.render_widget(placeholder, area);
        return;
    }

    let constraints = vec![Constraint::Ratio(1, metrics.len() as u32); metrics.len()];
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (card, cell) in metrics.iter().zip(cells.iter()) {
        let color = tone_color(card.tone);
        let block = Block::default()
            .title(Line::from(format!(" {} ", card.title)).alignment(Alignment::Center))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));
        let value = Paragraph::new(Line::from(Span::styled(
            card.value.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(block);
        f.render_widget(value, *cell);
    }
}

fn trace_color(color: TraceColor) -> Color {
    match color {
        TraceColor::Blue => Color::Rgb(0, 123, 255),
        TraceColor::Red => Color::Red,
        TraceColor::Green => Color::Green,
    }
}

/// Min/max with a little headroom; a flat series still gets a visible range
fn bounds(values: &[f64]) -> [f64; 2] {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    if (max - min).abs() < f64::EPSILON {
        return [min - 1.0, max + 1.0];
    }
    let pad = (max - min) * 0.05;
    [min - pad, max + pad]
}

fn axis_labels(range: [f64; 2], precision: usize) -> Vec<String> {
    let mid = (range[0] + range[1]) / 2.0;
    [range[0], mid, range[1]]
        .iter()
        .map(|v| format!("{:.*}", precision, v))
        .collect()
}

fn chart_block(spec: &ChartSpec) -> Block<'static> {
    let mut title = vec![Span::styled(
        format!(" {} ", spec.title),
        Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
    )];
    // Bar charts have no built-in legend, so names go in the title
    if spec.show_legend && spec.traces.iter().all(|t| t.kind == TraceKind::Bar) {
        for trace in &spec.traces {
            title.push(Span::styled("■ ", Style::default().fg(trace_color(trace.color))));
            title.push(Span::styled(format!("{} ", trace.name), Style::default().fg(C_DIM)));
        }
    }

    Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_ACCENT))
}

fn render_chart(f: &mut Frame, spec: Option<&ChartSpec>, area: Rect) {
    let Some(spec) = spec else {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_DIM));
        f.render_widget(block, area);
        return;
    };

    if spec.traces.iter().all(|t| t.x.is_empty()) {
        let placeholder = Paragraph::new(Span::styled("No strikes", Style::default().fg(C_DIM)))
            .block(chart_block(spec));
        f.render_widget(placeholder, area);
        return;
    }

    match spec.traces.first().map(|t| t.kind) {
        Some(TraceKind::Bar) => render_bar_chart(f, spec, area),
        _ => render_line_chart(f, spec, area),
    }
}

fn render_line_chart(f: &mut Frame, spec: &ChartSpec, area: Rect) {
    let series: Vec<Vec<(f64, f64)>> = spec
        .traces
        .iter()
        .map(|t| t.x.iter().copied().zip(t.y.iter().copied()).collect())
        .collect();

    let mut datasets = Vec::new();
    for (trace, points) in spec.traces.iter().zip(series.iter()) {
        let style = Style::default().fg(trace_color(trace.color));
        datasets.push(
            Dataset::default()
                .name(trace.name)
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(style)
                .data(points),
        );
        if trace.mode == Some(TraceMode::LinesMarkers) {
            datasets.push(
                Dataset::default()
                    .marker(Marker::Dot)
                    .graph_type(GraphType::Scatter)
                    .style(style.add_modifier(Modifier::BOLD))
                    .data(points),
            );
        }
    }

    let xs: Vec<f64> = spec.traces.iter().flat_map(|t| t.x.iter().copied()).collect();
    let ys: Vec<f64> = spec.traces.iter().flat_map(|t| t.y.iter().copied()).collect();
    let x_bounds = bounds(&xs);
    let y_bounds = bounds(&ys);

    let chart = Chart::new(datasets)
        .block(chart_block(spec))
        .x_axis(
            Axis::default()
                .title(Span::styled(spec.x_title, Style::default().fg(C_DIM)))
                .style(Style::default().fg(C_DIM))
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds, 0)),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled(spec.y_title, Style::default().fg(C_DIM)))
                .style(Style::default().fg(C_DIM))
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds, 2)),
        )
        .legend_position(spec.show_legend.then_some(LegendPosition::TopRight));

    f.render_widget(chart, area);
}

fn render_bar_chart(f: &mut Frame, spec: &ChartSpec, area: Rect) {
    let strikes = spec.traces.first().map(|t| t.x.as_slice()).unwrap_or_default();

    let block = chart_block(spec).title_bottom(
        Line::from(Span::styled(
            format!(" {} vs {} (x100) ", spec.y_title, spec.x_title),
            Style::default().fg(C_DIM),
        ))
        .alignment(Alignment::Right),
    );

    let mut chart = BarChart::default()
        .block(block)
        .bar_width(3)
        .bar_gap(0)
        .group_gap(1)
        .label_style(Style::default().fg(C_DIM));

    for (index, strike) in strikes.iter().enumerate() {
        let bars: Vec<Bar> = spec
            .traces
            .iter()
            .map(|trace| {
                let ratio = trace.y.get(index).copied().unwrap_or(0.0);
                Bar::default()
                    .value((ratio.max(0.0) * 100.0).round() as u64)
                    .text_value(String::new())
                    .style(Style::default().fg(trace_color(trace.color)))
            })
            .collect();
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(format_plain(*strike)))
                .bars(&bars),
        );
    }

    f.render_widget(chart, area);
}

fn cell_style(class: CellClass) -> Style {
    match class {
        CellClass::None => Style::default().fg(C_BRIGHT),
        CellClass::TextSuccess => Style::default().fg(C_BUY),
        CellClass::TextDanger => Style::default().fg(C_SELL),
        CellClass::FillSuccess => Style::default().fg(C_BRIGHT).bg(BG_SUCCESS),
        CellClass::FillDanger => Style::default().fg(C_BRIGHT).bg(BG_DANGER),
        CellClass::FillWarning => Style::default().fg(C_BRIGHT).bg(BG_WARNING),
        CellClass::FillInfo => Style::default().fg(C_BRIGHT).bg(BG_INFO),
    }
}

fn render_chain_table(f: &mut Frame, view: &DashboardView, table_state: &mut TableState, area: Rect) {
    let title = match &view.footer.data_symbol {
        Some(symbol) => format!(" {} OPTION CHAIN ", symbol),
        None => " OPTION CHAIN ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_ACCENT));

    if view.table.is_empty() {
        let active = view
            .tabs
            .iter()
            .find(|tab| tab.active)
            .map(|tab| tab.symbol.as_str())
            .unwrap_or("option chain");
        let placeholder = Paragraph::new(Span::styled(
            format!("Waiting for {} data...", active),
            Style::default().fg(C_DIM),
        ))
        .block(block);
        f.render_widget(placeholder, area);
        return;
    }

    let header = Row::new(TABLE_HEADERS.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(C_NEUTRAL).add_modifier(Modifier::BOLD))
    }))
    .height(1);

    let rows = view.table.iter().filter(|row| row.visible).map(|row| {
        Row::new(row.cells.iter().enumerate().map(|(index, cell)| {
            let mut style = cell_style(cell.class);
            if index == 0 {
                style = style.add_modifier(Modifier::BOLD);
            }
            Cell::from(cell.text.clone()).style(style)
        }))
    });

    let widths = [
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, table_state);
}

fn render_footer(f: &mut Frame, footer: &FooterView, searching: bool, area: Rect) {
    let mut spans = vec![
        Span::styled("Updated ", Style::default().fg(C_DIM)),
        Span::styled(
            footer.last_update.clone().unwrap_or_else(|| "--:--:--".to_string()),
            Style::default().fg(C_BRIGHT),
        ),
    ];

    if let Some(as_of) = &footer.data_as_of {
        spans.push(Span::styled("  as of ", Style::default().fg(C_DIM)));
        spans.push(Span::styled(as_of.clone(), Style::default().fg(C_DIM)));
    }

    spans.push(Span::styled("  Auto ", Style::default().fg(C_DIM)));
    spans.push(if footer.auto_refresh {
        Span::styled("ON", Style::default().fg(C_BUY).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("OFF", Style::default().fg(C_SELL).add_modifier(Modifier::BOLD))
    });

    if footer.fetching {
        spans.push(Span::styled("  ⟳ fetching", Style::default().fg(C_NEUTRAL)));
    }

    let search_style = if searching {
        Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(C_DIM)
    };
    spans.push(Span::styled("  Strike /", Style::default().fg(C_DIM)));
    spans.push(Span::styled(footer.search_term.clone(), search_style));
    if searching {
        spans.push(Span::styled("█", Style::default().fg(C_BRIGHT)));
    }
    spans.push(Span::styled(
        format!(" ({}/{})", footer.visible_rows, footer.total_rows),
        Style::default().fg(C_DIM),
    ));

    spans.push(Span::styled(
        "  [Tab] symbol [/] search [r] refresh [a] auto [q] quit",
        Style::default().fg(C_DIM),
    ));

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_DIM)),
    );
    f.render_widget(paragraph, area);
}
