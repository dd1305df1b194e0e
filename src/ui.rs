use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::app::{App, Focus};
use crate::quote::format_amount;

const TITLE: &str = "EMI Calculator";
const HELP: &str =
    "Tab/↓/j: next | Shift+Tab/↑/k: previous | ←/→ or h/l: adjust | PgUp/PgDn: ×10 | e: export | Esc/q: quit";

fn block_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(1),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title = Paragraph::new(TITLE)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, chunks[0]);

    let fields = [
        ("Total Cost of Asset", &app.inputs.asset_cost, Focus::AssetCost),
        ("Interest Rate (in %)", &app.inputs.interest_rate, Focus::InterestRate),
        ("Processing Fee (in %)", &app.inputs.processing_fee, Focus::ProcessingFee),
    ];
    for ((title, value, focus), area) in fields.into_iter().zip(&chunks[1..4]) {
        render_text_field(f, *area, title, value, app.focus == focus);
    }

    render_down_payment(f, chunks[4], app);
    render_installment(f, chunks[5], app);
    render_tenure(f, chunks[6], app);

    let status = match (&app.status, app.state.is_defined()) {
        (Some(message), _) => Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red)),
        (None, false) => Paragraph::new("Enter the cost of the asset to calculate the EMI")
            .style(Style::default().fg(Color::DarkGray)),
        (None, true) => Paragraph::new(""),
    };
    f.render_widget(status.alignment(Alignment::Center), chunks[7]);

    let help = Paragraph::new(HELP)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(help, chunks[8]);
}

fn render_text_field(f: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(block_style(focused))
        .title(title);
    let text = if focused { format!("{value}▏") } else { value.to_string() };
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn render_down_payment(f: &mut Frame, area: Rect, app: &App) {
    let state = &app.state;
    let ratio = if state.asset_cost() > 0.0 {
        state.down_payment() / state.asset_cost()
    } else {
        0.0
    };
    let total = format!(
        "Total Down Payment (Down Payment + Processing Fee): {}",
        format_amount(state.totals().down_payment)
    );
    render_slider(
        f,
        area,
        SliderView {
            title: "Down Payment",
            focused: app.focus == Focus::DownPayment,
            ratio,
            value: format_amount(state.down_payment()),
            low: "0%".to_string(),
            high: "100%".to_string(),
            total,
        },
    );
}

fn render_installment(f: &mut Frame, area: Rect, app: &App) {
    let state = &app.state;
    let (min, max) = state.installment_range().unwrap_or((0.0, 0.0));
    let ratio = if max > min {
        (state.monthly_installment() - min) / (max - min)
    } else {
        0.0
    };
    let total = format!(
        "Total Loan Amount (EMI × {} months): {}",
        state.tenure_months(),
        format_amount(state.totals().installments)
    );
    render_slider(
        f,
        area,
        SliderView {
            title: "Loan per Month",
            focused: app.focus == Focus::MonthlyInstallment,
            ratio,
            value: format_amount(state.monthly_installment()),
            low: format_amount(min),
            high: format_amount(max),
            total,
        },
    );
}

struct SliderView {
    title: &'static str,
    focused: bool,
    ratio: f64,
    value: String,
    low: String,
    high: String,
    total: String,
}

fn render_slider(f: &mut Frame, area: Rect, view: SliderView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(block_style(view.focused))
        .title(view.title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(inner);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(view.ratio.clamp(0.0, 1.0))
        .label("");
    f.render_widget(gauge, rows[0]);

    let labels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(30),
                Constraint::Percentage(40),
                Constraint::Percentage(30),
            ]
            .as_ref(),
        )
        .split(rows[1]);
    f.render_widget(Paragraph::new(view.low), labels[0]);
    f.render_widget(
        Paragraph::new(view.value)
            .style(Style::default().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        labels[1],
    );
    f.render_widget(Paragraph::new(view.high).alignment(Alignment::Right), labels[2]);

    f.render_widget(Paragraph::new(view.total), rows[2]);
}

fn render_tenure(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(block_style(app.focus == Focus::Tenure))
        .title("Tenure (months)");

    let mut spans = Vec::new();
    for months in app.state.tenure_options() {
        let style = if *months == app.state.tenure_months() {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {months} "), style));
        spans.push(Span::raw(" "));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
