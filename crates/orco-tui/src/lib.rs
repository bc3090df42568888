// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use orco_app::{
    AppCommand, AppEvent, AppState, ColorHint, ErrorState, FetchLifecycle, FetchResolution,
    Fetcher, LifecycleCode, RowDetail, RowFilter, TabKind,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const STATE_FIELD: &str = "state";
const BREADCRUMB_SEPARATOR: &str = " > ";

/// The fetch backend and the shared error handle every view reads.
#[derive(Clone)]
pub struct DataSource {
    fetcher: Arc<dyn Fetcher>,
    errors: ErrorState,
}

impl DataSource {
    pub fn new(fetcher: Arc<dyn Fetcher>, errors: ErrorState) -> Self {
        Self { fetcher, errors }
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }
}

#[derive(Debug)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Fetch(FetchResolution),
}

#[derive(Debug, Default)]
struct ViewData {
    view: Option<FetchLifecycle>,
    mount_counter: u64,
    selected_row: usize,
    table_state: TableState,
    state_filter: Option<LifecycleCode>,
    expanded: Option<usize>,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app(state: &mut AppState, source: &DataSource) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    mount_view(state, source, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, source, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, source, &mut view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, source, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    source: &DataSource,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        handle_internal_event(state, source, view_data, tx, event);
    }
}

fn handle_internal_event(
    state: &mut AppState,
    source: &DataSource,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: InternalEvent,
) {
    match event {
        InternalEvent::ClearStatus { token } if token == view_data.status_token => {
            apply_command(state, source, view_data, tx, AppCommand::ClearStatus);
        }
        InternalEvent::ClearStatus { .. } => {}
        InternalEvent::Fetch(resolution) => {
            let Some(view) = view_data.view.as_mut() else {
                return;
            };
            if view.accept(resolution, &source.errors) {
                clamp_selection(view_data);
            }
        }
    }
}

/// Opens the view for the active resource. The previous view is unmounted;
/// its in-flight fetch keeps running and is discarded when it lands.
fn mount_view(
    state: &AppState,
    source: &DataSource,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    view_data.mount_counter = view_data.mount_counter.saturating_add(1);
    let mut view = FetchLifecycle::new(state.active_resource(), view_data.mount_counter);
    tracing::debug!(resource = %view.resource().path(), mount_id = view.mount_id(), "mount view");
    let sender = tx.clone();
    view.spawn_with(Arc::clone(&source.fetcher), &source.errors, move |resolution| {
        let _ = sender.send(InternalEvent::Fetch(resolution));
    });
    view_data.view = Some(view);
    view_data.selected_row = 0;
    view_data.table_state = TableState::default();
    view_data.state_filter = None;
    view_data.expanded = None;
}

fn apply_command(
    state: &mut AppState,
    source: &DataSource,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    for event in state.dispatch(command) {
        match event {
            AppEvent::ViewChanged(_) => mount_view(state, source, view_data, tx),
            AppEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(tx, view_data.status_token);
            }
            AppEvent::TabChanged(_) | AppEvent::StatusCleared => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    source: &DataSource,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    apply_command(
        state,
        source,
        view_data,
        internal_tx,
        AppCommand::SetStatus(message.into()),
    );
}

fn handle_key_event(
    state: &mut AppState,
    source: &DataSource,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.expanded.is_some() {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
            view_data.expanded = None;
        }
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('?'), _) => view_data.help_visible = true,
        (KeyCode::Tab, _) => {
            apply_command(state, source, view_data, internal_tx, AppCommand::NextTab);
        }
        (KeyCode::BackTab, _) => {
            apply_command(state, source, view_data, internal_tx, AppCommand::PrevTab);
        }
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => move_row(view_data, 1),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => move_row(view_data, -1),
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => move_row(view_data, isize::MIN),
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => move_row(view_data, isize::MAX),
        (KeyCode::Enter, _) => handle_enter(state, source, view_data, internal_tx),
        (KeyCode::Esc, _) => {
            apply_command(state, source, view_data, internal_tx, AppCommand::CloseDrill);
        }
        (KeyCode::Char('s'), KeyModifiers::NONE) => {
            cycle_state_filter(state, source, view_data, internal_tx);
        }
        (KeyCode::Char('S'), _) => {
            if set_state_filter(view_data, None) {
                emit_status(state, source, view_data, internal_tx, "state filter cleared");
            }
        }
        _ => {}
    }
    false
}

/// Source index of the record under the cursor.
fn selected_record_index(view_data: &ViewData) -> Option<usize> {
    let table = view_data.view.as_ref()?.table()?;
    table
        .rows()
        .get(view_data.selected_row)
        .map(|row| row.index)
}

fn handle_enter(
    state: &mut AppState,
    source: &DataSource,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(view) = view_data.view.as_ref() else {
        return;
    };
    let Some(index) = selected_record_index(view_data) else {
        if view.is_loading() {
            emit_status(state, source, view_data, internal_tx, "still loading");
        }
        return;
    };
    let target = view
        .table()
        .and_then(|table| table.record(index))
        .and_then(|record| view.resource().drill_target(record));

    match target {
        Some(target) => {
            apply_command(state, source, view_data, internal_tx, AppCommand::Drill(target));
        }
        None => view_data.expanded = Some(index),
    }
}

fn cycle_state_filter(
    state: &mut AppState,
    source: &DataSource,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let supported = view_data
        .view
        .as_ref()
        .is_some_and(|view| view.resource().supports_state_filter());
    if !supported {
        emit_status(
            state,
            source,
            view_data,
            internal_tx,
            "state filter applies to jobs and entries",
        );
        return;
    }

    let next = next_state_filter(view_data.state_filter);
    if !set_state_filter(view_data, next) {
        emit_status(state, source, view_data, internal_tx, "still loading");
        return;
    }
    let message = match next {
        Some(code) => format!("state filter: {}", code.descriptor().label),
        None => "state filter cleared".to_owned(),
    };
    emit_status(state, source, view_data, internal_tx, message);
}

fn next_state_filter(current: Option<LifecycleCode>) -> Option<LifecycleCode> {
    let codes = LifecycleCode::FILTERABLE;
    match current {
        None => codes.first().copied(),
        Some(code) => codes
            .iter()
            .position(|candidate| *candidate == code)
            .and_then(|position| codes.get(position + 1))
            .copied(),
    }
}

/// Returns false when there is no loaded table to filter.
fn set_state_filter(view_data: &mut ViewData, filter: Option<LifecycleCode>) -> bool {
    let Some(table) = view_data.view.as_mut().and_then(FetchLifecycle::table_mut) else {
        return false;
    };
    table.set_filter(filter.map(|code| RowFilter::new(STATE_FIELD, code.as_code())));
    view_data.state_filter = filter;
    view_data.selected_row = 0;
    true
}

fn row_count(view_data: &ViewData) -> usize {
    view_data
        .view
        .as_ref()
        .and_then(FetchLifecycle::table)
        .map_or(0, |table| table.row_count())
}

fn move_row(view_data: &mut ViewData, delta: isize) {
    let row_count = row_count(view_data);
    if row_count == 0 {
        view_data.selected_row = 0;
        return;
    }

    let current = view_data.selected_row;
    let next = if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize)
    };
    view_data.selected_row = next.min(row_count.saturating_sub(1));
}

fn clamp_selection(view_data: &mut ViewData) {
    move_row(view_data, 0);
}

fn color_for(hint: ColorHint) -> Color {
    match hint {
        ColorHint::Green => Color::Green,
        ColorHint::Orange => Color::Rgb(255, 165, 0),
        ColorHint::Red => Color::Red,
        ColorHint::Blue => Color::Blue,
        ColorHint::Brown => Color::Rgb(165, 42, 42),
        ColorHint::Gray => Color::DarkGray,
        ColorHint::Default => Color::Reset,
    }
}

fn render(
    frame: &mut ratatui::Frame<'_>,
    state: &AppState,
    source: &DataSource,
    view_data: &mut ViewData,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    if state.drill_stack.is_empty() {
        let selected = TabKind::ALL
            .iter()
            .position(|tab| *tab == state.active_tab)
            .unwrap_or(0);
        let tab_titles = TabKind::ALL
            .iter()
            .map(|tab| format!(" {} ", tab.label()))
            .collect::<Vec<String>>();

        let tabs = Tabs::new(tab_titles)
            .block(Block::default().title("orco").borders(Borders::ALL))
            .style(Style::default().fg(Color::White))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .select(selected);
        frame.render_widget(tabs, layout[0]);
    } else {
        let breadcrumb = Paragraph::new(render_breadcrumb_text(state))
            .block(Block::default().title("orco").borders(Borders::ALL));
        frame.render_widget(breadcrumb, layout[0]);
    }

    let body = match source.errors.message() {
        Some(message) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(1)])
                .split(layout[1]);
            let banner = Paragraph::new(error_banner_text(&message))
                .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .block(Block::default().borders(Borders::ALL).title("error"));
            frame.render_widget(banner, split[0]);
            split[1]
        }
        None => layout[1],
    };
    render_table(frame, body, view_data);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let Some(detail) = view_data
        .expanded
        .and_then(|index| view_data.view.as_ref()?.table()?.expand(index))
    {
        let area = centered_rect(72, 64, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(render_detail_text(&detail))
            .wrap(Wrap { trim: false })
            .block(Block::default().title("details").borders(Borders::ALL));
        frame.render_widget(overlay, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

/// The table scrolls with the selection; offsets persist between frames in
/// `view_data.table_state`.
fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &mut ViewData) {
    let Some(view) = &view_data.view else {
        frame.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    };
    let Some(table) = view.table() else {
        let loading = Paragraph::new(format!("loading {}...", view.resource().title()))
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(view.resource().title()),
            );
        frame.render_widget(loading, area);
        return;
    };

    let title = table_title(view_data);
    let schema = table.schema();
    let widths = vec![Constraint::Min(6); schema.len().max(1)];
    let header = Row::new(schema.headers().into_iter().map(|label| {
        Cell::from(label.to_owned()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = table.rows().into_iter().enumerate().map(|(row_index, row)| {
        let selected = row_index == view_data.selected_row;
        let cells = row
            .cells
            .iter()
            .map(|cell| {
                let mut style = Style::default();
                if let Some(descriptor) = cell.state() {
                    style = style.fg(color_for(descriptor.color));
                }
                if selected {
                    style = style.bg(Color::DarkGray);
                }
                Cell::from(cell.display()).style(style)
            })
            .collect::<Vec<_>>();
        Row::new(cells)
    });

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL),
        );
    view_data.table_state.select(Some(view_data.selected_row));
    frame.render_stateful_widget(widget, area, &mut view_data.table_state);
}

fn table_title(view_data: &ViewData) -> String {
    let Some(view) = &view_data.view else {
        return String::new();
    };
    let count = row_count(view_data);
    match view_data.state_filter {
        Some(code) => format!(
            " {} [{}={}] ({count}) ",
            view.resource().title(),
            STATE_FIELD,
            code.descriptor().label
        ),
        None => format!(" {} ({count}) ", view.resource().title()),
    }
}

fn render_breadcrumb_text(state: &AppState) -> String {
    std::iter::once(state.active_tab.label().to_owned())
        .chain(state.drill_stack.iter().map(|resource| resource.title()))
        .collect::<Vec<_>>()
        .join(BREADCRUMB_SEPARATOR)
}

fn error_banner_text(message: &str) -> String {
    format!("{message}; restart to retry")
}

fn render_detail_text(detail: &RowDetail) -> String {
    let mut sections = Vec::new();
    if let Some(config) = &detail.config {
        sections.push(format!("Config\n{config}"));
    }
    for item in &detail.items {
        sections.push(format!("{}\n{}", item.header, item.value));
    }
    if sections.is_empty() {
        return "(nothing to show)".to_owned();
    }
    sections.join("\n\n")
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q or q quit | ? help\n\
views: tab/shift+tab switch | enter drill or expand | esc back\n\
rows: j/k up/down | g/G first/last\n\
jobs and entries: s cycle state filter | S clear filter\n\
overlays: esc close"
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible || view_data.expanded.is_some() {
        return String::new();
    }
    let default = "tab views | j/k g/G | enter drill/expand | esc back | s/S state | ? help | q quit";
    match &state.status_line {
        Some(status) => format!("{status} | {default}"),
        None => default.to_owned(),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
