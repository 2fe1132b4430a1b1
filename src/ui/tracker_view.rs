use crate::calc::{count_days, relevant_window_with, AccountingSnapshot, AllowanceStatus};
use crate::data::{AppSettings, Country, StoreError, Subscription, Trip, TripPatch, TripStore};
use crate::notify::{self, overstay_message, Notifier, Severity, ToastQueue};
use crate::picker::{
    generate_days_in_month, DateFields, DateSelection, DayCell, FieldKind, FocusOutcome,
    GridFocus, MonthYear, NavKey, SelectionState, WEEKDAY_HEADER,
};
use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyModifiers};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io::Stdout;
use std::time::{Duration as StdDuration, Instant};
use tracing::{debug, info, warn};

// Stats section header style
const SECTION_BG: Color = Color::Rgb(40, 44, 52);

const MONTH_WIDTH: u16 = 21;
const GAP_WIDTH: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Normal,
    EditField(FieldKind),
    SelectCountry,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum ViewState {
    #[default]
    Calendar,
    TripList,
}

/// Per-action in-flight flag. A second submit is refused until the first
/// one has finished.
#[derive(Debug, Default)]
pub(crate) struct SubmitGuard {
    busy: bool,
}

impl SubmitGuard {
    pub(crate) fn try_begin(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    pub(crate) fn finish(&mut self) {
        self.busy = false;
    }

    #[cfg(test)]
    pub(crate) fn is_busy(&self) -> bool {
        self.busy
    }
}

pub struct App<'a> {
    store: &'a mut dyn TripStore,
    owner_id: String,
    settings: AppSettings,
    today: NaiveDate,
    selection: DateSelection,
    fields: DateFields,
    month: MonthYear,
    focus: GridFocus,
    country: Option<Country>,
    country_cursor: usize,
    mode: Mode,
    view_state: ViewState,
    /// Selected row in the trip list.
    list_cursor: usize,
    /// When Some, Confirm saves over this trip instead of adding a new one.
    editing: Option<String>,
    submit: SubmitGuard,
    toasts: ToastQueue,
    subscription: Option<Subscription>,
    /// Latest snapshot from the store. Never edited locally.
    trips: Vec<Trip>,
    loading: bool,
}

impl<'a> App<'a> {
    pub fn new(
        store: &'a mut dyn TripStore,
        owner_id: &str,
        settings: AppSettings,
        today: NaiveDate,
    ) -> Result<Self, StoreError> {
        let subscription = store.subscribe_trips(owner_id)?;
        let month = MonthYear::of(today);
        let toasts = ToastQueue::new(settings.toast_duration());
        let mut app = App {
            store,
            owner_id: owner_id.to_string(),
            settings,
            today,
            selection: DateSelection::new(),
            fields: DateFields::new(),
            month,
            focus: GridFocus::new(0),
            country: None,
            country_cursor: 0,
            mode: Mode::Normal,
            view_state: ViewState::Calendar,
            list_cursor: 0,
            editing: None,
            submit: SubmitGuard::default(),
            toasts,
            subscription: Some(subscription),
            trips: Vec::new(),
            loading: true,
        };
        app.refresh_focus();
        Ok(app)
    }

    /// Applies every snapshot delivered since the last tick and expires toasts.
    pub fn tick(&mut self, now: Instant) {
        let deliveries = match &self.subscription {
            Some(sub) => sub.drain(),
            None => Vec::new(),
        };
        for delivery in deliveries {
            match delivery {
                Ok(trips) => {
                    debug!(count = trips.len(), "trip snapshot received");
                    self.trips = trips;
                    self.loading = false;
                }
                Err(e) => {
                    warn!(error = %e, "trip subscription failed");
                    self.toasts.push_at(&e.to_string(), Severity::Error, now);
                }
            }
        }
        let len = self.snapshot().window_trips.len();
        if self.list_cursor >= len {
            self.list_cursor = len.saturating_sub(1);
        }
        self.toasts.prune(now);
    }

    fn snapshot(&self) -> AccountingSnapshot {
        relevant_window_with(&self.trips, self.settings.stay_rule())
    }

    /// Cells of both displayed months, in focus order.
    fn cells(&self) -> Vec<DayCell> {
        let next = self.month.next();
        let mut cells =
            generate_days_in_month(self.month.year, self.month.month, true, &self.selection);
        cells.extend(generate_days_in_month(next.year, next.month, true, &self.selection));
        cells
    }

    /// Index of the first cell of each displayed month.
    fn grid_starts(&self) -> [usize; 2] {
        let first_len =
            generate_days_in_month(self.month.year, self.month.month, true, &self.selection).len();
        [0, first_len]
    }

    fn refresh_focus(&mut self) {
        let len = self.cells().len();
        self.focus.resize(len);
    }

    fn change_month(&mut self, delta: i32) {
        self.month.change_month(delta);
        self.refresh_focus();
    }

    fn click(&mut self, date: NaiveDate) {
        self.selection.handle_day_click(date);
        self.fields.sync_from(&self.selection);
    }

    fn reset_picker(&mut self) {
        self.selection.cancel_selected_dates();
        self.fields.reset();
        self.country = None;
        self.editing = None;
    }

    fn submit(&mut self) {
        let Some((start, end)) = self.selection.range() else {
            self.toasts
                .notify("Pick a start and an end date first", Severity::Warning);
            return;
        };
        let Some(country) = self.country else {
            self.toasts.notify("Pick a country first", Severity::Warning);
            return;
        };
        if !self.submit.try_begin() {
            return;
        }
        match self.editing.clone() {
            None => match self.store.create_trip(&self.owner_id, country, start, end) {
                Ok(id) => {
                    info!(trip_id = %id, "trip added from view");
                    self.toasts.success(notify::TRIP_ADDED);
                    self.reset_picker();
                }
                Err(e) => {
                    warn!(error = %e, "add from view failed");
                    self.toasts.error(&notify::trip_add_failed(&e));
                }
            },
            Some(id) => {
                let patch = TripPatch {
                    country: Some(country),
                    start_date: Some(start),
                    end_date: Some(end),
                };
                match self.store.update_trip(&id, patch) {
                    Ok(()) => {
                        info!(trip_id = %id, "trip edited from view");
                        self.toasts.success(notify::TRIP_EDITED);
                        self.reset_picker();
                    }
                    Err(e) => {
                        warn!(trip_id = %id, error = %e, "edit from view failed");
                        self.toasts.error(&notify::trip_edit_failed(&e));
                    }
                }
            }
        }
        self.submit.finish();
    }

    fn load_for_edit(&mut self, trip: &Trip) {
        self.selection.cancel_selected_dates();
        self.selection.handle_day_click(trip.start_date);
        self.selection.handle_day_click(trip.end_date);
        self.fields.sync_from(&self.selection);
        self.country = Some(trip.country);
        self.country_cursor = Country::ALL
            .iter()
            .position(|c| *c == trip.country)
            .unwrap_or(0);
        self.editing = Some(trip.id.clone());
        self.toasts.notify(
            &format!("Editing trip to {}", trip.country.name()),
            Severity::Info,
        );
        self.month = MonthYear::of(trip.start_date);
        self.refresh_focus();
        self.view_state = ViewState::Calendar;
    }

    fn delete_selected(&mut self) {
        let Some(trip) = self.snapshot().window_trips.get(self.list_cursor).cloned() else {
            return;
        };
        if !self.submit.try_begin() {
            return;
        }
        match self.store.delete_trip(&trip.id) {
            Ok(()) => {
                info!(trip_id = %trip.id, "trip deleted from view");
                self.toasts.success(notify::TRIP_DELETED);
                if self.editing.as_deref() == Some(trip.id.as_str()) {
                    self.reset_picker();
                }
            }
            Err(e) => {
                warn!(trip_id = %trip.id, error = %e, "delete from view failed");
                self.toasts.error(&notify::trip_delete_failed(&e));
            }
        }
        self.submit.finish();
    }

    /// Returns true if the app should quit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        match self.mode {
            Mode::EditField(kind) => {
                self.handle_field_key(kind, code);
                return false;
            }
            Mode::SelectCountry => {
                self.handle_country_key(code);
                return false;
            }
            Mode::Normal => {}
        }

        if self.view_state == ViewState::TripList {
            return self.handle_list_key(code);
        }

        let nav = match code {
            KeyCode::Left => Some(NavKey::Left),
            KeyCode::Right => Some(NavKey::Right),
            KeyCode::Up => Some(NavKey::Up),
            KeyCode::Down => Some(NavKey::Down),
            KeyCode::Enter => Some(NavKey::Enter),
            KeyCode::Char(' ') => Some(NavKey::Space),
            _ => None,
        };
        if let Some(key) = nav {
            if let FocusOutcome::Activate(i) = self.focus.handle_key(key) {
                if let Some(date) = self.cells().get(i).and_then(|c| c.date) {
                    self.click(date);
                }
            }
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => {
                let starts = self.grid_starts();
                self.focus.next_tab_stop(&starts);
            }
            KeyCode::Char('[') => self.change_month(-1),
            KeyCode::Char(']') => self.change_month(1),
            KeyCode::Char('s') => self.mode = Mode::EditField(FieldKind::Start),
            KeyCode::Char('e') => self.mode = Mode::EditField(FieldKind::End),
            KeyCode::Char('c') => self.mode = Mode::SelectCountry,
            KeyCode::Char('a') => self.submit(),
            KeyCode::Char('x') => self.reset_picker(),
            KeyCode::Char('l') => self.view_state = ViewState::TripList,
            KeyCode::Char('r') => self.store.refresh(),
            _ => {}
        }
        false
    }

    fn handle_field_key(&mut self, kind: FieldKind, code: KeyCode) {
        match code {
            KeyCode::Enter | KeyCode::Tab | KeyCode::Esc => {
                if let Err(message) = self.fields.blur(kind) {
                    self.toasts.error(&message);
                }
                self.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                let mut text = self.fields.text(kind).to_string();
                text.pop();
                self.fields.input(kind, &text, &mut self.selection);
            }
            KeyCode::Char(c) => {
                let mut text = self.fields.text(kind).to_string();
                text.push(c);
                self.fields.input(kind, &text, &mut self.selection);
            }
            _ => {}
        }
    }

    fn handle_country_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.country_cursor = self.country_cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.country_cursor + 1 < Country::ALL.len() {
                    self.country_cursor += 1;
                }
            }
            KeyCode::Enter => {
                self.country = Some(Country::ALL[self.country_cursor]);
                self.mode = Mode::Normal;
            }
            KeyCode::Esc => self.mode = Mode::Normal,
            _ => {}
        }
    }

    fn handle_list_key(&mut self, code: KeyCode) -> bool {
        let len = self.snapshot().window_trips.len();
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => self.list_cursor = self.list_cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.list_cursor + 1 < len {
                    self.list_cursor += 1;
                }
            }
            KeyCode::Char('e') => {
                if let Some(trip) = self.snapshot().window_trips.get(self.list_cursor).cloned() {
                    self.load_for_edit(&trip);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('r') => self.store.refresh(),
            KeyCode::Esc => self.view_state = ViewState::Calendar,
            _ => {}
        }
        false
    }

    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(9),  // two months, max 6 weeks + title + header
                Constraint::Length(3),  // start/end fields and country
                Constraint::Length(10), // stats table
                Constraint::Min(6),     // trip list or help
                Constraint::Length(4),  // notifications
            ])
            .split(f.area());

        self.render_calendar(f, chunks[0]);
        self.render_fields(f, chunks[1]);
        if self.mode == Mode::SelectCountry {
            self.render_country_select(f, chunks[2]);
        } else {
            self.render_stats(f, chunks[2]);
        }
        match self.view_state {
            ViewState::Calendar => self.render_help(f, chunks[3]),
            ViewState::TripList => self.render_trip_list(f, chunks[3]),
        }
        self.render_toasts(f, chunks[4]);
    }

    fn render_calendar(&self, f: &mut Frame, area: Rect) {
        let month_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(MONTH_WIDTH),
                Constraint::Length(GAP_WIDTH),
                Constraint::Length(MONTH_WIDTH),
                Constraint::Min(0),
            ])
            .split(area);
        let month_rects = [month_chunks[0], month_chunks[2]];

        let cells = self.cells();
        let starts = self.grid_starts();
        let (left, right) = cells.split_at(starts[1].min(cells.len()));
        let grids = [(self.month, left, starts[0]), (self.month.next(), right, starts[1])];

        for (i, (month, grid, offset)) in grids.iter().enumerate() {
            let mut lines: Vec<Line> = vec![
                Line::from(Span::styled(
                    format!("{:^21}", month.title()),
                    Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                )),
                Line::from(WEEKDAY_HEADER),
            ];
            for (week, row) in grid.chunks(7).enumerate() {
                let mut spans = Vec::new();
                for (col, cell) in row.iter().enumerate() {
                    let index = offset + week * 7 + col;
                    spans.push(Span::styled(
                        format!("{:2}", cell.day_of_month),
                        self.style_for(cell, index, &starts),
                    ));
                    spans.push(Span::raw(" "));
                }
                lines.push(Line::from(spans));
            }
            let widget = Paragraph::new(lines).block(Block::default().borders(Borders::NONE));
            f.render_widget(widget, month_rects[i]);
        }
    }

    fn style_for(&self, cell: &DayCell, index: usize, grid_starts: &[usize]) -> Style {
        let selected_day = self.selection.selected_day();
        let date = cell.date;
        let is_focused = index == self.focus.index();
        let is_endpoint = date.is_some()
            && (date == self.selection.start_date() || date == self.selection.end_date());
        let style = day_cell_style(
            cell.is_padding(),
            is_focused,
            date.is_some() && date == selected_day,
            is_endpoint,
            cell.is_in_range,
            date == Some(self.today),
            matches!((date, selected_day), (Some(d), Some(s)) if d < s),
        );
        if !is_focused && self.focus.tab_index(index, grid_starts) == 0 {
            style.add_modifier(Modifier::ITALIC)
        } else {
            style
        }
    }

    fn render_fields(&self, f: &mut Frame, area: Rect) {
        let field_span = |kind: FieldKind, label: &str| {
            let active = self.mode == Mode::EditField(kind);
            let text = self.fields.text(kind);
            let shown = if active {
                format!("{}_", text)
            } else if text.is_empty() {
                "YYYY-MM-DD".to_string()
            } else {
                text.to_string()
            };
            let style = if active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if text.is_empty() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            vec![
                Span::raw(format!("{}: ", label)),
                Span::styled(format!("{:<11}", shown), style),
                Span::raw("  "),
            ]
        };

        let mut spans = field_span(FieldKind::Start, "Start");
        spans.extend(field_span(FieldKind::End, "End"));
        spans.push(Span::raw("Country: "));
        spans.push(match self.country {
            Some(c) => Span::styled(c.name(), Style::default().add_modifier(Modifier::BOLD)),
            None => Span::styled("none", Style::default().fg(Color::DarkGray)),
        });
        if self.editing.is_some() {
            spans.push(Span::styled(
                "  [editing trip]",
                Style::default().fg(Color::Cyan),
            ));
        }

        let mut lines = vec![Line::from(spans)];
        if let Some(err) = &self.fields.error {
            lines.push(Line::from(Span::styled(
                err.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        let p = Paragraph::new(lines).block(Block::default().borders(Borders::NONE));
        f.render_widget(p, area);
    }

    fn render_stats(&self, f: &mut Frame, area: Rect) {
        if self.loading {
            f.render_widget(Paragraph::new("Loading trips..."), area);
            return;
        }
        let snap = self.snapshot();
        let rule = self.settings.stay_rule();
        let fmt_date = |d: Option<NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "—".to_string())
        };

        let mut rows = vec![
            section_header("ALLOWANCE"),
            data_row(
                "Days spent in window",
                plain(format!("{}", snap.total_days_used)),
                plain(format!("of {}", rule.allowance_days)),
            ),
        ];
        rows.push(match snap.status() {
            AllowanceStatus::Remaining(days) => {
                let color = if days > 30 {
                    Color::Green
                } else if days > 10 {
                    Color::Yellow
                } else {
                    Color::Red
                };
                data_row("Days left", colored(format!("{}", days), color), plain(""))
            }
            AllowanceStatus::Overstay(days) => Row::new(vec![
                Cell::from(format!("  {}", overstay_message(days))).style(
                    Style::default()
                        .fg(Color::Red)
                        .add_modifier(Modifier::BOLD),
                ),
                Cell::from(""),
                Cell::from(""),
            ]),
        });
        rows.extend_from_slice(&[
            spacer(),
            section_header("WINDOW"),
            data_row(
                "From",
                plain(fmt_date(snap.window_start)),
                plain(format!("{} days", rule.window_days)),
            ),
            data_row("To (latest trip end)", plain(fmt_date(snap.anchor)), plain("")),
            data_row(
                format!("Next full {} days", rule.allowance_days),
                plain(fmt_date(snap.next_full_refill)),
                plain(""),
            ),
        ]);

        let border = if snap.is_overstay() {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        let table = Table::new(
            rows,
            [
                Constraint::Length(44),
                Constraint::Length(12),
                Constraint::Length(10),
            ],
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(" Schengen Stay "),
        );
        f.render_widget(table, area);
    }

    fn render_country_select(&self, f: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let first = self
            .country_cursor
            .saturating_sub(visible / 2)
            .min(Country::ALL.len().saturating_sub(visible));
        let lines: Vec<Line> = Country::ALL
            .iter()
            .enumerate()
            .skip(first)
            .take(visible)
            .map(|(i, c)| {
                let label = format!(" {:<3} {}", c.code(), c.name());
                if i == self.country_cursor {
                    Line::from(Span::styled(
                        label,
                        Style::default()
                            .fg(Color::Yellow)
                            .bg(Color::DarkGray)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(label)
                }
            })
            .collect();
        let p = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Country  (↑↓=move  Enter=pick  Esc=back) "),
        );
        f.render_widget(p, area);
    }

    fn render_trip_list(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let header = Row::new(vec![
            Cell::from("#").style(bold),
            Cell::from("Country").style(bold),
            Cell::from("Start").style(bold),
            Cell::from("End").style(bold),
            Cell::from("Days").style(bold),
        ]);
        let trips = self.snapshot().window_trips;
        let rows: Vec<Row> = trips
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Row::new(vec![
                    Cell::from(format!("{}", i + 1)),
                    Cell::from(t.country.name()),
                    Cell::from(t.start_date.format("%Y-%m-%d").to_string()),
                    Cell::from(t.end_date.format("%Y-%m-%d").to_string()),
                    Cell::from(format!("{}", count_days(t))),
                ])
            })
            .collect();

        let mut table_state = TableState::default();
        if !trips.is_empty() {
            table_state.select(Some(self.list_cursor));
        }

        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Length(16),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(6),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Trips in window  (↑↓=move  e=edit  d=delete  Esc=back) "),
        )
        .row_highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(table, area, &mut table_state);
    }

    /// Next step for the user, shown above the key help.
    fn prompt(&self) -> &'static str {
        match self.selection.state() {
            SelectionState::Empty => "Pick a start date",
            SelectionState::StartSelected => "Pick an end date",
            SelectionState::RangeSelected if self.country.is_none() => "Pick a country",
            SelectionState::RangeSelected => "Press a to confirm",
        }
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));
        let lines = vec![
            Line::from(Span::styled(
                self.prompt(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                key("←↑↓→"),
                Span::raw(" move  "),
                key("Tab"),
                Span::raw(" next month  "),
                key("Enter/Space"),
                Span::raw(" pick day  "),
                key("[ ]"),
                Span::raw(" month"),
            ]),
            Line::from(vec![
                key("s/e"),
                Span::raw(" type start/end  "),
                key("c"),
                Span::raw(" country  "),
                key("a"),
                Span::raw(if self.editing.is_some() { " save  " } else { " confirm  " }),
                key("x"),
                Span::raw(" cancel"),
            ]),
            Line::from(vec![
                key("l"),
                Span::raw(" trips  "),
                key("r"),
                Span::raw(" reload  "),
                key("q"),
                Span::raw(" quit"),
            ]),
        ];
        let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Keys "));
        f.render_widget(p, area);
    }

    fn render_toasts(&self, f: &mut Frame, area: Rect) {
        if self.toasts.is_empty() {
            return;
        }
        let lines: Vec<Line> = self
            .toasts
            .active()
            .iter()
            .rev()
            .take(area.height as usize)
            .map(|t| {
                Line::from(Span::styled(
                    format!("{} {}", t.severity.icon(), t.message),
                    Style::default()
                        .fg(severity_color(t.severity))
                        .add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        f.render_widget(Paragraph::new(lines), area);
    }
}

impl Drop for App<'_> {
    fn drop(&mut self) {
        if let Some(sub) = self.subscription.take() {
            self.store.unsubscribe(sub.id());
        }
    }
}

// ── Row construction helpers ──────────────────────────────────────────────────

/// A section header row with a dark background and bold text.
fn section_header(title: &str) -> Row<'static> {
    Row::new(vec![
        Cell::from(title.to_string())
            .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Cell::from(""),
        Cell::from(""),
    ])
    .style(Style::default().bg(SECTION_BG))
}

/// An empty spacer row between sections.
fn spacer() -> Row<'static> {
    Row::new(vec![Cell::from(""), Cell::from(""), Cell::from("")])
}

/// A data row with a two-space indent on the metric label.
fn data_row(metric: impl Into<String>, value: Cell<'static>, extra: Cell<'static>) -> Row<'static> {
    Row::new(vec![Cell::from(format!("  {}", metric.into())), value, extra])
}

/// Unstyled cell.
fn plain(s: impl Into<String>) -> Cell<'static> {
    Cell::from(s.into())
}

/// Cell with a foreground color.
fn colored(s: impl Into<String>, color: Color) -> Cell<'static> {
    Cell::from(s.into()).style(Style::default().fg(color))
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Success => Color::Green,
        Severity::Error => Color::Red,
        Severity::Info => Color::Cyan,
        Severity::Warning => Color::Yellow,
    }
}

// ── App event loop ────────────────────────────────────────────────────────────

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.tick(Instant::now());
        terminal.draw(|f| app.render(f))?;
        if event::poll(StdDuration::from_millis(16))? {
            if let CEvent::Key(key) = event::read()? {
                if app.handle_key(key.code, key.modifiers) {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Determines the ratatui `Style` for a calendar day cell based on its state.
pub(crate) fn day_cell_style(
    is_padding: bool,
    is_focused: bool,
    is_selected: bool,
    is_endpoint: bool,
    is_in_range: bool,
    is_today: bool,
    is_before_selected: bool,
) -> Style {
    if is_padding {
        let s = Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM);
        return if is_focused {
            s.add_modifier(Modifier::REVERSED)
        } else {
            s
        };
    }
    if is_focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else if is_selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if is_endpoint {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else if is_in_range {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::UNDERLINED)
    } else if is_before_selected {
        let mut s = Style::default().add_modifier(Modifier::DIM);
        if is_today {
            s = s.add_modifier(Modifier::REVERSED);
        }
        s
    } else if is_today {
        Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
    } else {
        Style::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FileTripStore;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // Feb 2024 opens with 3 padding cells, so index 3 is Feb 1.
    fn make_app(store: &mut FileTripStore) -> App<'_> {
        let mut app = App::new(store, "u1", AppSettings::default(), d(2024, 2, 14)).unwrap();
        app.tick(Instant::now());
        app
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn messages(app: &App) -> Vec<String> {
        app.toasts.active().iter().map(|t| t.message.clone()).collect()
    }

    fn pick_range(app: &mut App) {
        for _ in 0..3 {
            press(app, KeyCode::Right);
        }
        press(app, KeyCode::Enter);
        for _ in 0..4 {
            press(app, KeyCode::Right);
        }
        press(app, KeyCode::Char(' '));
    }

    // ── Cell style ────────────────────────────────────────────────────────────

    #[test]
    fn test_style_padding_is_dim() {
        let s = day_cell_style(true, false, false, false, false, false, false);
        assert_eq!(
            s,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
        );
    }

    #[test]
    fn test_style_focused_wins() {
        let s = day_cell_style(false, true, true, true, true, true, false);
        assert_eq!(s.bg, Some(Color::White));
    }

    #[test]
    fn test_style_selected_day() {
        let s = day_cell_style(false, false, true, true, true, false, false);
        assert_eq!(s.bg, Some(Color::Yellow));
    }

    #[test]
    fn test_style_endpoint_not_selected() {
        let s = day_cell_style(false, false, false, true, true, false, false);
        assert_eq!(s.bg, Some(Color::Cyan));
    }

    #[test]
    fn test_style_in_range() {
        let s = day_cell_style(false, false, false, false, true, false, false);
        assert_eq!(
            s,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED)
        );
    }

    #[test]
    fn test_style_before_selected_is_dim() {
        let s = day_cell_style(false, false, false, false, false, false, true);
        assert_eq!(s, Style::default().add_modifier(Modifier::DIM));
    }

    #[test]
    fn test_style_today_plain() {
        let s = day_cell_style(false, false, false, false, false, true, false);
        assert_eq!(
            s,
            Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
        );
    }

    #[test]
    fn test_style_plain_day() {
        let s = day_cell_style(false, false, false, false, false, false, false);
        assert_eq!(s, Style::default());
    }

    #[test]
    fn test_submit_guard_refuses_second_begin() {
        let mut g = SubmitGuard::default();
        assert!(g.try_begin());
        assert!(g.is_busy());
        assert!(!g.try_begin());
        g.finish();
        assert!(g.try_begin());
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    #[test]
    fn test_first_snapshot_ends_loading() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let app = make_app(&mut store);
        assert!(!app.loading);
        assert!(app.trips.is_empty());
    }

    #[test]
    fn test_enter_on_padding_does_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.selection.state(), SelectionState::Empty);
    }

    #[test]
    fn test_keyboard_picks_range_and_syncs_fields() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        pick_range(&mut app);
        assert_eq!(app.selection.range(), Some((d(2024, 2, 1), d(2024, 2, 5))));
        assert_eq!(app.fields.start_text, "2024-02-01");
        assert_eq!(app.fields.end_text, "2024-02-05");
    }

    #[test]
    fn test_focus_crosses_into_second_month() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        // Feb has 32 cells; March opens with 4 padding cells.
        for _ in 0..36 {
            press(&mut app, KeyCode::Right);
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.selection.start_date(), Some(d(2024, 3, 1)));
    }

    #[test]
    fn test_tab_jumps_between_month_starts() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus.index(), 32);
        for _ in 0..4 {
            press(&mut app, KeyCode::Right);
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.selection.start_date(), Some(d(2024, 3, 1)));
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus.index(), 0);
    }

    #[test]
    fn test_first_cell_of_each_month_is_marked_tab_stop() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        press(&mut app, KeyCode::Right);
        let cells = app.cells();
        let starts = app.grid_starts();
        assert_eq!(starts, [0, 32]);
        let italic = |i: usize| {
            app.style_for(&cells[i], i, &starts)
                .add_modifier
                .contains(Modifier::ITALIC)
        };
        assert!(italic(0));
        assert!(italic(32));
        assert!(!italic(2));
        assert!(!italic(33));
    }

    #[test]
    fn test_help_prompt_follows_selection() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        assert_eq!(app.prompt(), "Pick a start date");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.prompt(), "Pick a start date", "padding cell is not a day");
        for _ in 0..3 {
            press(&mut app, KeyCode::Right);
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.prompt(), "Pick an end date");
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.prompt(), "Pick a country");
        app.country = Some(Country::Malta);
        assert_eq!(app.prompt(), "Press a to confirm");
    }

    #[test]
    fn test_focus_stops_at_grid_edges() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.focus.index(), 0);
        for _ in 0..200 {
            press(&mut app, KeyCode::Right);
        }
        assert_eq!(app.focus.index(), app.cells().len() - 1);
    }

    #[test]
    fn test_month_navigation_keeps_selection() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        pick_range(&mut app);
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.month, MonthYear::new(2024, 3));
        press(&mut app, KeyCode::Char('['));
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.month, MonthYear::new(2024, 1));
        assert_eq!(app.selection.state(), SelectionState::RangeSelected);
    }

    #[test]
    fn test_typed_dates_drive_selection() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        press(&mut app, KeyCode::Char('s'));
        type_text(&mut app, "2024-02-10");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "2024-02-30");
        assert_eq!(app.selection.state(), SelectionState::StartSelected);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "29");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.selection.range(), Some((d(2024, 2, 10), d(2024, 2, 29))));
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_blur_with_bad_text_shows_error_and_keeps_selection() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        pick_range(&mut app);
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "x");
        press(&mut app, KeyCode::Esc);
        assert_eq!(messages(&app), vec![crate::picker::field::DATE_FORMAT_MESSAGE]);
        assert_eq!(app.selection.range(), Some((d(2024, 2, 1), d(2024, 2, 5))));
    }

    #[test]
    fn test_confirm_without_range_warns() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.toasts.active()[0].severity, Severity::Warning);
        drop(app);
        assert!(store.trips_for("u1").is_empty());
    }

    #[test]
    fn test_confirm_adds_trip_and_resets_picker() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        pick_range(&mut app);
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.country, Some(Country::ALL[1]));
        press(&mut app, KeyCode::Char('a'));

        assert_eq!(messages(&app), vec!["Trip added successfully!"]);
        assert_eq!(app.selection.state(), SelectionState::Empty);
        assert!(app.trips.is_empty(), "list changes only through the subscription");
        app.tick(Instant::now());
        assert_eq!(app.trips.len(), 1);
        assert_eq!(app.trips[0].start_date, d(2024, 2, 1));
        assert_eq!(app.snapshot().total_days_used, 4);
    }

    #[test]
    fn test_edit_from_list_saves_over_trip() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let id = store
            .create_trip("u1", Country::France, d(2024, 1, 10), d(2024, 1, 20))
            .unwrap();
        let mut app = make_app(&mut store);
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.view_state, ViewState::Calendar);
        assert_eq!(app.editing.as_deref(), Some(id.as_str()));
        assert_eq!(app.selection.range(), Some((d(2024, 1, 10), d(2024, 1, 20))));
        assert_eq!(app.country, Some(Country::France));
        assert_eq!(app.month, MonthYear::new(2024, 1));

        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(
            messages(&app),
            vec!["Editing trip to France", "Trip edited successfully!"]
        );
        assert!(app.editing.is_none());
        drop(app);
        let trip = store.get(&id).unwrap();
        assert_ne!(trip.country, Country::France);
        assert_eq!(trip.end_date, d(2024, 1, 20));
    }

    #[test]
    fn test_delete_from_list() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        store
            .create_trip("u1", Country::Spain, d(2024, 1, 10), d(2024, 1, 20))
            .unwrap();
        let mut app = make_app(&mut store);
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(messages(&app), vec!["Successfully deleted trip!"]);
        assert_eq!(app.trips.len(), 1);
        app.tick(Instant::now());
        assert!(app.trips.is_empty());
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view_state, ViewState::Calendar);
    }

    #[test]
    fn test_cancel_clears_selection_and_edit() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        pick_range(&mut app);
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.selection.state(), SelectionState::Empty);
        assert!(app.fields.start_text.is_empty());
    }

    #[test]
    fn test_toasts_expire_on_tick() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.toasts.active().len(), 1);
        app.tick(Instant::now() + StdDuration::from_secs(5));
        assert!(app.toasts.is_empty());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let app = make_app(&mut store);
        drop(app);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_q_and_ctrl_c_quit() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTripStore::open(tmp.path()).unwrap();
        let mut app = make_app(&mut store);
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(press(&mut app, KeyCode::Char('q')));
    }
}
