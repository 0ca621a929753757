// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use biodex_app::{
    DialogCommand, DialogEvent, DialogPhase, DialogState, FieldErrors, Kingdom, Notification,
    Severity, Species, SpeciesField, SpeciesId, SpeciesUpdate, UserId,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use log::{info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::macros::format_description;

const TOAST_TTL: Duration = Duration::from_secs(4);
const TRIGGER_LABEL: &str = "[ Edit species ]";
const INVALID_FORM_TITLE: &str = "Invalid species";
const OVERVIEW_ERROR_TITLE: &str = "Error loading species";

/// Side effects the UI needs from the host: the author-scoped read, the
/// single-record write, and a hook that runs after a successful save.
pub trait SpeciesRuntime {
    fn list_species(&mut self, author: &UserId) -> Result<Vec<Species>>;
    fn update_species(&mut self, id: SpeciesId, update: &SpeciesUpdate) -> Result<()>;
    fn species_saved(&mut self, _id: SpeciesId) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalEvent {
    ClearToast { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DialogFocus {
    #[default]
    Candidates,
    Field(SpeciesField),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    overview: Vec<Species>,
    overview_cursor: usize,
    focus: DialogFocus,
    toast: Option<Notification>,
    toast_token: u64,
    help_visible: bool,
}

pub fn run_app<R: SpeciesRuntime>(dialog: &mut DialogState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    reload_overview(dialog, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(&mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, dialog, &view_data)) {
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
                    if handle_key_event(dialog, runtime, &mut view_data, &internal_tx, key) {
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

fn process_internal_events(view_data: &mut ViewData, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearToast { token } if token == view_data.toast_token => {
                view_data.toast = None;
            }
            InternalEvent::ClearToast { .. } => {}
        }
    }
}

fn schedule_toast_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(TOAST_TTL);
        let _ = sender.send(InternalEvent::ClearToast { token });
    });
}

fn emit_toast(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    notification: Notification,
) {
    match notification.severity {
        Severity::Error => warn!("{}", notification.render()),
        Severity::Info | Severity::Success => info!("{}", notification.render()),
    }
    view_data.toast = Some(notification);
    view_data.toast_token = view_data.toast_token.saturating_add(1);
    schedule_toast_clear(internal_tx, view_data.toast_token);
}

fn refresh_overview<R: SpeciesRuntime>(
    dialog: &DialogState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    let rows = runtime.list_species(&dialog.user)?;
    view_data.overview = rows;
    view_data.overview_cursor = view_data
        .overview_cursor
        .min(view_data.overview.len().saturating_sub(1));
    Ok(())
}

fn reload_overview<R: SpeciesRuntime>(
    dialog: &DialogState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = refresh_overview(dialog, runtime, view_data) {
        emit_toast(
            view_data,
            internal_tx,
            Notification::error(OVERVIEW_ERROR_TITLE, format!("{error:#}")),
        );
    }
}

/// Feed one command to the dialog and carry out every request it emits,
/// looping the outcomes back in until the dialog has nothing left to ask.
fn dispatch_dialog<R: SpeciesRuntime>(
    dialog: &mut DialogState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: DialogCommand,
) {
    let mut queue: VecDeque<DialogEvent> = dialog.dispatch(command).into();
    while let Some(event) = queue.pop_front() {
        match event {
            DialogEvent::FetchRequested { request_id, author } => {
                let result = runtime
                    .list_species(&author)
                    .map_err(|error| format!("{error:#}"));
                queue.extend(dialog.dispatch(DialogCommand::CandidatesLoaded { request_id, result }));
            }
            DialogEvent::UpdateRequested { id, update } => {
                let result = runtime
                    .update_species(id, &update)
                    .map_err(|error| format!("{error:#}"));
                queue.extend(dialog.dispatch(DialogCommand::SubmitFinished(result)));
            }
            DialogEvent::Notify(notification) => {
                emit_toast(view_data, internal_tx, notification);
            }
            DialogEvent::ValidationFailed(errors) => {
                if let Some(field) = first_failing_field(&errors) {
                    view_data.focus = DialogFocus::Field(field);
                }
                emit_toast(
                    view_data,
                    internal_tx,
                    Notification::error(INVALID_FORM_TITLE, errors.to_string()),
                );
            }
            DialogEvent::Saved(id) => {
                info!("species {id} saved; reloading overview");
                if let Err(error) = runtime.species_saved(id) {
                    warn!("post-save hook failed for species {id}: {error:#}");
                }
                if let Err(error) = refresh_overview(dialog, runtime, view_data) {
                    // Keep the save confirmation in the same toast as the reload failure.
                    let saved_note = view_data
                        .toast
                        .as_ref()
                        .filter(|toast| toast.severity == Severity::Success)
                        .map(Notification::render);
                    let description = match saved_note {
                        Some(note) => format!("{note}; reloading the list failed: {error:#}"),
                        None => format!("{error:#}"),
                    };
                    emit_toast(
                        view_data,
                        internal_tx,
                        Notification::error(OVERVIEW_ERROR_TITLE, description),
                    );
                }
            }
            DialogEvent::PhaseChanged(DialogPhase::Closed | DialogPhase::NoSelection) => {
                view_data.focus = DialogFocus::Candidates;
            }
            DialogEvent::FormReset(_) => {
                view_data.focus = DialogFocus::Field(SpeciesField::ScientificName);
            }
            DialogEvent::PhaseChanged(_)
            | DialogEvent::CandidatesReplaced(_)
            | DialogEvent::FieldEdited(_) => {}
        }
    }
}

fn first_failing_field(errors: &FieldErrors) -> Option<SpeciesField> {
    SpeciesField::ALL
        .into_iter()
        .find(|field| errors.for_field(*field).is_some())
}

fn handle_key_event<R: SpeciesRuntime>(
    dialog: &mut DialogState,
    runtime: &mut R,
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

    if dialog.phase.is_open() {
        handle_dialog_key(dialog, runtime, view_data, internal_tx, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('e') | KeyCode::Enter => {
            dispatch_dialog(dialog, runtime, view_data, internal_tx, DialogCommand::Open);
        }
        KeyCode::Char('r') => reload_overview(dialog, runtime, view_data, internal_tx),
        KeyCode::Char('j') | KeyCode::Down => move_overview_cursor(view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_overview_cursor(view_data, -1),
        KeyCode::Char('?') => view_data.help_visible = true,
        _ => {}
    }
    false
}

fn handle_dialog_key<R: SpeciesRuntime>(
    dialog: &mut DialogState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => {
            dispatch_dialog(dialog, runtime, view_data, internal_tx, DialogCommand::Close);
            return;
        }
        KeyCode::Char('s') if control => {
            dispatch_dialog(dialog, runtime, view_data, internal_tx, DialogCommand::Submit);
            return;
        }
        KeyCode::Tab => {
            view_data.focus = next_focus(dialog, view_data.focus, 1);
            return;
        }
        KeyCode::BackTab => {
            view_data.focus = next_focus(dialog, view_data.focus, -1);
            return;
        }
        _ => {}
    }

    if dialog.phase == DialogPhase::Submitting {
        return;
    }

    let command = match view_data.focus {
        DialogFocus::Candidates => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(DialogCommand::MoveCursor(-1)),
            KeyCode::Down | KeyCode::Char('j') => Some(DialogCommand::MoveCursor(1)),
            KeyCode::Enter => Some(DialogCommand::SelectAtCursor),
            _ => None,
        },
        DialogFocus::Field(SpeciesField::Kingdom) => match key.code {
            KeyCode::Left => Some(DialogCommand::CycleKingdom(-1)),
            KeyCode::Right | KeyCode::Char(' ') => Some(DialogCommand::CycleKingdom(1)),
            KeyCode::Char(digit @ '1'..='6') => {
                let index = digit as usize - '1' as usize;
                Kingdom::ALL.get(index).map(|kingdom| {
                    DialogCommand::EditField(SpeciesField::Kingdom, kingdom.as_str().to_owned())
                })
            }
            KeyCode::Enter => {
                view_data.focus = next_focus(dialog, view_data.focus, 1);
                None
            }
            _ => None,
        },
        DialogFocus::Field(field) => edit_text_field(dialog, view_data, field, key),
    };

    if let Some(command) = command {
        dispatch_dialog(dialog, runtime, view_data, internal_tx, command);
    }
}

fn edit_text_field(
    dialog: &DialogState,
    view_data: &mut ViewData,
    field: SpeciesField,
    key: KeyEvent,
) -> Option<DialogCommand> {
    let current = dialog.form.value(field);
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('u') if control => Some(DialogCommand::EditField(field, String::new())),
        KeyCode::Char(ch) if !control && !key.modifiers.contains(KeyModifiers::ALT) => {
            let mut next = current.to_owned();
            next.push(ch);
            Some(DialogCommand::EditField(field, next))
        }
        KeyCode::Backspace => {
            let mut next = current.to_owned();
            next.pop()?;
            Some(DialogCommand::EditField(field, next))
        }
        KeyCode::Enter => {
            view_data.focus = next_focus(dialog, view_data.focus, 1);
            None
        }
        _ => None,
    }
}

fn next_focus(dialog: &DialogState, focus: DialogFocus, delta: isize) -> DialogFocus {
    if dialog.selected.is_none() {
        return DialogFocus::Candidates;
    }
    let order = std::iter::once(DialogFocus::Candidates)
        .chain(SpeciesField::ALL.into_iter().map(DialogFocus::Field))
        .collect::<Vec<_>>();
    let current = order.iter().position(|entry| *entry == focus).unwrap_or(0) as isize;
    let len = order.len() as isize;
    order[(current + delta).rem_euclid(len) as usize]
}

fn move_overview_cursor(view_data: &mut ViewData, delta: isize) {
    if view_data.overview.is_empty() {
        view_data.overview_cursor = 0;
        return;
    }
    let last = view_data.overview.len() as isize - 1;
    view_data.overview_cursor = (view_data.overview_cursor as isize + delta).clamp(0, last) as usize;
}

fn render(frame: &mut ratatui::Frame<'_>, dialog: &DialogState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(format!("species authored by {}", dialog.user))
        .block(Block::default().title("biodex").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    render_overview(frame, layout[1], view_data);

    let footer = Paragraph::new(status_text(dialog, view_data))
        .style(toast_style(view_data.toast.as_ref()))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, layout[2]);

    if dialog.phase.is_open() {
        render_dialog(frame, dialog, view_data);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 40, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_overview(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    if view_data.overview.is_empty() {
        let empty = Paragraph::new("no species yet -- records are created elsewhere")
            .block(Block::default().title("species").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let rows = view_data
        .overview
        .iter()
        .map(|species| {
            Row::new(
                overview_cells(species)
                    .into_iter()
                    .map(Cell::from)
                    .collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<_>>();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(34),
            Constraint::Percentage(26),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
            Constraint::Percentage(12),
        ],
    )
    .header(
        Row::new(["scientific name", "common name", "kingdom", "population", "added"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .block(Block::default().title("species").borders(Borders::ALL));

    // The table scrolls to keep the selected row in view.
    let mut state = TableState::default().with_selected(Some(view_data.overview_cursor));
    frame.render_stateful_widget(table, area, &mut state);
}

fn overview_cells(species: &Species) -> [String; 5] {
    [
        species.scientific_name.clone(),
        species.common_name.clone().unwrap_or_default(),
        species
            .kingdom
            .map(|kingdom| kingdom.as_str().to_owned())
            .unwrap_or_else(|| "?".to_owned()),
        species
            .total_population
            .map(format_population)
            .unwrap_or_default(),
        species
            .created_at
            .and_then(|created| {
                created
                    .format(format_description!("[year]-[month]-[day]"))
                    .ok()
            })
            .unwrap_or_default(),
    ]
}

fn render_dialog(frame: &mut ratatui::Frame<'_>, dialog: &DialogState, view_data: &ViewData) {
    let area = centered_rect(84, 76, frame.area());
    frame.render_widget(Clear, area);

    let outer = Block::default()
        .title(dialog_title(dialog))
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(36), Constraint::Percentage(64)])
        .split(inner);

    let candidates_border = if view_data.focus == DialogFocus::Candidates {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let visible_rows = panes[0].height.saturating_sub(2);
    let candidates = Paragraph::new(render_candidates_text(dialog, view_data.focus))
        .scroll((candidate_scroll(dialog.cursor, visible_rows), 0))
        .block(
            Block::default()
                .title("your species")
                .borders(Borders::ALL)
                .border_style(candidates_border),
        );
    frame.render_widget(candidates, panes[0]);

    let form = Paragraph::new(render_form_text(dialog, view_data.focus))
        .wrap(Wrap { trim: false })
        .block(Block::default().title("details").borders(Borders::ALL));
    frame.render_widget(form, panes[1]);
}

/// First line to draw so the cursor row stays on the last visible line.
fn candidate_scroll(cursor: usize, visible_rows: u16) -> u16 {
    let visible = usize::from(visible_rows.max(1));
    let offset = (cursor + 1).saturating_sub(visible);
    u16::try_from(offset).unwrap_or(u16::MAX)
}

fn dialog_title(dialog: &DialogState) -> String {
    let mut title = match dialog.selected_species() {
        Some(species) => format!("edit species: {}", species.scientific_name),
        None => "edit species".to_owned(),
    };
    if dialog.is_dirty() {
        title.push_str(" *");
    }
    if dialog.phase == DialogPhase::Submitting {
        title.push_str(" (saving)");
    }
    title
}

fn render_candidates_text(dialog: &DialogState, focus: DialogFocus) -> String {
    if dialog.candidates.is_empty() {
        return "no species authored by you".to_owned();
    }

    dialog
        .candidates
        .iter()
        .enumerate()
        .map(|(index, species)| {
            let cursor = if index == dialog.cursor && focus == DialogFocus::Candidates {
                ">"
            } else {
                " "
            };
            let mark = if dialog.selected == Some(species.id) {
                "*"
            } else {
                " "
            };
            format!("{cursor}{mark} {}", species.display_name())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_form_text(dialog: &DialogState, focus: DialogFocus) -> String {
    if dialog.selected.is_none() {
        return "select a species on the left (enter) to edit it".to_owned();
    }

    let mut lines = Vec::new();
    for (index, field) in SpeciesField::ALL.into_iter().enumerate() {
        let marker = if focus == DialogFocus::Field(field) {
            ">"
        } else {
            " "
        };
        let value = dialog.form.value(field);
        let shown = if field.is_choice() {
            format!("< {value} >")
        } else {
            value.to_owned()
        };
        lines.push(format!("{marker} {}. {}: {shown}", index + 1, field.label()));
        if let Some(problem) = dialog.field_errors.for_field(field) {
            lines.push(format!("     ! {} {}", field.label(), problem.message()));
        }
    }
    lines.push(String::new());
    lines.push("ctrl+s save | esc close".to_owned());
    lines.join("\n")
}

fn status_text(dialog: &DialogState, view_data: &ViewData) -> String {
    if let Some(toast) = &view_data.toast {
        return toast.render();
    }
    if dialog.phase.is_open() {
        return match view_data.focus {
            DialogFocus::Candidates => {
                "j/k move | enter select | tab fields | ctrl+s save | esc close".to_owned()
            }
            DialogFocus::Field(SpeciesField::Kingdom) => {
                "left/right or 1-6 kingdom | tab next | ctrl+s save | esc close".to_owned()
            }
            DialogFocus::Field(field) => format!(
                "editing {} | ctrl+u clear | tab next | ctrl+s save | esc close",
                field.label()
            ),
        };
    }
    format!("{TRIGGER_LABEL} e/enter | j/k move | r reload | ? help | q quit")
}

fn toast_style(toast: Option<&Notification>) -> Style {
    match toast.map(|toast| toast.severity) {
        Some(Severity::Error) => Style::default().fg(Color::Red),
        Some(Severity::Success) => Style::default().fg(Color::Green),
        Some(Severity::Info) | None => Style::default().fg(Color::Yellow),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
list: e/enter edit species | j/k move | r reload | q quit\n\
dialog: tab/shift+tab focus | ctrl+s save | esc close\n\
candidates: j/k move | enter select (unsaved edits are discarded)\n\
fields: type to edit | backspace | ctrl+u clear | enter next\n\
kingdom: left/right cycle | 1-6 choose"
}

fn format_population(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
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
