use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parkline_core::{AddOutcome, Bootstrap, ParkingSession, RemovalOutcome, SnapshotStore};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_INPUT_CHARS: usize = 64;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    success: Color,
    warning: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    AddVehicle,
    RemoveVehicle,
    ShowLot,
    ShowQueue,
    Exit,
}

impl MenuChoice {
    const ALL: [MenuChoice; 5] = [
        MenuChoice::AddVehicle,
        MenuChoice::RemoveVehicle,
        MenuChoice::ShowLot,
        MenuChoice::ShowQueue,
        MenuChoice::Exit,
    ];

    fn from_key(ch: char) -> Option<Self> {
        let index = ch.to_digit(10)?.checked_sub(1)? as usize;
        Self::ALL.get(index).copied()
    }

    fn label(self) -> &'static str {
        match self {
            MenuChoice::AddVehicle => "Add Vehicle",
            MenuChoice::RemoveVehicle => "Remove Vehicle",
            MenuChoice::ShowLot => "Show Parking Status",
            MenuChoice::ShowQueue => "Show Waiting Queue",
            MenuChoice::Exit => "Exit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Lot,
    Queue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Capacity,
    Park,
    Remove,
}

impl PromptKind {
    fn title(self) -> &'static str {
        match self {
            PromptKind::Capacity => "New Parking Lot",
            PromptKind::Park => "Add Vehicle",
            PromptKind::Remove => "Remove Vehicle",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            PromptKind::Capacity => "Enter parking lot capacity",
            PromptKind::Park => "Enter vehicle number plate",
            PromptKind::Remove => "Enter vehicle number plate to remove",
        }
    }

    fn accepts(self, ch: char) -> bool {
        match self {
            PromptKind::Capacity => ch.is_ascii_digit(),
            PromptKind::Park | PromptKind::Remove => !ch.is_control(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertResult {
    Inserted,
    Ignored,
    Full,
}

// `cursor` counts chars, not bytes.
#[derive(Debug, Clone)]
struct InputPrompt {
    kind: PromptKind,
    input: String,
    cursor: usize,
}

impl InputPrompt {
    fn new(kind: PromptKind, initial: String) -> Self {
        let cursor = initial.chars().count();
        Self {
            kind,
            input: initial,
            cursor,
        }
    }

    fn char_len(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.input.len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.char_len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    fn insert(&mut self, ch: char) -> InsertResult {
        if !self.kind.accepts(ch) {
            return InsertResult::Ignored;
        }
        if self.char_len() >= MAX_INPUT_CHARS {
            return InsertResult::Full;
        }
        let offset = self.byte_offset(self.cursor);
        self.input.insert(offset, ch);
        self.cursor += 1;
        InsertResult::Inserted
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let offset = self.byte_offset(self.cursor);
            self.input.remove(offset);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let offset = self.byte_offset(self.cursor);
            self.input.remove(offset);
        }
    }

    fn clear(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    fn value(&self) -> &str {
        self.input.trim()
    }
}

enum AppEvent {
    Key(KeyEvent),
    Tick,
}

/// Terminal front end driving a [`ParkingSession`].
pub struct ParkingApp {
    store: SnapshotStore,
    session: Option<ParkingSession>,
    prompt: Option<InputPrompt>,
    view: View,
    menu_cursor: usize,
    status: String,
    should_quit: bool,
    theme: Theme,
}

impl ParkingApp {
    pub fn new(store: SnapshotStore, bootstrap: Bootstrap, default_capacity: Option<usize>) -> Self {
        let (session, prompt, status) = match bootstrap {
            Bootstrap::Restored(session) => {
                let status = format!(
                    "Restored {} parked / {} waiting",
                    session.lot().len(),
                    session.queue().len()
                );
                (Some(session), None, status)
            }
            Bootstrap::AwaitingCapacity => {
                let initial = default_capacity
                    .filter(|capacity| *capacity > 0)
                    .map(|capacity| capacity.to_string())
                    .unwrap_or_default();
                (
                    None,
                    Some(InputPrompt::new(PromptKind::Capacity, initial)),
                    "No saved state found".to_string(),
                )
            }
        };
        Self {
            store,
            session,
            prompt,
            view: View::Lot,
            menu_cursor: 0,
            status,
            should_quit: false,
            theme: Theme::default(),
        }
    }

    /// Replace the status line shown on the first frame.
    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.status = notice.into();
        self
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let outcome = self.event_loop(&mut terminal, &mut event_rx).await;
        // Leave the alternate screen before reporting a loop failure.
        if let Err(err) = restore_terminal(&mut terminal) {
            error!(error = %err, "Failed to restore terminal");
            outcome?;
            return Err(err);
        }
        outcome
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        events: &mut mpsc::Receiver<AppEvent>,
    ) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                return Ok(());
            }
            match events.recv().await {
                Some(AppEvent::Key(key)) => self.handle_key(key),
                Some(AppEvent::Tick) => {}
                None => return Ok(()),
            }
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            if self.session.is_some() {
                self.exit();
            } else {
                self.should_quit = true;
            }
            return;
        }
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
        } else {
            self.handle_menu_key(key);
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_menu_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_menu_cursor(-1),
            KeyCode::Enter => self.activate(MenuChoice::ALL[self.menu_cursor]),
            KeyCode::Char(ch) => match MenuChoice::from_key(ch) {
                Some(choice) => {
                    self.menu_cursor = MenuChoice::ALL
                        .iter()
                        .position(|candidate| *candidate == choice)
                        .unwrap_or(0);
                    self.activate(choice);
                }
                None => self.set_status("Invalid choice. Please try again."),
            },
            _ => {}
        }
    }

    fn move_menu_cursor(&mut self, delta: isize) {
        let last = MenuChoice::ALL.len() as isize - 1;
        self.menu_cursor = (self.menu_cursor as isize + delta).clamp(0, last) as usize;
    }

    fn activate(&mut self, choice: MenuChoice) {
        match choice {
            MenuChoice::AddVehicle => {
                self.prompt = Some(InputPrompt::new(PromptKind::Park, String::new()));
            }
            MenuChoice::RemoveVehicle => {
                self.prompt = Some(InputPrompt::new(PromptKind::Remove, String::new()));
            }
            MenuChoice::ShowLot => {
                self.view = View::Lot;
                self.set_status("Showing parking status");
            }
            MenuChoice::ShowQueue => {
                self.view = View::Queue;
                self.set_status("Showing waiting queue");
            }
            MenuChoice::Exit => self.exit(),
        }
    }

    fn exit(&mut self) {
        let Some(session) = self.session.as_ref() else {
            self.should_quit = true;
            return;
        };
        match session.commit(&self.store) {
            Ok(()) => {
                info!(path = %self.store.path().display(), "Session saved on exit");
                self.set_status("Data saved.");
                self.should_quit = true;
            }
            Err(err) => {
                error!(?err, "Failed to save session");
                self.set_status(format!("Save failed: {err}"));
            }
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                if prompt.kind == PromptKind::Capacity {
                    self.set_status("A capacity is required to open the lot");
                } else {
                    self.prompt = None;
                    self.set_status("Cancelled");
                }
            }
            KeyCode::Enter => self.submit_prompt(),
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.move_home(),
            KeyCode::End => prompt.move_end(),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    if prompt.insert(ch) == InsertResult::Full {
                        self.set_status(format!(
                            "Input is limited to {MAX_INPUT_CHARS} characters"
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    fn submit_prompt(&mut self) {
        let Some(mut prompt) = self.prompt.take() else {
            return;
        };
        let value = prompt.value().to_string();
        let kind = prompt.kind;

        match kind {
            PromptKind::Capacity => match value.parse::<usize>().map(ParkingSession::new) {
                Ok(Ok(session)) => {
                    info!(capacity = session.lot().capacity(), "Started new parking lot");
                    self.set_status(format!(
                        "Parking lot opened with {} spaces",
                        session.lot().capacity()
                    ));
                    self.session = Some(session);
                }
                _ => {
                    prompt.clear();
                    self.prompt = Some(prompt);
                    self.set_status("Capacity must be a positive whole number");
                }
            },
            PromptKind::Park | PromptKind::Remove if value.is_empty() => {
                self.prompt = Some(prompt);
                self.set_status("Number plate cannot be empty");
            }
            PromptKind::Park => self.park(&value),
            PromptKind::Remove => self.remove(&value),
        }
    }

    fn park(&mut self, plate: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let message = match session.add_vehicle(plate) {
            AddOutcome::Parked => format!("Vehicle {plate} parked."),
            AddOutcome::Queued { position } => format!(
                "Parking lot is full. Vehicle {plate} added to waiting queue (position {position})."
            ),
        };
        self.set_status(message);
    }

    fn remove(&mut self, plate: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let was_empty = session.lot().is_empty();
        let message = match session.remove_vehicle(plate) {
            RemovalOutcome::Removed {
                vehicle,
                promoted: Some(next),
            } => format!("Vehicle {vehicle} removed from parking. Vehicle {next} parked from waiting queue."),
            RemovalOutcome::Removed {
                vehicle,
                promoted: None,
            } => format!("Vehicle {vehicle} removed from parking."),
            RemovalOutcome::NotFound if was_empty => "Parking lot is empty.".to_string(),
            RemovalOutcome::NotFound => format!("Vehicle {plate} not found in parking lot."),
        };
        self.set_status(message);
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_header(frame, layout[0]);
        if let Some(session) = &self.session {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(28), Constraint::Min(20)])
                .split(layout[1]);
            self.render_menu(frame, body[0]);
            match self.view {
                View::Lot => self.render_lot(frame, body[1], session),
                View::Queue => self.render_queue(frame, body[1], session),
            }
        }
        self.render_status(frame, layout[2]);

        if let Some(prompt) = &self.prompt {
            self.render_prompt(frame, prompt);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                "PARKLINE",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "  single-lane parking simulation",
                Style::default().fg(self.theme.muted),
            ),
        ]);
        let header = Paragraph::new(title)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        frame.render_widget(header, area);
    }

    fn render_menu(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = MenuChoice::ALL
            .iter()
            .enumerate()
            .map(|(idx, choice)| {
                let label = format!("{}. {}", idx + 1, choice.label());
                if idx == self.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {label}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {label}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();
        let menu = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Menu"));
        frame.render_widget(menu, area);
    }

    fn render_lot(&self, frame: &mut Frame, area: Rect, session: &ParkingSession) {
        let status = session.lot_status();
        let title = format!(
            "Parking Lot Status ({} / {})",
            status.occupied, status.capacity
        );
        let items: Vec<ListItem> = if status.plates.is_empty() {
            vec![ListItem::new(Span::styled(
                "Parking lot is empty.",
                Style::default().fg(self.theme.muted),
            ))]
        } else {
            status
                .plates
                .iter()
                .enumerate()
                .map(|(idx, plate)| {
                    let marker = if idx == 0 { "exit ▶ " } else { "       " };
                    ListItem::new(Line::from(vec![
                        Span::styled(marker, Style::default().fg(self.theme.muted)),
                        Span::styled(plate.clone(), Style::default().fg(self.theme.primary_fg)),
                    ]))
                })
                .collect()
        };
        let border = if status.occupied == status.capacity {
            self.theme.warning
        } else {
            self.theme.success
        };
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(title),
        );
        frame.render_widget(list, area);
    }

    fn render_queue(&self, frame: &mut Frame, area: Rect, session: &ParkingSession) {
        let status = session.queue_status();
        let title = format!("Waiting Queue ({} waiting)", status.waiting);
        let items: Vec<ListItem> = if status.plates.is_empty() {
            vec![ListItem::new(Span::styled(
                "Waiting queue is empty.",
                Style::default().fg(self.theme.muted),
            ))]
        } else {
            status
                .plates
                .iter()
                .enumerate()
                .map(|(idx, plate)| ListItem::new(format!("{:>3}. {plate}", idx + 1)))
                .collect()
        };
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(list, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let secondary = format!("Snapshot: {}", self.store.path().display());
        let paragraph = Paragraph::new(vec![
            Line::from(self.status.clone()),
            Line::from(Span::styled(secondary, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_prompt(&self, frame: &mut Frame, prompt: &InputPrompt) {
        let area = prompt_area(frame.size());

        frame.render_widget(Clear, area);

        let input_line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(prompt.input.clone()),
        ]);
        let mut helper = vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" confirm"),
        ];
        if prompt.kind != PromptKind::Capacity {
            helper.push(Span::raw("  "));
            helper.push(Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)));
            helper.push(Span::raw(" cancel"));
        }

        let paragraph = Paragraph::new(vec![
            Line::from(prompt.kind.instruction()),
            input_line,
            Line::from(""),
            Line::from(helper),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(prompt.kind.title()),
        )
        .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, area);

        let cursor_x =
            (area.x + 3 + prompt.cursor as u16).min(area.x + area.width.saturating_sub(2));
        let cursor_y = area.y + 2;
        frame.set_cursor(cursor_x, cursor_y);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    terminal.show_cursor().context("failed to show cursor")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    disable_raw_mode().context("failed to disable raw mode")
}

/// Forward key events to the app, with a tick whenever the terminal is idle.
///
/// The thread stops once the receiver is dropped or the terminal stops
/// delivering events.
fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        let next = match event::poll(TICK_RATE) {
            Ok(false) => AppEvent::Tick,
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => AppEvent::Key(key),
                Ok(_) => continue,
                Err(err) => {
                    warn!(error = %err, "Terminal read failed, input stopped");
                    break;
                }
            },
            Err(err) => {
                warn!(error = %err, "Terminal poll failed, input stopped");
                break;
            }
        };
        if sender.blocking_send(next).is_err() {
            break;
        }
    });
}

// Prompt box: up to 60 columns wide with a 2-column margin, never narrower
// than 24 or shorter than 5 rows, clipped to the frame.
fn prompt_area(frame: Rect) -> Rect {
    let width = frame.width.saturating_sub(4).clamp(24, 60).min(frame.width);
    let height = frame.height.saturating_sub(2).clamp(5, 6).min(frame.height);
    Rect::new(
        frame.x + (frame.width - width) / 2,
        frame.y + (frame.height - height) / 2,
        width,
        height,
    )
}
