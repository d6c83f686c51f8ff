use std::{cmp, io, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{error, info};

use etsim_core::{
    config::{
        AppConfig, MARKET_CAP_STEP, MAX_MARKET_CAP, MAX_PERMIT_PRICE, MIN_MARKET_CAP,
        MIN_PERMIT_PRICE, PERMIT_PRICE_STEP,
    },
    save::{SaveEntry, SaveManager},
    GameState, OutcomeClass, Phase, TILES,
};

use crate::dice;

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_NAME_LEN: usize = 24;

/// Board ring laid out on a 5×5 grid: tiles run counter-clockwise from
/// GO in the bottom-left corner.
const BOARD_GRID: [[Option<usize>; 5]; 5] = [
    [Some(12), Some(11), Some(10), Some(9), Some(8)],
    [Some(13), None, None, None, Some(7)],
    [Some(14), None, None, None, Some(6)],
    [Some(15), None, None, None, Some(5)],
    [Some(0), Some(1), Some(2), Some(3), Some(4)],
];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

const MENU_ITEMS: [&str; 4] = ["New Game", "Continue", "How to Play", "Quit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Setup,
    Play,
    Continue,
    Help,
}

/// Editable text field with a cursor, shared by the setup name inputs and
/// the save prompt. The cursor is a char index; names from the config file
/// are free text, so edits must never split a multi-byte character.
#[derive(Debug, Clone)]
struct TextField {
    input: String,
    cursor: usize,
}

impl TextField {
    fn new(initial: &str) -> Self {
        Self {
            input: initial.to_string(),
            cursor: initial.chars().count(),
        }
    }

    fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    /// Byte offset of the given char index, saturating to the end.
    fn byte_offset(&self, char_idx: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_idx)
            .map(|(offset, _)| offset)
            .unwrap_or(self.input.len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.char_count() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    fn insert(&mut self, ch: char) {
        if self.char_count() >= MAX_NAME_LEN || ch.is_control() {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.input.insert(at, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_offset(self.cursor);
            self.input.remove(at);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_offset(self.cursor);
            self.input.remove(at);
        }
    }

    fn value(&self) -> &str {
        self.input.trim()
    }

    /// The field content with a visible cursor marker.
    fn display(&self) -> String {
        let at = self.byte_offset(self.cursor);
        let mut shown = self.input.clone();
        shown.insert(at, '▏');
        shown
    }
}

/// Pre-game configuration form.
#[derive(Debug, Clone)]
struct SetupForm {
    market_cap: u32,
    permit_price: f64,
    names: [TextField; 2],
    cursor: usize,
    /// Industries have been assigned and the allocation preview is showing.
    assigned: bool,
}

impl SetupForm {
    const FIELDS: usize = 4;

    fn from_config(config: &AppConfig) -> Self {
        Self {
            market_cap: config.market_cap,
            permit_price: config.permit_price,
            names: [
                TextField::new(&config.industry_a),
                TextField::new(&config.industry_b),
            ],
            cursor: 0,
            assigned: false,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let fields = Self::FIELDS as isize;
        self.cursor = (self.cursor as isize + delta).rem_euclid(fields) as usize;
    }

    fn name_field_mut(&mut self) -> Option<&mut TextField> {
        match self.cursor {
            2 => Some(&mut self.names[0]),
            3 => Some(&mut self.names[1]),
            _ => None,
        }
    }

    /// Step the focused numeric field, clamped to its supported range.
    fn adjust(&mut self, direction: i64) {
        match self.cursor {
            0 => {
                let step = MARKET_CAP_STEP as i64;
                let next = self.market_cap as i64 + direction * step;
                self.market_cap =
                    next.clamp(MIN_MARKET_CAP as i64, MAX_MARKET_CAP as i64) as u32;
            }
            1 => {
                let next = self.permit_price + direction as f64 * PERMIT_PRICE_STEP;
                self.permit_price = next.clamp(MIN_PERMIT_PRICE, MAX_PERMIT_PRICE);
            }
            _ => {}
        }
    }
}

/// Quantity entry for a permit purchase.
#[derive(Debug, Clone)]
struct TradeModal {
    industry: usize,
    input: String,
}

impl TradeModal {
    fn new(industry: usize) -> Self {
        Self {
            industry,
            input: String::new(),
        }
    }

    fn append_digit(&mut self, ch: char) {
        if ch.is_ascii_digit() && self.input.len() < 9 {
            self.input.push(ch);
        }
    }

    fn backspace(&mut self) {
        self.input.pop();
    }

    fn quantity(&self) -> u32 {
        self.input.parse().unwrap_or(0)
    }
}

/// High-level application state for the terminal frontend.
pub struct EtsimApp {
    config: AppConfig,
    game: GameState,
    screen: Screen,
    menu_cursor: usize,
    setup: SetupForm,
    save_manager: SaveManager,
    saves: Vec<SaveEntry>,
    continue_cursor: usize,
    trade: Option<TradeModal>,
    save_prompt: Option<TextField>,
    status: Option<String>,
    should_quit: bool,
    theme: Theme,
}

impl EtsimApp {
    pub fn new(config: AppConfig) -> Self {
        let game = GameState::new(config.market_cap, config.permit_price);
        let setup = SetupForm::from_config(&config);
        Self {
            config,
            game,
            screen: Screen::Menu,
            menu_cursor: 0,
            setup,
            save_manager: SaveManager::new(SaveManager::default_root()),
            saves: Vec::new(),
            continue_cursor: 0,
            trade: None,
            save_prompt: None,
            status: None,
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        self.refresh_saves();
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }
            if event::poll(TICK_RATE).context("failed to poll terminal events")? {
                if let Event::Key(key) = event::read().context("failed to read terminal event")? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }
        Ok(())
    }

    fn refresh_saves(&mut self) {
        match self.save_manager.entries() {
            Ok(entries) => {
                self.saves = entries;
                if self.continue_cursor >= self.saves.len() {
                    self.continue_cursor = self.saves.len().saturating_sub(1);
                }
            }
            Err(err) => {
                error!("failed to list saves: {err:#}");
                self.set_status(format!("Failed to list saves: {err}"));
            }
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    // Input handling

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            self.should_quit = true;
            return;
        }
        if self.save_prompt.is_some() {
            self.handle_save_prompt_key(key);
            return;
        }
        if self.trade.is_some() {
            self.handle_trade_key(key);
            return;
        }
        if self.screen == Screen::Play && self.game.pending_investment.is_some() {
            self.handle_investment_key(key);
            return;
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Setup => self.handle_setup_key(key),
            Screen::Play => self.handle_play_key(key),
            Screen::Continue => self.handle_continue_key(key),
            Screen::Help => self.handle_help_key(key),
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        let items = MENU_ITEMS.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_cursor = (self.menu_cursor + items - 1) % items;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.menu_cursor = (self.menu_cursor + 1) % items;
            }
            KeyCode::Enter => match self.menu_cursor {
                0 => {
                    self.setup = SetupForm::from_config(&self.config);
                    self.screen = Screen::Setup;
                    self.set_status("Adjust the market, name the industries, then press enter");
                }
                1 => {
                    self.refresh_saves();
                    self.screen = Screen::Continue;
                }
                2 => self.screen = Screen::Help,
                _ => self.should_quit = true,
            },
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_help_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.screen = Screen::Menu,
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_setup_key(&mut self, key: KeyEvent) {
        if self.setup.assigned {
            match key.code {
                KeyCode::Enter | KeyCode::Char('s') => self.start_game(),
                KeyCode::Char('r') => self.assign_industries(),
                KeyCode::Esc => self.setup.assigned = false,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.screen = Screen::Menu,
            KeyCode::Up => self.setup.move_cursor(-1),
            KeyCode::Down | KeyCode::Tab => self.setup.move_cursor(1),
            KeyCode::Enter => self.assign_industries(),
            KeyCode::Left => match self.setup.cursor {
                0 | 1 => self.setup.adjust(-1),
                _ => {
                    if let Some(field) = self.setup.name_field_mut() {
                        field.move_cursor(-1);
                    }
                }
            },
            KeyCode::Right => match self.setup.cursor {
                0 | 1 => self.setup.adjust(1),
                _ => {
                    if let Some(field) = self.setup.name_field_mut() {
                        field.move_cursor(1);
                    }
                }
            },
            KeyCode::Home => {
                if let Some(field) = self.setup.name_field_mut() {
                    field.move_home();
                }
            }
            KeyCode::End => {
                if let Some(field) = self.setup.name_field_mut() {
                    field.move_end();
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = self.setup.name_field_mut() {
                    field.backspace();
                }
            }
            KeyCode::Delete => {
                if let Some(field) = self.setup.name_field_mut() {
                    field.delete();
                }
            }
            KeyCode::Char(ch) => {
                if let Some(field) = self.setup.name_field_mut() {
                    field.insert(ch);
                }
            }
            _ => {}
        }
    }

    fn assign_industries(&mut self) {
        self.game = GameState::new(self.setup.market_cap, self.setup.permit_price);
        let name_a = self.setup.names[0].value().to_string();
        let name_b = self.setup.names[1].value().to_string();
        self.game.assign_industries(&name_a, &name_b);
        self.setup.assigned = true;
        self.set_status("Industries assigned — s to start, r to reshuffle");
    }

    fn start_game(&mut self) {
        match self.game.start() {
            Ok(()) => {
                self.screen = Screen::Play;
                let name = self
                    .game
                    .current_industry()
                    .map(|i| i.name.clone())
                    .unwrap_or_default();
                self.set_status(format!("Game started — {name} rolls first (r)"));
            }
            Err(err) => self.set_status(err.to_string()),
        }
    }

    fn handle_play_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.screen = Screen::Menu,
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') => self.roll(),
            KeyCode::Char('1') => self.open_trade(0),
            KeyCode::Char('2') => self.open_trade(1),
            KeyCode::Char('s') => {
                let default = format!("Game {}", Local::now().format("%Y-%m-%d %H:%M"));
                self.save_prompt = Some(TextField::new(&default));
            }
            KeyCode::Char('n') => {
                self.setup.assigned = false;
                self.screen = Screen::Setup;
                self.set_status("Configure the next game");
            }
            _ => {}
        }
    }

    fn roll(&mut self) {
        match self.game.roll_and_move() {
            Ok(report) => {
                let mut message = format!(
                    "{} rolled {} → {}",
                    report.industry, report.roll, report.tile_name
                );
                if report.offer {
                    message.push_str(" — investment decision pending");
                } else if report.game_over {
                    message.push_str(" — all industries finished!");
                } else if report.completed_lap {
                    message.push_str(" — circuit complete");
                }
                self.set_status(message);
            }
            Err(err) => self.set_status(err.to_string()),
        }
    }

    fn open_trade(&mut self, industry: usize) {
        if self.game.industries.get(industry).is_none() {
            return;
        }
        if self.game.phase == Phase::NotStarted {
            self.set_status("Start the game before trading");
            return;
        }
        self.trade = Some(TradeModal::new(industry));
    }

    fn handle_investment_key(&mut self, key: KeyEvent) {
        let accept = match key.code {
            KeyCode::Char('y') | KeyCode::Enter => true,
            KeyCode::Char('n') | KeyCode::Esc => false,
            _ => return,
        };
        match self.game.resolve_investment(accept) {
            Ok(outcome) => {
                use etsim_core::InvestmentOutcome;
                match outcome {
                    InvestmentOutcome::Purchased { reduction_pct, .. } => self.set_status(
                        format!("Equipment purchased! Pollution reduced by {reduction_pct}%"),
                    ),
                    InvestmentOutcome::Declined => self.set_status("Investment skipped"),
                }
            }
            Err(err) => self.set_status(err.to_string()),
        }
    }

    fn handle_trade_key(&mut self, key: KeyEvent) {
        let Some(industry) = self.trade.as_ref().map(|modal| modal.industry) else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.trade = None,
            KeyCode::Backspace => {
                if let Some(modal) = self.trade.as_mut() {
                    modal.backspace();
                }
            }
            KeyCode::Char('m') => {
                let max = self.game.max_purchasable(industry, self.game.market.permit_price);
                if let Some(modal) = self.trade.as_mut() {
                    modal.input = max.to_string();
                }
            }
            KeyCode::Char(ch) if ch.is_ascii_digit() => {
                if let Some(modal) = self.trade.as_mut() {
                    modal.append_digit(ch);
                }
            }
            KeyCode::Enter => {
                let quantity = self.trade.as_ref().map_or(0, |modal| modal.quantity());
                let price = self.game.market.permit_price;
                match self.game.buy_permits(industry, quantity, price) {
                    Ok(cost) => {
                        let name = self.game.industries[industry].name.clone();
                        self.set_status(format!(
                            "{name} bought {quantity} permits for {}",
                            money(cost)
                        ));
                        self.trade = None;
                    }
                    Err(err) => self.set_status(err.to_string()),
                }
            }
            _ => {}
        }
    }

    fn handle_save_prompt_key(&mut self, key: KeyEvent) {
        let Some(field) = self.save_prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.save_prompt = None,
            KeyCode::Left => field.move_cursor(-1),
            KeyCode::Right => field.move_cursor(1),
            KeyCode::Home => field.move_home(),
            KeyCode::End => field.move_end(),
            KeyCode::Backspace => field.backspace(),
            KeyCode::Delete => field.delete(),
            KeyCode::Char(ch) => field.insert(ch),
            KeyCode::Enter => {
                let name = field.value().to_string();
                match self.save_manager.create_save(&name, &self.game) {
                    Ok(entry) => {
                        info!("saved game to {}", entry.path.display());
                        self.set_status(format!("Saved: {}", entry.name));
                    }
                    Err(err) => {
                        error!("failed to save game: {err:#}");
                        self.set_status(format!("Save failed: {err}"));
                    }
                }
                self.save_prompt = None;
                self.refresh_saves();
            }
            _ => {}
        }
    }

    fn handle_continue_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.screen = Screen::Menu,
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.continue_cursor = self.continue_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.continue_cursor + 1 < self.saves.len() {
                    self.continue_cursor += 1;
                }
            }
            KeyCode::Char('d') => {
                if let Some(entry) = self.saves.get(self.continue_cursor).cloned() {
                    match self.save_manager.delete(&entry) {
                        Ok(()) => self.set_status(format!("Deleted: {}", entry.name)),
                        Err(err) => self.set_status(format!("Delete failed: {err}")),
                    }
                    self.refresh_saves();
                }
            }
            KeyCode::Enter => {
                if let Some(entry) = self.saves.get(self.continue_cursor).cloned() {
                    match self.save_manager.load(&entry) {
                        Ok(payload) => {
                            self.game = payload.into_state();
                            self.screen = Screen::Play;
                            self.set_status(format!("Restored: {}", entry.name));
                        }
                        Err(err) => {
                            error!("failed to load save: {err:#}");
                            self.set_status(format!("Load failed: {err}"));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    // Rendering

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Menu => self.draw_menu(frame),
            Screen::Setup => self.draw_setup(frame),
            Screen::Play => self.draw_play(frame),
            Screen::Continue => self.draw_continue(frame),
            Screen::Help => self.draw_help(frame),
        }
        if self.screen == Screen::Play {
            if self.game.pending_investment.is_some() {
                self.render_investment_modal(frame);
            }
            if self.game.phase == Phase::Over && self.trade.is_none() {
                self.render_results(frame);
            }
        }
        if let Some(modal) = self.trade.clone() {
            self.render_trade_modal(frame, &modal);
        }
        if let Some(field) = self.save_prompt.clone() {
            self.render_save_prompt(frame, &field);
        }
    }

    fn draw_menu(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(3), Constraint::Length(3)])
            .split(area);

        let title = Paragraph::new(vec![
            Line::from(Span::styled(
                "ETSIM — Emission Trading Simulation",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Learn cap-and-trade through interactive gameplay",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, layout[0]);

        let menu_area = centered_rect(28, 8, layout[1]);
        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();
        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);

        self.render_status(frame, layout[2]);
    }

    fn draw_help(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(3)])
            .split(area);

        let heading = Style::default()
            .fg(self.theme.accent)
            .add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(Span::styled("Objective", heading)),
            Line::from(
                "Keep the industries' combined pollution within the market cap while staying profitable.",
            ),
            Line::from(""),
            Line::from(Span::styled("Key concepts", heading)),
            Line::from("Cap-and-trade: industries receive pollution permits and can trade them."),
            Line::from("Market cap: total allowed pollution for both industries combined."),
            Line::from("Permits: each permit covers one kg of pollution at true-up."),
            Line::from("Trading: buy extra permits from the market reserve when running short."),
            Line::from("Investments: abatement and maintenance offers cut pollution for a price."),
            Line::from(""),
            Line::from(Span::styled("Victory conditions", heading)),
        ];
        for class in [
            OutcomeClass::EveryoneWins,
            OutcomeClass::PartialSuccess,
            OutcomeClass::EveryoneLoses,
        ] {
            lines.push(Line::from(format!(
                "{} — {}",
                class.headline(),
                class.summary()
            )));
        }
        lines.extend([
            Line::from(""),
            Line::from(Span::styled("Getting started", heading)),
            Line::from("Pick New Game, adjust the market, name the industries, and assign sizes."),
            Line::from("Take turns rolling the die; resolve investment offers as they appear."),
            Line::from("Trade permits (1/2) to stay compliant before both laps complete."),
            Line::from(""),
            Line::from(Span::styled(
                "esc back to menu",
                Style::default().fg(self.theme.muted),
            )),
        ]);
        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("How to Play"))
            .wrap(Wrap { trim: false });
        frame.render_widget(widget, layout[0]);

        self.render_status(frame, layout[1]);
    }

    fn draw_setup(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(3)])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[0]);

        let marker = |active: bool| {
            if active {
                Span::styled("▶ ", Style::default().fg(self.theme.accent))
            } else {
                Span::raw("  ")
            }
        };
        let editing = !self.setup.assigned;
        let mut lines = vec![
            Line::from(vec![
                marker(editing && self.setup.cursor == 0),
                Span::raw(format!(
                    "Market cap (kg):     {}",
                    group_digits(i64::from(self.setup.market_cap))
                )),
            ]),
            Line::from(vec![
                marker(editing && self.setup.cursor == 1),
                Span::raw(format!("Permit floor price:  ₹{:.1}", self.setup.permit_price)),
            ]),
            Line::from(vec![
                marker(editing && self.setup.cursor == 2),
                Span::raw(format!(
                    "Industry 1 name:     {}",
                    if editing && self.setup.cursor == 2 {
                        self.setup.names[0].display()
                    } else {
                        self.setup.names[0].input.clone()
                    }
                )),
            ]),
            Line::from(vec![
                marker(editing && self.setup.cursor == 3),
                Span::raw(format!(
                    "Industry 2 name:     {}",
                    if editing && self.setup.cursor == 3 {
                        self.setup.names[1].display()
                    } else {
                        self.setup.names[1].input.clone()
                    }
                )),
            ]),
            Line::from(""),
        ];
        if editing {
            lines.push(Line::from(Span::styled(
                "↑/↓ select · ←/→ adjust · enter assign industries · esc menu",
                Style::default().fg(self.theme.muted),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "s start game · r reshuffle sizes · esc edit settings",
                Style::default().fg(self.theme.muted),
            )));
        }
        let form = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Game Configuration"))
            .wrap(Wrap { trim: false });
        frame.render_widget(form, columns[0]);

        let preview = if self.setup.assigned && self.game.industries.len() == 2 {
            let mut lines = Vec::new();
            for industry in &self.game.industries {
                lines.push(Line::from(Span::styled(
                    industry.display_label(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(format!(
                    "  initial permits {}   max {}",
                    group_digits(i64::from(industry.initial_permits)),
                    group_digits(i64::from(industry.max_permits))
                )));
                lines.push(Line::from(format!(
                    "  production {}   pollution {} kg",
                    format_number(industry.produce),
                    format_number(industry.pollution)
                )));
                lines.push(Line::from(""));
            }
            lines.push(Line::from(format!(
                "Market reserve: {} permits at ₹{:.1}",
                group_digits(i64::from(self.game.market.permits_remaining)),
                self.game.market.permit_price
            )));
            lines
        } else {
            vec![Line::from(Span::styled(
                "Assign industries to preview allocations",
                Style::default().fg(self.theme.muted),
            ))]
        };
        let preview = Paragraph::new(preview)
            .block(Block::default().borders(Borders::ALL).title("Allocations"))
            .wrap(Wrap { trim: false });
        frame.render_widget(preview, columns[1]);

        self.render_status(frame, layout[1]);
    }

    fn draw_play(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(17),
                Constraint::Length(8),
                Constraint::Length(3),
            ])
            .split(area);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(rows[0]);

        self.render_board(frame, top[0]);

        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(5)])
            .split(top[1]);
        self.render_industries(frame, sidebar[0]);
        self.render_market(frame, sidebar[1]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(rows[1]);
        self.render_log(frame, bottom[0]);
        self.render_help(frame, bottom[1]);

        self.render_status(frame, rows[2]);
    }

    fn render_board(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Game Board");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let row_areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Ratio(1, 5); 5])
            .split(inner);
        for (row_idx, row) in BOARD_GRID.iter().enumerate() {
            let cell_areas = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 5); 5])
                .split(row_areas[row_idx]);
            for (col_idx, cell) in row.iter().enumerate() {
                match cell {
                    Some(tile_idx) => {
                        self.render_tile(frame, cell_areas[col_idx], *tile_idx);
                    }
                    None if row_idx == 2 && col_idx == 2 => {
                        self.render_dice(frame, cell_areas[col_idx]);
                    }
                    None => {}
                }
            }
        }
    }

    fn render_tile(&self, frame: &mut Frame, area: Rect, tile_idx: usize) {
        let tile = &TILES[tile_idx];
        let occupied = self
            .game
            .industries
            .iter()
            .any(|industry| industry.position == tile_idx);
        let active_here = self
            .game
            .current_industry()
            .map(|industry| industry.position == tile_idx && self.game.phase == Phase::InProgress)
            .unwrap_or(false);

        let border_style = if active_here {
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD)
        } else if occupied {
            Style::default().fg(self.theme.warning)
        } else {
            Style::default().fg(self.theme.muted)
        };

        // First industry marks with a filled pip, second with a hollow one.
        let marker_line: String = self
            .game
            .industries
            .iter()
            .enumerate()
            .filter(|(_, industry)| industry.position == tile_idx)
            .map(|(idx, _)| if idx == 0 { "● " } else { "○ " })
            .collect();

        let lines = vec![
            Line::from(Span::styled(
                tile.name,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(tile.detail, Style::default().fg(self.theme.muted))),
            Line::from(Span::styled(
                marker_line,
                Style::default().fg(self.theme.warning),
            )),
        ];
        let widget = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(format!("{tile_idx}")),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(widget, area);
    }

    fn render_dice(&self, frame: &mut Frame, area: Rect) {
        let Some(roll) = self.game.last_roll else {
            return;
        };
        let mut lines: Vec<Line> = dice::render(roll)
            .iter()
            .map(|row| {
                Line::from(Span::styled(
                    *row,
                    Style::default().fg(self.theme.accent),
                ))
            })
            .collect();
        lines.push(Line::from(Span::styled(
            format!("last roll: {roll}"),
            Style::default().fg(self.theme.muted),
        )));
        let widget = Paragraph::new(lines).alignment(Alignment::Center);
        frame.render_widget(widget, area);
    }

    fn render_industries(&self, frame: &mut Frame, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Ratio(1, 2); 2])
            .split(area);
        for (idx, industry) in self.game.industries.iter().enumerate() {
            let Some(slot) = halves.get(idx) else {
                break;
            };
            let active = idx == self.game.current_turn && self.game.phase == Phase::InProgress;
            let mut title = industry.display_label();
            if active {
                title.push_str(" ▶");
            }
            if industry.finished {
                title.push_str(" ✓");
            }
            let border_style = if active {
                Style::default().fg(self.theme.success)
            } else {
                Style::default().fg(self.theme.muted)
            };
            let tile = &TILES[industry.position];
            let lines = vec![
                Line::from(format!("Position:   {} — {}", industry.position, tile.name)),
                Line::from(format!(
                    "Production: {} units",
                    format_number(industry.produce)
                )),
                Line::from(format!(
                    "Pollution:  {} kg",
                    format_number(industry.pollution)
                )),
                Line::from(format!(
                    "Permits:    {} / {}",
                    group_digits(i64::from(industry.permits)),
                    group_digits(i64::from(industry.max_permits))
                )),
                Line::from(format!("Earnings:   {}", money(industry.earnings))),
            ];
            let widget = Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(title),
            );
            frame.render_widget(widget, *slot);
        }
        if self.game.industries.is_empty() {
            let widget = Paragraph::new("No industries assigned")
                .block(Block::default().borders(Borders::ALL).title("Industries"));
            frame.render_widget(widget, area);
        }
    }

    fn render_market(&self, frame: &mut Frame, area: Rect) {
        let market = &self.game.market;
        let lines = vec![
            Line::from(format!(
                "Market cap:        {} kg",
                group_digits(i64::from(market.market_cap))
            )),
            Line::from(format!(
                "Available permits: {}",
                group_digits(i64::from(market.permits_remaining))
            )),
            Line::from(format!("Permit price:      ₹{:.1}", market.permit_price)),
        ];
        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Market Status"));
        frame.render_widget(widget, area);
    }

    fn render_log(&self, frame: &mut Frame, area: Rect) {
        let capacity = area.height.saturating_sub(2) as usize;
        let start = self.game.log.len().saturating_sub(capacity);
        let lines: Vec<Line> = self.game.log[start..]
            .iter()
            .map(|entry| Line::from(entry.as_str()))
            .collect();
        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Game Log"))
            .wrap(Wrap { trim: true });
        frame.render_widget(widget, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from("r      roll the die"),
            Line::from("1 / 2  buy permits for industry"),
            Line::from("s      save game"),
            Line::from("n      new game"),
            Line::from("esc    menu · q quit"),
        ];
        let widget = Paragraph::new(lines)
            .style(Style::default().fg(self.theme.muted))
            .block(Block::default().borders(Borders::ALL).title("Keys"));
        frame.render_widget(widget, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let message = self.status.as_deref().unwrap_or("Ready");
        let widget = Paragraph::new(message)
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .wrap(Wrap { trim: true });
        frame.render_widget(widget, area);
    }

    fn render_investment_modal(&self, frame: &mut Frame) {
        let Some(pending) = self.game.pending_investment else {
            return;
        };
        let Some(industry) = self.game.industries.get(pending.industry) else {
            return;
        };
        let area = centered_rect(56, 9, frame.size());
        frame.render_widget(Clear, area);
        let lines = vec![
            Line::from(Span::styled(
                format!("Investment decision for {}", industry.name),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!(
                "{} equipment: {} for -{}% pollution",
                pending.kind.label(),
                money(pending.cost),
                pending.reduction_pct()
            )),
            Line::from(format!("Current earnings: {}", money(industry.earnings))),
            Line::from(""),
            Line::from(Span::styled(
                "y buy equipment · n skip",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let widget = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.warning))
                    .title("Investment"),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(widget, area);
    }

    fn render_trade_modal(&self, frame: &mut Frame, modal: &TradeModal) {
        let Some(industry) = self.game.industries.get(modal.industry) else {
            return;
        };
        let price = self.game.market.permit_price;
        let max = self.game.max_purchasable(modal.industry, price);
        let quantity = modal.quantity();
        let area = centered_rect(56, 10, frame.size());
        frame.render_widget(Clear, area);
        let lines = vec![
            Line::from(Span::styled(
                format!("Buy permits — {}", industry.name),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!(
                "Price ₹{:.1} · market has {} · max purchasable {}",
                price,
                group_digits(i64::from(self.game.market.permits_remaining)),
                group_digits(i64::from(max))
            )),
            Line::from(format!(
                "Quantity: {}▏   cost {}",
                modal.input,
                money(f64::from(quantity) * price)
            )),
            Line::from(""),
            Line::from(Span::styled(
                "digits type · m max · enter buy · esc cancel",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let widget = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.accent))
                    .title("Permit Trading"),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(widget, area);
    }

    fn render_save_prompt(&self, frame: &mut Frame, field: &TextField) {
        let area = centered_rect(52, 7, frame.size());
        frame.render_widget(Clear, area);
        let lines = vec![
            Line::from("Save name:"),
            Line::from(Span::styled(
                field.display(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "enter save · esc cancel",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Save Game"));
        frame.render_widget(widget, area);
    }

    fn render_results(&self, frame: &mut Frame) {
        let Some(outcome) = self.game.outcome() else {
            return;
        };
        let frame_area = frame.size();
        let width = cmp::min(64, frame_area.width.saturating_sub(4)).max(40);
        let height = cmp::min(16, frame_area.height.saturating_sub(2)).max(10);
        let area = centered_rect(width, height, frame_area);
        frame.render_widget(Clear, area);

        let headline_style = match outcome.class {
            OutcomeClass::EveryoneWins => Style::default().fg(self.theme.success),
            OutcomeClass::PartialSuccess => Style::default().fg(self.theme.warning),
            OutcomeClass::EveryoneLoses => Style::default().fg(self.theme.danger),
        }
        .add_modifier(Modifier::BOLD);

        let mut lines = vec![
            Line::from(Span::styled(outcome.class.headline(), headline_style)),
            Line::from(Span::styled(
                outcome.class.summary(),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(""),
            Line::from(format!(
                "Total pollution {} kg vs cap {} kg (excess {} kg)",
                format_number(outcome.total_pollution),
                group_digits(i64::from(outcome.market_cap)),
                format_number(outcome.excess)
            )),
            Line::from(format!(
                "Total permits held: {}",
                group_digits(i64::from(outcome.total_permits))
            )),
            Line::from(""),
        ];
        for row in &outcome.industries {
            let compliance = if row.compliant {
                Span::styled("compliant", Style::default().fg(self.theme.success))
            } else {
                Span::styled(
                    format!("deficit {} kg", format_number(row.deficit)),
                    Style::default().fg(self.theme.danger),
                )
            };
            lines.push(Line::from(vec![
                Span::raw(format!(
                    "{} ({}) — {} kg / {} permits · ",
                    row.name,
                    row.size_class.label(),
                    format_number(row.pollution),
                    group_digits(i64::from(row.permits))
                )),
                compliance,
                Span::raw(format!(" · earnings {}", money(row.earnings))),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "n new game · esc menu · q quit",
            Style::default().fg(self.theme.muted),
        )));

        let widget = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Final Results"),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(widget, area);
    }

    fn draw_continue(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);

        let total = self.saves.len();
        let mut list_state = ListState::default();
        if total > 0 {
            list_state.select(Some(self.continue_cursor.min(total - 1)));
        }

        let items: Vec<ListItem> = if total == 0 {
            vec![ListItem::new(Line::from("  No saves found"))]
        } else {
            self.saves
                .iter()
                .enumerate()
                .map(|(idx, entry)| {
                    let marker = if idx == self.continue_cursor {
                        Span::styled("▶ ", Style::default().fg(self.theme.accent))
                    } else {
                        Span::raw("  ")
                    };
                    let timestamp = entry.updated_at.format("%Y-%m-%d %H:%M");
                    ListItem::new(Line::from(vec![
                        marker,
                        Span::raw(format!("{}  [{}]", entry.name, timestamp)),
                    ]))
                })
                .collect()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Continue Game (enter load · d delete)");
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, chunks[0], &mut list_state);

        self.render_status(frame, chunks[1]);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to leave raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn group_digits(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if negative {
        format!("-{out}")
    } else {
        out
    }
}

fn money(x: f64) -> String {
    format!("₹{}", group_digits(x.round() as i64))
}

fn format_number(x: f64) -> String {
    group_digits(x.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_grouping() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(26_667), "26,667");
        assert_eq!(group_digits(4_000_000), "4,000,000");
        assert_eq!(group_digits(-5_000), "-5,000");
    }

    #[test]
    fn money_rounds_to_whole_rupees() {
        assert_eq!(money(2_000_000.0), "₹2,000,000");
        assert_eq!(money(499.6), "₹500");
    }

    #[test]
    fn board_grid_covers_every_tile_once() {
        let mut seen = [false; 16];
        for row in BOARD_GRID {
            for cell in row.into_iter().flatten() {
                assert!(!seen[cell], "tile {cell} appears twice");
                seen[cell] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn text_field_editing() {
        let mut field = TextField::new("AB");
        field.move_home();
        field.insert('X');
        assert_eq!(field.input, "XAB");
        field.move_end();
        field.backspace();
        assert_eq!(field.input, "XA");
        field.move_cursor(-2);
        field.delete();
        assert_eq!(field.input, "A");
        assert_eq!(TextField::new("  padded  ").value(), "padded");
    }

    #[test]
    fn text_field_edits_multibyte_names_on_char_boundaries() {
        let mut field = TextField::new("Café");
        field.move_cursor(-1);
        assert_eq!(field.display(), "Caf▏é");
        field.backspace();
        assert_eq!(field.input, "Caé");
        field.move_end();
        field.backspace();
        assert_eq!(field.input, "Ca");
        field.insert('ñ');
        assert_eq!(field.input, "Cañ");
        field.move_home();
        field.delete();
        assert_eq!(field.input, "añ");
    }

    #[test]
    fn setup_form_clamps_adjustments() {
        let mut form = SetupForm::from_config(&AppConfig::default());
        form.cursor = 0;
        for _ in 0..100 {
            form.adjust(1);
        }
        assert_eq!(form.market_cap, MAX_MARKET_CAP);
        for _ in 0..100 {
            form.adjust(-1);
        }
        assert_eq!(form.market_cap, MIN_MARKET_CAP);

        form.cursor = 1;
        for _ in 0..100 {
            form.adjust(-1);
        }
        assert_eq!(form.permit_price, MIN_PERMIT_PRICE);
    }

    #[test]
    fn menu_opens_the_help_screen() {
        let mut app = EtsimApp::new(AppConfig::default());
        for _ in 0..2 {
            app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        }
        assert_eq!(MENU_ITEMS[app.menu_cursor], "How to Play");
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(app.screen, Screen::Help);
        app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert_eq!(app.screen, Screen::Menu);
    }

    #[test]
    fn trade_modal_parses_quantity() {
        let mut modal = TradeModal::new(0);
        assert_eq!(modal.quantity(), 0);
        modal.append_digit('4');
        modal.append_digit('2');
        assert_eq!(modal.quantity(), 42);
        modal.backspace();
        assert_eq!(modal.quantity(), 4);
        modal.append_digit('x');
        assert_eq!(modal.quantity(), 4);
    }
}
