use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::clipboard::SystemClipboard;
use crate::config::AppConfig;
use crate::storage::HistoryStore;
use crate::ui;

pub mod actions;
pub mod state;

pub use actions::{ActionDispatcher, ActionError, Outcome};
pub use state::{Confirmation, Notice, NoticeLevel, Tab, Transition, ViewState};

const TICK_RATE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    NextTab,
    JumpTab(usize),
    SelectNext,
    SelectPrevious,
    StartSearch,
    CycleSortKey,
    ToggleSortOrder,
    ToggleCollect,
    Delete,
    Share,
    Open,
    Close,
    Reload,
}

pub struct App {
    pub config: Arc<AppConfig>,
    history: HistoryStore,
    clipboard: SystemClipboard,
    state: ViewState,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, history: HistoryStore) -> Self {
        let mut state = ViewState::from_config(&config);
        state.on_show(&history);
        Self {
            config,
            history,
            clipboard: SystemClipboard::new(),
            state,
            list_state: ListState::default(),
            should_quit: false,
            tick_rate: TICK_RATE,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    if self.state.collection().is_empty() {
                        self.list_state.select(None);
                    }
                    ui::draw_app(
                        frame,
                        &self.state,
                        &mut self.list_state,
                        &self.config.collection,
                    );
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key(key);
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.state.apply(Transition::Tick {
                    at: Instant::now(),
                });
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.state.confirmation.is_some() {
            self.handle_confirmation_key(key);
            return;
        }

        if self.state.search_active && self.handle_search_key(key) {
            return;
        }

        let action = match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Reload)
            }
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Tab => Some(Action::NextTab),
            KeyCode::Char(ch @ '1'..='5') => {
                Some(Action::JumpTab(ch as usize - '1' as usize))
            }
            KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNext),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrevious),
            KeyCode::Enter => Some(Action::Open),
            KeyCode::Esc => Some(Action::Close),
            _ if self.state.current_tab != Tab::Collection => None,
            KeyCode::Char('/') => Some(Action::StartSearch),
            KeyCode::Char('s') => Some(Action::CycleSortKey),
            KeyCode::Char('o') => Some(Action::ToggleSortOrder),
            KeyCode::Char('c') => Some(Action::ToggleCollect),
            KeyCode::Char('d') => Some(Action::Delete),
            KeyCode::Char('y') => Some(Action::Share),
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => {
                self.state.apply(Transition::ClearSearch);
                true
            }
            KeyCode::Enter => {
                self.state.apply(Transition::FinishSearch);
                true
            }
            KeyCode::Backspace => {
                let mut text = self.state.search_input.clone();
                text.pop();
                self.push_search_text(text);
                true
            }
            KeyCode::Char(ch)
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                let mut text = self.state.search_input.clone();
                text.push(ch);
                self.push_search_text(text);
                true
            }
            _ => false,
        }
    }

    fn push_search_text(&mut self, text: String) {
        self.state.apply(Transition::SearchInput {
            text,
            at: Instant::now(),
        });
    }

    fn handle_confirmation_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                self.state.confirm(&self.history);
            }
            KeyCode::Esc | KeyCode::Char('n') => self.state.cancel_confirmation(),
            _ => {}
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::NextTab => {
                let next = self.state.current_tab.next();
                self.switch_tab(next);
            }
            Action::JumpTab(index) => {
                if let Some(tab) = Tab::from_index(index) {
                    self.switch_tab(tab);
                }
            }
            Action::SelectNext => self.state.apply(Transition::MoveSelection(1)),
            Action::SelectPrevious => self.state.apply(Transition::MoveSelection(-1)),
            Action::StartSearch => self.state.search_active = true,
            Action::CycleSortKey => {
                let next = self.state.sort.field.next();
                self.state.apply(Transition::SortBy(next));
            }
            Action::ToggleSortOrder => {
                let next = self.state.sort.direction.toggled();
                self.state.apply(Transition::SortOrder(next));
            }
            Action::ToggleCollect => self.state.request_toggle_collect(),
            Action::Delete => self.state.request_delete(),
            Action::Share => self.state.share(&mut self.clipboard),
            Action::Open => match self.state.current_tab {
                Tab::Collection => self.state.apply(Transition::OpenDetail),
                _ => self.state.tap_catalog_item(),
            },
            Action::Close => {
                if self.state.show_dream_detail {
                    self.state.apply(Transition::CloseDetail);
                } else if !self.state.search_keyword.is_empty() {
                    self.state.apply(Transition::ClearSearch);
                }
            }
            Action::Reload => {
                self.state.on_show(&self.history);
                tracing::debug!("collection reloaded on request");
            }
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        let entering_collection = tab == Tab::Collection && self.state.current_tab != tab;
        self.state.apply(Transition::SwitchTab(tab));
        if entering_collection {
            self.state.on_show(&self.history);
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dream::DreamRecord;
    use crate::storage::tests::init_storage;
    use crate::storage::HistoryRepository;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn seeded_app() -> anyhow::Result<(tempfile::TempDir, App)> {
        let (temp, storage) = init_storage()?;
        let history = storage.history();
        history.save(&[
            DreamRecord::new("a", "Glass orchard", "poetic", "2024-03-01T00:00:00Z")
                .collected_at("2024-03-02T00:00:00Z"),
            DreamRecord::new("b", "Singing teapot", "humorous", "2024-03-03T00:00:00Z")
                .collected_at("2024-03-04T00:00:00Z"),
        ])?;
        let app = App::new(Arc::new(AppConfig::default()), history);
        Ok((temp, app))
    }

    #[test]
    fn delete_key_asks_before_removing() -> anyhow::Result<()> {
        let (_temp, mut app) = seeded_app()?;
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('d'));
        assert!(app.state.confirmation.is_some());
        assert_eq!(app.history.load()?.len(), 2);

        press(&mut app, KeyCode::Enter);
        let remaining: Vec<_> = app.history.load()?.into_iter().map(|r| r.id).collect();
        assert_eq!(remaining, vec!["b"]);
        assert_eq!(app.state.collection().len(), 1);
        Ok(())
    }

    #[test]
    fn escape_cancels_confirmation() -> anyhow::Result<()> {
        let (_temp, mut app) = seeded_app()?;
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Esc);
        assert!(app.state.confirmation.is_none());
        assert!(app.history.load()?.iter().all(|r| r.is_collected));
        Ok(())
    }

    #[test]
    fn search_keys_feed_the_debouncer() -> anyhow::Result<()> {
        let (_temp, mut app) = seeded_app()?;
        press(&mut app, KeyCode::Char('/'));
        for ch in "tea".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        assert_eq!(app.state.search_input, "tea");
        assert!(app.state.search_keyword.is_empty());
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state.search_keyword, "tea");
        assert_eq!(app.state.collection().len(), 1);
        Ok(())
    }

    #[test]
    fn catalog_tabs_ignore_collection_keys() -> anyhow::Result<()> {
        let (_temp, mut app) = seeded_app()?;
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.state.current_tab, Tab::Knowledge);
        press(&mut app, KeyCode::Char('d'));
        assert!(app.state.confirmation.is_none());
        press(&mut app, KeyCode::Enter);
        assert!(app.state.notice.is_some());
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.state.current_tab, Tab::Collection);
        Ok(())
    }
}
