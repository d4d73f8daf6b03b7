use std::time::Duration;

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState, Tabs}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};

use todo_server::{application::{dto::TodoDto, todo_service::{TodoService, TodoServiceImpl}}, config::{self, Config}, domain::{repository::TodoRepository, todo::TodoId}, infrastructure::sqlite_repo::SqliteTodoRepository};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    config::prepare_sqlite_file(&config.database_url)?;
    let repo = SqliteTodoRepository::connect(&config.database_url).await?;
    repo.init().await?;
    let service = TodoServiceImpl::new(repo);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, App::new(service, config.database_url)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create, Import }

#[derive(Clone, Copy, PartialEq, Eq)]
enum View { All, Open, Done }

impl View {
    fn index(self) -> usize { match self { View::All => 0, View::Open => 1, View::Done => 2 } }
    fn next(self) -> Self { match self { View::All => View::Open, View::Open => View::Done, View::Done => View::All } }
}

struct App<S: TodoService> {
    service: S,
    database_url: String,
    items: Vec<TodoDto>,
    list_state: ListState,
    view: View,
    mode: Mode,
    draft: String,
    status: String,
}

impl<S: TodoService> App<S> {
    fn new(service: S, database_url: String) -> Self {
        Self { service, database_url, items: Vec::new(), list_state: ListState::default(), view: View::All, mode: Mode::View, draft: String::new(), status: String::new() }
    }

    async fn load(&mut self) -> Result<()> {
        self.items = match self.view {
            View::All => self.service.find_all_todos().await?,
            View::Open => self.service.find_incomplete_todos().await?,
            View::Done => self.service.find_complete_todos().await?,
        };
        let len = self.items.len();
        let selected = match self.list_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.list_state.select(selected);
        Ok(())
    }

    fn selected(&self) -> Option<&TodoDto> { self.list_state.selected().and_then(|i| self.items.get(i)) }

    fn move_selection(&mut self, up: bool) {
        let Some(i) = self.list_state.selected() else { return };
        let next = if up { i.saturating_sub(1) } else { (i + 1).min(self.items.len().saturating_sub(1)) };
        self.list_state.select(Some(next));
    }

    /// Completes an open todo or reopens a completed one.
    async fn toggle_selected(&mut self) -> Result<()> {
        let Some(todo) = self.selected().cloned() else { return Ok(()) };
        let Some(id) = todo.id else { return Ok(()) };
        let done = todo.completed == Some(true);
        self.service.update_todo(TodoId(id), TodoDto { completed: Some(!done), ..todo }).await?;
        self.status = if done { format!("reopened #{}", id) } else { format!("completed #{}", id) };
        Ok(())
    }

    async fn delete_selected(&mut self) -> Result<()> {
        let Some(id) = self.selected().and_then(|t| t.id) else { return Ok(()) };
        self.service.delete_by_id(TodoId(id)).await?;
        self.status = format!("deleted #{}", id);
        Ok(())
    }

    async fn submit_draft(&mut self) -> Result<()> {
        let draft = self.draft.trim();
        let input = match self.mode {
            Mode::Create if !draft.is_empty() => Some(TodoDto { title: draft.to_string(), completed: Some(false), ..TodoDto::default() }),
            Mode::Import => match TodoDto::from_json(draft) {
                Ok(dto) => Some(dto),
                Err(e) => { self.status = format!("{:#}", e); None }
            },
            _ => None,
        };
        if let Some(input) = input {
            let created = self.service.create_new_todo(input).await?;
            self.status = format!("created #{}", created.id.unwrap_or_default());
        }
        self.mode = Mode::View;
        self.draft.clear();
        Ok(())
    }
}

fn mark(todo: &TodoDto) -> &'static str {
    match todo.completed { Some(true) => "[x]", Some(false) => "[ ]", None => "[?]" }
}

async fn run_app<S: TodoService>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, mut app: App<S>) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    app.load().await?;

    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                ])
                .split(f.size());

            let tabs = Tabs::new(vec!["All", "Open", "Done"])
                .select(app.view.index())
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .block(Block::default().borders(Borders::ALL).title("todos (Enter: complete/reopen, n: new, i: import json, d: delete, v: view, q: quit)"));
            f.render_widget(tabs, chunks[0]);

            let list_items: Vec<ListItem> = app.items.iter().map(|t| {
                let done_on = t.completed_at.map(|at| format!("  (done {})", at.format("%Y-%m-%d %H:%M"))).unwrap_or_default();
                ListItem::new(format!("{} #{} {}{}", mark(t), t.id.unwrap_or_default(), t.title, done_on))
            }).collect();
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(format!("items [{}]", app.items.len())))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, chunks[1], &mut app.list_state);

            let footer_text = match app.mode {
                Mode::View => format!("DATABASE_URL={}  |  {}", app.database_url, app.status),
                Mode::Create => format!("Title: {}_  |  (Enter to save, Esc to cancel)", app.draft),
                Mode::Import => format!("JSON: {}_  |  (Enter to import, Esc to cancel)", app.draft),
            };
            let footer = Paragraph::new(footer_text)
                .block(Block::default().borders(Borders::ALL).title(match app.mode { Mode::View => "info", Mode::Create => "create", Mode::Import => "import" }));
            f.render_widget(footer, chunks[2]);
        })?;

        if !event::poll(tick_rate)? { continue; }
        let Event::Key(key) = event::read()? else { continue };
        // repeats and releases would duplicate input
        if key.kind != KeyEventKind::Press { continue; }
        match app.mode {
            Mode::View => match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Up => app.move_selection(true),
                KeyCode::Down => app.move_selection(false),
                KeyCode::Enter => { app.toggle_selected().await?; app.load().await?; }
                KeyCode::Char('d') => { app.delete_selected().await?; app.load().await?; }
                KeyCode::Char('n') => { app.mode = Mode::Create; app.draft.clear(); }
                KeyCode::Char('i') => { app.mode = Mode::Import; app.draft.clear(); }
                KeyCode::Char('v') => { app.view = app.view.next(); app.list_state.select(None); app.load().await?; }
                _ => {}
            },
            Mode::Create | Mode::Import => match key.code {
                KeyCode::Esc => { app.mode = Mode::View; app.draft.clear(); }
                KeyCode::Enter => { app.submit_draft().await?; app.load().await?; }
                KeyCode::Backspace => { app.draft.pop(); }
                KeyCode::Char(c) => app.draft.push(c),
                _ => {}
            },
        }
    }
    Ok(())
}
