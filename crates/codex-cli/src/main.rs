use anyhow::Result;
use codex_config::{Config, Prefs};
use codex_engine::export::document_to_markdown;
use codex_engine::io::DataStore;
use codex_engine::models::{Notebook, PageRef};
use codex_engine::session::{DragItem, DropTarget, Session};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

const NEW_PAGE_TITLE: &str = "Untitled Page";
const NEW_NOTEBOOK_NAME: &str = "New Notebook";

/// One line of the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row {
    Notebook(usize),
    Page(PageRef),
}

struct App {
    session: Session,
    rows: Vec<Row>,
    list_state: ListState,
    status: String,
}

impl App {
    fn new(session: Session) -> Self {
        let mut app = Self {
            session,
            rows: Vec::new(),
            list_state: ListState::default(),
            status: String::new(),
        };
        app.refresh(None);
        app
    }

    fn selected_row(&self) -> Option<Row> {
        self.list_state.selected().and_then(|i| self.rows.get(i).copied())
    }

    /// Rebuild the sidebar, keeping `focus` selected when given.
    fn refresh(&mut self, focus: Option<Row>) {
        self.rows = self
            .session
            .library()
            .notebooks
            .iter()
            .enumerate()
            .flat_map(|(n, notebook)| {
                std::iter::once(Row::Notebook(n))
                    .chain((0..notebook.pages.len()).map(move |p| Row::Page(PageRef::new(n, p))))
            })
            .collect();
        let index = focus
            .and_then(|row| self.rows.iter().position(|r| *r == row))
            .or_else(|| self.list_state.selected().map(|i| i.min(self.rows.len().saturating_sub(1))));
        self.list_state
            .select(if self.rows.is_empty() { None } else { index.or(Some(0)) });
        let notices = self.session.take_notices();
        if !notices.is_empty() {
            self.status = notices
                .iter()
                .map(|notice| notice.message.as_str())
                .collect::<Vec<_>>()
                .join(" | ");
        }
    }

    fn next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = self.list_state.selected().map_or(0, |i| (i + 1) % self.rows.len());
        self.list_state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    /// Notebook the cursor is in, if any.
    fn current_notebook(&self) -> Option<usize> {
        match self.selected_row()? {
            Row::Notebook(n) => Some(n),
            Row::Page(at) => Some(at.notebook),
        }
    }

    fn open_selected(&mut self) {
        if let Some(Row::Page(at)) = self.selected_row() {
            self.session.open_page(at);
            self.refresh(Some(Row::Page(at)));
        }
    }

    fn create_page(&mut self) {
        let Some(notebook) = self.current_notebook() else {
            self.status = "Create a notebook first (N)".to_string();
            return;
        };
        let at = self.session.create_page(notebook, NEW_PAGE_TITLE);
        self.refresh(at.map(Row::Page));
    }

    fn create_notebook(&mut self) {
        let index = self
            .session
            .create_notebook(Notebook::new(NEW_NOTEBOOK_NAME, "#5c7cfa", "book"));
        self.refresh(Some(Row::Notebook(index)));
    }

    fn delete_selected(&mut self) {
        match self.selected_row() {
            Some(Row::Page(at)) => self.session.delete_page(at),
            Some(Row::Notebook(n)) => self.session.delete_notebook(n),
            None => return,
        }
        self.refresh(None);
    }

    fn toggle_favorite(&mut self) {
        if let Some(Row::Page(at)) = self.selected_row()
            && let Some(favorite) = self.session.toggle_favorite(at)
        {
            let message = if favorite {
                "Added to favourites"
            } else {
                "Removed from favourites"
            };
            self.status = message.to_string();
            self.refresh(Some(Row::Page(at)));
        }
    }

    /// Move the selected notebook or page one slot up (`-1`) or down (`1`),
    /// as a drag and drop would.
    fn move_selected(&mut self, delta: isize) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let library = self.session.library();
        let (item, target, focus) = match row {
            Row::Notebook(n) => {
                let Some(to) = n.checked_add_signed(delta).filter(|to| *to < library.notebooks.len()) else {
                    return;
                };
                (DragItem::Notebook(n), DropTarget::Notebook(to), Row::Notebook(to))
            }
            Row::Page(at) => {
                let len = library.notebooks[at.notebook].pages.len();
                let to = match at.page.checked_add_signed(delta) {
                    Some(p) if p < len => PageRef::new(at.notebook, p),
                    // Past the first page: end of the previous notebook
                    None if at.notebook > 0 => {
                        let prev = at.notebook - 1;
                        PageRef::new(prev, library.notebooks[prev].pages.len())
                    }
                    // Past the last page: start of the next notebook
                    Some(_) if at.notebook + 1 < library.notebooks.len() => PageRef::new(at.notebook + 1, 0),
                    _ => return,
                };
                (DragItem::Page(at), DropTarget::Page(to), Row::Page(to))
            }
        };
        self.session.begin_drag(item);
        if self.session.drop_on(target) {
            self.refresh(Some(focus));
        } else {
            self.refresh(None);
        }
    }

    fn preview(&self) -> Vec<String> {
        match self.session.editor() {
            Some(editor) => document_to_markdown(editor.doc()).lines().map(str::to_string).collect(),
            None => Vec::new(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let prefs = Prefs::load().unwrap_or_else(|e| {
        log::warn!("{e}, using default preferences");
        Prefs::default()
    });

    let data_path = match args.len() {
        2 => PathBuf::from(&args[1]),
        1 => match Config::load() {
            Ok(config) => config.unwrap_or_default().resolve_data_path(&prefs),
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} [data-folder-path]", args[0]);
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage: {} [data-folder-path]", args[0]);
            process::exit(1);
        }
    };

    let mut session = Session::load(DataStore::new(&data_path));
    session.set_tab_size(prefs.tab_size);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let res = run_app(&mut terminal, &mut app);
    app.session.save();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    for notice in app.session.take_notices() {
        eprintln!("{}", notice.message);
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char('J') => app.move_selected(1),
                KeyCode::Char('K') => app.move_selected(-1),
                KeyCode::Enter | KeyCode::Char(' ') => app.open_selected(),
                KeyCode::Char('n') => app.create_page(),
                KeyCode::Char('N') => app.create_notebook(),
                KeyCode::Char('f') => app.toggle_favorite(),
                KeyCode::Char('d') => app.delete_selected(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(rows[0]);

    let library = app.session.library();
    let open = app.session.selected();
    let sidebar_items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| {
            let text = match *row {
                Row::Notebook(n) => format!("📓 {}", library.notebooks[n].name),
                Row::Page(at) => {
                    let page = &library.notebooks[at.notebook].pages[at.page];
                    let star = if page.favorite { "★ " } else { "" };
                    let marker = if open == Some(at) { "▸ " } else { "  " };
                    format!("{marker}{star}{}", page.title)
                }
            };
            ListItem::new(vec![Line::from(vec![Span::raw(text)])])
        })
        .collect();

    let sidebar = List::new(sidebar_items)
        .block(Block::default().borders(Borders::ALL).title("Notebooks"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(sidebar, chunks[0], &mut app.list_state);

    let preview = app.preview();
    let content_text = if preview.is_empty() {
        vec![Line::from("Open a page to preview it")]
    } else {
        preview.into_iter().map(Line::from).collect()
    };
    let title = open
        .and_then(|at| library.page(at))
        .map_or_else(|| "Preview".to_string(), |page| page.title.clone());

    let content = Paragraph::new(content_text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(content, chunks[1]);

    let help_text = Line::from(vec![
        Span::raw("q: Quit | ↑↓/jk: Navigate | J/K: Move | Enter: Open | "),
        Span::raw("n: New page | N: New notebook | f: Favourite | d: Delete"),
    ]);
    let status = Line::from(Span::styled(app.status.clone(), Style::default().fg(Color::Red)));

    f.render_widget(Paragraph::new(vec![help_text, status]), rows[1]);
}
