use super::commands::{Cmd, compile_command};
use super::keymap::{Key, command_for_key};
use super::menu::{MenuGroup, build_menu};
use super::patch::{Patch, changed_ranges};
use crate::export::{EscapeHighlighter, Highlighter, document_to_text, render_html};
use crate::model::Node;
use crate::state::{EditorState, Selection};

pub const DEFAULT_TAB_SIZE: usize = 4;

/// An open page: the editor state plus the settings commands run with.
pub struct Editor {
    state: EditorState,
    tab_size: usize,
    highlighter: Box<dyn Highlighter>,
    version: u64,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("state", &self.state)
            .field("tab_size", &self.tab_size)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl Editor {
    pub fn new(doc: Node) -> Self {
        Self {
            state: EditorState::with_selection(doc.clone(), Selection::at_start(&doc)),
            tab_size: DEFAULT_TAB_SIZE,
            highlighter: Box::new(EscapeHighlighter),
            version: 0,
        }
    }

    pub fn with_tab_size(mut self, tab_size: usize) -> Self {
        self.tab_size = tab_size;
        self
    }

    pub fn with_highlighter(mut self, highlighter: Box<dyn Highlighter>) -> Self {
        self.highlighter = highlighter;
        self
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn doc(&self) -> &Node {
        self.state.doc()
    }

    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    pub fn set_tab_size(&mut self, tab_size: usize) {
        self.tab_size = tab_size;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Move the selection without touching the document or the history.
    pub fn set_selection(&mut self, selection: Selection) {
        let mut tr = self.state.tr();
        tr.set_selection(selection).set_add_to_history(false);
        self.state = self.state.apply(tr);
    }

    /// Run `cmd`, returning what changed, or `None` when it did not apply.
    pub fn run(&mut self, cmd: &Cmd) -> Option<Patch> {
        let tr = compile_command(&self.state, cmd)?;
        let changed = changed_ranges(&tr);
        self.state = self.state.apply(tr);
        self.version += 1;
        log::debug!("ran {cmd:?}, version {}", self.version);
        Some(Patch {
            changed,
            new_selection: *self.state.selection(),
            version: self.version,
        })
    }

    /// Handle a key press. Returns `None` when no binding consumed the key.
    pub fn handle_key(&mut self, key: &Key) -> Option<Patch> {
        let cmd = command_for_key(key, self.tab_size)?;
        self.run(&cmd)
    }

    pub fn menu(&self) -> Vec<MenuGroup> {
        build_menu(self.tab_size)
    }

    /// Render the document, highlighting every code block afresh.
    pub fn render(&self) -> String {
        render_html(self.state.doc(), self.highlighter.as_ref())
    }

    pub fn text(&self) -> String {
        document_to_text(self.state.doc())
    }
}
