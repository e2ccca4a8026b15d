//! UI state of a running app: the library, the open page and its editor, an
//! in-progress drag, and notices waiting to be shown.
//!
//! Every handler updates memory first and then persists. Persistence errors
//! are queued as [`Notice`]s and never undo the in-memory change.

use relative_path::RelativePathBuf;

use crate::editing::{Cmd, DEFAULT_TAB_SIZE, Editor, Key, Patch};
use crate::io::{DataStore, IoError, Loaded};
use crate::models::{LibraryError, Notebook, PageRef, SaveData};

/// A message for the user, typically a failed save or load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&IoError> for Notice {
    fn from(error: &IoError) -> Self {
        Notice::new(error.to_string())
    }
}

impl From<LibraryError> for Notice {
    fn from(error: LibraryError) -> Self {
        Notice::new(error.to_string())
    }
}

/// What is being dragged in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragItem {
    Notebook(usize),
    Page(PageRef),
}

/// Where a drag was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Onto a notebook header: notebooks take its slot, pages go to its end.
    Notebook(usize),
    /// Onto a page row: pages take its slot.
    Page(PageRef),
}

#[derive(Debug)]
pub struct Session {
    store: DataStore,
    library: SaveData,
    /// The open page, tracked by file name so moves don't lose it.
    selected: Option<RelativePathBuf>,
    editor: Option<Editor>,
    saved_version: u64,
    drag: Option<DragItem>,
    notices: Vec<Notice>,
    tab_size: usize,
}

impl Session {
    /// Load the library from `store`. A load failure leaves an empty library
    /// and a notice.
    pub fn load(store: DataStore) -> Self {
        let mut session = Self {
            store,
            library: SaveData::default(),
            selected: None,
            editor: None,
            saved_version: 0,
            drag: None,
            notices: Vec::new(),
            tab_size: DEFAULT_TAB_SIZE,
        };
        if let Err(e) = session.store.ensure_dirs() {
            session.report(&e);
        }
        let Loaded { value, error } = session.store.load_library();
        session.library = value;
        if let Some(e) = error {
            session.report(&e);
        }
        session
    }

    pub fn library(&self) -> &SaveData {
        &self.library
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn selected(&self) -> Option<PageRef> {
        self.library.find_page(self.selected.as_deref()?)
    }

    pub fn editor(&self) -> Option<&Editor> {
        self.editor.as_ref()
    }

    pub fn drag(&self) -> Option<DragItem> {
        self.drag
    }

    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    pub fn set_tab_size(&mut self, tab_size: usize) {
        self.tab_size = tab_size;
        if let Some(editor) = &mut self.editor {
            editor.set_tab_size(tab_size);
        }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn report(&mut self, notice: impl Into<Notice>) {
        let notice = notice.into();
        log::warn!("{}", notice.message);
        self.notices.push(notice);
    }

    fn persist_library(&mut self) {
        if let Err(e) = self.store.save_library(&self.library) {
            self.report(&e);
        }
    }

    /// Run a command against the open page.
    pub fn run(&mut self, cmd: &Cmd) -> Option<Patch> {
        self.editor.as_mut()?.run(cmd)
    }

    pub fn handle_key(&mut self, key: &Key) -> Option<Patch> {
        self.editor.as_mut()?.handle_key(key)
    }

    /// Write the open page if it changed since it was loaded or last saved.
    /// Returns `false` when the write failed and the edits exist only in
    /// memory.
    pub fn save_current_page(&mut self) -> bool {
        let Some(editor) = &self.editor else {
            return true;
        };
        if editor.version() == self.saved_version {
            return true;
        }
        let Some(page) = self.selected().and_then(|at| self.library.page(at)) else {
            return true;
        };
        match self.store.save_page(page, editor.doc()) {
            Ok(()) => {
                self.saved_version = editor.version();
                true
            }
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// Save the open page and the library.
    pub fn save(&mut self) {
        self.save_current_page();
        self.persist_library();
    }

    /// Open a page, saving the current one first. The current page stays
    /// open when it cannot be saved.
    pub fn open_page(&mut self, at: PageRef) -> bool {
        let Some(page) = self.library.page(at).cloned() else {
            self.report(LibraryError::PageOutOfRange(at));
            return false;
        };
        if !self.save_current_page() {
            log::warn!("not leaving unsaved page for {at:?}");
            return false;
        }
        let Loaded { value, error } = self.store.load_page(&page);
        if let Some(e) = error {
            self.report(&e);
        }
        self.editor = Some(Editor::new(value).with_tab_size(self.tab_size));
        self.saved_version = 0;
        self.selected = Some(page.file_name);
        log::debug!("opened page {at:?}");
        true
    }

    fn close_page(&mut self) {
        self.editor = None;
        self.selected = None;
        self.saved_version = 0;
    }

    pub fn create_notebook(&mut self, notebook: Notebook) -> usize {
        let index = self.library.add_notebook(notebook);
        self.persist_library();
        index
    }

    /// Delete a notebook and its page files. The open page is closed without
    /// saving if it lived there.
    pub fn delete_notebook(&mut self, index: usize) {
        let notebook = match self.library.remove_notebook(index) {
            Ok(notebook) => notebook,
            Err(e) => return self.report(e),
        };
        if self.selected.is_some() && self.selected().is_none() {
            self.close_page();
        }
        for page in &notebook.pages {
            if let Err(e) = self.store.delete_page(page) {
                self.report(&e);
            }
        }
        self.persist_library();
    }

    pub fn rename_notebook(&mut self, index: usize, name: &str) {
        match self.library.rename_notebook(index, name) {
            Ok(()) => self.persist_library(),
            Err(e) => self.report(e),
        }
    }

    /// Create a page with an empty document and open it.
    pub fn create_page(&mut self, notebook: usize, title: &str) -> Option<PageRef> {
        let at = match self.library.add_page(notebook, title) {
            Ok(at) => at,
            Err(e) => {
                self.report(e);
                return None;
            }
        };
        if let Some(page) = self.library.page(at)
            && let Err(e) = self.store.create_page_file(page)
        {
            self.report(&e);
        }
        self.persist_library();
        self.open_page(at);
        Some(at)
    }

    /// Delete a page and its file, closing it without saving if open.
    pub fn delete_page(&mut self, at: PageRef) {
        let page = match self.library.remove_page(at) {
            Ok(page) => page,
            Err(e) => return self.report(e),
        };
        if self.selected.as_ref() == Some(&page.file_name) {
            self.close_page();
        }
        if let Err(e) = self.store.delete_page(&page) {
            self.report(&e);
        }
        self.persist_library();
    }

    pub fn rename_page(&mut self, at: PageRef, title: &str) {
        match self.library.rename_page(at, title) {
            Ok(()) => self.persist_library(),
            Err(e) => self.report(e),
        }
    }

    pub fn toggle_favorite(&mut self, at: PageRef) -> Option<bool> {
        match self.library.toggle_favorite(at) {
            Ok(favorite) => {
                self.persist_library();
                Some(favorite)
            }
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    pub fn begin_drag(&mut self, item: DragItem) {
        self.drag = Some(item);
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    /// Finish a drag. Returns whether anything moved; a notebook dropped on
    /// a page, or a drop with no drag in progress, does nothing.
    pub fn drop_on(&mut self, target: DropTarget) -> bool {
        let Some(item) = self.drag.take() else {
            return false;
        };
        let moved = match (item, target) {
            (DragItem::Notebook(from), DropTarget::Notebook(to)) => {
                self.library.move_notebook(from, to).map(|_| ())
            }
            (DragItem::Page(from), DropTarget::Page(to)) => self.library.move_page(from, to).map(|_| ()),
            (DragItem::Page(from), DropTarget::Notebook(to)) => {
                let end = self.library.notebook(to).map_or(0, |n| n.pages.len());
                self.library.move_page(from, PageRef::new(to, end)).map(|_| ())
            }
            (DragItem::Notebook(_), DropTarget::Page(_)) => return false,
        };
        match moved {
            Ok(()) => {
                log::debug!("dropped {item:?} on {target:?}");
                self.persist_library();
                true
            }
            Err(e) => {
                self.report(e);
                false
            }
        }
    }
}
