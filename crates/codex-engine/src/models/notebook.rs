use relative_path::{RelativePath, RelativePathBuf};
use serde::{Deserialize, Serialize};

/// Directory, relative to the data directory, holding one JSON file per page.
pub const NOTES_DIR: &str = "notes";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LibraryError {
    #[error("No notebook at index {0}")]
    NotebookOutOfRange(usize),
    #[error("No page at {0:?}")]
    PageOutOfRange(PageRef),
}

/// Address of a page: notebook index and page index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRef {
    pub notebook: usize,
    pub page: usize,
}

impl PageRef {
    pub fn new(notebook: usize, page: usize) -> Self {
        Self { notebook, page }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub title: String,
    pub file_name: RelativePathBuf,
    #[serde(default)]
    pub favorite: bool,
}

impl Page {
    /// Location of the page content relative to the data directory.
    pub fn content_path(&self) -> RelativePathBuf {
        RelativePath::new(NOTES_DIR).join(&self.file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Notebook {
    pub fn new(name: impl Into<String>, color: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
            pages: Vec::new(),
        }
    }
}

/// The notebook index persisted as `save.json`.
///
/// Page file names come from `next_page_index`, which only ever grows, so a
/// file name is never handed out twice even after its page is deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    #[serde(default)]
    pub next_page_index: u64,
    #[serde(default)]
    pub notebooks: Vec<Notebook>,
}

impl SaveData {
    pub fn notebook(&self, index: usize) -> Option<&Notebook> {
        self.notebooks.get(index)
    }

    pub fn page(&self, at: PageRef) -> Option<&Page> {
        self.notebooks.get(at.notebook)?.pages.get(at.page)
    }

    fn notebook_mut(&mut self, index: usize) -> Result<&mut Notebook, LibraryError> {
        self.notebooks
            .get_mut(index)
            .ok_or(LibraryError::NotebookOutOfRange(index))
    }

    fn page_mut(&mut self, at: PageRef) -> Result<&mut Page, LibraryError> {
        self.notebooks
            .get_mut(at.notebook)
            .and_then(|n| n.pages.get_mut(at.page))
            .ok_or(LibraryError::PageOutOfRange(at))
    }

    /// Append a notebook and return its index.
    pub fn add_notebook(&mut self, notebook: Notebook) -> usize {
        self.notebooks.push(notebook);
        self.notebooks.len() - 1
    }

    /// Remove a notebook. Its page files are left for the caller to delete.
    pub fn remove_notebook(&mut self, index: usize) -> Result<Notebook, LibraryError> {
        if index >= self.notebooks.len() {
            return Err(LibraryError::NotebookOutOfRange(index));
        }
        Ok(self.notebooks.remove(index))
    }

    pub fn rename_notebook(&mut self, index: usize, name: impl Into<String>) -> Result<(), LibraryError> {
        self.notebook_mut(index)?.name = name.into();
        Ok(())
    }

    pub fn restyle_notebook(
        &mut self,
        index: usize,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Result<(), LibraryError> {
        let notebook = self.notebook_mut(index)?;
        notebook.color = color.into();
        notebook.icon = icon.into();
        Ok(())
    }

    /// Append a new page to a notebook, assigning it the next file name.
    pub fn add_page(&mut self, notebook: usize, title: impl Into<String>) -> Result<PageRef, LibraryError> {
        let file_name = RelativePathBuf::from(format!("{}.json", self.next_page_index));
        let pages = &mut self.notebook_mut(notebook)?.pages;
        pages.push(Page {
            title: title.into(),
            file_name,
            favorite: false,
        });
        let at = PageRef::new(notebook, pages.len() - 1);
        self.next_page_index += 1;
        log::debug!("added page {at:?}, next page index {}", self.next_page_index);
        Ok(at)
    }

    pub fn remove_page(&mut self, at: PageRef) -> Result<Page, LibraryError> {
        let pages = &mut self.notebook_mut(at.notebook)?.pages;
        if at.page >= pages.len() {
            return Err(LibraryError::PageOutOfRange(at));
        }
        Ok(pages.remove(at.page))
    }

    pub fn rename_page(&mut self, at: PageRef, title: impl Into<String>) -> Result<(), LibraryError> {
        self.page_mut(at)?.title = title.into();
        Ok(())
    }

    /// Flip the favourite flag, returning the new value.
    pub fn toggle_favorite(&mut self, at: PageRef) -> Result<bool, LibraryError> {
        let page = self.page_mut(at)?;
        page.favorite = !page.favorite;
        Ok(page.favorite)
    }

    /// Favourite pages in sidebar order.
    pub fn favorites(&self) -> Vec<(PageRef, &Page)> {
        self.notebooks
            .iter()
            .enumerate()
            .flat_map(|(n, notebook)| {
                notebook
                    .pages
                    .iter()
                    .enumerate()
                    .filter(|(_, page)| page.favorite)
                    .map(move |(p, page)| (PageRef::new(n, p), page))
            })
            .collect()
    }

    /// Locate a page by its file name, which stays fixed across moves.
    pub fn find_page(&self, file_name: &RelativePath) -> Option<PageRef> {
        self.notebooks.iter().enumerate().find_map(|(n, notebook)| {
            notebook
                .pages
                .iter()
                .position(|page| page.file_name.as_relative_path() == file_name)
                .map(|p| PageRef::new(n, p))
        })
    }

    pub fn page_count(&self) -> usize {
        self.notebooks.iter().map(|n| n.pages.len()).sum()
    }

    /// Move a notebook so it ends up at index `to` (clamped to the end).
    pub fn move_notebook(&mut self, from: usize, to: usize) -> Result<(), LibraryError> {
        let notebook = self.remove_notebook(from)?;
        let to = to.min(self.notebooks.len());
        self.notebooks.insert(to, notebook);
        Ok(())
    }

    /// Move a page so it ends up at `to`, possibly in another notebook. The
    /// page index is clamped to the end of the target notebook.
    ///
    /// The target notebook is checked before anything is removed, so a failed
    /// move leaves the library untouched.
    pub fn move_page(&mut self, from: PageRef, to: PageRef) -> Result<PageRef, LibraryError> {
        if to.notebook >= self.notebooks.len() {
            return Err(LibraryError::NotebookOutOfRange(to.notebook));
        }
        let page = self.remove_page(from)?;
        let pages = &mut self.notebooks[to.notebook].pages;
        let index = to.page.min(pages.len());
        pages.insert(index, page);
        Ok(PageRef::new(to.notebook, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn library() -> SaveData {
        let mut data = SaveData::default();
        let work = data.add_notebook(Notebook::new("Work", "#ff0000", "briefcase"));
        let home = data.add_notebook(Notebook::new("Home", "#00ff00", "home"));
        data.add_page(work, "Plans").unwrap();
        data.add_page(work, "Meetings").unwrap();
        data.add_page(home, "Recipes").unwrap();
        data
    }

    fn titles(data: &SaveData, notebook: usize) -> Vec<&str> {
        data.notebooks[notebook]
            .pages
            .iter()
            .map(|p| p.title.as_str())
            .collect()
    }

    #[test]
    fn test_page_file_names_never_reused() {
        let mut data = library();
        assert_eq!(data.next_page_index, 3);
        let removed = data.remove_page(PageRef::new(0, 1)).unwrap();
        assert_eq!(removed.file_name, "1.json");
        let at = data.add_page(0, "New").unwrap();
        assert_eq!(data.page(at).unwrap().file_name, "3.json");
        assert_eq!(data.page(at).unwrap().content_path(), "notes/3.json");
    }

    #[rstest]
    #[case(PageRef::new(0, 0), PageRef::new(1, 0), vec!["Meetings"], vec!["Plans", "Recipes"])]
    #[case(PageRef::new(0, 0), PageRef::new(0, 1), vec!["Meetings", "Plans"], vec!["Recipes"])]
    #[case(PageRef::new(1, 0), PageRef::new(0, 9), vec!["Plans", "Meetings", "Recipes"], vec![])]
    fn test_move_page(
        #[case] from: PageRef,
        #[case] to: PageRef,
        #[case] work: Vec<&str>,
        #[case] home: Vec<&str>,
    ) {
        let mut data = library();
        let files_before: Vec<_> = data.notebooks.iter().flat_map(|n| n.pages.iter()).map(|p| p.file_name.clone()).collect();
        data.move_page(from, to).unwrap();
        assert_eq!(titles(&data, 0), work);
        assert_eq!(titles(&data, 1), home);
        assert_eq!(data.page_count(), 3);
        let mut files_after: Vec<_> = data.notebooks.iter().flat_map(|n| n.pages.iter()).map(|p| p.file_name.clone()).collect();
        let mut files_before = files_before;
        files_before.sort();
        files_after.sort();
        assert_eq!(files_before, files_after);
    }

    #[test]
    fn test_failed_move_keeps_page() {
        let mut data = library();
        let err = data.move_page(PageRef::new(0, 0), PageRef::new(5, 0)).unwrap_err();
        assert_eq!(err, LibraryError::NotebookOutOfRange(5));
        assert_eq!(data.page_count(), 3);
    }

    #[test]
    fn test_move_notebook() {
        let mut data = library();
        data.move_notebook(0, 1).unwrap();
        let names: Vec<_> = data.notebooks.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Home", "Work"]);
        assert_eq!(data.page_count(), 3);
        assert!(data.move_notebook(7, 0).is_err());
    }

    #[test]
    fn test_find_page_after_move() {
        let mut data = library();
        data.move_page(PageRef::new(0, 0), PageRef::new(1, 1)).unwrap();
        assert_eq!(data.find_page(RelativePath::new("0.json")), Some(PageRef::new(1, 1)));
        assert_eq!(data.find_page(RelativePath::new("1.json")), Some(PageRef::new(0, 0)));
        assert_eq!(data.find_page(RelativePath::new("42.json")), None);
    }

    #[test]
    fn test_favorites() {
        let mut data = library();
        assert!(data.toggle_favorite(PageRef::new(1, 0)).unwrap());
        assert!(data.toggle_favorite(PageRef::new(0, 1)).unwrap());
        let favorites: Vec<_> = data.favorites().into_iter().map(|(at, p)| (at, p.title.clone())).collect();
        assert_eq!(
            favorites,
            vec![(PageRef::new(0, 1), "Meetings".to_string()), (PageRef::new(1, 0), "Recipes".to_string())]
        );
        assert!(!data.toggle_favorite(PageRef::new(1, 0)).unwrap());
    }

    #[test]
    fn test_rename_and_restyle() {
        let mut data = library();
        data.rename_notebook(1, "House").unwrap();
        data.restyle_notebook(1, "#0000ff", "star").unwrap();
        data.rename_page(PageRef::new(1, 0), "Cooking").unwrap();
        assert_eq!(data.notebooks[1].name, "House");
        assert_eq!(data.notebooks[1].icon, "star");
        assert_eq!(data.page(PageRef::new(1, 0)).unwrap().title, "Cooking");
        assert_eq!(
            data.rename_page(PageRef::new(1, 4), "x"),
            Err(LibraryError::PageOutOfRange(PageRef::new(1, 4)))
        );
    }

    #[test]
    fn test_save_json_shape() {
        let data = library();
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["nextPageIndex"], 3);
        assert_eq!(json["notebooks"][0]["pages"][1]["fileName"], "1.json");
        assert_eq!(json["notebooks"][0]["pages"][1]["favorite"], false);
        let back: SaveData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_missing_fields_default() {
        let data: SaveData = serde_json::from_str(r#"{"notebooks":[{"name":"A"}]}"#).unwrap();
        assert_eq!(data.next_page_index, 0);
        assert!(data.notebooks[0].pages.is_empty());
    }
}
