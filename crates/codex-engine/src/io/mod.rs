use crate::model::{Node, SchemaError};
use crate::models::{Page, SaveData, notebook::NOTES_DIR};
use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

/// Library index file, relative to the data directory.
pub const SAVE_FILE: &str = "save.json";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid document in {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
}

/// A loaded value. When loading failed `value` holds a usable default and
/// `error` says why.
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub error: Option<IoError>,
}

impl<T> Loaded<T> {
    fn ok(value: T) -> Self {
        Self { value, error: None }
    }

    fn fallback(value: T, error: IoError) -> Self {
        log::warn!("falling back to default: {error}");
        Self {
            value,
            error: Some(error),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

/// Read a file relative to `root` and return its content
pub fn read_file(relative_path: &RelativePath, root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write a file relative to `root`, creating parent directories
pub fn write_file(relative_path: &RelativePath, root: &Path, content: &str) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

/// The on-disk layout of a data directory: `save.json` plus one
/// `notes/<fileName>` per page.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the data and notes directories if missing.
    pub fn ensure_dirs(&self) -> Result<(), IoError> {
        fs::create_dir_all(RelativePath::new(NOTES_DIR).to_path(&self.root))?;
        Ok(())
    }

    /// Load `save.json`. A missing file is a fresh library, not an error.
    pub fn load_library(&self) -> Loaded<SaveData> {
        let relative = RelativePath::new(SAVE_FILE);
        let content = match read_file(relative, &self.root) {
            Ok(content) => content,
            Err(IoError::NotFound(_)) => {
                log::info!("no {SAVE_FILE} in {}, starting empty", self.root.display());
                return Loaded::ok(SaveData::default());
            }
            Err(e) => return Loaded::fallback(SaveData::default(), e),
        };
        match serde_json::from_str(&content) {
            Ok(data) => {
                log::info!("loaded library from {}", self.root.display());
                Loaded::ok(data)
            }
            Err(source) => Loaded::fallback(
                SaveData::default(),
                IoError::Json {
                    path: relative.to_path(&self.root),
                    source,
                },
            ),
        }
    }

    pub fn save_library(&self, data: &SaveData) -> Result<(), IoError> {
        let relative = RelativePath::new(SAVE_FILE);
        let content = serde_json::to_string(data).map_err(|source| IoError::Json {
            path: relative.to_path(&self.root),
            source,
        })?;
        write_file(relative, &self.root, &content)?;
        log::info!("saved library ({} pages)", data.page_count());
        Ok(())
    }

    /// Load a page document, falling back to an empty document.
    pub fn load_page(&self, page: &Page) -> Loaded<Node> {
        let relative = page.content_path();
        let path = relative.to_path(&self.root);
        let content = match read_file(&relative, &self.root) {
            Ok(content) => content,
            Err(e) => return Loaded::fallback(Node::empty_doc(), e),
        };
        let value: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(source) => return Loaded::fallback(Node::empty_doc(), IoError::Json { path, source }),
        };
        match Node::from_json(&value) {
            Ok(doc) => {
                log::info!("loaded page {relative}");
                Loaded::ok(doc)
            }
            Err(source) => Loaded::fallback(Node::empty_doc(), IoError::Schema { path, source }),
        }
    }

    pub fn save_page(&self, page: &Page, doc: &Node) -> Result<(), IoError> {
        let relative = page.content_path();
        write_file(&relative, &self.root, &doc.to_json().to_string())?;
        log::info!("saved page {relative}");
        Ok(())
    }

    /// Write the empty document for a newly created page.
    pub fn create_page_file(&self, page: &Page) -> Result<(), IoError> {
        self.save_page(page, &Node::empty_doc())
    }

    /// Delete a page file. A file that is already gone is fine.
    pub fn delete_page(&self, page: &Page) -> Result<(), IoError> {
        let path = page.content_path().to_path(&self.root);
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IoError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Notebook;
    use crate::tests::*;
    use pretty_assertions::assert_eq;

    const EMPTY_PAGE: &str = r#"{"type":"doc","content":[{"type":"paragraph"}]}"#;

    fn page(file_name: &str) -> Page {
        Page {
            title: "Test".to_string(),
            file_name: file_name.into(),
            favorite: false,
        }
    }

    #[test]
    fn test_missing_library_is_fresh() {
        let data_dir = create_test_data_dir();
        let loaded = DataStore::new(data_dir.path()).load_library();
        assert!(!loaded.is_fallback());
        assert_eq!(loaded.value, SaveData::default());
    }

    #[test]
    fn test_library_round_trip() {
        let data_dir = create_test_data_dir();
        let store = DataStore::new(data_dir.path());
        let mut data = SaveData::default();
        let nb = data.add_notebook(Notebook::new("Work", "#123456", "book"));
        data.add_page(nb, "Plans").unwrap();

        store.save_library(&data).unwrap();
        let loaded = store.load_library();
        assert!(loaded.error.is_none());
        assert_eq!(loaded.value, data);
    }

    #[test]
    fn test_corrupt_library_falls_back() {
        let data_dir = create_test_data_dir();
        create_test_file(&data_dir, SAVE_FILE, "{ not json");
        let loaded = DataStore::new(data_dir.path()).load_library();
        assert_eq!(loaded.value, SaveData::default());
        assert!(matches!(loaded.error, Some(IoError::Json { .. })));
    }

    #[test]
    fn test_read_legacy_save_file() {
        let data_dir = create_test_data_dir();
        create_test_file(
            &data_dir,
            SAVE_FILE,
            r##"{"nextPageIndex":2,"notebooks":[{"name":"A","color":"#fff","icon":"book","pages":[{"title":"One","fileName":"1.json","favorite":true}]}]}"##,
        );
        let loaded = DataStore::new(data_dir.path()).load_library();
        assert!(loaded.error.is_none());
        assert_eq!(loaded.value.next_page_index, 2);
        assert_eq!(loaded.value.favorites().len(), 1);
    }

    #[test]
    fn test_new_page_file_is_empty_doc() {
        let data_dir = create_test_data_dir();
        let store = DataStore::new(data_dir.path());
        store.create_page_file(&page("0.json")).unwrap();
        let written = read_file(RelativePath::new("notes/0.json"), data_dir.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        let expected: serde_json::Value = serde_json::from_str(EMPTY_PAGE).unwrap();
        assert_eq!(Node::from_json(&value).unwrap(), Node::from_json(&expected).unwrap());
    }

    #[test]
    fn test_page_round_trip() {
        let data_dir = create_test_data_dir();
        let store = DataStore::new(data_dir.path());
        let d = doc(vec![h(2, vec![t("Title")]), p(vec![t("plain "), strong("bold")]), code("rust", "fn main() {}")]);
        store.save_page(&page("4.json"), &d).unwrap();
        let loaded = store.load_page(&page("4.json"));
        assert!(loaded.error.is_none());
        assert_eq!(loaded.value, d);
    }

    #[test]
    fn test_minimal_page_gets_defaults() {
        let data_dir = create_test_data_dir();
        create_test_file(&data_dir, "notes/1.json", EMPTY_PAGE);
        let loaded = DataStore::new(data_dir.path()).load_page(&page("1.json"));
        assert!(loaded.error.is_none());
        assert_eq!(loaded.value, Node::empty_doc());
    }

    #[test]
    fn test_missing_page_falls_back() {
        let data_dir = create_test_data_dir();
        let loaded = DataStore::new(data_dir.path()).load_page(&page("9.json"));
        assert_eq!(loaded.value, Node::empty_doc());
        assert!(matches!(loaded.error, Some(IoError::NotFound(_))));
    }

    #[test]
    fn test_invalid_page_falls_back() {
        let data_dir = create_test_data_dir();
        create_test_file(&data_dir, "notes/2.json", r#"{"type":"doc","content":[{"type":"mystery"}]}"#);
        let loaded = DataStore::new(data_dir.path()).load_page(&page("2.json"));
        assert_eq!(loaded.value, Node::empty_doc());
        assert!(matches!(loaded.error, Some(IoError::Schema { .. })));
    }

    #[test]
    fn test_delete_page() {
        let data_dir = create_test_data_dir();
        let store = DataStore::new(data_dir.path());
        let file = create_test_file(&data_dir, "notes/3.json", EMPTY_PAGE);
        store.delete_page(&page("3.json")).unwrap();
        assert!(!file.exists());
        store.delete_page(&page("3.json")).unwrap();
    }

    #[test]
    fn test_write_file_creates_parent_directories() {
        let data_dir = create_test_data_dir();
        let relative_path = RelativePath::new("folder/subfolder/new_file.json");
        write_file(relative_path, data_dir.path(), "{}").unwrap();
        assert_eq!(read_file(relative_path, data_dir.path()).unwrap(), "{}");
        assert!(data_dir.path().join("folder").join("subfolder").is_dir());
    }
}
