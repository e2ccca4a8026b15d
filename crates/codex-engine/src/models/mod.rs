pub mod notebook;

pub use notebook::{LibraryError, Notebook, Page, PageRef, SaveData};
