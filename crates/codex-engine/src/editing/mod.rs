/*!
 * # Editing Commands
 *
 * Everything the user can do to a document is a **command**. A command reads
 * an [`EditorState`](crate::state::EditorState) and either declines (the
 * command does not apply here) or produces a single
 * [`Transaction`](crate::state::Transaction). Nothing is mutated in place:
 * applying the transaction yields the next state.
 *
 * ## Layers
 *
 * - **Command functions** (`marks`, `blocks`, `lists`, `tables`, `code`,
 *   `insert`, `text`): `fn(&EditorState, ...) -> Option<Transaction>`.
 *   `None` means "not applicable"; an empty transaction means the input was
 *   consumed without changing anything (Tab at the last table cell).
 * - **`Cmd`**: a serialisable enum naming every command, compiled to a
 *   transaction by `compile_command`. `Cmd::run` dispatches, `Cmd::can_apply`
 *   only asks.
 * - **Keymap and menu**: map key presses and toolbar items onto `Cmd`s, and
 *   derive enabled/active flags from the current state.
 * - **`Editor`**: owns the state of an open page and applies commands,
 *   returning a `Patch` describing what changed.
 *
 * ## Usage Pattern
 *
 * ```rust
 * use codex_engine::editing::{Cmd, Editor, Key};
 * use codex_engine::model::Node;
 *
 * let mut editor = Editor::new(Node::empty_doc());
 * editor.run(&Cmd::InsertText { text: "Hello".to_string() });
 * editor.handle_key(&Key::parse("Mod-b").unwrap());
 * assert_eq!(editor.text(), "Hello");
 * ```
 */

pub mod blocks;
pub mod code;
pub mod commands;
pub mod editor;
pub mod insert;
pub mod keymap;
pub mod lists;
pub mod marks;
pub mod menu;
pub mod patch;
pub mod query;
pub mod tables;
pub mod text;

pub use blocks::{BlockKind, ListKind};
pub use commands::Cmd;
pub use editor::{DEFAULT_TAB_SIZE, Editor};
pub use keymap::{Key, KeyCode, command_for_key};
pub use menu::{ItemState, LANGUAGES, MenuAction, MenuElement, MenuGroup, MenuItem, Prompt, build_menu};
pub use patch::Patch;
