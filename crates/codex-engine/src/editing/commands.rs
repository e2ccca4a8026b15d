use serde::{Deserialize, Serialize};

use super::blocks::{
    BlockKind, ListKind, align_selection, make_code_block, select_parent_node, set_block_type,
    toggle_code_collapse, wrap_in_blockquote, wrap_in_list,
};
use super::code::{indent_code_lines, outdent_code_lines};
use super::insert::{insert_horizontal_rule, insert_image, insert_math, insert_table};
use super::lists::{lift_list_item, sink_list_item};
use super::marks::{mark_active, toggle_mark};
use super::query::{enclosing_code_block, is_in_table};
use super::tables::go_to_next_cell;
use super::text::{backspace, insert_text, split_block};
use crate::model::{Align, Mark, NodeKind};
use crate::state::{EditorState, Transaction};

/// Commands that can be run against an editor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Cmd {
    ToggleMark {
        mark: Mark,
    },
    WrapInList {
        list: ListKind,
    },
    WrapInBlockquote,
    SetBlockType {
        kind: BlockKind,
    },
    MakeCodeBlock {
        language: String,
    },
    InsertImage {
        src: String,
        alt: Option<String>,
        title: Option<String>,
    },
    InsertTable {
        rows: usize,
        cols: usize,
    },
    InsertHorizontalRule,
    InsertMath {
        display: bool,
    },
    Tab {
        tab_size: usize,
    },
    ShiftTab {
        tab_size: usize,
    },
    ToggleCodeCollapse {
        pos: usize,
    },
    Align {
        align: Align,
    },
    SelectParentNode,
    InsertText {
        text: String,
    },
    SplitBlock,
    Backspace,
    Undo,
    Redo,
}

impl Cmd {
    /// Run the command. Returns whether it applied; when it did and `dispatch`
    /// is given, the resulting transaction is handed to it.
    pub fn run(&self, state: &EditorState, dispatch: Option<&mut dyn FnMut(Transaction)>) -> bool {
        let Some(tr) = compile_command(state, self) else {
            return false;
        };
        if let Some(dispatch) = dispatch {
            dispatch(tr);
        }
        true
    }

    pub fn can_apply(&self, state: &EditorState) -> bool {
        self.run(state, None)
    }

    /// Whether the selection already has what this command would set.
    pub fn is_active(&self, state: &EditorState) -> bool {
        let doc = state.doc();
        let Some(rfrom) = doc.resolve(state.selection().from()) else {
            return false;
        };
        let parent = rfrom.parent();
        match self {
            Cmd::ToggleMark { mark } => mark_active(state, mark.mark_type()),
            Cmd::SetBlockType { kind } => kind.matches(parent),
            Cmd::MakeCodeBlock { language } => {
                matches!(parent.kind(), NodeKind::CodeBlock { params, .. } if params == language)
            }
            Cmd::Align { align } => parent.kind().align() == Some(*align),
            _ => false,
        }
    }
}

/// Compile a command into the transaction it would dispatch, or `None` when it
/// does not apply to `state`.
pub(crate) fn compile_command(state: &EditorState, cmd: &Cmd) -> Option<Transaction> {
    match cmd {
        Cmd::ToggleMark { mark } => toggle_mark(state, mark),
        Cmd::WrapInList { list } => wrap_in_list(state, *list),
        Cmd::WrapInBlockquote => wrap_in_blockquote(state),
        Cmd::SetBlockType { kind } => set_block_type(state, kind),
        Cmd::MakeCodeBlock { language } => make_code_block(state, language),
        Cmd::InsertImage { src, alt, title } => {
            insert_image(state, src, alt.as_deref(), title.as_deref())
        }
        Cmd::InsertTable { rows, cols } => insert_table(state, *rows, *cols),
        Cmd::InsertHorizontalRule => insert_horizontal_rule(state),
        Cmd::InsertMath { display } => insert_math(state, *display),
        Cmd::Tab { tab_size } => tab(state, *tab_size),
        Cmd::ShiftTab { tab_size } => shift_tab(state, *tab_size),
        Cmd::ToggleCodeCollapse { pos } => toggle_code_collapse(state, *pos),
        Cmd::Align { align } => align_selection(state, *align),
        Cmd::SelectParentNode => select_parent_node(state),
        Cmd::InsertText { text } => insert_text(state, text),
        Cmd::SplitBlock => split_block(state),
        Cmd::Backspace => backspace(state),
        Cmd::Undo => state.history().undo(state),
        Cmd::Redo => state.history().redo(state),
    }
}

/// Tab never falls through to focus navigation: lists sink, tables move to
/// the next cell, code indents, and anything else gets spaces.
fn tab(state: &EditorState, tab_size: usize) -> Option<Transaction> {
    if let Some(tr) = sink_list_item(state) {
        return Some(tr);
    }
    if is_in_table(state) {
        return go_to_next_cell(state, true);
    }
    if enclosing_code_block(state).is_some() {
        return indent_code_lines(state, tab_size);
    }
    insert_text(state, &" ".repeat(tab_size))
}

fn shift_tab(state: &EditorState, tab_size: usize) -> Option<Transaction> {
    if let Some(tr) = lift_list_item(state) {
        return Some(tr);
    }
    if is_in_table(state) {
        return go_to_next_cell(state, false);
    }
    if enclosing_code_block(state).is_some() {
        return outdent_code_lines(state, tab_size);
    }
    Some(state.tr())
}
