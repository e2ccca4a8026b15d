use crate::model::{Node, NodeKind};
use crate::state::{EditorState, Selection, Transaction};

/// Build a `rows` x `cols` table of empty cells.
pub fn create_table(rows: usize, cols: usize) -> Node {
    let rows = (0..rows.max(1))
        .map(|_| {
            let cells = (0..cols.max(1))
                .map(|_| {
                    Node::element(
                        NodeKind::TableCell(Default::default()),
                        vec![Node::element(NodeKind::paragraph(), vec![])],
                    )
                })
                .collect();
            Node::element(NodeKind::TableRow, cells)
        })
        .collect();
    Node::element(NodeKind::Table, rows)
}

/// Move to the next (or previous) cell in reading order and select its
/// content.
///
/// Returns `None` outside a table. At the first or last cell the move is
/// consumed without changing anything.
pub fn go_to_next_cell(state: &EditorState, forward: bool) -> Option<Transaction> {
    let doc = state.doc();
    let rpos = doc.resolve(state.selection().head())?;
    let cell_depth = rpos.find_ancestor(|n| n.node_type().is_table_cell())?;
    let table_depth = cell_depth.checked_sub(2)?;
    let table = rpos.node(table_depth);

    let mut cells = Vec::new();
    let mut row_pos = rpos.start(table_depth);
    for row in table.content() {
        let mut cell_pos = row_pos + 1;
        for cell in row.content() {
            cells.push((cell_pos, cell.node_size()));
            cell_pos += cell.node_size();
        }
        row_pos += row.node_size();
    }

    let current = rpos.before(cell_depth);
    let index = cells.iter().position(|(pos, _)| *pos == current)?;
    let next = if forward {
        Some(index + 1).filter(|&i| i < cells.len())
    } else {
        index.checked_sub(1)
    };

    let mut tr = state.tr();
    if let Some((pos, size)) = next.map(|i| cells[i]) {
        tr.set_selection(Selection::text(pos + 2, pos + size - 2));
    }
    Some(tr)
}
