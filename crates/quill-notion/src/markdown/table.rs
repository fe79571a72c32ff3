//! Table blocks to markdown.

use tracing::warn;

use super::inline::render_rich_text;
use crate::types::{Block, BlockKind, RichText, plain_text};

/// Render a table block from its `table_row` children.
///
/// Emits a pipe table when every row has the same number of cells. Otherwise
/// the cell text is emitted as a plain paragraph, one row per line.
pub(super) fn render_table(table: &Block) -> String {
    let rows: Vec<&[Vec<RichText>]> = table
        .children
        .iter()
        .filter_map(|row| match &row.kind {
            BlockKind::TableRow(row) => Some(row.cells.as_slice()),
            _ => None,
        })
        .collect();

    if rows.is_empty() {
        return String::new();
    }

    let width = rows[0].len();
    let uniform = width > 0
        && rows.len() == table.children.len()
        && rows.iter().all(|cells| cells.len() == width);

    if uniform {
        pipe_table(&rows, width)
    } else {
        warn!(
            "Table {} has irregular rows, rendering as paragraph",
            table.id
        );
        plain_rows(&rows)
    }
}

fn pipe_table(rows: &[&[Vec<RichText>]], width: usize) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(pipe_row(rows[0]));
    lines.push(format!("|{}", " --- |".repeat(width)));
    lines.extend(rows[1..].iter().map(|cells| pipe_row(cells)));
    lines.join("\n")
}

fn pipe_row(cells: &[Vec<RichText>]) -> String {
    let mut line = String::from("|");
    for cell in cells {
        let text = render_rich_text(cell)
            .replace('|', "\\|")
            .replace('\n', " ");
        line.push(' ');
        line.push_str(text.trim());
        line.push_str(" |");
    }
    line
}

fn plain_rows(rows: &[&[Vec<RichText>]]) -> String {
    rows.iter()
        .map(|cells| {
            cells
                .iter()
                .map(|cell| plain_text(cell).replace('\n', " "))
                .filter(|text| !text.trim().is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
