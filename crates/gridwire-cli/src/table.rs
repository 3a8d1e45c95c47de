//! Plain-text rendering of a grid

use gridwire::prelude::*;

/// Widest a column is allowed to get; longer values are cut
const MAX_WIDTH: usize = 12;

/// Render every display value as a table
///
/// The first line holds the column letters and each following line starts
/// with its row number. Trailing whitespace is trimmed from every line.
pub fn render(grid: &Grid) -> String {
    let options = grid.options();
    let rows = options.rows;
    let columns = options.columns;

    let mut texts: Vec<Vec<String>> = vec![Vec::with_capacity(columns as usize); rows as usize];
    for (addr, cell) in grid.store().iter() {
        if let Some(row) = texts.get_mut(addr.row as usize) {
            row.push(cell_text(&cell.display));
        }
    }

    let letters: Vec<String> = (0..columns).map(CellAddress::column_to_letters).collect();
    let widths: Vec<usize> = (0..columns as usize)
        .map(|col| {
            texts
                .iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(letters[col].len()))
                .max()
                .unwrap_or(1)
        })
        .collect();
    let label_width = rows.to_string().len();

    let mut output = String::new();
    push_line(&mut output, "", label_width, &letters, &widths);
    for (row, cells) in texts.iter().enumerate() {
        push_line(&mut output, &(row + 1).to_string(), label_width, cells, &widths);
    }
    output
}

fn push_line(output: &mut String, label: &str, label_width: usize, cells: &[String], widths: &[usize]) {
    let mut line = format!("{:>width$}", label, width = label_width);
    for (text, width) in cells.iter().zip(widths) {
        line.push_str(" | ");
        line.push_str(&format!("{:<width$}", text, width = *width));
    }
    output.push_str(line.trim_end());
    output.push('\n');
}

fn cell_text(value: &CellValue) -> String {
    value.to_string().chars().take(MAX_WIDTH).collect()
}
