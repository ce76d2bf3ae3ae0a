use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};
use crossterm::style::Stylize;

use crate::data::datatable::DataRow;
use crate::data::field::{Align, Field};
use crate::grid::RenderedWindow;

/// Build a table for the visible columns of `window`, with a leading row
/// number column (the cursor row is marked) and an optional totals row
pub fn build_table(window: &RenderedWindow, totals: Option<&[String]>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut headers = vec![Cell::new("#").add_attribute(Attribute::Bold)];
    headers.extend(window.visible.iter().filter_map(|&p| {
        window
            .fields
            .get(p)
            .map(|f| Cell::new(f.display_label()).add_attribute(Attribute::Bold))
    }));
    table.set_header(headers);

    for row in &window.rows {
        let marker = if window.cursor == Some(row.index) {
            format!(">{}", row.index + 1)
        } else {
            (row.index + 1).to_string()
        };
        let mut cells = vec![Cell::new(marker)];
        cells.extend(
            window
                .visible
                .iter()
                .map(|&p| Cell::new(row.cells.get(p).map(String::as_str).unwrap_or(""))),
        );
        table.add_row(cells);
    }

    if let Some(totals) = totals {
        let mut cells = vec![Cell::new("Σ").add_attribute(Attribute::Bold)];
        cells.extend(window.visible.iter().map(|&p| {
            Cell::new(totals.get(p).map(String::as_str).unwrap_or("")).add_attribute(Attribute::Bold)
        }));
        table.add_row(cells);
    }

    for (i, &p) in window.visible.iter().enumerate() {
        let alignment = match window.fields.get(p).map(|f| f.align) {
            Some(Align::Right) => CellAlignment::Right,
            Some(Align::Center) => CellAlignment::Center,
            _ => CellAlignment::Left,
        };
        if let Some(column) = table.column_mut(i + 1) {
            column.set_cell_alignment(alignment);
        }
    }

    table
}

/// `name=value` pairs for one row, paired with the fields in their current
/// order
pub fn describe_row(row: &DataRow, fields: &[Field]) -> String {
    fields
        .iter()
        .zip(row.to_strings())
        .map(|(field, value)| format!("{}={}", field.name, value))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn display_window(window: &RenderedWindow, totals: Option<&[String]>, working_len: usize) {
    if window.rows.is_empty() {
        println!("{}", "No rows to show.".yellow());
        return;
    }

    println!("{}", build_table(window, totals));
    let to = window.to.map(|t| t + 1).unwrap_or(0);
    println!(
        "\n{}",
        format!("Rows {}-{} of {}", window.from + 1, to, working_len).green()
    );
}
