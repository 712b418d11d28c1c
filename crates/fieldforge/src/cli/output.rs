//! Output formatting utilities for CLI commands

use chrono::{DateTime, Local, Utc};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use fieldforge_schema::{FieldType, OutlineRow};
use serde::Serialize;

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    println!("{}", table);
}

/// Print a field outline: one row per node, indented by depth, type colored
pub fn print_outline(rows: &[OutlineRow]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        ["PATH", "TYPE", "DESCRIPTION"]
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );

    for row in rows {
        table.add_row(vec![
            Cell::new(format!("{}{}", "  ".repeat(row.depth), row.path)),
            Cell::new(row.field_type).fg(color_for_type(row.field_type)),
            Cell::new(row.description.as_deref().unwrap_or("-")),
        ]);
    }

    println!("{}", table);
}

pub fn color_for_type(field_type: FieldType) -> Color {
    match field_type {
        FieldType::String => Color::Green,
        FieldType::Number => Color::Yellow,
        FieldType::Boolean => Color::Magenta,
        FieldType::Array => Color::Blue,
        FieldType::Object => Color::White,
    }
}

/// Format a UTC timestamp in local time
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Pretty-print any serializable value as JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_shape() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let text = format_timestamp(&time);
        // Local offset varies; only the layout is fixed
        assert_eq!(text.len(), "2024-03-01 12:30".len());
        assert!(text.starts_with("2024-0"));
    }

    #[test]
    fn test_type_colors_distinct() {
        let colors: Vec<Color> = FieldType::ALL.iter().map(|t| color_for_type(*t)).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
