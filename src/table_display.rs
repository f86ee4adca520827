use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use tabula::{DataTable, DataValue};

/// Rows printed before the output is cut short
const MAX_DISPLAY_ROWS: usize = 200;

pub fn display_table(data: &DataTable) {
    if data.row_count() == 0 {
        println!("{}", "No results found.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        data.fields()
            .iter()
            .map(|f| Cell::new(f).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );

    for row in data.rows().iter().take(MAX_DISPLAY_ROWS) {
        table.add_row(
            row.iter()
                .map(|value| match value {
                    DataValue::Null => "NULL".to_string(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>(),
        );
    }

    println!("{table}");
    if data.row_count() > MAX_DISPLAY_ROWS {
        println!(
            "{}",
            format!("... {} more rows not shown", data.row_count() - MAX_DISPLAY_ROWS).dark_grey()
        );
    }
    println!("\n{}", format!("{} rows returned", data.row_count()).green());
}

pub fn print_help(predicates: &[String], setters: &[String]) {
    println!("{}", "Tabula - in-memory table shell".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  tabula [--generate-config] [FILE.csv|FILE.tsv|FILE.json]");
    println!();
    println!("{}", "Commands:".yellow());
    let commands = [
        ("load <path>", "Load a CSV, TSV or JSON file"),
        ("fields", "List field names and types"),
        ("show", "Show every row"),
        ("where <clause>", "Filter rows, e.g. where name=\"J_n\" AND age!=\"30\""),
        ("sort <order-by>", "Sort rows, e.g. sort age DESC, name"),
        ("select <fields> [where <clause>]", "Project fields, optionally filtered"),
        ("update <set> where <clause>", "Assign values, e.g. update age=\"$add(1)\" where OR*=\"%x%\""),
        ("delete <clause>", "Remove matching rows"),
        ("insert <csv row>", "Append a row"),
        ("distinct [fields]", "Remove duplicate rows"),
        ("commit on|off", "Make query results replace the data"),
        ("export csv|json|records [file]", "Print or write the last result"),
        ("logs [n]", "Show recent log entries"),
        ("help", "Show this help"),
        ("quit", "Exit"),
    ];
    for (command, description) in commands {
        println!("  {} - {}", format!("{:<34}", command).green(), description);
    }
    println!();
    println!("{}", "Clause syntax:".yellow());
    println!("  field=\"value\" / field!=\"value\"   % matches any run, _ one character");
    println!("  AND binds tighter than OR; use ( ) to group");
    println!("  OR*=\"x\" / AND*=\"x\" test every field");
    println!("  field=\"$gt(10)\" calls a predicate: {}", predicates.join(" "));
    println!("  update field=\"$add(1)\" calls a setter: {}", setters.join(" "));
    println!();
}
