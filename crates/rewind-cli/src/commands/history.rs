use super::Context;
use crate::output::OutputFormat;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use watch_progress_models::{format_time, WatchEntry};

pub fn run_list(context: &Context, limit: Option<usize>, all: bool) -> Result<()> {
    let store = context.open_store()?;
    let output = &context.output;

    let entries = if all {
        store.history()
    } else {
        store.recently_watched(limit.unwrap_or(store.settings().recent_limit))
    };

    if output.format() != OutputFormat::Human {
        output.json(&json!({ "type": "history", "items": entries }));
        return Ok(());
    }

    if entries.is_empty() {
        output.info("Nothing in progress. Start watching something!");
        return Ok(());
    }

    if !output.is_quiet() {
        println!("\n{}", "Continue Watching".bright_cyan().bold());
        println!("{}", history_table(&entries));
    }
    Ok(())
}

pub fn run_show(context: &Context, id: &str) -> Result<()> {
    let store = context.open_store()?;
    let output = &context.output;

    let Some(entry) = store.progress(id) else {
        if output.format() != OutputFormat::Human {
            output.json(&json!({ "type": "progress", "id": id, "entry": null }));
        } else {
            output.warn(format!("No progress recorded for {}", id));
        }
        return Ok(());
    };

    if output.format() != OutputFormat::Human {
        output.json(&json!({ "type": "progress", "id": id, "entry": entry }));
        return Ok(());
    }

    if output.is_quiet() {
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Field").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
    ]);
    table.add_row(vec!["ID", entry.id.as_str()]);
    table.add_row(vec!["Title", entry.title.as_str()]);
    table.add_row(vec!["Type", entry.kind.as_str()]);
    table.add_row(vec!["Folder", entry.folder.as_deref().unwrap_or("-")]);
    table.add_row(vec!["Year", entry.year.as_deref().unwrap_or("-")]);
    table.add_row(vec![
        "Position".to_string(),
        format!("{} / {}", format_time(entry.current_time), format_time(entry.duration)),
    ]);
    table.add_row(vec!["Progress".to_string(), format!("{:.1}%", entry.percentage)]);
    table.add_row(vec!["Last watched".to_string(), entry.last_watched.to_rfc3339()]);
    println!("{}", table);
    output.info(format!("Resume from {}", format_time(entry.current_time).green()));
    Ok(())
}

pub fn run_remove(context: &Context, id: &str) -> Result<()> {
    let store = context.open_store()?;
    let existed = store.progress(id).is_some();
    store.remove_item(id);

    if existed {
        context.output.success(format!("Removed {} from watch history", id));
    } else {
        context.output.info(format!("{} was not in watch history", id));
    }
    Ok(())
}

pub fn run_stats(context: &Context) -> Result<()> {
    let store = context.open_store()?;
    let output = &context.output;
    let stats = store.stats();

    if output.format() != OutputFormat::Human {
        output.json(&json!({ "type": "stats", "stats": stats }));
        return Ok(());
    }

    if output.is_quiet() {
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.add_row(vec![
        Cell::new("Items in progress").add_attribute(comfy_table::Attribute::Bold),
        Cell::new(stats.total_items),
    ]);
    table.add_row(vec![
        Cell::new("Total watch time").add_attribute(comfy_table::Attribute::Bold),
        Cell::new(format_time(stats.total_watch_time)),
    ]);
    table.add_row(vec![
        Cell::new("Average progress").add_attribute(comfy_table::Attribute::Bold),
        Cell::new(format!("{:.1}%", stats.average_progress)),
    ]);
    println!("{}", table);
    Ok(())
}

fn history_table(entries: &[WatchEntry]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Type").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Position").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Progress").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Last watched").add_attribute(comfy_table::Attribute::Bold),
    ]);

    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.title),
            Cell::new(entry.kind.as_str()),
            Cell::new(format!("{} / {}", format_time(entry.current_time), format_time(entry.duration))),
            Cell::new(progress_bar(entry.percentage)),
            Cell::new(entry.last_watched.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }
    table
}

/// Ten-cell text bar followed by the rounded percentage.
fn progress_bar(percentage: f64) -> String {
    let filled = ((percentage / 10.0).round() as usize).min(10);
    format!("{}{} {:>3.0}%", "█".repeat(filled), "░".repeat(10 - filled), percentage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(8.3), "█░░░░░░░░░   8%");
        assert_eq!(progress_bar(50.0), "█████░░░░░  50%");
        assert_eq!(progress_bar(95.0), "██████████  95%");
    }
}
