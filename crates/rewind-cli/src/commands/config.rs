use super::Context;
use crate::output::OutputFormat;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use watch_progress_config::Config;

pub fn run_config(cmd: crate::ConfigCommands, context: &Context) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show => show_config(context),
        crate::ConfigCommands::Init { force } => init_config(context, force),
    }
}

fn show_config(context: &Context) -> Result<()> {
    let output = &context.output;
    let config_file = context.paths.config_file();
    let store = &context.config.store;
    let logging = &context.config.logging;

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            if !config_file.exists() {
                output.warn(format!("Configuration file not found at: {} (using defaults)", config_file.display()));
                output.info("Run 'rewind config init' to write one.");
            }

            println!("\n{}", "Configuration".bright_cyan().bold());

            let mut info_table = Table::new();
            info_table.set_header(vec![
                Cell::new("Config File").add_attribute(comfy_table::Attribute::Bold),
                Cell::new(config_file.display().to_string()),
            ]);
            info_table.add_row(vec![
                Cell::new("Storage Directory"),
                Cell::new(context.storage_dir.display().to_string()),
            ]);
            info_table.load_preset(comfy_table::presets::UTF8_FULL);
            info_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", info_table);
            println!();

            let mut store_table = Table::new();
            store_table.set_header(vec![
                Cell::new("Store").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
            ]);
            store_table.add_row(vec!["Storage key".to_string(), store.storage_key.clone()]);
            store_table.add_row(vec!["Max entries".to_string(), store.max_entries.to_string()]);
            store_table.add_row(vec!["Low watermark".to_string(), format!("{}%", store.low_watermark)]);
            store_table.add_row(vec!["High watermark".to_string(), format!("{}%", store.high_watermark)]);
            store_table.add_row(vec!["Throttle interval".to_string(), format!("{}s", store.throttle_interval_secs)]);
            store_table.add_row(vec!["Recent limit".to_string(), store.recent_limit.to_string()]);
            store_table.load_preset(comfy_table::presets::UTF8_FULL);
            store_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", store_table);
            println!();

            let mut logging_table = Table::new();
            logging_table.set_header(vec![
                Cell::new("Logging").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
            ]);
            logging_table.add_row(vec!["Level".to_string(), logging.level.clone()]);
            logging_table.add_row(vec!["JSON".to_string(), logging.json.to_string()]);
            logging_table.add_row(vec![
                "File".to_string(),
                logging
                    .file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "stderr".to_string()),
            ]);
            logging_table.load_preset(comfy_table::presets::UTF8_FULL);
            logging_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", logging_table);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "config_file_exists": config_file.exists(),
                "storage_dir": context.storage_dir.display().to_string(),
                "store": {
                    "storage_key": store.storage_key,
                    "max_entries": store.max_entries,
                    "low_watermark": store.low_watermark,
                    "high_watermark": store.high_watermark,
                    "throttle_interval_secs": store.throttle_interval_secs,
                    "recent_limit": store.recent_limit,
                },
                "logging": {
                    "level": logging.level,
                    "json": logging.json,
                    "file": logging.file.as_ref().map(|p| p.display().to_string()),
                },
            }));
        }
    }

    Ok(())
}

fn init_config(context: &Context, force: bool) -> Result<()> {
    let output = &context.output;
    let config_file = context.paths.config_file();

    if config_file.exists() && !force {
        output.warn(format!("Configuration already exists at {}", config_file.display()));
        output.println("\nUse --force to overwrite it with defaults.");
        return Ok(());
    }

    context
        .paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create directories: {}", e))?;

    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to write config to {}: {}", config_file.display(), e))?;

    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}
