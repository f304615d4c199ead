use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use qgis_theme::PresetTable;
use serde::Serialize;

use crate::common::{self, LoadOptions};

#[derive(Serialize)]
struct ThemeEntry<'a> {
    index: usize,
    name: &'a str,
    layers: usize,
    checked_groups: usize,
    expanded_groups: usize,
    legend_layers: usize,
}

pub async fn run(path: &Path, options: &LoadOptions, json: bool) -> Result<()> {
    let table = common::load_themes(path, options).await?;

    if json {
        let entries: Vec<ThemeEntry> = table
            .iter()
            .enumerate()
            .map(|(idx, preset)| ThemeEntry {
                index: idx,
                name: preset.name(),
                layers: preset.layers().len(),
                checked_groups: preset.checked_group_nodes().len(),
                expanded_groups: preset.expanded_group_nodes().len(),
                legend_layers: preset.checked_legend_nodes().len(),
            })
            .collect();
        common::print_json(&entries)?;
        return Ok(());
    }

    if table.is_empty() {
        println!("No themes in {}.", path.display());
        return Ok(());
    }
    print!("{}", render(&table));
    Ok(())
}

pub fn render(table: &PresetTable) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<28} {:>6} {:>8} {:>9}",
        "INDEX", "THEME", "LAYERS", "CHECKED", "EXPANDED"
    );
    for (idx, preset) in table.iter().enumerate() {
        let _ = writeln!(
            out,
            "{idx:<6} {:<28} {:>6} {:>8} {:>9}",
            preset.name(),
            preset.layers().len(),
            preset.checked_group_nodes().len(),
            preset.expanded_group_nodes().len(),
        );
    }
    out
}
