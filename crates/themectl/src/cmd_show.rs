use std::fmt::Write;
use std::path::Path;

use anyhow::{anyhow, Result};
use qgis_theme::Preset;
use tracing::info;

use crate::common::{self, format_tristate, LoadOptions};

pub async fn run(path: &Path, name: &str, options: &LoadOptions, json: bool) -> Result<()> {
    let table = common::load_themes(path, options).await?;
    let preset = table.get(name).ok_or_else(|| {
        let known: Vec<_> = table.names().collect();
        anyhow!("no theme named '{name}' (known: {})", known.join(", "))
    })?;
    info!(theme = name, layers = preset.layers().len(), "showing theme");

    if json {
        common::print_json(&preset.keyed())?;
    } else {
        print!("{}", render(preset));
    }
    Ok(())
}

pub fn render(preset: &Preset) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Theme: {}", preset.name());
    let _ = writeln!(
        out,
        "{:<40} {:<16} {:<8} {}",
        "LAYER", "STYLE", "VISIBLE", "EXPANDED"
    );
    for layer in preset.layers() {
        let _ = writeln!(
            out,
            "{:<40} {:<16} {:<8} {}",
            layer.id,
            layer.style.as_deref().unwrap_or("-"),
            format_tristate(layer.visible),
            format_tristate(layer.expanded),
        );
    }
    let _ = writeln!(
        out,
        "Checked groups: {}",
        join_ids(preset.checked_group_nodes())
    );
    let _ = writeln!(
        out,
        "Expanded groups: {}",
        join_ids(preset.expanded_group_nodes())
    );
    for (layer, symbols) in preset.checked_legend_nodes() {
        let _ = writeln!(out, "Legend {layer}: {}", symbols.join(", "));
    }
    out
}

fn join_ids<'a>(ids: impl IntoIterator<Item = &'a String>) -> String {
    let ids: Vec<&str> = ids.into_iter().map(String::as_str).collect();
    if ids.is_empty() {
        "-".to_string()
    } else {
        ids.join(", ")
    }
}
