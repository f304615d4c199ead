use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use qgis_theme::{
    read_project_presets, read_project_presets_with_version, PresetTable, ProjectVersion,
    TriState,
};
use qgis_xml::QuickXmlCursor;
use serde::Serialize;
use tracing::info;

pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 10_000;

/// How a project document is loaded and which theme policy applies.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Forced project version; read from the `<qgis>` root when `None`.
    pub version: Option<ProjectVersion>,
    pub timeout: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            version: None,
            timeout: Duration::from_millis(DEFAULT_LOAD_TIMEOUT_MS),
        }
    }
}

/// Accepts `3.28.4`, `3.28.4-Firenze` or the encoded form `32804`.
pub fn parse_version_arg(text: &str) -> Result<ProjectVersion, String> {
    let trimmed = text.trim();
    if !trimmed.contains('.') {
        if let Ok(encoded) = trimmed.parse::<u32>() {
            return Ok(ProjectVersion(encoded));
        }
    }
    ProjectVersion::parse(trimmed).ok_or_else(|| format!("invalid QGIS version '{text}'"))
}

pub async fn load_project(path: &Path, timeout: Duration) -> Result<String> {
    tokio::time::timeout(timeout, tokio::fs::read_to_string(path))
        .await
        .map_err(|_| {
            anyhow!(
                "loading {} timed out after {} ms",
                path.display(),
                timeout.as_millis()
            )
        })?
        .with_context(|| format!("read {}", path.display()))
}

pub fn read_themes(xml: &str, version: Option<ProjectVersion>) -> Result<PresetTable> {
    let mut cursor = QuickXmlCursor::from_xml(xml);
    let table = match version {
        Some(version) => read_project_presets_with_version(&mut cursor, version),
        None => read_project_presets(&mut cursor),
    }
    .context("read project themes")?;
    Ok(table)
}

pub async fn load_themes(path: &Path, options: &LoadOptions) -> Result<PresetTable> {
    let xml = load_project(path, options.timeout).await?;
    let table = read_themes(&xml, options.version)?;
    info!(path = %path.display(), themes = table.len(), "loaded project themes");
    Ok(table)
}

pub fn format_tristate(value: TriState) -> &'static str {
    match value {
        TriState::True => "yes",
        TriState::False => "no",
        TriState::Unknown => "-",
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialise JSON output")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = r#"<qgis version="3.22.16-Białowieża">
        <visibility-presets>
            <visibility-preset name="Base">
                <layer id="roads" visible="1"/>
                <layer id="parcels"/>
                <layer id="rivers" visible="0"/>
                <layer id="labels" visible="true"/>
            </visibility-preset>
        </visibility-presets>
    </qgis>"#;

    #[test]
    fn version_argument_forms() {
        assert_eq!(parse_version_arg("3.28.4"), Ok(ProjectVersion(32804)));
        assert_eq!(parse_version_arg("3.26.0-Buenos Aires"), Ok(ProjectVersion(32600)));
        assert_eq!(parse_version_arg("32600"), Ok(ProjectVersion(32600)));
        assert!(parse_version_arg("latest").is_err());
    }

    #[test]
    fn read_themes_honours_forced_version() {
        let table = read_themes(PROJECT, None).expect("read");
        let base = table.get("Base").expect("Base");
        assert_eq!(base.layers().len(), 2);

        let table = read_themes(PROJECT, Some(ProjectVersion(32600))).expect("read");
        assert_eq!(table.get("Base").map(|p| p.layers().len()), Some(3));
    }

    #[test]
    fn tristate_formatting() {
        assert_eq!(format_tristate(TriState::True), "yes");
        assert_eq!(format_tristate(TriState::False), "no");
        assert_eq!(format_tristate(TriState::Unknown), "-");
    }

    #[tokio::test]
    async fn load_themes_from_file() {
        let path = std::env::temp_dir().join(format!("themectl-{}-load.qgs", std::process::id()));
        std::fs::write(&path, PROJECT).expect("write fixture");
        let loaded = load_themes(&path, &LoadOptions::default()).await;
        std::fs::remove_file(&path).ok();
        let table = loaded.expect("load themes");
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["Base"]);
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let path = std::env::temp_dir().join("themectl-does-not-exist.qgs");
        let err = load_project(&path, Duration::from_secs(1))
            .await
            .expect_err("missing file");
        assert!(err.to_string().starts_with("read "));
    }
}
