#![cfg_attr(docsrs, feature(doc_cfg))]
//! Lizmap theme facade re-exporting the XML cursor and the theme reader.
//!
//! ```rust
//! use lizmap_themes::{read_project_presets, xml::QuickXmlCursor};
//!
//! let project = r#"
//!     <qgis version="3.28.4-Firenze">
//!         <visibility-presets>
//!             <visibility-preset name="Base">
//!                 <layer id="roads" visible="1"/>
//!                 <layer id="rivers" visible="0"/>
//!             </visibility-preset>
//!         </visibility-presets>
//!     </qgis>
//! "#;
//! let mut cursor = QuickXmlCursor::from_xml(project);
//! let themes = read_project_presets(&mut cursor).expect("read themes");
//! assert_eq!(themes.get("Base").map(|t| t.layers().len()), Some(1));
//! ```

pub use qgis_theme as theme;
pub use qgis_xml as xml;

pub use qgis_theme::{
    parse_preset, read_project_presets, LayerEntry, Preset, PresetError, PresetTable,
    ProjectVersion, TriState,
};

/// Read the themes of an in-memory project document.
pub fn read_themes_from_str(project: &str) -> Result<PresetTable, PresetError> {
    let mut cursor = xml::QuickXmlCursor::from_xml(project);
    let themes = read_project_presets(&mut cursor)?;
    tracing::debug!(themes = themes.len(), "read themes from string");
    Ok(themes)
}
