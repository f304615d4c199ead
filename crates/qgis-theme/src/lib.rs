#![cfg_attr(docsrs, feature(doc_cfg))]
//! Streaming reader for QGIS map themes (`<visibility-preset>` elements).
//!
//! ```rust
//! use qgis_theme::{parse_preset, ProjectVersion, TriState};
//! use qgis_xml::{advance_to_start, QuickXmlCursor};
//!
//! let xml = r#"
//!     <visibility-preset name="Theme A">
//!         <layer id="L1" visible="1" style="default"/>
//!         <layer id="L2" visible="0"/>
//!         <checked-group-node id="G1"/>
//!     </visibility-preset>
//! "#;
//! let mut cursor = QuickXmlCursor::from_xml(xml);
//! advance_to_start(&mut cursor, "visibility-preset").unwrap();
//! let preset = parse_preset(&mut cursor, ProjectVersion::new(3, 28, 0)).unwrap();
//! assert_eq!(preset.name(), "Theme A");
//! assert_eq!(preset.layers().len(), 1);
//! assert_eq!(preset.layers()[0].visible, TriState::True);
//! ```

use qgis_xml::XmlError;
use thiserror::Error;

pub mod parser;
pub mod policy;
pub mod preset;
pub mod project;

pub use parser::{extract_checked_legend_nodes, extract_layer, parse_preset, parse_preset_with};
pub use policy::{
    policy_for, CheckedOnly, FullEnumeration, InclusionPolicy, ProjectVersion,
    FULL_ENUMERATION_SINCE,
};
pub use preset::{LayerEntry, Preset, PresetFields, TriState};
pub use project::{read_project_presets, read_project_presets_with_version, PresetTable};

/// Error type produced while reading themes.
#[derive(Debug, Error)]
pub enum PresetError {
    /// A theme element lacks a mandatory identifier: the theme's `name`, or
    /// the `id` of a layer kept by the inclusion policy.
    #[error("malformed visibility preset{}: {reason}", display_preset(.preset))]
    MalformedPreset {
        preset: Option<String>,
        reason: String,
    },
    /// The stream ended before the end element of `element` was seen.
    #[error("document truncated inside <{element}>")]
    TruncatedDocument { element: String },
    /// The cursor was not positioned where the operation requires.
    #[error("expected <{expected}> start element, found {found}")]
    UnexpectedNode {
        expected: &'static str,
        found: String,
    },
    /// The underlying XML stream failed.
    #[error(transparent)]
    Xml(#[from] XmlError),
}

impl PresetError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        PresetError::MalformedPreset {
            preset: None,
            reason: reason.into(),
        }
    }

    pub(crate) fn truncated(element: &str) -> Self {
        PresetError::TruncatedDocument {
            element: element.to_owned(),
        }
    }

    /// Attach the theme name to a [`PresetError::MalformedPreset`] raised by a
    /// child element.
    pub(crate) fn in_preset(self, name: &str) -> Self {
        match self {
            PresetError::MalformedPreset {
                preset: None,
                reason,
            } => PresetError::MalformedPreset {
                preset: Some(name.to_owned()),
                reason,
            },
            other => other,
        }
    }

    /// `true` when only the current theme is unusable and the rest of the
    /// document can still be read.
    pub fn is_malformed(&self) -> bool {
        matches!(self, PresetError::MalformedPreset { .. })
    }
}

fn display_preset(preset: &Option<String>) -> String {
    preset
        .as_deref()
        .map(|name| format!(" '{name}'"))
        .unwrap_or_default()
}
