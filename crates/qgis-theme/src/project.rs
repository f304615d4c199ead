//! Reading every theme of a project document into a lookup table.

use indexmap::IndexMap;
use qgis_xml::{skip_to_end, NodeKind, XmlCursor};
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::parser::{parse_preset, VISIBILITY_PRESET};
use crate::policy::ProjectVersion;
use crate::preset::{Preset, PresetFields};
use crate::PresetError;

/// Root element of a `.qgs` project document.
pub const QGIS_ROOT: &str = "qgis";

/// Themes of one project keyed by name, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetTable {
    presets: IndexMap<String, Preset>,
}

impl PresetTable {
    pub fn new() -> Self {
        PresetTable::default()
    }

    /// Insert a theme, returning the one it replaced if the name was taken.
    /// A replaced theme keeps its original position.
    pub fn insert(&mut self, preset: Preset) -> Option<Preset> {
        self.presets.insert(preset.name().to_owned(), preset)
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.values()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Merged keyed views of every theme.
    pub fn keyed(&self) -> IndexMap<&str, PresetFields<'_>> {
        let mut merged = IndexMap::with_capacity(self.presets.len());
        for preset in self.presets.values() {
            merged.extend(preset.keyed());
        }
        merged
    }
}

impl Serialize for PresetTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.keyed().serialize(serializer)
    }
}

impl Extend<Preset> for PresetTable {
    fn extend<I: IntoIterator<Item = Preset>>(&mut self, iter: I) {
        for preset in iter {
            self.insert(preset);
        }
    }
}

impl FromIterator<Preset> for PresetTable {
    fn from_iter<I: IntoIterator<Item = Preset>>(iter: I) -> Self {
        let mut table = PresetTable::new();
        table.extend(iter);
        table
    }
}

/// Read every `<visibility-preset>` of a project document.
///
/// The inclusion policy follows the `version` attribute of the `<qgis>` root
/// element ([`ProjectVersion::UNKNOWN`] when absent). A theme without a name,
/// or holding a layer without an id, is skipped up to its own end element;
/// truncation and XML errors abort the read.
pub fn read_project_presets<C: XmlCursor + ?Sized>(
    cursor: &mut C,
) -> Result<PresetTable, PresetError> {
    read_presets(cursor, None)
}

/// Same as [`read_project_presets`] with the project version forced.
pub fn read_project_presets_with_version<C: XmlCursor + ?Sized>(
    cursor: &mut C,
    version: ProjectVersion,
) -> Result<PresetTable, PresetError> {
    read_presets(cursor, Some(version))
}

fn read_presets<C: XmlCursor + ?Sized>(
    cursor: &mut C,
    forced: Option<ProjectVersion>,
) -> Result<PresetTable, PresetError> {
    let mut version = forced.unwrap_or(ProjectVersion::UNKNOWN);
    let mut table = PresetTable::new();

    while cursor.read()? {
        let Some(node) = cursor.node() else { break };
        if node.kind() != NodeKind::Start {
            continue;
        }
        if node.depth() == 0 && node.local_name() == QGIS_ROOT {
            if forced.is_none() {
                version = node
                    .attribute("version")
                    .and_then(ProjectVersion::parse)
                    .unwrap_or(ProjectVersion::UNKNOWN);
            }
            debug!(%version, "reading project themes");
            continue;
        }
        if node.local_name() != VISIBILITY_PRESET {
            continue;
        }
        let (depth, is_empty) = (node.depth(), node.is_empty());
        match parse_preset(cursor, version) {
            Ok(preset) => {
                if let Some(previous) = table.insert(preset) {
                    warn!(preset = previous.name(), "duplicate theme name, keeping the last one");
                }
            }
            Err(err) if err.is_malformed() => {
                warn!(error = %err, "skipping theme");
                if !is_empty && !skip_to_end(cursor, VISIBILITY_PRESET, depth)? {
                    return Err(PresetError::truncated(VISIBILITY_PRESET));
                }
            }
            Err(err) => return Err(err),
        }
    }

    debug!(themes = table.len(), "project themes read");
    Ok(table)
}
