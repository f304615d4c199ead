//! Immutable theme values produced by the parser.

use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};

/// Three-way flag read from a `"1"` / `"0"` attribute that may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriState {
    True,
    False,
    /// Attribute absent or carrying an unrecognised value.
    #[default]
    Unknown,
}

impl TriState {
    /// Interpret a raw attribute value.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("1") | Some("true") => TriState::True,
            Some("0") | Some("false") => TriState::False,
            _ => TriState::Unknown,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            TriState::True => Some(true),
            TriState::False => Some(false),
            TriState::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        self != TriState::Unknown
    }
}

impl Serialize for TriState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_bool().serialize(serializer)
    }
}

/// One `layer` entry of a theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerEntry {
    /// Layer identifier inside the project.
    pub id: String,
    /// Active style variant, when the theme pins one.
    pub style: Option<String>,
    /// Visibility after the inclusion policy was applied.
    pub visible: TriState,
    /// Layer-tree expansion state; display only.
    pub expanded: TriState,
}

/// A saved map theme, read from one `<visibility-preset>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    name: String,
    layers: Vec<LayerEntry>,
    checked_group_nodes: IndexSet<String>,
    expanded_group_nodes: IndexSet<String>,
    checked_legend_nodes: IndexMap<String, Vec<String>>,
}

impl Preset {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Layers in document order. Duplicated ids in the source are kept.
    pub fn layers(&self) -> &[LayerEntry] {
        &self.layers
    }

    pub fn layer(&self, id: &str) -> Option<&LayerEntry> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn checked_group_nodes(&self) -> &IndexSet<String> {
        &self.checked_group_nodes
    }

    pub fn expanded_group_nodes(&self) -> &IndexSet<String> {
        &self.expanded_group_nodes
    }

    /// Checked legend symbols per layer id. Lists are never empty.
    pub fn checked_legend_nodes(&self) -> &IndexMap<String, Vec<String>> {
        &self.checked_legend_nodes
    }

    /// Everything but the name, borrowed.
    pub fn fields(&self) -> PresetFields<'_> {
        PresetFields {
            layers: &self.layers,
            checked_group_nodes: &self.checked_group_nodes,
            expanded_group_nodes: &self.expanded_group_nodes,
            checked_legend_nodes: &self.checked_legend_nodes,
        }
    }

    /// Single-entry map `name -> fields`, ready to be merged with the keyed
    /// views of other themes into one lookup table.
    pub fn keyed(&self) -> IndexMap<&str, PresetFields<'_>> {
        let mut map = IndexMap::with_capacity(1);
        map.insert(self.name.as_str(), self.fields());
        map
    }
}

/// Field set of a [`Preset`] without its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetFields<'a> {
    pub layers: &'a [LayerEntry],
    pub checked_group_nodes: &'a IndexSet<String>,
    pub expanded_group_nodes: &'a IndexSet<String>,
    pub checked_legend_nodes: &'a IndexMap<String, Vec<String>>,
}

/// In-progress collections, owned by a single parse call.
#[derive(Debug)]
pub(crate) struct PresetBuilder {
    name: String,
    layers: Vec<LayerEntry>,
    checked_group_nodes: IndexSet<String>,
    expanded_group_nodes: IndexSet<String>,
    checked_legend_nodes: IndexMap<String, Vec<String>>,
}

impl PresetBuilder {
    /// Callers guarantee `name` is non-empty.
    pub(crate) fn new(name: String) -> Self {
        PresetBuilder {
            name,
            layers: Vec::new(),
            checked_group_nodes: IndexSet::new(),
            expanded_group_nodes: IndexSet::new(),
            checked_legend_nodes: IndexMap::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn push_layer(&mut self, layer: LayerEntry) {
        self.layers.push(layer);
    }

    pub(crate) fn check_group(&mut self, id: String) {
        self.checked_group_nodes.insert(id);
    }

    pub(crate) fn expand_group(&mut self, id: String) {
        self.expanded_group_nodes.insert(id);
    }

    /// Empty lists are dropped; a repeated layer id replaces the earlier list.
    pub(crate) fn set_legend_nodes(&mut self, layer_id: String, ids: Vec<String>) {
        if !ids.is_empty() {
            self.checked_legend_nodes.insert(layer_id, ids);
        }
    }

    pub(crate) fn finish(self) -> Preset {
        Preset {
            name: self.name,
            layers: self.layers,
            checked_group_nodes: self.checked_group_nodes,
            expanded_group_nodes: self.expanded_group_nodes,
            checked_legend_nodes: self.checked_legend_nodes,
        }
    }
}
