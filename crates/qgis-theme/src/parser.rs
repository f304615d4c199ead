//! Depth-bounded parsing of a single `<visibility-preset>` subtree.
//!
//! The assembler never materialises the document: it records the depth of
//! the theme element and walks sibling events one level below it, handing
//! nested selections to small bounded sub-loops that stop on their own end
//! element.

use qgis_xml::{skip_subtree, NodeKind, XmlCursor, XmlNode};
use tracing::{debug, trace};

use crate::policy::{policy_for, InclusionPolicy, ProjectVersion};
use crate::preset::{LayerEntry, Preset, PresetBuilder, TriState};
use crate::PresetError;

pub const VISIBILITY_PRESET: &str = "visibility-preset";
pub const LAYER: &str = "layer";
pub const CHECKED_GROUP_NODE: &str = "checked-group-node";
pub const CHECKED_GROUP_NODES: &str = "checked-group-nodes";
pub const EXPANDED_GROUP_NODE: &str = "expanded-group-node";
pub const EXPANDED_GROUP_NODES: &str = "expanded-group-nodes";
pub const CHECKED_LEGEND_NODE: &str = "checked-legend-node";
pub const CHECKED_LEGEND_NODES: &str = "checked-legend-nodes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Child {
    Layer,
    CheckedGroup,
    ExpandedGroup,
    CheckedGroups,
    ExpandedGroups,
    LegendNodes,
    Other,
}

impl Child {
    fn classify(local_name: &str) -> Self {
        match local_name {
            LAYER => Child::Layer,
            CHECKED_GROUP_NODE => Child::CheckedGroup,
            EXPANDED_GROUP_NODE => Child::ExpandedGroup,
            CHECKED_GROUP_NODES => Child::CheckedGroups,
            EXPANDED_GROUP_NODES => Child::ExpandedGroups,
            CHECKED_LEGEND_NODES => Child::LegendNodes,
            _ => Child::Other,
        }
    }
}

/// Parse the theme the cursor is positioned on, choosing the inclusion
/// policy from the project version.
pub fn parse_preset<C: XmlCursor + ?Sized>(
    cursor: &mut C,
    version: ProjectVersion,
) -> Result<Preset, PresetError> {
    parse_preset_with(cursor, policy_for(version))
}

/// Parse the theme the cursor is positioned on with an explicit policy.
///
/// On success the cursor rests on the theme's end element (or on the start
/// element itself when it is self-closing).
pub fn parse_preset_with<C: XmlCursor + ?Sized>(
    cursor: &mut C,
    policy: &dyn InclusionPolicy,
) -> Result<Preset, PresetError> {
    let node = expect_start(cursor, VISIBILITY_PRESET)?;
    let name = match node.attribute("name") {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => return Err(PresetError::malformed("missing name attribute")),
    };
    let mut builder = PresetBuilder::new(name);
    if node.is_empty() {
        debug!(preset = builder.name(), "empty visibility preset");
        return Ok(builder.finish());
    }
    let depth = node.depth();

    loop {
        if !cursor.read()? {
            return Err(PresetError::truncated(VISIBILITY_PRESET));
        }
        let node = current(cursor, VISIBILITY_PRESET)?;
        if node.depth() == depth && node.is_end(VISIBILITY_PRESET) {
            break;
        }
        if node.kind() != NodeKind::Start || node.depth() != depth + 1 {
            continue;
        }
        match Child::classify(node.local_name()) {
            Child::Layer => {
                let layer =
                    extract_layer(cursor, policy).map_err(|err| err.in_preset(builder.name()))?;
                if let Some(layer) = layer {
                    builder.push_layer(layer);
                }
            }
            Child::CheckedGroup => {
                if let Some(id) = child_id(node) {
                    builder.check_group(id);
                }
            }
            Child::ExpandedGroup => {
                if let Some(id) = child_id(node) {
                    builder.expand_group(id);
                }
            }
            Child::CheckedGroups => {
                let ids = collect_group_container(cursor, CHECKED_GROUP_NODES, CHECKED_GROUP_NODE)
                    .map_err(|err| err.in_preset(builder.name()))?;
                for id in ids {
                    builder.check_group(id);
                }
            }
            Child::ExpandedGroups => {
                let ids =
                    collect_group_container(cursor, EXPANDED_GROUP_NODES, EXPANDED_GROUP_NODE)
                        .map_err(|err| err.in_preset(builder.name()))?;
                for id in ids {
                    builder.expand_group(id);
                }
            }
            Child::LegendNodes => {
                let (layer_id, ids) = extract_checked_legend_nodes(cursor)
                    .map_err(|err| err.in_preset(builder.name()))?;
                builder.set_legend_nodes(layer_id, ids);
            }
            Child::Other => {
                trace!(element = node.local_name(), "ignoring theme child");
            }
        }
    }

    let preset = builder.finish();
    debug!(
        preset = preset.name(),
        policy = policy.name(),
        layers = preset.layers().len(),
        checked_groups = preset.checked_group_nodes().len(),
        expanded_groups = preset.expanded_group_nodes().len(),
        legend_layers = preset.checked_legend_nodes().len(),
        "parsed visibility preset"
    );
    Ok(preset)
}

/// Read the `layer` element the cursor is positioned on.
///
/// Returns `Ok(None)` when the policy excludes the layer. A self-closing
/// layer leaves the cursor where it is; a non-empty one, included or not, is
/// consumed up to its own end element.
pub fn extract_layer<C: XmlCursor + ?Sized>(
    cursor: &mut C,
    policy: &dyn InclusionPolicy,
) -> Result<Option<LayerEntry>, PresetError> {
    let node = expect_start(cursor, LAYER)?;
    let visible = node.attribute("visible");
    let entry = if policy.includes(visible) {
        Some(LayerEntry {
            id: required_id(node, LAYER)?,
            style: node.attribute("style").map(str::to_owned),
            visible: TriState::parse(visible),
            expanded: TriState::parse(node.attribute("expanded")),
        })
    } else {
        trace!(
            layer = node.attribute("id").unwrap_or_default(),
            visible,
            policy = policy.name(),
            "layer excluded from theme"
        );
        None
    };
    if !skip_subtree(cursor)? {
        return Err(PresetError::truncated(LAYER));
    }
    Ok(entry)
}

/// Read the `checked-legend-nodes` element the cursor is positioned on and
/// return its layer id with the checked symbol ids in document order.
///
/// A self-closing element yields an empty list without advancing. Otherwise
/// the cursor is left on the element's own end element.
pub fn extract_checked_legend_nodes<C: XmlCursor + ?Sized>(
    cursor: &mut C,
) -> Result<(String, Vec<String>), PresetError> {
    let node = expect_start(cursor, CHECKED_LEGEND_NODES)?;
    let layer_id = node.attribute("id").unwrap_or_default().to_owned();
    if node.is_empty() {
        return Ok((layer_id, Vec::new()));
    }
    let depth = node.depth();
    let ids = collect_child_ids(cursor, CHECKED_LEGEND_NODES, CHECKED_LEGEND_NODE, depth)?;
    if layer_id.is_empty() {
        trace!(symbols = ids.len(), "legend selection without layer id dropped");
        return Ok((layer_id, Vec::new()));
    }
    Ok((layer_id, ids))
}

/// `<checked-group-nodes>` / `<expanded-group-nodes>` wrappers as written by
/// QGIS itself.
fn collect_group_container<C: XmlCursor + ?Sized>(
    cursor: &mut C,
    container: &'static str,
    child: &'static str,
) -> Result<Vec<String>, PresetError> {
    let node = expect_start(cursor, container)?;
    if node.is_empty() {
        return Ok(Vec::new());
    }
    let depth = node.depth();
    collect_child_ids(cursor, container, child, depth)
}

/// Bounded sub-loop: gathers `id`s of `child` start elements one level below
/// `depth` until the end element of `container` at `depth`.
fn collect_child_ids<C: XmlCursor + ?Sized>(
    cursor: &mut C,
    container: &str,
    child: &str,
    depth: usize,
) -> Result<Vec<String>, PresetError> {
    let mut ids = Vec::new();
    loop {
        if !cursor.read()? {
            return Err(PresetError::truncated(container));
        }
        let node = current(cursor, container)?;
        if node.depth() == depth && node.is_end(container) {
            return Ok(ids);
        }
        if node.depth() == depth + 1 && node.is_start(child) {
            if let Some(id) = child_id(node) {
                ids.push(id);
            }
        }
    }
}

fn current<'c, C: XmlCursor + ?Sized>(
    cursor: &'c C,
    within: &str,
) -> Result<&'c XmlNode, PresetError> {
    cursor.node().ok_or_else(|| PresetError::truncated(within))
}

fn expect_start<'c, C: XmlCursor + ?Sized>(
    cursor: &'c C,
    expected: &'static str,
) -> Result<&'c XmlNode, PresetError> {
    match cursor.node() {
        Some(node) if node.is_start(expected) => Ok(node),
        Some(node) => Err(PresetError::UnexpectedNode {
            expected,
            found: match node.kind() {
                NodeKind::Start => format!("<{}>", node.local_name()),
                NodeKind::End => format!("</{}>", node.local_name()),
            },
        }),
        None => Err(PresetError::UnexpectedNode {
            expected,
            found: "no current node".into(),
        }),
    }
}

/// `id` of a group or legend child; id-less children are skipped.
fn child_id(node: &XmlNode) -> Option<String> {
    match node.attribute("id") {
        Some(id) if !id.is_empty() => Some(id.to_owned()),
        _ => {
            trace!(element = node.local_name(), "ignoring child without id");
            None
        }
    }
}

fn required_id(node: &XmlNode, element: &str) -> Result<String, PresetError> {
    match node.attribute("id") {
        Some(id) if !id.is_empty() => Ok(id.to_owned()),
        _ => Err(PresetError::malformed(format!("<{element}> without id"))),
    }
}
