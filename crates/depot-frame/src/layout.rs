//! Frame layout: node kinds, their attributes, and row counts.
//!
//! A [`FrameLayout`] is immutable once built and shared by the live frame
//! and every snapshot, so a snapshot can always be decoded with the same
//! offsets it was taken with.

use indexmap::IndexMap;

use depot_core::{AttributeId, NodeKindId, NodeSlot};

use crate::error::FrameError;

/// Declared shape of one node kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeKindDef {
    /// Node kind name (usually the entity class).
    pub name: String,
    /// Attribute names; `AttributeId(n)` is `attributes[n]`.
    pub attributes: Vec<String>,
    /// Number of rows (entity instances).
    pub rows: u32,
}

#[derive(Clone, Debug)]
struct KindEntry {
    def: NodeKindDef,
    offset: usize,
}

/// Immutable description of the frame table.
#[derive(Clone, Debug)]
pub struct FrameLayout {
    kinds: IndexMap<String, KindEntry>,
    total_len: usize,
}

impl FrameLayout {
    /// Start building a layout.
    pub fn builder() -> FrameLayoutBuilder {
        FrameLayoutBuilder::default()
    }

    /// Total number of `f32` cells across all node kinds.
    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// Number of declared node kinds.
    pub fn kind_count(&self) -> usize {
        self.kinds.len()
    }

    /// Resolve a node kind by name.
    pub fn node_kind(&self, name: &str) -> Result<NodeKindId, FrameError> {
        self.kinds
            .get_index_of(name)
            .map(|i| NodeKindId(i as u16))
            .ok_or_else(|| FrameError::UnknownNodeKind(name.to_string()))
    }

    /// Resolve an attribute of a node kind by name.
    pub fn attribute(&self, kind: NodeKindId, name: &str) -> Result<AttributeId, FrameError> {
        let entry = self.entry(kind)?;
        entry
            .def
            .attributes
            .iter()
            .position(|a| a == name)
            .map(|i| AttributeId(i as u16))
            .ok_or_else(|| FrameError::UnknownAttribute {
                kind: entry.def.name.clone(),
                attribute: name.to_string(),
            })
    }

    /// The declaration of a node kind.
    pub fn def(&self, kind: NodeKindId) -> Option<&NodeKindDef> {
        self.kinds.get_index(kind.0 as usize).map(|(_, e)| &e.def)
    }

    /// All node kind declarations in id order.
    pub fn defs(&self) -> impl Iterator<Item = (NodeKindId, &NodeKindDef)> {
        self.kinds
            .values()
            .enumerate()
            .map(|(i, e)| (NodeKindId(i as u16), &e.def))
    }

    /// Flat offset of `(slot, attribute)`, or `None` if out of range.
    ///
    /// Rows are stored row-major: all attributes of row 0, then row 1, ...
    pub fn offset(&self, slot: NodeSlot, attribute: AttributeId) -> Option<usize> {
        let (_, entry) = self.kinds.get_index(slot.kind.0 as usize)?;
        let width = entry.def.attributes.len();
        let attr = attribute.0 as usize;
        if slot.index >= entry.def.rows || attr >= width {
            return None;
        }
        Some(entry.offset + slot.index as usize * width + attr)
    }

    fn entry(&self, kind: NodeKindId) -> Result<&KindEntry, FrameError> {
        self.kinds
            .get_index(kind.0 as usize)
            .map(|(_, e)| e)
            .ok_or_else(|| FrameError::UnknownNodeKind(format!("#{}", kind.0)))
    }
}

/// Incremental builder for [`FrameLayout`].
///
/// Node kinds are declared first; rows are then allocated one entity at a
/// time so each entity learns its own [`NodeSlot`].
#[derive(Debug, Default)]
pub struct FrameLayoutBuilder {
    kinds: IndexMap<String, NodeKindDef>,
}

impl FrameLayoutBuilder {
    /// Declare a node kind with its attributes. Starts with zero rows.
    pub fn declare(&mut self, name: &str, attributes: &[&str]) -> Result<NodeKindId, FrameError> {
        if self.kinds.contains_key(name) {
            return Err(FrameError::DuplicateNodeKind(name.to_string()));
        }
        if self.kinds.len() >= u16::MAX as usize {
            return Err(FrameError::LayoutOverflow {
                reason: format!("more than {} node kinds", u16::MAX),
            });
        }
        if attributes.len() > u16::MAX as usize {
            return Err(FrameError::LayoutOverflow {
                reason: format!("node kind '{name}' has {} attributes", attributes.len()),
            });
        }
        let mut seen = Vec::with_capacity(attributes.len());
        for attr in attributes {
            if seen.contains(attr) {
                return Err(FrameError::DuplicateAttribute {
                    kind: name.to_string(),
                    attribute: attr.to_string(),
                });
            }
            seen.push(*attr);
        }
        let id = NodeKindId(self.kinds.len() as u16);
        self.kinds.insert(
            name.to_string(),
            NodeKindDef {
                name: name.to_string(),
                attributes: attributes.iter().map(|a| a.to_string()).collect(),
                rows: 0,
            },
        );
        Ok(id)
    }

    /// Look up an already declared node kind.
    pub fn kind(&self, name: &str) -> Option<NodeKindId> {
        self.kinds.get_index_of(name).map(|i| NodeKindId(i as u16))
    }

    /// Allocate the next row of `kind`.
    pub fn allocate_row(&mut self, kind: NodeKindId) -> Result<NodeSlot, FrameError> {
        let (_, def) = self
            .kinds
            .get_index_mut(kind.0 as usize)
            .ok_or_else(|| FrameError::UnknownNodeKind(format!("#{}", kind.0)))?;
        let index = def.rows;
        def.rows = def.rows.checked_add(1).ok_or_else(|| FrameError::LayoutOverflow {
            reason: format!("node kind '{}' exceeds u32::MAX rows", def.name),
        })?;
        Ok(NodeSlot::new(kind, index))
    }

    /// Freeze the layout and compute block offsets.
    pub fn build(self) -> FrameLayout {
        let mut offset = 0usize;
        let kinds = self
            .kinds
            .into_iter()
            .map(|(name, def)| {
                let len = def.rows as usize * def.attributes.len();
                let entry = KindEntry { def, offset };
                offset += len;
                (name, entry)
            })
            .collect();
        FrameLayout {
            kinds,
            total_len: offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_kind_layout() -> (FrameLayout, NodeKindId, NodeKindId) {
        let mut b = FrameLayout::builder();
        let storage = b.declare("storage", &["stock", "capacity"]).unwrap();
        let consumer = b.declare("consumer", &["demand", "sold", "price"]).unwrap();
        for _ in 0..3 {
            b.allocate_row(storage).unwrap();
        }
        b.allocate_row(consumer).unwrap();
        (b.build(), storage, consumer)
    }

    #[test]
    fn offsets_are_row_major_per_kind() {
        let (layout, storage, consumer) = two_kind_layout();
        assert_eq!(layout.total_len(), 3 * 2 + 3);
        assert_eq!(
            layout.offset(NodeSlot::new(storage, 0), AttributeId(0)),
            Some(0)
        );
        assert_eq!(
            layout.offset(NodeSlot::new(storage, 2), AttributeId(1)),
            Some(5)
        );
        assert_eq!(
            layout.offset(NodeSlot::new(consumer, 0), AttributeId(2)),
            Some(8)
        );
    }

    #[test]
    fn out_of_range_offsets_are_none() {
        let (layout, storage, _) = two_kind_layout();
        assert_eq!(layout.offset(NodeSlot::new(storage, 3), AttributeId(0)), None);
        assert_eq!(layout.offset(NodeSlot::new(storage, 0), AttributeId(2)), None);
        assert_eq!(
            layout.offset(NodeSlot::new(NodeKindId(9), 0), AttributeId(0)),
            None
        );
    }

    #[test]
    fn name_lookups_resolve() {
        let (layout, storage, _) = two_kind_layout();
        assert_eq!(layout.node_kind("storage").unwrap(), storage);
        assert_eq!(layout.attribute(storage, "capacity").unwrap(), AttributeId(1));
        assert!(matches!(
            layout.attribute(storage, "price"),
            Err(FrameError::UnknownAttribute { .. })
        ));
        assert!(matches!(
            layout.node_kind("retailer"),
            Err(FrameError::UnknownNodeKind(_))
        ));
    }

    #[test]
    fn duplicate_declarations_are_rejected() {
        let mut b = FrameLayout::builder();
        b.declare("storage", &["stock"]).unwrap();
        assert_eq!(
            b.declare("storage", &["stock"]),
            Err(FrameError::DuplicateNodeKind("storage".into()))
        );
        assert!(matches!(
            b.declare("manufacture", &["rate", "rate"]),
            Err(FrameError::DuplicateAttribute { .. })
        ));
    }
}
