use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::LinkType;
use super::block::interface_description_block;
use super::error::EncodeError;

/// One registered capture interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRegistration {
    pub name: String,
    pub index: u32,
    pub link_type: LinkType,
}

/// Interface names mapped to Enhanced Packet Block interface ids.
///
/// Indices are assigned in first-seen order starting at 0 and never reused.
/// The encoded Interface Description Blocks are cached in the same order so
/// they can be re-sent at the start of every section.
#[derive(Debug, Default)]
pub struct InterfaceRegistry {
    entries: Vec<InterfaceRegistration>,
    by_name: HashMap<String, u32>,
    blocks: Vec<u8>,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, registering it with `link_type` on first sight.
    ///
    /// The link type of an already registered interface is not changed.
    pub fn resolve(&mut self, name: &str, link_type: LinkType) -> Result<u32, EncodeError> {
        if let Some(index) = self.by_name.get(name) {
            return Ok(*index);
        }
        let block = interface_description_block(name, link_type)?;
        let index = self.entries.len() as u32;
        debug!("registered interface {name} as #{index} ({link_type:?})");
        self.blocks.extend_from_slice(&block);
        self.by_name.insert(name.to_string(), index);
        self.entries.push(InterfaceRegistration {
            name: name.to_string(),
            index,
            link_type,
        });
        Ok(index)
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Concatenated Interface Description Blocks, in index order.
    pub fn description_blocks(&self) -> &[u8] {
        &self.blocks
    }

    pub fn registrations(&self) -> &[InterfaceRegistration] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::InterfaceRegistry;
    use crate::pcapng::LinkType;
    use crate::pcapng::block::interface_description_block;

    #[test]
    fn indices_follow_first_seen_order() {
        let mut registry = InterfaceRegistry::new();
        assert_eq!(registry.resolve("port2", LinkType::Ethernet).unwrap(), 0);
        assert_eq!(registry.resolve("port1", LinkType::Ethernet).unwrap(), 1);
        assert_eq!(registry.resolve("port2", LinkType::Ethernet).unwrap(), 0);
        assert_eq!(registry.resolve("wan", LinkType::Null).unwrap(), 2);

        let names: Vec<_> = registry
            .registrations()
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(names, ["port2", "port1", "wan"]);
        assert_eq!(registry.index_of("port1"), Some(1));
        assert_eq!(registry.index_of("missing"), None);
    }

    #[test]
    fn first_link_type_wins() {
        let mut registry = InterfaceRegistry::new();
        registry.resolve("ppp0", LinkType::Ppp).unwrap();
        registry.resolve("ppp0", LinkType::Ethernet).unwrap();
        assert_eq!(registry.registrations()[0].link_type, LinkType::Ppp);
    }

    #[test]
    fn description_blocks_are_concatenated_in_order() {
        let mut registry = InterfaceRegistry::new();
        registry.resolve("a", LinkType::Ethernet).unwrap();
        registry.resolve("b", LinkType::Raw).unwrap();
        let mut expected = interface_description_block("a", LinkType::Ethernet).unwrap();
        expected.extend(interface_description_block("b", LinkType::Raw).unwrap());
        assert_eq!(registry.description_blocks(), expected.as_slice());
        assert_eq!(registry.len(), 2);
    }
}
