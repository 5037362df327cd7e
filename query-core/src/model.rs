//! Graph data model (spec §3). Properties are an opaque bag: the core never
//! interprets their contents, only carries them through to the response.

use std::collections::BTreeMap;

pub type Properties = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub label: String,
    pub type_tag: String,
    pub properties: Properties,
    pub source_collections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub subject_id: String,
    pub predicate: String,
    pub object_id: String,
    pub properties: Properties,
    pub source_collection: String,
}

/// Outgoing/incoming edges for a single node, as returned by the graph store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipSet {
    pub outgoing: Vec<Relationship>,
    pub incoming: Vec<Relationship>,
}

/// A transitive collection-id set that every collaborator call is restricted
/// to when lineage scoping is in effect (spec §4.3, GLOSSARY).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageScope {
    pub collection_ids: Vec<String>,
}

impl LineageScope {
    pub fn allows(&self, source_collections: &[String]) -> bool {
        source_collections.iter().any(|c| self.collection_ids.contains(c))
    }
}
