//! Lineage resolution (spec.md GLOSSARY "Lineage scoping", SPEC_FULL.md
//! §15): turns a `{collection_id, direction}` request into the transitive
//! collection-id set the core's collaborator calls are restricted to.
//! Shaped like the engine's own triad traversal (a bounded walk over a
//! graph) but over the much smaller collection hierarchy.

use std::collections::{HashMap, HashSet, VecDeque};

use query_core::collaborators::BoxFuture;
use query_core::model::LineageScope;
use serde::Deserialize;

/// Ancestor/descendant access to the collection hierarchy.
pub trait CollectionHierarchy: Send + Sync {
    fn parent<'a>(&'a self, collection_id: &'a str) -> BoxFuture<'a, Option<String>>;
    fn children<'a>(&'a self, collection_id: &'a str) -> BoxFuture<'a, Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineageDirection {
    Ancestors,
    Descendants,
    Both,
}

/// Walk the hierarchy from `collection_id` in `direction`, bounded so a
/// cyclic or pathological hierarchy can't loop forever, and build the
/// scope the driver threads through every collaborator call.
pub async fn resolve_lineage(
    collection_id: &str,
    direction: LineageDirection,
    hierarchy: &dyn CollectionHierarchy,
) -> LineageScope {
    let mut collection_ids = vec![collection_id.to_string()];

    if matches!(direction, LineageDirection::Ancestors | LineageDirection::Both) {
        let mut current = collection_id.to_string();
        let mut seen: HashSet<String> = HashSet::from([current.clone()]);
        while let Some(parent) = hierarchy.parent(&current).await {
            if !seen.insert(parent.clone()) {
                break;
            }
            collection_ids.push(parent.clone());
            current = parent;
        }
    }

    if matches!(direction, LineageDirection::Descendants | LineageDirection::Both) {
        let mut visited: HashSet<String> = HashSet::from([collection_id.to_string()]);
        let mut queue: VecDeque<String> = VecDeque::from([collection_id.to_string()]);
        while let Some(id) = queue.pop_front() {
            for child in hierarchy.children(&id).await {
                if visited.insert(child.clone()) {
                    collection_ids.push(child.clone());
                    queue.push_back(child);
                }
            }
        }
    }

    LineageScope { collection_ids }
}

/// A hierarchy held as a plain parent map, for tests and small deployments.
#[derive(Default)]
pub struct InMemoryHierarchy {
    parents: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,
}

impl InMemoryHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_child(mut self, parent_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        let (parent_id, child_id) = (parent_id.into(), child_id.into());
        self.parents.insert(child_id.clone(), parent_id.clone());
        self.children.entry(parent_id).or_default().push(child_id);
        self
    }
}

impl CollectionHierarchy for InMemoryHierarchy {
    fn parent<'a>(&'a self, collection_id: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move { self.parents.get(collection_id).cloned() })
    }

    fn children<'a>(&'a self, collection_id: &'a str) -> BoxFuture<'a, Vec<String>> {
        Box::pin(async move { self.children.get(collection_id).cloned().unwrap_or_default() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> InMemoryHierarchy {
        InMemoryHierarchy::new()
            .with_child("root", "archive")
            .with_child("archive", "box-1")
            .with_child("box-1", "folder-a")
    }

    #[tokio::test]
    async fn ancestors_walks_up_to_the_root() {
        let h = fixture();
        let scope = resolve_lineage("box-1", LineageDirection::Ancestors, &h).await;
        assert_eq!(HashSet::<&str>::from_iter(scope.collection_ids.iter().map(String::as_str)), HashSet::from(["box-1", "archive", "root"]));
    }

    #[tokio::test]
    async fn descendants_walks_down_the_whole_subtree() {
        let h = fixture();
        let scope = resolve_lineage("archive", LineageDirection::Descendants, &h).await;
        assert_eq!(
            HashSet::<&str>::from_iter(scope.collection_ids.iter().map(String::as_str)),
            HashSet::from(["archive", "box-1", "folder-a"])
        );
    }

    #[tokio::test]
    async fn both_directions_cover_ancestors_and_descendants() {
        let h = fixture();
        let scope = resolve_lineage("archive", LineageDirection::Both, &h).await;
        assert_eq!(
            HashSet::<&str>::from_iter(scope.collection_ids.iter().map(String::as_str)),
            HashSet::from(["archive", "root", "box-1", "folder-a"])
        );
    }

    #[tokio::test]
    async fn leaf_with_no_relatives_resolves_to_itself() {
        let h = InMemoryHierarchy::new();
        let scope = resolve_lineage("isolated", LineageDirection::Both, &h).await;
        assert_eq!(scope.collection_ids, vec!["isolated".to_string()]);
    }
}
