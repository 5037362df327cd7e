//! End-to-end scenarios against a small fixed graph: George Washington and
//! Thomas Jefferson, both affiliated with the Continental Congress, George
//! Washington born in 1732 and commanding at Yorktown.

use query_core::ast::Direction;
use query_core::collaborators::{GraphEdgeStep, GraphPath, PathEndpoint, PathsResult, VectorHit};
use query_core::config::EngineConfig;
use query_core::model::Entity;
use query_core::path::PathStep;
use query_core::testkit::FakeCollaborators;
use query_core::{driver, parse, QueryError};

fn entity(id: &str, type_tag: &str) -> Entity {
    Entity { id: id.into(), label: id.into(), type_tag: type_tag.into(), properties: Default::default(), source_collections: vec![] }
}

fn one_edge_path(source: &str, predicate: &str, target: &str, source_type: &str, target_type: &str) -> GraphPath {
    GraphPath {
        source_id: source.into(),
        target_id: target.into(),
        edges: vec![GraphEdgeStep {
            from: PathEndpoint { id: source.into(), label: source.into(), type_tag: source_type.into() },
            predicate: predicate.into(),
            to: PathEndpoint { id: target.into(), label: target.into(), type_tag: target_type.into() },
            direction: Direction::Outgoing,
        }],
    }
}

#[tokio::test]
async fn scenario_1_single_hop_reaches_birth_date() {
    let fakes = FakeCollaborators::new()
        .with_entity(entity("gw", "person"))
        .with_entity(entity("d1732", "date"))
        .push_reachable(PathsResult { paths: vec![one_edge_path("gw", "BORN_ON", "d1732", "person", "date")], truncated: false });
    let collab = fakes.as_collaborators();
    let config = EngineConfig::default();

    let query = parse("@gw -[born,birth]-> type:date").unwrap();
    let response = driver::run("@gw -[born,birth]-> type:date", &query, None, None, &config, &collab, None).await.unwrap();

    assert!(response.error.is_none());
    assert_eq!(response.results.len(), 1);
    let result = &response.results[0];
    assert!(result.score > 0.0 && result.score <= 1.0);
    let predicate = result
        .steps
        .iter()
        .find_map(|s| match s {
            PathStep::Edge(e) => Some(e.predicate.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(predicate, "BORN_ON");
}

#[tokio::test]
async fn scenario_2_two_hop_through_organization_reaches_unique_peer() {
    let fakes = FakeCollaborators::new()
        .with_entity(entity("gw", "person"))
        .with_entity(entity("tj", "person"))
        .with_entity(entity("cc", "organization"))
        .push_reachable(PathsResult { paths: vec![one_edge_path("gw", "AFFILIATED_WITH", "cc", "person", "organization")], truncated: false })
        .push_reachable(PathsResult {
            paths: vec![
                one_edge_path("cc", "AFFILIATED_WITH", "gw", "organization", "person"),
                one_edge_path("cc", "AFFILIATED_WITH", "tj", "organization", "person"),
            ],
            truncated: false,
        });
    let collab = fakes.as_collaborators();
    let config = EngineConfig::default();

    let src = "@gw -[affiliated]-> type:organization <-[affiliated]- type:person";
    let query = parse(src).unwrap();
    let response = driver::run(src, &query, None, None, &config, &collab, None).await.unwrap();

    assert!(response.error.is_none());
    let ids: Vec<&str> = response
        .results
        .iter()
        .map(|r| match r.steps.last().unwrap() {
            PathStep::Entity(e) => e.id.as_str(),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(ids, vec!["tj"]);
    assert_eq!(response.results[0].steps.iter().filter(|s| matches!(s, PathStep::Edge(_))).count(), 2);
}

#[tokio::test]
async fn scenario_3_semantic_event_hop_ranks_yorktown_first() {
    let fakes = FakeCollaborators::new()
        .with_entity(entity("gw", "person"))
        .with_entity(entity("yorktown", "event"))
        .push_query_hits(vec![VectorHit { id: "yorktown".into(), score: 0.8 }])
        .push_paths(PathsResult { paths: vec![one_edge_path("gw", "COMMANDED", "yorktown", "person", "event")], truncated: false });
    let collab = fakes.as_collaborators();
    let config = EngineConfig::default();

    let src = r#"@gw -[*]-> type:event ~ "military battle war""#;
    let query = parse(src).unwrap();
    let response = driver::run(src, &query, None, None, &config, &collab, None).await.unwrap();

    assert!(response.error.is_none());
    assert_eq!(response.results.len(), 1);
    match response.results[0].steps.last().unwrap() {
        PathStep::Entity(e) => assert_eq!(e.id, "yorktown"),
        _ => unreachable!(),
    }
    assert!((response.results[0].score - 0.9).abs() < 1e-6);
}

#[tokio::test]
async fn scenario_4_zero_hop_type_filter_skips_graph_store() {
    let fakes = FakeCollaborators::new()
        .with_entity(entity("doc", "document"))
        .push_query_hits(vec![VectorHit { id: "doc".into(), score: 0.75 }]);
    let collab = fakes.as_collaborators();
    let config = EngineConfig::default();

    let src = r#""declaration of independence" type:document"#;
    let query = parse(src).unwrap();
    let response = driver::run(src, &query, None, None, &config, &collab, None).await.unwrap();

    assert!(response.error.is_none());
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].score, 0.75);
}

#[test]
fn scenario_5_type_only_entry_with_a_hop_is_rejected_before_any_call() {
    let err = parse("type:person -[*]-> type:file").unwrap_err();
    assert!(matches!(err, QueryError::InvalidEntryPoint));
}

#[test]
fn scenario_6_fuzzy_relation_with_variable_depth_is_rejected_before_any_call() {
    let err = parse(r#"@gw -[photographed]{,3}-> type:person"#).unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedQuery { hop_index: 0, .. }));
}
