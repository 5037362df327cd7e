use serde::Serialize;

use query_core::ast::Direction;
use query_core::driver::{ErrorInfo, QueryResponse as CoreQueryResponse, ResultPath};
use query_core::path::PathStep;

#[derive(Debug, Serialize)]
pub struct QueryResponseBody {
    pub results: Vec<ResultEntry>,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Serialize)]
pub struct ResultEntry {
    pub entity: EntityDto,
    pub path: Vec<PathStepDto>,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntityDto {
    pub id: String,
    pub label: String,
    pub type_tag: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathStepDto {
    Entity { id: String, label: String, type_tag: String, score: Option<f32> },
    Edge { predicate: String, direction: &'static str, score: Option<f32>, no_path_found: bool },
}

#[derive(Debug, Serialize)]
pub struct ResponseMetadata {
    pub query: String,
    pub hops: usize,
    pub k: usize,
    pub k_explore: usize,
    pub candidates_explored: usize,
    pub execution_time_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfoDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineage: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ErrorInfoDto {
    pub tag: &'static str,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at_hop: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_path: Option<ResultEntry>,
}

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Outgoing => "outgoing",
        Direction::Incoming => "incoming",
        Direction::Bidirectional => "bidirectional",
    }
}

pub fn to_result_entry(result: ResultPath) -> ResultEntry {
    let score = result.score;
    let path: Vec<PathStepDto> = result
        .steps
        .iter()
        .map(|step| match step {
            PathStep::Entity(e) => PathStepDto::Entity { id: e.id.clone(), label: e.label.clone(), type_tag: e.type_tag.clone(), score: e.score },
            PathStep::Edge(e) => PathStepDto::Edge {
                predicate: e.predicate.clone(),
                direction: direction_label(e.direction),
                score: e.score,
                no_path_found: e.no_path_found,
            },
        })
        .collect();

    let entity = result
        .steps
        .iter()
        .rev()
        .find_map(|step| match step {
            PathStep::Entity(e) => Some(EntityDto { id: e.id.clone(), label: e.label.clone(), type_tag: e.type_tag.clone() }),
            _ => None,
        })
        .expect("a result path always ends on an entity step");

    ResultEntry { entity, path, score, content: None }
}

fn to_error_info_dto(err: ErrorInfo) -> ErrorInfoDto {
    ErrorInfoDto { tag: err.tag, reason: err.reason, stopped_at_hop: err.stopped_at_hop, partial_path: err.partial_path.map(to_result_entry) }
}

pub fn to_response_body(response: CoreQueryResponse) -> QueryResponseBody {
    QueryResponseBody {
        results: response.results.into_iter().map(to_result_entry).collect(),
        metadata: ResponseMetadata {
            query: response.query,
            hops: response.hops,
            k: response.k,
            k_explore: response.k_explore,
            candidates_explored: response.candidates_explored,
            execution_time_ms: response.execution_time.as_millis(),
            error: response.error.map(to_error_info_dto),
            lineage: response.lineage.map(|l| l.collection_ids),
        },
    }
}
