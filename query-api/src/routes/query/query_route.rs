use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::Response};

use query_core::collaborators::Collaborators;
use query_core::{self, driver};

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::lineage::resolve_lineage;

use super::query_request::QueryRequest;
use super::query_response::{ErrorInfoDto, QueryResponseBody, ResponseMetadata, to_response_body};

pub async fn query_route(
    State(state): State<Arc<AppState>>,
    body: Result<Json<QueryRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    use axum::response::IntoResponse;

    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };

    match handle(&state, req).await {
        Ok(response) => ApiResponse::success(response).into_response_with_status(StatusCode::OK),
        Err(err) => err.into_response(),
    }
}

async fn handle(state: &AppState, req: QueryRequest) -> ApiResult<QueryResponseBody> {
    let lineage = match &req.lineage {
        Some(l) => Some(resolve_lineage(&l.collection_id, l.direction, state.hierarchy.as_ref()).await),
        None => None,
    };

    let query = match query_core::parse(&req.path) {
        Ok(q) => q,
        Err(err) => {
            let tag = query_core::error_tag(&err);
            return Ok(QueryResponseBody {
                results: Vec::new(),
                metadata: ResponseMetadata {
                    query: req.path,
                    hops: 0,
                    k: req.k.unwrap_or(state.engine_config.default_k),
                    k_explore: req.k_explore.unwrap_or(state.engine_config.default_k_explore()),
                    candidates_explored: 0,
                    execution_time_ms: 0,
                    error: Some(ErrorInfoDto { tag, reason: err.to_string(), stopped_at_hop: None, partial_path: None }),
                    lineage: lineage.map(|l| l.collection_ids),
                },
            });
        }
    };

    let collab = Collaborators { graph: state.graph.as_ref(), vector: state.vector.as_ref(), embedder: state.embedder.as_ref() };
    let core_response = driver::run(&req.path, &query, req.k, req.k_explore, &state.engine_config, &collab, lineage).await?;

    let mut response = to_response_body(core_response);

    if req.enrich {
        let limit = req.enrich_limit.unwrap_or(response.results.len());
        for entry in response.results.iter_mut().take(limit) {
            entry.content = state.content_store.fetch(&entry.entity.id).await;
        }
    }

    Ok(response)
}
