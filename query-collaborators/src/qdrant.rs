//! Qdrant-backed `VectorIndex`, built the same way `rag-base::vector_db`
//! wraps the modern builder API: connect once, search/upsert through typed
//! request builders, map `ScoredPoint`s back into our own hit type.

use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, Filter as QdrantFilter, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder, point_id::PointIdOptions,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;

use query_core::collaborators::{BoxFuture, CollabResult, CollaboratorError, VectorHit, VectorIndex};
use query_core::model::LineageScope;

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
    pub vector_dim: u64,
}

/// Payload key the collection is expected to carry so `rank_among` and
/// lineage scoping can filter without a second round-trip to the graph
/// store.
const ID_KEY: &str = "entity_id";
const COLLECTION_KEY: &str = "source_collection";

pub struct QdrantVectorIndex {
    client: Qdrant,
    config: QdrantConfig,
}

impl QdrantConfig {
    /// Reads `QP_QDRANT_URL`, `QP_QDRANT_COLLECTION`, `QP_QDRANT_DIM` from
    /// the environment.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("QP_QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".to_string()),
            collection: std::env::var("QP_QDRANT_COLLECTION").unwrap_or_else(|_| "path_query_entities".to_string()),
            vector_dim: std::env::var("QP_QDRANT_DIM").ok().and_then(|v| v.parse().ok()).unwrap_or(768),
        }
    }
}

impl QdrantVectorIndex {
    pub fn connect(config: QdrantConfig) -> Result<Self, CollaboratorError> {
        let client = Qdrant::from_url(&config.url)
            .build()
            .map_err(|e| CollaboratorError::new(format!("qdrant client build: {e}")))?;
        Ok(Self { client, config })
    }

    /// Drop and recreate the collection with the configured vector size —
    /// used by setup/seed tooling, never by query execution itself.
    pub async fn reset_collection(&self) -> Result<(), CollaboratorError> {
        let _ = self.client.delete_collection(&self.config.collection).await;
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.config.collection)
                    .vectors_config(VectorParamsBuilder::new(self.config.vector_dim, Distance::Cosine)),
            )
            .await
            .map_err(|e| CollaboratorError::new(format!("create_collection: {e}")))?;
        Ok(())
    }

    pub async fn upsert(&self, entity_id: &str, vector: Vec<f32>, type_tag: &str, source_collection: &str) -> Result<(), CollaboratorError> {
        let payload: Payload = json!({ ID_KEY: entity_id, "type_tag": type_tag, COLLECTION_KEY: source_collection })
            .try_into()
            .map_err(|e| CollaboratorError::new(format!("payload convert: {e}")))?;
        let point = PointStruct::new(entity_id.to_string(), vector, payload);
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.config.collection, vec![point]))
            .await
            .map_err(|e| CollaboratorError::new(format!("upsert_points: {e}")))?;
        Ok(())
    }
}

fn lineage_filter(lineage: Option<&LineageScope>) -> Option<QdrantFilter> {
    let scope = lineage?;
    Some(QdrantFilter::should(
        scope
            .collection_ids
            .iter()
            .map(|c| qdrant_client::qdrant::Condition::matches(COLLECTION_KEY, c.clone()))
            .collect::<Vec<_>>(),
    ))
}

fn type_filter(types: Option<&[String]>) -> Option<QdrantFilter> {
    let types = types?;
    Some(QdrantFilter::should(
        types
            .iter()
            .map(|t| qdrant_client::qdrant::Condition::matches("type_tag", t.clone()))
            .collect::<Vec<_>>(),
    ))
}

fn map_scored_point(sp: qdrant_client::qdrant::ScoredPoint) -> VectorHit {
    let id = sp
        .payload
        .get(ID_KEY)
        .and_then(|v| v.clone().into_json().as_str().map(str::to_owned))
        .or_else(|| {
            sp.id.and_then(|pid| match pid.point_id_options {
                Some(PointIdOptions::Uuid(s)) => Some(s),
                Some(PointIdOptions::Num(n)) => Some(n.to_string()),
                None => None,
            })
        })
        .unwrap_or_default();
    VectorHit { id, score: sp.score }
}

impl VectorIndex for QdrantVectorIndex {
    fn query_by_embedding<'a>(
        &'a self,
        embedding: &'a [f32],
        k: usize,
        types: Option<&'a [String]>,
        lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<Vec<VectorHit>>> {
        Box::pin(async move {
            let mut conditions = Vec::new();
            if let Some(f) = type_filter(types) {
                conditions.push(qdrant_client::qdrant::Condition::from(f));
            }
            if let Some(f) = lineage_filter(lineage) {
                conditions.push(qdrant_client::qdrant::Condition::from(f));
            }
            let mut builder = SearchPointsBuilder::new(&self.config.collection, embedding.to_vec(), k as u64).with_payload(true);
            if !conditions.is_empty() {
                builder = builder.filter(QdrantFilter::must(conditions));
            }
            let resp = self
                .client
                .search_points(builder)
                .await
                .map_err(|e| CollaboratorError::new(format!("search_points: {e}")))?;
            Ok(resp.result.into_iter().map(map_scored_point).collect())
        })
    }

    fn rank_among<'a>(&'a self, ids: &'a [String], embedding: &'a [f32]) -> BoxFuture<'a, CollabResult<Vec<VectorHit>>> {
        Box::pin(async move {
            let filter = QdrantFilter::should(
                ids.iter().map(|id| qdrant_client::qdrant::Condition::matches(ID_KEY, id.clone())).collect::<Vec<_>>(),
            );
            let builder = SearchPointsBuilder::new(&self.config.collection, embedding.to_vec(), ids.len() as u64)
                .with_payload(true)
                .filter(filter);
            let resp = self
                .client
                .search_points(builder)
                .await
                .map_err(|e| CollaboratorError::new(format!("search_points: {e}")))?;
            Ok(resp.result.into_iter().map(map_scored_point).collect())
        })
    }

    fn sample_by_type<'a>(
        &'a self,
        types: &'a [String],
        k: usize,
        lineage: Option<&'a LineageScope>,
    ) -> BoxFuture<'a, CollabResult<Vec<VectorHit>>> {
        Box::pin(async move {
            let mut conditions = Vec::new();
            if let Some(f) = type_filter(Some(types)) {
                conditions.push(qdrant_client::qdrant::Condition::from(f));
            }
            if let Some(f) = lineage_filter(lineage) {
                conditions.push(qdrant_client::qdrant::Condition::from(f));
            }
            let filter = QdrantFilter::must(conditions);
            let resp = self
                .client
                .scroll(
                    qdrant_client::qdrant::ScrollPointsBuilder::new(&self.config.collection)
                        .filter(filter)
                        .limit(k as u32)
                        .with_payload(true),
                )
                .await
                .map_err(|e| CollaboratorError::new(format!("scroll: {e}")))?;
            Ok(resp
                .result
                .into_iter()
                .map(|p| {
                    let id = p
                        .payload
                        .get(ID_KEY)
                        .and_then(|v| v.clone().into_json().as_str().map(str::to_owned))
                        .unwrap_or_default();
                    VectorHit { id, score: 1.0 }
                })
                .collect())
        })
    }
}
