use serde::Deserialize;

use crate::lineage::LineageDirection;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub path: String,
    pub k: Option<usize>,
    pub k_explore: Option<usize>,
    pub lineage: Option<LineageRequest>,
    #[serde(default)]
    pub enrich: bool,
    pub enrich_limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LineageRequest {
    pub collection_id: String,
    pub direction: LineageDirection,
}
