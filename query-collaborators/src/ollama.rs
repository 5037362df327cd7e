//! Ollama-backed `Embedder`.
//!
//! `rag-store`'s `OllamaEmbedder` calls `/api/embeddings` once per prompt —
//! the endpoint is not natively batched. This adapter keeps that one-prompt
//! contract but fires the batch concurrently with `futures::future::join_all`
//! rather than sequentially, since the engine's `Embedder::embed` takes a
//! slice of texts per call (a hop's fuzzy-relation rescore can ask for
//! several embeddings at once).

use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use query_core::collaborators::{BoxFuture, CollabResult, CollaboratorError, Embedder};

#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server (e.g. http://localhost:11434).
    pub url: String,
    pub model: String,
    pub dim: usize,
}

#[derive(Clone)]
pub struct OllamaEmbedder {
    client: Client,
    config: OllamaConfig,
}

impl OllamaConfig {
    /// Reads `QP_OLLAMA_URL`, `QP_OLLAMA_MODEL`, `QP_OLLAMA_DIM` from the
    /// environment, defaulting to a local Ollama instance running `nomic-embed-text`.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("QP_OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: std::env::var("QP_OLLAMA_MODEL").unwrap_or_else(|_| "nomic-embed-text".to_string()),
            dim: std::env::var("QP_OLLAMA_DIM").ok().and_then(|v| v.parse().ok()).unwrap_or(768),
        }
    }
}

impl OllamaEmbedder {
    pub fn new(config: OllamaConfig) -> Self {
        Self { client: Client::new(), config }
    }

    async fn embed_one(&self, text: &str) -> CollabResult<Vec<f32>> {
        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct Response {
            embedding: Vec<f32>,
        }

        let req = Request { model: &self.config.model, prompt: text };

        let resp = self
            .client
            .post(format!("{}/api/embeddings", self.config.url))
            .json(&req)
            .send()
            .await
            .map_err(|e| CollaboratorError::new(format!("ollama request failed: {e}")))?
            .error_for_status()
            .map_err(|e| CollaboratorError::new(format!("ollama http error: {e}")))?;

        let parsed: Response = resp
            .json()
            .await
            .map_err(|e| CollaboratorError::new(format!("ollama json parse failed: {e}")))?;

        if parsed.embedding.len() != self.config.dim {
            return Err(CollaboratorError::new(format!(
                "ollama embedding dimension mismatch: got {}, want {}",
                parsed.embedding.len(),
                self.config.dim
            )));
        }

        Ok(parsed.embedding)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, CollabResult<Vec<Vec<f32>>>> {
        Box::pin(async move {
            let results = join_all(texts.iter().map(|t| self.embed_one(t))).await;
            results.into_iter().collect()
        })
    }
}
