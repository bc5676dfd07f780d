//! External intelligence capabilities and their local fallbacks.
//!
//! Entity extraction and semantic similarity are optional services the
//! engine can lean on. Both are defined as traits so callers never depend
//! on a concrete transport; [`HttpAiService`] implements them over a
//! sidecar HTTP API and [`KeywordExtractor`] provides a self-contained
//! keyword heuristic for extraction when no service is configured.

use std::collections::BTreeMap;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::error::CapabilityError;

pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Entities grouped by kind ("people", "organizations", "topics", ...),
/// deduplicated within each kind.
pub type ExtractedEntities = BTreeMap<String, Vec<String>>;

/// One candidate scored by a similarity ranker.
#[derive(Debug, Clone, Deserialize)]
pub struct RankedCandidate {
    pub id: String,
    pub score: f64,
}

/// Extracts named entities from free text.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> CapabilityResult<ExtractedEntities>;
}

/// Ranks candidate documents by semantic similarity to a query.
///
/// Candidates are `(id, text)` pairs; the returned scores reference
/// candidates by id. The ranker may omit candidates it cannot score.
pub trait SimilarityRanker: Send + Sync {
    fn rank(
        &self,
        query: &str,
        candidates: &[(String, String)],
    ) -> CapabilityResult<Vec<RankedCandidate>>;
}

// ---------------------------------------------------------------------------
// HTTP-backed service
// ---------------------------------------------------------------------------

/// Client for a sidecar AI service exposing extraction and similarity
/// endpoints. All transport failures surface as
/// [`CapabilityError::ServiceUnavailable`] so callers can degrade.
pub struct HttpAiService {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpAiService {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into();
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        service: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> CapabilityResult<T> {
        let url = format!("{}{path}", self.base_url);
        let resp = self.agent.post(&url).send_json(body).map_err(|e| {
            CapabilityError::ServiceUnavailable {
                service: service.to_string(),
                message: e.to_string(),
            }
        })?;
        resp.into_json().map_err(|e| CapabilityError::InvalidResponse {
            service: service.to_string(),
            message: format!("failed to parse JSON: {e}"),
        })
    }
}

impl std::fmt::Debug for HttpAiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAiService")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl EntityExtractor for HttpAiService {
    fn extract(&self, text: &str) -> CapabilityResult<ExtractedEntities> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            entities: ExtractedEntities,
        }
        let resp: Resp = self.post_json(
            "entity-extraction",
            "/api/entities/extract",
            &json!({ "text": text }),
        )?;
        Ok(resp.entities)
    }
}

/// One scored document in the similarity service's response. Extra fields
/// (`document`, `rank`, ...) are ignored; the two we need are mandatory so
/// a shape mismatch fails the parse instead of silently scoring zero.
#[derive(Debug, Deserialize)]
struct SimilarityResult {
    document_index: usize,
    similarity_score: f64,
}

#[derive(Debug, Deserialize)]
struct SimilarityResponse {
    results: Vec<SimilarityResult>,
}

impl SimilarityResponse {
    /// Resolve document indices back to candidate ids, dropping entries
    /// that point outside the candidate list.
    fn into_candidates(self, candidates: &[(String, String)]) -> Vec<RankedCandidate> {
        self.results
            .into_iter()
            .filter_map(|entry| {
                candidates
                    .get(entry.document_index)
                    .map(|(id, _)| RankedCandidate {
                        id: id.clone(),
                        score: entry.similarity_score,
                    })
            })
            .collect()
    }
}

impl SimilarityRanker for HttpAiService {
    fn rank(
        &self,
        query: &str,
        candidates: &[(String, String)],
    ) -> CapabilityResult<Vec<RankedCandidate>> {
        let documents: Vec<&str> = candidates.iter().map(|(_, text)| text.as_str()).collect();
        // The service truncates to top_k (default 5, max 50); ask for
        // every candidate so callers control truncation.
        let resp: SimilarityResponse = self.post_json(
            "similarity",
            "/api/similarity",
            &json!({
                "query": query,
                "documents": documents,
                "top_k": candidates.len().clamp(1, 50),
            }),
        )?;
        Ok(resp.into_candidates(candidates))
    }
}

// ---------------------------------------------------------------------------
// Keyword fallback extractor
// ---------------------------------------------------------------------------

/// Self-contained entity extractor using capitalization and keyword
/// heuristics. Infallible, so it is the default when no AI service is
/// configured.
pub struct KeywordExtractor {
    person_pattern: Regex,
    org_keywords: Vec<&'static str>,
    topic_keywords: Vec<&'static str>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordExtractor {
    pub fn new() -> Self {
        // Two adjacent capitalized words look like a personal name.
        let person_pattern = Regex::new(r"\b[A-Z][a-z]+ [A-Z][a-z]+\b")
            .unwrap_or_else(|_| unreachable!("pattern is a valid literal"));
        Self {
            person_pattern,
            org_keywords: vec![
                "google",
                "microsoft",
                "apple",
                "amazon",
                "meta",
                "openai",
                "anthropic",
                "nvidia",
                "tesla",
                "netflix",
            ],
            topic_keywords: vec![
                "ai",
                "machine learning",
                "rust",
                "python",
                "javascript",
                "blockchain",
                "security",
                "cloud",
                "database",
                "climate",
                "energy",
                "health",
            ],
        }
    }
}

impl EntityExtractor for KeywordExtractor {
    fn extract(&self, text: &str) -> CapabilityResult<ExtractedEntities> {
        let lowered = text.to_lowercase();
        let mut entities = ExtractedEntities::new();

        let mut people: Vec<String> = self
            .person_pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
        people.sort();
        people.dedup();
        if !people.is_empty() {
            entities.insert("people".to_string(), people);
        }

        let orgs: Vec<String> = self
            .org_keywords
            .iter()
            .filter(|kw| lowered.contains(*kw))
            .map(|kw| kw.to_string())
            .collect();
        if !orgs.is_empty() {
            entities.insert("organizations".to_string(), orgs);
        }

        let topics: Vec<String> = self
            .topic_keywords
            .iter()
            .filter(|kw| lowered.contains(*kw))
            .map(|kw| kw.to_string())
            .collect();
        if !topics.is_empty() {
            entities.insert("topics".to_string(), topics);
        }

        Ok(entities)
    }
}
