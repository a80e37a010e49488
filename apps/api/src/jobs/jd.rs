//! Job profiles: LLM extraction from raw JD text, persistence, and the
//! process-wide TTL cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ACTIVE_JOB_COLLECTION, JOB_HEADERS};
use crate::errors::AppError;
use crate::jobs::prompts::JD_EXTRACT_PROMPT;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::store::TabularStore;

/// Default TTL for the job-profile cache.
pub const JOB_CACHE_TTL: Duration = Duration::from_secs(300);

/// One job's requirement profile, keyed by title.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct JobProfile {
    pub title: String,
    pub description: String,
    pub skills: String,
    pub top_projects: String,
}

impl JobProfile {
    pub fn is_empty(&self) -> bool {
        self.description.is_empty() && self.skills.is_empty() && self.top_projects.is_empty()
    }

    /// Renders the profile as the scoring prompt's JD context block.
    pub fn as_context(&self) -> String {
        format!(
            "Job Description: {}\n\nCRITICAL Required Skills: {}\n\nCRITICAL Reference Projects: {}",
            self.description, self.skills, self.top_projects
        )
    }
}

/// Structured requirements extracted from raw JD text. Every field defaults
/// so minor model drift never rejects the payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JdRequirements {
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub tools_tech: Vec<String>,
    #[serde(default)]
    pub min_experience: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub must_have: Vec<String>,
    #[serde(default)]
    pub good_to_have: Vec<String>,
}

/// Extracts structured requirements from a raw JD and appends the profile
/// row to the job collection. Callers must invalidate the cache afterwards.
pub async fn extract_and_store_jd(
    llm: &LlmClient,
    store: &dyn TabularStore,
    jd_text: &str,
) -> Result<JdRequirements, AppError> {
    let prompt = JD_EXTRACT_PROMPT.replace("{jd_text}", jd_text);
    let requirements: JdRequirements = llm
        .call_json(&prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("JD extraction failed: {e}")))?;

    let title = if requirements.job_title.is_empty() {
        "Unknown Role".to_string()
    } else {
        requirements.job_title.clone()
    };

    let row = vec![
        title,
        requirements.responsibilities.join("\n"),
        requirements.required_skills.join(", "),
        format!("MUST HAVE: {}", requirements.must_have.join(", ")),
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    ];

    store
        .ensure_collection(ACTIVE_JOB_COLLECTION, Some(&JOB_HEADERS))
        .await?;
    store
        .append(&format!("{ACTIVE_JOB_COLLECTION}!A:E"), vec![row])
        .await?;

    info!(title = %requirements.job_title, "job profile stored");
    Ok(requirements)
}

struct CacheSlot {
    loaded_at: Instant,
    map: HashMap<String, JobProfile>,
}

/// Process-wide job-profile cache with a fixed TTL and explicit
/// invalidation (fired on JD submission).
pub struct JobCache {
    ttl: Duration,
    slot: Mutex<Option<CacheSlot>>,
}

impl JobCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub async fn get(
        &self,
        store: &dyn TabularStore,
    ) -> Result<HashMap<String, JobProfile>, AppError> {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Ok(cached.map.clone());
            }
        }

        let rows = store.read(&format!("{ACTIVE_JOB_COLLECTION}!A:E")).await?;
        let map = parse_job_rows(&rows);
        debug!(jobs = map.len(), "refreshed job profile cache");
        *slot = Some(CacheSlot {
            loaded_at: Instant::now(),
            map: map.clone(),
        });
        Ok(map)
    }

    /// Sorted, deduplicated job titles.
    pub async fn titles(&self, store: &dyn TabularStore) -> Result<Vec<String>, AppError> {
        let map = self.get(store).await?;
        let mut titles: Vec<String> = map.into_keys().collect();
        titles.sort();
        Ok(titles)
    }

    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
        debug!("job profile cache invalidated");
    }
}

/// Builds the title → profile map from raw collection rows. Columns are
/// located by header name with positional fallback, so a hand-edited sheet
/// with reordered columns still parses.
fn parse_job_rows(rows: &[Vec<String>]) -> HashMap<String, JobProfile> {
    let mut map = HashMap::new();
    let Some(header) = rows.first() else {
        return map;
    };

    let mut idx_title = None;
    let mut idx_desc = None;
    let mut idx_skills = None;
    let mut idx_projects = None;

    for (i, col) in header.iter().enumerate() {
        let col = col.trim().to_lowercase();
        if col.contains("title") || col.contains("role") {
            idx_title.get_or_insert(i);
        } else if col.contains("description") || col.contains("jd") {
            idx_desc.get_or_insert(i);
        } else if col.contains("skills") {
            idx_skills.get_or_insert(i);
        } else if col.contains("project") {
            idx_projects.get_or_insert(i);
        }
    }

    let idx_title = idx_title.unwrap_or(0);
    let idx_desc = idx_desc.unwrap_or(1);
    let idx_skills = idx_skills.unwrap_or(2);
    let idx_projects = idx_projects.unwrap_or(3);

    let cell = |row: &[String], idx: usize| row.get(idx).cloned().unwrap_or_default();

    for row in rows.iter().skip(1) {
        let title = cell(row, idx_title).trim().to_string();
        if title.is_empty() {
            continue;
        }
        map.insert(
            title.clone(),
            JobProfile {
                title,
                description: cell(row, idx_desc),
                skills: cell(row, idx_skills),
                top_projects: cell(row, idx_projects),
            },
        );
    }
    map
}

/// Resolves a raw job-title string against the profile map: exact match,
/// then case-insensitive, then substring in either direction.
pub fn resolve_job_title<'a>(
    raw: &str,
    jobs: &'a HashMap<String, JobProfile>,
) -> Option<(&'a String, &'a JobProfile)> {
    if let Some((k, v)) = jobs.get_key_value(raw) {
        return Some((k, v));
    }
    let lowered = raw.to_lowercase();
    if let Some((k, v)) = jobs.iter().find(|(k, _)| k.to_lowercase() == lowered) {
        return Some((k, v));
    }
    jobs.iter().find(|(k, _)| {
        let kl = k.to_lowercase();
        lowered.contains(&kl) || kl.contains(&lowered)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn sample_rows() -> Vec<Vec<String>> {
        vec![
            vec![
                "Job Title".into(),
                "Description".into(),
                "Required Skills".into(),
                "Top Projects Reference".into(),
                "Timestamp".into(),
            ],
            vec![
                "SRE".into(),
                "Keep it up".into(),
                "Linux, Kubernetes".into(),
                "MUST HAVE: on-call".into(),
                "2024-06-01T00:00:00Z".into(),
            ],
            vec!["".into(), "no title, skipped".into()],
        ]
    }

    #[test]
    fn test_parse_job_rows_by_header() {
        let map = parse_job_rows(&sample_rows());
        assert_eq!(map.len(), 1);
        let sre = &map["SRE"];
        assert_eq!(sre.skills, "Linux, Kubernetes");
        assert_eq!(sre.top_projects, "MUST HAVE: on-call");
    }

    #[test]
    fn test_parse_job_rows_positional_fallback() {
        let rows = vec![
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            vec!["Dev".into(), "desc".into(), "rust".into(), "proj".into()],
        ];
        let map = parse_job_rows(&rows);
        assert_eq!(map["Dev"].skills, "rust");
    }

    #[test]
    fn test_resolve_job_title_tiers() {
        let map = parse_job_rows(&sample_rows());
        assert!(resolve_job_title("SRE", &map).is_some());
        assert!(resolve_job_title("sre", &map).is_some());
        assert!(resolve_job_title("Senior SRE (Platform)", &map).is_some());
        assert!(resolve_job_title("Accountant", &map).is_none());
    }

    #[tokio::test]
    async fn test_cache_reads_store_once_within_ttl() {
        let store = MemoryStore::with_collection(ACTIVE_JOB_COLLECTION, sample_rows());
        let cache = JobCache::new(Duration::from_secs(300));
        cache.get(&store).await.unwrap();
        cache.get(&store).await.unwrap();
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_invalidate_forces_reread() {
        let store = MemoryStore::with_collection(ACTIVE_JOB_COLLECTION, sample_rows());
        let cache = JobCache::new(Duration::from_secs(300));
        cache.get(&store).await.unwrap();
        cache.invalidate().await;
        cache.get(&store).await.unwrap();
        assert_eq!(store.read_count(), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_rereads() {
        let store = MemoryStore::with_collection(ACTIVE_JOB_COLLECTION, sample_rows());
        let cache = JobCache::new(Duration::ZERO);
        cache.get(&store).await.unwrap();
        cache.get(&store).await.unwrap();
        assert_eq!(store.read_count(), 2);
    }
}
