//! Document-store import: folder discovery, semantic folder matching,
//! batched extraction, and gatekeeper-guarded persistence.
//!
//! Per-file failures (download, text extraction, too-short content, missing
//! extraction results) are recorded in the report and never abort the scan.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::extractor::{extract_batch, ExtractedCandidate, BATCH_SIZE};
use super::prompts::FOLDER_MATCH_PROMPT;
use super::{gatekeeper, source_key_for, CandidateRow};
use crate::docs::text::{extract_text, MIN_TEXT_LEN};
use crate::docs::{RemoteFile, RemoteFolder};
use crate::errors::AppError;
use crate::jobs::JobProfile;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::state::AppState;
use crate::temporal::{window_for, TimePeriod};

#[derive(Debug, Default, Deserialize)]
pub struct ImportParams {
    #[serde(default)]
    pub job_title_filter: Option<String>,
    #[serde(default)]
    pub time_period: TimePeriod,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped_existing_files: usize,
    pub scanned_folders_count: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub message: String,
    pub errors: Vec<String>,
    pub scanned_folders: Vec<String>,
    pub stats: ImportStats,
}

/// A downloaded, text-extracted file waiting for its extraction batch.
struct PendingFile {
    file: RemoteFile,
    text: String,
    collection: String,
    job: String,
}

/// Scans the document store and imports every new resume it finds.
pub async fn import_from_documents(
    state: &AppState,
    params: ImportParams,
) -> Result<ImportReport, AppError> {
    let window = window_for(
        params.time_period,
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        Utc::now().date_naive(),
    )?;

    // A scan is the one moment staleness is unacceptable.
    state.identity_cache.invalidate_all().await;

    let jobs = state.job_cache.get(state.store.as_ref()).await?;
    let mut report = ImportReport::default();

    let mut folders = state
        .docs
        .list_folders(&state.config.drive_folder_id)
        .await?;
    if folders.is_empty() {
        // No subfolders: treat the root itself as one unsorted inbox.
        folders.push(RemoteFolder {
            id: state.config.drive_folder_id.clone(),
            name: "General Application".to_string(),
        });
    }

    if let Some(filter) = params
        .job_title_filter
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
    {
        folders = match_folders(state, filter, folders).await;
        if folders.is_empty() {
            report.message = format!("No folders matched the role '{filter}'");
            return Ok(report);
        }
    }

    let mut pending: Vec<PendingFile> = Vec::new();

    for folder in &folders {
        let job = canonical_job_title(
            params.job_title_filter.as_deref(),
            &folder.name,
            &jobs,
        );
        let collection = if jobs.contains_key(&job) {
            job.clone()
        } else {
            state.config.source_collection.clone()
        };

        report.scanned_folders.push(folder.name.clone());
        info!(folder = %folder.name, job = %job, "scanning folder");

        let files = match state.docs.list_files_recursive(&folder.id, &window).await {
            Ok(files) => files,
            Err(e) => {
                report
                    .errors
                    .push(format!("Folder '{}': listing failed: {e}", folder.name));
                continue;
            }
        };

        let identities = state
            .identity_cache
            .load(state.store.as_ref(), &collection)
            .await?;

        for file in files {
            let source = source_key_for(&file.name);
            if identities.lock().await.sources.contains(&source) {
                report.stats.skipped_existing_files += 1;
                continue;
            }

            let bytes = match state.docs.download(&file).await {
                Ok(b) => b,
                Err(e) => {
                    report
                        .errors
                        .push(format!("{}: download failed: {e}", file.name));
                    continue;
                }
            };
            let text = match extract_text(&file, &bytes) {
                Ok(t) => t,
                Err(e) => {
                    report.errors.push(format!("{e}"));
                    continue;
                }
            };
            if text.len() < MIN_TEXT_LEN {
                report
                    .errors
                    .push(format!("{}: extracted text too short, skipped", file.name));
                continue;
            }

            pending.push(PendingFile {
                file,
                text,
                collection: collection.clone(),
                job: job.clone(),
            });
            if pending.len() >= BATCH_SIZE {
                let batch = std::mem::take(&mut pending);
                process_batch(state, batch, &mut report).await;
            }
        }
    }

    if !pending.is_empty() {
        process_batch(state, pending, &mut report).await;
    }

    report.stats.scanned_folders_count = report.scanned_folders.len();
    report.message = format!(
        "Imported {} candidate(s) from {} folder(s)",
        report.stats.imported, report.stats.scanned_folders_count
    );
    Ok(report)
}

/// Runs one extraction batch and commits the survivors through the
/// gatekeeper, grouped per target collection.
async fn process_batch(state: &AppState, batch: Vec<PendingFile>, report: &mut ImportReport) {
    let inputs: Vec<(String, String)> = batch
        .iter()
        .map(|p| (p.file.name.clone(), p.text.clone()))
        .collect();

    let results = match extract_batch(&state.llm, &inputs).await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, count = batch.len(), "extraction batch failed");
            for p in &batch {
                report
                    .errors
                    .push(format!("{}: extraction failed: {e}", p.file.name));
            }
            return;
        }
    };

    let (paired, pairing_errors) = pair_results(batch, results);
    report.errors.extend(pairing_errors);

    let mut by_collection: HashMap<String, Vec<CandidateRow>> = HashMap::new();
    for (item, candidate) in paired {
        let identities = match state
            .identity_cache
            .load(state.store.as_ref(), &item.collection)
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                report
                    .errors
                    .push(format!("{}: identity load failed: {e}", item.file.name));
                continue;
            }
        };

        {
            let mut ids = identities.lock().await;
            if ids.contains_identity(&candidate.name, &candidate.contact) {
                report.stats.skipped_existing_files += 1;
                continue;
            }
            ids.reserve(&candidate.name, &candidate.contact);
        }

        by_collection
            .entry(item.collection.clone())
            .or_default()
            .push(candidate_row(&item, candidate));
    }

    for (collection, rows) in by_collection {
        match gatekeeper::commit(
            state.store.as_ref(),
            &state.identity_cache,
            &collection,
            rows,
        )
        .await
        {
            Ok(outcome) => {
                report.stats.imported += outcome.written;
                report.stats.skipped_existing_files += outcome.skipped;
            }
            Err(e) => {
                report
                    .errors
                    .push(format!("Collection '{collection}': write failed: {e}"));
            }
        }
    }
}

/// Pairs batch inputs with extraction results by position. Inputs without a
/// matching result become one error entry each; surplus results are dropped.
fn pair_results(
    batch: Vec<PendingFile>,
    mut results: Vec<ExtractedCandidate>,
) -> (Vec<(PendingFile, ExtractedCandidate)>, Vec<String>) {
    let mut errors = Vec::new();
    if results.len() > batch.len() {
        results.truncate(batch.len());
    }

    let mut paired = Vec::new();
    let mut results = results.into_iter();
    for item in batch {
        match results.next() {
            Some(candidate) => paired.push((item, candidate)),
            None => errors.push(format!(
                "{}: extraction returned fewer results than inputs",
                item.file.name
            )),
        }
    }
    (paired, errors)
}

fn candidate_row(item: &PendingFile, candidate: ExtractedCandidate) -> CandidateRow {
    CandidateRow {
        source_key: source_key_for(&item.file.name),
        observed_date: item.file.observed_date().unwrap_or_default(),
        name: candidate.name,
        contact: candidate.contact,
        qualification: candidate.qualification,
        position: candidate.current_position,
        experience: candidate.experience,
        skills: candidate.skills,
        projects: candidate.top_projects,
        job: item.job.clone(),
        resume_link: item.file.web_view_link.clone().unwrap_or_default(),
    }
}

/// Selects the folders relevant to a role: LLM semantic match first,
/// keyword overlap as the deterministic fallback.
async fn match_folders(
    state: &AppState,
    filter: &str,
    folders: Vec<RemoteFolder>,
) -> Vec<RemoteFolder> {
    let names: Vec<&str> = folders.iter().map(|f| f.name.as_str()).collect();
    let prompt = FOLDER_MATCH_PROMPT
        .replace("{job_title}", filter)
        .replace("{folders_list}", &names.join("\n"));

    match state.llm.call_json::<Vec<String>>(&prompt, JSON_ONLY_SYSTEM).await {
        Ok(selected) if !selected.is_empty() => {
            let chosen: Vec<RemoteFolder> = folders
                .iter()
                .filter(|f| selected.iter().any(|s| s.trim() == f.name))
                .cloned()
                .collect();
            if !chosen.is_empty() {
                return chosen;
            }
            warn!("semantic folder match returned unknown names, falling back");
            keyword_filter(filter, folders)
        }
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "semantic folder match failed, falling back");
            keyword_filter(filter, folders)
        }
    }
}

fn keyword_filter(filter: &str, folders: Vec<RemoteFolder>) -> Vec<RemoteFolder> {
    folders
        .into_iter()
        .filter(|f| keyword_match(filter, &f.name))
        .collect()
}

/// At least half of the role's words must appear in the folder name.
fn keyword_match(job_title: &str, folder_name: &str) -> bool {
    let folder = folder_name.to_lowercase();
    let words: Vec<String> = job_title
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return false;
    }
    let hits = words.iter().filter(|w| folder.contains(w.as_str())).count();
    hits * 2 >= words.len()
}

/// The job title recorded on imported rows: explicit filter wins, then a
/// known job whose title appears in the folder name, then the folder name.
fn canonical_job_title(
    filter: Option<&str>,
    folder_name: &str,
    jobs: &HashMap<String, JobProfile>,
) -> String {
    if let Some(f) = filter.map(str::trim).filter(|f| !f.is_empty()) {
        return f.to_string();
    }
    let folder = folder_name.to_lowercase();
    for title in jobs.keys() {
        if folder.contains(&title.to_lowercase()) {
            return title.clone();
        }
    }
    folder_name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(name: &str) -> PendingFile {
        PendingFile {
            file: RemoteFile {
                name: name.to_string(),
                ..Default::default()
            },
            text: "text".to_string(),
            collection: "Candidates".to_string(),
            job: "SRE".to_string(),
        }
    }

    #[test]
    fn test_pair_results_short_batch_yields_one_error_per_missing() {
        let batch = vec![pending("a.pdf"), pending("b.pdf"), pending("c.pdf")];
        let results = vec![ExtractedCandidate::default(), ExtractedCandidate::default()];
        let (paired, errors) = pair_results(batch, results);
        assert_eq!(paired.len(), 2);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("c.pdf"));
        assert!(errors[0].contains("fewer results than inputs"));
    }

    #[test]
    fn test_pair_results_surplus_results_dropped() {
        let batch = vec![pending("a.pdf")];
        let results = vec![ExtractedCandidate::default(), ExtractedCandidate::default()];
        let (paired, errors) = pair_results(batch, results);
        assert_eq!(paired.len(), 1);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_keyword_match_half_overlap() {
        assert!(keyword_match("HR Executive", "HR Executive Dec 2024"));
        assert!(keyword_match("Senior HR Executive", "HR Executive"));
        assert!(!keyword_match("Backend Engineer", "HR Executive"));
        assert!(!keyword_match("", "anything"));
    }

    #[test]
    fn test_canonical_job_title_precedence() {
        let mut jobs = HashMap::new();
        jobs.insert("SRE".to_string(), JobProfile::default());

        assert_eq!(
            canonical_job_title(Some("Platform Lead"), "SRE Folder", &jobs),
            "Platform Lead"
        );
        assert_eq!(
            canonical_job_title(None, "Resumes - SRE 2024", &jobs),
            "SRE"
        );
        assert_eq!(
            canonical_job_title(None, "General Application", &jobs),
            "General Application"
        );
    }
}
