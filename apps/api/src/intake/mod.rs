//! Candidate intake: document-store import, batched LLM extraction, and the
//! deduplicating gatekeeper that guards every append to a candidate
//! collection.

pub mod extractor;
pub mod gatekeeper;
pub mod handlers;
pub mod identity;
pub mod import;
pub mod prompts;

use crate::store::defuse_formula;

pub const CANDIDATE_HEADERS: [&str; 11] = [
    "Source",
    "Date",
    "Name",
    "Contact",
    "Qualification",
    "Current Position",
    "Experience",
    "Skills",
    "Top Projects",
    "Job Applied For",
    "Resume Link",
];

/// A fully extracted candidate row, ready for the gatekeeper. Immutable
/// once appended; re-import of the same identity is rejected, never merged.
#[derive(Debug, Clone, Default)]
pub struct CandidateRow {
    pub source_key: String,
    pub observed_date: String,
    pub name: String,
    pub contact: String,
    pub qualification: String,
    pub position: String,
    pub experience: String,
    pub skills: String,
    pub projects: String,
    pub job: String,
    pub resume_link: String,
}

impl CandidateRow {
    /// 11-column store layout. The contact cell is defused so the
    /// spreadsheet never evaluates it as a formula.
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.source_key.clone(),
            self.observed_date.clone(),
            self.name.clone(),
            defuse_formula(&self.contact),
            self.qualification.clone(),
            self.position.clone(),
            self.experience.clone(),
            self.skills.clone(),
            self.projects.clone(),
            self.job.clone(),
            self.resume_link.clone(),
        ]
    }
}

/// Stable file-level duplicate key derived from the originating document.
pub fn source_key_for(file_name: &str) -> String {
    format!("Drive: {file_name}")
}
