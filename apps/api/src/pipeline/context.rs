//! Per-candidate pipeline state carried across stages.

use crate::jobs::JobProfile;

use super::Verdict;

/// The candidate fields hydrated from a source collection row.
#[derive(Debug, Clone, Default)]
pub struct CandidateProfile {
    pub name: String,
    pub contact: String,
    pub qualification: String,
    pub position: String,
    pub experience: String,
    pub skills: String,
    pub projects: String,
}

/// Everything one pipeline run reads and writes. Built by the sync
/// trigger, mutated stage by stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub candidate: CandidateProfile,
    pub job: String,
    pub jd: JobProfile,
    pub resume_text: String,
    pub resume_link: String,
    /// One-line analysis summary for the HR email.
    pub analysis_summary: String,
    pub score: i64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub verdict: Option<Verdict>,
    pub questions: Vec<String>,
    pub email_sent: bool,
}

impl PipelineContext {
    pub fn new(candidate: CandidateProfile, job: String, resume_link: String) -> Self {
        let resume_text = render_resume_text(&candidate);
        Self {
            candidate,
            job,
            resume_link,
            resume_text,
            ..Default::default()
        }
    }
}

/// Renders the stored profile fields back into resume-shaped text for the
/// scoring prompt. The name goes into the prompt separately, so a row with
/// a name but no substance still renders empty and the analyzer treats it
/// as a hard FAIL.
fn render_resume_text(candidate: &CandidateProfile) -> String {
    let fields = [
        ("Qualification", &candidate.qualification),
        ("Current Position", &candidate.position),
        ("Experience", &candidate.experience),
        ("Skills", &candidate.skills),
        ("Top Projects", &candidate.projects),
    ];
    fields
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| format!("{k}: {}", v.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_skips_empty_fields() {
        let c = CandidateProfile {
            name: "Alice".to_string(),
            qualification: "BSc".to_string(),
            skills: "Rust, Kubernetes".to_string(),
            ..Default::default()
        };
        let text = render_resume_text(&c);
        assert_eq!(text, "Qualification: BSc\nSkills: Rust, Kubernetes");
    }

    #[test]
    fn test_render_name_only_profile_is_empty() {
        let c = CandidateProfile {
            name: "Alice".to_string(),
            ..Default::default()
        };
        assert_eq!(render_resume_text(&c), "");
        assert_eq!(render_resume_text(&CandidateProfile::default()), "");
    }
}
