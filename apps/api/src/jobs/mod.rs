//! Job-requirement domain: JD submission, the profile collection, and the
//! TTL-cached profile map used by every analysis.

pub mod handlers;
pub mod jd;
pub mod prompts;

pub use jd::{JobCache, JobProfile};

/// Collection holding one row per open job.
pub const ACTIVE_JOB_COLLECTION: &str = "ActiveJobSheet";

pub const JOB_HEADERS: [&str; 5] = [
    "Job Title",
    "Description",
    "Required Skills",
    "Top Projects Reference",
    "Timestamp",
];
