//! HR notification for passing candidates. A failed send is logged and
//! recorded on the context but never fails the pipeline; the analysis and
//! question rows are already the system of record by this point.

use tracing::{error, info};

use super::context::PipelineContext;
use crate::notify::Mailer;

/// Emails the HR inbox about a passing candidate. Returns whether the
/// message went out.
pub async fn send_to_hr(mailer: &dyn Mailer, hr_email: &str, ctx: &mut PipelineContext) -> bool {
    let subject = format!(
        "Candidate Shortlisted: {} - {} (Score: {})",
        ctx.candidate.name, ctx.job, ctx.score
    );
    let body = compose_body(ctx);

    match mailer.send(hr_email, &subject, &body).await {
        Ok(()) => {
            info!(candidate = %ctx.candidate.name, to = hr_email, "HR notified");
            ctx.email_sent = true;
        }
        Err(e) => {
            error!(candidate = %ctx.candidate.name, error = %e, "HR notification failed");
            ctx.email_sent = false;
        }
    }
    ctx.email_sent
}

fn compose_body(ctx: &PipelineContext) -> String {
    let mut body = format!(
        "Candidate: {}\nRole: {}\nMatch Score: {}\nVerdict: PASS\n\nSummary:\n{}\n",
        ctx.candidate.name, ctx.job, ctx.score, ctx.analysis_summary
    );
    if !ctx.strengths.is_empty() {
        body.push_str(&format!("\nStrengths:\n- {}\n", ctx.strengths.join("\n- ")));
    }
    if !ctx.weaknesses.is_empty() {
        body.push_str(&format!(
            "\nWeaknesses:\n- {}\n",
            ctx.weaknesses.join("\n- ")
        ));
    }
    if !ctx.resume_link.is_empty() {
        body.push_str(&format!("\nResume: {}\n", ctx.resume_link));
    }
    if !ctx.questions.is_empty() {
        body.push_str("\nSuggested Screening Questions:\n");
        for (i, q) in ctx.questions.iter().enumerate() {
            body.push_str(&format!("{}. {}\n", i + 1, q));
        }
    }
    body.push_str("\nStatus: Pending Manual Invite\n");
    body
}
