//! Google Calendar implementation of [`Scheduler`].
//!
//! Auto-scheduling scans the next week of the primary calendar for a free
//! 45-minute weekday slot between 09:00 and 17:00 UTC. Manual scheduling
//! takes a fixed date and time from the caller. Failures are reported in
//! the returned status string per the scheduling contract.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::{NotifyError, Scheduler};

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const SLOT_MINUTES: i64 = 45;
const SLOT_STEP_MINUTES: i64 = 30;
const WORK_START_HOUR: u32 = 9;
const WORK_END_HOUR: u32 = 17;
const SEARCH_DAYS: i64 = 7;

pub struct CalendarScheduler {
    client: Client,
    token: String,
    frontend_url: String,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    calendars: FreeBusyCalendars,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendars {
    primary: FreeBusyEntry,
}

#[derive(Debug, Deserialize, Default)]
struct FreeBusyEntry {
    #[serde(default)]
    busy: Vec<BusySlot>,
}

#[derive(Debug, Clone, Deserialize)]
struct BusySlot {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    html_link: Option<String>,
}

impl CalendarScheduler {
    pub fn new(client: Client, token: String, frontend_url: String) -> Self {
        Self {
            client,
            token,
            frontend_url,
        }
    }

    async fn busy_slots(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<BusySlot>, NotifyError> {
        let body = json!({
            "timeMin": format!("{}Z", from.format("%Y-%m-%dT%H:%M:%S")),
            "timeMax": format!("{}Z", to.format("%Y-%m-%dT%H:%M:%S")),
            "timeZone": "UTC",
            "items": [{"id": "primary"}],
        });
        let response = self
            .client
            .post(format!("{CALENDAR_API_BASE}/freeBusy"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let parsed: FreeBusyResponse = response.json().await?;
        Ok(parsed.calendars.primary.busy)
    }

    /// Next free slot within the search horizon, or `None` if fully booked.
    async fn find_available_slot(&self) -> Result<Option<NaiveDateTime>, NotifyError> {
        let start_search = Utc::now().naive_utc() + Duration::days(1);

        for day_offset in 0..SEARCH_DAYS {
            let day = (start_search + Duration::days(day_offset)).date();
            // weekday() numbering: Sat/Sun are 5/6
            if day.weekday().num_days_from_monday() >= 5 {
                continue;
            }

            let work_start = day.and_time(NaiveTime::from_hms_opt(WORK_START_HOUR, 0, 0).unwrap());
            let work_end = day.and_time(NaiveTime::from_hms_opt(WORK_END_HOUR, 0, 0).unwrap());

            let busy = self.busy_slots(work_start, work_end).await?;

            let mut slot = work_start;
            while slot + Duration::minutes(SLOT_MINUTES) <= work_end {
                let slot_end = slot + Duration::minutes(SLOT_MINUTES);
                if !busy.iter().any(|b| overlaps(slot, slot_end, b)) {
                    return Ok(Some(slot));
                }
                slot += Duration::minutes(SLOT_STEP_MINUTES);
            }
        }
        Ok(None)
    }
}

fn overlaps(slot_start: NaiveDateTime, slot_end: NaiveDateTime, busy: &BusySlot) -> bool {
    let parse = |s: &str| {
        DateTime::parse_from_rfc3339(s)
            .map(|d| d.naive_utc())
            .ok()
    };
    match (parse(&busy.start), parse(&busy.end)) {
        (Some(b_start), Some(b_end)) => !(slot_end <= b_start || slot_start >= b_end),
        // Unparseable busy entries are treated as blocking.
        _ => true,
    }
}

fn parse_fixed(date: &str, time: &str) -> Option<NaiveDateTime> {
    let d = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let t = NaiveTime::parse_from_str(time.trim(), "%H:%M").ok()?;
    Some(d.and_time(t))
}

#[async_trait]
impl Scheduler for CalendarScheduler {
    async fn schedule(
        &self,
        candidate_name: &str,
        candidate_email: &str,
        job_title: &str,
        fixed_date: Option<&str>,
        fixed_time: Option<&str>,
    ) -> Result<String, NotifyError> {
        let slot = match (fixed_date, fixed_time) {
            (Some(d), Some(t)) => match parse_fixed(d, t) {
                Some(slot) => slot,
                None => return Ok("Error: Invalid date/time format. Use YYYY-MM-DD and HH:MM".to_string()),
            },
            _ => match self.find_available_slot().await? {
                Some(slot) => slot,
                None => return Ok("Failed to find an available slot in the next 7 days".to_string()),
            },
        };

        let start = format!("{}Z", slot.format("%Y-%m-%dT%H:%M:%S"));
        let end = format!(
            "{}Z",
            (slot + Duration::minutes(SLOT_MINUTES)).format("%Y-%m-%dT%H:%M:%S")
        );

        let mut attendees = Vec::new();
        if candidate_email.contains('@') {
            attendees.push(json!({ "email": candidate_email }));
        } else {
            warn!(candidate_name, "missing email, scheduling without invite");
        }

        let description = format!(
            "Automated interview scheduling for {candidate_name}.\n\
             Contact Info: {candidate_email}\n\n\
             Interview portal: {}/interview?email={candidate_email}&job={job_title}",
            self.frontend_url
        );

        let event = json!({
            "summary": format!("Interview: {candidate_name} for {job_title}"),
            "location": "Online / Google Meet",
            "description": description,
            "start": { "dateTime": start, "timeZone": "UTC" },
            "end": { "dateTime": end, "timeZone": "UTC" },
            "attendees": attendees,
            "reminders": {
                "useDefault": false,
                "overrides": [
                    { "method": "email", "minutes": 24 * 60 },
                    { "method": "popup", "minutes": 10 },
                ],
            },
        });

        let response = self
            .client
            .post(format!("{CALENDAR_API_BASE}/calendars/primary/events"))
            .bearer_auth(&self.token)
            .query(&[("sendUpdates", "all")])
            .json(&event)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Ok(format!("Error creating event: {status} {message}"));
        }

        let created: EventResponse = response.json().await?;
        Ok(format!(
            "Scheduled for {} (Link: {})",
            slot.format("%Y-%m-%d %H:%M UTC"),
            created.html_link.unwrap_or_default()
        ))
    }
}
