//! Batch free/busy schedule lookup.
//!
//! All discovered resources are queried in a single `getSchedule` call. The
//! endpoint is only reachable through a concrete user principal: in app-only
//! and service-account mode any enumerated address serves as the anchor (the
//! result is identical regardless of which), while a delegated session uses
//! the authorizing user itself.

use chrono::{Duration, Utc};
use graphsync_core::GraphResource;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{GraphClient, GraphResult, ODataResponse};

/// Timezone requested for returned schedule items.
const SCHEDULE_TIME_ZONE: &str = "W. Europe Standard Time";

/// Granularity of the availability view, in minutes.
const AVAILABILITY_VIEW_INTERVAL: i32 = 30;

/// Length of the queried window.
const SCHEDULE_WINDOW_HOURS: i64 = 1;

/// Graph `dateTimeTimeZone` value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    pub date_time: String,
    pub time_zone: String,
}

impl DateTimeTimeZone {
    /// Renders a timestamp in the undocumented-but-accepted second precision
    /// format, tagged with the schedule timezone.
    fn local(value: chrono::DateTime<Utc>) -> Self {
        Self {
            date_time: value.format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: SCHEDULE_TIME_ZONE.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleRequest {
    schedules: Vec<String>,
    start_time: DateTimeTimeZone,
    end_time: DateTimeTimeZone,
    availability_view_interval: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleInformation {
    schedule_id: Option<String>,
    schedule_items: Option<Vec<ScheduleItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleItem {
    subject: Option<String>,
    status: Option<String>,
}

impl ScheduleItem {
    /// The subject when present, otherwise the status.
    fn description(&self) -> String {
        self.subject
            .clone()
            .or_else(|| self.status.clone())
            .unwrap_or_default()
    }
}

impl GraphClient {
    /// Enriches the resources' `on_schedule` state in place.
    ///
    /// Every address is batched into one query over the next hour. Resources
    /// with a schedule item get its description; resources reported with an
    /// empty item list are cleared. Schedule ids missing from the request set
    /// are logged and skipped.
    #[instrument(skip(self, resources))]
    pub async fn fetch_schedules(
        &self,
        resources: &mut [&mut dyn GraphResource],
    ) -> GraphResult<()> {
        let addresses: Vec<String> = resources
            .iter()
            .filter_map(|r| r.email_address().map(str::to_string))
            .collect();
        if addresses.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let request = ScheduleRequest {
            schedules: addresses.clone(),
            start_time: DateTimeTimeZone::local(now),
            end_time: DateTimeTimeZone::local(now + Duration::hours(SCHEDULE_WINDOW_HOURS)),
            availability_view_interval: AVAILABILITY_VIEW_INTERVAL,
        };

        let url = if self.is_delegated() {
            format!("{}/me/calendar/getSchedule", self.base_url())
        } else {
            format!(
                "{}/users/{}/calendar/getSchedule",
                self.base_url(),
                addresses[0]
            )
        };
        let prefer = format!("outlook.timezone=\"{SCHEDULE_TIME_ZONE}\"");
        let response: ODataResponse<ScheduleInformation> =
            self.post(&url, &request, &[("Prefer", prefer)]).await?;

        for schedule in response.value {
            let Some(schedule_id) = schedule.schedule_id else {
                debug!("empty schedule id");
                continue;
            };
            let Some(resource) = resources
                .iter_mut()
                .find(|r| r.email_address() == Some(schedule_id.as_str()))
            else {
                debug!(schedule_id = %schedule_id, "schedule for unknown address skipped");
                continue;
            };
            let status = schedule
                .schedule_items
                .as_ref()
                .and_then(|items| items.first())
                .map(ScheduleItem::description);
            resource.set_on_schedule(status);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_description_prefers_subject() {
        let item = ScheduleItem {
            subject: Some("Standup".to_string()),
            status: Some("busy".to_string()),
        };
        assert_eq!(item.description(), "Standup");
    }

    #[test]
    fn item_description_falls_back_to_status() {
        let item = ScheduleItem {
            subject: None,
            status: Some("busy".to_string()),
        };
        assert_eq!(item.description(), "busy");
    }
}
