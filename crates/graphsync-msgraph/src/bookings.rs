//! Calendar event operations for booking management.
//!
//! Listing runs against the room mailbox through a service-account client;
//! create and delete run as the interactively authorized user (`/me`) of a
//! delegated session.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::schedule::DateTimeTimeZone;
use crate::{GraphClient, GraphResult};

/// A calendar event as exposed through the booking API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Option<String>,
    pub subject: Option<String>,
    pub start: Option<DateTimeTimeZone>,
    pub end: Option<DateTimeTimeZone>,
    /// Mail address of the organizer.
    pub organizer: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphEvent {
    id: Option<String>,
    subject: Option<String>,
    start: Option<DateTimeTimeZone>,
    end: Option<DateTimeTimeZone>,
    organizer: Option<Recipient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Recipient {
    email_address: Option<EmailAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    address: Option<String>,
}

impl From<GraphEvent> for Booking {
    fn from(event: GraphEvent) -> Self {
        Booking {
            id: event.id,
            subject: event.subject,
            start: event.start,
            end: event.end,
            organizer: event
                .organizer
                .and_then(|o| o.email_address)
                .and_then(|e| e.address),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewEvent {
    subject: String,
    body: ItemBody,
    start: DateTimeTimeZone,
    end: DateTimeTimeZone,
    location: Location,
    attendees: Vec<Attendee>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody {
    content_type: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    display_name: String,
}

#[derive(Debug, Serialize)]
struct Attendee {
    #[serde(rename = "emailAddress")]
    email_address: AttendeeAddress,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct AttendeeAddress {
    address: String,
}

impl GraphClient {
    /// Events on the room's calendar within `[start, end]`.
    #[instrument(skip(self))]
    pub async fn list_bookings(
        &self,
        address: &str,
        start: &str,
        end: &str,
    ) -> GraphResult<Vec<Booking>> {
        let url = format!(
            "{}/users/{}/calendarView?startDateTime={}&endDateTime={}",
            self.base_url(),
            address,
            start,
            end
        );
        let mut bookings = Vec::new();
        self.get_paginated(&url, |page: Vec<GraphEvent>| {
            bookings.extend(page.into_iter().map(Booking::from));
            Ok(())
        })
        .await?;
        Ok(bookings)
    }

    /// Creates an event on the authorized user's calendar with the room as a
    /// resource attendee.
    #[instrument(skip(self, body))]
    pub async fn create_booking(
        &self,
        start: &str,
        end: &str,
        room_address: &str,
        subject: &str,
        body: &str,
    ) -> GraphResult<()> {
        let event = NewEvent {
            subject: subject.to_string(),
            body: ItemBody {
                content_type: "text",
                content: body.to_string(),
            },
            start: DateTimeTimeZone {
                date_time: start.to_string(),
                time_zone: "UTC".to_string(),
            },
            end: DateTimeTimeZone {
                date_time: end.to_string(),
                time_zone: "UTC".to_string(),
            },
            location: Location {
                display_name: room_address.to_string(),
            },
            attendees: vec![Attendee {
                email_address: AttendeeAddress {
                    address: room_address.to_string(),
                },
                kind: "resource",
            }],
        };
        let url = format!("{}/me/events", self.base_url());
        let _: serde_json::Value = self.post(&url, &event, &[]).await?;
        Ok(())
    }

    /// Cancels an event on the authorized user's calendar.
    #[instrument(skip(self))]
    pub async fn delete_booking(&self, event_id: &str) -> GraphResult<()> {
        let url = format!("{}/me/events/{}", self.base_url(), event_id);
        self.delete(&url).await
    }
}
