//! Room and equipment discovery.
//!
//! Rooms come from the places API; equipment is any user mailbox whose
//! purpose is `equipment` (the users listing cannot be filtered server-side
//! on mailbox settings, so the purpose is checked per user). Each discovered
//! item is filtered and deduplicated by its stable identifier; later pages
//! overwrite earlier duplicates with the same key.

use graphsync_core::{filter, BookingType, Equipment, FilterRule, GeoCoordinates, GraphResource,
    PhysicalAddress, Room};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

use crate::{GraphClient, GraphResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphAddress {
    city: Option<String>,
    country_or_region: Option<String>,
    postal_code: Option<String>,
    state: Option<String>,
    street: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphGeoCoordinates {
    accuracy: Option<f64>,
    altitude: Option<f64>,
    altitude_accuracy: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphRoom {
    display_name: Option<String>,
    nickname: Option<String>,
    label: Option<String>,
    email_address: Option<String>,
    phone: Option<String>,
    building: Option<String>,
    capacity: Option<i32>,
    floor_label: Option<String>,
    floor_number: Option<i32>,
    is_wheel_chair_accessible: Option<bool>,
    tags: Option<Vec<String>>,
    audio_device_name: Option<String>,
    video_device_name: Option<String>,
    display_device_name: Option<String>,
    booking_type: Option<String>,
    address: Option<GraphAddress>,
    geo_coordinates: Option<GraphGeoCoordinates>,
}

impl From<GraphRoom> for Room {
    fn from(r: GraphRoom) -> Self {
        Room {
            display_name: r.display_name,
            nickname: r.nickname,
            label: r.label,
            email_address: r.email_address,
            phone: r.phone,
            address: r
                .address
                .map(|a| PhysicalAddress {
                    city: a.city,
                    country_or_region: a.country_or_region,
                    postal_code: a.postal_code,
                    state: a.state,
                    street: a.street,
                })
                .unwrap_or_default(),
            geo_coordinates: r
                .geo_coordinates
                .map(|g| GeoCoordinates {
                    accuracy: g.accuracy,
                    altitude: g.altitude,
                    altitude_accuracy: g.altitude_accuracy,
                    latitude: g.latitude,
                    longitude: g.longitude,
                })
                .unwrap_or_default(),
            booking_type: BookingType::from_graph(r.booking_type.as_deref()),
            building: r.building,
            capacity: r.capacity,
            floor_label: r.floor_label,
            floor_number: r.floor_number,
            is_wheel_chair_accessible: r.is_wheel_chair_accessible,
            tags: r.tags.unwrap_or_default(),
            display_device_name: r.display_device_name,
            audio_device_name: r.audio_device_name,
            video_device_name: r.video_device_name,
            on_schedule: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphUser {
    user_principal_name: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MailboxSettings {
    user_purpose: Option<String>,
}

impl GraphClient {
    /// Lists all rooms of the tenant, paginating to exhaustion, applying the
    /// filter per item and deduplicating by stable identifier. An empty
    /// result is valid.
    ///
    /// # Errors
    ///
    /// A malformed filter rule aborts the listing; it is not a skip.
    #[instrument(skip(self, asset_filter))]
    pub async fn list_rooms(&self, asset_filter: &[Vec<FilterRule>]) -> GraphResult<Vec<Room>> {
        let url = format!("{}/places/microsoft.graph.room", self.base_url());
        let mut rooms: HashMap<String, Room> = HashMap::new();

        self.get_paginated(&url, |page: Vec<GraphRoom>| {
            for item in page {
                let room = Room::from(item);
                let Some(stable_id) = room.stable_id() else {
                    debug!("room without email address skipped");
                    continue;
                };
                if filter::matches(&room.filterable_fields(), asset_filter)? {
                    rooms.insert(stable_id, room);
                } else {
                    debug!(room = %stable_id, "room filtered out");
                }
            }
            Ok(())
        })
        .await?;

        Ok(rooms.into_values().collect())
    }

    /// Lists all equipment mailboxes of the tenant.
    ///
    /// The users listing is paginated to exhaustion first; mailbox settings
    /// are then checked per user. A user whose settings cannot be read is
    /// logged and skipped, not fatal.
    #[instrument(skip(self, asset_filter))]
    pub async fn list_equipment(
        &self,
        asset_filter: &[Vec<FilterRule>],
    ) -> GraphResult<Vec<Equipment>> {
        let url = format!("{}/users", self.base_url());
        let mut users: Vec<GraphUser> = Vec::new();
        self.get_paginated(&url, |page: Vec<GraphUser>| {
            users.extend(page);
            Ok(())
        })
        .await?;

        let mut equipment: HashMap<String, Equipment> = HashMap::new();
        for user in users {
            let Some(upn) = user.user_principal_name else {
                continue;
            };
            let settings_url = format!("{}/users/{}/mailboxSettings", self.base_url(), upn);
            let settings: MailboxSettings = match self.get(&settings_url).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(user = %upn, error = %e, "querying mailbox settings failed, skipping");
                    continue;
                }
            };
            if settings.user_purpose.as_deref() != Some("equipment") {
                continue;
            }

            let item = Equipment {
                email_address: Some(upn),
                display_name: user.display_name,
                on_schedule: None,
            };
            let Some(stable_id) = item.stable_id() else {
                continue;
            };
            if filter::matches(&item.filterable_fields(), asset_filter)? {
                equipment.insert(stable_id, item);
            } else {
                debug!(equipment = %stable_id, "equipment filtered out");
            }
        }

        Ok(equipment.into_values().collect())
    }
}
