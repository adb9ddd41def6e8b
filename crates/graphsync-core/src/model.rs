//! Normalized room and equipment value types.
//!
//! Resources are value objects re-fetched every collection cycle. Both kinds
//! share identity, filtering and schedule behavior through the
//! [`GraphResource`] trait; the stable identifier
//! `"<asset_type>_<email_address>"` keys both the filter projection and the
//! platform asset mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Postal address of a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalAddress {
    pub city: Option<String>,
    pub country_or_region: Option<String>,
    pub postal_code: Option<String>,
    pub state: Option<String>,
    pub street: Option<String>,
}

/// Geographic coordinates of a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinates {
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub altitude_accuracy: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// How a place handles booking requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    #[default]
    Unknown,
    Standard,
    Reserved,
}

impl BookingType {
    /// Maps the directory's wire value; anything unrecognized is `Unknown`.
    #[must_use]
    pub fn from_graph(value: Option<&str>) -> Self {
        match value {
            Some("standard") => Self::Standard,
            Some("reserved") => Self::Reserved,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for BookingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Standard => "standard",
            Self::Reserved => "reserved",
        };
        write!(f, "{s}")
    }
}

/// Capability interface shared by both resource kinds.
///
/// Object-safe on purpose: the collector enriches rooms and equipment through
/// one `&mut dyn GraphResource` slice.
pub trait GraphResource: Send + Sync {
    /// Platform asset type of this resource kind.
    fn asset_type(&self) -> &'static str;

    /// Directory-assigned mail address, when present.
    fn email_address(&self) -> Option<&str>;

    /// Human-readable name used for the platform asset.
    fn display_name(&self) -> Option<&str>;

    /// Flat projection of the filterable fields. Internal/derived fields
    /// (the schedule status) are excluded.
    fn filterable_fields(&self) -> HashMap<String, String>;

    /// Sets or clears the derived schedule status.
    fn set_on_schedule(&mut self, status: Option<String>);

    /// Serialized attribute payload pushed to the platform.
    fn payload(&self) -> serde_json::Value;

    /// Deterministic identifier, `"<asset_type>_<email_address>"`.
    /// `None` when the directory did not assign a mail address.
    fn stable_id(&self) -> Option<String> {
        self.email_address()
            .map(|email| format!("{}_{}", self.asset_type(), email))
    }
}

/// A bookable meeting room discovered from the directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub display_name: Option<String>,
    pub nickname: Option<String>,
    pub label: Option<String>,
    pub email_address: Option<String>,
    pub phone: Option<String>,
    pub address: PhysicalAddress,
    pub geo_coordinates: GeoCoordinates,
    pub booking_type: BookingType,
    pub building: Option<String>,
    pub capacity: Option<i32>,
    pub floor_label: Option<String>,
    pub floor_number: Option<i32>,
    pub is_wheel_chair_accessible: Option<bool>,
    pub tags: Vec<String>,
    pub display_device_name: Option<String>,
    pub audio_device_name: Option<String>,
    pub video_device_name: Option<String>,
    pub on_schedule: Option<String>,
}

fn put_opt(fields: &mut HashMap<String, String>, key: &str, value: Option<&str>) {
    fields.insert(key.to_string(), value.unwrap_or_default().to_string());
}

fn put_fmt<T: fmt::Display>(fields: &mut HashMap<String, String>, key: &str, value: Option<T>) {
    let rendered = value.map(|v| v.to_string()).unwrap_or_default();
    fields.insert(key.to_string(), rendered);
}

impl GraphResource for Room {
    fn asset_type(&self) -> &'static str {
        "microsoft_365_room"
    }

    fn email_address(&self) -> Option<&str> {
        self.email_address.as_deref()
    }

    fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    fn filterable_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        put_opt(&mut fields, "display_name", self.display_name.as_deref());
        put_opt(&mut fields, "nickname", self.nickname.as_deref());
        put_opt(&mut fields, "label", self.label.as_deref());
        put_opt(&mut fields, "email_address", self.email_address.as_deref());
        put_opt(&mut fields, "phone", self.phone.as_deref());
        put_opt(&mut fields, "building", self.building.as_deref());
        put_opt(&mut fields, "floor_label", self.floor_label.as_deref());
        put_opt(
            &mut fields,
            "display_device_name",
            self.display_device_name.as_deref(),
        );
        put_opt(
            &mut fields,
            "audio_device_name",
            self.audio_device_name.as_deref(),
        );
        put_opt(
            &mut fields,
            "video_device_name",
            self.video_device_name.as_deref(),
        );
        put_opt(&mut fields, "city", self.address.city.as_deref());
        put_opt(&mut fields, "street", self.address.street.as_deref());
        put_opt(&mut fields, "postal_code", self.address.postal_code.as_deref());
        put_fmt(&mut fields, "capacity", self.capacity);
        put_fmt(&mut fields, "floor_number", self.floor_number);
        put_fmt(
            &mut fields,
            "is_wheel_chair_accessible",
            self.is_wheel_chair_accessible,
        );
        put_fmt(&mut fields, "latitude", self.geo_coordinates.latitude);
        put_fmt(&mut fields, "longitude", self.geo_coordinates.longitude);
        fields.insert("booking_type".to_string(), self.booking_type.to_string());
        fields.insert("tags".to_string(), self.tags.join(","));
        fields
    }

    fn set_on_schedule(&mut self, status: Option<String>) {
        self.on_schedule = status;
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Bookable equipment, backed by a directory mailbox with purpose `equipment`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub email_address: Option<String>,
    pub display_name: Option<String>,
    pub on_schedule: Option<String>,
}

impl GraphResource for Equipment {
    fn asset_type(&self) -> &'static str {
        "microsoft_365_equipment"
    }

    fn email_address(&self) -> Option<&str> {
        self.email_address.as_deref()
    }

    fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    fn filterable_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        put_opt(&mut fields, "email_address", self.email_address.as_deref());
        put_opt(&mut fields, "display_name", self.display_name.as_deref());
        fields
    }

    fn set_on_schedule(&mut self, status: Option<String>) {
        self.on_schedule = status;
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_combines_kind_and_address() {
        let room = Room {
            email_address: Some("hq101@contoso.com".to_string()),
            ..Room::default()
        };
        assert_eq!(
            room.stable_id().as_deref(),
            Some("microsoft_365_room_hq101@contoso.com")
        );

        let equipment = Equipment {
            email_address: Some("beamer@contoso.com".to_string()),
            ..Equipment::default()
        };
        assert_eq!(
            equipment.stable_id().as_deref(),
            Some("microsoft_365_equipment_beamer@contoso.com")
        );
    }

    #[test]
    fn stable_id_absent_without_address() {
        assert!(Room::default().stable_id().is_none());
    }

    #[test]
    fn filterable_fields_exclude_schedule_status() {
        let room = Room {
            building: Some("HQ".to_string()),
            on_schedule: Some("Standup".to_string()),
            ..Room::default()
        };
        let fields = room.filterable_fields();
        assert_eq!(fields.get("building").map(String::as_str), Some("HQ"));
        assert!(!fields.contains_key("on_schedule"));
    }

    #[test]
    fn booking_type_mapping() {
        assert_eq!(BookingType::from_graph(Some("standard")), BookingType::Standard);
        assert_eq!(BookingType::from_graph(Some("reserved")), BookingType::Reserved);
        assert_eq!(BookingType::from_graph(Some("other")), BookingType::Unknown);
        assert_eq!(BookingType::from_graph(None), BookingType::Unknown);
    }

    #[test]
    fn fields_render_numbers_and_flags_as_strings() {
        let room = Room {
            capacity: Some(12),
            is_wheel_chair_accessible: Some(true),
            tags: vec!["video".to_string(), "whiteboard".to_string()],
            ..Room::default()
        };
        let fields = room.filterable_fields();
        assert_eq!(fields.get("capacity").map(String::as_str), Some("12"));
        assert_eq!(
            fields.get("is_wheel_chair_accessible").map(String::as_str),
            Some("true")
        );
        assert_eq!(fields.get("tags").map(String::as_str), Some("video,whiteboard"));
    }
}
