//! Calendar events and event types

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Collection, LinkMap, impl_linked, timestamp};

/// Event kind as it arrives from the backend.
///
/// Older endpoints send a bare code (`"taller"`), newer ones an object with
/// `codigo`, `etiqueta` and/or `formato`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventKind {
    Code(String),
    Detailed(EventTypeInfo),
}

impl EventKind {
    /// Normalised code: `formato`, then `codigo`, then `etiqueta`.
    pub fn code(&self) -> String {
        match self {
            Self::Code(code) => code.clone(),
            Self::Detailed(info) => info.value(),
        }
    }
}

impl Default for EventKind {
    fn default() -> Self {
        Self::Code(String::new())
    }
}

/// Event type descriptor, as listed by `/api/calendario/tipos`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTypeInfo {
    #[serde(rename = "codigo", default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "etiqueta", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "formato", default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: LinkMap,
}

impl EventTypeInfo {
    pub fn value(&self) -> String {
        self.format
            .as_ref()
            .or(self.code.as_ref())
            .or(self.label.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    pub fn display_label(&self) -> String {
        self.label
            .as_ref()
            .or(self.code.as_ref())
            .or(self.format.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

/// Selectable event type (value + label) for pickers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTypeOption {
    pub value: String,
    pub label: String,
    pub links: LinkMap,
}

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: u64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "tipo", default)]
    pub kind: EventKind,
    #[serde(rename = "fechaInicio", deserialize_with = "timestamp::deserialize")]
    pub start: NaiveDateTime,
    #[serde(rename = "fechaFin", deserialize_with = "timestamp::deserialize")]
    pub end: NaiveDateTime,
    #[serde(rename = "ubicacion", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "participantes", default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<String>>,
    #[serde(
        rename = "fechaCreacion",
        default,
        deserialize_with = "timestamp::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<NaiveDateTime>,
    #[serde(
        rename = "fechaActualizacion",
        default,
        deserialize_with = "timestamp::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: LinkMap,
}

/// Payload for creating or updating an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRequest {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "fechaInicio")]
    pub start: NaiveDateTime,
    #[serde(rename = "fechaFin")]
    pub end: NaiveDateTime,
    #[serde(rename = "ubicacion", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "participantes", skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<String>>,
}

impl EventRequest {
    pub fn new(
        title: impl Into<String>,
        kind: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            kind: kind.into(),
            start,
            end,
            location: None,
            participants: None,
        }
    }

    /// `start <= end`. Not checked before submission.
    pub fn has_valid_range(&self) -> bool {
        self.start <= self.end
    }
}

/// Event flattened for calendar widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEntry {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub description: String,
    pub kind: String,
    pub location: Option<String>,
    pub participants: Option<Vec<String>>,
}

impl From<&CalendarEvent> for CalendarEntry {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            id: event.id.to_string(),
            title: event.title.clone(),
            start: event.start,
            end: event.end,
            description: event.description.clone().unwrap_or_default(),
            kind: event.kind.code(),
            location: event.location.clone(),
            participants: event.participants.clone(),
        }
    }
}

/// Root of `/api/calendario`; carries only links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarRoot {
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: LinkMap,
}

impl_linked!(EventTypeInfo, CalendarEvent, CalendarRoot);

pub type EventCollection = Collection<CalendarEvent>;
pub type EventTypeCollection = Collection<EventTypeInfo>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_accepts_string_or_object() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "id": 7,
            "titulo": "Fogón",
            "tipo": {"codigo": "actividad", "etiqueta": "Actividad"},
            "fechaInicio": "2025-02-01T20:00:00",
            "fechaFin": "2025-02-01T23:00:00"
        }))
        .unwrap();
        assert_eq!(event.kind.code(), "actividad");

        let event: CalendarEvent = serde_json::from_value(json!({
            "id": 8,
            "titulo": "Reunión",
            "tipo": "reunion",
            "fechaInicio": "2025-02-02T10:00:00",
            "fechaFin": "2025-02-02T11:00:00"
        }))
        .unwrap();
        assert_eq!(event.kind.code(), "reunion");
    }

    #[test]
    fn type_info_prefers_format_for_value_and_label_for_display() {
        let info = EventTypeInfo {
            code: Some("TALLER".into()),
            label: Some("Taller".into()),
            format: Some("taller".into()),
            links: LinkMap::new(),
        };
        assert_eq!(info.value(), "taller");
        assert_eq!(info.display_label(), "Taller");

        let only_code = EventTypeInfo {
            code: Some("excursion".into()),
            ..EventTypeInfo::default()
        };
        assert_eq!(only_code.value(), "excursion");
        assert_eq!(only_code.display_label(), "excursion");
    }

    #[test]
    fn request_omits_absent_optionals() {
        let start = NaiveDateTime::parse_from_str("2025-03-01 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let end = NaiveDateTime::parse_from_str("2025-03-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let req = EventRequest::new("Taller", "taller", start, end);
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["titulo"], "Taller");
        assert_eq!(body["fechaInicio"], "2025-03-01T09:00:00");
        assert!(body.get("ubicacion").is_none());
        assert!(req.has_valid_range());

        let reversed = EventRequest::new("Taller", "taller", end, start);
        assert!(!reversed.has_valid_range());
    }
}
