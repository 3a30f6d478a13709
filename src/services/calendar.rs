//! Calendar service: events and event types.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use serde::de::IgnoredAny;
use tracing::info;

use crate::discovery::HateoasClient;
use crate::error::ApiError;
use crate::models::calendar::{
    CalendarEntry, CalendarEvent, CalendarRoot, EventCollection, EventRequest,
    EventTypeCollection, EventTypeOption,
};
use crate::transport::{ApiResponse, ApiResult, RequestOptions};

const CALENDAR_PATH: &str = "/api/calendario";
const EVENTS_PATH: &str = "/api/calendario/eventos";
const EVENT_TYPES_PATH: &str = "/api/calendario/tipos";

const QUERY_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Filters for [`CalendarService::list_events`]. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct EventFilter {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub kind: Option<String>,
}

impl EventFilter {
    pub fn between(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// `?desde=..&hasta=..&tipo=..` with only the present fields, or `""`.
    pub fn query_string(&self) -> String {
        let mut params = Vec::new();
        if let Some(from) = self.from {
            params.push(format!(
                "desde={}",
                urlencoding::encode(&from.format(QUERY_DATE_FORMAT).to_string())
            ));
        }
        if let Some(to) = self.to {
            params.push(format!(
                "hasta={}",
                urlencoding::encode(&to.format(QUERY_DATE_FORMAT).to_string())
            ));
        }
        if let Some(kind) = self.kind.as_deref().filter(|k| !k.is_empty()) {
            params.push(format!("tipo={}", urlencoding::encode(kind)));
        }

        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59).unwrap_or_else(|| start_of(date))
}

/// First and last instant of a month (`month` is 1-based).
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_first.pred_opt()?;
    Some((start_of(first), end_of(last)))
}

/// Sunday-to-Saturday week containing `date`.
pub fn week_range(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let sunday = date - Duration::days(i64::from(date.weekday().num_days_from_sunday()));
    let saturday = sunday + Duration::days(6);
    (start_of(sunday), end_of(saturday))
}

/// Calendar operations against `/api/calendario`.
#[derive(Debug, Clone)]
pub struct CalendarService {
    api: HateoasClient,
}

impl CalendarService {
    pub fn new(api: HateoasClient) -> Self {
        Self { api }
    }

    /// Calendar entry point; carries only links.
    pub async fn discover(&self) -> ApiResult<CalendarRoot> {
        self.api
            .transport()
            .get(CALENDAR_PATH, RequestOptions::default())
            .await
    }

    pub async fn list_events(&self, filter: &EventFilter) -> ApiResult<EventCollection> {
        let url = format!("{EVENTS_PATH}{}", filter.query_string());
        self.api.transport().get(&url, RequestOptions::default()).await
    }

    pub async fn get_event(&self, id: u64) -> ApiResult<CalendarEvent> {
        self.api
            .transport()
            .get(&format!("{EVENTS_PATH}/{id}"), RequestOptions::default())
            .await
    }

    /// Create an event (admins and leaders only).
    ///
    /// Nothing is cached locally; callers refetch or invalidate.
    pub async fn create_event(&self, event: &EventRequest) -> ApiResult<CalendarEvent> {
        let created: ApiResponse<CalendarEvent> = self
            .api
            .transport()
            .post(EVENTS_PATH, event, RequestOptions::default())
            .await?;
        info!("Created calendar event {} - {}", created.data.id, created.data.title);
        Ok(created)
    }

    pub async fn update_event(&self, id: u64, event: &EventRequest) -> ApiResult<CalendarEvent> {
        self.api
            .transport()
            .put(&format!("{EVENTS_PATH}/{id}"), event, RequestOptions::default())
            .await
    }

    pub async fn delete_event(&self, id: u64) -> ApiResult<()> {
        let response = self
            .api
            .transport()
            .delete::<IgnoredAny>(&format!("{EVENTS_PATH}/{id}"), RequestOptions::default())
            .await?;
        info!("Deleted calendar event {}", id);
        Ok(response.discard())
    }

    pub async fn list_event_types(&self) -> ApiResult<EventTypeCollection> {
        self.api
            .transport()
            .get(EVENT_TYPES_PATH, RequestOptions::default())
            .await
    }

    /// Events of a month (`month` is 1-based).
    pub async fn events_in_month(&self, year: i32, month: u32) -> ApiResult<EventCollection> {
        let (from, to) = month_range(year, month).ok_or_else(|| ApiError::InvalidRequest {
            message: format!("invalid month {year}-{month}"),
        })?;
        self.list_events(&EventFilter::between(from, to)).await
    }

    /// Events of the Sunday-to-Saturday week containing `date`.
    pub async fn events_in_week(&self, date: NaiveDate) -> ApiResult<EventCollection> {
        let (from, to) = week_range(date);
        self.list_events(&EventFilter::between(from, to)).await
    }

    pub async fn events_on(&self, date: NaiveDate) -> ApiResult<EventCollection> {
        self.list_events(&EventFilter::between(start_of(date), end_of(date)))
            .await
    }

    /// Events between `from` and `days` days later.
    pub async fn upcoming_events(&self, from: NaiveDateTime, days: i64) -> ApiResult<EventCollection> {
        self.list_events(&EventFilter::between(from, from + Duration::days(days)))
            .await
    }

    pub fn extract_events(collection: &EventCollection) -> Vec<CalendarEvent> {
        collection.items().to_vec()
    }

    pub fn extract_event_types(collection: &EventTypeCollection) -> Vec<EventTypeOption> {
        collection
            .items()
            .iter()
            .map(|info| EventTypeOption {
                value: info.value(),
                label: info.display_label(),
                links: info.links.clone(),
            })
            .collect()
    }

    pub fn to_calendar_entry(event: &CalendarEvent) -> CalendarEntry {
        CalendarEntry::from(event)
    }

    pub fn to_calendar_entries(events: &[CalendarEvent]) -> Vec<CalendarEntry> {
        events.iter().map(CalendarEntry::from).collect()
    }
}
