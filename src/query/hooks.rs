//! Query and mutation bindings for the domain services.
//!
//! Each function wires a service call to a cache key. Mutations that change
//! events invalidate every key under [`EVENTS_KEY`]; inscription and payment
//! mutations invalidate [`INSTALLMENTS_KEY`].

use std::ops::{Deref, DerefMut};

use crate::error::ApiError;
use crate::installments::PaymentSummary;
use crate::models::calendar::{CalendarEvent, EventRequest, EventTypeOption};
use crate::models::payments::{
    InscriptionRequest, InscriptionResponse, Installment, PaymentIntentRequest,
    PaymentIntentResponse, PaymentPlan,
};
use crate::query::{Mutation, Query, QueryClient, query_key};
use crate::services::calendar::{CalendarService, EventFilter};
use crate::services::payments::PaymentsService;
use crate::services::CasClient;
use crate::transport::fetch_or_throw;

pub const EVENTS_KEY: &str = "eventos";
pub const EVENT_TYPES_KEY: &str = "tipos-evento";
pub const PLANS_KEY: &str = "planes";
pub const INSTALLMENTS_KEY: &str = "cuotas";

/// Calendar events matching `filter`.
pub fn events_query(
    client: &CasClient,
    queries: &QueryClient,
    filter: EventFilter,
) -> Query<EventFilter, Vec<CalendarEvent>> {
    let calendar = client.calendar().clone();
    Query::new(
        queries.clone(),
        query_key([EVENTS_KEY]),
        filter,
        move |filter: EventFilter| {
            let calendar = calendar.clone();
            async move {
                let collection = fetch_or_throw(calendar.list_events(&filter)).await?;
                Ok::<_, ApiError>(CalendarService::extract_events(&collection))
            }
        },
    )
}

pub fn event_types_query(
    client: &CasClient,
    queries: &QueryClient,
) -> Query<(), Vec<EventTypeOption>> {
    let calendar = client.calendar().clone();
    Query::new(queries.clone(), query_key([EVENT_TYPES_KEY]), (), move |_| {
        let calendar = calendar.clone();
        async move {
            let collection = fetch_or_throw(calendar.list_event_types()).await?;
            Ok::<_, ApiError>(CalendarService::extract_event_types(&collection))
        }
    })
}

/// Every payment plan, active or not.
pub fn plans_query(client: &CasClient, queries: &QueryClient) -> Query<(), Vec<PaymentPlan>> {
    let payments = client.payments().clone();
    Query::new(queries.clone(), query_key([PLANS_KEY]), (), move |_| {
        let payments = payments.clone();
        async move {
            let collection = fetch_or_throw(payments.list_plans()).await?;
            Ok::<_, ApiError>(PaymentsService::extract_plans(&collection))
        }
    })
}

/// Installments of one inscription, with their [`PaymentSummary`].
pub struct InstallmentsQuery {
    query: Query<Option<u64>, Vec<Installment>>,
}

impl InstallmentsQuery {
    pub fn summary(&self) -> PaymentSummary {
        PaymentSummary::from_installments(&self.query.data().unwrap_or_default())
    }

    pub async fn set_inscription(&mut self, inscription_id: Option<u64>) {
        self.query.set_deps(inscription_id).await;
    }
}

impl Deref for InstallmentsQuery {
    type Target = Query<Option<u64>, Vec<Installment>>;

    fn deref(&self) -> &Self::Target {
        &self.query
    }
}

impl DerefMut for InstallmentsQuery {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.query
    }
}

/// Installments of `inscription_id`. Does nothing while it is `None`.
pub fn installments_query(
    client: &CasClient,
    queries: &QueryClient,
    inscription_id: Option<u64>,
) -> InstallmentsQuery {
    let payments = client.payments().clone();
    let query = Query::new(
        queries.clone(),
        query_key([INSTALLMENTS_KEY]),
        inscription_id,
        move |inscription_id: Option<u64>| {
            let payments = payments.clone();
            async move {
                let Some(id) = inscription_id else {
                    return Ok(Vec::new());
                };
                let collection = fetch_or_throw(payments.installments_for(id)).await?;
                Ok::<_, ApiError>(PaymentsService::extract_installments(&collection))
            }
        },
    )
    .enabled_when(Option::is_some);

    InstallmentsQuery { query }
}

pub fn create_event_mutation(
    client: &CasClient,
    queries: &QueryClient,
) -> Mutation<EventRequest, CalendarEvent> {
    let calendar = client.calendar().clone();
    let queries = queries.clone();
    Mutation::new(move |request: EventRequest| {
        let calendar = calendar.clone();
        async move { fetch_or_throw(calendar.create_event(&request)).await }
    })
    .on_success(move |_| {
        queries.invalidate_queries(&[EVENTS_KEY]);
    })
}

pub fn update_event_mutation(
    client: &CasClient,
    queries: &QueryClient,
) -> Mutation<(u64, EventRequest), CalendarEvent> {
    let calendar = client.calendar().clone();
    let queries = queries.clone();
    Mutation::new(move |(id, request): (u64, EventRequest)| {
        let calendar = calendar.clone();
        async move { fetch_or_throw(calendar.update_event(id, &request)).await }
    })
    .on_success(move |_| {
        queries.invalidate_queries(&[EVENTS_KEY]);
    })
}

pub fn delete_event_mutation(client: &CasClient, queries: &QueryClient) -> Mutation<u64, ()> {
    let calendar = client.calendar().clone();
    let queries = queries.clone();
    Mutation::new(move |id: u64| {
        let calendar = calendar.clone();
        async move { fetch_or_throw(calendar.delete_event(id)).await }
    })
    .on_success(move |_| {
        queries.invalidate_queries(&[EVENTS_KEY]);
    })
}

pub fn inscription_mutation(
    client: &CasClient,
    queries: &QueryClient,
) -> Mutation<InscriptionRequest, InscriptionResponse> {
    let payments = client.payments().clone();
    let queries = queries.clone();
    Mutation::new(move |request: InscriptionRequest| {
        let payments = payments.clone();
        async move { fetch_or_throw(payments.create_inscription(&request)).await }
    })
    .on_success(move |_| {
        queries.invalidate_queries(&[INSTALLMENTS_KEY]);
    })
}

/// Starts a payment. Redirecting to `redirect_url` is left to the caller.
pub fn payment_intent_mutation(
    client: &CasClient,
    queries: &QueryClient,
) -> Mutation<PaymentIntentRequest, PaymentIntentResponse> {
    let payments = client.payments().clone();
    let queries = queries.clone();
    Mutation::new(move |request: PaymentIntentRequest| {
        let payments = payments.clone();
        async move { fetch_or_throw(payments.create_payment_intent(&request)).await }
    })
    .on_success(move |_| {
        queries.invalidate_queries(&[INSTALLMENTS_KEY]);
    })
}
