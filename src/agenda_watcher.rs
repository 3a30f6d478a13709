use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::installments::{format_amount, PaymentSummary};
use crate::services::calendar::CalendarService;
use crate::services::payments::PaymentsService;
use crate::services::CasClient;

/// How far ahead the watcher looks for events.
pub const LOOKAHEAD_DAYS: i64 = 14;

/// Periodic check of the calendar and of one inscription's installments.
#[derive(Clone)]
pub struct AgendaWatcher {
    client: CasClient,
    inscription_id: Option<u64>,
    seen_events: Arc<Mutex<HashSet<u64>>>,
}

impl AgendaWatcher {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = CasClient::new(config)?;
        Ok(Self::with_client(client, config.inscription_id))
    }

    pub fn with_client(client: CasClient, inscription_id: Option<u64>) -> Self {
        Self {
            client,
            inscription_id,
            seen_events: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn client(&self) -> &CasClient {
        &self.client
    }

    /// Log upcoming events not reported before. Returns how many were new.
    pub async fn check_for_new_events(&self) -> Result<usize> {
        let now = Local::now().naive_local();
        let collection = self
            .client
            .calendar()
            .upcoming_events(now, LOOKAHEAD_DAYS)
            .await?
            .into_data();
        let events = CalendarService::extract_events(&collection);

        let mut new_events = 0;
        {
            let mut seen = self.seen_events.lock();
            for event in &events {
                if seen.insert(event.id) {
                    info!(
                        "New event: {} - {} ({})",
                        event.title,
                        event.start.format("%d/%m/%Y %H:%M"),
                        event.kind.code()
                    );
                    new_events += 1;
                }
            }
        }

        if new_events > 0 {
            info!("Found {} new events", new_events);
        } else {
            info!("No new events found");
        }

        Ok(new_events)
    }

    /// Log the installment summary of the configured inscription, if any.
    pub async fn check_installments(&self) -> Result<Option<PaymentSummary>> {
        let Some(inscription_id) = self.inscription_id else {
            return Ok(None);
        };

        let collection = self
            .client
            .payments()
            .installments_for(inscription_id)
            .await?
            .into_data();
        let installments = PaymentsService::extract_installments(&collection);
        let summary = PaymentSummary::from_installments(&installments);

        info!(
            "Inscription {}: paid {} of {} ({}%)",
            inscription_id,
            format_amount(summary.paid_amount),
            format_amount(summary.total_amount),
            summary.progress_percent
        );
        if let Some(next) = &summary.next_due {
            info!(
                "Next installment #{} due {} for {}",
                next.sequence,
                next.due_date.format("%d/%m/%Y"),
                format_amount(next.amount)
            );
        }
        if summary.has_overdue() {
            warn!(
                "Inscription {} has {} overdue installments",
                inscription_id, summary.overdue_count
            );
        }

        Ok(Some(summary))
    }

    pub async fn run_checks(&self) -> Result<()> {
        self.check_for_new_events().await?;
        self.check_installments().await?;
        Ok(())
    }
}
