//! # Installment Aggregation
//!
//! Pure functions over a list of [`Installment`]s: outstanding and paid
//! totals, overdue and pending subsets, the next one due and overall
//! progress. Nothing here talks to the network or changes a status.

use std::collections::BTreeSet;

use crate::models::payments::{
    Installment, InstallmentStatus, PaymentIntentRequest, PaymentMethod,
};

/// Sum of every installment not yet paid (pending or overdue).
pub fn pending_amount(installments: &[Installment]) -> f64 {
    installments
        .iter()
        .filter(|i| i.status != InstallmentStatus::Paid)
        .map(|i| i.amount)
        .sum()
}

pub fn paid_amount(installments: &[Installment]) -> f64 {
    installments
        .iter()
        .filter(|i| i.status == InstallmentStatus::Paid)
        .map(|i| i.amount)
        .sum()
}

pub fn overdue_installments(installments: &[Installment]) -> Vec<Installment> {
    with_status(installments, InstallmentStatus::Overdue)
}

pub fn pending_installments(installments: &[Installment]) -> Vec<Installment> {
    with_status(installments, InstallmentStatus::Pending)
}

fn with_status(installments: &[Installment], status: InstallmentStatus) -> Vec<Installment> {
    installments
        .iter()
        .filter(|i| i.status == status)
        .cloned()
        .collect()
}

/// The pending installment with the earliest due date.
///
/// Overdue installments are not considered; see [`overdue_installments`].
pub fn next_due_installment(installments: &[Installment]) -> Option<Installment> {
    installments
        .iter()
        .filter(|i| i.status == InstallmentStatus::Pending)
        .min_by_key(|i| (i.due_date, i.sequence))
        .cloned()
}

/// Share of installments paid, as a whole percentage. `0` for an empty plan.
pub fn progress_percent(paid_count: usize, total_count: usize) -> u32 {
    if total_count == 0 {
        return 0;
    }
    let percent = (paid_count as f64 / total_count as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u32
}

/// Amount of each installment when `total` is split `count` ways.
pub fn installment_amount(total: f64, count: u32) -> Option<f64> {
    (count > 0).then(|| total / f64::from(count))
}

/// Format an amount the way Argentine pesos are written: `$ 1.234,56`.
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}$ {grouped},{fraction:02}")
}

/// Everything a payments screen shows about an inscription at once.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSummary {
    pub total_amount: f64,
    pub paid_amount: f64,
    pub pending_amount: f64,
    pub paid_count: usize,
    pub pending_count: usize,
    pub overdue_count: usize,
    pub next_due: Option<Installment>,
    pub progress_percent: u32,
}

impl PaymentSummary {
    pub fn from_installments(installments: &[Installment]) -> Self {
        let paid = paid_amount(installments);
        let pending = pending_amount(installments);
        let total = paid + pending;
        let count = |status| installments.iter().filter(|i| i.status == status).count();
        let paid_count = count(InstallmentStatus::Paid);

        Self {
            total_amount: total,
            paid_amount: paid,
            pending_amount: pending,
            paid_count,
            pending_count: count(InstallmentStatus::Pending),
            overdue_count: count(InstallmentStatus::Overdue),
            next_due: next_due_installment(installments),
            progress_percent: progress_percent(paid_count, installments.len()),
        }
    }

    pub fn has_debt(&self) -> bool {
        self.pending_amount > 0.0
    }

    pub fn has_overdue(&self) -> bool {
        self.overdue_count > 0
    }
}

/// Installments picked for payment.
///
/// Paid installments can never be selected.
#[derive(Debug, Clone, Default)]
pub struct InstallmentSelection {
    selected: BTreeSet<u64>,
}

impl InstallmentSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select or deselect an installment. Returns whether it is now selected.
    pub fn toggle(&mut self, installment: &Installment) -> bool {
        if installment.status == InstallmentStatus::Paid {
            return false;
        }
        if self.selected.remove(&installment.id) {
            false
        } else {
            self.selected.insert(installment.id);
            true
        }
    }

    /// Select every unpaid installment.
    pub fn select_all(&mut self, installments: &[Installment]) {
        self.selected = installments
            .iter()
            .filter(|i| i.status != InstallmentStatus::Paid)
            .map(|i| i.id)
            .collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: u64) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.selected.iter().copied().collect()
    }

    pub fn selected_amount(&self, installments: &[Installment]) -> f64 {
        installments
            .iter()
            .filter(|i| self.selected.contains(&i.id))
            .map(|i| i.amount)
            .sum()
    }

    /// Payment-intent request for the selection, or `None` when empty.
    pub fn to_payment_intent(
        &self,
        inscription_id: u64,
        method: PaymentMethod,
    ) -> Option<PaymentIntentRequest> {
        if self.selected.is_empty() {
            return None;
        }
        Some(PaymentIntentRequest {
            inscription_id,
            installment_ids: self.ids(),
            method,
        })
    }
}
