//! Payment plans, inscriptions, installments and payment intents

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Collection, LinkMap, impl_linked};

/// Installment count suggested when a plan is first selected.
pub const SUGGESTED_INSTALLMENTS: u32 = 6;

/// Month of the year, in the backend's `java.time.Month` spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub fn spanish_name(self) -> &'static str {
        match self {
            Self::January => "Enero",
            Self::February => "Febrero",
            Self::March => "Marzo",
            Self::April => "Abril",
            Self::May => "Mayo",
            Self::June => "Junio",
            Self::July => "Julio",
            Self::August => "Agosto",
            Self::September => "Septiembre",
            Self::October => "Octubre",
            Self::November => "Noviembre",
            Self::December => "Diciembre",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "EFECTIVO")]
    Cash,
    #[serde(rename = "MERCADOPAGO")]
    MercadoPago,
}

impl PaymentMethod {
    /// Methods paid through an external checkout page.
    pub fn requires_redirect(self) -> bool {
        matches!(self, Self::MercadoPago)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentIntentStatus {
    #[serde(rename = "PENDIENTE")]
    Pending,
    #[serde(rename = "APROBADO")]
    Approved,
    #[serde(rename = "RECHAZADO")]
    Rejected,
    #[serde(rename = "EXPIRADO")]
    Expired,
    #[serde(rename = "REEMBOLSADO")]
    Refunded,
    /// Statuses introduced by the backend after this client was built.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallmentStatus {
    #[serde(rename = "PENDIENTE")]
    Pending,
    #[serde(rename = "PAGADA")]
    Paid,
    #[serde(rename = "VENCIDA")]
    Overdue,
}

/// A payment plan open for inscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlan {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "anio")]
    pub year: i32,
    #[serde(rename = "montoTotal")]
    pub total_amount: f64,
    #[serde(rename = "minCuotas")]
    pub min_installments: u32,
    #[serde(rename = "maxCuotas")]
    pub max_installments: u32,
    #[serde(rename = "mesInicio")]
    pub start_month: Month,
    #[serde(rename = "mesFin")]
    pub end_month: Month,
    #[serde(rename = "activo")]
    pub active: bool,
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: LinkMap,
}

impl PaymentPlan {
    /// `min_installments <= max_installments` and a positive total.
    pub fn is_consistent(&self) -> bool {
        self.min_installments <= self.max_installments && self.total_amount > 0.0
    }

    /// Clamp a requested installment count into the plan's range.
    pub fn clamp_installments(&self, requested: u32) -> u32 {
        requested.clamp(
            self.min_installments,
            self.max_installments.max(self.min_installments),
        )
    }

    /// Count preselected when the plan is chosen.
    pub fn default_installments(&self) -> u32 {
        SUGGESTED_INSTALLMENTS.min(self.max_installments)
    }
}

/// One scheduled partial payment (cuota).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: u64,
    #[serde(rename = "secuencia")]
    pub sequence: u32,
    #[serde(rename = "fechaVencimiento")]
    pub due_date: NaiveDate,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "estado")]
    pub status: InstallmentStatus,
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: LinkMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InscriptionRequest {
    #[serde(rename = "idUsuario")]
    pub user_id: String,
    #[serde(rename = "codigoPlan")]
    pub plan_code: String,
    #[serde(rename = "mesInicio")]
    pub start_month: Month,
    #[serde(rename = "cuotasDeseadas", skip_serializing_if = "Option::is_none")]
    pub desired_installments: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InscriptionResponse {
    #[serde(rename = "idInscripcion")]
    pub inscription_id: u64,
    #[serde(rename = "cuotas", default)]
    pub installments: Vec<Installment>,
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: LinkMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    #[serde(rename = "idInscripcion")]
    pub inscription_id: u64,
    #[serde(rename = "idsCuotas")]
    pub installment_ids: Vec<u64>,
    #[serde(rename = "metodo")]
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub id: u64,
    #[serde(rename = "idInscripcion")]
    pub inscription_id: u64,
    #[serde(rename = "estado")]
    pub status: PaymentIntentStatus,
    /// Checkout page to send the user to, for redirect-based methods.
    #[serde(rename = "urlRedireccion", default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: LinkMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub title: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// Direct MercadoPago checkout preference request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPreferenceRequest {
    pub items: Vec<CheckoutItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPreferenceResponse {
    pub preference_id: String,
    pub init_point: String,
}

/// Root of `/api/pagos`; carries only links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentsRoot {
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: LinkMap,
}

impl_linked!(
    PaymentPlan,
    Installment,
    InscriptionResponse,
    PaymentIntentResponse,
    PaymentsRoot
);

pub type PlanCollection = Collection<PaymentPlan>;
pub type InstallmentCollection = Collection<Installment>;
