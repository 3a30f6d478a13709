//! Payments service: plans, inscriptions, installments and payment intents.

use tracing::info;

use crate::discovery::HateoasClient;
use crate::models::payments::{
    CheckoutPreferenceRequest, CheckoutPreferenceResponse, InscriptionRequest,
    InscriptionResponse, Installment, InstallmentCollection, PaymentIntentRequest,
    PaymentIntentResponse, PaymentPlan, PaymentsRoot, PlanCollection,
};
use crate::transport::{ApiResponse, ApiResult, RequestOptions};

const PAYMENTS_PATH: &str = "/api/pagos";
const PLANS_PATH: &str = "/api/pagos/planes";
const INSCRIPTIONS_PATH: &str = "/api/pagos/inscripciones";
const INTENTS_PATH: &str = "/api/pagos/intenciones";
const CHECKOUT_PREFERENCES_PATH: &str = "/api/mercadopago/checkout-pro/preferences";

/// Payment operations against `/api/pagos`.
#[derive(Debug, Clone)]
pub struct PaymentsService {
    api: HateoasClient,
}

impl PaymentsService {
    pub fn new(api: HateoasClient) -> Self {
        Self { api }
    }

    pub async fn discover(&self) -> ApiResult<PaymentsRoot> {
        self.api
            .transport()
            .get(PAYMENTS_PATH, RequestOptions::default())
            .await
    }

    /// Every plan, active or not. Filtering is up to the caller.
    pub async fn list_plans(&self) -> ApiResult<PlanCollection> {
        self.api
            .transport()
            .get(PLANS_PATH, RequestOptions::default())
            .await
    }

    pub async fn get_plan(&self, code: &str) -> ApiResult<PaymentPlan> {
        let url = format!("{PLANS_PATH}/{}", urlencoding::encode(code));
        self.api.transport().get(&url, RequestOptions::default()).await
    }

    /// Enroll in a plan. The response lists the installments created.
    ///
    /// `desired_installments` is sent as given; see
    /// [`PaymentPlan::clamp_installments`].
    pub async fn create_inscription(
        &self,
        request: &InscriptionRequest,
    ) -> ApiResult<InscriptionResponse> {
        let response: ApiResponse<InscriptionResponse> = self
            .api
            .transport()
            .post(INSCRIPTIONS_PATH, request, RequestOptions::default())
            .await?;
        info!(
            "Inscription {} created for plan {} with {} installments",
            response.data.inscription_id,
            request.plan_code,
            response.data.installments.len()
        );
        Ok(response)
    }

    pub async fn installments_for(&self, inscription_id: u64) -> ApiResult<InstallmentCollection> {
        let url = format!("{INSCRIPTIONS_PATH}/{inscription_id}/cuotas");
        self.api.transport().get(&url, RequestOptions::default()).await
    }

    /// Start paying the selected installments.
    ///
    /// For redirect-based methods the response carries `redirect_url`;
    /// navigating there is the caller's job.
    pub async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> ApiResult<PaymentIntentResponse> {
        let response: ApiResponse<PaymentIntentResponse> = self
            .api
            .transport()
            .post(INTENTS_PATH, request, RequestOptions::default())
            .await?;
        info!(
            "Payment intent {} for inscription {} is {:?}",
            response.data.id, response.data.inscription_id, response.data.status
        );
        Ok(response)
    }

    /// Create a MercadoPago checkout preference directly.
    pub async fn create_checkout_preference(
        &self,
        request: &CheckoutPreferenceRequest,
    ) -> ApiResult<CheckoutPreferenceResponse> {
        self.api
            .transport()
            .post(CHECKOUT_PREFERENCES_PATH, request, RequestOptions::default())
            .await
    }

    pub fn extract_plans(collection: &PlanCollection) -> Vec<PaymentPlan> {
        collection.items().to_vec()
    }

    pub fn extract_installments(collection: &InstallmentCollection) -> Vec<Installment> {
        collection.items().to_vec()
    }
}
