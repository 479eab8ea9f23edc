//! HTTP client for the Stripe API.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::StripeError;
use super::types::{CreatePaymentIntent, ErrorBody, PaymentIntent, Refund};
use crate::config::StripeConfig;

/// Stripe API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Outbound request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloneable Stripe API handle.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    base_url: String,
    secret_key: SecretString,
}

impl StripeClient {
    /// Create a client for the live Stripe API.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, StripeError> {
        Self::with_base_url(config, BASE_URL)
    }

    /// Create a client against another base URL (used by tests).
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_base_url(config: &StripeConfig, base_url: &str) -> Result<Self, StripeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(StripeClientInner {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                secret_key: config.secret_key.clone(),
            }),
        })
    }

    /// Create a payment intent.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Stripe rejects it.
    #[instrument(skip(self, params), fields(amount = params.amount))]
    pub async fn create_payment_intent(
        &self,
        params: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, StripeError> {
        let response = self
            .inner
            .client
            .post(format!("{}/payment_intents", self.inner.base_url))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&params.form_fields())
            .send()
            .await?;

        let intent: PaymentIntent = Self::parse(response).await?;
        debug!(payment_intent_id = %intent.id, "Created payment intent");
        Ok(intent)
    }

    /// Retrieve a payment intent by id.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the intent does not exist.
    #[instrument(skip(self))]
    pub async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, StripeError> {
        let response = self
            .inner
            .client
            .get(format!("{}/payment_intents/{id}", self.inner.base_url))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .send()
            .await?;

        Self::parse(response).await
    }

    /// Refund a payment intent, fully when `amount` is `None`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Stripe rejects the refund.
    #[instrument(skip(self))]
    pub async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount: Option<i64>,
    ) -> Result<Refund, StripeError> {
        let mut form = vec![("payment_intent", payment_intent_id.to_string())];
        if let Some(amount) = amount {
            form.push(("amount", amount.to_string()));
        }

        let response = self
            .inner
            .client
            .post(format!("{}/refunds", self.inner.base_url))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StripeError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(body);
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| StripeError::Parse(e.to_string()))
    }
}
