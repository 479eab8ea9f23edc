//! HTTP client for the Printful API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::PrintfulError;
use super::types::{
    CreateOrder, Envelope, Paging, PrintfulOrder, Recipient, ShippingItem, ShippingRate,
    ShippingRateRequest, SyncProductDetail, SyncProductSummary,
};
use crate::config::PrintfulConfig;

/// Printful API base URL.
const BASE_URL: &str = "https://api.printful.com";

/// Outbound request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size for catalog listing.
const PAGE_SIZE: u32 = 100;

/// Cloneable Printful API handle.
#[derive(Clone)]
pub struct PrintfulClient {
    inner: Arc<PrintfulClientInner>,
}

struct PrintfulClientInner {
    client: reqwest::Client,
    base_url: String,
    auto_confirm: bool,
}

impl PrintfulClient {
    /// Create a client for the live Printful API.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &PrintfulConfig) -> Result<Self, PrintfulError> {
        Self::with_base_url(config, BASE_URL)
    }

    /// Create a client against another base URL (used by tests).
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn with_base_url(config: &PrintfulConfig, base_url: &str) -> Result<Self, PrintfulError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| PrintfulError::Parse(format!("Invalid API token format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("Authorization", auth);

        if let Some(store_id) = &config.store_id {
            headers.insert(
                "X-PF-Store-Id",
                HeaderValue::from_str(store_id)
                    .map_err(|e| PrintfulError::Parse(format!("Invalid store id: {e}")))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(PrintfulClientInner {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                auto_confirm: config.auto_confirm,
            }),
        })
    }

    /// List every sync product in the store, following pagination.
    ///
    /// # Errors
    ///
    /// Returns error if any page request fails.
    #[instrument(skip(self))]
    pub async fn list_sync_products(&self) -> Result<Vec<SyncProductSummary>, PrintfulError> {
        let mut products = Vec::new();
        let mut offset = 0;

        loop {
            let url = format!(
                "{}/store/products?offset={offset}&limit={PAGE_SIZE}",
                self.inner.base_url
            );
            let response = self.inner.client.get(&url).send().await?;
            let (page, paging): (Vec<SyncProductSummary>, Option<Paging>) =
                Self::unwrap_paged(response).await?;

            let fetched = u32::try_from(page.len()).unwrap_or(u32::MAX);
            products.extend(page);
            offset += fetched;

            let total = paging.map_or(0, |p| p.total);
            if fetched == 0 || offset >= total {
                break;
            }
        }

        debug!(count = products.len(), "Listed Printful sync products");
        Ok(products)
    }

    /// Get a sync product with its variants.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the product does not exist.
    #[instrument(skip(self))]
    pub async fn get_sync_product(&self, id: i64) -> Result<SyncProductDetail, PrintfulError> {
        let response = self
            .inner
            .client
            .get(format!("{}/store/products/{id}", self.inner.base_url))
            .send()
            .await?;
        Self::unwrap(response).await
    }

    /// Quote shipping for a set of catalog variants.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Printful cannot ship there.
    #[instrument(skip(self, recipient, items), fields(country = %recipient.country_code))]
    pub async fn shipping_rates(
        &self,
        recipient: &Recipient,
        items: &[ShippingItem],
    ) -> Result<Vec<ShippingRate>, PrintfulError> {
        let response = self
            .inner
            .client
            .post(format!("{}/shipping/rates", self.inner.base_url))
            .json(&ShippingRateRequest { recipient, items })
            .send()
            .await?;
        Self::unwrap(response).await
    }

    /// Create an order, confirming it for production when auto-confirm is on.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Printful rejects the order.
    #[instrument(skip(self, order), fields(external_id = %order.external_id))]
    pub async fn create_order(&self, order: &CreateOrder) -> Result<PrintfulOrder, PrintfulError> {
        let mut url = format!("{}/orders", self.inner.base_url);
        if self.inner.auto_confirm {
            url.push_str("?confirm=true");
        }

        let response = self.inner.client.post(&url).json(order).send().await?;
        let created: PrintfulOrder = Self::unwrap(response).await?;
        debug!(printful_order_id = created.id, status = %created.status, "Created Printful order");
        Ok(created)
    }

    /// Get an order by Printful id.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the order does not exist.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: i64) -> Result<PrintfulOrder, PrintfulError> {
        self.fetch_order(&id.to_string()).await
    }

    /// Get an order by the external id it was created with (our order number).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the order does not exist.
    #[instrument(skip(self))]
    pub async fn get_order_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<PrintfulOrder, PrintfulError> {
        self.fetch_order(&format!("@{external_id}")).await
    }

    async fn fetch_order(&self, key: &str) -> Result<PrintfulOrder, PrintfulError> {
        let response = self
            .inner
            .client
            .get(format!("{}/orders/{key}", self.inner.base_url))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PrintfulError::NotFound(format!("order {key}")));
        }
        Self::unwrap(response).await
    }

    async fn unwrap<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PrintfulError> {
        Self::unwrap_paged(response).await.map(|(result, _)| result)
    }

    async fn unwrap_paged<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<(T, Option<Paging>), PrintfulError> {
        let status = response.status();
        let body = response.text().await?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(PrintfulError::Parse(e.to_string())),
            Err(_) => {
                // Error envelopes carry a string `result`.
                let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                    .ok()
                    .and_then(|e| e.error)
                    .and_then(|e| e.message)
                    .unwrap_or(body);
                return Err(PrintfulError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
        };

        if !status.is_success() || envelope.code >= 400 {
            let message = envelope
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("request failed with code {}", envelope.code));
            return Err(PrintfulError::Api {
                status: status.as_u16().max(envelope.code),
                message,
            });
        }

        let result = envelope
            .result
            .ok_or_else(|| PrintfulError::Parse("response has no result".to_string()))?;
        Ok((result, envelope.paging))
    }
}
