//! Fulfillment: submitting orders to Printful and syncing their status back.
//!
//! Status moves in one direction only, from Printful to the local order. It
//! arrives either through the webhook or through the admin "refresh" action,
//! and both paths go through the same mapping in
//! [`inkdrop_core::fulfillment`].

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use inkdrop_core::fulfillment::{TrackingInfo, map_provider_status, status_for_event};
use inkdrop_core::{CurrencyCode, FulfillmentStatus};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::{FulfillmentInfo, Order};
use crate::printful::{
    CreateOrder, OrderItem, PrintfulClient, PrintfulError, PrintfulOrder, Recipient, RetailCosts,
    WebhookEvent,
};

/// Errors from fulfillment operations.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// `PRINTFUL_API_TOKEN` is not set.
    #[error("Fulfillment provider is not configured")]
    NotConfigured,

    /// The order already has a Printful order.
    #[error("Order has already been submitted for fulfillment")]
    AlreadySubmitted,

    /// The order was never submitted, so there is nothing to refresh.
    #[error("Order has not been submitted for fulfillment")]
    NotSubmitted,

    /// Some line items are not linked to Printful sync variants.
    #[error("Order contains items that are not linked to the fulfillment provider")]
    UnlinkedItems,

    /// Printful API error.
    #[error(transparent)]
    Printful(#[from] PrintfulError),

    /// Repository/database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Fulfillment service.
pub struct FulfillmentService<'a> {
    orders: OrderRepository<'a>,
    printful: Option<&'a PrintfulClient>,
    currency: CurrencyCode,
}

impl<'a> FulfillmentService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        printful: Option<&'a PrintfulClient>,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            printful,
            currency,
        }
    }

    fn client(&self) -> Result<&'a PrintfulClient, FulfillmentError> {
        self.printful.ok_or(FulfillmentError::NotConfigured)
    }

    /// Create the Printful order for a local order and record its id/status.
    ///
    /// # Errors
    ///
    /// Returns `FulfillmentError::AlreadySubmitted` if the order was sent
    /// before, `FulfillmentError::UnlinkedItems` if an item has no sync
    /// variant, or the Printful/database error.
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub async fn submit(&self, order: &Order) -> Result<Order, FulfillmentError> {
        let printful = self.client()?;
        if order.is_submitted() {
            return Err(FulfillmentError::AlreadySubmitted);
        }

        let request = order_request(order, self.currency).ok_or(FulfillmentError::UnlinkedItems)?;
        let created = printful.create_order(&request).await?;
        info!(printful_order_id = created.id, status = %created.status, "Order submitted to Printful");

        let updated = self
            .orders
            .update_fulfillment(order.id, &fulfillment_from_remote(&created))
            .await?;
        Ok(updated)
    }

    /// Submit an order, logging instead of failing.
    ///
    /// Provider failures are logged at `warn` and the order is returned
    /// unchanged, ready for a manual submit from the admin.
    pub async fn submit_or_log(&self, order: Order) -> Order {
        match self.submit(&order).await {
            Ok(updated) => updated,
            Err(FulfillmentError::NotConfigured) => order,
            Err(e) => {
                warn!(order_number = %order.order_number, error = %e, "Printful submission failed, order kept locally");
                order
            }
        }
    }

    /// Pull the current status from Printful.
    ///
    /// # Errors
    ///
    /// Returns `FulfillmentError::NotSubmitted` if Printful has no order for
    /// it, or the Printful/database error.
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub async fn refresh(&self, order: &Order) -> Result<Order, FulfillmentError> {
        let printful = self.client()?;

        let remote = match order.fulfillment.provider_order_id {
            Some(id) => printful.get_order(id).await?,
            None => match printful.get_order_by_external_id(&order.order_number).await {
                Ok(remote) => remote,
                Err(PrintfulError::NotFound(_)) => return Err(FulfillmentError::NotSubmitted),
                Err(e) => return Err(e.into()),
            },
        };

        let updated = self
            .orders
            .update_fulfillment(order.id, &fulfillment_from_remote(&remote))
            .await?;
        info!(status = %updated.fulfillment.status, "Fulfillment refreshed from Printful");
        Ok(updated)
    }

    /// Apply a webhook delivery to the matching local order.
    ///
    /// Returns `None` when the event does not concern a known order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the order cannot be loaded or saved.
    #[instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn apply_webhook(&self, event: &WebhookEvent) -> Result<Option<Order>, RepositoryError> {
        let Some(remote) = event.data.order.as_ref() else {
            return Ok(None);
        };

        let local = match self.orders.get_by_printful_id(remote.id).await? {
            Some(order) => Some(order),
            None => match remote.external_id.as_deref() {
                Some(external_id) => self.orders.get_by_number(external_id).await?,
                None => None,
            },
        };
        let Some(local) = local else {
            warn!(printful_order_id = remote.id, "Webhook for unknown order ignored");
            return Ok(None);
        };

        let Some(status) = status_for_event(&event.event_type, Some(&remote.status)) else {
            return Ok(Some(local));
        };

        let fulfillment = FulfillmentInfo {
            status,
            provider_order_id: Some(remote.id),
            provider_status: Some(remote.status.clone()),
            tracking: event.shipment().map(|s| s.tracking()).unwrap_or_default(),
        };
        let updated = self.orders.update_fulfillment(local.id, &fulfillment).await?;
        info!(
            order_number = %updated.order_number,
            status = %updated.fulfillment.status,
            "Fulfillment updated from webhook"
        );
        Ok(Some(updated))
    }

    /// Set the fulfillment status by hand, keeping provider data and tracking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_status(
        &self,
        order: &Order,
        status: FulfillmentStatus,
        tracking: TrackingInfo,
    ) -> Result<Order, RepositoryError> {
        let fulfillment = FulfillmentInfo {
            status,
            provider_order_id: order.fulfillment.provider_order_id,
            provider_status: order.fulfillment.provider_status.clone(),
            tracking,
        };
        self.orders.update_fulfillment(order.id, &fulfillment).await
    }
}

/// Fulfillment record for a Printful order, tracking from its first shipment.
fn fulfillment_from_remote(remote: &PrintfulOrder) -> FulfillmentInfo {
    FulfillmentInfo {
        status: map_provider_status(&remote.status),
        provider_order_id: Some(remote.id),
        provider_status: Some(remote.status.clone()),
        tracking: remote
            .shipments
            .first()
            .map(|s| s.tracking())
            .unwrap_or_default(),
    }
}

/// Build the Printful order request.
///
/// Returns `None` if any item lacks a sync variant id.
fn order_request(order: &Order, currency: CurrencyCode) -> Option<CreateOrder> {
    let items = order
        .items
        .iter()
        .map(|item| {
            Some(OrderItem {
                sync_variant_id: item.provider_variant_id?,
                quantity: item.quantity,
                retail_price: money(item.unit_price),
                name: item.name.clone(),
            })
        })
        .collect::<Option<Vec<_>>>()?;

    let mut recipient = Recipient::from(&order.shipping_address);
    recipient.email = Some(order.email.as_str().to_string());
    if recipient.phone.is_none() {
        recipient.phone.clone_from(&order.phone);
    }

    Some(CreateOrder {
        external_id: order.order_number.clone(),
        shipping: "STANDARD".to_string(),
        recipient,
        items,
        retail_costs: RetailCosts {
            currency: currency.as_str().to_uppercase(),
            subtotal: money(order.totals.subtotal),
            discount: money(order.totals.discount),
            shipping: money(order.totals.shipping),
            total: money(order.totals.total),
        },
    })
}

fn money(amount: Decimal) -> String {
    format!("{amount:.2}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::order::tests::order_with as order;
    use crate::printful::Shipment;

    #[test]
    fn test_order_request_carries_retail_costs() {
        let request = order_request(&order(Some(4011)), CurrencyCode::Usd).unwrap();
        assert_eq!(request.external_id, "INK-20261017-ABC234");
        assert_eq!(request.items[0].sync_variant_id, 4011);
        assert_eq!(request.items[0].retail_price, "25.00");
        assert_eq!(request.retail_costs.currency, "USD");
        assert_eq!(request.retail_costs.total, "56.99");
        assert_eq!(request.recipient.email.as_deref(), Some("ada@example.com"));
        assert_eq!(request.recipient.phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_order_request_requires_linked_items() {
        assert!(order_request(&order(None), CurrencyCode::Usd).is_none());
    }

    #[test]
    fn test_remote_status_is_mapped_and_raw_kept() {
        let remote = PrintfulOrder {
            id: 99,
            external_id: None,
            status: "inprocess".to_string(),
            shipments: Vec::new(),
        };
        let info = fulfillment_from_remote(&remote);
        assert_eq!(info.status, FulfillmentStatus::InProduction);
        assert_eq!(info.provider_status.as_deref(), Some("inprocess"));
        assert_eq!(info.provider_order_id, Some(99));
        assert!(info.tracking.is_empty());
    }

    #[test]
    fn test_remote_tracking_from_first_shipment() {
        let remote = PrintfulOrder {
            id: 99,
            external_id: None,
            status: "fulfilled".to_string(),
            shipments: vec![Shipment {
                carrier: Some("USPS".to_string()),
                tracking_number: Some("9400".to_string()),
                ..Shipment::default()
            }],
        };
        let info = fulfillment_from_remote(&remote);
        assert_eq!(info.status, FulfillmentStatus::Shipped);
        assert_eq!(info.tracking.carrier.as_deref(), Some("USPS"));
    }

    #[test]
    fn test_unmapped_remote_status_passes_through() {
        let remote = PrintfulOrder {
            id: 1,
            external_id: None,
            status: "archived".to_string(),
            shipments: Vec::new(),
        };
        assert_eq!(
            fulfillment_from_remote(&remote).status,
            FulfillmentStatus::Other("archived".to_string())
        );
    }
}
