//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use inkdrop_core::fulfillment::TrackingInfo;
use inkdrop_core::order::{LineItemSnapshot, OrderTotals};
use inkdrop_core::{Address, Email, FulfillmentStatus, OrderId, PaymentStatus, PromotionId};

use super::products::escape_like;
use super::{Page, Pagination, RepositoryError, parse_column};
use crate::models::{FulfillmentInfo, NewOrder, Order, OrderFilter, PaymentInfo};

const ORDER_COLUMNS: &str = "id, order_number, email, customer_name, phone, shipping_address, \
     billing_address, items, subtotal, shipping, discount, donation, total, promotion_id, \
     promotion_code, payment_processor, payment_intent_id, payment_status, refunded_amount, \
     fulfillment_status, printful_order_id, provider_status, carrier, tracking_number, \
     tracking_url, shipped_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    email: Email,
    customer_name: String,
    phone: Option<String>,
    shipping_address: Json<Address>,
    billing_address: Option<Json<Address>>,
    items: Json<Vec<LineItemSnapshot>>,
    subtotal: Decimal,
    shipping: Decimal,
    discount: Decimal,
    donation: Decimal,
    total: Decimal,
    promotion_id: Option<i32>,
    promotion_code: Option<String>,
    payment_processor: String,
    payment_intent_id: String,
    payment_status: String,
    refunded_amount: Decimal,
    fulfillment_status: String,
    printful_order_id: Option<i64>,
    provider_status: Option<String>,
    carrier: Option<String>,
    tracking_number: Option<String>,
    tracking_url: Option<String>,
    shipped_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            email: row.email,
            customer_name: row.customer_name,
            phone: row.phone,
            shipping_address: row.shipping_address.0,
            billing_address: row.billing_address.map(|a| a.0),
            items: row.items.0,
            totals: OrderTotals {
                subtotal: row.subtotal,
                shipping: row.shipping,
                discount: row.discount,
                donation: row.donation,
                total: row.total,
            },
            promotion_id: row.promotion_id.map(PromotionId::new),
            promotion_code: row.promotion_code,
            payment: PaymentInfo {
                processor: row.payment_processor,
                intent_id: row.payment_intent_id,
                status: parse_column(&row.payment_status, "payment_status")?,
                refunded_amount: row.refunded_amount,
            },
            fulfillment: FulfillmentInfo {
                status: FulfillmentStatus::from(row.fulfillment_status.as_str()),
                provider_order_id: row.printful_order_id,
                provider_status: row.provider_status,
                tracking: TrackingInfo {
                    carrier: row.carrier,
                    tracking_number: row.tracking_number,
                    tracking_url: row.tracking_url,
                    shipped_at: row.shipped_at,
                },
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct OrderStats {
    pub total_orders: i64,
    /// Paid totals minus refunds.
    pub revenue: Decimal,
    pub orders_today: i64,
    pub revenue_today: Decimal,
    /// Paid orders not yet shipped, cancelled or failed.
    pub awaiting_fulfillment: i64,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an order already exists for the
    /// payment intent or order number.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders (order_number, email, customer_name, phone, shipping_address, \
             billing_address, items, subtotal, shipping, discount, donation, total, \
             promotion_id, promotion_code, payment_intent_id, payment_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&order.order_number)
        .bind(&order.email)
        .bind(&order.customer_name)
        .bind(&order.phone)
        .bind(Json(&order.shipping_address))
        .bind(order.billing_address.as_ref().map(Json))
        .bind(Json(&order.items))
        .bind(order.totals.subtotal)
        .bind(order.totals.shipping)
        .bind(order.totals.discount)
        .bind(order.totals.donation)
        .bind(order.totals.total)
        .bind(order.promotion_id)
        .bind(&order.promotion_code)
        .bind(&order.payment_intent_id)
        .bind(order.payment_status.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "order"))?;

        Order::try_from(row)
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.fetch_one_where("id = $1", id.as_i32()).await
    }

    /// Get an order by its customer-facing number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, RepositoryError> {
        self.fetch_one_where("order_number = $1", order_number.trim().to_uppercase())
            .await
    }

    /// Get the order paid by a payment intent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        self.fetch_one_where("payment_intent_id = $1", intent_id.to_string())
            .await
    }

    /// Get the order linked to a Printful order id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_printful_id(
        &self,
        printful_order_id: i64,
    ) -> Result<Option<Order>, RepositoryError> {
        self.fetch_one_where("printful_order_id = $1", printful_order_id)
            .await
    }

    async fn fetch_one_where<T>(&self, clause: &str, value: T) -> Result<Option<Order>, RepositoryError>
    where
        T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE {clause}"))
                .bind(value)
                .fetch_optional(self.pool)
                .await?;

        row.map(Order::try_from).transpose()
    }

    /// List orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Page<Order>, RepositoryError> {
        let pagination = Pagination::new(filter.page, filter.limit);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
        push_order_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        push_order_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(pagination.limit_i64())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows: Vec<OrderRow> = qb.build_query_as().fetch_all(self.pool).await?;
        let items = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, pagination.page, pagination.limit, total))
    }

    /// Most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Paid orders that were never accepted by Printful.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unsubmitted(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE printful_order_id IS NULL AND payment_status = 'succeeded' \
             AND fulfillment_status IN ('pending', 'failed') \
             ORDER BY created_at ASC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Record a payment status change and the cumulative refunded amount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_payment(
        &self,
        id: OrderId,
        status: PaymentStatus,
        refunded_amount: Decimal,
    ) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET payment_status = $2, refunded_amount = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(status.as_str())
        .bind(refunded_amount)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace the fulfillment sub-record.
    ///
    /// Tracking fields that are `None` keep their stored value, so a status
    /// update without a shipment never erases tracking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_fulfillment(
        &self,
        id: OrderId,
        fulfillment: &FulfillmentInfo,
    ) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET fulfillment_status = $2, \
             printful_order_id = COALESCE($3, printful_order_id), \
             provider_status = COALESCE($4, provider_status), \
             carrier = COALESCE($5, carrier), \
             tracking_number = COALESCE($6, tracking_number), \
             tracking_url = COALESCE($7, tracking_url), \
             shipped_at = COALESCE($8, shipped_at), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(fulfillment.status.as_str())
        .bind(fulfillment.provider_order_id)
        .bind(&fulfillment.provider_status)
        .bind(&fulfillment.tracking.carrier)
        .bind(&fulfillment.tracking.tracking_number)
        .bind(&fulfillment.tracking.tracking_url)
        .bind(fulfillment.tracking.shipped_at)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Dashboard totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<OrderStats, RepositoryError> {
        let stats: OrderStats = sqlx::query_as(
            "SELECT \
               COUNT(*) AS total_orders, \
               COALESCE(SUM(total - refunded_amount) FILTER (WHERE payment_status IN ('succeeded', 'partially_refunded')), 0) AS revenue, \
               COUNT(*) FILTER (WHERE created_at >= date_trunc('day', NOW())) AS orders_today, \
               COALESCE(SUM(total - refunded_amount) FILTER (WHERE created_at >= date_trunc('day', NOW()) \
                 AND payment_status IN ('succeeded', 'partially_refunded')), 0) AS revenue_today, \
               COUNT(*) FILTER (WHERE payment_status = 'succeeded' \
                 AND fulfillment_status NOT IN ('shipped', 'delivered', 'returned', 'cancelled', 'failed')) AS awaiting_fulfillment \
             FROM orders",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(stats)
    }
}

fn push_order_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND fulfillment_status = ").push_bind(status.to_string());
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(q));
        qb.push(" AND (order_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR customer_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_filter_sql() {
        let filter = OrderFilter {
            status: Some("shipped".to_string()),
            q: Some("  ink ".to_string()),
            page: None,
            limit: None,
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
        push_order_filter(&mut qb, &filter);
        let sql = qb.sql();
        assert!(sql.contains("fulfillment_status = $1"));
        assert!(sql.contains("customer_name ILIKE $4"));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
        push_order_filter(&mut qb, &OrderFilter::default());
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM orders WHERE TRUE");
    }
}
