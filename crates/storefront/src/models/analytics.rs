//! Analytics event and summary types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use inkdrop_core::ProductId;

/// Kind of storefront event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    ProductView,
    AddToCart,
    RemoveFromCart,
    BeginCheckout,
    Purchase,
    Search,
}

impl EventType {
    pub const ALL: [Self; 7] = [
        Self::PageView,
        Self::ProductView,
        Self::AddToCart,
        Self::RemoveFromCart,
        Self::BeginCheckout,
        Self::Purchase,
        Self::Search,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PageView => "page_view",
            Self::ProductView => "product_view",
            Self::AddToCart => "add_to_cart",
            Self::RemoveFromCart => "remove_from_cart",
            Self::BeginCheckout => "begin_checkout",
            Self::Purchase => "purchase",
            Self::Search => "search",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown event type: {s}"))
    }
}

/// An event to append to the log.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub event_type: EventType,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default, alias = "query")]
    pub search_query: Option<String>,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl NewEvent {
    /// Event with only a type set.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            session_id: None,
            path: None,
            product_id: None,
            search_query: None,
            value: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn with_product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }

    #[must_use]
    pub const fn with_value(mut self, value: Decimal) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// One day of rolled-up counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailySummary {
    pub day: NaiveDate,
    pub page_views: i64,
    pub product_views: i64,
    pub add_to_carts: i64,
    pub checkouts: i64,
    pub purchases: i64,
    pub searches: i64,
    pub unique_sessions: i64,
    pub orders: i64,
    pub revenue: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Count of one event type.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EventCount {
    pub event_type: String,
    pub count: i64,
}

/// Most-viewed product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: i32,
    pub name: Option<String>,
    pub views: i64,
}

/// Most frequent search.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopSearch {
    pub query: String,
    pub count: i64,
}

/// Admin analytics overview for a trailing window.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsOverview {
    pub days: u32,
    pub since: DateTime<Utc>,
    pub events: Vec<EventCount>,
    pub unique_sessions: i64,
    pub orders: i64,
    pub revenue: Decimal,
    pub average_order_value: Decimal,
    /// Purchases per unique session, as a percentage.
    pub conversion_rate: Decimal,
    pub top_products: Vec<TopProduct>,
    pub top_searches: Vec<TopSearch>,
    pub daily: Vec<DailySummary>,
}

/// Percentage with two decimals, zero when the denominator is zero.
#[must_use]
pub fn percentage(numerator: i64, denominator: i64) -> Decimal {
    if denominator <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(numerator) * Decimal::ONE_HUNDRED / Decimal::from(denominator)).round_dp(2)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_round_trips_through_str() {
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
        }
        assert!("click".parse::<EventType>().is_err());
    }

    #[test]
    fn test_new_event_accepts_query_alias() {
        let event: NewEvent =
            serde_json::from_str(r#"{"event_type":"search","query":"owl"}"#).unwrap();
        assert_eq!(event.event_type, EventType::Search);
        assert_eq!(event.search_query.as_deref(), Some("owl"));
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 3), Decimal::new(3333, 2));
        assert_eq!(percentage(5, 0), Decimal::ZERO);
    }
}
