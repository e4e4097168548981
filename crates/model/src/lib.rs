use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Variant: one product option (a size or a colour) with its own stock count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(rename = "type")]
    pub kind: VariantKind,
    pub value: String,
    pub stock: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Size,
    Color,
}

impl VariantKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VariantKind::Size => "size",
            VariantKind::Color => "color",
        }
    }
}

impl FromStr for VariantKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "size" => Ok(VariantKind::Size),
            "color" => Ok(VariantKind::Color),
            other => Err(ParseEnumError::new("variant kind", other)),
        }
    }
}

/// Product: a catalog entry. The aggregate `stock` column is authoritative
/// for reservation; per-variant stock is descriptive only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub stock: i32,
    pub low_stock_threshold: i32,
    pub rating: Decimal,
    pub review_count: i32,
    pub image: Option<String>,
    pub is_active: bool,
    pub variants: Vec<Variant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// ShippingAddress: snapshot stored on the order at placement time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "USA".to_string()
}

/// OrderItem: one line of an order. Name, price and image are snapshots of
/// the product at placement time; later catalog edits never alter them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub image: Option<String>,
    #[serde(default)]
    pub selected_size: Option<String>,
    #[serde(default)]
    pub selected_color: Option<String>,
}

/// One entry of the append-only status history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: OrderStatus,
    pub changed_at: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Order: the purchase aggregate. Immutable once placed except through the
/// status lifecycle; never deleted (cancellation is a status).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    pub status_history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
}

/// Review: one user's rating/comment for one product. At most one review per
/// (user, product) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating: i16,
    #[serde(default)]
    pub title: Option<String>,
    pub comment: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub verified_purchase: bool,
    pub helpful_votes: i32,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// The legal transition table. The forward chain is adjacent-only;
    /// `Cancelled` is reachable from `Pending`/`Confirmed` and `Refunded`
    /// from `Delivered`/`Cancelled`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Processing)
                | (Processing, Shipped)
                | (Shipped, OutForDelivery)
                | (OutForDelivery, Delivered)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Delivered, Refunded)
                | (Cancelled, Refunded)
        )
    }

    /// A customer may cancel only before fulfilment starts.
    pub fn cancellable_by_owner(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Initial status for a freshly placed order: paid orders are confirmed
    /// immediately, cash-on-delivery orders wait for confirmation.
    pub fn initial_for(payment_status: PaymentStatus) -> OrderStatus {
        if payment_status == PaymentStatus::Paid {
            OrderStatus::Confirmed
        } else {
            OrderStatus::Pending
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "out_for_delivery" => Ok(OrderStatus::OutForDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(ParseEnumError::new("order status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    #[serde(rename = "card")]
    Card,
    #[serde(rename = "apple")]
    ApplePay,
    #[serde(rename = "google")]
    GooglePay,
    #[serde(rename = "cod")]
    CashOnDelivery,
}

impl PaymentMethod {
    /// Payment capture is simulated: everything but cash-on-delivery is
    /// treated as paid at placement time.
    pub fn initial_payment_status(self) -> PaymentStatus {
        if self == PaymentMethod::CashOnDelivery {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Paid
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::ApplePay => "apple",
            PaymentMethod::GooglePay => "google",
            PaymentMethod::CashOnDelivery => "cod",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "apple" => Ok(PaymentMethod::ApplePay),
            "google" => Ok(PaymentMethod::GooglePay),
            "cod" => Ok(PaymentMethod::CashOnDelivery),
            other => Err(ParseEnumError::new("payment method", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(ParseEnumError::new("payment status", other)),
        }
    }
}

/// Error for stored enum values that no longer parse.
#[derive(Debug, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Caller identity as established by the upstream gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

// --- Request payloads ---

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub selected_size: Option<String>,
    #[serde(default)]
    pub selected_color: Option<String>,
}

/// Body of `PUT /api/admin/orders/{id}`. Every field is optional; tracking
/// fields may be updated without a status change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentUpdate {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub product: Uuid,
    pub rating: i16,
    #[serde(default)]
    pub title: Option<String>,
    pub comment: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    #[serde(default)]
    pub rating: Option<i16>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

// --- Pure domain arithmetic ---

/// `total = subtotal - discount + tax + shipping`, at currency precision.
pub fn order_total(subtotal: Decimal, discount: Decimal, tax: Decimal, shipping: Decimal) -> Decimal {
    (subtotal - discount + tax + shipping)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Average product rating rounded to one decimal, half away from zero.
pub fn round_rating(average: Decimal) -> Decimal {
    average.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Human-readable order number: fixed prefix, UTC date, zero-padded sequence
/// value. The sequence component is what guarantees uniqueness; the date is
/// for humans.
pub fn format_order_number(date: NaiveDate, sequence: i64) -> String {
    format!("ORD-{}-{:06}", date.format("%Y%m%d"), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn forward_chain_is_adjacent_only() {
        use OrderStatus::*;
        let chain = [Pending, Confirmed, Processing, Shipped, OutForDelivery, Delivered];
        for pair in chain.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        // Skipping a step is rejected.
        assert!(!Confirmed.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Delivered));
        // Going backwards is rejected.
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Delivered.can_transition_to(Pending));
    }

    #[test]
    fn cancellation_and_refund_edges() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Processing.can_transition_to(Cancelled));
        assert!(Delivered.can_transition_to(Refunded));
        assert!(Cancelled.can_transition_to(Refunded));
        assert!(!Confirmed.can_transition_to(Refunded));
        // Refunded is fully terminal.
        for next in [Pending, Confirmed, Processing, Shipped, OutForDelivery, Delivered, Cancelled, Refunded] {
            assert!(!Refunded.can_transition_to(next));
        }
    }

    #[test]
    fn owner_cancellation_window() {
        assert!(OrderStatus::Pending.cancellable_by_owner());
        assert!(OrderStatus::Confirmed.cancellable_by_owner());
        assert!(!OrderStatus::Shipped.cancellable_by_owner());
        assert!(!OrderStatus::Delivered.cancellable_by_owner());
        assert!(!OrderStatus::Cancelled.cancellable_by_owner());
    }

    #[test]
    fn payment_method_drives_initial_state() {
        let cod = PaymentMethod::CashOnDelivery.initial_payment_status();
        assert_eq!(cod, PaymentStatus::Pending);
        assert_eq!(OrderStatus::initial_for(cod), OrderStatus::Pending);

        let card = PaymentMethod::Card.initial_payment_status();
        assert_eq!(card, PaymentStatus::Paid);
        assert_eq!(OrderStatus::initial_for(card), OrderStatus::Confirmed);

        assert_eq!(PaymentMethod::ApplePay.initial_payment_status(), PaymentStatus::Paid);
        assert_eq!(PaymentMethod::GooglePay.initial_payment_status(), PaymentStatus::Paid);
    }

    #[test]
    fn total_reconciles_components() {
        let total = order_total(dec("100.00"), dec("10.00"), dec("8.25"), dec("5.00"));
        assert_eq!(total, dec("103.25"));
        assert_eq!(order_total(dec("59.98"), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO), dec("59.98"));
        // Rounded to currency precision.
        assert_eq!(order_total(dec("10.005"), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO), dec("10.01"));
    }

    #[test]
    fn rating_rounds_to_one_decimal() {
        assert_eq!(round_rating(dec("4")), dec("4"));
        assert_eq!(round_rating(dec("4.4444")), dec("4.4"));
        assert_eq!(round_rating(dec("4.25")), dec("4.3"));
        assert_eq!(round_rating(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn order_numbers_are_distinct_per_sequence_value() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let n1 = format_order_number(date, 41);
        let n2 = format_order_number(date, 42);
        assert_eq!(n1, "ORD-20250314-000041");
        assert_ne!(n1, n2);
        // Padding does not truncate large sequence values.
        assert_eq!(format_order_number(date, 1_234_567), "ORD-20250314-1234567");
    }

    #[test]
    fn status_round_trips_through_strings() {
        use OrderStatus::*;
        for status in [Pending, Confirmed, Processing, Shipped, OutForDelivery, Delivered, Cancelled, Refunded] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<OrderStatus>().is_err());
        assert_eq!("cod".parse::<PaymentMethod>().unwrap(), PaymentMethod::CashOnDelivery);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn deserialize_place_order_request_from_json() {
        let json = r#"
        {
            "items": [
                {
                    "product": "7f0c8c8e-6f7a-4a3f-9a53-0f0cb43a2101",
                    "quantity": 2,
                    "selectedSize": "M"
                }
            ],
            "shippingAddress": {
                "fullName": "Jane Roe",
                "phone": "+15550001111",
                "addressLine1": "1 Main St",
                "city": "Springfield",
                "state": "IL",
                "postalCode": "62701"
            },
            "paymentMethod": "cod",
            "couponCode": "WELCOME10"
        }
        "#;
        let req: PlaceOrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.items.len(), 1);
        assert_eq!(req.items[0].quantity, 2);
        assert_eq!(req.items[0].selected_size.as_deref(), Some("M"));
        assert!(req.items[0].selected_color.is_none());
        assert_eq!(req.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(req.shipping_address.country, "USA");
        assert_eq!(req.coupon_code.as_deref(), Some("WELCOME10"));
    }

    #[test]
    fn order_serializes_with_wire_names() {
        let placed_at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let order = Order {
            id: Uuid::nil(),
            order_number: "ORD-20250314-000001".to_string(),
            user_id: Uuid::nil(),
            items: vec![OrderItem {
                product_id: Uuid::nil(),
                name: "Mug".to_string(),
                price: dec("12.50"),
                quantity: 1,
                image: None,
                selected_size: None,
                selected_color: None,
            }],
            shipping_address: ShippingAddress {
                full_name: "Jane Roe".to_string(),
                phone: "+15550001111".to_string(),
                address_line1: "1 Main St".to_string(),
                address_line2: None,
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                postal_code: "62701".to_string(),
                country: "USA".to_string(),
            },
            status: OrderStatus::OutForDelivery,
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Paid,
            subtotal: dec("12.50"),
            discount: Decimal::ZERO,
            shipping: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: dec("12.50"),
            coupon_code: None,
            tracking_number: None,
            tracking_url: None,
            estimated_delivery: None,
            delivered_at: None,
            notes: None,
            status_history: vec![StatusChange {
                status: OrderStatus::Confirmed,
                changed_at: placed_at,
                note: None,
            }],
            created_at: placed_at,
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["orderNumber"], "ORD-20250314-000001");
        assert_eq!(json["status"], "out_for_delivery");
        assert_eq!(json["paymentMethod"], "card");
        assert_eq!(json["paymentStatus"], "paid");
        assert_eq!(json["shippingAddress"]["fullName"], "Jane Roe");
        assert_eq!(json["statusHistory"][0]["status"], "confirmed");

        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }
}
