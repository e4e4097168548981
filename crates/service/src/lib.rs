//! Business logic layer for order placement and the review aggregator.
//!
//! This module defines the [`OrderService`] and [`ReviewService`] traits and
//! their async implementations. The order service coordinates catalog
//! validation, stock reservation and order persistence in a single database
//! transaction; the review service owns review mutations and the explicit
//! product-rating recomputation that follows each of them.
//!
//! # Features
//! - All-or-nothing order placement: validation, every stock reservation and
//!   the order insert share one transaction, so a failed line rolls back every
//!   earlier reservation.
//! - Status lifecycle enforcement via the transition table in [`model`].
//! - Pluggable discount/tax/shipping policies.
//! - Dependency injection for testability and loose coupling.
//! - Well-typed error handling via [`ServiceError`].

use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::{Pool, PoolError};
use model::{
    Caller, CreateReviewRequest, FulfillmentUpdate, Order, OrderItem, OrderStatus,
    PlaceOrderRequest, Review, StatusChange, UpdateReviewRequest,
};
use repository::{
    OrdersRepository, ProductsRepository, RepositoryError, ReviewsRepository,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio_postgres::Transaction;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Reviews longer than this are rejected.
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// The main error type for all service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad or missing input; the caller can correct and retry.
    #[error("{0}")]
    Validation(String),
    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The caller lacks rights over the resource.
    #[error("{0}")]
    Forbidden(String),
    /// The request conflicts with current state (insufficient stock,
    /// duplicate review, illegal status transition).
    #[error("{0}")]
    Conflict(String),
    /// A repository (database) operation failed.
    #[error("Database error: {0}")]
    Db(RepositoryError),
    /// Failed to obtain a database connection from the pool.
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
    /// Some unexpected or unhandled error.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound("Resource not found".into()),
            RepositoryError::InsufficientStock => ServiceError::Conflict("Insufficient stock".into()),
            RepositoryError::Pool(e) => ServiceError::Pool(e),
            other => ServiceError::Db(other),
        }
    }
}

/// Discount derived from a coupon code. Implementations must return a
/// non-negative amount no larger than `subtotal`; the order service clamps
/// regardless.
pub trait DiscountPolicy: Send + Sync {
    fn discount(&self, coupon_code: Option<&str>, subtotal: Decimal) -> Decimal;
}

/// Coupons are accepted and recorded but currently worth nothing.
pub struct NoDiscount;

impl DiscountPolicy for NoDiscount {
    fn discount(&self, _coupon_code: Option<&str>, _subtotal: Decimal) -> Decimal {
        Decimal::ZERO
    }
}

pub trait TaxPolicy: Send + Sync {
    fn tax(&self, taxable_amount: Decimal) -> Decimal;
}

pub struct ZeroTax;

impl TaxPolicy for ZeroTax {
    fn tax(&self, _taxable_amount: Decimal) -> Decimal {
        Decimal::ZERO
    }
}

pub trait ShippingPolicy: Send + Sync {
    fn shipping(&self, subtotal: Decimal) -> Decimal;
}

pub struct FreeShipping;

impl ShippingPolicy for FreeShipping {
    fn shipping(&self, _subtotal: Decimal) -> Decimal {
        Decimal::ZERO
    }
}

/// A page of results plus the total number of rows the query matches.
#[derive(Debug, Clone)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
}

fn page_offset(page: u32, limit: u32) -> i64 {
    i64::from(page.saturating_sub(1)) * i64::from(limit)
}

/// Trait describing business operations for order management.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Validates the requested lines against the catalog, reserves stock,
    /// prices the order and persists the aggregate, atomically.
    ///
    /// # Errors
    /// [`ServiceError::Validation`] for an empty cart, a bad quantity or an
    /// unknown product; [`ServiceError::Conflict`] when a line exceeds the
    /// available stock; [`ServiceError::Db`]/[`ServiceError::Pool`] for
    /// storage failures (no partial order remains visible).
    async fn place_order(&self, user_id: Uuid, request: PlaceOrderRequest)
        -> Result<Order, ServiceError>;

    /// Retrieves an order; permitted for its owner and for admins.
    async fn get_order(&self, caller: Caller, order_id: Uuid) -> Result<Order, ServiceError>;

    /// A page of the user's own orders, newest first.
    async fn list_orders_for_user(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<PagedResult<Order>, ServiceError>;

    /// Owner-requested cancellation: allowed while the order is still
    /// `pending`/`confirmed`; restores the reserved stock.
    async fn cancel_order(&self, user_id: Uuid, order_id: Uuid) -> Result<Order, ServiceError>;

    /// Admin fulfillment update: optional status transition (validated
    /// against the transition table) plus tracking fields and notes.
    async fn update_fulfillment(
        &self,
        order_id: Uuid,
        update: FulfillmentUpdate,
    ) -> Result<Order, ServiceError>;
}

/// Async implementation of [`OrderService`] using the repository pattern.
pub struct OrderServiceImpl<P, O> {
    db_pool: Pool,
    products_repo: P,
    orders_repo: O,
    discount_policy: Box<dyn DiscountPolicy>,
    tax_policy: Box<dyn TaxPolicy>,
    shipping_policy: Box<dyn ShippingPolicy>,
}

impl<P, O> OrderServiceImpl<P, O>
where
    P: ProductsRepository + Send + Sync,
    O: OrdersRepository + Send + Sync,
{
    /// Constructs the service with the default pricing policies (no discount,
    /// zero tax, free shipping; matching the storefront's current rules).
    pub fn new(db_pool: Pool, products_repo: P, orders_repo: O) -> Self {
        Self::with_policies(
            db_pool,
            products_repo,
            orders_repo,
            Box::new(NoDiscount),
            Box::new(ZeroTax),
            Box::new(FreeShipping),
        )
    }

    pub fn with_policies(
        db_pool: Pool,
        products_repo: P,
        orders_repo: O,
        discount_policy: Box<dyn DiscountPolicy>,
        tax_policy: Box<dyn TaxPolicy>,
        shipping_policy: Box<dyn ShippingPolicy>,
    ) -> Self {
        Self {
            db_pool,
            products_repo,
            orders_repo,
            discount_policy,
            tax_policy,
            shipping_policy,
        }
    }

    fn validate_request(&self, request: &PlaceOrderRequest) -> Result<(), ServiceError> {
        if request.items.is_empty() {
            return Err(ServiceError::Validation("No order items".into()));
        }
        if request.items.iter().any(|line| line.quantity < 1) {
            return Err(ServiceError::Validation("Quantity must be at least 1".into()));
        }
        Ok(())
    }

    /// Returns reserved stock for every line. A product that has since been
    /// removed from the catalog is skipped with a warning; cancellation must
    /// not fail because the catalog moved on.
    async fn release_items(&self, tx: &Transaction<'_>, order: &Order) -> Result<(), ServiceError> {
        for item in &order.items {
            match self
                .products_repo
                .release_stock_tx(tx, item.product_id, item.quantity)
                .await
            {
                Ok(()) => {}
                Err(RepositoryError::NotFound) => {
                    warn!(product_id = %item.product_id, "Product gone, skipping stock release");
                }
                Err(other) => return Err(other.into()),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<P, O> OrderService for OrderServiceImpl<P, O>
where
    P: ProductsRepository + Send + Sync,
    O: OrdersRepository + Send + Sync,
{
    #[instrument(skip(self, request))]
    async fn place_order(
        &self,
        user_id: Uuid,
        request: PlaceOrderRequest,
    ) -> Result<Order, ServiceError> {
        self.validate_request(&request)?;

        let mut client = self.db_pool.get().await.map_err(ServiceError::from)?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| ServiceError::Unexpected(format!("Begin transaction failed: {e}")))?;

        // Validate and reserve line by line. An error at any point drops the
        // transaction, rolling back every reservation made so far.
        let mut subtotal = Decimal::ZERO;
        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = match self.products_repo.get_by_id_tx(&tx, line.product).await {
                Ok(product) => product,
                Err(RepositoryError::NotFound) => {
                    return Err(ServiceError::Validation(format!(
                        "Product not found: {}",
                        line.product
                    )));
                }
                Err(other) => return Err(other.into()),
            };
            if product.stock < line.quantity {
                return Err(ServiceError::Conflict(format!(
                    "Insufficient stock for {}",
                    product.name
                )));
            }
            match self
                .products_repo
                .reserve_stock_tx(&tx, line.product, line.quantity)
                .await
            {
                Ok(()) => {}
                Err(RepositoryError::InsufficientStock) => {
                    return Err(ServiceError::Conflict(format!(
                        "Insufficient stock for {}",
                        product.name
                    )));
                }
                Err(RepositoryError::NotFound) => {
                    return Err(ServiceError::Validation(format!(
                        "Product not found: {}",
                        line.product
                    )));
                }
                Err(other) => return Err(other.into()),
            }

            subtotal += product.price * Decimal::from(line.quantity);
            items.push(OrderItem {
                product_id: product.id,
                name: product.name,
                price: product.price,
                quantity: line.quantity,
                image: product.image,
                selected_size: line.selected_size.clone(),
                selected_color: line.selected_color.clone(),
            });
        }

        let discount = self
            .discount_policy
            .discount(request.coupon_code.as_deref(), subtotal)
            .clamp(Decimal::ZERO, subtotal);
        let tax = self.tax_policy.tax(subtotal - discount);
        let shipping = self.shipping_policy.shipping(subtotal);
        let total = model::order_total(subtotal, discount, tax, shipping);

        let payment_status = request.payment_method.initial_payment_status();
        let status = OrderStatus::initial_for(payment_status);
        let now = Utc::now();
        let order_number = self.orders_repo.next_order_number(&tx).await?;

        let order = Order {
            id: Uuid::new_v4(),
            order_number,
            user_id,
            items,
            shipping_address: request.shipping_address,
            status,
            payment_method: request.payment_method,
            payment_status,
            subtotal,
            discount,
            shipping,
            tax,
            total,
            coupon_code: request.coupon_code,
            tracking_number: None,
            tracking_url: None,
            estimated_delivery: None,
            delivered_at: None,
            notes: None,
            status_history: vec![StatusChange {
                status,
                changed_at: now,
                note: None,
            }],
            created_at: now,
        };

        self.orders_repo.insert_tx(&tx, &order).await?;
        tx.commit()
            .await
            .map_err(|e| ServiceError::Unexpected(format!("Commit failed: {e}")))?;

        info!(order_number = %order.order_number, %user_id, "Order placed");
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn get_order(&self, caller: Caller, order_id: Uuid) -> Result<Order, ServiceError> {
        let order = match self.orders_repo.get_by_id(order_id).await {
            Ok(order) => order,
            Err(RepositoryError::NotFound) => {
                return Err(ServiceError::NotFound("Order not found".into()));
            }
            Err(other) => return Err(other.into()),
        };
        if order.user_id != caller.user_id && !caller.is_admin() {
            return Err(ServiceError::Forbidden(
                "Not authorized to view this order".into(),
            ));
        }
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn list_orders_for_user(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<PagedResult<Order>, ServiceError> {
        let items = self
            .orders_repo
            .list_for_user(user_id, i64::from(limit), page_offset(page, limit))
            .await?;
        let total = self.orders_repo.count_for_user(user_id).await?;
        Ok(PagedResult { items, total })
    }

    #[instrument(skip(self))]
    async fn cancel_order(&self, user_id: Uuid, order_id: Uuid) -> Result<Order, ServiceError> {
        let mut client = self.db_pool.get().await.map_err(ServiceError::from)?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| ServiceError::Unexpected(format!("Begin transaction failed: {e}")))?;

        let mut order = match self.orders_repo.get_by_id_tx(&tx, order_id).await {
            Ok(order) => order,
            Err(RepositoryError::NotFound) => {
                return Err(ServiceError::NotFound("Order not found".into()));
            }
            Err(other) => return Err(other.into()),
        };
        if order.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "Not authorized to cancel this order".into(),
            ));
        }
        if !order.status.cancellable_by_owner() {
            return Err(ServiceError::Conflict(
                "Cannot cancel order in current status".into(),
            ));
        }

        self.release_items(&tx, &order).await?;
        let change = StatusChange {
            status: OrderStatus::Cancelled,
            changed_at: Utc::now(),
            note: None,
        };
        self.orders_repo
            .update_status_tx(&tx, order_id, OrderStatus::Cancelled, None, None)
            .await?;
        self.orders_repo.append_history_tx(&tx, order_id, &change).await?;
        tx.commit()
            .await
            .map_err(|e| ServiceError::Unexpected(format!("Commit failed: {e}")))?;

        order.status = OrderStatus::Cancelled;
        order.status_history.push(change);
        info!(order_number = %order.order_number, "Order cancelled, stock restored");
        Ok(order)
    }

    #[instrument(skip(self, update))]
    async fn update_fulfillment(
        &self,
        order_id: Uuid,
        update: FulfillmentUpdate,
    ) -> Result<Order, ServiceError> {
        let mut client = self.db_pool.get().await.map_err(ServiceError::from)?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| ServiceError::Unexpected(format!("Begin transaction failed: {e}")))?;

        let mut order = match self.orders_repo.get_by_id_tx(&tx, order_id).await {
            Ok(order) => order,
            Err(RepositoryError::NotFound) => {
                return Err(ServiceError::NotFound("Order not found".into()));
            }
            Err(other) => return Err(other.into()),
        };

        if let Some(new_status) = update.status {
            if new_status != order.status {
                if !order.status.can_transition_to(new_status) {
                    return Err(ServiceError::Conflict(format!(
                        "Invalid status transition: {} -> {}",
                        order.status, new_status
                    )));
                }
                let now = Utc::now();
                let delivered_at = (new_status == OrderStatus::Delivered).then_some(now);
                let payment_status = (new_status == OrderStatus::Refunded)
                    .then_some(model::PaymentStatus::Refunded);
                if new_status == OrderStatus::Cancelled {
                    self.release_items(&tx, &order).await?;
                }

                self.orders_repo
                    .update_status_tx(&tx, order_id, new_status, payment_status, delivered_at)
                    .await?;
                let change = StatusChange {
                    status: new_status,
                    changed_at: now,
                    note: update.notes.clone(),
                };
                self.orders_repo.append_history_tx(&tx, order_id, &change).await?;

                order.status = new_status;
                order.status_history.push(change);
                if let Some(at) = delivered_at {
                    order.delivered_at = Some(at);
                }
                if let Some(ps) = payment_status {
                    order.payment_status = ps;
                }
            }
        }

        if update.tracking_number.is_some()
            || update.tracking_url.is_some()
            || update.estimated_delivery.is_some()
            || update.notes.is_some()
        {
            self.orders_repo.update_tracking_tx(&tx, order_id, &update).await?;
            if update.tracking_number.is_some() {
                order.tracking_number = update.tracking_number.clone();
            }
            if update.tracking_url.is_some() {
                order.tracking_url = update.tracking_url.clone();
            }
            if update.estimated_delivery.is_some() {
                order.estimated_delivery = update.estimated_delivery;
            }
            if update.notes.is_some() {
                order.notes = update.notes.clone();
            }
        }

        tx.commit()
            .await
            .map_err(|e| ServiceError::Unexpected(format!("Commit failed: {e}")))?;

        info!(order_number = %order.order_number, status = %order.status, "Order updated");
        Ok(order)
    }
}

/// Trait describing business operations for reviews. Every mutation is
/// followed by an explicit rating recomputation on the affected product; the
/// trigger lives here in the call graph, not in a storage hook.
#[async_trait]
pub trait ReviewService: Send + Sync {
    async fn create_review(
        &self,
        user_id: Uuid,
        request: CreateReviewRequest,
    ) -> Result<Review, ServiceError>;

    async fn update_review(
        &self,
        user_id: Uuid,
        review_id: Uuid,
        request: UpdateReviewRequest,
    ) -> Result<Review, ServiceError>;

    /// Owner or admin may delete.
    async fn delete_review(&self, caller: Caller, review_id: Uuid) -> Result<(), ServiceError>;

    /// A page of a product's approved reviews, newest first.
    async fn list_reviews_for_product(
        &self,
        product_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<PagedResult<Review>, ServiceError>;

    /// Recomputes `average(rating)` and the count over approved reviews and
    /// writes both back to the product; `(0, 0)` when none remain.
    async fn recompute_product_rating(&self, product_id: Uuid) -> Result<(), ServiceError>;
}

/// Async implementation of [`ReviewService`].
pub struct ReviewServiceImpl<R, P, O> {
    reviews_repo: R,
    products_repo: P,
    orders_repo: O,
}

impl<R, P, O> ReviewServiceImpl<R, P, O>
where
    R: ReviewsRepository + Send + Sync,
    P: ProductsRepository + Send + Sync,
    O: OrdersRepository + Send + Sync,
{
    pub fn new(reviews_repo: R, products_repo: P, orders_repo: O) -> Self {
        Self {
            reviews_repo,
            products_repo,
            orders_repo,
        }
    }
}

fn validate_rating(rating: i16) -> Result<(), ServiceError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ServiceError::Validation("Rating must be between 1 and 5".into()))
    }
}

fn validate_comment(comment: &str) -> Result<(), ServiceError> {
    if comment.trim().is_empty() {
        return Err(ServiceError::Validation("Review comment is required".into()));
    }
    if comment.chars().count() > MAX_COMMENT_LENGTH {
        return Err(ServiceError::Validation(format!(
            "Review comment must be at most {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(())
}

#[async_trait]
impl<R, P, O> ReviewService for ReviewServiceImpl<R, P, O>
where
    R: ReviewsRepository + Send + Sync,
    P: ProductsRepository + Send + Sync,
    O: OrdersRepository + Send + Sync,
{
    #[instrument(skip(self, request))]
    async fn create_review(
        &self,
        user_id: Uuid,
        request: CreateReviewRequest,
    ) -> Result<Review, ServiceError> {
        validate_rating(request.rating)?;
        validate_comment(&request.comment)?;

        match self.products_repo.get_by_id(request.product).await {
            Ok(_) => {}
            Err(RepositoryError::NotFound) => {
                return Err(ServiceError::NotFound("Product not found".into()));
            }
            Err(other) => return Err(other.into()),
        }
        if self
            .reviews_repo
            .find_by_user_and_product(user_id, request.product)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "You have already reviewed this product".into(),
            ));
        }

        // Verified purchase: the reviewer has a delivered order containing
        // this product. The unique index on (user_id, product_id) backstops
        // the duplicate probe above under concurrent submission.
        let verified_purchase = self
            .orders_repo
            .has_delivered_order_with_product(user_id, request.product)
            .await?;

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            user_id,
            product_id: request.product,
            rating: request.rating,
            title: request.title,
            comment: request.comment,
            images: request.images,
            verified_purchase,
            helpful_votes: 0,
            is_approved: true,
            created_at: now,
            updated_at: now,
        };
        self.reviews_repo.insert(&review).await?;
        self.recompute_product_rating(review.product_id).await?;

        info!(review_id = %review.id, product_id = %review.product_id, "Review created");
        Ok(review)
    }

    #[instrument(skip(self, request))]
    async fn update_review(
        &self,
        user_id: Uuid,
        review_id: Uuid,
        request: UpdateReviewRequest,
    ) -> Result<Review, ServiceError> {
        let mut review = match self.reviews_repo.get_by_id(review_id).await {
            Ok(review) => review,
            Err(RepositoryError::NotFound) => {
                return Err(ServiceError::NotFound("Review not found".into()));
            }
            Err(other) => return Err(other.into()),
        };
        if review.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "Not authorized to update this review".into(),
            ));
        }

        if let Some(rating) = request.rating {
            validate_rating(rating)?;
            review.rating = rating;
        }
        if let Some(comment) = request.comment {
            validate_comment(&comment)?;
            review.comment = comment;
        }
        if request.title.is_some() {
            review.title = request.title;
        }
        review.updated_at = Utc::now();

        self.reviews_repo.update(&review).await?;
        self.recompute_product_rating(review.product_id).await?;
        Ok(review)
    }

    #[instrument(skip(self))]
    async fn delete_review(&self, caller: Caller, review_id: Uuid) -> Result<(), ServiceError> {
        let review = match self.reviews_repo.get_by_id(review_id).await {
            Ok(review) => review,
            Err(RepositoryError::NotFound) => {
                return Err(ServiceError::NotFound("Review not found".into()));
            }
            Err(other) => return Err(other.into()),
        };
        if review.user_id != caller.user_id && !caller.is_admin() {
            return Err(ServiceError::Forbidden(
                "Not authorized to delete this review".into(),
            ));
        }

        self.reviews_repo.delete(review_id).await?;
        self.recompute_product_rating(review.product_id).await?;
        info!(%review_id, product_id = %review.product_id, "Review deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_reviews_for_product(
        &self,
        product_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<PagedResult<Review>, ServiceError> {
        let items = self
            .reviews_repo
            .list_for_product(product_id, i64::from(limit), page_offset(page, limit))
            .await?;
        let total = self.reviews_repo.count_for_product(product_id).await?;
        Ok(PagedResult { items, total })
    }

    #[instrument(skip(self))]
    async fn recompute_product_rating(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let summary = self.reviews_repo.rating_summary(product_id).await?;
        let rating = if summary.count == 0 {
            Decimal::ZERO
        } else {
            model::round_rating(summary.average)
        };
        match self
            .products_repo
            .set_rating(product_id, rating, summary.count as i32)
            .await
        {
            Ok(()) => Ok(()),
            // The product may have been removed while reviews lingered.
            Err(RepositoryError::NotFound) => {
                warn!(%product_id, "Product gone, rating not written");
                Ok(())
            }
            Err(other) => Err(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn default_policies_price_nothing() {
        assert_eq!(NoDiscount.discount(Some("WELCOME10"), dec("100")), Decimal::ZERO);
        assert_eq!(ZeroTax.tax(dec("100")), Decimal::ZERO);
        assert_eq!(FreeShipping.shipping(dec("100")), Decimal::ZERO);
    }

    #[test]
    fn rating_validation_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(-3).is_err());
    }

    #[test]
    fn comment_validation() {
        assert!(validate_comment("Great mug.").is_ok());
        assert!(validate_comment("").is_err());
        assert!(validate_comment("   ").is_err());
        let long = "x".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(validate_comment(&long).is_err());
        let max = "x".repeat(MAX_COMMENT_LENGTH);
        assert!(validate_comment(&max).is_ok());
    }

    #[test]
    fn offsets_start_at_page_one() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(2, 10), 10);
        assert_eq!(page_offset(3, 25), 50);
        // Page zero behaves like page one instead of underflowing.
        assert_eq!(page_offset(0, 10), 0);
    }
}
