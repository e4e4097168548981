//! # Data Repository Layer
//!
//! Repository traits and PostgreSQL implementations for the catalog, orders
//! and reviews. Each repository exposes pool-backed reads plus `*_tx` variants
//! that run against a caller-supplied transaction, so the service layer can
//! group stock mutations and order writes atomically.
//!
//! Stock is mutated exclusively through [`ProductsRepository::reserve_stock_tx`]
//! and [`ProductsRepository::release_stock_tx`]; the reservation is a single
//! conditional UPDATE checked via its affected-row count, never a separate
//! read followed by a write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Pool, PoolError};
use model::{
    format_order_number, FulfillmentUpdate, Order, OrderItem, OrderStatus, PaymentStatus, Product,
    Review, StatusChange, Variant,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio_postgres::{GenericClient, Row, Transaction};
use uuid::Uuid;

/// Error types that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database-related errors, wrapping the underlying PostgreSQL error.
    #[error("Database error: {0}")]
    Db(#[from] tokio_postgres::Error),
    /// Failed to obtain a connection from the pool.
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
    /// A stored enum value no longer parses.
    #[error("Corrupt stored value: {0}")]
    Data(#[from] model::ParseEnumError),
    /// No result found.
    #[error("Not found")]
    NotFound,
    /// A stock reservation would have driven `stock` negative.
    #[error("Insufficient stock")]
    InsufficientStock,
}

/// # ProductsRepository
///
/// Catalog access plus the two stock mutations the rest of the system is
/// allowed to perform. Catalog management itself (create/update of products)
/// lives elsewhere; this interface is what order placement, cancellation and
/// the review aggregator need.
#[async_trait]
pub trait ProductsRepository: Send + Sync {
    /// Look up a product with its variants.
    async fn get_by_id(&self, id: Uuid) -> Result<Product, RepositoryError>;

    /// Transactional variant of [`Self::get_by_id`].
    async fn get_by_id_tx(&self, tx: &Transaction<'_>, id: Uuid) -> Result<Product, RepositoryError>;

    /// Atomically decrement stock by `quantity` iff `stock >= quantity`.
    ///
    /// # Errors
    /// [`RepositoryError::InsufficientStock`] if the product exists but the
    /// decrement would go negative, [`RepositoryError::NotFound`] if it does
    /// not exist. Stock is untouched in both cases.
    async fn reserve_stock_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), RepositoryError>;

    /// Increment stock by `quantity` (used on cancellation). No upper bound.
    async fn release_stock_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), RepositoryError>;

    /// Write the denormalized rating cache. Only the review aggregator calls
    /// this.
    async fn set_rating(
        &self,
        id: Uuid,
        rating: Decimal,
        review_count: i32,
    ) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of [`ProductsRepository`], backed by the shared
/// connection pool.
pub struct PgProductsRepository {
    pool: Pool,
}

impl PgProductsRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

async fn fetch_product<C: GenericClient>(client: &C, id: Uuid) -> Result<Product, RepositoryError> {
    let query = r#"
        SELECT id, name, price, compare_at_price, stock, low_stock_threshold,
               rating, review_count, image, is_active, created_at, updated_at
        FROM products WHERE id = $1
    "#;
    let row = client.query_opt(query, &[&id]).await?;
    let row = row.ok_or(RepositoryError::NotFound)?;

    let variant_rows = client
        .query(
            "SELECT kind, value, stock FROM product_variants WHERE product_id = $1 ORDER BY kind, value",
            &[&id],
        )
        .await?;
    let mut variants = Vec::with_capacity(variant_rows.len());
    for vr in variant_rows {
        variants.push(Variant {
            kind: vr.get::<_, String>("kind").parse()?,
            value: vr.get("value"),
            stock: vr.get("stock"),
        });
    }

    Ok(Product {
        id: row.get("id"),
        name: row.get("name"),
        price: row.get("price"),
        compare_at_price: row.get("compare_at_price"),
        stock: row.get("stock"),
        low_stock_threshold: row.get("low_stock_threshold"),
        rating: row.get("rating"),
        review_count: row.get("review_count"),
        image: row.get("image"),
        is_active: row.get("is_active"),
        variants,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl ProductsRepository for PgProductsRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Product, RepositoryError> {
        let conn = self.pool.get().await?;
        let client: &tokio_postgres::Client = &conn;
        fetch_product(client, id).await
    }

    async fn get_by_id_tx(&self, tx: &Transaction<'_>, id: Uuid) -> Result<Product, RepositoryError> {
        fetch_product(tx, id).await
    }

    async fn reserve_stock_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let updated = tx
            .execute(
                "UPDATE products SET stock = stock - $2, updated_at = now() WHERE id = $1 AND stock >= $2",
                &[&id, &quantity],
            )
            .await?;
        if updated == 1 {
            return Ok(());
        }
        // Zero rows: either the product is gone or the stock check failed.
        let exists = tx
            .query_one("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)", &[&id])
            .await?;
        if exists.get::<_, bool>(0) {
            Err(RepositoryError::InsufficientStock)
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn release_stock_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let updated = tx
            .execute(
                "UPDATE products SET stock = stock + $2, updated_at = now() WHERE id = $1",
                &[&id, &quantity],
            )
            .await?;
        if updated == 1 {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn set_rating(
        &self,
        id: Uuid,
        rating: Decimal,
        review_count: i32,
    ) -> Result<(), RepositoryError> {
        let conn = self.pool.get().await?;
        let updated = conn
            .execute(
                "UPDATE products SET rating = $2, review_count = $3, updated_at = now() WHERE id = $1",
                &[&id, &rating, &review_count],
            )
            .await?;
        if updated == 1 {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}

/// # OrdersRepository
///
/// Persistence for the order aggregate: the order row, its line items and the
/// append-only status history. Writes that belong to a single business
/// operation (placement, cancellation, fulfillment update) take a transaction.
#[async_trait]
pub trait OrdersRepository: Send + Sync {
    /// Reserve the next order number from the dedicated sequence.
    /// Sequence values are handed out atomically, so concurrently created
    /// orders can never collide.
    async fn next_order_number(&self, tx: &Transaction<'_>) -> Result<String, RepositoryError>;

    /// Insert the aggregate: order row, items, seeded status history.
    async fn insert_tx(&self, tx: &Transaction<'_>, order: &Order) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Order, RepositoryError>;

    async fn get_by_id_tx(&self, tx: &Transaction<'_>, id: Uuid) -> Result<Order, RepositoryError>;

    /// A page of the user's orders, newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, RepositoryError>;

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, RepositoryError>;

    /// Whether the user has a delivered order containing the product
    /// (verified-purchase probe).
    async fn has_delivered_order_with_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, RepositoryError>;

    /// Write a new status (and, when set, payment status / delivered-at).
    async fn update_status_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError>;

    /// Append one history entry. History rows are never updated or deleted.
    async fn append_history_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
        change: &StatusChange,
    ) -> Result<(), RepositoryError>;

    /// Update tracking fields and notes; absent fields keep their value.
    async fn update_tracking_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
        update: &FulfillmentUpdate,
    ) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of [`OrdersRepository`].
pub struct PgOrdersRepository {
    pool: Pool,
}

impl PgOrdersRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn order_from_row(
    row: &Row,
    items: Vec<OrderItem>,
    status_history: Vec<StatusChange>,
) -> Result<Order, RepositoryError> {
    Ok(Order {
        id: row.get("id"),
        order_number: row.get("order_number"),
        user_id: row.get("user_id"),
        items,
        shipping_address: model::ShippingAddress {
            full_name: row.get("ship_full_name"),
            phone: row.get("ship_phone"),
            address_line1: row.get("ship_address_line1"),
            address_line2: row.get("ship_address_line2"),
            city: row.get("ship_city"),
            state: row.get("ship_state"),
            postal_code: row.get("ship_postal_code"),
            country: row.get("ship_country"),
        },
        status: row.get::<_, String>("status").parse()?,
        payment_method: row.get::<_, String>("payment_method").parse()?,
        payment_status: row.get::<_, String>("payment_status").parse()?,
        subtotal: row.get("subtotal"),
        discount: row.get("discount"),
        shipping: row.get("shipping"),
        tax: row.get("tax"),
        total: row.get("total"),
        coupon_code: row.get("coupon_code"),
        tracking_number: row.get("tracking_number"),
        tracking_url: row.get("tracking_url"),
        estimated_delivery: row.get("estimated_delivery"),
        delivered_at: row.get("delivered_at"),
        notes: row.get("notes"),
        status_history,
        created_at: row.get("created_at"),
    })
}

const ORDER_COLUMNS: &str = r#"
    id, order_number, user_id,
    ship_full_name, ship_phone, ship_address_line1, ship_address_line2,
    ship_city, ship_state, ship_postal_code, ship_country,
    status, payment_method, payment_status,
    subtotal, discount, shipping, tax, total, coupon_code,
    tracking_number, tracking_url, estimated_delivery, delivered_at, notes,
    created_at
"#;

async fn fetch_order_items<C: GenericClient>(
    client: &C,
    order_id: Uuid,
) -> Result<Vec<OrderItem>, RepositoryError> {
    let rows = client
        .query(
            r#"
            SELECT product_id, name, price, quantity, image, selected_size, selected_color
            FROM order_items WHERE order_id = $1 ORDER BY position
            "#,
            &[&order_id],
        )
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| OrderItem {
            product_id: row.get("product_id"),
            name: row.get("name"),
            price: row.get("price"),
            quantity: row.get("quantity"),
            image: row.get("image"),
            selected_size: row.get("selected_size"),
            selected_color: row.get("selected_color"),
        })
        .collect())
}

async fn fetch_status_history<C: GenericClient>(
    client: &C,
    order_id: Uuid,
) -> Result<Vec<StatusChange>, RepositoryError> {
    let rows = client
        .query(
            "SELECT status, changed_at, note FROM order_status_history WHERE order_id = $1 ORDER BY id",
            &[&order_id],
        )
        .await?;
    let mut history = Vec::with_capacity(rows.len());
    for row in rows {
        history.push(StatusChange {
            status: row.get::<_, String>("status").parse()?,
            changed_at: row.get("changed_at"),
            note: row.get("note"),
        });
    }
    Ok(history)
}

async fn fetch_order<C: GenericClient>(client: &C, id: Uuid) -> Result<Order, RepositoryError> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let row = client.query_opt(query.as_str(), &[&id]).await?;
    let row = row.ok_or(RepositoryError::NotFound)?;
    let items = fetch_order_items(client, id).await?;
    let history = fetch_status_history(client, id).await?;
    order_from_row(&row, items, history)
}

#[async_trait]
impl OrdersRepository for PgOrdersRepository {
    async fn next_order_number(&self, tx: &Transaction<'_>) -> Result<String, RepositoryError> {
        let row = tx.query_one("SELECT nextval('order_number_seq')", &[]).await?;
        let sequence: i64 = row.get(0);
        Ok(format_order_number(Utc::now().date_naive(), sequence))
    }

    async fn insert_tx(&self, tx: &Transaction<'_>, order: &Order) -> Result<(), RepositoryError> {
        let query = r#"
            INSERT INTO orders (
                id, order_number, user_id,
                ship_full_name, ship_phone, ship_address_line1, ship_address_line2,
                ship_city, ship_state, ship_postal_code, ship_country,
                status, payment_method, payment_status,
                subtotal, discount, shipping, tax, total, coupon_code,
                tracking_number, tracking_url, estimated_delivery, delivered_at, notes,
                created_at
            ) VALUES (
                $1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,
                $15,$16,$17,$18,$19,$20,$21,$22,$23,$24,$25,$26
            )
        "#;
        let address = &order.shipping_address;
        tx.execute(
            query,
            &[
                &order.id,
                &order.order_number,
                &order.user_id,
                &address.full_name,
                &address.phone,
                &address.address_line1,
                &address.address_line2,
                &address.city,
                &address.state,
                &address.postal_code,
                &address.country,
                &order.status.as_str(),
                &order.payment_method.as_str(),
                &order.payment_status.as_str(),
                &order.subtotal,
                &order.discount,
                &order.shipping,
                &order.tax,
                &order.total,
                &order.coupon_code,
                &order.tracking_number,
                &order.tracking_url,
                &order.estimated_delivery,
                &order.delivered_at,
                &order.notes,
                &order.created_at,
            ],
        )
        .await?;

        let item_query = r#"
            INSERT INTO order_items (
                order_id, position, product_id, name, price, quantity, image,
                selected_size, selected_color
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        "#;
        for (position, item) in order.items.iter().enumerate() {
            let position = position as i32;
            tx.execute(
                item_query,
                &[
                    &order.id,
                    &position,
                    &item.product_id,
                    &item.name,
                    &item.price,
                    &item.quantity,
                    &item.image,
                    &item.selected_size,
                    &item.selected_color,
                ],
            )
            .await?;
        }

        for change in &order.status_history {
            self.append_history_tx(tx, order.id, change).await?;
        }
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Order, RepositoryError> {
        let conn = self.pool.get().await?;
        let client: &tokio_postgres::Client = &conn;
        fetch_order(client, id).await
    }

    async fn get_by_id_tx(&self, tx: &Transaction<'_>, id: Uuid) -> Result<Order, RepositoryError> {
        fetch_order(tx, id).await
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let conn = self.pool.get().await?;
        let client: &tokio_postgres::Client = &conn;
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        let rows = client.query(query.as_str(), &[&user_id, &limit, &offset]).await?;
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.get("id");
            let items = fetch_order_items(client, id).await?;
            let history = fetch_status_history(client, id).await?;
            orders.push(order_from_row(&row, items, history)?);
        }
        Ok(orders)
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, RepositoryError> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_one("SELECT COUNT(*) FROM orders WHERE user_id = $1", &[&user_id])
            .await?;
        Ok(row.get(0))
    }

    async fn has_delivered_order_with_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_one(
                r#"
                SELECT EXISTS(
                    SELECT 1
                    FROM orders o
                    JOIN order_items i ON i.order_id = o.id
                    WHERE o.user_id = $1 AND i.product_id = $2 AND o.status = 'delivered'
                )
                "#,
                &[&user_id, &product_id],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn update_status_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let updated = tx
            .execute(
                r#"
                UPDATE orders
                SET status = $2,
                    payment_status = COALESCE($3, payment_status),
                    delivered_at = COALESCE($4, delivered_at)
                WHERE id = $1
                "#,
                &[&id, &status.as_str(), &payment_status.map(PaymentStatus::as_str), &delivered_at],
            )
            .await?;
        if updated == 1 {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn append_history_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
        change: &StatusChange,
    ) -> Result<(), RepositoryError> {
        tx.execute(
            "INSERT INTO order_status_history (order_id, status, changed_at, note) VALUES ($1,$2,$3,$4)",
            &[&id, &change.status.as_str(), &change.changed_at, &change.note],
        )
        .await?;
        Ok(())
    }

    async fn update_tracking_tx(
        &self,
        tx: &Transaction<'_>,
        id: Uuid,
        update: &FulfillmentUpdate,
    ) -> Result<(), RepositoryError> {
        let updated = tx
            .execute(
                r#"
                UPDATE orders
                SET tracking_number = COALESCE($2, tracking_number),
                    tracking_url = COALESCE($3, tracking_url),
                    estimated_delivery = COALESCE($4, estimated_delivery),
                    notes = COALESCE($5, notes)
                WHERE id = $1
                "#,
                &[
                    &id,
                    &update.tracking_number,
                    &update.tracking_url,
                    &update.estimated_delivery,
                    &update.notes,
                ],
            )
            .await?;
        if updated == 1 {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}

/// Average rating and count over a product's approved reviews.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub average: Decimal,
    pub count: i64,
}

/// # ReviewsRepository
///
/// Review CRUD plus the aggregate query the rating recomputation is built on.
#[async_trait]
pub trait ReviewsRepository: Send + Sync {
    async fn insert(&self, review: &Review) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Review, RepositoryError>;

    /// The (user, product) pair is unique; used as the duplicate probe.
    async fn find_by_user_and_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Review>, RepositoryError>;

    /// Persist owner-editable fields (rating, title, comment, updated-at).
    async fn update(&self, review: &Review) -> Result<(), RepositoryError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// A page of a product's approved reviews, newest first.
    async fn list_for_product(
        &self,
        product_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Review>, RepositoryError>;

    async fn count_for_product(&self, product_id: Uuid) -> Result<i64, RepositoryError>;

    /// AVG/COUNT over approved reviews; `(0, 0)` when none remain.
    async fn rating_summary(&self, product_id: Uuid) -> Result<RatingSummary, RepositoryError>;
}

/// PostgreSQL implementation of [`ReviewsRepository`].
pub struct PgReviewsRepository {
    pool: Pool,
}

impl PgReviewsRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn review_from_row(row: &Row) -> Review {
    Review {
        id: row.get("id"),
        user_id: row.get("user_id"),
        product_id: row.get("product_id"),
        rating: row.get("rating"),
        title: row.get("title"),
        comment: row.get("comment"),
        images: row.get("images"),
        verified_purchase: row.get("verified_purchase"),
        helpful_votes: row.get("helpful_votes"),
        is_approved: row.get("is_approved"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const REVIEW_COLUMNS: &str = r#"
    id, user_id, product_id, rating, title, comment, images,
    verified_purchase, helpful_votes, is_approved, created_at, updated_at
"#;

#[async_trait]
impl ReviewsRepository for PgReviewsRepository {
    async fn insert(&self, review: &Review) -> Result<(), RepositoryError> {
        let conn = self.pool.get().await?;
        conn.execute(
            r#"
            INSERT INTO reviews (
                id, user_id, product_id, rating, title, comment, images,
                verified_purchase, helpful_votes, is_approved, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            "#,
            &[
                &review.id,
                &review.user_id,
                &review.product_id,
                &review.rating,
                &review.title,
                &review.comment,
                &review.images,
                &review.verified_purchase,
                &review.helpful_votes,
                &review.is_approved,
                &review.created_at,
                &review.updated_at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Review, RepositoryError> {
        let conn = self.pool.get().await?;
        let query = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        let row = conn.query_opt(query.as_str(), &[&id]).await?;
        row.map(|row| review_from_row(&row)).ok_or(RepositoryError::NotFound)
    }

    async fn find_by_user_and_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Review>, RepositoryError> {
        let conn = self.pool.get().await?;
        let query = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = $1 AND product_id = $2");
        let row = conn.query_opt(query.as_str(), &[&user_id, &product_id]).await?;
        Ok(row.map(|row| review_from_row(&row)))
    }

    async fn update(&self, review: &Review) -> Result<(), RepositoryError> {
        let conn = self.pool.get().await?;
        let updated = conn
            .execute(
                "UPDATE reviews SET rating = $2, title = $3, comment = $4, updated_at = $5 WHERE id = $1",
                &[
                    &review.id,
                    &review.rating,
                    &review.title,
                    &review.comment,
                    &review.updated_at,
                ],
            )
            .await?;
        if updated == 1 {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let conn = self.pool.get().await?;
        let deleted = conn.execute("DELETE FROM reviews WHERE id = $1", &[&id]).await?;
        if deleted == 1 {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn list_for_product(
        &self,
        product_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Review>, RepositoryError> {
        let conn = self.pool.get().await?;
        let query = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = $1 AND is_approved ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        let rows = conn.query(query.as_str(), &[&product_id, &limit, &offset]).await?;
        Ok(rows.iter().map(review_from_row).collect())
    }

    async fn count_for_product(&self, product_id: Uuid) -> Result<i64, RepositoryError> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM reviews WHERE product_id = $1 AND is_approved",
                &[&product_id],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn rating_summary(&self, product_id: Uuid) -> Result<RatingSummary, RepositoryError> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_one(
                r#"
                SELECT COALESCE(AVG(rating), 0)::numeric AS average, COUNT(*) AS count
                FROM reviews WHERE product_id = $1 AND is_approved
                "#,
                &[&product_id],
            )
            .await?;
        Ok(RatingSummary {
            average: row.get("average"),
            count: row.get("count"),
        })
    }
}
