//! Storefront Backend Application
//!
//! Entry point for the order placement & inventory reservation service.
//! The application exposes a REST API for placing and cancelling orders,
//! admin fulfillment updates, and product reviews with an aggregated
//! product rating.
//!
//! # Architecture
//!
//! The application follows a modular architecture with:
//! - Repository layer for data access
//! - Service layer for business logic (transactional stock reservation)
//! - API layer for HTTP endpoints
//! - Metrics for monitoring

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use app_config::AppConfig;
use repository::{PgOrdersRepository, PgProductsRepository, PgReviewsRepository};
use server::Server;
use service::{OrderServiceImpl, ReviewServiceImpl};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("Storefront backend starting...");

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize database (creates the pool and applies migrations)
    let db_pool = match db::init_db_pool(&config).await {
        Ok(pool) => {
            info!("Database initialized successfully");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.context("Database connection is required"));
        }
    };

    // Repositories share the pool; transactions are opened by the services.
    let order_service = Arc::new(OrderServiceImpl::new(
        db_pool.clone(),
        PgProductsRepository::new(db_pool.clone()),
        PgOrdersRepository::new(db_pool.clone()),
    ));
    let review_service = Arc::new(ReviewServiceImpl::new(
        PgReviewsRepository::new(db_pool.clone()),
        PgProductsRepository::new(db_pool.clone()),
        PgOrdersRepository::new(db_pool.clone()),
    ));

    let http_server = Server::new(config.http_port, order_service, review_service);
    http_server.start().await?;

    info!("Application stopped");
    Ok(())
}
