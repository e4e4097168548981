//! HTTP layer for the order and review API.
//!
//! Exposes the JSON endpoints for placing, reading and cancelling orders, the
//! admin fulfillment update, and review CRUD, plus `/health` and prometheus
//! `/metrics`. Responses use the `{success, data | message}` envelope; list
//! endpoints add a `pagination` object.
//!
//! Authentication itself happens upstream: handlers read the caller identity
//! from the `x-user-id`/`x-user-role` headers set by the gateway.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{FromRequestParts, Path as AxumPath, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use model::{
    Caller, CreateReviewRequest, FulfillmentUpdate, PlaceOrderRequest, Role, UpdateReviewRequest,
};
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use serde::{Deserialize, Serialize};
use serde_json::json;
use service::{OrderService, PagedResult, ReviewService, ServiceError};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

/// Server represents the HTTP server for the storefront backend.
pub struct Server {
    port: u16,
    state: AppState,
}

/// Metrics collects and exposes HTTP server metrics.
struct Metrics {
    registry: Registry,
    http_requests_total: CounterVec,
    http_request_duration_seconds: HistogramVec,
    errors_total: CounterVec,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "endpoint", "status"],
        )
        .expect("Failed to create http_requests_total metric");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "endpoint"],
        )
        .expect("Failed to create http_request_duration_seconds metric");

        let errors_total = CounterVec::new(
            Opts::new("errors_total", "Total number of errors"),
            &["source", "endpoint"],
        )
        .expect("Failed to create errors_total metric");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("Failed to register http_requests_total metric");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("Failed to register http_request_duration_seconds metric");
        registry
            .register(Box::new(errors_total.clone()))
            .expect("Failed to register errors_total metric");

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            errors_total,
        }
    }

    fn record_request(&self, method: &str, endpoint: &str, status: u16, duration: Duration) {
        self.http_requests_total
            .with_label_values(&[method, endpoint, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration.as_secs_f64());
    }

    fn record_error(&self, source: &str, endpoint: &str) {
        self.errors_total
            .with_label_values(&[source, endpoint])
            .inc();
    }
}

/// Application state shared between request handlers.
#[derive(Clone)]
struct AppState {
    order_service: Arc<dyn OrderService>,
    review_service: Arc<dyn ReviewService>,
    metrics: Arc<Metrics>,
}

impl Server {
    /// Creates a new Server instance.
    ///
    /// # Arguments
    ///
    /// * `port` - The port on which the server will listen
    /// * `order_service` - Order placement/lifecycle operations
    /// * `review_service` - Review CRUD + rating aggregation
    pub fn new(
        port: u16,
        order_service: Arc<dyn OrderService>,
        review_service: Arc<dyn ReviewService>,
    ) -> Self {
        info!("Initializing HTTP server on port {}", port);

        Self {
            port,
            state: AppState {
                order_service,
                review_service,
                metrics: Arc::new(Metrics::new()),
            },
        }
    }

    /// Starts the server and blocks until it's shut down.
    pub async fn start(&self) -> Result<()> {
        let app = self.create_router();

        let listener = TcpListener::bind(format!("0.0.0.0:{}", self.port))
            .await
            .context("Failed to bind to port")?;

        info!("HTTP server listening on port {}", self.port);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        info!("HTTP server shut down gracefully");
        Ok(())
    }

    fn create_router(&self) -> Router {
        let metrics = self.state.metrics.clone();

        Router::new()
            .route("/api/orders", post(create_order))
            .route("/api/orders/my-orders", get(my_orders))
            .route("/api/orders/{id}", get(get_order))
            .route("/api/orders/{id}/cancel", put(cancel_order))
            .route("/api/admin/orders/{id}", put(admin_update_order))
            .route("/api/products/{id}/reviews", get(product_reviews))
            .route("/api/reviews", post(create_review))
            .route("/api/reviews/{id}", put(update_review).delete(delete_review))
            .route("/health", get(handle_health))
            .route("/metrics", get(handle_metrics))
            .layer(axum::middleware::from_fn_with_state(
                metrics,
                metrics_middleware,
            ))
            .with_state(self.state.clone())
    }
}

/// Middleware for collecting metrics on HTTP requests.
async fn metrics_middleware(
    State(metrics): State<Arc<Metrics>>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let start = std::time::Instant::now();
    let response = next.run(req).await;
    let status = response.status().as_u16();

    metrics.record_request(&method, &path, status, start.elapsed());
    if status >= 400 {
        metrics.record_error("http", &path);
    }

    response
}

/// Error envelope returned by every handler.
enum ApiError {
    Unauthorized(&'static str),
    Service(ServiceError),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.to_string()),
            ApiError::Service(err) => match err {
                ServiceError::Validation(message) => (StatusCode::BAD_REQUEST, message),
                ServiceError::NotFound(message) => (StatusCode::NOT_FOUND, message),
                ServiceError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
                ServiceError::Conflict(message) => (StatusCode::CONFLICT, message),
                other => {
                    // Storage details stay in the log, not on the wire.
                    error!("Request failed: {other}");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
                }
            },
        };
        (
            status,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

/// Caller identity extracted from the gateway-set headers.
struct Identity(Caller);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or(ApiError::Unauthorized("Authentication required"))?;
        let role = match parts
            .headers
            .get("x-user-role")
            .and_then(|value| value.to_str().ok())
        {
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|_| ApiError::Unauthorized("Unknown role"))?,
            None => Role::Customer,
        };
        Ok(Identity(Caller { user_id, role }))
    }
}

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<u32>,
    limit: Option<u32>,
}

impl PageParams {
    fn normalize(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }
}

fn success<T: Serialize>(data: &T) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "data": data }))
}

fn paginated<T: Serialize>(result: &PagedResult<T>, page: u32, limit: u32) -> Json<serde_json::Value> {
    let pages = (result.total + i64::from(limit) - 1) / i64::from(limit);
    Json(json!({
        "success": true,
        "data": result.items,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": result.total,
            "pages": pages,
        }
    }))
}

async fn create_order(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Response, ApiError> {
    let order = state.order_service.place_order(caller.user_id, request).await?;
    Ok((StatusCode::CREATED, success(&order)).into_response())
}

async fn my_orders(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let (page, limit) = params.normalize();
    let result = state
        .order_service
        .list_orders_for_user(caller.user_id, page, limit)
        .await?;
    Ok(paginated(&result, page, limit).into_response())
}

async fn get_order(
    State(state): State<AppState>,
    Identity(caller): Identity,
    AxumPath(order_id): AxumPath<Uuid>,
) -> Result<Response, ApiError> {
    let order = state.order_service.get_order(caller, order_id).await?;
    Ok(success(&order).into_response())
}

async fn cancel_order(
    State(state): State<AppState>,
    Identity(caller): Identity,
    AxumPath(order_id): AxumPath<Uuid>,
) -> Result<Response, ApiError> {
    let order = state.order_service.cancel_order(caller.user_id, order_id).await?;
    Ok(success(&order).into_response())
}

async fn admin_update_order(
    State(state): State<AppState>,
    Identity(caller): Identity,
    AxumPath(order_id): AxumPath<Uuid>,
    Json(update): Json<FulfillmentUpdate>,
) -> Result<Response, ApiError> {
    if !caller.is_admin() {
        return Err(ServiceError::Forbidden("Admin access required".into()).into());
    }
    let order = state.order_service.update_fulfillment(order_id, update).await?;
    Ok(success(&order).into_response())
}

async fn product_reviews(
    State(state): State<AppState>,
    AxumPath(product_id): AxumPath<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let (page, limit) = params.normalize();
    let result = state
        .review_service
        .list_reviews_for_product(product_id, page, limit)
        .await?;
    Ok(paginated(&result, page, limit).into_response())
}

async fn create_review(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Response, ApiError> {
    let review = state.review_service.create_review(caller.user_id, request).await?;
    Ok((StatusCode::CREATED, success(&review)).into_response())
}

async fn update_review(
    State(state): State<AppState>,
    Identity(caller): Identity,
    AxumPath(review_id): AxumPath<Uuid>,
    Json(request): Json<UpdateReviewRequest>,
) -> Result<Response, ApiError> {
    let review = state
        .review_service
        .update_review(caller.user_id, review_id, request)
        .await?;
    Ok(success(&review).into_response())
}

async fn delete_review(
    State(state): State<AppState>,
    Identity(caller): Identity,
    AxumPath(review_id): AxumPath<Uuid>,
) -> Result<Response, ApiError> {
    state.review_service.delete_review(caller, review_id).await?;
    Ok(Json(json!({ "success": true, "message": "Review deleted" })).into_response())
}

async fn handle_health() -> &'static str {
    "OK"
}

async fn handle_metrics(State(state): State<AppState>) -> Response {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&state.metrics.registry.gather(), &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response();
    }

    match String::from_utf8(buffer) {
        Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
        Err(e) => {
            error!("Failed to convert metrics to UTF-8: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Invalid metrics data").into_response()
        }
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use model::{Order, Review};
    use tower::ServiceExt;

    struct StubOrderService;

    #[async_trait]
    impl OrderService for StubOrderService {
        async fn place_order(
            &self,
            _user_id: Uuid,
            request: PlaceOrderRequest,
        ) -> Result<Order, ServiceError> {
            if request.items.is_empty() {
                return Err(ServiceError::Validation("No order items".into()));
            }
            Err(ServiceError::Validation(format!(
                "Product not found: {}",
                request.items[0].product
            )))
        }

        async fn get_order(&self, _caller: Caller, _order_id: Uuid) -> Result<Order, ServiceError> {
            Err(ServiceError::NotFound("Order not found".into()))
        }

        async fn list_orders_for_user(
            &self,
            _user_id: Uuid,
            _page: u32,
            _limit: u32,
        ) -> Result<PagedResult<Order>, ServiceError> {
            Ok(PagedResult { items: Vec::new(), total: 0 })
        }

        async fn cancel_order(&self, _user_id: Uuid, _order_id: Uuid) -> Result<Order, ServiceError> {
            Err(ServiceError::Conflict("Cannot cancel order in current status".into()))
        }

        async fn update_fulfillment(
            &self,
            _order_id: Uuid,
            _update: FulfillmentUpdate,
        ) -> Result<Order, ServiceError> {
            Err(ServiceError::NotFound("Order not found".into()))
        }
    }

    struct StubReviewService;

    #[async_trait]
    impl ReviewService for StubReviewService {
        async fn create_review(
            &self,
            _user_id: Uuid,
            _request: CreateReviewRequest,
        ) -> Result<Review, ServiceError> {
            Err(ServiceError::NotFound("Product not found".into()))
        }

        async fn update_review(
            &self,
            _user_id: Uuid,
            _review_id: Uuid,
            _request: UpdateReviewRequest,
        ) -> Result<Review, ServiceError> {
            Err(ServiceError::NotFound("Review not found".into()))
        }

        async fn delete_review(&self, _caller: Caller, _review_id: Uuid) -> Result<(), ServiceError> {
            Err(ServiceError::NotFound("Review not found".into()))
        }

        async fn list_reviews_for_product(
            &self,
            _product_id: Uuid,
            _page: u32,
            _limit: u32,
        ) -> Result<PagedResult<Review>, ServiceError> {
            Ok(PagedResult { items: Vec::new(), total: 0 })
        }

        async fn recompute_product_rating(&self, _product_id: Uuid) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    fn test_router() -> Router {
        Server::new(8080, Arc::new(StubOrderService), Arc::new(StubReviewService)).create_router()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let response = test_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_identity_is_unauthorized() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/api/orders/my-orders")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn empty_cart_is_bad_request() {
        let payload = json!({
            "items": [],
            "shippingAddress": {
                "fullName": "Jane Roe",
                "phone": "+15550001111",
                "addressLine1": "1 Main St",
                "city": "Springfield",
                "state": "IL",
                "postalCode": "62701"
            },
            "paymentMethod": "card"
        });
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/orders")
                    .header("content-type", "application/json")
                    .header("x-user-id", Uuid::new_v4().to_string())
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "No order items");
    }

    #[tokio::test]
    async fn paginated_list_carries_envelope() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/api/orders/my-orders?page=2&limit=5")
                    .header("x-user-id", Uuid::new_v4().to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["pagination"]["page"], 2);
        assert_eq!(body["pagination"]["limit"], 5);
        assert_eq!(body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn non_admin_cannot_update_fulfillment() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/admin/orders/{}", Uuid::new_v4()))
                    .header("content-type", "application/json")
                    .header("x-user-id", Uuid::new_v4().to_string())
                    .header("x-user-role", "customer")
                    .body(Body::from(json!({ "status": "shipped" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
