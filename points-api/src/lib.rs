// Points API Service Library
// HTTP surface over the points ledger: routing, request extraction, status mapping

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use points_ledger::{
    Allocation, Balances, Error, Ledger, SpendRequest, TransactionRequest, UserId,
    ValidationError,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Ledger,
}

impl AppState {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SpendResponse {
    pub committed: Vec<Allocation>,
}

// JSON body extractor whose rejections render like every other client error
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

// Error handling
#[derive(Debug)]
pub enum ApiError {
    Ledger(Error),
    Body(JsonRejection),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Ledger(Error::Validation(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Ledger(err) => err,
            ApiError::Body(rejection) => {
                return (
                    rejection.status(),
                    Json(json!({
                        "error": "body",
                        "message": rejection.body_text(),
                    })),
                )
                    .into_response();
            }
        };

        match err {
            Error::Validation(err) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": err.field,
                    "message": err.message,
                })),
            )
                .into_response(),
            Error::InsufficientPoints {
                requested,
                available,
            } => (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "insufficient",
                    "message": "Cannot spend more than available",
                    "requested": requested,
                    "available": available,
                })),
            )
                .into_response(),
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "internal",
                        "message": "Internal server error",
                    })),
                )
                    .into_response()
            }
        }
    }
}

// Liveness probe
async fn status() -> Json<StatusResponse> {
    Json(StatusResponse { status: "OK" })
}

// Prometheus metrics endpoint
async fn metrics_handler(State(state): State<AppState>) -> Result<String, ApiError> {
    state
        .ledger
        .metrics()
        .export()
        .map_err(|e| ApiError::Ledger(Error::from(e)))
}

async fn add_transaction(
    State(state): State<AppState>,
    Path(user): Path<String>,
    ApiJson(request): ApiJson<TransactionRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .ledger
        .add_transaction(&UserId::new(user), request)
        .await?;
    Ok(StatusCode::OK)
}

async fn get_balances(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<Balances>, ApiError> {
    let balances = state.ledger.get_balances(&UserId::new(user)).await?;
    Ok(Json(balances))
}

async fn spend(
    State(state): State<AppState>,
    Path(user): Path<String>,
    ApiJson(request): ApiJson<SpendRequest>,
) -> Result<Json<SpendResponse>, ApiError> {
    let points = request.validate()?;
    let committed = state.ledger.spend(&UserId::new(user), points).await?;
    Ok(Json(SpendResponse { committed }))
}

// Read-only preview of what a spend would deduct
async fn plan(
    State(state): State<AppState>,
    Path(user): Path<String>,
    ApiJson(request): ApiJson<SpendRequest>,
) -> Result<Json<Vec<Allocation>>, ApiError> {
    let points = request.validate()?;
    let plan = state
        .ledger
        .create_spending_plan(&UserId::new(user), points)
        .await?;
    Ok(Json(plan.into_allocations()))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/status", get(status))
        .route("/metrics", get(metrics_handler))
        .route("/points/user/:user/transaction", post(add_transaction))
        .route("/points/user/:user/balances", get(get_balances))
        .route("/points/user/:user/spend", post(spend))
        .route("/points/user/:user/plan", post(plan))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
