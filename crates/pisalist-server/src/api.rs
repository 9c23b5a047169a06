use std::sync::Arc;

use axum::{
    async_trait,
    extract::{
        rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request, State,
    },
    http::{header::AUTHORIZATION, request::Parts, Method},
    routing::{get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use pisalist_core::{AuthGate, Session, TaskLifecycle, WishSharing};
use pisalist_shared::constants::API_PREFIX;
use pisalist_shared::token::TokenSigner;
use pisalist_shared::{
    CoreResult, Principal, PrincipalId, SharedWish, Task, TaskId, TaskUpdate, Wish, WishId,
    WishUpdate,
};
use pisalist_store::Database;

use crate::error::ServerError;

type Store = Arc<Database>;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthGate<Store>>,
    pub tasks: Arc<TaskLifecycle<Store>>,
    pub wishes: Arc<WishSharing<Store, Store>>,
}

impl AppState {
    /// Wire every service to the same database handle.
    pub fn new(db: Store, signer: TokenSigner) -> Self {
        Self {
            auth: Arc::new(AuthGate::new(db.clone(), signer)),
            tasks: Arc::new(TaskLifecycle::new(db.clone())),
            wishes: Arc::new(WishSharing::new(db.clone(), db)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(health_check))
        // -- Public --
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/wishes/community", get(list_community))
        .route("/wishes/random", get(draw_random))
        // -- Authenticated --
        .route("/me", get(me))
        .route("/tasks", post(create_task).get(list_tasks))
        .route("/tasks/today", get(list_today))
        .route("/tasks/timeline", get(list_timeline))
        .route("/tasks/:id", put(update_task).delete(delete_task))
        .route("/tasks/:id/complete", put(toggle_task))
        .route("/tasks/:id/importance", put(set_importance))
        .route("/wishes", post(create_wish).get(list_wishes))
        .route("/wishes/:id", put(update_wish).delete(delete_wish))
        .route("/wishes/:id/share", post(share_wish));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

// ─── Authentication ───

/// The principal a request's bearer token was issued for.
///
/// Accepts `Authorization: Bearer <token>` as well as a bare token.
pub struct AuthPrincipal(pub PrincipalId);

#[async_trait]
impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let token = header.strip_prefix("Bearer ").unwrap_or(header);
        let principal_id = state.auth.validate_token(token)?;
        Ok(AuthPrincipal(principal_id))
    }
}

// ─── Body and path extraction ───

/// JSON body whose rejections are reported as `{"error": ..}` with status 400.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Path parameters whose rejections are reported like [`ApiJson`]'s.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(ApiPath(value))
    }
}

/// Run a synchronous core call on the blocking pool.
async fn blocking<T, F>(call: F) -> Result<T, ServerError>
where
    F: FnOnce() -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| ServerError::Internal(format!("Blocking task failed: {e}")))?
        .map_err(ServerError::from)
}

// ─── Request / response bodies ───

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Deserialize)]
struct RegisterRequest {
    username: String,
    password: String,
    email: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct CreateTaskRequest {
    event: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_cycle: bool,
    #[serde(default)]
    importance_level: i64,
}

#[derive(Deserialize)]
struct ImportanceRequest {
    importance_level: i64,
}

#[derive(Deserialize)]
struct CreateWishRequest {
    event: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_cycle: bool,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─── Accounts ───

async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<Session>, ServerError> {
    let auth = state.auth.clone();
    let session =
        blocking(move || auth.register(&req.username, &req.password, &req.email)).await?;
    Ok(Json(session))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<Session>, ServerError> {
    let auth = state.auth.clone();
    let session = blocking(move || auth.login(&req.username, &req.password)).await?;
    Ok(Json(session))
}

async fn me(
    State(state): State<AppState>,
    AuthPrincipal(principal_id): AuthPrincipal,
) -> Result<Json<Principal>, ServerError> {
    let auth = state.auth.clone();
    let principal = blocking(move || auth.principal(principal_id)).await?;
    Ok(Json(principal))
}

// ─── Tasks ───

async fn create_task(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> Result<Json<Task>, ServerError> {
    let tasks = state.tasks.clone();
    let task = blocking(move || {
        tasks.create(
            owner,
            req.event,
            req.description,
            req.is_cycle,
            req.importance_level,
        )
    })
    .await?;
    Ok(Json(task))
}

async fn list_tasks(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
) -> Result<Json<Vec<Task>>, ServerError> {
    let tasks = state.tasks.clone();
    Ok(Json(blocking(move || tasks.list_all(owner)).await?))
}

async fn list_today(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
) -> Result<Json<Vec<Task>>, ServerError> {
    let tasks = state.tasks.clone();
    Ok(Json(blocking(move || tasks.list_today(owner)).await?))
}

async fn list_timeline(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
) -> Result<Json<Vec<Task>>, ServerError> {
    let tasks = state.tasks.clone();
    Ok(Json(blocking(move || tasks.list_timeline(owner)).await?))
}

async fn update_task(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<TaskUpdate>,
) -> Result<Json<Task>, ServerError> {
    let tasks = state.tasks.clone();
    let task = blocking(move || tasks.update(owner, TaskId(id), update)).await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ServerError> {
    let tasks = state.tasks.clone();
    blocking(move || tasks.delete(owner, TaskId(id))).await?;
    Ok(Json(MessageResponse { message: "Deleted" }))
}

async fn toggle_task(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Task>, ServerError> {
    let tasks = state.tasks.clone();
    let task = blocking(move || tasks.toggle_completion(owner, TaskId(id))).await?;
    Ok(Json(task))
}

async fn set_importance(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<ImportanceRequest>,
) -> Result<Json<Task>, ServerError> {
    let tasks = state.tasks.clone();
    let task =
        blocking(move || tasks.set_importance(owner, TaskId(id), req.importance_level)).await?;
    Ok(Json(task))
}

// ─── Wishes ───

async fn create_wish(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
    ApiJson(req): ApiJson<CreateWishRequest>,
) -> Result<Json<Wish>, ServerError> {
    let wishes = state.wishes.clone();
    let wish =
        blocking(move || wishes.create(owner, req.event, req.description, req.is_cycle)).await?;
    Ok(Json(wish))
}

async fn list_wishes(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
) -> Result<Json<Vec<Wish>>, ServerError> {
    let wishes = state.wishes.clone();
    Ok(Json(blocking(move || wishes.list_mine(owner)).await?))
}

async fn update_wish(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<WishUpdate>,
) -> Result<Json<Wish>, ServerError> {
    let wishes = state.wishes.clone();
    let wish = blocking(move || wishes.update(owner, WishId(id), update)).await?;
    Ok(Json(wish))
}

async fn delete_wish(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ServerError> {
    let wishes = state.wishes.clone();
    blocking(move || wishes.delete(owner, WishId(id))).await?;
    Ok(Json(MessageResponse { message: "Deleted" }))
}

async fn share_wish(
    State(state): State<AppState>,
    AuthPrincipal(owner): AuthPrincipal,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SharedWish>, ServerError> {
    let wishes = state.wishes.clone();
    let shared = blocking(move || wishes.share(owner, WishId(id))).await?;
    Ok(Json(shared))
}

// ─── Community (public) ───

async fn list_community(
    State(state): State<AppState>,
) -> Result<Json<Vec<SharedWish>>, ServerError> {
    let wishes = state.wishes.clone();
    Ok(Json(blocking(move || wishes.list_community()).await?))
}

async fn draw_random(State(state): State<AppState>) -> Result<Json<SharedWish>, ServerError> {
    let wishes = state.wishes.clone();
    Ok(Json(blocking(move || wishes.draw_random()).await?))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
