use axum::{
    Extension, Json, Router,
    extract::{Request, State},
    http::{HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use std::sync::Arc;

use crate::{
    ServerError,
    acl::{Acl, Permission, Principal},
    auth, budgets, categories, notifications, statistics,
    token::TokenConfig,
    transactions, user,
};
use api_types::health::{Banner, Health};
use engine::{Engine, EngineError};

/// Runtime options of the HTTP layer.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub tokens: TokenConfig,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: Arc<TokenConfig>,
    pub acl: Arc<Acl>,
}

/// Authenticate the bearer token and check the permission implied by the
/// request method.
async fn authenticate(
    State(state): State<ServerState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Ok(TypedHeader(Authorization(bearer))) = bearer else {
        tracing::warn!(path = %request.uri().path(), "request without bearer token");
        return Err(ServerError::Unauthorized("Missing bearer token".to_string()));
    };

    let user_id = state.tokens.verify(bearer.token()).inspect_err(|_| {
        tracing::warn!(path = %request.uri().path(), "rejected bearer token");
    })?;
    let principal = match state.engine.user(user_id).await {
        Ok(user) => Principal::from(user),
        Err(EngineError::KeyNotFound(_)) => {
            tracing::warn!(user_id, "token subject no longer exists");
            return Err(ServerError::Unauthorized("User not found".to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    let permission = Permission::for_method(request.method());
    if !state.acl.permits(&principal, permission) {
        tracing::warn!(user_id, email = %principal.email, ?permission, "permission denied");
        return Err(ServerError::Forbidden("Forbidden".to_string()));
    }
    tracing::debug!(
        user_id,
        email = %principal.email,
        path = %request.uri().path(),
        "authenticated"
    );

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Extra permission check layered on top of [`authenticate`].
async fn require_permission(
    State((acl, permission)): State<(Arc<Acl>, Permission)>,
    Extension(principal): Extension<Principal>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if !acl.permits(&principal, permission) {
        tracing::warn!(
            user_id = principal.user_id,
            email = %principal.email,
            ?permission,
            "permission denied"
        );
        return Err(ServerError::Forbidden("Forbidden".to_string()));
    }
    Ok(next.run(request).await)
}

async fn banner() -> Json<Banner> {
    Json(Banner {
        name: "Momono API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn health(State(state): State<ServerState>) -> Result<Json<Health>, ServerError> {
    state.engine.ping().await?;
    Ok(Json(Health {
        status: "ok".to_string(),
    }))
}

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Build the application router.
pub fn router(engine: Engine, config: ServerConfig) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
        tokens: Arc::new(config.tokens),
        acl: Arc::new(Acl::default()),
    };

    let admin = Router::new()
        .route("/api/users", get(user::list))
        .route_layer(middleware::from_fn_with_state(
            (state.acl.clone(), Permission::ManageUsers),
            require_permission,
        ));

    let protected = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/user/profile", get(user::profile))
        .route("/api/profile", put(user::update_profile))
        .route("/api/budgets", get(budgets::list).post(budgets::create))
        .route(
            "/api/budgets/{id}",
            get(budgets::get)
                .put(budgets::update)
                .delete(budgets::delete),
        )
        .route(
            "/api/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/api/categories/{id}",
            put(categories::update).delete(categories::delete),
        )
        .route(
            "/api/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/api/transactions/{id}",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::delete),
        )
        .route("/api/stats/monthly", get(statistics::monthly))
        .route("/api/stats/by-category", get(statistics::by_category))
        .route("/api/notifications", get(notifications::list))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        .layer(cors(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine, config)).await
}
