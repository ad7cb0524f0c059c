use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
    typed_header::TypedHeaderRejection,
};
use tower_http::trace::TraceLayer;

use std::sync::Arc;

use crate::{ServerError, accounts, budgets, categories};
use engine::{Engine, EngineError};

/// Categories per page when nothing is configured.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub page_size: u64,
}

impl ServerState {
    pub fn new(engine: Engine, page_size: Option<u64>) -> Self {
        Self {
            engine: Arc::new(engine),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
        }
    }
}

/// `TypedHeader` for token authentication
///
/// Requests must carry `Authorization: Token <key>`.
#[derive(Debug, Clone)]
pub(crate) struct TokenAuthorization(pub String);

impl Header for TokenAuthorization {
    fn name() -> &'static HeaderName {
        &header::AUTHORIZATION
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let mut parts = value.split_whitespace();
        let (Some(scheme), Some(key), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AxumError::invalid());
        };
        if !scheme.eq_ignore_ascii_case("token") {
            return Err(AxumError::invalid());
        }

        Ok(TokenAuthorization(key.to_string()))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        match HeaderValue::from_str(&format!("Token {}", self.0)) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode token authorization header"),
        }
    }
}

async fn auth(
    State(state): State<ServerState>,
    token: Result<TypedHeader<TokenAuthorization>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Ok(TypedHeader(token)) = token else {
        return Err(EngineError::Unauthenticated.into());
    };

    let user = state.engine.authenticate(&token.0).await?;

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(token);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/accounts/logout", post(accounts::logout))
        .route(
            "/budget/categories/",
            get(categories::list).post(categories::create),
        )
        .route(
            "/budget/categories/{id}",
            get(categories::detail)
                .put(categories::rename)
                .patch(categories::rename),
        )
        .route(
            "/budget/categories/{category_id}/add_user/{user_id}",
            get(categories::add_user),
        )
        .route(
            "/budget/budgets/{category_id}",
            get(budgets::list).post(budgets::create),
        )
        .route(
            "/budget/budgets/{category_id}/summary",
            get(budgets::summary),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/accounts/register", post(accounts::register))
        .route("/accounts/login", post(accounts::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(state: ServerState, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(state, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
