use axum::{
    extract::{Form, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::{io, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    app::{AuthFlow, ProtectedResources},
    auth::{RoleBinding, SessionStore, Subject, SESSION_COOKIE},
    error::Error,
    kubeconfig::ContextEntry,
};

pub const NO_KUBECONFIG_NOTICE: &str =
    "No kubeconfig found or no contexts available. Application running without kubeconfig.";

#[derive(OpenApi)]
#[openapi(
    paths(contexts_handler, select_context_handler, home_handler, logout_handler),
    components(schemas(
        ContextListing,
        ContextEntry,
        SelectContextForm,
        ProtectedResources,
        RoleBinding,
        Subject,
        ErrorBody
    ))
)]
struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct ContextListing {
    contexts: Vec<ContextEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_context: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectContextForm {
    #[serde(default)]
    context: String,
}

#[derive(Serialize, ToSchema)]
struct ErrorBody {
    error: String,
}

pub struct WebServerState {
    pub flow: AuthFlow,
    pub sessions: SessionStore,
}

impl WebServerState {
    pub fn new(flow: AuthFlow, sessions: SessionStore) -> Self {
        Self { flow, sessions }
    }
}

// Per-request failures end here as a status and a JSON error body.
fn error_response(err: Error) -> Response {
    let status = err.status();
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    } else {
        warn!(error = %err, %status, "Request rejected");
    }

    let message = match err {
        Error::Forbidden(_) => "Access denied: You are not authorized to view this page.".to_string(),
        other => other.to_string(),
    };
    (status, Json(ErrorBody { error: message })).into_response()
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

// Handler for /
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Contexts available for selection, or a plain-text notice when no kubeconfig is loaded", body = ContextListing)
    )
)]
async fn contexts_handler(State(state): State<Arc<WebServerState>>) -> Response {
    let store = match state.flow.store() {
        Ok(store) => store,
        Err(_) => return (StatusCode::OK, NO_KUBECONFIG_NOTICE).into_response(),
    };

    let listing = ContextListing {
        contexts: store.contexts().to_vec(),
        current_context: store.current_context().map(str::to_string),
    };

    (StatusCode::OK, Json(serde_json::json!({ "data": listing }))).into_response()
}

// Handler for /select-context
#[utoipa::path(
    post,
    path = "/select-context",
    request_body(content = SelectContextForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Authenticated, redirect to /home with a session cookie"),
        (status = 400, description = "No kubeconfig, or unknown context", body = ErrorBody),
        (status = 401, description = "mTLS probe against the cluster failed", body = ErrorBody),
        (status = 500, description = "Corrupt certificate material in the kubeconfig", body = ErrorBody)
    )
)]
async fn select_context_handler(
    State(state): State<Arc<WebServerState>>,
    jar: CookieJar,
    Form(form): Form<SelectContextForm>,
) -> Response {
    let authenticated = match state.flow.authenticate(&form.context).await {
        Ok(authenticated) => authenticated,
        Err(e) => return error_response(e),
    };

    let session_id = state
        .sessions
        .create(authenticated.identity, authenticated.context);
    info!(context = %form.context, "Session created");

    (
        jar.add(session_cookie(session_id.to_string())),
        Redirect::to("/home"),
    )
        .into_response()
}

// Handler for /home
#[utoipa::path(
    get,
    path = "/home",
    responses(
        (status = 200, description = "Role bindings visible to an authorized user", body = ProtectedResources),
        (status = 303, description = "Not authenticated, redirect to /"),
        (status = 403, description = "User lacks the required role", body = ErrorBody),
        (status = 500, description = "Role bindings could not be listed", body = ErrorBody)
    )
)]
async fn home_handler(State(state): State<Arc<WebServerState>>, jar: CookieJar) -> Response {
    let Some(session) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.identity(cookie.value()))
    else {
        return Redirect::to("/").into_response();
    };

    match state.flow.authorize(&session).await {
        Ok(resources) => {
            (StatusCode::OK, Json(serde_json::json!({ "data": resources }))).into_response()
        }
        Err(e) => error_response(e),
    }
}

// Handler for /logout
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Session ended, redirect to /"))
)]
async fn logout_handler(State(state): State<Arc<WebServerState>>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value());
    }

    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/"),
    )
        .into_response()
}

async fn health_check() -> &'static str {
    "OK"
}

pub fn router(state: Arc<WebServerState>) -> Router {
    Router::new()
        .route("/", get(contexts_handler))
        .route("/select-context", post(select_context_handler))
        .route("/home", get(home_handler))
        .route("/logout", post(logout_handler))
        .route("/health", get(health_check))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .with_state(state)
}

pub async fn start_web_server(
    state: Arc<WebServerState>,
    addr: &str,
    shutdown: tokio::sync::oneshot::Receiver<()>,
) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!(%addr, error = %e, "Failed to bind");
        e
    })?;
    info!(addr = %listener.local_addr()?, "Web server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            shutdown.await.ok();
        })
        .await
}
