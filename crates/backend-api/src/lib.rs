//! HTTP surface of the Societas backend: axum router, handlers, services and
//! the chat-with-agent turn flow.

mod docs;
mod error;
mod extract;
mod state;
mod util;

pub mod routes;
pub mod services;

pub use docs::ApiDoc;
pub use error::{ApiError, ErrorResponse};
pub use extract::Json;
pub use state::AppState;
pub use util::{require_bearer, CurrentUser};

use axum::{
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    routing::{get, post},
    Router,
};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/home", get(routes::home::get_home_screen))
        // Auth routes
        .route("/api/auth/signup", post(routes::auth::sign_up))
        .route("/api/auth/signin", post(routes::auth::sign_in))
        .route("/api/auth/signout", post(routes::auth::sign_out))
        .route("/api/auth/refresh", post(routes::auth::refresh_token))
        .route("/api/auth/verify", post(routes::auth::verify_token))
        // User routes
        .route(
            "/api/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/api/users/:user_id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        // Agent routes
        .route(
            "/api/users/:user_id/agents",
            get(routes::agents::list_agents).post(routes::agents::create_agent),
        )
        .route(
            "/api/users/:user_id/agents/:agent_id",
            get(routes::agents::get_agent)
                .put(routes::agents::update_agent)
                .delete(routes::agents::delete_agent),
        )
        .route(
            "/api/users/:user_id/agents/:agent_id/subagents",
            get(routes::agents::list_subagents).post(routes::agents::create_subagent),
        )
        // Board and task routes
        .route(
            "/api/users/:user_id/boards",
            get(routes::boards::list_boards).post(routes::boards::create_board),
        )
        .route(
            "/api/users/:user_id/boards/:board_id",
            get(routes::boards::get_board)
                .put(routes::boards::update_board)
                .delete(routes::boards::delete_board),
        )
        .route(
            "/api/users/:user_id/boards/:board_id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/api/users/:user_id/boards/:board_id/tasks/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        // Chat and message routes
        .route(
            "/api/users/:user_id/chats",
            get(routes::chats::list_chats).post(routes::chats::create_chat),
        )
        .route(
            "/api/users/:user_id/chats/with/:agent_id",
            get(routes::chats::get_chat_with_agent),
        )
        .route(
            "/api/users/:user_id/chats/:chat_id",
            get(routes::chats::get_chat)
                .put(routes::chats::update_chat)
                .delete(routes::chats::delete_chat),
        )
        .route(
            "/api/users/:user_id/chats/:chat_id/messages",
            get(routes::messages::get_messages).post(routes::messages::send_message),
        )
        .route(
            "/api/users/:user_id/chats/:chat_id/messages/:message_id",
            get(routes::messages::get_message),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/docs/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer())
        .layer(trace_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}
