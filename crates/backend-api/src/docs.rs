use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::home::get_home_screen,
        crate::routes::auth::sign_up,
        crate::routes::auth::sign_in,
        crate::routes::auth::sign_out,
        crate::routes::auth::refresh_token,
        crate::routes::auth::verify_token,
        crate::routes::users::list_users,
        crate::routes::users::create_user,
        crate::routes::users::get_user,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,
        crate::routes::agents::list_agents,
        crate::routes::agents::create_agent,
        crate::routes::agents::get_agent,
        crate::routes::agents::update_agent,
        crate::routes::agents::delete_agent,
        crate::routes::agents::list_subagents,
        crate::routes::agents::create_subagent,
        crate::routes::boards::list_boards,
        crate::routes::boards::create_board,
        crate::routes::boards::get_board,
        crate::routes::boards::update_board,
        crate::routes::boards::delete_board,
        crate::routes::tasks::list_tasks,
        crate::routes::tasks::create_task,
        crate::routes::tasks::get_task,
        crate::routes::tasks::update_task,
        crate::routes::tasks::delete_task,
        crate::routes::chats::list_chats,
        crate::routes::chats::create_chat,
        crate::routes::chats::get_chat_with_agent,
        crate::routes::chats::get_chat,
        crate::routes::chats::update_chat,
        crate::routes::chats::delete_chat,
        crate::routes::messages::get_messages,
        crate::routes::messages::get_message,
        crate::routes::messages::send_message
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::auth::CredentialsRequest,
            crate::routes::auth::RefreshRequest,
            crate::routes::auth::VerifyRequest,
            crate::routes::auth::AuthUser,
            crate::routes::auth::SessionData,
            crate::routes::auth::TokenData,
            crate::routes::auth::VerifyData,
            crate::routes::auth::SessionResponse,
            crate::routes::auth::TokenResponse,
            crate::routes::auth::VerifyResponse,
            crate::routes::auth::SignOutResponse,
            crate::routes::models::User,
            crate::routes::models::CreateUserRequest,
            crate::routes::models::UpdateUserRequest,
            crate::routes::models::Agent,
            crate::routes::models::CreateAgentRequest,
            crate::routes::models::CreateSubAgentRequest,
            crate::routes::models::UpdateAgentRequest,
            crate::routes::models::Board,
            crate::routes::models::CreateBoardRequest,
            crate::routes::models::UpdateBoardRequest,
            crate::routes::models::Task,
            crate::routes::models::CreateTaskRequest,
            crate::routes::models::UpdateTaskRequest,
            crate::routes::models::Chat,
            crate::routes::models::CreateChatRequest,
            crate::routes::models::UpdateChatRequest,
            crate::routes::models::Message,
            crate::routes::models::ChatTurnRequest,
            crate::routes::models::ChatTurnResponse,
            crate::routes::models::DeletedResponse,
            crate::routes::models::HomeScreen,
            crate::routes::models::HomeAgentCard
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Home", description = "Landing screen data"),
        (name = "Auth", description = "Sign-up, sign-in and token handling"),
        (name = "Users", description = "User profiles"),
        (name = "Agents", description = "Agents and their sub-agents"),
        (name = "Boards", description = "Boards owned by a user"),
        (name = "Tasks", description = "Tasks filed on a board"),
        (name = "Chats", description = "Chats between a user and an agent"),
        (name = "Messages", description = "Chat history and agent turns")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let schemes = &mut components.security_schemes;

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("Firebase ID token".to_string());
        }

        schemes.insert("bearerAuth".to_string(), scheme);
    }
}
