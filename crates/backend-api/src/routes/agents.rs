use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    routes::models::{
        Agent, CreateAgentRequest, CreateSubAgentRequest, DeletedResponse, UpdateAgentRequest,
    },
    services::agents as agent_service,
    util::CurrentUser,
    ApiError, AppState, Json,
};

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/agents",
    tag = "Agents",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the agents")
    ),
    responses(
        (status = 200, description = "Agents of the user", body = [Agent]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Agents belong to another user", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_agents(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Agent>>, ApiError> {
    user.ensure_owner(&user_id)?;
    let agents = agent_service::list_agents(state.store(), &user_id).await?;
    Ok(Json(agents))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/agents",
    tag = "Agents",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the agent")
    ),
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent created", body = Agent),
        (status = 400, description = "Missing or invalid agent_id", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Agents belong to another user", body = crate::error::ErrorResponse),
        (status = 409, description = "Agent already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_agent(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
    Json(req): Json<CreateAgentRequest>,
) -> Result<(StatusCode, Json<Agent>), ApiError> {
    user.ensure_owner(&user_id)?;
    let agent = agent_service::create_agent(state.store(), &user_id, req).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/agents/{agent_id}",
    tag = "Agents",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the agent"),
        ("agent_id" = String, Path, description = "Agent identifier")
    ),
    responses(
        (status = 200, description = "Agent fetched", body = Agent),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Agent belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Agent not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_agent(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, agent_id)): Path<(String, String)>,
) -> Result<Json<Agent>, ApiError> {
    user.ensure_owner(&user_id)?;
    let agent = agent_service::get_agent(state.store(), &user_id, &agent_id).await?;
    Ok(Json(agent))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}/agents/{agent_id}",
    tag = "Agents",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the agent"),
        ("agent_id" = String, Path, description = "Agent identifier")
    ),
    request_body = UpdateAgentRequest,
    responses(
        (status = 200, description = "Agent updated", body = Agent),
        (status = 400, description = "Invalid update payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Agent belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Agent not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_agent(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, agent_id)): Path<(String, String)>,
    Json(req): Json<UpdateAgentRequest>,
) -> Result<Json<Agent>, ApiError> {
    user.ensure_owner(&user_id)?;
    let agent = agent_service::update_agent(state.store(), &user_id, &agent_id, req).await?;
    Ok(Json(agent))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/agents/{agent_id}",
    tag = "Agents",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the agent"),
        ("agent_id" = String, Path, description = "Agent identifier")
    ),
    responses(
        (status = 200, description = "Agent deleted", body = DeletedResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Agent belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Agent not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_agent(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, agent_id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse>, ApiError> {
    user.ensure_owner(&user_id)?;
    agent_service::delete_agent(state.store(), &user_id, &agent_id).await?;
    Ok(Json(DeletedResponse::new("Agent deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/agents/{agent_id}/subagents",
    tag = "Agents",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the agent"),
        ("agent_id" = String, Path, description = "Parent agent identifier")
    ),
    responses(
        (status = 200, description = "Sub-agents of the agent", body = [Agent]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Agent belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Agent not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_subagents(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, agent_id)): Path<(String, String)>,
) -> Result<Json<Vec<Agent>>, ApiError> {
    user.ensure_owner(&user_id)?;
    let subagents = agent_service::list_subagents(state.store(), &user_id, &agent_id).await?;
    Ok(Json(subagents))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/agents/{agent_id}/subagents",
    tag = "Agents",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "Owner of the agent"),
        ("agent_id" = String, Path, description = "Parent agent identifier")
    ),
    request_body = CreateSubAgentRequest,
    responses(
        (status = 201, description = "Sub-agent created", body = Agent),
        (status = 400, description = "Missing or invalid subagent_id", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Agent belongs to another user", body = crate::error::ErrorResponse),
        (status = 404, description = "Parent agent not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Sub-agent already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_subagent(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, agent_id)): Path<(String, String)>,
    Json(req): Json<CreateSubAgentRequest>,
) -> Result<(StatusCode, Json<Agent>), ApiError> {
    user.ensure_owner(&user_id)?;
    let subagent =
        agent_service::create_subagent(state.store(), &user_id, &agent_id, req).await?;
    Ok((StatusCode::CREATED, Json(subagent)))
}
