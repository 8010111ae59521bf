use serde_json::Value;
use societas_store::{DocumentPath, DocumentStore, Query};

use super::{
    fetch, fetch_all, merge, non_blank, paths, record_fields, remove, require_id, update_fields,
    ServiceError, StoreResultExt,
};
use crate::routes::models::{Agent, CreateAgentRequest, CreateSubAgentRequest, UpdateAgentRequest};

pub async fn list_agents(store: &dyn DocumentStore, user_id: &str) -> Result<Vec<Agent>, ServiceError> {
    fetch_all(store, &paths::agents(user_id), &Query::new()).await
}

pub async fn get_agent(
    store: &dyn DocumentStore,
    user_id: &str,
    agent_id: &str,
) -> Result<Agent, ServiceError> {
    fetch(store, &paths::agent(user_id, agent_id), "Agent").await
}

pub async fn create_agent(
    store: &dyn DocumentStore,
    user_id: &str,
    req: CreateAgentRequest,
) -> Result<Agent, ServiceError> {
    let agent_id = require_id(
        req.agent_id,
        "Agent ID (agent_id) is required in the request body.",
    )?;
    let agent = Agent {
        id: agent_id,
        name: non_blank(req.name),
        description: non_blank(req.description),
        avatar_url: non_blank(req.avatar_url),
        capabilities: req.capabilities,
        settings_template: settings_template(req.settings_template)?,
    };
    insert(store, paths::agent(user_id, &agent.id), &agent, "Agent").await?;
    Ok(agent)
}

pub async fn update_agent(
    store: &dyn DocumentStore,
    user_id: &str,
    agent_id: &str,
    req: UpdateAgentRequest,
) -> Result<Agent, ServiceError> {
    settings_template(req.settings_template.clone())?;
    let fields = update_fields(&req)?;
    merge(store, &paths::agent(user_id, agent_id), fields, "Agent").await
}

pub async fn delete_agent(
    store: &dyn DocumentStore,
    user_id: &str,
    agent_id: &str,
) -> Result<(), ServiceError> {
    remove(store, &paths::agent(user_id, agent_id), "Agent").await
}

pub async fn list_subagents(
    store: &dyn DocumentStore,
    user_id: &str,
    agent_id: &str,
) -> Result<Vec<Agent>, ServiceError> {
    get_agent(store, user_id, agent_id).await?;
    fetch_all(store, &paths::subagents(user_id, agent_id), &Query::new()).await
}

pub async fn create_subagent(
    store: &dyn DocumentStore,
    user_id: &str,
    agent_id: &str,
    req: CreateSubAgentRequest,
) -> Result<Agent, ServiceError> {
    let subagent_id = require_id(
        req.subagent_id,
        "Subagent ID (subagent_id) is required in the request body.",
    )?;
    get_agent(store, user_id, agent_id).await?;

    let subagent = Agent {
        id: subagent_id,
        name: non_blank(req.name),
        description: non_blank(req.description),
        avatar_url: non_blank(req.avatar_url),
        capabilities: req.capabilities,
        settings_template: settings_template(req.settings_template)?,
    };
    let path = paths::subagents(user_id, agent_id).doc(&subagent.id);
    insert(store, path, &subagent, "Sub-agent").await?;
    Ok(subagent)
}

async fn insert(
    store: &dyn DocumentStore,
    path: DocumentPath,
    agent: &Agent,
    entity: &str,
) -> Result<(), ServiceError> {
    store
        .create(&path, record_fields(agent)?)
        .await
        .or_duplicate(entity)?;
    tracing::debug!(%path, "created {}", entity.to_lowercase());
    Ok(())
}

fn settings_template(value: Option<Value>) -> Result<Option<Value>, ServiceError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(template @ Value::Object(_)) => Ok(Some(template)),
        Some(_) => Err(ServiceError::bad_request(
            "settings_template must be a JSON object",
        )),
    }
}
