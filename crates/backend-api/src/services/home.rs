use societas_store::DocumentStore;

use super::{agents, users, ServiceError};
use crate::routes::models::{HomeAgentCard, HomeScreen};

/// Landing screen for the caller: profile basics plus one card per agent.
pub async fn get_home_screen(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<HomeScreen, ServiceError> {
    let user = users::get_user(store, user_id).await?;
    let agents = agents::list_agents(store, user_id).await?;

    let c_board = agents
        .into_iter()
        .map(|agent| HomeAgentCard {
            name: agent.name.unwrap_or_else(|| "Unnamed Agent".to_string()),
            department: agent
                .description
                .unwrap_or_else(|| "No Department".to_string()),
            id: agent.id,
        })
        .collect();

    Ok(HomeScreen {
        user_name: user.name.unwrap_or_else(|| "No Name".to_string()),
        user_photo: user.avatar_url.unwrap_or_default(),
        enterprise: user.enterprise.unwrap_or_else(|| "Societas".to_string()),
        c_board,
    })
}
