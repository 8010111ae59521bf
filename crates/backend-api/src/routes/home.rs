use axum::{extract::State, Json};

use crate::{
    routes::models::HomeScreen, services::home as home_service, util::CurrentUser, ApiError,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/home",
    tag = "Home",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Home screen for the current user", body = HomeScreen),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "User profile not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_home_screen(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<HomeScreen>, ApiError> {
    let home = home_service::get_home_screen(state.store(), &user.uid).await?;
    Ok(Json(home))
}
