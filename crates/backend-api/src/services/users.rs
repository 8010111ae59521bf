use serde_json::Value;
use societas_store::{now_timestamp, DocumentStore, Query};

use super::{
    fetch, fetch_all, merge, non_blank, paths, record_fields, remove, require_id, update_fields,
    ServiceError, StoreResultExt,
};
use crate::routes::models::{CreateUserRequest, UpdateUserRequest, User};

pub async fn list_users(store: &dyn DocumentStore) -> Result<Vec<User>, ServiceError> {
    fetch_all(store, &paths::users(), &Query::new()).await
}

pub async fn get_user(store: &dyn DocumentStore, user_id: &str) -> Result<User, ServiceError> {
    fetch(store, &paths::user(user_id), "User").await
}

/// Create the profile document for `caller_uid`. A supplied `uid` must name
/// the caller.
pub async fn create_user(
    store: &dyn DocumentStore,
    caller_uid: &str,
    req: CreateUserRequest,
) -> Result<User, ServiceError> {
    let uid = require_id(
        req.uid.or_else(|| Some(caller_uid.to_string())),
        "User ID (uid) is required in the request body.",
    )?;
    if uid != caller_uid {
        return Err(ServiceError::forbidden(
            "Users can only create their own profile",
        ));
    }

    let now = now_timestamp();
    let user = User {
        id: uid,
        name: non_blank(req.name),
        email: non_blank(req.email),
        avatar_url: non_blank(req.avatar_url),
        enterprise: non_blank(req.enterprise),
        email_verified: None,
        created_at: Some(now.clone()),
        updated_at: Some(now),
        last_login_at: None,
    };

    store
        .create(&paths::user(&user.id), record_fields(&user)?)
        .await
        .or_duplicate("User")?;
    tracing::debug!(user_id = %user.id, "created user profile");
    Ok(user)
}

pub async fn update_user(
    store: &dyn DocumentStore,
    user_id: &str,
    req: UpdateUserRequest,
) -> Result<User, ServiceError> {
    let mut fields = update_fields(&req)?;
    fields.insert("updated_at".into(), Value::String(now_timestamp()));
    merge(store, &paths::user(user_id), fields, "User").await
}

pub async fn delete_user(store: &dyn DocumentStore, user_id: &str) -> Result<(), ServiceError> {
    remove(store, &paths::user(user_id), "User").await
}
