use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::database::{ActivityMap, ActivityStore, StoreError};
use crate::services::signup_service::{self, SignupError};

#[derive(Debug, Deserialize, Default)]
pub struct EmailQuery {
    pub email: Option<String>,
}

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn error_response(e: SignupError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        SignupError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SignupError::Store(StoreError::ActivityNotFound) => StatusCode::NOT_FOUND,
        SignupError::Store(StoreError::AlreadyRegistered) => StatusCode::BAD_REQUEST,
        // Told apart from ActivityNotFound by the detail string only.
        SignupError::Store(StoreError::NotRegistered) => StatusCode::NOT_FOUND,
    };
    (status, Json(serde_json::json!({ "detail": e.to_string() })))
}

// Extractor failures go through the same `{detail}` shape as every other error.
fn extract_params(
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<(String, EmailQuery), SignupError> {
    let Path(activity_name) = path.map_err(|e| SignupError::Validation(e.body_text()))?;
    let Query(query) = query.map_err(|e| SignupError::Validation(e.body_text()))?;
    Ok((activity_name, query))
}

pub async fn list_activities_handler(State(store): State<ActivityStore>) -> Json<ActivityMap> {
    Json(signup_service::list_activities(&store).await)
}

pub async fn signup_handler(
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<EmailQuery>, QueryRejection>,
    State(store): State<ActivityStore>,
) -> ApiResult {
    let (activity_name, query) = extract_params(path, query).map_err(error_response)?;
    signup_service::signup(&store, &activity_name, query.email.as_deref())
        .await
        .map(|message| Json(serde_json::json!({ "message": message })))
        .map_err(error_response)
}

pub async fn unregister_handler(
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<EmailQuery>, QueryRejection>,
    State(store): State<ActivityStore>,
) -> ApiResult {
    let (activity_name, query) = extract_params(path, query).map_err(error_response)?;
    signup_service::unregister(&store, &activity_name, query.email.as_deref())
        .await
        .map(|message| Json(serde_json::json!({ "message": message })))
        .map_err(error_response)
}
