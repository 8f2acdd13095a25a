use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::ProviderResult;
use crate::resource_data::ResourceData;
use crate::resources::Operation;
use crate::schema::Schema;
use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "resources": state.registry.type_names().collect::<Vec<_>>(),
    }))
}

pub async fn list_schemas(State(state): State<AppState>) -> Json<BTreeMap<&'static str, Schema>> {
    Json(state.registry.schemas())
}

/// `POST /v1/resources/:type/:operation` with the resource data as body
pub async fn invoke_resource(
    State(state): State<AppState>,
    Path((type_name, operation)): Path<(String, String)>,
    Json(data): Json<ResourceData>,
) -> ProviderResult<Json<ResourceData>> {
    let operation: Operation = operation.parse()?;
    let data = state.registry.invoke(&type_name, operation, data).await?;
    Ok(Json(data))
}
