use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use domains::{Actor, Id, NewProperty, NewRequester, NewTag, Property, Requester, Tag};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_properties(State(state): State<AppState>) -> ApiResult<Json<Vec<Property>>> {
    Ok(Json(state.directory.list_properties().await?))
}

pub async fn create_property(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(new): Json<NewProperty>,
) -> ApiResult<(StatusCode, Json<Property>)> {
    Ok((StatusCode::CREATED, Json(state.directory.create_property(&actor, new).await?)))
}

pub async fn get_property(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<Property>> {
    Ok(Json(state.directory.get_property(id).await?))
}

pub async fn list_requesters(State(state): State<AppState>) -> ApiResult<Json<Vec<Requester>>> {
    Ok(Json(state.directory.list_requesters().await?))
}

pub async fn create_requester(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(new): Json<NewRequester>,
) -> ApiResult<(StatusCode, Json<Requester>)> {
    Ok((StatusCode::CREATED, Json(state.directory.create_requester(&actor, new).await?)))
}

pub async fn get_requester(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<Requester>> {
    Ok(Json(state.directory.get_requester(id).await?))
}

pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(state.directory.list_tags().await?))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(new): Json<NewTag>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    Ok((StatusCode::CREATED, Json(state.directory.create_tag(&actor, new).await?)))
}

pub async fn get_tag(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<Tag>> {
    Ok(Json(state.directory.get_tag(id).await?))
}
