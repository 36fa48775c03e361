//! Lookup tables: determinations, system units and their maps and
//! prohibition dates, system maps, field offices.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;

use domains::{
    Actor, Determination, FieldOffice, Id, NewDetermination, NewFieldOffice, NewSystemMap,
    NewSystemUnit, SystemMap, SystemUnit, SystemUnitMap, SystemUnitProhibitionDate,
};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_determinations(State(state): State<AppState>) -> ApiResult<Json<Vec<Determination>>> {
    Ok(Json(state.lookups.list_determinations().await?))
}

pub async fn create_determination(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(new): Json<NewDetermination>,
) -> ApiResult<(StatusCode, Json<Determination>)> {
    Ok((StatusCode::CREATED, Json(state.lookups.create_determination(&actor, new).await?)))
}

pub async fn list_system_units(State(state): State<AppState>) -> ApiResult<Json<Vec<SystemUnit>>> {
    Ok(Json(state.lookups.list_system_units().await?))
}

pub async fn create_system_unit(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(new): Json<NewSystemUnit>,
) -> ApiResult<(StatusCode, Json<SystemUnit>)> {
    Ok((StatusCode::CREATED, Json(state.lookups.create_system_unit(&actor, new).await?)))
}

pub async fn get_system_unit(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<SystemUnit>> {
    Ok(Json(state.lookups.get_system_unit(id).await?))
}

pub async fn unit_maps(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<Vec<SystemMap>>> {
    Ok(Json(state.lookups.unit_maps(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct LinkMapRequest {
    pub system_map: Id,
}

pub async fn link_unit_map(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Id>,
    Json(req): Json<LinkMapRequest>,
) -> ApiResult<(StatusCode, Json<SystemUnitMap>)> {
    Ok((StatusCode::CREATED, Json(state.lookups.link_unit_map(&actor, id, req.system_map).await?)))
}

pub async fn prohibition_dates(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<Json<Vec<SystemUnitProhibitionDate>>> {
    Ok(Json(state.lookups.prohibition_dates(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ProhibitionDateRequest {
    pub prohibition_date: NaiveDate,
}

pub async fn add_prohibition_date(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Id>,
    Json(req): Json<ProhibitionDateRequest>,
) -> ApiResult<(StatusCode, Json<SystemUnitProhibitionDate>)> {
    let date = state.lookups.add_prohibition_date(&actor, id, req.prohibition_date).await?;
    Ok((StatusCode::CREATED, Json(date)))
}

pub async fn list_system_maps(State(state): State<AppState>) -> ApiResult<Json<Vec<SystemMap>>> {
    Ok(Json(state.lookups.list_system_maps().await?))
}

pub async fn create_system_map(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(new): Json<NewSystemMap>,
) -> ApiResult<(StatusCode, Json<SystemMap>)> {
    Ok((StatusCode::CREATED, Json(state.lookups.create_system_map(&actor, new).await?)))
}

pub async fn list_field_offices(State(state): State<AppState>) -> ApiResult<Json<Vec<FieldOffice>>> {
    Ok(Json(state.lookups.list_field_offices().await?))
}

pub async fn create_field_office(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(new): Json<NewFieldOffice>,
) -> ApiResult<(StatusCode, Json<FieldOffice>)> {
    Ok((StatusCode::CREATED, Json(state.lookups.create_field_office(&actor, new).await?)))
}

pub async fn get_field_office(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<FieldOffice>> {
    Ok(Json(state.lookups.get_field_office(id).await?))
}
