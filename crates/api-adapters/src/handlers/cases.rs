//! Case routes: intake, workflow transitions, and the records a case owns.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;

use domains::{
    Actor, AuditEntry, CaseFile, CasePatch, CaseTag, CaseView, Comment, DomainError, Id, NewCase,
    ReviewRole, Tag,
};
use services::CaseFilter;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<CaseFilter>,
) -> ApiResult<Json<Vec<CaseView>>> {
    Ok(Json(state.cases.list_cases(&filter).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(new): Json<NewCase>,
) -> ApiResult<(StatusCode, Json<CaseView>)> {
    let view = state.cases.create_case(&actor, new).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<CaseView>> {
    Ok(Json(state.cases.get_case(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Id>,
    Json(patch): Json<CasePatch>,
) -> ApiResult<Json<CaseView>> {
    Ok(Json(state.cases.update_case(&actor, id, patch).await?))
}

#[derive(Debug, Deserialize)]
pub struct SignOffRequest {
    pub role: ReviewRole,
    pub date: Option<NaiveDate>,
}

pub async fn sign_off(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Id>,
    Json(req): Json<SignOffRequest>,
) -> ApiResult<Json<CaseView>> {
    Ok(Json(state.cases.sign_off(&actor, id, req.role, req.date).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FinalLetterRequest {
    pub date: Option<NaiveDate>,
    pub recipient: Option<String>,
}

pub async fn final_letter(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Id>,
    Json(req): Json<FinalLetterRequest>,
) -> ApiResult<Json<CaseView>> {
    Ok(Json(state.cases.record_final_letter(&actor, id, req.date, req.recipient).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CloseRequest {
    pub date: Option<NaiveDate>,
}

pub async fn close(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Id>,
    Json(req): Json<CloseRequest>,
) -> ApiResult<Json<CaseView>> {
    Ok(Json(state.cases.close_case(&actor, id, req.date).await?))
}

pub async fn tags(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(state.cases.case_tags(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub tag: Id,
}

pub async fn add_tag(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Id>,
    Json(req): Json<TagRequest>,
) -> ApiResult<(StatusCode, Json<CaseTag>)> {
    let link = state.cases.tag_case(&actor, id, req.tag).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn remove_tag(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, tag)): Path<(Id, Id)>,
) -> ApiResult<StatusCode> {
    state.cases.untag_case(&actor, id, tag).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn comments(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.cases.list_comments(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub comment: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Id>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = state.cases.add_comment(&actor, id, req.comment).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn files(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<Vec<CaseFile>>> {
    Ok(Json(state.cases.list_files(id).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UploadParams {
    /// Files forwarded on behalf of the requester are stored without an uploader.
    pub from_requester: bool,
}

/// Accepts a multipart body with a `file` part.
pub async fn upload(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Id>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<CaseFile>)> {
    let malformed = |err: axum::extract::multipart::MultipartError| ApiError::BadRequest(err.body_text());

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| DomainError::Validation("the 'file' part has no filename".into()))?;
        let data = field.bytes().await.map_err(malformed)?;

        let uploader = if params.from_requester { None } else { actor.user_id };
        let file = state.cases.attach_file(&actor, id, uploader, &filename, data).await?;
        return Ok((StatusCode::CREATED, Json(file)));
    }
    Err(DomainError::Validation("multipart body has no 'file' part".into()).into())
}

pub async fn download(
    State(state): State<AppState>,
    Path((id, file)): Path<(Id, Id)>,
) -> ApiResult<impl IntoResponse> {
    let (record, data) = state.cases.read_file(id, file).await?;
    let name = record.name().to_string();
    let content_type = mime_guess::from_path(&name).first_or_octet_stream().to_string();
    let disposition = format!("attachment; filename=\"{}\"", name.replace('"', ""));
    Ok(([(header::CONTENT_TYPE, content_type), (header::CONTENT_DISPOSITION, disposition)], data))
}

pub async fn history(State(state): State<AppState>, Path(id): Path<Id>) -> ApiResult<Json<Vec<AuditEntry>>> {
    Ok(Json(state.cases.history(id).await?))
}
