//! Categories API endpoints.

use api_types::category::{
    CategoryListResponse, CategoryMembersView, CategoryNew, CategoryView, PageQuery,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use engine::EngineError;

use crate::{ServerError, server::ServerState};

const LIST_PATH: &str = "/budget/categories/";

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        owner: category.owner,
        users: category.users,
    }
}

/// Reads `?page=`; absent means the first page, anything unparsable is a
/// missing page.
fn parse_page(raw: Option<&str>) -> Result<u64, ServerError> {
    match raw {
        None => Ok(1),
        Some(raw) => raw
            .parse()
            .map_err(|_| EngineError::KeyNotFound("invalid page".to_string()).into()),
    }
}

fn page_link(page: u64) -> String {
    if page == 1 {
        LIST_PATH.to_string()
    } else {
        format!("{LIST_PATH}?page={page}")
    }
}

pub async fn list(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let page = parse_page(query.page.as_deref())?;
    let listing = state
        .engine
        .list_categories(page, state.page_size, user.id)
        .await?;

    Ok(Json(CategoryListResponse {
        count: listing.count,
        next: listing.has_next().then(|| page_link(listing.page + 1)),
        previous: listing.has_previous().then(|| page_link(listing.page - 1)),
        results: listing.categories.into_iter().map(map_category).collect(),
    }))
}

pub async fn create(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    payload: Result<Json<CategoryNew>, JsonRejection>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let Json(payload) = payload?;
    let category = state
        .engine
        .create_category(payload.name.as_deref(), user.id)
        .await?;

    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn detail(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(category_id): Path<i32>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state.engine.category(category_id, user.id).await?;
    Ok(Json(map_category(category)))
}

pub async fn rename(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(category_id): Path<i32>,
    payload: Result<Json<CategoryNew>, JsonRejection>,
) -> Result<Json<CategoryView>, ServerError> {
    let Json(payload) = payload?;
    let category = state
        .engine
        .rename_category(category_id, payload.name.as_deref(), user.id)
        .await?;

    Ok(Json(map_category(category)))
}

pub async fn add_user(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path((category_id, member_id)): Path<(i32, i32)>,
) -> Result<Json<CategoryMembersView>, ServerError> {
    let category = state
        .engine
        .add_category_member(category_id, member_id, user.id)
        .await?;

    Ok(Json(CategoryMembersView {
        id: category.id,
        name: category.name,
        users: category.users,
    }))
}
