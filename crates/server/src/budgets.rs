//! Budget entry API endpoints.

use api_types::budget::{BudgetNew, BudgetSummaryView, BudgetView};
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{ServerError, server::ServerState};

fn map_budget(budget: engine::Budget) -> BudgetView {
    BudgetView {
        user: budget.user,
        kind: budget.kind.as_str().to_string(),
        amount: budget.amount.to_string(),
        category: budget.category,
    }
}

pub async fn list(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(category_id): Path<i32>,
) -> Result<Json<Vec<BudgetView>>, ServerError> {
    let budgets = state
        .engine
        .list_budgets(category_id, user.id)
        .await?
        .into_iter()
        .map(map_budget)
        .collect();

    Ok(Json(budgets))
}

pub async fn create(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(category_id): Path<i32>,
    payload: Result<Json<BudgetNew>, JsonRejection>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let Json(payload) = payload?;
    let amount = payload.amount.as_ref().map(|amount| amount.as_literal());
    let budget = state
        .engine
        .create_budget(
            category_id,
            payload.kind.as_deref(),
            amount.as_deref(),
            user.id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(map_budget(budget))))
}

pub async fn summary(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(category_id): Path<i32>,
) -> Result<Json<BudgetSummaryView>, ServerError> {
    let summary = state.engine.budget_summary(category_id, user.id).await?;

    Ok(Json(BudgetSummaryView {
        category: summary.category,
        income: summary.income.to_string(),
        expense: summary.expense.to_string(),
        balance: summary.balance().to_string(),
    }))
}
