//! Expense API endpoints
//!
//! Translates the wire split fields (`splitType` plus its companion field)
//! into the engine's split spec before handing off to the allocator.

use api_types::expense::{CustomSplit, ExpenseNew, ExpenseUpdate, ExpenseView, PercentShare, SplitView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub(crate) fn to_engine_category(category: api_types::Category) -> engine::Category {
    match category {
        api_types::Category::Travel => engine::Category::Travel,
        api_types::Category::Food => engine::Category::Food,
        api_types::Category::Stay => engine::Category::Stay,
        api_types::Category::Shopping => engine::Category::Shopping,
        api_types::Category::Misc => engine::Category::Misc,
    }
}

fn from_engine_category(category: engine::Category) -> api_types::Category {
    match category {
        engine::Category::Travel => api_types::Category::Travel,
        engine::Category::Food => api_types::Category::Food,
        engine::Category::Stay => api_types::Category::Stay,
        engine::Category::Shopping => api_types::Category::Shopping,
        engine::Category::Misc => api_types::Category::Misc,
    }
}

fn to_engine_source(source: api_types::PaymentSource) -> engine::PaymentSource {
    match source {
        api_types::PaymentSource::Member => engine::PaymentSource::Member,
        api_types::PaymentSource::Pool => engine::PaymentSource::Pool,
    }
}

fn from_engine_source(source: engine::PaymentSource) -> api_types::PaymentSource {
    match source {
        engine::PaymentSource::Member => api_types::PaymentSource::Member,
        engine::PaymentSource::Pool => api_types::PaymentSource::Pool,
    }
}

fn from_engine_split_type(split_type: engine::SplitType) -> api_types::SplitType {
    match split_type {
        engine::SplitType::Equal => api_types::SplitType::Equal,
        engine::SplitType::Selected => api_types::SplitType::Selected,
        engine::SplitType::Percentage => api_types::SplitType::Percentage,
        engine::SplitType::Custom => api_types::SplitType::Custom,
        engine::SplitType::EachPaysOwn => api_types::SplitType::EachPaysOwn,
    }
}

/// Assembles the engine split spec from `splitType` and its companion field.
fn build_spec(
    split_type: api_types::SplitType,
    selected_members: Option<Vec<Uuid>>,
    percentages: Option<Vec<PercentShare>>,
    custom_splits: Option<Vec<CustomSplit>>,
    amount_per_person: Option<f64>,
) -> Result<engine::SplitSpec, ServerError> {
    let spec = match split_type {
        api_types::SplitType::Equal => engine::SplitSpec::Equal,
        api_types::SplitType::Selected => engine::SplitSpec::Selected {
            members: selected_members.unwrap_or_default(),
        },
        api_types::SplitType::Percentage => engine::SplitSpec::Percentage {
            shares: percentages
                .unwrap_or_default()
                .into_iter()
                .map(|share| engine::PercentShare {
                    member: share.member,
                    percentage: share.percentage,
                })
                .collect(),
        },
        api_types::SplitType::Custom => engine::SplitSpec::Custom {
            shares: custom_splits
                .unwrap_or_default()
                .into_iter()
                .map(|share| engine::CustomShare {
                    member: share.member,
                    amount: share.amount,
                })
                .collect(),
        },
        api_types::SplitType::EachPaysOwn => engine::SplitSpec::EachPaysOwn {
            amount_per_person: amount_per_person.ok_or_else(|| {
                ServerError::Generic("amountPerPerson is required for eachPaysOwn".to_string())
            })?,
        },
    };
    Ok(spec)
}

fn view(expense: engine::Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        description: expense.description,
        amount: expense.amount,
        category: from_engine_category(expense.category),
        date: expense.date,
        paid_by: expense.paid_by,
        split_type: from_engine_split_type(expense.split_type),
        splits: expense
            .splits
            .into_iter()
            .map(|split| SplitView {
                member: split.member,
                amount: split.amount,
                percentage: split.percentage,
            })
            .collect(),
        amount_per_person: expense.amount_per_person,
        settled: expense.settled,
        payment_source: from_engine_source(expense.payment_source),
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let expenses = state.engine.expenses(trip_id).await?;
    Ok(Json(expenses.into_iter().map(view).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<ExpenseNew>,
) -> Result<Json<ExpenseView>, ServerError> {
    let spec = build_spec(
        payload.split_type,
        payload.selected_members,
        payload.percentages,
        payload.custom_splits,
        payload.amount_per_person,
    )?;
    let input = engine::NewExpense {
        description: payload.description,
        amount: payload.amount,
        category: payload.category.map(to_engine_category).unwrap_or_default(),
        date: payload.date,
        paid_by: payload.paid_by,
        spec,
        settled: payload.settled.unwrap_or(false),
        payment_source: payload
            .payment_source
            .map(to_engine_source)
            .unwrap_or_default(),
    };
    let expense = state.engine.new_expense(trip_id, input).await?;
    Ok(Json(view(expense)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path((trip_id, expense_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let split_fields_present = payload.selected_members.is_some()
        || payload.percentages.is_some()
        || payload.custom_splits.is_some()
        || payload.amount_per_person.is_some();
    let spec = match payload.split_type {
        Some(split_type) => Some(build_spec(
            split_type,
            payload.selected_members,
            payload.percentages,
            payload.custom_splits,
            payload.amount_per_person,
        )?),
        None if split_fields_present => {
            return Err(ServerError::Generic(
                "splitType is required when split fields change".to_string(),
            ));
        }
        None => None,
    };

    let update = engine::ExpenseUpdate {
        description: payload.description,
        amount: payload.amount,
        category: payload.category.map(to_engine_category),
        date: payload.date,
        paid_by: payload.paid_by,
        spec,
        settled: payload.settled,
        payment_source: payload.payment_source.map(to_engine_source),
    };
    let expense = state.engine.update_expense(trip_id, expense_id, update).await?;
    Ok(Json(view(expense)))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path((trip_id, expense_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(trip_id, expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
