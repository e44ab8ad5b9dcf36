//! Expense records.
//!
//! An expense carries its pre-computed splits (produced by the allocator at
//! create/update time) so the settlement engine never has to re-derive them.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    splits::{Split, SplitSpec, SplitType},
};

/// Expense category. Informational only; never drives settlement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Travel,
    Food,
    Stay,
    Shopping,
    #[default]
    Misc,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Travel => "Travel",
            Self::Food => "Food",
            Self::Stay => "Stay",
            Self::Shopping => "Shopping",
            Self::Misc => "Misc",
        }
    }
}

impl TryFrom<&str> for Category {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Travel" => Ok(Self::Travel),
            "Food" => Ok(Self::Food),
            "Stay" => Ok(Self::Stay),
            "Shopping" => Ok(Self::Shopping),
            "Misc" => Ok(Self::Misc),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid category: {other}"
            ))),
        }
    }
}

/// Whether the expense was fronted by a member or drawn from the trip pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSource {
    #[default]
    Member,
    Pool,
}

impl PaymentSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Pool => "pool",
        }
    }
}

impl TryFrom<&str> for PaymentSource {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "member" => Ok(Self::Member),
            "pool" => Ok(Self::Pool),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid payment source: {other}"
            ))),
        }
    }
}

/// Input shape for [`Engine::new_expense`](crate::Engine::new_expense).
///
/// `amount` is ignored for `eachPaysOwn` specs, where the total derives from
/// the per-person amount, and required for every other split type.
#[derive(Clone, Debug, PartialEq)]
pub struct NewExpense {
    pub description: String,
    pub amount: Option<f64>,
    pub category: Category,
    pub date: Option<DateTime<Utc>>,
    pub paid_by: Option<Uuid>,
    pub spec: SplitSpec,
    pub settled: bool,
    pub payment_source: PaymentSource,
}

/// Partial update for [`Engine::update_expense`](crate::Engine::update_expense).
/// `None` fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<Category>,
    pub date: Option<DateTime<Utc>>,
    pub paid_by: Option<Uuid>,
    pub spec: Option<SplitSpec>,
    pub settled: Option<bool>,
    pub payment_source: Option<PaymentSource>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub description: String,
    /// Positive, currency-agnostic total. For `eachPaysOwn` this is derived
    /// as `amount_per_person * member_count`, never supplied directly.
    pub amount: f64,
    pub category: Category,
    pub date: DateTime<Utc>,
    /// Required unless the payment source is the pool.
    pub paid_by: Option<Uuid>,
    pub split_type: SplitType,
    pub splits: Vec<Split>,
    pub amount_per_person: Option<f64>,
    pub settled: bool,
    pub payment_source: PaymentSource,
}

impl Expense {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trip_id: Uuid,
        description: String,
        amount: f64,
        category: Category,
        date: DateTime<Utc>,
        paid_by: Option<Uuid>,
        split_type: SplitType,
        payment_source: PaymentSource,
    ) -> Result<Self, EngineError> {
        if amount <= 0.0 {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        if paid_by.is_none() && payment_source != PaymentSource::Pool {
            return Err(EngineError::InvalidAmount(
                "paidBy is required unless the expense is pool-funded".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            trip_id,
            description,
            amount,
            category,
            date,
            paid_by,
            split_type,
            splits: Vec::new(),
            amount_per_person: None,
            settled: false,
            payment_source,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub trip_id: String,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTimeUtc,
    pub paid_by: Option<String>,
    pub split_type: String,
    pub amount_per_person: Option<f64>,
    pub settled: bool,
    pub payment_source: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::trips::Entity",
        from = "Column::TripId",
        to = "super::trips::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Trips,
    #[sea_orm(has_many = "super::expense_splits::Entity")]
    Splits,
}

impl Related<super::trips::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trips.def()
    }
}

impl Related<super::expense_splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            trip_id: ActiveValue::Set(expense.trip_id.to_string()),
            description: ActiveValue::Set(expense.description.clone()),
            amount: ActiveValue::Set(expense.amount),
            category: ActiveValue::Set(expense.category.as_str().to_string()),
            date: ActiveValue::Set(expense.date),
            paid_by: ActiveValue::Set(expense.paid_by.map(|id| id.to_string())),
            split_type: ActiveValue::Set(expense.split_type.as_str().to_string()),
            amount_per_person: ActiveValue::Set(expense.amount_per_person),
            settled: ActiveValue::Set(expense.settled),
            payment_source: ActiveValue::Set(expense.payment_source.as_str().to_string()),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    /// Builds the domain expense from a row. Splits live in their own table
    /// and are attached by the caller after this conversion.
    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            trip_id: Uuid::parse_str(&model.trip_id)
                .map_err(|_| EngineError::KeyNotFound("trip not exists".to_string()))?,
            description: model.description,
            amount: model.amount,
            category: Category::try_from(model.category.as_str()).unwrap_or_default(),
            date: model.date,
            paid_by: model.paid_by.and_then(|s| Uuid::parse_str(&s).ok()),
            split_type: SplitType::try_from(model.split_type.as_str())?,
            splits: Vec::new(),
            amount_per_person: model.amount_per_person,
            settled: model.settled,
            payment_source: PaymentSource::try_from(model.payment_source.as_str())
                .unwrap_or_default(),
        })
    }
}
