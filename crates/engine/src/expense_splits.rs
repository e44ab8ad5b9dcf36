//! Persisted expense splits.
//!
//! One row per (expense, member) share, produced by the allocator. In the
//! engine, every owed share is represented by one of these rows.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, splits::Split};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub expense_id: String,
    pub member_id: String,
    pub amount: f64,
    pub percentage: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active_model(expense_id: Uuid, split: &Split) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        expense_id: ActiveValue::Set(expense_id.to_string()),
        member_id: ActiveValue::Set(split.member.to_string()),
        amount: ActiveValue::Set(split.amount),
        percentage: ActiveValue::Set(split.percentage),
    }
}

impl TryFrom<Model> for Split {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            member: Uuid::parse_str(&model.member_id)
                .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?,
            amount: model.amount,
            percentage: model.percentage,
        })
    }
}
