//! Pool contributions.
//!
//! Money a member puts into the shared trip pool. Purely additive; never part
//! of the settlement ledger, only of the pool summary.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq)]
pub struct Contribution {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub member_id: Uuid,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Contribution {
    pub fn new(
        trip_id: Uuid,
        member_id: Uuid,
        amount: f64,
        date: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trip_id,
            member_id,
            amount,
            date,
            notes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contributions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub trip_id: String,
    pub member_id: String,
    pub amount: f64,
    pub date: DateTimeUtc,
    pub notes: Option<String>,
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
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Members,
}

impl Related<super::trips::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trips.def()
    }
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Contribution> for ActiveModel {
    fn from(contribution: &Contribution) -> Self {
        Self {
            id: ActiveValue::Set(contribution.id.to_string()),
            trip_id: ActiveValue::Set(contribution.trip_id.to_string()),
            member_id: ActiveValue::Set(contribution.member_id.to_string()),
            amount: ActiveValue::Set(contribution.amount),
            date: ActiveValue::Set(contribution.date),
            notes: ActiveValue::Set(contribution.notes.clone()),
        }
    }
}

impl TryFrom<Model> for Contribution {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("contribution not exists".to_string()))?,
            trip_id: Uuid::parse_str(&model.trip_id)
                .map_err(|_| EngineError::KeyNotFound("trip not exists".to_string()))?,
            member_id: Uuid::parse_str(&model.member_id)
                .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?,
            amount: model.amount,
            date: model.date,
            notes: model.notes,
        })
    }
}
