//! Trip activity feed.
//!
//! Human-readable one-liners ("alice added 400.00 for dinner") recorded by
//! the mutating engine operations. The feed is capped to the most recent
//! [`ACTIVITY_CAP`] entries per trip.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::EngineError;

/// Maximum number of feed entries retained per trip.
pub const ACTIVITY_CAP: u64 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub trip_id: String,
    pub message: String,
    pub timestamp: DateTimeUtc,
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
}

impl Related<super::trips::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trips.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active_model(trip_id: Uuid, message: &str) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        trip_id: ActiveValue::Set(trip_id.to_string()),
        message: ActiveValue::Set(message.to_string()),
        timestamp: ActiveValue::Set(Utc::now()),
    }
}

impl TryFrom<Model> for ActivityEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("activity not exists".to_string()))?,
            trip_id: Uuid::parse_str(&model.trip_id)
                .map_err(|_| EngineError::KeyNotFound("trip not exists".to_string()))?,
            message: model.message,
            timestamp: model.timestamp,
        })
    }
}
