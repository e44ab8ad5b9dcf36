//! Trip members.
//!
//! A member exists independently of expenses and can be referenced by them as
//! payer or split participant. Removal is guarded: see
//! [`Engine::remove_member`](crate::Engine::remove_member).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::EngineError;

/// Input shape for creating a member, standalone or inline with a new trip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewMember {
    pub name: String,
    pub contact: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub name: String,
    pub contact: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(
        trip_id: Uuid,
        name: String,
        contact: Option<String>,
        avatar: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trip_id,
            name,
            contact,
            avatar,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub trip_id: String,
    pub name: String,
    pub contact: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTimeUtc,
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

impl From<&Member> for ActiveModel {
    fn from(member: &Member) -> Self {
        Self {
            id: ActiveValue::Set(member.id.to_string()),
            trip_id: ActiveValue::Set(member.trip_id.to_string()),
            name: ActiveValue::Set(member.name.clone()),
            contact: ActiveValue::Set(member.contact.clone()),
            avatar: ActiveValue::Set(member.avatar.clone()),
            created_at: ActiveValue::Set(member.created_at),
        }
    }
}

impl TryFrom<Model> for Member {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?,
            trip_id: Uuid::parse_str(&model.trip_id)
                .map_err(|_| EngineError::KeyNotFound("trip not exists".to_string()))?,
            name: model.name,
            contact: model.contact,
            avatar: model.avatar,
            created_at: model.created_at,
        })
    }
}
