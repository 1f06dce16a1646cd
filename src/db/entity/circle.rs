use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "circles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub visibility: String,
    pub max_members: i32,
    pub target_amount: Option<i64>,
    pub balance: i64,
    pub mode: String,
    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub invite_code: String,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::circle_member::Entity")]
    CircleMember,
}

impl Related<super::circle_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CircleMember.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
