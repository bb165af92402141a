use sea_orm::entity::prelude::*;

pub const STATUS_ACTIVE: &str = "active";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "permissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub module: String,
    pub action: String,
    pub resource: Option<String>,
    pub required_score: i32,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Active, non-deleted permissions: the set used for authorization.
    pub fn find_effective() -> Select<Entity> {
        Self::find()
            .filter(Column::DeletedAt.is_null())
            .filter(Column::Status.eq(STATUS_ACTIVE))
    }
}
