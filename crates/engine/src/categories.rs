//! Categories: named buckets owned by one user and optionally shared.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub owner_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::category_members::Entity")]
    Members,
    #[sea_orm(has_many = "super::budgets::Entity")]
    Budgets,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::category_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A category together with the ids of the users it is shared with.
///
/// `users` never contains `owner` and is sorted ascending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub owner: i32,
    pub users: Vec<i32>,
}

impl Category {
    pub(crate) fn from_model(model: Model, mut users: Vec<i32>) -> Self {
        users.sort_unstable();
        users.dedup();
        Self {
            id: model.id,
            name: model.name,
            owner: model.owner_id,
            users,
        }
    }
}

/// One page of the owned-categories listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryPage {
    /// Total number of owned categories, across all pages.
    pub count: u64,
    /// 1-based page number.
    pub page: u64,
    pub num_pages: u64,
    pub categories: Vec<Category>,
}

impl CategoryPage {
    pub fn has_next(&self) -> bool {
        self.page < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
