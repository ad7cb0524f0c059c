//! Budget entries: income or expense amounts recorded against a category.

use sea_orm::entity::prelude::*;

use crate::{EngineError, FieldErrors, Money, validation::invalid_choice};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Two-letter code, see [`BudgetKind::as_str`].
    pub kind: String,
    pub amount_minor: i64,
    pub category_id: i32,
    pub user_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Categories,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Direction of a budget entry.
///
/// The declaration order is the listing order: incomes sort before expenses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BudgetKind {
    Income,
    Expense,
}

impl BudgetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "IN",
            Self::Expense => "EX",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "IN" => Some(Self::Income),
            "EX" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl TryFrom<&str> for BudgetKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or_else(|| {
            FieldErrors::single("type", invalid_choice(value)).into()
        })
    }
}

/// A recorded entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Budget {
    pub id: i32,
    pub kind: BudgetKind,
    pub amount: Money,
    pub category: i32,
    pub user: i32,
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(value: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            kind: BudgetKind::try_from(value.kind.as_str())?,
            amount: Money::new(value.amount_minor),
            category: value.category_id,
            user: value.user_id,
        })
    }
}

impl Budget {
    /// Sort key for listings: kind, then recorder, then insertion order.
    pub fn listing_key(&self) -> (BudgetKind, i32, i32) {
        (self.kind, self.user, self.id)
    }
}

/// Per-kind totals of a category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetSummary {
    pub category: i32,
    pub income: Money,
    pub expense: Money,
}

impl BudgetSummary {
    /// Income minus expense; negative when the category overspent.
    pub fn balance(&self) -> Money {
        self.income - self.expense
    }
}
