//! Core of the family budget service.
//!
//! The [`Engine`] owns the database connection and exposes every domain
//! operation: accounts and tokens, categories and their sharing, budget
//! entries. Access control lives in [`rules`]; a caller that is not allowed
//! to see a category always gets [`EngineError::KeyNotFound`].

pub use budgets::{Budget, BudgetKind, BudgetSummary};
pub use categories::{Category, CategoryPage};
pub use error::EngineError;
pub use money::{Money, MoneyParseError};
pub use ops::{Engine, EngineBuilder};
pub use users::User;
pub use validation::{FieldErrors, NON_FIELD_ERRORS};

mod auth_tokens;
mod budgets;
mod categories;
mod category_members;
mod error;
mod money;
mod ops;
mod password;
pub mod rules;
mod users;
mod validation;

type ResultEngine<T> = Result<T, EngineError>;
