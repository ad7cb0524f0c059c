use serde::{Deserialize, Serialize};

pub mod accounts {
    use super::*;

    /// Body of `POST /accounts/register`.
    ///
    /// Fields are optional so that missing ones surface as field errors rather
    /// than as a malformed body.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RegisterUser {
        pub username: Option<String>,
        pub password: Option<String>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i32,
        pub username: String,
    }

    /// Body of `POST /accounts/login`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct Login {
        pub username: Option<String>,
        pub password: Option<String>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TokenView {
        pub token: String,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LogoutView {
        pub detail: String,
    }
}

pub mod category {
    use super::*;

    /// Body for creating or renaming a category.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: Option<String>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: i32,
        pub name: String,
        /// Owner's user id.
        pub owner: i32,
        /// Member user ids, ascending. The owner is not listed.
        pub users: Vec<i32>,
    }

    /// Response of the add-member endpoint.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryMembersView {
        pub id: i32,
        pub name: String,
        pub users: Vec<i32>,
    }

    /// Page-number pagination envelope.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub count: u64,
        /// Relative URL of the next page, if any.
        pub next: Option<String>,
        pub previous: Option<String>,
        pub results: Vec<CategoryView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PageQuery {
        pub page: Option<String>,
    }
}

pub mod budget {
    use super::*;

    /// An amount as sent by clients: either a JSON number or a decimal string.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum AmountInput {
        Number(serde_json::Number),
        Text(String),
    }

    impl AmountInput {
        /// The decimal literal to parse.
        pub fn as_literal(&self) -> String {
            match self {
                Self::Number(number) => number.to_string(),
                Self::Text(text) => text.clone(),
            }
        }
    }

    /// Body of `POST /budget/budgets/{category_id}`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetNew {
        /// `IN` for income, `EX` for expense.
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub amount: Option<AmountInput>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BudgetView {
        /// Recording user's id.
        pub user: i32,
        #[serde(rename = "type")]
        pub kind: String,
        /// Decimal string with exactly two fraction digits, e.g. `"100.00"`.
        pub amount: String,
        pub category: i32,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BudgetSummaryView {
        pub category: i32,
        pub income: String,
        pub expense: String,
        pub balance: String,
    }
}

#[cfg(test)]
mod tests {
    use super::budget::{AmountInput, BudgetNew};

    #[test]
    fn amount_accepts_numbers_and_strings() {
        let body: BudgetNew = serde_json::from_str(r#"{"type":"IN","amount":100}"#).unwrap();
        assert_eq!(body.kind.as_deref(), Some("IN"));
        assert_eq!(body.amount.unwrap().as_literal(), "100");

        let body: BudgetNew = serde_json::from_str(r#"{"amount":"12.50"}"#).unwrap();
        assert!(body.kind.is_none());
        assert_eq!(body.amount, Some(AmountInput::Text("12.50".to_string())));

        let body: BudgetNew = serde_json::from_str(r#"{"amount":0.5}"#).unwrap();
        assert_eq!(body.amount.unwrap().as_literal(), "0.5");
    }
}
