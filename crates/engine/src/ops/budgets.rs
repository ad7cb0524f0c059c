use sea_orm::{ActiveValue, QueryFilter, QueryResult, Statement, prelude::*};

use crate::{
    Budget, BudgetKind, BudgetSummary, EngineError, FieldErrors, Money, MoneyParseError,
    ResultEngine, budgets,
    money::parse_decimal,
    validation::{REQUIRED, invalid_choice},
};

use super::{Engine, with_tx};

/// Total digits an amount may have, two of which are decimals.
const MAX_DIGITS: usize = 10;
const MAX_INTEGER_DIGITS: usize = MAX_DIGITS - 2;

fn validate_kind(errors: &mut FieldErrors, value: Option<&str>) -> Option<BudgetKind> {
    let Some(value) = value else {
        errors.add("type", REQUIRED);
        return None;
    };
    let kind = BudgetKind::from_code(value);
    if kind.is_none() {
        errors.add("type", invalid_choice(value));
    }
    kind
}

fn validate_amount(errors: &mut FieldErrors, value: Option<&str>) -> Option<Money> {
    let Some(value) = value else {
        errors.add("amount", REQUIRED);
        return None;
    };
    let parsed = match parse_decimal(value).and_then(|decimal| {
        Money::try_from(decimal).map(|amount| (decimal, amount))
    }) {
        Ok(parsed) => parsed,
        Err(MoneyParseError::Invalid) => {
            errors.add("amount", MoneyParseError::Invalid.to_string());
            return None;
        }
        Err(MoneyParseError::Overflow) => {
            errors.add(
                "amount",
                format!("Ensure that there are no more than {MAX_DIGITS} digits in total."),
            );
            return None;
        }
    };
    // Checked before rounding: "-0.004" must not become "0.00".
    let (decimal, amount) = parsed;
    if decimal.is_sign_negative() && !decimal.is_zero() {
        errors.add("amount", "Ensure this value is greater than or equal to 0.");
        return None;
    }
    if amount.integer_digits() > MAX_INTEGER_DIGITS {
        errors.add(
            "amount",
            format!(
                "Ensure that there are no more than {MAX_INTEGER_DIGITS} digits before the decimal point."
            ),
        );
        return None;
    }
    Some(amount)
}

/// Reads the `sum` column of an aggregate row. An aggregate always yields
/// one row, so a missing one is a database error and not a zero total.
fn total_from_row(row: Option<QueryResult>) -> ResultEngine<Money> {
    let row = row.ok_or_else(|| DbErr::RecordNotFound("budget totals".to_string()))?;
    let sum: i64 = row.try_get("", "sum")?;
    Ok(Money::new(sum))
}

impl Engine {
    /// Lists every entry of a category the user owns or was added to.
    ///
    /// Entries of all authorized users are returned, incomes first, then by
    /// recording user, then in insertion order.
    pub async fn list_budgets(&self, category_id: i32, user_id: i32) -> ResultEngine<Vec<Budget>> {
        with_tx!(self, |db_tx| {
            self.require_category_reader(&db_tx, category_id, user_id)
                .await?;

            let mut entries = budgets::Entity::find()
                .filter(budgets::Column::CategoryId.eq(category_id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Budget::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            entries.sort_by_key(Budget::listing_key);
            Ok(entries)
        })
    }

    /// Records an entry in a category the user owns or was added to.
    ///
    /// `kind` is the two-letter code, `amount` a decimal literal rounded to
    /// cents. The recorder is always `user_id`.
    pub async fn create_budget(
        &self,
        category_id: i32,
        kind: Option<&str>,
        amount: Option<&str>,
        user_id: i32,
    ) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            let category = self
                .require_category_reader(&db_tx, category_id, user_id)
                .await?;

            let mut errors = FieldErrors::new();
            let kind = validate_kind(&mut errors, kind);
            let amount = validate_amount(&mut errors, amount);
            let (Some(kind), Some(amount)) = (kind, amount) else {
                return Err(EngineError::Validation(errors));
            };

            let model = budgets::ActiveModel {
                id: ActiveValue::NotSet,
                kind: ActiveValue::Set(kind.as_str().to_string()),
                amount_minor: ActiveValue::Set(amount.cents()),
                category_id: ActiveValue::Set(category.id),
                user_id: ActiveValue::Set(user_id),
            }
            .insert(&db_tx)
            .await?;

            tracing::debug!(category_id, user_id, "recorded {} {}", kind.as_str(), amount);
            Budget::try_from(model)
        })
    }

    /// Sums the entries of a category per kind.
    pub async fn budget_summary(
        &self,
        category_id: i32,
        user_id: i32,
    ) -> ResultEngine<BudgetSummary> {
        with_tx!(self, |db_tx| {
            self.require_category_reader(&db_tx, category_id, user_id)
                .await?;

            let backend = db_tx.get_database_backend();
            let mut totals = [Money::ZERO; 2];
            for (slot, kind) in [BudgetKind::Income, BudgetKind::Expense].into_iter().enumerate() {
                let stmt = Statement::from_sql_and_values(
                    backend,
                    "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                     FROM budgets \
                     WHERE category_id = ? AND kind = ?",
                    vec![category_id.into(), kind.as_str().into()],
                );
                totals[slot] = total_from_row(db_tx.query_one(stmt).await?)?;
            }

            let [income, expense] = totals;
            Ok(BudgetSummary {
                category: category_id,
                income,
                expense,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(raw: &str) -> Result<Money, Vec<String>> {
        let mut errors = FieldErrors::new();
        validate_amount(&mut errors, Some(raw)).ok_or_else(|| errors.get("amount").to_vec())
    }

    #[test]
    fn amount_is_rounded_to_cents() {
        assert_eq!(amount("100"), Ok(Money::new(100_00)));
        assert_eq!(amount("0.125"), Ok(Money::new(12)));
        assert_eq!(amount("99999999.99"), Ok(Money::new(99_999_999_99)));
    }

    #[test]
    fn amount_errors_are_explicit() {
        assert_eq!(
            amount("-1"),
            Err(vec![
                "Ensure this value is greater than or equal to 0.".to_string()
            ])
        );
        for sub_cent in ["-0.004", "-0.005"] {
            assert_eq!(
                amount(sub_cent),
                Err(vec![
                    "Ensure this value is greater than or equal to 0.".to_string()
                ])
            );
        }
        assert_eq!(amount("-0"), Ok(Money::ZERO));
        assert_eq!(
            amount("abc"),
            Err(vec!["A valid number is required.".to_string()])
        );
        assert_eq!(
            amount("123456789"),
            Err(vec![
                "Ensure that there are no more than 8 digits before the decimal point."
                    .to_string()
            ])
        );
    }

    #[test]
    fn missing_aggregate_row_is_an_error() {
        assert!(matches!(
            total_from_row(None),
            Err(EngineError::Database(DbErr::RecordNotFound(_)))
        ));
    }

    #[test]
    fn kind_accepts_only_codes() {
        let mut errors = FieldErrors::new();
        assert_eq!(validate_kind(&mut errors, Some("IN")), Some(BudgetKind::Income));
        assert_eq!(validate_kind(&mut errors, Some("EX")), Some(BudgetKind::Expense));
        assert!(errors.is_empty());

        assert_eq!(validate_kind(&mut errors, Some("INCOME")), None);
        assert_eq!(validate_kind(&mut errors, None), None);
        assert_eq!(
            errors.get("type"),
            [
                "\"INCOME\" is not a valid choice.".to_string(),
                REQUIRED.to_string()
            ]
        );
    }
}
