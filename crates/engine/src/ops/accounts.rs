use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, SqlErr, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, FieldErrors, ResultEngine, User, auth_tokens,
    password::{hash_password, verify_missing_user, verify_password},
    users,
    validation::{BLANK, REQUIRED, required_text},
};

use super::{Engine, with_tx};

const USERNAME_MAX_CHARS: usize = 150;
const USERNAME_TAKEN: &str = "A user with that username already exists.";

fn validate_username(errors: &mut FieldErrors, value: Option<&str>) -> Option<String> {
    let username = required_text(errors, "username", value, USERNAME_MAX_CHARS)?;
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, \
             and @/./+/-/_ characters.",
        );
        return None;
    }
    Some(username)
}

/// Passwords are taken verbatim: no trimming, only presence is checked.
fn validate_password<'a>(errors: &mut FieldErrors, value: Option<&'a str>) -> Option<&'a str> {
    match value {
        None => {
            errors.add("password", REQUIRED);
            None
        }
        Some("") => {
            errors.add("password", BLANK);
            None
        }
        Some(password) => Some(password),
    }
}

fn new_token_key() -> String {
    Uuid::new_v4().simple().to_string()
}

impl Engine {
    /// Creates an account and returns it.
    pub async fn register(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> ResultEngine<User> {
        let mut errors = FieldErrors::new();
        let username = validate_username(&mut errors, username);
        let password = validate_password(&mut errors, password);
        let (Some(username), Some(password)) = (username, password) else {
            return Err(EngineError::Validation(errors));
        };

        let password_hash = hash_password(password)?;

        let user = with_tx!(self, |db_tx| {
            let taken = users::Entity::find()
                .filter(users::Column::Username.eq(username.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(FieldErrors::single("username", USERNAME_TAKEN).into());
            }

            let active = users::ActiveModel {
                id: ActiveValue::NotSet,
                username: ActiveValue::Set(username.clone()),
                password: ActiveValue::Set(password_hash),
            };
            match active.insert(&db_tx).await {
                Ok(model) => Ok(User::from(model)),
                Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    Err(EngineError::Validation(FieldErrors::single(
                        "username",
                        USERNAME_TAKEN,
                    )))
                }
                Err(err) => Err(EngineError::Database(err)),
            }
        })?;

        tracing::info!(user_id = user.id, "registered user {}", user.username);
        Ok(user)
    }

    /// Verifies credentials and returns the user's token, issuing one on the
    /// first login. Later logins return the same token until logout.
    pub async fn login(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> ResultEngine<String> {
        let mut errors = FieldErrors::new();
        let username = validate_username_presence(&mut errors, username);
        let password = validate_password(&mut errors, password);
        let (Some(username), Some(password)) = (username, password) else {
            return Err(EngineError::Validation(errors));
        };

        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.database)
            .await?;
        let verified = match &user {
            Some(user) => verify_password(password, &user.password),
            None => verify_missing_user(password),
        };
        let (Some(user), true) = (user, verified) else {
            tracing::warn!("rejected login for {username}");
            return Err(EngineError::InvalidCredentials);
        };

        with_tx!(self, |db_tx| {
            let existing = auth_tokens::Entity::find()
                .filter(auth_tokens::Column::UserId.eq(user.id))
                .one(&db_tx)
                .await?;
            match existing {
                Some(token) => Ok(token.key),
                None => {
                    let token = auth_tokens::ActiveModel {
                        key: ActiveValue::Set(new_token_key()),
                        user_id: ActiveValue::Set(user.id),
                        created_at: ActiveValue::Set(Utc::now()),
                    }
                    .insert(&db_tx)
                    .await?;
                    tracing::debug!(user_id = user.id, "issued token");
                    Ok(token.key)
                }
            }
        })
    }

    /// Resolves a token key to its user.
    pub async fn authenticate(&self, key: &str) -> ResultEngine<User> {
        let found = auth_tokens::Entity::find_by_id(key.to_string())
            .find_also_related(users::Entity)
            .one(&self.database)
            .await?;
        match found {
            Some((_, Some(user))) => Ok(User::from(user)),
            _ => Err(EngineError::Unauthenticated),
        }
    }

    /// Deletes the token; it cannot authenticate afterwards.
    pub async fn logout(&self, key: &str) -> ResultEngine<()> {
        auth_tokens::Entity::delete_by_id(key.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Looks up a user by id.
    pub async fn user(&self, user_id: i32) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }
}

/// Login does not re-validate the username format, it only needs one.
/// Trimmed like at registration.
fn validate_username_presence<'a>(
    errors: &mut FieldErrors,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value.map(str::trim) {
        None => {
            errors.add("username", REQUIRED);
            None
        }
        Some("") => {
            errors.add("username", BLANK);
            None
        }
        Some(username) => Some(username),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_accepts_letters_digits_and_symbols() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            validate_username(&mut errors, Some("user.name+1@x-y_z")),
            Some("user.name+1@x-y_z".to_string())
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn username_rejects_spaces_and_symbols() {
        let mut errors = FieldErrors::new();
        assert_eq!(validate_username(&mut errors, Some("user 1")), None);
        assert_eq!(validate_username(&mut errors, Some("user#1")), None);
        assert_eq!(errors.get("username").len(), 2);
    }

    #[test]
    fn login_username_is_trimmed() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            validate_username_presence(&mut errors, Some(" alice ")),
            Some("alice")
        );
        assert_eq!(validate_username_presence(&mut errors, Some("  ")), None);
        assert_eq!(errors.get("username"), [BLANK.to_string()]);
    }

    #[test]
    fn password_is_not_trimmed() {
        let mut errors = FieldErrors::new();
        assert_eq!(validate_password(&mut errors, Some(" pw ")), Some(" pw "));
        assert_eq!(validate_password(&mut errors, Some("")), None);
        assert_eq!(validate_password(&mut errors, None), None);
        assert_eq!(
            errors.get("password"),
            [BLANK.to_string(), REQUIRED.to_string()]
        );
    }

    #[test]
    fn token_keys_are_32_hex_chars() {
        let key = new_token_key();
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, new_token_key());
    }
}
