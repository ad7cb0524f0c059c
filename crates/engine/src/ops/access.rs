use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};

use crate::{
    Category, EngineError, ResultEngine, categories, category_members, rules, users,
};

use super::Engine;

fn category_not_found() -> EngineError {
    EngineError::KeyNotFound("category not exists".to_string())
}

impl Engine {
    /// Member ids of every category in `category_ids`, keyed by category.
    pub(super) async fn members_by_category(
        &self,
        db: &DatabaseTransaction,
        category_ids: &[i32],
    ) -> ResultEngine<HashMap<i32, Vec<i32>>> {
        let rows = category_members::Entity::find()
            .filter(category_members::Column::CategoryId.is_in(category_ids.iter().copied()))
            .order_by_asc(category_members::Column::UserId)
            .all(db)
            .await?;

        let mut out: HashMap<i32, Vec<i32>> = HashMap::new();
        for row in rows {
            out.entry(row.category_id).or_default().push(row.user_id);
        }
        Ok(out)
    }

    pub(super) async fn find_category(
        &self,
        db: &DatabaseTransaction,
        category_id: i32,
    ) -> ResultEngine<Option<Category>> {
        let Some(model) = categories::Entity::find_by_id(category_id).one(db).await? else {
            return Ok(None);
        };
        let mut members = self.members_by_category(db, &[category_id]).await?;
        let users = members.remove(&category_id).unwrap_or_default();
        Ok(Some(Category::from_model(model, users)))
    }

    /// Category the user owns; anything else is reported as missing.
    pub(super) async fn require_category_manager(
        &self,
        db: &DatabaseTransaction,
        category_id: i32,
        user_id: i32,
    ) -> ResultEngine<Category> {
        self.find_category(db, category_id)
            .await?
            .filter(|category| rules::can_manage(user_id, category))
            .ok_or_else(category_not_found)
    }

    /// Category the user owns or was added to; anything else is reported as
    /// missing.
    pub(super) async fn require_category_reader(
        &self,
        db: &DatabaseTransaction,
        category_id: i32,
        user_id: i32,
    ) -> ResultEngine<Category> {
        self.find_category(db, category_id)
            .await?
            .filter(|category| rules::can_view_or_post_budget(user_id, category))
            .ok_or_else(category_not_found)
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        user_id: i32,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }
}
