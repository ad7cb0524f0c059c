use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, prelude::*, sea_query::OnConflict,
};

use crate::{
    Category, CategoryPage, EngineError, FieldErrors, ResultEngine, categories, category_members,
    validation::required_text,
};

use super::{Engine, with_tx};

const NAME_MAX_CHARS: usize = 128;

fn validate_name(value: Option<&str>) -> ResultEngine<String> {
    let mut errors = FieldErrors::new();
    required_text(&mut errors, "name", value, NAME_MAX_CHARS).ok_or(EngineError::Validation(errors))
}

fn invalid_page() -> EngineError {
    EngineError::KeyNotFound("invalid page".to_string())
}

impl Engine {
    /// Creates a category owned by `user_id`, shared with nobody.
    pub async fn create_category(&self, name: Option<&str>, user_id: i32) -> ResultEngine<Category> {
        let name = validate_name(name)?;

        let model = categories::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name),
            owner_id: ActiveValue::Set(user_id),
        }
        .insert(&self.database)
        .await?;

        tracing::info!(user_id, category_id = model.id, "created category");
        Ok(Category::from_model(model, Vec::new()))
    }

    /// Returns one page of the categories `user_id` owns, ascending by id.
    ///
    /// Categories shared with the user are not listed. `page` is 1-based; an
    /// empty listing still has a first page.
    pub async fn list_categories(
        &self,
        page: u64,
        page_size: u64,
        user_id: i32,
    ) -> ResultEngine<CategoryPage> {
        let page_size = page_size.max(1);
        with_tx!(self, |db_tx| {
            let paginator = categories::Entity::find()
                .filter(categories::Column::OwnerId.eq(user_id))
                .order_by_asc(categories::Column::Id)
                .paginate(&db_tx, page_size);

            let count = paginator.num_items().await?;
            let num_pages = count.div_ceil(page_size).max(1);
            if page == 0 || page > num_pages {
                return Err(invalid_page());
            }

            let models = paginator.fetch_page(page - 1).await?;
            let ids: Vec<i32> = models.iter().map(|model| model.id).collect();
            let mut members = self.members_by_category(&db_tx, &ids).await?;
            let categories = models
                .into_iter()
                .map(|model| {
                    let users = members.remove(&model.id).unwrap_or_default();
                    Category::from_model(model, users)
                })
                .collect();

            Ok(CategoryPage {
                count,
                page,
                num_pages,
                categories,
            })
        })
    }

    /// Returns a category the user owns.
    pub async fn category(&self, category_id: i32, user_id: i32) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            self.require_category_manager(&db_tx, category_id, user_id)
                .await
        })
    }

    /// Renames a category the user owns.
    pub async fn rename_category(
        &self,
        category_id: i32,
        name: Option<&str>,
        user_id: i32,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let mut category = self
                .require_category_manager(&db_tx, category_id, user_id)
                .await?;
            let name = validate_name(name)?;

            categories::ActiveModel {
                id: ActiveValue::Unchanged(category.id),
                name: ActiveValue::Set(name.clone()),
                owner_id: ActiveValue::Unchanged(category.owner),
            }
            .update(&db_tx)
            .await?;

            category.name = name;
            Ok(category)
        })
    }

    /// Shares a category the user owns with `member_id`.
    ///
    /// Sharing with someone who already is a member changes nothing. The owner
    /// cannot add themselves: like an unknown user, that is reported as
    /// missing.
    pub async fn add_category_member(
        &self,
        category_id: i32,
        member_id: i32,
        user_id: i32,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let mut category = self
                .require_category_manager(&db_tx, category_id, user_id)
                .await?;
            if member_id == user_id {
                return Err(EngineError::KeyNotFound("user not exists".to_string()));
            }
            self.require_user_exists(&db_tx, member_id).await?;

            // Single statement so concurrent grants cannot lose each other.
            category_members::Entity::insert(category_members::ActiveModel {
                category_id: ActiveValue::Set(category.id),
                user_id: ActiveValue::Set(member_id),
            })
            .on_conflict(
                OnConflict::columns([
                    category_members::Column::CategoryId,
                    category_members::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&db_tx)
            .await?;

            if !category.users.contains(&member_id) {
                category.users.push(member_id);
                category.users.sort_unstable();
                tracing::info!(category_id, member_id, "shared category");
            }
            Ok(category)
        })
    }
}
