//! Authorization rules over an actor and a category.
//!
//! These are pure predicates; the engine applies them after loading the
//! category and turns a `false` into [`EngineError::KeyNotFound`], so callers
//! cannot tell a forbidden category from a missing one.
//!
//! [`EngineError::KeyNotFound`]: crate::EngineError::KeyNotFound

use crate::Category;

/// Only the owner may list, read, rename and share a category.
pub fn can_manage(actor: i32, category: &Category) -> bool {
    actor == category.owner
}

/// Owner and members may read and record budget entries.
pub fn can_view_or_post_budget(actor: i32, category: &Category) -> bool {
    can_manage(actor, category) || category.users.contains(&actor)
}
