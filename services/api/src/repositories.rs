//! Repositories for database operations

mod ingredient;
mod recipe;
mod subscription;
mod tag;
mod user;

pub use ingredient::IngredientRepository;
pub use recipe::{RecipeList, RecipeRepository, ViewerFlags};
pub use subscription::SubscriptionRepository;
pub use tag::TagRepository;
pub use user::UserRepository;

/// Ids from `wanted` that are not in `found`, in request order
pub(crate) fn missing_ids(wanted: &[i64], found: &[i64]) -> Vec<i64> {
    wanted
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ids() {
        assert_eq!(missing_ids(&[3, 1, 2], &[1]), vec![3, 2]);
        assert!(missing_ids(&[1], &[1]).is_empty());
        assert!(missing_ids(&[], &[1]).is_empty());
    }
}
