//! Age-based visibility of post categories.

use crate::models::{AgeGroup, Category, Role};

const EVERYONE: &[AgeGroup] = &[AgeGroup::Child, AgeGroup::Adult, AgeGroup::Senior];
const GROWN_UPS: &[AgeGroup] = &[AgeGroup::Adult, AgeGroup::Senior];
const ADULTS_ONLY: &[AgeGroup] = &[AgeGroup::Adult];

/// Age groups permitted to read a post of the given category.
/// Unrecognised categories permit nobody.
pub fn allowed_age_groups(category: Category) -> &'static [AgeGroup] {
    match category {
        Category::Child => EVERYONE,
        Category::CivicLife => GROWN_UPS,
        Category::Sport => ADULTS_ONLY,
        Category::Unknown => &[],
    }
}

/// Admins see everything. Anyone else needs an age group that the category
/// permits; an unset age group sees nothing.
pub fn is_visible_to(category: Category, role: Role, age_group: Option<AgeGroup>) -> bool {
    if role == Role::Admin {
        return true;
    }
    age_group.is_some_and(|group| allowed_age_groups(category).contains(&group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn set(groups: &[AgeGroup]) -> HashSet<AgeGroup> {
        groups.iter().copied().collect()
    }

    #[test]
    fn test_allowed_age_groups_table() {
        use AgeGroup::*;
        assert_eq!(set(allowed_age_groups(Category::Child)), set(&[Child, Adult, Senior]));
        assert_eq!(set(allowed_age_groups(Category::CivicLife)), set(&[Adult, Senior]));
        assert_eq!(set(allowed_age_groups(Category::Sport)), set(&[Adult]));
        assert!(allowed_age_groups(Category::Unknown).is_empty());
    }

    #[test]
    fn test_admin_sees_every_category() {
        for category in [Category::Child, Category::CivicLife, Category::Sport, Category::Unknown] {
            assert!(is_visible_to(category, Role::Admin, None));
            assert!(is_visible_to(category, Role::Admin, Some(AgeGroup::Child)));
        }
    }

    #[test]
    fn test_standard_visibility_follows_table() {
        assert!(is_visible_to(Category::Child, Role::Standard, Some(AgeGroup::Child)));
        assert!(!is_visible_to(Category::CivicLife, Role::Standard, Some(AgeGroup::Child)));
        assert!(is_visible_to(Category::CivicLife, Role::Standard, Some(AgeGroup::Senior)));
        assert!(!is_visible_to(Category::Sport, Role::Standard, Some(AgeGroup::Senior)));
        assert!(is_visible_to(Category::Sport, Role::Standard, Some(AgeGroup::Adult)));
    }

    #[test]
    fn test_unset_age_group_sees_nothing() {
        for category in [Category::Child, Category::CivicLife, Category::Sport] {
            assert!(!is_visible_to(category, Role::Standard, None));
        }
    }
}
