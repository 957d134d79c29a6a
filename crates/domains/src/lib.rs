//! gatepost/crates/domains/src/lib.rs
//!
//! The central domain logic and interface definitions for gatepost:
//! models, the error taxonomy, port traits, access policies and the
//! comment tree builder.

pub mod comment_tree;
pub mod error;
pub mod identity;
pub mod models;
pub mod policy;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use identity::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;

    #[test]
    fn test_category_codes_round_trip() {
        for category in [Category::Child, Category::CivicLife, Category::Sport] {
            assert_eq!(Category::from_code(category.code()), category);
        }
        assert_eq!(Category::from_code(17), Category::Unknown);
    }

    #[test]
    fn test_unrecognised_category_deserializes_to_unknown() {
        let category: Category = serde_json::from_str("\"Gardening\"").unwrap();
        assert_eq!(category, Category::Unknown);
        let category: Category = serde_json::from_str("\"CivicLife\"").unwrap();
        assert_eq!(category, Category::CivicLife);
    }

    fn draft(title: &str, body: &str, category: Category) -> PostDraft {
        PostDraft { title: title.into(), body: body.into(), category }
    }

    #[test]
    fn test_post_draft_validation() {
        assert!(draft("Match report", "3-1", Category::Sport).validate().is_ok());
        assert!(draft("  ", "body", Category::Sport).validate().is_err());
        assert!(draft("title", "", Category::Sport).validate().is_err());
        assert!(draft("title", "body", Category::Unknown).validate().is_err());
        assert!(draft(&"x".repeat(MAX_TITLE_CHARS), "body", Category::Child).validate().is_ok());
        assert!(draft(&"x".repeat(MAX_TITLE_CHARS + 1), "body", Category::Child).validate().is_err());
    }

    #[test]
    fn test_title_limit_counts_characters_not_bytes() {
        let title = "é".repeat(MAX_TITLE_CHARS);
        assert!(draft(&title, "body", Category::Child).validate().is_ok());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: "u1".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Standard,
            age_group: AgeGroup::Adult,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "Standard");
    }
}
