//! Heuristic column resolution.
//!
//! Maps dataset columns onto the four semantic roles using an ordered
//! keyword table. For each role the first column (in declared order) whose
//! lower-cased name contains any of the role's keywords is selected.

use crate::config::ResolverConfig;
use crate::models::{Role, RoleMapping};
use tracing::debug;

/// Ordered keyword table, one list per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleKeywords {
    pub temporal: Vec<String>,
    pub category: Vec<String>,
    pub entity: Vec<String>,
    pub outcome: Vec<String>,
    /// Keywords for the column scanned for marquee categories.
    pub award: Vec<String>,
}

impl Default for RoleKeywords {
    fn default() -> Self {
        Self::from(&ResolverConfig::default())
    }
}

impl From<&ResolverConfig> for RoleKeywords {
    fn from(config: &ResolverConfig) -> Self {
        let lower =
            |words: &[String]| -> Vec<String> { words.iter().map(|w| w.to_lowercase()).collect() };
        Self {
            temporal: lower(&config.temporal),
            category: lower(&config.category),
            entity: lower(&config.entity),
            outcome: lower(&config.outcome),
            award: lower(&config.award),
        }
    }
}

impl RoleKeywords {
    /// Keywords for a role.
    pub fn for_role(&self, role: Role) -> &[String] {
        match role {
            Role::Temporal => &self.temporal,
            Role::Category => &self.category,
            Role::Entity => &self.entity,
            Role::Outcome => &self.outcome,
        }
    }
}

/// Classifies columns into semantic roles.
#[derive(Debug, Clone, Default)]
pub struct ColumnResolver {
    keywords: RoleKeywords,
}

impl ColumnResolver {
    /// Create a resolver with a custom keyword table.
    pub fn new(keywords: RoleKeywords) -> Self {
        Self { keywords }
    }

    /// Resolve a role mapping for the given column names.
    ///
    /// Unresolved roles are left as `None`; this never fails.
    pub fn resolve<S: AsRef<str>>(&self, columns: &[S]) -> RoleMapping {
        let find = |keywords: &[String]| first_match(columns, keywords);

        let mapping = RoleMapping {
            temporal: find(self.keywords.for_role(Role::Temporal)),
            category: find(self.keywords.for_role(Role::Category)),
            entity: find(self.keywords.for_role(Role::Entity)),
            outcome: find(self.keywords.for_role(Role::Outcome)),
            award: find(&self.keywords.award),
        };

        debug!("Resolved roles: {:?}", mapping);
        mapping
    }
}

/// First column whose lower-cased name contains any keyword.
fn first_match<S: AsRef<str>>(columns: &[S], keywords: &[String]) -> Option<String> {
    columns
        .iter()
        .map(AsRef::as_ref)
        .find(|column| {
            let lowered = column.to_lowercase();
            keywords.iter().any(|k| lowered.contains(k.as_str()))
        })
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(columns: &[&str]) -> RoleMapping {
        ColumnResolver::default().resolve(columns)
    }

    #[test]
    fn test_grammy_columns() {
        let roles = resolve(&[
            "year",
            "title",
            "published_at",
            "category",
            "nominee",
            "artist",
            "workers",
            "img",
            "winner",
        ]);

        assert_eq!(roles.temporal.as_deref(), Some("year"));
        assert_eq!(roles.category.as_deref(), Some("category"));
        assert_eq!(roles.entity.as_deref(), Some("artist"));
        assert_eq!(roles.outcome.as_deref(), Some("winner"));
        assert_eq!(roles.award.as_deref(), Some("category"));
    }

    #[test]
    fn test_marquee_column_ignores_genre() {
        let roles = resolve(&["genre", "category", "artist", "winner"]);
        assert_eq!(roles.category.as_deref(), Some("genre"));
        assert_eq!(roles.award.as_deref(), Some("category"));

        let roles = resolve(&["Award", "category", "artist"]);
        assert_eq!(roles.award.as_deref(), Some("Award"));
    }

    #[test]
    fn test_first_match_wins_in_column_order() {
        let roles = resolve(&["Award Date", "Ceremony Year", "Artist Name", "Performer"]);
        assert_eq!(roles.temporal.as_deref(), Some("Award Date"));
        assert_eq!(roles.entity.as_deref(), Some("Artist Name"));
        assert_eq!(roles.award.as_deref(), Some("Award Date"));
    }

    #[test]
    fn test_case_insensitive_substring() {
        let roles = resolve(&["GENRE_LABEL", "Result", "NomineeName"]);
        assert_eq!(roles.category.as_deref(), Some("GENRE_LABEL"));
        assert_eq!(roles.outcome.as_deref(), Some("Result"));
        assert_eq!(roles.entity.as_deref(), Some("NomineeName"));
    }

    #[test]
    fn test_unresolved_roles() {
        let roles = resolve(&["id", "title"]);
        assert_eq!(roles, RoleMapping::default());
        assert_eq!(roles.unresolved(), Role::ALL.to_vec());

        let empty: [&str; 0] = [];
        assert_eq!(resolve(&empty), RoleMapping::default());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let columns = ["year", "category", "artist", "winner"];
        let resolver = ColumnResolver::default();
        assert_eq!(resolver.resolve(&columns), resolver.resolve(&columns));
    }

    #[test]
    fn test_custom_keywords() {
        let config = ResolverConfig {
            entity: vec!["Nominee".to_string()],
            ..ResolverConfig::default()
        };
        let resolver = ColumnResolver::new(RoleKeywords::from(&config));
        let roles = resolver.resolve(&["artist", "nominee"]);
        assert_eq!(roles.entity.as_deref(), Some("nominee"));
    }
}
