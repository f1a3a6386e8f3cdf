// team.rs
// Normalized team/area tags used to scope what a rep can see.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Tags granting unrestricted visibility.
const UNRESTRICTED_TAGS: [&str; 2] = ["ALL", "TEAM C"];

/// Ordered set of upper-case, whitespace-collapsed tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TeamTags(BTreeSet<String>);

impl From<Vec<String>> for TeamTags {
    fn from(tags: Vec<String>) -> Self {
        TeamTags::from_tags(tags)
    }
}

impl From<TeamTags> for Vec<String> {
    fn from(tags: TeamTags) -> Self {
        tags.0.into_iter().collect()
    }
}

impl TeamTags {
    /// Parses a free-text list such as `"team a, Team B / all"`.
    pub fn parse(raw: &str) -> Self {
        TeamTags(
            raw.split([',', ';', '/', '|'])
                .filter_map(normalize_tag)
                .collect(),
        )
    }

    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        TeamTags(tags.into_iter().filter_map(|t| normalize_tag(t.as_ref())).collect())
    }

    pub fn is_unrestricted(&self) -> bool {
        UNRESTRICTED_TAGS.iter().any(|t| self.0.contains(*t))
    }

    /// Case-insensitive membership; unrestricted sets allow everything.
    pub fn allows(&self, tag: &str) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        match normalize_tag(tag) {
            Some(tag) => self.0.contains(&tag),
            None => false,
        }
    }

    /// True when the two sets share a tag or either side is unrestricted.
    pub fn intersects(&self, other: &TeamTags) -> bool {
        self.is_unrestricted()
            || other.is_unrestricted()
            || self.0.intersection(&other.0).next().is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_spacing() {
        let tags = TeamTags::parse(" team  a, Team B;;/ ");
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["TEAM A", "TEAM B"]);
    }

    #[test]
    fn allows_is_case_insensitive() {
        let tags = TeamTags::parse("TEAM A");
        assert!(tags.allows("team a"));
        assert!(tags.allows(" Team   A "));
        assert!(!tags.allows("team b"));
        assert!(!tags.allows(""));
    }

    #[test]
    fn all_and_team_c_are_unrestricted() {
        assert!(TeamTags::parse("all").allows("TEAM Z"));
        assert!(TeamTags::parse("team c").allows("TEAM A"));
        assert!(!TeamTags::parse("team b").is_unrestricted());
    }

    #[test]
    fn intersects_checks_shared_tags() {
        let a = TeamTags::from_tags(["team a", "team b"]);
        let b = TeamTags::parse("TEAM B");
        let c = TeamTags::parse("TEAM D");
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(c.intersects(&TeamTags::parse("ALL")));
    }

    #[test]
    fn serializes_as_plain_list() {
        let tags = TeamTags::parse("b, a");
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["A","B"]"#);
        let back: TeamTags = serde_json::from_str(r#"["team a"]"#).unwrap();
        assert!(back.allows("TEAM A"));
    }
}
