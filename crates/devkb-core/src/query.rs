//! Query, filter, and pagination engine shared by search and listing.
//!
//! # Matching
//!
//! 1. Text: the lowercased query must be a substring of the lowercased
//!    `title` or `content`. No tokenization and no scoring.
//! 2. Type: exact equality when a type filter is given. A type name that
//!    is not a known [`EntryType`] matches nothing.
//! 3. Tags: the entry matches when any of its tags equals any requested tag.
//!
//! The predicates are ANDed. Matches keep store iteration order; `total`
//! counts every match before the `[offset, offset + limit)` window is cut.

use serde::Serialize;

use crate::models::{EntryType, KnowledgeEntry};

/// Default page size for `GET /api/search`.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Default page size for `GET /api/entries`.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

impl PageRequest {
    /// Builds a window from raw query-string values.
    ///
    /// Only the leading integer counts. Input with no leading digits falls
    /// back to the default (`default_limit`, offset 0); negative numbers
    /// clamp to 0.
    pub fn from_params(limit: Option<&str>, offset: Option<&str>, default_limit: usize) -> Self {
        Self {
            limit: parse_count(limit).unwrap_or(default_limit),
            offset: parse_count(offset).unwrap_or(0),
        }
    }
}

/// Reads the leading integer of `raw`, ignoring trailing junk (`"5x"` is 5).
///
/// `None` when there are no leading digits at all.
fn parse_count(raw: Option<&str>) -> Option<usize> {
    let s = raw?.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    if negative {
        return Some(0);
    }
    Some(digits[..end].parse().unwrap_or(usize::MAX))
}

/// Type predicate built from a raw `type` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    Any,
    Only(EntryType),
    /// The parameter named no known type; nothing matches.
    Unknown,
}

impl TypeFilter {
    /// Absent or empty means no filter.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => TypeFilter::Any,
            Some(s) => s.parse::<EntryType>().map_or(TypeFilter::Unknown, TypeFilter::Only),
        }
    }

    pub fn matches(self, entry_type: EntryType) -> bool {
        match self {
            TypeFilter::Any => true,
            TypeFilter::Only(t) => t == entry_type,
            TypeFilter::Unknown => false,
        }
    }
}

/// Splits a comma-separated tag list into trimmed tags.
///
/// Returns `None` for an absent or empty parameter, meaning "no tag filter".
pub fn parse_tags(raw: Option<&str>) -> Option<Vec<String>> {
    match raw {
        None | Some("") => None,
        Some(s) => Some(s.split(',').map(|t| t.trim().to_string()).collect()),
    }
}

/// All inputs for one search or list call.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    /// Free-text query; `None` lists without a text predicate.
    pub query: Option<&'a str>,
    pub entry_type: TypeFilter,
    pub tags: Option<Vec<String>>,
    pub page: PageRequest,
}

/// One page of results plus the unpaginated match count.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: PageRequest,
}

/// True when `query_lower` occurs in the entry's title or content,
/// ignoring case. `query_lower` must already be lowercased.
pub fn matches_text(entry: &KnowledgeEntry, query_lower: &str) -> bool {
    entry.title.to_lowercase().contains(query_lower)
        || entry.content.to_lowercase().contains(query_lower)
}

fn matches_tags(entry: &KnowledgeEntry, wanted: &[String]) -> bool {
    wanted.iter().any(|tag| entry.tags.contains(tag))
}

/// Filters `entries` and cuts the requested page.
pub fn search(entries: Vec<KnowledgeEntry>, req: &SearchRequest<'_>) -> Page<KnowledgeEntry> {
    let query_lower = req.query.map(str::to_lowercase);

    let matched: Vec<KnowledgeEntry> = entries
        .into_iter()
        .filter(|e| {
            query_lower
                .as_deref()
                .map_or(true, |q| matches_text(e, q))
        })
        .filter(|e| req.entry_type.matches(e.entry_type))
        .filter(|e| {
            req.tags
                .as_deref()
                .map_or(true, |tags| matches_tags(e, tags))
        })
        .collect();

    let total = matched.len();
    let items = matched
        .into_iter()
        .skip(req.page.offset)
        .take(req.page.limit)
        .collect();

    Page {
        items,
        total,
        page: req.page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewEntry;
    use chrono::Utc;

    fn make_entry(t: EntryType, title: &str, content: &str, tags: &[&str]) -> KnowledgeEntry {
        NewEntry {
            entry_type: Some(t),
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            tags: Some(tags.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
        .into_entry("api", Utc::now())
        .unwrap()
    }

    fn request(query: Option<&str>) -> SearchRequest<'_> {
        SearchRequest {
            query,
            entry_type: TypeFilter::Any,
            tags: None,
            page: PageRequest {
                limit: DEFAULT_SEARCH_LIMIT,
                offset: 0,
            },
        }
    }

    fn fixture() -> Vec<KnowledgeEntry> {
        vec![
            make_entry(EntryType::Decision, "Use JWT", "Stateless FOO auth", &["auth", "jwt"]),
            make_entry(EntryType::Code, "foo helper", "utility code", &["util"]),
            make_entry(EntryType::Decision, "Pick Postgres", "no match here", &["db"]),
            make_entry(EntryType::Process, "Release train", "weekly foo cadence", &["auth"]),
        ]
    }

    #[test]
    fn test_text_match_is_case_insensitive_over_title_and_content() {
        let page = search(fixture(), &request(Some("Foo")));
        let titles: Vec<&str> = page.items.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Use JWT", "foo helper", "Release train"]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_type_and_tags_intersect() {
        let mut req = request(Some("foo"));
        req.entry_type = TypeFilter::Only(EntryType::Decision);
        req.tags = parse_tags(Some("auth"));
        let page = search(fixture(), &req);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Use JWT");
    }

    #[test]
    fn test_unknown_type_matches_nothing() {
        let mut req = request(Some("foo"));
        req.entry_type = TypeFilter::from_param(Some("memo"));
        assert_eq!(req.entry_type, TypeFilter::Unknown);
        let page = search(fixture(), &req);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_type_param_parsing() {
        assert_eq!(TypeFilter::from_param(None), TypeFilter::Any);
        assert_eq!(TypeFilter::from_param(Some("")), TypeFilter::Any);
        assert_eq!(
            TypeFilter::from_param(Some("doc")),
            TypeFilter::Only(EntryType::Documentation)
        );
    }

    #[test]
    fn test_tags_match_any_after_trim() {
        let mut req = request(None);
        req.tags = parse_tags(Some(" db , util"));
        let page = search(fixture(), &req);
        let titles: Vec<&str> = page.items.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["foo helper", "Pick Postgres"]);
    }

    #[test]
    fn test_tag_match_is_exact() {
        let mut req = request(None);
        req.tags = parse_tags(Some("Auth"));
        assert_eq!(search(fixture(), &req).total, 0);
    }

    #[test]
    fn test_empty_tags_param_means_no_filter() {
        assert_eq!(parse_tags(Some("")), None);
        assert_eq!(parse_tags(None), None);
    }

    #[test]
    fn test_pagination_window_and_total() {
        let entries: Vec<KnowledgeEntry> = (0..25)
            .map(|i| make_entry(EntryType::Code, &format!("match {}", i), "body", &[]))
            .collect();
        let mut req = request(Some("match"));
        req.page = PageRequest::from_params(Some("10"), Some("20"), DEFAULT_SEARCH_LIMIT);
        let page = search(entries, &req);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total, 25);
        assert_eq!(page.items[0].title, "match 20");
    }

    #[test]
    fn test_offset_past_end_is_empty_page() {
        let mut req = request(None);
        req.page.offset = 100;
        let page = search(fixture(), &req);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 4);
    }

    #[test]
    fn test_page_params_fallbacks() {
        assert_eq!(
            PageRequest::from_params(None, None, DEFAULT_LIST_LIMIT),
            PageRequest {
                limit: 50,
                offset: 0
            }
        );
        assert_eq!(
            PageRequest::from_params(Some("abc"), Some("-3"), DEFAULT_SEARCH_LIMIT),
            PageRequest {
                limit: 10,
                offset: 0
            }
        );
    }

    #[test]
    fn test_page_params_read_leading_digits() {
        assert_eq!(
            PageRequest::from_params(Some("3abc"), Some("5x"), DEFAULT_SEARCH_LIMIT),
            PageRequest {
                limit: 3,
                offset: 5
            }
        );
        assert_eq!(
            PageRequest::from_params(Some(" 7"), Some("-2x"), DEFAULT_SEARCH_LIMIT),
            PageRequest {
                limit: 7,
                offset: 0
            }
        );
        assert_eq!(
            PageRequest::from_params(Some("-"), Some("x5"), DEFAULT_LIST_LIMIT),
            PageRequest {
                limit: 50,
                offset: 0
            }
        );
    }
}
