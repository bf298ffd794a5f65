//! Substring search over the course -> topic -> subtopic tree.
//!
//! # Responsibility
//! - Scan every searchable field of a catalog snapshot for a query.
//! - Group matches per course and cut display snippets around body matches.
//!
//! # Invariants
//! - Blank queries return no groups and never touch storage.
//! - Field precedence per course: course title, course description, then per
//!   topic (in order) the topic title followed by each subtopic's title and
//!   content (in order). Every match is kept.
//! - Groups follow catalog order; courses without matches are omitted.
//! - Snippet offsets are counted in characters, not bytes.

use crate::error::{ClassifyError, ErrorKind};
use crate::model::catalog::{Course, CourseId, SubtopicId};
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::RepoError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Characters kept on each side of a body match.
pub const SNIPPET_CONTEXT_CHARS: usize = 50;
const ELLIPSIS: &str = "...";

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error. Only catalog loading can fail; "no match" is success.
#[derive(Debug)]
pub enum SearchError {
    Repo(RepoError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "failed to load catalog for search: {err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl ClassifyError for SearchError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

/// Tree level of the field that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Course title or description.
    Course,
    /// Topic title.
    Topic,
    /// Subtopic title.
    Subtopic,
    /// Subtopic content body.
    Content,
}

/// One matching field inside a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEntry {
    /// Serialized as `type` to match the response schema.
    #[serde(rename = "type")]
    pub kind: MatchKind,
    /// `None` for course-level matches.
    pub topic_title: Option<String>,
    /// `None` above subtopic level.
    pub subtopic_id: Option<SubtopicId>,
    /// `None` above subtopic level.
    pub subtopic_title: Option<String>,
    /// Full title, or a window around the first body match.
    pub snippet: String,
}

/// All matches found in one course, in field precedence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMatchGroup {
    pub course_id: CourseId,
    pub course_title: String,
    pub matches: Vec<MatchEntry>,
}

/// Search response envelope; echoes the caller's raw query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<CourseMatchGroup>,
}

/// Searches the stored catalog.
///
/// Loads one consistent catalog snapshot, then scans it in memory.
/// Returns an empty result list for blank queries.
pub fn search_content<R: CatalogRepository>(
    repo: &R,
    query: &str,
) -> SearchResult<SearchResponse> {
    let started_at = Instant::now();
    let Some(needle) = normalize_query(query) else {
        return Ok(SearchResponse {
            query: query.to_string(),
            results: Vec::new(),
        });
    };

    let courses = repo.load_catalog()?;
    let results = scan_catalog(&courses, &needle);
    debug!(
        "event=content_search module=search status=ok query_chars={} courses_scanned={} groups={} duration_ms={}",
        needle.chars().count(),
        courses.len(),
        results.len(),
        started_at.elapsed().as_millis()
    );

    Ok(SearchResponse {
        query: query.to_string(),
        results,
    })
}

/// Searches an in-memory catalog snapshot.
///
/// Pure function: no I/O and no failure modes.
pub fn search_catalog(courses: &[Course], query: &str) -> Vec<CourseMatchGroup> {
    match normalize_query(query) {
        Some(needle) => scan_catalog(courses, &needle),
        None => Vec::new(),
    }
}

fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(lowercase(trimmed))
}

fn scan_catalog(courses: &[Course], needle: &str) -> Vec<CourseMatchGroup> {
    courses
        .iter()
        .filter_map(|course| {
            let matches = scan_course(course, needle);
            if matches.is_empty() {
                return None;
            }
            Some(CourseMatchGroup {
                course_id: course.id.clone(),
                course_title: course.title.clone(),
                matches,
            })
        })
        .collect()
}

fn scan_course(course: &Course, needle: &str) -> Vec<MatchEntry> {
    let mut matches = Vec::new();

    if contains_ignore_case(&course.title, needle) {
        matches.push(MatchEntry {
            kind: MatchKind::Course,
            topic_title: None,
            subtopic_id: None,
            subtopic_title: None,
            snippet: course.title.clone(),
        });
    }

    if let Some(snippet) = course
        .description
        .as_deref()
        .and_then(|text| body_snippet(text, needle))
    {
        matches.push(MatchEntry {
            kind: MatchKind::Course,
            topic_title: None,
            subtopic_id: None,
            subtopic_title: None,
            snippet,
        });
    }

    for topic in &course.topics {
        if contains_ignore_case(&topic.title, needle) {
            matches.push(MatchEntry {
                kind: MatchKind::Topic,
                topic_title: Some(topic.title.clone()),
                subtopic_id: None,
                subtopic_title: None,
                snippet: topic.title.clone(),
            });
        }

        for subtopic in &topic.subtopics {
            if contains_ignore_case(&subtopic.title, needle) {
                matches.push(MatchEntry {
                    kind: MatchKind::Subtopic,
                    topic_title: Some(topic.title.clone()),
                    subtopic_id: Some(subtopic.id.clone()),
                    subtopic_title: Some(subtopic.title.clone()),
                    snippet: subtopic.title.clone(),
                });
            }

            if let Some(snippet) = subtopic
                .content
                .as_deref()
                .and_then(|text| body_snippet(text, needle))
            {
                matches.push(MatchEntry {
                    kind: MatchKind::Content,
                    topic_title: Some(topic.title.clone()),
                    subtopic_id: Some(subtopic.id.clone()),
                    subtopic_title: Some(subtopic.title.clone()),
                    snippet,
                });
            }
        }
    }

    matches
}

fn contains_ignore_case(text: &str, needle: &str) -> bool {
    locate_ignore_case(text, needle).is_some()
}

/// Per-char lowercasing, so lowered offsets can be mapped back to `text`.
fn lowercase(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Finds the first case-insensitive occurrence of `needle` (already
/// lowercased) and returns its `[start, end)` char range in `text`.
fn locate_ignore_case(text: &str, needle: &str) -> Option<(usize, usize)> {
    let mut lowered = String::with_capacity(text.len());
    // origin[i] is the index in `text` of the char that produced lowered char i.
    let mut origin = Vec::with_capacity(text.len());
    for (index, ch) in text.chars().enumerate() {
        for lower in ch.to_lowercase() {
            lowered.push(lower);
            origin.push(index);
        }
    }

    let byte_index = lowered.find(needle)?;
    let first = lowered[..byte_index].chars().count();
    let needle_chars = needle.chars().count();
    let start = *origin.get(first)?;
    let end = *origin.get(first + needle_chars.checked_sub(1)?)? + 1;
    Some((start, end))
}

fn body_snippet(text: &str, needle: &str) -> Option<String> {
    let (start, end) = locate_ignore_case(text, needle)?;
    Some(snippet_around(text, start, end))
}

/// Cuts `text` to the match plus `SNIPPET_CONTEXT_CHARS` on each side.
///
/// The window is trimmed, then marked with `...` on every side where text
/// was cut off.
fn snippet_around(text: &str, match_start: usize, match_end: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let (from, to) = snippet_window(chars.len(), match_start, match_end);
    let window: String = chars[from..to].iter().collect();

    let mut snippet = String::with_capacity(window.len() + 2 * ELLIPSIS.len());
    if from > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.push_str(window.trim());
    if to < chars.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

fn snippet_window(len: usize, match_start: usize, match_end: usize) -> (usize, usize) {
    let from = match_start.saturating_sub(SNIPPET_CONTEXT_CHARS);
    let to = match_end.saturating_add(SNIPPET_CONTEXT_CHARS).min(len);
    (from, to)
}

#[cfg(test)]
mod tests {
    use super::{
        locate_ignore_case, search_catalog, snippet_around, snippet_window, MatchKind,
    };
    use crate::model::catalog::{Course, Subtopic, Topic};

    fn course(id: &str, title: &str, description: Option<&str>, topics: Vec<Topic>) -> Course {
        Course {
            id: id.to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
            topics,
        }
    }

    fn topic(id: &str, title: &str, subtopics: Vec<Subtopic>) -> Topic {
        Topic {
            id: id.to_string(),
            course_id: String::new(),
            title: title.to_string(),
            order_index: 0,
            subtopics,
        }
    }

    fn subtopic(id: &str, title: &str, content: Option<&str>) -> Subtopic {
        Subtopic {
            id: id.to_string(),
            topic_id: String::new(),
            title: title.to_string(),
            content: content.map(str::to_string),
            order_index: 0,
        }
    }

    #[test]
    fn window_for_match_in_middle_of_long_body() {
        assert_eq!(snippet_window(300, 140, 148), (90, 198));
    }

    #[test]
    fn snippet_has_both_ellipses_when_cut_on_both_sides() {
        let body = format!("{}{}{}", "x".repeat(140), "velocity", "y".repeat(152));
        assert_eq!(body.chars().count(), 300);

        let snippet = snippet_around(&body, 140, 148);
        let expected = format!("...{}velocity{}...", "x".repeat(50), "y".repeat(50));
        assert_eq!(snippet, expected);
    }

    #[test]
    fn snippet_near_start_has_no_leading_ellipsis() {
        let body = format!("Velocity is{}", " the rate of change".repeat(10));
        let snippet = snippet_around(&body, 0, 8);
        assert!(snippet.starts_with("Velocity"));
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn snippet_of_short_body_is_whole_trimmed_text() {
        let snippet = snippet_around("  speed and velocity  ", 12, 20);
        assert_eq!(snippet, "speed and velocity");
    }

    #[test]
    fn snippet_counts_characters_not_bytes() {
        let body = format!("{}velocity{}", "é".repeat(60), "ü".repeat(60));
        let (start, end) = locate_ignore_case(&body, "velocity").expect("match");
        assert_eq!((start, end), (60, 68));
        let snippet = snippet_around(&body, start, end);
        assert_eq!(
            snippet,
            format!("...{}velocity{}...", "é".repeat(50), "ü".repeat(50))
        );
    }

    #[test]
    fn locate_maps_offsets_back_to_original_text() {
        assert_eq!(locate_ignore_case("The VELOCITY vector", "velo"), Some((4, 8)));
        assert_eq!(locate_ignore_case("nothing here", "velo"), None);
    }

    #[test]
    fn blank_queries_match_nothing() {
        let catalog = vec![course("c", "Anything", Some("text"), Vec::new())];
        assert!(search_catalog(&catalog, "").is_empty());
        assert!(search_catalog(&catalog, " \t\n").is_empty());
    }

    #[test]
    fn precedence_keeps_every_field_match_in_order() {
        let catalog = vec![course(
            "motion",
            "Motion basics",
            Some("All about motion."),
            vec![topic(
                "t1",
                "Motion in one dimension",
                vec![subtopic("s1", "Motion graphs", Some("Plot motion over time."))],
            )],
        )];

        let groups = search_catalog(&catalog, "MOTION");
        assert_eq!(groups.len(), 1);
        let kinds: Vec<MatchKind> = groups[0].matches.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MatchKind::Course,
                MatchKind::Course,
                MatchKind::Topic,
                MatchKind::Subtopic,
                MatchKind::Content,
            ]
        );
        assert_eq!(groups[0].matches[0].snippet, "Motion basics");
        assert_eq!(groups[0].matches[1].topic_title, None);
        assert_eq!(
            groups[0].matches[2].topic_title.as_deref(),
            Some("Motion in one dimension")
        );
        assert_eq!(groups[0].matches[2].subtopic_id, None);
        assert_eq!(groups[0].matches[4].subtopic_id.as_deref(), Some("s1"));
    }

    #[test]
    fn absent_text_never_matches() {
        let catalog = vec![course(
            "c",
            "Chemistry",
            None,
            vec![topic("t", "Atoms", vec![subtopic("s", "Bonds", None)])],
        )];
        assert!(search_catalog(&catalog, "velocity").is_empty());
    }
}
