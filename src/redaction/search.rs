use egui::{Color32, vec2};
use futures::future::BoxFuture;
use log::{debug, info};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::element::{Element, factory};
use crate::error::SearchError;
use crate::geometry::{CoordinateMapper, DocRect, PageSize, Position, Size};

/// Padding added around every match, PDF points.
pub const MATCH_PADDING: f32 = 2.0;
const FALLBACK_RUN_WIDTH: f32 = 50.0;
const FALLBACK_RUN_HEIGHT: f32 = 12.0;

/// One positioned piece of page text as the extraction backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    /// `[a, b, c, d, e, f]`; `e`/`f` place the run's baseline origin in document space.
    pub transform: [f32; 6],
    pub width: f32,
    pub height: f32,
}

impl TextRun {
    fn doc_width(&self) -> f32 {
        if self.width > 0.0 { self.width } else { FALLBACK_RUN_WIDTH }
    }

    fn doc_height(&self) -> f32 {
        if self.height > 0.0 {
            self.height
        } else if self.transform[3] != 0.0 {
            self.transform[3].abs()
        } else {
            FALLBACK_RUN_HEIGHT
        }
    }
}

/// Extracts the text runs of a page.
pub trait TextExtractor {
    fn extract(&self, page: u32) -> BoxFuture<'static, Result<Vec<TextRun>, SearchError>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Treat the query as a regular expression instead of literal text.
    pub regex: bool,
    pub case_sensitive: bool,
    pub padding: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            regex: false,
            case_sensitive: false,
            padding: MATCH_PADDING,
        }
    }
}

/// Where a match was found, in page percent.
///
/// Geometry is an estimate: glyphs are assumed to share the run's width evenly, so
/// boxes drift on proportional fonts. `approximate` is always set; review the boxes
/// before burning redactions into a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMatch {
    pub page: u32,
    pub text: String,
    pub position: Position,
    pub size: Size,
    pub approximate: bool,
}

/// Compile a query. Fails before any page is searched.
pub fn compile(query: &str, options: &SearchOptions) -> Result<Regex, SearchError> {
    let invalid = |reason: String| SearchError::InvalidPattern {
        pattern: query.to_owned(),
        reason,
    };
    if query.trim().is_empty() {
        return Err(invalid("empty pattern".to_owned()));
    }
    let source = if options.regex { query.to_owned() } else { regex::escape(query) };
    RegexBuilder::new(&source)
        .case_insensitive(!options.case_sensitive)
        .build()
        .map_err(|err| invalid(err.to_string()))
}

/// Matches of `pattern` in the concatenated text of one page.
///
/// Each match is boxed inside the run holding its first character, proportionally
/// to its character span there; a match crossing into the next run is clipped to the
/// end of its first run.
pub fn find_matches(page: u32, page_size: PageSize, runs: &[TextRun], pattern: &Regex, padding: f32) -> Vec<TextMatch> {
    let full: String = runs.iter().map(|r| r.text.as_str()).collect();
    let mapper = CoordinateMapper::new(vec2(page_size.width, page_size.height), page_size);

    let mut out = Vec::new();
    for found in pattern.find_iter(&full).filter(|m| !m.is_empty()) {
        let start = full[..found.start()].chars().count();
        let len = found.as_str().chars().count();

        let mut run_start = 0;
        for run in runs {
            let run_len = run.text.chars().count();
            if run_len == 0 || start >= run_start + run_len {
                run_start += run_len;
                continue;
            }
            let offset = start - run_start;
            let span = len.min(run_len - offset);
            let char_width = run.doc_width() / run_len as f32;
            let rect = DocRect {
                x: run.transform[4] + offset as f32 * char_width - padding,
                y: run.transform[5] - padding,
                width: span as f32 * char_width + padding * 2.0,
                height: run.doc_height() + padding * 2.0,
            };
            let (position, size) = mapper.rect_from_document(rect);
            out.extend(clipped_match(page, found.as_str(), position, size));
            break;
        }
    }
    debug!("page {page}: {} match(es) for /{}/", out.len(), pattern.as_str());
    out
}

/// The part of a match box that lies on the page; `None` when nothing does.
fn clipped_match(page: u32, text: &str, position: Position, size: Size) -> Option<TextMatch> {
    let left = position.x.max(0.0);
    let top = position.y.max(0.0);
    let right = (position.x + size.width).min(100.0);
    let bottom = (position.y + size.height).min(100.0);
    if right <= left || bottom <= top {
        debug!("match {text:?} on page {page} lies off the page");
        return None;
    }
    Some(TextMatch {
        page,
        text: text.to_owned(),
        position: Position::new(left, top),
        size: Size::new(right - left, bottom - top),
        approximate: true,
    })
}

/// Search every page in `pages`. An invalid query fails before any extraction.
pub async fn search_document(
    extractor: &dyn TextExtractor,
    pages: &[(u32, PageSize)],
    query: &str,
    options: &SearchOptions,
) -> Result<Vec<TextMatch>, SearchError> {
    let pattern = compile(query, options)?;
    let mut matches = Vec::new();
    for (page, size) in pages {
        let runs = extractor.extract(*page).await?;
        matches.extend(find_matches(*page, *size, &runs, &pattern, options.padding));
    }
    info!("found {} match(es) for {query:?}", matches.len());
    Ok(matches)
}

/// One redaction element per match.
pub fn redactions_for(matches: &[TextMatch], color: Color32) -> Vec<Element> {
    matches
        .iter()
        .map(|m| factory::create_redaction(m.page, m.position, m.size, color))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use futures::executor::block_on;

    fn run(text: &str, x: f32, y: f32, width: f32) -> TextRun {
        TextRun {
            text: text.to_owned(),
            transform: [1.0, 0.0, 0.0, 10.0, x, y],
            width,
            height: 10.0,
        }
    }

    const PAGE: PageSize = PageSize::new(100.0, 200.0);

    #[test]
    fn test_literal_is_escaped_and_case_insensitive() {
        let pattern = compile("a.b", &SearchOptions::default()).unwrap();
        assert!(pattern.is_match("xA.By"));
        assert!(!pattern.is_match("axb"));
    }

    #[test]
    fn test_invalid_regex() {
        let options = SearchOptions {
            regex: true,
            ..Default::default()
        };
        let err = compile("(unclosed", &options).unwrap_err();
        assert!(matches!(err, SearchError::InvalidPattern { .. }));
        assert!(compile("  ", &SearchOptions::default()).is_err());
    }

    #[test]
    fn test_proportional_box_within_run() {
        // 10 chars over 50pt: 5pt per char.
        let runs = [run("0123456789", 10.0, 100.0, 50.0)];
        let pattern = compile("345", &SearchOptions::default()).unwrap();
        let found = find_matches(1, PAGE, &runs, &pattern, 0.0);
        assert_eq!(found.len(), 1);

        let m = &found[0];
        assert!(m.approximate);
        assert_eq!(m.text, "345");
        // x = 10 + 3 * 5 = 25pt of 100pt.
        assert!((m.position.x - 25.0).abs() < 1e-4);
        assert!((m.size.width - 15.0).abs() < 1e-4);
        // Top edge: 200 - 100 - 10 = 90pt of 200pt.
        assert!((m.position.y - 45.0).abs() < 1e-4);
        assert!((m.size.height - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_match_located_in_second_run() {
        let runs = [run("hello ", 0.0, 100.0, 30.0), run("secret word", 40.0, 100.0, 55.0)];
        let pattern = compile("SECRET", &SearchOptions::default()).unwrap();
        let found = find_matches(2, PAGE, &runs, &pattern, MATCH_PADDING);
        assert_eq!(found.len(), 1);
        // 40 - 2 padding = 38pt.
        assert!((found[0].position.x - 38.0).abs() < 1e-4);
        // 6 chars * 5pt + 4pt padding.
        assert!((found[0].size.width - 34.0).abs() < 1e-4);
        assert_eq!(found[0].page, 2);
    }

    #[test]
    fn test_boxes_clipped_to_page() {
        let runs = [run("edge", 0.0, 190.0, 20.0)];
        let pattern = compile("edge", &SearchOptions::default()).unwrap();
        let m = &find_matches(1, PAGE, &runs, &pattern, MATCH_PADDING)[0];
        assert_eq!(m.position.x, 0.0);
        assert_eq!(m.position.y, 0.0);
        // -2..22pt clipped at the left edge.
        assert!((m.size.width - 22.0).abs() < 1e-4);
    }

    #[test]
    fn test_match_partly_off_the_right_edge() {
        let runs = [run("tail", 90.0, 100.0, 20.0), run("gone", 120.0, 100.0, 20.0)];
        let options = SearchOptions {
            regex: true,
            ..Default::default()
        };
        let pattern = compile("tail|gone", &options).unwrap();
        let found = find_matches(1, PAGE, &runs, &pattern, MATCH_PADDING);
        assert_eq!(found.len(), 1);

        let m = &found[0];
        assert_eq!(m.text, "tail");
        assert!((m.position.x - 88.0).abs() < 1e-4);
        assert!((m.size.width - 12.0).abs() < 1e-4);
        assert!(m.size.height > 0.0);
    }

    struct Fixed(Vec<TextRun>);

    impl TextExtractor for Fixed {
        fn extract(&self, _page: u32) -> BoxFuture<'static, Result<Vec<TextRun>, SearchError>> {
            futures::future::ready(Ok(self.0.clone())).boxed()
        }
    }

    #[test]
    fn test_search_document_and_redactions() {
        let extractor = Fixed(vec![run("pay 100 or 200", 0.0, 100.0, 70.0)]);
        let options = SearchOptions {
            regex: true,
            ..Default::default()
        };
        let pages = [(1, PAGE), (2, PAGE)];
        let matches = block_on(search_document(&extractor, &pages, r"\d+", &options)).unwrap();
        assert_eq!(matches.len(), 4);

        let redactions = redactions_for(&matches, Color32::BLACK);
        assert_eq!(redactions.len(), 4);
        assert_eq!(redactions[3].page, Some(2));
    }

    #[test]
    fn test_invalid_pattern_searches_nothing() {
        struct Unreachable;
        impl TextExtractor for Unreachable {
            fn extract(&self, _page: u32) -> BoxFuture<'static, Result<Vec<TextRun>, SearchError>> {
                panic!("extraction must not start for an invalid pattern")
            }
        }
        let options = SearchOptions {
            regex: true,
            ..Default::default()
        };
        let result = block_on(search_document(&Unreachable, &[(1, PAGE)], "[", &options));
        assert!(matches!(result, Err(SearchError::InvalidPattern { .. })));
    }
}
