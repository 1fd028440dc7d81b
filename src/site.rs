//! Site-specific selectors and markup helpers for the target e-paper.
//!
//! Everything the crawl knows about the site's markup is concentrated here:
//! the CSS selectors the orchestrator hands to the navigation port, and the
//! pure text helpers that turn raw fragments into titles, edition codes, and
//! article bodies. The selectors track the live site and are the first thing
//! to update when its layout changes; nothing else in the crate encodes
//! markup structure.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

/// The calendar control on the front page.
pub const CALENDAR: &str = "#calendar .calendar-body";
/// Day links inside the calendar; link text is the bare day number.
pub const CALENDAR_DAY_LINKS: &str = "#calendar .calendar-body span > a";
/// The edition list shown once a date is selected.
pub const EDITION_LIST: &str = ".edition-nav ul";
/// Edition links; labels carry the edition code, e.g. "A02·Voices".
pub const EDITION_LINKS: &str = ".edition-nav ul li a";
/// The article list of the active edition.
pub const ARTICLE_LIST: &str = ".article-nav ul";
/// Article links within the list; titles may contain `<br>` and other tags.
pub const ARTICLE_LINKS: &str = ".article-nav ul li a";
/// Container that marks a fully rendered article page.
pub const ARTICLE_BODY: &str = ".article-detail";
/// Headline fragments on the article page, in display order.
pub const ARTICLE_TITLE_HEADINGS: &str =
    ".article-detail .title h1, .article-detail .title h2, .article-detail .title h3";
/// Body paragraphs on the article page.
pub const ARTICLE_PARAGRAPHS: &str = ".article-detail .content p";

/// Edition code substituted when edition discovery fails, so a date is not
/// silently dropped.
pub const DEFAULT_EDITION: &str = "A01";

/// Title placeholder for article pages with no extractable headline.
pub const UNTITLED: &str = "untitled";

static BR_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static EDITION_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]\d{2}").unwrap());

/// Strip markup from an article-list title fragment.
///
/// `<br>` tags become spaces (they separate title lines on the site), all
/// other tags are dropped, and whitespace runs collapse to single spaces.
pub fn strip_title_markup(markup: &str) -> String {
    let spaced = BR_TAGS.replace_all(markup, " ");
    let fragment = Html::parse_fragment(&spaced);
    let text: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract ordered, deduplicated edition codes from edition link labels.
///
/// Labels without a recognizable code are dropped; the first occurrence of
/// each code wins, preserving discovery order.
pub fn extract_edition_codes<I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    labels
        .into_iter()
        .filter_map(|label| {
            EDITION_CODE
                .find(&label)
                .map(|m| m.as_str().to_string())
        })
        .unique()
        .collect()
}

/// Join headline fragments into one title, or [`UNTITLED`] if none survive.
pub fn join_headings<I>(headings: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let title = headings
        .into_iter()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .join(" ");
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

/// Join body paragraphs with the normalized separator, dropping blanks.
///
/// An empty result means extraction failed and no article is produced.
pub fn join_paragraphs<I>(paragraphs: I) -> String
where
    I: IntoIterator<Item = String>,
{
    paragraphs
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_title_markup_replaces_br_with_space() {
        assert_eq!(strip_title_markup("Upper line<br>lower line"), "Upper line lower line");
        assert_eq!(strip_title_markup("a<BR/>b<br />c"), "a b c");
    }

    #[test]
    fn strip_title_markup_drops_other_tags() {
        assert_eq!(
            strip_title_markup("<span class=\"em\">Big</span> <i>news</i> today"),
            "Big news today"
        );
    }

    #[test]
    fn strip_title_markup_collapses_whitespace() {
        assert_eq!(strip_title_markup("  a \n b\t\tc "), "a b c");
    }

    #[test]
    fn strip_title_markup_empty_fragment() {
        assert_eq!(strip_title_markup("<img src=\"x.png\">"), "");
    }

    #[test]
    fn edition_codes_are_extracted_in_order() {
        let labels = vec![
            "A01·Front".to_string(),
            "A02·Voices".to_string(),
            "special supplement".to_string(),
            "B01·Business".to_string(),
        ];
        assert_eq!(extract_edition_codes(labels), vec!["A01", "A02", "B01"]);
    }

    #[test]
    fn edition_codes_are_deduplicated_preserving_first() {
        let labels = vec![
            "A02 evening".to_string(),
            "A01".to_string(),
            "A02 repeat".to_string(),
        ];
        assert_eq!(extract_edition_codes(labels), vec!["A02", "A01"]);
    }

    #[test]
    fn join_headings_falls_back_to_untitled() {
        assert_eq!(join_headings(vec!["  ".to_string(), String::new()]), UNTITLED);
        assert_eq!(
            join_headings(vec!["Main".to_string(), "Subtitle".to_string()]),
            "Main Subtitle"
        );
    }

    #[test]
    fn join_paragraphs_drops_blanks() {
        let paragraphs = vec![
            " first ".to_string(),
            String::new(),
            "second".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(join_paragraphs(paragraphs), "first\nsecond");
    }

    #[test]
    fn join_paragraphs_empty_means_no_article() {
        assert_eq!(join_paragraphs(Vec::<String>::new()), "");
    }
}
