//! HTML-to-record extraction.
//!
//! [`extract`] turns one article page into an [`ArticleRecord`]. Every field
//! is located through a chain of well-known markup locations (meta tags,
//! headline elements, byline elements) and each chain is independently
//! optional: a page without a byline still yields its title, text, and
//! links. Extraction never fails; a page without a recognizable content
//! region simply produces an empty body text, which fails the keyword test
//! downstream and is discarded there.
//!
//! # Field fallback chains
//!
//! | Field | Tried in order |
//! |-------|----------------|
//! | title | `h1`, `<title>` |
//! | date  | `time[datetime]`, `time` text, class containing `datum`/`date` |
//! | author | `meta[name=author]`, `meta[property=author]`, `link[rel=author]`, class containing `author` |
//! | tags | `meta[name=keywords]`, `a`/`span` class containing `tag`/`keyword` |
//! | image | `meta[property=og:image]`, first `img[src]` in the content region |
//! | text | `article`, `main`, `div[class*=article]`, `div[id*=content]` |

use crate::models::ArticleRecord;
use crate::utils::collapse_whitespace;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::BTreeSet;
use tracing::debug;
use url::Url;

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static TITLE_TAG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static TIME_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());
static DATE_CLASS_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        r#"span[class*="datum" i], div[class*="datum" i], p[class*="datum" i],
           span[class*="date" i], div[class*="date" i], p[class*="date" i]"#,
    )
    .unwrap()
});
static AUTHOR_META_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="author"], meta[property="author"]"#).unwrap());
static AUTHOR_LINK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"link[rel="author"]"#).unwrap());
static AUTHOR_CLASS_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        r#"span[class*="author" i], div[class*="author" i], p[class*="author" i]"#,
    )
    .unwrap()
});
static KEYWORDS_META_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="keywords"]"#).unwrap());
static TAG_CLASS_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        r#"a[class*="tag" i], span[class*="tag" i],
           a[class*="keyword" i], span[class*="keyword" i]"#,
    )
    .unwrap()
});
static OG_IMAGE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).unwrap());
static IMG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").unwrap());
static CONTENT_SELS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article", "main", r#"div[class*="article" i]"#, r#"div[id*="content" i]"#]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static LINK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Elements whose subtree is boilerplate, not article text.
const SKIP_TAGS: [&str; 6] = ["script", "style", "nav", "header", "footer", "aside"];

/// Parse one article page into a structured record.
///
/// `source_url` must be the (normalized) URL the HTML was fetched from; it
/// anchors relative image and link resolution and the same-origin filter on
/// outbound links.
pub fn extract(html: &str, source_url: &Url) -> ArticleRecord {
    let document = Html::parse_document(html);

    let title = first_text(&document, &TITLE_SEL).or_else(|| first_text(&document, &TITLE_TAG_SEL));
    let published_date = extract_date(&document);
    let author = extract_author(&document);
    let tags = extract_tags(&document);

    let content = content_region(&document);
    let full_text = content.map(region_text).unwrap_or_default();
    let main_image_url = extract_main_image(&document, content, source_url);
    let outbound_links = extract_links(&document, source_url);

    debug!(
        url = %source_url,
        has_title = title.is_some(),
        text_chars = full_text.chars().count(),
        links = outbound_links.len(),
        "Extracted article record"
    );

    ArticleRecord {
        url: source_url.to_string(),
        title,
        published_date,
        author,
        tags,
        main_image_url,
        full_text,
        outbound_links,
    }
}

/// Locate the main content region, preferring semantic containers over
/// class/id heuristics.
fn content_region(document: &Html) -> Option<ElementRef<'_>> {
    CONTENT_SELS
        .iter()
        .find_map(|selector| document.select(selector).next())
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().and_then(|el| {
        let text = collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "));
        (!text.is_empty()).then_some(text)
    })
}

fn extract_date(document: &Html) -> Option<String> {
    if let Some(time) = document.select(&TIME_SEL).next() {
        if let Some(datetime) = time.value().attr("datetime") {
            let datetime = datetime.trim();
            if !datetime.is_empty() {
                return Some(datetime.to_string());
            }
        }
        let text = collapse_whitespace(&time.text().collect::<Vec<_>>().join(" "));
        if !text.is_empty() {
            return Some(text);
        }
    }
    first_text(document, &DATE_CLASS_SEL)
}

fn extract_author(document: &Html) -> Option<String> {
    if let Some(meta) = document.select(&AUTHOR_META_SEL).next() {
        if let Some(content) = meta.value().attr("content") {
            let content = content.trim();
            if !content.is_empty() {
                return Some(content.to_string());
            }
        }
    }
    if let Some(link) = document.select(&AUTHOR_LINK_SEL).next() {
        if let Some(href) = link.value().attr("href") {
            let href = href.trim();
            if !href.is_empty() {
                return Some(href.to_string());
            }
        }
    }
    first_text(document, &AUTHOR_CLASS_SEL)
}

fn extract_tags(document: &Html) -> Vec<String> {
    let mut tags = Vec::new();
    if let Some(meta) = document.select(&KEYWORDS_META_SEL).next() {
        if let Some(content) = meta.value().attr("content") {
            for raw in content.split(',') {
                let tag = raw.trim();
                if !tag.is_empty() {
                    push_unique(&mut tags, tag.to_string());
                }
            }
        }
    }
    if tags.is_empty() {
        for node in document.select(&TAG_CLASS_SEL) {
            let tag = collapse_whitespace(&node.text().collect::<Vec<_>>().join(" "));
            if !tag.is_empty() {
                push_unique(&mut tags, tag);
            }
        }
    }
    tags
}

fn extract_main_image(
    document: &Html,
    content: Option<ElementRef<'_>>,
    source_url: &Url,
) -> Option<String> {
    if let Some(meta) = document.select(&OG_IMAGE_SEL).next() {
        if let Some(src) = meta.value().attr("content") {
            let src = src.trim();
            if !src.is_empty() {
                return source_url.join(src).ok().map(|u| u.to_string());
            }
        }
    }
    let img = content.and_then(|region| region.select(&IMG_SEL).next());
    img.and_then(|img| img.value().attr("src"))
        .and_then(|src| source_url.join(src.trim()).ok())
        .map(|u| u.to_string())
}

fn extract_links(document: &Html, source_url: &Url) -> BTreeSet<String> {
    let mut links = BTreeSet::new();
    for anchor in document.select(&LINK_SEL) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(mut resolved) = source_url.join(href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        if resolved.host_str() != source_url.host_str() {
            continue;
        }
        resolved.set_fragment(None);
        links.insert(resolved.to_string());
    }
    links
}

/// Concatenate the text nodes of a content region, skipping boilerplate
/// subtrees, with whitespace collapsed.
fn region_text(region: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(region, &mut parts);
    collapse_whitespace(&parts.join(" "))
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push(text.to_string()),
            Node::Element(el) => {
                if SKIP_TAGS.contains(&el.name()) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn push_unique(tags: &mut Vec<String>, tag: String) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}
