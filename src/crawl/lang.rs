// src/crawl/lang.rs
// Page language filter (--langs): looks at <html lang="..."> only.

use scraper::{Html, Selector};

// Primary language subtag declared on the root element, lower-cased
//
// "<html lang='en-US'>" -> Some("en")
pub fn declared_language(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("html[lang]").ok()?;

    let lang = document.select(&selector).next()?.value().attr("lang")?;
    let primary = lang.trim().split(['-', '_']).next()?.to_ascii_lowercase();

    if primary.is_empty() {
        None
    } else {
        Some(primary)
    }
}

// An empty list allows everything, and so does a page that declares nothing
pub fn language_allowed(html: &str, langs: &[String]) -> bool {
    if langs.is_empty() {
        return true;
    }

    match declared_language(html) {
        Some(lang) => langs.iter().any(|allowed| allowed.eq_ignore_ascii_case(&lang)),
        None => true,
    }
}
