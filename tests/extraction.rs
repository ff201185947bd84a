use pretty_assertions::assert_eq;
use scraper::Html;
use sitechat::html::HtmlExtractor;
use sitechat::{is_crawlable, same_domain};
use url::Url;

#[test]
fn fixture_text_matches_expected_output() {
    let document = Html::parse_document(include_str!("fixtures/html/docs-page.html"));
    let extracted = HtmlExtractor::new().extract_text(&document);

    assert_eq!(extracted.title, "Widget Docs");
    assert_eq!(
        extracted.text,
        include_str!("fixtures/expected/docs-page.txt").trim_end()
    );
}

#[test]
fn fixture_links_filter_to_crawlable_same_site() {
    let document = Html::parse_document(include_str!("fixtures/html/docs-page.html"));
    let base = Url::parse("https://widget.test/docs/").expect("base url");
    let links = HtmlExtractor::new().outbound_links(&document, &base);

    assert_eq!(links.len(), 4);
    let followed: Vec<&str> = links
        .iter()
        .map(String::as_str)
        .filter(|link| is_crawlable(link) && same_domain(link, "https://www.widget.test"))
        .collect();
    assert_eq!(
        followed,
        vec![
            "https://widget.test/",
            "https://widget.test/docs",
            "https://widget.test/docs/install#linux",
        ]
    );
}
