//! Removal of `<link>` references to stylesheets that no longer exist.

use regex::Regex;

lazy_static! {
    /// A `<link>` start tag. Quoted attribute values may contain `>`.
    static ref LINK_TAG_RE: Regex =
        Regex::new(r#"(?i)<link\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).unwrap();
    static ref ATTRIBUTE_RE: Regex = Regex::new(
        r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#
    )
    .unwrap();
}

/// Remove every `<link>` element whose `href` refers to the stylesheet
/// `css_name`, returning the document unchanged when there is none.
///
/// A line left with nothing but whitespace is removed along with its tags.
pub fn remove_link_stylesheets(html: &str, css_name: &str) -> String {
    let tags: Vec<(usize, usize)> = LINK_TAG_RE
        .captures_iter(html)
        .filter(|tag| link_refers_to(tag.get(1).map_or("", |m| m.as_str()), css_name))
        .filter_map(|tag| tag.get(0).map(|whole| (whole.start(), whole.end())))
        .collect();
    if tags.is_empty() {
        return html.to_string();
    }

    let mut result = String::with_capacity(html.len());
    let mut last = 0;
    for (start, end) in removal_spans(html, &tags) {
        result.push_str(&html[last..start]);
        last = end;
    }
    result.push_str(&html[last..]);
    result
}

fn link_refers_to(attrs: &str, css_name: &str) -> bool {
    ATTRIBUTE_RE
        .captures_iter(attrs)
        .filter(|attr| attr[1].eq_ignore_ascii_case("href"))
        .filter_map(|attr| attr.get(2).or_else(|| attr.get(3)).or_else(|| attr.get(4)))
        .any(|value| href_matches(value.as_str().trim(), css_name))
}

/// `href` matches when, without query and fragment, it is the artifact name
/// itself or a path ending in `/<name>`.
fn href_matches(href: &str, css_name: &str) -> bool {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    match path.strip_suffix(css_name) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('/'),
        None => false,
    }
}

/// Turn the tag spans into the spans to cut. Tags sharing a line are taken
/// together: when only whitespace remains on the line once they are gone,
/// the whole line (newline included) is cut instead.
fn removal_spans(html: &str, tags: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut spans = Vec::with_capacity(tags.len());
    let mut rest = tags;
    while let Some(&(first_start, _)) = rest.first() {
        let on_line = 1 + rest
            .windows(2)
            .take_while(|pair| !html[pair[0].1..pair[1].0].contains('\n'))
            .count();
        let (line_tags, next) = rest.split_at(on_line);
        rest = next;

        let last_end = line_tags[line_tags.len() - 1].1;
        let line_start = html[..first_start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = html[last_end..]
            .find('\n')
            .map_or(html.len(), |i| last_end + i + 1);

        let blank = html[line_start..first_start].trim().is_empty()
            && html[last_end..line_end].trim().is_empty()
            && line_tags
                .windows(2)
                .all(|pair| html[pair[0].1..pair[1].0].trim().is_empty());
        if blank {
            spans.push((line_start, line_end));
        } else {
            spans.extend_from_slice(line_tags);
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <script type="module" crossorigin src="/assets/index-4f1c.js"></script>
    <link rel="stylesheet" href="/assets/index-9a2b.css">
  </head>
  <body>
    <div id="app"></div>
  </body>
</html>
"#;

    #[test]
    fn test_removes_stylesheet_link() {
        let html = remove_link_stylesheets(INDEX_HTML, "assets/index-9a2b.css");
        assert!(!html.contains("index-9a2b.css"));
        assert!(html.contains(
            "<script type=\"module\" crossorigin src=\"/assets/index-4f1c.js\"></script>\n  </head>"
        ));
    }

    #[test]
    fn test_missing_reference_is_unchanged() {
        let html = remove_link_stylesheets(INDEX_HTML, "assets/other.css");
        assert_eq!(html, INDEX_HTML);
    }

    #[test]
    fn test_stripping_is_idempotent() {
        let once = remove_link_stylesheets(INDEX_HTML, "assets/index-9a2b.css");
        let twice = remove_link_stylesheets(&once, "assets/index-9a2b.css");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_multiline_tag_with_reordered_attributes() {
        let html = "<head>\n  <link\n    href='a.css'\n    crossorigin\n    rel=\"stylesheet\"\n  >\n  <title>t</title>\n</head>";
        assert_eq!(
            remove_link_stylesheets(html, "a.css"),
            "<head>\n  <title>t</title>\n</head>"
        );
    }

    #[test]
    fn test_inline_tag_keeps_surrounding_markup() {
        let html = "<head><link rel=stylesheet href=a.css><title>t</title></head>";
        assert_eq!(
            remove_link_stylesheets(html, "a.css"),
            "<head><title>t</title></head>"
        );
    }

    #[test]
    fn test_only_exact_references_match() {
        let html = concat!(
            "<link rel=\"stylesheet\" href=\"/assets/xa.css\">",
            "<link rel=\"stylesheet\" href=\"/assets/a.css.map\">",
            "<link rel=\"stylesheet\" data-href=\"a.css\" href=\"b.css\">",
        );
        assert_eq!(remove_link_stylesheets(html, "a.css"), html);
    }

    #[test]
    fn test_href_with_query_and_base_path() {
        assert!(href_matches("/base/assets/a.css?v=1", "assets/a.css"));
        assert!(href_matches("./a.css#x", "a.css"));
        assert!(href_matches("a.css", "a.css"));
        assert!(!href_matches("assets/xa.css", "a.css"));
    }

    #[test]
    fn test_quoted_gt_inside_attribute() {
        let html = "<link title=\"a > b\" rel=\"stylesheet\" href=\"a.css\"><p>x</p>";
        assert_eq!(remove_link_stylesheets(html, "a.css"), "<p>x</p>");
    }

    #[test]
    fn test_tags_sharing_a_line_remove_the_line() {
        let html = "<head>\n  <link rel=\"preload\" as=\"style\" href=\"/a.css\"> <link rel=\"stylesheet\" href=\"/a.css\">\n  <title>t</title>\n</head>";
        assert_eq!(
            remove_link_stylesheets(html, "a.css"),
            "<head>\n  <title>t</title>\n</head>"
        );
    }

    #[test]
    fn test_tags_sharing_a_line_with_markup() {
        let html = "<link rel=\"stylesheet\" href=\"a.css\"><b>x</b><link rel=\"preload\" href=\"a.css\">\n<p>y</p>";
        assert_eq!(
            remove_link_stylesheets(html, "a.css"),
            "<b>x</b>\n<p>y</p>"
        );
    }

    #[test]
    fn test_removes_every_matching_link() {
        let html = "<link rel=\"preload\" as=\"style\" href=\"/a.css\">\n<link rel=\"stylesheet\" href=\"/a.css\">\n<p>x</p>";
        assert_eq!(remove_link_stylesheets(html, "a.css"), "<p>x</p>");
    }
}
