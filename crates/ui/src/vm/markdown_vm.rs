use std::collections::{HashMap, HashSet};

/// Render backend narrative as sanitized HTML.
///
/// Story text is model output; it commonly carries emphasis and lists but
/// must never inject markup of its own.
#[must_use]
pub fn markdown_to_html(input: &str) -> String {
    let mut options = pulldown_cmark::Options::empty();
    options.insert(pulldown_cmark::Options::ENABLE_STRIKETHROUGH);

    let parser = pulldown_cmark::Parser::new_ext(input, options);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    sanitize_html(&html)
}

#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = [
        "p", "br", "em", "strong", "b", "i", "del", "code", "blockquote", "ul", "ol", "li",
    ]
    .into_iter()
    .collect();

    ammonia::Builder::new()
        .tags(tags)
        .tag_attributes(HashMap::new())
        .clean(html)
        .to_string()
}

/// Strip Markdown emphasis markers for plain-text output.
#[must_use]
pub fn markdown_to_plain(input: &str) -> String {
    let parser = pulldown_cmark::Parser::new(input);
    let mut out = String::new();
    for event in parser {
        match event {
            pulldown_cmark::Event::Text(text) | pulldown_cmark::Event::Code(text) => {
                out.push_str(&text);
            }
            pulldown_cmark::Event::SoftBreak => out.push(' '),
            pulldown_cmark::Event::HardBreak => out.push('\n'),
            pulldown_cmark::Event::End(
                pulldown_cmark::TagEnd::Paragraph | pulldown_cmark::TagEnd::Item,
            ) => out.push('\n'),
            _ => {}
        }
    }
    out.trim_end().to_string()
}
