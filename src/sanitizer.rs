//! Whitelist sanitizer reducing a page body to links and form inputs

use crate::error::PipelineError;
use crate::transform::TagTransformer;
use crate::types::RewrittenTag;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;
use tracing::debug;

/// Tags, attributes and exclusions applied to the page body
#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    pub allowed_tags: Vec<String>,
    pub allowed_attributes: HashMap<String, Vec<String>>,
    /// Tags whose text content is discarded even when the tag itself is unwrapped
    pub non_text_tags: Vec<String>,
    pub void_tags: Vec<String>,
    /// Drops a rewritten tag together with everything inside it
    pub exclude: fn(&RewrittenTag) -> bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        let allowed_attributes = [
            ("input", vec!["value", "type", "name"]),
            ("a", vec!["href"]),
        ]
        .into_iter()
        .map(|(tag, attrs)| {
            (
                tag.to_string(),
                attrs.into_iter().map(String::from).collect(),
            )
        })
        .collect();

        Self {
            allowed_tags: vec!["a".into(), "input".into(), "form".into()],
            allowed_attributes,
            non_text_tags: vec![
                "script".into(),
                "style".into(),
                "textarea".into(),
                "option".into(),
                // parsed as raw text when scripting is on
                "noscript".into(),
            ],
            void_tags: vec!["input".into()],
            exclude: exclude_dead_ends,
        }
    }
}

impl SanitizeConfig {
    fn allows_tag(&self, name: &str) -> bool {
        self.allowed_tags.iter().any(|t| t == name)
    }

    fn allows_attr(&self, tag: &str, attr: &str) -> bool {
        self.allowed_attributes
            .get(tag)
            .is_some_and(|attrs| attrs.iter().any(|a| a == attr))
    }

    fn is_non_text(&self, name: &str) -> bool {
        self.non_text_tags.iter().any(|t| t == name)
    }

    fn is_void(&self, name: &str) -> bool {
        self.void_tags.iter().any(|t| t == name)
    }
}

/// Hidden inputs and anchors that lead nowhere
pub fn exclude_dead_ends(tag: &RewrittenTag) -> bool {
    match tag.name.as_str() {
        "input" => tag.attr("type") == Some("hidden"),
        "a" => tag.attr("href").map_or(true, str::is_empty),
        _ => false,
    }
}

/// Sanitize the `<body>` of a full HTML document
pub fn sanitize_document(
    html: &str,
    config: &SanitizeConfig,
    transformer: &mut TagTransformer<'_>,
) -> Result<String, PipelineError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("body").map_err(|e| PipelineError::Selector {
        selector: "body".to_string(),
        reason: format!("{:?}", e),
    })?;
    let body = document
        .select(&selector)
        .next()
        .ok_or(PipelineError::MissingBody)?;

    let mut walker = Walker {
        config,
        transformer,
        out: String::new(),
    };
    walker.walk_children(body, false);

    debug!(
        "Sanitized {} bytes of HTML down to {} bytes",
        html.len(),
        walker.out.len()
    );
    Ok(walker.out)
}

struct Walker<'c, 't, 'a> {
    config: &'c SanitizeConfig,
    transformer: &'t mut TagTransformer<'a>,
    out: String,
}

impl Walker<'_, '_, '_> {
    fn walk_children(&mut self, parent: ElementRef<'_>, silent: bool) {
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => {
                    if !silent {
                        let escaped = escape_text(text);
                        self.out.push_str(&self.transformer.shorten(&escaped));
                    }
                }
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        self.walk_element(element, silent);
                    }
                }
                _ => {}
            }
        }
    }

    fn walk_element(&mut self, element: ElementRef<'_>, silent: bool) {
        let name = element.value().name();
        let silent = silent || self.config.is_non_text(name);

        if !self.config.allows_tag(name) {
            self.walk_children(element, silent);
            return;
        }

        let attrs: Vec<(&str, &str)> = element.value().attrs().collect();
        let tag = self.transformer.rewrite(name, &attrs);
        if (self.config.exclude)(&tag) {
            debug!("Excluding <{}> {:?}", tag.name, tag.attrs);
            return;
        }

        self.out.push('<');
        self.out.push_str(&tag.name);
        for (key, value) in &tag.attrs {
            if self.config.allows_attr(&tag.name, key) {
                self.out.push(' ');
                self.out.push_str(key);
                self.out.push_str("=\"");
                self.out.push_str(&escape_attr(value));
                self.out.push('"');
            }
        }

        if self.config.is_void(&tag.name) {
            self.out.push_str(" />");
            return;
        }
        self.out.push('>');

        self.walk_children(element, silent);

        self.out.push_str("</");
        self.out.push_str(&tag.name);
        self.out.push('>');
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link_registry::{LinkPolicy, LinkRegistry, SequentialTokens};
    use crate::shortener::TextShortener;

    fn sanitize(html: &str) -> String {
        let shortener = TextShortener::default();
        let policy = LinkPolicy::default();
        let registry = LinkRegistry::new("SM1", &policy, Box::new(SequentialTokens::default()));
        let mut transformer = TagTransformer::new(&shortener, registry);
        sanitize_document(html, &SanitizeConfig::default(), &mut transformer).unwrap()
    }

    #[test]
    fn test_keeps_only_links_and_inputs() {
        let out = sanitize(
            r#"<html><head><title>Ignored</title></head><body>
            <div class="hero"><h1>News</h1>
            <form action="/s" method="get"><input name="q" value="x" class="big"><input type="submit" value="Go"></form>
            <p>Read <a href="/story" class="link" target="_blank">this</a>!</p></div></body></html>"#,
        );

        assert!(out.contains(r#"<form><input type="text" name="q" /><input type="submit" value="Go" /></form>"#));
        assert!(out.contains(r#"Read <a href="000">this</a>!"#));
        assert!(out.contains("News"));
        assert!(!out.contains("<div"));
        assert!(!out.contains("<p"));
        assert!(!out.contains("class="));
        assert!(!out.contains("Ignored"));
    }

    #[test]
    fn test_drops_hidden_inputs() {
        let out = sanitize(r#"<body><form><input type="hidden" name="csrf" value="t0k"><input name="q"></form></body>"#);
        assert_eq!(out, r#"<form><input type="text" name="q" /></form>"#);
    }

    #[test]
    fn test_drops_dead_anchors_with_content() {
        let out = sanitize(
            r#"<body><a href="https://example.com/login">Log <b>in</b></a><a>Anchor</a><a href="/ok">ok</a></body>"#,
        );
        assert_eq!(out, r#"<a href="000">ok</a>"#);
    }

    #[test]
    fn test_noscript_fallback_is_discarded() {
        let out = sanitize(r#"<body><noscript><img src=x>enable js</noscript><a href="/a">A</a></body>"#);
        assert_eq!(out, r#"<a href="000">A</a>"#);
    }

    #[test]
    fn test_non_text_tags_are_silenced() {
        let out = sanitize(
            r#"<body><script>var a = 1 < 2;</script><style>p { color: red }</style><select><option>One</option></select>Text</body>"#,
        );
        assert_eq!(out, "Text");
    }

    #[test]
    fn test_text_is_escaped_then_shortened() {
        let out = sanitize("<body><p>Fish and chips &amp; the 1 &lt; 2 rule</p></body>");
        assert_eq!(out, "Fish & chips &amp; t 1 &lt; 2 rule");
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let out = sanitize(r#"<body><input type="submit" value="Say &quot;hi&quot;"></body>"#);
        assert_eq!(out, r#"<input type="submit" value="Say &quot;hi&quot;" />"#);
    }

    #[test]
    fn test_links_inside_unwrapped_tags_survive() {
        let out = sanitize(r#"<body><nav><ul><li><a href="/a">A</a></li><li><a href="/b">B</a></li></ul></nav></body>"#);
        assert_eq!(out, r#"<a href="000">A</a><a href="001">B</a>"#);
    }

    #[test]
    fn test_frameset_document_has_no_body() {
        let shortener = TextShortener::default();
        let policy = LinkPolicy::default();
        let registry = LinkRegistry::new("SM1", &policy, Box::new(SequentialTokens::default()));
        let mut transformer = TagTransformer::new(&shortener, registry);

        let result = sanitize_document(
            r#"<html><frameset><frame src="a.html"></frameset></html>"#,
            &SanitizeConfig::default(),
            &mut transformer,
        );
        assert!(matches!(result, Err(PipelineError::MissingBody)));
    }

    #[test]
    fn test_exclusion_predicate() {
        let hidden = RewrittenTag::new("input").with_attr("type", "hidden");
        let text = RewrittenTag::new("input").with_attr("type", "text");
        let dead = RewrittenTag::new("a").with_attr("href", "");
        let live = RewrittenTag::new("a").with_attr("href", "x1z");

        assert!(exclude_dead_ends(&hidden));
        assert!(!exclude_dead_ends(&text));
        assert!(exclude_dead_ends(&dead));
        assert!(exclude_dead_ends(&RewrittenTag::new("a")));
        assert!(!exclude_dead_ends(&live));
        assert!(!exclude_dead_ends(&RewrittenTag::new("form")));
    }
}
