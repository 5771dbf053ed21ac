//! Per-tag rewrite rules for anchors and inputs

use crate::link_registry::LinkRegistry;
use crate::shortener::TextShortener;
use crate::types::RewrittenTag;

/// Rewrite policy, chosen by tag name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRule {
    Anchor,
    Input,
}

impl TagRule {
    pub fn for_tag(name: &str) -> Option<Self> {
        match name {
            "a" => Some(Self::Anchor),
            "input" => Some(Self::Input),
            _ => None,
        }
    }
}

/// Applies tag rules for one conversation. Owns that conversation's
/// link registry until the page is done.
pub struct TagTransformer<'a> {
    shortener: &'a TextShortener,
    registry: LinkRegistry<'a>,
}

impl<'a> TagTransformer<'a> {
    pub fn new(shortener: &'a TextShortener, registry: LinkRegistry<'a>) -> Self {
        Self {
            shortener,
            registry,
        }
    }

    pub fn shorten(&self, text: &str) -> String {
        self.shortener.shorten(text)
    }

    /// Rewrite a tag; tags without a rule keep their attributes unchanged
    pub fn rewrite(&mut self, name: &str, attrs: &[(&str, &str)]) -> RewrittenTag {
        match TagRule::for_tag(name) {
            Some(TagRule::Anchor) => self.rewrite_anchor(name, attrs),
            Some(TagRule::Input) => self.rewrite_input(name, attrs),
            None => RewrittenTag {
                name: name.to_string(),
                attrs: attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        }
    }

    fn rewrite_anchor(&mut self, name: &str, attrs: &[(&str, &str)]) -> RewrittenTag {
        let token = self.registry.register(lookup(attrs, "href"));
        RewrittenTag::new(name).with_attr("href", token)
    }

    // Submit buttons keep their label, other inputs keep their name
    fn rewrite_input(&self, name: &str, attrs: &[(&str, &str)]) -> RewrittenTag {
        let kind = lookup(attrs, "type").unwrap_or("text");
        let tag = RewrittenTag::new(name).with_attr("type", kind);

        if kind == "submit" {
            match lookup(attrs, "value") {
                Some(value) => tag.with_attr("value", self.shortener.shorten(value)),
                None => tag,
            }
        } else {
            match lookup(attrs, "name") {
                Some(field) => tag.with_attr("name", field),
                None => tag,
            }
        }
    }

    pub fn registry(&self) -> &LinkRegistry<'a> {
        &self.registry
    }

    pub fn into_registry(self) -> LinkRegistry<'a> {
        self.registry
    }
}

fn lookup<'v>(attrs: &[(&str, &'v str)], name: &str) -> Option<&'v str> {
    attrs.iter().find(|(key, _)| *key == name).map(|(_, value)| *value)
}
