//! Glyph substitution for the sanitized markup

use regex::Regex;

/// Markup literals and their glyphs. Applied top to bottom; later entries
/// only see what earlier ones left behind.
pub const SUBSTITUTIONS: &[(&str, char)] = &[
    ("<input", 'Ξ'),
    ("<a href=\"", 'Φ'),
    ("</a>", 'Ω'),
    ("<form>", 'Ψ'),
    ("</form>", 'Θ'),
    ("\">", 'Σ'),
    (">", 'Π'),
    ("=\"submit\" ", 'Γ'),
    ("=\"hidden\" ", 'ß'),
    ("name=\"", 'æ'),
    ("type=\"", 'Δ'),
    ("value=\"", '_'),
];

#[derive(Debug, Clone)]
pub struct SymbolCompressor {
    gap: Regex,
}

impl SymbolCompressor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            gap: Regex::new(r">\s+<")?,
        })
    }

    /// Drop whitespace sitting between two tags
    pub fn collapse_gaps(&self, html: &str) -> String {
        self.gap.replace_all(html, "><").into_owned()
    }

    pub fn substitute(&self, html: &str) -> String {
        let mut out = html.to_string();
        for (literal, glyph) in SUBSTITUTIONS {
            if out.contains(literal) {
                out = out.replace(literal, glyph.encode_utf8(&mut [0; 4]));
            }
        }
        out
    }

    pub fn compress(&self, html: &str) -> String {
        self.substitute(&self.collapse_gaps(html))
    }
}

/// Literal a glyph stands for
pub fn glyph_literal(glyph: char) -> Option<&'static str> {
    SUBSTITUTIONS
        .iter()
        .find(|(_, g)| *g == glyph)
        .map(|(literal, _)| *literal)
}

/// Inverse of [`SymbolCompressor::substitute`] for text that carried no glyphs
/// of its own
pub fn expand(compressed: &str) -> String {
    let mut out = String::with_capacity(compressed.len() * 2);
    for c in compressed.chars() {
        match glyph_literal(c) {
            Some(literal) => out.push_str(literal),
            None => out.push(c),
        }
    }
    out
}
