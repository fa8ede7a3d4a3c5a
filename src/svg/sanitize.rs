// src/svg/sanitize.rs
//! Strips trademark, registered and copyright glyphs before parsing.
//!
//! These characters break curve tessellation in text-derived outlines. Any
//! `<text>` element that carries one of them is dropped entirely; stray
//! occurrences elsewhere are removed in place.

use std::borrow::Cow;

const GLYPHS: [char; 3] = ['\u{2122}', '\u{00AE}', '\u{00A9}'];

/// Entity spellings, compared ASCII case-insensitively.
const ENTITIES: [&str; 9] = [
    "&trade;", "&reg;", "&copy;", "&#8482;", "&#174;", "&#169;", "&#x2122;", "&#xae;", "&#xa9;",
];

/// Returns the markup with special glyphs removed. Borrows when nothing changes.
pub fn strip_special_glyphs(markup: &str) -> Cow<'_, str> {
    if !contains_special(markup) {
        return Cow::Borrowed(markup);
    }
    let without_text = remove_tainted_text_elements(markup);
    Cow::Owned(strip_inline(&without_text))
}

/// True if `s` contains a glyph or one of its entity spellings.
pub fn contains_special(s: &str) -> bool {
    if s.contains(GLYPHS) {
        return true;
    }
    let bytes = s.as_bytes();
    s.match_indices('&')
        .any(|(i, _)| entity_len_at(bytes, i).is_some())
}

fn entity_len_at(bytes: &[u8], at: usize) -> Option<usize> {
    ENTITIES.iter().find_map(|entity| {
        let end = at + entity.len();
        (end <= bytes.len() && bytes[at..end].eq_ignore_ascii_case(entity.as_bytes()))
            .then_some(entity.len())
    })
}

fn strip_inline(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut skip_until = 0usize;
    for (i, ch) in s.char_indices() {
        if i < skip_until {
            continue;
        }
        if GLYPHS.contains(&ch) {
            continue;
        }
        if ch == '&' {
            if let Some(len) = entity_len_at(bytes, i) {
                skip_until = i + len;
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// Removes whole `<text>…</text>` elements whose content has a special glyph.
fn remove_tainted_text_elements(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(start) = find_text_open(rest) {
        let (before, from_tag) = rest.split_at(start);
        out.push_str(before);

        let Some(tag_end) = from_tag.find('>') else {
            // Unterminated tag; leave it for the XML parser to reject.
            out.push_str(from_tag);
            return out;
        };

        if from_tag[..tag_end].ends_with('/') {
            // `<text/>` has no content.
            out.push_str(&from_tag[..=tag_end]);
            rest = &from_tag[tag_end + 1..];
            continue;
        }

        let element_end = from_tag[tag_end..]
            .find("</text")
            .and_then(|close| {
                let close = tag_end + close;
                from_tag[close..].find('>').map(|gt| close + gt + 1)
            });

        match element_end {
            Some(end) => {
                let element = &from_tag[..end];
                if !contains_special(element) {
                    out.push_str(element);
                }
                rest = &from_tag[end..];
            }
            None => {
                out.push_str(from_tag);
                return out;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Finds `<text` followed by whitespace, `>` or `/` (so `<textPath` is not matched).
fn find_text_open(s: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(pos) = s[offset..].find("<text") {
        let at = offset + pos;
        match s[at + 5..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => return Some(at),
            None => return None,
            _ => offset = at + 5,
        }
    }
    None
}
