//! Inline rich-text markup.
//!
//! Accepts the small HTML subset a rich-text field produces: `b`/`strong`, `i`/`em`, `u`, `s`/
//! `strike`/`del`, `span style="..."` (color, font-weight, font-style, text-decoration), `br`,
//! and block `p`/`div` elements, plus the common character entities. Unknown tags are dropped
//! and their text kept.

use std::ops::Range;

use crate::foundation::core::ColorRgba8;

/// Inline style overrides for one run of text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InlineStyle {
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
    /// Underline decoration.
    pub underline: bool,
    /// Line-through decoration.
    pub strikethrough: bool,
    /// Color override.
    pub color: Option<ColorRgba8>,
}

impl InlineStyle {
    fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// A byte range of [`StyledText::text`] with its inline style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledSpan {
    /// Byte range into the flattened text.
    pub range: Range<usize>,
    /// Style for the range.
    pub style: InlineStyle,
}

/// Flattened text plus the spans that carry inline styling.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyledText {
    /// Text with markup removed and entities decoded.
    pub text: String,
    /// Non-plain spans in text order; unstyled text has no span.
    pub spans: Vec<StyledSpan>,
}

impl StyledText {
    /// Unstyled text.
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            spans: Vec::new(),
        }
    }

    fn push(&mut self, s: &str, style: InlineStyle) {
        if s.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(s);
        if style.is_plain() {
            return;
        }
        let end = self.text.len();
        if let Some(last) = self.spans.last_mut()
            && last.range.end == start
            && last.style == style
        {
            last.range.end = end;
            return;
        }
        self.spans.push(StyledSpan {
            range: start..end,
            style,
        });
    }
}

struct OpenTag {
    name: String,
    saved: InlineStyle,
}

/// Parse markup into flattened text and styled spans.
pub fn parse_markup(markup: &str) -> StyledText {
    let mut out = StyledText::default();
    let mut stack: Vec<OpenTag> = Vec::new();
    let mut style = InlineStyle::default();
    let mut rest = markup;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            out.push(&decode_entities(rest), style);
            break;
        };
        out.push(&decode_entities(&rest[..lt]), style);
        rest = &rest[lt..];
        let Some(gt) = rest.find('>') else {
            // A stray '<' with no closing bracket is literal text.
            out.push(&decode_entities(rest), style);
            break;
        };
        let tag = &rest[1..gt];
        rest = &rest[gt + 1..];

        if let Some(name) = tag.strip_prefix('/') {
            let name = name.trim().to_ascii_lowercase();
            if is_block(&name) {
                push_line_break(&mut out);
            }
            if let Some(pos) = stack.iter().rposition(|t| t.name == name) {
                style = stack[pos].saved;
                stack.truncate(pos);
            }
            continue;
        }

        let self_closing = tag.trim_end().ends_with('/');
        let tag = tag.trim_end().trim_end_matches('/');
        let (name, attrs) = match tag.find(char::is_whitespace) {
            Some(i) => (&tag[..i], &tag[i..]),
            None => (tag, ""),
        };
        let name = name.to_ascii_lowercase();

        if name == "br" {
            out.push("\n", style);
            continue;
        }
        if is_block(&name) && !out.text.is_empty() {
            push_line_break(&mut out);
        }
        if self_closing {
            continue;
        }

        let saved = style;
        match name.as_str() {
            "b" | "strong" => style.bold = true,
            "i" | "em" => style.italic = true,
            "u" | "ins" => style.underline = true,
            "s" | "strike" | "del" => style.strikethrough = true,
            "span" | "font" | "p" | "div" => apply_attrs(&mut style, attrs),
            _ => {}
        }
        stack.push(OpenTag { name, saved });
    }

    while out.text.ends_with('\n') {
        out.text.pop();
    }
    let len = out.text.len();
    for span in &mut out.spans {
        span.range.end = span.range.end.min(len);
    }
    out.spans.retain(|s| s.range.start < s.range.end);
    out
}

fn is_block(name: &str) -> bool {
    name == "p" || name == "div"
}

fn push_line_break(out: &mut StyledText) {
    if !out.text.is_empty() && !out.text.ends_with('\n') {
        out.text.push('\n');
    }
}

fn apply_attrs(style: &mut InlineStyle, attrs: &str) {
    if let Some(color) = attr_value(attrs, "color")
        && let Ok(c) = ColorRgba8::parse(&color)
    {
        style.color = Some(c);
    }
    let Some(css) = attr_value(attrs, "style") else {
        return;
    };
    for decl in css.split(';') {
        let Some((prop, value)) = decl.split_once(':') else {
            continue;
        };
        let value = value.trim().to_ascii_lowercase();
        match prop.trim().to_ascii_lowercase().as_str() {
            "color" => {
                if let Ok(c) = ColorRgba8::parse(&value) {
                    style.color = Some(c);
                }
            }
            "font-weight" => {
                style.bold = value == "bold"
                    || value == "bolder"
                    || value.parse::<u16>().is_ok_and(|w| w >= 600);
            }
            "font-style" => style.italic = value == "italic" || value == "oblique",
            "text-decoration" | "text-decoration-line" => {
                if value.contains("underline") {
                    style.underline = true;
                }
                if value.contains("line-through") {
                    style.strikethrough = true;
                }
            }
            _ => {}
        }
    }
}

fn attr_value(attrs: &str, key: &str) -> Option<String> {
    let lower = attrs.to_ascii_lowercase();
    let mut search = 0;
    while let Some(found) = lower[search..].find(key) {
        let at = search + found;
        search = at + key.len();
        let preceded_ok = at == 0 || lower.as_bytes()[at - 1].is_ascii_whitespace();
        let after = lower[search..].trim_start();
        if !preceded_ok || !after.starts_with('=') {
            continue;
        }
        let value_start = attrs.len() - after.len() + 1;
        let value = attrs[value_start..].trim_start();
        let quote = value.chars().next()?;
        if quote == '"' || quote == '\'' {
            let inner = &value[1..];
            let end = inner.find(quote)?;
            return Some(inner[..end].to_string());
        }
        let end = value.find(char::is_whitespace).unwrap_or(value.len());
        return Some(value[..end].to_string());
    }
    None
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/text/markup.rs"]
mod tests;
