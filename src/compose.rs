//! # Compose Module
//!
//! Builds the 144×144 SVG shown on the button: three colored bands with one
//! text line each, optional right-aligned text per line and a small
//! "current/total" counter when several departures rotate.

use crate::constants::{
    BAND_DARK, BAND_HEIGHT, BAND_LIGHT, COUNTER_FONT_SIZE, FONT_FAMILY, IMAGE_SIZE, LINE_BASELINES,
    LINE_FONT_SIZE, MESSAGE_FONT_SIZE, TEXT_MARGIN,
};
use crate::departure::Departure;
use crate::field::{self, Color, Field, FieldText};
use crate::scroll;
use base64::{Engine, engine::general_purpose::STANDARD};
use std::fmt::Write;

/// What an [`Image`] shows, kept alongside the SVG for text-only surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// A departure laid out on three lines.
    Departure {
        lines: [FieldText; 3],
        offsets: [i32; 3],
        counter: Option<String>,
    },
    /// A centered status message such as "No departures".
    Message(String),
}

/// A rendered button image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    svg: String,
    content: Content,
}

impl Image {
    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// The SVG as a base64 `data:` URL, the form button hosts accept as an
    /// image.
    pub fn to_data_url(&self) -> String {
        format!("data:image/svg+xml;base64,{}", STANDARD.encode(&self.svg))
    }

    /// The status message, if this is a placeholder image.
    pub fn message(&self) -> Option<&str> {
        match &self.content {
            Content::Message(message) => Some(message),
            Content::Departure { .. } => None,
        }
    }

    /// The three resolved lines, if this image shows a departure.
    pub fn lines(&self) -> Option<&[FieldText; 3]> {
        match &self.content {
            Content::Departure { lines, .. } => Some(lines),
            Content::Message(_) => None,
        }
    }
}

/// Position of the shown departure in the rotation, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub current: usize,
    pub total: usize,
}

/// Renders `departure` with the three line selectors at scroll `frame`.
pub fn departure_image(departure: &Departure, fields: &[Field; 3], frame: u32, position: Position) -> Image {
    let lines = fields.each_ref().map(|f| field::render(departure, f));
    let offsets = fields.each_ref().map(|f| match f {
        Field::Destination => scroll::offset(field::clean_destination(departure.destination()), frame),
        _ => 0,
    });

    let counter = (position.total > 1 && lines[2].right_text.is_none())
        .then(|| format!("{}/{}", position.current, position.total));

    let mut svg = String::new();
    let _ = writeln!(svg, r#"<svg width="{IMAGE_SIZE}" height="{IMAGE_SIZE}" xmlns="http://www.w3.org/2000/svg">"#);
    let _ = writeln!(
        svg,
        r#"<defs><clipPath id="textClip"><rect x="0" y="0" width="{IMAGE_SIZE}" height="{IMAGE_SIZE}"/></clipPath></defs>"#
    );
    for (band, fill) in [BAND_DARK, BAND_LIGHT, BAND_DARK].into_iter().enumerate() {
        let y = band as u32 * BAND_HEIGHT;
        let _ = writeln!(
            svg,
            r#"<rect x="0" y="{y}" width="{IMAGE_SIZE}" height="{BAND_HEIGHT}" fill="{fill}"/>"#
        );
    }

    let _ = writeln!(svg, r#"<g clip-path="url(#textClip)">"#);
    for ((line, offset), baseline) in lines.iter().zip(offsets).zip(LINE_BASELINES) {
        write_text(&mut svg, TEXT_MARGIN + offset, baseline, LINE_FONT_SIZE, line.color, &line.text, None);
        if let Some(right) = &line.right_text {
            write_text(&mut svg, right_edge(), baseline, LINE_FONT_SIZE, line.color, right, Some("end"));
        }
    }
    let _ = writeln!(svg, "</g>");

    if let Some(counter) = &counter {
        write_text(&mut svg, right_edge(), LINE_BASELINES[2], COUNTER_FONT_SIZE, Color::White, counter, Some("end"));
    }
    svg.push_str("</svg>");

    Image {
        svg,
        content: Content::Departure { lines, offsets, counter },
    }
}

/// Renders a single centered message on a plain background.
pub fn message_image(message: &str) -> Image {
    let center = IMAGE_SIZE / 2;
    let mut svg = String::new();
    let _ = writeln!(svg, r#"<svg width="{IMAGE_SIZE}" height="{IMAGE_SIZE}" xmlns="http://www.w3.org/2000/svg">"#);
    let _ = writeln!(
        svg,
        r#"<rect x="0" y="0" width="{IMAGE_SIZE}" height="{IMAGE_SIZE}" fill="{BAND_DARK}"/>"#
    );
    let _ = writeln!(
        svg,
        r#"<text x="{center}" y="{center}" font-family="{FONT_FAMILY}" font-size="{MESSAGE_FONT_SIZE}" fill="{}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
        Color::White.hex(),
        escape_xml(message)
    );
    svg.push_str("</svg>");

    Image {
        svg,
        content: Content::Message(message.to_string()),
    }
}

fn right_edge() -> i32 {
    IMAGE_SIZE as i32 - TEXT_MARGIN
}

fn write_text(svg: &mut String, x: i32, y: u32, size: u32, color: Color, text: &str, anchor: Option<&str>) {
    let anchor = anchor
        .map(|a| format!(r#" text-anchor="{a}""#))
        .unwrap_or_default();
    let _ = writeln!(
        svg,
        r#"<text x="{x}" y="{y}" font-family="{FONT_FAMILY}" font-size="{size}" fill="{}"{anchor}>{}</text>"#,
        color.hex(),
        escape_xml(text)
    );
}

/// Escapes text for SVG. Numeric character references coming from the feed
/// (e.g. `&#246;`) are decoded first so they are not escaped twice.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in decode_numeric_entities(text).chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn decode_numeric_entities(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("&#") {
        decoded.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let digits = after.find(|c: char| !c.is_ascii_digit()).unwrap_or(after.len());
        let decoded_char = (digits > 0 && after[digits..].starts_with(';'))
            .then(|| after[..digits].parse::<u32>().ok().and_then(char::from_u32))
            .flatten();
        match decoded_char {
            Some(c) => {
                decoded.push(c);
                rest = &after[digits + 1..];
            }
            None => {
                decoded.push_str("&#");
                rest = after;
            }
        }
    }
    decoded.push_str(rest);
    decoded
}
