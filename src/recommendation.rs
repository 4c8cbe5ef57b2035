//! Parsing of free-text model output into artist/album pairs.
//!
//! The model is asked for `Band Name - Album Name` lines, but nothing
//! guarantees it complies.  The parser therefore accepts the usual variations
//! (numbered lists, bullets, a trailing `(year)`) and silently drops every
//! line that does not have the expected shape.

use std::fmt;

/// One artist/album pair suggested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Recommendation {
    pub artist: String,
    pub album: String,
}

impl Recommendation {
    pub fn new(artist: &str, album: &str) -> Self {
        Recommendation {
            artist: artist.to_string(),
            album: album.to_string(),
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.album)
    }
}

const SEPARATOR: &str = " - ";

/// Parse model output into recommendations, in line order.
///
/// Lines that do not contain `" - "` or have an empty side are skipped.
/// A name that itself contains `" - "` is split at the first occurrence.
pub fn parse_recommendations(text: &str) -> Vec<Recommendation> {
    text.lines().filter_map(parse_line).collect()
}

/// Parse a single line, `None` when it is blank or malformed.
pub fn parse_line(line: &str) -> Option<Recommendation> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let line = strip_bullet(strip_enumeration(line));
    let (artist, album) = line.split_once(SEPARATOR)?;

    let artist = strip_emphasis(artist.trim());
    let album = strip_emphasis(strip_trailing_annotation(album.trim()));

    if artist.is_empty() || album.is_empty() {
        return None;
    }

    Some(Recommendation::new(artist, album))
}

/// "12. Foo" -> "Foo".  Digits without a following period are left alone.
fn strip_enumeration(line: &str) -> &str {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return line;
    }
    match line[digits..].strip_prefix('.') {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

/// "- Foo", "* Foo", "• Foo" -> "Foo"
fn strip_bullet(line: &str) -> &str {
    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }
    line
}

/// "Album (Deluxe) (2019)" -> "Album".  Only parenthesized groups that end
/// the line are removed; parentheses inside the title stay.
fn strip_trailing_annotation(album: &str) -> &str {
    if !album.ends_with(')') {
        return album;
    }
    album
        .char_indices()
        .skip(1)
        .find(|&(i, c)| c == '(' && is_annotation_run(&album[i..]))
        .map_or(album, |(i, _)| album[..i].trim_end())
}

/// One or more balanced `(...)` groups separated only by whitespace.
fn is_annotation_run(s: &str) -> bool {
    let mut depth = 0usize;
    let mut groups = 0;

    for c in s.chars() {
        match c {
            '(' => {
                if depth == 0 {
                    groups += 1;
                }
                depth += 1;
            }
            ')' if depth == 0 => return false,
            ')' => depth -= 1,
            c if depth == 0 && !c.is_whitespace() => return false,
            _ => {}
        }
    }

    depth == 0 && groups > 0
}

/// "**Name**" -> "Name"
fn strip_emphasis(field: &str) -> &str {
    for marker in ["**", "*", "_"] {
        if field.len() > marker.len() * 2 {
            if let Some(inner) = field
                .strip_prefix(marker)
                .and_then(|f| f.strip_suffix(marker))
            {
                return inner.trim();
            }
        }
    }
    field
}
