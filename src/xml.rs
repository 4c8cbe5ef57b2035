//! Minimal XML element reader for the player's HTTP API.
//!
//! The device answers every request with a small XML document.  This reader
//! builds an element tree with attributes, child elements and trimmed text;
//! it skips the declaration, comments and doctype, understands CDATA and
//! decodes the predefined and numeric character entities.  Namespaces and
//! DTDs are not interpreted.

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum XmlError {
    #[error("unexpected end of document")]
    UnexpectedEof,

    #[error("malformed XML at byte {pos}: {message}")]
    Malformed { pos: usize, message: String },

    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    Mismatched { expected: String, found: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated, trimmed character data
    pub text: String,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Attribute `name`, or else the text of the first child `name`.
    ///
    /// The player reports the same field either way depending on the
    /// endpoint, so callers should not care which one it was.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.attr(name)
            .or_else(|| self.child(name).map(|c| c.text.as_str()))
    }
}

/// Deepest element nesting accepted before the document is rejected.
const MAX_DEPTH: usize = 256;

/// Parse a whole document and return its root element.
pub fn parse(input: &str) -> Result<Element, XmlError> {
    let mut reader = Reader {
        src: input,
        pos: 0,
        depth: 0,
    };
    reader.skip_misc()?;
    let root = reader.element()?;
    reader.skip_misc()?;
    if reader.pos < reader.src.len() {
        return Err(reader.malformed("content after root element"));
    }
    Ok(root)
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn malformed(&self, message: &str) -> XmlError {
        XmlError::Malformed {
            pos: self.pos,
            message: message.to_string(),
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Move past the next `terminator`.
    fn skip_past(&mut self, terminator: &str) -> Result<&'a str, XmlError> {
        let rest = self.rest();
        let idx = rest.find(terminator).ok_or(XmlError::UnexpectedEof)?;
        self.pos += idx + terminator.len();
        Ok(&rest[..idx])
    }

    fn expect(&mut self, token: &str) -> Result<(), XmlError> {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            Ok(())
        } else if self.rest().is_empty() {
            Err(XmlError::UnexpectedEof)
        } else {
            Err(self.malformed(&format!("expected {:?}", token)))
        }
    }

    /// Declarations, comments, doctype and whitespace outside the root.
    fn skip_misc(&mut self) -> Result<(), XmlError> {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("<?") {
                self.skip_past("?>")?;
            } else if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if rest.starts_with("<!") {
                self.skip_past(">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn name(&mut self) -> Result<&'a str, XmlError> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '=' | '<'))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(if rest.is_empty() {
                XmlError::UnexpectedEof
            } else {
                self.malformed("expected a name")
            });
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    fn element(&mut self) -> Result<Element, XmlError> {
        self.expect("<")?;
        let mut element = Element {
            name: self.name()?.to_string(),
            ..Default::default()
        };

        loop {
            self.skip_whitespace();
            if self.rest().starts_with("/>") {
                self.pos += 2;
                return Ok(element);
            }
            if self.rest().starts_with('>') {
                self.pos += 1;
                break;
            }
            let key = self.name()?.to_string();
            self.skip_whitespace();
            self.expect("=")?;
            self.skip_whitespace();
            let quote = match self.rest().chars().next() {
                Some(q @ ('"' | '\'')) => q,
                Some(_) => return Err(self.malformed("expected a quoted attribute value")),
                None => return Err(XmlError::UnexpectedEof),
            };
            self.pos += 1;
            let raw = self.skip_past(if quote == '"' { "\"" } else { "'" })?;
            element.attributes.push((key, decode_entities(raw)));
        }

        let mut text = String::new();
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(XmlError::UnexpectedEof);
            } else if rest.starts_with("</") {
                self.pos += 2;
                let found = self.name()?;
                self.skip_whitespace();
                self.expect(">")?;
                if found != element.name {
                    return Err(XmlError::Mismatched {
                        expected: element.name,
                        found: found.to_string(),
                    });
                }
                break;
            } else if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if rest.starts_with("<![CDATA[") {
                self.pos += "<![CDATA[".len();
                text.push_str(self.skip_past("]]>")?);
            } else if rest.starts_with("<?") {
                self.skip_past("?>")?;
            } else if rest.starts_with('<') {
                if self.depth >= MAX_DEPTH {
                    return Err(self.malformed("elements nested too deeply"));
                }
                self.depth += 1;
                let child = self.element();
                self.depth -= 1;
                element.children.push(child?);
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                text.push_str(&decode_entities(&rest[..end]));
                self.pos += end;
            }
        }

        element.text = text.trim().to_string();
        Ok(element)
    }
}

/// Replace `&amp;`-style and numeric character references.
///
/// Unknown or broken references are kept verbatim.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

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
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16).ok())
                    .unwrap_or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi + 1))
        });

        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
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
