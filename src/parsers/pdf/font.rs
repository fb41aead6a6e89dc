use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};
use once_cell::sync::Lazy;
use regex::Regex;

static CMAP_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)beginbf(char|range)(.*?)endbf(?:char|range)").unwrap());
static CMAP_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([0-9A-Fa-f\s]*)>|\[|\]").unwrap());

/// Upper bound on the codes one `bfrange` entry may expand to.
const MAX_RANGE: u32 = 0xFFFF;

/// Turns the bytes of a shown string into text for one font.
///
/// Fonts with a `ToUnicode` map decode through it. Type0 fonts read two bytes
/// per code; simple fonts read one and fall back to their named encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontDecoder {
    two_byte: bool,
    encoding: Option<String>,
    to_unicode: HashMap<u32, String>,
}

impl FontDecoder {
    /// Reads the subtype, encoding and `ToUnicode` stream of a font
    /// dictionary. Parts that can't be resolved are left out.
    pub fn from_font(document: &Document, font: &Dictionary) -> Self {
        let two_byte = font.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Type0".as_slice());

        let to_unicode = font
            .get(b"ToUnicode")
            .and_then(|obj| document.dereference(obj))
            .and_then(|(_, obj)| obj.as_stream())
            .map(|stream| {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                parse_to_unicode(&data)
            })
            .unwrap_or_default();

        Self {
            two_byte,
            encoding: Some(font.get_font_encoding().to_string()),
            to_unicode,
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        if self.two_byte {
            return bytes
                .chunks(2)
                .map(|pair| pair.iter().fold(0u32, |code, &b| (code << 8) | u32::from(b)))
                .map(|code| self.lookup(code))
                .collect();
        }

        if self.to_unicode.is_empty() {
            return Document::decode_text(self.encoding.as_deref(), bytes);
        }

        bytes
            .iter()
            .map(|&b| match self.to_unicode.get(&u32::from(b)) {
                Some(text) => text.clone(),
                None => Document::decode_text(self.encoding.as_deref(), &[b]),
            })
            .collect()
    }

    /// Text for a two-byte code. Codes missing from the map are taken as
    /// Unicode code points.
    fn lookup(&self, code: u32) -> String {
        match self.to_unicode.get(&code) {
            Some(text) => text.clone(),
            None => char::from_u32(code)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
                .to_string(),
        }
    }
}

/// Parses the `bfchar` and `bfrange` sections of a `ToUnicode` CMap into a
/// code to text map.
pub fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    let text = String::from_utf8_lossy(data);
    let mut map = HashMap::new();

    for section in CMAP_SECTION_RE.captures_iter(&text) {
        let tokens = tokenize(&section[2]);
        if &section[1] == "char" {
            read_bfchar(&tokens, &mut map);
        } else {
            read_bfrange(&tokens, &mut map);
        }
    }

    map
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Open,
    Close,
}

fn tokenize(section: &str) -> Vec<Token> {
    CMAP_TOKEN_RE
        .captures_iter(section)
        .map(|caps| match caps.get(1) {
            Some(hex) => Token::Hex(hex_bytes(hex.as_str())),
            None if &caps[0] == "[" => Token::Open,
            None => Token::Close,
        })
        .collect()
}

fn hex_bytes(hex: &str) -> Vec<u8> {
    let mut digits: Vec<u8> = hex
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();
    if digits.len() % 2 == 1 {
        digits.push(0);
    }
    digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect()
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0, |code, &b| (code << 8) | u32::from(b))
}

/// Destination strings are UTF-16BE.
fn utf16_text(bytes: &[u8]) -> String {
    let units = bytes
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn read_bfchar(tokens: &[Token], map: &mut HashMap<u32, String>) {
    for pair in tokens.chunks(2) {
        if let [Token::Hex(src), Token::Hex(dst)] = pair {
            map.insert(code_of(src), utf16_text(dst));
        }
    }
}

fn read_bfrange(tokens: &[Token], map: &mut HashMap<u32, String>) {
    let mut rest = tokens;

    while let [Token::Hex(lo), Token::Hex(hi), tail @ ..] = rest {
        let (lo, hi) = (code_of(lo), code_of(hi));
        let span = hi.saturating_sub(lo).min(MAX_RANGE);

        match tail {
            [Token::Hex(dst), after @ ..] => {
                for offset in 0..=span {
                    map.insert(lo + offset, offset_text(dst, offset));
                }
                rest = after;
            }
            [Token::Open, after @ ..] => {
                let close = after
                    .iter()
                    .position(|t| *t == Token::Close)
                    .unwrap_or(after.len());
                for (offset, dst) in after[..close].iter().enumerate() {
                    if let Token::Hex(dst) = dst {
                        if offset as u32 <= span {
                            map.insert(lo + offset as u32, utf16_text(dst));
                        }
                    }
                }
                rest = after.get(close + 1..).unwrap_or(&[]);
            }
            _ => break,
        }
    }
}

/// `dst` with its last UTF-16 unit moved forward by `offset`.
fn offset_text(dst: &[u8], offset: u32) -> String {
    let mut units: Vec<u16> = dst
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
        .collect();
    if let Some(last) = units.last_mut() {
        *last = last.wrapping_add(offset as u16);
    }
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
