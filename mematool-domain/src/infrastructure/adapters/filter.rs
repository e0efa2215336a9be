//! String search filters (RFC 4515) evaluated against in-memory entries.

use crate::domain::errors::{DirectoryError, DirectoryResult};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LdapFilter {
    And(Vec<LdapFilter>),
    Or(Vec<LdapFilter>),
    Not(Box<LdapFilter>),
    Equality {
        attribute: String,
        value: String,
    },
    Present {
        attribute: String,
    },
    Substring {
        attribute: String,
        initial: Option<String>,
        any: Vec<String>,
        last: Option<String>,
    },
    GreaterOrEqual {
        attribute: String,
        value: String,
    },
    LessOrEqual {
        attribute: String,
        value: String,
    },
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> DirectoryError {
        DirectoryError::InvalidFilter {
            filter: self.source.to_string(),
            message: format!("{} at offset {}", message.into(), self.pos),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expect(&mut self, expected: char) -> DirectoryResult<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn filter(&mut self) -> DirectoryResult<LdapFilter> {
        self.expect('(')?;
        let filter = match self.peek() {
            Some('&') => {
                self.pos += 1;
                LdapFilter::And(self.filter_list()?)
            }
            Some('|') => {
                self.pos += 1;
                LdapFilter::Or(self.filter_list()?)
            }
            Some('!') => {
                self.pos += 1;
                LdapFilter::Not(Box::new(self.filter()?))
            }
            Some(_) => self.item()?,
            None => return Err(self.error("unexpected end of input")),
        };
        self.expect(')')?;
        Ok(filter)
    }

    fn filter_list(&mut self) -> DirectoryResult<Vec<LdapFilter>> {
        let mut filters = Vec::new();
        while self.peek() == Some('(') {
            filters.push(self.filter()?);
        }
        if filters.is_empty() {
            return Err(self.error("empty filter list"));
        }
        Ok(filters)
    }

    fn item(&mut self) -> DirectoryResult<LdapFilter> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '~' | '<' | '>' | '(' | ')') {
                break;
            }
            self.pos += 1;
        }
        let attribute: String = self.chars[start..self.pos].iter().collect::<String>();
        let attribute = attribute.trim().to_string();
        if attribute.is_empty() {
            return Err(self.error("missing attribute description"));
        }

        let operator = match self.peek() {
            Some('=') => {
                self.pos += 1;
                '='
            }
            Some(op @ ('~' | '<' | '>')) => {
                self.pos += 1;
                self.expect('=')?;
                op
            }
            _ => return Err(self.error("missing comparison operator")),
        };

        let value_start = self.pos;
        while let Some(c) = self.peek() {
            if c == ')' || c == '(' {
                break;
            }
            self.pos += 1;
        }
        let raw: String = self.chars[value_start..self.pos].iter().collect();

        match operator {
            '<' => Ok(LdapFilter::LessOrEqual {
                attribute,
                value: unescape(&raw),
            }),
            '>' => Ok(LdapFilter::GreaterOrEqual {
                attribute,
                value: unescape(&raw),
            }),
            _ if raw == "*" => Ok(LdapFilter::Present { attribute }),
            _ if raw.contains('*') => {
                let pieces: Vec<&str> = raw.split('*').collect();
                let initial = pieces.first().filter(|p| !p.is_empty()).map(|p| unescape(p));
                let last = pieces.last().filter(|p| !p.is_empty()).map(|p| unescape(p));
                let any = pieces[1..pieces.len() - 1]
                    .iter()
                    .filter(|p| !p.is_empty())
                    .map(|p| unescape(p))
                    .collect();
                Ok(LdapFilter::Substring {
                    attribute,
                    initial,
                    any,
                    last,
                })
            }
            // approximate match is treated as equality
            _ => Ok(LdapFilter::Equality {
                attribute,
                value: unescape(&raw),
            }),
        }
    }
}

/// Decode `\XX` hex escapes
fn unescape(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn values_of<'e>(attrs: &'e HashMap<String, Vec<String>>, attribute: &str) -> &'e [String] {
    attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(attribute))
        .map(|(_, v)| v.as_slice())
        .unwrap_or(&[])
}

fn compare(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

impl LdapFilter {
    /// Parse a filter string; a missing outer pair of parentheses is tolerated
    pub fn parse(input: &str) -> DirectoryResult<Self> {
        let trimmed = input.trim();
        let source = if trimmed.starts_with('(') {
            trimmed.to_string()
        } else {
            format!("({trimmed})")
        };

        let mut parser = Parser {
            source: input,
            chars: source.chars().collect(),
            pos: 0,
        };
        let filter = parser.filter()?;
        if parser.pos != parser.chars.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(filter)
    }

    /// Evaluate against an attribute map, case-insensitively
    pub fn matches(&self, attrs: &HashMap<String, Vec<String>>) -> bool {
        match self {
            LdapFilter::And(filters) => filters.iter().all(|f| f.matches(attrs)),
            LdapFilter::Or(filters) => filters.iter().any(|f| f.matches(attrs)),
            LdapFilter::Not(filter) => !filter.matches(attrs),
            LdapFilter::Present { attribute } => !values_of(attrs, attribute).is_empty(),
            LdapFilter::Equality { attribute, value } => values_of(attrs, attribute)
                .iter()
                .any(|v| v.to_lowercase() == value.to_lowercase()),
            LdapFilter::Substring {
                attribute,
                initial,
                any,
                last,
            } => values_of(attrs, attribute).iter().any(|v| {
                let v = v.to_lowercase();
                let mut rest = v.as_str();
                if let Some(prefix) = initial {
                    match rest.strip_prefix(prefix.to_lowercase().as_str()) {
                        Some(r) => rest = r,
                        None => return false,
                    }
                }
                for piece in any {
                    let piece = piece.to_lowercase();
                    match rest.find(piece.as_str()) {
                        Some(idx) => rest = &rest[idx + piece.len()..],
                        None => return false,
                    }
                }
                match last {
                    Some(suffix) => rest.ends_with(suffix.to_lowercase().as_str()),
                    None => true,
                }
            }),
            LdapFilter::GreaterOrEqual { attribute, value } => values_of(attrs, attribute)
                .iter()
                .any(|v| compare(v, value) != std::cmp::Ordering::Less),
            LdapFilter::LessOrEqual { attribute, value } => values_of(attrs, attribute)
                .iter()
                .any(|v| compare(v, value) != std::cmp::Ordering::Greater),
        }
    }
}
