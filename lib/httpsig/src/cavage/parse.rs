use super::SignatureHeader;
use crate::crypto::algorithm::{Algorithm, UnsupportedAlgorithm};
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// `Signature` header parse error
#[derive(Debug, Diagnostic, Error)]
pub enum ParseError {
    #[error("bad value for `{name}`, expected exactly 10 digits")]
    BadTimestamp {
        name: String,
        #[label("not a 10-digit epoch value")]
        at: SourceSpan,
    },

    #[error("duplicate parameter `{name}`")]
    DuplicateParameter {
        name: String,
        #[label("already appeared earlier in this header")]
        at: SourceSpan,
    },

    #[error("empty parameter name")]
    EmptyName {
        #[label("expected a name before this `=`")]
        at: SourceSpan,
    },

    #[error("expected `,` between parameters")]
    ExpectedComma {
        #[label("found this instead")]
        at: SourceSpan,
    },

    #[error("expected `\"` to open the value of `{name}`")]
    ExpectedQuote {
        name: String,
        #[label("found this instead")]
        at: SourceSpan,
    },

    #[error("invalid character in integer value")]
    InvalidIntegerChar {
        #[label("only ASCII digits are allowed here")]
        at: SourceSpan,
    },

    #[error("invalid character in parameter name")]
    InvalidNameChar {
        #[label("only ASCII letters are allowed here")]
        at: SourceSpan,
    },

    #[error("missing required parameter `{name}`")]
    MissingParameter { name: &'static str },

    #[error("malformed Signature header, expected a `Signature ` prefix")]
    MissingPrefix,

    #[error("trailing comma at the end of the header")]
    TrailingComma {
        #[label("nothing follows this `,`")]
        at: SourceSpan,
    },

    #[error("input ended in the middle of a parameter")]
    UnexpectedEnd {
        #[label("the header ends inside this parameter")]
        at: SourceSpan,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    UnsupportedAlgorithm(#[from] UnsupportedAlgorithm),

    #[error("unsupported parameter `{name}`")]
    UnsupportedParameter { name: String },

    #[error("unterminated quoted value")]
    UnterminatedValue {
        #[label("opened here, never closed")]
        at: SourceSpan,
    },

    #[error("whitespace inside a parameter name")]
    WhitespaceInName {
        #[label("name already started before this space")]
        at: SourceSpan,
    },
}

#[derive(Clone, Copy, Debug)]
enum RawValue<'a> {
    Quoted(&'a str),
    Integer(u64),
}

/// Parser state, advanced one character at a time
#[derive(Clone, Copy, Debug)]
enum State<'a> {
    /// Accumulating a parameter name; `start` is unset until the first letter
    Name { start: Option<usize> },

    /// After `name=`, expecting the `"` that opens a quoted value
    OpenQuote { name: &'a str },

    /// Inside a quoted value
    QuotedValue { name: &'a str, opened_at: usize },

    /// Bare digits for `created`/`expires`
    IntegerValue { name: &'a str, start: usize },

    /// Expecting the `,` separator after a closed value
    Comma,
}

struct Parser<'a> {
    /// Auth-param content, stripped of the `Signature ` prefix
    content: &'a str,

    /// Byte offset of `content` within the original input, for error spans
    base: usize,

    state: State<'a>,
    params: Vec<(&'a str, RawValue<'a>)>,
}

impl<'a> Parser<'a> {
    fn span(&self, at: usize) -> SourceSpan {
        (self.base + at, 1).into()
    }

    fn span_range(&self, start: usize, end: usize) -> SourceSpan {
        (self.base + start, end - start).into()
    }

    fn advance(&mut self, at: usize, c: char) -> Result<(), ParseError> {
        self.state = match self.state {
            State::Name { start } => match c {
                '=' => {
                    let Some(start) = start else {
                        return Err(ParseError::EmptyName { at: self.span(at) });
                    };

                    let name = &self.content[start..at];
                    if self.params.iter().any(|(existing, _)| *existing == name) {
                        return Err(ParseError::DuplicateParameter {
                            name: name.to_owned(),
                            at: self.span_range(start, at),
                        });
                    }

                    if matches!(name, "created" | "expires") {
                        State::IntegerValue {
                            name,
                            start: at + 1,
                        }
                    } else {
                        State::OpenQuote { name }
                    }
                }
                ' ' => {
                    if start.is_some() {
                        return Err(ParseError::WhitespaceInName { at: self.span(at) });
                    }

                    State::Name { start: None }
                }
                c if c.is_ascii_alphabetic() => State::Name {
                    start: Some(start.unwrap_or(at)),
                },
                _ => return Err(ParseError::InvalidNameChar { at: self.span(at) }),
            },

            State::OpenQuote { name } => match c {
                '"' => State::QuotedValue {
                    name,
                    opened_at: at,
                },
                _ => {
                    return Err(ParseError::ExpectedQuote {
                        name: name.to_owned(),
                        at: self.span(at),
                    })
                }
            },

            State::QuotedValue { name, opened_at } => match c {
                '"' => {
                    let value = &self.content[opened_at + 1..at];
                    self.params.push((name, RawValue::Quoted(value)));
                    State::Comma
                }
                _ => State::QuotedValue { name, opened_at },
            },

            State::IntegerValue { name, start } => match c {
                ',' => {
                    self.push_integer(name, start, at)?;
                    State::Name { start: None }
                }
                c if c.is_ascii_digit() => State::IntegerValue { name, start },
                _ => return Err(ParseError::InvalidIntegerChar { at: self.span(at) }),
            },

            State::Comma => match c {
                ',' => State::Name { start: None },
                _ => return Err(ParseError::ExpectedComma { at: self.span(at) }),
            },
        };

        Ok(())
    }

    fn push_integer(&mut self, name: &'a str, start: usize, end: usize) -> Result<(), ParseError> {
        let digits = &self.content[start..end];
        if digits.len() != 10 {
            return Err(ParseError::BadTimestamp {
                name: name.to_owned(),
                at: self.span_range(start, end),
            });
        }

        // Only digits can reach this point, and ten of them always fit a u64
        let value = atoi_radix10::parse_from_str(digits).map_err(|_| ParseError::BadTimestamp {
            name: name.to_owned(),
            at: self.span_range(start, end),
        })?;

        self.params.push((name, RawValue::Integer(value)));
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<(&'a str, RawValue<'a>)>, ParseError> {
        match self.state {
            State::Comma => {}
            State::IntegerValue { name, start } => {
                let end = self.content.len();
                self.push_integer(name, start, end)?;
            }
            State::Name { start: None } => {
                return Err(ParseError::TrailingComma {
                    at: self.span(self.content.len() - 1),
                });
            }
            State::Name { start: Some(start) } => {
                return Err(ParseError::UnexpectedEnd {
                    at: self.span_range(start, self.content.len()),
                });
            }
            State::OpenQuote { .. } => {
                return Err(ParseError::UnexpectedEnd {
                    at: self.span(self.content.len() - 1),
                });
            }
            State::QuotedValue { opened_at, .. } => {
                return Err(ParseError::UnterminatedValue {
                    at: self.span(opened_at),
                });
            }
        }

        Ok(self.params)
    }
}

/// Parse a raw `Signature` header into its validated parameter set
#[inline]
pub fn parse(raw: &str) -> Result<SignatureHeader<'_>, ParseError> {
    let trimmed = raw.trim();
    let Some(after_prefix) = trimmed.strip_prefix("Signature") else {
        return Err(ParseError::MissingPrefix);
    };
    if !after_prefix.starts_with(' ') {
        return Err(ParseError::MissingPrefix);
    }

    let content = after_prefix.trim_start_matches(' ');
    if content.is_empty() {
        return Err(ParseError::MissingPrefix);
    }

    let leading = raw.len() - raw.trim_start().len();
    let mut parser = Parser {
        content,
        base: leading + trimmed.len() - content.len(),
        state: State::Name { start: None },
        params: Vec::new(),
    };

    for (at, c) in content.char_indices() {
        parser.advance(at, c)?;
    }

    let mut algorithm = None;
    let mut key_id = None;
    let mut headers = None;
    let mut signature = None;
    let mut created = None;
    let mut expires = None;

    for (name, value) in parser.finish()? {
        match (name, value) {
            ("algorithm", RawValue::Quoted(value)) => algorithm = Some(value),
            ("keyId", RawValue::Quoted(value)) => key_id = Some(value),
            ("headers", RawValue::Quoted(value)) => headers = Some(value),
            ("signature", RawValue::Quoted(value)) => signature = Some(value),
            ("created", RawValue::Integer(value)) => created = Some(value),
            ("expires", RawValue::Integer(value)) => expires = Some(value),
            (name, _) => {
                return Err(ParseError::UnsupportedParameter {
                    name: name.to_owned(),
                })
            }
        }
    }

    let algorithm = algorithm
        .filter(|value| !value.is_empty())
        .ok_or(ParseError::MissingParameter { name: "algorithm" })?
        .parse::<Algorithm>()?;
    let key_id = key_id
        .filter(|value| !value.is_empty())
        .ok_or(ParseError::MissingParameter { name: "keyId" })?;
    let headers = headers
        .map(|value| value.split_whitespace().collect::<Vec<_>>())
        .filter(|names| !names.is_empty())
        .ok_or(ParseError::MissingParameter { name: "headers" })?;
    let signature = signature
        .filter(|value| !value.is_empty())
        .ok_or(ParseError::MissingParameter { name: "signature" })?;

    Ok(SignatureHeader {
        algorithm,
        key_id,
        headers,
        signature,
        created,
        expires,
    })
}
