//! Tokeniser: turns a query string into a finite token stream (spec §4.1).

use crate::error::QueryError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Quoted(String),
    AtId(String),
    /// Raw, comma-split list of type tags from a `type:a,b,c` literal.
    TypeFilter(Vec<String>),
    ArrowOutStart,  // -[
    ArrowInStart,   // <-[
    BracketClose,   // ]
    ArrowEnd,       // ->
    Dash,           // -
    Wildcard,       // *
    Comma,          // ,
    Tilde,          // ~
    BraceOpen,      // {
    BraceClose,     // }
    Integer(u64),
    Term(String),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character of this token in the source.
    pub position: usize,
}

pub fn lex(src: &str) -> Result<Vec<Token>, QueryError> {
    let bytes: Vec<char> = src.chars().collect();
    let mut i = 0usize;
    let mut tokens = Vec::new();

    while i < bytes.len() {
        let c = bytes[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;

        match c {
            '"' | '\'' => {
                let (value, next) = lex_quoted(&bytes, i)?;
                tokens.push(Token { kind: TokenKind::Quoted(value), position: start });
                i = next;
            }
            '@' => {
                let mut j = i + 1;
                while j < bytes.len() && is_id_char(bytes[j]) {
                    j += 1;
                }
                if j == i + 1 {
                    return Err(QueryError::Lexical {
                        position: start,
                        message: "bare '@' is not a valid identifier token".into(),
                    });
                }
                let value: String = bytes[i + 1..j].iter().collect();
                tokens.push(Token { kind: TokenKind::AtId(value), position: start });
                i = j;
            }
            '<' => {
                if matches(&bytes, i, &['<', '-', '[']) {
                    tokens.push(Token { kind: TokenKind::ArrowInStart, position: start });
                    i += 3;
                } else {
                    return Err(QueryError::Lexical {
                        position: start,
                        message: "'<' must begin an incoming arrow '<-['".into(),
                    });
                }
            }
            '-' => {
                if matches(&bytes, i, &['-', '[']) {
                    tokens.push(Token { kind: TokenKind::ArrowOutStart, position: start });
                    i += 2;
                } else if matches(&bytes, i, &['-', '>']) {
                    tokens.push(Token { kind: TokenKind::ArrowEnd, position: start });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Dash, position: start });
                    i += 1;
                }
            }
            ']' => {
                tokens.push(Token { kind: TokenKind::BracketClose, position: start });
                i += 1;
            }
            '{' => {
                tokens.push(Token { kind: TokenKind::BraceOpen, position: start });
                i += 1;
            }
            '}' => {
                tokens.push(Token { kind: TokenKind::BraceClose, position: start });
                i += 1;
            }
            ',' => {
                tokens.push(Token { kind: TokenKind::Comma, position: start });
                i += 1;
            }
            '~' => {
                tokens.push(Token { kind: TokenKind::Tilde, position: start });
                i += 1;
            }
            '*' => {
                tokens.push(Token { kind: TokenKind::Wildcard, position: start });
                i += 1;
            }
            c if c.is_ascii_digit() => {
                let mut j = i;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                let value: String = bytes[i..j].iter().collect();
                let n: u64 = value.parse().map_err(|_| QueryError::Lexical {
                    position: start,
                    message: format!("integer literal out of range: {value}"),
                })?;
                tokens.push(Token { kind: TokenKind::Integer(n), position: start });
                i = j;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut j = i;
                while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == '_') {
                    j += 1;
                }
                let word: String = bytes[i..j].iter().collect();

                if word == "type" && j < bytes.len() && bytes[j] == ':' {
                    let (types, next) = lex_type_list(&bytes, j + 1, start)?;
                    tokens.push(Token { kind: TokenKind::TypeFilter(types), position: start });
                    i = next;
                } else {
                    tokens.push(Token { kind: TokenKind::Term(word), position: start });
                    i = j;
                }
            }
            other => {
                return Err(QueryError::Lexical {
                    position: start,
                    message: format!("unexpected character '{other}'"),
                });
            }
        }
    }

    tokens.push(Token { kind: TokenKind::Eof, position: bytes.len() });
    Ok(tokens)
}

fn matches(bytes: &[char], at: usize, pattern: &[char]) -> bool {
    if at + pattern.len() > bytes.len() {
        return false;
    }
    bytes[at..at + pattern.len()] == *pattern
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':' || c == '-'
}

fn lex_quoted(bytes: &[char], start: usize) -> Result<(String, usize), QueryError> {
    let quote = bytes[start];
    let mut j = start + 1;
    let mut out = String::new();

    loop {
        if j >= bytes.len() {
            return Err(QueryError::Lexical {
                position: start,
                message: "unterminated quoted literal".into(),
            });
        }
        let c = bytes[j];
        if c == '\\' {
            if j + 1 >= bytes.len() {
                return Err(QueryError::Lexical {
                    position: start,
                    message: "unterminated quoted literal".into(),
                });
            }
            out.push(bytes[j + 1]);
            j += 2;
            continue;
        }
        if c == quote {
            return Ok((out, j + 1));
        }
        out.push(c);
        j += 1;
    }
}

fn lex_type_list(bytes: &[char], start: usize, filter_start: usize) -> Result<(Vec<String>, usize), QueryError> {
    let mut j = start;
    let mut types = Vec::new();
    let mut current = String::new();

    while j < bytes.len() && is_type_char(bytes[j]) {
        if bytes[j] == ',' {
            if current.is_empty() {
                return Err(QueryError::Lexical {
                    position: filter_start,
                    message: "empty type tag in type-filter list".into(),
                });
            }
            types.push(std::mem::take(&mut current));
        } else {
            current.push(bytes[j]);
        }
        j += 1;
    }

    if current.is_empty() {
        return Err(QueryError::Lexical {
            position: filter_start,
            message: "type-filter must name at least one type".into(),
        });
    }
    types.push(current);

    Ok((types, j))
}

fn is_type_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ','
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_quoted_literal() {
        assert_eq!(kinds(r#""alice austen""#), vec![
            TokenKind::Quoted("alice austen".into()),
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn lexes_escaped_quote() {
        assert_eq!(
            kinds(r#""a\"b""#),
            vec![TokenKind::Quoted("a\"b".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_lexical_error() {
        let err = lex(r#""unterminated"#).unwrap_err();
        assert!(matches!(err, QueryError::Lexical { position: 0, .. }));
    }

    #[test]
    fn lexes_at_id() {
        assert_eq!(
            kinds("@archive:42"),
            vec![TokenKind::AtId("archive:42".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn bare_at_is_an_error() {
        assert!(lex("@ ").is_err());
    }

    #[test]
    fn lexes_type_filter_with_multiple_tags() {
        assert_eq!(
            kinds("type:person,file"),
            vec![
                TokenKind::TypeFilter(vec!["person".into(), "file".into()]),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_hyphenated_type_tag() {
        assert_eq!(
            kinds("type:archive-unit"),
            vec![
                TokenKind::TypeFilter(vec!["archive-unit".into()]),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_hop_punctuation() {
        assert_eq!(
            kinds("-[*]->"),
            vec![
                TokenKind::ArrowOutStart,
                TokenKind::Wildcard,
                TokenKind::BracketClose,
                TokenKind::ArrowEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_incoming_and_bidirectional_openers() {
        assert_eq!(
            kinds("<-[*]-"),
            vec![
                TokenKind::ArrowInStart,
                TokenKind::Wildcard,
                TokenKind::BracketClose,
                TokenKind::Dash,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("<-[*]->"),
            vec![
                TokenKind::ArrowInStart,
                TokenKind::Wildcard,
                TokenKind::BracketClose,
                TokenKind::ArrowEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_depth_range_braces() {
        assert_eq!(
            kinds("{1,4}"),
            vec![
                TokenKind::BraceOpen,
                TokenKind::Integer(1),
                TokenKind::Comma,
                TokenKind::Integer(4),
                TokenKind::BraceClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_unexpected_character() {
        assert!(lex("#").is_err());
    }
}
