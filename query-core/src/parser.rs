//! Recursive-descent parser: token stream → [`Query`] AST (spec §4.2).

use crate::ast::{DepthRange, Direction, EntryPoint, Filter, Hop, Query, RelationMatch};
use crate::error::QueryError;
use crate::lexer::{lex, Token, TokenKind};

pub fn parse(src: &str) -> Result<Query, QueryError> {
    let tokens = lex(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    let query = parser.parse_query()?;
    parser.expect_eof()?;
    query.validate()?;
    Ok(query)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::Parse { position: self.peek().position, message: message.into() }
    }

    fn expect_eof(&self) -> Result<(), QueryError> {
        if self.peek().kind != TokenKind::Eof {
            return Err(self.error(format!("unexpected trailing token {:?}", self.peek().kind)));
        }
        Ok(())
    }

    fn parse_query(&mut self) -> Result<Query, QueryError> {
        let entry = self.parse_entry()?;

        let entry_filter = if self.starts_hop() || self.peek().kind == TokenKind::Eof {
            None
        } else {
            Some(self.parse_filter()?)
        };

        let mut hops = Vec::new();
        while self.starts_hop() {
            hops.push(self.parse_hop()?);
        }

        Ok(Query { entry, entry_filter, hops })
    }

    fn starts_hop(&self) -> bool {
        matches!(self.peek().kind, TokenKind::ArrowOutStart | TokenKind::ArrowInStart)
    }

    fn parse_entry(&mut self) -> Result<EntryPoint, QueryError> {
        match self.peek().kind.clone() {
            TokenKind::Quoted(text) => {
                self.advance();
                Ok(EntryPoint::SemanticText(text))
            }
            TokenKind::AtId(id) => {
                self.advance();
                Ok(EntryPoint::ExactId(id))
            }
            TokenKind::TypeFilter(types) => {
                self.advance();
                if self.peek().kind == TokenKind::Tilde {
                    self.advance();
                    let text = self.expect_quoted()?;
                    Ok(EntryPoint::TypePlusSemantic { types, text })
                } else {
                    Ok(EntryPoint::TypeOnly(types))
                }
            }
            other => Err(self.error(format!("expected an entry point, found {other:?}"))),
        }
    }

    fn parse_filter(&mut self) -> Result<Filter, QueryError> {
        match self.peek().kind.clone() {
            TokenKind::TypeFilter(types) => {
                self.advance();
                if self.peek().kind == TokenKind::Tilde {
                    self.advance();
                    let text = self.expect_quoted()?;
                    Ok(Filter::TypeSetPlusSemantic { types, text })
                } else {
                    Ok(Filter::TypeSet(types))
                }
            }
            TokenKind::AtId(id) => {
                self.advance();
                Ok(Filter::ExactId(id))
            }
            TokenKind::Quoted(text) => {
                self.advance();
                Ok(Filter::SemanticText(text))
            }
            other => Err(self.error(format!("expected a filter, found {other:?}"))),
        }
    }

    fn expect_quoted(&mut self) -> Result<String, QueryError> {
        match self.peek().kind.clone() {
            TokenKind::Quoted(text) => {
                self.advance();
                Ok(text)
            }
            other => Err(self.error(format!("expected a quoted string, found {other:?}"))),
        }
    }

    fn parse_hop(&mut self) -> Result<Hop, QueryError> {
        let opener = self.advance();
        let tentative_incoming = matches!(opener.kind, TokenKind::ArrowInStart);

        let relation = self.parse_relation()?;

        match self.advance().kind {
            TokenKind::BracketClose => {}
            other => return Err(self.error(format!("expected ']' closing the hop, found {other:?}"))),
        }

        let depth = if self.peek().kind == TokenKind::BraceOpen {
            self.parse_depth()?
        } else {
            DepthRange::SINGLE
        };

        let closed_with_arrow = match self.advance().kind {
            TokenKind::ArrowEnd => true,
            TokenKind::Dash => false,
            other => return Err(self.error(format!("expected an arrow end, found {other:?}"))),
        };

        let direction = match (tentative_incoming, closed_with_arrow) {
            (false, true) => Direction::Outgoing,
            (false, false) => {
                return Err(self.error("an outgoing hop opener must be closed with '->'"));
            }
            (true, true) => Direction::Bidirectional,
            (true, false) => Direction::Incoming,
        };

        let filter = if self.starts_filter() {
            Some(self.parse_filter()?)
        } else {
            None
        };

        Ok(Hop { direction, relation, depth, filter })
    }

    fn starts_filter(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::TypeFilter(_) | TokenKind::AtId(_) | TokenKind::Quoted(_)
        )
    }

    fn parse_relation(&mut self) -> Result<RelationMatch, QueryError> {
        if self.peek().kind == TokenKind::Wildcard {
            self.advance();
            return Ok(RelationMatch::Wildcard);
        }

        let mut terms = vec![self.expect_term()?];
        while self.peek().kind == TokenKind::Comma {
            self.advance();
            terms.push(self.expect_term()?);
        }
        Ok(RelationMatch::Fuzzy(terms))
    }

    fn expect_term(&mut self) -> Result<String, QueryError> {
        match self.peek().kind.clone() {
            TokenKind::Term(t) => {
                self.advance();
                Ok(t)
            }
            other => Err(self.error(format!("expected a relation term, found {other:?}"))),
        }
    }

    fn parse_depth(&mut self) -> Result<DepthRange, QueryError> {
        self.advance(); // '{'

        if self.peek().kind == TokenKind::Comma {
            self.advance();
            let max = self.expect_integer()?;
            self.expect_brace_close()?;
            return Ok(DepthRange { min: 1, max: Some(max) });
        }

        let first = self.expect_integer()?;

        if self.peek().kind == TokenKind::BraceClose {
            self.advance();
            return Ok(DepthRange { min: first, max: Some(first) });
        }

        if self.peek().kind == TokenKind::Comma {
            self.advance();
            if self.peek().kind == TokenKind::BraceClose {
                self.advance();
                return Ok(DepthRange { min: first, max: None });
            }
            let second = self.expect_integer()?;
            self.expect_brace_close()?;
            return Ok(DepthRange { min: first, max: Some(second) });
        }

        Err(self.error(format!("malformed depth range, found {:?}", self.peek().kind)))
    }

    fn expect_integer(&mut self) -> Result<u32, QueryError> {
        match self.peek().kind.clone() {
            TokenKind::Integer(n) => {
                self.advance();
                u32::try_from(n).map_err(|_| self.error("depth value too large"))
            }
            other => Err(self.error(format!("expected an integer, found {other:?}"))),
        }
    }

    fn expect_brace_close(&mut self) -> Result<(), QueryError> {
        match self.advance().kind {
            TokenKind::BraceClose => Ok(()),
            other => Err(self.error(format!("expected '}}', found {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zero_hop_semantic_entry() {
        let q = parse(r#""alice austen""#).unwrap();
        assert_eq!(q.entry, EntryPoint::SemanticText("alice austen".into()));
        assert!(q.hops.is_empty());
    }

    #[test]
    fn parses_zero_hop_type_plus_semantic() {
        let q = parse(r#"type:person ~ "photographer""#).unwrap();
        assert_eq!(
            q.entry,
            EntryPoint::TypePlusSemantic { types: vec!["person".into()], text: "photographer".into() }
        );
    }

    #[test]
    fn parses_exact_entry_single_hop() {
        let q = parse("@archive:42 -[*]-> type:file").unwrap();
        assert_eq!(q.entry, EntryPoint::ExactId("archive:42".into()));
        assert_eq!(q.hops.len(), 1);
        assert_eq!(q.hops[0].direction, Direction::Outgoing);
        assert_eq!(q.hops[0].relation, RelationMatch::Wildcard);
        assert_eq!(q.hops[0].filter, Some(Filter::TypeSet(vec!["file".into()])));
    }

    #[test]
    fn parses_variable_depth_hop() {
        let q = parse(r#""alice austen" -[*]{,4}-> type:person"#).unwrap();
        assert_eq!(q.hops[0].depth, DepthRange { min: 1, max: Some(4) });
    }

    #[test]
    fn parses_fuzzy_relation_depth_one() {
        let q = parse(r#""alice austen" -[photographed,captured]-> type:person"#).unwrap();
        assert_eq!(
            q.hops[0].relation,
            RelationMatch::Fuzzy(vec!["photographed".into(), "captured".into()])
        );
        assert_eq!(q.hops[0].depth, DepthRange::SINGLE);
    }

    #[test]
    fn parses_chained_variable_depth_hops() {
        let q = parse("@x -[*]{,2}-> type:person -[*]{,2}-> type:file").unwrap();
        assert_eq!(q.hops.len(), 2);
        assert_eq!(q.hops[1].depth, DepthRange { min: 1, max: Some(2) });
    }

    #[test]
    fn parses_bidirectional_hop() {
        let q = parse(r#""x" <-[*]-> type:person"#).unwrap();
        assert_eq!(q.hops[0].direction, Direction::Bidirectional);
    }

    #[test]
    fn parses_incoming_only_hop() {
        let q = parse(r#""x" <-[*]- type:person"#).unwrap();
        assert_eq!(q.hops[0].direction, Direction::Incoming);
    }

    #[test]
    fn entry_filter_requires_no_following_arrow() {
        let q = parse(r#""declaration of independence" type:document"#).unwrap();
        assert_eq!(q.entry_filter, Some(Filter::TypeSet(vec!["document".into()])));
        assert!(q.hops.is_empty());
    }

    #[test]
    fn rejects_type_only_entry_with_hops() {
        let err = parse("type:person -[*]-> type:file").unwrap_err();
        assert!(matches!(err, QueryError::InvalidEntryPoint));
    }

    #[test]
    fn rejects_fuzzy_relation_with_variable_depth() {
        let err = parse(r#"@gw -[photographed]{,3}-> type:person"#).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedQuery { hop_index: 0, .. }));
    }

    #[test]
    fn rejects_unterminated_hop() {
        assert!(parse(r#""x" -[*"#).is_err());
    }

    #[test]
    fn depth_shorthands_match_expected_ranges() {
        assert_eq!(
            parse(r#"@x -[*]{3}-> type:person"#).unwrap().hops[0].depth,
            DepthRange { min: 3, max: Some(3) }
        );
        assert_eq!(
            parse(r#"@x -[*]{2,}-> type:person"#).unwrap().hops[0].depth,
            DepthRange { min: 2, max: None }
        );
        assert_eq!(
            parse(r#"@x -[*]{1,3}-> type:person"#).unwrap().hops[0].depth,
            DepthRange { min: 1, max: Some(3) }
        );
    }
}
