//! Lexer and parser for Liquid expressions inside `{{ }}` and tag markup.

use themelint_ast::{LiquidNode, NodeData, NodeType, Span};

/// Identifiers that are literals, never variable reads.
const LITERAL_KEYWORDS: &[&str] = &["true", "false", "nil", "null", "empty", "blank"];

/// Words that separate expressions in tag markup.
const MARKUP_KEYWORDS: &[&str] = &[
    "and", "or", "contains", "in", "with", "as", "by", "for", "reversed",
];

/// Nested lookups and ranges deeper than this are not parsed.
const MAX_EXPRESSION_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Ident,
    String,
    Number,
    Dot,
    DotDot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Pipe,
    Colon,
    Comma,
    Op,
    Other,
}

#[derive(Debug, Clone, Copy)]
struct Token<'s> {
    kind: TokenKind,
    /// Token text; for strings, the contents without quotes.
    text: &'s str,
    span: Span,
}

fn tokenize(markup: &str, base: u32) -> Vec<Token<'_>> {
    let bytes = markup.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        let kind = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'\'' | b'"' => {
                let close = markup[i + 1..].find(c as char).map(|p| i + 1 + p);
                let (text_end, end) = match close {
                    Some(close) => (close, close + 1),
                    None => (bytes.len(), bytes.len()),
                };
                tokens.push(Token {
                    kind: TokenKind::String,
                    text: &markup[i + 1..text_end],
                    span: Span::new(base + start as u32, base + end as u32),
                });
                i = end;
                continue;
            }
            b'0'..=b'9' => {
                i = scan_number(bytes, i);
                TokenKind::Number
            }
            b'-' if bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                i = scan_number(bytes, i + 1);
                TokenKind::Number
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                i += 1;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'-')
                {
                    i += 1;
                }
                if bytes.get(i) == Some(&b'?') {
                    i += 1;
                }
                TokenKind::Ident
            }
            b'.' if bytes.get(i + 1) == Some(&b'.') => {
                i += 2;
                TokenKind::DotDot
            }
            b'.' => {
                i += 1;
                TokenKind::Dot
            }
            b'[' => {
                i += 1;
                TokenKind::LBracket
            }
            b']' => {
                i += 1;
                TokenKind::RBracket
            }
            b'(' => {
                i += 1;
                TokenKind::LParen
            }
            b')' => {
                i += 1;
                TokenKind::RParen
            }
            b'|' => {
                i += 1;
                TokenKind::Pipe
            }
            b':' => {
                i += 1;
                TokenKind::Colon
            }
            b',' => {
                i += 1;
                TokenKind::Comma
            }
            b'=' | b'!' | b'<' | b'>' => {
                i += 1;
                if bytes.get(i) == Some(&b'=') {
                    i += 1;
                }
                TokenKind::Op
            }
            _ => {
                i += markup[i..].chars().next().map_or(1, char::len_utf8);
                TokenKind::Other
            }
        };

        tokens.push(Token {
            kind,
            text: &markup[start..i],
            span: Span::new(base + start as u32, base + i as u32),
        });
    }

    tokens
}

fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    // `1..3` is a range, not a decimal.
    if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    i
}

/// Recursive-descent parser over the tokens of one markup string.
pub(crate) struct ExprParser<'s> {
    tokens: Vec<Token<'s>>,
    pos: usize,
    last_end: u32,
    depth: usize,
    too_deep: Option<Span>,
}

impl<'s> ExprParser<'s> {
    /// `base` is the byte offset of `markup` within the document.
    pub(crate) fn new(markup: &'s str, base: u32) -> Self {
        Self {
            tokens: tokenize(markup, base),
            pos: 0,
            last_end: base,
            depth: 0,
            too_deep: None,
        }
    }

    /// Where parsing first stopped because expressions nested too deeply.
    pub(crate) fn too_deep(&self) -> Option<Span> {
        self.too_deep
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<Token<'s>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind_at(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Token<'s>> {
        let token = self.peek()?;
        self.pos += 1;
        self.last_end = token.span.end;
        Some(token)
    }

    /// Consumes an identifier and returns its text and span.
    pub(crate) fn ident(&mut self) -> Option<(&'s str, Span)> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Ident => {
                self.bump();
                Some((token.text, token.span))
            }
            _ => None,
        }
    }

    /// Consumes a string literal and returns its contents and span.
    pub(crate) fn string(&mut self) -> Option<(&'s str, Span)> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::String => {
                self.bump();
                Some((token.text, token.span))
            }
            _ => None,
        }
    }

    /// Consumes the `=` of an assignment.
    pub(crate) fn assignment_operator(&mut self) -> bool {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Op && token.text == "=" => {
                self.bump();
                true
            }
            _ => false,
        }
    }

    /// Parses one expression. Literal keywords are consumed without producing
    /// a node; tokens that cannot start an expression are left in place.
    pub(crate) fn expression(&mut self) -> Option<LiquidNode> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::String => {
                self.bump();
                Some(
                    LiquidNode::new_leaf(NodeType::String, token.span)
                        .with_data(NodeData::literal(token.text)),
                )
            }
            TokenKind::Number => {
                self.bump();
                Some(
                    LiquidNode::new_leaf(NodeType::Number, token.span)
                        .with_data(NodeData::literal(token.text)),
                )
            }
            TokenKind::Ident if LITERAL_KEYWORDS.contains(&token.text) => {
                self.bump();
                None
            }
            TokenKind::Ident | TokenKind::LBracket | TokenKind::LParen => {
                if self.depth >= MAX_EXPRESSION_DEPTH {
                    self.too_deep.get_or_insert(token.span);
                    return None;
                }
                self.depth += 1;
                let node = if token.kind == TokenKind::LParen {
                    self.range()
                } else {
                    self.lookup()
                };
                self.depth -= 1;
                Some(node)
            }
            _ => None,
        }
    }

    fn lookup(&mut self) -> LiquidNode {
        let mut name = None;
        let mut children = Vec::new();
        let start = self.peek().map_or(self.last_end, |t| t.span.start);

        if let Some((text, _)) = self.ident() {
            name = Some(text.to_string());
        }

        loop {
            match self.peek_kind_at(0) {
                Some(TokenKind::Dot) => {
                    self.bump();
                    if self.ident().is_none() {
                        break;
                    }
                }
                Some(TokenKind::LBracket) => {
                    self.bump();
                    if let Some(inner) = self.expression() {
                        children.push(inner);
                    }
                    if self.peek_kind_at(0) == Some(TokenKind::RBracket) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }

        LiquidNode::new_parent(
            NodeType::VariableLookup,
            Span::new(start, self.last_end),
            children,
        )
        .with_data(NodeData::Lookup { name })
    }

    fn range(&mut self) -> LiquidNode {
        let start = self.peek().map_or(self.last_end, |t| t.span.start);
        self.bump();

        let mut children = Vec::new();
        if let Some(from) = self.expression() {
            children.push(from);
        }
        if self.peek_kind_at(0) == Some(TokenKind::DotDot) {
            self.bump();
            if let Some(to) = self.expression() {
                children.push(to);
            }
        }
        if self.peek_kind_at(0) == Some(TokenKind::RParen) {
            self.bump();
        }

        LiquidNode::new_parent(NodeType::Range, Span::new(start, self.last_end), children)
    }

    /// Parses `expression | filter: args | ...` into a `LiquidVariable`.
    pub(crate) fn variable(&mut self) -> Option<LiquidNode> {
        let start = self.peek()?.span.start;
        let mut children = Vec::new();

        if let Some(expression) = self.expression() {
            children.push(expression);
        }

        while self.peek_kind_at(0) == Some(TokenKind::Pipe) {
            self.bump();
            let Some((name, name_span)) = self.ident() else {
                break;
            };

            let mut args = Vec::new();
            if self.peek_kind_at(0) == Some(TokenKind::Colon) {
                self.bump();
                loop {
                    // Named argument: the key is not a variable read.
                    if self.peek_kind_at(0) == Some(TokenKind::Ident)
                        && self.peek_kind_at(1) == Some(TokenKind::Colon)
                    {
                        self.bump();
                        self.bump();
                    }
                    if let Some(arg) = self.expression() {
                        args.push(arg);
                    }
                    if self.peek_kind_at(0) == Some(TokenKind::Comma) {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }

            children.push(
                LiquidNode::new_parent(
                    NodeType::LiquidFilter,
                    Span::new(name_span.start, self.last_end),
                    args,
                )
                .with_data(NodeData::name(name)),
            );
        }

        Some(LiquidNode::new_parent(
            NodeType::LiquidVariable,
            Span::new(start, self.last_end),
            children,
        ))
    }

    /// Collects every expression in free-form markup such as `if` conditions,
    /// skipping operators, keywords, named-argument keys and `as` aliases.
    pub(crate) fn scan_expressions(&mut self) -> Vec<LiquidNode> {
        let mut nodes = Vec::new();

        while let Some(token) = self.peek() {
            if token.kind == TokenKind::Ident {
                if self.peek_kind_at(1) == Some(TokenKind::Colon) {
                    self.bump();
                    self.bump();
                    continue;
                }
                if token.text == "as" {
                    self.bump();
                    self.ident();
                    continue;
                }
                if MARKUP_KEYWORDS.contains(&token.text) {
                    self.bump();
                    continue;
                }
            }

            let before = self.pos;
            if let Some(node) = self.expression() {
                nodes.push(node);
            }
            if self.pos == before {
                self.bump();
            }
        }

        nodes
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lookups(node: &LiquidNode, out: &mut Vec<(Option<String>, Span)>) {
        if node.node_type == NodeType::VariableLookup {
            out.push((node.lookup_name().map(str::to_string), node.span));
        }
        for child in &node.children {
            lookups(child, out);
        }
    }

    #[test]
    fn test_tokenize_range_is_not_decimal() {
        let kinds: Vec<_> = tokenize("(1..3)", 0).iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LParen,
                TokenKind::Number,
                TokenKind::DotDot,
                TokenKind::Number,
                TokenKind::RParen
            ]
        );
    }

    #[test]
    fn test_variable_with_filters() {
        let mut parser = ExprParser::new("product.title | append: suffix, sep: x | upcase", 10);
        let variable = parser.variable().unwrap();

        assert_eq!(variable.node_type, NodeType::LiquidVariable);
        assert_eq!(variable.span, Span::new(10, 57));
        assert_eq!(variable.children.len(), 3);
        assert_eq!(variable.children[0].lookup_name(), Some("product"));
        assert_eq!(variable.children[0].span, Span::new(10, 23));
        assert_eq!(variable.children[1].name(), Some("append"));
        assert_eq!(variable.children[1].children.len(), 2);
        assert_eq!(variable.children[2].name(), Some("upcase"));

        let mut found = Vec::new();
        lookups(&variable, &mut found);
        let names: Vec<_> = found.into_iter().filter_map(|(n, _)| n).collect();
        assert_eq!(names, vec!["product", "suffix", "x"]);
    }

    #[test]
    fn test_bracket_lookup_has_no_name() {
        let mut parser = ExprParser::new("['x']", 0);
        let node = parser.expression().unwrap();
        assert_eq!(node.lookup_name(), None);
        assert_eq!(node.span, Span::new(0, 5));
        assert_eq!(node.children[0].literal(), Some("x"));
    }

    #[test]
    fn test_nested_bracket_lookup() {
        let mut parser = ExprParser::new("a[b].c", 0);
        let node = parser.expression().unwrap();
        let mut found = Vec::new();
        lookups(&node, &mut found);
        assert_eq!(
            found,
            vec![
                (Some("a".to_string()), Span::new(0, 6)),
                (Some("b".to_string()), Span::new(2, 3)),
            ]
        );
    }

    #[test]
    fn test_keywords_produce_no_nodes() {
        let mut parser = ExprParser::new("a == true and b contains 'x' or c != nil", 0);
        let nodes = parser.scan_expressions();
        let names: Vec<_> = nodes.iter().filter_map(|n| n.lookup_name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(parser.at_end());
    }

    #[test]
    fn test_alias_and_named_keys_are_skipped() {
        let mut parser = ExprParser::new("with product as item, size: width", 0);
        let nodes = parser.scan_expressions();
        let names: Vec<_> = nodes.iter().filter_map(|n| n.lookup_name()).collect();
        assert_eq!(names, vec!["product", "width"]);
    }

    #[test]
    fn test_nesting_stops_at_the_depth_limit() {
        let markup = "(".repeat(1_000);
        let mut parser = ExprParser::new(&markup, 0);
        let node = parser.expression().unwrap();

        let mut depth = 0;
        let mut current = &node;
        while let Some(child) = current.children.first() {
            depth += 1;
            current = child;
        }
        assert_eq!(depth, MAX_EXPRESSION_DEPTH - 1);
        assert_eq!(parser.too_deep(), Some(Span::new(64, 65)));
    }

    #[test]
    fn test_unterminated_string() {
        let mut parser = ExprParser::new("'abc", 0);
        let node = parser.expression().unwrap();
        assert_eq!(node.literal(), Some("abc"));
        assert_eq!(node.span, Span::new(0, 4));
    }
}
