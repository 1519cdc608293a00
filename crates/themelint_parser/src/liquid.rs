//! Tolerant Liquid template parser.
//!
//! Produces a [`LiquidNode`] tree for any input. Unclosed delimiters, unclosed
//! blocks and stray end tags are recorded as [`SyntaxError`]s and the tree is
//! built around them, so checks can still run on documents being edited.

use themelint_ast::{LiquidNode, NodeData, NodeType, Span, TagData, TagMarkup};

use crate::expression::ExprParser;
use crate::{ParseError, ParsedDocument, Parser, SyntaxError};

/// Tags whose body holds Liquid and is closed by `end<name>`.
const BLOCK_TAGS: &[&str] = &[
    "if", "unless", "case", "for", "tablerow", "capture", "form", "paginate", "style",
];

/// Tags whose body is opaque text closed by `end<name>`.
const RAW_TAGS: &[&str] = &[
    "comment",
    "doc",
    "raw",
    "schema",
    "javascript",
    "stylesheet",
];

/// Raw tags whose body is a comment rather than content.
const COMMENT_TAGS: &[&str] = &["comment", "doc"];

/// Tags whose markup is a free-form list of expressions.
const EXPRESSION_TAGS: &[&str] = &[
    "if", "unless", "elsif", "when", "case", "cycle", "form", "paginate",
];

/// Open blocks deeper than this are kept as plain tags and reported.
const MAX_BLOCK_DEPTH: usize = 100;

/// Liquid parser for `.liquid` theme files.
#[derive(Debug, Default)]
pub struct LiquidParser;

impl LiquidParser {
    /// Creates a new Liquid parser.
    pub fn new() -> Self {
        Self
    }
}

impl Parser for LiquidParser {
    fn name(&self) -> &str {
        "liquid"
    }

    fn extensions(&self) -> &[&str] {
        &["liquid"]
    }

    fn parse(&self, source: &str) -> Result<ParsedDocument, ParseError> {
        ParseError::check_size(source)?;
        Ok(TreeBuilder::new(source).build())
    }
}

/// A block tag waiting for its `end<name>`.
struct OpenBlock {
    tag: TagData,
    children: Vec<LiquidNode>,
}

impl OpenBlock {
    fn finish(self, end: u32) -> LiquidNode {
        let start = self.tag.block_start.start;
        LiquidNode::new_parent(NodeType::LiquidTag, Span::new(start, end), self.children)
            .with_data(NodeData::Tag(self.tag))
    }
}

/// Delimited region `{{ }}` or `{% %}` with its trimmed inner markup.
struct Delimited {
    /// Whole region including delimiters.
    span: Span,
    /// Inner markup without whitespace-control dashes or surrounding space.
    inner: Span,
}

struct TreeBuilder<'s> {
    source: &'s str,
    root: Vec<LiquidNode>,
    open: Vec<OpenBlock>,
    errors: Vec<SyntaxError>,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            root: Vec::new(),
            open: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn len(&self) -> u32 {
        self.source.len() as u32
    }

    fn text(&self, span: Span) -> &'s str {
        span.slice(self.source).unwrap_or_default()
    }

    fn build(mut self) -> ParsedDocument {
        let mut pos = 0;

        while pos < self.source.len() {
            let next = self.source[pos..]
                .match_indices('{')
                .map(|(i, _)| pos + i)
                .find(|&i| matches!(self.source.as_bytes().get(i + 1), Some(b'{' | b'%')));

            let Some(open) = next else {
                self.push_text(pos, self.source.len());
                break;
            };
            self.push_text(pos, open);

            pos = if self.source.as_bytes()[open + 1] == b'{' {
                self.output(open)
            } else {
                self.tag(open)
            };
        }

        while let Some(block) = self.open.pop() {
            self.errors.push(SyntaxError::new(
                format!("Unclosed tag '{}'", block.tag.name),
                block.tag.block_start,
            ));
            let node = block.finish(self.len());
            self.push_node(node);
        }

        let tree = LiquidNode::new_parent(NodeType::Document, Span::new(0, self.len()), self.root);
        ParsedDocument::new(tree, self.errors)
    }

    fn push_node(&mut self, node: LiquidNode) {
        match self.open.last_mut() {
            Some(block) => block.children.push(node),
            None => self.root.push(node),
        }
    }

    fn push_text(&mut self, start: usize, end: usize) {
        if start < end {
            self.push_node(LiquidNode::new_leaf(
                NodeType::RawText,
                Span::new(start as u32, end as u32),
            ));
        }
    }

    /// Finds the closing delimiter for a region opened at `open`.
    fn delimited(&mut self, open: usize, close: &str, what: &str) -> Delimited {
        let body_start = open + 2;
        let (body_end, end) = match self.source[body_start..].find(close) {
            Some(i) => (body_start + i, body_start + i + close.len()),
            None => {
                self.errors.push(SyntaxError::new(
                    format!("Unclosed {what}"),
                    Span::new(open as u32, self.len()),
                ));
                (self.source.len(), self.source.len())
            }
        };

        let mut inner_start = body_start;
        let mut inner_end = body_end;
        let bytes = self.source.as_bytes();
        if inner_start < inner_end && bytes[inner_start] == b'-' {
            inner_start += 1;
        }
        if inner_end > inner_start && bytes[inner_end - 1] == b'-' {
            inner_end -= 1;
        }
        while inner_start < inner_end && bytes[inner_start].is_ascii_whitespace() {
            inner_start += 1;
        }
        while inner_end > inner_start && bytes[inner_end - 1].is_ascii_whitespace() {
            inner_end -= 1;
        }

        Delimited {
            span: Span::new(open as u32, end as u32),
            inner: Span::new(inner_start as u32, inner_end as u32),
        }
    }

    /// `{{ expression }}`; returns the offset after the region.
    fn output(&mut self, open: usize) -> usize {
        let region = self.delimited(open, "}}", "variable output '{{'");
        let mut parser = ExprParser::new(self.text(region.inner), region.inner.start);
        let children = parser.variable().into_iter().collect();
        self.check_expression_depth(&parser);

        self.push_node(LiquidNode::new_parent(
            NodeType::LiquidVariableOutput,
            region.span,
            children,
        ));
        region.span.end as usize
    }

    /// `{% name markup %}`; returns the offset after the tag, or after the
    /// closing tag for raw blocks.
    fn tag(&mut self, open: usize) -> usize {
        let region = self.delimited(open, "%}", "tag '{%'");
        let inner = self.text(region.inner);

        if inner.starts_with('#') {
            self.push_node(LiquidNode::new_leaf(NodeType::LiquidComment, region.span));
            return region.span.end as usize;
        }

        let name_len = inner
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(inner.len());
        let name = &inner[..name_len];
        let markup_offset = inner[name_len..]
            .find(|c: char| !c.is_ascii_whitespace())
            .map_or(inner.len(), |i| name_len + i);
        let markup = &inner[markup_offset..];
        let markup_base = region.inner.start + markup_offset as u32;

        if name.is_empty() {
            self.errors
                .push(SyntaxError::new("Tag without a name", region.span));
            self.push_raw_tag(name, markup, region.span);
            return region.span.end as usize;
        }

        if let Some(opener) = name.strip_prefix("end") {
            if !self.close_block(opener, region.span) {
                self.errors.push(SyntaxError::new(
                    format!("Unexpected '{name}' without a matching '{opener}'"),
                    region.span,
                ));
                self.push_raw_tag(name, markup, region.span);
            }
            return region.span.end as usize;
        }

        if RAW_TAGS.contains(&name) {
            return self.raw_block(name, markup, region.span);
        }

        let mut parser = ExprParser::new(markup, markup_base);
        let (tag_markup, children) = self.markup(name, markup, &mut parser, region.span);
        self.check_expression_depth(&parser);
        let tag = TagData::new(name, tag_markup, region.span);

        if BLOCK_TAGS.contains(&name) {
            if self.open.len() < MAX_BLOCK_DEPTH {
                self.open.push(OpenBlock { tag, children });
                return region.span.end as usize;
            }
            self.errors.push(SyntaxError::new(
                format!("Tag '{name}' is nested too deeply"),
                region.span,
            ));
        }
        self.push_node(
            LiquidNode::new_parent(NodeType::LiquidTag, region.span, children)
                .with_data(NodeData::Tag(tag)),
        );
        region.span.end as usize
    }

    fn check_expression_depth(&mut self, parser: &ExprParser<'_>) {
        if let Some(span) = parser.too_deep() {
            self.errors
                .push(SyntaxError::new("Expression is nested too deeply", span));
        }
    }

    fn push_raw_tag(&mut self, name: &str, markup: &str, span: Span) {
        let tag = TagData::new(
            name,
            TagMarkup::Raw {
                markup: markup.to_string(),
            },
            span,
        );
        self.push_node(LiquidNode::new_leaf(NodeType::LiquidTag, span).with_data(NodeData::Tag(tag)));
    }

    /// Closes the innermost open block named `opener`. Blocks opened inside
    /// it that were never closed are finished where the closing tag starts.
    fn close_block(&mut self, opener: &str, closing: Span) -> bool {
        let Some(index) = self.open.iter().rposition(|b| b.tag.name == opener) else {
            return false;
        };

        while self.open.len() > index + 1 {
            let Some(block) = self.open.pop() else {
                break;
            };
            self.errors.push(SyntaxError::new(
                format!("Unclosed tag '{}'", block.tag.name),
                block.tag.block_start,
            ));
            let node = block.finish(closing.start);
            self.push_node(node);
        }

        if let Some(mut block) = self.open.pop() {
            block.tag.block_end = Some(closing);
            let node = block.finish(closing.end);
            self.push_node(node);
        }
        true
    }

    /// Skips to `{% end<name> %}` without interpreting the body.
    fn raw_block(&mut self, name: &str, markup: &str, header: Span) -> usize {
        let body_start = header.end as usize;
        let closing = self.find_end_tag(name, body_start);

        let (body_end, end, block_end) = match closing {
            Some(closing) => (closing.start as usize, closing.end, Some(closing)),
            None => {
                self.errors
                    .push(SyntaxError::new(format!("Unclosed tag '{name}'"), header));
                (self.source.len(), self.len(), None)
            }
        };
        let span = Span::new(header.start, end);

        if COMMENT_TAGS.contains(&name) {
            self.push_node(LiquidNode::new_leaf(NodeType::LiquidComment, span));
            return end as usize;
        }

        let mut tag = TagData::new(
            name,
            TagMarkup::Raw {
                markup: markup.to_string(),
            },
            header,
        );
        tag.block_end = block_end;

        let body = if body_start < body_end {
            vec![LiquidNode::new_leaf(
                NodeType::RawText,
                Span::new(body_start as u32, body_end as u32),
            )]
        } else {
            Vec::new()
        };
        self.push_node(
            LiquidNode::new_parent(NodeType::LiquidTag, span, body).with_data(NodeData::Tag(tag)),
        );
        end as usize
    }

    fn find_end_tag(&self, name: &str, from: usize) -> Option<Span> {
        let end_name = format!("end{name}");
        let mut pos = from;

        while let Some(i) = self.source[pos..].find("{%") {
            let open = pos + i;
            let close = self.source[open + 2..].find("%}").map(|c| open + 2 + c)?;
            let inner = self.source[open + 2..close]
                .trim_matches(|c: char| c == '-' || c.is_ascii_whitespace());
            if inner == end_name {
                return Some(Span::new(open as u32, (close + 2) as u32));
            }
            pos = close + 2;
        }
        None
    }

    /// Interprets the markup of a non-raw tag.
    fn markup(
        &mut self,
        name: &str,
        markup: &str,
        parser: &mut ExprParser<'_>,
        span: Span,
    ) -> (TagMarkup, Vec<LiquidNode>) {
        let raw = || TagMarkup::Raw {
            markup: markup.to_string(),
        };

        match name {
            "assign" => {
                let Some((variable, _)) = parser.ident() else {
                    self.errors
                        .push(SyntaxError::new("Invalid 'assign' markup", span));
                    return (raw(), Vec::new());
                };
                if !parser.assignment_operator() {
                    self.errors
                        .push(SyntaxError::new("Invalid 'assign' markup", span));
                    return (raw(), Vec::new());
                }
                let value = parser.variable().into_iter().collect();
                (
                    TagMarkup::Assign {
                        name: variable.to_string(),
                    },
                    value,
                )
            }
            "capture" => {
                if let Some((variable, variable_span)) = parser.ident() {
                    let lookup = LiquidNode::new_leaf(NodeType::VariableLookup, variable_span)
                        .with_data(NodeData::lookup(variable));
                    (
                        TagMarkup::Capture {
                            name: variable.to_string(),
                        },
                        vec![lookup],
                    )
                } else if let Some((variable, _)) = parser.string() {
                    (
                        TagMarkup::Capture {
                            name: variable.to_string(),
                        },
                        Vec::new(),
                    )
                } else {
                    self.errors
                        .push(SyntaxError::new("Invalid 'capture' markup", span));
                    (raw(), Vec::new())
                }
            }
            "for" | "tablerow" => {
                let header = parser.ident().and_then(|(variable, _)| {
                    matches!(parser.ident(), Some(("in", _))).then_some(variable)
                });
                let Some(variable) = header else {
                    self.errors
                        .push(SyntaxError::new(format!("Invalid '{name}' markup"), span));
                    return (raw(), parser.scan_expressions());
                };
                let mut children: Vec<_> = parser.expression().into_iter().collect();
                children.extend(parser.scan_expressions());
                let variable_name = variable.to_string();
                let markup = if name == "for" {
                    TagMarkup::For { variable_name }
                } else {
                    TagMarkup::Tablerow { variable_name }
                };
                (markup, children)
            }
            "render" | "include" => match parser.string() {
                Some((snippet, snippet_span)) => {
                    let mut children = vec![
                        LiquidNode::new_leaf(NodeType::String, snippet_span)
                            .with_data(NodeData::literal(snippet)),
                    ];
                    children.extend(parser.scan_expressions());
                    (
                        TagMarkup::Render {
                            snippet: Some(snippet.to_string()),
                        },
                        children,
                    )
                }
                None => (TagMarkup::Render { snippet: None }, parser.scan_expressions()),
            },
            "section" | "sections" => match parser.string() {
                Some((target, target_span)) => {
                    let child = LiquidNode::new_leaf(NodeType::String, target_span)
                        .with_data(NodeData::literal(target));
                    let target = target.to_string();
                    let markup = if name == "section" {
                        TagMarkup::Section { name: target }
                    } else {
                        TagMarkup::Sections { name: target }
                    };
                    (markup, vec![child])
                }
                None => {
                    self.errors
                        .push(SyntaxError::new(format!("Invalid '{name}' markup"), span));
                    (raw(), Vec::new())
                }
            },
            "echo" => (raw(), parser.variable().into_iter().collect()),
            _ if EXPRESSION_TAGS.contains(&name) => (raw(), parser.scan_expressions()),
            _ => (raw(), Vec::new()),
        }
    }
}
