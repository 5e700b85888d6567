//! Recursive-descent template parser.
//!
//! The parser is total: malformed input produces diagnostics plus a
//! best-effort tree, never a panic. Context sensitivity lives in the text
//! mode returned by the platform's `get_text_mode` hook and in the
//! `v-pre` / pre-tag flags.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::ast::*;
use crate::errors::{CompilerError, DiagnosticCategory, ErrorCode};
use crate::options::{ParserOptions, TextMode, WhitespaceStrategy};
use crate::utils::condense_whitespace;
use crate::String;

/// Output of [`base_parse`]: the root node plus every diagnostic raised.
#[derive(Debug)]
pub struct ParseResult {
    pub root: RootNode,
    pub errors: Vec<CompilerError>,
}

/// Parse a template into a positioned AST. Never fails.
pub fn base_parse(source: &str, options: ParserOptions) -> ParseResult {
    let mut parser = Parser::new(source, options);
    let start = parser.pos();
    let mut ancestors = Vec::new();
    let children = parser.parse_children(TextMode::Data, &mut ancestors);
    let loc = parser.selection(start);
    let mut root = RootNode::new(source, loc);
    root.children = children;
    ParseResult { root, errors: parser.errors }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Start,
    End,
}

struct Parser<'s> {
    source: &'s str,
    offset: usize,
    line: u32,
    column: u32,
    options: ParserOptions,
    in_pre: bool,
    in_v_pre: bool,
    errors: Vec<CompilerError>,
    next_id: u32,
}

/// Advance `pos` over the first `upto` bytes of `text`.
pub(crate) fn advance_position(mut pos: Position, text: &str, upto: usize) -> Position {
    for c in text[..upto].chars() {
        if c == '\n' {
            pos.line += 1;
            pos.column = 1;
        } else {
            pos.column += 1;
        }
    }
    pos.offset += upto as u32;
    pos
}

fn is_tag_name_delimiter(c: char) -> bool {
    matches!(c, '\t' | '\r' | '\n' | '\x0C' | ' ' | '/' | '>')
}

/// `</tag` followed by a delimiter or `>` (ASCII case-insensitive).
fn starts_with_end_tag_open(s: &str, tag: &str) -> bool {
    if !s.starts_with("</") || s.len() < 2 + tag.len() {
        return false;
    }
    // Compare as bytes: the end of the tag-name range need not fall on a
    // char boundary of `s` when the source has a longer multi-byte name.
    if !s.as_bytes()[2..2 + tag.len()].eq_ignore_ascii_case(tag.as_bytes()) {
        return false;
    }
    match s[2 + tag.len()..].chars().next() {
        Some(c) => is_tag_name_delimiter(c),
        None => true,
    }
}

impl<'s> Parser<'s> {
    fn new(source: &'s str, options: ParserOptions) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
            options,
            in_pre: false,
            in_v_pre: false,
            errors: Vec::new(),
            next_id: 0,
        }
    }

    fn rest(&self) -> &'s str {
        &self.source[self.offset..]
    }

    fn pos(&self) -> Position {
        Position::new(self.offset as u32, self.line, self.column)
    }

    fn advance_by(&mut self, bytes: usize) {
        debug_assert!(bytes <= self.source.len() - self.offset);
        for c in self.source[self.offset..self.offset + bytes].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset += bytes;
    }

    fn advance_spaces(&mut self) {
        let n = self
            .rest()
            .bytes()
            .take_while(|b| matches!(b, b'\t' | b'\r' | b'\n' | b'\x0C' | b' '))
            .count();
        if n > 0 {
            self.advance_by(n);
        }
    }

    fn selection(&self, start: Position) -> SourceLocation {
        let end = self.pos();
        let source = &self.source[start.offset as usize..end.offset as usize];
        SourceLocation::new(start, end, source)
    }

    fn emit(&mut self, code: ErrorCode, loc: Option<SourceLocation>) {
        let err = CompilerError::new(code, loc);
        let handler = match err.category {
            DiagnosticCategory::Warning => self.options.on_warn.or(self.options.on_error),
            DiagnosticCategory::Error => self.options.on_error,
        };
        if let Some(handler) = handler {
            handler(&err);
        }
        self.errors.push(err);
    }

    fn emit_at(&mut self, code: ErrorCode, offset_from_cursor: usize) {
        let pos = advance_position(self.pos(), self.rest(), offset_from_cursor);
        self.emit(code, Some(SourceLocation::new(pos, pos, "")));
    }

    // -----------------------------------------------------------------------
    // Children
    // -----------------------------------------------------------------------

    fn parse_children(
        &mut self,
        mode: TextMode,
        ancestors: &mut Vec<ElementNode>,
    ) -> Vec<TemplateChildNode> {
        let mut nodes: Vec<TemplateChildNode> = Vec::new();
        let open_delim = self.options.delimiters.0.clone();

        while !self.is_end(mode, ancestors) {
            let s = self.rest();
            let mut node: Option<TemplateChildNode> = None;

            if matches!(mode, TextMode::Data | TextMode::RcData)
                && s.starts_with(open_delim.as_str())
            {
                node = self
                    .parse_interpolation(mode)
                    .map(|n| TemplateChildNode::Interpolation(Box::new(n)));
                if node.is_none() && self.rest().is_empty() {
                    break;
                }
            } else if mode == TextMode::Data && s.starts_with('<') {
                if s.len() == 1 {
                    self.emit_at(ErrorCode::EofBeforeTagName, 1);
                } else if s[1..].starts_with('!') {
                    if s.starts_with("<!--") {
                        node = Some(TemplateChildNode::Comment(Box::new(self.parse_comment())));
                    } else if s.len() >= 9 && s[..9].eq_ignore_ascii_case("<!doctype") {
                        node = Some(TemplateChildNode::Comment(Box::new(
                            self.parse_bogus_comment(),
                        )));
                    } else if s.starts_with("<![CDATA[") {
                        let ns = ancestors.last().map(|e| e.ns).unwrap_or(Namespace::Html);
                        if ns != Namespace::Html {
                            let mut cdata = self.parse_cdata(ancestors);
                            for n in cdata.drain(..) {
                                Self::push_node(self.source, &mut nodes, n);
                            }
                            continue;
                        }
                        self.emit_at(ErrorCode::CdataInHtmlContent, 0);
                        node = Some(TemplateChildNode::Comment(Box::new(
                            self.parse_bogus_comment(),
                        )));
                    } else {
                        self.emit_at(ErrorCode::IncorrectlyOpenedComment, 0);
                        node = Some(TemplateChildNode::Comment(Box::new(
                            self.parse_bogus_comment(),
                        )));
                    }
                } else if s[1..].starts_with('/') {
                    if s.len() == 2 {
                        self.emit_at(ErrorCode::EofBeforeTagName, 2);
                    } else if s[2..].starts_with('>') {
                        self.emit_at(ErrorCode::MissingEndTagName, 2);
                        self.advance_by(3);
                        continue;
                    } else if s[2..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                        self.emit_at(ErrorCode::InvalidEndTag, 0);
                        let _ = self.parse_tag(TagKind::End, ancestors);
                        continue;
                    } else {
                        self.emit_at(ErrorCode::InvalidFirstCharacterOfTagName, 2);
                        node = Some(TemplateChildNode::Comment(Box::new(
                            self.parse_bogus_comment(),
                        )));
                    }
                } else if s[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                    node = self.parse_element(ancestors);
                } else if s[1..].starts_with('?') {
                    self.emit_at(ErrorCode::UnexpectedQuestionMarkInsteadOfTagName, 1);
                    node = Some(TemplateChildNode::Comment(Box::new(
                        self.parse_bogus_comment(),
                    )));
                } else {
                    self.emit_at(ErrorCode::InvalidFirstCharacterOfTagName, 1);
                }
            }

            let node = match node {
                Some(n) => n,
                None => TemplateChildNode::Text(Box::new(self.parse_text(mode))),
            };
            Self::push_node(self.source, &mut nodes, node);
        }

        // Raw content is kept verbatim; only markup modes get the
        // condense/strip treatment.
        if !matches!(mode, TextMode::RawText | TextMode::CData) {
            self.whitespace_pass(&mut nodes);
        }
        nodes
    }

    /// Append a node, merging adjacent text nodes that touch in the source.
    fn push_node(source: &str, nodes: &mut Vec<TemplateChildNode>, node: TemplateChildNode) {
        if let (Some(TemplateChildNode::Text(prev)), TemplateChildNode::Text(next)) =
            (nodes.last_mut(), &node)
        {
            if prev.loc.end.offset == next.loc.start.offset {
                prev.content.push_str(&next.content);
                prev.loc.end = next.loc.end;
                prev.loc.source = String::from(
                    &source[prev.loc.start.offset as usize..prev.loc.end.offset as usize],
                );
                return;
            }
        }
        nodes.push(node);
    }

    /// Condense-mode whitespace handling and comment stripping.
    fn whitespace_pass(&mut self, nodes: &mut Vec<TemplateChildNode>) {
        #[derive(Clone, Copy, PartialEq)]
        enum Action {
            Keep,
            Remove,
            SetSpace,
            Condense,
        }

        let should_condense = self.options.whitespace == WhitespaceStrategy::Condense;
        let mut actions = vec![Action::Keep; nodes.len()];

        for i in 0..nodes.len() {
            match &nodes[i] {
                TemplateChildNode::Text(t) if !self.in_pre => {
                    if t.content.trim().is_empty() {
                        let prev = if i > 0 { nodes.get(i - 1) } else { None };
                        let next = nodes.get(i + 1);
                        let between_removable = should_condense
                            && match (prev, next) {
                                (
                                    Some(TemplateChildNode::Comment(_)),
                                    Some(TemplateChildNode::Comment(_)),
                                )
                                | (
                                    Some(TemplateChildNode::Comment(_)),
                                    Some(TemplateChildNode::Element(_)),
                                )
                                | (
                                    Some(TemplateChildNode::Element(_)),
                                    Some(TemplateChildNode::Comment(_)),
                                ) => true,
                                (
                                    Some(TemplateChildNode::Element(_)),
                                    Some(TemplateChildNode::Element(_)),
                                ) => t.content.contains(['\r', '\n']),
                                _ => false,
                            };
                        if prev.is_none() || next.is_none() || between_removable {
                            actions[i] = Action::Remove;
                        } else {
                            actions[i] = Action::SetSpace;
                        }
                    } else if should_condense {
                        actions[i] = Action::Condense;
                    }
                }
                TemplateChildNode::Comment(_) if !self.options.comments => {
                    actions[i] = Action::Remove;
                }
                _ => {}
            }
        }

        let mut i = 0;
        nodes.retain_mut(|node| {
            let action = actions[i];
            i += 1;
            if let TemplateChildNode::Text(t) = node {
                match action {
                    Action::SetSpace => t.content = String::from(" "),
                    Action::Condense => t.content = condense_whitespace(&t.content),
                    _ => {}
                }
            }
            action != Action::Remove
        });
    }

    fn is_end(&self, mode: TextMode, ancestors: &[ElementNode]) -> bool {
        let s = self.rest();
        match mode {
            TextMode::Data => {
                if s.starts_with("</") {
                    for el in ancestors.iter().rev() {
                        if starts_with_end_tag_open(s, &el.tag) {
                            return true;
                        }
                    }
                }
            }
            TextMode::RcData | TextMode::RawText => {
                if let Some(last) = ancestors.last() {
                    if starts_with_end_tag_open(s, &last.tag) {
                        return true;
                    }
                }
            }
            TextMode::CData => {
                if s.starts_with("]]>") {
                    return true;
                }
            }
            TextMode::AttributeValue => {}
        }
        s.is_empty()
    }

    // -----------------------------------------------------------------------
    // Text
    // -----------------------------------------------------------------------

    fn parse_text(&mut self, mode: TextMode) -> TextNode {
        let s = self.rest();
        let mut end_index = s.len();
        if mode == TextMode::CData {
            if let Some(i) = s.find("]]>") {
                end_index = i;
            }
        } else {
            // Search from 1 so a stray leading `<` or delimiter folds into text.
            if s.len() > 1 {
                if let Some(i) = memchr::memchr(b'<', &s.as_bytes()[1..]) {
                    end_index = i + 1;
                }
                if let Some(i) = s[1..].find(self.options.delimiters.0.as_str()) {
                    end_index = end_index.min(i + 1);
                }
            }
        }
        debug_assert!(end_index > 0);

        let start = self.pos();
        let content = self.parse_text_data(end_index, mode);
        TextNode { content, loc: self.selection(start) }
    }

    /// Consume `bytes` of source, decoding entities where the mode allows.
    fn parse_text_data(&mut self, bytes: usize, mode: TextMode) -> String {
        let src = self.source;
        let start = self.offset;
        self.advance_by(bytes);
        let raw = &src[start..start + bytes];
        if matches!(mode, TextMode::RawText | TextMode::CData) || !raw.contains('&') {
            String::from(raw)
        } else {
            (self.options.decode_entities)(raw, mode == TextMode::AttributeValue)
        }
    }

    fn parse_interpolation(&mut self, mode: TextMode) -> Option<InterpolationNode> {
        let (open, close) = self.options.delimiters.clone();
        let s = self.rest();
        let close_index = match s[open.len()..].find(close.as_str()) {
            Some(i) => open.len() + i,
            None => {
                self.emit_at(ErrorCode::MissingInterpolationEnd, 0);
                return None;
            }
        };

        let start = self.pos();
        self.advance_by(open.len());
        let inner_base = self.pos();
        let raw_length = close_index - open.len();
        let raw_content = self.parse_text_data(raw_length, mode);
        let content = raw_content.trim();
        let start_offset = raw_content
            .find(content)
            .unwrap_or(0);
        let inner_start = advance_position(inner_base, &raw_content, start_offset);
        let inner_end =
            advance_position(inner_base, &raw_content, start_offset + content.len());
        let exp_loc = SourceLocation::new(inner_start, inner_end, content);
        let content = String::from(content);
        self.advance_by(close.len());

        Some(InterpolationNode {
            content: SimpleExpressionNode::new(content, false, exp_loc).into_expr(),
            loc: self.selection(start),
        })
    }

    // -----------------------------------------------------------------------
    // Comments and CDATA
    // -----------------------------------------------------------------------

    fn parse_comment(&mut self) -> CommentNode {
        let start = self.pos();
        let s = self.rest();

        let normal = s.find("-->").map(|i| (i, 3usize, false));
        let bang = s.find("--!>").map(|i| (i, 4usize, true));
        let close = match (normal, bang) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        };

        let content;
        match close {
            Some((idx, len, incorrect)) => {
                if idx <= 3 {
                    self.emit_at(ErrorCode::AbruptClosingOfEmptyComment, 0);
                }
                if incorrect {
                    self.emit_at(ErrorCode::IncorrectlyClosedComment, 0);
                }
                content = String::from(&s[4..idx.max(4).min(s.len())]);
                for (nested, _) in s[1..idx].match_indices("<!--") {
                    if nested > 0 {
                        self.emit_at(ErrorCode::NestedComment, nested + 1);
                    }
                }
                self.advance_by(idx + len);
            }
            None => {
                self.emit_at(ErrorCode::EofInComment, 0);
                content = String::from(&s[4.min(s.len())..]);
                self.advance_by(s.len());
            }
        }
        CommentNode { content, loc: self.selection(start) }
    }

    fn parse_bogus_comment(&mut self) -> CommentNode {
        let start = self.pos();
        let s = self.rest();
        let content_start = if s[1..].starts_with('?') { 1 } else { 2 };
        let content;
        match s.find('>') {
            Some(close) => {
                content = String::from(&s[content_start.min(close)..close]);
                self.advance_by(close + 1);
            }
            None => {
                content = String::from(&s[content_start.min(s.len())..]);
                self.advance_by(s.len());
            }
        }
        CommentNode { content, loc: self.selection(start) }
    }

    fn parse_cdata(&mut self, ancestors: &mut Vec<ElementNode>) -> Vec<TemplateChildNode> {
        debug_assert!(self.rest().starts_with("<![CDATA["));
        self.advance_by(9);
        let nodes = self.parse_children(TextMode::CData, ancestors);
        if self.rest().is_empty() {
            self.emit_at(ErrorCode::EofInCdata, 0);
        } else {
            self.advance_by(3);
        }
        nodes
    }

    // -----------------------------------------------------------------------
    // Elements
    // -----------------------------------------------------------------------

    fn parse_element(&mut self, ancestors: &mut Vec<ElementNode>) -> Option<TemplateChildNode> {
        let was_in_pre = self.in_pre;
        let was_in_v_pre = self.in_v_pre;
        let start = self.pos();

        let el = self.parse_tag(TagKind::Start, ancestors)?;
        let is_pre_boundary = self.in_pre && !was_in_pre;
        let is_v_pre_boundary = self.in_v_pre && !was_in_v_pre;

        if el.self_closing || (self.options.is_void_tag)(&el.tag) {
            if is_pre_boundary {
                self.in_pre = false;
            }
            if is_v_pre_boundary {
                self.in_v_pre = false;
            }
            return Some(TemplateChildNode::Element(Box::new(el)));
        }

        let mode = (self.options.get_text_mode)(&el, ancestors.last());
        ancestors.push(el);
        let children = self.parse_children(mode, ancestors);
        let mut el = match ancestors.pop() {
            Some(e) => e,
            None => unreachable!(),
        };
        el.children = children;

        if starts_with_end_tag_open(self.rest(), &el.tag) {
            let _ = self.parse_tag(TagKind::End, ancestors);
        } else {
            self.emit(
                ErrorCode::MissingEndTag,
                Some(SourceLocation::new(el.loc.start, el.loc.start, "")),
            );
        }

        el.loc = self.selection(start);

        // Per the HTML spec, a newline immediately inside a pre tag is dropped.
        if (self.options.is_pre_tag)(&el.tag) {
            if let Some(TemplateChildNode::Text(t)) = el.children.first_mut() {
                let stripped = t
                    .content
                    .strip_prefix("\r\n")
                    .or_else(|| t.content.strip_prefix('\n'));
                if let Some(rest) = stripped {
                    t.content = String::from(rest);
                }
                if t.content.is_empty() {
                    el.children.remove(0);
                }
            }
        }

        if is_pre_boundary {
            self.in_pre = false;
        }
        if is_v_pre_boundary {
            self.in_v_pre = false;
        }
        Some(TemplateChildNode::Element(Box::new(el)))
    }

    fn parse_tag(
        &mut self,
        kind: TagKind,
        ancestors: &[ElementNode],
    ) -> Option<ElementNode> {
        let start = self.pos();
        let s = self.rest();
        let prefix = if kind == TagKind::End { 2 } else { 1 };
        let name_len = s[prefix..]
            .find(is_tag_name_delimiter)
            .unwrap_or(s.len() - prefix);
        let tag = String::from(&s[prefix..prefix + name_len]);
        self.advance_by(prefix + name_len);
        self.advance_spaces();

        // v-pre requires re-reading the attributes as plain attributes.
        let cursor = (self.offset, self.line, self.column);
        let mut props = self.parse_attributes(kind);
        if kind == TagKind::Start
            && !self.in_v_pre
            && props
                .iter()
                .any(|p| matches!(p, PropNode::Directive(d) if d.name == "pre"))
        {
            self.in_v_pre = true;
            (self.offset, self.line, self.column) = cursor;
            props = self.parse_attributes(kind);
            props.retain(|p| !matches!(p, PropNode::Attribute(a) if a.name == "v-pre"));
        }

        if kind == TagKind::Start && (self.options.is_pre_tag)(&tag) {
            self.in_pre = true;
        }

        let mut self_closing = false;
        if self.rest().is_empty() {
            self.emit_at(ErrorCode::EofInTag, 0);
        } else {
            self_closing = self.rest().starts_with("/>");
            if kind == TagKind::End && self_closing {
                self.emit_at(ErrorCode::EndTagWithTrailingSolidus, 0);
            }
            self.advance_by(if self_closing { 2 } else { 1 });
        }

        if kind == TagKind::End {
            return None;
        }

        let ns = (self.options.get_namespace)(&tag, ancestors.last());
        let mut tag_type = ElementType::Element;
        if !self.in_v_pre {
            if tag == "slot" {
                tag_type = ElementType::Slot;
            } else if tag == "template" {
                let special = props.iter().any(|p| {
                    matches!(
                        p,
                        PropNode::Directive(d)
                            if matches!(
                                d.name.as_str(),
                                "if" | "else" | "else-if" | "for" | "slot"
                            )
                    )
                });
                if special {
                    tag_type = ElementType::Template;
                }
            } else if self.is_component(&tag, &props) {
                tag_type = ElementType::Component;
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        Some(ElementNode {
            id,
            tag,
            tag_type,
            ns,
            props,
            children: Vec::new(),
            self_closing,
            codegen_node: None,
            loc: self.selection(start),
        })
    }

    fn is_component(&self, tag: &str, props: &[PropNode]) -> bool {
        if (self.options.is_custom_element)(tag) {
            return false;
        }
        let builtin = self
            .options
            .is_builtin_component
            .map(|f| f(tag).is_some())
            .unwrap_or(false);
        if tag == "component"
            || tag.starts_with(|c: char| c.is_ascii_uppercase())
            || crate::utils::is_core_component(tag).is_some()
            || builtin
            || self.options.is_native_tag.map(|f| !f(tag)).unwrap_or(false)
        {
            return true;
        }
        // A native tag only upgrades through the `vue:` marker; a bare `is`
        // attribute stays a plain element.
        for p in props {
            if let PropNode::Attribute(attr) = p {
                if attr.name == "is" {
                    if let Some(value) = &attr.value {
                        if value.content.starts_with("vue:") {
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    // -----------------------------------------------------------------------
    // Attributes
    // -----------------------------------------------------------------------

    fn parse_attributes(&mut self, kind: TagKind) -> Vec<PropNode> {
        let mut props = Vec::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();

        loop {
            let s = self.rest();
            if s.is_empty() || s.starts_with('>') || s.starts_with("/>") {
                break;
            }
            if s.starts_with('/') {
                self.emit_at(ErrorCode::UnexpectedSolidusInTag, 0);
                self.advance_by(1);
                self.advance_spaces();
                continue;
            }
            if kind == TagKind::End {
                self.emit_at(ErrorCode::EndTagWithAttributes, 0);
            }

            let attr = self.parse_attribute(&mut seen);
            props.push(attr);

            let s = self.rest();
            if !s.is_empty() && !s.starts_with(|c: char| is_tag_name_delimiter(c)) {
                self.emit_at(ErrorCode::MissingWhitespaceBetweenAttributes, 0);
            }
            self.advance_spaces();
        }
        props
    }

    fn parse_attribute(&mut self, seen: &mut FxHashSet<String>) -> PropNode {
        let start = self.pos();
        let s = self.rest();
        debug_assert!(!s.is_empty());

        if s.starts_with('=') {
            self.emit_at(ErrorCode::UnexpectedEqualsSignBeforeAttributeName, 0);
        }
        // First char is always part of the name; `=` only delimits after it.
        let name_len = 1 + s[1..]
            .find(|c: char| is_tag_name_delimiter(c) || c == '=')
            .unwrap_or(s.len() - 1);
        let name = &s[..name_len];

        if seen.contains(name) {
            self.emit_at(ErrorCode::DuplicateAttribute, 0);
        }
        seen.insert(String::from(name));
        for (i, c) in name.char_indices() {
            if matches!(c, '"' | '\'' | '<') {
                self.emit_at(ErrorCode::UnexpectedCharacterInAttributeName, i);
            }
        }
        self.advance_by(name_len);

        let mut value: Option<(String, SourceLocation)> = None;
        {
            let after = self.rest();
            let ws = after
                .bytes()
                .take_while(|b| matches!(b, b'\t' | b'\r' | b'\n' | b'\x0C' | b' '))
                .count();
            if after[ws..].starts_with('=') {
                self.advance_spaces();
                self.advance_by(1);
                self.advance_spaces();
                value = self.parse_attribute_value();
                if value.is_none() {
                    self.emit_at(ErrorCode::MissingAttributeValue, 0);
                }
            }
        }
        let loc = self.selection(start);

        if !self.in_v_pre
            && (name.starts_with("v-") || name.starts_with([':', '.', '@', '#']))
        {
            return PropNode::Directive(self.build_directive(name, start, value, loc));
        }

        let value = value.map(|(content, value_loc)| {
            let content = if name == "class" {
                let condensed = condense_whitespace(&content);
                String::from(condensed.trim())
            } else {
                content
            };
            TextNode { content, loc: value_loc }
        });
        PropNode::Attribute(AttributeNode { name: String::from(name), value, loc })
    }

    /// Derive a directive node from a raw attribute name and value.
    fn build_directive(
        &mut self,
        raw_name: &str,
        name_start: Position,
        value: Option<(String, SourceLocation)>,
        loc: SourceLocation,
    ) -> DirectiveNode {
        let mut modifiers: SmallVec<[String; 4]> = SmallVec::new();
        let (dir_name, arg_and_mods, arg_offset_in_name) = match raw_name.as_bytes()[0] {
            b':' => ("bind", &raw_name[1..], 1),
            b'.' => {
                modifiers.push(String::from("prop"));
                ("bind", &raw_name[1..], 1)
            }
            b'@' => ("on", &raw_name[1..], 1),
            b'#' => ("slot", &raw_name[1..], 1),
            _ => {
                let after = &raw_name[2..];
                let end = after.find([':', '.']).unwrap_or(after.len());
                let dir = &after[..end];
                if dir.is_empty() {
                    self.emit(
                        ErrorCode::MissingDirectiveName,
                        Some(SourceLocation::new(name_start, name_start, "")),
                    );
                }
                let rest = &after[end..];
                if let Some(arg_part) = rest.strip_prefix(':') {
                    (dir, arg_part, 2 + end + 1)
                } else {
                    // No argument; what remains are `.modifier` segments.
                    (dir, rest, 2 + end)
                }
            }
        };

        // Split `arg[.mod]*`, keeping dots inside a dynamic `[...]` argument.
        let (arg_str, mods_str) = if arg_and_mods.starts_with('[') {
            match arg_and_mods.find(']') {
                Some(i) => (&arg_and_mods[..=i], &arg_and_mods[i + 1..]),
                None => (arg_and_mods, ""),
            }
        } else {
            let i = arg_and_mods.find('.').unwrap_or(arg_and_mods.len());
            (&arg_and_mods[..i], &arg_and_mods[i..])
        };
        for m in mods_str.split('.').filter(|m| !m.is_empty()) {
            modifiers.push(String::from(m));
        }

        let arg = if arg_str.is_empty() {
            None
        } else {
            let arg_start =
                advance_position(name_start, raw_name, arg_offset_in_name);
            let arg_end = advance_position(arg_start, arg_str, arg_str.len());
            let arg_loc = SourceLocation::new(arg_start, arg_end, arg_str);
            let (content, is_static) = if arg_str.starts_with('[') {
                let inner = arg_str
                    .strip_prefix('[')
                    .and_then(|a| a.strip_suffix(']'))
                    .unwrap_or(&arg_str[1..]);
                (String::from(inner), false)
            } else {
                (String::from(arg_str), true)
            };
            Some(SimpleExpressionNode::new(content, is_static, arg_loc).into_expr())
        };

        let exp = value.map(|(content, value_loc)| {
            SimpleExpressionNode::new(content, false, value_loc).into_expr()
        });

        DirectiveNode {
            name: String::from(dir_name),
            raw_name: String::from(raw_name),
            exp,
            arg,
            modifiers,
            loc,
        }
    }

    fn parse_attribute_value(&mut self) -> Option<(String, SourceLocation)> {
        let s = self.rest();
        let quote = s.chars().next()?;

        if quote == '"' || quote == '\'' {
            self.advance_by(1);
            let inner_start = self.pos();
            let inner = self.rest();
            match inner.find(quote) {
                Some(i) => {
                    let content = self.parse_text_data(i, TextMode::AttributeValue);
                    let loc = self.selection(inner_start);
                    self.advance_by(1);
                    Some((content, loc))
                }
                None => {
                    let len = inner.len();
                    let content = self.parse_text_data(len, TextMode::AttributeValue);
                    let loc = self.selection(inner_start);
                    Some((content, loc))
                }
            }
        } else {
            let start = self.pos();
            let end = s
                .find(|c: char| matches!(c, '\t' | '\r' | '\n' | '\x0C' | ' ' | '>'))
                .unwrap_or(s.len());
            if end == 0 {
                return None;
            }
            for (i, c) in s[..end].char_indices() {
                if matches!(c, '"' | '\'' | '<' | '=' | '`') {
                    self.emit_at(ErrorCode::UnexpectedCharacterInUnquotedAttributeValue, i);
                }
            }
            let content = self.parse_text_data(end, TextMode::AttributeValue);
            Some((content, self.selection(start)))
        }
    }
}
