//! Template parser.
//!
//! A recursive-descent parser over [`Cursor`]. Children are consumed until the
//! end condition of the current text mode holds; every malformed construct is
//! reported and recovered from with a best-effort node.

use once_cell::sync::Lazy;
use regex::Regex;
use tessera_arena::{Box, Bump, FxHashSet, String, Vec};
use tessera_ast::*;

use crate::cursor::{advance_position, is_whitespace, Cursor};

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^</?([a-zA-Z][^\t\r\n\x0c />]*)").expect("valid regex"));
static ATTR_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\t\r\n\x0c />][^\t\r\n\x0c />=]*").expect("valid regex"));
static DIR_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:v-[A-Za-z0-9-]|:|\.|@|#)").expect("valid regex"));
static DIR_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^v-([a-z0-9-]+))?(?:(?::|^\.|^@|^#)(\[[^\]]+\]|[^\.]+))?(.+)?$")
        .expect("valid regex")
});
static UNQUOTED_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\t\r\n\x0c >]+").expect("valid regex"));
static COMMENT_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"--(!)?>").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagType {
    Start,
    End,
}

/// Linked chain of open elements, innermost first.
struct Ancestors<'p, 'a> {
    element: &'p ElementNode<'a>,
    parent: Option<&'p Ancestors<'p, 'a>>,
}

impl<'p, 'a> Ancestors<'p, 'a> {
    fn iter(&self) -> impl Iterator<Item = &'p ElementNode<'a>> + '_ {
        let mut current = Some(self);
        std::iter::from_fn(move || {
            let node = current?;
            current = node.parent;
            Some(node.element)
        })
    }
}

/// Attribute value as scanned
struct AttributeValue {
    content: String,
    is_quoted: bool,
    loc: SourceLocation,
}

/// Template parser
pub struct Parser<'a> {
    allocator: &'a Bump,
    source: &'a str,
    options: ParserOptions,
    cursor: Cursor<'a>,
    errors: std::vec::Vec<CompilerError>,
    next_id: u32,
    in_pre: bool,
    in_v_pre: bool,
}

impl<'a> Parser<'a> {
    pub fn new(allocator: &'a Bump, source: &'a str) -> Self {
        Self::with_options(allocator, source, ParserOptions::default())
    }

    pub fn with_options(allocator: &'a Bump, source: &'a str, options: ParserOptions) -> Self {
        Self {
            allocator,
            source,
            options,
            cursor: Cursor::new(source),
            errors: std::vec::Vec::new(),
            next_id: 1,
            in_pre: false,
            in_v_pre: false,
        }
    }

    /// Parse the whole source into a root node.
    pub fn parse(mut self) -> (RootNode<'a>, std::vec::Vec<CompilerError>) {
        let start = self.cursor.position();
        let mut root = RootNode::new(self.allocator, self.source);
        root.children = self.parse_children(TextMode::Data, None);
        root.loc = self.cursor.selection(start, None);
        root.next_id = self.next_id;

        tracing::debug!(
            nodes = root.node_count(),
            errors = self.errors.len(),
            "template parsed"
        );
        (root, self.errors)
    }

    fn emit_error(&mut self, code: ErrorCode, offset: usize) {
        let start = advance_position(self.cursor.position(), self.cursor.rest(), offset);
        let loc = SourceLocation::new(start, start, "");
        self.report(CompilerError::new(code, Some(loc)));
    }

    fn emit_error_at(&mut self, code: ErrorCode, loc: SourceLocation) {
        self.report(CompilerError::new(code, Some(loc)));
    }

    fn report(&mut self, error: CompilerError) {
        if let Some(on_error) = self.options.on_error {
            on_error(&error);
        }
        self.errors.push(error);
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    // ========================================================================
    // Children
    // ========================================================================

    fn parse_children(
        &mut self,
        mode: TextMode,
        ancestors: Option<&Ancestors<'_, 'a>>,
    ) -> Vec<'a, TemplateChildNode<'a>> {
        let parent_ns = ancestors.map(|a| a.element.ns).unwrap_or(self.options.ns);
        let mut nodes: Vec<'a, TemplateChildNode<'a>> = Vec::new_in(self.allocator);

        while !self.is_end(mode, ancestors) {
            let rest = self.cursor.rest();
            let mut parsed: Option<TemplateChildNode<'a>> = None;

            if matches!(mode, TextMode::Data | TextMode::RcData) {
                if !self.in_v_pre && rest.starts_with(self.options.delimiters.0.as_str()) {
                    parsed = self.parse_interpolation(mode);
                } else if mode == TextMode::Data && rest.starts_with('<') {
                    let second = self.cursor.peek(1);
                    match second {
                        None => self.emit_error(ErrorCode::EofBeforeTagName, 1),
                        Some(b'!') => {
                            if rest.starts_with("<!--") {
                                parsed = Some(self.parse_comment());
                            } else if rest.starts_with("<!DOCTYPE") {
                                parsed = Some(self.parse_bogus_comment());
                            } else if rest.starts_with("<![CDATA[") {
                                if parent_ns != Namespace::Html {
                                    let cdata = self.parse_cdata(ancestors);
                                    for node in cdata {
                                        self.push_node(&mut nodes, node);
                                    }
                                    continue;
                                }
                                self.emit_error(ErrorCode::CDataInHtmlContent, 0);
                                parsed = Some(self.parse_bogus_comment());
                            } else {
                                self.emit_error(ErrorCode::IncorrectlyOpenedComment, 0);
                                parsed = Some(self.parse_bogus_comment());
                            }
                        }
                        Some(b'/') => match self.cursor.peek(2) {
                            None => self.emit_error(ErrorCode::EofBeforeTagName, 2),
                            Some(b'>') => {
                                self.emit_error(ErrorCode::MissingEndTagName, 2);
                                self.cursor.advance_by(3);
                                continue;
                            }
                            Some(c) if c.is_ascii_alphabetic() => {
                                let start = self.cursor.position();
                                self.parse_end_tag();
                                let loc = self.cursor.selection(start, None);
                                let error = CompilerError::with_detail(
                                    ErrorCode::InvalidEndTag,
                                    Some(loc.clone()),
                                    &loc.source,
                                );
                                self.report(error);
                                continue;
                            }
                            Some(_) => {
                                self.emit_error(ErrorCode::InvalidFirstCharacterOfTagName, 2);
                                parsed = Some(self.parse_bogus_comment());
                            }
                        },
                        Some(c) if c.is_ascii_alphabetic() => {
                            parsed = Some(self.parse_element(ancestors));
                        }
                        Some(b'?') => {
                            self.emit_error(ErrorCode::UnexpectedQuestionMarkInsteadOfTagName, 1);
                            parsed = Some(self.parse_bogus_comment());
                        }
                        Some(_) => self.emit_error(ErrorCode::InvalidFirstCharacterOfTagName, 1),
                    }
                }
            }

            let node = match parsed {
                Some(node) => node,
                None => self.parse_text(mode),
            };
            self.push_node(&mut nodes, node);
        }

        if !matches!(mode, TextMode::RawText | TextMode::RcData) {
            let parent_is_pre = ancestors
                .map(|a| self.in_pre && (self.options.is_pre_tag)(&a.element.tag))
                .unwrap_or(false);
            if self.in_pre {
                for node in nodes.iter_mut() {
                    if let TemplateChildNode::Text(text) = node {
                        if text.content.contains("\r\n") {
                            text.content = text.content.replace("\r\n", "\n").into();
                        }
                    }
                }
            } else {
                condense_whitespace(&mut nodes, self.options.whitespace);
            }
            if !self.options.comments {
                nodes.retain(|n| !matches!(n, TemplateChildNode::Comment(_)));
            }
            if parent_is_pre {
                // A newline right after `<pre>` is not content.
                if let Some(TemplateChildNode::Text(text)) = nodes.first_mut() {
                    let trimmed = text
                        .content
                        .strip_prefix("\r\n")
                        .or_else(|| text.content.strip_prefix('\n'))
                        .map(String::from);
                    if let Some(trimmed) = trimmed {
                        text.content = trimmed;
                    }
                }
            }
        }

        nodes
    }

    /// Append a node, merging it into a directly preceding text node.
    fn push_node(&self, nodes: &mut Vec<'a, TemplateChildNode<'a>>, node: TemplateChildNode<'a>) {
        if let TemplateChildNode::Text(text) = &node {
            if let Some(TemplateChildNode::Text(prev)) = nodes.last_mut() {
                if prev.loc.end.offset == text.loc.start.offset {
                    prev.content.push_str(&text.content);
                    prev.loc.end = text.loc.end;
                    prev.loc.source.push_str(&text.loc.source);
                    return;
                }
            }
        }
        nodes.push(node);
    }

    fn is_end(&self, mode: TextMode, ancestors: Option<&Ancestors<'_, 'a>>) -> bool {
        let rest = self.cursor.rest();
        match mode {
            TextMode::Data => {
                if rest.starts_with("</") {
                    if let Some(ancestors) = ancestors {
                        if ancestors
                            .iter()
                            .any(|el| starts_with_end_tag_open(rest, &el.tag))
                        {
                            return true;
                        }
                    }
                }
            }
            TextMode::RcData | TextMode::RawText => {
                if let Some(parent) = ancestors {
                    if starts_with_end_tag_open(rest, &parent.element.tag) {
                        return true;
                    }
                }
            }
            TextMode::CData => {
                if rest.starts_with("]]>") {
                    return true;
                }
            }
        }
        rest.is_empty()
    }

    // ========================================================================
    // Comments and CDATA
    // ========================================================================

    fn parse_comment(&mut self) -> TemplateChildNode<'a> {
        let start = self.cursor.position();
        let rest = self.cursor.rest();
        let content: String;

        match COMMENT_END_RE.captures(rest) {
            None => {
                content = rest.get(4..).unwrap_or("").into();
                self.cursor.advance_by(rest.len());
                self.emit_error(ErrorCode::EofInComment, 0);
            }
            Some(caps) => {
                let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
                let (close_index, close_end) = whole;
                if close_index <= 3 {
                    self.emit_error(ErrorCode::AbruptClosingOfEmptyComment, 0);
                }
                if caps.get(1).is_some() {
                    self.emit_error(ErrorCode::IncorrectlyClosedComment, 0);
                }
                content = rest.get(4..close_index).unwrap_or("").into();

                // Nested `<!--` inside the comment body
                let body = &rest[..close_index];
                let mut prev_index = 1;
                while let Some(found) = body[prev_index..].find("<!--") {
                    let nested_index = prev_index + found;
                    self.cursor.advance_by(nested_index - prev_index + 1);
                    if nested_index + 4 < body.len() {
                        self.emit_error(ErrorCode::NestedComment, 0);
                    }
                    prev_index = nested_index + 1;
                }
                self.cursor.advance_by(close_end - prev_index + 1);
            }
        }

        let loc = self.cursor.selection(start, None);
        TemplateChildNode::Comment(Box::new_in(CommentNode::new(content, loc), self.allocator))
    }

    /// `<!DOCTYPE>`, `<?xml ?>` and other markup declarations.
    fn parse_bogus_comment(&mut self) -> TemplateChildNode<'a> {
        let start = self.cursor.position();
        let rest = self.cursor.rest();
        let content_start = if self.cursor.peek(1) == Some(b'?') { 1 } else { 2 };
        let content: String = match rest.find('>') {
            Some(close) => {
                let content = rest.get(content_start..close).unwrap_or("").into();
                self.cursor.advance_by(close + 1);
                content
            }
            None => {
                let content = rest.get(content_start..).unwrap_or("").into();
                self.cursor.advance_by(rest.len());
                content
            }
        };
        let loc = self.cursor.selection(start, None);
        TemplateChildNode::Comment(Box::new_in(CommentNode::new(content, loc), self.allocator))
    }

    fn parse_cdata(
        &mut self,
        ancestors: Option<&Ancestors<'_, 'a>>,
    ) -> Vec<'a, TemplateChildNode<'a>> {
        self.cursor.advance_by("<![CDATA[".len());
        let nodes = self.parse_children(TextMode::CData, ancestors);
        if self.cursor.is_eof() {
            self.emit_error(ErrorCode::EofInCdata, 0);
        } else {
            self.cursor.advance_by(3);
        }
        nodes
    }

    // ========================================================================
    // Elements
    // ========================================================================

    fn parse_element(&mut self, ancestors: Option<&Ancestors<'_, 'a>>) -> TemplateChildNode<'a> {
        let was_in_pre = self.in_pre;
        let was_in_v_pre = self.in_v_pre;
        let parent = ancestors.map(|a| a.element);

        let mut element = self.parse_start_tag(parent);
        let is_pre_boundary = self.in_pre && !was_in_pre;
        let is_v_pre_boundary = self.in_v_pre && !was_in_v_pre;

        if element.is_self_closing || (self.options.is_void_tag)(&element.tag) {
            if is_pre_boundary {
                self.in_pre = false;
            }
            if is_v_pre_boundary {
                self.in_v_pre = false;
            }
            return TemplateChildNode::Element(Box::new_in(element, self.allocator));
        }

        let mode = (self.options.get_text_mode)(&element.tag, element.ns);
        let inner_start = self.cursor.position();
        let children = {
            let chain = Ancestors {
                element: &element,
                parent: ancestors,
            };
            self.parse_children(mode, Some(&chain))
        };
        element.children = children;
        element.inner_loc = Some(self.cursor.selection(inner_start, None));

        if starts_with_end_tag_open(self.cursor.rest(), &element.tag) {
            self.parse_end_tag();
        } else {
            let error = CompilerError::with_detail(
                ErrorCode::MissingEndTag,
                Some(element.loc.clone()),
                &format!("<{}>", element.tag),
            );
            self.report(error);
            if self.cursor.is_eof() && element.tag.eq_ignore_ascii_case("script") {
                if let Some(TemplateChildNode::Text(first)) = element.children.first() {
                    if first.loc.source.starts_with("<!--") {
                        self.emit_error(ErrorCode::EofInScriptHtmlCommentLikeText, 0);
                    }
                }
            }
        }

        element.loc = self.cursor.selection(element.loc.start, None);

        if is_pre_boundary {
            self.in_pre = false;
        }
        if is_v_pre_boundary {
            self.in_v_pre = false;
        }
        TemplateChildNode::Element(Box::new_in(element, self.allocator))
    }

    fn parse_start_tag(&mut self, parent: Option<&ElementNode<'a>>) -> ElementNode<'a> {
        let start = self.cursor.position();
        let rest = self.cursor.rest();
        let (matched_len, tag) = match TAG_RE.captures(rest) {
            Some(caps) => (
                caps.get(0).map(|m| m.len()).unwrap_or(1),
                caps.get(1).map(|m| m.as_str()).unwrap_or(""),
            ),
            None => (1, ""),
        };
        let ns = (self.options.get_namespace)(tag, parent, self.options.ns);
        let id = self.alloc_id();

        self.cursor.advance_by(matched_len);
        self.cursor.advance_spaces();

        let attr_start = self.cursor.position();
        if (self.options.is_pre_tag)(tag) {
            self.in_pre = true;
        }

        let mut props = self.parse_attributes(TagType::Start);

        if !self.in_v_pre
            && props
                .iter()
                .any(|p| matches!(p, PropNode::Directive(d) if d.name == "pre"))
        {
            // Re-scan the attributes literally.
            self.in_v_pre = true;
            self.cursor.reset(attr_start);
            props = self.parse_attributes(TagType::Start);
            props.retain(|p| !matches!(p, PropNode::Attribute(a) if a.name == "v-pre"));
        }

        let mut is_self_closing = false;
        if self.cursor.is_eof() {
            self.emit_error(ErrorCode::EofInTag, 0);
        } else {
            is_self_closing = self.cursor.starts_with("/>");
            self.cursor.advance_by(if is_self_closing { 2 } else { 1 });
        }

        let loc = self.cursor.selection(start, None);
        let mut element = ElementNode::new(self.allocator, id, tag, loc);
        element.ns = ns;
        element.props = props;
        element.is_self_closing = is_self_closing;
        if !self.in_v_pre {
            element.tag_type = self.resolve_tag_type(&element);
        }
        element
    }

    fn parse_end_tag(&mut self) {
        let rest = self.cursor.rest();
        let matched_len = TAG_RE
            .find(rest)
            .map(|m| m.len())
            .unwrap_or(2);
        self.cursor.advance_by(matched_len);
        self.cursor.advance_spaces();

        // Attributes on end tags are reported and discarded.
        let _ = self.parse_attributes(TagType::End);

        if self.cursor.is_eof() {
            self.emit_error(ErrorCode::EofInTag, 0);
        } else {
            let self_closing = self.cursor.starts_with("/>");
            if self_closing {
                self.emit_error(ErrorCode::EndTagWithTrailingSolidus, 0);
            }
            self.cursor.advance_by(if self_closing { 2 } else { 1 });
        }
    }

    fn resolve_tag_type(&self, element: &ElementNode<'a>) -> ElementType {
        let tag = element.tag.as_str();
        if tag == "slot" {
            return ElementType::Slot;
        }
        if tag == "template"
            && element.props.iter().any(|p| {
                matches!(p, PropNode::Directive(d)
                    if matches!(d.name.as_str(), "if" | "else" | "else-if" | "for" | "slot"))
            })
        {
            return ElementType::Template;
        }
        if self.is_component(tag, element) {
            return ElementType::Component;
        }
        ElementType::Element
    }

    fn is_component(&self, tag: &str, element: &ElementNode<'a>) -> bool {
        if let Some(is_custom) = self.options.is_custom_element {
            if is_custom(tag) {
                return false;
            }
        }
        if tag == "component"
            || tag.starts_with(|c: char| c.is_ascii_uppercase())
            || RuntimeHelper::from_builtin_component(tag).is_some()
            || self
                .options
                .is_built_in_component
                .is_some_and(|f| f(tag).is_some())
            || self.options.is_native_tag.is_some_and(|f| !f(tag))
        {
            return true;
        }
        element.props.iter().any(|p| match p {
            PropNode::Attribute(attr) => {
                attr.name == "is"
                    && attr
                        .value
                        .as_ref()
                        .is_some_and(|v| v.content.starts_with("vue:"))
            }
            PropNode::Directive(_) => false,
        })
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    fn parse_attributes(&mut self, tag_type: TagType) -> Vec<'a, PropNode<'a>> {
        let mut props = Vec::new_in(self.allocator);
        let mut names: FxHashSet<String> = FxHashSet::default();

        while !self.cursor.is_eof() && !self.cursor.starts_with(">") && !self.cursor.starts_with("/>")
        {
            if self.cursor.starts_with("/") {
                self.emit_error(ErrorCode::UnexpectedSolidusInTag, 0);
                self.cursor.advance_by(1);
                self.cursor.advance_spaces();
                continue;
            }
            if tag_type == TagType::End {
                self.emit_error(ErrorCode::EndTagWithAttributes, 0);
            }

            let prop = self.parse_attribute(&mut names);
            if tag_type == TagType::Start {
                props.push(prop);
            }

            if self.cursor.peek(0).is_some_and(|b| !is_whitespace(b) && b != b'/' && b != b'>') {
                self.emit_error(ErrorCode::MissingWhitespaceBetweenAttributes, 0);
            }
            self.cursor.advance_spaces();
        }
        props
    }

    fn parse_attribute(&mut self, names: &mut FxHashSet<String>) -> PropNode<'a> {
        let start = self.cursor.position();
        let rest = self.cursor.rest();
        let name: &'a str = match ATTR_NAME_RE.find(rest) {
            Some(m) => m.as_str(),
            None => &rest[..rest.chars().next().map(char::len_utf8).unwrap_or(0)],
        };

        if !names.insert(String::from(name)) {
            self.emit_error(ErrorCode::DuplicateAttribute, 0);
        }
        if name.starts_with('=') {
            self.emit_error(ErrorCode::UnexpectedEqualsSignBeforeAttributeName, 0);
        }
        for (i, _) in name.match_indices(['"', '\'', '<']) {
            self.emit_error(ErrorCode::UnexpectedCharacterInAttributeName, i);
        }
        self.cursor.advance_by(name.len());

        let mut value = None;
        let has_value = self
            .cursor
            .rest()
            .trim_start_matches(['\t', '\r', '\n', '\x0c', ' '])
            .starts_with('=');
        if has_value {
            self.cursor.advance_spaces();
            self.cursor.advance_by(1);
            self.cursor.advance_spaces();
            value = self.parse_attribute_value();
            if value.is_none() {
                self.emit_error(ErrorCode::MissingAttributeValue, 0);
            }
        }
        let loc = self.cursor.selection(start, None);

        if !self.in_v_pre && DIR_PREFIX_RE.is_match(name) {
            return PropNode::Directive(Box::new_in(
                self.build_directive(name, start, value, loc),
                self.allocator,
            ));
        }

        if !self.in_v_pre && name.starts_with("v-") {
            self.emit_error_at(ErrorCode::MissingDirectiveName, loc.clone());
        }

        let mut attr = AttributeNode::new(name, loc);
        attr.name_loc = self.cursor.selection(
            start,
            Some(advance_position(start, name, name.len())),
        );
        attr.value = value.map(|v| {
            let mut content = v.content;
            if name == "class" {
                content = content.split_ascii_whitespace().collect::<std::vec::Vec<_>>().join(" ").into();
            }
            TextNode::new(content, v.loc)
        });
        PropNode::Attribute(Box::new_in(attr, self.allocator))
    }

    /// Decompose `v-name:arg.mod`, `:arg`, `@arg`, `#arg` and `.prop` names.
    fn build_directive(
        &mut self,
        name: &'a str,
        start: Position,
        value: Option<AttributeValue>,
        loc: SourceLocation,
    ) -> DirectiveNode<'a> {
        let caps = DIR_NAME_RE.captures(name);
        let group = |i: usize| caps.as_ref().and_then(|c| c.get(i)).map(|m| m.as_str());
        let is_prop_shorthand = name.starts_with('.');

        let dir_name = match group(1) {
            Some(n) => n,
            None if is_prop_shorthand || name.starts_with(':') => "bind",
            None if name.starts_with('@') => "on",
            None => "slot",
        };

        let mut dir = DirectiveNode::new(self.allocator, dir_name, loc);
        dir.raw_name = name.into();

        // a tail not starting with `.` (e.g. after `[arg]`) carries no modifiers
        let modifiers_text = group(3).filter(|m| m.starts_with('.'));
        if let Some(arg_text) = group(2) {
            let is_slot = dir_name == "slot";
            let tail_len = modifiers_text.map(str::len).unwrap_or(0);
            let search_end = name.len() - tail_len;
            let arg_offset = name[..search_end].rfind(arg_text).unwrap_or(0);
            let arg_len = arg_text.len() + if is_slot { tail_len } else { 0 };
            let arg_start = advance_position(start, name, arg_offset);
            let arg_end = advance_position(start, name, arg_offset + arg_len);
            let arg_loc = self.cursor.selection(arg_start, Some(arg_end));

            let mut content = String::from(arg_text);
            let mut is_static = true;
            if let Some(inner) = arg_text.strip_prefix('[') {
                is_static = false;
                content = match inner.strip_suffix(']') {
                    Some(inner) => inner.into(),
                    None => {
                        self.emit_error_at(
                            ErrorCode::MissingDynamicDirectiveArgumentEnd,
                            arg_loc.clone(),
                        );
                        inner.into()
                    }
                };
            } else if is_slot {
                content.push_str(modifiers_text.unwrap_or(""));
            }
            dir.arg = Some(ExpressionNode::Simple(SimpleExpressionNode::new(
                content, is_static, arg_loc,
            )));
        }

        if let Some(value) = value {
            let mut value_loc = value.loc;
            if value.is_quoted {
                // Strip the quotes from the expression location.
                let inner_start = advance_position(value_loc.start, &value_loc.source, 1);
                let inner_source = value_loc
                    .source
                    .get(1..value_loc.source.len().saturating_sub(1))
                    .unwrap_or("")
                    .to_string();
                let inner_end = advance_position(inner_start, &inner_source, inner_source.len());
                value_loc = SourceLocation::new(inner_start, inner_end, inner_source);
            }
            dir.exp = Some(ExpressionNode::Simple(SimpleExpressionNode::new(
                value.content,
                false,
                value_loc,
            )));
        }

        if let Some(mods) = modifiers_text.and_then(|m| m.strip_prefix('.')) {
            let mut offset = name.len() - mods.len() - 1;
            for modifier in mods.split('.') {
                offset += 1;
                let mod_start = advance_position(start, name, offset);
                let mod_end = advance_position(start, name, offset + modifier.len());
                dir.modifiers.push(SimpleExpressionNode::new(
                    modifier,
                    true,
                    self.cursor.selection(mod_start, Some(mod_end)),
                ));
                offset += modifier.len();
            }
        }
        if is_prop_shorthand {
            dir.modifiers
                .push(SimpleExpressionNode::new("prop", true, SourceLocation::STUB));
        }
        dir
    }

    fn parse_attribute_value(&mut self) -> Option<AttributeValue> {
        let start = self.cursor.position();
        let quote = self.cursor.peek(0)?;
        let is_quoted = quote == b'"' || quote == b'\'';

        let content = if is_quoted {
            self.cursor.advance_by(1);
            let rest = self.cursor.rest();
            match memchr::memchr(quote, rest.as_bytes()) {
                Some(end) => {
                    let content = self.parse_text_data(end, TextMode::Data, true);
                    self.cursor.advance_by(1);
                    content
                }
                None => self.parse_text_data(rest.len(), TextMode::Data, true),
            }
        } else {
            let matched = UNQUOTED_VALUE_RE.find(self.cursor.rest())?.as_str();
            for (i, _) in matched.match_indices(['"', '\'', '<', '=', '`']) {
                self.emit_error(ErrorCode::UnexpectedCharacterInUnquotedAttributeValue, i);
            }
            self.parse_text_data(matched.len(), TextMode::Data, true)
        };

        Some(AttributeValue {
            content,
            is_quoted,
            loc: self.cursor.selection(start, None),
        })
    }

    // ========================================================================
    // Text and interpolation
    // ========================================================================

    fn parse_interpolation(&mut self, mode: TextMode) -> Option<TemplateChildNode<'a>> {
        let open_len = self.options.delimiters.0.len();
        let close = self.options.delimiters.1.clone();
        let rest = self.cursor.rest();
        let close_index = match rest.get(open_len..).and_then(|s| s.find(close.as_str())) {
            Some(i) => i + open_len,
            None => {
                self.emit_error(ErrorCode::MissingInterpolationEnd, 0);
                return None;
            }
        };

        let start = self.cursor.position();
        self.cursor.advance_by(open_len);
        let inner_base = self.cursor.position();
        let raw_len = close_index - open_len;
        let raw = &rest[open_len..close_index];

        let decoded = self.parse_text_data(raw_len, mode, false);
        let content = decoded.trim();
        let start_offset = raw.len() - raw.trim_start().len();
        let end_offset = raw.trim_end().len().max(start_offset);

        let inner_start = advance_position(inner_base, raw, start_offset);
        let inner_end = advance_position(inner_base, raw, end_offset);
        self.cursor.advance_by(close.len());

        let inner_loc = self.cursor.selection(inner_start, Some(inner_end));
        let exp = SimpleExpressionNode::new(content, false, inner_loc);
        let loc = self.cursor.selection(start, None);
        Some(TemplateChildNode::Interpolation(Box::new_in(
            InterpolationNode {
                content: ExpressionNode::Simple(exp),
                loc,
            },
            self.allocator,
        )))
    }

    fn parse_text(&mut self, mode: TextMode) -> TemplateChildNode<'a> {
        let rest = self.cursor.rest();
        let first_len = rest.chars().next().map(char::len_utf8).unwrap_or(0);

        let mut end = rest.len();
        let mut consider = |token: &str| {
            if token.is_empty() {
                return;
            }
            if let Some(i) = rest.get(first_len..).and_then(|s| s.find(token)) {
                end = end.min(i + first_len);
            }
        };
        if mode == TextMode::CData {
            consider("]]>");
        } else {
            consider("<");
            consider(self.options.delimiters.0.as_str());
        }

        let start = self.cursor.position();
        let content = self.parse_text_data(end, mode, false);
        let loc = self.cursor.selection(start, None);
        TemplateChildNode::Text(Box::new_in(TextNode::new(content, loc), self.allocator))
    }

    /// Consume `len` bytes of text, decoding character references where the
    /// mode allows it.
    fn parse_text_data(&mut self, len: usize, mode: TextMode, in_attribute: bool) -> String {
        let raw = &self.cursor.rest()[..len];
        self.cursor.advance_by(len);
        if matches!(mode, TextMode::RawText | TextMode::CData) || !raw.contains('&') {
            return raw.into();
        }
        match self.options.decode_entities {
            Some(decode) => decode(raw, in_attribute),
            None if in_attribute => htmlize::unescape_attribute(raw).as_ref().into(),
            None => htmlize::unescape(raw).as_ref().into(),
        }
    }
}

/// Whether `source` starts with `</tag` followed by a tag-section terminator.
fn starts_with_end_tag_open(source: &str, tag: &str) -> bool {
    let bytes = source.as_bytes();
    let end = 2 + tag.len();
    source.starts_with("</")
        && bytes.len() >= end
        && bytes[2..end].eq_ignore_ascii_case(tag.as_bytes())
        && bytes
            .get(end)
            .map_or(true, |b| is_whitespace(*b) || *b == b'/' || *b == b'>')
}

/// Remove or collapse insignificant whitespace in one children list.
///
/// Whitespace-only text is removed at the start and end of the list, next to
/// comments, and between two elements when it contains a newline. Remaining
/// whitespace-only text becomes one space and other text has whitespace runs
/// collapsed. `Preserve` leaves the list untouched.
pub fn condense_whitespace<'a>(
    nodes: &mut Vec<'a, TemplateChildNode<'a>>,
    strategy: WhitespaceStrategy,
) {
    if strategy == WhitespaceStrategy::Preserve {
        return;
    }
    let mut removed = std::vec::Vec::<bool>::with_capacity(nodes.len());

    for i in 0..nodes.len() {
        let prev = if i > 0 && !removed[i - 1] {
            nodes.get(i - 1)
        } else {
            None
        };
        let next = nodes.get(i + 1);

        let mut remove = false;
        let mut replacement = None;
        if let TemplateChildNode::Text(text) = &nodes[i] {
            if text.content.bytes().all(is_whitespace) {
                remove = prev.is_none()
                    || next.is_none()
                    || (is_comment(prev) && (is_comment(next) || is_element(next)))
                    || (is_element(prev) && is_comment(next))
                    || (is_element(prev)
                        && is_element(next)
                        && text.content.contains(['\r', '\n']));
                if !remove {
                    replacement = Some(String::const_new(" "));
                }
            } else {
                let collapsed = collapse_whitespace(&text.content);
                if collapsed != text.content {
                    replacement = Some(collapsed);
                }
            }
        }

        if let Some(content) = replacement {
            if let TemplateChildNode::Text(text) = &mut nodes[i] {
                text.content = content;
            }
        }
        removed.push(remove);
    }

    if removed.iter().any(|r| *r) {
        let mut index = 0;
        nodes.retain(|_| {
            let keep = !removed[index];
            index += 1;
            keep
        });
    }
}

fn is_comment(node: Option<&TemplateChildNode<'_>>) -> bool {
    matches!(node, Some(TemplateChildNode::Comment(_)))
}

fn is_element(node: Option<&TemplateChildNode<'_>>) -> bool {
    matches!(node, Some(TemplateChildNode::Element(_)))
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Parse a template with default options.
pub fn parse<'a>(allocator: &'a Bump, source: &'a str) -> (RootNode<'a>, std::vec::Vec<CompilerError>) {
    Parser::new(allocator, source).parse()
}

/// Parse a template with options.
pub fn parse_with_options<'a>(
    allocator: &'a Bump,
    source: &'a str,
    options: ParserOptions,
) -> (RootNode<'a>, std::vec::Vec<CompilerError>) {
    Parser::with_options(allocator, source, options).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element<'a, 'r>(root: &'r RootNode<'a>) -> &'r ElementNode<'a> {
        match &root.children[0] {
            TemplateChildNode::Element(el) => el,
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_element() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<div></div>");

        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 1);
        let el = first_element(&root);
        assert_eq!(el.tag.as_str(), "div");
        assert!(!el.is_self_closing);
        assert_eq!(el.loc.source, "<div></div>");
        assert_eq!(el.id, NodeId(1));
        assert_eq!(root.next_id, 2);
    }

    #[test]
    fn test_parse_text_with_entities() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "a &amp; b &lt;c&gt;");

        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 1);
        match &root.children[0] {
            TemplateChildNode::Text(text) => assert_eq!(text.content.as_str(), "a & b <c>"),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn test_parse_interpolation_location() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "{{  msg }}");

        assert!(errors.is_empty());
        match &root.children[0] {
            TemplateChildNode::Interpolation(interp) => {
                let exp = interp.content.as_simple().unwrap();
                assert_eq!(exp.content.as_str(), "msg");
                assert_eq!(exp.loc.start.offset, 4);
                assert_eq!(exp.loc.end.offset, 7);
                assert_eq!(exp.loc.source, "msg");
                assert_eq!(interp.loc.source, "{{  msg }}");
            }
            _ => panic!("expected interpolation"),
        }
    }

    #[test]
    fn test_custom_delimiters() {
        let allocator = Bump::new();
        let options = ParserOptions {
            delimiters: ("${".into(), "}".into()),
            ..Default::default()
        };
        let (root, errors) = parse_with_options(&allocator, "<p>${ a }</p>", options);
        assert!(errors.is_empty());
        let el = first_element(&root);
        assert!(matches!(el.children[0], TemplateChildNode::Interpolation(_)));
    }

    #[test]
    fn test_missing_interpolation_end() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "{{ foo");
        assert_eq!(errors[0].code, ErrorCode::MissingInterpolationEnd.code());
        assert!(matches!(root.children[0], TemplateChildNode::Text(_)));
    }

    #[test]
    fn test_parse_directive_decomposition() {
        let allocator = Bump::new();
        let (root, errors) =
            parse(&allocator, r#"<div v-on:click.stop.prevent="h" :[key]="v" #item.name></div>"#);
        assert!(errors.is_empty());
        let el = first_element(&root);

        let on = el.props[0].as_directive().unwrap();
        assert_eq!(on.name.as_str(), "on");
        assert_eq!(on.static_arg(), Some("click"));
        let mods: std::vec::Vec<_> = on.modifiers.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(mods, ["stop", "prevent"]);
        assert_eq!(on.exp.as_ref().unwrap().loc().source, "h");

        let bind = el.props[1].as_directive().unwrap();
        assert_eq!(bind.name.as_str(), "bind");
        let arg = bind.arg.as_ref().unwrap().as_simple().unwrap();
        assert_eq!(arg.content.as_str(), "key");
        assert!(!arg.is_static);

        let slot = el.props[2].as_directive().unwrap();
        assert_eq!(slot.name.as_str(), "slot");
        assert_eq!(slot.static_arg(), Some("item.name"));
    }

    #[test]
    fn test_non_ascii_directive_tail() {
        let allocator = Bump::new();
        let (root, _) = parse(&allocator, "<div v-onceé :[k]é=\"v\" @clické.ß></div>");
        let el = first_element(&root);

        let once = el.props[0].as_directive().unwrap();
        assert_eq!(once.name.as_str(), "once");
        assert!(once.modifiers.is_empty());

        let bind = el.props[1].as_directive().unwrap();
        assert_eq!(bind.name.as_str(), "bind");
        assert!(bind.modifiers.is_empty());

        let on = el.props[2].as_directive().unwrap();
        assert_eq!(on.static_arg(), Some("clické"));
        let mods: std::vec::Vec<_> = on.modifiers.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(mods, ["ß"]);
        assert_eq!(on.modifiers[0].loc.source, "ß");
    }

    #[test]
    fn test_prop_shorthand() {
        let allocator = Bump::new();
        let (root, _) = parse(&allocator, r#"<div .inner-text="t"></div>"#);
        let dir = first_element(&root).props[0].as_directive().unwrap();
        assert_eq!(dir.name.as_str(), "bind");
        assert!(dir.has_modifier("prop"));
    }

    #[test]
    fn test_missing_dynamic_argument_end() {
        let allocator = Bump::new();
        let (_, errors) = parse(&allocator, r#"<div v-bind:[foo="x"></div>"#);
        assert!(errors
            .iter()
            .any(|e| e.code == ErrorCode::MissingDynamicDirectiveArgumentEnd.code()));
    }

    #[test]
    fn test_missing_directive_name() {
        let allocator = Bump::new();
        let (_, errors) = parse(&allocator, r#"<div v-="x"></div>"#);
        assert!(errors.iter().any(|e| e.code == ErrorCode::MissingDirectiveName.code()));
    }

    #[test]
    fn test_duplicate_attribute() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<div id="a" id="b"></div>"#);
        assert_eq!(first_element(&root).props.len(), 2);
        assert_eq!(errors[0].code, ErrorCode::DuplicateAttribute.code());
    }

    #[test]
    fn test_empty_quoted_attribute() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<img alt="" disabled />"#);
        assert!(errors.is_empty());
        let el = first_element(&root);
        match &el.props[0] {
            PropNode::Attribute(attr) => assert_eq!(attr.value.as_ref().unwrap().content, ""),
            _ => panic!("expected attribute"),
        }
        match &el.props[1] {
            PropNode::Attribute(attr) => assert!(attr.value.is_none()),
            _ => panic!("expected attribute"),
        }
    }

    #[test]
    fn test_class_value_is_normalized() {
        let allocator = Bump::new();
        let (root, _) = parse(&allocator, "<div class=\"  a\n   b \"></div>");
        match &first_element(&root).props[0] {
            PropNode::Attribute(attr) => assert_eq!(attr.value.as_ref().unwrap().content, "a b"),
            _ => panic!("expected attribute"),
        }
    }

    #[test]
    fn test_unquoted_value_errors() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<div id=a\"b></div>");
        assert!(errors
            .iter()
            .any(|e| e.code == ErrorCode::UnexpectedCharacterInUnquotedAttributeValue.code()));
        assert_eq!(first_element(&root).children.len(), 0);
    }

    #[test]
    fn test_comments() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<!-- hello -->");
        assert!(errors.is_empty());
        match &root.children[0] {
            TemplateChildNode::Comment(c) => assert_eq!(c.content, " hello "),
            _ => panic!("expected comment"),
        }

        let options = ParserOptions {
            comments: false,
            ..Default::default()
        };
        let (root, _) = parse_with_options(&allocator, "<div><!-- x --></div>", options);
        assert!(first_element(&root).children.is_empty());
    }

    #[test]
    fn test_comment_errors() {
        let allocator = Bump::new();
        let (_, errors) = parse(&allocator, "<!-->");
        assert_eq!(errors[0].code, ErrorCode::AbruptClosingOfEmptyComment.code());

        let (_, errors) = parse(&allocator, "<!-- a --!>");
        assert_eq!(errors[0].code, ErrorCode::IncorrectlyClosedComment.code());

        let (_, errors) = parse(&allocator, "<!-- a <!-- b -->");
        assert_eq!(errors[0].code, ErrorCode::NestedComment.code());

        let (_, errors) = parse(&allocator, "<!-- a");
        assert_eq!(errors[0].code, ErrorCode::EofInComment.code());
    }

    #[test]
    fn test_bogus_comments() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<!DOCTYPE html><?xml version?>");
        assert_eq!(root.children.len(), 2);
        assert_eq!(
            errors[0].code,
            ErrorCode::UnexpectedQuestionMarkInsteadOfTagName.code()
        );
        match &root.children[0] {
            TemplateChildNode::Comment(c) => assert_eq!(c.content, "DOCTYPE html"),
            _ => panic!("expected comment"),
        }
    }

    #[test]
    fn test_cdata_in_html_is_reported() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<div><![CDATA[x]]></div>");
        assert_eq!(errors[0].code, ErrorCode::CDataInHtmlContent.code());
        assert!(matches!(
            first_element(&root).children[0],
            TemplateChildNode::Comment(_)
        ));
    }

    #[test]
    fn test_cdata_in_foreign_content() {
        let allocator = Bump::new();
        let options = ParserOptions {
            get_namespace: |tag, parent, root| {
                if tag == "svg" {
                    Namespace::Svg
                } else {
                    parent.map(|p| p.ns).unwrap_or(root)
                }
            },
            ..Default::default()
        };
        let (root, errors) = parse_with_options(&allocator, "<svg><![CDATA[a<b]]></svg>", options);
        assert!(errors.is_empty());
        match &first_element(&root).children[0] {
            TemplateChildNode::Text(t) => assert_eq!(t.content, "a<b"),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn test_missing_end_tag() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<div><span></div>");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::MissingEndTag.code());
        let div = first_element(&root);
        assert_eq!(div.children.len(), 1);
    }

    #[test]
    fn test_invalid_end_tag() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<div></span></div>");
        assert_eq!(errors[0].code, ErrorCode::InvalidEndTag.code());
        assert!(first_element(&root).children.is_empty());
    }

    #[test]
    fn test_eof_in_tag() {
        let allocator = Bump::new();
        let (_, errors) = parse(&allocator, "<div id=\"a\"");
        assert!(errors.iter().any(|e| e.code == ErrorCode::EofInTag.code()));
    }

    #[test]
    fn test_void_and_self_closing() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<input><br/><Comp />");
        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 3);
        match &root.children[2] {
            TemplateChildNode::Element(el) => {
                assert!(el.is_self_closing);
                assert_eq!(el.tag_type, ElementType::Component);
            }
            _ => panic!("expected element"),
        }
    }

    #[test]
    fn test_tag_types() {
        let allocator = Bump::new();
        let (root, _) = parse(
            &allocator,
            r#"<slot/><template v-if="a"></template><template></template><component is="x"/><div is="vue:foo"/><keep-alive/>"#,
        );
        let types: std::vec::Vec<_> = root
            .children
            .iter()
            .filter_map(|c| c.as_element().map(|e| e.tag_type))
            .collect();
        assert_eq!(
            types,
            [
                ElementType::Slot,
                ElementType::Template,
                ElementType::Element,
                ElementType::Component,
                ElementType::Component,
                ElementType::Component,
            ]
        );
    }

    #[test]
    fn test_v_pre_keeps_content_literal() {
        let allocator = Bump::new();
        let (root, errors) = parse(
            &allocator,
            r#"<div v-pre :id="foo"><span @click="x">{{ raw }}</span></div><p>{{ a }}</p>"#,
        );
        assert!(errors.is_empty());
        let div = first_element(&root);
        assert_eq!(div.props.len(), 1);
        match &div.props[0] {
            PropNode::Attribute(attr) => assert_eq!(attr.name, ":id"),
            _ => panic!("expected literal attribute"),
        }
        let span = div.children[0].as_element().unwrap();
        assert!(matches!(span.props[0], PropNode::Attribute(_)));
        match &span.children[0] {
            TemplateChildNode::Text(t) => assert_eq!(t.content, "{{ raw }}"),
            _ => panic!("expected text"),
        }
        // v-pre ends with its element
        let p = root.children[1].as_element().unwrap();
        assert!(matches!(p.children[0], TemplateChildNode::Interpolation(_)));
    }

    #[test]
    fn test_pre_keeps_whitespace() {
        let allocator = Bump::new();
        let options = ParserOptions {
            is_pre_tag: |tag| tag == "pre",
            ..Default::default()
        };
        let (root, _) = parse_with_options(&allocator, "<pre>\n  a\n  b  </pre>", options);
        match &first_element(&root).children[0] {
            TemplateChildNode::Text(t) => assert_eq!(t.content, "  a\n  b  "),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn test_text_modes() {
        let allocator = Bump::new();
        let options = ParserOptions {
            get_text_mode: |tag, _| match tag {
                "textarea" => TextMode::RcData,
                "script" => TextMode::RawText,
                _ => TextMode::Data,
            },
            ..Default::default()
        };
        let (root, errors) = parse_with_options(
            &allocator,
            "<textarea><b>&amp;</b></textarea><script>a &amp; <b></script>",
            options,
        );
        assert!(errors.is_empty());
        match &root.children[0].as_element().unwrap().children[0] {
            TemplateChildNode::Text(t) => assert_eq!(t.content, "<b>&</b>"),
            _ => panic!("expected text"),
        }
        match &root.children[1].as_element().unwrap().children[0] {
            TemplateChildNode::Text(t) => assert_eq!(t.content, "a &amp; <b>"),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn test_whitespace_condense() {
        let allocator = Bump::new();
        let (root, _) = parse(
            &allocator,
            "<div>\n  <span>a   b</span>\n  <span></span> <i/>\n  <!-- c -->\n</div>",
        );
        let div = first_element(&root);
        // span, span, " ", i, comment
        assert_eq!(div.children.len(), 5);
        match &div.children[2] {
            TemplateChildNode::Text(t) => assert_eq!(t.content, " "),
            _ => panic!("expected condensed space"),
        }
        match &div.children[0].as_element().unwrap().children[0] {
            TemplateChildNode::Text(t) => assert_eq!(t.content, "a b"),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn test_whitespace_preserve() {
        let allocator = Bump::new();
        let options = ParserOptions {
            whitespace: WhitespaceStrategy::Preserve,
            ..Default::default()
        };
        let (root, _) = parse_with_options(&allocator, "<div>\n  <span/>\n</div>", options);
        assert_eq!(first_element(&root).children.len(), 3);
    }

    #[test]
    fn test_condense_is_idempotent() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, "  a  <b/> <c/>\n<d/>  {{ x }}  ");
        let before: std::vec::Vec<_> = root
            .children
            .iter()
            .map(|c| format!("{:?}", c.loc().source))
            .collect();
        let texts = |root: &RootNode<'_>| -> std::vec::Vec<std::string::String> {
            root.children
                .iter()
                .map(|c| match c {
                    TemplateChildNode::Text(t) => t.content.to_string(),
                    other => format!("<{}>", other.loc().source),
                })
                .collect()
        };
        let first = texts(&root);
        condense_whitespace(&mut root.children, WhitespaceStrategy::Condense);
        assert_eq!(texts(&root), first);
        assert_eq!(before.len(), root.children.len());
    }

    #[test]
    fn test_adjacent_text_merged() {
        let allocator = Bump::new();
        let (root, _) = parse(&allocator, "a < b");
        assert_eq!(root.children.len(), 1);
        match &root.children[0] {
            TemplateChildNode::Text(t) => assert_eq!(t.content, "a < b"),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn test_namespace_resolution() {
        let allocator = Bump::new();
        let options = ParserOptions {
            get_namespace: |tag, parent, root| match (tag, parent.map(|p| p.ns)) {
                ("svg", _) => Namespace::Svg,
                (_, Some(ns)) => ns,
                _ => root,
            },
            ..Default::default()
        };
        let (root, _) = parse_with_options(&allocator, "<svg><circle/></svg>", options);
        let svg = first_element(&root);
        assert_eq!(svg.ns, Namespace::Svg);
        assert_eq!(svg.children[0].as_element().unwrap().ns, Namespace::Svg);
    }

    #[test]
    fn test_locations_span_lines() {
        let allocator = Bump::new();
        let (root, _) = parse(&allocator, "<div>\n  <p>x</p>\n</div>");
        let p = first_element(&root).children[0].as_element().unwrap();
        assert_eq!(p.loc.start.line, 2);
        assert_eq!(p.loc.start.column, 3);
        assert_eq!(p.loc.source, "<p>x</p>");
    }
}
