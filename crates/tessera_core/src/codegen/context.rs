//! Code generation context.

use tessera_ast::{CodegenOptions, RuntimeHelper, SourceLocation};

use super::node_index::NodeIndex;
use super::source_map::{Mapping, SourceMapBuilder};

pub(super) const PURE_ANNOTATION: &str = "/*#__PURE__*/";

/// Output buffer with indentation and position tracking
pub struct CodegenContext<'g, 'a> {
    pub(super) options: &'g CodegenOptions,
    pub(super) index: &'g NodeIndex<'g, 'a>,
    code: String,
    indent_level: u32,
    /// Zero based position of the next byte written
    line: u32,
    column: u32,
    /// Prefix calls with a pure annotation (hoisted initializers)
    pub(super) pure: bool,
    pub(super) map: Option<SourceMapBuilder>,
}

impl<'g, 'a> CodegenContext<'g, 'a> {
    pub fn new(options: &'g CodegenOptions, index: &'g NodeIndex<'g, 'a>, source_map: bool) -> Self {
        Self {
            options,
            index,
            code: String::with_capacity(1024),
            indent_level: 0,
            line: 0,
            column: 0,
            pure: false,
            map: source_map.then(SourceMapBuilder::new),
        }
    }

    #[inline]
    pub fn push(&mut self, code: &str) {
        self.code.push_str(code);
        if self.map.is_some() {
            self.advance(code);
        }
    }

    /// Push code produced from `loc`, mapping both of its ends.
    pub fn push_mapped(&mut self, code: &str, loc: &SourceLocation, name: Option<&str>) {
        let mapped = self.map.is_some() && !loc.source.is_empty();
        if mapped {
            self.add_mapping(loc.start.line, loc.start.column, name);
        }
        self.push(code);
        if mapped && !loc.is_stub() {
            self.add_mapping(loc.end.line, loc.end.column, None);
        }
    }

    fn add_mapping(&mut self, line: u32, column: u32, name: Option<&str>) {
        let generated_line = self.line;
        let generated_column = self.column;
        if let Some(map) = self.map.as_mut() {
            map.add_mapping(
                Mapping {
                    generated_line,
                    generated_column,
                    original_line: line.saturating_sub(1),
                    original_column: column.saturating_sub(1),
                    name: None,
                },
                name,
            );
        }
    }

    fn advance(&mut self, code: &str) {
        match code.rfind('\n') {
            Some(last) => {
                self.line += code.matches('\n').count() as u32;
                self.column = code[last + 1..].chars().map(char::len_utf16).sum::<usize>() as u32;
            }
            None => {
                self.column += code.chars().map(char::len_utf16).sum::<usize>() as u32;
            }
        }
    }

    pub fn newline(&mut self) {
        self.push("\n");
        for _ in 0..self.indent_level {
            self.push("  ");
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
        self.newline();
    }

    pub fn deindent(&mut self, without_newline: bool) {
        self.indent_level = self.indent_level.saturating_sub(1);
        if !without_newline {
            self.newline();
        }
    }

    pub(super) fn indent_level_mut(&mut self) -> &mut u32 {
        &mut self.indent_level
    }

    /// Push the local alias of a runtime helper.
    pub fn push_helper(&mut self, helper: RuntimeHelper) {
        self.push("_");
        self.push(helper.name());
    }

    pub fn push_pure(&mut self) {
        if self.pure {
            self.push(PURE_ANNOTATION);
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn into_parts(self) -> (String, Option<SourceMapBuilder>) {
        (self.code, self.map)
    }
}
