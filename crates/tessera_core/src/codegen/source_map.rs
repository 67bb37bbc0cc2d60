//! Version 3 source maps.

use serde::{Deserialize, Serialize};

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Serialized source map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub sources: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
    pub sources_content: Vec<String>,
}

impl SourceMap {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One generated-to-original position pair. All fields are zero based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub original_line: u32,
    pub original_column: u32,
    pub name: Option<u32>,
}

/// Collects mappings in generation order
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    mappings: Vec<Mapping>,
    names: Vec<String>,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mapping(&mut self, mut mapping: Mapping, name: Option<&str>) {
        mapping.name = name.map(|name| self.name_index(name));
        if self.mappings.last() == Some(&mapping) {
            return;
        }
        self.mappings.push(mapping);
    }

    fn name_index(&mut self, name: &str) -> u32 {
        match self.names.iter().position(|n| n == name) {
            Some(index) => index as u32,
            None => {
                self.names.push(name.to_string());
                (self.names.len() - 1) as u32
            }
        }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn finish(self, filename: &str, source: &str) -> SourceMap {
        SourceMap {
            version: 3,
            sources: vec![filename.to_string()],
            names: self.names,
            mappings: encode_mappings(&self.mappings),
            sources_content: vec![source.to_string()],
        }
    }
}

fn encode_mappings(mappings: &[Mapping]) -> String {
    let mut out = String::new();
    let mut line = 0;
    let mut prev_column = 0i64;
    let mut prev_original_line = 0i64;
    let mut prev_original_column = 0i64;
    let mut prev_name = 0i64;

    for (i, m) in mappings.iter().enumerate() {
        if m.generated_line != line {
            while line < m.generated_line {
                out.push(';');
                line += 1;
            }
            prev_column = 0;
        } else if i > 0 {
            out.push(',');
        }

        encode_vlq(&mut out, m.generated_column as i64 - prev_column);
        prev_column = m.generated_column as i64;
        // single source, index delta is always 0
        encode_vlq(&mut out, 0);
        encode_vlq(&mut out, m.original_line as i64 - prev_original_line);
        prev_original_line = m.original_line as i64;
        encode_vlq(&mut out, m.original_column as i64 - prev_original_column);
        prev_original_column = m.original_column as i64;
        if let Some(name) = m.name {
            encode_vlq(&mut out, name as i64 - prev_name);
            prev_name = name as i64;
        }
    }
    out
}

/// Base64 VLQ with the sign in the lowest bit.
pub fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = vlq & 0b11111;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}
