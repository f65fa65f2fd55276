//! Source map v3 generation.
//!
//! Generated positions are tracked as (line, column) pairs while the rewriter
//! concatenates output fragments; original positions are computed from byte
//! offsets through a [`LineIndex`]. Columns are counted in UTF-16 code units,
//! as required by the v3 format.

use serde::{Deserialize, Serialize};

const BASE64_CHARS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Byte offset to line/column conversion for a single source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Zero-based (line, utf16 column) of `offset`.
    pub fn line_col(&self, source: &str, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = source
            .get(start..offset)
            .map(|s| s.encode_utf16().count())
            .unwrap_or(offset - start);
        (line as u32, column as u32)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Append the base64 VLQ encoding of `value` to `out`.
pub fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_CHARS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Decode a single base64 VLQ segment field list, e.g. `"AAAA"` into `[0, 0, 0, 0]`.
pub fn decode_vlq_segment(segment: &str) -> Option<Vec<i64>> {
    let mut values = Vec::new();
    let mut shift = 0;
    let mut acc: i64 = 0;
    for c in segment.bytes() {
        let digit = BASE64_CHARS.iter().position(|&b| b == c)? as i64;
        acc += (digit & 0b11111) << shift;
        if digit & 0b100000 != 0 {
            shift += 5;
        } else {
            let negative = acc & 1 == 1;
            let value = acc >> 1;
            values.push(if negative { -value } else { value });
            acc = 0;
            shift = 0;
        }
    }
    Some(values)
}

/// A single mapping from a generated position to an original position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub original_line: u32,
    pub original_column: u32,
}

/// Serialized v3 source map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    #[serde(default)]
    pub sources_content: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode `mappings` into absolute (generated_column, original_line, original_column)
    /// triples grouped by generated line.
    pub fn decoded_mappings(&self) -> Vec<Vec<(u32, u32, u32)>> {
        let mut lines = Vec::new();
        let (mut src_line, mut src_col) = (0i64, 0i64);
        for line in self.mappings.split(';') {
            let mut decoded = Vec::new();
            let mut gen_col = 0i64;
            for segment in line.split(',').filter(|s| !s.is_empty()) {
                let Some(fields) = decode_vlq_segment(segment) else {
                    continue;
                };
                if fields.len() < 4 {
                    continue;
                }
                gen_col += fields[0];
                src_line += fields[2];
                src_col += fields[3];
                decoded.push((gen_col as u32, src_line as u32, src_col as u32));
            }
            lines.push(decoded);
        }
        lines
    }
}

/// Incremental builder collecting mappings for a single-source map.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    mappings: Vec<Mapping>,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mapping(&mut self, mapping: Mapping) {
        self.mappings.push(mapping);
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Encode collected mappings. Mappings are sorted by generated position first.
    pub fn build(mut self, file: Option<&str>, source_name: &str, source_content: &str) -> SourceMap {
        self.mappings
            .sort_by_key(|m| (m.generated_line, m.generated_column));

        let mut encoded = String::new();
        let mut current_line = 0;
        let mut prev_gen_col = 0i64;
        let mut prev_src_line = 0i64;
        let mut prev_src_col = 0i64;
        let mut first_in_line = true;

        for m in &self.mappings {
            while current_line < m.generated_line {
                encoded.push(';');
                current_line += 1;
                prev_gen_col = 0;
                first_in_line = true;
            }
            if !first_in_line {
                encoded.push(',');
            }
            first_in_line = false;

            encode_vlq(m.generated_column as i64 - prev_gen_col, &mut encoded);
            // single source
            encode_vlq(0, &mut encoded);
            encode_vlq(m.original_line as i64 - prev_src_line, &mut encoded);
            encode_vlq(m.original_column as i64 - prev_src_col, &mut encoded);

            prev_gen_col = m.generated_column as i64;
            prev_src_line = m.original_line as i64;
            prev_src_col = m.original_column as i64;
        }

        SourceMap {
            version: 3,
            file: file.map(str::to_string),
            sources: vec![source_name.to_string()],
            sources_content: vec![source_content.to_string()],
            names: Vec::new(),
            mappings: encoded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: i64) -> String {
        let mut s = String::new();
        encode_vlq(value, &mut s);
        s
    }

    #[test]
    fn test_encode_vlq() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(15), "e");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(-17), "jB");
    }

    #[test]
    fn test_decode_vlq_segment() {
        assert_eq!(decode_vlq_segment("AACA"), Some(vec![0, 0, 1, 0]));
        assert_eq!(decode_vlq_segment("gBjB"), Some(vec![16, -17]));
        assert_eq!(decode_vlq_segment("!"), None);
    }

    #[test]
    fn test_line_index() {
        let src = "ab\ncd\n\nxyz";
        let index = LineIndex::new(src);
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line_col(src, 0), (0, 0));
        assert_eq!(index.line_col(src, 4), (1, 1));
        assert_eq!(index.line_col(src, 6), (2, 0));
        assert_eq!(index.line_col(src, 9), (3, 2));
    }

    #[test]
    fn test_line_index_utf16_columns() {
        let src = "é = 1";
        let index = LineIndex::new(src);
        // 'é' is two bytes in UTF-8 but one UTF-16 unit
        assert_eq!(index.line_col(src, 2), (0, 1));
    }

    #[test]
    fn test_builder_round_trip() {
        let mut builder = SourceMapBuilder::new();
        builder.add_mapping(Mapping {
            generated_line: 1,
            generated_column: 4,
            original_line: 3,
            original_column: 2,
        });
        builder.add_mapping(Mapping {
            generated_line: 0,
            generated_column: 0,
            original_line: 0,
            original_column: 0,
        });
        let map = builder.build(Some("App.vue"), "App.vue", "src");
        assert_eq!(map.version, 3);
        assert_eq!(map.mappings, "AAAA;IAGE");
        let decoded = map.decoded_mappings();
        assert_eq!(decoded, vec![vec![(0, 0, 0)], vec![(4, 3, 2)]]);

        let json = map.to_json();
        assert!(json.contains("\"sourcesContent\":[\"src\"]"));
    }
}
