//! JSON document emitter
//!
//! Generates a document with "headers" and "constants" arrays for tooling
//! that consumes the values without compiling anything.

use crate::config::TargetLanguage;
use crate::emitter::{require_resolved, ConstantEmitter, GenerationUnit, HeaderCopyright};
use crate::error::Result;
use crate::verify::ProbeOutput;
use constgen::{HexLiteral, ResolutionStep};
use serde::Serialize;

#[derive(Serialize)]
struct Document<'a> {
    headers: &'a [HeaderCopyright],
    constants: Vec<Constant<'a>>,
}

#[derive(Serialize)]
struct Constant<'a> {
    name: &'a str,
    value: HexLiteral,
    raw_value: &'a str,
    source_file: &'a str,
    source_line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<&'a [ResolutionStep]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    check: Option<&'a ProbeOutput>,
}

#[derive(Debug, Default)]
pub struct JsonEmitter;

impl JsonEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl ConstantEmitter for JsonEmitter {
    fn target(&self) -> TargetLanguage {
        TargetLanguage::Json
    }

    fn emit(&self, unit: &GenerationUnit<'_>) -> Result<String> {
        let constants = unit
            .records
            .iter()
            .map(|record| {
                Ok(Constant {
                    name: &record.name,
                    value: require_resolved(record)?,
                    raw_value: record.raw_value(),
                    source_file: &record.source_file,
                    source_line: record.source_line,
                    line: unit.verbose.then_some(record.line.as_str()),
                    resolution: unit.verbose.then(|| record.resolution_trace()),
                    check: unit.probe_output(&record.name),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let document = Document {
            headers: unit.headers,
            constants,
        };

        let mut text = serde_json::to_string_pretty(&document)?;
        text.push('\n');
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constgen::{resolve_all, ConstantRecord};
    use serde_json::Value;

    #[test]
    fn test_emit_document() {
        let mut records = vec![
            ConstantRecord::new("CKO_VENDOR_DEFINED", "0x80000000UL").with_source("pkcs11t.h", 40),
            ConstantRecord::new("CKO_NSS", "(CKO_VENDOR_DEFINED | 0x4E534350)")
                .with_source("pkcs11n.h", 7),
        ];
        resolve_all(&mut records).unwrap();
        let headers = vec![HeaderCopyright::new("pkcs11n.h", "/* MPL */\n\n")];

        let text = JsonEmitter::new()
            .emit(&GenerationUnit::new(&records, &headers))
            .unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(doc["headers"][0]["file_name"], "pkcs11n.h");
        assert_eq!(doc["constants"][1]["name"], "CKO_NSS");
        assert_eq!(doc["constants"][1]["value"], "0xCE534350");
        assert_eq!(doc["constants"][1]["source_line"], 7);
        assert!(doc["constants"][1].get("resolution").is_none());
    }

    #[test]
    fn test_verbose_includes_trace() {
        let mut records = vec![
            ConstantRecord::new("CKA_A", "1"),
            ConstantRecord::new("CKA_B", "CKA_A"),
        ];
        resolve_all(&mut records).unwrap();

        let text = JsonEmitter::new()
            .emit(&GenerationUnit::new(&records, &[]).with_verbose(true))
            .unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(doc["constants"][1]["resolution"][0]["symbol"], "CKA_A");
        assert_eq!(doc["constants"][1]["resolution"][0]["replacement"], "(0x00000001)");
    }
}
