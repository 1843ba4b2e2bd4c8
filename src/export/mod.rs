use std::fmt;

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::consensus::CrossPageResult;
use crate::pipeline::NormalizationResult;

const EXTENSION_NAMESPACE: &str = "token-consensus";
const KNOWN_TYPES: [&str; 6] = [
    "color",
    "dimension",
    "typography",
    "shadow",
    "transition",
    "duration",
];

pub type ExportResult<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize export document")]
    Serialize(#[from] serde_json::Error),
    #[error("export not supported: {reason}")]
    Unsupported { reason: String },
}

/// Turns a finished result into a document for an outside consumer.
pub trait TokenExporter {
    fn export(&self, result: &NormalizationResult) -> ExportResult<Value>;
}

/// Design Tokens Community Group format, standards only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DtcgExporter;

impl TokenExporter for DtcgExporter {
    fn export(&self, result: &NormalizationResult) -> ExportResult<Value> {
        let mut document = Map::new();

        document.insert(
            "color".into(),
            group("color", &result.colors.standards, |cluster| {
                ("color", json!(cluster.canonical))
            }),
        );
        document.insert(
            "typography".into(),
            group("typography", &result.typography.standards, |token| {
                let mut value = json!({
                    "fontFamily": token.token.family,
                    "fontWeight": token.token.weight,
                    "fontSize": px(token.normalized.pixels),
                });
                if let Some(line_height) = &token.token.line_height {
                    value["lineHeight"] = json!(line_height);
                }
                if let Some(letter_spacing) = &token.token.letter_spacing {
                    value["letterSpacing"] = json!(letter_spacing);
                }
                ("typography", value)
            }),
        );
        document.insert(
            "spacing".into(),
            group("spacing", &result.spacing.standards, |token| {
                ("dimension", json!(px(token.normalized.pixels)))
            }),
        );
        document.insert(
            "radius".into(),
            group("radius", &result.radii.standards, |token| {
                ("dimension", json!(token.value))
            }),
        );
        document.insert(
            "shadow".into(),
            group("shadow", &result.shadows.standards, |token| {
                ("shadow", json!(token.value))
            }),
        );
        document.insert(
            "motion".into(),
            group("motion", &result.motion.standards, |token| {
                (
                    "transition",
                    json!({
                        "duration": token.duration,
                        "timingFunction": token.easing,
                    }),
                )
            }),
        );

        let spacing_scale = serde_json::to_value(&result.spacing.scale)?;
        document.insert(
            "$extensions".into(),
            namespaced(json!({
                "spacingScale": spacing_scale,
                "totalPages": result.metadata.total_pages,
                "generatedAt": result.metadata.timestamp.to_rfc3339(),
            })),
        );

        Ok(Value::Object(document))
    }
}

/// Tokens are named by rank, so the first standard of each category is `<prefix>-1`.
fn group<T, F>(prefix: &str, standards: &[CrossPageResult<T>], describe: F) -> Value
where
    F: Fn(&T) -> (&'static str, Value),
{
    let mut tokens = Map::new();
    for (index, result) in standards.iter().enumerate() {
        let (token_type, value) = describe(&result.token);
        tokens.insert(
            format!("{prefix}-{}", index + 1),
            json!({
                "$type": token_type,
                "$value": value,
                "$extensions": namespaced(json!({
                    "confidence": result.confidence,
                    "pages": result.page_count(),
                    "occurrences": result.occurrence_count,
                })),
            }),
        );
    }
    Value::Object(tokens)
}

fn namespaced(value: Value) -> Value {
    let mut extensions = Map::new();
    extensions.insert(EXTENSION_NAMESPACE.to_string(), value);
    Value::Object(extensions)
}

fn px(pixels: f64) -> String {
    format!("{pixels}px")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtcgIssue {
    pub path: String,
    pub message: String,
}

impl fmt::Display for DtcgIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Structural checks on a DTCG document: every token has a known `$type` and a
/// non-null `$value`, and groups only contain objects.
pub fn validate_dtcg(document: &Value) -> Vec<DtcgIssue> {
    let mut issues = Vec::new();
    match document.as_object() {
        Some(root) => validate_group("", root, &mut issues),
        None => issues.push(DtcgIssue {
            path: "$".into(),
            message: "document root must be an object".into(),
        }),
    }
    issues
}

fn validate_group(path: &str, group: &Map<String, Value>, issues: &mut Vec<DtcgIssue>) {
    for (name, node) in group {
        if name.starts_with('$') {
            continue;
        }
        let node_path = if path.is_empty() {
            name.clone()
        } else {
            format!("{path}.{name}")
        };
        let Some(object) = node.as_object() else {
            issues.push(DtcgIssue {
                path: node_path,
                message: "expected a token or group object".into(),
            });
            continue;
        };
        if object.contains_key("$value") {
            validate_token(&node_path, object, issues);
        } else {
            validate_group(&node_path, object, issues);
        }
    }
}

fn validate_token(path: &str, token: &Map<String, Value>, issues: &mut Vec<DtcgIssue>) {
    if token.get("$value").is_some_and(Value::is_null) {
        issues.push(DtcgIssue {
            path: path.to_string(),
            message: "$value must not be null".into(),
        });
    }
    match token.get("$type").and_then(Value::as_str) {
        Some(token_type) if KNOWN_TYPES.contains(&token_type) => {}
        Some(token_type) => issues.push(DtcgIssue {
            path: path.to_string(),
            message: format!("unknown $type {token_type:?}"),
        }),
        None => issues.push(DtcgIssue {
            path: path.to_string(),
            message: "missing $type".into(),
        }),
    }
}
