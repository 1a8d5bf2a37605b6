use crate::scorer::ScorerKind;
use coderank_extract::{extract_components, CodeFeatures};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw (unweighted) per-scorer contributions, kept for inspection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PreviousScores {
    #[serde(default)]
    pub structure_score: f32,
    #[serde(default)]
    pub signature_score: f32,
    #[serde(default)]
    pub semantic_score: f32,
}

impl PreviousScores {
    /// Raw contribution of one scorer
    #[must_use]
    pub const fn get(&self, kind: ScorerKind) -> f32 {
        match kind {
            ScorerKind::Structure => self.structure_score,
            ScorerKind::Signature => self.signature_score,
            ScorerKind::Semantic => self.semantic_score,
        }
    }
}

/// One retrieved code snippet plus its evolving scores for a given query.
///
/// Score and boost fields all default to 0.0; downstream consumers treat an
/// absent field as 0. The record deserializes from the minimal upstream
/// shape `{id, score, text}`, coercing numeric ids and numeric-string
/// scores (a score that fails to coerce becomes 0.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Snippet identifier from the upstream retriever
    #[serde(default, deserialize_with = "id_from_any")]
    pub id: String,

    /// Original retrieval score
    #[serde(default, deserialize_with = "score_from_any")]
    pub score: f32,

    /// Raw snippet text, immutable for the lifetime of the rerank
    #[serde(default)]
    pub text: String,

    /// Extracted features; populated on demand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<CodeFeatures>,

    /// The single additive/normalized score used to order contexts
    #[serde(default)]
    pub final_score: f32,

    #[serde(default)]
    pub structure_score: f32,
    #[serde(default)]
    pub signature_score: f32,
    #[serde(default)]
    pub semantic_score: f32,

    /// Raw scorer outputs keyed by scorer, for explainability
    #[serde(default)]
    pub previous_scores: PreviousScores,

    #[serde(default)]
    pub name_match_boost: f32,
    #[serde(default)]
    pub quality_boost: f32,
    #[serde(default)]
    pub file_op_boost: f32,
    #[serde(default)]
    pub string_op_boost: f32,
    #[serde(default)]
    pub helper_boost: f32,
    #[serde(default)]
    pub main_boost: f32,

    /// Call-graph role adjustment (+0.1 main, −0.05 helper)
    #[serde(default)]
    pub role_adjustment: f32,
}

impl Context {
    /// Create a fresh context with all scores zeroed
    #[must_use]
    pub fn new(id: impl Into<String>, score: f32, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            score,
            text: text.into(),
            components: None,
            final_score: 0.0,
            structure_score: 0.0,
            signature_score: 0.0,
            semantic_score: 0.0,
            previous_scores: PreviousScores::default(),
            name_match_boost: 0.0,
            quality_boost: 0.0,
            file_op_boost: 0.0,
            string_op_boost: 0.0,
            helper_boost: 0.0,
            main_boost: 0.0,
            role_adjustment: 0.0,
        }
    }

    /// Extract features from the text if not already present
    pub fn ensure_components(&mut self) -> &CodeFeatures {
        self.components
            .get_or_insert_with(|| extract_components(&self.text))
    }

    /// Extracted function name, lowercased; empty when unknown
    #[must_use]
    pub fn function_name_lower(&self) -> String {
        self.components
            .as_ref()
            .map(|c| c.function_name.to_lowercase())
            .unwrap_or_default()
    }

    /// Record one scorer's raw output on the named score field and in
    /// `previous_scores`
    pub fn record_score(&mut self, kind: ScorerKind, raw: f32) {
        match kind {
            ScorerKind::Structure => {
                self.structure_score = raw;
                self.previous_scores.structure_score = raw;
            }
            ScorerKind::Signature => {
                self.signature_score = raw;
                self.previous_scores.signature_score = raw;
            }
            ScorerKind::Semantic => {
                self.semantic_score = raw;
                self.previous_scores.semantic_score = raw;
            }
        }
    }
}

fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or numeric id")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// Coerce a score field that may arrive as text; defaults to 0.0 on failure
fn score_from_any<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScoreVisitor;

    impl<'de> Visitor<'de> for ScoreVisitor {
        type Value = f32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or numeric string")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<f32, E> {
            Ok(value as f32)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<f32, E> {
            Ok(value as f32)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<f32, E> {
            Ok(value as f32)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<f32, E> {
            Ok(value.trim().parse().unwrap_or(0.0))
        }
    }

    deserializer.deserialize_any(ScoreVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_minimal_upstream_shape() {
        let ctx: Context =
            serde_json::from_str(r#"{"id": 7, "score": 0.42, "text": "def f():\n    pass"}"#)
                .unwrap();

        assert_eq!(ctx.id, "7");
        assert_eq!(ctx.score, 0.42);
        assert_eq!(ctx.final_score, 0.0);
        assert_eq!(ctx.name_match_boost, 0.0);
    }

    #[test]
    fn coerces_numeric_string_scores() {
        let ctx: Context =
            serde_json::from_str(r#"{"id": "a", "score": "0.9", "text": ""}"#).unwrap();
        assert_eq!(ctx.score, 0.9);
    }

    #[test]
    fn unparseable_scores_default_to_zero() {
        let ctx: Context =
            serde_json::from_str(r#"{"id": "a", "score": "n/a", "text": ""}"#).unwrap();
        assert_eq!(ctx.score, 0.0);
    }

    #[test]
    fn ensure_components_extracts_once() {
        let mut ctx = Context::new("1", 0.5, "def read_file(path):\n    return open(path)\n");

        assert_eq!(ctx.ensure_components().function_name, "read_file");
        // second call reuses the stored record
        assert_eq!(ctx.ensure_components().function_name, "read_file");
    }

    #[test]
    fn record_score_mirrors_into_previous_scores() {
        let mut ctx = Context::new("1", 0.0, "");
        ctx.record_score(ScorerKind::Signature, 0.75);

        assert_eq!(ctx.signature_score, 0.75);
        assert_eq!(ctx.previous_scores.get(ScorerKind::Signature), 0.75);
        assert_eq!(ctx.previous_scores.get(ScorerKind::Structure), 0.0);
    }
}
