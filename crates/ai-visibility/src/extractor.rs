use std::sync::Arc;

use llm_common::generate::TextGenerator;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::VisibilityError;
use crate::model::{Analysis, CompanyAliasGroup, LeadershipStatement};
use crate::prompts;

/// Turns a free-text model answer into an `Analysis` with a second model call.
#[derive(Clone)]
pub struct EntityExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl EntityExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// One outbound call, no retry. Service failures and unparseable replies propagate.
    pub async fn extract(&self, raw_text: &str) -> Result<Analysis, VisibilityError> {
        let prompt = prompts::analysis_extraction_prompt(raw_text);
        let reply = self.generator.generate(&prompt).await?;
        debug!(reply = %reply, "raw analysis reply");

        let analysis = parse_analysis(&reply)?;
        info!(
            companies = analysis.company_aliases.len(),
            mentions = analysis.mention_order.len(),
            leadership = analysis.leadership_statements.len(),
            "parsed analysis"
        );
        Ok(analysis)
    }
}

/// Removes a Markdown code fence around the payload, with or without a language tag.
///
/// Prose before the opening fence and anything after the closing fence is dropped.
/// Text without a fence is only trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[start + 3..];
    let body = match after.find('\n') {
        Some(nl) if is_fence_tag(&after[..nl]) => &after[nl + 1..],
        _ => after,
    };
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim()
}

fn is_fence_tag(s: &str) -> bool {
    s.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+')
}

/// Parses the extractor's reply. Absent, null or mistyped keys become empty sequences.
pub fn parse_analysis(reply: &str) -> Result<Analysis, VisibilityError> {
    let cleaned = strip_code_fence(reply);
    let json: Value = serde_json::from_str(cleaned).map_err(|source| {
        warn!(error = %source, cleaned, "analysis reply is not valid JSON");
        VisibilityError::Parse {
            source,
            cleaned: cleaned.to_string(),
        }
    })?;

    let Some(obj) = json.as_object() else {
        warn!(kind = json_kind(&json), "analysis reply is not a JSON object, using empty analysis");
        return Ok(Analysis::default());
    };

    let company_aliases = array_field(obj, "companyAliases")
        .iter()
        .filter_map(parse_alias_group)
        .collect();

    let mention_order = array_field(obj, "mentionOrder")
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();

    let leadership_statements = array_field(obj, "leadershipStatements")
        .iter()
        .filter_map(|v| {
            let o = v.as_object()?;
            Some(LeadershipStatement {
                company: str_field(o, "company"),
                statement: str_field(o, "statement"),
            })
        })
        .collect();

    Ok(Analysis {
        company_aliases,
        mention_order,
        leadership_statements,
    })
}

fn array_field<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> &'a [Value] {
    match obj.get(key) {
        Some(Value::Array(items)) => items.as_slice(),
        None | Some(Value::Null) => &[],
        Some(other) => {
            warn!(key, kind = json_kind(other), "expected an array, defaulting to empty");
            &[]
        }
    }
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_alias_group(value: &Value) -> Option<CompanyAliasGroup> {
    let obj = value.as_object()?;
    let main_name = obj.get("mainName")?.as_str()?.trim();
    if main_name.is_empty() {
        debug!("skipping company group without a mainName");
        return None;
    }
    let aliases = obj
        .get("aliases")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default();
    Some(CompanyAliasGroup::new(main_name, aliases))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm_common::error::LlmError;
    use std::sync::Mutex;

    const SAMPLE: &str = r#"{
  "companyAliases": [{"mainName": "Bright Data", "aliases": ["Luminati"]}],
  "mentionOrder": ["Bright Data", "Oxylabs"],
  "leadershipStatements": [{"company": "Bright Data", "statement": "market leader"}]
}"#;

    #[test]
    fn test_strip_plain_text() {
        assert_eq!(strip_code_fence("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_json_fence() {
        let text = format!("```json\n{SAMPLE}\n```");
        assert_eq!(strip_code_fence(&text), SAMPLE);
    }

    #[test]
    fn test_strip_untagged_fence() {
        let text = format!("```\n{SAMPLE}\n```\n");
        assert_eq!(strip_code_fence(&text), SAMPLE);
    }

    #[test]
    fn test_strip_fence_after_prose() {
        let text = format!("Here is the JSON:\n```JSON\n{SAMPLE}\n```\nHope this helps.");
        assert_eq!(strip_code_fence(&text), SAMPLE);
    }

    #[test]
    fn test_strip_single_line_fence() {
        assert_eq!(strip_code_fence("```{\"mentionOrder\":[]}```"), "{\"mentionOrder\":[]}");
    }

    #[test]
    fn test_parse_full_analysis() {
        let a = parse_analysis(&format!("```json\n{SAMPLE}\n```")).unwrap();
        assert_eq!(a.company_aliases.len(), 1);
        assert_eq!(a.company_aliases[0].main_name, "Bright Data");
        assert_eq!(a.company_aliases[0].aliases, vec!["Luminati"]);
        assert_eq!(a.mention_order, vec!["Bright Data", "Oxylabs"]);
        assert_eq!(a.leadership_statements[0].statement, "market leader");
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let a = parse_analysis(r#"{"mentionOrder": ["Oxylabs"]}"#).unwrap();
        assert!(a.company_aliases.is_empty());
        assert!(a.leadership_statements.is_empty());
        assert_eq!(a.mention_order, vec!["Oxylabs"]);

        let a = parse_analysis(r#"{"companyAliases": null, "mentionOrder": "Oxylabs"}"#).unwrap();
        assert_eq!(a, Analysis::default());
    }

    #[test]
    fn test_tolerates_partial_entries() {
        let a = parse_analysis(
            r#"{
              "companyAliases": [
                {"mainName": "NetNut"},
                {"mainName": "", "aliases": ["ghost"]},
                {"aliases": ["nameless"]},
                {"mainName": "IPRoyal", "aliases": ["iproyal.com", 7, "iproyal.com"]}
              ],
              "leadershipStatements": [{"company": "NetNut"}, "not an object"]
            }"#,
        )
        .unwrap();
        let names: Vec<_> = a.company_aliases.iter().map(|g| g.main_name.as_str()).collect();
        assert_eq!(names, vec!["NetNut", "IPRoyal"]);
        assert!(a.company_aliases[0].aliases.is_empty());
        assert_eq!(a.company_aliases[1].aliases, vec!["iproyal.com"]);
        assert_eq!(a.leadership_statements.len(), 1);
        assert_eq!(a.leadership_statements[0].statement, "");
    }

    #[test]
    fn test_non_object_json_is_empty_analysis() {
        assert_eq!(parse_analysis("[1, 2, 3]").unwrap(), Analysis::default());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        match parse_analysis("```json\nSure! Bright Data is great.\n```") {
            Err(VisibilityError::Parse { cleaned, .. }) => {
                assert_eq!(cleaned, "Sure! Bright Data is great.");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    struct RecordingGenerator {
        reply: Result<String, String>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(LlmError::Other)
        }
    }

    #[tokio::test]
    async fn test_extract_sends_answer_and_parses_reply() {
        let generator = Arc::new(RecordingGenerator {
            reply: Ok(format!("```json\n{SAMPLE}\n```")),
            seen: Mutex::new(Vec::new()),
        });
        let extractor = EntityExtractor::new(generator.clone());
        let a = extractor.extract("Bright Data is the market leader.").await.unwrap();
        assert_eq!(a.mention_order.len(), 2);

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].ends_with("Bright Data is the market leader."));
    }

    #[tokio::test]
    async fn test_extract_propagates_service_error() {
        let generator = Arc::new(RecordingGenerator {
            reply: Err("connection reset".to_string()),
            seen: Mutex::new(Vec::new()),
        });
        let extractor = EntityExtractor::new(generator);
        let err = extractor.extract("text").await.unwrap_err();
        assert!(matches!(err, VisibilityError::Service(_)));
    }
}
