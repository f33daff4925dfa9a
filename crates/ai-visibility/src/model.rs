use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A canonical company name plus the alternate names and domains that refer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyAliasGroup {
    /// Display name, e.g. "Bright Data"
    pub main_name: String,
    /// Alternate names, e.g. "Luminati Networks", "brightdata.com"
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CompanyAliasGroup {
    pub fn new<I, S>(main_name: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut group = Self {
            main_name: main_name.into(),
            aliases: Vec::new(),
        };
        group.merge_aliases(aliases);
        group
    }

    /// Appends aliases not already present. Comparison is exact; order is kept.
    pub fn merge_aliases<I, S>(&mut self, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for alias in aliases {
            let alias = alias.into();
            if !self.aliases.contains(&alias) {
                self.aliases.push(alias);
            }
        }
    }

    /// `{main_name} ∪ aliases`, skipping blank entries.
    pub fn all_names(&self) -> Vec<&str> {
        std::iter::once(self.main_name.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .filter(|n| !n.trim().is_empty())
            .collect()
    }

    /// Case-insensitive substring search over the main name and every alias.
    pub fn mentions(&self, needle_lower: &str) -> bool {
        self.main_name.to_lowercase().contains(needle_lower)
            || self
                .aliases
                .iter()
                .any(|a| a.to_lowercase().contains(needle_lower))
    }
}

/// A claim in the generated answer about a company's market position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LeadershipStatement {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub statement: String,
}

/// Structured reading of one generated answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Analysis {
    pub company_aliases: Vec<CompanyAliasGroup>,
    /// Company display names in first-mention order.
    pub mention_order: Vec<String>,
    pub leadership_statements: Vec<LeadershipStatement>,
}

/// Outcome for one prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptResult {
    /// Domain -> visibility score in `[0, 1]`, primary domain first
    pub scores: IndexMap<String, f64>,
    pub raw_initial_response: String,
    pub analysis: Option<Analysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PromptResult {
    pub fn scored(
        scores: IndexMap<String, f64>,
        raw_initial_response: String,
        analysis: Analysis,
    ) -> Self {
        Self {
            scores,
            raw_initial_response,
            analysis: Some(analysis),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Prompt -> result in request order. One entry per distinct prompt string.
pub type VisibilityReport = IndexMap<String, PromptResult>;

/// Inbound request: the caller's own domain, its competitors and the prompts to test.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct VisibilityRequest {
    /// Primary domain, e.g. "brightdata.com"
    #[serde(default)]
    pub domain: String,
    /// Competitor domains, scored after the primary domain in this order.
    /// Required; an empty list is valid.
    #[serde(default)]
    pub competitors: Option<Vec<String>>,
    /// Natural-language prompts to put to the model.
    #[serde(default)]
    pub prompts: Vec<String>,
}

impl VisibilityRequest {
    /// `[domain, ...competitors]`
    pub fn domains(&self) -> Vec<String> {
        std::iter::once(self.domain.clone())
            .chain(self.competitors.iter().flatten().cloned())
            .collect()
    }
}

/// The five sub-signals behind one visibility score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, JsonSchema)]
pub struct ScoreBreakdown {
    pub mention: f64,
    pub position: f64,
    pub leadership: f64,
    pub relevance: f64,
    pub sentiment: f64,
    /// Weighted sum clamped to `[0, 1]`.
    pub total: f64,
}
