use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::config::ScoringConfig;
use crate::error::VisibilityError;
use crate::matching::{DomainMatcher, SubstringDomainMatcher};
use crate::model::{Analysis, ScoreBreakdown};

/// Computes a 0–1 visibility score for one domain against one generated answer.
pub struct VisibilityScorer {
    config: ScoringConfig,
    matcher: Box<dyn DomainMatcher>,
    relevance_patterns: Vec<Regex>,
}

impl VisibilityScorer {
    pub fn new(config: ScoringConfig) -> Result<Self, VisibilityError> {
        let relevance_patterns = config
            .relevance_keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|k| literal_pattern(k))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            config,
            matcher: Box::new(SubstringDomainMatcher::default()),
            relevance_patterns,
        })
    }

    pub fn with_matcher(mut self, matcher: impl DomainMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Final clamped score; 0 when there is no analysis or no group matches `domain`.
    pub fn score(
        &self,
        raw_text: &str,
        domain: &str,
        analysis: Option<&Analysis>,
    ) -> Result<f64, VisibilityError> {
        Ok(self
            .breakdown(raw_text, domain, analysis)?
            .map(|b| b.total)
            .unwrap_or(0.0))
    }

    /// All five sub-signals, or `None` when the domain resolves to no company.
    pub fn breakdown(
        &self,
        raw_text: &str,
        domain: &str,
        analysis: Option<&Analysis>,
    ) -> Result<Option<ScoreBreakdown>, VisibilityError> {
        let Some(analysis) = analysis else {
            debug!(domain, "no analysis available");
            return Ok(None);
        };
        let Some(company) = self.matcher.resolve(domain, &analysis.company_aliases) else {
            debug!(domain, "no company matches domain");
            return Ok(None);
        };

        let names = company.all_names();
        let lower_names: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let c = &self.config;

        let mut total_mentions = 0usize;
        for name in &names {
            total_mentions += literal_pattern(name)?.find_iter(raw_text).count();
        }
        let mention = if c.mention_saturation > 0.0 {
            (total_mentions as f64 / c.mention_saturation).min(1.0)
        } else if total_mentions > 0 {
            1.0
        } else {
            0.0
        };

        let position = analysis
            .mention_order
            .iter()
            .position(|entry| contains_any(entry, &lower_names))
            .map(|i| 1.0 - i as f64 / analysis.mention_order.len().max(1) as f64)
            .unwrap_or(0.0);

        let claims = analysis
            .leadership_statements
            .iter()
            .filter(|s| contains_any(&s.company, &lower_names))
            .count();
        let leadership = (claims as f64 * c.leadership_step).min(c.leadership_cap);

        let relevance: f64 = self
            .relevance_patterns
            .iter()
            .map(|re| {
                let hits = re.find_iter(raw_text).count();
                (hits as f64 * c.relevance_step).min(c.relevance_keyword_cap)
            })
            .sum();

        let sentiment = self.sentiment(raw_text, &names)?;

        let w = &c.weights;
        let weighted = mention * w.mention
            + position * w.position
            + leadership * w.leadership
            + relevance * w.relevance
            + sentiment * w.sentiment;
        let total = if weighted.is_finite() {
            weighted.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let breakdown = ScoreBreakdown {
            mention,
            position,
            leadership,
            relevance,
            sentiment,
            total,
        };
        debug!(
            domain,
            company = %company.main_name,
            mentions = total_mentions,
            ?breakdown,
            "scored domain"
        );
        Ok(Some(breakdown))
    }

    /// Counts "adjective ... name" or "name ... adjective" on one line.
    ///
    /// The gap between the two is unbounded within a line, so unrelated clauses can
    /// pair up. `.` never crosses a newline.
    fn sentiment(&self, raw_text: &str, names: &[&str]) -> Result<f64, VisibilityError> {
        if names.is_empty() {
            return Ok(0.0);
        }
        let alternation = names
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");

        let mut score = 0.0;
        for keyword in self.config.sentiment_keywords.iter().filter(|k| !k.trim().is_empty()) {
            let kw = regex::escape(keyword);
            let pattern = format!("{kw}.*?(?:{alternation})|(?:{alternation}).*?{kw}");
            let re = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
            let hits = re.find_iter(raw_text).count();
            score += (hits as f64 * self.config.sentiment_step)
                .min(self.config.sentiment_keyword_cap);
        }
        Ok(score)
    }
}

fn literal_pattern(text: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(text))
        .case_insensitive(true)
        .build()
}

fn contains_any(haystack: &str, lower_needles: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    lower_needles.iter().any(|n| haystack.contains(n.as_str()))
}
