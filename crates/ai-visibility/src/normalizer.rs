use tracing::debug;

use crate::model::{Analysis, CompanyAliasGroup};

/// An incumbent that must always be resolvable, even when extraction missed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceCompetitor {
    /// Lower-case substring used to find an existing group.
    pub needle: String,
    pub main_name: String,
    pub aliases: Vec<String>,
    /// Union `aliases` into an existing group when one is found.
    pub merge_into_existing: bool,
}

impl ReferenceCompetitor {
    pub fn bright_data() -> Self {
        Self {
            needle: "bright data".to_string(),
            main_name: "Bright Data".to_string(),
            aliases: vec!["Luminati Networks".to_string(), "brightdata.com".to_string()],
            merge_into_existing: true,
        }
    }

    pub fn oxylabs() -> Self {
        Self {
            needle: "oxylabs".to_string(),
            main_name: "Oxylabs".to_string(),
            aliases: vec!["oxylabs.io".to_string()],
            merge_into_existing: false,
        }
    }
}

/// Post-processes extractor output. Pure and idempotent.
#[derive(Debug, Clone)]
pub struct AliasNormalizer {
    references: Vec<ReferenceCompetitor>,
}

impl Default for AliasNormalizer {
    fn default() -> Self {
        Self::new(vec![
            ReferenceCompetitor::bright_data(),
            ReferenceCompetitor::oxylabs(),
        ])
    }
}

impl AliasNormalizer {
    pub fn new(references: Vec<ReferenceCompetitor>) -> Self {
        Self { references }
    }

    pub fn normalize(&self, mut analysis: Analysis) -> Analysis {
        for reference in &self.references {
            let needle = reference.needle.to_lowercase();
            match analysis
                .company_aliases
                .iter_mut()
                .find(|g| g.mentions(&needle))
            {
                Some(group) => {
                    if reference.merge_into_existing {
                        group.merge_aliases(reference.aliases.iter().cloned());
                    }
                }
                None => {
                    debug!(company = %reference.main_name, "injecting reference competitor");
                    analysis.company_aliases.push(CompanyAliasGroup::new(
                        reference.main_name.clone(),
                        reference.aliases.iter().cloned(),
                    ));
                }
            }
        }

        // Last resort only: this is sequence order, not observed mention order.
        if analysis.mention_order.is_empty() && !analysis.company_aliases.is_empty() {
            analysis.mention_order = analysis
                .company_aliases
                .iter()
                .map(|g| g.main_name.clone())
                .collect();
        }

        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(a: &'a Analysis, needle: &str) -> Option<&'a CompanyAliasGroup> {
        a.company_aliases.iter().find(|g| g.mentions(needle))
    }

    #[test]
    fn test_injects_both_references_into_empty_analysis() {
        let a = AliasNormalizer::default().normalize(Analysis::default());
        let bd = find(&a, "bright data").expect("bright data group");
        assert_eq!(bd.main_name, "Bright Data");
        assert_eq!(bd.aliases, vec!["Luminati Networks", "brightdata.com"]);
        let ox = find(&a, "oxylabs").expect("oxylabs group");
        assert_eq!(ox.aliases, vec!["oxylabs.io"]);
        assert_eq!(a.mention_order, vec!["Bright Data", "Oxylabs"]);
    }

    #[test]
    fn test_merges_bright_data_aliases() {
        let input = Analysis {
            company_aliases: vec![CompanyAliasGroup::new(
                "Bright Data Ltd.",
                ["Luminati Networks", "BrightData"],
            )],
            mention_order: vec!["Bright Data Ltd.".to_string()],
            leadership_statements: vec![],
        };
        let a = AliasNormalizer::default().normalize(input);
        assert_eq!(a.company_aliases.len(), 2);
        assert_eq!(
            a.company_aliases[0].aliases,
            vec!["Luminati Networks", "BrightData", "brightdata.com"]
        );
        assert_eq!(a.mention_order, vec!["Bright Data Ltd."]);
    }

    #[test]
    fn test_matches_reference_through_alias() {
        let input = Analysis {
            company_aliases: vec![CompanyAliasGroup::new("Oxy", ["OXYLABS.io"])],
            ..Analysis::default()
        };
        let a = AliasNormalizer::default().normalize(input);
        let oxy: Vec<_> = a
            .company_aliases
            .iter()
            .filter(|g| g.mentions("oxylabs"))
            .collect();
        assert_eq!(oxy.len(), 1);
        assert_eq!(oxy[0].main_name, "Oxy");
        // Existing Oxylabs groups are left untouched.
        assert_eq!(oxy[0].aliases, vec!["OXYLABS.io"]);
    }

    #[test]
    fn test_is_idempotent() {
        let input = Analysis {
            company_aliases: vec![
                CompanyAliasGroup::new("Smartproxy", ["smartproxy.com"]),
                CompanyAliasGroup::new("Bright Data", Vec::<String>::new()),
            ],
            ..Analysis::default()
        };
        let normalizer = AliasNormalizer::default();
        let once = normalizer.normalize(input);
        let twice = normalizer.normalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_keeps_existing_mention_order() {
        let input = Analysis {
            company_aliases: vec![CompanyAliasGroup::new("NetNut", Vec::<String>::new())],
            mention_order: vec!["Oxylabs".to_string(), "NetNut".to_string()],
            leadership_statements: vec![],
        };
        let a = AliasNormalizer::default().normalize(input);
        assert_eq!(a.mention_order, vec!["Oxylabs", "NetNut"]);
        assert_eq!(a.company_aliases.len(), 3);
    }
}
