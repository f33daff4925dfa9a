//! Resolving a domain string to a company alias group.
//!
//! The default matcher is a loose substring heuristic and can produce false
//! positives for short names. Callers only see the `DomainMatcher` trait, so a
//! stricter matcher can be dropped in without touching the scorer.

use crate::model::CompanyAliasGroup;

const MIN_STEM_LEN: usize = 3;

/// Trailing words dropped from a company name before comparing it with a domain stem.
const LEGAL_SUFFIXES: &[&str] = &[
    "co", "company", "corp", "corporation", "gmbh", "group", "inc", "incorporated", "limited",
    "llc", "ltd", "plc",
];

pub trait DomainMatcher: Send + Sync {
    /// First group in sequence order that refers to `domain`, if any.
    fn resolve<'a>(
        &self,
        domain: &str,
        groups: &'a [CompanyAliasGroup],
    ) -> Option<&'a CompanyAliasGroup>;
}

/// Bidirectional, whitespace-insensitive substring matching.
///
/// Pass one: a group matches when a lower-cased name contains the normalized
/// domain, or the domain contains the name with whitespace removed. Pass two,
/// only when pass one found nothing: the domain stem (`acme` for
/// `www.acme.com`) must equal a whole name once whitespace and trailing legal
/// suffixes are removed, so `acme` resolves to "Acme Corp" while `oxy` does not
/// resolve to "Oxylabs".
#[derive(Debug, Clone, Copy)]
pub struct SubstringDomainMatcher {
    pub stem_fallback: bool,
}

impl Default for SubstringDomainMatcher {
    fn default() -> Self {
        Self {
            stem_fallback: true,
        }
    }
}

impl DomainMatcher for SubstringDomainMatcher {
    fn resolve<'a>(
        &self,
        domain: &str,
        groups: &'a [CompanyAliasGroup],
    ) -> Option<&'a CompanyAliasGroup> {
        let base = normalize_domain(domain);
        if base.is_empty() {
            return None;
        }

        let direct = groups
            .iter()
            .find(|g| g.all_names().iter().any(|n| name_matches(n, &base)));
        if direct.is_some() || !self.stem_fallback {
            return direct;
        }

        let stem = domain_stem(&base)?;
        groups
            .iter()
            .find(|g| g.all_names().iter().any(|n| stem_matches(&stem, n)))
    }
}

/// Lower-cases, strips a leading `http://`/`https://` and one trailing slash, trims.
pub fn normalize_domain(domain: &str) -> String {
    let lower = domain.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let without_slash = without_scheme.strip_suffix('/').unwrap_or(without_scheme);
    without_slash.trim().to_string()
}

/// Longest host label other than the top-level one, e.g. `acme` for `shop.acme.co.uk`.
pub fn domain_stem(normalized: &str) -> Option<String> {
    let host = normalized.split('/').next().unwrap_or(normalized);
    let host = host.strip_prefix("www.").unwrap_or(host);
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return None;
    }
    labels[..labels.len() - 1]
        .iter()
        .copied()
        .max_by_key(|l| l.len())
        .filter(|l| l.len() >= MIN_STEM_LEN)
        .map(str::to_string)
}

fn compact_lower(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// `stem` equals `name` lower-cased, without whitespace and without trailing legal suffixes.
fn stem_matches(stem: &str, name: &str) -> bool {
    let lower = name.to_lowercase();
    let mut words: Vec<&str> = lower
        .split_whitespace()
        .map(|w| w.trim_end_matches(|c: char| c == '.' || c == ','))
        .filter(|w| !w.is_empty())
        .collect();
    while words.len() > 1 && words.last().is_some_and(|w| LEGAL_SUFFIXES.contains(w)) {
        words.pop();
    }
    words.concat() == stem
}

fn name_matches(name: &str, base: &str) -> bool {
    let compact = compact_lower(name);
    if compact.is_empty() {
        return false;
    }
    name.to_lowercase().contains(base) || base.contains(&compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<CompanyAliasGroup> {
        vec![
            CompanyAliasGroup::new("Bright Data", ["Luminati Networks", "brightdata.com"]),
            CompanyAliasGroup::new("Oxylabs", ["oxylabs.io"]),
            CompanyAliasGroup::new("Acme Corp", Vec::<String>::new()),
        ]
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("HTTPS://BrightData.com/"), "brightdata.com");
        assert_eq!(normalize_domain("  http://oxylabs.io "), "oxylabs.io");
        assert_eq!(normalize_domain("smartproxy.com//"), "smartproxy.com/");
        assert_eq!(normalize_domain("https://"), "");
    }

    #[test]
    fn test_domain_stem() {
        assert_eq!(domain_stem("acme.com").as_deref(), Some("acme"));
        assert_eq!(domain_stem("www.acme.com").as_deref(), Some("acme"));
        assert_eq!(domain_stem("shop.acme.co.uk").as_deref(), Some("acme"));
        assert_eq!(domain_stem("acme.com/pricing").as_deref(), Some("acme"));
        assert_eq!(domain_stem("io.io"), None);
        assert_eq!(domain_stem("localhost"), None);
    }

    #[test]
    fn test_domain_contains_compact_main_name() {
        let g = groups();
        let m = SubstringDomainMatcher::default();
        assert_eq!(m.resolve("https://brightdata.com/", &g).unwrap().main_name, "Bright Data");
        assert_eq!(m.resolve("oxylabs.io", &g).unwrap().main_name, "Oxylabs");
    }

    #[test]
    fn test_name_contains_domain() {
        let g = groups();
        let m = SubstringDomainMatcher::default();
        assert_eq!(m.resolve("Luminati", &g).unwrap().main_name, "Bright Data");
    }

    #[test]
    fn test_stem_fallback() {
        let g = groups();
        assert_eq!(
            SubstringDomainMatcher::default().resolve("acme.com", &g).unwrap().main_name,
            "Acme Corp"
        );
        let strict = SubstringDomainMatcher {
            stem_fallback: false,
        };
        assert!(strict.resolve("acme.com", &g).is_none());
    }

    #[test]
    fn test_stem_must_be_the_whole_name() {
        let g = groups();
        let m = SubstringDomainMatcher::default();
        for domain in ["oxy.com", "lumina.org", "bright.net", "corp.com"] {
            assert!(m.resolve(domain, &g).is_none(), "{domain} should not match");
        }

        let g = vec![
            CompanyAliasGroup::new("Webshare, Inc.", Vec::<String>::new()),
            CompanyAliasGroup::new("Data Impulse Ltd", Vec::<String>::new()),
        ];
        assert_eq!(m.resolve("webshare.io", &g).unwrap().main_name, "Webshare, Inc.");
        assert_eq!(m.resolve("www.dataimpulse.com", &g).unwrap().main_name, "Data Impulse Ltd");
    }

    #[test]
    fn test_first_match_wins() {
        let g = vec![
            CompanyAliasGroup::new("Proxy Seller", Vec::<String>::new()),
            CompanyAliasGroup::new("Proxy", Vec::<String>::new()),
        ];
        let m = SubstringDomainMatcher::default();
        assert_eq!(m.resolve("proxy", &g).unwrap().main_name, "Proxy Seller");
    }

    #[test]
    fn test_unknown_and_empty_domains_do_not_match() {
        let g = groups();
        let m = SubstringDomainMatcher::default();
        assert!(m.resolve("unknown-domain.xyz", &g).is_none());
        assert!(m.resolve("", &g).is_none());
        assert!(m.resolve("https:///", &g).is_none());
        assert!(m.resolve("brightdata.com", &[]).is_none());
    }
}
