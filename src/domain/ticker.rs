//! Ticker → benchmark resolution.
//!
//! A single ordered rule table maps an instrument identifier (or its
//! exchange suffix) to the index representing its home market, and decides
//! which symbol to request from the data provider. Rules are tried in order
//! and the first match wins.

use crate::domain::error::StockcorrError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleMatch {
    /// Whole identifier, e.g. `VOD`.
    Exact(String),
    /// Identifier ending, e.g. `.L`.
    Suffix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRule {
    pub matcher: RuleMatch,
    pub benchmark: String,
    pub market: String,
    /// Remove the suffix before asking the provider for prices.
    pub strip_suffix: bool,
}

impl TickerRule {
    pub fn suffix(suffix: &str, benchmark: &str, market: &str) -> Self {
        Self {
            matcher: RuleMatch::Suffix(suffix.to_uppercase()),
            benchmark: benchmark.to_string(),
            market: market.to_string(),
            strip_suffix: false,
        }
    }

    pub fn exact(identifier: &str, benchmark: &str, market: &str) -> Self {
        Self {
            matcher: RuleMatch::Exact(identifier.to_uppercase()),
            benchmark: benchmark.to_string(),
            market: market.to_string(),
            strip_suffix: false,
        }
    }

    pub fn stripped(mut self) -> Self {
        self.strip_suffix = true;
        self
    }

    /// Provider symbol if this rule matches `identifier` (already normalised).
    fn apply(&self, identifier: &str) -> Option<String> {
        match &self.matcher {
            RuleMatch::Exact(id) => (id == identifier).then(|| identifier.to_string()),
            RuleMatch::Suffix(suffix) => {
                let stem = identifier.strip_suffix(suffix.as_str())?;
                if stem.is_empty() {
                    return None;
                }
                Some(if self.strip_suffix {
                    stem.to_string()
                } else {
                    identifier.to_string()
                })
            }
        }
    }

    fn label(&self) -> &str {
        match &self.matcher {
            RuleMatch::Exact(id) => id,
            RuleMatch::Suffix(suffix) => suffix,
        }
    }
}

impl fmt::Display for TickerRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.matcher {
            RuleMatch::Exact(_) => "exact",
            RuleMatch::Suffix(_) => "suffix",
        };
        write!(f, "{}:{}={}", kind, self.label(), self.benchmark)?;
        if self.strip_suffix {
            write!(f, "/strip")?;
        }
        if !self.market.is_empty() {
            write!(f, "@{}", self.market)?;
        }
        Ok(())
    }
}

/// Outcome of resolving one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTicker {
    /// Identifier as entered (normalised to upper case).
    pub identifier: String,
    /// Symbol to request from the data provider.
    pub provider_symbol: String,
    pub benchmark: String,
    /// Market label; the benchmark symbol when the rule has none.
    pub market: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRules {
    rules: Vec<TickerRule>,
}

impl Default for TickerRules {
    /// Exchange suffixes for London, Frankfurt, Paris and US listings, plus
    /// the bare US/UK tickers from the standard batch list.
    fn default() -> Self {
        Self::new(vec![
            TickerRule::suffix(".L", "^FTSE", "FTSE 100"),
            TickerRule::suffix(".DE", "^GDAXI", "DAX"),
            TickerRule::suffix(".PA", "^FCHI", "CAC 40"),
            TickerRule::suffix(".US", "^GSPC", "S&P 500").stripped(),
            TickerRule::exact("VOD", "^FTSE", "FTSE 100"),
            TickerRule::exact("NVDA", "^GSPC", "S&P 500"),
            TickerRule::exact("AAPL", "^GSPC", "S&P 500"),
        ])
    }
}

impl TickerRules {
    pub fn new(rules: Vec<TickerRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[TickerRule] {
        &self.rules
    }

    /// Suffixes and exact identifiers accepted, in priority order.
    pub fn supported(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.label().to_string()).collect()
    }

    pub fn resolve(&self, identifier: &str) -> Result<ResolvedTicker, StockcorrError> {
        let normalised = identifier.trim().to_uppercase();
        if !normalised.is_empty() {
            for rule in &self.rules {
                if let Some(provider_symbol) = rule.apply(&normalised) {
                    return Ok(ResolvedTicker {
                        identifier: normalised,
                        provider_symbol,
                        benchmark: rule.benchmark.clone(),
                        market: if rule.market.is_empty() {
                            rule.benchmark.clone()
                        } else {
                            rule.market.clone()
                        },
                    });
                }
            }
        }
        Err(StockcorrError::UnsupportedInstrument {
            identifier: identifier.trim().to_string(),
            supported: self.supported(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickerRuleError {
    #[error("empty rule in rule list")]
    EmptyRule,

    #[error("rule '{0}' must look like suffix:.L=^FTSE or exact:VOD=^FTSE")]
    Malformed(String),

    #[error("unknown rule kind '{0}' (expected suffix or exact)")]
    UnknownKind(String),

    #[error("unknown rule modifier '{0}' (expected strip)")]
    UnknownModifier(String),

    #[error("strip only applies to suffix rules: '{0}'")]
    StripOnExact(String),

    #[error("duplicate rule for {0}")]
    Duplicate(String),
}

/// Parse a comma-separated rule list.
///
/// Each entry is `KIND:PATTERN=BENCHMARK[/strip][@Market label]`, where KIND
/// is `suffix` or `exact`.
pub fn parse_rules(input: &str) -> Result<TickerRules, TickerRuleError> {
    let mut rules = Vec::new();

    for token in input.split(',') {
        let entry = token.trim();
        if entry.is_empty() {
            return Err(TickerRuleError::EmptyRule);
        }

        let (body, market) = match entry.split_once('@') {
            Some((body, market)) => (body.trim(), market.trim()),
            None => (entry, ""),
        };
        let (kind, mapping) = body
            .split_once(':')
            .ok_or_else(|| TickerRuleError::Malformed(entry.to_string()))?;
        let (pattern, target) = mapping
            .split_once('=')
            .ok_or_else(|| TickerRuleError::Malformed(entry.to_string()))?;
        let (benchmark, modifier) = match target.split_once('/') {
            Some((b, m)) => (b.trim(), Some(m.trim())),
            None => (target.trim(), None),
        };
        let pattern = pattern.trim();
        if pattern.is_empty() || benchmark.is_empty() {
            return Err(TickerRuleError::Malformed(entry.to_string()));
        }

        let mut rule = match kind.trim().to_lowercase().as_str() {
            "suffix" => TickerRule::suffix(pattern, benchmark, market),
            "exact" => TickerRule::exact(pattern, benchmark, market),
            other => return Err(TickerRuleError::UnknownKind(other.to_string())),
        };
        match modifier {
            None => {}
            Some(m) if m.eq_ignore_ascii_case("strip") => {
                if matches!(rule.matcher, RuleMatch::Exact(_)) {
                    return Err(TickerRuleError::StripOnExact(entry.to_string()));
                }
                rule = rule.stripped();
            }
            Some(m) => return Err(TickerRuleError::UnknownModifier(m.to_string())),
        }

        if rules.iter().any(|r: &TickerRule| r.matcher == rule.matcher) {
            return Err(TickerRuleError::Duplicate(rule.label().to_string()));
        }
        rules.push(rule);
    }

    Ok(TickerRules::new(rules))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange_rules() -> TickerRules {
        TickerRules::new(vec![
            TickerRule::suffix(".L", "FTSE", ""),
            TickerRule::suffix(".DE", "DAX", ""),
            TickerRule::suffix(".PA", "CAC", ""),
            TickerRule::suffix(".US", "S&P", "").stripped(),
        ])
    }

    #[test]
    fn resolve_strips_us_suffix() {
        let resolved = exchange_rules().resolve("AMZN.US").unwrap();
        assert_eq!(resolved.benchmark, "S&P");
        assert_eq!(resolved.provider_symbol, "AMZN");
        assert_eq!(resolved.identifier, "AMZN.US");
    }

    #[test]
    fn resolve_keeps_london_suffix() {
        let resolved = exchange_rules().resolve("VOD.L").unwrap();
        assert_eq!(resolved.benchmark, "FTSE");
        assert_eq!(resolved.provider_symbol, "VOD.L");
    }

    #[test]
    fn resolve_unsupported_suffix() {
        let err = exchange_rules().resolve("XXX.ZZ").unwrap_err();
        match err {
            StockcorrError::UnsupportedInstrument {
                identifier,
                supported,
            } => {
                assert_eq!(identifier, "XXX.ZZ");
                assert_eq!(supported, vec![".L", ".DE", ".PA", ".US"]);
            }
            other => panic!("expected UnsupportedInstrument, got: {other}"),
        }
    }

    #[test]
    fn resolve_empty_identifier() {
        assert!(matches!(
            exchange_rules().resolve("   "),
            Err(StockcorrError::UnsupportedInstrument { .. })
        ));
    }

    #[test]
    fn bare_suffix_does_not_match() {
        assert!(exchange_rules().resolve(".L").is_err());
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let resolved = exchange_rules().resolve(" bp.l ").unwrap();
        assert_eq!(resolved.provider_symbol, "BP.L");
    }

    #[test]
    fn first_match_wins() {
        let rules = TickerRules::new(vec![
            TickerRule::suffix(".L", "^FTSE", ""),
            TickerRule::suffix("L", "^OTHER", ""),
        ]);
        assert_eq!(rules.resolve("BP.L").unwrap().benchmark, "^FTSE");
        assert_eq!(rules.resolve("BPL").unwrap().benchmark, "^OTHER");
    }

    #[test]
    fn default_rules_cover_batch_list() {
        let rules = TickerRules::default();
        for (id, bench) in [
            ("VOD", "^FTSE"),
            ("BP.L", "^FTSE"),
            ("NVDA", "^GSPC"),
            ("AAPL", "^GSPC"),
            ("RHM.DE", "^GDAXI"),
            ("SAP.DE", "^GDAXI"),
            ("OR.PA", "^FCHI"),
            ("MC.PA", "^FCHI"),
        ] {
            assert_eq!(rules.resolve(id).unwrap().benchmark, bench, "{id}");
        }
    }

    #[test]
    fn parse_rules_basic() {
        let rules = parse_rules("suffix:.L=^FTSE@FTSE 100, suffix:.US=^GSPC/strip, exact:VOD=^FTSE")
            .unwrap();
        assert_eq!(rules.rules().len(), 3);
        assert_eq!(rules.rules()[0].market, "FTSE 100");
        assert!(rules.rules()[1].strip_suffix);
        assert_eq!(rules.resolve("AMZN.US").unwrap().provider_symbol, "AMZN");
        assert_eq!(rules.resolve("vod").unwrap().benchmark, "^FTSE");
    }

    #[test]
    fn parse_rules_errors() {
        assert_eq!(parse_rules("suffix:.L=^FTSE,,"), Err(TickerRuleError::EmptyRule));
        assert!(matches!(parse_rules(".L=^FTSE"), Err(TickerRuleError::Malformed(_))));
        assert!(matches!(parse_rules("suffix:.L"), Err(TickerRuleError::Malformed(_))));
        assert!(matches!(
            parse_rules("prefix:X=^Y"),
            Err(TickerRuleError::UnknownKind(k)) if k == "prefix"
        ));
        assert!(matches!(
            parse_rules("suffix:.L=^FTSE/keep"),
            Err(TickerRuleError::UnknownModifier(_))
        ));
        assert!(matches!(
            parse_rules("exact:VOD=^FTSE/strip"),
            Err(TickerRuleError::StripOnExact(_))
        ));
        assert!(matches!(
            parse_rules("suffix:.L=^FTSE, suffix:.l=^OTHER"),
            Err(TickerRuleError::Duplicate(s)) if s == ".L"
        ));
    }

    #[test]
    fn rule_display_round_trips_through_parser() {
        let rule = TickerRule::suffix(".US", "^GSPC", "S&P 500").stripped();
        assert_eq!(rule.to_string(), "suffix:.US=^GSPC/strip@S&P 500");
        let parsed = parse_rules(&rule.to_string()).unwrap();
        assert_eq!(parsed.rules()[0], rule);
    }
}
