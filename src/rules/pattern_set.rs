use serde::{Deserialize, Deserializer};
use std::borrow::Cow;

/// A raw rule row as found in the bugs list
///
/// The upstream feed ships ids as numeric strings, so both `"12"` and `12`
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleRow {
    #[serde(deserialize_with = "deserialize_rule_id")]
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", alias = "category", default)]
    pub category: String,
    pub pattern: String,
}

fn deserialize_rule_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid bug id '{}'", text))),
    }
}

/// A compiled bug pattern
///
/// Most patterns compile with the linear-time `regex` engine and match the raw
/// body bytes. Patterns that need look-around or backreferences fall back to
/// `fancy_regex`, which matches a lossily decoded copy of the body.
#[derive(Debug, Clone)]
pub enum RulePattern {
    Fast(regex::bytes::Regex),
    Fancy(fancy_regex::Regex),
}

impl RulePattern {
    /// Compiles `pattern`, trying the fast engine first
    ///
    /// On failure the error of the fallback engine is returned.
    pub fn compile(pattern: &str) -> Result<Self, fancy_regex::Error> {
        match regex::bytes::Regex::new(pattern) {
            Ok(regex) => Ok(RulePattern::Fast(regex)),
            Err(_) => fancy_regex::Regex::new(pattern).map(RulePattern::Fancy),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RulePattern::Fast(regex) => regex.as_str(),
            RulePattern::Fancy(regex) => regex.as_str(),
        }
    }

    pub fn is_fancy(&self) -> bool {
        matches!(self, RulePattern::Fancy(_))
    }

    /// `text` is the decoded body, only needed by fallback patterns
    fn is_match(&self, content: &[u8], text: &str) -> bool {
        match self {
            RulePattern::Fast(regex) => regex.is_match(content),
            // Backtrack-limit errors count as no match
            RulePattern::Fancy(regex) => regex.is_match(text).unwrap_or(false),
        }
    }
}

/// A compiled bug rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub pattern: RulePattern,
}

/// Ordered, immutable collection of compiled rules
///
/// Iteration order is ascending by id. Matching holds no state, so one set can
/// be shared by every worker behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    rules: Vec<Rule>,
    has_fancy: bool,
}

impl PatternSet {
    /// Compiles every row, dropping the ones whose pattern is invalid
    ///
    /// # Returns
    ///
    /// The active set and the number of rows that were skipped.
    pub fn load<I>(rows: I) -> (Self, usize)
    where
        I: IntoIterator<Item = RuleRow>,
    {
        let mut rules = Vec::new();
        let mut skipped = 0;

        for row in rows {
            match RulePattern::compile(&row.pattern) {
                Ok(pattern) => rules.push(Rule {
                    id: row.id,
                    name: row.name,
                    category: row.category,
                    pattern,
                }),
                Err(e) => {
                    tracing::warn!("Ignored bug {}: {} ({})", row.id, row.pattern, e);
                    skipped += 1;
                }
            }
        }

        rules.sort_by_key(|rule| rule.id);
        let has_fancy = rules.iter().any(|rule| rule.pattern.is_fancy());

        (Self { rules, has_fancy }, skipped)
    }

    /// Returns the ids of every rule found anywhere in `content`, in id order
    pub fn matches(&self, content: &[u8]) -> Vec<u64> {
        let text = if self.has_fancy {
            String::from_utf8_lossy(content)
        } else {
            Cow::Borrowed("")
        };

        self.rules
            .iter()
            .filter(|rule| rule.pattern.is_match(content, &text))
            .map(|rule| rule.id)
            .collect()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
