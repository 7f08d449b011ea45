use crate::error::Result;
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// An ordered substitution applied during label normalization. The pattern
/// is a regular expression matched against the lowercased input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRule {
    pub pattern: String,
    pub replacement: String,
}

impl SubstitutionRule {
    pub fn new(pattern: &str, replacement: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        }
    }
}

/// The default rules: spaces become underscores and accented vowels and
/// cedillas collapse to their unaccented ASCII equivalents.
pub fn default_rules() -> Vec<SubstitutionRule> {
    vec![
        SubstitutionRule::new(" ", "_"),
        SubstitutionRule::new("à|á|ã", "a"),
        SubstitutionRule::new("ç", "c"),
        SubstitutionRule::new("õ|ó|ò", "o"),
        SubstitutionRule::new("é|ê", "e"),
        SubstitutionRule::new("í|ì", "i"),
        SubstitutionRule::new("ú|ù", "u"),
    ]
}

/// Normalizes a label with the default rules: lowercases, applies each
/// substitution in order, then strips trailing underscores.
pub fn normalize_label(text: &str) -> String {
    normalize_label_with(text, &default_rules()).expect("default rules are valid patterns")
}

/// Normalizes a label with caller-supplied rules. An invalid pattern is an
/// error; an empty input yields an empty output.
pub fn normalize_label_with(text: &str, rules: &[SubstitutionRule]) -> Result<String> {
    let mut out = text.to_lowercase();
    for rule in rules {
        let re = Regex::new(&rule.pattern)?;
        out = re.replace_all(&out, rule.replacement.as_str()).into_owned();
    }
    while out.ends_with('_') {
        out.pop();
    }
    Ok(out)
}

/// Normalizes a sequence of labels with the default rules.
pub fn normalize_labels<S: AsRef<str>>(texts: &[S]) -> Vec<String> {
    texts
        .iter()
        .map(|text| normalize_label(text.as_ref()))
        .collect()
}

/// Renames every column of the frame through the default rules.
pub fn normalize_column_names(df: &mut DataFrame) -> Result<()> {
    let names: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|name| name.to_string())
        .collect();

    for name in names {
        let cleaned = normalize_label(&name);
        if cleaned != name {
            df.rename(&name, cleaned.into())?;
        }
    }
    Ok(())
}
