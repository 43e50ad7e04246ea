use std::collections::BTreeMap;

/// Maps package short names to display names: an explicit override table
/// first, a generic title-case fallback second. Pure and deterministic.
#[derive(Debug, Clone)]
pub struct NamingResolver {
    overrides: BTreeMap<String, String>,
}

impl NamingResolver {
    pub fn new(overrides: BTreeMap<String, String>) -> Self {
        Self { overrides }
    }

    /// Override value verbatim when present, title-cased short name
    /// otherwise.
    pub fn display_name(&self, short_name: &str) -> String {
        if let Some(name) = self.overrides.get(short_name) {
            return name.clone();
        }
        title_case(short_name)
    }
}

/// First character of the identifier, lower-cased. Empty input stays empty.
pub fn first_char_lower(s: &str) -> String {
    s.chars()
        .next()
        .map(|c| c.to_lowercase().to_string())
        .unwrap_or_default()
}

/// The whole identifier with its first character lower-cased.
pub fn lower_case_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Word-wise title casing: first character upper-cased, the rest lowered.
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn resolver() -> NamingResolver {
        NamingResolver::new(Config::default().naming_overrides)
    }

    #[test]
    fn overrides_take_precedence() {
        assert_eq!(resolver().display_name("sts"), "STS");
        assert_eq!(resolver().display_name("dynamodb"), "DynamoDB");
    }

    #[test]
    fn unknown_names_fall_back_to_title_case() {
        assert_eq!(resolver().display_name("somenewservice"), "Somenewservice");
        assert_eq!(resolver().display_name("sQs"), "Sqs");
    }

    #[test]
    fn first_char_lower_takes_one_character() {
        assert_eq!(first_char_lower("DynamoDB"), "d");
        assert_eq!(first_char_lower(""), "");
    }

    #[test]
    fn lower_case_first_keeps_the_rest() {
        assert_eq!(lower_case_first("DynamoDB"), "dynamoDB");
        assert_eq!(lower_case_first("STS"), "sTS");
        assert_eq!(lower_case_first(""), "");
    }
}
