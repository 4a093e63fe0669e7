use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;

pub const SUFFIX_LEN: usize = 4;

/// Builds destination api names that satisfy the platform's naming rule:
/// ASCII letters, digits and single underscores, never ending in `_`.
#[derive(Debug, Clone)]
pub struct ApiNameRules {
    disallowed: Regex,
    repeated_underscores: Regex,
}

impl ApiNameRules {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            disallowed: Regex::new(r"[^A-Za-z0-9_]")?,
            repeated_underscores: Regex::new(r"_{2,}")?,
        })
    }

    /// `{source_api_name}_{prefix}_{suffix}` where the prefix is the label
    /// prefix with spaces and hyphens turned into underscores and anything
    /// else non-alphanumeric dropped.
    pub fn derive(&self, source_api_name: &str, label_prefix: &str, suffix: &str) -> String {
        let prefix = label_prefix.replace([' ', '-'], "_");
        let prefix = self.disallowed.replace_all(&prefix, "");
        let joined = format!("{source_api_name}_{prefix}_{suffix}");
        self.repeated_underscores
            .replace_all(&joined, "_")
            .trim_end_matches('_')
            .to_string()
    }
}

pub fn random_suffix<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}
