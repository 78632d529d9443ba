// Name and team/position cleanup for the projection export.

/// Export artifact appended to names when a player photo is present.
pub const DEFAULT_NOISE_TOKENS: &[&str] = &["Headshot"];

/// Removes known noise substrings from raw player names.
#[derive(Debug, Clone)]
pub struct NameCleaner {
    noise_tokens: Vec<String>,
}

impl Default for NameCleaner {
    fn default() -> Self {
        NameCleaner::new(DEFAULT_NOISE_TOKENS.iter().copied())
    }
}

impl NameCleaner {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameCleaner {
            noise_tokens: tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect(),
        }
    }

    pub fn clean(&self, raw: &str) -> String {
        let mut name = raw.to_string();
        for token in &self.noise_tokens {
            if name.contains(token.as_str()) {
                name = name.replace(token.as_str(), "");
            }
        }
        name.trim().to_string()
    }
}

/// Split a concatenated team+position token such as `LionsLionsRB`.
///
/// The last two characters are the position code. Tokens of two characters or
/// fewer come back unchanged as the team, with no position.
pub fn split_team_position(token: &str) -> (String, Option<String>) {
    let token = token.trim();
    let char_count = token.chars().count();
    if char_count <= 2 {
        return (token.to_string(), None);
    }
    // Byte offset of the second-to-last character.
    let split_at = token
        .char_indices()
        .nth(char_count - 2)
        .map(|(idx, _)| idx)
        .unwrap_or(token.len());
    let (team, position) = token.split_at(split_at);
    (team.trim().to_string(), Some(position.to_string()))
}
