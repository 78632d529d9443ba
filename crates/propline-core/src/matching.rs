// Join-key normalization for names coming from two different sources.
//
// With no steps configured the key is the name itself, so the join is exact
// string equality. Each step folds away one kind of cosmetic difference
// between the projection export and the OCR text.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "v"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldStep {
    CaseFold,
    StripSuffixes,
    FoldAccents,
    StripPunctuation,
}

impl FoldStep {
    fn apply(self, name: &str) -> String {
        match self {
            FoldStep::CaseFold => name.to_lowercase(),
            FoldStep::StripSuffixes => strip_suffixes(name),
            FoldStep::FoldAccents => name.chars().map(fold_accent).collect(),
            FoldStep::StripPunctuation => strip_punctuation(name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMatcher {
    steps: Vec<FoldStep>,
}

impl NameMatcher {
    /// Exact matching.
    pub fn exact() -> Self {
        Self::default()
    }

    pub fn new(steps: Vec<FoldStep>) -> Self {
        NameMatcher { steps }
    }

    pub fn key<'n>(&self, name: &'n str) -> Cow<'n, str> {
        if self.steps.is_empty() {
            return Cow::Borrowed(name);
        }
        let mut key = name.to_string();
        for step in &self.steps {
            key = step.apply(&key);
        }
        Cow::Owned(key)
    }
}

fn strip_suffixes(name: &str) -> String {
    let mut words: Vec<&str> = name.split_whitespace().collect();
    while words.len() > 1 {
        let Some(last) = words.last() else { break };
        let bare = last.trim_end_matches('.').trim_start_matches(',').to_lowercase();
        if NAME_SUFFIXES.contains(&bare.as_str()) {
            words.pop();
        } else {
            break;
        }
    }
    words.join(" ").trim_end_matches(',').to_string()
}

fn strip_punctuation(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| !matches!(c, '.' | '\'' | '’' | ','))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' | 'ć' | 'č' => 'c',
        'Ç' | 'Ć' | 'Č' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' | 'ń' => 'n',
        'Ñ' | 'Ń' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'š' => 's',
        'Š' => 'S',
        'ž' => 'z',
        'Ž' => 'Z',
        other => other,
    }
}
