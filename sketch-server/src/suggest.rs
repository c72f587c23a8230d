//! Confidence bands and related-term suggestions for guesses.

use sketch_core::MAX_SUGGESTIONS;

/// Answers this short or shorter land in the low band.
pub const SHORT_ANSWER_CHARS: usize = 4;
/// Answers this long or longer land in the high band.
pub const DETAILED_ANSWER_CHARS: usize = 40;

const LOW_CONFIDENCE: f32 = 0.6;
const MID_CONFIDENCE: f32 = 0.8;
const HIGH_CONFIDENCE: f32 = 0.9;

/// Confidence for a remote answer, derived from its length.
///
/// This is an approximation, not a measured quality signal: the remote
/// model's self-reported confidence is not trusted, so a more detailed
/// answer is simply taken to mean a more certain one.
#[must_use]
pub fn confidence_from_response(answer: &str) -> f32 {
    let len = answer.trim().chars().count();
    if len <= SHORT_ANSWER_CHARS {
        LOW_CONFIDENCE
    } else if len >= DETAILED_ANSWER_CHARS {
        HIGH_CONFIDENCE
    } else {
        MID_CONFIDENCE
    }
}

struct Category {
    name: &'static str,
    keywords: &'static [&'static str],
    related: &'static [&'static str],
}

const TAXONOMY: &[Category] = &[
    Category {
        name: "animal",
        keywords: &[
            "animal", "cat", "dog", "bird", "fish", "horse", "cow", "pig", "rabbit", "bear",
            "lion", "elephant", "mouse", "snake", "duck", "giraffe",
        ],
        related: &["cat", "dog", "bird", "fish", "horse"],
    },
    Category {
        name: "nature",
        keywords: &[
            "tree", "flower", "sun", "moon", "star", "cloud", "mountain", "plant", "leaf",
            "rainbow", "grass", "river", "ocean",
        ],
        related: &["tree", "flower", "sun", "cloud", "mountain"],
    },
    Category {
        name: "vehicle-building",
        keywords: &[
            "car", "house", "building", "truck", "bus", "boat", "ship", "plane", "airplane",
            "train", "bicycle", "bike", "rocket", "castle", "bridge", "tower",
        ],
        related: &["car", "house", "boat", "airplane", "building"],
    },
    Category {
        name: "person",
        keywords: &[
            "person", "people", "man", "woman", "face", "child", "boy", "girl", "human",
            "stick figure", "smiley",
        ],
        related: &["person", "face", "stick figure", "smiley face"],
    },
];

const GENERIC: &[&str] = &["object", "pattern", "shape"];

/// The taxonomy category a guess falls under, if any.
#[must_use]
pub fn category_of(guess: &str) -> Option<&'static str> {
    matching_category(&guess.to_lowercase()).map(|c| c.name)
}

fn matching_category(lowered: &str) -> Option<&'static Category> {
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    TAXONOMY.iter().find(|category| {
        category.keywords.iter().any(|keyword| {
            if keyword.contains(' ') {
                lowered.contains(keyword)
            } else {
                words
                    .iter()
                    .any(|w| w == keyword || w.strip_suffix('s') == Some(*keyword))
            }
        })
    })
}

/// Related terms for a guess, excluding the guess itself, at most
/// [`MAX_SUGGESTIONS`].
#[must_use]
pub fn suggestions_for(guess: &str) -> Vec<String> {
    let lowered = guess.trim().to_lowercase();
    let pool = matching_category(&lowered).map_or(GENERIC, |c| c.related);

    pool.iter()
        .filter(|term| **term != lowered)
        .take(MAX_SUGGESTIONS)
        .map(|term| (*term).to_string())
        .collect()
}
