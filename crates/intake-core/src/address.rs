//! Heuristic mailing-address validation.
//!
//! This is not a postal lookup. It checks that an address *looks* complete:
//! a street number, a city segment, a US state token, and a ZIP code. The
//! verdict lists whichever components are missing so the caller can ask the
//! patient for exactly those.

use serde::{Deserialize, Serialize};

/// The four address components checked, in the order they are reported.
const COMPONENT_LABELS: [&str; 4] = ["street number", "city", "state", "ZIP code"];

/// US state tokens recognized as a standalone word: two-letter postal codes
/// and full names. Two-word names are matched on adjacent-token windows.
const STATE_TOKENS: [&str; 100] = [
    "al", "alabama", "ak", "alaska", "az", "arizona", "ar", "arkansas", "ca", "california", "co",
    "colorado", "ct", "connecticut", "de", "delaware", "fl", "florida", "ga", "georgia", "hi",
    "hawaii", "id", "idaho", "il", "illinois", "in", "indiana", "ia", "iowa", "ks", "kansas",
    "ky", "kentucky", "la", "louisiana", "me", "maine", "md", "maryland", "ma", "massachusetts",
    "mi", "michigan", "mn", "minnesota", "ms", "mississippi", "mo", "missouri", "mt", "montana",
    "ne", "nebraska", "nv", "nevada", "nh", "new hampshire", "nj", "new jersey", "nm",
    "new mexico", "ny", "new york", "nc", "north carolina", "nd", "north dakota", "oh", "ohio",
    "ok", "oklahoma", "or", "oregon", "pa", "pennsylvania", "ri", "rhode island", "sc",
    "south carolina", "sd", "south dakota", "tn", "tennessee", "tx", "texas", "ut", "utah", "vt",
    "vermont", "va", "virginia", "wa", "washington", "wv", "west virginia", "wi", "wisconsin",
    "wy", "wyoming",
];

/// Result of validating one address string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressVerdict {
    pub valid: bool,
    /// Failed checks, always in the order: street number, city, state, ZIP code.
    pub missing_fields: Vec<String>,
    /// The input echoed verbatim when valid. No normalization is performed.
    pub formatted: Option<String>,
}

impl AddressVerdict {
    /// The sentence spoken back to the patient for this verdict.
    pub fn message(&self) -> String {
        if self.valid {
            "Address is valid".to_string()
        } else {
            format!("Address is missing: {}", self.missing_fields.join(", "))
        }
    }
}

/// Validates an address heuristically.
///
/// An address is considered valid when all four checks pass:
/// - at least one digit (street number),
/// - at least two comma-separated segments (street/city separation),
/// - a US state token present as a separate word,
/// - a 5-digit token (ZIP code).
pub fn validate(address: &str) -> AddressVerdict {
    let has_number = address.chars().any(|c| c.is_ascii_digit());
    let has_city = address.split(',').count() >= 2;
    let has_state = contains_state_token(address);
    let has_zip = address
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .any(|word| word.len() == 5 && word.chars().all(|c| c.is_ascii_digit()));

    let mut missing_fields = Vec::new();
    for (label, present) in COMPONENT_LABELS
        .iter()
        .zip([has_number, has_city, has_state, has_zip])
    {
        if !present {
            missing_fields.push((*label).to_string());
        }
    }

    let valid = missing_fields.is_empty();
    AddressVerdict {
        valid,
        missing_fields,
        formatted: valid.then(|| address.to_string()),
    }
}

fn contains_state_token(address: &str) -> bool {
    let lowered = address.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect();

    for (i, token) in tokens.iter().enumerate() {
        if STATE_TOKENS.contains(token) {
            return true;
        }
        // Two-word state names ("new york", "rhode island", ...).
        if let Some(next) = tokens.get(i + 1) {
            let pair = format!("{token} {next}");
            if STATE_TOKENS.contains(&pair.as_str()) {
                return true;
            }
        }
    }
    false
}
