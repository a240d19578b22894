use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

pub mod config;
pub mod input;
pub mod provider;
pub mod verify;

pub use config::{load_config, ConfigError, VerifierConfig};
pub use input::{enumerate_inputs, read_input, InputError};
pub use provider::{default_providers, HttpSearchProvider, ProbeError, SearchProvider, SearchResponse};
pub use verify::{analyze_text, summarize, CitationVerifier, VerificationSummary};

/// Scanning stops after this many characters unless configured otherwise.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 200_000;

/// Statute book a pasal belongs to. A citation without an explicit code is read as KUHP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LegalCode {
    #[default]
    #[serde(rename = "KUHP")]
    Kuhp,
    #[serde(rename = "KUHAP")]
    Kuhap,
}

impl LegalCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegalCode::Kuhp => "KUHP",
            LegalCode::Kuhap => "KUHAP",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            LegalCode::Kuhp => "Kitab Undang-Undang Hukum Pidana",
            LegalCode::Kuhap => "Kitab Undang-Undang Hukum Acara Pidana",
        }
    }

    /// Map a captured code token (abbreviation or full name, any case) to a code.
    pub fn from_token(token: &str) -> Option<Self> {
        let norm = token.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        match norm.as_str() {
            "kuhp" | "kitab undang-undang hukum pidana" => Some(LegalCode::Kuhp),
            "kuhap" | "kitab undang-undang hukum acara pidana" => Some(LegalCode::Kuhap),
            _ => None,
        }
    }
}

impl fmt::Display for LegalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized statute reference, e.g. `Pasal 340 KUHP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CitationKey {
    pub number: u32,
    pub code: LegalCode,
}

impl CitationKey {
    pub fn new(number: u32, code: LegalCode) -> Self {
        Self { number, code }
    }

    /// Bare statute number as text, the token the verifiers look for.
    pub fn bare_number(&self) -> String {
        self.number.to_string()
    }
}

impl fmt::Display for CitationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pasal {} {}", self.number, self.code)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCitationError {
    #[error("InvalidCitation: {0}")]
    Invalid(String),
}

impl FromStr for CitationKey {
    type Err = ParseCitationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = KEY_RE.captures(s.trim()).ok_or_else(|| ParseCitationError::Invalid(s.to_string()))?;
        let number = caps[1].parse::<u32>().map_err(|_| ParseCitationError::Invalid(s.to_string()))?;
        let code = LegalCode::from_token(&caps[2]).ok_or_else(|| ParseCitationError::Invalid(s.to_string()))?;
        Ok(CitationKey { number, code })
    }
}

impl Serialize for CitationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CitationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which search stage produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Site {
    OfficialGazetteSearch,
    SupremeCourtSearch,
    GeneralWebSearch,
}

impl Site {
    pub fn as_str(&self) -> &'static str {
        match self {
            Site::OfficialGazetteSearch => "official-gazette-search",
            Site::SupremeCourtSearch => "supreme-court-search",
            Site::GeneralWebSearch => "general-web-search",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceHit {
    pub site: Site,
    pub url: String,
    pub snippet: String,
}

/// Outcome of checking one citation. `verified == false` is a normal answer, not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub citation: CitationKey,
    pub verified: bool,
    #[serde(default)]
    pub sources: Vec<SourceHit>,
}

impl VerificationResult {
    pub fn unverified(citation: CitationKey) -> Self {
        Self { citation, verified: false, sources: Vec::new() }
    }

    pub fn verified(citation: CitationKey, hit: SourceHit) -> Self {
        Self { citation, verified: true, sources: vec![hit] }
    }
}

static KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^pasal\s+(\d{1,4})\s+(kuhap|kuhp)$").expect("key pattern")
});

// pasal N, up to 8 sub-clauses ("ayat (1)", "huruf a", "[2]"), optional code token
static STRICT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bpasal\s+(\d{1,4})\b(?:\s*(?:(?:ayat|huruf|angka)\s*)?(?:\(\s*[0-9a-z]{1,3}\s*\)|\[\s*[0-9a-z]{1,3}\s*\])|\s+(?:ayat|huruf|angka)\s+[0-9a-z]{1,3}\b){0,8}(?:\s*(kitab\s+undang-undang\s+hukum\s+acara\s+pidana|kitab\s+undang-undang\s+hukum\s+pidana|kuhap|kuhp)\b)?",
    )
    .expect("strict citation pattern")
});

static LOOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpasal\s+(\d{1,4})\b").expect("loose citation pattern"));

/// One citation occurrence and the byte span it was matched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub key: CitationKey,
    pub span: Range<usize>,
}

/// First pass: marker, number, optional sub-clauses and an optional code token.
/// Returns every occurrence in text order, duplicates included.
pub fn strict_pass(text: &str) -> Vec<Mention> {
    let mut out = Vec::new();
    for caps in STRICT_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let Ok(number) = caps[1].parse::<u32>() else { continue };
        let code = caps
            .get(2)
            .and_then(|m| LegalCode::from_token(m.as_str()))
            .unwrap_or_default();
        out.push(Mention { key: CitationKey::new(number, code), span: whole.range() });
    }
    out
}

/// Second pass: marker plus digits only, code defaults to KUHP.
/// Occurrences starting inside a span in `covered` were already read by the strict pass and are skipped.
pub fn loose_pass(text: &str, covered: &[Range<usize>]) -> Vec<Mention> {
    let mut out = Vec::new();
    for caps in LOOSE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if covered.iter().any(|r| r.contains(&whole.start())) {
            continue;
        }
        let Ok(number) = caps[1].parse::<u32>() else { continue };
        out.push(Mention { key: CitationKey::new(number, LegalCode::Kuhp), span: whole.range() });
    }
    out
}

/// Scans free-form memo text for pasal citations.
#[derive(Debug, Clone)]
pub struct CitationExtractor {
    pub max_input_chars: usize,
}

impl Default for CitationExtractor {
    fn default() -> Self {
        Self { max_input_chars: DEFAULT_MAX_INPUT_CHARS }
    }
}

impl CitationExtractor {
    pub fn new(max_input_chars: usize) -> Self {
        Self { max_input_chars }
    }

    pub fn from_config(cfg: &VerifierConfig) -> Self {
        Self::new(cfg.max_input_chars)
    }

    /// Deduplicated citation keys in order of first appearance: strict-pass keys first,
    /// then whatever the loose pass adds. `None` and empty text give an empty list.
    pub fn extract<'a>(&self, text: impl Into<Option<&'a str>>) -> Vec<CitationKey> {
        let Some(text) = text.into() else { return Vec::new() };
        let window = scan_window(text, self.max_input_chars);
        if window.is_empty() {
            return Vec::new();
        }

        let strict = strict_pass(window);
        let covered: Vec<Range<usize>> = strict.iter().map(|m| m.span.clone()).collect();
        let loose = loose_pass(window, &covered);

        let mut seen: HashSet<String> = HashSet::new();
        let mut keys = Vec::new();
        for mention in strict.into_iter().chain(loose) {
            if seen.insert(mention.key.to_string()) {
                keys.push(mention.key);
            }
        }
        keys
    }
}

/// Extract with the default input ceiling.
pub fn extract_citations<'a>(text: impl Into<Option<&'a str>>) -> Vec<CitationKey> {
    CitationExtractor::default().extract(text)
}

fn scan_window(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            warn!(max_chars, total_bytes = text.len(), "input exceeds scan ceiling, truncating");
            &text[..cut]
        }
        None => text,
    }
}
