//! Search providers the verifier probes, one per external site.
//!
//! Every provider answers the same two questions: what raw body does a query return,
//! and does that body corroborate a citation. Swapping a scraped site for an
//! authorized legal-database API only means another [`SearchProvider`] impl.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use thiserror::Error;

use crate::{CitationKey, Site, VerifierConfig};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("TransportError: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HttpStatus: {0}")]
    Status(u16),
    #[error("Timeout: no response within {0} ms")]
    Timeout(u64),
}

/// Raw search page plus the exact URL that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResponse {
    pub url: String,
    pub body: String,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn site(&self) -> Site;

    /// Query variants for one citation, tried in order until one matches.
    fn queries(&self, key: &CitationKey) -> Vec<String>;

    async fn search(&self, query: &str) -> Result<SearchResponse, ProbeError>;

    fn matches(&self, body: &str, key: &CitationKey) -> bool {
        body_mentions(body, key)
    }
}

/// Loose corroboration check: the lower-cased body contains "pasal" and the bare number
/// somewhere. Says nothing about whether the two belong together.
pub fn body_mentions(body: &str, key: &CitationKey) -> bool {
    let lower = body.to_lowercase();
    lower.contains("pasal") && lower.contains(&key.bare_number())
}

/// How a provider phrases its queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStyle {
    /// "KUHP Pasal 340", "Pasal 340 KUHP", "Pasal 340 Kitab Undang-Undang Hukum Pidana"
    Variants,
    /// "Pasal 340 KUHP"
    Single,
    /// "\"Pasal 340 KUHP\""
    Quoted,
}

impl QueryStyle {
    pub fn build(&self, key: &CitationKey) -> Vec<String> {
        match self {
            QueryStyle::Variants => vec![
                format!("{} Pasal {}", key.code, key.number),
                key.to_string(),
                format!("Pasal {} {}", key.number, key.code.full_name()),
            ],
            QueryStyle::Single => vec![key.to_string()],
            QueryStyle::Quoted => vec![format!("\"{}\"", key)],
        }
    }
}

/// GET `{base_url}?{param}={query}` against a public search page.
#[derive(Debug, Clone)]
pub struct HttpSearchProvider {
    site: Site,
    client: reqwest::Client,
    base_url: String,
    param: String,
    style: QueryStyle,
    user_agent: Option<String>,
}

impl HttpSearchProvider {
    pub fn new(site: Site, client: reqwest::Client, base_url: &str, param: &str, style: QueryStyle) -> Self {
        Self {
            site,
            client,
            base_url: base_url.trim_end_matches('?').to_string(),
            param: param.to_string(),
            style,
            user_agent: None,
        }
    }

    /// JDIH BPK regulation search.
    pub fn official_gazette(client: reqwest::Client, base_url: &str) -> Self {
        Self::new(Site::OfficialGazetteSearch, client, base_url, "keywords", QueryStyle::Variants)
    }

    /// Mahkamah Agung ruling search.
    pub fn supreme_court(client: reqwest::Client, base_url: &str) -> Self {
        Self::new(Site::SupremeCourtSearch, client, base_url, "q", QueryStyle::Single)
    }

    pub fn general_web(client: reqwest::Client, base_url: &str, user_agent: &str) -> Self {
        Self::new(Site::GeneralWebSearch, client, base_url, "q", QueryStyle::Quoted).with_user_agent(user_agent)
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    pub fn query_url(&self, query: &str) -> String {
        let sep = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}={}", self.base_url, sep, self.param, urlencoding::encode(query))
    }
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    fn site(&self) -> Site {
        self.site
    }

    fn queries(&self, key: &CitationKey) -> Vec<String> {
        self.style.build(key)
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, ProbeError> {
        let url = self.query_url(query);
        let mut req = self.client.get(&url);
        if let Some(ua) = &self.user_agent {
            req = req.header(USER_AGENT, ua.as_str());
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        Ok(SearchResponse { url, body })
    }
}

/// Gazette search, then supreme-court search, then (only when enabled) general web search.
pub fn default_providers(cfg: &VerifierConfig) -> Result<Vec<Arc<dyn SearchProvider>>, ProbeError> {
    let client = reqwest::Client::builder().timeout(cfg.provider_timeout()).build()?;

    let mut providers: Vec<Arc<dyn SearchProvider>> = vec![
        Arc::new(HttpSearchProvider::official_gazette(client.clone(), &cfg.gazette_search_url)),
        Arc::new(HttpSearchProvider::supreme_court(client.clone(), &cfg.supreme_court_search_url)),
    ];
    if cfg.enable_fallback_search {
        providers.push(Arc::new(HttpSearchProvider::general_web(client, &cfg.web_search_url, &cfg.user_agent)));
    }
    Ok(providers)
}
