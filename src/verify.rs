use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::provider::{default_providers, ProbeError, SearchProvider, SearchResponse};
use crate::{CitationExtractor, CitationKey, SourceHit, VerificationResult, VerifierConfig};

/// Probes search providers in order for each citation.
pub struct CitationVerifier {
    providers: Vec<Arc<dyn SearchProvider>>,
    probe_timeout: Duration,
}

impl CitationVerifier {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>, probe_timeout: Duration) -> Self {
        Self { providers, probe_timeout }
    }

    pub fn from_config(cfg: &VerifierConfig) -> Result<Self, ProbeError> {
        Ok(Self::new(default_providers(cfg)?, cfg.provider_timeout()))
    }

    pub fn providers(&self) -> &[Arc<dyn SearchProvider>] {
        &self.providers
    }

    /// Best-effort check of one citation.
    ///
    /// Stages run in order, and inside a stage each query variant runs in order. The first
    /// response whose body matches wins, and nothing after it is requested. A timeout,
    /// transport error or non-2xx status counts as "no match". The result is probabilistic:
    /// `verified` only means a search page mentioned "pasal" and the number, not that the
    /// citation is correct. It never fails; the worst case is `verified == false`.
    pub async fn verify(&self, key: &CitationKey) -> VerificationResult {
        for provider in &self.providers {
            let site = provider.site();
            for query in provider.queries(key) {
                match self.probe(provider.as_ref(), &query).await {
                    Ok(resp) if provider.matches(&resp.body, key) => {
                        info!(citation = %key, site = %site, url = %resp.url, "citation corroborated");
                        let snippet = format!(
                            "{} results for \"{}\" mention \"pasal\" and \"{}\"",
                            site,
                            query,
                            key.bare_number()
                        );
                        return VerificationResult::verified(*key, SourceHit { site, url: resp.url, snippet });
                    }
                    Ok(resp) => {
                        debug!(citation = %key, site = %site, url = %resp.url, "no match");
                    }
                    Err(e) => {
                        debug!(citation = %key, site = %site, query = %query, error = %e, "probe failed, treating as no match");
                    }
                }
            }
        }
        debug!(citation = %key, "unverified");
        VerificationResult::unverified(*key)
    }

    async fn probe(&self, provider: &dyn SearchProvider, query: &str) -> Result<SearchResponse, ProbeError> {
        match tokio::time::timeout(self.probe_timeout, provider.search(query)).await {
            Ok(res) => res,
            Err(_) => Err(ProbeError::Timeout(self.probe_timeout.as_millis() as u64)),
        }
    }

    /// Verify every key concurrently and wait for all of them. Output position `i`
    /// belongs to `keys[i]`. A panic inside one verification yields an unverified
    /// entry for that key only.
    pub async fn verify_all(&self, keys: &[CitationKey]) -> Vec<VerificationResult> {
        let pending = keys.iter().map(|key| async move {
            match AssertUnwindSafe(self.verify(key)).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    warn!(citation = %key, "verification panicked, reporting unverified");
                    VerificationResult::unverified(*key)
                }
            }
        });
        join_all(pending).await
    }
}

/// Extract citations from one memo and verify all of them.
pub async fn analyze_text(text: &str, extractor: &CitationExtractor, verifier: &CitationVerifier) -> Vec<VerificationResult> {
    let keys = extractor.extract(text);
    if keys.is_empty() {
        return Vec::new();
    }
    verifier.verify_all(&keys).await
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub verified: usize,
    pub unverified: usize,
}

pub fn summarize(results: &[VerificationResult]) -> VerificationSummary {
    let verified = results.iter().filter(|r| r.verified).count();
    VerificationSummary { total: results.len(), verified, unverified: results.len() - verified }
}
