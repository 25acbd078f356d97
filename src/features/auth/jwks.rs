use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Google's published key set (only the fields RS256 verification needs)
#[derive(Debug, Deserialize)]
struct KeySet {
    keys: Vec<PublishedKey>,
}

#[derive(Debug, Deserialize)]
struct PublishedKey {
    kid: String,
    kty: String,
    n: String,
    e: String,
}

#[derive(Default)]
struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

impl KeyCache {
    fn fresh_key(&self, kid: &str, ttl: Duration) -> Option<DecodingKey> {
        let fetched_at = self.fetched_at?;
        if fetched_at.elapsed() >= ttl {
            return None;
        }
        self.keys.get(kid).cloned()
    }
}

/// Fetches and caches the signing keys Google publishes for its ID tokens
pub struct JwksClient {
    url: String,
    http: reqwest::Client,
    cache: RwLock<KeyCache>,
    ttl: Duration,
}

impl JwksClient {
    pub fn new(url: &str, ttl: Duration) -> Self {
        Self {
            url: url.to_string(),
            http: reqwest::Client::new(),
            cache: RwLock::new(KeyCache::default()),
            ttl,
        }
    }

    /// Key for `kid`; an unknown or stale key triggers one refetch of the whole set
    pub async fn get_key(&self, kid: &str) -> Result<DecodingKey, JwksError> {
        if let Some(key) = self.cache.read().await.fresh_key(kid, self.ttl) {
            return Ok(key);
        }

        let keys = self.fetch().await?;
        let key = keys.get(kid).cloned();

        let mut cache = self.cache.write().await;
        cache.keys = keys;
        cache.fetched_at = Some(Instant::now());

        key.ok_or_else(|| JwksError::KeyNotFound(kid.to_string()))
    }

    async fn fetch(&self) -> Result<HashMap<String, DecodingKey>, JwksError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| JwksError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JwksError::Fetch(format!("HTTP {}", status)));
        }

        let set: KeySet = response
            .json()
            .await
            .map_err(|e| JwksError::Parse(e.to_string()))?;

        let keys = rsa_keys(set)?;
        tracing::debug!("Fetched {} signing keys from {}", keys.len(), self.url);
        Ok(keys)
    }
}

fn rsa_keys(set: KeySet) -> Result<HashMap<String, DecodingKey>, JwksError> {
    set.keys
        .into_iter()
        .filter(|k| k.kty == "RSA")
        .map(|k| {
            DecodingKey::from_rsa_components(&k.n, &k.e)
                .map(|key| (k.kid, key))
                .map_err(|e| JwksError::KeyConversion(e.to_string()))
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum JwksError {
    #[error("Failed to fetch signing keys: {0}")]
    Fetch(String),

    #[error("Failed to parse signing keys: {0}")]
    Parse(String),

    #[error("Signing key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed to convert signing key: {0}")]
    KeyConversion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULUS: &str = "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw";

    #[test]
    fn test_rsa_keys_ignores_other_key_types() {
        let set: KeySet = serde_json::from_value(serde_json::json!({
            "keys": [
                { "kid": "ec-key", "kty": "EC", "n": "", "e": "" },
                { "kid": "rsa-key", "kty": "RSA", "n": MODULUS, "e": "AQAB" }
            ]
        }))
        .unwrap();

        let keys = rsa_keys(set).unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains_key("rsa-key"));
    }

    #[test]
    fn test_cache_expires_after_ttl() {
        let set: KeySet = serde_json::from_value(serde_json::json!({
            "keys": [{ "kid": "k1", "kty": "RSA", "n": MODULUS, "e": "AQAB" }]
        }))
        .unwrap();

        let mut cache = KeyCache {
            keys: rsa_keys(set).unwrap(),
            fetched_at: None,
        };
        assert!(cache.fresh_key("k1", Duration::from_secs(60)).is_none());

        cache.fetched_at = Some(Instant::now());
        assert!(cache.fresh_key("k1", Duration::from_secs(60)).is_some());
        assert!(cache.fresh_key("k2", Duration::from_secs(60)).is_none());
        assert!(cache.fresh_key("k1", Duration::ZERO).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_fetch_error() {
        let client = JwksClient::new("http://127.0.0.1:1/certs", Duration::from_secs(60));
        let err = client.get_key("any").await.err().unwrap();
        assert!(matches!(err, JwksError::Fetch(_)));
    }
}
