use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Model replies keyed by a hash of model, temperature and prompt
pub struct Cache {
    llm_responses: Arc<DashMap<String, String>>,
    max_entries: usize,
}

impl Cache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            llm_responses: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    /// Cache an LLM response
    pub fn set_llm_response(&self, key: &str, response: String) {
        if self.max_entries == 0 {
            return;
        }
        if self.llm_responses.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self.llm_responses.iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.llm_responses.remove(&key);
            }
        }
        let key = self.hash_text(key);
        self.llm_responses.insert(key, response);
    }

    pub fn get_llm_response(&self, key: &str) -> Option<String> {
        let key = self.hash_text(key);
        self.llm_responses.get(&key).map(|r| r.value().clone())
    }

    fn hash_text(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            llm_responses_cached: self.llm_responses.len(),
            max_entries: self.max_entries,
        }
    }

    pub fn clear(&self) {
        self.llm_responses.clear();
    }
}

/// Short one-way fingerprint of a secret, for scoping cache entries
pub fn key_fingerprint(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    hex::encode(&digest[..8])
}

#[derive(Debug, serde::Serialize)]
pub struct CacheStats {
    pub llm_responses_cached: usize,
    pub max_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_and_clear() {
        let cache = Cache::new(10);
        cache.set_llm_response("OpenAI/gpt|0|prompt", "reply".to_string());
        assert_eq!(cache.get_llm_response("OpenAI/gpt|0|prompt").as_deref(), Some("reply"));
        assert!(cache.get_llm_response("OpenAI/gpt|0.3|prompt").is_none());

        cache.clear();
        assert_eq!(cache.stats().llm_responses_cached, 0);
    }

    #[test]
    fn test_eviction_keeps_size_bounded() {
        let cache = Cache::new(4);
        for i in 0..20 {
            cache.set_llm_response(&format!("prompt-{i}"), i.to_string());
        }
        assert!(cache.stats().llm_responses_cached <= 4);
        assert_eq!(cache.get_llm_response("prompt-19").as_deref(), Some("19"));
    }

    #[test]
    fn test_key_fingerprint() {
        let a = key_fingerprint("sk-live-secret");
        assert_eq!(a.len(), 16);
        assert_eq!(a, key_fingerprint("sk-live-secret"));
        assert_ne!(a, key_fingerprint("sk-other"));
        assert!(!a.contains("secret"));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = Cache::new(0);
        cache.set_llm_response("k", "v".to_string());
        assert!(cache.get_llm_response("k").is_none());
    }
}
