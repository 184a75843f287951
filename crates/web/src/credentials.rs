use anyhow::Result;
use extract::Provider;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Body of the Run form. Every field may be missing.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct RunForm {
    pub openai_key: String,
    pub gemini_key: String,
    pub vertex_key: String,
    pub provider: String,
    pub input_text: String,
}

impl RunForm {
    /// Selected provider; a blank value means the first one
    pub fn selected_provider(&self) -> Result<Provider> {
        if self.provider.trim().is_empty() {
            return Ok(Provider::OpenAI);
        }
        self.provider.parse()
    }
}

/// Provider secrets for the lifetime of one request
#[derive(Default)]
pub struct CredentialSet {
    keys: HashMap<Provider, String>,
}

impl CredentialSet {
    pub fn from_form(form: &RunForm) -> Self {
        let mut set = Self::default();
        set.insert(Provider::OpenAI, &form.openai_key);
        set.insert(Provider::Gemini, &form.gemini_key);
        set.insert(Provider::Vertex, &form.vertex_key);
        set
    }

    fn insert(&mut self, provider: Provider, key: &str) {
        let key = key.trim();
        if !key.is_empty() {
            self.keys.insert(provider, key.to_string());
        }
    }

    /// Key for `provider`, or the error shown to the user
    pub fn require(&self, provider: Provider) -> Result<&str> {
        match self.keys.get(&provider) {
            Some(key) => Ok(key.as_str()),
            None => anyhow::bail!("Please provide a {provider} API key."),
        }
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers: Vec<&str> = self.keys.keys().map(|p| p.name()).collect();
        f.debug_struct("CredentialSet")
            .field("providers", &providers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(provider: &str, openai: &str, gemini: &str) -> RunForm {
        RunForm {
            openai_key: openai.to_string(),
            gemini_key: gemini.to_string(),
            provider: provider.to_string(),
            input_text: "text".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_require_selected_key() {
        let form = form("Gemini", "", " g-123 ");
        let credentials = CredentialSet::from_form(&form);

        assert_eq!(form.selected_provider().unwrap(), Provider::Gemini);
        assert_eq!(credentials.require(Provider::Gemini).unwrap(), "g-123");
    }

    #[test]
    fn test_missing_key_blocks_with_message() {
        let credentials = CredentialSet::from_form(&form("OpenAI", "   ", "g-123"));
        let err = credentials.require(Provider::OpenAI).unwrap_err();
        assert_eq!(err.to_string(), "Please provide a OpenAI API key.");
        assert!(credentials.require(Provider::Vertex).is_err());
    }

    #[test]
    fn test_provider_selection() {
        assert_eq!(form("", "", "").selected_provider().unwrap(), Provider::OpenAI);
        assert!(form("Claude", "", "").selected_provider().is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let credentials = CredentialSet::from_form(&form("OpenAI", "sk-secret", ""));
        let debug = format!("{credentials:?}");
        assert!(debug.contains("OpenAI"));
        assert!(!debug.contains("sk-secret"));
    }
}
