use crate::config::EmbedConfig;

/// Decides which message origins may speak for the embed
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    exact: Vec<String>,
    domain: String,
}

impl OriginPolicy {
    pub fn new(exact: Vec<String>, domain: impl Into<String>) -> Self {
        Self {
            exact,
            domain: domain.into(),
        }
    }

    pub fn from_config(config: &EmbedConfig) -> Self {
        Self::new(config.trusted_origins.clone(), config.trusted_domain.clone())
    }

    /// Exact match on a known origin, or any origin containing the platform domain
    pub fn is_trusted(&self, origin: &str) -> bool {
        self.exact.iter().any(|trusted| trusted == origin)
            || (!self.domain.is_empty() && origin.contains(&self.domain))
    }
}
