use alertproxy_core::ProviderError;
use alertproxy_types::Target;

/// Reads a required provider-specific config key, failing with a
/// (non-retryable, `422`) validation error rather than panicking when a
/// target is misconfigured.
pub fn require_config<'a>(target: &'a Target, provider: &str, key: &str) -> Result<&'a str, ProviderError> {
    target
        .config
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| ProviderError::http(422, provider, format!("target {:?} missing required config key {key:?}", target.name)))
}
