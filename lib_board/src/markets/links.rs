use url::Url;

use crate::error::ConfigError;

const SYMBOL_PLACEHOLDER: &str = "{symbol}";

/// Outbound link to a secondary exchange's trading page.
///
/// Opening the link is fire-and-forget for the caller; this type only builds
/// and validates the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeLink {
    pub exchange: String,
    template: String,
}

impl ExchangeLink {
    /// `template` must be an absolute URL containing `{symbol}`, for example
    /// `https://www.binance.com/en/trade/{symbol}_USDT`.
    pub fn new(exchange: &str, template: &str) -> Result<Self, ConfigError> {
        if !template.contains(SYMBOL_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder(template.to_string()));
        }
        // Validate with a representative symbol so a broken template fails early.
        let sample = template.replace(SYMBOL_PLACEHOLDER, "BTC");
        Url::parse(&sample).map_err(|source| ConfigError::InvalidUrl {
            url: template.to_string(),
            source,
        })?;

        Ok(Self {
            exchange: exchange.to_string(),
            template: template.to_string(),
        })
    }

    pub fn url_for(&self, symbol: &str) -> Result<Url, ConfigError> {
        let raw = self.template.replace(SYMBOL_PLACEHOLDER, &symbol.trim().to_uppercase());
        Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source })
    }
}
