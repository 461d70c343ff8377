use crate::models::Article;
use crate::Result;
use async_trait::async_trait;

/// Source of raw news articles
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Fetch articles matching `query`. No results is an empty vec, not an error.
    async fn fetch(&self, query: &str) -> Result<Vec<Article>>;

    /// Get source name
    fn name(&self) -> &str;
}

/// Query used to look up news for a ticker
pub fn stock_query(symbol: &str) -> String {
    format!("{} stock", symbol)
}

/// Offline placeholder that always reports one neutral headline
///
/// Used when no news API key is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticNewsSource;

impl StaticNewsSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NewsSource for StaticNewsSource {
    async fn fetch(&self, query: &str) -> Result<Vec<Article>> {
        Ok(vec![Article::new(format!("{} is performing well", query))])
    }

    fn name(&self) -> &str {
        "Static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_query() {
        assert_eq!(stock_query("AAPL"), "AAPL stock");
    }

    #[tokio::test]
    async fn test_static_source_headline() {
        let source = StaticNewsSource::new();
        let articles = source.fetch(&stock_query("AAPL")).await.unwrap();
        assert_eq!(articles, vec![Article::new("AAPL stock is performing well")]);
    }
}
