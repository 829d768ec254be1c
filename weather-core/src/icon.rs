//! One-shot download of condition glyphs. Failures never reach the fetch pipeline.

use reqwest::Client;

use crate::{
    config::ServiceEndpoints,
    error::IconFetchWarning,
    http::build_client,
};

#[derive(Debug, Clone)]
pub struct IconFetcher {
    base_url: String,
    http: Client,
}

impl IconFetcher {
    pub fn new(endpoints: &ServiceEndpoints) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: endpoints.icon_base_url.trim_end_matches('/').to_string(),
            http: build_client(endpoints.timeout())?,
        })
    }

    /// e.g. `https://openweathermap.org/img/wn/10d@2x.png`
    pub fn icon_url(&self, code: &str) -> String {
        format!("{}/{code}@2x.png", self.base_url)
    }

    /// PNG bytes for `code`.
    pub async fn fetch(&self, code: &str) -> Result<Vec<u8>, IconFetchWarning> {
        let warn = |reason: String| IconFetchWarning { code: code.to_string(), reason };

        if code.trim().is_empty() {
            return Err(warn("no icon code in the snapshot".into()));
        }

        let res = self
            .http
            .get(self.icon_url(code))
            .send()
            .await
            .map_err(|e| warn(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(warn(format!("status {status}")));
        }

        let bytes = res.bytes().await.map_err(|e| warn(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_url_uses_base_and_code() {
        let endpoints = ServiceEndpoints {
            icon_base_url: "http://icons.local/img/wn/".into(),
            ..Default::default()
        };
        let fetcher = IconFetcher::new(&endpoints).expect("client");

        assert_eq!(fetcher.icon_url("10d"), "http://icons.local/img/wn/10d@2x.png");
    }

    #[tokio::test]
    async fn empty_code_is_a_warning() {
        let fetcher = IconFetcher::new(&ServiceEndpoints::default()).expect("client");
        let warning = fetcher.fetch("").await.unwrap_err();

        assert!(warning.to_string().contains("no icon code"));
    }
}
