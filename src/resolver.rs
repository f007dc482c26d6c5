use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::config::ResolverConfig;

/// Body returned by the resolver API.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResolverResponse {
    #[serde(default, deserialize_with = "video_data_or_none")]
    pub video_data: Option<ResolvedVideo>,
}

/// Falsy placeholders (`null`, `false`, `0`, `""`) mean no video.
fn video_data_or_none<'de, D>(deserializer: D) -> Result<Option<ResolvedVideo>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let absent = match &value {
        serde_json::Value::Null | serde_json::Value::Bool(false) => true,
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    };
    if absent {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct ResolvedVideo {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub download_links: Option<Vec<DownloadLink>>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct DownloadLink {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub href: String,
}

impl ResolvedVideo {
    pub fn links(&self) -> &[DownloadLink] {
        self.download_links.as_deref().unwrap_or(&[])
    }
}

/// Turns a social-video URL into downloadable media links.
#[async_trait]
pub trait VideoResolver: Send + Sync {
    /// `Ok(None)` means the service answered but had no video data.
    async fn resolve(&self, url: &str) -> Result<Option<ResolvedVideo>>;
}

pub struct HttpResolver {
    client: reqwest::Client,
    config: ResolverConfig,
}

impl HttpResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl VideoResolver for HttpResolver {
    async fn resolve(&self, url: &str) -> Result<Option<ResolvedVideo>> {
        debug!("Resolving {} via {}", url, self.config.endpoint);

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[("link", url)])
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to resolver")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Resolver API error ({}): {}", status, error_body);
        }

        let parsed: ResolverResponse = response
            .json()
            .await
            .context("Failed to parse resolver response")?;

        Ok(parsed.video_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_full_response() {
        let parsed: ResolverResponse = serde_json::from_str(
            r#"{
                "video_data": {
                    "author": "someone",
                    "description": "a clip",
                    "download_links": [
                        {"text": "Download MP4", "href": "https://cdn/x.mp4"},
                        {"text": "Download MP3", "href": "https://cdn/x.mp3"}
                    ]
                }
            }"#,
        )
        .unwrap();
        let video = parsed.video_data.unwrap();
        assert_eq!(video.author.as_deref(), Some("someone"));
        assert_eq!(video.links().len(), 2);
        assert_eq!(video.links()[1].href, "https://cdn/x.mp3");
    }

    #[test]
    fn test_missing_video_data() {
        let parsed: ResolverResponse =
            serde_json::from_str(r#"{"status": "error", "message": "not found"}"#).unwrap();
        assert!(parsed.video_data.is_none());

        for body in [
            r#"{"video_data": null}"#,
            r#"{"video_data": false}"#,
            r#"{"video_data": ""}"#,
            r#"{"video_data": 0}"#,
        ] {
            let parsed: ResolverResponse = serde_json::from_str(body).unwrap();
            assert!(parsed.video_data.is_none(), "{}", body);
        }
    }

    #[test]
    fn test_truthy_non_object_video_data_is_an_error() {
        assert!(serde_json::from_str::<ResolverResponse>(r#"{"video_data": "yes"}"#).is_err());
    }

    #[test]
    fn test_sparse_video_data() {
        let parsed: ResolverResponse =
            serde_json::from_str(r#"{"video_data": {"download_links": [{"href": "https://cdn/y"}]}}"#)
                .unwrap();
        let video = parsed.video_data.unwrap();
        assert!(video.author.is_none());
        assert!(video.description.is_none());
        assert_eq!(video.links()[0].text, None);

        let empty = ResolvedVideo::default();
        assert!(empty.links().is_empty());
    }

    #[test]
    fn test_non_object_body_is_an_error() {
        assert!(serde_json::from_str::<ResolverResponse>("<html>").is_err());
    }

    fn resolver_for(server: &MockServer) -> HttpResolver {
        HttpResolver::new(ResolverConfig {
            endpoint: format!("{}/cok.php", server.uri()),
        })
    }

    #[tokio::test]
    async fn test_resolve_sends_encoded_link_and_accept_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cok.php"))
            .and(query_param("link", "https://www.tiktok.com/@user/video/12345?lang=en&x=1"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "video_data": {
                    "author": "user",
                    "description": "a clip",
                    "download_links": [{"text": "Download MP4", "href": "https://cdn/x.mp4"}]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let video = resolver_for(&server)
            .resolve("https://www.tiktok.com/@user/video/12345?lang=en&x=1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(video.author.as_deref(), Some("user"));
        assert_eq!(video.links()[0].href, "https://cdn/x.mp4");

        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap_or_default().to_string();
        assert!(query.starts_with("link=https%3A%2F%2Fwww.tiktok.com"), "{}", query);
        assert!(!query.contains("&x=1"), "{}", query);
    }

    #[tokio::test]
    async fn test_resolve_without_video_data_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cok.php"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"video_data": false})),
            )
            .mount(&server)
            .await;

        let video = resolver_for(&server).resolve("https://vt.tiktok.com/ZS1/").await.unwrap();
        assert!(video.is_none());
    }

    #[tokio::test]
    async fn test_resolve_error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cok.php"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "down"})),
            )
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .resolve("https://vt.tiktok.com/ZS2/")
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("500"), "{:#}", err);
    }

    #[tokio::test]
    async fn test_resolve_html_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cok.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        assert!(resolver_for(&server)
            .resolve("https://vt.tiktok.com/ZS3/")
            .await
            .is_err());
    }
}
