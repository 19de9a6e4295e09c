//! Link-preview enrichment
//!
//! Derives an embed card from an entry's target page: Open Graph title,
//! description, and optionally a thumbnail uploaded through the
//! rate-limited create path. Enrichment is strictly best-effort — any
//! failure degrades to a thumbnail-less card or no card at all, and must
//! never prevent the entry itself from being announced.

use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::platforms::PostingBackend;
use crate::rate_limiter::RateLimiter;
use crate::types::{EmbedCard, Thumbnail};

pub struct EmbedEnricher {
    client: reqwest::Client,
    max_thumbnail_bytes: usize,
}

impl EmbedEnricher {
    pub fn new(client: reqwest::Client, max_thumbnail_bytes: usize) -> Self {
        Self {
            client,
            max_thumbnail_bytes,
        }
    }

    /// Build an embed card for a target url, or None when the page cannot
    /// be fetched or the url is not plain http(s).
    pub async fn build_card(
        &self,
        url: &str,
        limiter: &mut RateLimiter,
        backend: &dyn PostingBackend,
    ) -> Option<EmbedCard> {
        if !has_fetchable_scheme(url) {
            warn!(%url, "refusing to enrich non-http(s) url");
            return None;
        }

        let html = match self.fetch_text(url).await {
            Ok(html) => html,
            Err(err) => {
                warn!(%url, "failed to fetch page for embed card: {}", err);
                return None;
            }
        };

        let title =
            select_meta_content(&html, "og:title").unwrap_or_else(|| "Link".to_string());
        let description = select_meta_content(&html, "og:description").unwrap_or_default();
        let image_url = select_meta_content(&html, "og:image");

        let mut card = EmbedCard {
            uri: url.to_string(),
            title,
            description,
            thumbnail: None,
        };

        if let Some(image_url) = image_url {
            card.thumbnail = self.fetch_thumbnail(&image_url, limiter, backend).await;
        }

        Some(card)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    /// Fetch and upload the og:image. Returns None (never an error) when
    /// the image is unusable: bad scheme, fetch failure, over the size
    /// cap, or upload failure.
    async fn fetch_thumbnail(
        &self,
        image_url: &str,
        limiter: &mut RateLimiter,
        backend: &dyn PostingBackend,
    ) -> Option<Thumbnail> {
        if !has_fetchable_scheme(image_url) {
            warn!(%image_url, "skipping thumbnail with non-http(s) url");
            return None;
        }

        let response = match self.client.get(image_url).send().await {
            Ok(response) => match response.error_for_status() {
                Ok(response) => response,
                Err(err) => {
                    warn!(%image_url, "thumbnail fetch failed: {}", err);
                    return None;
                }
            },
            Err(err) => {
                warn!(%image_url, "thumbnail fetch failed: {}", err);
                return None;
            }
        };

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .unwrap_or_else(|| "image/jpeg".to_string());

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%image_url, "thumbnail download failed: {}", err);
                return None;
            }
        };

        if bytes.len() > self.max_thumbnail_bytes {
            warn!(
                %image_url,
                size = bytes.len(),
                cap = self.max_thumbnail_bytes,
                "thumbnail exceeds size cap, announcing without it"
            );
            return None;
        }

        limiter.admit(true).await;
        match backend.upload_blob(bytes.to_vec(), &mime_type).await {
            Ok(blob) => {
                debug!(%image_url, size = bytes.len(), "thumbnail uploaded");
                Some(Thumbnail {
                    blob,
                    mime_type,
                    size: bytes.len(),
                })
            }
            Err(err) => {
                warn!(%image_url, "thumbnail upload failed: {}", err);
                None
            }
        }
    }
}

/// Only plain web urls are fetched; anything else (ftp:, file:, data:,
/// javascript:, relative paths) is rejected up front.
fn has_fetchable_scheme(candidate: &str) -> bool {
    match url::Url::parse(candidate) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Content of the first `<meta property=...>` tag with the given property.
fn select_meta_content(html: &str, property: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!(r#"meta[property="{}"]"#, property)).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use crate::platforms::mock::MockBackend;
    use std::time::Duration;

    const PAGE_FULL: &str = r#"<html><head>
        <meta property="og:title" content="An article"/>
        <meta property="og:description" content="Worth reading"/>
        <meta property="og:image" content="https://example.com/cover.jpg"/>
        </head><body></body></html>"#;

    const PAGE_BARE: &str = "<html><head><title>untagged</title></head><body></body></html>";

    fn limiter() -> RateLimiter {
        RateLimiter::new(&RateLimitConfig::default())
    }

    fn enricher(max_thumbnail_bytes: usize) -> EmbedEnricher {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        EmbedEnricher::new(client, max_thumbnail_bytes)
    }

    #[test]
    fn selects_meta_content_by_property() {
        assert_eq!(
            select_meta_content(PAGE_FULL, "og:title").as_deref(),
            Some("An article")
        );
        assert_eq!(
            select_meta_content(PAGE_FULL, "og:description").as_deref(),
            Some("Worth reading")
        );
        assert_eq!(select_meta_content(PAGE_FULL, "og:video"), None);
        assert_eq!(select_meta_content(PAGE_BARE, "og:title"), None);
    }

    #[test]
    fn scheme_validation() {
        assert!(has_fetchable_scheme("https://example.com/a"));
        assert!(has_fetchable_scheme("http://example.com/a"));
        assert!(!has_fetchable_scheme("ftp://example.com/a"));
        assert!(!has_fetchable_scheme("javascript:alert(1)"));
        assert!(!has_fetchable_scheme("file:///etc/passwd"));
        assert!(!has_fetchable_scheme("/relative/path"));
        assert!(!has_fetchable_scheme("not a url"));
    }

    #[tokio::test]
    async fn non_http_url_yields_no_card() {
        let backend = MockBackend::new();
        let mut limiter = limiter();

        let card = enricher(1_000_000)
            .build_card("ftp://example.com/a", &mut limiter, &backend)
            .await;

        assert!(card.is_none());
    }

    #[tokio::test]
    async fn unreachable_page_yields_no_card() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/article")
            .with_status(500)
            .create_async()
            .await;
        let backend = MockBackend::new();
        let mut limiter = limiter();

        let card = enricher(1_000_000)
            .build_card(&format!("{}/article", server.url()), &mut limiter, &backend)
            .await;

        assert!(card.is_none());
    }

    #[tokio::test]
    async fn defaults_apply_only_when_tags_are_absent() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/article")
            .with_status(200)
            .with_body(PAGE_BARE)
            .create_async()
            .await;
        let backend = MockBackend::new();
        let mut limiter = limiter();

        let url = format!("{}/article", server.url());
        let card = enricher(1_000_000)
            .build_card(&url, &mut limiter, &backend)
            .await
            .unwrap();

        assert_eq!(card.title, "Link");
        assert_eq!(card.description, "");
        assert_eq!(card.uri, url);
        assert!(card.thumbnail.is_none());
        assert!(backend.uploaded().is_empty());
    }

    #[tokio::test]
    async fn extracts_tags_and_uploads_thumbnail() {
        let mut server = mockito::Server::new_async().await;
        let page = format!(
            r#"<html><head>
            <meta property="og:title" content="An article"/>
            <meta property="og:description" content="Worth reading"/>
            <meta property="og:image" content="{}/cover.jpg"/>
            </head></html>"#,
            server.url()
        );
        let _page = server
            .mock("GET", "/article")
            .with_status(200)
            .with_body(page)
            .create_async()
            .await;
        let _image = server
            .mock("GET", "/cover.jpg")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(vec![0u8; 512])
            .create_async()
            .await;
        let backend = MockBackend::new();
        let mut limiter = limiter();

        let card = enricher(1_000_000)
            .build_card(&format!("{}/article", server.url()), &mut limiter, &backend)
            .await
            .unwrap();

        assert_eq!(card.title, "An article");
        assert_eq!(card.description, "Worth reading");
        let thumbnail = card.thumbnail.expect("thumbnail expected");
        assert_eq!(thumbnail.mime_type, "image/png");
        assert_eq!(thumbnail.size, 512);
        assert_eq!(backend.uploaded(), vec![(512, "image/png".to_string())]);
    }

    #[tokio::test]
    async fn oversized_thumbnail_is_skipped_card_kept() {
        let mut server = mockito::Server::new_async().await;
        let page = format!(
            r#"<html><head>
            <meta property="og:title" content="An article"/>
            <meta property="og:image" content="{}/huge.jpg"/>
            </head></html>"#,
            server.url()
        );
        let _page = server
            .mock("GET", "/article")
            .with_status(200)
            .with_body(page)
            .create_async()
            .await;
        let _image = server
            .mock("GET", "/huge.jpg")
            .with_status(200)
            .with_body(vec![0u8; 2048])
            .create_async()
            .await;
        let backend = MockBackend::new();
        let mut limiter = limiter();

        let card = enricher(1024)
            .build_card(&format!("{}/article", server.url()), &mut limiter, &backend)
            .await
            .unwrap();

        assert_eq!(card.title, "An article");
        assert!(card.thumbnail.is_none());
        assert!(backend.uploaded().is_empty(), "oversized image must not upload");
    }

    #[tokio::test]
    async fn upload_failure_degrades_to_thumbnail_less_card() {
        let mut server = mockito::Server::new_async().await;
        let page = format!(
            r#"<html><head>
            <meta property="og:title" content="An article"/>
            <meta property="og:image" content="{}/cover.jpg"/>
            </head></html>"#,
            server.url()
        );
        let _page = server
            .mock("GET", "/article")
            .with_status(200)
            .with_body(page)
            .create_async()
            .await;
        let _image = server
            .mock("GET", "/cover.jpg")
            .with_status(200)
            .with_body(vec![0u8; 16])
            .create_async()
            .await;
        let backend = MockBackend::failing_uploads();
        let mut limiter = limiter();

        let card = enricher(1_000_000)
            .build_card(&format!("{}/article", server.url()), &mut limiter, &backend)
            .await
            .unwrap();

        assert!(card.thumbnail.is_none());
    }

    #[tokio::test]
    async fn non_http_image_url_is_skipped() {
        let mut server = mockito::Server::new_async().await;
        let page = r#"<html><head>
            <meta property="og:title" content="An article"/>
            <meta property="og:image" content="file:///etc/passwd"/>
            </head></html>"#;
        let _page = server
            .mock("GET", "/article")
            .with_status(200)
            .with_body(page)
            .create_async()
            .await;
        let backend = MockBackend::new();
        let mut limiter = limiter();

        let card = enricher(1_000_000)
            .build_card(&format!("{}/article", server.url()), &mut limiter, &backend)
            .await
            .unwrap();

        assert!(card.thumbnail.is_none());
        assert!(backend.uploaded().is_empty());
    }
}
