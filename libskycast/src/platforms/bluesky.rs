//! Bluesky posting backend

use async_trait::async_trait;
use bsky_sdk::BskyAgent;

use crate::config::Credentials;
use crate::error::{PlatformError, Result};
use crate::platforms::PostingBackend;
use crate::types::{Announcement, BlobHandle, EmbedCard};

/// Map Bluesky/AT Protocol errors to PlatformError.
///
/// AT Protocol errors arrive as XRPC status codes and error-code strings,
/// so classification is by pattern over the rendered message.
fn map_bluesky_error<E: std::fmt::Display + std::fmt::Debug>(
    error: E,
    context: &str,
) -> PlatformError {
    let error_msg = format!("{}", error);
    let debug_msg = format!("{:?}", error);

    if error_msg.contains("401")
        || error_msg.contains("403")
        || error_msg.contains("AuthenticationRequired")
        || error_msg.contains("InvalidToken")
        || error_msg.contains("ExpiredToken")
        || error_msg.contains("InvalidCredentials")
        || error_msg.contains("AccountNotFound")
        || debug_msg.contains("Unauthorized")
        || debug_msg.contains("Forbidden")
    {
        return PlatformError::Authentication(format!(
            "Bluesky authentication failed during {}: {}",
            context, error_msg
        ));
    }

    if error_msg.contains("429")
        || error_msg.contains("RateLimitExceeded")
        || error_msg.contains("TooManyRequests")
        || debug_msg.contains("RateLimit")
    {
        return PlatformError::RateLimit(format!(
            "Bluesky rate limit hit during {}: {}",
            context, error_msg
        ));
    }

    if error_msg.contains("400")
        || error_msg.contains("InvalidRequest")
        || error_msg.contains("InvalidRecord")
        || debug_msg.contains("BadRequest")
    {
        return PlatformError::Validation(format!(
            "Bluesky rejected the request during {}: {}",
            context, error_msg
        ));
    }

    if error_msg.contains("connection")
        || error_msg.contains("timeout")
        || error_msg.contains("dns")
        || debug_msg.contains("Connect")
        || debug_msg.contains("Timeout")
    {
        return PlatformError::Network(format!(
            "Network error talking to Bluesky during {}: {}",
            context, error_msg
        ));
    }

    PlatformError::Posting(format!(
        "Bluesky operation failed during {}: {}",
        context, error_msg
    ))
}

pub struct BlueskyBackend {
    agent: BskyAgent,
}

impl BlueskyBackend {
    /// Create an agent against the default bsky.social PDS.
    pub async fn new() -> Result<Self> {
        let agent = BskyAgent::builder()
            .build()
            .await
            .map_err(|e| PlatformError::Network(format!("Failed to create agent: {}", e)))?;

        Ok(Self { agent })
    }

    fn build_embed(
        card: &EmbedCard,
    ) -> Result<bsky_sdk::api::types::Union<bsky_sdk::api::app::bsky::feed::post::RecordEmbedRefs>>
    {
        use bsky_sdk::api::app::bsky::embed::external::{ExternalData, MainData};
        use bsky_sdk::api::app::bsky::feed::post::RecordEmbedRefs;
        use bsky_sdk::api::types::Union;

        let thumb = match &card.thumbnail {
            Some(thumbnail) => Some(
                serde_json::from_value(thumbnail.blob.0.clone()).map_err(|e| {
                    PlatformError::Validation(format!("Malformed blob reference: {}", e))
                })?,
            ),
            None => None,
        };

        let external = ExternalData {
            description: card.description.clone(),
            thumb,
            title: card.title.clone(),
            uri: card.uri.clone(),
        };

        Ok(Union::Refs(RecordEmbedRefs::AppBskyEmbedExternalMain(
            Box::new(
                MainData {
                    external: external.into(),
                }
                .into(),
            ),
        )))
    }
}

#[async_trait]
impl PostingBackend for BlueskyBackend {
    async fn login(&self, credentials: &Credentials) -> Result<()> {
        tracing::debug!(identifier = %credentials.identifier, "creating Bluesky session");

        self.agent
            .login(&credentials.identifier, &credentials.password)
            .await
            .map_err(|e| map_bluesky_error(e, "authentication"))?;

        tracing::debug!("Bluesky session created");
        Ok(())
    }

    async fn create_post(&self, announcement: &Announcement) -> Result<String> {
        use bsky_sdk::api::app::bsky::feed::post::RecordData;
        use bsky_sdk::api::types::string::{Datetime, Language};

        let embed = match &announcement.embed {
            Some(card) => Some(Self::build_embed(card)?),
            None => None,
        };

        let langs: Vec<Language> = announcement
            .langs
            .iter()
            .filter_map(|lang| lang.parse().ok())
            .collect();

        let record = RecordData {
            created_at: Datetime::now(),
            embed,
            entities: None,
            facets: None,
            labels: None,
            langs: (!langs.is_empty()).then_some(langs),
            reply: None,
            tags: None,
            text: announcement.text.clone(),
        };

        let response = self
            .agent
            .create_record(record)
            .await
            .map_err(|e| map_bluesky_error(e, "posting"))?;

        let at_uri = response.uri.to_string();
        tracing::debug!(%at_uri, "posted to Bluesky");

        Ok(at_uri)
    }

    async fn upload_blob(&self, bytes: Vec<u8>, mime_type: &str) -> Result<BlobHandle> {
        tracing::debug!(size = bytes.len(), mime_type, "uploading blob");

        let output = self
            .agent
            .api
            .com
            .atproto
            .repo
            .upload_blob(bytes)
            .await
            .map_err(|e| map_bluesky_error(e, "blob upload"))?;

        let value = serde_json::to_value(&output.data.blob).map_err(|e| {
            PlatformError::Posting(format!("Failed to serialize blob reference: {}", e))
        })?;

        Ok(BlobHandle(value))
    }
}
