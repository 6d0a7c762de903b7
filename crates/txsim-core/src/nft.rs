//! NFT preview images for the transfers a simulation reports.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::cache::TtlCache;
use crate::transport::SimApi;
use crate::types::{ApiKey, NftTransfer};

/// At most this many transfers get a preview, however many are reported.
pub const MAX_NFT_PREVIEWS: usize = 3;

/// Image container format, sniffed from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Svg,
    Unknown,
}

impl ImageFormat {
    pub fn sniff(bytes: &[u8]) -> Self {
        match bytes {
            [0x89, b'P', b'N', b'G', ..] => Self::Png,
            [0xff, 0xd8, 0xff, ..] => Self::Jpeg,
            [b'G', b'I', b'F', b'8', ..] => Self::Gif,
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Self::Webp,
            _ if looks_like_svg(bytes) => Self::Svg,
            _ => Self::Unknown,
        }
    }

    /// File extension for saving the image.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Svg => "svg",
            Self::Unknown => "bin",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Gif => "GIF",
            Self::Webp => "WebP",
            Self::Svg => "SVG",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// A fetched preview image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl NftImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        let format = ImageFormat::sniff(&bytes);
        Self { bytes, format }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A transfer paired with its preview, if one could be fetched.
#[derive(Debug, Clone)]
pub struct NftPreview {
    pub transfer: NftTransfer,
    pub image: Option<NftImage>,
}

/// Fetches NFT preview images, caching them for the life of the fetcher.
///
/// Missing images are a soft failure: any non-success status or transport
/// error yields `None`, and `None` is not cached.
pub struct NftImageFetcher {
    api: Arc<dyn SimApi>,
    cache: TtlCache<(String, String), NftImage>,
}

impl NftImageFetcher {
    pub fn new(api: Arc<dyn SimApi>) -> Self {
        Self { api, cache: TtlCache::unbounded() }
    }

    /// Preview image for one token, or `None` if unavailable.
    pub async fn fetch_image(
        &self,
        api_key: &ApiKey,
        contract_address: &str,
        token_id: &str,
    ) -> Option<NftImage> {
        let key = (contract_address.to_string(), token_id.to_string());
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit);
        }

        match self.api.nft_image(api_key, contract_address, token_id).await {
            Ok(Some(bytes)) => {
                let image = NftImage::new(bytes);
                tracing::debug!(
                    contract = contract_address,
                    token_id,
                    format = %image.format,
                    size = image.len(),
                    "fetched NFT image"
                );
                self.cache.insert(key, image.clone());
                Some(image)
            }
            Ok(None) => {
                tracing::debug!(contract = contract_address, token_id, "no NFT image available");
                None
            }
            Err(e) => {
                tracing::debug!(contract = contract_address, token_id, error = %e, "NFT image fetch failed");
                None
            }
        }
    }

    /// Previews for the first [`MAX_NFT_PREVIEWS`] transfers, in order.
    pub async fn fetch_previews(&self, api_key: &ApiKey, transfers: &[NftTransfer]) -> Vec<NftPreview> {
        let mut previews = Vec::with_capacity(transfers.len().min(MAX_NFT_PREVIEWS));
        for transfer in transfers.iter().take(MAX_NFT_PREVIEWS) {
            let image = self
                .fetch_image(api_key, &transfer.contract_address, &transfer.token_id)
                .await;
            previews.push(NftPreview { transfer: transfer.clone(), image });
        }
        previews
    }

    pub fn cache(&self) -> &TtlCache<(String, String), NftImage> {
        &self.cache
    }
}

impl fmt::Debug for NftImageFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NftImageFetcher")
            .field("service", &self.api.name())
            .field("cache", &self.cache)
            .finish()
    }
}
