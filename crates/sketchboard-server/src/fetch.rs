//! Image fetcher used when exporting: local assets come from the asset
//! store, `http(s)` urls are downloaded.

use sketchboard_core::{AssetError, AssetStore, BoxFuture, asset_name};
use sketchboard_render::AssetFetcher;
use std::sync::Arc;
use std::time::Duration;

pub struct HttpFetcher {
    client: reqwest::Client,
    assets: Arc<dyn AssetStore>,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(assets: Arc<dyn AssetStore>, timeout: Duration, max_bytes: usize) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            assets,
            max_bytes,
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let failed = |e: reqwest::Error| AssetError::Other(format!("fetching {url}: {e}"));
        let response = self.client.get(url).send().await.map_err(failed)?;
        let mut response = response.error_for_status().map_err(failed)?;
        if response.content_length().is_some_and(|len| len > self.max_bytes as u64) {
            return Err(AssetError::Other(format!("{url} exceeds {} bytes", self.max_bytes)));
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(failed)? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(AssetError::Other(format!("{url} exceeds {} bytes", self.max_bytes)));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl AssetFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
        if asset_name(url).is_some() {
            return self.assets.get(url);
        }
        if is_remote(url) {
            return Box::pin(self.download(url));
        }
        Box::pin(async move { Err(AssetError::NotFound(url.to_string())) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchboard_core::MemoryAssetStore;

    fn fetcher(store: Arc<dyn AssetStore>) -> HttpFetcher {
        HttpFetcher::new(store, Duration::from_secs(1), 1024).unwrap()
    }

    #[tokio::test]
    async fn test_local_assets_come_from_store() {
        let store: Arc<dyn AssetStore> = Arc::new(MemoryAssetStore::new());
        let url = store.put(vec![9, 9, 9], None).await.unwrap();
        let bytes = fetcher(store).fetch(&url).await.unwrap();
        assert_eq!(bytes, vec![9, 9, 9]);
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let store: Arc<dyn AssetStore> = Arc::new(MemoryAssetStore::new());
        let result = fetcher(store).fetch("file:///etc/passwd").await;
        assert!(matches!(result, Err(AssetError::NotFound(_))));
    }

    /// Serve one response with no `Content-Length`, ended by closing the socket.
    async fn serve_unsized(body: Vec<u8>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n").await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/image.png")
    }

    #[tokio::test]
    async fn test_unsized_download_within_cap() {
        let url = serve_unsized(vec![7; 100]).await;
        let bytes = fetcher(Arc::new(MemoryAssetStore::new())).fetch(&url).await.unwrap();
        assert_eq!(bytes.len(), 100);
    }

    #[tokio::test]
    async fn test_unsized_download_over_cap() {
        let url = serve_unsized(vec![7; 4096]).await;
        let result = fetcher(Arc::new(MemoryAssetStore::new())).fetch(&url).await;
        assert!(matches!(result, Err(AssetError::Other(msg)) if msg.contains("exceeds")));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/a.png"));
        assert!(!is_remote("/assets/a.png"));
        assert!(!is_remote("ftp://example.com/a.png"));
    }
}
