use crate::core::geo::TileCoord;
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use std::sync::Arc;
use std::thread;

/// Shared blocking HTTP client with a custom User-Agent so that public tile
/// servers (e.g. OpenStreetMap) don't reject the request. Building the client
/// once avoids the cost of TLS and connection pool setup for every tile.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent("slippy/0.1 (+https://github.com/slippy-rs/slippy)")
        .build()
        .expect("failed to build reqwest blocking client")
});

/// Fetches raw bytes for a URL. The seam between the tile pipeline and the
/// network: tests inject a canned transport, production uses HTTP.
pub trait TileTransport: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Production transport over the shared blocking client.
pub struct HttpTransport;

impl TileTransport for HttpTransport {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = HTTP_CLIENT.get(url).send()?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()).into());
        }
        let bytes = resp.bytes()?;
        Ok(bytes.to_vec())
    }
}

/// Outcome of one tile fetch, delivered back over the loader channel.
pub struct TileFetch {
    pub coord: TileCoord,
    pub result: std::result::Result<image::RgbaImage, String>,
}

/// Downloads and decodes tiles on detached threads, reporting results over
/// a channel that the owning layer drains once per frame.
pub struct TileLoader {
    transport: Arc<dyn TileTransport>,
    tx: Sender<TileFetch>,
    rx: Receiver<TileFetch>,
}

impl TileLoader {
    pub fn new() -> Self {
        Self::with_transport(Arc::new(HttpTransport))
    }

    pub fn with_transport(transport: Arc<dyn TileTransport>) -> Self {
        let (tx, rx) = unbounded();
        Self { transport, tx, rx }
    }

    /// Start downloading the tile behind `url`. The download occurs on a
    /// detached thread so that it does not block the caller; the decoded
    /// image (or the failure) shows up later via `try_recv`.
    pub fn request(&self, coord: TileCoord, url: String) {
        let tx = self.tx.clone();
        let transport = Arc::clone(&self.transport);

        thread::spawn(move || {
            log::debug!("fetch tile {:?} from {}", coord, url);
            let result = transport
                .fetch(&url)
                .and_then(|bytes| {
                    image::load_from_memory(&bytes)
                        .map_err(|e| crate::MapError::Decode(e.to_string()).into())
                })
                .map(|img| img.to_rgba8());

            match result {
                Ok(pixels) => {
                    log::info!(
                        "downloaded tile {:?} ({}x{})",
                        coord,
                        pixels.width(),
                        pixels.height()
                    );
                    let _ = tx.send(TileFetch {
                        coord,
                        result: Ok(pixels),
                    });
                }
                Err(e) => {
                    log::warn!("tile {:?} failed: {}", coord, e);
                    let _ = tx.send(TileFetch {
                        coord,
                        result: Err(e.to_string()),
                    });
                }
            }
        });
    }

    /// Drain every fetch that has finished since the last call.
    pub fn try_recv(&self) -> Vec<TileFetch> {
        self.rx.try_iter().collect()
    }
}

impl Default for TileLoader {
    fn default() -> Self {
        Self::new()
    }
}
