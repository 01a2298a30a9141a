//! Audio backend using `rodio`, streaming each verse from its URL.

use super::{AudioOutput, MediaHandle, MediaStatus};
use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, Sink};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct RodioOutput {
    client: reqwest::blocking::Client,
}

impl RodioOutput {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Building audio HTTP client")?;
        info!(timeout_secs = timeout.as_secs(), "Initialized audio output");
        Ok(Self { client })
    }
}

impl AudioOutput for RodioOutput {
    fn open(&mut self, url: &str) -> Result<Box<dyn MediaHandle>> {
        let (stream, handle) = OutputStream::try_default().context("Opening audio output")?;
        let sink = Arc::new(Sink::try_new(&handle).context("Creating sink")?);
        let shared = Arc::new(StreamShared::default());

        let client = self.client.clone();
        let url = url.to_string();
        let worker_sink = Arc::clone(&sink);
        let worker_shared = Arc::clone(&shared);
        thread::Builder::new()
            .name("verse-audio".to_string())
            .spawn(move || {
                if let Err(err) = load_into_sink(&client, &url, &worker_sink, &worker_shared) {
                    if worker_shared.stopped.load(Ordering::Acquire) {
                        debug!(%url, "Audio load abandoned after stop: {err:#}");
                        return;
                    }
                    warn!(%url, "Audio load failed: {err:#}");
                    if let Ok(mut failure) = worker_shared.failure.lock() {
                        *failure = Some(format!("{err:#}"));
                    }
                }
            })
            .context("Spawning audio loader")?;

        sink.play();
        Ok(Box::new(RodioHandle {
            _stream: stream,
            sink,
            shared,
        }))
    }
}

#[derive(Default)]
struct StreamShared {
    loaded: AtomicBool,
    stopped: AtomicBool,
    failure: Mutex<Option<String>>,
}

fn load_into_sink(
    client: &reqwest::blocking::Client,
    url: &str,
    sink: &Sink,
    shared: &StreamShared,
) -> Result<()> {
    debug!(%url, "Fetching verse audio");
    let bytes = client
        .get(url)
        .send()
        .context("Requesting audio")?
        .error_for_status()
        .context("Audio request rejected")?
        .bytes()
        .context("Reading audio body")?;
    if shared.stopped.load(Ordering::Acquire) {
        anyhow::bail!("stopped before decode");
    }
    let source = Decoder::new(Cursor::new(bytes.to_vec())).context("Decoding audio")?;
    if shared.stopped.load(Ordering::Acquire) {
        anyhow::bail!("stopped before playback");
    }
    sink.append(source);
    shared.loaded.store(true, Ordering::Release);
    debug!(%url, size = bytes.len(), "Verse audio queued");
    Ok(())
}

struct RodioHandle {
    _stream: OutputStream,
    sink: Arc<Sink>,
    shared: Arc<StreamShared>,
}

impl MediaHandle for RodioHandle {
    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn stop(&mut self) {
        self.shared.stopped.store(true, Ordering::Release);
        self.sink.stop();
    }

    fn status(&self) -> MediaStatus {
        if let Some(reason) = self
            .shared
            .failure
            .lock()
            .ok()
            .and_then(|failure| failure.clone())
        {
            return MediaStatus::Failed(reason);
        }
        if !self.shared.loaded.load(Ordering::Acquire) {
            return MediaStatus::Loading;
        }
        if self.sink.empty() {
            MediaStatus::Ended
        } else if self.sink.is_paused() {
            MediaStatus::Paused
        } else {
            MediaStatus::Playing
        }
    }
}

impl Drop for RodioHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
