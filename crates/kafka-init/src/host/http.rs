//! Release mirror access over HTTPS

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use kafka_provision::{Download, FetchError, Fetcher};
use reqwest::blocking::{Client, Response};
use sha2::{Digest, Sha512};
use tracing::debug;

const USER_AGENT: &str = concat!("kafka-init/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const CHUNK: usize = 64 * 1024;

/// Blocking HTTP client for the mirror
pub struct HttpFetcher {
    client: Client,
    progress: bool,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            // archives are large; only bound the connect phase
            .timeout(None)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))?;

        Ok(Self {
            client,
            progress: true,
        })
    }

    /// Show a progress bar while downloading
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn get(&self, url: &str) -> Result<Response, FetchError> {
        debug!(%url, "GET");
        let response = self.client.get(url).send().map_err(|e| transport(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn progress_bar(&self, len: Option<u64>, name: &str) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let bar = match len {
            Some(len) => {
                let bar = ProgressBar::new(len);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {msg} {bytes}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar
            }
        };
        bar.set_message(format!("Downloading {name}"));
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }
}

fn transport(url: &str, err: &reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.get(url)?.text().map_err(|e| transport(url, &e))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<Download, FetchError> {
        let mut response = self.get(url)?;
        let name = dest
            .file_name()
            .map_or_else(|| url.to_string(), |n| n.to_string_lossy().into_owned());
        let bar = self.progress_bar(response.content_length(), &name);

        let write_err = |source| FetchError::Write {
            path: dest.to_path_buf(),
            source,
        };
        let file = File::create(dest).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        let mut hasher = Sha512::new();
        let mut buf = vec![0u8; CHUNK];
        let mut bytes = 0u64;

        loop {
            let n = response.read(&mut buf).map_err(|e| {
                bar.abandon();
                FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            })?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            writer.write_all(&buf[..n]).map_err(write_err)?;
            bytes += n as u64;
            bar.inc(n as u64);
        }
        writer.flush().map_err(write_err)?;
        bar.finish_and_clear();

        let sha512 = hex::encode(hasher.finalize());
        debug!(%url, bytes, %sha512, "downloaded");
        Ok(Download { bytes, sha512 })
    }
}
