// 静的アセットの取得元
//
// ブラウザの fetch に相当する部分。デプロイ先のサイトからHTTPで読むか、
// ローカルの public ディレクトリから直接読む。

use std::future::Future;
use std::path::PathBuf;

use reqwest::{StatusCode, Url};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{status} ({path})")]
    Status { path: String, status: StatusCode },
    #[error("invalid asset URL ({path}): {reason}")]
    InvalidUrl { path: String, reason: String },
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AssetError {
    pub fn not_found(path: &str) -> Self {
        AssetError::Status {
            path: path.to_string(),
            status: StatusCode::NOT_FOUND,
        }
    }
}

/// サイトパス（"/github-data.json" など）からテキストを取得する
pub trait AssetSource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, AssetError>> + Send;
}

// HTTP経由の取得元
pub struct HttpAssetSource {
    client: reqwest::Client,
    origin: Url,
}

impl HttpAssetSource {
    pub fn new(origin: Url) -> Self {
        HttpAssetSource {
            client: reqwest::Client::new(),
            origin,
        }
    }

    pub fn url_for(&self, path: &str) -> Result<Url, AssetError> {
        self.origin.join(path).map_err(|e| AssetError::InvalidUrl {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

impl AssetSource for HttpAssetSource {
    async fn fetch(&self, path: &str) -> Result<String, AssetError> {
        let url = self.url_for(path)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AssetError::Status {
                path: path.to_string(),
                status: response.status(),
            });
        }

        Ok(response.text().await?)
    }
}

// ローカルディレクトリの取得元
#[derive(Clone, Debug)]
pub struct DirAssetSource {
    root: PathBuf,
    mount: String,
}

impl DirAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirAssetSource {
            root: root.into(),
            mount: "/".to_string(),
        }
    }

    /// ベースパス配下で配信されているものとして扱う
    pub fn mounted_at(mut self, base: &str) -> Self {
        self.mount = format!("/{}/", base.trim_matches('/')).replace("//", "/");
        self
    }

    /// サイトパスをファイルパスに変換する
    pub fn file_for(&self, path: &str) -> PathBuf {
        let relative = path
            .strip_prefix(self.mount.as_str())
            .unwrap_or(path)
            .trim_start_matches('/');
        self.root.join(relative)
    }
}

impl AssetSource for DirAssetSource {
    async fn fetch(&self, path: &str) -> Result<String, AssetError> {
        match fs::read_to_string(self.file_for(path)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::not_found(path))
            }
            Err(source) => Err(AssetError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// 1回だけ固定の応答を返すHTTPサーバー。受け取ったリクエストを返す
    pub async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });

        (format!("http://{}", address), handle)
    }

    // ヘッダーと Content-Length 分の本文を読む
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let read = socket.read(&mut chunk).await.unwrap();
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..read]);

            let text = String::from_utf8_lossy(&buffer);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buffer.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// 取得回数を数えるラッパー
    #[derive(Clone)]
    pub struct CountingSource<S> {
        inner: S,
        calls: Arc<AtomicUsize>,
    }

    impl<S> CountingSource<S> {
        pub fn new(inner: S) -> Self {
            CountingSource {
                inner,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl<S: AssetSource + Sync> AssetSource for CountingSource<S> {
        async fn fetch(&self, path: &str) -> Result<String, AssetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(path).await
        }
    }
}
