// プロジェクトのプレビュー画像

use std::sync::{Arc, OnceLock};

use log::warn;

use super::assets::AssetSource;
use super::config::previews_path;
use super::outcome::Outcome;
use super::schemas::site_data::PreviewMap;

/// セッション中に一度だけ読み込むプレビューマップのキャッシュ
#[derive(Debug, Default)]
pub struct PreviewCache {
    data: OnceLock<Arc<PreviewMap>>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.data.get().is_some()
    }

    pub fn get(&self) -> Option<Arc<PreviewMap>> {
        self.data.get().cloned()
    }

    // 同時に読み込んだ場合は最初に格納したものが残る（内容は同じ）
    fn store(&self, map: PreviewMap) -> Arc<PreviewMap> {
        let map = Arc::new(map);
        match self.data.set(map.clone()) {
            Ok(()) => map,
            Err(_) => self.data.get().cloned().unwrap_or(map),
        }
    }
}

/// プレビューマップを取得する。失敗した場合は空のマップを返し、キャッシュしない
pub async fn fetch_previews<S: AssetSource>(assets: &S, base_path: &str) -> Outcome<PreviewMap> {
    let path = previews_path(base_path);

    let content = match assets.fetch(&path).await {
        Ok(content) => content,
        Err(e) => {
            warn!("⚠️ プロジェクトプレビューを読み込めませんでした: {}", e);
            let reason = format!("Could not load project previews: {}", e);
            return Outcome::degraded(PreviewMap::new(), reason);
        }
    };

    match serde_json::from_str::<PreviewMap>(&content) {
        Ok(map) => Outcome::Ok(map),
        Err(e) => {
            warn!("⚠️ プロジェクトプレビューの解析に失敗: {}", e);
            let reason = format!("Error loading project previews: {}", e);
            Outcome::degraded(PreviewMap::new(), reason)
        }
    }
}

/// リポジトリ名からプレビューURLを引く
#[derive(Clone, Debug)]
pub struct PreviewResolver {
    data: Arc<PreviewMap>,
}

impl PreviewResolver {
    /// キャッシュ済みならそれを使い、未読み込みなら取得する
    pub async fn activate<S: AssetSource>(
        cache: &PreviewCache,
        assets: &S,
        base_path: &str,
    ) -> Outcome<Self> {
        if let Some(data) = cache.get() {
            return Outcome::Ok(PreviewResolver { data });
        }

        match fetch_previews(assets, base_path).await {
            Outcome::Ok(map) => Outcome::Ok(PreviewResolver {
                data: cache.store(map),
            }),
            Outcome::Degraded { value, reason } => Outcome::degraded(
                PreviewResolver {
                    data: Arc::new(value),
                },
                reason,
            ),
        }
    }

    pub fn from_map(map: PreviewMap) -> Self {
        PreviewResolver { data: Arc::new(map) }
    }

    /// 空白以外の値があるときだけURLを返す
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.data
            .get(name)
            .map(String::as_str)
            .filter(|url| !url.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
