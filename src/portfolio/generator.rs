// 静的データ生成
//
// GitHubから取得したリポジトリを public/github-data.json に書き出す。
// どの失敗もフォールバックのスナップショットに置き換え、ビルドは止めない。

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use log::{error, info, warn};
use tokio::fs;

use super::config::{IGNORED_REPOS_FILE, PublicDir};
use super::github::RepositoryFeed;
use super::outcome::Outcome;
use super::schemas::github_response::Repository;
use super::schemas::site_data::{Snapshot, SnapshotSource};

/// トークンが無いときのエラーメッセージ
pub const NO_TOKEN_MESSAGE: &str = "No GitHub token provided";

pub type IgnoreList = HashSet<String>;

/// JavaScriptの toISOString と同じ形式の現在時刻
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 除外リストを読み込む。ファイルが無ければ空、壊れていれば警告して空
pub async fn load_ignore_list(path: &Path) -> Outcome<IgnoreList> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("📝 {}が無いため全リポジトリを含めます", IGNORED_REPOS_FILE);
            return Outcome::Ok(IgnoreList::new());
        }
        Err(e) => {
            warn!("⚠️ {}の読み込みに失敗: {}", IGNORED_REPOS_FILE, e);
            let reason = format!("Failed to read {}: {}", IGNORED_REPOS_FILE, e);
            return Outcome::degraded(IgnoreList::new(), reason);
        }
    };

    match serde_json::from_str::<Vec<String>>(&content) {
        Ok(names) => Outcome::Ok(names.into_iter().collect()),
        Err(e) => {
            warn!("⚠️ {}の解析に失敗: {}", IGNORED_REPOS_FILE, e);
            let reason = format!("Failed to parse {}: {}", IGNORED_REPOS_FILE, e);
            Outcome::degraded(IgnoreList::new(), reason)
        }
    }
}

/// 除外リストに含まれないリポジトリだけを元の順序のまま残す
pub fn filter_ignored(
    repositories: Vec<Repository>,
    ignored: &IgnoreList,
) -> (Vec<Repository>, Vec<String>) {
    let mut kept = Vec::with_capacity(repositories.len());
    let mut removed = Vec::new();

    for repository in repositories {
        if ignored.contains(&repository.name) {
            removed.push(repository.name);
        } else {
            kept.push(repository);
        }
    }

    (kept, removed)
}

/// 主要言語の一覧（重複なし、出現順）
pub fn distinct_languages(repositories: &[Repository]) -> Vec<&str> {
    let mut seen = HashSet::new();
    repositories
        .iter()
        .filter_map(|repo| repo.primary_language.as_ref())
        .map(|language| language.name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}

/// スナップショットを一時ファイル経由で書き出す
pub async fn write_snapshot(public: &PublicDir, snapshot: &Snapshot) -> Result<()> {
    // ディレクトリがなければ作成
    fs::create_dir_all(public.root())
        .await
        .with_context(|| format!("ディレクトリ作成に失敗: {}", public.root().display()))?;

    let output_path = public.snapshot();
    let temp_path = output_path.with_extension("json.tmp");

    let json_data = serde_json::to_string_pretty(snapshot)?;
    fs::write(&temp_path, json_data)
        .await
        .with_context(|| format!("書き込みに失敗: {}", temp_path.display()))?;
    fs::rename(&temp_path, &output_path)
        .await
        .with_context(|| format!("置き換えに失敗: {}", output_path.display()))?;

    Ok(())
}

// 静的データ生成器
pub struct SnapshotGenerator {
    public: PublicDir,
}

impl SnapshotGenerator {
    pub fn new(public: PublicDir) -> Self {
        SnapshotGenerator { public }
    }

    /// 1回分の生成を実行する。Errはスナップショットの書き込み自体に失敗したときだけ
    pub async fn run<F: RepositoryFeed>(&self, feed: Option<&F>) -> Result<Outcome<Snapshot>> {
        let Some(feed) = feed else {
            error!("❌ GitHubトークンが見つかりません");
            info!("💡 ローカル開発では .env に VITE_GITHUB_TOKEN=<token> を追加してください");
            info!("💡 トークンには public_repo の読み取り権限だけが必要です");
            return self.write_fallback(NO_TOKEN_MESSAGE).await;
        };

        let repositories = match feed.fetch_repositories().await {
            Ok(repositories) => repositories,
            Err(e) => {
                error!("❌ GitHubデータ取得エラー: {}", e);
                return self
                    .write_fallback(format!("Failed to fetch GitHub data: {}", e))
                    .await;
            }
        };

        let (ignored, ignore_warning) = load_ignore_list(&self.public.ignored_repos())
            .await
            .into_parts();
        let (repositories, removed) = filter_ignored(repositories, &ignored);
        if !removed.is_empty() {
            info!(
                "🚫 除外したリポジトリ {}件: {}",
                removed.len(),
                removed.join(", ")
            );
        }

        let snapshot = Snapshot::live(repositories, timestamp());
        self.persist(&snapshot).await?;

        info!(
            "📊 データ概要: リポジトリ {}件 / 言語: {} / 更新日時: {}",
            snapshot.repositories.len(),
            distinct_languages(&snapshot.repositories).join(", "),
            snapshot.last_updated
        );

        Ok(match ignore_warning {
            None => Outcome::Ok(snapshot),
            Some(reason) => Outcome::degraded(snapshot, reason),
        })
    }

    /// 空のフォールバックデータを書き出す
    pub async fn write_fallback(&self, reason: impl Into<String>) -> Result<Outcome<Snapshot>> {
        let reason = reason.into();
        let snapshot = Snapshot::fallback(reason.clone(), timestamp());
        self.persist(&snapshot).await?;
        Ok(Outcome::degraded(snapshot, reason))
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        write_snapshot(&self.public, snapshot).await?;

        let label = match snapshot.source {
            SnapshotSource::GithubApi => "✅ GitHubデータを保存",
            SnapshotSource::Fallback => "⚠️ フォールバックデータを保存",
        };
        info!("{}: {}", label, self.public.snapshot().display());
        Ok(())
    }
}
