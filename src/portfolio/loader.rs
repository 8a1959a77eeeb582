// 静的データの読み込み
//
// 生成済みの github-data.json を読み、projects_metadata.json とリポジトリ名で結合する。

use std::sync::Arc;

use log::{error, info, warn};
use thiserror::Error;
use tokio::sync::watch;

use super::assets::{AssetError, AssetSource};
use super::config::{metadata_path, snapshot_path};
use super::outcome::Outcome;
use super::schemas::github_response::Repository;
use super::schemas::site_data::{EnhancedProject, MetadataMap, Snapshot, SnapshotSource};

/// スナップショット自体が読めなかったとき
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to load GitHub data: {0}")]
    Fetch(#[from] AssetError),
    #[error("Failed to load GitHub data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 読み込みに成功したデータ
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedProjects {
    pub projects: Vec<EnhancedProject>,
    pub last_updated: String,
    pub source: SnapshotSource,
}

/// 表示側に渡す状態
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectsState {
    pub projects: Vec<EnhancedProject>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<String>,
    /// スナップショットの出所（読み込み成功時のみ）
    pub source: Option<SnapshotSource>,
    /// 読み込みは成功したが代替値を使った理由
    pub diagnostics: Vec<String>,
}

impl ProjectsState {
    /// マウント直後の状態
    pub fn loading() -> Self {
        ProjectsState {
            projects: Vec::new(),
            loading: true,
            error: None,
            last_updated: None,
            source: None,
            diagnostics: Vec::new(),
        }
    }

    /// 読み込み結果から最終状態を作る
    pub fn settled(result: Result<Outcome<LoadedProjects>, LoadError>) -> Self {
        match result {
            Ok(outcome) => {
                let (loaded, reason) = outcome.into_parts();
                ProjectsState {
                    projects: loaded.projects,
                    loading: false,
                    error: None,
                    last_updated: Some(loaded.last_updated),
                    source: Some(loaded.source),
                    diagnostics: reason.into_iter().collect(),
                }
            }
            Err(e) => ProjectsState {
                projects: Vec::new(),
                loading: false,
                error: Some(e.to_string()),
                last_updated: None,
                source: None,
                diagnostics: Vec::new(),
            },
        }
    }
}

/// リポジトリ名でメタデータを左結合する。順序はスナップショットのまま
pub fn attach_metadata(
    repositories: Vec<Repository>,
    metadata: &MetadataMap,
) -> Vec<EnhancedProject> {
    repositories
        .into_iter()
        .map(|repository| {
            let metadata = metadata.get(&repository.name).cloned();
            EnhancedProject {
                repository,
                metadata,
            }
        })
        .collect()
}

/// メタデータを読み込む。取得・解析に失敗しても空のマップで続行する
pub async fn load_metadata<S: AssetSource>(assets: &S) -> Outcome<MetadataMap> {
    let content = match assets.fetch(&metadata_path()).await {
        Ok(content) => content,
        Err(e) => {
            warn!("⚠️ プロジェクトメタデータが見つかりません。空のメタデータを使います: {}", e);
            let reason = format!("Project metadata not found: {}", e);
            return Outcome::degraded(MetadataMap::new(), reason);
        }
    };

    // null は空扱い
    match serde_json::from_str::<Option<MetadataMap>>(&content) {
        Ok(metadata) => Outcome::Ok(metadata.unwrap_or_default()),
        Err(e) => {
            warn!("⚠️ プロジェクトメタデータの解析に失敗: {}", e);
            let reason = format!("Failed to parse project metadata: {}", e);
            Outcome::degraded(MetadataMap::new(), reason)
        }
    }
}

/// スナップショットを取得して結合する
pub async fn load_projects<S: AssetSource>(
    assets: &S,
) -> Result<Outcome<LoadedProjects>, LoadError> {
    let content = assets.fetch(&snapshot_path()).await?;
    let snapshot: Snapshot = serde_json::from_str(&content)?;

    let mut reasons = Vec::new();
    if let Some(snapshot_error) = &snapshot.error {
        warn!("⚠️ GitHubデータはエラー付きで生成されています: {}", snapshot_error);
        reasons.push(snapshot_error.clone());
    }

    let (metadata, metadata_warning) = load_metadata(assets).await.into_parts();
    reasons.extend(metadata_warning);

    let projects = attach_metadata(snapshot.repositories, &metadata);

    info!("✅ 静的データから{}件のリポジトリを読み込みました", projects.len());
    info!("📅 データ更新日時: {}", snapshot.last_updated);

    let loaded = LoadedProjects {
        projects,
        last_updated: snapshot.last_updated,
        source: snapshot.source,
    };

    Ok(if reasons.is_empty() {
        Outcome::Ok(loaded)
    } else {
        Outcome::degraded(loaded, reasons.join("; "))
    })
}

/// 1回分の読み込みを実行して最終状態を返す
pub async fn load_state<S: AssetSource>(assets: &S) -> ProjectsState {
    let result = load_projects(assets).await;
    if let Err(e) = &result {
        error!("❌ GitHubデータの読み込みエラー: {}", e);
    }
    ProjectsState::settled(result)
}

/// コンポーネントのマウントに相当。読み込み中の状態から始まり、完了時に一度だけ更新される
pub fn mount<S>(assets: Arc<S>) -> watch::Receiver<ProjectsState>
where
    S: AssetSource + Send + Sync + 'static,
{
    let (tx, rx) = watch::channel(ProjectsState::loading());

    tokio::spawn(async move {
        let state = load_state(assets.as_ref()).await;
        // 受信側が既に破棄されていても問題ない
        let _ = tx.send(state);
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::assets::DirAssetSource;
    use crate::portfolio::assets::testing::CountingSource;
    use crate::portfolio::schemas::site_data::ProjectMetadata;
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::fs;

    async fn site(snapshot: Option<serde_json::Value>, metadata: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        if let Some(snapshot) = snapshot {
            fs::write(dir.path().join("github-data.json"), snapshot.to_string())
                .await
                .unwrap();
        }
        if let Some(metadata) = metadata {
            fs::write(dir.path().join("projects_metadata.json"), metadata)
                .await
                .unwrap();
        }
        dir
    }

    fn two_repo_snapshot() -> serde_json::Value {
        json!({
            "repositories": [{ "name": "a" }, { "name": "b" }],
            "lastUpdated": "2025-03-01T12:00:00.000Z",
            "source": "github-api"
        })
    }

    #[test]
    fn join_attaches_metadata_only_for_known_names() {
        let mut metadata = MetadataMap::new();
        metadata.insert(
            "b".into(),
            ProjectMetadata {
                details: vec!["x".into()],
            },
        );
        metadata.insert("unused".into(), ProjectMetadata::default());

        let projects = attach_metadata(
            vec![Repository::named("c"), Repository::named("b"), Repository::named("a")],
            &metadata,
        );

        let names: Vec<_> = projects.iter().map(|p| p.repository.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
        assert_eq!(projects[0].metadata, None);
        assert_eq!(projects[1].metadata.as_ref().unwrap().details, vec!["x"]);
        assert_eq!(projects[2].metadata, None);
    }

    #[tokio::test]
    async fn snapshot_and_metadata_are_joined() {
        let dir = site(Some(two_repo_snapshot()), Some(r#"{"b":{"details":["x"]}}"#)).await;

        let state = load_state(&DirAssetSource::new(dir.path())).await;

        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert!(state.diagnostics.is_empty());
        assert_eq!(state.last_updated.as_deref(), Some("2025-03-01T12:00:00.000Z"));
        assert_eq!(state.source, Some(SnapshotSource::GithubApi));
        assert_eq!(
            serde_json::to_value(&state.projects).unwrap(),
            json!([
                { "name": "a", "description": null, "url": "", "stargazerCount": 0,
                  "primaryLanguage": null, "repositoryTopics": { "nodes": [] }, "updatedAt": "" },
                { "name": "b", "description": null, "url": "", "stargazerCount": 0,
                  "primaryLanguage": null, "repositoryTopics": { "nodes": [] }, "updatedAt": "",
                  "metadata": { "details": ["x"] } }
            ])
        );
    }

    #[tokio::test]
    async fn missing_snapshot_is_an_error_state() {
        let dir = site(None, Some("{}")).await;
        let assets = CountingSource::new(DirAssetSource::new(dir.path()));

        let state = load_state(&assets).await;

        assert!(!state.loading);
        assert!(state.projects.is_empty());
        assert_eq!(state.source, None);
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to load GitHub data: 404 Not Found (/github-data.json)")
        );
        // メタデータは取りに行かない
        assert_eq!(assets.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_snapshot_is_an_error_state() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("github-data.json"), "{").await.unwrap();

        let state = load_state(&DirAssetSource::new(dir.path())).await;
        assert!(state.error.unwrap().starts_with("Failed to load GitHub data: "));
        assert!(state.projects.is_empty());
    }

    #[tokio::test]
    async fn missing_metadata_is_not_fatal() {
        let dir = site(Some(two_repo_snapshot()), None).await;

        let outcome = load_projects(&DirAssetSource::new(dir.path())).await.unwrap();

        assert!(outcome.is_degraded());
        let loaded = outcome.into_value();
        assert_eq!(loaded.projects.len(), 2);
        assert!(loaded.projects.iter().all(|p| p.metadata.is_none()));
    }

    #[tokio::test]
    async fn null_or_malformed_metadata_becomes_empty() {
        let dir = site(None, Some("null")).await;
        let outcome = load_metadata(&DirAssetSource::new(dir.path())).await;
        assert_eq!(outcome, Outcome::Ok(MetadataMap::new()));

        let dir = site(None, Some("[1, 2")).await;
        let outcome = load_metadata(&DirAssetSource::new(dir.path())).await;
        assert!(outcome.is_degraded());
        assert!(outcome.value().is_empty());
    }

    #[tokio::test]
    async fn fallback_snapshot_error_is_only_a_diagnostic() {
        let snapshot = json!({
            "repositories": [],
            "lastUpdated": "2025-03-01T12:00:00.000Z",
            "source": "fallback",
            "error": "No GitHub token provided"
        });
        let dir = site(Some(snapshot), Some("{}")).await;

        let state = load_state(&DirAssetSource::new(dir.path())).await;

        assert_eq!(state.error, None);
        assert!(state.projects.is_empty());
        assert_eq!(state.source, Some(SnapshotSource::Fallback));
        assert_eq!(state.diagnostics, vec!["No GitHub token provided".to_string()]);
    }

    #[tokio::test]
    async fn mount_starts_loading_and_settles_once() {
        let dir = site(Some(two_repo_snapshot()), Some("{}")).await;
        let assets = Arc::new(CountingSource::new(DirAssetSource::new(dir.path())));

        let mut rx = mount(assets.clone());
        assert!(rx.borrow().loading);

        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert!(!state.loading);
        assert_eq!(state.projects.len(), 2);

        // 送信側は完了後に破棄される
        assert!(rx.changed().await.is_err());
        assert_eq!(assets.calls(), 2);
    }

    #[tokio::test]
    async fn each_mount_refetches() {
        let dir = site(Some(two_repo_snapshot()), Some("{}")).await;
        let assets = Arc::new(CountingSource::new(DirAssetSource::new(dir.path())));

        for _ in 0..2 {
            let mut rx = mount(assets.clone());
            rx.changed().await.unwrap();
        }
        assert_eq!(assets.calls(), 4);
    }
}
