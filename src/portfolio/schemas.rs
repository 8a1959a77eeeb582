// ポートフォリオデータのスキーマ定義

// GitHub GraphQL API 応答に関するスキーマ
pub mod github_response {
    use serde::{Deserialize, Serialize};

    // 表示するトピックの最大数
    pub const DISPLAY_TOPIC_LIMIT: usize = 6;

    // リポジトリ情報（スナップショットにもそのまま保存される）
    #[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Repository {
        pub name: String,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub url: String,
        #[serde(rename = "stargazerCount", default)]
        pub star_count: u64,
        #[serde(default)]
        pub primary_language: Option<Language>,
        #[serde(default)]
        pub repository_topics: TopicConnection,
        #[serde(default)]
        pub updated_at: String,
    }

    impl Repository {
        /// 名前だけを持つリポジトリ（テストやフォールバック用）
        pub fn named(name: impl Into<String>) -> Self {
            Repository {
                name: name.into(),
                ..Default::default()
            }
        }

        /// トピック名の一覧
        pub fn topic_names(&self) -> Vec<&str> {
            self.repository_topics
                .nodes
                .iter()
                .map(|node| node.topic.name.as_str())
                .collect()
        }

        /// 表示用のトピック（先頭6件まで）
        pub fn display_topics(&self) -> Vec<&str> {
            self.topic_names()
                .into_iter()
                .take(DISPLAY_TOPIC_LIMIT)
                .collect()
        }
    }

    // 主要言語
    #[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
    pub struct Language {
        pub name: String,
        // GitHub側で色が未定義の言語もある
        pub color: Option<String>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
    pub struct TopicConnection {
        #[serde(default)]
        pub nodes: Vec<TopicNode>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
    pub struct TopicNode {
        pub topic: Topic,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
    pub struct Topic {
        pub name: String,
    }

    // GraphQLレスポンスの外側
    #[derive(Debug, Deserialize)]
    pub struct GraphQlResponse<T> {
        pub data: Option<T>,
        pub errors: Option<Vec<serde_json::Value>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct RepositoriesData {
        pub user: Option<UserRepositories>,
    }

    #[derive(Debug, Deserialize)]
    pub struct UserRepositories {
        pub repositories: Option<RepositoryConnection>,
    }

    #[derive(Debug, Deserialize)]
    pub struct RepositoryConnection {
        pub nodes: Option<Vec<Option<Repository>>>,
    }
}

// サイトが配信する静的データに関するスキーマ
pub mod site_data {
    use super::github_response::Repository;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    // スナップショットの出所
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
    pub enum SnapshotSource {
        #[serde(rename = "github-api")]
        GithubApi,
        #[serde(rename = "fallback")]
        Fallback,
    }

    /// 生成スクリプトが書き出す github-data.json
    #[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Snapshot {
        pub repositories: Vec<Repository>,
        pub last_updated: String,
        pub source: SnapshotSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub error: Option<String>,
    }

    impl Snapshot {
        pub fn live(repositories: Vec<Repository>, last_updated: String) -> Self {
            Snapshot {
                repositories,
                last_updated,
                source: SnapshotSource::GithubApi,
                error: None,
            }
        }

        pub fn fallback(error: impl Into<String>, last_updated: String) -> Self {
            Snapshot {
                repositories: Vec::new(),
                last_updated,
                source: SnapshotSource::Fallback,
                error: Some(error.into()),
            }
        }
    }

    /// projects_metadata.json の1エントリ
    #[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
    pub struct ProjectMetadata {
        #[serde(default)]
        pub details: Vec<String>,
    }

    pub type MetadataMap = HashMap<String, ProjectMetadata>;

    /// リポジトリ名 → プレビュー画像URL
    pub type PreviewMap = HashMap<String, String>;

    /// メタデータを付与したリポジトリ
    #[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
    pub struct EnhancedProject {
        #[serde(flatten)]
        pub repository: Repository,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub metadata: Option<ProjectMetadata>,
    }
}
