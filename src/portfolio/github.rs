// GitHub GraphQL クライアント

use std::future::Future;

use log::info;
use reqwest::{self, header};
use serde_json::json;
use thiserror::Error;

use super::config::GITHUB_GRAPHQL_URL;
use super::schemas::github_response::{GraphQlResponse, RepositoriesData, Repository};

/// 取得するリポジトリ数
pub const REPOSITORY_LIMIT: usize = 20;

/// リポジトリごとに取得するトピック数
pub const TOPIC_LIMIT: usize = 10;

const USER_AGENT: &str = "Portfolio-Static-Generator";

// 更新日時の新しい順に公開・非フォークのリポジトリを取得
pub const REPOSITORIES_QUERY: &str = r#"
  query GetRepositories($username: String!, $first: Int!, $topics: Int!) {
    user(login: $username) {
      repositories(
        first: $first
        privacy: PUBLIC
        isFork: false
        orderBy: { field: UPDATED_AT, direction: DESC }
      ) {
        nodes {
          name
          description
          url
          stargazerCount
          primaryLanguage {
            name
            color
          }
          repositoryTopics(first: $topics) {
            nodes {
              topic {
                name
              }
            }
          }
          updatedAt
        }
      }
    }
  }
"#;

/// リポジトリ取得の失敗理由
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GitHub API error: {0}")]
    Status(reqwest::StatusCode),
    #[error("GraphQL errors: {0}")]
    GraphQl(String),
    #[error("Invalid response structure from GitHub API")]
    InvalidShape,
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Decode(#[from] serde_json::Error),
}

/// リポジトリ一覧の取得元
pub trait RepositoryFeed {
    fn fetch_repositories(
        &self,
    ) -> impl Future<Output = Result<Vec<Repository>, FetchError>> + Send;
}

// GitHubクライアント
pub struct GitHubClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    username: String,
}

impl GitHubClient {
    pub fn new(token: String, username: String) -> Result<Self, FetchError> {
        Self::with_endpoint(token, username, GITHUB_GRAPHQL_URL.to_string())
    }

    pub fn with_endpoint(
        token: String,
        username: String,
        endpoint: String,
    ) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(GitHubClient {
            client,
            endpoint,
            token,
            username,
        })
    }

    /// POSTする本文
    pub fn request_body(&self) -> serde_json::Value {
        json!({
            "query": REPOSITORIES_QUERY,
            "variables": {
                "username": self.username,
                "first": REPOSITORY_LIMIT,
                "topics": TOPIC_LIMIT,
            },
        })
    }
}

impl RepositoryFeed for GitHubClient {
    async fn fetch_repositories(&self) -> Result<Vec<Repository>, FetchError> {
        info!("🔄 GitHubリポジトリ情報を取得中: {}", self.username);

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&self.request_body())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().await?;
        let repositories = extract_repositories(&body)?;

        info!("✅ リポジトリ取得成功: {}件", repositories.len());
        Ok(repositories)
    }
}

/// GraphQLレスポンスからリポジトリ一覧を取り出す
pub fn extract_repositories(body: &str) -> Result<Vec<Repository>, FetchError> {
    let response: GraphQlResponse<RepositoriesData> = serde_json::from_str(body)?;

    if let Some(errors) = response.errors {
        return Err(FetchError::GraphQl(serde_json::to_string(&errors)?));
    }

    let nodes = response
        .data
        .and_then(|data| data.user)
        .and_then(|user| user.repositories)
        .and_then(|repositories| repositories.nodes)
        .ok_or(FetchError::InvalidShape)?;

    // nullのノードは捨てる
    Ok(nodes.into_iter().flatten().collect())
}
