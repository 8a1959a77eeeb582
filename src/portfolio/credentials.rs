// GitHubトークンの解決
//
// 環境変数の優先順位を暗黙に持たず、名前付きのソース一覧を順に評価する。

use std::fmt;

/// トークンを探す環境変数（先頭ほど優先）
pub const TOKEN_VARIABLES: [(&str, &str); 2] =
    [("GITHUB_TOKEN", "CI"), ("VITE_GITHUB_TOKEN", "local")];

/// 名前付きのトークン候補
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialSource {
    /// 環境変数名
    pub name: &'static str,
    /// 用途の表示名（"CI" / "local"）
    pub scope: &'static str,
    pub value: Option<String>,
}

impl CredentialSource {
    pub fn new(name: &'static str, scope: &'static str, value: Option<String>) -> Self {
        CredentialSource { name, scope, value }
    }

    pub fn from_env(name: &'static str, scope: &'static str) -> Self {
        CredentialSource::new(name, scope, std::env::var(name).ok())
    }
}

/// 既定の優先順位で環境変数からソース一覧を作る
pub fn env_sources() -> Vec<CredentialSource> {
    TOKEN_VARIABLES
        .iter()
        .map(|&(name, scope)| CredentialSource::from_env(name, scope))
        .collect()
}

/// 解決済みのトークン
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub source: &'static str,
    pub scope: &'static str,
}

// トークン本体はログに出さない
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"***")
            .field("source", &self.source)
            .field("scope", &self.scope)
            .finish()
    }
}

/// 最初に値を持つソースを採用する。空文字列は未設定扱い
pub fn resolve_credential(sources: &[CredentialSource]) -> Option<Credential> {
    sources.iter().find_map(|source| {
        let token = source.value.as_deref()?.trim();
        if token.is_empty() {
            return None;
        }
        Some(Credential {
            token: token.to_string(),
            source: source.name,
            scope: source.scope,
        })
    })
}
