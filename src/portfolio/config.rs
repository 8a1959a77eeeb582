// 固定パスとデプロイ設定

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// GitHub GraphQL API エンドポイント
pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// ポートフォリオの持ち主
pub const DEFAULT_USERNAME: &str = "vihdutta";

/// 静的アセットのディレクトリ
pub const DEFAULT_PUBLIC_DIR: &str = "public";

pub const SNAPSHOT_FILE: &str = "github-data.json";
pub const IGNORED_REPOS_FILE: &str = "ignored_repos.json";
pub const METADATA_FILE: &str = "projects_metadata.json";
pub const PREVIEWS_FILE: &str = "project-previews.json";

/// GitHub Pagesのプロジェクトページで配信するときのベースパス
pub const PROJECT_PAGE_BASE: &str = "/portfolio/";

static REPEATED_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("/{2,}").expect("valid slash pattern"));

/// ビルド種別から配信ベースパスを決める。独自ドメインならルート配信
pub fn resolve_base_path(production: bool, custom_domain: bool) -> &'static str {
    if production && !custom_domain {
        PROJECT_PAGE_BASE
    } else {
        "/"
    }
}

/// ベースパスとファイル名を結合し、連続した区切り文字を1つにまとめる
pub fn join_site_path(base: &str, file: &str) -> String {
    let joined = format!("/{}/{}", base, file);
    REPEATED_SLASHES.replace_all(&joined, "/").into_owned()
}

/// クライアントが読むアセットのパス
pub fn snapshot_path() -> String {
    join_site_path("/", SNAPSHOT_FILE)
}

pub fn metadata_path() -> String {
    join_site_path("/", METADATA_FILE)
}

pub fn previews_path(base: &str) -> String {
    join_site_path(base, PREVIEWS_FILE)
}

/// 生成スクリプトが扱う public ディレクトリ
#[derive(Clone, Debug)]
pub struct PublicDir {
    root: PathBuf,
}

impl PublicDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PublicDir { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    pub fn ignored_repos(&self) -> PathBuf {
        self.root.join(IGNORED_REPOS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_depends_on_deployment() {
        assert_eq!(resolve_base_path(false, false), "/");
        assert_eq!(resolve_base_path(false, true), "/");
        assert_eq!(resolve_base_path(true, false), "/portfolio/");
        assert_eq!(resolve_base_path(true, true), "/");
    }

    #[test]
    fn preview_path_never_doubles_separator() {
        assert_eq!(previews_path("/"), "/project-previews.json");
        assert_eq!(previews_path("/portfolio/"), "/portfolio/project-previews.json");
        assert_eq!(previews_path("/portfolio"), "/portfolio/project-previews.json");
        assert_eq!(previews_path(""), "/project-previews.json");
    }

    #[test]
    fn fixed_asset_paths() {
        assert_eq!(snapshot_path(), "/github-data.json");
        assert_eq!(metadata_path(), "/projects_metadata.json");
    }

    #[test]
    fn public_dir_layout() {
        let public = PublicDir::new("site/public");
        assert_eq!(public.snapshot(), Path::new("site/public/github-data.json"));
        assert_eq!(public.ignored_repos(), Path::new("site/public/ignored_repos.json"));
    }
}
