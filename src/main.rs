// portfolio-data - ポートフォリオサイト用のGitHubデータ生成ツール
// ビルド時に静的JSONを生成し、サイト側の読み込み結果も確認できる

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use log::{error, info, warn};
use reqwest::Url;
use simple_logger::SimpleLogger;

use portfolio_data::portfolio::assets::{AssetSource, DirAssetSource, HttpAssetSource};
use portfolio_data::portfolio::config::{
    DEFAULT_PUBLIC_DIR, DEFAULT_USERNAME, GITHUB_GRAPHQL_URL, PublicDir, resolve_base_path,
};
use portfolio_data::portfolio::credentials::{env_sources, resolve_credential};
use portfolio_data::portfolio::generator::SnapshotGenerator;
use portfolio_data::portfolio::github::GitHubClient;
use portfolio_data::portfolio::loader::{self, ProjectsState};
use portfolio_data::portfolio::previews::{PreviewCache, PreviewResolver};
use portfolio_data::portfolio::schemas::site_data::SnapshotSource;

// コマンドライン引数の定義

#[derive(Parser, Debug)]
#[clap(
    name = "portfolio-data",
    about = "ポートフォリオサイト用のGitHubリポジトリデータを生成するツール",
    version = "0.1.0"
)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    #[clap(flatten)]
    generate: GenerateArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// GitHubからデータを取得して github-data.json を生成（既定）
    Generate(GenerateArgs),
    /// 生成済みデータをサイトと同じ手順で読み込んで表示
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    /// 出力先の public ディレクトリ
    #[clap(long, env = "PUBLIC_DIR", default_value = DEFAULT_PUBLIC_DIR)]
    public_dir: PathBuf,

    /// リポジトリを取得するGitHubユーザー名
    #[clap(long, env = "GITHUB_USERNAME", default_value = DEFAULT_USERNAME)]
    username: String,

    /// GraphQL エンドポイント
    #[clap(long, env = "GITHUB_GRAPHQL_URL", default_value = GITHUB_GRAPHQL_URL)]
    endpoint: String,
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// 読み込む public ディレクトリ
    #[clap(long, env = "PUBLIC_DIR", default_value = DEFAULT_PUBLIC_DIR)]
    public_dir: PathBuf,

    /// デプロイ済みサイトのオリジン（指定時はHTTPで取得）
    #[clap(long, env = "SITE_ORIGIN")]
    origin: Option<Url>,

    /// 配信ベースパス（未指定ならビルド設定から決定）
    #[clap(long, env = "BASE_URL")]
    base_path: Option<String>,

    /// 本番ビルドとしてベースパスを決める
    #[clap(long)]
    production: bool,

    /// 独自ドメインで配信する
    #[clap(long, env = "CUSTOM_DOMAIN")]
    custom_domain: bool,
}

// 静的データ生成。どんな失敗でもビルドを止めない
async fn generate(args: GenerateArgs) {
    let generator = SnapshotGenerator::new(PublicDir::new(&args.public_dir));

    let outcome = match resolve_credential(&env_sources()) {
        None => generator.run::<GitHubClient>(None).await,
        Some(credential) => {
            info!(
                "🔑 {} ({}) のGitHubトークンを使用します",
                credential.source, credential.scope
            );
            match GitHubClient::with_endpoint(credential.token, args.username, args.endpoint) {
                Ok(client) => generator.run(Some(&client)).await,
                Err(e) => {
                    error!("❌ HTTPクライアントの作成に失敗: {}", e);
                    generator
                        .write_fallback(format!("Failed to fetch GitHub data: {}", e))
                        .await
                }
            }
        }
    };

    match outcome {
        Ok(outcome) => match outcome.reason() {
            None => info!("🎉 データ生成完了"),
            Some(reason) => warn!("⚠️ フォールバックを含むデータを生成しました: {}", reason),
        },
        Err(e) => error!("💥 データファイルの書き込みに失敗: {:#}", e),
    }
}

// サイトと同じ手順でデータとプレビューを読み込む
async fn show(args: ShowArgs) -> Result<()> {
    let base_path = args
        .base_path
        .clone()
        .unwrap_or_else(|| resolve_base_path(args.production, args.custom_domain).to_string());
    info!("🏗️ ベースパス: {}", base_path);

    match args.origin.clone() {
        Some(origin) => render(Arc::new(HttpAssetSource::new(origin)), &base_path).await,
        None => {
            let assets = DirAssetSource::new(&args.public_dir).mounted_at(&base_path);
            render(Arc::new(assets), &base_path).await
        }
    }
}

async fn render<S>(assets: Arc<S>, base_path: &str) -> Result<()>
where
    S: AssetSource + Send + Sync + 'static,
{
    let cache = PreviewCache::new();
    let mut state_rx = loader::mount(assets.clone());

    // データとプレビューは独立して読み込む
    let (changed, previews) = futures::join!(
        state_rx.changed(),
        PreviewResolver::activate(&cache, assets.as_ref(), base_path)
    );
    changed?;

    let state = state_rx.borrow().clone();
    print_projects(&state, previews.value());
    Ok(())
}

fn print_projects(state: &ProjectsState, previews: &PreviewResolver) {
    if let Some(error) = &state.error {
        println!("データを読み込めませんでした: {}", error);
        return;
    }
    for diagnostic in &state.diagnostics {
        println!("注意: {}", diagnostic);
    }
    if state.projects.is_empty() {
        println!("表示できるリポジトリはありません");
    }

    for project in &state.projects {
        let repo = &project.repository;
        let language = repo
            .primary_language
            .as_ref()
            .map(|language| language.name.as_str())
            .unwrap_or("-");
        println!("{} ★{} [{}]", repo.name, repo.star_count, language);
        if let Some(description) = &repo.description {
            println!("  {}", description);
        }
        let topics = repo.display_topics();
        if !topics.is_empty() {
            println!("  #{}", topics.join(" #"));
        }
        if let Some(metadata) = &project.metadata {
            for detail in &metadata.details {
                println!("  - {}", detail);
            }
        }
        if let Some(url) = previews.resolve(&repo.name) {
            println!("  preview: {}", url);
        }
    }

    if let Some(last_updated) = &state.last_updated {
        println!("最終更新: {}", last_updated);
    }
    match state.source {
        Some(SnapshotSource::GithubApi) => println!("データ元: GitHub API"),
        Some(SnapshotSource::Fallback) => println!("データ元: フォールバック"),
        None => {}
    }
}

// メイン関数
#[tokio::main]
async fn main() -> Result<()> {
    // ロガー初期化（RUST_LOG で上書き可能）
    if let Err(e) = SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("ロガーの初期化に失敗: {}", e);
    }

    // .envファイルを読み込み（既存の環境変数は上書きしない）
    if let Ok(path) = dotenv() {
        info!("📄 .envファイルを読み込みました: {}", path.display());
    }

    // コマンドライン引数を解析
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Show(args)) => show(args).await,
        Some(Command::Generate(args)) => {
            generate(args).await;
            Ok(())
        }
        None => {
            generate(cli.generate).await;
            Ok(())
        }
    }
}
