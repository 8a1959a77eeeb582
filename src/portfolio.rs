// ポートフォリオモジュール - リポジトリデータの生成と読み込みに関する機能をまとめたモジュール

// サブモジュールをエクスポート
pub mod assets;
pub mod config;
pub mod credentials;
pub mod generator;
pub mod github;
pub mod loader;
pub mod outcome;
pub mod previews;
pub mod schemas;

pub use outcome::Outcome;
