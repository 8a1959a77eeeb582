// portfolio-data - ポートフォリオサイト用のGitHubデータ生成・読み込みライブラリ

pub mod portfolio;
