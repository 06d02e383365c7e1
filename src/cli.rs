use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shoelace")]
#[command(about = "現場在庫ラベル撮影・オフラインキュー同期ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// オフラインとして実行（送信せずキューに積む）
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ドラフトに写真を追加（フォルダ指定時は直下の画像）
    Add {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// ドラフトから写真を削除
    Remove {
        /// 写真ID
        #[arg(required = true)]
        photo_id: String,
    },

    /// 写真の手入力品番・判読不能フラグを編集
    Edit {
        /// 写真ID
        #[arg(required = true)]
        photo_id: String,

        /// 手入力品番（空文字で解除）
        #[arg(short, long)]
        part: Option<String>,

        /// 判読不能フラグ (true/false)
        #[arg(short, long)]
        unreadable: Option<bool>,
    },

    /// ロケーションタグ・メモを編集
    Meta {
        /// ロケーションタグ
        #[arg(short, long)]
        location: Option<String>,

        /// メモ
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// 現在のドラフトを表示
    Draft,

    /// ドラフトを破棄
    Discard {
        /// 確認しない
        #[arg(short, long)]
        yes: bool,
    },

    /// ドラフトを確定して送信（オフライン時はキューへ）
    Submit,

    /// 再送待ちキューを同期
    Sync,

    /// 接続を監視し、復帰時にキューを同期
    Watch {
        /// 接続確認の間隔（秒）
        #[arg(short, long, default_value = "30")]
        interval: u64,
    },

    /// 保存済みスキャンの一覧（新しい順）
    List,

    /// スキャンの詳細
    Show {
        /// スキャンID
        #[arg(required = true)]
        scan_id: String,

        /// 解析結果をJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 設定を表示/編集
    Config {
        /// 解析サービスのURL
        #[arg(long)]
        endpoint: Option<String>,

        /// 常にオフラインとして扱う (true/false)
        #[arg(long)]
        force_offline: Option<bool>,

        /// 疑似解析を使う (true/false)
        #[arg(long)]
        simulate: Option<bool>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
