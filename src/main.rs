use anyhow::Context;
use clap::Parser;
use dialoguer::Confirm;
use shoelace_common::{Draft, Scan};
use shoelace_scan::cli::{Cli, Commands};
use shoelace_scan::config::Config;
use shoelace_scan::connectivity::{probe, spawn_reconnect_sync};
use shoelace_scan::error::ShoelaceError;
use shoelace_scan::scanner::expand_paths;
use shoelace_scan::status::ConsoleSink;
use shoelace_scan::sync::SyncReport;
use shoelace_scan::App;
use std::sync::Arc;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().context("設定の読み込みに失敗しました")?;

    match cli.command {
        Commands::Config { endpoint, force_offline, simulate, show } => {
            let changed = endpoint.is_some() || force_offline.is_some() || simulate.is_some();
            if let Some(endpoint) = endpoint {
                config.endpoint = endpoint;
            }
            if let Some(flag) = force_offline {
                config.force_offline = flag;
            }
            if let Some(flag) = simulate {
                config.simulate = flag;
            }
            if changed {
                config.save()?;
                println!("✔ 設定を保存しました");
            }
            if show || !changed {
                println!("設定:");
                println!("  解析サービス: {}", config.endpoint);
                println!("  データ: {}", config.data_dir()?.display());
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  常にオフライン: {}", config.force_offline);
                println!("  疑似解析: {}", config.simulate);
            }
        }

        Commands::Add { paths } => {
            let files = expand_paths(&paths)?;
            if files.is_empty() {
                println!("追加する画像がありません");
                return Ok(());
            }
            let app = open_local(&config).await?;
            let draft = app.drafts.start().await?;
            let draft = app.drafts.add_photos(&draft, &files).await?;
            println!("✔ {}枚を追加（合計 {}枚）", files.len(), draft.photos.len());
        }

        Commands::Remove { photo_id } => {
            let app = open_local(&config).await?;
            let draft = app.drafts.load().await?;
            if draft.photo(&photo_id).is_none() {
                println!("写真が見つかりません: {}", photo_id);
                return Ok(());
            }
            let draft = app.drafts.remove_photo(&draft, &photo_id).await?;
            println!("✔ 削除しました（残り {}枚）", draft.photos.len());
        }

        Commands::Edit { photo_id, part, unreadable } => {
            let app = open_local(&config).await?;
            let draft = app.drafts.load().await?;
            let Some(photo) = draft.photo(&photo_id) else {
                println!("写真が見つかりません: {}", photo_id);
                return Ok(());
            };
            let part = part.or_else(|| photo.manual_part.clone());
            let unreadable = unreadable.unwrap_or(photo.unreadable);
            app.drafts
                .update_photo_fields(&draft, &photo_id, part.as_deref(), unreadable)
                .await?;
            println!("✔ 写真を更新しました");
        }

        Commands::Meta { location, notes } => {
            let app = open_local(&config).await?;
            let draft = app.drafts.load().await?;
            let location = location.unwrap_or_else(|| draft.location_tag.clone());
            let notes = notes.unwrap_or_else(|| draft.notes.clone());
            let draft = app.drafts.update_meta(&draft, &location, &notes).await?;
            println!("✔ ロケーション: {}", draft.location_tag);
        }

        Commands::Draft => {
            let app = open_local(&config).await?;
            let draft = app.drafts.load().await?;
            print_draft(&draft);
        }

        Commands::Discard { yes } => {
            let app = open_local(&config).await?;
            let confirmed = yes
                || Confirm::new()
                    .with_prompt("ドラフトを破棄しますか？")
                    .default(false)
                    .interact()
                    .map_err(|e| ShoelaceError::CliExecution(e.to_string()))?;
            if confirmed {
                app.drafts.clear().await?;
                println!("✔ ドラフトを破棄しました");
            }
        }

        Commands::Submit => {
            let app = open_online(&config, cli.offline).await?;
            app.synchronizer.sync_queue().await;

            let draft = app.drafts.load().await?;
            let scan = match app.submitter.finalize(&draft).await {
                Ok(scan) => scan,
                Err(e @ ShoelaceError::Validation(_)) => {
                    println!("⚠ {}", e);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            println!("✔ スキャン {} を作成: {}", scan.id, scan.status);
            if scan.result.is_none() {
                println!("  オンライン復帰後に解析されます（shoelace sync）");
            }
        }

        Commands::Sync => {
            let app = open_online(&config, cli.offline).await?;
            let report = app.synchronizer.sync_queue().await;
            if let SyncReport::Paused { synced, remaining, reason } = report {
                println!("  送信済み {}件 / 残り {}件: {}", synced, remaining, reason);
            }
        }

        Commands::Watch { interval } => {
            let app = open_online(&config, cli.offline).await?;
            println!("📡 接続を監視中（Ctrl+C で終了）");
            let handle = spawn_reconnect_sync(app.connectivity.clone(), app.synchronizer.clone());
            app.synchronizer.sync_queue().await;

            let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let online = resolve_online(&config, cli.offline).await;
                        app.connectivity.set_online(online);
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            handle.abort();
        }

        Commands::List => {
            let app = open_online(&config, cli.offline).await?;
            app.synchronizer.sync_queue().await;

            let scans = app.store.list_scans().await?;
            if scans.is_empty() {
                println!("スキャンはまだありません");
            }
            for scan in &scans {
                println!(
                    "{}  {}  {}  [{}]",
                    scan.created_at.format("%Y-%m-%d %H:%M"),
                    scan.id,
                    scan.location_tag,
                    scan.status
                );
            }
        }

        Commands::Show { scan_id, json } => {
            let app = open_online(&config, cli.offline).await?;
            app.synchronizer.sync_queue().await;

            match app.store.scans().get(&scan_id).await? {
                Some(scan) if json => {
                    let raw = match &scan.result {
                        Some(result) => serde_json::to_string_pretty(result)?,
                        None => serde_json::json!({ "queued": true }).to_string(),
                    };
                    println!("{}", raw);
                }
                Some(scan) => print_scan(&scan),
                None => println!("スキャンが見つかりません: {}", scan_id),
            }
        }
    }

    Ok(())
}

/// ネットワークを使わない操作用（ドラフト編集など）
async fn open_local(config: &Config) -> anyhow::Result<App> {
    open_app(config, false).await
}

/// 送信・同期する操作用。接続状態を確認してから開く
async fn open_online(config: &Config, force_offline: bool) -> anyhow::Result<App> {
    let online = resolve_online(config, force_offline).await;
    open_app(config, online).await
}

async fn open_app(config: &Config, online: bool) -> anyhow::Result<App> {
    App::open(config, online, Arc::new(ConsoleSink))
        .await
        .context("データストアを開けません")
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn resolve_online(config: &Config, force_offline: bool) -> bool {
    if force_offline || config.force_offline {
        return false;
    }
    if config.simulate {
        return true;
    }
    probe(&config.endpoint, PROBE_TIMEOUT).await
}

fn print_draft(draft: &Draft) {
    if draft.photos.is_empty() {
        println!("ドラフトに写真がありません（shoelace add で追加）");
    }
    println!("ロケーション: {}", draft.location_tag);
    println!("メモ: {}", draft.notes);
    for photo in &draft.photos {
        println!(
            "  {}  {}  品番: {}{}",
            photo.id,
            photo.name,
            photo.manual_part().unwrap_or("-"),
            if photo.unreadable { "  [判読不能]" } else { "" }
        );
    }
}

fn print_scan(scan: &Scan) {
    println!("Location: {}", scan.location_tag);
    println!("Status: {}", scan.status);

    let Some(result) = &scan.result else {
        println!("解析待ちです。オンライン復帰後に更新されます。");
        return;
    };

    println!("Overall confidence: {:.0}%", result.overall_confidence * 100.0);
    println!("Sell first tags: {}", result.sell_first_tags.join(", "));
    println!("Suggested channels: {}", result.suggested_channels.join(", "));
    println!("Items:");
    for item in &result.items {
        println!(
            "  {} - {}  Qty est: {} | Confidence {:.0}%  {}",
            item.part,
            item.category,
            item.qty_estimate,
            item.confidence * 100.0,
            item.price_range
        );
    }
}
