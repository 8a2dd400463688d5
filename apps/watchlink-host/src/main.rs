//! Watchlink 中继宿主进程
//!
//! 把中继核心接到模拟飞行器服务和控制台伴侣设备上：
//! stdin 输入请求码，stdout 输出下行 JSON，日志写到 stderr（可选同时写文件）。

mod console;
mod simulator;

use anyhow::{Context, Result, bail};
use clap::Parser;
use console::{ConsolePeripheral, LogHostStatus, LogNotifier};
use simulator::{EventSink, SimulatedService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use watchlink_relay::{Relay, RelayConfig, RelayEvent, spawn_relay};

/// Watchlink 中继宿主
#[derive(Parser, Debug)]
#[command(name = "watchlink-host")]
#[command(about = "Relay vehicle telemetry to a wrist-worn companion display", long_about = None)]
struct Args {
    /// 配置文件路径
    ///
    /// 默认: 平台配置目录下的 watchlink/config.toml（不存在时使用内置默认值）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 覆盖遥测最小发送间隔（毫秒）
    #[arg(long)]
    interval_ms: Option<u64>,

    /// 日志目录（每日轮转）；不指定时只输出到 stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// 模拟遥测更新频率（Hz）
    #[arg(long, default_value = "4.0")]
    simulate_rate_hz: f64,
}

/// 初始化日志
///
/// 返回的 guard 必须存活到进程退出，否则文件日志可能丢失尾部。
fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("watchlink_relay=info,watchlink_host=info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "watchlink-host.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

fn load_config(args: &Args) -> Result<RelayConfig> {
    let mut config = match &args.config {
        Some(path) => RelayConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match RelayConfig::default_path().filter(|p| p.exists()) {
            Some(path) => RelayConfig::load_from_file(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => RelayConfig::default(),
        },
    };

    if let Some(interval_ms) = args.interval_ms {
        config.telemetry_interval_ms = interval_ms;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_dir.as_deref());

    if !(args.simulate_rate_hz.is_finite() && args.simulate_rate_hz > 0.0) {
        bail!("--simulate-rate-hz must be a positive number");
    }
    let config = load_config(&args)?;
    info!(
        "Starting relay: interval={}ms, transport={:?}, battery={:?}",
        config.telemetry_interval_ms, config.transport.link, config.battery_display
    );

    let sink: EventSink = Arc::default();
    let service = SimulatedService::new(sink.clone());
    let running = Arc::new(AtomicBool::new(true));
    let generator = service.spawn_telemetry(args.simulate_rate_hz, running.clone());

    let relay = Relay::new(
        &config,
        service,
        ConsolePeripheral,
        LogHostStatus,
        LogNotifier,
    )?;
    let runtime = spawn_relay(relay, config.channel_capacity)?;
    let metrics = runtime.metrics().clone();
    let handle = runtime.handle();
    if sink.set(handle.clone()).is_err() {
        bail!("Relay handle already installed");
    }

    // Ctrl+C 与 stdin 结束都只是投递 Shutdown，由中继线程完成拆除
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    {
        let stop_tx = stop_tx.clone();
        ctrlc::set_handler(move || {
            let _ = stop_tx.try_send(());
        })
        .context("Failed to set Ctrl+C handler")?;
    }
    thread::spawn(move || {
        console::read_requests(|message| handle.post(RelayEvent::Inbound(message)).is_ok());
        let _ = stop_tx.try_send(());
    });

    info!("Relay running. Type a request (follow, cycle, pause, rtl, connect, disconnect) or Ctrl+C to stop.");
    let _ = stop_rx.recv();

    info!("Shutting down...");
    running.store(false, Ordering::Release);
    runtime.shutdown()?;
    if generator.join().is_err() {
        warn!("Telemetry generator panicked");
    }

    let snapshot = metrics.snapshot();
    info!(
        "Relay stopped: sent={}, throttled={} ({:.1}%), skipped={}, acks={}, dispatched={}, ignored={}, suppressed={}",
        snapshot.telemetry_sent,
        snapshot.telemetry_throttled,
        snapshot.throttle_rate(),
        snapshot.telemetry_skipped,
        snapshot.acks_sent,
        snapshot.commands_dispatched,
        snapshot.commands_ignored,
        snapshot.errors_suppressed,
    );
    Ok(())
}
