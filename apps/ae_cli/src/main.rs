// apps/ae_cli/src/main.rs

//! Aerion 命令行界面
//!
//! 结构化多块可压缩 Navier-Stokes 求解器的命令行工具。
//!
//! # 架构层级
//!
//! 本模块属于 **Layer 5: Application**：只做参数解析、日志初始化
//! 与错误到退出码的映射；任何 rank 上的致命错误走集体中止路径，
//! 以非零码退出。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Aerion 可压缩流求解器命令行工具
#[derive(Parser)]
#[command(name = "aerion")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Aerion compressible Navier-Stokes solver", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行求解
    Run(commands::run::RunArgs),
    /// 校验输入卡与网格
    Validate(commands::validate::ValidateArgs),
    /// 显示网格与拓扑信息
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    }
}
