// apps/ae_cli/src/commands/validate.rs

//! 校验命令：输入卡 + 网格/边界一致性

use anyhow::{bail, Context, Result};
use ae_config::SolverConfig;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// 校验参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 输入卡路径（JSON）
    #[arg(short, long)]
    pub config: PathBuf,

    /// 同时校验网格与边界文件
    #[arg(long)]
    pub with_grid: bool,
}

/// 执行校验命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    let config = SolverConfig::from_file(&args.config)
        .with_context(|| format!("输入卡 {} 校验失败", args.config.display()))?;
    info!(sim = %config.sim_name, "输入卡有效");

    if args.with_grid {
        let grids = ae_io::read_grid(&config.grid_file, config.reference.l_ref)
            .with_context(|| format!("网格 {} 读取失败", config.grid_file.display()))?;
        let bc_input = ae_io::read_bc_file(&config.bc_file)
            .with_context(|| format!("边界条件 {} 读取失败", config.bc_file.display()))?;

        if grids.len() != bc_input.boundaries.len() {
            bail!(
                "网格块数 {} 与边界条件块数 {} 不一致",
                grids.len(),
                bc_input.boundaries.len()
            );
        }
        for (id, (grid, bcs)) in grids.iter().zip(bc_input.boundaries.iter()).enumerate() {
            let (ni, nj, nk) = grid.num_cells();
            bcs.check_coverage(ni, nj, nk)
                .with_context(|| format!("块 {} 边界覆盖校验失败", id))?;
        }
        info!(blocks = grids.len(), "网格与边界一致");
    }

    println!("OK");
    Ok(())
}
