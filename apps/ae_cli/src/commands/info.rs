// apps/ae_cli/src/commands/info.rs

//! 信息命令：网格与拓扑摘要

use anyhow::{Context, Result};
use ae_config::SolverConfig;
use clap::Args;
use std::path::PathBuf;

/// 信息参数
#[derive(Args)]
pub struct InfoArgs {
    /// 输入卡路径（JSON）
    #[arg(short, long)]
    pub config: PathBuf,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    let config = SolverConfig::from_file(&args.config)
        .with_context(|| format!("读取输入卡 {} 失败", args.config.display()))?;

    println!("算例: {}", config.sim_name);
    println!(
        "来流: M={} 方向={:?} Re={:.3e}",
        config.reference.mach, config.reference.direction, config.reference.reynolds
    );
    println!(
        "推进: {:?} / {:?}, 外层 {} 步 × 非线性 {} 次",
        config.time.equation_set,
        config.time.integrator,
        config.time.outer_steps,
        config.time.nonlinear_iters
    );
    println!("湍流: {:?} ({:?})", config.turbulence.model, config.turbulence.wall_treatment);

    let grids = ae_io::read_grid(&config.grid_file, config.reference.l_ref)
        .with_context(|| format!("读取网格 {} 失败", config.grid_file.display()))?;
    let bc_input = ae_io::read_bc_file(&config.bc_file)
        .with_context(|| format!("读取边界条件 {} 失败", config.bc_file.display()))?;

    let mut total = 0usize;
    for (id, grid) in grids.iter().enumerate() {
        let (ni, nj, nk) = grid.num_cells();
        total += ni * nj * nk;
        let n_surf = bc_input
            .boundaries
            .get(id)
            .map(|b| b.surfaces().len())
            .unwrap_or(0);
        println!(
            "块 {:3}: {:4} × {:4} × {:4} = {:8} 单元, {} 个边界面",
            id,
            ni,
            nj,
            nk,
            ni * nj * nk,
            n_surf
        );
    }
    println!("共 {} 块, {} 单元, {} 个显式补丁", grids.len(), total, bc_input.patches.len());

    Ok(())
}
