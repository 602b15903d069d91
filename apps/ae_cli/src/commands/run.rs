// apps/ae_cli/src/commands/run.rs

//! 运行求解命令
//!
//! 读输入卡 → 读网格与边界 → 装配求解器 → 外层迭代推进，
//! 按输出间隔写函数文件。致命错误时冲刷残差日志并转储
//! 最后完好解，以非零码退出。

use anyhow::{bail, Context, Result};
use ae_config::SolverConfig;
use ae_io::ResidualLog;
use ae_physics::{ProcBlock, Solver};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 输入卡路径（JSON）
    #[arg(short, long)]
    pub config: PathBuf,

    /// 覆盖网格文件路径
    #[arg(short, long)]
    pub grid: Option<PathBuf>,

    /// 覆盖边界条件文件路径
    #[arg(short, long)]
    pub bc: Option<PathBuf>,

    /// 覆盖外层步数
    #[arg(short = 'n', long)]
    pub steps: Option<usize>,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== Aerion 求解启动 ===");
    let wall_clock = Instant::now();

    let mut config = SolverConfig::from_file(&args.config)
        .with_context(|| format!("读取输入卡 {} 失败", args.config.display()))?;
    if let Some(grid) = args.grid {
        config.grid_file = grid;
    }
    if let Some(bc) = args.bc {
        config.bc_file = bc;
    }
    if let Some(steps) = args.steps {
        config.time.outer_steps = steps;
    }

    let grids = ae_io::read_grid(&config.grid_file, config.reference.l_ref)
        .with_context(|| format!("读取网格 {} 失败", config.grid_file.display()))?;
    let bc_input = ae_io::read_bc_file(&config.bc_file)
        .with_context(|| format!("读取边界条件 {} 失败", config.bc_file.display()))?;

    if grids.len() != bc_input.boundaries.len() {
        bail!(
            "网格块数 {} 与边界条件块数 {} 不一致",
            grids.len(),
            bc_input.boundaries.len()
        );
    }

    let blocks: Vec<ProcBlock> = grids
        .iter()
        .zip(bc_input.boundaries.iter())
        .enumerate()
        .map(|(id, (grid, bcs))| ProcBlock::new(grid, bcs.clone(), id))
        .collect::<Result<_, _>>()
        .context("块几何构建失败")?;

    let total_cells: usize = blocks.iter().map(|b| b.num_interior()).sum();
    info!(
        blocks = blocks.len(),
        cells = total_cells,
        "网格读取完成"
    );

    let mut solver =
        Solver::new(blocks, bc_input.patches, config.clone()).context("求解器装配失败")?;

    // 单元中心网格先行写出
    ae_io::write_cell_center_file(
        &config.sim_name,
        solver.blocks(),
        solver.decomposition(),
        config.reference.l_ref,
    )
    .context("单元中心网格写出失败")?;

    let mut log = ResidualLog::create(&config).context("残差日志创建失败")?;

    for outer in 0..config.time.outer_steps {
        match solver.step(outer) {
            Ok(reports) => {
                for report in &reports {
                    log.record(report)?;
                }
            }
            Err(e) => {
                // 集体中止路径：冲刷日志、转储最后完好解
                error!(step = outer, error = %e, "致命错误，转储最后完好解");
                log.flush()?;
                let thermo = *solver.thermodynamics();
                let _ = ae_io::write_function_file(
                    outer,
                    solver.blocks(),
                    solver.decomposition(),
                    &config,
                    &thermo,
                );
                return Err(e).context("求解中止");
            }
        }

        if (outer + 1) % config.output.frequency == 0 {
            let thermo = *solver.thermodynamics();
            ae_io::write_function_file(
                outer + 1,
                solver.blocks(),
                solver.decomposition(),
                &config,
                &thermo,
            )
            .context("函数文件写出失败")?;
            ae_io::write_results_file(&config, outer + 1).context("结果索引写出失败")?;
        }
    }

    log.flush()?;
    info!(
        elapsed = ?wall_clock.elapsed(),
        "=== 求解完成 ==="
    );
    Ok(())
}
