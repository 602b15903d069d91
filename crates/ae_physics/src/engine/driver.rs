// crates/ae_physics/src/engine/driver.rs

//! 时间积分驱动
//!
//! 外层索引 n 遍历物理（或伪）时间步，内层索引 m 遍历非线性
//! 子迭代。每个子迭代的锁步序：
//!
//! 交换 → 梯度 → RHS → 状态更新 → 残差归约
//!
//! 全部 rank 完成第 n 步的残差归约之前，任何 rank 不得开始第
//! n+1 步的交换（集体操作即屏障）。
//!
//! 两种模式：
//! - 显式：四级 SSP Runge-Kutta，每级重新交换幽灵并装配 RHS
//! - 隐式：LU-SGS（见 lusgs 模块）
//!
//! 步长拒绝：可恢复的数值错误触发恢复快照、违例单元局部 CFL
//! 减半、重试；预算耗尽后向上报告，调用方走集体中止路径并
//! 转储最后完好解。无全局可变状态：配置、热力学、湍流模型
//! 全部显式持有。

use crate::array3d::Array3D;
use crate::block::{ProcBlock, RhsContext, RhsStats};
use crate::boundary::GhostContext;
use crate::decomp::{decompose, pair_interblock_patches, Decomposition};
use crate::error::{SolverError, SolverResult};
use crate::exchange::{exchange_ghosts, reduce_min_dt, reduce_residuals, ResidualLinf};
use crate::numerics::limiter::SlopeLimiter;
use crate::patch::InterblockPatch;
use crate::schemes::roe::RoeFlux;
use crate::state::{ConservedState, EqnVec, PrimitiveState};
use crate::thermo::Thermodynamics;
use crate::turbulence::TurbulenceModel;
use crate::walldist::compute_wall_distances;
use ae_config::{Integrator, SolverConfig};
use glam::DVec3;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// 四级 SSP Runge-Kutta 系数
const RK4_ALPHAS: [f64; 4] = [0.25, 1.0 / 3.0, 0.5, 1.0];

/// 单个非线性子迭代的报告
#[derive(Debug, Clone, Copy)]
pub struct StepReport {
    /// 外层迭代号
    pub outer: usize,
    /// 非线性子迭代号
    pub inner: usize,
    /// 本步 CFL（固定 Δt 模式下为 Δt）
    pub cfl_or_dt: f64,
    /// 归一化 L2 残差
    pub l2_norm: EqnVec,
    /// L∞ 残差与定位
    pub linf: ResidualLinf,
    /// 隐式线性相对残差（显式为 0）
    pub matrix_residual: f64,
    /// 一阶修复面数（诊断）
    pub repaired_faces: usize,
}

/// 求解器：块集合 + 分解 + 补丁表 + 显式上下文
pub struct Solver {
    blocks: Vec<ProcBlock>,
    decomp: Decomposition,
    patches: Vec<InterblockPatch>,
    config: SolverConfig,
    thermo: Thermodynamics,
    turb: TurbulenceModel,
    freestream: PrimitiveState,
    history: super::residual::ResidualHistory,
    /// 最后完好解（按外层步更新）
    last_good: Option<Vec<Array3D<ConservedState>>>,
}

impl Solver {
    /// 装配求解器：分解、补丁配对、壁距预计算、来流初始化
    ///
    /// `explicit_patches` 为输入卡给出的方位标注补丁对（周期等）；
    /// 其余块间表面（含分解接缝）由几何点匹配配对。
    pub fn new(
        blocks: Vec<ProcBlock>,
        explicit_patches: Vec<InterblockPatch>,
        config: SolverConfig,
    ) -> SolverResult<Self> {
        let thermo = Thermodynamics::from_config(&config.fluid, &config.reference);
        let turb = TurbulenceModel::from_config(&config.turbulence);

        // 来流：ρ=1, |V|=M, p=1/γ
        let dir = DVec3::from_array(config.reference.direction).normalize();
        let (tke_inf, sdr_inf) = turb.freestream(config.reference.mach, &config.turbulence);
        let freestream = PrimitiveState::with_turbulence(
            1.0,
            dir * config.reference.mach,
            1.0 / config.fluid.gamma,
            tke_inf,
            sdr_inf,
        );

        // 显式补丁引用的块不可拆（表面序号须保持有效）
        let frozen: Vec<usize> = explicit_patches
            .iter()
            .flat_map(|p| [p.first.block, p.second.block])
            .collect();

        let (mut blocks, decomp) = decompose(blocks, config.num_ranks, &frozen)?;
        let patches = pair_interblock_patches(&blocks, &explicit_patches)?;

        compute_wall_distances(&mut blocks);
        for block in &mut blocks {
            block.initialize(&freestream, &thermo);
        }

        info!(
            blocks = blocks.len(),
            patches = patches.len(),
            ranks = config.num_ranks,
            model = ?turb,
            "求解器装配完成"
        );

        let window = config.time.norm_reset_window;
        Ok(Self {
            blocks,
            decomp,
            patches,
            config,
            thermo,
            turb,
            freestream,
            history: super::residual::ResidualHistory::new(window),
            last_good: None,
        })
    }

    /// 块集合
    #[must_use]
    pub fn blocks(&self) -> &[ProcBlock] {
        &self.blocks
    }

    /// 分解
    #[must_use]
    pub fn decomposition(&self) -> &Decomposition {
        &self.decomp
    }

    /// 热力学对象
    #[must_use]
    pub fn thermodynamics(&self) -> &Thermodynamics {
        &self.thermo
    }

    /// 湍流模型
    #[must_use]
    pub fn turbulence(&self) -> &TurbulenceModel {
        &self.turb
    }

    /// 来流状态
    #[must_use]
    pub fn freestream(&self) -> &PrimitiveState {
        &self.freestream
    }

    /// 最后完好解（致命错误后转储用）
    #[must_use]
    pub fn last_good(&self) -> Option<&[Array3D<ConservedState>]> {
        self.last_good.as_deref()
    }

    /// 覆盖初始条件（算例/重启用）
    pub fn set_initial_condition<F>(&mut self, f: F)
    where
        F: Fn(usize, DVec3) -> PrimitiveState,
    {
        let thermo = self.thermo;
        for block in &mut self.blocks {
            let (ni, nj, nk) = block.num_cells();
            let g = block.ghosts();
            let id = block.id();
            for k in 0..nk {
                for j in 0..nj {
                    for i in 0..ni {
                        let c = block.geometry().center[(i + g, j + g, k + g)];
                        block.set_state(i, j, k, f(id, c), &thermo);
                    }
                }
            }
        }
    }

    fn ghost_ctx(&self) -> GhostContext<'_> {
        GhostContext {
            thermo: &self.thermo,
            turb: &self.turb,
            freestream: self.freestream,
            wall_temp: self.config.reference.wall_temp_ratio,
            wall_treatment: self.config.turbulence.wall_treatment,
        }
    }

    fn rhs_ctx(&self) -> RhsContext<'_> {
        RhsContext {
            thermo: &self.thermo,
            turb: &self.turb,
            roe: RoeFlux::new(self.thermo.gas, self.config.scheme.entropy_fix_coeff),
            limiter: SlopeLimiter::from_kind(self.config.scheme.limiter),
            viscous: self.config.is_viscous(),
        }
    }

    /// 交换 → 梯度 → RHS（一个非线性子迭代的装配部分）
    fn assemble(&mut self) -> SolverResult<RhsStats> {
        let gctx = GhostContext {
            thermo: &self.thermo,
            turb: &self.turb,
            freestream: self.freestream,
            wall_temp: self.config.reference.wall_temp_ratio,
            wall_treatment: self.config.turbulence.wall_treatment,
        };
        exchange_ghosts(&mut self.blocks, &self.patches, &gctx)?;

        let thermo = self.thermo;
        let turb = self.turb;
        self.blocks.par_iter_mut().for_each(|b| {
            b.compute_gradients(&thermo);
            b.compute_eddy_viscosity(&turb, &thermo);
        });

        let rctx = RhsContext {
            thermo: &self.thermo,
            turb: &self.turb,
            roe: RoeFlux::new(self.thermo.gas, self.config.scheme.entropy_fix_coeff),
            limiter: SlopeLimiter::from_kind(self.config.scheme.limiter),
            viscous: self.config.is_viscous(),
        };
        let stats: Vec<SolverResult<RhsStats>> = self
            .blocks
            .par_iter_mut()
            .map(|b| b.assemble_rhs(&rctx))
            .collect();

        let mut total = RhsStats::default();
        for s in stats {
            let s = s?;
            total.repaired_faces += s.repaired_faces;
            total.max_wave_speed = total.max_wave_speed.max(s.max_wave_speed);
        }
        Ok(total)
    }

    /// 计算本步时间步长分布
    fn set_timesteps(&mut self, cfl: f64) {
        let thermo = self.thermo;
        let viscous = self.config.is_viscous();
        self.blocks
            .par_iter_mut()
            .for_each(|b| b.local_timestep(cfl, &thermo, viscous));

        if self.config.time.uses_fixed_dt() {
            let dt = self.config.time.dt;
            for b in &mut self.blocks {
                b.set_uniform_dt(dt);
            }
        } else if !self.config.time.local_timestepping {
            // 全局时间步进：Allreduce MIN
            let dt = reduce_min_dt(&self.blocks);
            for b in &mut self.blocks {
                b.set_uniform_dt(dt);
            }
        }
    }

    /// 尝试一次状态更新（显式或隐式），返回隐式矩阵残差
    fn try_update(&mut self, snapshot: &[Array3D<ConservedState>]) -> SolverResult<f64> {
        let thermo = self.thermo;
        match self.config.time.integrator {
            Integrator::Explicit => {
                for (stage, alpha) in RK4_ALPHAS.iter().enumerate() {
                    if stage > 0 {
                        // 各级重新交换与装配，幽灵与该级起始状态一致
                        self.assemble()?;
                    }
                    let results: Vec<SolverResult<()>> = self
                        .blocks
                        .par_iter_mut()
                        .zip(snapshot.par_iter())
                        .map(|(b, s0)| b.rk_stage(s0, *alpha, &thermo))
                        .collect();
                    for r in results {
                        r?;
                    }
                }
                Ok(0.0)
            }
            Integrator::Implicit => {
                let sweeps = self.config.linear_solver.sweeps;
                let tol = self.config.linear_solver.tolerance;
                let results: Vec<SolverResult<f64>> = self
                    .blocks
                    .par_iter_mut()
                    .map(|b| {
                        b.implicit_update(&thermo, sweeps, tol)
                            .map(|r| r.matrix_residual)
                    })
                    .collect();
                let mut matrix_resid = 0.0f64;
                for r in results {
                    matrix_resid = matrix_resid.max(r?);
                }
                Ok(matrix_resid)
            }
        }
    }

    /// 推进一个外层步（含全部非线性子迭代）
    ///
    /// 返回每个子迭代的残差报告。致命错误时已恢复最后完好解。
    pub fn step(&mut self, outer: usize) -> SolverResult<Vec<StepReport>> {
        let cfl = self.config.time.cfl_at(outer);
        let mut reports = Vec::with_capacity(self.config.time.nonlinear_iters);

        for inner in 0..self.config.time.nonlinear_iters {
            let snapshot: Vec<Array3D<ConservedState>> =
                self.blocks.iter().map(|b| b.snapshot()).collect();

            let mut stats = self.assemble()?;
            self.set_timesteps(cfl);

            // 步长拒绝重试环：局部 CFL 减半，预算内重试
            let max_retries = self.config.linear_solver.max_retries;
            let mut matrix_resid;
            let mut attempt = 0usize;
            loop {
                match self.try_update(&snapshot) {
                    Ok(m) => {
                        matrix_resid = m;
                        break;
                    }
                    Err(e) if e.is_recoverable() && attempt < max_retries => {
                        attempt += 1;
                        let thermo = self.thermo;
                        match &e {
                            SolverError::Numerical(
                                crate::error::NumericalError::NonPositiveState {
                                    block, i, j, k, ..
                                },
                            ) => {
                                warn!(
                                    block, i, j, k, attempt,
                                    "步长拒绝：局部 CFL 减半后重试"
                                );
                                if let Some(b) =
                                    self.blocks.iter_mut().find(|b| b.id() == *block)
                                {
                                    b.halve_cfl_at(*i, *j, *k);
                                }
                            }
                            SolverError::Numerical(
                                crate::error::NumericalError::ReconstructionFailure {
                                    block,
                                    dir,
                                    i,
                                    j,
                                    k,
                                },
                            ) => {
                                warn!(
                                    block, dir, i, j, k, attempt,
                                    "重构失败：面邻单元局部 CFL 减半后重试"
                                );
                                // 面 (dir, f, a, b) 的左侧单元
                                if let Some(b) =
                                    self.blocks.iter_mut().find(|b| b.id() == *block)
                                {
                                    let (ni, nj, nk) = b.num_cells();
                                    let f = i.saturating_sub(1);
                                    let cell = match dir {
                                        0 => (f.min(ni - 1), *j, *k),
                                        1 => (*k, f.min(nj - 1), *j),
                                        _ => (*j, *k, f.min(nk - 1)),
                                    };
                                    b.halve_cfl_at(cell.0, cell.1, cell.2);
                                }
                            }
                            _ => warn!(attempt, error = %e, "步长拒绝：重试"),
                        }
                        // 恢复快照并按折减后的局部 CFL 重算 Δt
                        for (b, s) in self.blocks.iter_mut().zip(snapshot.iter()) {
                            b.restore(s, &thermo);
                        }
                        stats = self.assemble()?;
                        self.set_timesteps(cfl);
                    }
                    Err(e) => {
                        // 预算耗尽或不可恢复：恢复最后完好解后上报
                        let thermo = self.thermo;
                        for (b, s) in self.blocks.iter_mut().zip(snapshot.iter()) {
                            b.restore(s, &thermo);
                        }
                        self.last_good = Some(snapshot);
                        return Err(e);
                    }
                }
            }

            // 残差归约（集体屏障，rank 间锁步）
            let norms = reduce_residuals(&self.blocks);
            let l2_norm = self.history.normalize(outer, inner, &norms.l2());

            debug!(
                outer,
                inner,
                repaired = stats.repaired_faces,
                linf = norms.linf.value,
                "子迭代完成"
            );

            reports.push(StepReport {
                outer,
                inner,
                cfl_or_dt: if self.config.time.uses_fixed_dt() {
                    self.config.time.dt
                } else {
                    cfl
                },
                l2_norm,
                linf: norms.linf,
                matrix_residual: matrix_resid,
                repaired_faces: stats.repaired_faces,
            });
        }

        // 接受步：缓慢恢复局部 CFL 折减，更新最后完好解
        for b in &mut self.blocks {
            b.relax_cfl_scale();
        }
        self.last_good = Some(self.blocks.iter().map(|b| b.snapshot()).collect());

        Ok(reports)
    }
}
