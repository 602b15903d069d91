// crates/ae_physics/src/exchange.rs

//! 幽灵交换与残差归约
//!
//! 确定性的进程内 rank 脚手架：分区元数据 + 按方位打包/路由/
//! 解包原语，后续阶段可直接接到 rsmpi。每次幽灵填充：
//!
//! 1. 对每个块间/周期补丁，把表面法向宽度 G 的内部切片按方位
//!    打包进发送缓冲（布局即接收方的存储序）
//! 2. 缓冲按接收 rank 投递到信箱；同 rank 补丁原地复制
//! 3. 等待全部在途消息（进程内为确定性排空）
//! 4. 各块施加纯本地的非连接 BC
//!
//! 序保证：`assemble_rhs` 运行时幽灵与迭代起始的内部状态一致；
//! 幽灵填充与 RHS 装配不重叠。缓冲的生存期限于一次交换。
//!
//! 残差集体操作：按固定 rank 序折叠的 SUM 与 MAXLOC，结果与
//! rank 数无关。

use crate::block::ProcBlock;
use crate::boundary::GhostContext;
use crate::error::{SolverResult, TransientError};
use crate::patch::InterblockPatch;
use crate::state::{EqnVec, PrimitiveState, NUM_EQNS};
use crate::thermo::Thermodynamics;
use rayon::prelude::*;

/// 消息投递的有界重试次数
const EXCHANGE_RETRIES: usize = 3;

/// 一条幽灵消息：目的块/边界面 + 接收序排列的状态切片
#[derive(Debug, Clone)]
struct GhostMessage {
    dest_block: usize,
    dest_boundary: usize,
    /// 接收侧尺寸 (n1, n2)
    dims: (usize, usize),
    /// 层号优先、接收 (d1, d2) 序的数据
    data: Vec<PrimitiveState>,
}

/// 打包一侧补丁的发送缓冲
///
/// 数据按接收方 (d1, d2) 坐标布局，接收方顺序写入即可。
fn pack_side(
    blocks: &[ProcBlock],
    patch: &InterblockPatch,
    side: usize,
) -> SolverResult<GhostMessage> {
    let (mine, remote) = if side == 0 {
        (patch.first, patch.second)
    } else {
        (patch.second, patch.first)
    };
    let sender = &blocks[mine.block];
    let g = sender.ghosts();
    let surf = &sender.boundary_conditions().surfaces()[mine.boundary];
    let (a0, a1) = surf.d1_range();
    let (b0, b1) = surf.d2_range();
    let src_dims = (a1 - a0, b1 - b0);

    let orient = patch.send_orientation(side);
    let dest_dims = orient.dest_dims(src_dims);

    let mut data =
        vec![PrimitiveState::default(); g * dest_dims.0 * dest_dims.1];

    let dir = surf.direction();
    let lower = surf.is_lower();
    let (ni, nj, nk) = sender.num_cells();
    let n_axis = [ni, nj, nk][dir];

    for l in 0..g {
        for b in 0..src_dims.1 {
            for a in 0..src_dims.0 {
                // 发送层 l = 距面第 l 层内部单元
                let ax = if lower { g + l } else { g + n_axis - 1 - l };
                let cell = match dir {
                    0 => (ax, a + a0 + g, b + b0 + g),
                    1 => (b + b0 + g, ax, a + a0 + g),
                    _ => (a + a0 + g, b + b0 + g, ax),
                };
                let (da, db) = orient.apply((a, b), src_dims);
                data[(l * dest_dims.1 + db) * dest_dims.0 + da] = sender.state()[cell];
            }
        }
    }

    Ok(GhostMessage {
        dest_block: remote.block,
        dest_boundary: remote.boundary,
        dims: dest_dims,
        data,
    })
}

/// 解包到接收块的幽灵切片
fn unpack_into(block: &mut ProcBlock, msg: &GhostMessage, thermo: &Thermodynamics) -> SolverResult<()> {
    let g = block.ghosts();
    let surf = &block.boundary_conditions().surfaces()[msg.dest_boundary];
    let (a0, a1) = surf.d1_range();
    let (b0, b1) = surf.d2_range();
    let dims = (a1 - a0, b1 - b0);
    if dims != msg.dims {
        return Err(TransientError::MessageLost {
            block: msg.dest_block,
            boundary: msg.dest_boundary,
        }
        .into());
    }

    let dir = surf.direction();
    let lower = surf.is_lower();
    let (ni, nj, nk) = block.num_cells();
    let n_axis = [ni, nj, nk][dir];

    for l in 0..g {
        for b in 0..dims.1 {
            for a in 0..dims.0 {
                // 接收层 l = 面外第 l 层幽灵单元
                let ax = if lower { g - 1 - l } else { g + n_axis + l };
                let cell = match dir {
                    0 => (ax, a + a0 + g, b + b0 + g),
                    1 => (b + b0 + g, ax, a + a0 + g),
                    _ => (a + a0 + g, b + b0 + g, ax),
                };
                let q = msg.data[(l * dims.1 + b) * dims.0 + a];
                block.set_ghost_state(cell, q, thermo);
            }
        }
    }
    Ok(())
}

/// 幽灵交换：补丁切片路由 + 本地 BC 填充
///
/// 打包读旧状态、投递、等待、再施加本地 BC，单次调用内完成，
/// 对调用方表现为一个交换屏障。
pub fn exchange_ghosts(
    blocks: &mut [ProcBlock],
    patches: &[InterblockPatch],
    ctx: &GhostContext<'_>,
) -> SolverResult<()> {
    // 1. 打包（只读旧状态，顺序确定）
    let mut messages = Vec::with_capacity(patches.len() * 2);
    for patch in patches {
        messages.push(pack_side(blocks, patch, 0)?);
        messages.push(pack_side(blocks, patch, 1)?);
    }

    // 2./3. 投递并等待：进程内为确定性排空；有界重试后升级
    let mut pending: Vec<GhostMessage> = messages;
    for attempt in 0..=EXCHANGE_RETRIES {
        let mut failed = Vec::new();
        for msg in pending.drain(..) {
            match unpack_into(&mut blocks[msg.dest_block], &msg, ctx.thermo) {
                Ok(()) => {}
                Err(e) if attempt < EXCHANGE_RETRIES => {
                    tracing::warn!(
                        block = msg.dest_block,
                        boundary = msg.dest_boundary,
                        attempt,
                        error = %e,
                        "幽灵消息投递失败，重试"
                    );
                    failed.push(msg);
                }
                Err(e) => return Err(e),
            }
        }
        if failed.is_empty() {
            break;
        }
        pending = failed;
    }

    // 4. 纯本地 BC（各块独立，rank 间无共享可变状态）
    blocks
        .par_iter_mut()
        .for_each(|block| block.fill_ghosts(ctx));

    Ok(())
}

// ============================================================
// 残差集体操作
// ============================================================

/// L∞ 残差及其定位（块、单元、方程）
#[derive(Debug, Clone, Copy)]
pub struct ResidualLinf {
    /// 最大残差值
    pub value: f64,
    /// 块号
    pub block: usize,
    /// i 索引（内部相对）
    pub i: usize,
    /// j 索引
    pub j: usize,
    /// k 索引
    pub k: usize,
    /// 方程号
    pub eqn: usize,
}

impl Default for ResidualLinf {
    fn default() -> Self {
        Self {
            value: 0.0,
            block: 0,
            i: 0,
            j: 0,
            k: 0,
            eqn: 0,
        }
    }
}

/// 残差范数聚合：逐方程 Σ R² + MAXLOC
#[derive(Debug, Clone, Copy, Default)]
pub struct ResidualNorms {
    /// 逐方程平方和
    pub l2_sum: EqnVec,
    /// 内部单元计数
    pub cell_count: usize,
    /// L∞ 与定位
    pub linf: ResidualLinf,
}

impl ResidualNorms {
    /// 归并另一份部分和（SUM + MAXLOC）
    #[must_use]
    pub fn merged(mut self, other: &Self) -> Self {
        self.l2_sum += other.l2_sum;
        self.cell_count += other.cell_count;
        if other.linf.value > self.linf.value {
            self.linf = other.linf;
        }
        self
    }

    /// 逐方程 L2 范数：sqrt(Σ R²) / N
    #[must_use]
    pub fn l2(&self) -> EqnVec {
        let n = self.cell_count.max(1) as f64;
        let mut out = EqnVec::ZERO;
        for eq in 0..NUM_EQNS {
            out[eq] = self.l2_sum[eq].sqrt() / n;
        }
        out
    }
}

/// 单块残差聚合
#[must_use]
pub fn gather_block_residuals(block: &ProcBlock) -> ResidualNorms {
    let (ni, nj, nk) = block.num_cells();
    let mut norms = ResidualNorms::default();
    norms.cell_count = ni * nj * nk;

    for k in 0..nk {
        for j in 0..nj {
            for i in 0..ni {
                let r = block.residual_at(i, j, k);
                for eq in 0..NUM_EQNS {
                    let v = r[eq];
                    norms.l2_sum[eq] += v * v;
                    if v.abs() > norms.linf.value {
                        norms.linf = ResidualLinf {
                            value: v.abs(),
                            block: block.id(),
                            i,
                            j,
                            k,
                            eqn: eq,
                        };
                    }
                }
            }
        }
    }
    norms
}

/// 跨 rank 归约（Allreduce SUM + MAXLOC）
///
/// 按固定块序折叠，结果与 rank 布局无关（确定性）。
#[must_use]
pub fn reduce_residuals(blocks: &[ProcBlock]) -> ResidualNorms {
    let partials: Vec<ResidualNorms> = blocks
        .par_iter()
        .map(gather_block_residuals)
        .collect();
    partials
        .iter()
        .fold(ResidualNorms::default(), |acc, p| acc.merged(p))
}

/// 全局最小 Δt（全局时间步进模式的 Allreduce MIN）
#[must_use]
pub fn reduce_min_dt(blocks: &[ProcBlock]) -> f64 {
    blocks
        .iter()
        .map(|b| b.min_dt())
        .fold(f64::MAX, f64::min)
}

// ============================================================
// 测试
// ============================================================
