// crates/ae_physics/src/decomp.rs

//! 块分解、重组与拆分定位
//!
//! 分解以历史序记录拆分：`(parent, lowerChild, upperChild, axis,
//! index)`。下子块沿用父块号，上子块追加新号。重组按逆序回放
//! 拆分；[`split_block_number`] 通过回放拆分历史、逐步收窄
//! (lower, upper) 范围，定位重组索引空间中单元所属的拆分块。
//!
//! 负载均衡拆分器：反复取单元数最多的块沿其最长轴对半拆，
//! 直到块数达到 rank 数；块按轮转分配给 rank。

use crate::block::ProcBlock;
use crate::error::{SolverError, SolverResult};
use crate::patch::{InterblockPatch, Orientation, PatchSide};
use tracing::debug;

/// 拆分记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    /// 父块号（与下子块相同）
    pub parent: usize,
    /// 下子块号
    pub lower: usize,
    /// 上子块号（追加）
    pub upper: usize,
    /// 拆分轴 (0=i, 1=j, 2=k)
    pub axis: usize,
    /// 拆分单元索引（下子块获得 [0, index)）
    pub index: usize,
}

/// 分解：历史序拆分列表 + rank 分配
#[derive(Debug, Clone, Default)]
pub struct Decomposition {
    /// 历史序拆分记录
    pub splits: Vec<Split>,
    /// 每块所属 rank
    pub rank_of: Vec<usize>,
}

impl Decomposition {
    /// 拆分数
    #[must_use]
    pub fn num_splits(&self) -> usize {
        self.splits.len()
    }
}

/// 块的可拆轴
///
/// 约束：拆分不得横向切断连接类表面（切断会破坏点匹配配对），
/// 故有连接面的块只能沿全部连接面的公共法向轴拆分。
fn splittable_axes(block: &ProcBlock) -> Vec<usize> {
    let (ni, nj, nk) = block.num_cells();
    let dims = [ni, nj, nk];
    let conn_dirs: Vec<usize> = block
        .boundary_conditions()
        .surfaces()
        .iter()
        .filter(|s| s.kind.is_connection())
        .map(|s| s.direction())
        .collect();

    (0..3)
        .filter(|axis| dims[*axis] >= 2 && conn_dirs.iter().all(|d| d == axis))
        .collect()
}

/// 负载均衡分解
///
/// 拆到块数 ≥ rank 数后轮转分配。单块单 rank 时不拆分。
/// `frozen` 中的块号不参与拆分（输入卡显式补丁引用的块，
/// 其表面序号须保持有效）。无块可拆时提前停止并告警，
/// 多余的 rank 空转。
pub fn decompose(
    mut blocks: Vec<ProcBlock>,
    num_ranks: usize,
    frozen: &[usize],
) -> SolverResult<(Vec<ProcBlock>, Decomposition)> {
    if num_ranks == 0 {
        return Err(SolverError::grid("rank 数必须至少为 1"));
    }

    let mut splits = Vec::new();

    while blocks.len() < num_ranks {
        // 取可拆块中单元数最多者
        let candidate = blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| !frozen.contains(&b.id()))
            .filter(|(_, b)| !splittable_axes(b).is_empty())
            .max_by_key(|(_, b)| b.num_interior());
        let Some((idx, _)) = candidate else {
            tracing::warn!(
                blocks = blocks.len(),
                num_ranks,
                "无块可拆，部分 rank 将空转"
            );
            break;
        };

        let (ni, nj, nk) = blocks[idx].num_cells();
        let dims = [ni, nj, nk];
        let axis = *splittable_axes(&blocks[idx])
            .iter()
            .max_by_key(|d| dims[**d])
            .expect("候选块至少一个可拆轴");

        let cut = dims[axis] / 2;
        let upper_id = blocks.len();
        let parent_id = blocks[idx].id();
        let (lower, upper) = blocks[idx].split(axis, cut, upper_id);

        debug!(
            block = parent_id,
            axis, cut, upper_id, "负载均衡拆分"
        );

        blocks[idx] = lower;
        blocks.push(upper);
        splits.push(Split {
            parent: parent_id,
            lower: parent_id,
            upper: upper_id,
            axis,
            index: cut,
        });
    }

    let rank_of: Vec<usize> = (0..blocks.len()).map(|b| b % num_ranks).collect();
    for (b, block) in blocks.iter_mut().enumerate() {
        block.set_rank(rank_of[b]);
    }

    Ok((blocks, Decomposition { splits, rank_of }))
}

/// 重组：按逆序回放拆分，恢复原始块构型
///
/// 输出块携带融合后的几何、状态与 BC 列表（BC 出处保留）。
#[must_use]
pub fn recombine(blocks: &[ProcBlock], decomp: &Decomposition) -> Vec<ProcBlock> {
    let mut recomb: Vec<ProcBlock> = blocks.to_vec();
    for split in decomp.splits.iter().rev() {
        let joined = recomb[split.lower].join(&recomb[split.upper], split.axis);
        recomb[split.lower] = joined;
        recomb.truncate(recomb.len() - 1);
    }
    recomb
}

/// 定位重组块中单元所属的拆分块号
///
/// `blk` 为重组后的块号，(i, j, k) 为该块索引空间中的内部单元。
/// 回放拆分历史，维护每个拆分块在重组索引空间中的
/// (下界, 上界) 范围并据此收窄。
#[must_use]
pub fn split_block_number(
    recombined: &[ProcBlock],
    decomp: &Decomposition,
    blk: usize,
    i: usize,
    j: usize,
    k: usize,
) -> usize {
    if decomp.num_splits() == 0 {
        return blk;
    }

    // 每个拆分块在重组索引空间中的范围 [lo, hi)；
    // 与查询块无血缘的块保持空盒占位，编号对齐。
    let num_original = recombined.len();
    let mut extents: Vec<([usize; 3], [usize; 3])> = (0..num_original)
        .map(|b| {
            if b == blk {
                let (ni, nj, nk) = recombined[b].num_cells();
                ([0, 0, 0], [ni, nj, nk])
            } else {
                ([0, 0, 0], [0, 0, 0])
            }
        })
        .collect();
    // 每块的原始祖先（下子块沿用被拆块的号，上子块追加）
    let mut ancestor: Vec<usize> = (0..num_original).collect();

    for split in &decomp.splits {
        let anc = ancestor[split.lower];
        ancestor.push(anc);
        if anc != blk {
            extents.push(([0, 0, 0], [0, 0, 0]));
            continue;
        }
        // 上子块范围 = 被拆块范围在拆分轴上抬高下界；
        // 拆分索引是被拆块的局部索引，转到重组全局索引。
        let (lo, hi) = extents[split.lower];
        let mut upper_lo = lo;
        upper_lo[split.axis] = lo[split.axis] + split.index;
        extents.push((upper_lo, hi));
        // 下子块范围在拆分轴上收窄
        extents[split.lower].1[split.axis] = lo[split.axis] + split.index;
    }

    // 回放结束后每个现存块的范围即最终叶子盒，互不相交
    let cell = [i, j, k];
    for (b, (lo, hi)) in extents.iter().enumerate() {
        if (0..3).all(|d| cell[d] >= lo[d] && cell[d] < hi[d]) {
            return b;
        }
    }
    blk
}

// ============================================================
// 几何配对：块间表面 → 补丁
// ============================================================

/// 坐标量化键（1e-8 精度）
fn quantize(v: glam::DVec3, scale: f64) -> (i64, i64, i64) {
    let q = 1.0e8 / scale.max(1.0e-12);
    (
        (v.x * q).round() as i64,
        (v.y * q).round() as i64,
        (v.z * q).round() as i64,
    )
}

/// 一个块间表面的面形心栅格
fn surface_centroids(block: &ProcBlock, surf_idx: usize) -> (Vec<Vec<glam::DVec3>>, (usize, usize)) {
    let surf = &block.boundary_conditions().surfaces()[surf_idx];
    let geom = block.geometry();
    let dir = surf.direction();
    let face = surf.face_index();
    let (a0, a1) = surf.d1_range();
    let (b0, b1) = surf.d2_range();
    let mut grid = Vec::with_capacity(b1 - b0);
    for b in b0..b1 {
        let mut row = Vec::with_capacity(a1 - a0);
        for a in a0..a1 {
            let c = match dir {
                0 => geom.fc_i[(face, a, b)],
                1 => geom.fc_j[(b, face, a)],
                _ => geom.fc_k[(a, b, face)],
            };
            row.push(c);
        }
        grid.push(row);
    }
    ((grid), (a1 - a0, b1 - b0))
}

/// 由几何点匹配推导全部块间补丁
///
/// 以面形心栅格匹配表面对，并逐一尝试八种方位确定重映射。
/// `explicit` 中已被配对的表面（例如输入卡给出的周期对）
/// 被跳过。
pub fn pair_interblock_patches(
    blocks: &[ProcBlock],
    explicit: &[InterblockPatch],
) -> SolverResult<Vec<InterblockPatch>> {
    use std::collections::HashMap;

    let mut patches = explicit.to_vec();
    let paired: Vec<(usize, usize)> = explicit
        .iter()
        .flat_map(|p| {
            [
                (p.first.block, p.first.boundary),
                (p.second.block, p.second.boundary),
            ]
        })
        .collect();

    // 候选表面：所有未配对的块间表面。
    // 周期表面无法几何匹配（空间上分离），必须出现在显式补丁里。
    let mut candidates = Vec::new();
    for (b, block) in blocks.iter().enumerate() {
        for (s, surf) in block.boundary_conditions().surfaces().iter().enumerate() {
            match surf.kind {
                crate::boundary::BcKind::Interblock if !paired.contains(&(b, s)) => {
                    candidates.push((b, s));
                }
                crate::boundary::BcKind::Periodic if !paired.contains(&(b, s)) => {
                    return Err(SolverError::grid(format!(
                        "块 {} 表面 {} 为周期边界，但输入未给出显式补丁对",
                        b, s
                    )));
                }
                _ => {}
            }
        }
    }

    // 以表面形心集合的质心 + 尺寸做粗配对键
    let mut by_signature: HashMap<(i64, i64, i64, usize), Vec<usize>> = HashMap::new();
    let mut centroid_grids = Vec::new();
    for (ci, (b, s)) in candidates.iter().enumerate() {
        let (grid, dims) = surface_centroids(&blocks[*b], *s);
        let count = dims.0 * dims.1;
        let mean = grid
            .iter()
            .flatten()
            .fold(glam::DVec3::ZERO, |acc, c| acc + *c)
            / count as f64;
        let scale = grid
            .iter()
            .flatten()
            .map(|c| (*c - mean).length())
            .fold(0.0f64, f64::max)
            .max(1.0e-6);
        let key = quantize(mean, scale);
        by_signature.entry((key.0, key.1, key.2, count)).or_default().push(ci);
        centroid_grids.push((grid, dims, scale));
    }

    let mut used = vec![false; candidates.len()];
    for group in by_signature.values() {
        if group.len() > 2 {
            let (b, s) = candidates[group[0]];
            return Err(SolverError::grid(format!(
                "块 {} 表面 {} 的块间配对不唯一（候选 {} 个）",
                b,
                s,
                group.len()
            )));
        }
        if group.len() != 2 {
            // 单个候选：落入末尾的未配对检查
            continue;
        }
        let (ci, cj) = (group[0], group[1]);
        if used[ci] || used[cj] {
            continue;
        }
        used[ci] = true;
        used[cj] = true;

        let orientation = match_orientation(&centroid_grids[ci], &centroid_grids[cj])?;
        let (b1, s1) = candidates[ci];
        let (b2, s2) = candidates[cj];
        patches.push(InterblockPatch::new(
            PatchSide {
                block: b1,
                boundary: s1,
            },
            PatchSide {
                block: b2,
                boundary: s2,
            },
            orientation,
        ));
    }

    if let Some(pos) = used.iter().position(|u| !u) {
        let (b, s) = candidates[pos];
        return Err(SolverError::grid(format!(
            "块 {} 表面 {} 找不到点匹配的伙伴表面",
            b, s
        )));
    }

    Ok(patches)
}

type CentroidGrid = (Vec<Vec<glam::DVec3>>, (usize, usize), f64);

/// 由两侧形心栅格匹配方位：逐一尝试 8 种方位，要求全部形心重合
fn match_orientation(first: &CentroidGrid, second: &CentroidGrid) -> SolverResult<Orientation> {
    let (g1, d1, scale) = first;
    let (g2, d2, _) = second;

    'orient: for idx in 1..=8 {
        let o = Orientation::from_index(idx).expect("合法索引");
        if o.dest_dims(*d1) != *d2 {
            continue;
        }
        for b in 0..d1.1 {
            for a in 0..d1.0 {
                let (x, y) = o.apply((a, b), *d1);
                let p = g1[b][a];
                let q = g2[y][x];
                if quantize(p, *scale) != quantize(q, *scale) {
                    continue 'orient;
                }
            }
        }
        return Ok(o);
    }
    Err(SolverError::grid("块间表面点不匹配：无可行方位"))
}

// ============================================================
// 测试
// ============================================================
