// crates/ae_physics/src/boundary/types.rs

//! 边界面记录与块边界条件列表
//!
//! 每个块携带一份有序的边界面列表。面记录
//! `(bcType, iMin, iMax, jMin, jMax, kMin, kMax, tag)` 中恰有一个
//! 方向退化（min == max），该方向钉住面所在的块面：
//! 退化值为 0 是下表面，为该方向面数上限是上表面。
//! 非退化方向是半开单元区间 [min, max)。
//!
//! 面内二维坐标 (d1, d2) 约定（块间补丁配对用）：
//! i 面 → (j, k)，j 面 → (k, i)，k 面 → (i, j)。

use crate::error::{SolverError, SolverResult};

/// 边界类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BcKind {
    /// 滑移壁
    SlipWall,
    /// 黏性壁（等温/绝热由配置区分）
    ViscousWall,
    /// 亚声速入流（特征）
    SubsonicInflow,
    /// 亚声速出流（特征）
    SubsonicOutflow,
    /// 超声速入流
    SupersonicInflow,
    /// 超声速出流
    SupersonicOutflow,
    /// 远场（全特征分解）
    Farfield,
    /// 周期（带隐式平移/旋转描述的块间连接）
    Periodic,
    /// 块间点匹配连接
    Interblock,
}

impl BcKind {
    /// 由描述文件中的名称解析
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "slipWall" => Some(Self::SlipWall),
            "viscousWall" => Some(Self::ViscousWall),
            "subsonicInflow" => Some(Self::SubsonicInflow),
            "subsonicOutflow" => Some(Self::SubsonicOutflow),
            "supersonicInflow" => Some(Self::SupersonicInflow),
            "supersonicOutflow" => Some(Self::SupersonicOutflow),
            "farfield" => Some(Self::Farfield),
            "periodic" => Some(Self::Periodic),
            "interblock" => Some(Self::Interblock),
            _ => None,
        }
    }

    /// 规范名称
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SlipWall => "slipWall",
            Self::ViscousWall => "viscousWall",
            Self::SubsonicInflow => "subsonicInflow",
            Self::SubsonicOutflow => "subsonicOutflow",
            Self::SupersonicInflow => "supersonicInflow",
            Self::SupersonicOutflow => "supersonicOutflow",
            Self::Farfield => "farfield",
            Self::Periodic => "periodic",
            Self::Interblock => "interblock",
        }
    }

    /// 是否为块间连接类（幽灵由远端内部状态提供）
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Periodic | Self::Interblock)
    }

    /// 是否为黏性壁
    #[must_use]
    pub fn is_viscous_wall(&self) -> bool {
        matches!(self, Self::ViscousWall)
    }
}

/// 边界面记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundarySurface {
    /// 边界类型
    pub kind: BcKind,
    /// i 范围下界
    pub i_min: usize,
    /// i 范围上界
    pub i_max: usize,
    /// j 范围下界
    pub j_min: usize,
    /// j 范围上界
    pub j_max: usize,
    /// k 范围下界
    pub k_min: usize,
    /// k 范围上界
    pub k_max: usize,
    /// 标签（块间连接时为伙伴块号，周期为配对标签）
    pub tag: usize,
    /// 壁面律迟滞状态（黏性壁 + 壁面律处理时使用）
    pub wall_law_active: bool,
}

impl BoundarySurface {
    /// 创建边界面并校验退化方向唯一
    pub fn new(
        kind: BcKind,
        ranges: [usize; 6],
        tag: usize,
    ) -> SolverResult<Self> {
        let [i_min, i_max, j_min, j_max, k_min, k_max] = ranges;
        let degenerate = [i_min == i_max, j_min == j_max, k_min == k_max];
        if degenerate.iter().filter(|d| **d).count() != 1 {
            return Err(SolverError::grid(format!(
                "边界面 {:?} 范围 {:?} 须恰有一个退化方向",
                kind, ranges
            )));
        }
        Ok(Self {
            kind,
            i_min,
            i_max,
            j_min,
            j_max,
            k_min,
            k_max,
            tag,
            wall_law_active: false,
        })
    }

    /// 法向方向 (0=i, 1=j, 2=k)
    #[must_use]
    pub fn direction(&self) -> usize {
        if self.i_min == self.i_max {
            0
        } else if self.j_min == self.j_max {
            1
        } else {
            2
        }
    }

    /// 是否位于下表面（退化面索引为 0）
    #[must_use]
    pub fn is_lower(&self) -> bool {
        match self.direction() {
            0 => self.i_min == 0,
            1 => self.j_min == 0,
            _ => self.k_min == 0,
        }
    }

    /// 钉住的面索引
    #[must_use]
    pub fn face_index(&self) -> usize {
        match self.direction() {
            0 => self.i_min,
            1 => self.j_min,
            _ => self.k_min,
        }
    }

    /// 面内第一方向 (d1) 的单元区间
    #[must_use]
    pub fn d1_range(&self) -> (usize, usize) {
        match self.direction() {
            0 => (self.j_min, self.j_max),
            1 => (self.k_min, self.k_max),
            _ => (self.i_min, self.i_max),
        }
    }

    /// 面内第二方向 (d2) 的单元区间
    #[must_use]
    pub fn d2_range(&self) -> (usize, usize) {
        match self.direction() {
            0 => (self.k_min, self.k_max),
            1 => (self.i_min, self.i_max),
            _ => (self.j_min, self.j_max),
        }
    }

    /// 沿指定轴的区间
    #[must_use]
    pub fn range(&self, axis: usize) -> (usize, usize) {
        match axis {
            0 => (self.i_min, self.i_max),
            1 => (self.j_min, self.j_max),
            _ => (self.k_min, self.k_max),
        }
    }

    fn set_range(&mut self, axis: usize, lo: usize, hi: usize) {
        match axis {
            0 => {
                self.i_min = lo;
                self.i_max = hi;
            }
            1 => {
                self.j_min = lo;
                self.j_max = hi;
            }
            _ => {
                self.k_min = lo;
                self.k_max = hi;
            }
        }
    }
}

/// 块边界条件列表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockBoundaryConditions {
    surfaces: Vec<BoundarySurface>,
}

impl BlockBoundaryConditions {
    /// 由边界面列表创建
    #[must_use]
    pub fn new(surfaces: Vec<BoundarySurface>) -> Self {
        Self { surfaces }
    }

    /// 边界面列表
    #[must_use]
    pub fn surfaces(&self) -> &[BoundarySurface] {
        &self.surfaces
    }

    /// 可变边界面列表（壁面律迟滞状态更新用）
    #[must_use]
    pub fn surfaces_mut(&mut self) -> &mut [BoundarySurface] {
        &mut self.surfaces
    }

    /// 指定方向的边界面数
    #[must_use]
    pub fn num_surfaces(&self, dir: usize) -> usize {
        self.surfaces.iter().filter(|s| s.direction() == dir).count()
    }

    /// 是否覆盖整个块表面
    ///
    /// 校验六个块面上每个面单元恰被一个边界面覆盖。
    pub fn check_coverage(&self, ni: usize, nj: usize, nk: usize) -> SolverResult<()> {
        let face_dims = [(nj, nk, ni, 0usize), (nk, ni, nj, 1), (ni, nj, nk, 2)];
        for (n1, n2, n_axis, dir) in face_dims {
            for face_idx in [0, n_axis] {
                let mut covered = vec![0u8; n1 * n2];
                for s in self.surfaces.iter().filter(|s| s.direction() == dir) {
                    if s.face_index() != face_idx {
                        continue;
                    }
                    let (a0, a1) = s.d1_range();
                    let (b0, b1) = s.d2_range();
                    for b in b0..b1 {
                        for a in a0..a1 {
                            covered[b * n1 + a] += 1;
                        }
                    }
                }
                if covered.iter().any(|c| *c != 1) {
                    return Err(SolverError::grid(format!(
                        "方向 {} 面 {} 的边界覆盖不完整或重叠",
                        dir, face_idx
                    )));
                }
            }
        }
        Ok(())
    }

    /// 沿轴在单元索引 `index` 处拆分
    ///
    /// 返回 (下子块边界, 上子块边界)；两侧新增的块间接缝面分别
    /// 写入 `lower_seam_tag` / `upper_seam_tag`（伙伴块号）。
    /// `n_axis` 为本块沿该轴的单元数。
    #[must_use]
    pub fn split(
        &self,
        axis: usize,
        index: usize,
        n_axis: usize,
        lower_seam_tag: usize,
        upper_seam_tag: usize,
    ) -> (Self, Self) {
        let mut lower = Vec::new();
        let mut upper = Vec::new();

        for s in &self.surfaces {
            if s.direction() == axis {
                // 法向面：下表面归下子块，上表面归上子块并重映射
                if s.face_index() == 0 {
                    lower.push(s.clone());
                } else {
                    // 上子块的局部面索引 = n_axis - index
                    let mut remapped = s.clone();
                    remapped.set_range(axis, n_axis - index, n_axis - index);
                    upper.push(remapped);
                }
            } else {
                let (lo, hi) = s.range(axis);
                if hi <= index {
                    lower.push(s.clone());
                } else if lo >= index {
                    let mut moved = s.clone();
                    moved.set_range(axis, lo - index, hi - index);
                    upper.push(moved);
                } else {
                    // 跨越拆分位置：切成两段
                    let mut l = s.clone();
                    l.set_range(axis, lo, index);
                    lower.push(l);
                    let mut u = s.clone();
                    u.set_range(axis, 0, hi - index);
                    upper.push(u);
                }
            }
        }

        // 接缝：下子块的上表面 ↔ 上子块的下表面
        let mut seam_lower = BoundarySurface {
            kind: BcKind::Interblock,
            i_min: 0,
            i_max: 0,
            j_min: 0,
            j_max: 0,
            k_min: 0,
            k_max: 0,
            tag: lower_seam_tag,
            wall_law_active: false,
        };
        let mut seam_upper = seam_lower.clone();
        seam_upper.tag = upper_seam_tag;

        // 切向范围取整个截面。BC 列表覆盖全部块面，
        // 各方向范围上界的最大值即该方向的单元数。
        let tangential: Vec<(usize, usize)> = (0..3)
            .filter(|d| *d != axis)
            .map(|d| {
                let hi = self
                    .surfaces
                    .iter()
                    .map(|s| s.range(d).1)
                    .max()
                    .unwrap_or(0);
                (d, hi)
            })
            .map(|(_, hi)| (0, hi))
            .collect();

        let dims = |surf: &mut BoundarySurface, face: usize| {
            let mut t = tangential.iter();
            for d in 0..3 {
                if d == axis {
                    surf.set_range(d, face, face);
                } else {
                    let (lo, hi) = *t.next().expect("两个切向范围");
                    surf.set_range(d, lo, hi);
                }
            }
        };
        dims(&mut seam_lower, index);
        dims(&mut seam_upper, 0);

        lower.push(seam_lower);
        upper.push(seam_upper);

        (Self::new(lower), Self::new(upper))
    }

    /// 沿轴与上子块合并（拆分的逆操作）
    ///
    /// `lower_n_axis` 为下子块沿该轴的单元数，`self_id`/`other_id`
    /// 用于剔除两侧的接缝面。合并保留边界条件出处：
    /// 上子块的面经重映射后并入，相邻同类面合并回原始记录。
    #[must_use]
    pub fn join(
        &self,
        other: &Self,
        axis: usize,
        lower_n_axis: usize,
        other_n_axis: usize,
        self_id: usize,
        other_id: usize,
    ) -> Self {
        let mut merged: Vec<BoundarySurface> = Vec::new();

        for s in &self.surfaces {
            // 剔除指向上子块的接缝
            if s.kind == BcKind::Interblock
                && s.direction() == axis
                && s.face_index() == lower_n_axis
                && s.tag == other_id
            {
                continue;
            }
            merged.push(s.clone());
        }

        for s in &other.surfaces {
            if s.kind == BcKind::Interblock
                && s.direction() == axis
                && s.face_index() == 0
                && s.tag == self_id
            {
                continue;
            }
            let mut moved = s.clone();
            if s.direction() == axis {
                if s.face_index() == other_n_axis {
                    moved.set_range(axis, lower_n_axis + other_n_axis, lower_n_axis + other_n_axis);
                }
                // face_index == 0 的非接缝法向面不应存在（接缝已剔除）
            } else {
                let (lo, hi) = s.range(axis);
                moved.set_range(axis, lo + lower_n_axis, hi + lower_n_axis);
            }
            merged.push(moved);
        }

        // 合并沿轴相邻、其余字段一致的同类面
        let mut out: Vec<BoundarySurface> = Vec::new();
        for s in merged {
            if let Some(prev) = out.iter_mut().find(|p| {
                p.kind == s.kind
                    && p.tag == s.tag
                    && p.direction() == s.direction()
                    && p.direction() != axis
                    && p.face_index() == s.face_index()
                    && {
                        // 除轴向外其余范围一致，轴向首尾相接
                        let other_t: Vec<usize> =
                            (0..3).filter(|d| *d != axis && *d != s.direction()).collect();
                        other_t.iter().all(|d| p.range(*d) == s.range(*d))
                            && p.range(axis).1 == s.range(axis).0
                    }
            }) {
                let (lo, _) = prev.range(axis);
                let (_, hi) = s.range(axis);
                prev.set_range(axis, lo, hi);
            } else {
                out.push(s);
            }
        }

        Self::new(out)
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn box_bcs(ni: usize, nj: usize, nk: usize, kind: BcKind) -> BlockBoundaryConditions {
        BlockBoundaryConditions::new(vec![
            BoundarySurface::new(kind, [0, 0, 0, nj, 0, nk], 1).unwrap(),
            BoundarySurface::new(kind, [ni, ni, 0, nj, 0, nk], 2).unwrap(),
            BoundarySurface::new(kind, [0, ni, 0, 0, 0, nk], 3).unwrap(),
            BoundarySurface::new(kind, [0, ni, nj, nj, 0, nk], 4).unwrap(),
            BoundarySurface::new(kind, [0, ni, 0, nj, 0, 0], 5).unwrap(),
            BoundarySurface::new(kind, [0, ni, 0, nj, nk, nk], 6).unwrap(),
        ])
    }

    #[test]
    fn test_surface_direction_pinning() {
        let s = BoundarySurface::new(BcKind::SlipWall, [4, 4, 0, 8, 0, 6], 0).unwrap();
        assert_eq!(s.direction(), 0);
        assert!(!s.is_lower());
        assert_eq!(s.face_index(), 4);
        assert_eq!(s.d1_range(), (0, 8));
        assert_eq!(s.d2_range(), (0, 6));
    }

    #[test]
    fn test_surface_requires_one_degenerate_pair() {
        // 零个退化方向
        assert!(BoundarySurface::new(BcKind::SlipWall, [0, 4, 0, 8, 0, 6], 0).is_err());
        // 两个退化方向
        assert!(BoundarySurface::new(BcKind::SlipWall, [0, 0, 3, 3, 0, 6], 0).is_err());
    }

    #[test]
    fn test_coverage_complete() {
        let bcs = box_bcs(4, 3, 2, BcKind::Farfield);
        assert!(bcs.check_coverage(4, 3, 2).is_ok());
    }

    #[test]
    fn test_coverage_gap_detected() {
        let mut surfaces = box_bcs(4, 3, 2, BcKind::Farfield).surfaces().to_vec();
        // 缩小一个面留出缺口
        surfaces[2].i_max = 3;
        let bcs = BlockBoundaryConditions::new(surfaces);
        assert!(bcs.check_coverage(4, 3, 2).is_err());
    }

    #[test]
    fn test_split_then_join_roundtrip() {
        // 性质 4 的 BC 部分：拆分后合并恢复原始覆盖
        let bcs = box_bcs(8, 4, 4, BcKind::Farfield);
        let (lower, upper) = bcs.split(0, 5, 8, 1, 0);

        assert!(lower.check_coverage(5, 4, 4).is_ok());
        assert!(upper.check_coverage(3, 4, 4).is_ok());

        let rejoined = lower.join(&upper, 0, 5, 3, 0, 1);
        assert!(rejoined.check_coverage(8, 4, 4).is_ok());
        // 不残留接缝
        assert!(rejoined
            .surfaces()
            .iter()
            .all(|s| s.kind != BcKind::Interblock));
        // 面数恢复
        assert_eq!(rejoined.surfaces().len(), 6);
    }

    #[test]
    fn test_split_normal_surfaces_assigned() {
        let bcs = box_bcs(8, 4, 4, BcKind::SlipWall);
        let (lower, upper) = bcs.split(0, 5, 8, 1, 0);
        // 下子块保留 i=0 面，上子块的 i=8 面重映射为 i=3
        assert!(lower
            .surfaces()
            .iter()
            .any(|s| s.direction() == 0 && s.face_index() == 0 && s.kind == BcKind::SlipWall));
        assert!(upper
            .surfaces()
            .iter()
            .any(|s| s.direction() == 0 && s.face_index() == 3 && s.kind == BcKind::SlipWall));
        // 两侧各有一个接缝面
        assert_eq!(
            lower
                .surfaces()
                .iter()
                .filter(|s| s.kind == BcKind::Interblock)
                .count(),
            1
        );
        assert_eq!(
            upper
                .surfaces()
                .iter()
                .filter(|s| s.kind == BcKind::Interblock)
                .count(),
            1
        );
    }

    #[test]
    fn test_split_tangential_range_cut() {
        // j 面表面沿 i 轴拆分成两段
        let bcs = box_bcs(8, 4, 4, BcKind::ViscousWall);
        let (lower, upper) = bcs.split(0, 3, 8, 1, 0);
        let wall_lower: Vec<_> = lower
            .surfaces()
            .iter()
            .filter(|s| s.direction() == 1 && s.face_index() == 0)
            .collect();
        assert_eq!(wall_lower[0].range(0), (0, 3));
        let wall_upper: Vec<_> = upper
            .surfaces()
            .iter()
            .filter(|s| s.direction() == 1 && s.face_index() == 0)
            .collect();
        assert_eq!(wall_upper[0].range(0), (0, 5));
    }

    #[test]
    fn test_bckind_parse_roundtrip() {
        for kind in [
            BcKind::SlipWall,
            BcKind::ViscousWall,
            BcKind::SubsonicInflow,
            BcKind::SubsonicOutflow,
            BcKind::SupersonicInflow,
            BcKind::SupersonicOutflow,
            BcKind::Farfield,
            BcKind::Periodic,
            BcKind::Interblock,
        ] {
            assert_eq!(BcKind::parse(kind.name()), Some(kind));
        }
        assert_eq!(BcKind::parse("unknown"), None);
    }
}
