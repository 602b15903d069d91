// crates/ae_physics/src/geometry.rs

//! 块几何：由节点坐标生成单元中心几何
//!
//! 外部协作者（PLOT3D 读入）提供节点坐标，本模块生成内核需要的
//! 单元中心几何量：
//!
//! - 单元中心与体积（散度定理六面体体积）
//! - 三个方向的交错面数组：面积加权外法向 Â·A 与面形心
//!
//! 面法向约定（不变量 3）：i 方向面法向指向 +i，
//! 即 A_face · (x_右单元 − x_左单元) ≥ 0；j/k 同理。
//!
//! 非平面四边形的向量面积采用对角线叉积公式 A = ½ d₁×d₂，
//! 闭合单元的有符号面积和因此精确为零（离散 Green 恒等式）。

use crate::array3d::Array3D;
use crate::error::{SolverError, SolverResult};
use ae_foundation::EPS_GEOMETRY;
use glam::DVec3;

/// 节点坐标块（几何生成的输入）
#[derive(Debug, Clone)]
pub struct GridBlock {
    /// i 方向节点数
    pub ni_node: usize,
    /// j 方向节点数
    pub nj_node: usize,
    /// k 方向节点数
    pub nk_node: usize,
    /// 节点坐标，索引 (i, j, k)，无幽灵层
    pub nodes: Array3D<DVec3>,
}

impl GridBlock {
    /// 由节点坐标向量构建
    pub fn new(
        ni_node: usize,
        nj_node: usize,
        nk_node: usize,
        nodes: Array3D<DVec3>,
    ) -> SolverResult<Self> {
        if ni_node < 2 || nj_node < 2 || nk_node < 2 {
            return Err(SolverError::grid(format!(
                "块节点数 ({}, {}, {}) 不足以构成单元",
                ni_node, nj_node, nk_node
            )));
        }
        if nodes.ni() != ni_node || nodes.nj() != nj_node || nodes.nk() != nk_node {
            return Err(SolverError::grid("节点数组尺寸与声明的块尺寸不一致"));
        }
        Ok(Self {
            ni_node,
            nj_node,
            nk_node,
            nodes,
        })
    }

    /// 均匀长方体块（测试与算例初始化用）
    #[must_use]
    pub fn uniform(ni: usize, nj: usize, nk: usize, extent: DVec3) -> Self {
        let mut nodes = Array3D::<DVec3>::new(ni + 1, nj + 1, nk + 1, 0);
        let d = DVec3::new(
            extent.x / ni as f64,
            extent.y / nj as f64,
            extent.z / nk as f64,
        );
        for k in 0..=nk {
            for j in 0..=nj {
                for i in 0..=ni {
                    nodes[(i, j, k)] = DVec3::new(i as f64 * d.x, j as f64 * d.y, k as f64 * d.z);
                }
            }
        }
        Self {
            ni_node: ni + 1,
            nj_node: nj + 1,
            nk_node: nk + 1,
            nodes,
        }
    }

    /// 单元数
    #[inline]
    #[must_use]
    pub fn num_cells(&self) -> (usize, usize, usize) {
        (self.ni_node - 1, self.nj_node - 1, self.nk_node - 1)
    }
}

/// 单元中心块几何
#[derive(Debug, Clone)]
pub struct BlockGeometry {
    ni: usize,
    nj: usize,
    nk: usize,
    ghosts: usize,
    /// 单元中心（含幽灵层，幽灵几何按边界面镜像外推）
    pub center: Array3D<DVec3>,
    /// 单元体积（含幽灵层）
    pub volume: Array3D<f64>,
    /// i 方向面积向量，尺寸 (ni+1, nj, nk)，指向 +i
    pub fa_i: Array3D<DVec3>,
    /// j 方向面积向量，尺寸 (ni, nj+1, nk)，指向 +j
    pub fa_j: Array3D<DVec3>,
    /// k 方向面积向量，尺寸 (ni, nj, nk+1)，指向 +k
    pub fa_k: Array3D<DVec3>,
    /// i 方向面形心
    pub fc_i: Array3D<DVec3>,
    /// j 方向面形心
    pub fc_j: Array3D<DVec3>,
    /// k 方向面形心
    pub fc_k: Array3D<DVec3>,
}

/// 四边形向量面积 A = ½ d₁ × d₂（对角线叉积）
#[inline]
fn quad_area(n00: DVec3, n10: DVec3, n11: DVec3, n01: DVec3) -> DVec3 {
    0.5 * (n11 - n00).cross(n01 - n10)
}

/// 四边形形心（顶点平均）
#[inline]
fn quad_centroid(n00: DVec3, n10: DVec3, n11: DVec3, n01: DVec3) -> DVec3 {
    0.25 * (n00 + n10 + n11 + n01)
}

impl BlockGeometry {
    /// 由节点块生成几何
    ///
    /// 负体积或退化面返回 [`SolverError::Grid`]。
    pub fn from_grid(grid: &GridBlock, ghosts: usize) -> SolverResult<Self> {
        let (ni, nj, nk) = grid.num_cells();
        let g = ghosts;
        let nd = &grid.nodes;

        let mut fa_i = Array3D::<DVec3>::new(ni + 1, nj, nk, 0);
        let mut fa_j = Array3D::<DVec3>::new(ni, nj + 1, nk, 0);
        let mut fa_k = Array3D::<DVec3>::new(ni, nj, nk + 1, 0);
        let mut fc_i = Array3D::<DVec3>::new(ni + 1, nj, nk, 0);
        let mut fc_j = Array3D::<DVec3>::new(ni, nj + 1, nk, 0);
        let mut fc_k = Array3D::<DVec3>::new(ni, nj, nk + 1, 0);

        // i 方向面：四边形在 (j, k) 平面展开，法向 +i
        for k in 0..nk {
            for j in 0..nj {
                for fi in 0..=ni {
                    let (n00, n10, n11, n01) = (
                        nd[(fi, j, k)],
                        nd[(fi, j + 1, k)],
                        nd[(fi, j + 1, k + 1)],
                        nd[(fi, j, k + 1)],
                    );
                    fa_i[(fi, j, k)] = quad_area(n00, n10, n11, n01);
                    fc_i[(fi, j, k)] = quad_centroid(n00, n10, n11, n01);
                }
            }
        }
        // j 方向面：四边形在 (k, i) 平面展开，法向 +j
        for k in 0..nk {
            for fj in 0..=nj {
                for i in 0..ni {
                    let (n00, n10, n11, n01) = (
                        nd[(i, fj, k)],
                        nd[(i, fj, k + 1)],
                        nd[(i + 1, fj, k + 1)],
                        nd[(i + 1, fj, k)],
                    );
                    fa_j[(i, fj, k)] = quad_area(n00, n10, n11, n01);
                    fc_j[(i, fj, k)] = quad_centroid(n00, n10, n11, n01);
                }
            }
        }
        // k 方向面：四边形在 (i, j) 平面展开，法向 +k
        for fk in 0..=nk {
            for j in 0..nj {
                for i in 0..ni {
                    let (n00, n10, n11, n01) = (
                        nd[(i, j, fk)],
                        nd[(i + 1, j, fk)],
                        nd[(i + 1, j + 1, fk)],
                        nd[(i, j + 1, fk)],
                    );
                    fa_k[(i, j, fk)] = quad_area(n00, n10, n11, n01);
                    fc_k[(i, j, fk)] = quad_centroid(n00, n10, n11, n01);
                }
            }
        }

        let mut center = Array3D::<DVec3>::new(ni, nj, nk, g);
        let mut volume = Array3D::<f64>::new(ni, nj, nk, g);

        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    // 中心：八节点平均
                    let mut c = DVec3::ZERO;
                    for dk in 0..2 {
                        for dj in 0..2 {
                            for di in 0..2 {
                                c += nd[(i + di, j + dj, k + dk)];
                            }
                        }
                    }
                    c *= 0.125;

                    // 体积：V = (1/3) Σ_f x_f · A_f,外
                    let v = (fc_i[(i + 1, j, k)].dot(fa_i[(i + 1, j, k)])
                        - fc_i[(i, j, k)].dot(fa_i[(i, j, k)])
                        + fc_j[(i, j + 1, k)].dot(fa_j[(i, j + 1, k)])
                        - fc_j[(i, j, k)].dot(fa_j[(i, j, k)])
                        + fc_k[(i, j, k + 1)].dot(fa_k[(i, j, k + 1)])
                        - fc_k[(i, j, k)].dot(fa_k[(i, j, k)]))
                        / 3.0;

                    if v <= EPS_GEOMETRY {
                        return Err(SolverError::grid(format!(
                            "单元 ({}, {}, {}) 体积非正: {:.3e}",
                            i, j, k, v
                        )));
                    }

                    center[(i + g, j + g, k + g)] = c;
                    volume[(i + g, j + g, k + g)] = v;
                }
            }
        }

        let mut geom = Self {
            ni,
            nj,
            nk,
            ghosts: g,
            center,
            volume,
            fa_i,
            fa_j,
            fa_k,
            fc_i,
            fc_j,
            fc_k,
        };
        geom.check_orientation()?;
        geom.fill_ghost_geometry();
        Ok(geom)
    }

    /// 校验面法向朝向（不变量 3）
    fn check_orientation(&self) -> SolverResult<()> {
        let g = self.ghosts;
        for k in 0..self.nk {
            for j in 0..self.nj {
                for fi in 1..self.ni {
                    let a = self.fa_i[(fi, j, k)];
                    if a.length() < EPS_GEOMETRY {
                        return Err(SolverError::grid(format!(
                            "退化 i 面 ({}, {}, {})",
                            fi, j, k
                        )));
                    }
                    let dl = self.center[(fi + g, j + g, k + g)]
                        - self.center[(fi - 1 + g, j + g, k + g)];
                    if a.dot(dl) < 0.0 {
                        return Err(SolverError::grid(format!(
                            "i 面 ({}, {}, {}) 法向与网格走向相反（左手网格？）",
                            fi, j, k
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// 幽灵层几何：按边界面镜像外推中心，体积复制
    fn fill_ghost_geometry(&mut self) {
        let g = self.ghosts;
        let (ni, nj, nk) = (self.ni, self.nj, self.nk);

        for k in 0..nk {
            for j in 0..nj {
                for l in 0..g {
                    // i-min / i-max
                    let fc_lo = self.fc_i[(0, j, k)];
                    let fc_hi = self.fc_i[(ni, j, k)];
                    self.center[(g - 1 - l, j + g, k + g)] =
                        2.0 * fc_lo - self.center[(g + l, j + g, k + g)];
                    self.volume[(g - 1 - l, j + g, k + g)] = self.volume[(g + l, j + g, k + g)];
                    self.center[(g + ni + l, j + g, k + g)] =
                        2.0 * fc_hi - self.center[(g + ni - 1 - l, j + g, k + g)];
                    self.volume[(g + ni + l, j + g, k + g)] =
                        self.volume[(g + ni - 1 - l, j + g, k + g)];
                }
            }
        }
        for k in 0..nk {
            for i in 0..ni {
                for l in 0..g {
                    let fc_lo = self.fc_j[(i, 0, k)];
                    let fc_hi = self.fc_j[(i, nj, k)];
                    self.center[(i + g, g - 1 - l, k + g)] =
                        2.0 * fc_lo - self.center[(i + g, g + l, k + g)];
                    self.volume[(i + g, g - 1 - l, k + g)] = self.volume[(i + g, g + l, k + g)];
                    self.center[(i + g, g + nj + l, k + g)] =
                        2.0 * fc_hi - self.center[(i + g, g + nj - 1 - l, k + g)];
                    self.volume[(i + g, g + nj + l, k + g)] =
                        self.volume[(i + g, g + nj - 1 - l, k + g)];
                }
            }
        }
        for j in 0..nj {
            for i in 0..ni {
                for l in 0..g {
                    let fc_lo = self.fc_k[(i, j, 0)];
                    let fc_hi = self.fc_k[(i, j, nk)];
                    self.center[(i + g, j + g, g - 1 - l)] =
                        2.0 * fc_lo - self.center[(i + g, j + g, g + l)];
                    self.volume[(i + g, j + g, g - 1 - l)] = self.volume[(i + g, j + g, g + l)];
                    self.center[(i + g, j + g, g + nk + l)] =
                        2.0 * fc_hi - self.center[(i + g, j + g, g + nk - 1 - l)];
                    self.volume[(i + g, j + g, g + nk + l)] =
                        self.volume[(i + g, j + g, g + nk - 1 - l)];
                }
            }
        }
    }

    /// 由既有数组装配几何（块拆分/合并用）
    ///
    /// 调用方负责数组尺寸与 (ni, nj, nk, ghosts) 一致。
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub(crate) fn from_parts(
        ni: usize,
        nj: usize,
        nk: usize,
        ghosts: usize,
        center: Array3D<DVec3>,
        volume: Array3D<f64>,
        fa: [Array3D<DVec3>; 3],
        fc: [Array3D<DVec3>; 3],
    ) -> Self {
        let [fa_i, fa_j, fa_k] = fa;
        let [fc_i, fc_j, fc_k] = fc;
        Self {
            ni,
            nj,
            nk,
            ghosts,
            center,
            volume,
            fa_i,
            fa_j,
            fa_k,
            fc_i,
            fc_j,
            fc_k,
        }
    }

    /// 内部单元数
    #[inline]
    #[must_use]
    pub fn num_cells(&self) -> (usize, usize, usize) {
        (self.ni, self.nj, self.nk)
    }

    /// 幽灵层宽度
    #[inline]
    #[must_use]
    pub fn ghosts(&self) -> usize {
        self.ghosts
    }

    /// 指定方向的面积向量，(i, j, k) 为该方向面数组自身的索引
    #[inline]
    #[must_use]
    pub fn face_area(&self, dir: usize, i: usize, j: usize, k: usize) -> DVec3 {
        match dir {
            0 => self.fa_i[(i, j, k)],
            1 => self.fa_j[(i, j, k)],
            _ => self.fa_k[(i, j, k)],
        }
    }

    /// 指定方向的面形心，(i, j, k) 为该方向面数组自身的索引
    #[inline]
    #[must_use]
    pub fn face_centroid(&self, dir: usize, i: usize, j: usize, k: usize) -> DVec3 {
        match dir {
            0 => self.fc_i[(i, j, k)],
            1 => self.fc_j[(i, j, k)],
            _ => self.fc_k[(i, j, k)],
        }
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ae_foundation::approx_eq_eps;

    #[test]
    fn test_uniform_box_geometry() {
        let grid = GridBlock::uniform(4, 3, 2, DVec3::new(4.0, 3.0, 2.0));
        let geom = BlockGeometry::from_grid(&grid, 2).unwrap();

        let (ni, nj, nk) = geom.num_cells();
        assert_eq!((ni, nj, nk), (4, 3, 2));

        // 单位立方体单元
        assert!(approx_eq_eps(geom.volume[(2, 2, 2)], 1.0, 1e-14));
        // 中心位置
        let c = geom.center[(2, 2, 2)];
        assert!(approx_eq_eps(c.x, 0.5, 1e-14));
        assert!(approx_eq_eps(c.y, 0.5, 1e-14));
        assert!(approx_eq_eps(c.z, 0.5, 1e-14));
        // i 面面积向量指向 +i，大小 1
        let a = geom.fa_i[(1, 0, 0)];
        assert!(approx_eq_eps(a.x, 1.0, 1e-14));
        assert!(approx_eq_eps(a.y, 0.0, 1e-14));
    }

    /// 不变量 4：闭合单元有符号面积和为零（机器精度）
    #[test]
    fn test_closed_surface_zero_area() {
        // 扰动网格也须满足（向量面积恒等式）
        let mut grid = GridBlock::uniform(3, 3, 3, DVec3::splat(3.0));
        for k in 1..3 {
            for j in 1..3 {
                for i in 1..3 {
                    let p = grid.nodes[(i, j, k)];
                    grid.nodes[(i, j, k)] = p
                        + DVec3::new(
                            0.1 * ((i + 2 * j + k) % 3) as f64,
                            -0.08 * ((2 * i + k) % 2) as f64,
                            0.05 * ((j + k) % 2) as f64,
                        );
                }
            }
        }
        let geom = BlockGeometry::from_grid(&grid, 2).unwrap();
        for k in 0..3 {
            for j in 0..3 {
                for i in 0..3 {
                    let sum = geom.fa_i[(i + 1, j, k)] - geom.fa_i[(i, j, k)]
                        + geom.fa_j[(i, j + 1, k)]
                        - geom.fa_j[(i, j, k)]
                        + geom.fa_k[(i, j, k + 1)]
                        - geom.fa_k[(i, j, k)];
                    assert!(sum.length() < 1e-13, "单元({},{},{}) 面积和 {:?}", i, j, k, sum);
                }
            }
        }
    }

    #[test]
    fn test_ghost_center_mirror() {
        let grid = GridBlock::uniform(4, 4, 4, DVec3::splat(4.0));
        let geom = BlockGeometry::from_grid(&grid, 2).unwrap();
        // i-min 第一层幽灵中心在 x = -0.5
        let c = geom.center[(1, 2, 2)];
        assert!(approx_eq_eps(c.x, -0.5, 1e-14));
        // 第二层在 x = -1.5
        let c2 = geom.center[(0, 2, 2)];
        assert!(approx_eq_eps(c2.x, -1.5, 1e-14));
    }

    #[test]
    fn test_degenerate_block_rejected() {
        let mut nodes = Array3D::<DVec3>::new(2, 2, 2, 0);
        // 全部节点重合 → 体积为零
        nodes.fill(DVec3::ZERO);
        let grid = GridBlock::new(2, 2, 2, nodes).unwrap();
        assert!(BlockGeometry::from_grid(&grid, 2).is_err());
    }

    #[test]
    fn test_too_small_block_rejected() {
        let nodes = Array3D::<DVec3>::new(1, 2, 2, 0);
        assert!(GridBlock::new(1, 2, 2, nodes).is_err());
    }
}
