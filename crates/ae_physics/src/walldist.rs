// crates/ae_physics/src/walldist.rs

//! 壁面距离预计算
//!
//! 每个网格初始化时计算一次：收集全部块上黏性壁面的面形心，
//! 建 R-tree 空间索引，对每个内部单元中心做最近邻查询。
//! 无黏性壁时保持哨兵值 [`FAR_WALL_DIST`]。

use crate::block::{ProcBlock, FAR_WALL_DIST};
use rstar::RTree;

/// 收集一个块上黏性壁面的面形心
fn collect_wall_centroids(block: &ProcBlock, out: &mut Vec<[f64; 3]>) {
    let geom = block.geometry();
    for surf in block.boundary_conditions().surfaces() {
        if !surf.kind.is_viscous_wall() {
            continue;
        }
        let dir = surf.direction();
        let face = surf.face_index();
        let (a0, a1) = surf.d1_range();
        let (b0, b1) = surf.d2_range();
        for b in b0..b1 {
            for a in a0..a1 {
                let c = match dir {
                    0 => geom.fc_i[(face, a, b)],
                    1 => geom.fc_j[(b, face, a)],
                    _ => geom.fc_k[(a, b, face)],
                };
                out.push([c.x, c.y, c.z]);
            }
        }
    }
}

/// 计算全部块的壁面距离
///
/// 跨块全局查询：单元到任意块黏性壁的最近距离。
pub fn compute_wall_distances(blocks: &mut [ProcBlock]) {
    let mut centroids = Vec::new();
    for block in blocks.iter() {
        collect_wall_centroids(block, &mut centroids);
    }
    if centroids.is_empty() {
        // 无黏性壁：哨兵值已在块构造时填好
        return;
    }

    let tree = RTree::bulk_load(centroids);

    for block in blocks.iter_mut() {
        let (ni, nj, nk) = block.num_cells();
        let g = block.ghosts();
        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    let c = block.geometry().center[(i + g, j + g, k + g)];
                    let p = [c.x, c.y, c.z];
                    let d = tree
                        .nearest_neighbor(&p)
                        .map(|q| {
                            let dx = q[0] - p[0];
                            let dy = q[1] - p[1];
                            let dz = q[2] - p[2];
                            (dx * dx + dy * dy + dz * dz).sqrt()
                        })
                        .unwrap_or(FAR_WALL_DIST);
                    block.set_wall_dist(i, j, k, d);
                }
            }
        }
        block.mirror_wall_dist_ghosts();
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BcKind, BlockBoundaryConditions, BoundarySurface};
    use crate::geometry::GridBlock;
    use glam::DVec3;

    fn wall_bottom_block(ni: usize, nj: usize, nk: usize) -> ProcBlock {
        // j=0 为黏性壁，其余远场
        let bcs = BlockBoundaryConditions::new(vec![
            BoundarySurface::new(BcKind::Farfield, [0, 0, 0, nj, 0, nk], 1).unwrap(),
            BoundarySurface::new(BcKind::Farfield, [ni, ni, 0, nj, 0, nk], 2).unwrap(),
            BoundarySurface::new(BcKind::ViscousWall, [0, ni, 0, 0, 0, nk], 3).unwrap(),
            BoundarySurface::new(BcKind::Farfield, [0, ni, nj, nj, 0, nk], 4).unwrap(),
            BoundarySurface::new(BcKind::Farfield, [0, ni, 0, nj, 0, 0], 5).unwrap(),
            BoundarySurface::new(BcKind::Farfield, [0, ni, 0, nj, nk, nk], 6).unwrap(),
        ]);
        let grid = GridBlock::uniform(ni, nj, nk, DVec3::new(ni as f64, nj as f64, nk as f64));
        ProcBlock::new(&grid, bcs, 0).unwrap()
    }

    #[test]
    fn test_wall_distance_bottom_wall() {
        let mut blocks = vec![wall_bottom_block(4, 4, 2)];
        compute_wall_distances(&mut blocks);

        // 壁邻单元中心距壁 0.5，逐层递增
        // （单元中心到最近面形心的距离在均匀网格上沿法向精确）
        assert!((blocks[0].wall_dist_at(1, 0, 0) - 0.5).abs() < 1e-12);
        assert!((blocks[0].wall_dist_at(1, 1, 0) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_no_wall_keeps_sentinel() {
        let grid = GridBlock::uniform(2, 2, 2, DVec3::splat(2.0));
        let bcs = {
            let n = 2;
            BlockBoundaryConditions::new(vec![
                BoundarySurface::new(BcKind::Farfield, [0, 0, 0, n, 0, n], 1).unwrap(),
                BoundarySurface::new(BcKind::Farfield, [n, n, 0, n, 0, n], 2).unwrap(),
                BoundarySurface::new(BcKind::Farfield, [0, n, 0, 0, 0, n], 3).unwrap(),
                BoundarySurface::new(BcKind::Farfield, [0, n, n, n, 0, n], 4).unwrap(),
                BoundarySurface::new(BcKind::Farfield, [0, n, 0, n, 0, 0], 5).unwrap(),
                BoundarySurface::new(BcKind::Farfield, [0, n, 0, n, n, n], 6).unwrap(),
            ])
        };
        let mut blocks = vec![ProcBlock::new(&grid, bcs, 0).unwrap()];
        compute_wall_distances(&mut blocks);
        assert_eq!(blocks[0].wall_dist_at(0, 0, 0), FAR_WALL_DIST);
    }

    #[test]
    fn test_cross_block_wall_distance() {
        // 第二个块自身无壁，但应量到第一个块的壁（全局查询）
        let with_wall = wall_bottom_block(4, 4, 2);

        // 平移块：y ∈ [4, 8]，全远场
        let base = GridBlock::uniform(4, 4, 2, DVec3::new(4.0, 4.0, 2.0));
        let mut nodes = base.nodes.clone();
        for k in 0..nodes.nkt() {
            for j in 0..nodes.njt() {
                for i in 0..nodes.nit() {
                    nodes[(i, j, k)].y += 4.0;
                }
            }
        }
        let shifted = GridBlock::new(5, 5, 3, nodes).unwrap();
        let mut surfaces = with_wall.boundary_conditions().surfaces().to_vec();
        for s in &mut surfaces {
            s.kind = BcKind::Farfield;
        }
        let upper = ProcBlock::new(&shifted, BlockBoundaryConditions::new(surfaces), 1).unwrap();

        let mut blocks = vec![with_wall, upper];
        compute_wall_distances(&mut blocks);

        // 平移块最底层单元中心 y = 4.5；壁面形心在 y=0 平面 → 距离
        // 为到最近形心的欧氏距离（同 (x,z) 列上正对）= 4.5
        assert!((blocks[1].wall_dist_at(1, 0, 0) - 4.5).abs() < 1e-12);
    }
}
