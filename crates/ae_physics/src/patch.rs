// crates/ae_physics/src/patch.rs

//! 块间点匹配补丁与方位
//!
//! 一对点匹配的共享表面以补丁配对，方位索引 1..8 编码两侧
//! 局部 (d1, d2) 坐标系之间的八种旋转/翻转组合：
//!
//! | 索引 | 交换 d1/d2 | 反转 d1 | 反转 d2 |
//! |------|-----------|---------|---------|
//! | 1    |           |         |         |
//! | 2    |           | ✓       |         |
//! | 3    |           |         | ✓       |
//! | 4    |           | ✓       | ✓       |
//! | 5    | ✓         |         |         |
//! | 6    | ✓         | ✓       |         |
//! | 7    | ✓         |         | ✓       |
//! | 8    | ✓         | ✓       | ✓       |
//!
//! 补丁表持有拓扑：稳定的块号 + 表面号，不持有邻居指针。

use crate::error::{SolverError, SolverResult};

/// 表面方位（1..8）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    /// 是否交换 d1/d2
    pub swap: bool,
    /// 是否反转（目标侧）d1
    pub rev_d1: bool,
    /// 是否反转（目标侧）d2
    pub rev_d2: bool,
}

impl Orientation {
    /// 恒等方位
    pub const IDENTITY: Self = Self {
        swap: false,
        rev_d1: false,
        rev_d2: false,
    };

    /// 由 1..8 索引创建
    pub fn from_index(index: usize) -> SolverResult<Self> {
        if !(1..=8).contains(&index) {
            return Err(SolverError::grid(format!("方位索引 {} 超出 1..8", index)));
        }
        let i = index - 1;
        Ok(Self {
            swap: i >= 4,
            rev_d1: i % 4 == 1 || i % 4 == 3,
            rev_d2: i % 4 == 2 || i % 4 == 3,
        })
    }

    /// 转回 1..8 索引
    #[must_use]
    pub fn to_index(&self) -> usize {
        let mut i = 0;
        if self.rev_d1 {
            i += 1;
        }
        if self.rev_d2 {
            i += 2;
        }
        if self.swap {
            i += 4;
        }
        i + 1
    }

    /// 将源侧面内坐标映射到目标侧
    ///
    /// `src`: 源侧 (a, b)；`src_dims`: 源侧 (n1, n2)。
    /// 返回目标侧坐标；目标侧尺寸为 (n2, n1)（交换时）或 (n1, n2)。
    #[inline]
    #[must_use]
    pub fn apply(&self, src: (usize, usize), src_dims: (usize, usize)) -> (usize, usize) {
        let (x, y, m1, m2) = if self.swap {
            (src.1, src.0, src_dims.1, src_dims.0)
        } else {
            (src.0, src.1, src_dims.0, src_dims.1)
        };
        let a = if self.rev_d1 { m1 - 1 - x } else { x };
        let b = if self.rev_d2 { m2 - 1 - y } else { y };
        (a, b)
    }

    /// 目标侧尺寸
    #[inline]
    #[must_use]
    pub fn dest_dims(&self, src_dims: (usize, usize)) -> (usize, usize) {
        if self.swap {
            (src_dims.1, src_dims.0)
        } else {
            src_dims
        }
    }

    /// 逆方位：`inverse().apply(apply(x)) == x`
    #[must_use]
    pub fn inverse(&self) -> Self {
        if self.swap {
            // 交换时两个反转标志互换
            Self {
                swap: true,
                rev_d1: self.rev_d2,
                rev_d2: self.rev_d1,
            }
        } else {
            *self
        }
    }
}

/// 补丁一侧：稳定块号 + 该块 BC 列表中的表面号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSide {
    /// 块号
    pub block: usize,
    /// 表面在块 BC 列表中的序号
    pub boundary: usize,
}

/// 块间点匹配补丁
///
/// 方位将第一侧的 (d1, d2) 坐标映射到第二侧。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterblockPatch {
    /// 第一侧
    pub first: PatchSide,
    /// 第二侧
    pub second: PatchSide,
    /// 第一侧 → 第二侧的方位
    pub orientation: Orientation,
}

impl InterblockPatch {
    /// 创建补丁
    #[must_use]
    pub fn new(first: PatchSide, second: PatchSide, orientation: Orientation) -> Self {
        Self {
            first,
            second,
            orientation,
        }
    }

    /// 给定侧别 (0/1) 的发送方位：第一侧发送用正向，第二侧用逆向
    #[must_use]
    pub fn send_orientation(&self, side: usize) -> Orientation {
        if side == 0 {
            self.orientation
        } else {
            self.orientation.inverse()
        }
    }

    /// 给定块号返回 (本侧序号, 本侧, 对侧)
    #[must_use]
    pub fn side_of(&self, block: usize, boundary: usize) -> Option<(usize, PatchSide, PatchSide)> {
        if self.first.block == block && self.first.boundary == boundary {
            Some((0, self.first, self.second))
        } else if self.second.block == block && self.second.boundary == boundary {
            Some((1, self.second, self.first))
        } else {
            None
        }
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        for idx in 1..=8 {
            let o = Orientation::from_index(idx).unwrap();
            assert_eq!(o.to_index(), idx);
        }
        assert!(Orientation::from_index(0).is_err());
        assert!(Orientation::from_index(9).is_err());
    }

    /// 性质 6：方位作用后再作用逆方位恢复原坐标（全部 8 种）
    #[test]
    fn test_orientation_inverse_all_eight() {
        let dims = (5, 3);
        for idx in 1..=8 {
            let o = Orientation::from_index(idx).unwrap();
            let inv = o.inverse();
            let dest_dims = o.dest_dims(dims);
            for b in 0..dims.1 {
                for a in 0..dims.0 {
                    let fwd = o.apply((a, b), dims);
                    let back = inv.apply(fwd, dest_dims);
                    assert_eq!(
                        back,
                        (a, b),
                        "方位 {} 在 ({}, {}) 处不可逆: fwd={:?}",
                        idx,
                        a,
                        b,
                        fwd
                    );
                }
            }
        }
    }

    #[test]
    fn test_orientation_bijective() {
        // 每种方位都是面坐标的双射
        let dims = (4, 6);
        for idx in 1..=8 {
            let o = Orientation::from_index(idx).unwrap();
            let dd = o.dest_dims(dims);
            let mut seen = vec![false; dd.0 * dd.1];
            for b in 0..dims.1 {
                for a in 0..dims.0 {
                    let (x, y) = o.apply((a, b), dims);
                    assert!(x < dd.0 && y < dd.1);
                    assert!(!seen[y * dd.0 + x], "方位 {} 非单射", idx);
                    seen[y * dd.0 + x] = true;
                }
            }
        }
    }

    #[test]
    fn test_identity_orientation() {
        let o = Orientation::IDENTITY;
        assert_eq!(o.to_index(), 1);
        assert_eq!(o.apply((2, 3), (5, 5)), (2, 3));
    }

    #[test]
    fn test_swap_orientation() {
        let o = Orientation::from_index(5).unwrap();
        assert!(o.swap);
        assert_eq!(o.apply((2, 1), (4, 3)), (1, 2));
        assert_eq!(o.dest_dims((4, 3)), (3, 4));
    }

    #[test]
    fn test_patch_side_lookup() {
        let patch = InterblockPatch::new(
            PatchSide {
                block: 0,
                boundary: 3,
            },
            PatchSide {
                block: 2,
                boundary: 1,
            },
            Orientation::IDENTITY,
        );
        let (side, mine, remote) = patch.side_of(2, 1).unwrap();
        assert_eq!(side, 1);
        assert_eq!(mine.block, 2);
        assert_eq!(remote.block, 0);
        assert!(patch.side_of(1, 0).is_none());
    }
}
