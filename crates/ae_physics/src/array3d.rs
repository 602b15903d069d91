// crates/ae_physics/src/array3d.rs

//! 带幽灵晕圈的三维连续数组
//!
//! 存储 (Ni+2G)(Nj+2G)(Nk+2G) 个元素于单一连续缓冲区，
//! k 最外层、i 最内层，保证 i 扫掠缓存友好：
//!
//! ```text
//! idx = (k · NJt + j) · NIt + i,  NIt = Ni + 2G
//! ```
//!
//! 索引均为"物理索引"（含幽灵层），内部单元位于 [G, G+N)。
//! 同形数组可按分量相加；子范围视图携带自身步长，
//! 通过可变视图的写入直接作用于母数组。

use ae_foundation::{AeError, AeResult};
use std::ops::{AddAssign, Index, IndexMut, Range};

/// 三维幽灵晕圈数组
#[derive(Debug, Clone, PartialEq)]
pub struct Array3D<T> {
    ni: usize,
    nj: usize,
    nk: usize,
    ghosts: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Array3D<T> {
    /// 创建数组，内部尺寸 (ni, nj, nk)，六个面各带宽度 g 的幽灵层
    #[must_use]
    pub fn new(ni: usize, nj: usize, nk: usize, ghosts: usize) -> Self {
        let nit = ni + 2 * ghosts;
        let njt = nj + 2 * ghosts;
        let nkt = nk + 2 * ghosts;
        Self {
            ni,
            nj,
            nk,
            ghosts,
            data: vec![T::default(); nit * njt * nkt],
        }
    }

    /// 以给定值填充创建
    #[must_use]
    pub fn filled(ni: usize, nj: usize, nk: usize, ghosts: usize, value: T) -> Self {
        let mut arr = Self::new(ni, nj, nk, ghosts);
        arr.data.fill(value);
        arr
    }
}

impl<T> Array3D<T> {
    /// 内部 i 尺寸
    #[inline]
    #[must_use]
    pub fn ni(&self) -> usize {
        self.ni
    }

    /// 内部 j 尺寸
    #[inline]
    #[must_use]
    pub fn nj(&self) -> usize {
        self.nj
    }

    /// 内部 k 尺寸
    #[inline]
    #[must_use]
    pub fn nk(&self) -> usize {
        self.nk
    }

    /// 幽灵层宽度
    #[inline]
    #[must_use]
    pub fn ghosts(&self) -> usize {
        self.ghosts
    }

    /// 含幽灵层的总 i 尺寸
    #[inline]
    #[must_use]
    pub fn nit(&self) -> usize {
        self.ni + 2 * self.ghosts
    }

    /// 含幽灵层的总 j 尺寸
    #[inline]
    #[must_use]
    pub fn njt(&self) -> usize {
        self.nj + 2 * self.ghosts
    }

    /// 含幽灵层的总 k 尺寸
    #[inline]
    #[must_use]
    pub fn nkt(&self) -> usize {
        self.nk + 2 * self.ghosts
    }

    /// 内部索引范围（物理索引）
    #[inline]
    #[must_use]
    pub fn interior(&self) -> (Range<usize>, Range<usize>, Range<usize>) {
        let g = self.ghosts;
        (g..g + self.ni, g..g + self.nj, g..g + self.nk)
    }

    /// 两数组是否同形（尺寸与幽灵层一致）
    #[inline]
    #[must_use]
    pub fn same_shape<U>(&self, other: &Array3D<U>) -> bool {
        self.ni == other.ni
            && self.nj == other.nj
            && self.nk == other.nk
            && self.ghosts == other.ghosts
    }

    #[inline]
    fn offset(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.nit() && j < self.njt() && k < self.nkt());
        (k * self.njt() + j) * self.nit() + i
    }

    /// 底层连续缓冲区
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// 子范围只读视图（物理索引范围）
    #[must_use]
    pub fn view(
        &self,
        ir: Range<usize>,
        jr: Range<usize>,
        kr: Range<usize>,
    ) -> Array3View<'_, T> {
        let start = self.offset(ir.start, jr.start, kr.start);
        Array3View {
            data: &self.data,
            start,
            len: (ir.len(), jr.len(), kr.len()),
            stride_j: self.nit(),
            stride_k: self.nit() * self.njt(),
        }
    }

    /// 子范围可变视图，写入直接作用于母数组
    #[must_use]
    pub fn view_mut(
        &mut self,
        ir: Range<usize>,
        jr: Range<usize>,
        kr: Range<usize>,
    ) -> Array3ViewMut<'_, T> {
        let start = self.offset(ir.start, jr.start, kr.start);
        let stride_j = self.nit();
        let stride_k = self.nit() * self.njt();
        Array3ViewMut {
            data: &mut self.data,
            start,
            len: (ir.len(), jr.len(), kr.len()),
            stride_j,
            stride_k,
        }
    }
}

impl<T: Clone> Array3D<T> {
    /// 全数组填充
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T: Copy + AddAssign> Array3D<T> {
    /// 同形数组逐分量累加
    pub fn add_assign_from(&mut self, other: &Self) -> AeResult<()> {
        AeError::check_size("Array3D", self.data.len(), other.data.len())?;
        if !self.same_shape(other) {
            return Err(AeError::invalid_input("Array3D 形状不一致，无法相加"));
        }
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += *b;
        }
        Ok(())
    }
}

impl<T> Index<(usize, usize, usize)> for Array3D<T> {
    type Output = T;
    #[inline]
    fn index(&self, (i, j, k): (usize, usize, usize)) -> &T {
        &self.data[self.offset(i, j, k)]
    }
}

impl<T> IndexMut<(usize, usize, usize)> for Array3D<T> {
    #[inline]
    fn index_mut(&mut self, (i, j, k): (usize, usize, usize)) -> &mut T {
        let off = self.offset(i, j, k);
        &mut self.data[off]
    }
}

// ============================================================
// 视图
// ============================================================

/// 只读子范围视图
///
/// 携带自身步长，局部索引 (a, b, c) 对应母数组
/// (ir.start + a, jr.start + b, kr.start + c)。
pub struct Array3View<'a, T> {
    data: &'a [T],
    start: usize,
    len: (usize, usize, usize),
    stride_j: usize,
    stride_k: usize,
}

impl<'a, T> Array3View<'a, T> {
    /// 视图尺寸
    #[inline]
    #[must_use]
    pub fn len(&self) -> (usize, usize, usize) {
        self.len
    }

    /// 视图是否为空
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len.0 == 0 || self.len.1 == 0 || self.len.2 == 0
    }
}

impl<'a, T> Index<(usize, usize, usize)> for Array3View<'a, T> {
    type Output = T;
    #[inline]
    fn index(&self, (a, b, c): (usize, usize, usize)) -> &T {
        debug_assert!(a < self.len.0 && b < self.len.1 && c < self.len.2);
        &self.data[self.start + c * self.stride_k + b * self.stride_j + a]
    }
}

/// 可变子范围视图
pub struct Array3ViewMut<'a, T> {
    data: &'a mut [T],
    start: usize,
    len: (usize, usize, usize),
    stride_j: usize,
    stride_k: usize,
}

impl<'a, T> Array3ViewMut<'a, T> {
    /// 视图尺寸
    #[inline]
    #[must_use]
    pub fn len(&self) -> (usize, usize, usize) {
        self.len
    }

    /// 视图是否为空
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len.0 == 0 || self.len.1 == 0 || self.len.2 == 0
    }
}

impl<'a, T> Index<(usize, usize, usize)> for Array3ViewMut<'a, T> {
    type Output = T;
    #[inline]
    fn index(&self, (a, b, c): (usize, usize, usize)) -> &T {
        debug_assert!(a < self.len.0 && b < self.len.1 && c < self.len.2);
        &self.data[self.start + c * self.stride_k + b * self.stride_j + a]
    }
}

impl<'a, T> IndexMut<(usize, usize, usize)> for Array3ViewMut<'a, T> {
    #[inline]
    fn index_mut(&mut self, (a, b, c): (usize, usize, usize)) -> &mut T {
        debug_assert!(a < self.len.0 && b < self.len.1 && c < self.len.2);
        &mut self.data[self.start + c * self.stride_k + b * self.stride_j + a]
    }
}

// ============================================================
// 测试
// ============================================================
