// crates/ae_io/src/bc_file.rs

//! 边界条件描述文件读入（ASCII）
//!
//! 格式（`#` 开头为注释行，空行忽略）：
//!
//! ```text
//! <numBlocks>
//! 每块：
//!   <numSurfI> <numSurfJ> <numSurfK>
//!   每面一行（i 面在前，j、k 面依次）：
//!   bcType iMin iMax jMin jMax kMin kMax tag
//! 补丁段（可省略）：
//!   <numPatches>
//!   每补丁一行：
//!   blockA surfA blockB surfB orientation
//! ```
//!
//! 退化方向钉住块面，非退化方向为半开单元区间 [min, max)。
//! 补丁行给出方位标注的点匹配对（周期边界在此列出）。

use crate::error::{IoError, IoResult};
use ae_physics::{
    BcKind, BlockBoundaryConditions, BoundarySurface, InterblockPatch, Orientation, PatchSide,
};
use std::fs;
use std::path::Path;

/// BC 文件内容：每块的边界列表 + 显式补丁对
#[derive(Debug, Clone)]
pub struct BcInput {
    /// 每块边界条件
    pub boundaries: Vec<BlockBoundaryConditions>,
    /// 方位标注补丁对（周期等）
    pub patches: Vec<InterblockPatch>,
}

/// 带行号的行迭代器（滤除注释与空行）
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Lines<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            inner: content.lines().enumerate(),
        }
    }

    fn next_data(&mut self) -> Option<(usize, &'a str)> {
        for (n, line) in self.inner.by_ref() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some((n + 1, trimmed));
        }
        None
    }

    fn expect_data(&mut self, what: &str) -> IoResult<(usize, &'a str)> {
        self.next_data()
            .ok_or_else(|| IoError::bc_format(0, format!("文件提前结束，期望 {}", what)))
    }
}

fn parse_usize(token: &str, line: usize, what: &str) -> IoResult<usize> {
    token
        .parse()
        .map_err(|_| IoError::bc_format(line, format!("{} 不是非负整数: '{}'", what, token)))
}

/// 读入 BC 描述文件
pub fn read_bc_file<P: AsRef<Path>>(path: P) -> IoResult<BcInput> {
    let content = fs::read_to_string(path)?;
    parse_bc_input(&content)
}

/// 解析 BC 描述内容
pub fn parse_bc_input(content: &str) -> IoResult<BcInput> {
    let mut lines = Lines::new(content);

    let (ln, tok) = lines.expect_data("块数")?;
    let num_blocks = parse_usize(tok, ln, "块数")?;

    let mut boundaries = Vec::with_capacity(num_blocks);
    for blk in 0..num_blocks {
        let (ln, counts) = lines.expect_data("表面计数")?;
        let parts: Vec<&str> = counts.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(IoError::bc_format(
                ln,
                format!("块 {} 的表面计数须为三个整数", blk),
            ));
        }
        let n_i = parse_usize(parts[0], ln, "i 面数")?;
        let n_j = parse_usize(parts[1], ln, "j 面数")?;
        let n_k = parse_usize(parts[2], ln, "k 面数")?;

        let mut surfaces = Vec::with_capacity(n_i + n_j + n_k);
        for s in 0..(n_i + n_j + n_k) {
            let (ln, line) = lines.expect_data("表面记录")?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 8 {
                return Err(IoError::bc_format(
                    ln,
                    "表面记录须为: bcType iMin iMax jMin jMax kMin kMax tag",
                ));
            }
            let kind = BcKind::parse(parts[0])
                .ok_or_else(|| IoError::bc_format(ln, format!("未知边界类型 '{}'", parts[0])))?;
            let mut ranges = [0usize; 6];
            for (r, part) in ranges.iter_mut().zip(&parts[1..7]) {
                *r = parse_usize(part, ln, "表面范围")?;
            }
            let tag = parse_usize(parts[7], ln, "tag")?;
            let surf = BoundarySurface::new(kind, ranges, tag)
                .map_err(|e| IoError::bc_format(ln, e.to_string()))?;

            // 表面须按 i、j、k 分组排列
            let expected_dir = if s < n_i {
                0
            } else if s < n_i + n_j {
                1
            } else {
                2
            };
            if surf.direction() != expected_dir {
                return Err(IoError::bc_format(
                    ln,
                    format!(
                        "表面方向 {} 与分组位置不符（期望方向 {}）",
                        surf.direction(),
                        expected_dir
                    ),
                ));
            }
            surfaces.push(surf);
        }
        boundaries.push(BlockBoundaryConditions::new(surfaces));
    }

    // 可省略的补丁段
    let mut patches = Vec::new();
    if let Some((ln, tok)) = lines.next_data() {
        let num_patches = parse_usize(tok, ln, "补丁数")?;
        for _ in 0..num_patches {
            let (ln, line) = lines.expect_data("补丁记录")?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 5 {
                return Err(IoError::bc_format(
                    ln,
                    "补丁记录须为: blockA surfA blockB surfB orientation",
                ));
            }
            let block_a = parse_usize(parts[0], ln, "blockA")?;
            let surf_a = parse_usize(parts[1], ln, "surfA")?;
            let block_b = parse_usize(parts[2], ln, "blockB")?;
            let surf_b = parse_usize(parts[3], ln, "surfB")?;
            let orient_idx = parse_usize(parts[4], ln, "orientation")?;
            let orientation = Orientation::from_index(orient_idx)
                .map_err(|e| IoError::bc_format(ln, e.to_string()))?;

            for (b, s) in [(block_a, surf_a), (block_b, surf_b)] {
                if b >= num_blocks {
                    return Err(IoError::bc_format(ln, format!("补丁引用不存在的块 {}", b)));
                }
                let bcs = &boundaries[b];
                if s >= bcs.surfaces().len() {
                    return Err(IoError::bc_format(
                        ln,
                        format!("补丁引用块 {} 不存在的表面 {}", b, s),
                    ));
                }
                if !bcs.surfaces()[s].kind.is_connection() {
                    return Err(IoError::bc_format(
                        ln,
                        format!("补丁引用的块 {} 表面 {} 不是连接类边界", b, s),
                    ));
                }
            }

            patches.push(InterblockPatch::new(
                PatchSide {
                    block: block_a,
                    boundary: surf_a,
                },
                PatchSide {
                    block: block_b,
                    boundary: surf_b,
                },
                orientation,
            ));
        }
    }

    Ok(BcInput {
        boundaries,
        patches,
    })
}
