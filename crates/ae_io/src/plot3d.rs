// crates/ae_io/src/plot3d.rs

//! PLOT3D 多块二进制网格读入
//!
//! 格式（小端）：
//! - `numBlocks: i32`
//! - 每块 `(Ni_node, Nj_node, Nk_node): i32 × 3`
//! - 每块依次连续转储 x[]、y[]、z[] 节点坐标，`f64`，
//!   i 最快、k 最慢
//!
//! 读入时坐标除以参考长度 L 转入无量纲 frame。

use crate::error::{IoError, IoResult};
use ae_physics::{Array3D, GridBlock};
use glam::DVec3;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// 读 i32（小端）
fn read_i32<R: Read>(r: &mut R) -> IoResult<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// 读 f64（小端）
fn read_f64<R: Read>(r: &mut R) -> IoResult<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// 读入 PLOT3D 网格文件
///
/// 返回按文件序排列的节点块；坐标已按 `l_ref` 无量纲化。
pub fn read_grid<P: AsRef<Path>>(path: P, l_ref: f64) -> IoResult<Vec<GridBlock>> {
    let file = File::open(path.as_ref()).map_err(|e| {
        IoError::grid_format(format!("无法打开网格文件 {}: {}", path.as_ref().display(), e))
    })?;
    let mut reader = BufReader::new(file);
    read_grid_from(&mut reader, l_ref)
}

/// 从任意读取器读入（测试用）
pub fn read_grid_from<R: Read>(reader: &mut R, l_ref: f64) -> IoResult<Vec<GridBlock>> {
    let num_blocks = read_i32(reader)?;
    if num_blocks <= 0 {
        return Err(IoError::grid_format(format!("块数非正: {}", num_blocks)));
    }

    let mut dims = Vec::with_capacity(num_blocks as usize);
    for _ in 0..num_blocks {
        let ni = read_i32(reader)?;
        let nj = read_i32(reader)?;
        let nk = read_i32(reader)?;
        if ni < 2 || nj < 2 || nk < 2 {
            return Err(IoError::grid_format(format!(
                "块节点数 ({}, {}, {}) 不足",
                ni, nj, nk
            )));
        }
        dims.push((ni as usize, nj as usize, nk as usize));
    }

    let inv_l = 1.0 / l_ref;
    let mut blocks = Vec::with_capacity(dims.len());
    for (ni, nj, nk) in dims {
        let mut nodes = Array3D::<DVec3>::new(ni, nj, nk, 0);
        // 先全部 x，再全部 y，再全部 z
        for dim in 0..3 {
            for k in 0..nk {
                for j in 0..nj {
                    for i in 0..ni {
                        let v = read_f64(reader)? * inv_l;
                        match dim {
                            0 => nodes[(i, j, k)].x = v,
                            1 => nodes[(i, j, k)].y = v,
                            _ => nodes[(i, j, k)].z = v,
                        }
                    }
                }
            }
        }
        blocks.push(GridBlock::new(ni, nj, nk, nodes)?);
    }

    Ok(blocks)
}

/// 写 PLOT3D 网格文件（测试与算例生成用）
pub fn write_grid<W: std::io::Write>(
    writer: &mut W,
    blocks: &[GridBlock],
    l_ref: f64,
) -> IoResult<()> {
    writer.write_all(&(blocks.len() as i32).to_le_bytes())?;
    for b in blocks {
        writer.write_all(&(b.ni_node as i32).to_le_bytes())?;
        writer.write_all(&(b.nj_node as i32).to_le_bytes())?;
        writer.write_all(&(b.nk_node as i32).to_le_bytes())?;
    }
    for b in blocks {
        for dim in 0..3 {
            for k in 0..b.nk_node {
                for j in 0..b.nj_node {
                    for i in 0..b.ni_node {
                        let n = b.nodes[(i, j, k)];
                        let v = match dim {
                            0 => n.x,
                            1 => n.y,
                            _ => n.z,
                        } * l_ref;
                        writer.write_all(&v.to_le_bytes())?;
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_roundtrip() {
        let blocks = vec![
            GridBlock::uniform(4, 3, 2, DVec3::new(2.0, 1.5, 1.0)),
            GridBlock::uniform(2, 2, 2, DVec3::splat(1.0)),
        ];

        let mut buf = Vec::new();
        write_grid(&mut buf, &blocks, 2.0).unwrap();

        let read = read_grid_from(&mut buf.as_slice(), 2.0).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].ni_node, 5);
        assert_eq!(read[1].nk_node, 3);
        // 坐标按 L 无量纲化后往返一致
        for k in 0..3 {
            for j in 0..4 {
                for i in 0..5 {
                    let a = blocks[0].nodes[(i, j, k)];
                    let b = read[0].nodes[(i, j, k)];
                    assert!((a - b).length() < 1e-14);
                }
            }
        }
    }

    #[test]
    fn test_negative_block_count_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(-1i32).to_le_bytes());
        assert!(read_grid_from(&mut buf.as_slice(), 1.0).is_err());
    }

    #[test]
    fn test_truncated_file_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf.extend_from_slice(&3i32.to_le_bytes());
        buf.extend_from_slice(&3i32.to_le_bytes());
        buf.extend_from_slice(&3i32.to_le_bytes());
        // 坐标数据缺失
        assert!(read_grid_from(&mut buf.as_slice(), 1.0).is_err());
    }

    #[test]
    fn test_nondimensionalization() {
        let blocks = vec![GridBlock::uniform(2, 2, 2, DVec3::splat(4.0))];
        let mut buf = Vec::new();
        // 以 L=1 写出（有量纲坐标 0..4）
        write_grid(&mut buf, &blocks, 1.0).unwrap();
        // 以 L=4 读入 → 无量纲坐标 0..1
        let read = read_grid_from(&mut buf.as_slice(), 4.0).unwrap();
        assert!((read[0].nodes[(2, 2, 2)].x - 1.0).abs() < 1e-14);
    }
}
