// crates/ae_foundation/src/tolerance.rs

//! 数值容差常量与浮点比较
//!
//! 集中管理各层使用的容差常量，避免魔法数字散落在内核循环中。

/// 几何容差
///
/// 用于判定退化面、零体积等几何量。封闭单元的有符号面积和
/// 应在该容差内为零（离散 Green 恒等式）。
pub const EPS_GEOMETRY: f64 = 1.0e-14;

/// 状态量容差
///
/// 低于该值的密度/压力视为非物理状态。
pub const EPS_STATE: f64 = 1.0e-12;

/// 残差归一化偏移量
///
/// 归一化残差按 (L2 + ε) / (L2_ref + ε) 计算，
/// 避免收敛后除以接近零的参考值。
pub const EPS_RESIDUAL: f64 = 1.0e-30;

/// 默认相对比较容差
pub const EPS_DEFAULT: f64 = 1.0e-10;

/// 浮点近似相等（默认容差）
#[inline]
#[must_use]
pub fn approx_eq(a: f64, b: f64) -> bool {
    approx_eq_eps(a, b, EPS_DEFAULT)
}

/// 浮点近似相等（指定绝对容差）
#[inline]
#[must_use]
pub fn approx_eq_eps(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

/// 相对误差近似相等
///
/// |a - b| <= eps * max(|a|, |b|, 1)，对大数量级和接近零的值都稳健。
#[inline]
#[must_use]
pub fn approx_eq_rel(a: f64, b: f64, eps: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= eps * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(1.0, 1.0 + 1e-12));
        assert!(!approx_eq(1.0, 1.0 + 1e-6));
    }

    #[test]
    fn test_approx_eq_rel_large_scale() {
        // 相对比较对大数量级稳健
        assert!(approx_eq_rel(1.0e12, 1.0e12 + 1.0, 1e-10));
        assert!(!approx_eq_eps(1.0e12, 1.0e12 + 1.0, 1e-10));
    }

    #[test]
    fn test_approx_eq_rel_near_zero() {
        assert!(approx_eq_rel(0.0, 1e-12, 1e-10));
    }
}
