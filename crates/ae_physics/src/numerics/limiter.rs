// crates/ae_physics/src/numerics/limiter.rs

//! 斜率限制器
//!
//! MUSCL 重构的限制斜率计算。输入为单元两侧的差分
//! Δ₋ = φ_i − φ_{i−1}，Δ₊ = φ_{i+1} − φ_i，
//! 输出用于外推的限制斜率（乘 ½ 后加到单元值上）。
//!
//! 热循环内采用枚举分发，避免虚调用与隐藏分配。

use ae_config::LimiterKind;

const VAN_ALBADA_EPS: f64 = 1.0e-24;

/// 斜率限制器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeLimiter {
    /// 一阶迎风：斜率恒零，退化为分片常值
    FirstOrder,
    /// Minmod：两侧差分同号取小，异号取零
    Minmod,
    /// Van Albada：光滑区趋于中心差分，间断处自动退化
    VanAlbada,
}

impl SlopeLimiter {
    /// 由配置枚举创建
    #[must_use]
    pub fn from_kind(kind: LimiterKind) -> Self {
        match kind {
            LimiterKind::FirstOrder => Self::FirstOrder,
            LimiterKind::Minmod => Self::Minmod,
            LimiterKind::VanAlbada => Self::VanAlbada,
        }
    }

    /// 限制斜率
    #[inline]
    #[must_use]
    pub fn limit(&self, d_minus: f64, d_plus: f64) -> f64 {
        match self {
            Self::FirstOrder => 0.0,
            Self::Minmod => {
                if d_minus * d_plus <= 0.0 {
                    0.0
                } else if d_minus.abs() < d_plus.abs() {
                    d_minus
                } else {
                    d_plus
                }
            }
            Self::VanAlbada => {
                let prod = d_minus * d_plus;
                if prod <= 0.0 {
                    0.0
                } else {
                    prod * (d_minus + d_plus) / (d_minus * d_minus + d_plus * d_plus + VAN_ALBADA_EPS)
                }
            }
        }
    }

    /// 限制器名称
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstOrder => "first-order",
            Self::Minmod => "minmod",
            Self::VanAlbada => "van-albada",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_foundation::approx_eq_eps;

    #[test]
    fn test_first_order_zero_slope() {
        assert_eq!(SlopeLimiter::FirstOrder.limit(1.0, 2.0), 0.0);
    }

    #[test]
    fn test_minmod() {
        let lim = SlopeLimiter::Minmod;
        // 同号取小
        assert_eq!(lim.limit(1.0, 2.0), 1.0);
        assert_eq!(lim.limit(-2.0, -0.5), -0.5);
        // 异号（极值点）取零
        assert_eq!(lim.limit(1.0, -1.0), 0.0);
        assert_eq!(lim.limit(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_van_albada_smooth_limit() {
        // 光滑区（两侧差分相等）趋于该差分
        let lim = SlopeLimiter::VanAlbada;
        assert!(approx_eq_eps(lim.limit(1.0, 1.0), 1.0, 1e-12));
        // 间断处取零
        assert_eq!(lim.limit(1.0, -0.5), 0.0);
    }

    #[test]
    fn test_van_albada_bounded() {
        // 限制斜率不超过两侧差分的两倍
        let lim = SlopeLimiter::VanAlbada;
        let s = lim.limit(0.1, 10.0);
        assert!(s > 0.0 && s <= 2.0 * 0.1 + 1e-12);
    }
}
