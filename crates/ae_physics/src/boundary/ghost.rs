// crates/ae_physics/src/boundary/ghost.rs

//! 幽灵状态规则
//!
//! 非块间边界的幽灵单元状态仅由其镜像内部单元经边界函数得到
//! （不变量 5）。各类边界的契约：
//!
//! - 滑移壁：法向速度反射，切向速度、ρ、p、k、ω 复制
//! - 黏性壁：壁面速度为零；p 外推；等温壁令面平均温度等于 T_w，
//!   绝热壁反射 T；k 面值为零；ω 用 Menter 近壁公式
//! - 亚/超声速入出流与远场：沿进出特征线的 Riemann 不变量
//! - 周期/块间：由交换层以方位重映射从远端内部复制（不在此处理）
//!
//! 壁面律处理在 y⁺ 迟滞带（见 turbulence 模块）内保持既有
//! 模式，带外自动切换。

use crate::state::PrimitiveState;
use crate::thermo::Thermodynamics;
use crate::turbulence::{self, TurbulenceModel};
use ae_config::WallTreatment;
use glam::DVec3;

/// 幽灵状态计算上下文
///
/// 由引擎构造一次，`fill_ghosts` 逐面调用。
#[derive(Debug, Clone, Copy)]
pub struct GhostContext<'a> {
    /// 热力学对象
    pub thermo: &'a Thermodynamics,
    /// 湍流模型
    pub turb: &'a TurbulenceModel,
    /// 来流状态
    pub freestream: PrimitiveState,
    /// 等温壁温（无量纲）；None 表示绝热
    pub wall_temp: Option<f64>,
    /// 壁面处理方式
    pub wall_treatment: WallTreatment,
}

/// 滑移壁幽灵：法向速度反射
#[must_use]
fn slip_wall(interior: &PrimitiveState, normal: DVec3) -> PrimitiveState {
    let vel = interior.velocity();
    let vn = vel.dot(normal);
    let ghost_vel = vel - 2.0 * vn * normal;
    PrimitiveState::with_turbulence(
        interior.rho,
        ghost_vel,
        interior.p,
        interior.tke,
        interior.sdr,
    )
}

/// 黏性壁幽灵
///
/// `wall_dist` 为壁邻单元中心到壁面的距离，
/// `wall_law_active` 为该表面的迟滞状态（由调用方维护）。
#[must_use]
fn viscous_wall(
    interior: &PrimitiveState,
    normal: DVec3,
    wall_dist: f64,
    wall_law_active: bool,
    ctx: &GhostContext<'_>,
) -> PrimitiveState {
    let gas = &ctx.thermo.gas;
    let vel = interior.velocity();

    // 温度：等温壁令面平均 = T_w，绝热壁反射（零法向热流）
    let t_int = interior.temperature(gas);
    let t_ghost = match ctx.wall_temp {
        Some(t_w) => (2.0 * t_w - t_int).max(0.1 * t_w),
        None => t_int,
    };

    // 压力外推，密度由状态方程回算
    let p_ghost = interior.p;
    let rho_ghost = gas.gamma() * p_ghost / t_ghost;

    // 速度：无滑移 → 面平均为零；壁面律模式给出切向滑移
    let mu_wall = ctx.thermo.sutherland.viscosity(t_int);
    let ghost_vel = if wall_law_active && ctx.wall_treatment == WallTreatment::WallLaw {
        let vn = vel.dot(normal);
        let v_tan = vel - vn * normal;
        let u_par = v_tan.length();
        if u_par > 1.0e-12 {
            let (u_tau, _) =
                turbulence::wall_shear_velocity(u_par, wall_dist, interior.rho, mu_wall, ctx.thermo);
            // 幽灵切向速度使离散壁面剪切 μ Δu/(2d) 匹配 ρ u_τ²
            let delta_u =
                2.0 * wall_dist * interior.rho * u_tau * u_tau / (mu_wall * ctx.thermo.inv_re);
            let ghost_tan = v_tan - v_tan.normalize() * delta_u.min(2.0 * u_par);
            ghost_tan - vn * normal
        } else {
            -vel
        }
    } else {
        -vel
    };

    // 湍流量：k 面值为零；ω 用近壁公式
    let tke_ghost = -interior.tke;
    let sdr_ghost = if ctx.turb.has_transport() {
        let omega_wall = ctx
            .turb
            .wall_ghost_sdr(interior.rho, mu_wall, wall_dist, ctx.thermo);
        let g = 2.0 * omega_wall - interior.sdr;
        if g > 0.0 {
            g
        } else {
            omega_wall
        }
    } else {
        0.0
    };

    PrimitiveState::with_turbulence(rho_ghost, ghost_vel, p_ghost, tke_ghost, sdr_ghost)
}

/// 特征远场/进出流
///
/// 沿外法向的 Riemann 不变量：
/// R⁺ = u_n + 2a/(γ−1)（内部，出域特征），
/// R⁻ = u_n − 2a/(γ−1)（来流，入域特征）。
/// 边界态由 (R⁺+R⁻)/2 与 (γ−1)(R⁺−R⁻)/4 给出，
/// 熵与切向速度取上风侧。
#[must_use]
fn characteristic(
    interior: &PrimitiveState,
    normal: DVec3,
    ctx: &GhostContext<'_>,
) -> PrimitiveState {
    let gas = &ctx.thermo.gas;
    let gamma = gas.gamma();
    let free = &ctx.freestream;

    let a_int = interior.sound_speed(gas);
    let a_free = free.sound_speed(gas);
    let vn_int = interior.velocity().dot(normal);
    let vn_free = free.velocity().dot(normal);

    // 超声速：整组特征同向
    if vn_int.abs() >= a_int {
        return if vn_int > 0.0 { *interior } else { *free };
    }

    let r_plus = vn_int + 2.0 * a_int / (gamma - 1.0);
    let r_minus = vn_free - 2.0 * a_free / (gamma - 1.0);

    let vn_b = 0.5 * (r_plus + r_minus);
    let a_b = 0.25 * (gamma - 1.0) * (r_plus - r_minus);

    // 上风侧：出流（vn_b > 0）取内部熵与切向，入流取来流
    let (upwind, vn_up) = if vn_b > 0.0 {
        (interior, vn_int)
    } else {
        (free, vn_free)
    };

    let entropy = upwind.p / upwind.rho.powf(gamma);
    let rho_b = (a_b * a_b / (gamma * entropy)).powf(1.0 / (gamma - 1.0));
    let p_b = rho_b * a_b * a_b / gamma;
    let vel_b = upwind.velocity() + (vn_b - vn_up) * normal;

    PrimitiveState::with_turbulence(rho_b, vel_b, p_b, upwind.tke, upwind.sdr)
}

/// 计算非块间边界的幽灵状态
///
/// # 参数
/// - `kind`: 边界类型（不得为周期/块间）
/// - `interior`: 镜像内部单元的原始状态
/// - `normal`: 表面外法向单位向量（指向域外）
/// - `wall_dist`: 壁邻单元中心到壁面的距离（壁类边界使用）
/// - `wall_law_active`: 该表面的壁面律迟滞状态
#[must_use]
pub fn ghost_state(
    kind: crate::boundary::BcKind,
    interior: &PrimitiveState,
    normal: DVec3,
    wall_dist: f64,
    wall_law_active: bool,
    ctx: &GhostContext<'_>,
) -> PrimitiveState {
    use crate::boundary::BcKind;
    match kind {
        BcKind::SlipWall => slip_wall(interior, normal),
        BcKind::ViscousWall => viscous_wall(interior, normal, wall_dist, wall_law_active, ctx),
        BcKind::Farfield | BcKind::SubsonicInflow | BcKind::SubsonicOutflow => {
            characteristic(interior, normal, ctx)
        }
        BcKind::SupersonicInflow => ctx.freestream,
        BcKind::SupersonicOutflow => *interior,
        // 连接类由交换层填充；此处按内部态占位
        BcKind::Periodic | BcKind::Interblock => *interior,
    }
}

// ============================================================
// 测试
// ============================================================
