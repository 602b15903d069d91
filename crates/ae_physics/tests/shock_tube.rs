// crates/ae_physics/tests/shock_tube.rs

//! Sod 激波管（一维）
//!
//! ρ_L=1.0, p_L=1.0, u_L=0; ρ_R=0.125, p_R=0.1, u_R=0; γ=1.4。
//! 100×1×1 网格，CFL=0.5 显式推进到 t=0.2。
//! 激波与接触间断的位置须落在精确解 3 个单元内，
//! 激波后平台密度与精确值相符。

use ae_config::{FluidConfig, ReferenceConfig};
use ae_physics::{
    exchange_ghosts, reduce_min_dt, BcKind, BlockBoundaryConditions, BoundarySurface,
    GhostContext, GridBlock, PrimitiveState, ProcBlock, RhsContext, Thermodynamics,
    TurbulenceModel,
};
use ae_physics::numerics::limiter::SlopeLimiter;
use ae_physics::schemes::roe::RoeFlux;
use glam::DVec3;

const RK4_ALPHAS: [f64; 4] = [0.25, 1.0 / 3.0, 0.5, 1.0];

fn tube_bcs(ni: usize) -> BlockBoundaryConditions {
    BlockBoundaryConditions::new(vec![
        BoundarySurface::new(BcKind::SupersonicOutflow, [0, 0, 0, 1, 0, 1], 1).unwrap(),
        BoundarySurface::new(BcKind::SupersonicOutflow, [ni, ni, 0, 1, 0, 1], 2).unwrap(),
        BoundarySurface::new(BcKind::SlipWall, [0, ni, 0, 0, 0, 1], 3).unwrap(),
        BoundarySurface::new(BcKind::SlipWall, [0, ni, 1, 1, 0, 1], 4).unwrap(),
        BoundarySurface::new(BcKind::SlipWall, [0, ni, 0, 1, 0, 0], 5).unwrap(),
        BoundarySurface::new(BcKind::SlipWall, [0, ni, 0, 1, 1, 1], 6).unwrap(),
    ])
}

#[test]
fn sod_shock_and_contact_within_three_cells() {
    let ni = 100;
    let dx = 1.0 / ni as f64;
    let thermo = Thermodynamics::from_config(&FluidConfig::default(), &ReferenceConfig::default());
    let turb = TurbulenceModel::None;

    let grid = GridBlock::uniform(ni, 1, 1, DVec3::new(1.0, dx, dx));
    let mut blocks = vec![ProcBlock::new(&grid, tube_bcs(ni), 0).unwrap()];

    // Sod 初始间断
    let left = PrimitiveState::new(1.0, DVec3::ZERO, 1.0);
    let right = PrimitiveState::new(0.125, DVec3::ZERO, 0.1);
    blocks[0].initialize(&left, &thermo);
    for i in 0..ni {
        let x = (i as f64 + 0.5) * dx;
        let q = if x < 0.5 { left } else { right };
        blocks[0].set_state(i, 0, 0, q, &thermo);
    }

    let gctx = GhostContext {
        thermo: &thermo,
        turb: &turb,
        freestream: right,
        wall_temp: None,
        wall_treatment: ae_config::WallTreatment::LowRe,
    };
    let rctx = RhsContext {
        thermo: &thermo,
        turb: &turb,
        roe: RoeFlux::new(thermo.gas, 0.05),
        limiter: SlopeLimiter::VanAlbada,
        viscous: false,
    };

    // 全局时间步进到 t = 0.2
    let t_end = 0.2;
    let mut t = 0.0;
    let mut steps = 0;
    while t < t_end - 1e-12 {
        steps += 1;
        assert!(steps < 500, "步数异常: t = {t}");

        for b in blocks.iter_mut() {
            b.local_timestep(0.5, &thermo, false);
        }
        let dt = reduce_min_dt(&blocks).min(t_end - t);
        for b in blocks.iter_mut() {
            b.set_uniform_dt(dt);
        }

        let snap: Vec<_> = blocks.iter().map(|b| b.snapshot()).collect();
        for alpha in RK4_ALPHAS {
            exchange_ghosts(&mut blocks, &[], &gctx).unwrap();
            for b in blocks.iter_mut() {
                b.compute_gradients(&thermo);
            }
            for b in blocks.iter_mut() {
                b.assemble_rhs(&rctx).unwrap();
            }
            for (b, s0) in blocks.iter_mut().zip(snap.iter()) {
                b.rk_stage(s0, alpha, &thermo).unwrap();
            }
        }
        t += dt;
    }

    let rho: Vec<f64> = (0..ni).map(|i| blocks[0].state_at(i, 0, 0).rho).collect();

    // 正性保持
    for (i, r) in rho.iter().enumerate() {
        assert!(*r > 0.0, "单元 {} 密度非正", i);
    }

    // 精确解（t = 0.2）：激波 x=0.8504，接触 x=0.6855，
    // 激波后平台 ρ=0.2656，星区左侧 ρ=0.4263
    let rho_post_shock = 0.26557;
    let rho_star_left = 0.42632;

    let shock_thresh = 0.5 * (0.125 + rho_post_shock);
    let shock_cell = (0..ni)
        .rev()
        .find(|i| rho[*i] > shock_thresh)
        .expect("找不到激波");
    let x_shock = (shock_cell as f64 + 0.5) * dx;
    assert!(
        (x_shock - 0.8504).abs() <= 3.0 * dx + 0.5 * dx,
        "激波位置 {} 偏离精确解 0.8504 超过 3 个单元",
        x_shock
    );

    let contact_thresh = 0.5 * (rho_post_shock + rho_star_left);
    let contact_cell = (0..ni)
        .rev()
        .find(|i| rho[*i] > contact_thresh)
        .expect("找不到接触间断");
    let x_contact = (contact_cell as f64 + 0.5) * dx;
    assert!(
        (x_contact - 0.6855).abs() <= 3.0 * dx + 0.5 * dx,
        "接触间断位置 {} 偏离精确解 0.6855 超过 3 个单元",
        x_contact
    );

    // 激波强度：激波与接触之间的平台密度
    let mid = (contact_cell + shock_cell) / 2;
    assert!(
        (rho[mid] - rho_post_shock).abs() / rho_post_shock < 0.05,
        "激波后平台密度 {} 偏离精确值 {}",
        rho[mid],
        rho_post_shock
    );
}
