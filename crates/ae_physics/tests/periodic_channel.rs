// crates/ae_physics/tests/periodic_channel.rs

//! 周期通道中的密度脉冲平流
//!
//! 高斯密度脉冲以均匀速度穿过周期边界，一个周期后回到初始
//! 位置；128 单元、CFL 0.5 下 L2 误差小于脉冲幅值的 1%。

use ae_config::{FluidConfig, ReferenceConfig};
use ae_physics::numerics::limiter::SlopeLimiter;
use ae_physics::schemes::roe::RoeFlux;
use ae_physics::{
    exchange_ghosts, reduce_min_dt, BcKind, BlockBoundaryConditions, BoundarySurface,
    GhostContext, GridBlock, InterblockPatch, Orientation, PatchSide, PrimitiveState, ProcBlock,
    RhsContext, Thermodynamics, TurbulenceModel,
};
use glam::DVec3;

const RK4_ALPHAS: [f64; 4] = [0.25, 1.0 / 3.0, 0.5, 1.0];

#[test]
fn gaussian_pulse_returns_after_one_period() {
    let ni = 128;
    let dx = 1.0 / ni as f64;
    let thermo = Thermodynamics::from_config(&FluidConfig::default(), &ReferenceConfig::default());
    let turb = TurbulenceModel::None;

    let bcs = BlockBoundaryConditions::new(vec![
        BoundarySurface::new(BcKind::Periodic, [0, 0, 0, 1, 0, 1], 1).unwrap(),
        BoundarySurface::new(BcKind::Periodic, [ni, ni, 0, 1, 0, 1], 1).unwrap(),
        BoundarySurface::new(BcKind::SlipWall, [0, ni, 0, 0, 0, 1], 3).unwrap(),
        BoundarySurface::new(BcKind::SlipWall, [0, ni, 1, 1, 0, 1], 4).unwrap(),
        BoundarySurface::new(BcKind::SlipWall, [0, ni, 0, 1, 0, 0], 5).unwrap(),
        BoundarySurface::new(BcKind::SlipWall, [0, ni, 0, 1, 1, 1], 6).unwrap(),
    ]);
    let patches = vec![InterblockPatch::new(
        PatchSide {
            block: 0,
            boundary: 0,
        },
        PatchSide {
            block: 0,
            boundary: 1,
        },
        Orientation::IDENTITY,
    )];

    let grid = GridBlock::uniform(ni, 1, 1, DVec3::new(1.0, dx, dx));
    let mut blocks = vec![ProcBlock::new(&grid, bcs, 0).unwrap()];

    // 熵波：均匀 u 与 p，密度带高斯脉冲 → 以 u 平流
    let u0 = 0.5;
    let p0 = 1.0 / 1.4;
    let amplitude = 0.05;
    let sigma = 0.2;
    let pulse = |x: f64| 1.0 + amplitude * (-((x - 0.5) / sigma).powi(2)).exp();

    blocks[0].initialize(
        &PrimitiveState::new(1.0, DVec3::new(u0, 0.0, 0.0), p0),
        &thermo,
    );
    for i in 0..ni {
        let x = (i as f64 + 0.5) * dx;
        blocks[0].set_state(
            i,
            0,
            0,
            PrimitiveState::new(pulse(x), DVec3::new(u0, 0.0, 0.0), p0),
            &thermo,
        );
    }
    let initial: Vec<f64> = (0..ni).map(|i| blocks[0].state_at(i, 0, 0).rho).collect();

    let gctx = GhostContext {
        thermo: &thermo,
        turb: &turb,
        freestream: PrimitiveState::new(1.0, DVec3::new(u0, 0.0, 0.0), p0),
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

    // 一个平流周期 T = L/u
    let t_end = 1.0 / u0;
    let mut t = 0.0;
    let mut steps = 0usize;
    while t < t_end - 1e-12 {
        steps += 1;
        assert!(steps < 5000, "步数异常");

        for b in blocks.iter_mut() {
            b.local_timestep(0.5, &thermo, false);
        }
        let dt = reduce_min_dt(&blocks).min(t_end - t);
        for b in blocks.iter_mut() {
            b.set_uniform_dt(dt);
        }

        let snap: Vec<_> = blocks.iter().map(|b| b.snapshot()).collect();
        for alpha in RK4_ALPHAS {
            exchange_ghosts(&mut blocks, &patches, &gctx).unwrap();
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

    // 一个周期后与初值比较：相对脉冲能量的 L2 误差 < 1%
    let mut err2 = 0.0;
    let mut ref2 = 0.0;
    for i in 0..ni {
        let rho = blocks[0].state_at(i, 0, 0).rho;
        err2 += (rho - initial[i]).powi(2);
        ref2 += (initial[i] - 1.0).powi(2);
    }
    let rel = (err2 / ref2).sqrt();
    assert!(rel < 0.01, "周期回归 L2 误差 {:.4} ≥ 1%", rel);

    // 质量守恒（周期域总质量不变）
    let mass: f64 = (0..ni).map(|i| blocks[0].state_at(i, 0, 0).rho).sum();
    let mass0: f64 = initial.iter().sum();
    assert!(((mass - mass0) / mass0).abs() < 1e-12, "周期域质量不守恒");
}
