// crates/ae_io/tests/round_trip.rs

//! 输出格式结构校验
//!
//! 逐字段解析写出的二进制文件，校验块头、维度与量纲化。

use ae_config::{FluidConfig, ReferenceConfig, SolverConfig};
use ae_io::output::{write_cell_centers, write_function, ReferenceScales};
use ae_physics::{
    BcKind, BlockBoundaryConditions, BoundarySurface, Decomposition, GridBlock, PrimitiveState,
    ProcBlock, Thermodynamics,
};
use glam::DVec3;

fn box_bcs(n: usize) -> BlockBoundaryConditions {
    BlockBoundaryConditions::new(vec![
        BoundarySurface::new(BcKind::Farfield, [0, 0, 0, n, 0, n], 1).unwrap(),
        BoundarySurface::new(BcKind::Farfield, [n, n, 0, n, 0, n], 2).unwrap(),
        BoundarySurface::new(BcKind::Farfield, [0, n, 0, 0, 0, n], 3).unwrap(),
        BoundarySurface::new(BcKind::Farfield, [0, n, n, n, 0, n], 4).unwrap(),
        BoundarySurface::new(BcKind::Farfield, [0, n, 0, n, 0, 0], 5).unwrap(),
        BoundarySurface::new(BcKind::Farfield, [0, n, 0, n, n, n], 6).unwrap(),
    ])
}

fn freestream_block(n: usize) -> ProcBlock {
    let thermo = Thermodynamics::from_config(&FluidConfig::default(), &ReferenceConfig::default());
    let grid = GridBlock::uniform(n, n, n, DVec3::splat(n as f64));
    let mut b = ProcBlock::new(&grid, box_bcs(n), 0).unwrap();
    b.initialize(
        &PrimitiveState::new(1.0, DVec3::new(0.5, 0.0, 0.0), 1.0 / 1.4),
        &thermo,
    );
    b
}

fn take_i32(buf: &[u8], at: &mut usize) -> i32 {
    let v = i32::from_le_bytes(buf[*at..*at + 4].try_into().unwrap());
    *at += 4;
    v
}

fn take_f64(buf: &[u8], at: &mut usize) -> f64 {
    let v = f64::from_le_bytes(buf[*at..*at + 8].try_into().unwrap());
    *at += 8;
    v
}

#[test]
fn cell_center_file_layout() {
    let blocks = vec![freestream_block(2)];
    let mut buf = Vec::new();
    write_cell_centers(&mut buf, &blocks, 2.0).unwrap();

    let mut at = 0;
    assert_eq!(take_i32(&buf, &mut at), 1);
    assert_eq!(take_i32(&buf, &mut at), 2);
    assert_eq!(take_i32(&buf, &mut at), 2);
    assert_eq!(take_i32(&buf, &mut at), 2);
    // 先全部 x：首个单元中心 x = 0.5，按 L=2 量纲化 → 1.0
    let x0 = take_f64(&buf, &mut at);
    assert!((x0 - 1.0).abs() < 1e-14);
    // 总长度 = 头 + 8 单元 × 3 坐标 × 8 字节
    assert_eq!(buf.len(), 16 + 8 * 3 * 8);
}

#[test]
fn function_file_layout_and_scaling() {
    let blocks = vec![freestream_block(2)];
    let decomp = Decomposition::default();
    let mut config = SolverConfig::default();
    config.output.variables = vec![
        "density".to_string(),
        "pressure".to_string(),
        "rank".to_string(),
    ];
    let thermo = Thermodynamics::from_config(&config.fluid, &config.reference);

    let mut buf = Vec::new();
    write_function(&mut buf, &blocks, &decomp, &config, &thermo).unwrap();

    let mut at = 0;
    assert_eq!(take_i32(&buf, &mut at), 1);
    assert_eq!(
        [
            take_i32(&buf, &mut at),
            take_i32(&buf, &mut at),
            take_i32(&buf, &mut at),
            take_i32(&buf, &mut at)
        ],
        [2, 2, 2, 3]
    );

    let scales = ReferenceScales::from_config(&config);
    // 密度：ρ~ = 1 → 有量纲 ρ_ref
    for _ in 0..8 {
        let v = take_f64(&buf, &mut at);
        assert!((v - scales.rho).abs() < 1e-9);
    }
    // 压力：p~ = 1/γ → ρ_ref a² / γ
    let expected_p = scales.rho * scales.a * scales.a / 1.4;
    for _ in 0..8 {
        let v = take_f64(&buf, &mut at);
        assert!((v - expected_p).abs() / expected_p < 1e-12);
    }
    // rank：无量纲 0
    for _ in 0..8 {
        assert_eq!(take_f64(&buf, &mut at), 0.0);
    }
    assert_eq!(at, buf.len());
}

#[test]
fn function_file_rejects_unknown_variable() {
    let blocks = vec![freestream_block(2)];
    let decomp = Decomposition::default();
    let mut config = SolverConfig::default();
    config.output.variables = vec!["vorticity".to_string()];
    let thermo = Thermodynamics::from_config(&config.fluid, &config.reference);

    let mut buf = Vec::new();
    assert!(write_function(&mut buf, &blocks, &decomp, &config, &thermo).is_err());
}
