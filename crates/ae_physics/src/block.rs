// crates/ae_physics/src/block.rs

//! ProcBlock：单个 rank 拥有的结构化块
//!
//! 持有几何、原始/守恒状态、梯度、残差、局部 Δt、BC 列表与
//! 块标识（稳定块号、父块号/全局位置、rank）。状态数组在交换
//! 屏障之间仅由拥有它的 rank 修改。
//!
//! 残差约定：R(c) = Σ_f F·A_out − V·S，更新为 dU/dt = −R/V。
//! 幽灵宽度 G=2 支撑二阶 MUSCL 模板；内核循环对整条面序列
//! 无分支运行，边界面由幽灵状态参与重构。

use crate::array3d::Array3D;
use crate::boundary::{ghost_state, BlockBoundaryConditions, GhostContext};
use crate::error::{NumericalError, SolverError, SolverResult};
use crate::geometry::{BlockGeometry, GridBlock};
use crate::numerics::green_gauss::GradientSet;
use crate::numerics::limiter::SlopeLimiter;
use crate::numerics::muscl::reconstruct_face;
use crate::schemes::roe::RoeFlux;
use crate::schemes::viscous::{viscous_flux, FaceGradients};
use crate::state::{ConservedState, EqnVec, PrimitiveState, EQ_SDR, EQ_TKE};
use crate::thermo::Thermodynamics;
use crate::turbulence::{self, TurbulenceModel};
use ae_config::WallTreatment;
use glam::{DMat3, DVec3};

/// 默认幽灵宽度（二阶重构）
pub const DEFAULT_GHOSTS: usize = 2;

/// 无黏性壁时的壁距哨兵值
pub const FAR_WALL_DIST: f64 = 1.0e10;

/// RHS 装配上下文
///
/// 引擎每个非线性迭代构造一次，逐块传入。
#[derive(Debug, Clone, Copy)]
pub struct RhsContext<'a> {
    /// 热力学对象
    pub thermo: &'a Thermodynamics,
    /// 湍流模型
    pub turb: &'a TurbulenceModel,
    /// Roe 通量
    pub roe: RoeFlux,
    /// 斜率限制器
    pub limiter: SlopeLimiter,
    /// 是否计算黏性通量
    pub viscous: bool,
}

/// RHS 装配统计
#[derive(Debug, Clone, Copy, Default)]
pub struct RhsStats {
    /// 一阶修复的面数（诊断）
    pub repaired_faces: usize,
    /// 块内最大界面波速
    pub max_wave_speed: f64,
}

/// 单 rank 结构化块
#[derive(Debug, Clone)]
pub struct ProcBlock {
    /// 稳定块号
    pub(crate) block_id: usize,
    /// 父块号（拆分前的全局位置标记）
    pub(crate) parent_id: usize,
    /// 输出用全局位置
    pub(crate) global_pos: usize,
    /// 所属 rank
    pub(crate) rank: usize,

    pub(crate) geom: BlockGeometry,
    pub(crate) bcs: BlockBoundaryConditions,

    /// 原始状态（含幽灵层）
    pub(crate) state: Array3D<PrimitiveState>,
    /// 守恒状态（含幽灵层）
    pub(crate) cons: Array3D<ConservedState>,
    /// 梯度（内部，scratch）
    pub(crate) grads: GradientSet,
    /// 残差（内部，scratch）
    pub(crate) residual: Array3D<EqnVec>,
    /// 局部时间步（内部）
    pub(crate) dt: Array3D<f64>,
    /// 涡黏（含幽灵层，幽灵取镜像内部值）
    pub(crate) eddy_visc: Array3D<f64>,
    /// 壁面距离（含幽灵层）
    pub(crate) wall_dist: Array3D<f64>,
    /// 步长拒绝的局部 CFL 折减因子（内部）
    pub(crate) cfl_scale: Array3D<f64>,
    /// 逐方向谱半径（内部，LU-SGS 对角与邻居耦合用）
    pub(crate) spectral_radius: Array3D<DVec3>,
}

impl ProcBlock {
    /// 由节点网格与 BC 列表创建
    pub fn new(
        grid: &GridBlock,
        bcs: BlockBoundaryConditions,
        block_id: usize,
    ) -> SolverResult<Self> {
        let geom = BlockGeometry::from_grid(grid, DEFAULT_GHOSTS)?;
        let (ni, nj, nk) = geom.num_cells();
        bcs.check_coverage(ni, nj, nk)?;
        let g = DEFAULT_GHOSTS;

        Ok(Self {
            block_id,
            parent_id: block_id,
            global_pos: block_id,
            rank: 0,
            geom,
            bcs,
            state: Array3D::new(ni, nj, nk, g),
            cons: Array3D::new(ni, nj, nk, g),
            grads: GradientSet::new(ni, nj, nk),
            residual: Array3D::new(ni, nj, nk, 0),
            dt: Array3D::new(ni, nj, nk, 0),
            eddy_visc: Array3D::new(ni, nj, nk, g),
            wall_dist: Array3D::filled(ni, nj, nk, g, FAR_WALL_DIST),
            cfl_scale: Array3D::filled(ni, nj, nk, 0, 1.0),
            spectral_radius: Array3D::new(ni, nj, nk, 0),
        })
    }

    // --------------------------------------------------------
    // 访问器
    // --------------------------------------------------------

    /// 稳定块号
    #[must_use]
    pub fn id(&self) -> usize {
        self.block_id
    }

    /// 所属 rank
    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// 设置 rank
    pub fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }

    /// 输出用全局位置
    #[must_use]
    pub fn global_pos(&self) -> usize {
        self.global_pos
    }

    /// 内部单元数
    #[must_use]
    pub fn num_cells(&self) -> (usize, usize, usize) {
        self.geom.num_cells()
    }

    /// 内部单元总数
    #[must_use]
    pub fn num_interior(&self) -> usize {
        let (ni, nj, nk) = self.num_cells();
        ni * nj * nk
    }

    /// 幽灵宽度
    #[must_use]
    pub fn ghosts(&self) -> usize {
        self.geom.ghosts()
    }

    /// 几何
    #[must_use]
    pub fn geometry(&self) -> &BlockGeometry {
        &self.geom
    }

    /// BC 列表
    #[must_use]
    pub fn boundary_conditions(&self) -> &BlockBoundaryConditions {
        &self.bcs
    }

    /// 内部单元原始状态（内部相对索引）
    #[must_use]
    pub fn state_at(&self, i: usize, j: usize, k: usize) -> &PrimitiveState {
        let g = self.ghosts();
        &self.state[(i + g, j + g, k + g)]
    }

    /// 内部单元残差
    #[must_use]
    pub fn residual_at(&self, i: usize, j: usize, k: usize) -> &EqnVec {
        &self.residual[(i, j, k)]
    }

    /// 内部单元局部 Δt
    #[must_use]
    pub fn dt_at(&self, i: usize, j: usize, k: usize) -> f64 {
        self.dt[(i, j, k)]
    }

    /// 内部单元壁距
    #[must_use]
    pub fn wall_dist_at(&self, i: usize, j: usize, k: usize) -> f64 {
        let g = self.ghosts();
        self.wall_dist[(i + g, j + g, k + g)]
    }

    /// 内部单元涡黏
    #[must_use]
    pub fn eddy_viscosity_at(&self, i: usize, j: usize, k: usize) -> f64 {
        let g = self.ghosts();
        self.eddy_visc[(i + g, j + g, k + g)]
    }

    /// 内部单元速度梯度
    #[must_use]
    pub fn vel_grad_at(&self, i: usize, j: usize, k: usize) -> &DMat3 {
        &self.grads.vel[(i, j, k)]
    }

    /// 梯度集合
    #[must_use]
    pub fn gradients(&self) -> &GradientSet {
        &self.grads
    }

    /// 原始状态数组（含幽灵层，物理索引）
    #[must_use]
    pub fn state(&self) -> &Array3D<PrimitiveState> {
        &self.state
    }

    /// 写入内部单元状态（初始条件用，内部相对索引）
    pub fn set_state(
        &mut self,
        i: usize,
        j: usize,
        k: usize,
        q: PrimitiveState,
        thermo: &Thermodynamics,
    ) {
        let g = self.ghosts();
        let cell = (i + g, j + g, k + g);
        self.state[cell] = q;
        self.cons[cell] = q.to_conserved(&thermo.gas);
    }

    /// 写入幽灵单元状态（交换层用，物理索引）
    pub(crate) fn set_ghost_state(
        &mut self,
        cell: (usize, usize, usize),
        q: PrimitiveState,
        thermo: &Thermodynamics,
    ) {
        self.state[cell] = q;
        self.cons[cell] = q.to_conserved(&thermo.gas);
    }

    #[cfg(test)]
    pub(crate) fn set_residual_for_test(&mut self, i: usize, j: usize, k: usize, r: EqnVec) {
        self.residual[(i, j, k)] = r;
    }

    #[cfg(test)]
    pub(crate) fn set_block_id_for_test(&mut self, id: usize) {
        self.block_id = id;
    }

    // --------------------------------------------------------
    // 初始化
    // --------------------------------------------------------

    /// 全场（含幽灵层）置为给定状态
    pub fn initialize(&mut self, q: &PrimitiveState, thermo: &Thermodynamics) {
        self.state.fill(*q);
        self.cons.fill(q.to_conserved(&thermo.gas));
    }

    /// 从守恒量同步原始量（全场）
    pub fn sync_primitive(&mut self, thermo: &Thermodynamics) {
        for k in 0..self.state.nkt() {
            for j in 0..self.state.njt() {
                for i in 0..self.state.nit() {
                    self.state[(i, j, k)] = self.cons[(i, j, k)].to_primitive(&thermo.gas);
                }
            }
        }
    }

    /// 从原始量同步守恒量（全场）
    pub fn sync_conserved(&mut self, thermo: &Thermodynamics) {
        for k in 0..self.state.nkt() {
            for j in 0..self.state.njt() {
                for i in 0..self.state.nit() {
                    self.cons[(i, j, k)] = self.state[(i, j, k)].to_conserved(&thermo.gas);
                }
            }
        }
    }

    // --------------------------------------------------------
    // 幽灵填充（本地 BC 部分）
    // --------------------------------------------------------

    /// 表面外法向单位向量（(a, b) 为面内坐标）
    fn surface_normal(&self, surf_dir: usize, is_lower: bool, face: usize, a: usize, b: usize) -> DVec3 {
        let area = match surf_dir {
            0 => self.geom.fa_i[(face, a, b)],
            1 => self.geom.fa_j[(b, face, a)],
            _ => self.geom.fa_k[(a, b, face)],
        };
        let n = area.normalize();
        if is_lower {
            -n
        } else {
            n
        }
    }

    /// 面内坐标 (a, b) + 沿法向第 l 层 → 物理单元索引
    ///
    /// `inward` 为 true 取内部镜像层，false 取幽灵层。
    fn layered_cell(
        &self,
        surf_dir: usize,
        is_lower: bool,
        a: usize,
        b: usize,
        l: usize,
        inward: bool,
    ) -> (usize, usize, usize) {
        let g = self.ghosts();
        let (ni, nj, nk) = self.num_cells();
        let n_axis = [ni, nj, nk][surf_dir];
        let axis_idx = match (is_lower, inward) {
            (true, true) => g + l,
            (true, false) => g - 1 - l,
            (false, true) => g + n_axis - 1 - l,
            (false, false) => g + n_axis + l,
        };
        match surf_dir {
            0 => (axis_idx, a + g, b + g),
            1 => (b + g, axis_idx, a + g),
            _ => (a + g, b + g, axis_idx),
        }
    }

    /// 填充非连接类边界的幽灵状态（不变量 5 的本地部分）
    ///
    /// 黏性壁 + 壁面律时按表面平均 y⁺ 更新迟滞状态。
    pub fn fill_ghosts(&mut self, ctx: &GhostContext<'_>) {
        let g = self.ghosts();
        let mut bcs = std::mem::take(&mut self.bcs);

        for surf in bcs.surfaces_mut() {
            if surf.kind.is_connection() {
                continue;
            }
            let dir = surf.direction();
            let lower = surf.is_lower();
            let face = surf.face_index();
            let (a0, a1) = surf.d1_range();
            let (b0, b1) = surf.d2_range();

            // 壁面律迟滞：按表面平均 y⁺ 决定本次填充的模式
            if surf.kind.is_viscous_wall() && ctx.wall_treatment == WallTreatment::WallLaw {
                let mut y_plus_sum = 0.0;
                let mut count = 0usize;
                for b in b0..b1 {
                    for a in a0..a1 {
                        let cell = self.layered_cell(dir, lower, a, b, 0, true);
                        let q = self.state[cell];
                        let n = self.surface_normal(dir, lower, face, a, b);
                        let vel = q.velocity();
                        let u_par = (vel - vel.dot(n) * n).length();
                        let d = self.wall_dist[cell];
                        let mu = ctx.thermo.sutherland.viscosity(q.temperature(&ctx.thermo.gas));
                        let (_, y_plus) =
                            turbulence::wall_shear_velocity(u_par, d, q.rho, mu, ctx.thermo);
                        y_plus_sum += y_plus;
                        count += 1;
                    }
                }
                let y_plus_avg = if count > 0 { y_plus_sum / count as f64 } else { 0.0 };
                surf.wall_law_active = turbulence::wall_law_switch(y_plus_avg, surf.wall_law_active);
            }

            for b in b0..b1 {
                for a in a0..a1 {
                    let n = self.surface_normal(dir, lower, face, a, b);
                    let first_cell = self.layered_cell(dir, lower, a, b, 0, true);
                    let d_wall = self.wall_dist[first_cell];

                    for l in 0..g {
                        let interior = self.layered_cell(dir, lower, a, b, l, true);
                        let ghost = self.layered_cell(dir, lower, a, b, l, false);
                        let q_int = self.state[interior];
                        let q_ghost = ghost_state(
                            surf.kind,
                            &q_int,
                            n,
                            d_wall,
                            surf.wall_law_active,
                            ctx,
                        );
                        self.state[ghost] = q_ghost;
                        self.cons[ghost] = q_ghost.to_conserved(&ctx.thermo.gas);
                    }
                }
            }
        }

        self.bcs = bcs;
    }

    // --------------------------------------------------------
    // 梯度与涡黏
    // --------------------------------------------------------

    /// Green-Gauss 梯度重算
    pub fn compute_gradients(&mut self, thermo: &Thermodynamics) {
        self.grads.compute(&self.geom, &self.state, &thermo.gas);
    }

    /// 内部涡黏重算，幽灵层取镜像内部值
    pub fn compute_eddy_viscosity(&mut self, turb: &TurbulenceModel, thermo: &Thermodynamics) {
        let (ni, nj, nk) = self.num_cells();
        let g = self.ghosts();
        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    let p = (i + g, j + g, k + g);
                    self.eddy_visc[p] = turb.eddy_viscosity(
                        &self.state[p],
                        &self.grads.vel[(i, j, k)],
                        self.wall_dist[p],
                        self.geom.volume[p],
                        thermo,
                    );
                }
            }
        }
        self.mirror_scalar_ghosts();
    }

    /// 涡黏幽灵镜像
    fn mirror_scalar_ghosts(&mut self) {
        mirror_ghosts_scalar(&mut self.eddy_visc);
    }

    /// 壁距幽灵镜像（壁距预计算后调用一次）
    pub fn mirror_wall_dist_ghosts(&mut self) {
        mirror_ghosts_scalar(&mut self.wall_dist);
    }

    /// 写入内部单元壁距（内部相对索引）
    pub fn set_wall_dist(&mut self, i: usize, j: usize, k: usize, d: f64) {
        let g = self.ghosts();
        self.wall_dist[(i + g, j + g, k + g)] = d;
    }

    // --------------------------------------------------------
    // RHS 装配
    // --------------------------------------------------------

    /// 内部相对索引的梯度（越界即幽灵侧时夹取到邻近内部单元）
    fn face_side_grads(&self, i: isize, j: isize, k: isize) -> FaceGradients {
        let (ni, nj, nk) = self.num_cells();
        let ci = i.clamp(0, ni as isize - 1) as usize;
        let cj = j.clamp(0, nj as isize - 1) as usize;
        let ck = k.clamp(0, nk as isize - 1) as usize;
        FaceGradients {
            vel: self.grads.vel[(ci, cj, ck)],
            temp: self.grads.temp[(ci, cj, ck)],
            tke: self.grads.tke[(ci, cj, ck)],
            sdr: self.grads.sdr[(ci, cj, ck)],
        }
    }

    /// 装配残差：无黏 + 黏性面通量与源项
    ///
    /// 幽灵状态须与迭代起始的内部状态一致（由引擎的交换序保证）。
    pub fn assemble_rhs(&mut self, ctx: &RhsContext<'_>) -> SolverResult<RhsStats> {
        let (ni, nj, nk) = self.num_cells();
        let g = self.ghosts();
        let mut stats = RhsStats::default();

        self.residual.fill(EqnVec::ZERO);

        // 三个方向的面扫掠；f 为面索引，左单元 f-1、右单元 f。
        // 边界面由幽灵状态参与重构，循环体内无面位置分支。
        for dir in 0..3usize {
            let (n_axis, n1, n2) = match dir {
                0 => (ni, nj, nk),
                1 => (nj, nk, ni),
                _ => (nk, ni, nj),
            };

            for b in 0..n2 {
                for a in 0..n1 {
                    for f in 0..=n_axis {
                        // 面两侧单元的物理索引（左 = f-1，右 = f，内部相对）
                        let cell_phys = |off: isize| -> (usize, usize, usize) {
                            let ax = (g as isize + f as isize + off) as usize;
                            match dir {
                                0 => (ax, a + g, b + g),
                                1 => (b + g, ax, a + g),
                                _ => (a + g, b + g, ax),
                            }
                        };
                        let (c_ll, c_l, c_r, c_rr) =
                            (cell_phys(-2), cell_phys(-1), cell_phys(0), cell_phys(1));

                        let area = match dir {
                            0 => self.geom.fa_i[(f, a, b)],
                            1 => self.geom.fa_j[(b, f, a)],
                            _ => self.geom.fa_k[(a, b, f)],
                        };

                        let face = reconstruct_face(
                            &self.state[c_ll],
                            &self.state[c_l],
                            &self.state[c_r],
                            &self.state[c_rr],
                            ctx.limiter,
                        )
                        .ok_or_else(|| {
                            SolverError::from(NumericalError::ReconstructionFailure {
                                block: self.block_id,
                                dir,
                                i: f,
                                j: a,
                                k: b,
                            })
                        })?;
                        if face.repaired {
                            stats.repaired_faces += 1;
                        }

                        let inv = ctx.roe.compute(&face.left, &face.right, area);
                        stats.max_wave_speed = stats.max_wave_speed.max(inv.max_wave_speed);
                        let mut flux = inv.flux;

                        if ctx.viscous {
                            // 面梯度：两侧内部单元梯度平均（边界面取内侧）
                            let rel = |c: (usize, usize, usize)| {
                                (
                                    c.0 as isize - g as isize,
                                    c.1 as isize - g as isize,
                                    c.2 as isize - g as isize,
                                )
                            };
                            let (li, lj, lk) = rel(c_l);
                            let (ri, rj, rk) = rel(c_r);
                            let gl = self.face_side_grads(li, lj, lk);
                            let gr = self.face_side_grads(ri, rj, rk);
                            let gavg = FaceGradients::average(&gl, &gr);

                            let q_l = self.state[c_l];
                            let q_r = self.state[c_r];
                            let dist = self.geom.center[c_r] - self.geom.center[c_l];
                            let mu_t =
                                0.5 * (self.eddy_visc[c_l] + self.eddy_visc[c_r]);
                            let d_wall =
                                0.5 * (self.wall_dist[c_l] + self.wall_dist[c_r]);
                            let q_face = PrimitiveState::from_vec(
                                &((q_l.to_vec() + q_r.to_vec()) * 0.5),
                            );
                            let diff = ctx.turb.diffusion(
                                &q_face,
                                gavg.tke,
                                gavg.sdr,
                                d_wall,
                                ctx.thermo,
                            );
                            flux -= viscous_flux(
                                &q_l, &q_r, &gavg, dist, area, mu_t, &diff, ctx.thermo,
                            );
                        }

                        // 累加：面通量以相反符号进入两侧单元（通量守恒）
                        let int_rel = |c: (usize, usize, usize)| {
                            (c.0 - g, c.1 - g, c.2 - g)
                        };
                        if f > 0 {
                            let l = int_rel(c_l);
                            self.residual[l] += flux;
                        }
                        if f < n_axis {
                            let r = int_rel(c_r);
                            self.residual[r] -= flux;
                        }
                    }
                }
            }
        }

        // 源项：湍流产生/耗散
        if ctx.turb.has_transport() {
            for k in 0..nk {
                for j in 0..nj {
                    for i in 0..ni {
                        let p = (i + g, j + g, k + g);
                        let vol = self.geom.volume[p];
                        let src = ctx.turb.source_terms(
                            &self.state[p],
                            &self.grads.vel[(i, j, k)],
                            self.grads.tke[(i, j, k)],
                            self.grads.sdr[(i, j, k)],
                            self.wall_dist[p],
                            vol,
                            ctx.thermo,
                        );
                        self.residual[(i, j, k)][EQ_TKE] -= vol * src.tke;
                        self.residual[(i, j, k)][EQ_SDR] -= vol * src.sdr;
                    }
                }
            }
        }

        Ok(stats)
    }

    // --------------------------------------------------------
    // 时间步
    // --------------------------------------------------------

    /// 单元方向平均投影面积
    fn avg_face_area(&self, dir: usize, i: usize, j: usize, k: usize) -> DVec3 {
        match dir {
            0 => 0.5 * (self.geom.fa_i[(i, j, k)] + self.geom.fa_i[(i + 1, j, k)]),
            1 => 0.5 * (self.geom.fa_j[(i, j, k)] + self.geom.fa_j[(i, j + 1, k)]),
            _ => 0.5 * (self.geom.fa_k[(i, j, k)] + self.geom.fa_k[(i, j, k + 1)]),
        }
    }

    /// 谱半径估计的局部时间步
    ///
    /// Δt_c = CFL·s_c·V_c / (Σ_d (|u·Â|+a)|A_d| + 2(μ+μ_t)|A_d|²/(ρV_c))
    ///
    /// `s_c` 为步长拒绝的局部折减因子。同时缓存谱半径供隐式
    /// 对角项使用。
    pub fn local_timestep(&mut self, cfl: f64, thermo: &Thermodynamics, viscous: bool) {
        let (ni, nj, nk) = self.num_cells();
        let g = self.ghosts();

        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    let p = (i + g, j + g, k + g);
                    let q = &self.state[p];
                    let vol = self.geom.volume[p];
                    let a = q.sound_speed(&thermo.gas);

                    let mut radii = DVec3::ZERO;
                    for dir in 0..3 {
                        let area = self.avg_face_area(dir, i, j, k);
                        let a_mag = area.length();
                        if a_mag < 1.0e-300 {
                            continue;
                        }
                        let n = area / a_mag;
                        let mut r = (q.velocity().dot(n).abs() + a) * a_mag;
                        if viscous {
                            let mu = thermo.sutherland.viscosity(q.temperature(&thermo.gas));
                            let mu_eff = (mu + self.eddy_visc[p]) * thermo.inv_re;
                            r += 2.0 * mu_eff * a_mag * a_mag / (q.rho * vol);
                        }
                        radii[dir] = r;
                    }

                    self.spectral_radius[(i, j, k)] = radii;
                    let radius = radii.x + radii.y + radii.z;
                    self.dt[(i, j, k)] = cfl * self.cfl_scale[(i, j, k)] * vol / radius;
                }
            }
        }
    }

    /// 全块最小 Δt（全局时间步进模式）
    #[must_use]
    pub fn min_dt(&self) -> f64 {
        let (ni, nj, nk) = self.num_cells();
        let mut min = f64::MAX;
        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    min = min.min(self.dt[(i, j, k)]);
                }
            }
        }
        min
    }

    /// 统一设置 Δt（固定 Δt 或全局时间步进）
    pub fn set_uniform_dt(&mut self, dt: f64) {
        self.dt.fill(dt);
    }

    // --------------------------------------------------------
    // 显式更新
    // --------------------------------------------------------

    /// 单级 Runge-Kutta 更新：U = U⁰ − α Δt/V · R
    ///
    /// 违反正性（不变量 2）返回 [`NumericalError::NonPositiveState`]，
    /// 由积分器转化为步长拒绝。
    pub fn rk_stage(
        &mut self,
        cons0: &Array3D<ConservedState>,
        alpha: f64,
        thermo: &Thermodynamics,
    ) -> SolverResult<()> {
        let (ni, nj, nk) = self.num_cells();
        let g = self.ghosts();

        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    let p = (i + g, j + g, k + g);
                    let vol = self.geom.volume[p];
                    let delta =
                        self.residual[(i, j, k)] * (-alpha * self.dt[(i, j, k)] / vol);
                    let updated = cons0[p].applied(&delta);
                    let prim = updated.to_primitive(&thermo.gas);
                    if !prim.is_physical() {
                        return Err(NumericalError::NonPositiveState {
                            block: self.block_id,
                            i,
                            j,
                            k,
                            rho: prim.rho,
                            p: prim.p,
                        }
                        .into());
                    }
                    // 湍流量截断后重建守恒量，保持 U↔P 一致（不变量 1）
                    let prim = clamp_turbulence(prim);
                    self.cons[p] = prim.to_conserved(&thermo.gas);
                    self.state[p] = prim;
                }
            }
        }
        Ok(())
    }

    /// 守恒状态数组快照（步长拒绝与最后完好解转储用）
    #[must_use]
    pub fn snapshot(&self) -> Array3D<ConservedState> {
        self.cons.clone()
    }

    /// 从快照恢复
    pub fn restore(&mut self, snap: &Array3D<ConservedState>, thermo: &Thermodynamics) {
        self.cons = snap.clone();
        self.sync_primitive(thermo);
    }

    /// 局部 CFL 折减（步长拒绝路径）
    pub fn halve_cfl_at(&mut self, i: usize, j: usize, k: usize) {
        self.cfl_scale[(i, j, k)] *= 0.5;
    }

    /// 接受步后缓慢恢复局部 CFL 折减因子
    pub fn relax_cfl_scale(&mut self) {
        let (ni, nj, nk) = self.num_cells();
        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    let s = self.cfl_scale[(i, j, k)];
                    if s < 1.0 {
                        self.cfl_scale[(i, j, k)] = (s * 2.0).min(1.0);
                    }
                }
            }
        }
    }

    // --------------------------------------------------------
    // 拆分 / 合并
    // --------------------------------------------------------

    /// 沿轴在单元索引 `index` 处拆分为（下，上）两块
    ///
    /// 上子块获得新块号 `upper_id`；接缝幽灵几何与状态直接取自
    /// 母块相邻内部单元（点匹配拆分下精确）。
    #[must_use]
    pub fn split(&self, axis: usize, index: usize, upper_id: usize) -> (Self, Self) {
        let (ni, nj, nk) = self.num_cells();
        let n_axis = [ni, nj, nk][axis];

        let (bcs_lower, bcs_upper) =
            self.bcs
                .split(axis, index, n_axis, upper_id, self.block_id);

        let lower = self.slice_along(axis, 0, index, self.block_id, bcs_lower);
        let upper = self.slice_along(axis, index, n_axis, upper_id, bcs_upper);
        (lower, upper)
    }

    /// 截取沿轴 [lo, hi) 的子块
    fn slice_along(
        &self,
        axis: usize,
        lo: usize,
        hi: usize,
        id: usize,
        bcs: BlockBoundaryConditions,
    ) -> Self {
        let (ni, nj, nk) = self.num_cells();
        let g = self.ghosts();
        let dims = |n_axis: usize| -> (usize, usize, usize) {
            match axis {
                0 => (n_axis, nj, nk),
                1 => (ni, n_axis, nk),
                _ => (ni, nj, n_axis),
            }
        };
        let (sni, snj, snk) = dims(hi - lo);

        let slice_ghosted = |src: &Array3D<PrimitiveState>| -> Array3D<PrimitiveState> {
            slice_ghosted_generic(src, axis, lo, hi, g)
        };

        let geom = slice_geometry(&self.geom, axis, lo, hi);

        Self {
            block_id: id,
            parent_id: self.parent_id,
            global_pos: self.global_pos,
            rank: self.rank,
            geom,
            bcs,
            state: slice_ghosted(&self.state),
            cons: slice_ghosted_generic(&self.cons, axis, lo, hi, g),
            grads: GradientSet::new(sni, snj, snk),
            residual: Array3D::new(sni, snj, snk, 0),
            dt: Array3D::new(sni, snj, snk, 0),
            eddy_visc: slice_ghosted_generic(&self.eddy_visc, axis, lo, hi, g),
            wall_dist: slice_ghosted_generic(&self.wall_dist, axis, lo, hi, g),
            cfl_scale: Array3D::filled(sni, snj, snk, 0, 1.0),
            spectral_radius: Array3D::new(sni, snj, snk, 0),
        }
    }

    /// 与上子块合并（拆分的逆操作，Recombine 用）
    ///
    /// BC 出处保留：两侧表面列表重映射合并，接缝剔除。
    #[must_use]
    pub fn join(&self, other: &Self, axis: usize) -> Self {
        let (ni, nj, nk) = self.num_cells();
        let lower_n = [ni, nj, nk][axis];
        let (oni, onj, onk) = other.num_cells();
        let other_n = [oni, onj, onk][axis];
        let g = self.ghosts();

        let bcs = self.bcs.join(
            &other.bcs,
            axis,
            lower_n,
            other_n,
            self.block_id,
            other.block_id,
        );

        let dims = |n_axis: usize| -> (usize, usize, usize) {
            match axis {
                0 => (n_axis, nj, nk),
                1 => (ni, n_axis, nk),
                _ => (ni, nj, n_axis),
            }
        };
        let (jni, jnj, jnk) = dims(lower_n + other_n);

        Self {
            block_id: self.block_id,
            parent_id: self.parent_id,
            global_pos: self.global_pos,
            rank: self.rank,
            geom: join_geometry(&self.geom, &other.geom, axis),
            bcs,
            state: concat_ghosted(&self.state, &other.state, axis, g),
            cons: concat_ghosted(&self.cons, &other.cons, axis, g),
            grads: GradientSet::new(jni, jnj, jnk),
            residual: concat_interior(&self.residual, &other.residual, axis),
            dt: concat_interior(&self.dt, &other.dt, axis),
            eddy_visc: concat_ghosted(&self.eddy_visc, &other.eddy_visc, axis, g),
            wall_dist: concat_ghosted(&self.wall_dist, &other.wall_dist, axis, g),
            cfl_scale: concat_interior(&self.cfl_scale, &other.cfl_scale, axis),
            spectral_radius: Array3D::new(jni, jnj, jnk, 0),
        }
    }
}

/// 标量幽灵层面镜像填充
pub(crate) fn mirror_ghosts_scalar(arr: &mut Array3D<f64>) {
    let (ni, nj, nk) = (arr.ni(), arr.nj(), arr.nk());
    let g = arr.ghosts();
    for k in 0..nk {
        for j in 0..nj {
            for l in 0..g {
                arr[(g - 1 - l, j + g, k + g)] = arr[(g + l, j + g, k + g)];
                arr[(g + ni + l, j + g, k + g)] = arr[(g + ni - 1 - l, j + g, k + g)];
            }
        }
    }
    for k in 0..nk {
        for i in 0..ni {
            for l in 0..g {
                arr[(i + g, g - 1 - l, k + g)] = arr[(i + g, g + l, k + g)];
                arr[(i + g, g + nj + l, k + g)] = arr[(i + g, g + nj - 1 - l, k + g)];
            }
        }
    }
    for j in 0..nj {
        for i in 0..ni {
            for l in 0..g {
                arr[(i + g, j + g, g - 1 - l)] = arr[(i + g, j + g, g + l)];
                arr[(i + g, j + g, g + nk + l)] = arr[(i + g, j + g, g + nk - 1 - l)];
            }
        }
    }
}

/// 湍流量下限保护（非物理小负值截断）
fn clamp_turbulence(mut q: PrimitiveState) -> PrimitiveState {
    if q.tke < 0.0 {
        q.tke = 0.0;
    }
    if q.sdr < 0.0 {
        q.sdr = 1.0e-20;
    }
    q
}

// ============================================================
// 数组切片/拼接辅助
// ============================================================

/// 幽灵数组沿轴切片：[lo, hi) 内部单元 + 两侧 g 层边缘
///
/// 边缘取自母数组（内侧切割处即邻块内部单元，点匹配精确）。
fn slice_ghosted_generic<T: Clone + Default>(
    src: &Array3D<T>,
    axis: usize,
    lo: usize,
    hi: usize,
    g: usize,
) -> Array3D<T> {
    let (ni, nj, nk) = (src.ni(), src.nj(), src.nk());
    let (dni, dnj, dnk) = match axis {
        0 => (hi - lo, nj, nk),
        1 => (ni, hi - lo, nk),
        _ => (ni, nj, hi - lo),
    };
    let mut out = Array3D::<T>::new(dni, dnj, dnk, g);
    for k in 0..out.nkt() {
        for j in 0..out.njt() {
            for i in 0..out.nit() {
                let srcp = match axis {
                    0 => (i + lo, j, k),
                    1 => (i, j + lo, k),
                    _ => (i, j, k + lo),
                };
                out[(i, j, k)] = src[srcp].clone();
            }
        }
    }
    out
}

/// 幽灵数组沿轴拼接：下块去掉上侧幽灵 + 上块去掉下侧幽灵
fn concat_ghosted<T: Clone + Default>(
    lower: &Array3D<T>,
    upper: &Array3D<T>,
    axis: usize,
    g: usize,
) -> Array3D<T> {
    let (lni, lnj, lnk) = (lower.ni(), lower.nj(), lower.nk());
    let n_lower = [lni, lnj, lnk][axis];
    let n_upper = [upper.ni(), upper.nj(), upper.nk()][axis];
    let (dni, dnj, dnk) = match axis {
        0 => (lni + upper.ni(), lnj, lnk),
        1 => (lni, lnj + upper.nj(), lnk),
        _ => (lni, lnj, lnk + upper.nk()),
    };
    let mut out = Array3D::<T>::new(dni, dnj, dnk, g);
    let split_at = g + n_lower;
    for k in 0..out.nkt() {
        for j in 0..out.njt() {
            for i in 0..out.nit() {
                let ax = [i, j, k][axis];
                let v = if ax < split_at {
                    lower[(i, j, k)].clone()
                } else {
                    let up = ax - n_lower;
                    debug_assert!(up < n_upper + 2 * g);
                    match axis {
                        0 => upper[(up, j, k)].clone(),
                        1 => upper[(i, up, k)].clone(),
                        _ => upper[(i, j, up)].clone(),
                    }
                };
                out[(i, j, k)] = v;
            }
        }
    }
    out
}

/// 内部数组（无幽灵）沿轴拼接
fn concat_interior<T: Clone + Default>(
    lower: &Array3D<T>,
    upper: &Array3D<T>,
    axis: usize,
) -> Array3D<T> {
    concat_ghosted(lower, upper, axis, 0)
}

/// 面数组沿轴切片/拼接的几何处理
fn slice_geometry(geom: &BlockGeometry, axis: usize, lo: usize, hi: usize) -> BlockGeometry {
    let (ni, nj, nk) = geom.num_cells();
    let g = geom.ghosts();
    let n = hi - lo;
    let (dni, dnj, dnk) = match axis {
        0 => (n, nj, nk),
        1 => (ni, n, nk),
        _ => (ni, nj, n),
    };

    // 面数组：法向与轴一致时取 [lo, hi]，切向取单元区间
    let slice_face = |src: &Array3D<DVec3>, face_dir: usize| -> Array3D<DVec3> {
        let (flo, fhi) = if face_dir == axis { (lo, hi + 1) } else { (lo, hi) };
        let (sni, snj, snk) = (src.ni(), src.nj(), src.nk());
        let (oni, onj, onk) = match axis {
            0 => (fhi - flo, snj, snk),
            1 => (sni, fhi - flo, snk),
            _ => (sni, snj, fhi - flo),
        };
        let mut out = Array3D::<DVec3>::new(oni, onj, onk, 0);
        for k in 0..onk {
            for j in 0..onj {
                for i in 0..oni {
                    let srcp = match axis {
                        0 => (i + flo, j, k),
                        1 => (i, j + flo, k),
                        _ => (i, j, k + flo),
                    };
                    out[(i, j, k)] = src[srcp];
                }
            }
        }
        out
    };

    BlockGeometry::from_parts(
        dni,
        dnj,
        dnk,
        g,
        slice_ghosted_generic(&geom.center, axis, lo, hi, g),
        slice_ghosted_generic(&geom.volume, axis, lo, hi, g),
        [
            slice_face(&geom.fa_i, 0),
            slice_face(&geom.fa_j, 1),
            slice_face(&geom.fa_k, 2),
        ],
        [
            slice_face(&geom.fc_i, 0),
            slice_face(&geom.fc_j, 1),
            slice_face(&geom.fc_k, 2),
        ],
    )
}

/// 几何沿轴拼接
fn join_geometry(lower: &BlockGeometry, upper: &BlockGeometry, axis: usize) -> BlockGeometry {
    let g = lower.ghosts();
    let (lni, lnj, lnk) = lower.num_cells();
    let (uni, unj, unk) = upper.num_cells();
    let (dni, dnj, dnk) = match axis {
        0 => (lni + uni, lnj, lnk),
        1 => (lni, lnj + unj, lnk),
        _ => (lni, lnj, lnk + unk),
    };

    let join_face = |a: &Array3D<DVec3>, b: &Array3D<DVec3>, face_dir: usize| -> Array3D<DVec3> {
        // 法向与轴一致时共享接缝面（上块从 1 起）
        let skip = usize::from(face_dir == axis);
        let (oni, onj, onk) = match axis {
            0 => (a.ni() + b.ni() - skip, a.nj(), a.nk()),
            1 => (a.ni(), a.nj() + b.nj() - skip, a.nk()),
            _ => (a.ni(), a.nj(), a.nk() + b.nk() - skip),
        };
        let mut out = Array3D::<DVec3>::new(oni, onj, onk, 0);
        let a_n = [a.ni(), a.nj(), a.nk()][axis];
        for k in 0..onk {
            for j in 0..onj {
                for i in 0..oni {
                    let ax = [i, j, k][axis];
                    out[(i, j, k)] = if ax < a_n {
                        a[(i, j, k)]
                    } else {
                        let up = ax - a_n + skip;
                        match axis {
                            0 => b[(up, j, k)],
                            1 => b[(i, up, k)],
                            _ => b[(i, j, up)],
                        }
                    };
                }
            }
        }
        out
    };

    BlockGeometry::from_parts(
        dni,
        dnj,
        dnk,
        g,
        concat_ghosted(&lower.center, &upper.center, axis, g),
        concat_ghosted(&lower.volume, &upper.volume, axis, g),
        [
            join_face(&lower.fa_i, &upper.fa_i, 0),
            join_face(&lower.fa_j, &upper.fa_j, 1),
            join_face(&lower.fa_k, &upper.fa_k, 2),
        ],
        [
            join_face(&lower.fc_i, &upper.fc_i, 0),
            join_face(&lower.fc_j, &upper.fc_j, 1),
            join_face(&lower.fc_k, &upper.fc_k, 2),
        ],
    )
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BcKind, BoundarySurface};
    use ae_config::{FluidConfig, ReferenceConfig};

    fn thermo() -> Thermodynamics {
        Thermodynamics::from_config(&FluidConfig::default(), &ReferenceConfig::default())
    }

    fn freestream() -> PrimitiveState {
        PrimitiveState::new(1.0, DVec3::new(0.5, 0.0, 0.0), 1.0 / 1.4)
    }

    fn box_bcs(ni: usize, nj: usize, nk: usize, kind: BcKind) -> BlockBoundaryConditions {
        BlockBoundaryConditions::new(vec![
            BoundarySurface::new(kind, [0, 0, 0, nj, 0, nk], 1).unwrap(),
            BoundarySurface::new(kind, [ni, ni, 0, nj, 0, nk], 2).unwrap(),
            BoundarySurface::new(kind, [0, ni, 0, 0, 0, nk], 3).unwrap(),
            BoundarySurface::new(kind, [0, ni, nj, nj, 0, nk], 4).unwrap(),
            BoundarySurface::new(kind, [0, ni, 0, nj, 0, 0], 5).unwrap(),
            BoundarySurface::new(kind, [0, ni, 0, nj, nk, nk], 6).unwrap(),
        ])
    }

    fn freestream_block(ni: usize, nj: usize, nk: usize) -> ProcBlock {
        let grid = GridBlock::uniform(ni, nj, nk, DVec3::new(ni as f64, nj as f64, nk as f64));
        let mut block =
            ProcBlock::new(&grid, box_bcs(ni, nj, nk, BcKind::Farfield), 0).unwrap();
        block.initialize(&freestream(), &thermo());
        block
    }

    fn rhs_ctx<'a>(thermo: &'a Thermodynamics, turb: &'a TurbulenceModel) -> RhsContext<'a> {
        RhsContext {
            thermo,
            turb,
            roe: RoeFlux::new(thermo.gas, 0.1),
            limiter: SlopeLimiter::VanAlbada,
            viscous: false,
        }
    }

    /// 性质 2 的推论：均匀来流 + 特征远场 → 残差为零（自由流保持）
    #[test]
    fn test_freestream_preservation() {
        let th = thermo();
        let turb = TurbulenceModel::None;
        let mut block = freestream_block(4, 3, 2);

        let gctx = GhostContext {
            thermo: &th,
            turb: &turb,
            freestream: freestream(),
            wall_temp: None,
            wall_treatment: WallTreatment::LowRe,
        };
        block.fill_ghosts(&gctx);
        block.compute_gradients(&th);
        let stats = block.assemble_rhs(&rhs_ctx(&th, &turb)).unwrap();

        assert_eq!(stats.repaired_faces, 0);
        let (ni, nj, nk) = block.num_cells();
        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    let r = block.residual_at(i, j, k);
                    for eq in 0..5 {
                        assert!(
                            r[eq].abs() < 1e-12,
                            "单元({},{},{}) 方程{} 残差 {:.3e}",
                            i,
                            j,
                            k,
                            eq,
                            r[eq]
                        );
                    }
                }
            }
        }
    }

    /// 性质 2：内部单元集合的通量贡献在求和时成对抵消
    #[test]
    fn test_flux_conservation_interior_cancellation() {
        let th = thermo();
        let turb = TurbulenceModel::None;
        let mut block = freestream_block(4, 4, 4);

        // 扰动内部状态，保持幽灵一致性由滑移壁提供
        let g = block.ghosts();
        for k in 0..4 {
            for j in 0..4 {
                for i in 0..4 {
                    let q = PrimitiveState::new(
                        1.0 + 0.05 * ((i + 2 * j + 3 * k) % 5) as f64,
                        DVec3::new(0.3, 0.02 * i as f64, -0.01 * j as f64),
                        1.0 / 1.4 + 0.02 * ((i + k) % 3) as f64,
                    );
                    block.state[(i + g, j + g, k + g)] = q;
                    block.cons[(i + g, j + g, k + g)] = q.to_conserved(&th.gas);
                }
            }
        }
        let gctx = GhostContext {
            thermo: &th,
            turb: &turb,
            freestream: freestream(),
            wall_temp: None,
            wall_treatment: WallTreatment::LowRe,
        };
        block.fill_ghosts(&gctx);
        block.compute_gradients(&th);
        block.assemble_rhs(&rhs_ctx(&th, &turb)).unwrap();

        // 全域残差和 = 边界面净通量；内部面贡献完全抵消。
        // 用独立的边界面通量直和验证（机器精度）。
        let mut total = EqnVec::ZERO;
        for k in 0..4 {
            for j in 0..4 {
                for i in 0..4 {
                    total += *block.residual_at(i, j, k);
                }
            }
        }

        let ctx = rhs_ctx(&th, &turb);
        let mut boundary_sum = EqnVec::ZERO;
        // i 方向边界面
        for k in 0..4 {
            for j in 0..4 {
                for (f, sign) in [(0usize, -1.0), (4usize, 1.0)] {
                    let cell = |off: isize| {
                        ((g as isize + f as isize + off) as usize, j + g, k + g)
                    };
                    let face = reconstruct_face(
                        &block.state[cell(-2)],
                        &block.state[cell(-1)],
                        &block.state[cell(0)],
                        &block.state[cell(1)],
                        ctx.limiter,
                    )
                    .unwrap();
                    let fl = ctx.roe.compute(&face.left, &face.right, block.geom.fa_i[(f, j, k)]);
                    boundary_sum += fl.flux * sign;
                }
            }
        }
        // j 方向边界面
        for k in 0..4 {
            for i in 0..4 {
                for (f, sign) in [(0usize, -1.0), (4usize, 1.0)] {
                    let cell = |off: isize| {
                        (i + g, (g as isize + f as isize + off) as usize, k + g)
                    };
                    let face = reconstruct_face(
                        &block.state[cell(-2)],
                        &block.state[cell(-1)],
                        &block.state[cell(0)],
                        &block.state[cell(1)],
                        ctx.limiter,
                    )
                    .unwrap();
                    let fl = ctx.roe.compute(&face.left, &face.right, block.geom.fa_j[(i, f, k)]);
                    boundary_sum += fl.flux * sign;
                }
            }
        }
        // k 方向边界面
        for j in 0..4 {
            for i in 0..4 {
                for (f, sign) in [(0usize, -1.0), (4usize, 1.0)] {
                    let cell = |off: isize| {
                        (i + g, j + g, (g as isize + f as isize + off) as usize)
                    };
                    let face = reconstruct_face(
                        &block.state[cell(-2)],
                        &block.state[cell(-1)],
                        &block.state[cell(0)],
                        &block.state[cell(1)],
                        ctx.limiter,
                    )
                    .unwrap();
                    let fl = ctx.roe.compute(&face.left, &face.right, block.geom.fa_k[(i, j, f)]);
                    boundary_sum += fl.flux * sign;
                }
            }
        }

        for eq in 0..7 {
            assert!(
                (total[eq] - boundary_sum[eq]).abs() < 1e-11,
                "方程{}: 残差和 {:.3e} ≠ 边界通量和 {:.3e}",
                eq,
                total[eq],
                boundary_sum[eq]
            );
        }
    }

    #[test]
    fn test_local_timestep_positive_and_cfl_linear() {
        let th = thermo();
        let mut block = freestream_block(4, 3, 2);
        block.local_timestep(0.5, &th, false);
        let dt1 = block.dt_at(0, 0, 0);
        assert!(dt1 > 0.0);
        block.local_timestep(1.0, &th, false);
        assert!((block.dt_at(0, 0, 0) - 2.0 * dt1).abs() < 1e-14);
    }

    #[test]
    fn test_rk_stage_rejects_nonpositive() {
        let th = thermo();
        let mut block = freestream_block(2, 2, 2);
        block.local_timestep(0.5, &th, false);

        // 构造会把单元抽空的巨大残差
        block.residual[(0, 0, 0)] = EqnVec([1.0e6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let snap = block.snapshot();
        let err = block.rk_stage(&snap, 1.0, &th).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_split_join_roundtrip_geometry_and_state() {
        // 性质 4：Recombine(Split(M)) == M（几何与状态逐元素相等）
        let th = thermo();
        let mut block = freestream_block(6, 4, 4);
        // 非平凡状态
        let g = block.ghosts();
        for k in 0..4 {
            for j in 0..4 {
                for i in 0..6 {
                    let q = PrimitiveState::new(
                        1.0 + 0.01 * (i + j * 7 + k * 13) as f64,
                        DVec3::new(0.5, 0.01 * j as f64, 0.0),
                        1.0 / 1.4,
                    );
                    block.state[(i + g, j + g, k + g)] = q;
                    block.cons[(i + g, j + g, k + g)] = q.to_conserved(&th.gas);
                }
            }
        }

        for axis in 0..3usize {
            let n_axis = [6usize, 4, 4][axis];
            let cut = n_axis / 2;
            let (lower, upper) = block.split(axis, cut, 1);
            let rejoined = lower.join(&upper, axis);

            assert_eq!(rejoined.num_cells(), block.num_cells());
            // 几何逐元素相等
            for k in 0..block.geom.volume.nkt() {
                for j in 0..block.geom.volume.njt() {
                    for i in 0..block.geom.volume.nit() {
                        assert_eq!(
                            rejoined.geom.volume[(i, j, k)],
                            block.geom.volume[(i, j, k)],
                            "轴{} 体积 ({},{},{})",
                            axis,
                            i,
                            j,
                            k
                        );
                        assert_eq!(rejoined.geom.center[(i, j, k)], block.geom.center[(i, j, k)]);
                    }
                }
            }
            // 内部状态逐元素相等
            for k in 0..4 {
                for j in 0..4 {
                    for i in 0..6 {
                        let (a, b, c) = (i + g, j + g, k + g);
                        assert_eq!(rejoined.state[(a, b, c)], block.state[(a, b, c)]);
                    }
                }
            }
            // BC 覆盖恢复
            let (ni, nj, nk) = block.num_cells();
            assert!(rejoined.bcs.check_coverage(ni, nj, nk).is_ok());
        }
    }

    #[test]
    fn test_split_seam_ghosts_match_neighbor_interior() {
        // 拆分后接缝幽灵 = 邻块内部（点匹配精确复制）
        let th = thermo();
        let mut block = freestream_block(6, 2, 2);
        let g = block.ghosts();
        for i in 0..6 {
            let q = PrimitiveState::new(1.0 + 0.1 * i as f64, DVec3::ZERO, 1.0);
            block.state[(i + g, g, g)] = q;
            block.cons[(i + g, g, g)] = q.to_conserved(&th.gas);
        }
        let (lower, upper) = block.split(0, 3, 1);

        // lower 的上侧幽灵应为母块单元 3, 4
        assert_eq!(lower.state[(g + 3, g, g)].rho, 1.3);
        assert_eq!(lower.state[(g + 4, g, g)].rho, 1.4);
        // upper 的下侧幽灵应为母块单元 2, 1
        assert_eq!(upper.state[(g - 1, g, g)].rho, 1.2);
        assert_eq!(upper.state[(g - 2, g, g)].rho, 1.1);
    }
}
