// crates/ae_io/src/output.rs

//! 解输出与残差日志
//!
//! 输出前把拆分块重组回原始构型（分解逆回放）。三类文件：
//!
//! - 单元中心网格 `<root>_center.xyz`（二进制，按 L 量纲化）
//! - 函数文件 `<root>_<iter>_center.fun`（二进制，逐变量按
//!   各自的量纲化因子缩放）
//! - 结果索引 `<root>_center.res`（ASCII，Ensight 风格）
//!
//! 残差日志（stdout + 文件）每 100 个外层迭代重印表头，
//! 数值为科学计数的归一化 L2 残差，并附 L∞ 定位列。

use crate::error::{IoError, IoResult};
use ae_config::SolverConfig;
use ae_physics::engine::StepReport;
use ae_physics::{
    recombine, split_block_number, Decomposition, ProcBlock, Thermodynamics, EQ_ENERGY, EQ_MASS,
    EQ_MOM_X, EQ_MOM_Y, EQ_MOM_Z, EQ_SDR, EQ_TKE,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

// ============================================================
// 参考量纲
// ============================================================

/// 量纲化参考量
#[derive(Debug, Clone, Copy)]
pub struct ReferenceScales {
    /// 参考密度 [kg/m³]
    pub rho: f64,
    /// 参考声速 [m/s]
    pub a: f64,
    /// 参考温度 [K]
    pub t: f64,
    /// 参考长度 [m]
    pub l: f64,
    /// 参考黏性 [kg/(m·s)]
    pub mu: f64,
}

impl ReferenceScales {
    /// 由输入卡计算
    #[must_use]
    pub fn from_config(config: &SolverConfig) -> Self {
        let t = config.reference.t_ref;
        let a = (config.fluid.gamma * config.fluid.gas_constant * t).sqrt();
        let mu =
            config.fluid.sutherland_c1 * t.powf(1.5) / (t + config.fluid.sutherland_s);
        Self {
            rho: config.reference.rho_ref,
            a,
            t,
            l: config.reference.l_ref,
            mu,
        }
    }

    /// 变量的量纲化因子
    #[must_use]
    pub fn factor(&self, var: &str) -> f64 {
        match var {
            "density" => self.rho,
            "vel_x" | "vel_y" | "vel_z" | "sos" => self.a,
            "pressure" => self.rho * self.a * self.a,
            "dt" => self.l / self.a,
            "temperature" => self.t,
            "tke" => self.a * self.a,
            "sdr" => self.rho * self.a * self.a / self.mu,
            "wallDistance" => self.l,
            v if v.starts_with("velGrad_") => self.a / self.l,
            v if v.starts_with("tempGrad_") => self.t / self.l,
            v if v.starts_with("tkeGrad_") => self.a * self.a / self.l,
            v if v.starts_with("sdrGrad_") => self.rho * self.a * self.a / (self.mu * self.l),
            "resid_mass" => self.rho * self.a * self.l * self.l,
            v if v.starts_with("resid_mom_") => self.rho * self.a * self.a * self.l * self.l,
            "resid_energy" | "resid_tke" => self.rho * self.a.powi(3) * self.l * self.l,
            "resid_sdr" => {
                self.rho * self.rho * self.a.powi(4) * self.l * self.l / self.mu
            }
            // mach、rank、globalPosition、viscosityRatio 无量纲
            _ => 1.0,
        }
    }
}

// ============================================================
// 单元中心网格文件
// ============================================================

/// 写单元中心坐标（PLOT3D 风格二进制）
pub fn write_cell_centers<W: Write>(
    writer: &mut W,
    blocks: &[ProcBlock],
    l_ref: f64,
) -> IoResult<()> {
    writer.write_all(&(blocks.len() as i32).to_le_bytes())?;
    for b in blocks {
        let (ni, nj, nk) = b.num_cells();
        writer.write_all(&(ni as i32).to_le_bytes())?;
        writer.write_all(&(nj as i32).to_le_bytes())?;
        writer.write_all(&(nk as i32).to_le_bytes())?;
    }
    for b in blocks {
        let (ni, nj, nk) = b.num_cells();
        let g = b.ghosts();
        for dim in 0..3 {
            for k in 0..nk {
                for j in 0..nj {
                    for i in 0..ni {
                        let c = b.geometry().center[(i + g, j + g, k + g)] * l_ref;
                        let v = match dim {
                            0 => c.x,
                            1 => c.y,
                            _ => c.z,
                        };
                        writer.write_all(&v.to_le_bytes())?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// 重组并写单元中心网格文件 `<root>_center.xyz`
pub fn write_cell_center_file(
    sim_name: &str,
    blocks: &[ProcBlock],
    decomp: &Decomposition,
    l_ref: f64,
) -> IoResult<PathBuf> {
    let recomb = recombine(blocks, decomp);
    let path = PathBuf::from(format!("{}_center.xyz", sim_name));
    let file = File::create(&path)
        .map_err(|e| IoError::grid_format(format!("网格文件 {} 打开失败: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    write_cell_centers(&mut writer, &recomb, l_ref)?;
    Ok(path)
}

// ============================================================
// 函数文件
// ============================================================

/// 取单个输出变量在重组块一个单元上的无量纲值
fn cell_value(
    var: &str,
    recomb: &[ProcBlock],
    split_blocks: &[ProcBlock],
    decomp: &Decomposition,
    blk: usize,
    i: usize,
    j: usize,
    k: usize,
    thermo: &Thermodynamics,
) -> f64 {
    let b = &recomb[blk];
    let q = b.state_at(i, j, k);
    let gas = &thermo.gas;
    match var {
        "density" => q.rho,
        "vel_x" => q.u,
        "vel_y" => q.v,
        "vel_z" => q.w,
        "pressure" => q.p,
        "mach" => q.velocity().length() / q.sound_speed(gas),
        "sos" => q.sound_speed(gas),
        "dt" => b.dt_at(i, j, k),
        "temperature" => q.temperature(gas),
        "tke" => q.tke,
        "sdr" => q.sdr,
        "wallDistance" => b.wall_dist_at(i, j, k),
        "viscosityRatio" => {
            let mu = thermo.sutherland.viscosity(q.temperature(gas));
            b.eddy_viscosity_at(i, j, k) / mu
        }
        "velGrad_ux" => b.vel_grad_at(i, j, k).col(0).x,
        "velGrad_vx" => b.vel_grad_at(i, j, k).col(1).x,
        "velGrad_wx" => b.vel_grad_at(i, j, k).col(2).x,
        "velGrad_uy" => b.vel_grad_at(i, j, k).col(0).y,
        "velGrad_vy" => b.vel_grad_at(i, j, k).col(1).y,
        "velGrad_wy" => b.vel_grad_at(i, j, k).col(2).y,
        "velGrad_uz" => b.vel_grad_at(i, j, k).col(0).z,
        "velGrad_vz" => b.vel_grad_at(i, j, k).col(1).z,
        "velGrad_wz" => b.vel_grad_at(i, j, k).col(2).z,
        "tempGrad_x" => b.gradients().temp[(i, j, k)].x,
        "tempGrad_y" => b.gradients().temp[(i, j, k)].y,
        "tempGrad_z" => b.gradients().temp[(i, j, k)].z,
        "tkeGrad_x" => b.gradients().tke[(i, j, k)].x,
        "tkeGrad_y" => b.gradients().tke[(i, j, k)].y,
        "tkeGrad_z" => b.gradients().tke[(i, j, k)].z,
        "sdrGrad_x" => b.gradients().sdr[(i, j, k)].x,
        "sdrGrad_y" => b.gradients().sdr[(i, j, k)].y,
        "sdrGrad_z" => b.gradients().sdr[(i, j, k)].z,
        "resid_mass" => b.residual_at(i, j, k)[EQ_MASS],
        "resid_mom_x" => b.residual_at(i, j, k)[EQ_MOM_X],
        "resid_mom_y" => b.residual_at(i, j, k)[EQ_MOM_Y],
        "resid_mom_z" => b.residual_at(i, j, k)[EQ_MOM_Z],
        "resid_energy" => b.residual_at(i, j, k)[EQ_ENERGY],
        "resid_tke" => b.residual_at(i, j, k)[EQ_TKE],
        "resid_sdr" => b.residual_at(i, j, k)[EQ_SDR],
        "rank" => split_blocks[split_block_number(recomb, decomp, blk, i, j, k)].rank() as f64,
        "globalPosition" => {
            split_blocks[split_block_number(recomb, decomp, blk, i, j, k)].global_pos() as f64
        }
        // 配置校验已挡掉未知变量名
        _ => unreachable!("未识别的输出变量 {var}"),
    }
}

/// 写函数文件（任意写入器）
pub fn write_function<W: Write>(
    writer: &mut W,
    split_blocks: &[ProcBlock],
    decomp: &Decomposition,
    config: &SolverConfig,
    thermo: &Thermodynamics,
) -> IoResult<()> {
    let mut recomb = recombine(split_blocks, decomp);
    // 重组块的梯度是 scratch，重算一遍供梯度类变量输出
    for b in &mut recomb {
        b.compute_gradients(thermo);
    }

    let scales = ReferenceScales::from_config(config);
    let vars = &config.output.variables;
    if let Some(bad) = vars
        .iter()
        .find(|v| !ae_config::RECOGNIZED_VARIABLES.contains(&v.as_str()))
    {
        return Err(IoError::grid_format(format!("未识别的输出变量 {}", bad)));
    }

    writer.write_all(&(recomb.len() as i32).to_le_bytes())?;
    for b in &recomb {
        let (ni, nj, nk) = b.num_cells();
        writer.write_all(&(ni as i32).to_le_bytes())?;
        writer.write_all(&(nj as i32).to_le_bytes())?;
        writer.write_all(&(nk as i32).to_le_bytes())?;
        writer.write_all(&(vars.len() as i32).to_le_bytes())?;
    }

    for (blk, b) in recomb.iter().enumerate() {
        let (ni, nj, nk) = b.num_cells();
        for var in vars {
            let factor = scales.factor(var);
            for k in 0..nk {
                for j in 0..nj {
                    for i in 0..ni {
                        let v = cell_value(
                            var,
                            &recomb,
                            split_blocks,
                            decomp,
                            blk,
                            i,
                            j,
                            k,
                            thermo,
                        ) * factor;
                        writer.write_all(&v.to_le_bytes())?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// 写函数文件 `<root>_<iter>_center.fun`
pub fn write_function_file(
    iter: usize,
    split_blocks: &[ProcBlock],
    decomp: &Decomposition,
    config: &SolverConfig,
    thermo: &Thermodynamics,
) -> IoResult<PathBuf> {
    let path = PathBuf::from(format!("{}_{}_center.fun", config.sim_name, iter));
    let file = File::create(&path).map_err(|e| {
        IoError::grid_format(format!("函数文件 {} 打开失败: {}", path.display(), e))
    })?;
    let mut writer = BufWriter::new(file);
    write_function(&mut writer, split_blocks, decomp, config, thermo)?;
    tracing::info!(path = %path.display(), "函数文件已写出");
    Ok(path)
}

// ============================================================
// 结果索引文件
// ============================================================

/// 写结果索引（任意写入器）
pub fn write_results<W: Write>(writer: &mut W, config: &SolverConfig, iter: usize) -> IoResult<()> {
    let out_freq = config.output.frequency;
    let vars = &config.output.variables;

    let has_vel_vector = ["vel_x", "vel_y", "vel_z"]
        .iter()
        .all(|v| vars.iter().any(|s| s == v));

    let num_scalar = vars.len();
    let num_vector = usize::from(has_vel_vector);
    writeln!(writer, "{}     {}     0", num_scalar, num_vector)?;

    // 解时间点数
    let num_time = iter / out_freq + 1;
    writeln!(writer, "{}", num_time)?;

    // 解时间列表（每 10 个换行）
    let mut sol_time = 0usize;
    for count in 1..=num_time {
        sol_time += out_freq;
        if count % 10 == 0 {
            writeln!(writer)?;
        }
        write!(writer, "{}   ", sol_time)?;
    }
    writeln!(writer)?;

    writeln!(writer, "{}  {}", out_freq, out_freq)?;

    // 标量绑定（四位零填充序号）
    let pattern = format!("{}_*_center.fun", config.sim_name);
    let mut vec_indices = [0usize; 3];
    for (nvar, var) in vars.iter().enumerate() {
        writeln!(writer, "{} F {:04} {}", pattern, nvar, var)?;
        match var.as_str() {
            "vel_x" => vec_indices[0] = nvar,
            "vel_y" => vec_indices[1] = nvar,
            "vel_z" => vec_indices[2] = nvar,
            _ => {}
        }
    }

    // 速度向量绑定
    if has_vel_vector {
        writeln!(
            writer,
            "{} F {:04} {:04} {:04} velocity",
            pattern, vec_indices[0], vec_indices[1], vec_indices[2]
        )?;
    }
    Ok(())
}

/// 写结果索引文件 `<root>_center.res`
pub fn write_results_file(config: &SolverConfig, iter: usize) -> IoResult<PathBuf> {
    let path = PathBuf::from(format!("{}_center.res", config.sim_name));
    let file = File::create(&path).map_err(|e| {
        IoError::grid_format(format!("结果文件 {} 打开失败: {}", path.display(), e))
    })?;
    let mut writer = BufWriter::new(file);
    write_results(&mut writer, config, iter)?;
    Ok(path)
}

// ============================================================
// 残差日志
// ============================================================

/// 残差日志表头
#[must_use]
pub fn format_residual_header(turbulent: bool, fixed_dt: bool) -> String {
    let mut s = String::new();
    s.push_str(&format!("{:<7}{:<8}", "Step", "NL-Iter"));
    s.push_str(&format!(
        "{:<12}",
        if fixed_dt { "Time-Step" } else { "CFL" }
    ));
    s.push_str(&format!(
        "{:<12}{:<12}{:<12}{:<12}{:<12}",
        "Res-Mass", "Res-Mom-X", "Res-Mom-Y", "Res-Mom-Z", "Res-Energy"
    ));
    if turbulent {
        s.push_str(&format!("{:<12}{:<12}", "Res-Tke", "Res-Omega"));
    }
    s.push_str(&format!(
        "{:<8}{:<8}{:<8}{:<8}{:<8}{:<12}{:<12}",
        "Max-Eqn", "Max-Blk", "Max-I", "Max-J", "Max-K", "Max-Res", "Res-Matrix"
    ));
    s
}

/// 残差日志单行
#[must_use]
pub fn format_residual_row(report: &StepReport, turbulent: bool) -> String {
    let mut s = String::new();
    s.push_str(&format!("{:<7}{:<8}", report.outer, report.inner));
    s.push_str(&format!("{:<12.4e}", report.cfl_or_dt));
    let n_eq = if turbulent { 7 } else { 5 };
    for eq in 0..n_eq {
        s.push_str(&format!("{:<12.4e}", report.l2_norm[eq]));
    }
    s.push_str(&format!(
        "{:<8}{:<8}{:<8}{:<8}{:<8}{:<12.4e}{:<12.4e}",
        report.linf.eqn,
        report.linf.block,
        report.linf.i,
        report.linf.j,
        report.linf.k,
        report.linf.value,
        report.matrix_residual
    ));
    s
}

/// 残差日志：stdout + 文件双写
pub struct ResidualLog {
    file: BufWriter<File>,
    turbulent: bool,
    fixed_dt: bool,
    header_written: bool,
}

impl ResidualLog {
    /// 创建日志文件 `<root>.resid`
    pub fn create(config: &SolverConfig) -> IoResult<Self> {
        let path = PathBuf::from(format!("{}.resid", config.sim_name));
        let file = File::create(&path).map_err(|e| {
            IoError::grid_format(format!("残差文件 {} 打开失败: {}", path.display(), e))
        })?;
        Ok(Self {
            file: BufWriter::new(file),
            turbulent: config.is_turbulent(),
            fixed_dt: config.time.uses_fixed_dt(),
            header_written: false,
        })
    }

    /// 记录一个子迭代
    ///
    /// 文件在首次记录写表头；stdout 每 100 个外层迭代重印表头。
    pub fn record(&mut self, report: &StepReport) -> IoResult<()> {
        if !self.header_written {
            writeln!(
                self.file,
                "{}",
                format_residual_header(self.turbulent, self.fixed_dt)
            )?;
            self.header_written = true;
        }
        if report.outer % 100 == 0 && report.inner == 0 {
            println!("{}", format_residual_header(self.turbulent, self.fixed_dt));
        }

        let row = format_residual_row(report, self.turbulent);
        println!("{}", row);
        writeln!(self.file, "{}", row)?;
        Ok(())
    }

    /// 冲刷日志（中止路径要求在终止前冲刷）
    pub fn flush(&mut self) -> IoResult<()> {
        self.file.flush()?;
        Ok(())
    }
}

// ============================================================
// 测试
// ============================================================
