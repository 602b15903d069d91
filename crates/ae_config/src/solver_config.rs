// crates/ae_config/src/solver_config.rs

//! SolverConfig - 求解器配置（全 f64）
//!
//! 定义求解器的所有输入卡参数。输入卡为 JSON 文件，
//! 所有字段带默认值，加载后统一 `validate()`。
//!
//! 内部计算采用无量纲frame：参考密度 ρ∞、参考声速 a∞、参考长度 L，
//! 黏性以 μ_ref 缩放。输入卡提供有量纲参考态，换算在构建热力学
//! 对象时完成。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// 函数文件可识别的输出变量名
///
/// 每个变量带有固定的量纲化因子（见 ae_io）。
/// `validate()` 对照本表拒绝未知变量名。
pub const RECOGNIZED_VARIABLES: &[&str] = &[
    "density",
    "vel_x",
    "vel_y",
    "vel_z",
    "mach",
    "sos",
    "pressure",
    "dt",
    "temperature",
    "tke",
    "sdr",
    "wallDistance",
    "velGrad_ux",
    "velGrad_vx",
    "velGrad_wx",
    "velGrad_uy",
    "velGrad_vy",
    "velGrad_wy",
    "velGrad_uz",
    "velGrad_vz",
    "velGrad_wz",
    "tempGrad_x",
    "tempGrad_y",
    "tempGrad_z",
    "tkeGrad_x",
    "tkeGrad_y",
    "tkeGrad_z",
    "sdrGrad_x",
    "sdrGrad_y",
    "sdrGrad_z",
    "resid_mass",
    "resid_mom_x",
    "resid_mom_y",
    "resid_mom_z",
    "resid_energy",
    "resid_tke",
    "resid_sdr",
    "rank",
    "globalPosition",
    "viscosityRatio",
];

/// 求解器配置（全 f64）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// 算例名称，作为所有输出文件的前缀
    #[serde(default = "default_sim_name")]
    pub sim_name: String,

    /// 网格文件路径 (PLOT3D 多块二进制)
    #[serde(default)]
    pub grid_file: PathBuf,

    /// 边界条件描述文件路径 (ASCII)
    #[serde(default)]
    pub bc_file: PathBuf,

    /// 参考态与来流
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// 流体物性
    #[serde(default)]
    pub fluid: FluidConfig,

    /// 时间推进
    #[serde(default)]
    pub time: TimeConfig,

    /// 空间格式
    #[serde(default)]
    pub scheme: SchemeConfig,

    /// 湍流模型
    #[serde(default)]
    pub turbulence: TurbulenceConfig,

    /// 隐式线性求解器
    #[serde(default)]
    pub linear_solver: LinearSolverConfig,

    /// 输出
    #[serde(default)]
    pub output: OutputConfig,

    /// 并行 rank 数
    #[serde(default = "default_num_ranks")]
    pub num_ranks: usize,
}

fn default_sim_name() -> String {
    "aerion".to_string()
}
fn default_num_ranks() -> usize {
    1
}

/// 参考态与来流配置
///
/// 参考密度/温度/长度定义无量纲 frame；来流以马赫数和方向给出。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// 参考密度 ρ∞ [kg/m³]
    #[serde(default = "default_rho_ref")]
    pub rho_ref: f64,

    /// 参考温度 T∞ [K]
    #[serde(default = "default_t_ref")]
    pub t_ref: f64,

    /// 参考长度 L [m]
    #[serde(default = "default_l_ref")]
    pub l_ref: f64,

    /// 来流马赫数
    #[serde(default = "default_mach")]
    pub mach: f64,

    /// 来流方向（单位化在 validate 后进行）
    #[serde(default = "default_flow_direction")]
    pub direction: [f64; 3],

    /// 基于参考长度的雷诺数（黏性计算时必填有效值）
    #[serde(default = "default_reynolds")]
    pub reynolds: f64,

    /// 等温壁温比 T_w/T∞；None 表示绝热壁
    #[serde(default)]
    pub wall_temp_ratio: Option<f64>,
}

fn default_rho_ref() -> f64 {
    1.2256
}
fn default_t_ref() -> f64 {
    288.15
}
fn default_l_ref() -> f64 {
    1.0
}
fn default_mach() -> f64 {
    0.5
}
fn default_flow_direction() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}
fn default_reynolds() -> f64 {
    1.0e6
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            rho_ref: default_rho_ref(),
            t_ref: default_t_ref(),
            l_ref: default_l_ref(),
            mach: default_mach(),
            direction: default_flow_direction(),
            reynolds: default_reynolds(),
            wall_temp_ratio: None,
        }
    }
}

/// 流体物性配置（完全气体 + Sutherland）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluidConfig {
    /// 比热比 γ
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    /// 气体常数 R [J/(kg·K)]
    #[serde(default = "default_gas_constant")]
    pub gas_constant: f64,

    /// 分子 Prandtl 数
    #[serde(default = "default_prandtl")]
    pub prandtl: f64,

    /// 湍流 Prandtl 数
    #[serde(default = "default_prandtl_turb")]
    pub prandtl_turb: f64,

    /// Sutherland 系数 C1 [kg/(m·s·K^½)]
    #[serde(default = "default_sutherland_c1")]
    pub sutherland_c1: f64,

    /// Sutherland 温度 S [K]
    #[serde(default = "default_sutherland_s")]
    pub sutherland_s: f64,
}

fn default_gamma() -> f64 {
    1.4
}
fn default_gas_constant() -> f64 {
    287.058
}
fn default_prandtl() -> f64 {
    0.72
}
fn default_prandtl_turb() -> f64 {
    0.9
}
fn default_sutherland_c1() -> f64 {
    1.458e-6
}
fn default_sutherland_s() -> f64 {
    110.4
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            gamma: default_gamma(),
            gas_constant: default_gas_constant(),
            prandtl: default_prandtl(),
            prandtl_turb: default_prandtl_turb(),
            sutherland_c1: default_sutherland_c1(),
            sutherland_s: default_sutherland_s(),
        }
    }
}

/// 方程组选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EquationSet {
    /// 无黏 Euler 方程
    Euler,
    /// 层流 Navier-Stokes
    #[default]
    NavierStokes,
    /// RANS（需配合湍流模型）
    Rans,
}

/// 时间积分方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Integrator {
    /// 四级 SSP Runge-Kutta 显式推进
    Explicit,
    /// LU-SGS 隐式推进
    #[default]
    Implicit,
}

/// 时间推进配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 方程组
    #[serde(default)]
    pub equation_set: EquationSet,

    /// 积分器
    #[serde(default)]
    pub integrator: Integrator,

    /// 固定无量纲时间步长；<= 0 表示由 CFL 控制
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// CFL 起始值（爬升起点）
    #[serde(default = "default_cfl_start")]
    pub cfl_start: f64,

    /// CFL 最大值
    #[serde(default = "default_cfl_max")]
    pub cfl_max: f64,

    /// CFL 线性爬升步数
    #[serde(default = "default_cfl_ramp")]
    pub cfl_ramp_steps: usize,

    /// 外层（物理/伪时间）步数
    #[serde(default = "default_outer_steps")]
    pub outer_steps: usize,

    /// 每个外层步的非线性子迭代数
    #[serde(default = "default_nonlinear_iters")]
    pub nonlinear_iters: usize,

    /// 局部时间步进（定常加速）；false 时取全局最小 Δt
    #[serde(default = "default_local_dt")]
    pub local_timestepping: bool,

    /// 残差归一化参考值的重置窗口（外层迭代数）
    #[serde(default = "default_norm_reset_window")]
    pub norm_reset_window: usize,
}

fn default_dt() -> f64 {
    -1.0
}
fn default_cfl_start() -> f64 {
    0.5
}
fn default_cfl_max() -> f64 {
    2.0
}
fn default_cfl_ramp() -> usize {
    100
}
fn default_outer_steps() -> usize {
    1000
}
fn default_nonlinear_iters() -> usize {
    1
}
fn default_local_dt() -> bool {
    true
}
fn default_norm_reset_window() -> usize {
    5
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            equation_set: EquationSet::default(),
            integrator: Integrator::default(),
            dt: default_dt(),
            cfl_start: default_cfl_start(),
            cfl_max: default_cfl_max(),
            cfl_ramp_steps: default_cfl_ramp(),
            outer_steps: default_outer_steps(),
            nonlinear_iters: default_nonlinear_iters(),
            local_timestepping: default_local_dt(),
            norm_reset_window: default_norm_reset_window(),
        }
    }
}

impl TimeConfig {
    /// 给定外层迭代序号的 CFL（线性爬升）
    #[must_use]
    pub fn cfl_at(&self, outer_iter: usize) -> f64 {
        if self.cfl_ramp_steps == 0 || outer_iter >= self.cfl_ramp_steps {
            return self.cfl_max;
        }
        let frac = outer_iter as f64 / self.cfl_ramp_steps as f64;
        self.cfl_start + frac * (self.cfl_max - self.cfl_start)
    }

    /// 是否由固定 Δt 驱动（而非 CFL）
    #[must_use]
    pub fn uses_fixed_dt(&self) -> bool {
        self.dt > 0.0
    }
}

/// 斜率限制器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LimiterKind {
    /// 一阶迎风（分片常值）
    FirstOrder,
    /// Minmod
    Minmod,
    /// Van Albada
    #[default]
    VanAlbada,
}

/// 空间格式配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeConfig {
    /// 斜率限制器
    #[serde(default)]
    pub limiter: LimiterKind,

    /// Harten 熵修正系数 δ = coeff · a_roe
    #[serde(default = "default_entropy_fix")]
    pub entropy_fix_coeff: f64,
}

fn default_entropy_fix() -> f64 {
    0.1
}

impl Default for SchemeConfig {
    fn default() -> Self {
        Self {
            limiter: LimiterKind::default(),
            entropy_fix_coeff: default_entropy_fix(),
        }
    }
}

/// 湍流模型选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TurbulenceKind {
    /// 无模型（层流/无黏）
    #[default]
    None,
    /// Wilcox k-ω (2006)
    WilcoxKw,
    /// Menter SST
    MenterSst,
    /// SST-DES 混合
    SstDes,
    /// WALE 亚格子模型
    WaleLes,
}

/// 壁面处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WallTreatment {
    /// 低雷诺数：解析黏性底层
    #[default]
    LowRe,
    /// 壁面函数：对数律，y⁺ 过低时自动回退低雷诺数处理
    WallLaw,
}

/// 湍流配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TurbulenceConfig {
    /// 模型
    #[serde(default)]
    pub model: TurbulenceKind,

    /// 壁面处理
    #[serde(default)]
    pub wall_treatment: WallTreatment,

    /// 来流湍流强度（tke 初始化）
    #[serde(default = "default_intensity")]
    pub intensity: f64,

    /// 来流涡黏比 μt/μ（sdr 初始化）
    #[serde(default = "default_eddy_visc_ratio")]
    pub eddy_viscosity_ratio: f64,
}

fn default_intensity() -> f64 {
    0.01
}
fn default_eddy_visc_ratio() -> f64 {
    10.0
}

/// 隐式线性求解器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSolverConfig {
    /// LU-SGS 对称扫掠次数上限
    #[serde(default = "default_sweeps")]
    pub sweeps: usize,

    /// 线性残差相对收敛容差
    #[serde(default = "default_lin_tol")]
    pub tolerance: f64,

    /// 步长拒绝后的最大重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

fn default_sweeps() -> usize {
    4
}
fn default_lin_tol() -> f64 {
    1.0e-2
}
fn default_max_retries() -> usize {
    5
}

impl Default for LinearSolverConfig {
    fn default() -> Self {
        Self {
            sweeps: default_sweeps(),
            tolerance: default_lin_tol(),
            max_retries: default_max_retries(),
        }
    }
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 函数文件输出间隔（外层迭代数）
    #[serde(default = "default_out_freq")]
    pub frequency: usize,

    /// 输出变量列表，须全部在 [`RECOGNIZED_VARIABLES`] 内
    #[serde(default = "default_out_vars")]
    pub variables: Vec<String>,
}

fn default_out_freq() -> usize {
    100
}
fn default_out_vars() -> Vec<String> {
    ["density", "vel_x", "vel_y", "vel_z", "pressure", "mach"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            frequency: default_out_freq(),
            variables: default_out_vars(),
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            sim_name: default_sim_name(),
            grid_file: PathBuf::new(),
            bc_file: PathBuf::new(),
            reference: ReferenceConfig::default(),
            fluid: FluidConfig::default(),
            time: TimeConfig::default(),
            scheme: SchemeConfig::default(),
            turbulence: TurbulenceConfig::default(),
            linear_solver: LinearSolverConfig::default(),
            output: OutputConfig::default(),
            num_ranks: default_num_ranks(),
        }
    }
}

impl SolverConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;

        let config: SolverConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reference.rho_ref <= 0.0 {
            return Err(ConfigError::invalid(
                "reference.rho_ref",
                self.reference.rho_ref,
                "参考密度必须为正",
            ));
        }
        if self.reference.t_ref <= 0.0 {
            return Err(ConfigError::invalid(
                "reference.t_ref",
                self.reference.t_ref,
                "参考温度必须为正",
            ));
        }
        if self.reference.l_ref <= 0.0 {
            return Err(ConfigError::invalid(
                "reference.l_ref",
                self.reference.l_ref,
                "参考长度必须为正",
            ));
        }
        if self.reference.mach < 0.0 {
            return Err(ConfigError::invalid(
                "reference.mach",
                self.reference.mach,
                "马赫数不能为负",
            ));
        }

        let dir_mag = self
            .reference
            .direction
            .iter()
            .map(|d| d * d)
            .sum::<f64>()
            .sqrt();
        if dir_mag < 1.0e-12 {
            return Err(ConfigError::invalid(
                "reference.direction",
                format!("{:?}", self.reference.direction),
                "来流方向不能为零向量",
            ));
        }

        if self.fluid.gamma <= 1.0 {
            return Err(ConfigError::invalid(
                "fluid.gamma",
                self.fluid.gamma,
                "比热比必须大于 1",
            ));
        }
        if self.fluid.prandtl <= 0.0 {
            return Err(ConfigError::invalid(
                "fluid.prandtl",
                self.fluid.prandtl,
                "Prandtl 数必须为正",
            ));
        }

        if !self.time.uses_fixed_dt() {
            if self.time.cfl_start <= 0.0 {
                return Err(ConfigError::invalid(
                    "time.cfl_start",
                    self.time.cfl_start,
                    "CFL 必须为正",
                ));
            }
            if self.time.cfl_max < self.time.cfl_start {
                return Err(ConfigError::invalid(
                    "time.cfl_max",
                    self.time.cfl_max,
                    "cfl_max 不能小于 cfl_start",
                ));
            }
        }
        if self.time.nonlinear_iters == 0 {
            return Err(ConfigError::invalid(
                "time.nonlinear_iters",
                self.time.nonlinear_iters,
                "非线性子迭代数至少为 1",
            ));
        }
        if self.time.norm_reset_window == 0 {
            return Err(ConfigError::invalid(
                "time.norm_reset_window",
                self.time.norm_reset_window,
                "归一化重置窗口至少为 1",
            ));
        }

        if self.linear_solver.sweeps == 0 {
            return Err(ConfigError::invalid(
                "linear_solver.sweeps",
                self.linear_solver.sweeps,
                "扫掠次数至少为 1",
            ));
        }
        if self.linear_solver.tolerance <= 0.0 {
            return Err(ConfigError::invalid(
                "linear_solver.tolerance",
                self.linear_solver.tolerance,
                "收敛容差必须为正",
            ));
        }

        // RANS 必须配湍流模型，反之湍流模型要求 RANS 方程组
        if self.time.equation_set == EquationSet::Rans
            && self.turbulence.model == TurbulenceKind::None
        {
            return Err(ConfigError::invalid(
                "turbulence.model",
                "none",
                "RANS 方程组需要选择湍流模型",
            ));
        }

        if self.output.frequency == 0 {
            return Err(ConfigError::invalid(
                "output.frequency",
                self.output.frequency,
                "输出间隔至少为 1",
            ));
        }
        for var in &self.output.variables {
            if !RECOGNIZED_VARIABLES.contains(&var.as_str()) {
                return Err(ConfigError::invalid(
                    "output.variables",
                    var,
                    "未识别的输出变量名",
                ));
            }
        }

        if self.num_ranks == 0 {
            return Err(ConfigError::invalid(
                "num_ranks",
                self.num_ranks,
                "rank 数至少为 1",
            ));
        }

        Ok(())
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }

    /// 是否求解湍流输运方程
    #[must_use]
    pub fn is_turbulent(&self) -> bool {
        self.turbulence.model != TurbulenceKind::None
    }

    /// 是否包含黏性项
    #[must_use]
    pub fn is_viscous(&self) -> bool {
        self.time.equation_set != EquationSet::Euler
    }
}
