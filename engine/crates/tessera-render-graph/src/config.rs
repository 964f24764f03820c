//! 调试配置
//!
//! 从 TOML 文件读取，控制 barrier 日志、执行计划打印和 DOT 导出。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tessera_crate_tools::resource::TesseraPath;

use crate::graph::RenderGraph;

/// RenderGraph 调试配置
///
/// ```toml
/// debug_output = true
/// print_plan = true
/// dot_path = "target/tessera/render_graph.dot"
/// frames = 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RgDebugConfig {
    /// 每个 barrier 以 debug 级别输出
    pub debug_output: bool,
    /// 构建后打印执行计划
    pub print_plan: bool,
    /// DOT 输出路径，相对路径基于工作区根目录
    pub dot_path: Option<String>,
    /// rg-plan 回放的帧数
    pub frames: u32,
}

impl Default for RgDebugConfig {
    fn default() -> Self {
        Self {
            debug_output: false,
            print_plan: true,
            dot_path: None,
            frames: 2,
        }
    }
}

impl RgDebugConfig {
    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).with_context(|| format!("读取配置文件失败: {:?}", path.as_ref()))?;

        Self::from_toml(&content).with_context(|| format!("解析 TOML 配置失败: {:?}", path.as_ref()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self).context("序列化配置失败")?;
        fs::write(path.as_ref(), content).with_context(|| format!("写入配置文件失败: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// 解析后的 DOT 输出路径
    pub fn dot_output_path(&self) -> Option<PathBuf> {
        self.dot_path.as_ref().map(|path| TesseraPath::resolve(path))
    }
}

impl RenderGraph {
    /// 应用调试配置：设置 barrier 日志级别，按需打印执行计划和导出 DOT
    pub fn apply_debug_config(&mut self, config: &RgDebugConfig) -> anyhow::Result<()> {
        self.set_debug_output(config.debug_output);

        if config.print_plan {
            self.print_execution_plan();
        }
        if let Some(dot_path) = config.dot_output_path() {
            self.export_dot(dot_path)?;
        }

        Ok(())
    }
}
