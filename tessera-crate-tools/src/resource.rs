use std::path::{Path, PathBuf};

/// 统一路径管理
///
/// 所有路径基于工作区根目录（通过 `CARGO_MANIFEST_DIR` 推导）。
///
/// # 使用示例
/// ```ignore
/// let config = TesseraPath::config_path("rg-debug.toml"); // config/rg-debug.toml
/// let dot = TesseraPath::output_path("render_graph.dot");  // target/tessera/render_graph.dot
/// ```
pub struct TesseraPath {}
// 核心路径
impl TesseraPath {
    /// 获取工作区根目录
    pub fn workspace_path() -> PathBuf {
        // tessera-crate-tools 位于工作区根目录下一层
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        manifest_dir.parent().unwrap_or(manifest_dir).to_path_buf()
    }

    pub fn target_path() -> PathBuf {
        Self::workspace_path().join("target")
    }
}
// 根目录下
impl TesseraPath {
    /// 获取 `config/` 目录下的文件路径
    pub fn config_path(filename: &str) -> PathBuf {
        Self::workspace_path().join("config").join(filename)
    }

    /// 工具输出目录 `target/tessera/`
    pub fn output_path(filename: &str) -> PathBuf {
        Self::target_path().join("tessera").join(filename)
    }

    /// 相对路径基于工作区根目录解析，绝对路径原样返回
    pub fn resolve(path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() { path.to_path_buf() } else { Self::workspace_path().join(path) }
    }
}
