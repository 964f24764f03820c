//! 资源状态定义
//!
//! 封装 Vulkan 的 pipeline stage、access mask 和 image layout，
//! 提供 pass 默认用法对应的状态组合。

use ash::vk;

/// 图像资源状态
///
/// 描述图像在某个 Pass 中的使用方式，barrier 的 src/dst 两端都用它表示。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RgImageState {
    /// Pipeline stage
    pub stage: vk::PipelineStageFlags2,
    /// Access mask
    pub access: vk::AccessFlags2,
    /// Image layout
    pub layout: vk::ImageLayout,
}

impl Default for RgImageState {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

// new & 常量定义
impl RgImageState {
    /// 创建自定义状态
    #[inline]
    pub const fn new(stage: vk::PipelineStageFlags2, access: vk::AccessFlags2, layout: vk::ImageLayout) -> Self {
        Self { stage, access, layout }
    }

    // ============ 预定义状态常量 ============

    /// 未定义状态，没有任何 stage 和 access，内容可以丢弃
    pub const UNDEFINED: Self =
        Self::new(vk::PipelineStageFlags2::NONE, vk::AccessFlags2::NONE, vk::ImageLayout::UNDEFINED);

    /// 颜色附件读写
    pub const COLOR_ATTACHMENT_READ_WRITE: Self = Self::new(
        vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
        vk::AccessFlags2::from_raw(
            vk::AccessFlags2::COLOR_ATTACHMENT_WRITE.as_raw() | vk::AccessFlags2::COLOR_ATTACHMENT_READ.as_raw(),
        ),
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    );

    /// 深度附件写入
    pub const DEPTH_ATTACHMENT_WRITE: Self = Self::new(
        vk::PipelineStageFlags2::from_raw(
            vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS.as_raw()
                | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS.as_raw(),
        ),
        vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    );

    /// input attachment 读取（片段着色器，dynamic rendering local read）
    pub const INPUT_ATTACHMENT_READ: Self = Self::new(
        vk::PipelineStageFlags2::FRAGMENT_SHADER,
        vk::AccessFlags2::INPUT_ATTACHMENT_READ,
        vk::ImageLayout::RENDERING_LOCAL_READ_KHR,
    );

    /// 着色器只读采样（片段着色器）
    pub const SHADER_READ_FRAGMENT: Self = Self::new(
        vk::PipelineStageFlags2::FRAGMENT_SHADER,
        vk::AccessFlags2::SHADER_SAMPLED_READ,
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    );

    // ============ 辅助方法 ============

    /// 写操作的 access flags
    const WRITE_ACCESS: vk::AccessFlags2 = vk::AccessFlags2::from_raw(
        vk::AccessFlags2::SHADER_STORAGE_WRITE.as_raw()
            | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE.as_raw()
            | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE.as_raw()
            | vk::AccessFlags2::TRANSFER_WRITE.as_raw()
            | vk::AccessFlags2::MEMORY_WRITE.as_raw(),
    );

    /// 附件写入的 access flags，和采样读取放在同一个 region 里会产生冲突
    const ATTACHMENT_WRITE_ACCESS: vk::AccessFlags2 = vk::AccessFlags2::from_raw(
        vk::AccessFlags2::COLOR_ATTACHMENT_WRITE.as_raw() | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE.as_raw(),
    );

    /// 检查是否为写操作
    #[inline]
    pub fn is_write(&self) -> bool {
        self.access.intersects(Self::WRITE_ACCESS)
    }

    /// 是否以 color/depth attachment 的方式写入
    #[inline]
    pub fn is_attachment_write(&self) -> bool {
        self.access.intersects(Self::ATTACHMENT_WRITE_ACCESS)
    }

    /// 是否采样读取
    #[inline]
    pub fn is_sampled_read(&self) -> bool {
        self.access.contains(vk::AccessFlags2::SHADER_SAMPLED_READ)
    }

    /// 是否作为 input attachment 读取，决定 barrier 能否限定在 region 内
    #[inline]
    pub fn is_input_attachment_read(&self) -> bool {
        self.access.contains(vk::AccessFlags2::INPUT_ATTACHMENT_READ)
    }

    /// 合并另一次使用的 stage 和 access，layout 置为 UNDEFINED
    ///
    /// 用于首帧：没有上一帧的真实状态，只能等待所有可能的使用完成，并丢弃内容
    #[inline]
    pub fn accumulate(self, other: Self) -> Self {
        Self::new(self.stage | other.stage, self.access | other.access, vk::ImageLayout::UNDEFINED)
    }
}
