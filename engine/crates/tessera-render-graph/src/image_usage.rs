//! Pass 对图像的用法标记

use ash::vk;

use crate::resource_state::RgImageState;

bitflags::bitflags! {
    /// 一个 pass 引用图像的方式，可以组合
    ///
    /// 前四位决定默认的 layout/stage/access，后三位只影响 load op 或 merge
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct RgImageUsage: u8 {
        /// 在着色器中采样
        const SAMPLED = 0b0000_0001;
        /// 作为颜色附件写入
        const COLOR_ATTACHMENT = 0b0000_0010;
        /// 作为深度附件写入
        const DEPTH_ATTACHMENT = 0b0000_0100;
        /// 作为 input attachment 读取
        const INPUT_ATTACHMENT = 0b0000_1000;
        /// load op 为 don't care
        const NO_READ = 0b0010_0000;
        /// load op 为 clear
        const CLEARED = 0b0100_0000;
        /// 占位引用：不访问图像，只用于让相邻 pass 的引用列表对齐以便合并
        const FAKE = 0b1000_0000;
    }
}

// 默认值推导
impl RgImageUsage {
    /// 每种用法对应的标准状态，stage 和 access 按位或
    const CANONICAL_STATES: [(RgImageUsage, RgImageState); 4] = [
        (RgImageUsage::COLOR_ATTACHMENT, RgImageState::COLOR_ATTACHMENT_READ_WRITE),
        (RgImageUsage::DEPTH_ATTACHMENT, RgImageState::DEPTH_ATTACHMENT_WRITE),
        (RgImageUsage::INPUT_ATTACHMENT, RgImageState::INPUT_ATTACHMENT_READ),
        (RgImageUsage::SAMPLED, RgImageState::SHADER_READ_FRAGMENT),
    ];

    /// 决定默认状态的四个访问位
    pub const ACCESS_BITS: Self = Self::SAMPLED
        .union(Self::COLOR_ATTACHMENT)
        .union(Self::DEPTH_ATTACHMENT)
        .union(Self::INPUT_ATTACHMENT);

    /// FAKE 引用不访问图像，去掉访问位
    pub fn effective(self) -> Self {
        if self.contains(Self::FAKE) { self.difference(Self::ACCESS_BITS) } else { self }
    }

    pub fn default_access(self) -> vk::AccessFlags2 {
        Self::CANONICAL_STATES
            .iter()
            .filter(|(usage, _)| self.contains(*usage))
            .fold(vk::AccessFlags2::NONE, |acc, (_, state)| acc | state.access)
    }

    pub fn default_stage(self) -> vk::PipelineStageFlags2 {
        Self::CANONICAL_STATES
            .iter()
            .filter(|(usage, _)| self.contains(*usage))
            .fold(vk::PipelineStageFlags2::NONE, |acc, (_, state)| acc | state.stage)
    }

    /// 附件同时作为 input attachment 时使用 GENERAL，为之后的合并预留
    pub fn default_layout(self) -> vk::ImageLayout {
        let as_input = self.contains(Self::INPUT_ATTACHMENT);
        if self.contains(Self::COLOR_ATTACHMENT) {
            if as_input { vk::ImageLayout::GENERAL } else { vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL }
        } else if self.contains(Self::DEPTH_ATTACHMENT) {
            if as_input { vk::ImageLayout::GENERAL } else { vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL }
        } else if as_input {
            vk::ImageLayout::RENDERING_LOCAL_READ_KHR
        } else if self.contains(Self::SAMPLED) {
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
        } else {
            vk::ImageLayout::UNDEFINED
        }
    }

    /// CLEARED 优先于 NO_READ
    pub fn load_op(self) -> vk::AttachmentLoadOp {
        if self.contains(Self::CLEARED) {
            vk::AttachmentLoadOp::CLEAR
        } else if self.contains(Self::NO_READ) {
            vk::AttachmentLoadOp::DONT_CARE
        } else {
            vk::AttachmentLoadOp::LOAD
        }
    }
}
