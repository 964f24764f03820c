//! Barrier 描述
//!
//! 由 pass 结束时的状态和下一个使用者需要的状态生成 ImageMemoryBarrier。

use ash::vk;
use tessera_gfx::commands::barrier::GfxImageBarrier;

use crate::resource_handle::RgImageId;
use crate::resource_state::RgImageState;
use crate::use_chain::RgImageUse;

/// 图像 Barrier 描述
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RgImageBarrierDesc {
    pub image: RgImageId,
    /// 源状态：上一次使用结束时的状态
    pub src_state: RgImageState,
    /// 目标状态：下一次使用开始时需要的状态
    pub dst_state: RgImageState,
    /// 图像 aspect（COLOR / DEPTH / STENCIL）
    pub aspect: vk::ImageAspectFlags,
    /// 下一次使用的位置
    pub dst_use: RgImageUse,
}

impl RgImageBarrierDesc {
    pub fn new(image: RgImageId, src_state: RgImageState, dst_state: RgImageState, dst_use: RgImageUse) -> Self {
        Self {
            image,
            src_state,
            dst_state,
            aspect: vk::ImageAspectFlags::COLOR,
            dst_use,
        }
    }

    /// 设置 aspect
    pub fn with_aspect(mut self, aspect: vk::ImageAspectFlags) -> Self {
        self.aspect = aspect;
        self
    }

    /// 目标以 input attachment 读取时，依赖只需要覆盖同一像素，可以用 BY_REGION
    #[inline]
    pub fn is_region_local(&self) -> bool {
        self.dst_state.is_input_attachment_read()
    }

    /// 转换为 GfxImageBarrier
    ///
    /// 需要提供本帧实际的 vk::Image，src 和 dst 使用同一个 queue family
    pub fn to_gfx_barrier(&self, image: vk::Image, queue_family_index: u32) -> GfxImageBarrier {
        GfxImageBarrier::new()
            .image(image)
            .queue_family(queue_family_index)
            .layout_transfer(self.src_state.layout, self.dst_state.layout)
            .src_mask(self.src_state.stage, self.src_state.access)
            .dst_mask(self.dst_state.stage, self.dst_state.access)
            .image_aspect_flag(self.aspect)
    }
}
