//! RenderGraph 资源句柄定义
//!
//! 句柄是 graph 内部的虚拟引用，由 `SlotMap` 分配，删除和插入不会使其它句柄失效。

use slotmap::new_key_type;

new_key_type! {
    /// Graph 内部的 Image 句柄
    pub struct RgImageHandle;
}

/// pass 引用的图像
///
/// swapchain 不在注册表里：每帧 acquire 到的图像不同，在 `begin_frame` 时才绑定
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RgImageId {
    Image(RgImageHandle),
    Swapchain,
}

impl From<RgImageHandle> for RgImageId {
    #[inline]
    fn from(handle: RgImageHandle) -> Self {
        Self::Image(handle)
    }
}
