use ash::vk;
use itertools::Itertools;

use crate::{commands::barrier::GfxImageBarrier, pipelines::rendering_info::GfxRenderingInfo};

/// 命令缓冲封装
///
/// 只持有 `ash::Device` 的克隆和 `vk::CommandBuffer` 句柄，不负责分配和提交。
/// 宿主负责在录制前调用 `vkBeginCommandBuffer`，录制完成后提交。
///
/// dynamic rendering 和 synchronization2 使用 Vulkan 1.3 core 接口，
/// local read 需要开启 `VK_KHR_dynamic_rendering_local_read`。
#[derive(Clone)]
pub struct GfxCommandBuffer {
    device: ash::Device,
    vk_handle: vk::CommandBuffer,

    #[cfg(debug_assertions)]
    name: String,
}
// new & init
impl GfxCommandBuffer {
    pub fn new(device: ash::Device, vk_handle: vk::CommandBuffer, debug_name: &str) -> Self {
        #[cfg(not(debug_assertions))]
        let _ = debug_name;

        Self {
            device,
            vk_handle,

            #[cfg(debug_assertions)]
            name: debug_name.to_string(),
        }
    }
}
// getters
impl GfxCommandBuffer {
    /// getter
    #[inline]
    pub fn vk_handle(&self) -> vk::CommandBuffer {
        self.vk_handle
    }

    /// getter
    #[inline]
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    #[cfg(debug_assertions)]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}
// 绘制类型
impl GfxCommandBuffer {
    /// - command type: action, state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_begin_rendering(&self, rendering_info: &GfxRenderingInfo) {
        let rendering_info = rendering_info.rendering_info();
        unsafe {
            self.device.cmd_begin_rendering(self.vk_handle, &rendering_info);
        }
    }

    /// - command type: action, state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_end_rendering(&self) {
        unsafe {
            self.device.cmd_end_rendering(self.vk_handle);
        }
    }
}
// 同步命令
impl GfxCommandBuffer {
    /// - command type: synchronize
    /// - supported queue types: graphics, compute, transfer
    #[inline]
    pub fn image_memory_barrier(&self, dependency_flags: vk::DependencyFlags, barriers: &[GfxImageBarrier]) {
        let barriers = barriers.iter().map(|b| *b.inner()).collect_vec();
        let dependency_info =
            vk::DependencyInfo::default().image_memory_barriers(&barriers).dependency_flags(dependency_flags);
        unsafe {
            self.device.cmd_pipeline_barrier2(self.vk_handle, &dependency_info);
        }
    }
}
