//! 命令录制接口
//!
//! executor 只需要两类命令：开关 rendering region，以及批量 image barrier。
//! [`GfxCommandBuffer`] 直接录制到 Vulkan；[`RgRecordingCommands`] 只记录调用，
//! 用于离线打印执行计划和测试。

use ash::vk;
use tessera_gfx::commands::barrier::GfxImageBarrier;
use tessera_gfx::commands::command_buffer::GfxCommandBuffer;
use tessera_gfx::pipelines::rendering_info::GfxRenderingInfo;

pub trait RgCommands {
    /// 开启 rendering region
    fn begin_rendering(&mut self, rendering_info: &GfxRenderingInfo);

    /// 结束 rendering region
    fn end_rendering(&mut self);

    /// 一批 image barrier，`dependency_flags` 为空表示全局依赖，`BY_REGION` 表示 region 内依赖
    fn image_memory_barrier(&mut self, dependency_flags: vk::DependencyFlags, barriers: &[GfxImageBarrier]);
}

impl RgCommands for GfxCommandBuffer {
    #[inline]
    fn begin_rendering(&mut self, rendering_info: &GfxRenderingInfo) {
        self.cmd_begin_rendering(rendering_info);
    }

    #[inline]
    fn end_rendering(&mut self) {
        self.cmd_end_rendering();
    }

    #[inline]
    fn image_memory_barrier(&mut self, dependency_flags: vk::DependencyFlags, barriers: &[GfxImageBarrier]) {
        GfxCommandBuffer::image_memory_barrier(self, dependency_flags, barriers);
    }
}

/// 被记录下来的一条命令
#[derive(Clone, Debug)]
pub enum RgRecordedCommand {
    BeginRendering(GfxRenderingInfo),
    EndRendering,
    ImageBarrier {
        dependency_flags: vk::DependencyFlags,
        barriers: Vec<GfxImageBarrier>,
    },
}

/// 只记录不执行的命令录制器
#[derive(Clone, Debug, Default)]
pub struct RgRecordingCommands {
    commands: Vec<RgRecordedCommand>,
}

// new & init
impl RgRecordingCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取出已记录的命令并清空
    pub fn take(&mut self) -> Vec<RgRecordedCommand> {
        std::mem::take(&mut self.commands)
    }
}

// getters
impl RgRecordingCommands {
    #[inline]
    pub fn commands(&self) -> &[RgRecordedCommand] {
        &self.commands
    }

    /// 所有 barrier 批次
    pub fn barrier_batches(&self) -> impl Iterator<Item = (vk::DependencyFlags, &[GfxImageBarrier])> {
        self.commands.iter().filter_map(|command| match command {
            RgRecordedCommand::ImageBarrier {
                dependency_flags,
                barriers,
            } => Some((*dependency_flags, barriers.as_slice())),
            _ => None,
        })
    }

    /// barrier 总数
    pub fn barrier_count(&self) -> usize {
        self.barrier_batches().map(|(_, barriers)| barriers.len()).sum()
    }

    pub fn rendering_count(&self) -> usize {
        self.commands.iter().filter(|command| matches!(command, RgRecordedCommand::BeginRendering(_))).count()
    }
}

impl RgCommands for RgRecordingCommands {
    fn begin_rendering(&mut self, rendering_info: &GfxRenderingInfo) {
        self.commands.push(RgRecordedCommand::BeginRendering(rendering_info.clone()));
    }

    fn end_rendering(&mut self) {
        self.commands.push(RgRecordedCommand::EndRendering);
    }

    fn image_memory_barrier(&mut self, dependency_flags: vk::DependencyFlags, barriers: &[GfxImageBarrier]) {
        self.commands.push(RgRecordedCommand::ImageBarrier {
            dependency_flags,
            barriers: barriers.to_vec(),
        });
    }
}
