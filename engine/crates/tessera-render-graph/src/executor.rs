//! 每帧回放
//!
//! 调用方按添加顺序逐个 `begin_pass`/`end_pass`，executor 负责开关 rendering region
//! 和录制 barrier。合并链中间的 pass 只录制 region 内的 barrier，
//! 其余 barrier 推迟到链结束、region 关闭之后统一录制。

use ash::vk;
use itertools::Itertools;
use tessera_gfx::commands::barrier::GfxImageBarrier;
use tessera_gfx::pipelines::rendering_info::{GfxRenderingAttachment, GfxRenderingInfo};

use crate::barrier::RgImageBarrierDesc;
use crate::commands::RgCommands;
use crate::graph::RenderGraph;
use crate::pass::{RgImageRef, RgPass};

/// 每帧传入的参数
#[derive(Clone, Copy, Debug)]
pub struct RgFrameInfo {
    /// pass 没有指定 render area 时使用
    pub render_area: vk::Rect2D,
    pub queue_family_index: u32,
    /// 本帧 acquire 到的 swapchain 图像
    pub swapchain_image: vk::Image,
    pub swapchain_view: vk::ImageView,
}

impl RgFrameInfo {
    pub fn new(extent: vk::Extent2D, queue_family_index: u32) -> Self {
        Self {
            render_area: vk::Rect2D {
                offset: vk::Offset2D::default(),
                extent,
            },
            queue_family_index,
            swapchain_image: vk::Image::null(),
            swapchain_view: vk::ImageView::null(),
        }
    }

    /// builder
    #[inline]
    pub fn with_swapchain(mut self, image: vk::Image, view: vk::ImageView) -> Self {
        self.swapchain_image = image;
        self.swapchain_view = view;
        self
    }
}

/// 一帧录制过程中的状态
struct RgFrameState {
    render_area: vk::Rect2D,
    queue_family_index: u32,
    /// 下一个要开始的 pass
    pass_cursor: usize,
    /// 当前已经 begin 但还没 end 的 pass
    pass_open: bool,
    /// 合并链中推迟到链结束才录制的 barrier
    deferred: Vec<RgImageBarrierDesc>,
}

/// 正在录制的一帧
///
/// 必须调用 [`RgFrame::end_frame`] 结束；直接 drop 会让 graph 停留在录制状态，
/// 下一次 `begin_frame` 会 panic。
pub struct RgFrame<'a> {
    graph: &'a mut RenderGraph,
    cmd: &'a mut dyn RgCommands,
    state: RgFrameState,
}

impl RenderGraph {
    /// 开始一帧：绑定 swapchain，录制帧开始的 barrier
    ///
    /// # Panics
    /// 上一帧没有调用 `end_frame`
    pub fn begin_frame<'a>(&'a mut self, frame_info: RgFrameInfo, cmd: &'a mut dyn RgCommands) -> RgFrame<'a> {
        let _span = tracy_client::span!("RenderGraph::begin_frame");

        assert!(
            !self.recording,
            "RenderGraph: begin_frame called while frame {} is still recording, call end_frame first",
            self.frame_index
        );
        self.recording = true;
        self.resources.bind_swapchain(frame_info.swapchain_image, frame_info.swapchain_view);

        let mut frame = RgFrame {
            graph: self,
            cmd,
            state: RgFrameState {
                render_area: frame_info.render_area,
                queue_family_index: frame_info.queue_family_index,
                pass_cursor: 0,
                pass_open: false,
                deferred: Vec::new(),
            },
        };

        let barriers = frame.graph.frame_start_barriers();
        frame.record_barriers("frame start", vk::DependencyFlags::empty(), &barriers);
        frame
    }
}

// getters
impl RgFrame<'_> {
    /// 下一个要开始的 pass；pass 打开期间是当前 pass 的下一个
    #[inline]
    pub fn pass_cursor(&self) -> usize {
        self.state.pass_cursor
    }

    /// 当前打开的 pass
    #[inline]
    pub fn current_pass(&self) -> Option<&RgPass> {
        self.state.pass_open.then(|| &self.graph.passes[self.state.pass_cursor - 1])
    }

    #[inline]
    pub fn graph(&self) -> &RenderGraph {
        self.graph
    }

    /// pass 内部的绘制命令通过它录制
    #[inline]
    pub fn commands(&mut self) -> &mut dyn RgCommands {
        &mut *self.cmd
    }
}

// pass 回放
impl RgFrame<'_> {
    /// 开始下一个 pass
    ///
    /// 合并链中间的 pass 复用前一个 pass 打开的 region；compute pass 不开 region
    ///
    /// # Panics
    /// 上一个 pass 没有结束，或所有 pass 都已经执行过
    pub fn begin_pass(&mut self) -> &RgPass {
        assert!(
            !self.state.pass_open,
            "RenderGraph: begin_pass called before end_pass of \"{}\"",
            self.graph.passes[self.state.pass_cursor - 1].name
        );
        assert!(
            self.state.pass_cursor < self.graph.passes.len(),
            "RenderGraph: begin_pass called after all {} passes were recorded",
            self.graph.passes.len()
        );

        let pass_index = self.state.pass_cursor;
        self.state.pass_cursor += 1;
        self.state.pass_open = true;

        let pass = &self.graph.passes[pass_index];
        if !pass.compute && !pass.merged_with_prev {
            let rendering_info = self.rendering_info(pass);
            self.cmd.begin_rendering(&rendering_info);
        }

        &self.graph.passes[pass_index]
    }

    /// 结束当前 pass，录制到下一个使用者的 barrier
    ///
    /// # Panics
    /// 没有打开的 pass
    pub fn end_pass(&mut self) {
        assert!(self.state.pass_open, "RenderGraph: end_pass called without begin_pass");
        self.state.pass_open = false;

        let pass_index = self.state.pass_cursor - 1;
        let _span = tracy_client::span!("RgFrame::end_pass");

        let pass = &self.graph.passes[pass_index];
        let (name, compute, merged_with_next) = (pass.name.clone(), pass.compute, pass.merged_with_next);

        if !compute && !merged_with_next {
            self.cmd.end_rendering();
        }

        let (region, global): (Vec<_>, Vec<_>) =
            self.graph.pass_barriers(pass_index).into_iter().partition(RgImageBarrierDesc::is_region_local);

        if merged_with_next {
            // region 仍然打开，只能录制 region 内的依赖
            self.state.deferred.extend(global);
            self.record_barriers(&name, vk::DependencyFlags::BY_REGION, &region);
        } else {
            let deferred = std::mem::take(&mut self.state.deferred);
            self.record_barriers(&name, vk::DependencyFlags::empty(), &deferred);
            self.record_barriers(&name, vk::DependencyFlags::empty(), &global);
            self.record_barriers(&name, vk::DependencyFlags::BY_REGION, &region);
        }
    }

    /// begin_pass、录制 pass 内容、end_pass
    pub fn record_pass(&mut self, f: impl FnOnce(&RgPass, &mut dyn RgCommands)) {
        self.begin_pass();
        let pass_index = self.state.pass_cursor - 1;
        f(&self.graph.passes[pass_index], &mut *self.cmd);
        self.end_pass();
    }

    /// 结束本帧
    ///
    /// # Panics
    /// 还有 pass 没有执行，或最后一个 pass 没有结束
    pub fn end_frame(self) {
        assert!(!self.state.pass_open, "RenderGraph: end_frame called before end_pass");
        assert_eq!(
            self.state.pass_cursor,
            self.graph.passes.len(),
            "RenderGraph: end_frame called after {} of {} passes",
            self.state.pass_cursor,
            self.graph.passes.len()
        );
        debug_assert!(self.state.deferred.is_empty());

        self.graph.recording = false;
        self.graph.frame_index += 1;
    }
}

// 命令构造
impl RgFrame<'_> {
    fn attachment(&self, image_ref: &RgImageRef) -> GfxRenderingAttachment {
        GfxRenderingAttachment {
            image_view: self.graph.resources.resolve(image_ref.image).view,
            image_layout: image_ref.initial_layout,
            load_op: image_ref.load_op,
            store_op: image_ref.store_op,
            clear_value: image_ref.clear_value,
        }
    }

    fn rendering_info(&self, pass: &RgPass) -> GfxRenderingInfo {
        let color_attachments =
            pass.color_attachments.iter().map(|&ref_index| self.attachment(&pass.image_refs[ref_index])).collect_vec();
        let depth_attachment = pass.depth_attachment.map(|ref_index| self.attachment(&pass.image_refs[ref_index]));

        GfxRenderingInfo::new(
            color_attachments,
            depth_attachment,
            pass.render_area.unwrap_or(self.state.render_area),
        )
    }

    /// 录制一批 barrier，空批次不录制
    fn record_barriers(&mut self, label: &str, dependency_flags: vk::DependencyFlags, descs: &[RgImageBarrierDesc]) {
        if descs.is_empty() {
            return;
        }

        let level = if self.graph.debug_output { log::Level::Debug } else { log::Level::Trace };
        for desc in descs {
            log::log!(
                level,
                "RenderGraph: [{}] barrier \"{}\" {:?} -> {:?} ({:?})",
                label,
                self.graph.resources.resolve(desc.image).name,
                desc.src_state.layout,
                desc.dst_state.layout,
                dependency_flags
            );
        }

        let barriers = descs
            .iter()
            .map(|desc| {
                desc.to_gfx_barrier(self.graph.resources.resolve(desc.image).image, self.state.queue_family_index)
            })
            .collect::<Vec<GfxImageBarrier>>();
        self.cmd.image_memory_barrier(dependency_flags, &barriers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{RgRecordedCommand, RgRecordingCommands};
    use crate::graph::RgGraphBuilder;
    use crate::image_resource::RgImageResource;
    use crate::image_usage::RgImageUsage;
    use crate::pass::{RgImageRefDesc, RgPassDesc};
    use crate::resource_handle::{RgImageHandle, RgImageId};
    use ash::vk::Handle;

    fn import(builder: &mut RgGraphBuilder, name: &str, raw: u64, format: vk::Format) -> RgImageHandle {
        builder.import_image(
            name,
            vk::Image::from_raw(raw),
            vk::ImageView::from_raw(raw + 100),
            format,
            RgImageResource::infer_aspect(format),
        )
    }

    fn frame_info() -> RgFrameInfo {
        RgFrameInfo::new(vk::Extent2D { width: 1280, height: 720 }, 0)
            .with_swapchain(vk::Image::from_raw(900), vk::ImageView::from_raw(901))
    }

    fn run_frame(graph: &mut RenderGraph) -> RgRecordingCommands {
        let mut cmd = RgRecordingCommands::new();
        let mut frame = graph.begin_frame(frame_info(), &mut cmd);
        for _ in 0..frame.graph().pass_count() {
            frame.record_pass(|_, _| {});
        }
        frame.end_frame();
        cmd
    }

    /// 帧开始的 barrier 之后的命令
    fn after_frame_start(commands: &[RgRecordedCommand]) -> &[RgRecordedCommand] {
        match commands.first() {
            Some(RgRecordedCommand::ImageBarrier { .. }) => &commands[1..],
            _ => commands,
        }
    }

    #[test]
    fn test_write_then_sample_emits_one_global_barrier() {
        let mut builder = RgGraphBuilder::new();
        let image = import(&mut builder, "color", 1, vk::Format::R8G8B8A8_UNORM);
        builder
            .add_pass(RgPassDesc::new("write").use_image(image, RgImageUsage::COLOR_ATTACHMENT))
            .add_pass(RgPassDesc::new("sample").use_image(image, RgImageUsage::SAMPLED));
        let mut graph = builder.build();

        let cmd = run_frame(&mut graph);
        let commands = after_frame_start(cmd.commands());

        assert!(matches!(commands[0], RgRecordedCommand::BeginRendering(_)));
        assert!(matches!(commands[1], RgRecordedCommand::EndRendering));
        let RgRecordedCommand::ImageBarrier {
            dependency_flags,
            barriers,
        } = &commands[2]
        else {
            panic!("expected a barrier batch after the first pass, got {:?}", commands[2]);
        };
        assert_eq!(*dependency_flags, vk::DependencyFlags::empty());
        assert_eq!(barriers.len(), 1);
        assert_eq!(barriers[0].vk_image(), vk::Image::from_raw(1));
        assert_eq!(barriers[0].old_layout(), vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        assert_eq!(barriers[0].new_layout(), vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        assert!(barriers[0].src_access().contains(vk::AccessFlags2::COLOR_ATTACHMENT_WRITE));
        assert_eq!(barriers[0].dst_access(), vk::AccessFlags2::SHADER_SAMPLED_READ);
        assert_eq!(barriers[0].dst_stage(), vk::PipelineStageFlags2::FRAGMENT_SHADER);
    }

    #[test]
    fn test_merged_passes_share_one_region() {
        let mut builder = RgGraphBuilder::new();
        let color = import(&mut builder, "color", 1, vk::Format::R16G16B16A16_SFLOAT);
        let depth = import(&mut builder, "depth", 2, vk::Format::D32_SFLOAT);
        builder
            .add_pass(
                RgPassDesc::new("geometry")
                    .use_image(color, RgImageUsage::COLOR_ATTACHMENT | RgImageUsage::CLEARED)
                    .use_image(depth, RgImageUsage::DEPTH_ATTACHMENT | RgImageUsage::CLEARED),
            )
            .add_pass(
                RgPassDesc::new("resolve")
                    .use_image(color, RgImageUsage::INPUT_ATTACHMENT)
                    .use_image(depth, RgImageUsage::INPUT_ATTACHMENT),
            );
        let mut graph = builder.build();
        assert!(graph.pass(0).merged_with_next());

        let cmd = run_frame(&mut graph);
        assert_eq!(cmd.rendering_count(), 1);

        let Some(RgRecordedCommand::BeginRendering(info)) =
            cmd.commands().iter().find(|command| matches!(command, RgRecordedCommand::BeginRendering(_)))
        else {
            panic!("no rendering region recorded");
        };
        assert_eq!(info.color_attachments().len(), 1);
        assert_eq!(info.color_attachments()[0].image_layout, vk::ImageLayout::RENDERING_LOCAL_READ_KHR);
        assert_eq!(info.color_attachments()[0].load_op, vk::AttachmentLoadOp::CLEAR);
        let depth_attachment = info.depth_attachment().copied();
        assert_eq!(depth_attachment.map(|d| d.image_layout), Some(vk::ImageLayout::RENDERING_LOCAL_READ_KHR));
        assert_eq!(depth_attachment.map(|d| d.image_view), Some(vk::ImageView::from_raw(102)));
        assert_eq!(graph.pass(1).input_attachments(), &[0, 1]);

        // region 内只有 BY_REGION 的 barrier
        let commands = after_frame_start(cmd.commands());
        let end_index = commands.iter().position(|c| matches!(c, RgRecordedCommand::EndRendering)).unwrap();
        for command in &commands[..end_index] {
            if let RgRecordedCommand::ImageBarrier {
                dependency_flags,
                barriers,
            } = command
            {
                assert_eq!(*dependency_flags, vk::DependencyFlags::BY_REGION);
                assert_eq!(barriers.len(), 2);
            }
        }
    }

    #[test]
    #[should_panic(expected = "still recording")]
    fn test_begin_frame_twice_panics() {
        let mut builder = RgGraphBuilder::new();
        let image = import(&mut builder, "color", 1, vk::Format::R8G8B8A8_UNORM);
        builder.add_pass(RgPassDesc::new("draw").use_image(image, RgImageUsage::COLOR_ATTACHMENT));
        let mut graph = builder.build();

        let mut cmd = RgRecordingCommands::new();
        drop(graph.begin_frame(frame_info(), &mut cmd));
        let _ = graph.begin_frame(frame_info(), &mut cmd);
    }

    #[test]
    #[should_panic(expected = "second depth attachment")]
    fn test_two_depth_attachments_rejected_at_build() {
        let mut builder = RgGraphBuilder::new();
        let a = import(&mut builder, "a", 1, vk::Format::D32_SFLOAT);
        let b = import(&mut builder, "b", 2, vk::Format::D32_SFLOAT);
        builder.add_pass(
            RgPassDesc::new("shadow")
                .use_image(a, RgImageUsage::DEPTH_ATTACHMENT)
                .use_image(b, RgImageUsage::DEPTH_ATTACHMENT),
        );
        builder.build();
    }

    #[test]
    fn test_first_frame_starts_from_undefined() {
        let mut builder = RgGraphBuilder::new();
        let image = import(&mut builder, "color", 1, vk::Format::R8G8B8A8_UNORM);
        builder.add_pass(RgPassDesc::new("draw").use_image(image, RgImageUsage::COLOR_ATTACHMENT));
        let mut graph = builder.build();

        let cmd = run_frame(&mut graph);
        let Some(RgRecordedCommand::ImageBarrier {
            dependency_flags,
            barriers,
        }) = cmd.commands().first()
        else {
            panic!("first command should be the frame start barrier batch");
        };
        assert_eq!(*dependency_flags, vk::DependencyFlags::empty());
        assert_eq!(barriers.len(), 1);
        assert_eq!(barriers[0].old_layout(), vk::ImageLayout::UNDEFINED);
        assert_eq!(barriers[0].new_layout(), vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        assert_eq!(graph.frame_index(), 1);
        assert!(!graph.is_recording());
    }

    #[test]
    fn test_second_frame_starts_from_last_use() {
        let mut builder = RgGraphBuilder::new();
        let image = import(&mut builder, "history", 1, vk::Format::R8G8B8A8_UNORM);
        builder
            .add_pass(RgPassDesc::new("write").use_image(image, RgImageUsage::COLOR_ATTACHMENT))
            .add_pass(
                RgPassDesc::new("read").image_ref(
                    RgImageRefDesc::new(image, RgImageUsage::SAMPLED).with_final_layout(vk::ImageLayout::GENERAL),
                ),
            )
            .add_pass(RgPassDesc::new("present").use_image(RgImageId::Swapchain, RgImageUsage::COLOR_ATTACHMENT));
        let mut graph = builder.build();

        run_frame(&mut graph);
        let cmd = run_frame(&mut graph);
        let Some((_, barriers)) = cmd.barrier_batches().next() else {
            panic!("no frame start barriers");
        };

        let history = barriers.iter().find(|b| b.vk_image() == vk::Image::from_raw(1)).unwrap();
        assert_eq!(history.old_layout(), vk::ImageLayout::GENERAL);
        assert_eq!(history.src_access(), vk::AccessFlags2::SHADER_SAMPLED_READ);
        assert_eq!(history.new_layout(), vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

        // swapchain 每帧都是新图像
        let swapchain = barriers.iter().find(|b| b.vk_image() == vk::Image::from_raw(900)).unwrap();
        assert_eq!(swapchain.old_layout(), vk::ImageLayout::UNDEFINED);
    }

    #[test]
    fn test_chain_defers_global_barriers_to_chain_end() {
        let mut builder = RgGraphBuilder::new();
        let color = import(&mut builder, "color", 1, vk::Format::R8G8B8A8_UNORM);
        let depth = import(&mut builder, "depth", 2, vk::Format::D32_SFLOAT);
        builder
            .add_pass(
                RgPassDesc::new("geometry")
                    .use_image(color, RgImageUsage::COLOR_ATTACHMENT)
                    .use_image(depth, RgImageUsage::DEPTH_ATTACHMENT),
            )
            .add_pass(
                RgPassDesc::new("resolve")
                    .use_image(color, RgImageUsage::INPUT_ATTACHMENT)
                    .use_image(depth, RgImageUsage::DEPTH_ATTACHMENT),
            )
            .add_pass(RgPassDesc::new("post").use_image(color, RgImageUsage::SAMPLED));
        let mut graph = builder.build();
        assert!(graph.pass(0).merged_with_next());
        assert!(!graph.pass(1).merged_with_next());

        let cmd = run_frame(&mut graph);
        let commands = after_frame_start(cmd.commands());
        let end_index = commands.iter().position(|c| matches!(c, RgRecordedCommand::EndRendering)).unwrap();

        // region 内：geometry 结束时 color 的 BY_REGION barrier
        for command in &commands[..end_index] {
            if let RgRecordedCommand::ImageBarrier { dependency_flags, .. } = command {
                assert_eq!(*dependency_flags, vk::DependencyFlags::BY_REGION);
            }
        }
        // region 外：先是推迟的 depth barrier，然后是 resolve 自己的 color barrier
        let batches = commands[end_index + 1..]
            .iter()
            .filter_map(|command| match command {
                RgRecordedCommand::ImageBarrier {
                    dependency_flags,
                    barriers,
                } => Some((*dependency_flags, barriers.clone())),
                _ => None,
            })
            .collect_vec();
        assert!(batches.len() >= 2);
        assert_eq!(batches[0].0, vk::DependencyFlags::empty());
        assert_eq!(batches[0].1[0].vk_image(), vk::Image::from_raw(2));
        assert_eq!(batches[1].0, vk::DependencyFlags::empty());
        assert_eq!(batches[1].1[0].vk_image(), vk::Image::from_raw(1));
        assert_eq!(batches[1].1[0].new_layout(), vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    }

    #[test]
    fn test_three_pass_chain_defers_in_chain_order() {
        let mut builder = RgGraphBuilder::new();
        let color = import(&mut builder, "color", 1, vk::Format::R8G8B8A8_UNORM);
        let depth = import(&mut builder, "depth", 2, vk::Format::D32_SFLOAT);
        builder
            .add_pass(
                RgPassDesc::new("geometry")
                    .use_image(color, RgImageUsage::COLOR_ATTACHMENT)
                    .use_image(depth, RgImageUsage::DEPTH_ATTACHMENT),
            )
            .add_pass(
                RgPassDesc::new("decals")
                    .use_image(color, RgImageUsage::INPUT_ATTACHMENT)
                    .use_image(depth, RgImageUsage::DEPTH_ATTACHMENT),
            )
            .add_pass(
                RgPassDesc::new("resolve")
                    .use_image(color, RgImageUsage::INPUT_ATTACHMENT)
                    .image_ref(
                        RgImageRefDesc::new(depth, RgImageUsage::DEPTH_ATTACHMENT)
                            .with_stage(vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS),
                    ),
            )
            .add_pass(RgPassDesc::new("post").use_image(color, RgImageUsage::SAMPLED));
        let mut graph = builder.build();
        assert!(graph.pass(0).merged_with_next() && graph.pass(1).merged_with_next());
        assert!(!graph.pass(2).merged_with_next());

        let cmd = run_frame(&mut graph);
        assert_eq!(cmd.rendering_count(), 2);

        let commands = after_frame_start(cmd.commands());
        assert!(matches!(commands[0], RgRecordedCommand::BeginRendering(_)));
        let end_index = commands.iter().position(|c| matches!(c, RgRecordedCommand::EndRendering)).unwrap();

        // region 内：两次 color 的 input barrier，没有第二次 begin
        let in_region = commands[1..end_index]
            .iter()
            .map(|command| match command {
                RgRecordedCommand::ImageBarrier {
                    dependency_flags,
                    barriers,
                } => (*dependency_flags, barriers.clone()),
                other => panic!("unexpected command inside the region: {:?}", other),
            })
            .collect_vec();
        assert_eq!(in_region.len(), 2);
        for (dependency_flags, barriers) in &in_region {
            assert_eq!(*dependency_flags, vk::DependencyFlags::BY_REGION);
            assert_eq!(barriers.len(), 1);
            assert_eq!(barriers[0].vk_image(), vk::Image::from_raw(1));
            assert_eq!(barriers[0].dst_access(), vk::AccessFlags2::INPUT_ATTACHMENT_READ);
        }

        // region 外：推迟的两个 depth barrier 按链顺序放在同一批，然后是 resolve 自己的 color barrier
        let RgRecordedCommand::ImageBarrier {
            dependency_flags,
            barriers: deferred,
        } = &commands[end_index + 1]
        else {
            panic!("expected the deferred batch after the region, got {:?}", commands[end_index + 1]);
        };
        assert_eq!(*dependency_flags, vk::DependencyFlags::empty());
        assert_eq!(deferred.len(), 2);
        assert!(deferred.iter().all(|barrier| barrier.vk_image() == vk::Image::from_raw(2)));
        assert_eq!(
            deferred[0].dst_stage(),
            vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS
        );
        assert_eq!(deferred[1].dst_stage(), vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS);

        let RgRecordedCommand::ImageBarrier {
            dependency_flags,
            barriers: own,
        } = &commands[end_index + 2]
        else {
            panic!("expected the color batch of resolve, got {:?}", commands[end_index + 2]);
        };
        assert_eq!(*dependency_flags, vk::DependencyFlags::empty());
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].vk_image(), vk::Image::from_raw(1));
        assert_eq!(own[0].old_layout(), vk::ImageLayout::RENDERING_LOCAL_READ_KHR);
        assert_eq!(own[0].new_layout(), vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        assert!(matches!(commands[end_index + 3], RgRecordedCommand::BeginRendering(_)));
    }

    #[test]
    fn test_barrier_batches_classified_by_destination() {
        let (mut graph, _) = crate::example::deferred_example();
        let cmd = run_frame(&mut graph);

        // 第一批是帧开始的 barrier，在任何 region 之外
        for (dependency_flags, barriers) in cmd.barrier_batches().skip(1) {
            let region = dependency_flags.contains(vk::DependencyFlags::BY_REGION);
            for barrier in barriers {
                assert_eq!(
                    region,
                    barrier.dst_access().contains(vk::AccessFlags2::INPUT_ATTACHMENT_READ),
                    "barrier {:?} recorded with {:?}",
                    barrier,
                    dependency_flags
                );
            }
        }
    }

    #[test]
    fn test_render_area_per_pass() {
        let area = vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent: vk::Extent2D { width: 2048, height: 2048 },
        };
        let mut builder = RgGraphBuilder::new();
        let shadow = import(&mut builder, "shadow", 1, vk::Format::D32_SFLOAT);
        builder
            .add_pass(
                RgPassDesc::new("shadow")
                    .use_image(shadow, RgImageUsage::DEPTH_ATTACHMENT)
                    .with_render_area(area),
            )
            .add_pass(
                RgPassDesc::new("main")
                    .use_image(RgImageId::Swapchain, RgImageUsage::COLOR_ATTACHMENT)
                    .use_image(shadow, RgImageUsage::SAMPLED),
            );
        let mut graph = builder.build();

        let cmd = run_frame(&mut graph);
        let areas = cmd
            .commands()
            .iter()
            .filter_map(|command| match command {
                RgRecordedCommand::BeginRendering(info) => Some(info.render_area().extent.width),
                _ => None,
            })
            .collect_vec();
        assert_eq!(areas, vec![2048, 1280]);
    }

    #[test]
    fn test_compute_pass_has_no_region() {
        let mut builder = RgGraphBuilder::new();
        let image = import(&mut builder, "image", 1, vk::Format::R8G8B8A8_UNORM);
        builder
            .add_pass(
                RgPassDesc::new("dispatch")
                    .image_ref(
                        RgImageRefDesc::new(image, RgImageUsage::NO_READ)
                            .with_layout(vk::ImageLayout::GENERAL)
                            .with_stage(vk::PipelineStageFlags2::COMPUTE_SHADER)
                            .with_access(vk::AccessFlags2::SHADER_STORAGE_WRITE),
                    )
                    .compute(),
            )
            .add_pass(RgPassDesc::new("sample").use_image(image, RgImageUsage::SAMPLED));
        let mut graph = builder.build();

        let cmd = run_frame(&mut graph);
        assert_eq!(cmd.rendering_count(), 1);
        let barrier = cmd.barrier_batches().nth(1).map(|(_, barriers)| barriers[0]).unwrap();
        assert_eq!(barrier.src_stage(), vk::PipelineStageFlags2::COMPUTE_SHADER);
        assert_eq!(barrier.old_layout(), vk::ImageLayout::GENERAL);
    }

    #[test]
    #[should_panic(expected = "after 1 of 2 passes")]
    fn test_end_frame_requires_all_passes() {
        let mut builder = RgGraphBuilder::new();
        let image = import(&mut builder, "color", 1, vk::Format::R8G8B8A8_UNORM);
        builder
            .add_pass(RgPassDesc::new("a").use_image(image, RgImageUsage::COLOR_ATTACHMENT))
            .add_pass(RgPassDesc::new("b").use_image(image, RgImageUsage::SAMPLED));
        let mut graph = builder.build();

        let mut cmd = RgRecordingCommands::new();
        let mut frame = graph.begin_frame(frame_info(), &mut cmd);
        frame.begin_pass();
        frame.end_pass();
        frame.end_frame();
    }
}
