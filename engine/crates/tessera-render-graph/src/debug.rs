//! 调试输出：执行计划打印和 Graphviz 导出

use std::path::Path;

use anyhow::Context;
use ash::vk;
use itertools::Itertools;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::barrier::RgImageBarrierDesc;
use crate::graph::RenderGraph;
use crate::resource_handle::RgImageId;

/// DOT 图中的节点
#[derive(Debug)]
enum RgDotNode {
    Image { name: String, format: vk::Format },
    Swapchain,
    Pass { name: String, compute: bool },
}

/// DOT 图中的边
#[derive(Debug)]
enum RgDotEdge {
    /// 相邻 pass 的执行顺序
    Sequence { merged: bool },
    /// pass 写入图像
    Write,
    /// pass 读取图像
    Read,
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

impl RgDotNode {
    fn attributes(&self) -> String {
        match self {
            Self::Image { name, format } => format!("label=\"{}\\n{:?}\" shape=ellipse", escape(name), format),
            Self::Swapchain => "label=\"Swapchain\" shape=doubleoctagon".to_string(),
            Self::Pass { name, compute } => format!(
                "label=\"{}\" shape=box style=filled fillcolor={}",
                escape(name),
                if *compute { "lightblue" } else { "lightgrey" }
            ),
        }
    }
}

impl RgDotEdge {
    fn attributes(&self) -> String {
        match self {
            Self::Sequence { merged: false } => "style=bold".to_string(),
            Self::Sequence { merged: true } => "style=\"bold,dashed\" label=\"merged\"".to_string(),
            Self::Write => String::new(),
            Self::Read => "style=dotted".to_string(),
        }
    }
}

// 调试开关
impl RenderGraph {
    /// 开启后每个 barrier 以 debug 级别输出，否则为 trace
    #[inline]
    pub fn set_debug_output(&mut self, debug_output: bool) {
        self.debug_output = debug_output;
    }

    #[inline]
    pub fn debug_output(&self) -> bool {
        self.debug_output
    }
}

// Graphviz
impl RenderGraph {
    fn dot_graph(&self) -> DiGraph<RgDotNode, RgDotEdge> {
        let mut graph = DiGraph::with_capacity(self.resources.image_count() + 1 + self.passes.len(), 0);

        let image_nodes = self
            .resources
            .iter_ids()
            .map(|id| {
                let node = match id {
                    RgImageId::Image(_) => {
                        let image = self.resources.resolve(id);
                        RgDotNode::Image {
                            name: image.name.clone(),
                            format: image.format,
                        }
                    }
                    RgImageId::Swapchain => RgDotNode::Swapchain,
                };
                (id, graph.add_node(node))
            })
            .collect::<Vec<(RgImageId, NodeIndex)>>();
        let image_node = |id: RgImageId| image_nodes.iter().find(|(node_id, _)| *node_id == id).map(|(_, node)| *node);

        let mut prev_pass: Option<NodeIndex> = None;
        for pass in &self.passes {
            let pass_node = graph.add_node(RgDotNode::Pass {
                name: pass.name.clone(),
                compute: pass.compute,
            });
            if let Some(prev) = prev_pass {
                graph.add_edge(
                    prev,
                    pass_node,
                    RgDotEdge::Sequence {
                        merged: pass.merged_with_prev,
                    },
                );
            }
            prev_pass = Some(pass_node);

            for (ref_index, image_ref) in pass.image_refs.iter().enumerate() {
                // 同一 pass 对同一图像只画一条边，占位引用不画
                if pass.find_ref(image_ref.image) != Some(ref_index) {
                    continue;
                }
                let Some(image_node) = image_node(image_ref.image) else {
                    continue;
                };

                if image_ref.initial_state().is_write() {
                    graph.add_edge(pass_node, image_node, RgDotEdge::Write);
                } else {
                    graph.add_edge(image_node, pass_node, RgDotEdge::Read);
                }
            }
        }

        graph
    }

    /// 生成 Graphviz DOT 文本
    ///
    /// 图像为椭圆节点，pass 为方框；相邻 pass 之间是粗线，合并的用虚线
    pub fn to_dot(&self) -> String {
        let graph = self.dot_graph();
        let dot = Dot::with_attr_getters(
            &graph,
            &[Config::NodeNoLabel, Config::EdgeNoLabel, Config::GraphContentOnly],
            &|_, edge| edge.weight().attributes(),
            &|_, (_, node)| node.attributes(),
        );

        format!("digraph render_graph {{\n{:?}}}\n", dot)
    }

    /// 把 DOT 文本写到文件，目录不存在时自动创建
    pub fn export_dot(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).with_context(|| format!("创建目录失败: {:?}", dir))?;
        }
        std::fs::write(path, self.to_dot()).with_context(|| format!("写入 DOT 文件失败: {:?}", path))?;

        log::info!("RenderGraph: exported dot to {}", path.display());
        Ok(())
    }
}

// 执行计划
impl RenderGraph {
    /// 打印执行计划
    ///
    /// 输出每个 pass 的引用、region 开关情况，以及 pass 结束时的 barrier（按 BY_REGION / 全局 / 推迟分类）
    pub fn print_execution_plan(&self) {
        let merged_joins = self.passes.iter().filter(|pass| pass.merged_with_next).count();

        log::info!("╔══════════════════════════════════════════════════════════════════╗");
        log::info!("║              RenderGraph Execution Plan                          ║");
        log::info!("╠══════════════════════════════════════════════════════════════════╣");
        log::info!(
            "║ Total Passes: {}  |  Merged Joins: {}  |  Order: [{}]",
            self.passes.len(),
            merged_joins,
            self.passes
                .iter()
                .map(|pass| pass.name.as_str())
                .collect::<Vec<_>>()
                .join(" → ")
        );
        log::info!("╚══════════════════════════════════════════════════════════════════╝");

        let frame_start = self.frame_start_barriers();
        if !frame_start.is_empty() {
            log::info!("");
            log::info!("Frame start barriers (frame {}):", self.frame_index);
            for barrier in &frame_start {
                self.print_barrier("🔒", barrier);
            }
        }

        for (pass_index, pass) in self.passes.iter().enumerate() {
            log::info!("");
            log::info!("┌─────────────────────────────────────────────────────────────────┐");
            log::info!(
                "│ [{}/{}] Pass: \"{}\"{}",
                pass_index + 1,
                self.passes.len(),
                pass.name,
                if pass.compute { " (compute)" } else { "" }
            );
            let region = match (pass.merged_with_prev, pass.merged_with_next) {
                _ if pass.compute => "no rendering region",
                (false, false) => "begin + end rendering",
                (false, true) => "begin rendering, merged with next",
                (true, true) => "inside merged region",
                (true, false) => "merged with prev, end rendering",
            };
            log::info!("│ Region: {}", region);
            log::info!("├─────────────────────────────────────────────────────────────────┤");

            for (ref_index, image_ref) in pass.image_refs.iter().enumerate() {
                let name = &self.resources.resolve(image_ref.image).name;
                let mut roles = String::new();
                if pass.color_attachments.contains(&ref_index) {
                    roles.push_str(" color");
                }
                if pass.depth_attachment == Some(ref_index) {
                    roles.push_str(" depth");
                }
                if pass.input_attachments.contains(&ref_index) {
                    roles.push_str(" input");
                }

                log::info!(
                    "│ #{} {} \"{}\" {:?}{} @ {:?} → {:?} (stage: {}, access: {}, load: {:?})",
                    ref_index,
                    if image_ref.is_fake() { "👻" } else if image_ref.initial_state().is_write() { "✏️ " } else { "📖" },
                    name,
                    image_ref.usage,
                    roles,
                    image_ref.initial_layout,
                    image_ref.final_layout,
                    format_pipeline_stage(image_ref.stage),
                    format_access_flags(image_ref.access),
                    image_ref.load_op
                );
            }

            let barriers = self.pass_barriers(pass_index);
            if barriers.is_empty() {
                log::info!("│ No barriers required");
            } else {
                log::info!("├─────────────────────────────────────────────────────────────────┤");
                log::info!("│ Barriers at pass end: {}", barriers.len());
                for barrier in &barriers {
                    let icon = if barrier.is_region_local() {
                        "🧩"
                    } else if pass.merged_with_next {
                        "⏳"
                    } else {
                        "🔒"
                    };
                    self.print_barrier(icon, barrier);
                }
            }

            log::info!("└─────────────────────────────────────────────────────────────────┘");
        }

        log::info!("");
        log::info!("🧩 BY_REGION  🔒 global  ⏳ deferred to chain end");
        log::info!("═══════════════════════ End of Execution Plan ═══════════════════════");
    }

    fn print_barrier(&self, icon: &str, barrier: &RgImageBarrierDesc) {
        let name = &self.resources.resolve(barrier.image).name;
        let consumer = &self.passes[barrier.dst_use.pass_index].name;
        let layout_change = if barrier.src_state.layout != barrier.dst_state.layout {
            format!("{:?} → {:?}", barrier.src_state.layout, barrier.dst_state.layout)
        } else {
            format!("{:?} (no layout change)", barrier.src_state.layout)
        };

        log::info!("│   {} Image \"{}\" → \"{}\" #{}:", icon, name, consumer, barrier.dst_use.ref_index);
        log::info!("│       Layout: {}", layout_change);
        log::info!(
            "│       Stage:  {} → {}",
            format_pipeline_stage(barrier.src_state.stage),
            format_pipeline_stage(barrier.dst_state.stage)
        );
        log::info!(
            "│       Access: {} → {}",
            format_access_flags(barrier.src_state.access),
            format_access_flags(barrier.dst_state.access)
        );
        log::info!("│       Aspect: {:?}", barrier.aspect);
    }
}

/// 格式化 PipelineStageFlags2 为可读字符串
pub fn format_pipeline_stage(stage: vk::PipelineStageFlags2) -> String {
    const NAMES: &[(vk::PipelineStageFlags2, &str)] = &[
        (vk::PipelineStageFlags2::TOP_OF_PIPE, "TOP_OF_PIPE"),
        (vk::PipelineStageFlags2::BOTTOM_OF_PIPE, "BOTTOM_OF_PIPE"),
        (vk::PipelineStageFlags2::VERTEX_SHADER, "VERTEX_SHADER"),
        (vk::PipelineStageFlags2::FRAGMENT_SHADER, "FRAGMENT_SHADER"),
        (vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS, "EARLY_FRAGMENT_TESTS"),
        (vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS, "LATE_FRAGMENT_TESTS"),
        (vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT, "COLOR_ATTACHMENT_OUTPUT"),
        (vk::PipelineStageFlags2::COMPUTE_SHADER, "COMPUTE_SHADER"),
        (vk::PipelineStageFlags2::TRANSFER, "TRANSFER"),
        (vk::PipelineStageFlags2::ALL_GRAPHICS, "ALL_GRAPHICS"),
        (vk::PipelineStageFlags2::ALL_COMMANDS, "ALL_COMMANDS"),
    ];

    if stage == vk::PipelineStageFlags2::NONE {
        return "NONE".to_string();
    }
    let stages = NAMES.iter().filter(|(flag, _)| stage.contains(*flag)).map(|(_, name)| *name).collect::<Vec<_>>();
    if stages.is_empty() { format!("{:?}", stage) } else { stages.join(" | ") }
}

/// 格式化 AccessFlags2 为可读字符串
pub fn format_access_flags(access: vk::AccessFlags2) -> String {
    const NAMES: &[(vk::AccessFlags2, &str)] = &[
        (vk::AccessFlags2::INPUT_ATTACHMENT_READ, "INPUT_ATTACH_READ"),
        (vk::AccessFlags2::SHADER_SAMPLED_READ, "SHADER_SAMPLED_READ"),
        (vk::AccessFlags2::SHADER_STORAGE_READ, "STORAGE_READ"),
        (vk::AccessFlags2::SHADER_STORAGE_WRITE, "STORAGE_WRITE"),
        (vk::AccessFlags2::COLOR_ATTACHMENT_READ, "COLOR_ATTACH_READ"),
        (vk::AccessFlags2::COLOR_ATTACHMENT_WRITE, "COLOR_ATTACH_WRITE"),
        (vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ, "DEPTH_ATTACH_READ"),
        (vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE, "DEPTH_ATTACH_WRITE"),
        (vk::AccessFlags2::TRANSFER_READ, "TRANSFER_READ"),
        (vk::AccessFlags2::TRANSFER_WRITE, "TRANSFER_WRITE"),
        (vk::AccessFlags2::MEMORY_READ, "MEMORY_READ"),
        (vk::AccessFlags2::MEMORY_WRITE, "MEMORY_WRITE"),
    ];

    if access == vk::AccessFlags2::NONE {
        return "NONE".to_string();
    }
    let text = NAMES.iter().filter(|(flag, _)| access.contains(*flag)).map(|(_, name)| *name).join(" | ");
    if text.is_empty() { format!("{:?}", access) } else { text }
}
