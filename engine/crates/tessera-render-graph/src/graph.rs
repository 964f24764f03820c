//! RenderGraph 构建
//!
//! 构建阶段只做一次：规范化 pass、合并相邻 pass、为每张图像建立使用链。
//! 之后拓扑不再变化，每帧由 executor 按同一份计划回放。

use ash::vk;
use slotmap::SecondaryMap;

use crate::barrier::RgImageBarrierDesc;
use crate::image_resource::RgImageResource;
use crate::merge::merge_passes;
use crate::pass::{RgImageRef, RgPass, RgPassDesc};
use crate::resource_handle::{RgImageHandle, RgImageId};
use crate::resource_registry::RgResourceRegistry;
use crate::use_chain::{RgImageUse, RgUseChain};

/// RenderGraph 构建器
///
/// # 使用流程
///
/// 1. 创建 builder: `RgGraphBuilder::new()`
/// 2. 导入外部图像: `builder.import_image(...)`
/// 3. 按执行顺序添加 Pass: `builder.add_pass(...)`
/// 4. 构建: `builder.build()`
/// 5. 每帧: `graph.begin_frame(...)`，逐个 `begin_pass`/`end_pass`，最后 `end_frame`
#[derive(Default)]
pub struct RgGraphBuilder {
    /// 资源注册表
    resources: RgResourceRegistry,
    /// Pass 声明（按添加顺序，即执行顺序）
    pass_descs: Vec<RgPassDesc>,
}

impl RgGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 导入外部图像
    ///
    /// graph 不拥有图像，调用方保证图像在 graph 使用期间有效
    pub fn import_image(
        &mut self,
        name: impl Into<String>,
        image: vk::Image,
        view: vk::ImageView,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
    ) -> RgImageHandle {
        self.resources.register_image(RgImageResource::new(name, image, view, format, aspect))
    }

    /// 添加 Pass
    ///
    /// # Panics
    /// pass 引用了未导入的图像
    pub fn add_pass(&mut self, pass_desc: RgPassDesc) -> &mut Self {
        for (ref_index, image_ref) in pass_desc.image_refs.iter().enumerate() {
            assert!(
                self.resources.contains(image_ref.image),
                "RenderGraph: pass \"{}\" ref #{} uses an image that was not imported: {:?}",
                pass_desc.name,
                ref_index,
                image_ref.image
            );
        }

        self.pass_descs.push(pass_desc);
        self
    }

    /// 构建渲染图
    ///
    /// # Panics
    /// pass 的附件配置非法，见 [`RgPass::from_desc`]
    pub fn build(self) -> RenderGraph {
        let _span = tracy_client::span!("RgGraphBuilder::build");

        let mut passes = self.pass_descs.iter().map(RgPass::from_desc).collect::<Vec<_>>();
        let merge_count = merge_passes(&mut passes);

        // 使用链在合并之后建立，合并时补齐的引用也算作使用
        let mut image_chains = SecondaryMap::with_capacity(self.resources.image_count());
        for (handle, _) in self.resources.iter_images() {
            image_chains.insert(handle, RgUseChain::build(RgImageId::Image(handle), &passes));
        }
        let swapchain_chain = RgUseChain::build(RgImageId::Swapchain, &passes);

        log::info!(
            "RenderGraph: built {} passes over {} images (+swapchain), {} merged joins",
            passes.len(),
            self.resources.image_count(),
            merge_count
        );

        RenderGraph {
            resources: self.resources,
            passes,
            image_chains,
            swapchain_chain,
            debug_output: false,
            recording: false,
            frame_index: 0,
        }
    }
}

/// 构建完成的渲染图
///
/// 持有资源、规范化后的 pass 和使用链，拓扑在构建后不再变化
pub struct RenderGraph {
    pub(crate) resources: RgResourceRegistry,
    pub(crate) passes: Vec<RgPass>,
    pub(crate) image_chains: SecondaryMap<RgImageHandle, RgUseChain>,
    pub(crate) swapchain_chain: RgUseChain,

    /// 是否以 debug 级别输出每个 barrier
    pub(crate) debug_output: bool,
    /// begin_frame 之后、end_frame 之前为 true
    pub(crate) recording: bool,
    /// 已完成的帧数
    pub(crate) frame_index: u64,
}

// getters
impl RenderGraph {
    #[inline]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    #[inline]
    pub fn pass(&self, index: usize) -> &RgPass {
        &self.passes[index]
    }

    #[inline]
    pub fn passes(&self) -> &[RgPass] {
        &self.passes
    }

    #[inline]
    pub fn resources(&self) -> &RgResourceRegistry {
        &self.resources
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// 是否有帧正在录制
    #[inline]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// 图像的使用链
    ///
    /// # Panics
    /// 句柄不属于这个 graph
    pub fn use_chain(&self, image: RgImageId) -> &RgUseChain {
        match image {
            RgImageId::Image(handle) => self
                .image_chains
                .get(handle)
                .unwrap_or_else(|| panic!("RenderGraph: no use chain for {:?}", handle)),
            RgImageId::Swapchain => &self.swapchain_chain,
        }
    }

    #[inline]
    pub(crate) fn image_ref(&self, image_use: RgImageUse) -> &RgImageRef {
        &self.passes[image_use.pass_index].image_refs[image_use.ref_index]
    }
}

// barrier 计算
impl RenderGraph {
    /// `pass_index` 结束时需要的 barrier：每张图像从本 pass 的最终状态到下一个使用者的初始状态
    ///
    /// 同一 pass 多次引用同一图像时只有使用链记录的那个引用产生 barrier
    pub fn pass_barriers(&self, pass_index: usize) -> Vec<RgImageBarrierDesc> {
        let pass = &self.passes[pass_index];
        let mut barriers = Vec::new();

        for (ref_index, image_ref) in pass.image_refs.iter().enumerate() {
            if image_ref.is_fake() {
                continue;
            }

            let chain = self.use_chain(image_ref.image);
            if chain.use_from(pass_index) != Some(RgImageUse { pass_index, ref_index }) {
                continue;
            }
            let Some(next_use) = chain.next_use_after(pass_index) else {
                continue;
            };

            let dst_ref = self.image_ref(next_use);
            assert_eq!(
                dst_ref.image, image_ref.image,
                "RenderGraph: use chain of {:?} points at a ref of another image",
                image_ref.image
            );

            let aspect = self.resources.resolve(image_ref.image).aspect;
            barriers.push(
                RgImageBarrierDesc::new(image_ref.image, image_ref.final_state(), dst_ref.initial_state(), next_use)
                    .with_aspect(aspect),
            );
        }

        barriers
    }

    /// 帧开始时的 barrier：每张图像（含 swapchain）从上一帧最后的状态到本帧第一个使用者
    ///
    /// 首帧没有上一帧的状态，使用累积的 stage/access 和 UNDEFINED layout；
    /// swapchain 每帧都是新 acquire 的图像，始终按首帧处理
    pub fn frame_start_barriers(&self) -> Vec<RgImageBarrierDesc> {
        self.resources
            .iter_ids()
            .filter_map(|image| {
                let chain = self.use_chain(image);
                let first_use = chain.first_use()?;

                let src_state = match chain.last_use() {
                    Some(last_use) if self.frame_index > 0 && image != RgImageId::Swapchain => {
                        self.image_ref(last_use).final_state()
                    }
                    _ => chain.cumulative_state(),
                };

                let aspect = self.resources.resolve(image).aspect;
                Some(
                    RgImageBarrierDesc::new(image, src_state, self.image_ref(first_use).initial_state(), first_use)
                        .with_aspect(aspect),
                )
            })
            .collect()
    }
}
