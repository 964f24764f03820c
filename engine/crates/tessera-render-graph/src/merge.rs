//! 相邻 pass 合并
//!
//! 两个相邻 pass 的引用列表按下标对齐、且没有"采样 vs 附件写入"冲突时，
//! 可以放进同一个 rendering region：中间不用结束 region，也不需要完整的 barrier，
//! input attachment 数据留在 tile 上，通过 local read 读取。
//! 合并可以传递，连续多个可合并的 pass 组成一个 run，只有 run 的首尾开关 region。

use std::fmt;

use ash::vk;
use itertools::Itertools;

use crate::pass::{MAX_COLOR_ATTACHMENTS, MAX_INPUT_ATTACHMENTS, RgPass};

/// 合并后 region 的附件集合，下标指向 run 内每个 pass 共同的引用列表
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgMergedAttachments {
    pub color_attachments: Vec<usize>,
    pub input_attachments: Vec<usize>,
    pub depth_attachment: Option<usize>,
    /// run 内任一 pass 采样读取的下标
    pub sampled_refs: Vec<usize>,
}

/// 不能合并的原因
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RgMergeRejection {
    /// compute pass 不开启 region
    ComputePass,
    /// 同一下标引用了不同的图像
    ImageMismatch { ref_index: usize },
    /// 一个 pass 采样另一个 pass 作为附件写入的图像
    SampledAttachmentConflict { ref_index: usize },
    /// 两个深度附件不在同一下标
    DepthMismatch,
    /// 合并后附件数超过上限
    TooManyAttachments,
}

impl fmt::Display for RgMergeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ComputePass => write!(f, "compute pass"),
            Self::ImageMismatch { ref_index } => write!(f, "different images at ref #{ref_index}"),
            Self::SampledAttachmentConflict { ref_index } => {
                write!(f, "sampled vs attachment write at ref #{ref_index}")
            }
            Self::DepthMismatch => write!(f, "depth attachments at different refs"),
            Self::TooManyAttachments => write!(f, "too many attachments after merge"),
        }
    }
}

/// 判断 `src` 和紧随其后的 `dst` 能否合并，不修改任何 pass
pub fn try_merge(src: &RgPass, dst: &RgPass) -> Result<RgMergedAttachments, RgMergeRejection> {
    if src.compute || dst.compute {
        return Err(RgMergeRejection::ComputePass);
    }

    // 较短的列表必须是较长列表的前缀
    for (ref_index, (src_ref, dst_ref)) in src.image_refs.iter().zip(&dst.image_refs).enumerate() {
        if src_ref.image != dst_ref.image {
            return Err(RgMergeRejection::ImageMismatch { ref_index });
        }

        let (src_state, dst_state) = (src_ref.initial_state(), dst_ref.initial_state());
        if (src_state.is_sampled_read() && dst_state.is_attachment_write())
            || (dst_state.is_sampled_read() && src_state.is_attachment_write())
        {
            return Err(RgMergeRejection::SampledAttachmentConflict { ref_index });
        }

        // src 可能已经是 run 的一部分，它的附件集合和采样集合覆盖了整个 region
        let is_region_attachment = |pass: &RgPass| {
            pass.color_attachments.contains(&ref_index) || pass.depth_attachment == Some(ref_index)
        };
        let is_region_sampled = |pass: &RgPass| pass.sampled_refs.contains(&ref_index);
        if (dst_state.is_sampled_read() && is_region_attachment(src))
            || (src_state.is_sampled_read() && is_region_attachment(dst))
            || (dst_state.is_attachment_write() && is_region_sampled(src))
            || (src_state.is_attachment_write() && is_region_sampled(dst))
        {
            return Err(RgMergeRejection::SampledAttachmentConflict { ref_index });
        }
    }

    let depth_attachment = match (src.depth_attachment, dst.depth_attachment) {
        (Some(a), Some(b)) if a != b => return Err(RgMergeRejection::DepthMismatch),
        (a, b) => a.or(b),
    };

    let color_attachments = union_sorted(&src.color_attachments, &dst.color_attachments);
    let input_attachments = union_sorted(&src.input_attachments, &dst.input_attachments);
    if color_attachments.len() > MAX_COLOR_ATTACHMENTS || input_attachments.len() > MAX_INPUT_ATTACHMENTS {
        return Err(RgMergeRejection::TooManyAttachments);
    }

    Ok(RgMergedAttachments {
        color_attachments,
        input_attachments,
        depth_attachment,
        sampled_refs: union_sorted(&src.sampled_refs, &dst.sampled_refs),
    })
}

fn union_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
    itertools::merge(a, b).copied().dedup().collect_vec()
}

/// 从前往后尝试合并每一对相邻 pass，返回合并成功的次数
pub fn merge_passes(passes: &mut [RgPass]) -> usize {
    let mut merge_count = 0;

    for dst_index in 1..passes.len() {
        let merged = match try_merge(&passes[dst_index - 1], &passes[dst_index]) {
            Ok(merged) => merged,
            Err(reason) => {
                log::debug!(
                    "RenderGraph: keep \"{}\" and \"{}\" apart: {}",
                    passes[dst_index - 1].name,
                    passes[dst_index].name,
                    reason
                );
                continue;
            }
        };

        passes[dst_index - 1].merged_with_next = true;
        passes[dst_index].merged_with_prev = true;

        let run_start = (0..dst_index).rev().find(|&k| !passes[k].merged_with_prev).unwrap_or(0);
        apply_merge(&mut passes[run_start..=dst_index], &merged);
        merge_count += 1;

        log::debug!(
            "RenderGraph: merge \"{}\" into the region of \"{}\" ({} passes)",
            passes[dst_index].name,
            passes[run_start].name,
            dst_index - run_start + 1
        );
    }

    merge_count
}

/// 把合并结果写回整个 run
fn apply_merge(run: &mut [RgPass], merged: &RgMergedAttachments) {
    // 所有 pass 补齐到最长的引用列表，region 的附件下标对每个 pass 都有效
    let longest = run.iter().map(|pass| pass.image_refs.len()).max().unwrap_or(0);
    let template = run
        .iter()
        .rev()
        .find(|pass| pass.image_refs.len() == longest)
        .map(|pass| pass.image_refs.clone())
        .unwrap_or_default();
    for pass in run.iter_mut() {
        let len = pass.image_refs.len();
        pass.image_refs.extend_from_slice(&template[len..]);
    }

    // region 内 layout 不能变化，任何一个 pass 以 input attachment 读取的图像全部改用 local read
    let local_read = (0..longest)
        .filter(|&j| run.iter().any(|pass| pass.image_refs[j].initial_state().is_input_attachment_read()))
        .collect_vec();

    for pass in run.iter_mut() {
        pass.color_attachments.clone_from(&merged.color_attachments);
        pass.input_attachments.clone_from(&merged.input_attachments);
        pass.depth_attachment = merged.depth_attachment;
        pass.sampled_refs.clone_from(&merged.sampled_refs);

        for &j in &local_read {
            let image_ref = &mut pass.image_refs[j];
            image_ref.initial_layout = vk::ImageLayout::RENDERING_LOCAL_READ_KHR;
            image_ref.final_layout = vk::ImageLayout::RENDERING_LOCAL_READ_KHR;
        }
    }
}
