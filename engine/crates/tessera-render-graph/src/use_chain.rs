//! 图像的使用链
//!
//! 对每张图像（含 swapchain）记录"从某个位置开始，下一个使用它的 pass 是谁"。
//! `entries[i]` 是位置 `i` 及之后第一个引用该图像的 (pass, ref)，共 `pass_count + 1` 项，
//! 最后一项永远为空。pass `p` 结束时查询 `entries[p + 1]` 即可找到下一个消费者。

use crate::pass::RgPass;
use crate::resource_handle::RgImageId;
use crate::resource_state::RgImageState;

/// 一次使用：第几个 pass 的第几个引用
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RgImageUse {
    pub pass_index: usize,
    pub ref_index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgUseChain {
    entries: Vec<Option<RgImageUse>>,
    /// 所有使用的 stage/access 之和，layout 为 UNDEFINED，只用于首帧
    cumulative: RgImageState,
    /// 一帧中最后一次使用
    last_use: Option<RgImageUse>,
}

// new & init
impl RgUseChain {
    /// 按 pass 顺序扫描一遍
    ///
    /// 每个 pass 只记录第一个非占位引用；遇到使用时把上一次使用之后所有未填的位置都指向它
    pub fn build(image: RgImageId, passes: &[RgPass]) -> Self {
        let mut entries = vec![None; passes.len() + 1];
        let mut cumulative = RgImageState::UNDEFINED;
        let mut last_use = None;
        let mut unfilled = 0;

        for (pass_index, pass) in passes.iter().enumerate() {
            let Some(ref_index) = pass.find_ref(image) else {
                continue;
            };

            let image_use = RgImageUse { pass_index, ref_index };
            entries[unfilled..=pass_index].fill(Some(image_use));
            unfilled = pass_index + 1;

            cumulative = cumulative.accumulate(pass.image_refs[ref_index].initial_state());
            last_use = Some(image_use);
        }

        Self {
            entries,
            cumulative,
            last_use,
        }
    }
}

// getters
impl RgUseChain {
    /// 位置 `position` 及之后的第一次使用
    #[inline]
    pub fn use_from(&self, position: usize) -> Option<RgImageUse> {
        self.entries.get(position).copied().flatten()
    }

    #[inline]
    pub fn first_use(&self) -> Option<RgImageUse> {
        self.use_from(0)
    }

    /// `pass_index` 之后的下一次使用
    #[inline]
    pub fn next_use_after(&self, pass_index: usize) -> Option<RgImageUse> {
        self.use_from(pass_index + 1)
    }

    #[inline]
    pub fn last_use(&self) -> Option<RgImageUse> {
        self.last_use
    }

    #[inline]
    pub fn cumulative_state(&self) -> RgImageState {
        self.cumulative
    }

    #[inline]
    pub fn entries(&self) -> &[Option<RgImageUse>] {
        &self.entries
    }

    /// 沿链按 pass 顺序访问每一次使用
    pub fn uses(&self) -> impl Iterator<Item = RgImageUse> + '_ {
        std::iter::successors(self.first_use(), move |prev| self.next_use_after(prev.pass_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_usage::RgImageUsage;
    use crate::pass::RgPassDesc;
    use crate::resource_handle::RgImageHandle;
    use ash::vk;
    use slotmap::SlotMap;

    fn handles(count: usize) -> Vec<RgImageHandle> {
        let mut map: SlotMap<RgImageHandle, ()> = SlotMap::with_key();
        (0..count).map(|_| map.insert(())).collect()
    }

    fn passes(descs: &[RgPassDesc]) -> Vec<RgPass> {
        descs.iter().map(RgPass::from_desc).collect()
    }

    #[test]
    fn test_chain_fills_gaps() {
        let h = handles(2);
        let passes = passes(&[
            RgPassDesc::new("a").use_image(h[0], RgImageUsage::COLOR_ATTACHMENT),
            RgPassDesc::new("b").use_image(h[1], RgImageUsage::COLOR_ATTACHMENT),
            RgPassDesc::new("c").use_image(h[1], RgImageUsage::SAMPLED),
            RgPassDesc::new("d")
                .use_image(h[1], RgImageUsage::COLOR_ATTACHMENT)
                .use_image(h[0], RgImageUsage::SAMPLED),
        ]);
        let chain = RgUseChain::build(h[0].into(), &passes);

        let first = RgImageUse { pass_index: 0, ref_index: 0 };
        let last = RgImageUse { pass_index: 3, ref_index: 1 };
        assert_eq!(chain.entries(), &[Some(first), Some(last), Some(last), Some(last), None]);
        assert_eq!(chain.next_use_after(0), Some(last));
        assert_eq!(chain.next_use_after(3), None);
        assert_eq!(chain.last_use(), Some(last));
    }

    #[test]
    fn test_chain_visits_every_user_once() {
        let h = handles(2);
        let passes = passes(&[
            RgPassDesc::new("a").use_image(h[0], RgImageUsage::COLOR_ATTACHMENT),
            RgPassDesc::new("b").use_image(h[1], RgImageUsage::COLOR_ATTACHMENT),
            RgPassDesc::new("c")
                .use_image(h[0], RgImageUsage::SAMPLED)
                .use_image(h[0], RgImageUsage::INPUT_ATTACHMENT),
            RgPassDesc::new("d").use_image(h[0], RgImageUsage::COLOR_ATTACHMENT),
        ]);
        let chain = RgUseChain::build(h[0].into(), &passes);

        let visited = chain.uses().map(|u| u.pass_index).collect::<Vec<_>>();
        let expected = passes
            .iter()
            .enumerate()
            .filter(|(_, pass)| pass.find_ref(h[0].into()).is_some())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        assert_eq!(visited, expected);
        // 同一个 pass 只记录第一个引用
        assert_eq!(chain.use_from(2), Some(RgImageUse { pass_index: 2, ref_index: 0 }));
    }

    #[test]
    fn test_unused_image_has_empty_chain() {
        let h = handles(2);
        let passes = passes(&[RgPassDesc::new("a").use_image(h[0], RgImageUsage::COLOR_ATTACHMENT)]);
        let chain = RgUseChain::build(h[1].into(), &passes);

        assert_eq!(chain.entries(), &[None, None]);
        assert_eq!(chain.uses().count(), 0);
        assert_eq!(chain.cumulative_state(), RgImageState::UNDEFINED);
    }

    #[test]
    fn test_fake_refs_are_not_uses() {
        let h = handles(1);
        let passes = passes(&[
            RgPassDesc::new("a").use_image(h[0], RgImageUsage::FAKE),
            RgPassDesc::new("b").use_image(h[0], RgImageUsage::SAMPLED),
        ]);
        let chain = RgUseChain::build(h[0].into(), &passes);
        assert_eq!(chain.first_use(), Some(RgImageUse { pass_index: 1, ref_index: 0 }));
    }

    #[test]
    fn test_cumulative_state() {
        let h = handles(1);
        let passes = passes(&[
            RgPassDesc::new("a").use_image(h[0], RgImageUsage::COLOR_ATTACHMENT),
            RgPassDesc::new("b").use_image(h[0], RgImageUsage::SAMPLED),
        ]);
        let state = RgUseChain::build(h[0].into(), &passes).cumulative_state();

        assert_eq!(state.layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(
            state.access,
            vk::AccessFlags2::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags2::COLOR_ATTACHMENT_READ
                | vk::AccessFlags2::SHADER_SAMPLED_READ
        );
        assert_eq!(
            state.stage,
            vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags2::FRAGMENT_SHADER
        );
    }
}
