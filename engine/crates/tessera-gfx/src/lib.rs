//! Vulkan 命令录制层
//!
//! 只包含 render graph 需要的部分：image barrier 构建、dynamic rendering 信息、
//! 以及基于 `ash::Device` 的 command buffer 封装。设备和命令池的创建由宿主负责。

pub mod commands;
pub mod pipelines;
