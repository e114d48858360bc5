#![cfg_attr(
    target_os = "cuda",
    no_std,
    feature(register_attr),
    register_attr(nvvm_internal)
)]

pub mod bank;
pub mod step;
pub mod tree;
pub mod work_efficient;
