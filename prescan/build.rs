fn main() {
    #[cfg(feature = "cuda")]
    cuda_builder::CudaBuilder::new("../prescan_kernels")
        .copy_to("../resources/prescan_kernels.ptx")
        .build()
        .unwrap();
}
