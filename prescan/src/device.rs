use crate::error::{check_shape, check_workers, ScanError};
use cust::prelude::*;
use prescan_kernels::work_efficient;
use tracing::debug;

static PTX: &str = include_str!("../../resources/prescan_kernels.ptx");

/// Exclusive scan of up to `SECTION_SIZE` elements on the GPU, using a single
/// block of `xs.len() / 2` threads.
pub fn exclusive_prescan(stream: &Stream, xs: &[f32]) -> Result<Vec<f32>, ScanError> {
    check_shape(xs.len(), xs.len())?;
    check_workers(xs.len(), work_efficient::BLOCK_SIZE)?;

    let mut ys = vec![0f32; xs.len()];

    let dev_xs = xs.as_dbuf()?;
    let dev_ys = ys.as_slice().as_dbuf()?;

    let module = Module::from_ptx(PTX, &[])?;
    let kernel = module.get_function("exclusive_prescan")?;

    let block_size = (xs.len() / 2) as u32;
    debug!(n = xs.len(), block_size, "launching device scan");
    unsafe {
        launch!(
            kernel<<<1, block_size, 0, stream>>>(
                dev_xs.as_device_ptr(),
                dev_xs.len(),
                dev_ys.as_device_ptr()
            )
        )?;
    }
    stream.synchronize()?;

    dev_ys.copy_to(&mut ys)?;
    Ok(ys)
}
