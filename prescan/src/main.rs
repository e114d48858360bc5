use prescan::{sequential, Backend, Prescan, ScanConfig};
use std::error::Error;

pub fn main() -> Result<(), Box<dyn Error>> {
    let xs = [3.0f32, 1.0, 7.0, 0.0, 4.0, 1.0, 6.0, 3.0];

    let mut ys = [0.0f32; 8];
    sequential::exclusive_scan(&xs, &mut ys);
    println!("xs: {:?}", xs);
    println!("ys: {:?}", ys);

    let threaded = Prescan::default();
    let ys = threaded.scan_to_vec(&xs)?;
    println!("xs: {:?}", xs);
    println!("ys: {:?}", ys);

    let stepped = Prescan::new(ScanConfig::default().with_backend(Backend::Stepped));
    let xs = [1.0f32; 2048];
    let ys = stepped.scan_to_vec(&xs)?;
    println!("last of {} ones: {}", xs.len(), ys[xs.len() - 1]);

    #[cfg(feature = "cuda")]
    {
        use cust::stream::{Stream, StreamFlags};

        let _ctx = cust::quick_init()?;
        let stream = Stream::new(StreamFlags::NON_BLOCKING, None)?;
        let ys = prescan::device::exclusive_prescan(&stream, &xs)?;
        println!("device last of {} ones: {}", xs.len(), ys[xs.len() - 1]);
    }

    Ok(())
}
