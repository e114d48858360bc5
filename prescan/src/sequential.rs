use std::ops::AddAssign;

/// Exclusive scan. `ys[0]` is zero and `ys[i]` is the sum of `xs[..i]`.
pub fn exclusive_scan<T>(xs: &[T], ys: &mut [T])
where
    T: Copy + Default + AddAssign,
{
    let mut accumulator = T::default();
    for (x, y) in xs.iter().zip(ys.iter_mut()) {
        *y = accumulator;
        accumulator += *x;
    }
}
