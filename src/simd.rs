//! Target-feature dispatch for the lane loops.
//!
//! The portable lane backend is plain array arithmetic; what turns it into wide
//! vector code is compiling the loop with the host's best target features. With
//! the `simd` feature, [`dispatch`] runs the loop body through
//! `pulp::Arch::dispatch`, which selects the widest instruction set detected at
//! runtime. Without it the body runs as-is.

#[inline(always)]
pub(crate) fn dispatch<R>(f: impl FnOnce() -> R) -> R {
    #[cfg(feature = "simd")]
    {
        pulp::Arch::new().dispatch(f)
    }
    #[cfg(not(feature = "simd"))]
    {
        f()
    }
}

/// Elements below which the dispatch overhead outweighs the wider loop.
pub(crate) const DISPATCH_THRESHOLD: usize = 64;

#[inline(always)]
pub(crate) fn dispatch_if_large<R>(len: usize, f: impl FnOnce() -> R) -> R {
    // Correctness does not depend on which branch runs.
    if len >= DISPATCH_THRESHOLD {
        dispatch(f)
    } else {
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_runs_closure_once() {
        let mut calls = 0;
        let out = dispatch(|| {
            calls += 1;
            42
        });
        assert_eq!(out, 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_dispatch_if_large_both_paths() {
        let small: Vec<f64> = (0..8).map(f64::from).collect();
        let large: Vec<f64> = (0..1000).map(f64::from).collect();
        let s = dispatch_if_large(small.len(), || small.iter().sum::<f64>());
        let l = dispatch_if_large(large.len(), || large.iter().sum::<f64>());
        assert_eq!(s, 28.0);
        assert_eq!(l, 499_500.0);
    }
}
