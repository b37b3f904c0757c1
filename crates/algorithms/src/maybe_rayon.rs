//! Rayon or sequential execution, selected by the `parallel` feature.
//!
//! With `parallel` enabled this re-exports rayon's prelude. Without it a
//! sequential stand-in provides `into_par_iter()` so row kernels and the
//! pairwise change loop compile unchanged; the remaining chain
//! (`.map()`, `.flat_map()`, `.collect()`) resolves to `Iterator`.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
