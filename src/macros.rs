//! Internal macros shared by the owning array and the view types.

/// Print a one-line trace to stderr when `DENSE_TRACE=1`.
macro_rules! trace {
    ($($arg:tt)*) => {
        if $crate::trace_enabled() {
            eprintln!("[dense-rs] {}", format_args!($($arg)*));
        }
    };
}

/// Elementwise math methods forwarding to the free functions in `crate::math`.
macro_rules! math_methods {
    ($($name:ident),*) => {$(
        #[doc = concat!("Elementwise `", stringify!($name), "` into a new array. See [`math::", stringify!($name), "`](crate::math::", stringify!($name), ").")]
        pub fn $name(&self) -> $crate::Result<$crate::DenseArray<T, N>> {
            $crate::math::$name(self)
        }
    )*};
}

/// Read-only surface common to [`DenseArray`], [`ArrayView`] and [`ArrayViewMut`].
///
/// Every type passed here implements `Contiguous`; all methods go through it.
///
/// [`DenseArray`]: crate::DenseArray
/// [`ArrayView`]: crate::ArrayView
/// [`ArrayViewMut`]: crate::ArrayViewMut
macro_rules! impl_read_access {
    ($ty:ident $(<$lt:lifetime>)?) => {
        impl<$($lt,)? T: $crate::Element, const N: usize> $ty<$($lt,)? T, N> {
            /// Returns the shape descriptor.
            #[inline]
            pub fn shape(&self) -> &$crate::Shape<N> {
                $crate::Contiguous::shape(self)
            }

            /// Returns the extent of every dimension.
            #[inline]
            pub fn extents(&self) -> &[usize; N] {
                self.shape().extents()
            }

            /// Returns the extent of dimension `dim`.
            #[inline]
            pub fn extent(&self, dim: usize) -> usize {
                self.shape().extent(dim)
            }

            /// Returns the number of dimensions.
            #[inline]
            pub fn rank(&self) -> usize {
                N
            }

            /// Returns the total number of elements.
            #[inline]
            pub fn len(&self) -> usize {
                self.as_slice().len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.as_slice().is_empty()
            }

            #[inline]
            pub fn layout(&self) -> $crate::Layout {
                self.shape().layout()
            }

            #[inline]
            pub fn strides(&self) -> &[usize; N] {
                self.shape().strides()
            }

            /// Returns the elements in memory order.
            #[inline]
            pub fn as_slice(&self) -> &[T] {
                $crate::Contiguous::as_slice(self)
            }

            #[inline]
            pub fn as_ptr(&self) -> *const T {
                self.as_slice().as_ptr()
            }

            /// Whether the first element sits on a lane-alignment boundary.
            #[inline]
            pub fn is_aligned(&self) -> bool {
                self.as_ptr() as usize % $crate::ALIGNMENT == 0
            }

            /// Get an element without any bounds checking.
            ///
            /// # Safety
            /// Every `index[d]` must be below `extent(d)`.
            #[inline]
            pub unsafe fn get_unchecked(&self, index: [usize; N]) -> &T {
                let offset = self.shape().linear_offset(&index);
                self.as_slice().get_unchecked(offset)
            }

            /// Get an element, checking every index against its extent.
            pub fn at(&self, index: [usize; N]) -> $crate::Result<&T> {
                let offset = self.shape().checked_offset(&index)?;
                Ok(&self.as_slice()[offset])
            }

            /// Iterate over the elements in memory order. Use `.rev()` for reverse traversal.
            #[inline]
            pub fn iter(&self) -> std::slice::Iter<'_, T> {
                self.as_slice().iter()
            }

            /// Iterate over `(index, element)` pairs in memory order.
            pub fn indexed_iter(&self) -> impl DoubleEndedIterator<Item = ([usize; N], &T)> + '_ {
                let shape = *self.shape();
                self.as_slice()
                    .iter()
                    .enumerate()
                    .map(move |(offset, value)| (shape.unravel(offset), value))
            }

            /// Borrow the whole region as a view of the same rank.
            #[inline]
            pub fn as_view(&self) -> $crate::ArrayView<'_, T, N> {
                $crate::ArrayView::from_parts(self.as_slice(), *self.shape())
            }

            /// Deep-copy the elements into a new owned array with the same shape and layout.
            pub fn to_owned(&self) -> $crate::Result<$crate::DenseArray<T, N>> {
                Ok($crate::DenseArray::from_parts(
                    $crate::AlignedBuf::from_slice(self.as_slice())?,
                    *self.shape(),
                ))
            }

            /// Apply `f` to every element, producing a new owned array.
            pub fn map<U: $crate::Element>(
                &self,
                f: impl FnMut(T) -> U,
            ) -> $crate::Result<$crate::DenseArray<U, N>> {
                $crate::math::map(self, f)
            }

            /// Fold every element in memory order.
            pub fn fold<A>(&self, init: A, mut f: impl FnMut(A, T) -> A) -> A {
                self.as_slice().iter().fold(init, |acc, &x| f(acc, x))
            }
        }

        impl<$($lt,)? T: $crate::LaneElement, const N: usize> $ty<$($lt,)? T, N> {
            /// Sum of all elements, accumulated lane by lane.
            pub fn sum(&self) -> T {
                $crate::reduce::sum_contiguous(self)
            }

            /// Product of all elements, accumulated lane by lane.
            pub fn product(&self) -> T {
                $crate::reduce::product_contiguous(self)
            }

            /// Arithmetic mean, or `None` for an empty region.
            pub fn mean(&self) -> Option<T> {
                let n = <T as num_traits::NumCast>::from(self.len())?;
                (self.len() > 0).then(|| self.sum() / n)
            }

            /// Smallest element, ignoring NaN. `None` for an empty region.
            pub fn min(&self) -> Option<T> {
                self.iter().copied().reduce(num_traits::Float::min)
            }

            /// Largest element, ignoring NaN. `None` for an empty region.
            pub fn max(&self) -> Option<T> {
                self.iter().copied().reduce(num_traits::Float::max)
            }

            math_methods!(
                sin, cos, tan, asin, acos, atan, sinh, cosh, tanh, exp, ln, log, log2, log10,
                sqrt, cbrt, abs, floor, ceil, round
            );

            /// Elementwise `x^exponent` into a new array.
            pub fn powf(&self, exponent: T) -> $crate::Result<$crate::DenseArray<T, N>> {
                $crate::math::powf(self, exponent)
            }

            /// Same as `powf`.
            pub fn pow(&self, exponent: T) -> $crate::Result<$crate::DenseArray<T, N>> {
                $crate::math::pow(self, exponent)
            }

            /// Elementwise `x^exponent` for an integer exponent.
            pub fn powi(&self, exponent: i32) -> $crate::Result<$crate::DenseArray<T, N>> {
                $crate::math::powi(self, exponent)
            }
        }

        impl<$($lt,)? T: $crate::Element, const N: usize> std::ops::Index<[usize; N]>
            for $ty<$($lt,)? T, N>
        {
            type Output = T;

            /// Element at `index`.
            ///
            /// Individual indices are not checked against their extents, only the
            /// resulting flat offset against the buffer. Use `at` for a checked read.
            #[inline]
            fn index(&self, index: [usize; N]) -> &T {
                &self.as_slice()[self.shape().linear_offset(&index)]
            }
        }

        impl<'it, $($lt,)? T: $crate::Element, const N: usize> IntoIterator
            for &'it $ty<$($lt,)? T, N>
        {
            type Item = &'it T;
            type IntoIter = std::slice::Iter<'it, T>;

            fn into_iter(self) -> Self::IntoIter {
                self.as_slice().iter()
            }
        }
    };
}

/// Mutable surface common to [`DenseArray`] and [`ArrayViewMut`].
///
/// Shared slicing (`view`) lives here too: on these types the sub-view can only
/// borrow from `&self`. `ArrayView` has its own `view` that keeps the source lifetime.
///
/// [`DenseArray`]: crate::DenseArray
/// [`ArrayViewMut`]: crate::ArrayViewMut
macro_rules! impl_write_access {
    ($ty:ident $(<$lt:lifetime>)?) => {
        impl<$($lt,)? T: $crate::Element, const N: usize> $ty<$($lt,)? T, N> {
            #[inline]
            pub fn as_mut_slice(&mut self) -> &mut [T] {
                $crate::ContiguousMut::as_mut_slice(self)
            }

            #[inline]
            pub fn as_mut_ptr(&mut self) -> *mut T {
                self.as_mut_slice().as_mut_ptr()
            }

            /// Get a mutable element without any bounds checking.
            ///
            /// # Safety
            /// Every `index[d]` must be below `extent(d)`.
            #[inline]
            pub unsafe fn get_unchecked_mut(&mut self, index: [usize; N]) -> &mut T {
                let offset = self.shape().linear_offset(&index);
                self.as_mut_slice().get_unchecked_mut(offset)
            }

            /// Get a mutable element, checking every index against its extent.
            pub fn at_mut(&mut self, index: [usize; N]) -> $crate::Result<&mut T> {
                let offset = self.shape().checked_offset(&index)?;
                Ok(&mut self.as_mut_slice()[offset])
            }

            #[inline]
            pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
                self.as_mut_slice().iter_mut()
            }

            /// Set every element to `value`.
            pub fn fill(&mut self, value: T) {
                self.as_mut_slice().fill(value);
            }

            /// Slice into a shared contiguous view of rank `M`.
            ///
            /// Takes one [`SliceSpec`](crate::SliceSpec) per dimension. `M` must equal
            /// the number of specs that are not bare indices.
            pub fn view<const M: usize>(
                &self,
                specs: [$crate::SliceSpec; N],
            ) -> $crate::Result<$crate::ArrayView<'_, T, M>> {
                let region = $crate::slice::resolve::<N, M>(self.shape(), &specs)?;
                Ok($crate::ArrayView::from_region(self.as_slice(), region))
            }

            /// Slice into a mutable contiguous view of rank `M`.
            pub fn view_mut<const M: usize>(
                &mut self,
                specs: [$crate::SliceSpec; N],
            ) -> $crate::Result<$crate::ArrayViewMut<'_, T, M>> {
                let region = $crate::slice::resolve::<N, M>(self.shape(), &specs)?;
                Ok($crate::ArrayViewMut::from_region(self.as_mut_slice(), region))
            }

            /// Borrow the whole region as a mutable view of the same rank.
            #[inline]
            pub fn as_view_mut(&mut self) -> $crate::ArrayViewMut<'_, T, N> {
                let shape = *self.shape();
                $crate::ArrayViewMut::from_parts(self.as_mut_slice(), shape)
            }
        }

        impl<$($lt,)? T: $crate::Element, const N: usize> std::ops::IndexMut<[usize; N]>
            for $ty<$($lt,)? T, N>
        {
            #[inline]
            fn index_mut(&mut self, index: [usize; N]) -> &mut T {
                let offset = self.shape().linear_offset(&index);
                &mut self.as_mut_slice()[offset]
            }
        }

        impl<'it, $($lt,)? T: $crate::Element, const N: usize> IntoIterator
            for &'it mut $ty<$($lt,)? T, N>
        {
            type Item = &'it mut T;
            type IntoIter = std::slice::IterMut<'it, T>;

            fn into_iter(self) -> Self::IntoIter {
                self.as_mut_slice().iter_mut()
            }
        }
    };
}
