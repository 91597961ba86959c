//! Iterator helpers.

use std::iter::Zip;

/// Like [`Iterator::zip`], but panics if the two iterators have different lengths.
///
/// Used when copying between fixed-size landmark buffers, where silently truncating to the
/// shorter side would hide a topology mismatch.
#[track_caller]
pub fn zip_exact<A, B>(a: A, b: B) -> Zip<A::IntoIter, B::IntoIter>
where
    A: IntoIterator,
    B: IntoIterator,
    A::IntoIter: ExactSizeIterator,
    B::IntoIter: ExactSizeIterator,
{
    let a = a.into_iter();
    let b = b.into_iter();
    assert_eq!(
        a.len(),
        b.len(),
        "`zip_exact` called on iterators with different lengths"
    );

    a.zip(b)
}
