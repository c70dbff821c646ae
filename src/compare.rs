//! Key bytes and the pluggable equality predicate.
//!
//! The table never looks inside a payload except through these two seams:
//! `KeyBytes` supplies the bytes that get hashed, `Comparator` decides
//! whether two entries that hash alike carry the same logical key.

use core::cmp::Ordering;

/// Exposes the byte sequence a payload is keyed by.
pub trait KeyBytes {
    fn key_bytes(&self) -> &[u8];
}

impl KeyBytes for [u8] {
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        self
    }
}

impl<const N: usize> KeyBytes for [u8; N] {
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        self
    }
}

impl KeyBytes for Vec<u8> {
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        self
    }
}

impl KeyBytes for Box<[u8]> {
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        self
    }
}

impl KeyBytes for str {
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl KeyBytes for String {
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<T: KeyBytes + ?Sized> KeyBytes for &T {
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        (**self).key_bytes()
    }
}

/// Equality predicate between a stored payload `T` and a probe `Q`.
///
/// `Ordering::Equal` means both carry the same logical key. Implementations
/// must agree with [`KeyBytes`]: whenever `compare` returns `Equal`, the key
/// bytes of both sides hash identically. Debug builds check this against
/// every entry walked during a lookup.
///
/// State the comparator needs for every call lives in the comparator value
/// itself. Per-call state travels in `kdata`; the table passes `None` when
/// it compares two resident entries (`get_next`, `replace`).
pub trait Comparator<T: ?Sized, Q: ?Sized = T> {
    type KeyData: ?Sized;

    fn compare(&self, stored: &T, probe: &Q, kdata: Option<&Self::KeyData>) -> Ordering;
}

impl<T: ?Sized, Q: ?Sized, F> Comparator<T, Q> for F
where
    F: Fn(&T, &Q) -> Ordering,
{
    type KeyData = ();

    #[inline]
    fn compare(&self, stored: &T, probe: &Q, _kdata: Option<&()>) -> Ordering {
        self(stored, probe)
    }
}

/// Orders payloads by their raw key bytes: lexicographic, then shorter first.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByteOrder;

impl<T, Q> Comparator<T, Q> for ByteOrder
where
    T: KeyBytes + ?Sized,
    Q: KeyBytes + ?Sized,
{
    type KeyData = ();

    #[inline]
    fn compare(&self, stored: &T, probe: &Q, _kdata: Option<&()>) -> Ordering {
        stored.key_bytes().cmp(probe.key_bytes())
    }
}
