//! Element encoding
//!
//! Every element of a list occupies the same number of bytes on disk, so node
//! blocks can use a fixed stride. `Element` is the codec a type needs to be
//! stored in a `BTreeList`.

/// A value with a fixed-width little-endian encoding
///
/// `write_to` receives exactly `SIZE` bytes and must fill all of them;
/// `read_from` receives the same `SIZE` bytes back.
pub trait Element: Clone {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Encode into `buf` (`buf.len() == SIZE`)
    fn write_to(&self, buf: &mut [u8]);

    /// Decode from `buf` (`buf.len() == SIZE`)
    fn read_from(buf: &[u8]) -> Self;
}

macro_rules! impl_element_for_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Element for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn write_to(&self, buf: &mut [u8]) {
                    buf.copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_from(buf: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(buf);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_element_for_numeric!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

impl Element for bool {
    const SIZE: usize = 1;

    fn write_to(&self, buf: &mut [u8]) {
        buf[0] = *self as u8;
    }

    fn read_from(buf: &[u8]) -> Self {
        buf[0] != 0
    }
}

impl<const N: usize> Element for [u8; N] {
    const SIZE: usize = N;

    fn write_to(&self, buf: &mut [u8]) {
        buf.copy_from_slice(self);
    }

    fn read_from(buf: &[u8]) -> Self {
        let mut raw = [0u8; N];
        raw.copy_from_slice(buf);
        raw
    }
}

impl<A: Element, B: Element> Element for (A, B) {
    const SIZE: usize = A::SIZE + B::SIZE;

    fn write_to(&self, buf: &mut [u8]) {
        let (first, second) = buf.split_at_mut(A::SIZE);
        self.0.write_to(first);
        self.1.write_to(second);
    }

    fn read_from(buf: &[u8]) -> Self {
        let (first, second) = buf.split_at(A::SIZE);
        (A::read_from(first), B::read_from(second))
    }
}
