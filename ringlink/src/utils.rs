/// Byte buffer of MARGIN + N bytes with uniform access
///
/// This is a workaround for `[u8; MARGIN + N]` in stable rust.
#[repr(C)]
pub(crate) struct PaddedBytes<const MARGIN: usize, const N: usize>([u8; MARGIN], [u8; N]);

impl<const MARGIN: usize, const N: usize> PaddedBytes<MARGIN, N> {
    pub const fn new() -> Self {
        Self([0; MARGIN], [0; N])
    }

    pub const fn capacity(&self) -> usize {
        MARGIN + N
    }
}

impl<const MARGIN: usize, const N: usize> core::ops::Deref for PaddedBytes<MARGIN, N> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        // SAFETY: PaddedBytes is #[repr(C)] so the two arrays are laid out contiguously
        unsafe { core::slice::from_raw_parts(self.0.as_ptr(), MARGIN + N) }
    }
}

impl<const MARGIN: usize, const N: usize> core::ops::DerefMut for PaddedBytes<MARGIN, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: PaddedBytes is #[repr(C)] so the two arrays are laid out contiguously
        unsafe { core::slice::from_raw_parts_mut(self.0.as_mut_ptr(), MARGIN + N) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_access() {
        let mut buffer: PaddedBytes<3, 5> = PaddedBytes::new();
        assert_eq!(buffer.capacity(), 8);
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = i as u8;
        }
        assert_eq!(&buffer[..], &[0, 1, 2, 3, 4, 5, 6, 7]);
    }
}
