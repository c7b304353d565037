//! Configuration of the in-process heap engine.

use rockslice_common::{Result, verify_arg};

use crate::buffer::NativeBuffer;

/// Largest alignment accepted for buffer allocations (one regular page).
pub const MAX_ALIGNMENT: usize = 4096;

/// Default upper bound on the size of a single buffer.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = u32::MAX as usize;

/// Configuration for [`HeapEngine`](crate::heap::HeapEngine) construction.
#[derive(Debug, Clone)]
pub struct HeapEngineConfig {
    /// Alignment of every buffer allocation. Must be a power of two, at most
    /// [`MAX_ALIGNMENT`].
    pub alignment: usize,
    /// Maximum size of a single buffer in bytes; larger allocations fail.
    pub max_buffer_size: usize,
}

impl Default for HeapEngineConfig {
    fn default() -> Self {
        Self {
            alignment: NativeBuffer::DEFAULT_ALIGNMENT,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

impl HeapEngineConfig {
    /// Validates the configuration and returns an `InvalidArgument` error if invalid.
    pub fn validate(&self) -> Result<()> {
        verify_arg!(alignment, self.alignment.is_power_of_two());
        verify_arg!(alignment, self.alignment <= MAX_ALIGNMENT);
        verify_arg!(max_buffer_size, self.max_buffer_size > 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rockslice_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_default_is_valid() {
        HeapEngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_alignment() {
        let config = HeapEngineConfig {
            alignment: 48,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidArgument { name, .. } if name == "alignment"
        ));

        let config = HeapEngineConfig {
            alignment: 8192,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_limit() {
        let config = HeapEngineConfig {
            max_buffer_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidArgument { name, .. } if name == "max_buffer_size"
        ));
    }
}
