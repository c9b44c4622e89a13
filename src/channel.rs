//! Execution channels: independent ordered queues of asynchronous device work.
//!
//! Operations issued on the same channel complete in issue order; operations
//! on different channels may overlap. The engine never needs more than one
//! channel per face plus a shared default, so the identifier space is fixed
//! at [`CHANNEL_COUNT`].

use crate::halo_error::HaloError;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

/// Number of usable channels: the shared default plus one per face.
pub const CHANNEL_COUNT: u8 = 7;

// The per-face batch driver hands out channels 1..=6.
const_assert!(CHANNEL_COUNT > 6);

/// Opaque handle to one device execution channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(u8);

impl ChannelId {
    /// The shared default channel.
    pub const DEFAULT: ChannelId = ChannelId(0);

    /// Validate and wrap a raw channel number.
    ///
    /// # Errors
    /// [`HaloError::ChannelOutOfRange`] for identifiers `>= CHANNEL_COUNT`.
    pub fn new(id: u8) -> Result<Self, HaloError> {
        if id >= CHANNEL_COUNT {
            return Err(HaloError::ChannelOutOfRange {
                id,
                max: CHANNEL_COUNT - 1,
            });
        }
        Ok(ChannelId(id))
    }

    /// Raw index, for device runtimes that key queues by number.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
