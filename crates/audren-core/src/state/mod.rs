//! Persistent state owned by the renderer server.
//!
//! Commands live for one frame; the state they mutate lives here, in typed
//! slabs addressed by [`StateHandle`]s. A command stores a handle at
//! construction and resolves it against the [`StateStore`] passed to it at
//! process time, so no command ever holds a borrow across frames.
//!
//! ```rust
//! use audren_core::{BiquadFilterState, StateStore};
//!
//! let mut store = StateStore::new(24);
//! let handle = store.insert(BiquadFilterState::default());
//! store.get_mut(handle).y1 = 1.0;
//! assert_eq!(store.get(handle).y1, 1.0);
//! ```

mod circular_buffer;
mod delay;
mod limiter;
mod reverb;
mod reverb3d;
mod upsampler;
mod voice;

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};

pub use circular_buffer::CircularBufferSinkState;
pub use delay::DelayState;
pub use limiter::{LimitedSample, LimiterState, LimiterStatistics};
pub use reverb::ReverbState;
pub use reverb3d::Reverb3dState;
pub use upsampler::UpsamplerState;
pub use voice::VoiceUpdateState;

use crate::biquad::BiquadFilterState;

/// Typed index into a [`Slab`].
pub struct StateHandle<T> {
    index: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T> StateHandle<T> {
    /// Handle for slot `index`.
    pub const fn from_index(index: u32) -> Self {
        Self {
            index,
            marker: PhantomData,
        }
    }

    /// Slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for StateHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StateHandle<T> {}

impl<T> PartialEq for StateHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for StateHandle<T> {}

impl<T> Hash for StateHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for StateHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateHandle({})", self.index)
    }
}

/// Append-only storage for one state type.
#[derive(Debug, Clone)]
pub struct Slab<T> {
    entries: Vec<T>,
}

impl<T> Slab<T> {
    /// Empty slab.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Store `value`, returning its handle.
    pub fn insert(&mut self, value: T) -> StateHandle<T> {
        let index = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        self.entries.push(value);
        StateHandle::from_index(index)
    }

    /// Entry for `handle`, if it exists.
    pub fn get(&self, handle: StateHandle<T>) -> Option<&T> {
        self.entries.get(handle.index())
    }

    /// Mutable entry for `handle`, if it exists.
    pub fn get_mut(&mut self, handle: StateHandle<T>) -> Option<&mut T> {
        self.entries.get_mut(handle.index())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the slab holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<StateHandle<T>> for Slab<T> {
    type Output = T;

    fn index(&self, handle: StateHandle<T>) -> &T {
        &self.entries[handle.index()]
    }
}

impl<T> IndexMut<StateHandle<T>> for Slab<T> {
    fn index_mut(&mut self, handle: StateHandle<T>) -> &mut T {
        &mut self.entries[handle.index()]
    }
}

/// Everything that outlives a frame.
///
/// Slabs are public so a command can borrow two of them at once (a voice
/// state and a biquad state, for example).
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    /// Per-voice decode and mix bookkeeping.
    pub voices: Slab<VoiceUpdateState>,
    /// Biquad histories (voice filters and grouped stages).
    pub biquads: Slab<BiquadFilterState>,
    /// Delay effects.
    pub delays: Slab<DelayState>,
    /// Reverb effects.
    pub reverbs: Slab<ReverbState>,
    /// 3D reverb effects.
    pub reverb3ds: Slab<Reverb3dState>,
    /// Limiter effects.
    pub limiters: Slab<LimiterState>,
    /// Limiter result blocks.
    pub limiter_statistics: Slab<LimiterStatistics>,
    /// Upsamplers and their output buffers.
    pub upsamplers: Slab<UpsamplerState>,
    /// Circular-buffer sink cursors.
    pub circular_buffers: Slab<CircularBufferSinkState>,
    /// Depop accumulator, one value per mix buffer.
    pub depop: Vec<f32>,
}

impl StateStore {
    /// Empty store with a depop accumulator for `mix_buffer_count` buffers.
    pub fn new(mix_buffer_count: usize) -> Self {
        Self {
            depop: vec![0.0; mix_buffer_count],
            ..Self::default()
        }
    }

    /// Store a state value.
    pub fn insert<T: StateSlot>(&mut self, value: T) -> StateHandle<T> {
        T::slab_mut(self).insert(value)
    }

    /// Resolve a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this store.
    pub fn get<T: StateSlot>(&self, handle: StateHandle<T>) -> &T {
        &T::slab(self)[handle]
    }

    /// Resolve a handle mutably.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this store.
    pub fn get_mut<T: StateSlot>(&mut self, handle: StateHandle<T>) -> &mut T {
        &mut T::slab_mut(self)[handle]
    }
}

/// A type with its own slab in the [`StateStore`].
pub trait StateSlot: Sized {
    /// The slab holding values of this type.
    fn slab(store: &StateStore) -> &Slab<Self>;

    /// The slab holding values of this type, mutably.
    fn slab_mut(store: &mut StateStore) -> &mut Slab<Self>;
}

macro_rules! state_slot {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(
            impl StateSlot for $ty {
                fn slab(store: &StateStore) -> &Slab<Self> {
                    &store.$field
                }

                fn slab_mut(store: &mut StateStore) -> &mut Slab<Self> {
                    &mut store.$field
                }
            }
        )*
    };
}

state_slot! {
    VoiceUpdateState => voices,
    BiquadFilterState => biquads,
    DelayState => delays,
    ReverbState => reverbs,
    Reverb3dState => reverb3ds,
    LimiterState => limiters,
    LimiterStatistics => limiter_statistics,
    UpsamplerState => upsamplers,
    CircularBufferSinkState => circular_buffers,
}
