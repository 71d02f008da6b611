use crate::SpinLock;

/// Lifecycle errors of a [`GlobalSlot`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    /// `install` was called on an occupied slot.
    #[error("global instance already installed")]
    AlreadyInstalled,
    /// The slot is empty (never installed, or torn down).
    #[error("global instance not installed")]
    NotInstalled,
}

/// A process-wide instance with an explicit lifecycle.
///
/// The value is installed once during boot, accessed under the slot's spin
/// lock, and may be taken out again with [`teardown`](Self::teardown).
/// Every access holds the lock for the whole closure, so the closure is one
/// critical section.
///
/// ```
/// use kernel_sync::GlobalSlot;
///
/// static COUNTER: GlobalSlot<u32> = GlobalSlot::new();
///
/// COUNTER.install(1).unwrap();
/// assert_eq!(COUNTER.with(|c| { *c += 1; *c }), Ok(2));
/// assert_eq!(COUNTER.teardown(), Ok(2));
/// assert!(COUNTER.with(|c| *c).is_err());
/// ```
pub struct GlobalSlot<T> {
    inner: SpinLock<Option<T>>,
}

impl<T> Default for GlobalSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GlobalSlot<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: SpinLock::new(None),
        }
    }

    /// Places `value` into the empty slot.
    ///
    /// # Errors
    /// [`SlotError::AlreadyInstalled`] if the slot is occupied; `value` is dropped.
    pub fn install(&self, value: T) -> Result<(), SlotError> {
        let mut slot = self.inner.lock();
        if slot.is_some() {
            return Err(SlotError::AlreadyInstalled);
        }
        *slot = Some(value);
        Ok(())
    }

    /// Builds the value with `make` and installs it, holding the lock
    /// throughout so no other caller can construct or install concurrently.
    ///
    /// `make` is not called if the slot is occupied.
    ///
    /// # Errors
    /// [`SlotError::AlreadyInstalled`] (converted into `E`) if the slot is
    /// occupied, or whatever `make` fails with; the slot stays empty then.
    pub fn install_with<E: From<SlotError>>(
        &self,
        make: impl FnOnce() -> Result<T, E>,
    ) -> Result<(), E> {
        let mut slot = self.inner.lock();
        if slot.is_some() {
            return Err(SlotError::AlreadyInstalled.into());
        }
        *slot = Some(make()?);
        Ok(())
    }

    /// Runs `f` with exclusive access to the installed value.
    ///
    /// # Errors
    /// [`SlotError::NotInstalled`] if the slot is empty.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, SlotError> {
        let mut slot = self.inner.lock();
        slot.as_mut().map(f).ok_or(SlotError::NotInstalled)
    }

    /// Removes and returns the installed value.
    ///
    /// # Errors
    /// [`SlotError::NotInstalled`] if the slot is empty.
    pub fn teardown(&self) -> Result<T, SlotError> {
        self.inner.lock().take().ok_or(SlotError::NotInstalled)
    }

    pub fn is_installed(&self) -> bool {
        self.inner.lock().is_some()
    }
}
