use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic edit counter owned by a single resource.
///
/// Caches compare the stored version against the one they last uploaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    version: u64,
}

impl ChangeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self { version: 0 }
    }

    pub fn changed(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Lock-free version counter for data shared behind an `Arc`.
///
/// Readers poll [`AtomicVersion::get`] without taking the data lock, which is
/// what the upload caches do every frame.
#[derive(Debug, Default)]
pub struct AtomicVersion(AtomicU64);

impl AtomicVersion {
    #[must_use]
    pub fn new(version: u64) -> Self {
        Self(AtomicU64::new(version))
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Increments the version and returns the new value.
    #[inline]
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    pub fn set(&self, version: u64) {
        self.0.store(version, Ordering::Relaxed);
    }
}

/// Write access to tracked data. Dropping the guard records one edit.
pub struct MutGuard<'a, T> {
    data: &'a mut T,
    tracker: &'a mut ChangeTracker,
}

impl<'a, T> MutGuard<'a, T> {
    pub fn new(data: &'a mut T, tracker: &'a mut ChangeTracker) -> Self {
        Self { data, tracker }
    }
}

impl<T> std::ops::Deref for MutGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.data
    }
}

impl<T> std::ops::DerefMut for MutGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data
    }
}

impl<T> Drop for MutGuard<'_, T> {
    fn drop(&mut self) {
        self.tracker.changed();
    }
}
