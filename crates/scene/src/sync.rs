//! Locking primitives shared by scenes and the registry.
//!
//! With the default `parking_lot` feature the mutex is `parking_lot::Mutex`.
//! Building with `default-features = false, features = ["lock-free"]` uses
//! `spin::Mutex` instead, for targets where a parking mutex is not
//! available. Neither implementation poisons, so `lock` never fails.

pub use std::sync::Arc;

#[cfg(not(any(feature = "parking_lot", feature = "lock-free")))]
compile_error!("enable either the `parking_lot` or the `lock-free` feature");

#[cfg(feature = "parking_lot")]
pub type MutexGuard<'a, T> = parking_lot::MutexGuard<'a, T>;
#[cfg(not(feature = "parking_lot"))]
pub type MutexGuard<'a, T> = spin::MutexGuard<'a, T>;

/// Platform-agnostic mutex wrapper.
pub struct Mutex<T> {
    #[cfg(feature = "parking_lot")]
    inner: parking_lot::Mutex<T>,
    #[cfg(not(feature = "parking_lot"))]
    inner: spin::Mutex<T>,
}

impl<T> Mutex<T> {
    /// Creates a new mutex protecting the given value.
    pub fn new(value: T) -> Self {
        Self {
            #[cfg(feature = "parking_lot")]
            inner: parking_lot::Mutex::new(value),
            #[cfg(not(feature = "parking_lot"))]
            inner: spin::Mutex::new(value),
        }
    }

    /// Acquires the mutex.
    ///
    /// The lock is not reentrant. A scene's hook value stays locked while one
    /// of its hooks runs, so that hook must not call `with_hooks`,
    /// `call_update`, `begin` or `reset` on its own scene.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
