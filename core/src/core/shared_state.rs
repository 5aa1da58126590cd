// agent_graph/src/core/shared_state.rs
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Graph state with shared ownership and interior mutability, backed by
/// `parking_lot::RwLock`.
///
/// IMPORTANT: guards are blocking and MUST NOT be held across `.await`.
#[derive(Debug)]
pub struct SharedState<S: Send + Sync + 'static>(Arc<RwLock<S>>);

impl<S: Send + Sync + 'static> SharedState<S> {
  pub fn new(state: S) -> Self {
    SharedState(Arc::new(RwLock::new(state)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, S> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, S> {
    self.0.write()
  }

  pub fn try_read(&self) -> Option<RwLockReadGuard<'_, S>> {
    self.0.try_read()
  }

  /// Read guard narrowed to one part of the state, e.g. `state.map_read(|s| &s.messages)`.
  pub fn map_read<F, U: ?Sized>(&self, f: F) -> MappedRwLockReadGuard<'_, U>
  where
    F: FnOnce(&S) -> &U,
  {
    RwLockReadGuard::map(self.read(), f)
  }

  /// Applies `f` under a write lock and returns its result.
  pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
    f(&mut self.write())
  }
}

impl<S: Send + Sync + Clone + 'static> SharedState<S> {
  /// Clones the current state out of the lock.
  pub fn snapshot(&self) -> S {
    self.read().clone()
  }
}

impl<S: Send + Sync + 'static> Clone for SharedState<S> {
  fn clone(&self) -> Self {
    SharedState(Arc::clone(&self.0))
  }
}

impl<S: Send + Sync + 'static + Default> Default for SharedState<S> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}
