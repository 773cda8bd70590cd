use std::ops::Deref;

use crate::dispatcher::Dispatcher;
use crate::transport::Transport;

/// Scope in which a dispatcher skips its prepare hook.
///
/// Creating the guard sets `use_prepare` to `false`; dropping it, including while
/// unwinding, sets it back to `true`.
#[must_use = "the prepare hook is re-enabled as soon as the guard is dropped"]
pub struct WithoutPreparation<'a, T: Transport> {
    dispatcher: &'a Dispatcher<T>,
}

impl<'a, T: Transport> WithoutPreparation<'a, T> {
    pub fn new(dispatcher: &'a Dispatcher<T>) -> Self {
        dispatcher.set_use_prepare(false);
        Self { dispatcher }
    }
}

impl<T: Transport> Deref for WithoutPreparation<'_, T> {
    type Target = Dispatcher<T>;

    fn deref(&self) -> &Self::Target {
        self.dispatcher
    }
}

impl<T: Transport> Drop for WithoutPreparation<'_, T> {
    fn drop(&mut self) {
        self.dispatcher.set_use_prepare(true);
    }
}
