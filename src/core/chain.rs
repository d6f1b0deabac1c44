//! Chain interceptors.
//!
//! Chaining wraps a command's callback without removing it. The newest
//! interceptor runs first and receives a [`ChainNext`] for the callback it
//! replaced, which it may call or skip.

use std::sync::Arc;

use bevy::prelude::*;

use super::command::CommandCallback;
use super::console::Console;
use super::result::CommandResult;

/// Type alias for chain interceptor functions.
///
/// Interceptors receive the same arguments as handlers plus the next-older
/// callback in the chain.
pub type ChainInterceptor =
    Arc<dyn Fn(&CommandResult, &mut Console, &mut World, ChainNext<'_>) + Send + Sync>;

/// One interceptor and the callback it wraps.
pub struct ChainLink {
    interceptor: ChainInterceptor,
    next: Option<CommandCallback>,
}

impl ChainLink {
    pub fn new<F>(interceptor: F, next: Option<CommandCallback>) -> Self
    where
        F: Fn(&CommandResult, &mut Console, &mut World, ChainNext<'_>) + Send + Sync + 'static,
    {
        Self {
            interceptor: Arc::new(interceptor),
            next,
        }
    }

    #[inline]
    pub fn interceptor(&self) -> &ChainInterceptor {
        &self.interceptor
    }

    /// The wrapped callback. `None` when a temporary command was chained.
    #[inline]
    pub fn next(&self) -> Option<&CommandCallback> {
        self.next.as_ref()
    }
}

/// Handle to the next-older callback, passed to interceptors.
#[derive(Clone, Copy)]
pub struct ChainNext<'a> {
    callback: Option<&'a CommandCallback>,
}

impl<'a> ChainNext<'a> {
    pub(crate) fn new(callback: Option<&'a CommandCallback>) -> Self {
        Self { callback }
    }

    /// Forward the invocation to the wrapped callback.
    pub fn call(&self, result: &CommandResult, console: &mut Console, world: &mut World) {
        if let Some(callback) = self.callback {
            callback.invoke(result, console, world);
        }
    }

    /// Check if there is a callback to forward to.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.callback.is_none()
    }
}
