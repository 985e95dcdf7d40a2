use std::fmt;
use std::rc::Rc;

use twin_core::Twin;

use crate::error::BoxError;

type HandlerFn<C> = dyn Fn(&Twin, &C) -> Result<(), BoxError>;

/// A named callback. Handlers are identified by name, so removing a
/// handler from an inherited group only needs the name.
pub struct Handler<C> {
    name: Rc<str>,
    call: Rc<HandlerFn<C>>,
}

impl<C> Handler<C> {
    pub fn new<F>(name: impl Into<String>, call: F) -> Self
    where
        F: Fn(&Twin, &C) -> Result<(), BoxError> + 'static,
    {
        Self {
            name: Rc::from(name.into()),
            call: Rc::new(call),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn invoke(&self, twin: &Twin, context: &C) -> Result<(), BoxError> {
        (self.call)(twin, context)
    }
}

impl<C> Clone for Handler<C> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            call: Rc::clone(&self.call),
        }
    }
}

impl<C> fmt::Debug for Handler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.name).finish()
    }
}
