//! Callback groups: immutable, ordered event bindings.
//!
//! A [`Group`] is a flat sequence of `(event, path, handler)` bindings,
//! evaluated in order by [`Group::call`](crate::dispatch). Groups are built
//! once and never mutated; inheritance derives a new group from a parent:
//!
//! 1. Start from the parent's sequence.
//! 2. Strike inherited bindings matching any `remove(event, handler)`.
//! 3. Splice each `refine(path, ..)` block directly after the last remaining
//!    inherited binding with exactly that `path` (after the inherited part
//!    when there is none); deeper paths do not count. Successive
//!    refinements of one path keep their order.
//! 4. Add `append` bindings at the end.
//!
//! Removal only affects inherited bindings, so a child may strike a parent
//! handler and bind it again elsewhere.
//!
//! ```
//! use twin_callback::{Event, Group, Handler};
//!
//! let noop = |name: &str| Handler::<()>::new(name, |_, _| Ok(()));
//!
//! let parent = Group::builder()
//!     .on(Event::Update, noop("a"))
//!     .build();
//! let child = parent
//!     .inherit()
//!     .on(Event::Update, noop("b"))
//!     .remove(Event::Update, "a")
//!     .build();
//!
//! let names: Vec<_> = child.bindings().iter().map(|b| b.handler().name()).collect();
//! assert_eq!(names, ["b"]);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::event::Event;
use crate::handler::Handler;
use crate::path::PropertyPath;

/// One `(event, path, handler)` entry.
pub struct Binding<C> {
    event: Event,
    path: PropertyPath,
    handler: Handler<C>,
}

impl<C> Binding<C> {
    #[must_use]
    pub fn event(&self) -> &Event {
        &self.event
    }

    #[must_use]
    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    #[must_use]
    pub fn handler(&self) -> &Handler<C> {
        &self.handler
    }
}

impl<C> Clone for Binding<C> {
    fn clone(&self) -> Self {
        Self {
            event: self.event.clone(),
            path: self.path.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<C> fmt::Debug for Binding<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}` -> {}", self.event, self.path, self.handler.name())
    }
}

/// Resolved, immutable binding sequence. Cloning shares the sequence.
pub struct Group<C> {
    bindings: Rc<[Binding<C>]>,
}

impl<C> Group<C> {
    #[must_use]
    pub fn builder() -> GroupBuilder<C> {
        GroupBuilder::at(PropertyPath::root())
    }

    /// A group with no bindings.
    #[must_use]
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Start deriving a child group from this one.
    #[must_use]
    pub fn inherit(&self) -> InheritBuilder<C> {
        InheritBuilder {
            parent: self.clone(),
            removals: Vec::new(),
            refinements: Vec::new(),
            appended: Self::builder(),
        }
    }

    #[must_use]
    pub fn bindings(&self) -> &[Binding<C>] {
        &self.bindings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<C> Clone for Group<C> {
    fn clone(&self) -> Self {
        Self {
            bindings: Rc::clone(&self.bindings),
        }
    }
}

impl<C> Default for Group<C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<C> fmt::Debug for Group<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.bindings.iter()).finish()
    }
}

// ---------------------------------------------------------------------------
// Declaration
// ---------------------------------------------------------------------------

/// Declares bindings under a path prefix.
pub struct GroupBuilder<C> {
    prefix: PropertyPath,
    bindings: Vec<Binding<C>>,
}

impl<C> GroupBuilder<C> {
    fn at(prefix: PropertyPath) -> Self {
        Self {
            prefix,
            bindings: Vec::new(),
        }
    }

    /// Bind `handler` to `event` at the current path.
    #[must_use]
    pub fn on(mut self, event: Event, handler: Handler<C>) -> Self {
        self.bindings.push(Binding {
            event,
            path: self.prefix.clone(),
            handler,
        });
        self
    }

    /// Declare bindings for the nested twin under `name`.
    #[must_use]
    pub fn property(self, name: &str, block: impl FnOnce(Self) -> Self) -> Self {
        self.scoped(name, block)
    }

    /// Declare bindings for the elements of the collection under `name`.
    #[must_use]
    pub fn collection(self, name: &str, block: impl FnOnce(Self) -> Self) -> Self {
        self.scoped(name, block)
    }

    fn scoped(mut self, name: &str, block: impl FnOnce(Self) -> Self) -> Self {
        let nested = block(Self::at(self.prefix.join(name)));
        self.bindings.extend(nested.bindings);
        self
    }

    #[must_use]
    pub fn build(self) -> Group<C> {
        Group {
            bindings: self.bindings.into(),
        }
    }
}

/// Derives a child group; see the module docs for the resolution order.
pub struct InheritBuilder<C> {
    parent: Group<C>,
    removals: Vec<(Event, String)>,
    refinements: Vec<(PropertyPath, Vec<Binding<C>>)>,
    appended: GroupBuilder<C>,
}

impl<C> InheritBuilder<C> {
    /// Append a binding at the root path.
    #[must_use]
    pub fn on(mut self, event: Event, handler: Handler<C>) -> Self {
        self.appended = self.appended.on(event, handler);
        self
    }

    /// Append bindings for the nested twin under `name`.
    #[must_use]
    pub fn property(mut self, name: &str, block: impl FnOnce(GroupBuilder<C>) -> GroupBuilder<C>) -> Self {
        self.appended = self.appended.property(name, block);
        self
    }

    /// Append bindings for the collection elements under `name`.
    #[must_use]
    pub fn collection(
        mut self,
        name: &str,
        block: impl FnOnce(GroupBuilder<C>) -> GroupBuilder<C>,
    ) -> Self {
        self.appended = self.appended.collection(name, block);
        self
    }

    /// Strike inherited bindings of `handler` for `event`, at any path.
    #[must_use]
    pub fn remove(mut self, event: Event, handler: impl Into<String>) -> Self {
        self.removals.push((event, handler.into()));
        self
    }

    /// Declare bindings under `path` that run right after the inherited
    /// bindings for that path.
    #[must_use]
    pub fn refine(
        mut self,
        path: impl Into<PropertyPath>,
        block: impl FnOnce(GroupBuilder<C>) -> GroupBuilder<C>,
    ) -> Self {
        let path = path.into();
        let declared = block(GroupBuilder::at(path.clone()));
        self.refinements.push((path, declared.bindings));
        self
    }

    #[must_use]
    pub fn build(self) -> Group<C> {
        let mut resolved: Vec<Binding<C>> = self
            .parent
            .bindings()
            .iter()
            .filter(|binding| {
                !self.removals.iter().any(|(event, name)| {
                    binding.event == *event && binding.handler.name() == name
                })
            })
            .cloned()
            .collect();

        let mut inherited = resolved.len();
        for (path, bindings) in self.refinements {
            let at = resolved[..inherited]
                .iter()
                .rposition(|binding| binding.path == path)
                .map_or(inherited, |index| index + 1);
            inherited += bindings.len();
            resolved.splice(at..at, bindings);
        }

        resolved.extend(self.appended.bindings);
        tracing::trace!(bindings = resolved.len(), "callback.group.inherit");
        Group {
            bindings: resolved.into(),
        }
    }
}
