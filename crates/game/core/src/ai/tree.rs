//! Minimal behavior tree: nodes either succeed or fail within one tick.

/// Result of evaluating a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    pub const fn from_bool(ok: bool) -> Self {
        if ok { Status::Success } else { Status::Failure }
    }
}

/// A behavior tree node evaluated against a context `C`.
///
/// Nodes may read the context and write intermediate results into it (the
/// chosen target, the resulting plan).
pub trait Behavior<C>: Send + Sync {
    fn tick(&self, ctx: &mut C) -> Status;
}

impl<'n, C> Behavior<C> for Box<dyn Behavior<C> + 'n> {
    #[inline]
    fn tick(&self, ctx: &mut C) -> Status {
        (**self).tick(ctx)
    }
}

/// Runs children left to right until one fails (logical AND).
pub struct Sequence<'n, C> {
    children: Vec<Box<dyn Behavior<C> + 'n>>,
}

impl<'n, C> Sequence<'n, C> {
    /// # Panics
    ///
    /// Panics if `children` is empty.
    pub fn new(children: Vec<Box<dyn Behavior<C> + 'n>>) -> Self {
        assert!(!children.is_empty(), "Sequence must have at least one child");
        Self { children }
    }
}

impl<C> Behavior<C> for Sequence<'_, C> {
    fn tick(&self, ctx: &mut C) -> Status {
        for child in &self.children {
            if child.tick(ctx) == Status::Failure {
                return Status::Failure;
            }
        }
        Status::Success
    }
}

/// Runs children left to right until one succeeds (logical OR).
pub struct Selector<'n, C> {
    children: Vec<Box<dyn Behavior<C> + 'n>>,
}

impl<'n, C> Selector<'n, C> {
    /// # Panics
    ///
    /// Panics if `children` is empty.
    pub fn new(children: Vec<Box<dyn Behavior<C> + 'n>>) -> Self {
        assert!(!children.is_empty(), "Selector must have at least one child");
        Self { children }
    }
}

impl<C> Behavior<C> for Selector<'_, C> {
    fn tick(&self, ctx: &mut C) -> Status {
        for child in &self.children {
            if child.tick(ctx) == Status::Success {
                return Status::Success;
            }
        }
        Status::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        value: i32,
    }

    struct Increment;
    impl Behavior<Counter> for Increment {
        fn tick(&self, ctx: &mut Counter) -> Status {
            ctx.value += 1;
            Status::Success
        }
    }

    struct FailAlways;
    impl Behavior<Counter> for FailAlways {
        fn tick(&self, _ctx: &mut Counter) -> Status {
            Status::Failure
        }
    }

    #[test]
    fn sequence_short_circuits_on_failure() {
        let seq = Sequence::new(vec![
            Box::new(Increment),
            Box::new(FailAlways),
            Box::new(Increment),
        ]);
        let mut ctx = Counter { value: 0 };
        assert_eq!(seq.tick(&mut ctx), Status::Failure);
        assert_eq!(ctx.value, 1);
    }

    #[test]
    fn selector_stops_at_first_success() {
        let sel = Selector::new(vec![
            Box::new(FailAlways),
            Box::new(Increment),
            Box::new(Increment),
        ]);
        let mut ctx = Counter { value: 0 };
        assert_eq!(sel.tick(&mut ctx), Status::Success);
        assert_eq!(ctx.value, 1);
    }

    #[test]
    fn selector_fails_when_all_children_fail() {
        let sel: Selector<'_, Counter> = Selector::new(vec![Box::new(FailAlways)]);
        assert_eq!(sel.tick(&mut Counter { value: 0 }), Status::Failure);
    }

    struct Borrowed<'a> {
        value: &'a mut i32,
    }

    struct Bump;
    impl<'a> Behavior<Borrowed<'a>> for Bump {
        fn tick(&self, ctx: &mut Borrowed<'a>) -> Status {
            *ctx.value += 1;
            Status::Success
        }
    }

    fn borrowed_tree<'a>() -> Selector<'a, Borrowed<'a>> {
        Selector::new(vec![Box::new(Sequence::new(vec![Box::new(Bump), Box::new(Bump)]))])
    }

    #[test]
    fn trees_run_over_borrowed_contexts() {
        let mut value = 0;
        let mut ctx = Borrowed { value: &mut value };
        assert_eq!(borrowed_tree().tick(&mut ctx), Status::Success);
        assert_eq!(value, 2);
    }
}
