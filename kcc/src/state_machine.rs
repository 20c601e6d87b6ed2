/*!
State machine driven by controller ticks.

Game logic names its states with a small `Copy` enum and supplies one table
function mapping each state to its handlers. Inside a tick's movement hook it
calls [`StateMachine::super_update`], which runs the early global hook, the
current state's update and the late global hook, then applies any transition
the update asked for.

Transitions run `exit(old)`, record `old` as the last state, then `enter(new)`.
Requesting the current state is a no-op.
*/

use std::fmt::Debug;

use crate::controller::Controller;

/// Marker for state enums.
pub trait StateTag: Copy + Eq + Debug {}

impl<T: Copy + Eq + Debug> StateTag for T {}

/// Enter/exit handler.
pub type StateFn<C> = fn(&mut C, &mut Controller);

/// Per-tick handler; returning a state requests a transition.
pub type UpdateFn<S, C> = fn(&mut C, &mut Controller) -> Option<S>;

pub struct StateHandlers<S, C> {
    pub enter: Option<StateFn<C>>,
    pub update: Option<UpdateFn<S, C>>,
    pub exit: Option<StateFn<C>>,
}

impl<S, C> StateHandlers<S, C> {
    /// A state that does nothing.
    pub const fn none() -> Self {
        Self {
            enter: None,
            update: None,
            exit: None,
        }
    }

    pub const fn update(update: UpdateFn<S, C>) -> Self {
        Self {
            enter: None,
            update: Some(update),
            exit: None,
        }
    }
}

impl<S, C> Clone for StateHandlers<S, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, C> Copy for StateHandlers<S, C> {}

pub struct StateMachine<S: StateTag, C> {
    current: S,
    last: Option<S>,
    table: fn(S) -> StateHandlers<S, C>,
    early: Option<StateFn<C>>,
    late: Option<StateFn<C>>,
    time_in_state: f32,
}

impl<S: StateTag, C> StateMachine<S, C> {
    /// Start in `initial` without running its enter handler; see `enter_current`.
    pub fn new(initial: S, table: fn(S) -> StateHandlers<S, C>) -> Self {
        Self {
            current: initial,
            last: None,
            table,
            early: None,
            late: None,
            time_in_state: 0.0,
        }
    }

    /// Hook run before every state update.
    pub fn with_early_update(mut self, early: StateFn<C>) -> Self {
        self.early = Some(early);
        self
    }

    /// Hook run after every state update.
    pub fn with_late_update(mut self, late: StateFn<C>) -> Self {
        self.late = Some(late);
        self
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn last(&self) -> Option<S> {
        self.last
    }

    /// Seconds of controller time spent in the current state.
    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    /// Run the current state's enter handler, e.g. right after construction.
    pub fn enter_current(&mut self, ctx: &mut C, controller: &mut Controller) {
        if let Some(enter) = (self.table)(self.current).enter {
            enter(ctx, controller);
        }
    }

    pub fn change_state(&mut self, next: S, ctx: &mut C, controller: &mut Controller) {
        if next == self.current {
            return;
        }
        log::info!("state {:?} -> {:?}", self.current, next);

        if let Some(exit) = (self.table)(self.current).exit {
            exit(ctx, controller);
        }
        self.last = Some(self.current);
        self.current = next;
        self.time_in_state = 0.0;
        if let Some(enter) = (self.table)(next).enter {
            enter(ctx, controller);
        }
    }

    /// Early hook, current state's update, late hook, then the requested transition.
    pub fn super_update(&mut self, ctx: &mut C, controller: &mut Controller) {
        self.time_in_state += controller.delta_time();

        if let Some(early) = self.early {
            early(ctx, controller);
        }
        let next = (self.table)(self.current)
            .update
            .and_then(|update| update(ctx, controller));
        if let Some(late) = self.late {
            late(ctx, controller);
        }

        if let Some(next) = next {
            self.change_state(next, ctx, controller);
        }
    }
}
