//! The throttle policy interface.

use crate::{Sleeper, ThrottleParams};
use numerous_core::Statistics;

/// Connection state a policy may touch: the statistics to count into and
/// the sleeper to block on.
#[derive(Debug)]
pub struct ThrottleContext<'a> {
    /// Connection statistics
    pub stats: &'a mut Statistics,
    /// Connection sleeper
    pub sleeper: &'a dyn Sleeper,
}

/// One node of a throttle chain.
///
/// `decide` returns `true` to discard the response and send the request
/// again, or `false` to accept the response as final (whether or not it was
/// an HTTP success). A node that has no opinion must call
/// [`Next::decide`] with the same parameters and return its answer;
/// returning `false` without delegating bypasses everything after it,
/// including the built-in 429 handling.
///
/// # Retry hazard
///
/// Returning `true` re-sends the request verbatim. For non-idempotent
/// operations (writing an event, posting a comment) a retry after a response
/// the server actually acted on duplicates the write. Only force retries for
/// responses the server is known to have rejected, such as 429.
///
/// # Examples
///
/// ```
/// use numerous_throttle::{Next, ThrottleContext, ThrottleParams, ThrottlePolicy};
///
/// /// Never slow down voluntarily; let the rest of the chain handle 429.
/// #[derive(Debug)]
/// struct OnlyWhenForced;
///
/// impl ThrottlePolicy for OnlyWhenForced {
///     fn decide(
///         &mut self,
///         ctx: &mut ThrottleContext<'_>,
///         params: &ThrottleParams<'_>,
///         next: Next<'_>,
///     ) -> bool {
///         params.is_too_many_requests() && next.decide(ctx, params)
///     }
/// }
/// ```
pub trait ThrottlePolicy: std::fmt::Debug + Send {
    /// Decide whether to retry after one attempt.
    fn decide(
        &mut self,
        ctx: &mut ThrottleContext<'_>,
        params: &ThrottleParams<'_>,
        next: Next<'_>,
    ) -> bool;
}

/// The part of the chain after the current node.
#[derive(Debug)]
pub struct Next<'a> {
    rest: &'a mut [Box<dyn ThrottlePolicy>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(rest: &'a mut [Box<dyn ThrottlePolicy>]) -> Self {
        Self { rest }
    }

    /// Hand the decision to the next node. Past the end of the chain the
    /// response is accepted.
    pub fn decide(self, ctx: &mut ThrottleContext<'_>, params: &ThrottleParams<'_>) -> bool {
        match self.rest.split_first_mut() {
            Some((head, tail)) => head.decide(ctx, params, Next::new(tail)),
            None => false,
        }
    }

    /// Number of nodes still ahead.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}
