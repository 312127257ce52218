//! Ordered throttle policy chains.

use crate::{DefaultPolicy, Next, ThrottleConfig, ThrottleContext, ThrottleParams, ThrottlePolicy};
use tracing::debug;

/// An ordered, default-terminated list of throttle policies.
///
/// The chain is fixed once built: custom nodes are added through
/// [`ThrottleChainBuilder`] and the last node is always a
/// [`DefaultPolicy`]. Traversal is by position, so node N sees nodes
/// `N+1..` as its [`Next`].
///
/// # Examples
///
/// ```
/// use numerous_throttle::{NoVoluntaryBackoff, RequestRecorder, ThrottleChain};
///
/// let (recorder, log) = RequestRecorder::new();
/// let chain = ThrottleChain::builder()
///     .policy(recorder)
///     .policy(NoVoluntaryBackoff::default())
///     .build();
///
/// assert_eq!(chain.len(), 3);
/// assert!(log.is_empty());
/// ```
#[derive(Debug)]
pub struct ThrottleChain {
    policies: Vec<Box<dyn ThrottlePolicy>>,
}

impl ThrottleChain {
    /// A chain holding only `terminal`.
    pub fn new(terminal: DefaultPolicy) -> Self {
        Self {
            policies: vec![Box::new(terminal)],
        }
    }

    /// A chain holding only the default policy built from `config`.
    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(DefaultPolicy::from_config(config))
    }

    /// Start building a chain with custom nodes in front of the default.
    pub fn builder() -> ThrottleChainBuilder {
        ThrottleChainBuilder::default()
    }

    /// Run the whole chain for one attempt.
    pub fn decide(&mut self, ctx: &mut ThrottleContext<'_>, params: &ThrottleParams<'_>) -> bool {
        self.decide_from(0, ctx, params)
    }

    /// Run the chain starting at node `position`. Positions past the end
    /// accept the response.
    pub fn decide_from(
        &mut self,
        position: usize,
        ctx: &mut ThrottleContext<'_>,
        params: &ThrottleParams<'_>,
    ) -> bool {
        let start = position.min(self.policies.len());
        let retry = Next::new(&mut self.policies[start..]).decide(ctx, params);
        debug!(
            attempt = params.attempt,
            code = params.result_code,
            retry,
            "Throttle chain decision"
        );
        retry
    }

    /// Number of nodes, including the default.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Always false; a chain has at least its default node.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Default for ThrottleChain {
    fn default() -> Self {
        Self::new(DefaultPolicy::default())
    }
}

/// Builder for [`ThrottleChain`].
#[derive(Debug, Default)]
pub struct ThrottleChainBuilder {
    policies: Vec<Box<dyn ThrottlePolicy>>,
    terminal: Option<DefaultPolicy>,
}

impl ThrottleChainBuilder {
    /// Append a custom node. Nodes run in the order they are added.
    pub fn policy(mut self, policy: impl ThrottlePolicy + 'static) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    /// Append an already boxed node.
    pub fn boxed(mut self, policy: Box<dyn ThrottlePolicy>) -> Self {
        self.policies.push(policy);
        self
    }

    /// Replace the terminal default policy.
    pub fn terminal(mut self, terminal: DefaultPolicy) -> Self {
        self.terminal = Some(terminal);
        self
    }

    /// Build the chain.
    pub fn build(self) -> ThrottleChain {
        let mut policies = self.policies;
        policies.push(Box::new(self.terminal.unwrap_or_default()));
        ThrottleChain { policies }
    }
}
