use crate::feature::Feature;
use anyhow::{Context, Result};
use rand::Rng;
use std::marker::PhantomData;

/// A stateless, composable processing step from `I` to `O`.
///
/// Pipelines are built by chaining steps with [`Transform::then`]; each stage
/// owns its configuration, holds no per-call state, and may be invoked from
/// multiple threads at once.
pub trait Transform<I, O>: Send + Sync {
    /// Applies the transformation to the input.
    fn apply(&self, input: I) -> Result<O>;

    /// Chains `self` with `next`, producing a single fused transform.
    #[inline]
    fn then<T, M>(self, next: T) -> Chain<Self, T, O>
    where
        Self: Sized,
        T: Transform<O, M>,
        O: Send,
        M: Send,
    {
        Chain {
            first: self,
            second: next,
            _marker: PhantomData,
        }
    }
}

/// A randomized transform split into its two phases: parameter sampling and
/// deterministic application.
///
/// `sample_params` is the only place randomness enters; it takes an explicit
/// generator so callers (and tests) can control seeding. `apply_with` is a
/// pure function of input and params. Params are built fresh per invocation
/// and discarded afterwards.
pub trait RandomTransform: Send + Sync {
    /// Sampled parameters consumed by [`RandomTransform::apply_with`].
    type Params;

    /// Draws one fresh parameter set for this invocation.
    fn sample_params<R: Rng + ?Sized>(&self, input: &Feature, rng: &mut R) -> Self::Params;

    /// Applies the transform under the given parameters.
    fn apply_with(&self, input: Feature, params: &Self::Params) -> Result<Feature>;
}

/// Two transforms run back to back. The `M` marker pins the intermediate type
/// so `Chain` implements exactly one `Transform<I, O>`.
#[derive(Debug)]
pub struct Chain<A, B, M> {
    first: A,
    second: B,
    _marker: PhantomData<fn() -> M>,
}

impl<A, B, M> Chain<A, B, M> {
    /// Builds a chain from parts. Prefer [`Transform::then`]; this constructor
    /// exists for pipelines assembled dynamically.
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            _marker: PhantomData,
        }
    }
}

impl<I, M, O, A, B> Transform<I, O> for Chain<A, B, M>
where
    A: Transform<I, M>,
    B: Transform<M, O>,
    M: Send,
{
    fn apply(&self, input: I) -> Result<O> {
        let mid = self
            .first
            .apply(input)
            .with_context(|| format!("first stage failed: {}", std::any::type_name::<A>()))?;
        self.second
            .apply(mid)
            .with_context(|| format!("second stage failed: {}", std::any::type_name::<B>()))
    }
}
