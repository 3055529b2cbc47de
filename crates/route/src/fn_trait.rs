//! Positional capture extraction.
//!
//! [`capture_fn`] and [`async_capture_fn`] adapt plain functions whose
//! parameters are taken from the route captures in left-to-right order:
//!
//! ```
//! use micro_route::{capture_fn, Router};
//!
//! let mut router = Router::builder().build().unwrap();
//! router
//!     .on("get", "/users/:id/posts/:post", capture_fn(|id: String, post: String| {
//!         assert_eq!((id.as_str(), post.as_str()), ("42", "7"));
//!     }))
//!     .unwrap();
//!
//! assert!(router.dispatch("get", "/users/42/posts/7").unwrap().is_matched());
//! ```

use crate::context::RouteContext;
use crate::error::BoxError;
use crate::handler::{AsyncRouteHandler, Flow, IntoFlow, RouteHandler};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

/// Conversion of one capture position into a handler argument.
pub trait FromCapture: Sized {
    fn from_capture(value: Option<&str>) -> Result<Self, BoxError>;
}

impl FromCapture for String {
    fn from_capture(value: Option<&str>) -> Result<Self, BoxError> {
        value.map(ToOwned::to_owned).ok_or_else(|| "missing capture for a required argument".into())
    }
}

impl FromCapture for Option<String> {
    #[inline]
    fn from_capture(value: Option<&str>) -> Result<Self, BoxError> {
        Ok(value.map(ToOwned::to_owned))
    }
}

/// A function called with the captures of a route as positional arguments.
pub trait CaptureFn<Args> {
    type Output;
    fn call(&self, ctx: &RouteContext) -> Result<Self::Output, BoxError>;
}

/// impl `Fn` for `CaptureFn`, From 0 parameters to 12 parameters
///
/// for example, it will impl Fn(A, B) like this:
///```ignore
/// impl<Func, Out, A, B> CaptureFn<(A, B)> for Func
///    where
///        Func: Fn(A, B) -> Out,
///        A: FromCapture,
///        B: FromCapture,
/// {
///    type Output = Out;
///
///    fn call(&self, ctx: &RouteContext) -> Result<Out, BoxError> {
///        let mut captures = ctx.captures().iter();
///        let A = A::from_capture(captures.next().flatten())?;
///        let B = B::from_capture(captures.next().flatten())?;
///        Ok((self)(A, B))
///    }
/// }
///```
macro_rules! impl_capture_fn_for_fn ({ $($param:ident)* } => {
    impl<Func, Out, $($param,)*> CaptureFn<($($param,)*)> for Func
    where
        Func: Fn($($param),*) -> Out,
        $($param: FromCapture,)*
    {
        type Output = Out;

        #[inline]
        #[allow(non_snake_case, unused_mut, unused_variables, reason = "generated per arity")]
        fn call(&self, ctx: &RouteContext) -> Result<Out, BoxError> {
            let mut captures = ctx.captures().iter();
            $(let $param = <$param as FromCapture>::from_capture(captures.next().flatten())?;)*
            Ok((self)($($param),*))
        }
    }
});

impl_capture_fn_for_fn! {}
impl_capture_fn_for_fn! { A }
impl_capture_fn_for_fn! { A B }
impl_capture_fn_for_fn! { A B C }
impl_capture_fn_for_fn! { A B C D }
impl_capture_fn_for_fn! { A B C D E }
impl_capture_fn_for_fn! { A B C D E F }
impl_capture_fn_for_fn! { A B C D E F G }
impl_capture_fn_for_fn! { A B C D E F G H }
impl_capture_fn_for_fn! { A B C D E F G H I }
impl_capture_fn_for_fn! { A B C D E F G H I J }
impl_capture_fn_for_fn! { A B C D E F G H I J K }
impl_capture_fn_for_fn! { A B C D E F G H I J K L }

/// a sync handler calling `f` with the route captures as arguments
pub struct CaptureHandler<F, Args> {
    f: F,
    phantom: PhantomData<fn(Args)>,
}

pub fn capture_fn<F, Args>(f: F) -> CaptureHandler<F, Args>
where
    F: CaptureFn<Args>,
{
    CaptureHandler { f, phantom: PhantomData }
}

impl<F, Args> RouteHandler for CaptureHandler<F, Args>
where
    F: CaptureFn<Args> + Send + Sync,
    F::Output: IntoFlow,
{
    fn invoke(&self, ctx: &RouteContext) -> Result<Flow, BoxError> {
        self.f.call(ctx)?.into_flow()
    }
}

impl<F, Args> fmt::Debug for CaptureHandler<F, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureHandler").finish_non_exhaustive()
    }
}

/// an async handler awaiting the future `f` returns for the route captures
pub struct AsyncCaptureHandler<F, Args> {
    f: F,
    phantom: PhantomData<fn(Args)>,
}

pub fn async_capture_fn<F, Args>(f: F) -> AsyncCaptureHandler<F, Args>
where
    F: CaptureFn<Args>,
    F::Output: Future,
{
    AsyncCaptureHandler { f, phantom: PhantomData }
}

#[async_trait]
impl<F, Args, Fut> AsyncRouteHandler for AsyncCaptureHandler<F, Args>
where
    F: CaptureFn<Args, Output = Fut> + Send + Sync,
    Fut: Future + Send,
    Fut::Output: IntoFlow,
{
    async fn invoke(&self, ctx: &RouteContext) -> Result<Flow, BoxError> {
        let fut = self.f.call(ctx)?;
        fut.await.into_flow()
    }
}

impl<F, Args> fmt::Debug for AsyncCaptureHandler<F, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncCaptureHandler").finish_non_exhaustive()
    }
}
