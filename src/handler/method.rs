//! Typed method adapters.
//!
//! Rust has no runtime reflection, so the registration site is where a
//! method's shape is visible. The traits here synthesize, at that site,
//! everything the dispatcher needs to call the function later with raw
//! JSON in hand:
//!
//! - [`Params`] - the argument tuple: fixed arity, per-slot decoding, and
//!   an optional [`Variadic`] tail
//! - [`Handler`] - the calling convention: any `async` function or closure
//!   over decodable arguments, optionally taking a [`CallContext`] first
//! - [`IntoOutcome`] - the return convention: a plain serializable value,
//!   or a `Result` whose error either is an [`RpcError`] (sent verbatim)
//!   or becomes an internal error
//!
//! [`TypedMethod`] erases all of that into the object-safe [`Method`]
//! trait the registry stores.
//!
//! # Params wire shapes
//!
//! The `params` member may be a JSON array (positional) or any other value.
//! A non-array value is re-wrapped as a one-element array, so unary methods
//! accept a bare scalar or object as their sole argument. The re-wrap
//! reuses the already-buffered bytes; nothing is parsed twice.

use std::future::{ready, Future};
use std::marker::PhantomData;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::Value;

use super::context::CallContext;
use crate::error::{BoxError, RpcError};

/// Boxed future for erased method calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe calling surface stored in the registry.
///
/// Implementations receive the raw `params` bytes and perform their own
/// argument binding; the future resolves to the call's outcome.
pub trait Method: Send + Sync {
    fn call(
        &self,
        cx: CallContext,
        params: Option<Box<RawValue>>,
    ) -> BoxFuture<'static, Result<Value, RpcError>>;
}

/// Marker for the trailing parameter of a variadic method.
///
/// A handler whose last argument is `Variadic<T>` accepts any number of
/// trailing `T` arguments at or beyond its fixed arity:
///
/// ```ignore
/// server.register("multiecho", |words: Variadic<String>| async move {
///     words.join(" ")
/// });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variadic<T>(pub Vec<T>);

impl<T> std::ops::Deref for Variadic<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.0
    }
}

impl<T> IntoIterator for Variadic<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Split raw `params` into positional argument slices.
///
/// Absent, `null`, or empty params mean zero arguments. A JSON array is
/// positional; anything else becomes the single argument of a unary
/// method (the original bytes, re-wrapped without re-parsing).
fn split_args(params: Option<&RawValue>) -> Vec<&RawValue> {
    let raw = match params {
        Some(raw) if raw.get() != "null" => raw,
        _ => return Vec::new(),
    };
    match serde_json::from_str::<Vec<&RawValue>>(raw.get()) {
        Ok(args) => args,
        Err(_) => vec![raw],
    }
}

/// Decode one positional slot, preserving the offending bytes on failure.
fn bind_slot<T: DeserializeOwned>(method: &str, arg: &RawValue) -> Result<T, RpcError> {
    serde_json::from_str(arg.get()).map_err(|err| {
        // The slot came out of a parsed value, so it re-parses as a Value.
        let data = serde_json::from_str(arg.get()).unwrap_or(Value::Null);
        RpcError::invalid_params(format!("{method}: {err}")).with_data(data)
    })
}

/// Marker types distinguishing the otherwise-overlapping [`Handler`],
/// [`Params`], and [`IntoOutcome`] impl families. Never named in user
/// code; inference picks them from the registered function's signature.
pub mod marker {
    pub struct Plain;
    pub struct WithContext;

    pub struct Fixed;
    pub struct Var;

    pub struct Infallible;
    pub struct Fallible;
    pub struct FallibleBoxed;
}

/// An argument tuple bindable from positional raw slots.
///
/// `M` is [`marker::Fixed`] for plain tuples and [`marker::Var`] for
/// tuples ending in a [`Variadic`] tail.
pub trait Params<M>: Sized + Send + 'static {
    fn bind(method: &str, args: &[&RawValue]) -> Result<Self, RpcError>;
}

impl Params<marker::Fixed> for () {
    fn bind(method: &str, args: &[&RawValue]) -> Result<Self, RpcError> {
        if !args.is_empty() {
            return Err(RpcError::invalid_params(format!(
                "{method}: require 0 params"
            )));
        }
        Ok(())
    }
}

macro_rules! impl_params {
    ($arity:literal; $(($ty:ident, $idx:tt)),+) => {
        impl<$($ty,)+> Params<marker::Fixed> for ($($ty,)+)
        where
            $($ty: DeserializeOwned + Send + 'static,)+
        {
            fn bind(method: &str, args: &[&RawValue]) -> Result<Self, RpcError> {
                if args.len() != $arity {
                    return Err(RpcError::invalid_params(format!(
                        "{method}: require {} params", $arity
                    )));
                }
                Ok(($(bind_slot::<$ty>(method, args[$idx])?,)+))
            }
        }
    };
}

macro_rules! impl_params_variadic {
    ($arity:literal; $(($ty:ident, $idx:tt)),*) => {
        impl<$($ty,)* T> Params<marker::Var> for ($($ty,)* Variadic<T>,)
        where
            $($ty: DeserializeOwned + Send + 'static,)*
            T: DeserializeOwned + Send + 'static,
        {
            // The arity-0 expansion compares a usize against 0.
            #[allow(unused_comparisons)]
            fn bind(method: &str, args: &[&RawValue]) -> Result<Self, RpcError> {
                if args.len() < $arity {
                    return Err(RpcError::invalid_params(format!(
                        "{method}: require at least {} params", $arity
                    )));
                }
                let tail = args[$arity..]
                    .iter()
                    .map(|arg| bind_slot::<T>(method, arg))
                    .collect::<Result<Vec<T>, RpcError>>()?;
                Ok(($(bind_slot::<$ty>(method, args[$idx])?,)* Variadic(tail),))
            }
        }
    };
}

impl_params!(1; (A0, 0));
impl_params!(2; (A0, 0), (A1, 1));
impl_params!(3; (A0, 0), (A1, 1), (A2, 2));
impl_params!(4; (A0, 0), (A1, 1), (A2, 2), (A3, 3));
impl_params!(5; (A0, 0), (A1, 1), (A2, 2), (A3, 3), (A4, 4));
impl_params!(6; (A0, 0), (A1, 1), (A2, 2), (A3, 3), (A4, 4), (A5, 5));
impl_params!(7; (A0, 0), (A1, 1), (A2, 2), (A3, 3), (A4, 4), (A5, 5), (A6, 6));
impl_params!(8; (A0, 0), (A1, 1), (A2, 2), (A3, 3), (A4, 4), (A5, 5), (A6, 6), (A7, 7));

impl_params_variadic!(0;);
impl_params_variadic!(1; (A0, 0));
impl_params_variadic!(2; (A0, 0), (A1, 1));
impl_params_variadic!(3; (A0, 0), (A1, 1), (A2, 2));
impl_params_variadic!(4; (A0, 0), (A1, 1), (A2, 2), (A3, 3));
impl_params_variadic!(5; (A0, 0), (A1, 1), (A2, 2), (A3, 3), (A4, 4));
impl_params_variadic!(6; (A0, 0), (A1, 1), (A2, 2), (A3, 3), (A4, 4), (A5, 5));
impl_params_variadic!(7; (A0, 0), (A1, 1), (A2, 2), (A3, 3), (A4, 4), (A5, 5), (A6, 6));

/// Conversion from a handler's return value to the call outcome.
pub trait IntoOutcome<M> {
    fn into_outcome(self) -> Result<Value, RpcError>;
}

fn to_result_value<T: Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|err| RpcError::internal(err.to_string()))
}

impl<T: Serialize> IntoOutcome<marker::Infallible> for T {
    fn into_outcome(self) -> Result<Value, RpcError> {
        to_result_value(self)
    }
}

impl<T, E> IntoOutcome<marker::Fallible> for Result<T, E>
where
    T: Serialize,
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_outcome(self) -> Result<Value, RpcError> {
        match self {
            Ok(value) => to_result_value(value),
            Err(err) => Err(RpcError::from_boxed(Box::new(err))),
        }
    }
}

impl<T: Serialize> IntoOutcome<marker::FallibleBoxed> for Result<T, BoxError> {
    fn into_outcome(self) -> Result<Value, RpcError> {
        match self {
            Ok(value) => to_result_value(value),
            Err(err) => Err(RpcError::from_boxed(err)),
        }
    }
}

/// A registrable method: any async function over decodable arguments.
///
/// Given the method name (for error messages) and the raw `params`, an
/// implementation binds its arguments, invokes itself, and converts the
/// return value. The `T` parameter is inferred marker state; see
/// [`marker`].
pub trait Handler<T>: Send + Sync + 'static {
    fn call(
        &self,
        method: &str,
        cx: CallContext,
        params: Option<Box<RawValue>>,
    ) -> BoxFuture<'static, Result<Value, RpcError>>;
}

macro_rules! impl_handler {
    ($($ty:ident),*) => {
        impl<F, Fut, Out, M, P, $($ty,)*> Handler<(marker::Plain, M, P, ($($ty,)*))> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Out> + Send + 'static,
            Out: IntoOutcome<M>,
            M: 'static,
            P: 'static,
            ($($ty,)*): Params<P>,
            $($ty: Send + 'static,)*
        {
            #[allow(non_snake_case)]
            fn call(
                &self,
                method: &str,
                _cx: CallContext,
                params: Option<Box<RawValue>>,
            ) -> BoxFuture<'static, Result<Value, RpcError>> {
                let args = split_args(params.as_deref());
                let ($($ty,)*) = match <($($ty,)*) as Params<P>>::bind(method, &args) {
                    Ok(bound) => bound,
                    Err(err) => return Box::pin(ready(Err(err))),
                };
                let fut = (self)($($ty),*);
                Box::pin(async move { fut.await.into_outcome() })
            }
        }

        impl<F, Fut, Out, M, P, $($ty,)*> Handler<(marker::WithContext, M, P, ($($ty,)*))> for F
        where
            F: Fn(CallContext, $($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Out> + Send + 'static,
            Out: IntoOutcome<M>,
            M: 'static,
            P: 'static,
            ($($ty,)*): Params<P>,
            $($ty: Send + 'static,)*
        {
            #[allow(non_snake_case)]
            fn call(
                &self,
                method: &str,
                cx: CallContext,
                params: Option<Box<RawValue>>,
            ) -> BoxFuture<'static, Result<Value, RpcError>> {
                let args = split_args(params.as_deref());
                let ($($ty,)*) = match <($($ty,)*) as Params<P>>::bind(method, &args) {
                    Ok(bound) => bound,
                    Err(err) => return Box::pin(ready(Err(err))),
                };
                let fut = (self)(cx, $($ty),*);
                Box::pin(async move { fut.await.into_outcome() })
            }
        }
    };
}

impl_handler!();
impl_handler!(A0);
impl_handler!(A0, A1);
impl_handler!(A0, A1, A2);
impl_handler!(A0, A1, A2, A3);
impl_handler!(A0, A1, A2, A3, A4);
impl_handler!(A0, A1, A2, A3, A4, A5);
impl_handler!(A0, A1, A2, A3, A4, A5, A6);
impl_handler!(A0, A1, A2, A3, A4, A5, A6, A7);

/// Erases a typed [`Handler`] into the registry's [`Method`] shape.
pub struct TypedMethod<F, T> {
    name: String,
    handler: F,
    _marker: PhantomData<fn() -> T>,
}

impl<F, T> TypedMethod<F, T> {
    pub fn new(name: String, handler: F) -> Self {
        Self {
            name,
            handler,
            _marker: PhantomData,
        }
    }
}

impl<F, T> Method for TypedMethod<F, T>
where
    F: Handler<T>,
    T: 'static,
{
    fn call(
        &self,
        cx: CallContext,
        params: Option<Box<RawValue>>,
    ) -> BoxFuture<'static, Result<Value, RpcError>> {
        self.handler.call(&self.name, cx, params)
    }
}
