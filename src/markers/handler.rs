//! Handler registration
//!
//! Handlers are registered per method name. A typed handler declares its
//! parameters through the tuple type of its second argument:
//!
//! ```ignore
//! Handler::new(|call, (name, pos): (String, Position)| { ... })
//! ```
//!
//! Every handler also receives a [`Call`], which bundles the diagnostics
//! sink, the engine, and the marker being dispatched.

use std::collections::HashMap;

use crate::markers::convert::{parse_kinds, Param, ParamKind, Value};
use crate::markers::engine::Markers;
use crate::markers::error::{MarkerError, Result};
use crate::markers::parse::Marker;

/// Non-fatal problems reported while processing markers
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<MarkerError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error and keep going
    pub fn error(&mut self, err: MarkerError) {
        tracing::warn!(code = err.code(), "{}", err);
        self.errors.push(err);
    }

    pub fn errors(&self) -> &[MarkerError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The ambient context handed to every handler invocation
pub struct Call<'a> {
    diagnostics: &'a mut Diagnostics,
    markers: &'a Markers,
    marker: &'a Marker,
}

impl<'a> Call<'a> {
    pub(crate) fn new(
        diagnostics: &'a mut Diagnostics,
        markers: &'a Markers,
        marker: &'a Marker,
    ) -> Self {
        Self {
            diagnostics,
            markers,
            marker,
        }
    }

    /// Where non-fatal errors go
    pub fn diagnostics(&mut self) -> &mut Diagnostics {
        &mut *self.diagnostics
    }

    /// The engine dispatching this call
    pub fn markers(&self) -> &'a Markers {
        self.markers
    }

    /// The marker being dispatched
    pub fn marker(&self) -> &'a Marker {
        self.marker
    }

    /// Build a handler failure located at the current marker
    pub fn fail(&self, message: impl Into<String>) -> MarkerError {
        MarkerError::Handler {
            marker: self.marker.to_string(),
            message: message.into(),
        }
    }
}

/// A parameter list declared as a tuple of [`Param`] types
pub trait Params: Sized {
    fn kinds() -> Vec<ParamKind>;

    fn from_values(values: Vec<Value>) -> Option<Self>;
}

impl Params for () {
    fn kinds() -> Vec<ParamKind> {
        Vec::new()
    }

    fn from_values(values: Vec<Value>) -> Option<Self> {
        values.is_empty().then_some(())
    }
}

macro_rules! impl_params {
    ($($t:ident),+) => {
        impl<$($t: Param),+> Params for ($($t,)+) {
            fn kinds() -> Vec<ParamKind> {
                vec![$($t::KIND),+]
            }

            fn from_values(values: Vec<Value>) -> Option<Self> {
                let mut values = values.into_iter();
                let params = ($($t::from_value(values.next()?)?,)+);
                values.next().is_none().then_some(params)
            }
        }
    };
}

impl_params!(A);
impl_params!(A, B);
impl_params!(A, B, C);
impl_params!(A, B, C, D);
impl_params!(A, B, C, D, E);
impl_params!(A, B, C, D, E, F);

type HandlerFn<'h> = dyn FnMut(&mut Call<'_>, Vec<Value>) -> Result<()> + 'h;

fn boxed<'h, F>(f: F) -> Box<HandlerFn<'h>>
where
    F: FnMut(&mut Call<'_>, Vec<Value>) -> Result<()> + 'h,
{
    Box::new(f)
}

/// A function bound to a marker method, with its declared parameters
pub struct Handler<'h> {
    kinds: Vec<ParamKind>,
    f: Box<HandlerFn<'h>>,
}

impl<'h> Handler<'h> {
    /// A handler whose parameters are the tuple type `P`
    pub fn new<P, F>(mut f: F) -> Self
    where
        P: Params + 'h,
        F: FnMut(&mut Call<'_>, P) -> Result<()> + 'h,
    {
        Self {
            kinds: P::kinds(),
            f: boxed(move |call, values| {
                let params = P::from_values(values)
                    .ok_or_else(|| call.fail("converted arguments do not match parameters"))?;
                f(call, params)
            }),
        }
    }

    /// A handler with an explicit parameter list and untyped values
    pub fn dynamic<F>(kinds: Vec<ParamKind>, f: F) -> Self
    where
        F: FnMut(&mut Call<'_>, Vec<Value>) -> Result<()> + 'h,
    {
        Self {
            kinds,
            f: boxed(f),
        }
    }

    /// A dynamic handler whose parameters are given as text, e.g.
    /// `"string, position"`. Unknown kinds are rejected here, before any
    /// marker is processed.
    pub fn from_signature<F>(signature: &str, f: F) -> Result<Self>
    where
        F: FnMut(&mut Call<'_>, Vec<Value>) -> Result<()> + 'h,
    {
        Ok(Self::dynamic(parse_kinds(signature)?, f))
    }

    pub fn kinds(&self) -> &[ParamKind] {
        &self.kinds
    }

    pub(crate) fn call(&mut self, call: &mut Call<'_>, values: Vec<Value>) -> Result<()> {
        (self.f)(call, values)
    }
}

/// Handlers keyed by marker method name
#[derive(Default)]
pub struct Handlers<'h> {
    map: HashMap<String, Handler<'h>>,
}

impl<'h> Handlers<'h> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Register a handler, replacing any earlier one for the same method
    pub fn insert(&mut self, method: impl Into<String>, handler: Handler<'h>) {
        self.map.insert(method.into(), handler);
    }

    /// Builder form of [`Handlers::insert`]
    pub fn on(mut self, method: impl Into<String>, handler: Handler<'h>) -> Self {
        self.insert(method, handler);
        self
    }

    pub fn contains(&self, method: &str) -> bool {
        self.map.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Handler<'h>)> {
        self.map.iter_mut().map(|(name, h)| (name.as_str(), h))
    }
}
