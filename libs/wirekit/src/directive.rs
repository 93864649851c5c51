//! Directive envelope shared by every subsystem.
//!
//! A directive is created once by a registration call and then only read by the
//! compilers. Its identity is `(owner, key, category)`; `key` is empty for
//! class-level directives.

use std::borrow::Cow;
use std::fmt;

use crate::class::ClassId;
use crate::http::{MiddlewareEntry, MiddlewareKey};
use crate::routing::{EndpointParams, RouterParams, UseMiddlewareParams};
use crate::schema::{
    CreatedType, EnumValueParams, FieldParams, FieldResolverParams, RootFieldParams, TypeParams,
};
use crate::websocket::{EventParams, WebsocketParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Routing,
    Type,
    Messaging,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Routing => "routing",
            Category::Type => "type",
            Category::Messaging => "messaging",
        })
    }
}

#[derive(Clone, Debug)]
pub enum RoutingDirective {
    Router(RouterParams),
    Endpoint(EndpointParams),
    Middleware {
        key: MiddlewareKey,
        entry: MiddlewareEntry,
    },
    UseMiddleware(UseMiddlewareParams),
}

#[derive(Clone, Debug)]
pub enum TypeDirective {
    Type(TypeParams),
    Field(FieldParams),
    EnumValue(EnumValueParams),
    /// Marks the owner as a resolver class.
    Resolver,
    RootField(RootFieldParams),
    /// Computed field contributed by a resolver class to an object type.
    FieldResolver(FieldResolverParams),
    Created(CreatedType),
}

#[derive(Clone, Debug)]
pub enum MessagingDirective {
    Websocket(WebsocketParams),
    On(EventParams),
}

#[derive(Clone, Debug)]
pub enum Payload {
    Routing(RoutingDirective),
    Type(TypeDirective),
    Messaging(MessagingDirective),
}

#[derive(Clone, Debug)]
pub struct Directive {
    pub owner: ClassId,
    pub key: Cow<'static, str>,
    pub payload: Payload,
}

impl Directive {
    pub fn new(owner: ClassId, key: impl Into<Cow<'static, str>>, payload: Payload) -> Self {
        Self {
            owner,
            key: key.into(),
            payload,
        }
    }

    pub fn category(&self) -> Category {
        match self.payload {
            Payload::Routing(_) => Category::Routing,
            Payload::Type(_) => Category::Type,
            Payload::Messaging(_) => Category::Messaging,
        }
    }

    pub fn routing(&self) -> Option<&RoutingDirective> {
        match &self.payload {
            Payload::Routing(r) => Some(r),
            _ => None,
        }
    }

    pub fn type_directive(&self) -> Option<&TypeDirective> {
        match &self.payload {
            Payload::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn messaging(&self) -> Option<&MessagingDirective> {
        match &self.payload {
            Payload::Messaging(m) => Some(m),
            _ => None,
        }
    }
}
