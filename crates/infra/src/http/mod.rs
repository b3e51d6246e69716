//! HTTP request core
//!
//! Leaf components (request ids, headers, URLs, envelopes, error
//! classification) are plain functions; [`XdrClient`] sequences them around
//! a [`Transport`].

pub mod classifier;
pub mod client;
pub mod context;
pub mod envelope;
pub mod headers;
pub mod replay;
pub mod request_id;
pub mod transport;
pub mod url;

pub use client::{XdrClient, XdrClientBuilder};
pub use context::RequestContext;
pub use replay::{ReplayStep, ReplayTransport};
pub use transport::{
    HttpRequest, HttpResponse, ReqwestTransport, ReqwestTransportBuilder, Transport,
    TransportError,
};
