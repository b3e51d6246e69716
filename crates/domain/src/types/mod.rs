//! Request-core data types

pub mod api_error;
pub mod build_info;
pub mod request;

pub use api_error::{
    ApiErrorBody, ErrExtra, FlatError, ReplyError, ValidationContext, ValidationFailure,
};
pub use build_info::BuildInfo;
pub use request::{ApiResponse, EnvelopeOptions, HttpMethod, RequestSpec};
