//! HTTP response minification middleware for Tower.
//!
//! This crate provides a Tower layer that rewrites HTTP response bodies into
//! their minified form based on the response `Content-Type`. HTML, CSS and
//! JavaScript are minified by default; JSON, XML and SVG can be enabled
//! through [`Settings`].
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use http::{Request, Response, header};
//! use http_body_util::Full;
//! use http_response_minify::{MinifyLayer, Settings};
//! use std::convert::Infallible;
//! use tower::{ServiceBuilder, service_fn};
//!
//! let service = ServiceBuilder::new()
//!     .layer(MinifyLayer::with_settings(Settings::default().json(true)))
//!     .service(service_fn(|_req: Request<()>| async {
//!         let response = Response::builder()
//!             .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
//!             .body(Full::new(Bytes::from_static(b"<p>  Hello  </p>")))
//!             .unwrap();
//!         Ok::<_, Infallible>(response)
//!     }));
//! # drop(service);
//! ```
//!
//! Handlers that write to a response object instead of returning one can use
//! [`WriterMiddleware`], which captures what they write and commits it once
//! the pipeline has run.
//!
//! # Minification Rules
//!
//! The middleware will **not** touch a response when:
//! - The skip predicate matches the request
//! - The status is not `2xx`, or is `204 No Content`
//! - No `Content-Type` header is set, or it cannot be parsed
//! - `Content-Encoding` is set to anything other than `identity`
//! - `Content-Range` header is present (range responses)
//! - No enabled transformer matches the media type
//! - The body is empty
//! - The transformer fails
//! - The minified body is not strictly smaller than the original
//!
//! Responses ruled out by their head are streamed through without being
//! buffered. Eligible responses are buffered in full before minification.
//!
//! # Response Modifications
//!
//! When minification is applied:
//! - The body is replaced by the minified bytes
//! - `Content-Length` is set to the minified length
//! - `Accept-Ranges` header is removed
//! - `Content-Type` and every other header are left exactly as they were

#![deny(missing_docs)]

mod body;
mod capture;
mod config;
mod error;
mod future;
mod layer;
mod media;
mod pipeline;
mod registry;
mod service;
pub mod transform;
mod writer;

pub use body::MinifyBody;
pub use capture::{Capture, Responder};
pub use config::Settings;
pub use error::{BoxError, ParseError, TransformError};
pub use future::ResponseFuture;
pub use layer::{MinifyLayer, SkipPredicate};
pub use media::{Category, MediaType};
pub use pipeline::{Minifier, MinifierBuilder, Outcome, Skip};
pub use registry::{Matcher, Registry};
pub use service::MinifyService;
pub use transform::Transformer;
pub use writer::WriterMiddleware;
