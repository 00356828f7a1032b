use std::path::PathBuf;

use crate::http::files;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Turns a fully read request into the response to send back.
pub trait Responder {
    fn respond(&self, request: &Request) -> Response;
}

/// Answers every request with a fixed `Hello World!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HelloWorld;

impl Responder for HelloWorld {
    fn respond(&self, _request: &Request) -> Response {
        Response::ok("Hello World!")
    }
}

/// Serves files from a directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index: String,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, index: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index: index.into(),
        }
    }
}

impl Responder for StaticFiles {
    fn respond(&self, request: &Request) -> Response {
        let head_only = match request.method() {
            Some(Method::GET) => false,
            Some(Method::HEAD) => true,
            _ => return Response::method_not_allowed(),
        };

        let file = match files::read(&self.root, &request.path, &self.index) {
            Ok(Some(file)) => file,
            Ok(None) => return Response::not_found(),
            Err(_) => return Response::internal_error(),
        };

        let builder = ResponseBuilder::new(StatusCode::Ok).header("Content-Type", file.content_type);

        if head_only {
            builder
                .header_int("Content-Length", file.bytes.len() as i64)
                .build()
        } else {
            builder.body(file.bytes).build()
        }
    }
}
