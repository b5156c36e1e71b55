use bytes::{Bytes, BytesMut};
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Response, StatusCode};
use std::io;

/// Something a status, headers and body can be written to.
///
/// Adapters implement this for a framework's native response type; the
/// pipeline only ever talks to this trait.
pub trait Responder {
    /// Returns the current status code.
    fn status(&self) -> StatusCode;

    /// Sets the status code.
    fn set_status(&mut self, status: StatusCode);

    /// Returns the response headers.
    fn headers(&self) -> &HeaderMap;

    /// Returns the response headers for modification.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Writes part of the body, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Writes the whole buffer.
    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Replaces all values of a header.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers_mut().insert(name, value);
    }

    /// Removes a header, returning its first value.
    fn remove_header(&mut self, name: &HeaderName) -> Option<HeaderValue> {
        self.headers_mut().remove(name)
    }
}

impl<R: Responder + ?Sized> Responder for &mut R {
    fn status(&self) -> StatusCode {
        (**self).status()
    }

    fn set_status(&mut self, status: StatusCode) {
        (**self).set_status(status)
    }

    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }
}

/// A buffering [`Responder`] that records status, headers and body without
/// sending anything.
///
/// The status defaults to `200 OK`. Nothing reaches the real responder until
/// [`Capture::commit`] is called.
#[derive(Debug, Clone)]
pub struct Capture {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl Default for Capture {
    fn default() -> Self {
        Self::new()
    }
}

impl Capture {
    /// Creates an empty capture with status `200 OK`.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// Creates a capture from an already produced response.
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: impl Into<BytesMut>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Returns the recorded status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the recorded headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the buffered body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Replaces the body, sets `Content-Length` to its length and drops
    /// `Accept-Ranges`.
    pub(crate) fn replace_body(&mut self, body: Vec<u8>) {
        self.headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        // Ranges of the original bytes no longer match this body
        self.headers.remove(header::ACCEPT_RANGES);
        self.body = BytesMut::from(&body[..]);
    }

    /// Splits the capture into its status, headers and body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body.freeze())
    }

    /// Converts the capture into an `http` response.
    pub fn into_response(self) -> Response<Bytes> {
        let (status, headers, body) = self.into_parts();
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }

    /// Writes status, headers and body to `out`.
    ///
    /// Every header name present in the capture replaces the values already
    /// set on `out`; other headers on `out` are left alone.
    pub fn commit<R>(self, out: &mut R) -> io::Result<()>
    where
        R: Responder + ?Sized,
    {
        out.set_status(self.status);

        let dst = out.headers_mut();
        for name in self.headers.keys() {
            dst.remove(name);
        }
        for (name, value) in &self.headers {
            dst.append(name.clone(), value.clone());
        }

        if self.body.is_empty() {
            return Ok(());
        }
        out.write_all(&self.body)
    }
}

impl Responder for Capture {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Responder::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An in-memory `http` response used as the final responder.
impl Responder for Response<Vec<u8>> {
    fn status(&self) -> StatusCode {
        Response::status(self)
    }

    fn set_status(&mut self, status: StatusCode) {
        *self.status_mut() = status;
    }

    fn headers(&self) -> &HeaderMap {
        Response::headers(self)
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        Response::headers_mut(self)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
}
