use bytes::{Buf, Bytes, BytesMut};
use http::HeaderMap;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    /// A response body that may have been minified.
    ///
    /// Eligible responses are buffered and replayed from memory, with the
    /// minified bytes when minification paid off. Everything else is passed
    /// through unchanged and unbuffered.
    #[project = MinifyBodyProj]
    #[allow(missing_docs)]
    pub enum MinifyBody<B> {
        /// Body buffered by the middleware.
        Buffered {
            state: BufferedBody,
        },
        /// Passthrough body without minification.
        Passthrough {
            #[pin]
            inner: B,
        },
    }
}

/// A body held in memory, replayed as one data frame followed by an optional
/// error or trailers.
pub(crate) struct BufferedBody {
    data: Option<Bytes>,
    error: Option<io::Error>,
    trailers: Option<HeaderMap>,
}

impl BufferedBody {
    fn next_frame(&mut self) -> Option<Result<Frame<Bytes>, io::Error>> {
        if let Some(data) = self.data.take().filter(|data| !data.is_empty()) {
            return Some(Ok(Frame::data(data)));
        }
        if let Some(error) = self.error.take() {
            self.trailers = None;
            return Some(Err(error));
        }
        self.trailers.take().map(|trailers| Ok(Frame::trailers(trailers)))
    }

    fn is_end_stream(&self) -> bool {
        self.data.as_ref().is_none_or(Bytes::is_empty)
            && self.error.is_none()
            && self.trailers.is_none()
    }

    fn remaining(&self) -> u64 {
        self.data.as_ref().map_or(0, |data| data.len() as u64)
    }
}

impl<B> MinifyBody<B> {
    /// Creates a body that replays `data`, then `trailers` if any.
    pub fn buffered(data: Bytes, trailers: Option<HeaderMap>) -> Self {
        Self::Buffered {
            state: BufferedBody {
                data: Some(data),
                error: None,
                trailers,
            },
        }
    }

    /// Creates a body that replays the bytes read before `error`, then
    /// yields the error.
    pub(crate) fn failed(data: Bytes, error: io::Error) -> Self {
        Self::Buffered {
            state: BufferedBody {
                data: Some(data),
                error: Some(error),
                trailers: None,
            },
        }
    }

    /// Creates a passthrough body.
    pub fn passthrough(inner: B) -> Self {
        Self::Passthrough { inner }
    }
}

impl<B> Body for MinifyBody<B>
where
    B: Body,
    B::Data: Buf,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            MinifyBodyProj::Passthrough { inner } => {
                // Pass through frames, converting data to Bytes
                match inner.poll_frame(cx) {
                    Poll::Pending => Poll::Pending,
                    Poll::Ready(None) => Poll::Ready(None),
                    Poll::Ready(Some(Ok(frame))) => {
                        let frame = frame.map_data(|mut data| {
                            let mut bytes = BytesMut::with_capacity(data.remaining());
                            while data.has_remaining() {
                                let chunk = data.chunk();
                                bytes.extend_from_slice(chunk);
                                let len = chunk.len();
                                data.advance(len);
                            }
                            bytes.freeze()
                        });
                        Poll::Ready(Some(Ok(frame)))
                    }
                    Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(io::Error::other(e.into())))),
                }
            }
            MinifyBodyProj::Buffered { state } => Poll::Ready(state.next_frame()),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            MinifyBody::Passthrough { inner } => inner.is_end_stream(),
            MinifyBody::Buffered { state } => state.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            MinifyBody::Passthrough { inner } => inner.size_hint(),
            MinifyBody::Buffered { state } => SizeHint::with_exact(state.remaining()),
        }
    }
}
