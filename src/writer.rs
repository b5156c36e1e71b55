use crate::capture::{Capture, Responder};
use crate::config::Settings;
use crate::pipeline::{Minifier, Outcome, Skip};
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::trace;

/// Middleware for handlers that write their response through a
/// [`Responder`] instead of returning one.
///
/// The handler is given a [`Capture`] in place of the real responder. Once
/// it returns, the captured response goes through the [`Minifier`] and is
/// committed to the real responder in one piece.
///
/// `C` is the request context the handler and the skip predicate receive.
pub struct WriterMiddleware<C: ?Sized> {
    minifier: Arc<Minifier>,
    skip: Option<Arc<dyn Fn(&C) -> bool + Send + Sync>>,
}

impl<C: ?Sized> WriterMiddleware<C> {
    /// Creates the middleware around a shared minifier.
    pub fn new(minifier: impl Into<Arc<Minifier>>) -> Self {
        Self {
            minifier: minifier.into(),
            skip: None,
        }
    }

    /// Creates the middleware with the bundled transformers.
    pub fn with_settings(settings: Settings) -> Self {
        Self::new(Minifier::new(settings))
    }

    /// Bypasses minification for requests matching `predicate`.
    ///
    /// Matching handlers write straight to the real responder.
    pub fn skip_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(predicate));
        self
    }

    /// Returns the shared minifier.
    pub fn minifier(&self) -> &Arc<Minifier> {
        &self.minifier
    }

    /// Runs `handler` for `ctx` and writes its response to `out`.
    ///
    /// If the handler fails, nothing it wrote is committed and its error is
    /// returned unchanged. Errors writing to `out` are converted into `E`.
    pub fn serve<R, F, E>(&self, ctx: &C, out: &mut R, handler: F) -> Result<Outcome, E>
    where
        R: Responder + ?Sized,
        F: FnOnce(&C, &mut dyn Responder) -> Result<(), E>,
        E: From<io::Error>,
    {
        if self.skip.as_ref().is_some_and(|skip| skip(ctx)) {
            trace!(reason = ?Skip::Bypassed, "response left unmodified");
            handler(ctx, &mut &mut *out)?;
            return Ok(Outcome::Skipped(Skip::Bypassed));
        }

        let mut capture = Capture::new();
        handler(ctx, &mut capture)?;

        let (capture, outcome) = self.minifier.process(capture);
        capture.commit(out)?;
        Ok(outcome)
    }
}

impl<C: ?Sized> Clone for WriterMiddleware<C> {
    fn clone(&self) -> Self {
        Self {
            minifier: self.minifier.clone(),
            skip: self.skip.clone(),
        }
    }
}

impl<C: ?Sized> fmt::Debug for WriterMiddleware<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterMiddleware")
            .field("minifier", &self.minifier)
            .field("skip", &self.skip.is_some())
            .finish()
    }
}
