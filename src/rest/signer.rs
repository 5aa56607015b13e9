//! Request signing hook installed on authenticated clients.

// crates.io
use reqwest::Request;
// self
use crate::_prelude::*;

/// Boxed future returned by [`RequestSigner::sign`].
pub type SignFuture<'a> = Pin<Box<dyn Future<Output = Result<Request>> + 'a + Send>>;

/// Mutates an outbound request (typically its headers) right before it is sent.
///
/// Failures abort the request and surface to the caller unchanged.
pub trait RequestSigner
where
	Self: Send + Sync,
{
	/// Consumes the built request and returns the signed one.
	fn sign(&self, request: Request) -> SignFuture<'_>;
}
