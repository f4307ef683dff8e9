//! Listing backend trait.

use as3_error::ListingError;
use as3_types::ListPage;
use async_trait::async_trait;

/// Trait for object-store listing backends.
///
/// Implementations include:
/// - In-memory bucket (testing, dry runs)
/// - AWS S3 `ListObjectsV2` (production)
///
/// # Pagination
///
/// A single call returns one page. Callers repeat the call with the returned
/// `next_token` until it is `None`; the concatenation of all pages is the full
/// result for the `(prefix, delimiter)` pair.
///
/// # Errors
///
/// Inaccessible or missing containers are reported as
/// [`ListingError::AccessOrNotFound`], everything else (timeouts included) as
/// [`ListingError::Failed`].
#[async_trait]
pub trait ListingClient: Send + Sync {
    /// Lists one page of `container` under `prefix`.
    ///
    /// With a delimiter, keys containing the delimiter after `prefix` are
    /// rolled up into `group_prefixes` (each ending with the delimiter) and only
    /// direct children are returned as items. Without a delimiter every object
    /// under `prefix` is returned as an item.
    async fn list(
        &self,
        container: &str,
        prefix: &str,
        delimiter: Option<char>,
        continuation: Option<&str>,
    ) -> Result<ListPage, ListingError>;
}
