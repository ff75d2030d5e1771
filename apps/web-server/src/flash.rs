//! One-time data carried across a redirect.
//!
//! The payload lives in the [`Cache`] under a random key, and only the key
//! travels in the `folio_flash` cookie. Reading the flash consumes it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use actix_web::HttpRequest;
use actix_web::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use folio_core::Notice;
use folio_core::ports::{Cache, CacheError};
use folio_core::validation::FieldErrors;

pub const FLASH_COOKIE: &str = "folio_flash";

const FLASH_TTL: Duration = Duration::from_secs(5 * 60);

/// Notice, field errors and previously submitted input for the next page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    #[serde(default)]
    pub notice: Option<Notice>,
    #[serde(default)]
    pub errors: FieldErrors,
    #[serde(default)]
    pub old: BTreeMap<String, String>,
}

impl Flash {
    pub fn notice(notice: Notice) -> Self {
        Self {
            notice: Some(notice),
            ..Self::default()
        }
    }

    pub fn invalid(errors: FieldErrors, old: BTreeMap<String, String>) -> Self {
        Self {
            errors,
            old,
            ..Self::default()
        }
    }

    /// Previously submitted value of a field.
    pub fn old(&self, field: &str) -> Option<&str> {
        self.old.get(field).map(String::as_str)
    }
}

/// Flash storage backed by the cache port.
#[derive(Clone)]
pub struct FlashStore {
    cache: Arc<dyn Cache>,
}

impl FlashStore {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Stash `flash` and return the cookie pointing at it.
    pub async fn put(&self, flash: &Flash) -> Result<Cookie<'static>, CacheError> {
        let key = Uuid::new_v4().simple().to_string();
        let payload =
            serde_json::to_string(flash).map_err(|e| CacheError::Serialization(e.to_string()))?;

        self.cache
            .set(&cache_key(&key), &payload, Some(FLASH_TTL))
            .await?;

        Ok(Cookie::build(FLASH_COOKIE, key)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish())
    }

    /// Consume the flash referenced by the request's cookie.
    ///
    /// A missing, expired or unreadable entry yields an empty flash; a page
    /// never fails because its flash is gone.
    pub async fn take(&self, req: &HttpRequest) -> Flash {
        let Some(cookie) = req.cookie(FLASH_COOKIE) else {
            return Flash::default();
        };

        let payload = match self.cache.take(&cache_key(cookie.value())).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return Flash::default(),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read flash data");
                return Flash::default();
            }
        };

        serde_json::from_str(&payload).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Discarding malformed flash data");
            Flash::default()
        })
    }
}

/// Cookie that makes the browser forget a consumed flash key.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

fn cache_key(key: &str) -> String {
    format!("flash:{key}")
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;
    use folio_infra::InMemoryCache;

    use super::*;

    fn store() -> FlashStore {
        FlashStore::new(Arc::new(InMemoryCache::new()))
    }

    #[actix_web::test]
    async fn test_put_then_take_once() {
        let store = store();
        let flash = Flash::notice(Notice::success("Saved"));

        let cookie = store.put(&flash).await.unwrap();
        assert_eq!(cookie.name(), FLASH_COOKIE);

        let req = TestRequest::default().cookie(cookie.clone()).to_http_request();
        assert_eq!(store.take(&req).await, flash);

        let again = TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(store.take(&again).await, Flash::default());
    }

    #[actix_web::test]
    async fn test_keeps_errors_and_old_input() {
        let store = store();
        let mut errors = FieldErrors::new();
        errors.add("title", "The title field is required.");
        let old = BTreeMap::from([("content".to_string(), "draft".to_string())]);

        let cookie = store
            .put(&Flash::invalid(errors.clone(), old))
            .await
            .unwrap();
        let req = TestRequest::default().cookie(cookie).to_http_request();
        let flash = store.take(&req).await;

        assert_eq!(flash.errors, errors);
        assert_eq!(flash.old("content"), Some("draft"));
        assert!(flash.notice.is_none());
    }

    #[actix_web::test]
    async fn test_unknown_key_is_empty() {
        let req = TestRequest::default()
            .cookie(Cookie::new(FLASH_COOKIE, "nope"))
            .to_http_request();

        assert_eq!(store().take(&req).await, Flash::default());
    }
}
