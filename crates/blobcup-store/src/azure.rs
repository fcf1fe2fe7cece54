use std::time::Duration;

use async_trait::async_trait;
use blobcup_types::BlobEntry;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use tracing::{debug, instrument, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::listing::parse_listing;
use crate::traits::{BlobAttributes, ObjectStore};

/// Characters escaped inside a blob path. `/` is kept so virtual
/// directories survive.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Everything but `A-Za-z0-9-_.!~*'()` is escaped, matching the
/// `encodeURIComponent` convention used for attribute values.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a value the way browsers' `encodeURIComponent` does.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Blob store speaking the Azure Blob REST dialect, authorised by a shared
/// access signature appended to every URL.
pub struct AzureBlobStore {
    config: StoreConfig,
    client: reqwest::Client,
}

impl AzureBlobStore {
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn with_sas(&self, url: String) -> String {
        let sas = self.config.sas_query();
        if sas.is_empty() {
            url
        } else {
            format!("{url}?{sas}")
        }
    }

    fn blob_url(&self, container: &str, key: &str) -> String {
        let key = utf8_percent_encode(key, PATH_SEGMENT);
        self.with_sas(format!("{}/{container}/{key}", self.config.service_url()))
    }

    fn list_url(&self, container: &str, marker: Option<&str>) -> String {
        let mut url = format!(
            "{}/{container}?restype=container&comp=list",
            self.config.service_url()
        );
        if let Some(marker) = marker {
            url.push_str("&marker=");
            url.push_str(&encode_component(marker));
        }
        let sas = self.config.sas_query();
        if !sas.is_empty() {
            url.push('&');
            url.push_str(sas);
        }
        url
    }

    /// GET with linear backoff on transport failures and 5xx answers.
    /// 404 and other 4xx answers are final.
    #[instrument(name = "blob_get_with_retry", skip(self, url))]
    async fn get_with_retry(
        &self,
        url: &str,
        subject: &str,
        operation: &'static str,
    ) -> StoreResult<Vec<u8>> {
        let retry = &self.config.retry;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .bytes()
                        .await
                        .map(|b| b.to_vec())
                        .map_err(|e| StoreError::Transport {
                            operation,
                            reason: e.to_string(),
                        });
                }
                Ok(resp) if resp.status() == StatusCode::NOT_FOUND => {
                    return Err(StoreError::NotFound {
                        container: String::new(),
                        key: subject.to_string(),
                    });
                }
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_server_error() || attempt >= retry.max_attempts {
                        return Err(StoreError::Status {
                            operation,
                            status: status.as_u16(),
                            target: subject.to_string(),
                        });
                    }
                    debug!(attempt, status = status.as_u16(), "retrying after server error");
                }
                Err(e) => {
                    if attempt >= retry.max_attempts {
                        return Err(StoreError::Transport {
                            operation,
                            reason: without_query(&e.to_string()),
                        });
                    }
                    debug!(attempt, "retrying after transport error");
                }
            }
            tokio::time::sleep(Duration::from_millis(
                retry.base_backoff_ms.saturating_mul(attempt as u64),
            ))
            .await;
        }
    }
}

/// Strip anything after `?` so SAS signatures never reach logs.
fn without_query(text: &str) -> String {
    match text.find('?') {
        Some(idx) => format!("{}?<sas>", &text[..idx]),
        None => text.to_string(),
    }
}

/// Only 404 means absent. Throttling, auth failures and server errors are
/// reported so a missing answer is never read as a missing blob.
fn exists_from_status(status: StatusCode, subject: &str) -> StoreResult<bool> {
    if status.is_success() {
        Ok(true)
    } else if status == StatusCode::NOT_FOUND {
        Ok(false)
    } else {
        Err(StoreError::Status {
            operation: "exists",
            status: status.as_u16(),
            target: subject.to_string(),
        })
    }
}

fn attribute_headers(
    content_type: &str,
    attributes: &BlobAttributes,
) -> StoreResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert("x-ms-blob-type", HeaderValue::from_static("BlockBlob"));
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .map_err(|e| StoreError::InvalidConfig(format!("content type: {e}")))?,
    );
    for (name, value) in attributes {
        let header = HeaderName::from_bytes(format!("x-ms-meta-{name}").as_bytes())
            .map_err(|e| StoreError::InvalidConfig(format!("attribute name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| StoreError::InvalidConfig(format!("attribute value {name}: {e}")))?;
        headers.insert(header, value);
    }
    Ok(headers)
}

#[async_trait]
impl ObjectStore for AzureBlobStore {
    #[instrument(name = "blob_list", skip(self))]
    async fn list(&self, container: &str) -> StoreResult<Vec<BlobEntry>> {
        let mut entries = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let url = self.list_url(container, marker.as_deref());
            let body = self.get_with_retry(&url, container, "list").await?;
            let xml = String::from_utf8(body)
                .map_err(|e| StoreError::Listing(format!("non UTF-8 listing: {e}")))?;
            let page = parse_listing(&xml, |name| self.blob_url(container, name))?;
            entries.extend(page.entries);
            match page.next_marker {
                Some(next) => marker = Some(next),
                None => break,
            }
        }
        debug!(count = entries.len(), "listed container");
        Ok(entries)
    }

    #[instrument(name = "blob_exists", skip(self))]
    async fn exists(&self, container: &str, key: &str) -> StoreResult<bool> {
        let url = self.blob_url(container, key);
        let resp = self
            .client
            .request(Method::HEAD, &url)
            .send()
            .await
            .map_err(|e| {
                let reason = without_query(&e.to_string());
                warn!(error = %reason, "existence check failed");
                StoreError::Transport {
                    operation: "exists",
                    reason,
                }
            })?;
        exists_from_status(resp.status(), &format!("{container}/{key}"))
    }

    #[instrument(name = "blob_read", skip(self))]
    async fn read_bytes(&self, container: &str, key: &str) -> StoreResult<Vec<u8>> {
        let url = self.blob_url(container, key);
        let subject = format!("{container}/{key}");
        self.get_with_retry(&url, &subject, "read")
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => StoreError::not_found(container, key),
                other => other,
            })
    }

    #[instrument(name = "blob_write", skip(self, data, attributes), fields(len = data.len()))]
    async fn write_binary(
        &self,
        container: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        attributes: &BlobAttributes,
    ) -> StoreResult<String> {
        let url = self.blob_url(container, key);
        let headers = attribute_headers(content_type, attributes)?;
        let resp = self
            .client
            .put(&url)
            .headers(headers)
            .body(data)
            .send()
            .await
            .map_err(|e| StoreError::Transport {
                operation: "write",
                reason: without_query(&e.to_string()),
            })?;
        if !resp.status().is_success() {
            return Err(StoreError::Status {
                operation: "write",
                status: resp.status().as_u16(),
                target: format!("{container}/{key}"),
            });
        }
        Ok(key.to_string())
    }

    fn locator(&self, container: &str, key: &str) -> String {
        self.blob_url(container, key)
    }
}

impl std::fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobStore")
            .field("service_url", &self.config.service_url())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AzureBlobStore {
        AzureBlobStore::new(StoreConfig::new("acct", "sv=2024&sig=abc%3D")).unwrap()
    }

    #[test]
    fn blob_url_carries_sas() {
        let s = store();
        assert_eq!(
            s.locator("images", "1700_cat.png"),
            "https://acct.blob.core.windows.net/images/1700_cat.png?sv=2024&sig=abc%3D"
        );
    }

    #[test]
    fn blob_url_escapes_key_but_keeps_slashes() {
        let s = store();
        let url = s.blob_url("docs", "dir/my file#1.pdf");
        assert!(url.starts_with("https://acct.blob.core.windows.net/docs/dir/my%20file%231.pdf?"));
    }

    #[test]
    fn list_url_shape() {
        let s = store();
        assert_eq!(
            s.list_url("images", None),
            "https://acct.blob.core.windows.net/images?restype=container&comp=list&sv=2024&sig=abc%3D"
        );
        let paged = s.list_url("images", Some("2!84!MD=="));
        assert!(paged.contains("&marker=2!84!MD%3D%3D&"));
    }

    #[test]
    fn empty_sas_leaves_urls_bare() {
        let s = AzureBlobStore::new(StoreConfig {
            endpoint: Some("http://127.0.0.1:10000/dev".into()),
            ..StoreConfig::default()
        })
        .unwrap();
        assert_eq!(s.locator("c", "k"), "http://127.0.0.1:10000/dev/c/k");
        assert_eq!(
            s.list_url("c", None),
            "http://127.0.0.1:10000/dev/c?restype=container&comp=list"
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(AzureBlobStore::new(StoreConfig::default()).is_err());
    }

    #[test]
    fn encode_component_matches_browser_convention() {
        assert_eq!(encode_component("a.b@example.com"), "a.b%40example.com");
        assert_eq!(encode_component("x y+z"), "x%20y%2Bz");
        assert_eq!(encode_component("(ok)*!~'"), "(ok)*!~'");
    }

    #[test]
    fn exists_status_mapping() {
        assert!(exists_from_status(StatusCode::OK, "c/k").unwrap());
        assert!(!exists_from_status(StatusCode::NOT_FOUND, "c/k").unwrap());
        for status in [
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::FORBIDDEN,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            match exists_from_status(status, "images/votes.json") {
                Err(StoreError::Status {
                    operation,
                    status: code,
                    target,
                }) => {
                    assert_eq!(operation, "exists");
                    assert_eq!(code, status.as_u16());
                    assert_eq!(target, "images/votes.json");
                }
                other => panic!("expected a status error for {status}, got {other:?}"),
            }
        }
    }

    #[test]
    fn attribute_headers_are_prefixed() {
        let mut attrs = BlobAttributes::new();
        attrs.insert("uploader".into(), encode_component("me@x.com"));
        let headers = attribute_headers("image/png", &attrs).unwrap();
        assert_eq!(headers.get("x-ms-blob-type").unwrap(), "BlockBlob");
        assert_eq!(headers.get("content-type").unwrap(), "image/png");
        assert_eq!(headers.get("x-ms-meta-uploader").unwrap(), "me%40x.com");
    }

    #[test]
    fn query_is_redacted() {
        assert_eq!(
            without_query("error sending request for url (https://a/b?sig=secret)"),
            "error sending request for url (https://a/b?<sas>"
        );
        assert_eq!(without_query("timeout"), "timeout");
    }
}
