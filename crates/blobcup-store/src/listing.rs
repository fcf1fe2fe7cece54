//! Decoding of the XML container enumeration returned by the blob service.

use blobcup_types::BlobEntry;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{StoreError, StoreResult};

/// One page of a container enumeration.
#[derive(Debug, PartialEq, Eq)]
pub struct ListingPage {
    pub entries: Vec<BlobEntry>,
    /// Continuation marker; `None` on the last page.
    pub next_marker: Option<String>,
}

#[derive(Deserialize)]
struct EnumerationResults {
    #[serde(rename = "Blobs", default)]
    blobs: BlobsXml,
    #[serde(rename = "NextMarker", default)]
    next_marker: Option<String>,
}

#[derive(Deserialize, Default)]
struct BlobsXml {
    #[serde(rename = "Blob", default)]
    blob: Vec<BlobXml>,
}

#[derive(Deserialize)]
struct BlobXml {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Properties")]
    properties: PropertiesXml,
}

#[derive(Deserialize)]
struct PropertiesXml {
    #[serde(rename = "Content-Length", default)]
    content_length: u64,
    #[serde(rename = "Content-Type", default)]
    content_type: Option<String>,
    #[serde(rename = "Last-Modified", default)]
    last_modified: Option<String>,
}

/// Parse an enumeration page. `locator` maps a blob name to its URL.
pub fn parse_listing(xml: &str, locator: impl Fn(&str) -> String) -> StoreResult<ListingPage> {
    let results: EnumerationResults =
        quick_xml::de::from_str(xml).map_err(|e| StoreError::Listing(e.to_string()))?;

    let entries = results
        .blobs
        .blob
        .into_iter()
        .map(|b| BlobEntry {
            locator: locator(&b.name),
            size: b.properties.content_length,
            content_type: b.properties.content_type.unwrap_or_default(),
            last_modified: b.properties.last_modified.as_deref().and_then(parse_http_date),
            name: b.name,
        })
        .collect();

    Ok(ListingPage {
        entries,
        next_marker: results
            .next_marker
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty()),
    })
}

/// `Last-Modified` uses the RFC 1123 date format.
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAGE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://acct.blob.core.windows.net/" ContainerName="images">
  <Blobs>
    <Blob>
      <Name>1700_cat.png</Name>
      <Properties>
        <Creation-Time>Fri, 21 Nov 2025 05:42:59 GMT</Creation-Time>
        <Last-Modified>Fri, 21 Nov 2025 05:42:59 GMT</Last-Modified>
        <Etag>0x8DC</Etag>
        <Content-Length>2048</Content-Length>
        <Content-Type>image/png</Content-Type>
        <BlobType>BlockBlob</BlobType>
      </Properties>
      <OrMetadata />
    </Blob>
    <Blob>
      <Name>votes.json</Name>
      <Properties>
        <Last-Modified>Fri, 21 Nov 2025 06:00:00 GMT</Last-Modified>
        <Content-Length>57</Content-Length>
        <Content-Type>text/plain</Content-Type>
      </Properties>
    </Blob>
  </Blobs>
  <NextMarker>2!84!MDAwMDE</NextMarker>
</EnumerationResults>"#;

    fn loc(name: &str) -> String {
        format!("https://acct/images/{name}")
    }

    #[test]
    fn parses_entries_in_order() {
        let page = parse_listing(PAGE, loc).unwrap();
        assert_eq!(page.entries.len(), 2);

        let cat = &page.entries[0];
        assert_eq!(cat.name, "1700_cat.png");
        assert_eq!(cat.size, 2048);
        assert_eq!(cat.content_type, "image/png");
        assert_eq!(cat.locator, "https://acct/images/1700_cat.png");
        assert_eq!(
            cat.last_modified,
            Some(Utc.with_ymd_and_hms(2025, 11, 21, 5, 42, 59).unwrap())
        );
        assert!(cat.is_image());
        assert!(!page.entries[1].is_image());
    }

    #[test]
    fn keeps_continuation_marker() {
        let page = parse_listing(PAGE, loc).unwrap();
        assert_eq!(page.next_marker.as_deref(), Some("2!84!MDAwMDE"));
    }

    #[test]
    fn empty_container_has_no_marker() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ContainerName="images"><Blobs /><NextMarker /></EnumerationResults>"#;
        let page = parse_listing(xml, loc).unwrap();
        assert!(page.entries.is_empty());
        assert!(page.next_marker.is_none());
    }

    #[test]
    fn missing_content_type_is_empty() {
        let xml = r#"<EnumerationResults><Blobs><Blob><Name>raw</Name><Properties>
<Content-Length>1</Content-Length></Properties></Blob></Blobs></EnumerationResults>"#;
        let page = parse_listing(xml, loc).unwrap();
        assert_eq!(page.entries[0].content_type, "");
        assert!(page.entries[0].last_modified.is_none());
    }

    #[test]
    fn garbage_is_a_listing_error() {
        let err = parse_listing("<not-closed", loc).unwrap_err();
        assert!(matches!(err, StoreError::Listing(_)));
    }
}
