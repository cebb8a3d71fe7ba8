use chrono::{DateTime, Utc};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use std::str;
use tracing::debug;
use url::Url;

use crate::errors::WebDavError;

/// One `<response>` of a PROPFIND multistatus body.
#[derive(Debug, Clone, PartialEq)]
pub struct PropfindResponseElement {
    pub url: Url,
    /// 0 for the requested resource itself, 1 for its direct members.
    pub depth: u8,
    /// `None` when the server did not report `resourcetype`.
    pub collection: Option<bool>,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_length: Option<u64>,
}

#[derive(Debug, Default, Clone)]
struct Properties {
    collection: Option<bool>,
    last_modified: Option<String>,
    content_length: Option<String>,
}

impl Properties {
    fn merge(&mut self, other: Properties) {
        if other.collection.is_some() {
            self.collection = other.collection;
        }
        if other.last_modified.is_some() {
            self.last_modified = other.last_modified;
        }
        if other.content_length.is_some() {
            self.content_length = other.content_length;
        }
    }
}

#[derive(Debug, Default)]
struct PropFindResponse {
    href: String,
    properties: Properties,
}

/// Parses a multistatus body returned for a PROPFIND on `request_url`.
///
/// Properties are only taken from `propstat` blocks with a 2xx status, so servers
/// listing unsupported properties under `404 Not Found` parse fine. Responses that
/// are neither the requested resource nor one of its direct members are skipped.
/// A body without the requested resource itself is an invalid response.
pub fn parse_propfind_response(
    xml_text: &str,
    request_url: &Url,
) -> Result<Vec<PropfindResponseElement>, WebDavError> {
    let mut reader = Reader::from_str(xml_text);
    reader.config_mut().trim_text(true);

    let request_segments = decoded_segments(request_url);
    let mut elements = Vec::new();
    let mut current_response: Option<PropFindResponse> = None;
    let mut pending = Properties::default();
    let mut propstat_status: Option<u16> = None;
    // Open elements, innermost last. `location` and `error` carry hrefs of their own.
    let mut open_elements: Vec<String> = Vec::new();
    let mut in_propstat = false;
    let mut in_resourcetype = false;

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = get_local_name(&e)?;

                match name.as_str() {
                    "response" => {
                        current_response = Some(PropFindResponse::default());
                    }
                    "propstat" => {
                        in_propstat = true;
                        pending = Properties::default();
                        propstat_status = None;
                    }
                    "resourcetype" => {
                        in_resourcetype = true;
                        pending.collection = Some(false);
                    }
                    "collection" if in_resourcetype => {
                        pending.collection = Some(true);
                    }
                    _ => {}
                }

                open_elements.push(name);
            }
            Event::Empty(e) => {
                let name = get_local_name(&e)?;

                match name.as_str() {
                    "resourcetype" => {
                        pending.collection = Some(false);
                    }
                    "collection" if in_resourcetype => {
                        pending.collection = Some(true);
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|e| WebDavError::InvalidResponse(e.to_string()))?;
                let text = text.trim();

                let current_element = open_elements.last().map(String::as_str).unwrap_or_default();
                let parent_element = open_elements
                    .len()
                    .checked_sub(2)
                    .and_then(|i| open_elements.get(i))
                    .map(String::as_str);

                if let Some(ref mut resp) = current_response {
                    match current_element {
                        // Only the first direct href names the resource.
                        "href" if parent_element == Some("response") && resp.href.is_empty() => {
                            resp.href = text.to_string();
                        }
                        "getlastmodified" => {
                            pending.last_modified = Some(text.to_string());
                        }
                        "getcontentlength" => {
                            pending.content_length = Some(text.to_string());
                        }
                        "status" if in_propstat => {
                            propstat_status = parse_status_line(text);
                        }
                        _ => {}
                    }
                }
            }
            Event::End(e) => {
                let name = get_local_name_from_end(&e)?;

                match name.as_str() {
                    "propstat" => {
                        in_propstat = false;
                        // A propstat without a status line is taken as successful.
                        let accepted = propstat_status.map_or(true, |s| (200..300).contains(&s));
                        if accepted {
                            if let Some(ref mut resp) = current_response {
                                resp.properties.merge(std::mem::take(&mut pending));
                            }
                        }
                    }
                    "resourcetype" => {
                        in_resourcetype = false;
                    }
                    "response" => {
                        if let Some(resp) = current_response.take() {
                            if let Some(element) =
                                build_element(resp, request_url, &request_segments)?
                            {
                                elements.push(element);
                            }
                        }
                    }
                    _ => {}
                }

                open_elements.pop();
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    if !elements.iter().any(|element| element.depth == 0) {
        return Err(WebDavError::InvalidResponse(format!(
            "multistatus does not describe the requested resource {}",
            request_url
        )));
    }

    Ok(elements)
}

fn build_element(
    resp: PropFindResponse,
    request_url: &Url,
    request_segments: &[String],
) -> Result<Option<PropfindResponseElement>, WebDavError> {
    if resp.href.is_empty() {
        return Ok(None);
    }
    let url = request_url
        .join(&resp.href)
        .map_err(|e| WebDavError::InvalidResponse(format!("bad href '{}': {}", resp.href, e)))?;
    let segments = decoded_segments(&url);

    let depth = if segments == request_segments {
        0
    } else if segments.len() == request_segments.len() + 1
        && segments.starts_with(request_segments)
    {
        1
    } else {
        debug!("Skipping unrelated PROPFIND response for {}", url);
        return Ok(None);
    };

    let properties = resp.properties;
    Ok(Some(PropfindResponseElement {
        url,
        depth,
        collection: properties.collection,
        last_modified: properties
            .last_modified
            .as_deref()
            .and_then(parse_http_date),
        content_length: properties
            .content_length
            .and_then(|length| length.parse().ok()),
    }))
}

/// Percent-decoded, non-empty path segments of `url`.
fn decoded_segments(url: &Url) -> Vec<String> {
    url.path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .collect()
}

/// Last decoded path segment of `url`, ignoring a trailing separator.
pub fn last_path_segment(url: &Url) -> String {
    decoded_segments(url).pop().unwrap_or_default()
}

fn parse_status_line(status_line: &str) -> Option<u16> {
    status_line.split_whitespace().nth(1)?.parse().ok()
}

fn get_local_name(e: &BytesStart) -> Result<String, WebDavError> {
    let qname = e.name();
    let local = qname.local_name();
    let name = str::from_utf8(local.as_ref()).map_err(|e| {
        WebDavError::InvalidResponse(format!("Invalid UTF-8 in element name: {}", e))
    })?;
    Ok(name.to_string())
}

fn get_local_name_from_end(e: &BytesEnd) -> Result<String, WebDavError> {
    let qname = e.name();
    let local = qname.local_name();
    let name = str::from_utf8(local.as_ref()).map_err(|e| {
        WebDavError::InvalidResponse(format!("Invalid UTF-8 in element name: {}", e))
    })?;
    Ok(name.to_string())
}

fn parse_http_date(date_str: &str) -> Option<DateTime<Utc>> {
    if date_str.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            DateTime::parse_from_rfc3339(date_str)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(date_str, "%a, %d %b %Y %H:%M:%S GMT")
                .ok()
                .map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn request_url(path: &str) -> Url {
        Url::parse("https://dav.example.com").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_parse_file_metadata() {
        let xml = r#"<?xml version="1.0"?>
        <d:multistatus xmlns:d="DAV:">
            <d:response>
                <d:href>/webdav/test.pdf</d:href>
                <d:propstat>
                    <d:prop>
                        <d:getcontentlength>1024</d:getcontentlength>
                        <d:getlastmodified>Mon, 01 Jan 2024 12:00:00 GMT</d:getlastmodified>
                        <d:resourcetype/>
                    </d:prop>
                    <d:status>HTTP/1.1 200 OK</d:status>
                </d:propstat>
            </d:response>
        </d:multistatus>"#;

        let elements = parse_propfind_response(xml, &request_url("/webdav/test.pdf")).unwrap();
        assert_eq!(elements.len(), 1);

        let element = &elements[0];
        assert_eq!(element.depth, 0);
        assert_eq!(element.collection, Some(false));
        assert_eq!(element.content_length, Some(1024));
        let modified = element.last_modified.unwrap();
        assert_eq!((modified.year(), modified.month(), modified.day()), (2024, 1, 1));
        assert_eq!(modified.hour(), 12);
    }

    #[test]
    fn test_parse_folder_listing_with_depths() {
        let xml = r#"<?xml version="1.0"?>
        <d:multistatus xmlns:d="DAV:">
            <d:response>
                <d:href>/webdav/Documents/</d:href>
                <d:propstat>
                    <d:prop>
                        <d:resourcetype><d:collection/></d:resourcetype>
                    </d:prop>
                    <d:status>HTTP/1.1 200 OK</d:status>
                </d:propstat>
            </d:response>
            <d:response>
                <d:href>/webdav/Documents/file.txt</d:href>
                <d:propstat>
                    <d:prop>
                        <d:getcontentlength>256</d:getcontentlength>
                        <d:resourcetype/>
                    </d:prop>
                    <d:status>HTTP/1.1 200 OK</d:status>
                </d:propstat>
            </d:response>
            <d:response>
                <d:href>/webdav/Documents/Sub/</d:href>
                <d:propstat>
                    <d:prop>
                        <d:resourcetype><d:collection/></d:resourcetype>
                    </d:prop>
                    <d:status>HTTP/1.1 200 OK</d:status>
                </d:propstat>
            </d:response>
        </d:multistatus>"#;

        let elements = parse_propfind_response(xml, &request_url("/webdav/Documents/")).unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].depth, 0);
        assert_eq!(elements[0].collection, Some(true));
        assert_eq!(elements[1].depth, 1);
        assert_eq!(elements[1].collection, Some(false));
        assert_eq!(last_path_segment(&elements[1].url), "file.txt");
        assert_eq!(elements[2].depth, 1);
        assert_eq!(elements[2].collection, Some(true));
        assert_eq!(last_path_segment(&elements[2].url), "Sub");
    }

    #[test]
    fn test_unsupported_properties_do_not_fail_parsing() {
        let xml = r#"<?xml version="1.0"?>
        <d:multistatus xmlns:d="DAV:">
            <d:response>
                <d:href>/remote.php/webdav/notes.txt</d:href>
                <d:propstat>
                    <d:prop>
                        <d:resourcetype/>
                    </d:prop>
                    <d:status>HTTP/1.1 200 OK</d:status>
                </d:propstat>
                <d:propstat>
                    <d:prop>
                        <d:getcontentlength/>
                        <d:getlastmodified/>
                    </d:prop>
                    <d:status>HTTP/1.1 404 Not Found</d:status>
                </d:propstat>
            </d:response>
        </d:multistatus>"#;

        let elements =
            parse_propfind_response(xml, &request_url("/remote.php/webdav/notes.txt")).unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].collection, Some(false));
        assert_eq!(elements[0].content_length, None);
        assert_eq!(elements[0].last_modified, None);
    }

    #[test]
    fn test_missing_resourcetype_leaves_collection_unknown() {
        let xml = r#"<?xml version="1.0"?>
        <d:multistatus xmlns:d="DAV:">
            <d:response>
                <d:href>https://dav.example.com/data/blob</d:href>
                <d:propstat>
                    <d:prop>
                        <d:getcontentlength>3</d:getcontentlength>
                    </d:prop>
                    <d:status>HTTP/1.1 200 OK</d:status>
                </d:propstat>
            </d:response>
        </d:multistatus>"#;

        let elements = parse_propfind_response(xml, &request_url("/data/blob")).unwrap();
        assert_eq!(elements[0].collection, None);
        assert_eq!(elements[0].content_length, Some(3));
    }

    #[test]
    fn test_url_encoded_hrefs_match_request() {
        let xml = r#"<?xml version="1.0"?>
        <d:multistatus xmlns:d="DAV:">
            <d:response>
                <d:href>/webdav/My%20Files/</d:href>
                <d:propstat>
                    <d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop>
                    <d:status>HTTP/1.1 200 OK</d:status>
                </d:propstat>
            </d:response>
            <d:response>
                <d:href>/webdav/My%20Files/File%20with%20spaces.pdf</d:href>
                <d:propstat>
                    <d:prop><d:resourcetype/></d:prop>
                    <d:status>HTTP/1.1 200 OK</d:status>
                </d:propstat>
            </d:response>
        </d:multistatus>"#;

        let elements = parse_propfind_response(xml, &request_url("/webdav/My%20Files/")).unwrap();
        assert_eq!(elements[0].depth, 0);
        assert_eq!(elements[1].depth, 1);
        assert_eq!(last_path_segment(&elements[1].url), "File with spaces.pdf");
    }

    #[test]
    fn test_missing_requested_resource_is_invalid_response() {
        let xml = r#"<?xml version="1.0"?>
        <d:multistatus xmlns:d="DAV:">
            <d:response>
                <d:href>/webdav/Documents/file.txt</d:href>
                <d:propstat>
                    <d:prop><d:resourcetype/></d:prop>
                    <d:status>HTTP/1.1 200 OK</d:status>
                </d:propstat>
            </d:response>
        </d:multistatus>"#;

        let result = parse_propfind_response(xml, &request_url("/webdav/Documents/"));
        assert!(matches!(result, Err(WebDavError::InvalidResponse(_))));
    }

    #[test]
    fn test_only_the_resource_href_names_the_response() {
        let xml = r#"<?xml version="1.0"?>
        <d:multistatus xmlns:d="DAV:">
            <d:response>
                <d:href>/webdav/a.txt</d:href>
                <d:propstat>
                    <d:prop>
                        <d:getcontentlength>7</d:getcontentlength>
                        <d:resourcetype/>
                    </d:prop>
                    <d:status>HTTP/1.1 200 OK</d:status>
                </d:propstat>
                <d:error><d:lock-token-submitted><d:href>/webdav/locked/</d:href></d:lock-token-submitted></d:error>
                <d:location><d:href>/elsewhere/b.txt</d:href></d:location>
            </d:response>
            <d:response>
                <d:href>/webdav/one.txt</d:href>
                <d:href>/webdav/two.txt</d:href>
                <d:status>HTTP/1.1 200 OK</d:status>
            </d:response>
        </d:multistatus>"#;

        let elements = parse_propfind_response(xml, &request_url("/webdav/a.txt")).unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].depth, 0);
        assert_eq!(elements[0].url.path(), "/webdav/a.txt");
        assert_eq!(elements[0].content_length, Some(7));
    }

    #[test]
    fn test_empty_response() {
        let xml = r#"<?xml version="1.0"?>
        <d:multistatus xmlns:d="DAV:">
        </d:multistatus>"#;

        let result = parse_propfind_response(xml, &request_url("/webdav/"));
        assert!(matches!(result, Err(WebDavError::InvalidResponse(_))));
    }
}
