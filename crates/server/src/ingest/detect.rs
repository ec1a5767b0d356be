//! Feed format detection and decoding.
//!
//! The detector picks a decoder from the declared MIME type first and the
//! file extension second, then decodes into a generic `serde_json::Value`
//! tree. Nothing downstream of this module knows which wire format the feed
//! arrived in; XML in particular is flattened into the same map/list/scalar
//! shape that JSON and YAML decode to.

use serde_json::{Map, Value};

use super::error::IngestError;

/// The closed set of supported wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Json,
    Yaml,
    Xml,
}

impl FeedFormat {
    /// Match a declared MIME type, ignoring parameters and case.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or(mime)
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/x-yaml" | "application/yaml" | "text/yaml" => Some(Self::Yaml),
            "application/json" | "text/json" => Some(Self::Json),
            "application/xml" | "text/xml" => Some(Self::Xml),
            _ => None,
        }
    }

    /// Match a filename or URL extension, with or without the leading dot.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }

    /// Pick a format: MIME type wins, extension is the fallback.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::UnrecognizedFormat`] naming the source when
    /// neither hint matches a supported format.
    pub fn detect(
        content_type: Option<&str>,
        extension: Option<&str>,
        source: &str,
    ) -> Result<Self, IngestError> {
        content_type
            .and_then(Self::from_mime)
            .or_else(|| extension.and_then(Self::from_extension))
            .ok_or_else(|| IngestError::UnrecognizedFormat(source.to_owned()))
    }

    /// Decode the document into a generic value tree.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidFormat`] carrying the underlying decode
    /// error text when the bytes are not well-formed in this format.
    pub fn decode(self, bytes: &[u8]) -> Result<Value, IngestError> {
        match self {
            Self::Json => {
                serde_json::from_slice(bytes).map_err(|e| IngestError::InvalidFormat(e.to_string()))
            }
            Self::Yaml => {
                serde_yaml::from_slice(bytes).map_err(|e| IngestError::InvalidFormat(e.to_string()))
            }
            Self::Xml => decode_xml(bytes).map_err(IngestError::InvalidFormat),
        }
    }
}

impl std::fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Xml => "xml",
        })
    }
}

// =============================================================================
// XML flattening
// =============================================================================

/// Flatten an XML document into the map/list/scalar shape the validator
/// expects.
///
/// Conventions, matching the legacy partner wire format:
/// - leaf text is type-converted (integer, then float, then string) so that
///   `<price>10.5</price>` survives as a number;
/// - a container whose children are all `<item>`/`<list-item>` elements
///   becomes a list;
/// - any other container becomes a map (duplicate tags: last one wins);
///   attributes merge into the map, children winning on a name clash;
/// - empty elements become null.
fn decode_xml(bytes: &[u8]) -> Result<Value, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
    let mut reader = quick_xml::Reader::from_str(text);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            quick_xml::events::Event::Start(start) => {
                return element_to_value(&mut reader, &start);
            }
            quick_xml::events::Event::Empty(_) => return Ok(Value::Null),
            quick_xml::events::Event::End(_) => return Err("unexpected closing tag".to_owned()),
            quick_xml::events::Event::Eof => return Err("document has no root element".to_owned()),
            _ => {}
        }
    }
}

fn element_to_value(
    reader: &mut quick_xml::Reader<&[u8]>,
    start: &quick_xml::events::BytesStart<'_>,
) -> Result<Value, String> {
    use quick_xml::events::Event;

    let mut attrs: Vec<(String, Value)> = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attrs.push((key, text_to_scalar(&value)));
    }

    let mut children: Vec<(String, Value)> = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(child) => {
                let name = String::from_utf8_lossy(child.name().as_ref()).into_owned();
                let value = element_to_value(reader, &child)?;
                children.push((name, value));
            }
            Event::Empty(child) => {
                let name = String::from_utf8_lossy(child.name().as_ref()).into_owned();
                children.push((name, Value::Null));
            }
            Event::Text(t) => text.push_str(&t.unescape().map_err(|e| e.to_string())?),
            Event::CData(t) => text.push_str(&String::from_utf8_lossy(&t.into_inner())),
            Event::End(_) => break,
            Event::Eof => return Err("unexpected end of document".to_owned()),
            _ => {}
        }
    }

    if children.is_empty() && attrs.is_empty() {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        return Ok(text_to_scalar(&text));
    }

    let is_list = !children.is_empty()
        && children
            .iter()
            .all(|(name, _)| name == "item" || name == "list-item");
    if is_list {
        return Ok(Value::Array(children.into_iter().map(|(_, v)| v).collect()));
    }

    let mut map = Map::new();
    for (key, value) in attrs {
        map.insert(key, value);
    }
    for (key, value) in children {
        map.insert(key, value);
    }
    Ok(Value::Object(map))
}

/// Type-convert XML text: integer, then float, then string.
fn text_to_scalar(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    Value::String(text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_mime() {
        assert_eq!(FeedFormat::from_mime("application/json"), Some(FeedFormat::Json));
        assert_eq!(FeedFormat::from_mime("text/yaml"), Some(FeedFormat::Yaml));
        assert_eq!(FeedFormat::from_mime("application/x-yaml"), Some(FeedFormat::Yaml));
        assert_eq!(FeedFormat::from_mime("text/xml"), Some(FeedFormat::Xml));
        assert_eq!(
            FeedFormat::from_mime("application/json; charset=utf-8"),
            Some(FeedFormat::Json)
        );
        assert_eq!(FeedFormat::from_mime("Text/JSON"), Some(FeedFormat::Json));
        assert_eq!(FeedFormat::from_mime("text/html"), None);
        assert_eq!(FeedFormat::from_mime(""), None);
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(FeedFormat::from_extension("yaml"), Some(FeedFormat::Yaml));
        assert_eq!(FeedFormat::from_extension("yml"), Some(FeedFormat::Yaml));
        assert_eq!(FeedFormat::from_extension(".json"), Some(FeedFormat::Json));
        assert_eq!(FeedFormat::from_extension("XML"), Some(FeedFormat::Xml));
        assert_eq!(FeedFormat::from_extension("csv"), None);
    }

    #[test]
    fn test_detect_prefers_mime_over_extension() {
        let format = FeedFormat::detect(Some("application/json"), Some("yaml"), "feed")
            .expect("detect");
        assert_eq!(format, FeedFormat::Json);
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        let format =
            FeedFormat::detect(Some("application/octet-stream"), Some("yaml"), "feed")
                .expect("detect");
        assert_eq!(format, FeedFormat::Yaml);
    }

    #[test]
    fn test_detect_unrecognized_names_source() {
        let err = FeedFormat::detect(None, Some("csv"), "prices.csv").expect_err("should fail");
        assert!(matches!(err, IngestError::UnrecognizedFormat(source) if source == "prices.csv"));
    }

    #[test]
    fn test_decode_json() {
        let tree = FeedFormat::Json
            .decode(br#"{"shop": "S1", "goods": []}"#)
            .expect("decode");
        assert_eq!(tree, json!({"shop": "S1", "goods": []}));
    }

    #[test]
    fn test_decode_yaml() {
        let tree = FeedFormat::Yaml
            .decode(b"shop: S1\ngoods:\n  - name: P1\n    price: 10.5\n")
            .expect("decode");
        assert_eq!(tree, json!({"shop": "S1", "goods": [{"name": "P1", "price": 10.5}]}));
    }

    #[test]
    fn test_decode_malformed_is_invalid_format() {
        let err = FeedFormat::Json.decode(b"{not json").expect_err("should fail");
        assert!(matches!(err, IngestError::InvalidFormat(_)));

        let err = FeedFormat::Xml.decode(b"<root><open></root>").expect_err("should fail");
        assert!(matches!(err, IngestError::InvalidFormat(_)));
    }

    #[test]
    fn test_decode_xml_flattens_to_generic_tree() {
        let xml = br#"<?xml version="1.0"?>
<root>
  <shop>S1</shop>
  <goods>
    <item>
      <name>P1</name>
      <category>C1</category>
      <price>10.5</price>
      <price_rrc>12</price_rrc>
      <quantity>3</quantity>
    </item>
  </goods>
</root>"#;
        let tree = FeedFormat::Xml.decode(xml).expect("decode");
        assert_eq!(
            tree,
            json!({
                "shop": "S1",
                "goods": [{
                    "name": "P1",
                    "category": "C1",
                    "price": 10.5,
                    "price_rrc": 12,
                    "quantity": 3
                }]
            })
        );
    }

    #[test]
    fn test_decode_xml_list_item_convention() {
        let xml = b"<root><categories><list-item><name>C1</name></list-item>\
                    <list-item><name>C2</name></list-item></categories></root>";
        let tree = FeedFormat::Xml.decode(xml).expect("decode");
        assert_eq!(
            tree,
            json!({"categories": [{"name": "C1"}, {"name": "C2"}]})
        );
    }

    #[test]
    fn test_decode_xml_attributes_merge_into_map() {
        let xml = b"<root><shop currency=\"EUR\"><name>S1</name></shop></root>";
        let tree = FeedFormat::Xml.decode(xml).expect("decode");
        assert_eq!(tree, json!({"shop": {"currency": "EUR", "name": "S1"}}));
    }

    #[test]
    fn test_decode_xml_empty_element_is_null() {
        let tree = FeedFormat::Xml.decode(b"<root><id/></root>").expect("decode");
        assert_eq!(tree, json!({"id": null}));
    }

    #[test]
    fn test_text_to_scalar() {
        assert_eq!(text_to_scalar("3"), json!(3));
        assert_eq!(text_to_scalar("10.5"), json!(10.5));
        assert_eq!(text_to_scalar("S1"), json!("S1"));
        assert_eq!(text_to_scalar("-7"), json!(-7));
    }
}
