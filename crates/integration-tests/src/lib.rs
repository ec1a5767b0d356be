//! Pipeline-level tests for Feedbridge.
//!
//! The tests drive the full ingestion pipeline (fetch → detect → validate →
//! replace) through [`feedbridge_server::ingest::Ingestor`] over the
//! in-memory catalog backend, in upload mode so no network or database is
//! required.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p feedbridge-integration-tests
//! ```

use feedbridge_core::{Principal, PrincipalId, PrincipalKind};
use feedbridge_server::catalog::MemoryCatalog;
use feedbridge_server::config::IngestConfig;
use feedbridge_server::ingest::{FeedSource, Ingestor};

/// An orchestrator over a fresh in-memory catalog.
#[must_use]
pub fn ingestor() -> Ingestor<MemoryCatalog> {
    Ingestor::new(&IngestConfig::default(), MemoryCatalog::new()).expect("build ingestor")
}

/// A shop-type principal with the given account id.
#[must_use]
pub fn shop_principal(id: i64) -> Principal {
    Principal::new(PrincipalId::new(id), PrincipalKind::Shop)
}

/// An upload-mode feed source.
#[must_use]
pub fn upload(filename: &str, bytes: &[u8]) -> Option<FeedSource> {
    Some(FeedSource::Upload {
        filename: filename.to_owned(),
        bytes: bytes.to_vec(),
    })
}

/// One logical feed rendered in the three supported wire formats. All three
/// must produce identical catalog rows.
pub mod sample_feed {
    /// JSON rendition.
    #[must_use]
    pub fn json() -> &'static [u8] {
        br#"{
            "shop": "Connect",
            "categories": [{"name": "Phones"}, {"name": "Accessories"}],
            "goods": [
                {
                    "id": 4216292,
                    "name": "Smartphone A 512GB",
                    "category": "Phones",
                    "price": 110000.0,
                    "price_rrc": 116990.0,
                    "quantity": 14,
                    "parameters": [
                        {"name": "Color", "value": "gold"},
                        {"name": "Capacity (GB)", "value": 512}
                    ]
                },
                {
                    "name": "Charging Cable",
                    "category": "Accessories",
                    "price": 9.5,
                    "price_rrc": 12,
                    "quantity": 50
                }
            ]
        }"#
    }

    /// YAML rendition of the same feed.
    #[must_use]
    pub fn yaml() -> &'static [u8] {
        br#"shop: Connect
categories:
  - name: Phones
  - name: Accessories
goods:
  - id: 4216292
    name: Smartphone A 512GB
    category: Phones
    price: 110000.0
    price_rrc: 116990.0
    quantity: 14
    parameters:
      - name: Color
        value: gold
      - name: Capacity (GB)
        value: 512
  - name: Charging Cable
    category: Accessories
    price: 9.5
    price_rrc: 12
    quantity: 50
"#
    }

    /// XML rendition of the same feed, in the legacy item-list convention.
    #[must_use]
    pub fn xml() -> &'static [u8] {
        br#"<?xml version="1.0" encoding="UTF-8"?>
<root>
  <shop>Connect</shop>
  <categories>
    <item><name>Phones</name></item>
    <item><name>Accessories</name></item>
  </categories>
  <goods>
    <item>
      <id>4216292</id>
      <name>Smartphone A 512GB</name>
      <category>Phones</category>
      <price>110000.0</price>
      <price_rrc>116990.0</price_rrc>
      <quantity>14</quantity>
      <parameters>
        <item><name>Color</name><value>gold</value></item>
        <item><name>Capacity (GB)</name><value>512</value></item>
      </parameters>
    </item>
    <item>
      <name>Charging Cable</name>
      <category>Accessories</category>
      <price>9.5</price>
      <price_rrc>12</price_rrc>
      <quantity>50</quantity>
    </item>
  </goods>
</root>
"#
    }
}
