use crate::location::Coordinates;
use crate::storage::StoredImage;
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::{Deserialize, Serialize};

const SYMBOL: &str = "TREK";
const COLLECTION_LABEL: &str = "Trekmint";
const EXTERNAL_URL: &str = "https://trekmint.app/";
const ROYALTY_BASIS_POINTS: u16 = 500;

/// One display attribute on the minted asset. Order matters downstream, so
/// attributes live in a `Vec` and duplicates are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MintAttribute {
    pub trait_type: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Creator {
    pub address: String,
    pub share: u8,
}

/// The provider-agnostic mint parameters, in the wire shape the mint RPC
/// expects. Built fresh per attempt and immutable once sent.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    pub name: String,
    pub symbol: String,
    pub owner: String,
    pub description: String,
    pub attributes: Vec<MintAttribute>,
    pub image_url: String,
    pub external_url: String,
    pub seller_fee_basis_points: u16,
    pub creators: Vec<Creator>,
}

/// Assembles the mint request from the resolved place name, coordinates and
/// stored image. Pure and total.
pub fn build_mint_request(
    owner: &str,
    place_name: &str,
    coordinates: Coordinates,
    stored: &StoredImage,
) -> MintRequest {
    build_at(
        owner,
        place_name,
        coordinates,
        stored,
        Utc::now(),
        Local::now().fixed_offset(),
    )
}

fn build_at(
    owner: &str,
    place_name: &str,
    coordinates: Coordinates,
    stored: &StoredImage,
    now_utc: DateTime<Utc>,
    now_local: DateTime<FixedOffset>,
) -> MintRequest {
    let attributes = vec![
        attribute("Latitude", format!("{:.6}", coordinates.latitude)),
        attribute("Longitude", format!("{:.6}", coordinates.longitude)),
        attribute("Location", place_name.to_string()),
        attribute("Collection", COLLECTION_LABEL.to_string()),
        attribute("Created", now_utc.date_naive().to_string()),
        attribute("Minted At", now_utc.to_rfc3339()),
        attribute("Time", now_local.format("%H:%M:%S").to_string()),
    ];

    MintRequest {
        name: format!("Trekmint: {place_name}"),
        symbol: SYMBOL.to_string(),
        owner: owner.to_string(),
        description: format!(
            "This asset records a trek in {place_name}. Location: Lat {:.4}, Long {:.4}",
            coordinates.latitude, coordinates.longitude
        ),
        attributes,
        image_url: stored.url.clone(),
        external_url: EXTERNAL_URL.to_string(),
        seller_fee_basis_points: ROYALTY_BASIS_POINTS,
        creators: vec![Creator {
            address: owner.to_string(),
            share: 100,
        }],
    }
}

fn attribute(trait_type: &str, value: String) -> MintAttribute {
    MintAttribute {
        trait_type: trait_type.to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageMethod;

    fn sample_request() -> MintRequest {
        let stored = StoredImage {
            url: "https://ipfs.io/ipfs/bafyTest".to_string(),
            method: StorageMethod::NftStorage,
            digest: "00".repeat(32),
        };
        build_at(
            "OwnerAddress111",
            "Amsterdam",
            Coordinates {
                latitude: 52.379_189,
                longitude: 4.899_431,
            },
            &stored,
            DateTime::parse_from_rfc3339("2026-08-31T12:03:05Z")
                .unwrap()
                .with_timezone(&Utc),
            DateTime::parse_from_rfc3339("2026-08-31T14:03:05+02:00").unwrap(),
        )
    }

    #[test]
    fn test_attribute_order_is_fixed() {
        let request = sample_request();
        let traits: Vec<&str> = request
            .attributes
            .iter()
            .map(|a| a.trait_type.as_str())
            .collect();

        assert_eq!(
            traits,
            [
                "Latitude",
                "Longitude",
                "Location",
                "Collection",
                "Created",
                "Minted At",
                "Time"
            ]
        );
    }

    #[test]
    fn test_coordinates_are_formatted_to_six_decimals() {
        let request = sample_request();

        assert_eq!(request.attributes[0].value, "52.379189");
        assert_eq!(request.attributes[1].value, "4.899431");
    }

    #[test]
    fn test_timestamps_use_the_expected_formats() {
        let request = sample_request();

        assert_eq!(request.attributes[4].value, "2026-08-31");
        assert_eq!(request.attributes[5].value, "2026-08-31T12:03:05+00:00");
        assert_eq!(request.attributes[6].value, "14:03:05");
    }

    #[test]
    fn test_name_and_description_are_templated_from_the_place() {
        let request = sample_request();

        assert_eq!(request.name, "Trekmint: Amsterdam");
        assert!(request.description.contains("Amsterdam"));
        assert!(request.description.contains("52.3792"));
        assert!(request.description.contains("4.8994"));
    }

    #[test]
    fn test_royalty_and_creator_share() {
        let request = sample_request();

        assert_eq!(request.seller_fee_basis_points, 500);
        assert_eq!(request.creators.len(), 1);
        assert_eq!(request.creators[0].address, "OwnerAddress111");
        assert_eq!(request.creators[0].share, 100);
    }

    #[test]
    fn test_wire_field_names_match_the_rpc_contract() {
        let value = serde_json::to_value(sample_request()).unwrap();

        assert!(value.get("imageUrl").is_some());
        assert!(value.get("externalUrl").is_some());
        assert!(value.get("sellerFeeBasisPoints").is_some());
        assert!(value["attributes"][0].get("trait_type").is_some());
        assert_eq!(value["imageUrl"], "https://ipfs.io/ipfs/bafyTest");
    }

    #[test]
    fn test_image_url_comes_from_the_stored_image() {
        let stored = StoredImage {
            url: "data:image/jpeg;base64,AAAA".to_string(),
            method: StorageMethod::Embedded,
            digest: "11".repeat(32),
        };
        let request = build_mint_request(
            "Owner",
            "Utrecht",
            Coordinates {
                latitude: 52.09,
                longitude: 5.12,
            },
            &stored,
        );

        assert_eq!(request.image_url, stored.url);
    }
}
