//! Testing utilities for the Identifire workspace
//!
//! Shared identities and seeded stores.

#![allow(missing_docs)]

use idf_auth::{generate_signing_key, IdentityVerifier, SignedTokenVerifier, TokenIssuer};
use idf_model::{
    Location, LocationDetail, LocationId, LocationType, Measurement, MeasurementId,
    MeasurementRecord, VisualisationKind,
};
use idf_store::MemStore;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const TEST_ISSUER: &str = "https://identity.test/";
pub const TEST_AUDIENCE: &str = "identifire-api";
pub const TEST_NAMESPACE: &str = "https://identifire.test";

pub const RAINFALL: MeasurementId = MeasurementId(1);
pub const TEMPERATURE: MeasurementId = MeasurementId(2);

pub const VICTORIA: LocationId = LocationId(1);
pub const MELBOURNE_LGA: LocationId = LocationId(2);
pub const MELBOURNE_STATION: LocationId = LocationId(3);

/// Matching token issuer and verifier with a fresh key
pub struct TestIdentity {
    issuer: TokenIssuer,
    verifier: Arc<SignedTokenVerifier>,
}

impl TestIdentity {
    #[must_use]
    pub fn new() -> Self {
        let issuer = TokenIssuer::new(generate_signing_key(), TEST_ISSUER, TEST_AUDIENCE)
            .with_namespace(TEST_NAMESPACE);
        let verifier =
            SignedTokenVerifier::new(issuer.verifying_key(), TEST_ISSUER, TEST_AUDIENCE)
                .with_namespace(Some(TEST_NAMESPACE));
        Self {
            issuer,
            verifier: Arc::new(verifier),
        }
    }

    #[must_use]
    pub fn verifier(&self) -> Arc<dyn IdentityVerifier> {
        self.verifier.clone()
    }

    #[must_use]
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Compact token naming `email`
    pub fn token(&self, email: &str) -> String {
        self.issuer.issue(email).unwrap().encode()
    }

    /// `Authorization` header value naming `email`
    pub fn bearer(&self, email: &str) -> String {
        format!("Bearer {}", self.token(email))
    }
}

impl Default for TestIdentity {
    fn default() -> Self {
        Self::new()
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn location(
    location_id: LocationId,
    name: &str,
    location_type: LocationType,
    attributes: Value,
) -> LocationDetail {
    LocationDetail {
        location: Location {
            location_id,
            name: name.to_string(),
            description: None,
            location_type,
        },
        attributes: object(attributes),
    }
}

pub fn record(measurement_record_id: i64, start: &str, values: Value) -> MeasurementRecord {
    let mut values = object(values);
    values.insert("startTimestamp".to_string(), json!(start));
    MeasurementRecord {
        measurement_record_id,
        values,
    }
}

/// Store with two measurements, three locations and a few rainfall records
///
/// Records are seeded out of timestamp order.
#[must_use]
pub fn seeded_store() -> MemStore {
    let store = MemStore::new();

    store.seed_measurement(Measurement {
        measurement_id: RAINFALL,
        name: "Rainfall".to_string(),
        description: Some("Daily rainfall in mm".to_string()),
        measurement_type: "rainfall".to_string(),
    });
    store.seed_measurement(Measurement {
        measurement_id: TEMPERATURE,
        name: "Temperature".to_string(),
        description: None,
        measurement_type: "temperature".to_string(),
    });

    store.seed_location(location(
        VICTORIA,
        "Victoria",
        LocationType::State,
        json!({ "stateCode": "VIC" }),
    ));
    store.seed_location(location(
        MELBOURNE_LGA,
        "Melbourne",
        LocationType::LocalGovernmentArea,
        json!({ "lgaCode": 24600 }),
    ));
    store.seed_location(location(
        MELBOURNE_STATION,
        "Melbourne (Olympic Park)",
        LocationType::WeatherStation,
        json!({ "stationNumber": 86338, "latitude": -37.83, "longitude": 144.98 }),
    ));

    for name in ["line", "bar"] {
        store.seed_visualisation(
            RAINFALL,
            VisualisationKind {
                visualisation_name: name.to_string(),
                attributes: object(json!({ "measurementId": RAINFALL })),
            },
        );
    }

    store.seed_measurement_location(RAINFALL, MELBOURNE_STATION);
    store.seed_measurement_location(TEMPERATURE, MELBOURNE_STATION);
    store.seed_record(
        RAINFALL,
        MELBOURNE_STATION,
        record(2, "2020-01-02T00:00:00Z", json!({ "rainfall": 4.2 })),
    );
    store.seed_record(
        RAINFALL,
        MELBOURNE_STATION,
        record(1, "2020-01-01T00:00:00Z", json!({ "rainfall": 0.0 })),
    );
    store.seed_record(
        TEMPERATURE,
        MELBOURNE_STATION,
        record(3, "2020-01-01T00:00:00Z", json!({ "maxTemperature": 31.5 })),
    );

    store
}
