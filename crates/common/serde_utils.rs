//! Serde helpers for types whose human-readable form differs from their
//! in-memory representation.

/// Opaque byte payloads as hex strings.
pub mod bytes_hex {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(text.trim_start_matches("0x")).map_err(serde::de::Error::custom)?;
        Ok(bytes.into())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super::bytes_hex")]
        data: Bytes,
    }

    #[test]
    fn bytes_round_trip_through_hex() {
        let wrapper = Wrapper {
            data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
        };
        let json = serde_json::to_string(&wrapper).unwrap();
        assert!(json.contains("deadbeef"));
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data, wrapper.data);
    }

    #[test]
    fn accepts_0x_prefix() {
        let back: Wrapper = serde_json::from_str(r#"{"data":"0xff00"}"#).unwrap();
        assert_eq!(back.data, Bytes::from_static(&[0xff, 0x00]));
    }
}
