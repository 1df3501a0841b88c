use serde::{Deserialize, Deserializer};

/// Location ping published by a driver's client while a ride is in progress.
///
/// Numeric fields arrive as either JSON numbers or strings depending on the
/// client platform, so they are parsed leniently.
#[derive(Debug, Deserialize)]
pub struct LocationMessage {
    pub ride_id: Option<String>,
    pub driver_id: Option<String>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub longitude: Option<f64>,
    pub recorded_at: Option<String>,
    pub uuid: Option<String>,
}

fn parse_f64_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrFloat {
        String(String),
        Float(f64),
    }

    let v: Option<StringOrFloat> = Option::deserialize(deserializer)?;
    match v {
        Some(StringOrFloat::Float(f)) => Ok(Some(f)),
        Some(StringOrFloat::String(s)) => {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                s.parse::<f64>().map(Some).map_err(serde::de::Error::custom)
            }
        }
        None => Ok(None),
    }
}
