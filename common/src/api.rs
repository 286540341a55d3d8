use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::job::{JobId, JobRecord};
use crate::market::IndexSelector;
use crate::report::IndexQuote;

/// Cuerpo de `POST /api/analyze`. Los campos llegan como texto y se
/// validan contra los enums en el servidor, así el error es nuestro y no
/// del extractor.
///
/// `language` puede faltar (se usa English), pero un `null` explícito no
/// es un idioma y se rechaza.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub index: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_string"
    )]
    pub language: Option<String>,
}

// sólo se llama cuando el campo está en el JSON
fn present_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(de).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStarted {
    pub analysis_id: JobId,
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysesList {
    pub analyses: Vec<JobRecord>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOverview {
    pub market_status: String,
    /// Pares (índice, cotización) en el orden del overview.
    #[serde(with = "ordered_indices")]
    pub indices: Vec<(IndexSelector, IndexQuote)>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

/// `indices` viaja como objeto JSON `{ "NIFTY 50": {...}, ... }` pero en
/// memoria lo tenemos como lista para no perder el orden.
mod ordered_indices {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    use crate::market::IndexSelector;
    use crate::report::IndexQuote;

    pub fn serialize<S>(v: &[(IndexSelector, IndexQuote)], ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = ser.serialize_map(Some(v.len()))?;
        for (idx, quote) in v {
            map.serialize_entry(idx, quote)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(de: D) -> Result<Vec<(IndexSelector, IndexQuote)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = Vec<(IndexSelector, IndexQuote)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("un objeto índice -> cotización")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut out = Vec::new();
                while let Some((k, v)) = access.next_entry::<IndexSelector, IndexQuote>()? {
                    out.push((k, v));
                }
                Ok(out)
            }
        }

        de.deserialize_map(OrderedVisitor)
    }
}
