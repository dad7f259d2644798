use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ============ Scoring Service Models ============

/// Opaque customer identifier as enumerated by the scoring service.
///
/// The service may send integers or strings; both are kept as trimmed text so
/// they can be echoed back verbatim in URL path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Builds an id from raw text. Blank input yields `None`.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCustomerId {
    Number(serde_json::Number),
    Text(String),
}

/// Integers keep their exact text; integral floats such as `100002.0` drop
/// the fractional part so they match the integer id the service expects.
fn number_text(number: &serde_json::Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.0}", f),
        _ => number.to_string(),
    }
}

impl<'de> Deserialize<'de> for CustomerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match RawCustomerId::deserialize(deserializer)? {
            RawCustomerId::Number(n) => number_text(&n),
            RawCustomerId::Text(s) => s,
        };
        CustomerId::new(text).ok_or_else(|| de::Error::custom("customer id cannot be blank"))
    }
}

/// A profile field shown on the dashboard, with the backend key it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileField {
    pub key: &'static str,
    pub label: &'static str,
}

/// Profile fields in display order (three columns of four).
pub const PROFILE_FIELDS: [ProfileField; 12] = [
    ProfileField { key: "NAME_CONTRACT_TYPE", label: "Contract type" },
    ProfileField { key: "CODE_GENDER", label: "Gender" },
    ProfileField { key: "DAYS_BIRTH", label: "Date of birth" },
    ProfileField { key: "CNT_CHILDREN", label: "Number of children" },
    ProfileField { key: "CNT_FAM_MEMBERS", label: "Family members" },
    ProfileField { key: "FLAG_OWN_CAR", label: "Car" },
    ProfileField { key: "FLAG_OWN_REALTY", label: "Realty" },
    ProfileField { key: "REGION_POPULATION_RELATIVE", label: "Region population" },
    ProfileField { key: "AMT_INCOME_TOTAL", label: "Total income" },
    ProfileField { key: "AMT_ANNUITY", label: "Annuity" },
    ProfileField { key: "AMT_GOODS_PRICE", label: "Goods price" },
    ProfileField { key: "AMT_CREDIT", label: "Credit" },
];

/// Placeholder rendered for a missing or null profile field.
pub const MISSING_FIELD: &str = "N/A";

/// Customer record as returned by `GET /client/{id}`.
///
/// Kept as the raw JSON object; the dashboard only ever reads the keys listed
/// in [`PROFILE_FIELDS`] and tolerates any of them being absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerProfile {
    fields: Map<String, Value>,
}

impl CustomerProfile {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Returns the field as display text, or `None` when absent or null.
    pub fn field(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Returns the field as display text, falling back to [`MISSING_FIELD`].
    pub fn display(&self, key: &str) -> String {
        self.field(key).unwrap_or_else(|| MISSING_FIELD.to_string())
    }
}

/// Binary eligibility decision derived from the probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Eligible,
    NotEligible,
}

impl Verdict {
    /// Eligible iff the probability is strictly above 50.
    pub fn from_probability(probability: f64) -> Self {
        if probability > 50.0 {
            Verdict::Eligible
        } else {
            Verdict::NotEligible
        }
    }
}

/// Repayment probability returned by `GET /predict/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EligibilityResult {
    probability: f64,
}

impl EligibilityResult {
    /// Accepts only finite probabilities within `[0, 100]`.
    pub fn new(probability: f64) -> Option<Self> {
        if probability.is_finite() && (0.0..=100.0).contains(&probability) {
            Some(Self { probability })
        } else {
            None
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_probability(self.probability)
    }
}

/// A raster image encoded as a `data:` URI, ready to embed in an `<img>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageData {
    data_uri: String,
}

impl ImageData {
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self {
            data_uri: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        }
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

/// Outcome of a keyed or artifact lookup against the scoring service.
///
/// Failures never surface as errors: a non-success status maps to
/// `NotFound` for keyed lookups, and anything that prevented a usable answer
/// (transport fault, open circuit, malformed body) maps to `Unavailable`.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Found(T),
    NotFound,
    Unavailable,
}

impl<T> Fetched<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Fetched::Found(value) => Some(value),
            _ => None,
        }
    }
}
