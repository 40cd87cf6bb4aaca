use crate::marker;

/// An ordered list of object properties.
///
/// Property order is significant on the wire, so properties are kept in
/// insertion order rather than in a map.
pub type Properties = Vec<(String, Value)>;

/// A single AMF0 value.
///
/// One variant per wire kind. Variants that carry a declared length which
/// can legitimately disagree with their contents (ECMA arrays) keep the
/// declared value so re-encoding reproduces the original bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    /// String with a 16-bit length prefix.
    String(String),
    Object(Properties),
    Null,
    Undefined,
    /// Index into the table of previously decoded complex values.
    Reference(u16),
    EcmaArray {
        /// The associative count as written by the sender (advisory only).
        count: u32,
        properties: Properties,
    },
    StrictArray(Vec<Value>),
    Date {
        /// Milliseconds since the Unix epoch.
        millis: f64,
        /// Reserved timezone offset, normally zero.
        timezone: i16,
    },
    /// String with a 32-bit length prefix.
    LongString(String),
    Unsupported,
    XmlDocument(String),
    TypedObject {
        class_name: String,
        properties: Properties,
    },
}

impl Value {
    /// Create a text value, choosing the long-string form only when the
    /// text does not fit a 16-bit length.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.len() > u16::MAX as usize {
            Value::LongString(text)
        } else {
            Value::String(text)
        }
    }

    /// Create an anonymous object from key/value pairs, preserving order.
    pub fn object<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(
            properties
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Create an ECMA array whose declared count matches its properties.
    pub fn ecma_array<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let properties: Properties = properties
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();
        Value::EcmaArray {
            count: u32::try_from(properties.len()).unwrap_or(u32::MAX),
            properties,
        }
    }

    /// The wire marker for this value.
    pub fn marker(&self) -> u8 {
        match self {
            Value::Number(_) => marker::NUMBER,
            Value::Boolean(_) => marker::BOOLEAN,
            Value::String(_) => marker::STRING,
            Value::Object(_) => marker::OBJECT,
            Value::Null => marker::NULL,
            Value::Undefined => marker::UNDEFINED,
            Value::Reference(_) => marker::REFERENCE,
            Value::EcmaArray { .. } => marker::ECMA_ARRAY,
            Value::StrictArray(_) => marker::STRICT_ARRAY,
            Value::Date { .. } => marker::DATE,
            Value::LongString(_) => marker::LONG_STRING,
            Value::Unsupported => marker::UNSUPPORTED,
            Value::XmlDocument(_) => marker::XML_DOCUMENT,
            Value::TypedObject { .. } => marker::TYPED_OBJECT,
        }
    }

    /// Human-readable kind name.
    pub fn kind(&self) -> &'static str {
        marker::marker_name(self.marker())
    }

    /// The text of a short or long string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) | Value::LongString(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        self.as_str().is_some()
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Properties of an object, ECMA array or typed object.
    pub fn properties(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Object(properties)
            | Value::EcmaArray { properties, .. }
            | Value::TypedObject { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// Look up a property by key. Returns the first match.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties()?
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::text(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_picks_short_string_when_it_fits() {
        assert_eq!(Value::text("live"), Value::String("live".into()));
        assert_eq!(Value::text("").marker(), marker::STRING);
    }

    #[test]
    fn text_picks_long_string_past_16_bits() {
        let long = "x".repeat(u16::MAX as usize + 1);
        assert!(matches!(Value::text(long), Value::LongString(_)));
    }

    #[test]
    fn text_accessors_cover_both_string_forms() {
        assert_eq!(Value::String("a".into()).as_str(), Some("a"));
        assert_eq!(Value::LongString("b".into()).as_str(), Some("b"));
        assert_eq!(Value::XmlDocument("<a/>".into()).as_str(), None);
        assert!(!Value::Number(1.0).is_text());
    }

    #[test]
    fn object_lookup_preserves_order_and_finds_keys() {
        let value = Value::object([("app", Value::text("live")), ("tcUrl", Value::text("rtmp://x"))]);
        let keys: Vec<&str> = value
            .properties()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["app", "tcUrl"]);
        assert_eq!(value.get("app"), Some(&Value::text("live")));
        assert_eq!(value.get("missing"), None);
        assert_eq!(Value::Null.get("app"), None);
    }

    #[test]
    fn ecma_array_count_tracks_properties() {
        let value = Value::ecma_array([("duration", Value::Number(0.0))]);
        assert!(matches!(value, Value::EcmaArray { count: 1, .. }));
        assert_eq!(value.kind(), "ecma-array");
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::from(3), Value::Number(3.0));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("play"), Value::String("play".into()));
        assert!(Value::from(1.5).is_number());
    }
}
