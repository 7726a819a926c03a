use serde::Deserialize;
use thiserror::Error;
use vscope_core::RawVector;

/// Why a payload was turned away.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("component {axis} is not a number: {raw:?}")]
    NotANumber { axis: &'static str, raw: String },

    #[error("component {axis} is not finite: {value}")]
    NonFinite { axis: &'static str, value: f64 },
}

/// A component as it may appear on the wire: a JSON number or a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Component {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
struct WireVector {
    x: Component,
    y: Component,
    z: Component,
}

fn coerce(axis: &'static str, component: Component) -> Result<f64, PayloadError> {
    let value = match component {
        Component::Number(v) => v,
        Component::Text(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| PayloadError::NotANumber { axis, raw })?,
    };
    if !value.is_finite() {
        return Err(PayloadError::NonFinite { axis, value });
    }
    Ok(value)
}

/// Decode a JSON object with numeric `x`, `y` and `z` fields.
///
/// Numeric strings such as `"1.5"` are accepted. The whole payload is rejected
/// if any field is missing, non-numeric or non-finite.
pub fn decode_payload(payload: &str) -> Result<RawVector, PayloadError> {
    let wire: WireVector = serde_json::from_str(payload)?;
    Ok(RawVector::new(
        coerce("x", wire.x)?,
        coerce("y", wire.y)?,
        coerce("z", wire.z)?,
    ))
}

/// Encode a vector the way [`decode_payload`] expects it.
pub fn encode_payload(v: RawVector) -> String {
    serde_json::json!({ "x": v.x, "y": v.y, "z": v.z }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_plain_object() {
        let v = decode_payload(r#"{"x": 1.5, "y": -2, "z": 0}"#).unwrap();
        assert_eq!(v, RawVector::new(1.5, -2.0, 0.0));
    }

    #[test]
    fn decode_ignores_extra_fields() {
        let v = decode_payload(r#"{"x":1,"y":2,"z":3,"ts":"now"}"#).unwrap();
        assert_eq!(v, RawVector::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let v = decode_payload(r#"{"x":"1.25","y":" 2 ","z":3}"#).unwrap();
        assert_eq!(v, RawVector::new(1.25, 2.0, 3.0));
    }

    #[test]
    fn missing_field_is_malformed() {
        let err = decode_payload(r#"{"x":1,"y":2}"#).unwrap_err();
        assert!(matches!(err, PayloadError::Malformed(_)));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        assert!(matches!(decode_payload("[1,2,3]"), Err(PayloadError::Malformed(_))));
        assert!(matches!(decode_payload(r#"{"x":1,"y":"#), Err(PayloadError::Malformed(_))));
        assert!(matches!(decode_payload(r#"{"x":null,"y":1,"z":1}"#), Err(PayloadError::Malformed(_))));
        assert!(matches!(decode_payload(r#"{"x":true,"y":1,"z":1}"#), Err(PayloadError::Malformed(_))));
    }

    #[test]
    fn text_that_is_not_a_number_is_rejected() {
        let err = decode_payload(r#"{"x":1,"y":"abc","z":1}"#).unwrap_err();
        assert!(matches!(err, PayloadError::NotANumber { axis: "y", .. }));
    }

    #[test]
    fn non_finite_after_coercion_is_rejected() {
        let err = decode_payload(r#"{"x":"NaN","y":1,"z":1}"#).unwrap_err();
        assert!(matches!(err, PayloadError::NonFinite { axis: "x", .. }));
        let err = decode_payload(r#"{"x":1,"y":1,"z":"-inf"}"#).unwrap_err();
        assert!(matches!(err, PayloadError::NonFinite { axis: "z", .. }));
    }

    #[test]
    fn encoded_payload_decodes() {
        let v = RawVector::new(0.1, -7.0, 3.25);
        assert_eq!(decode_payload(&encode_payload(v)).unwrap(), v);
    }
}
