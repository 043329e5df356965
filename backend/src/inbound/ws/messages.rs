//! Wire-level message definitions for the diagnostic streaming relay.
//!
//! Server-to-client units: `{"session_id"}` on open, `{"chunk"}` per
//! streamed fragment, `{"complete","result"}` on completion, `{"error"}`
//! for any in-band failure. The client sends `{"input": text}` units.

use serde::Serialize;
use serde_json::Value;

/// Handshake unit confirming which session the connection is bound to.
#[derive(Debug, Serialize)]
pub struct SessionOpenedUnit {
    pub session_id: i32,
}

/// One streamed fragment of an in-flight diagnosis.
#[derive(Debug, Serialize)]
pub struct ChunkUnit<'a> {
    pub chunk: &'a str,
}

/// Final unit carrying the fully assembled diagnosis.
#[derive(Debug, Serialize)]
pub struct CompleteUnit<'a> {
    pub complete: bool,
    pub result: &'a str,
}

/// In-band failure report; the connection stays open.
#[derive(Debug, Serialize)]
pub struct ErrorUnit<'a> {
    pub error: &'a str,
}

/// Classification of one inbound client unit.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum ClientUnit {
    /// A recognised unit carrying new symptom text.
    Input(String),
    /// Not parseable as JSON at all.
    Malformed,
    /// Valid JSON without the expected `input` text field.
    MissingInput,
}

/// Classify one inbound text frame.
pub(super) fn parse_client_unit(text: &str) -> ClientUnit {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return ClientUnit::Malformed;
    };
    match value.get("input").and_then(Value::as_str) {
        Some(input) => ClientUnit::Input(input.to_owned()),
        None => ClientUnit::MissingInput,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("not-json", ClientUnit::Malformed)]
    #[case("{\"input\"", ClientUnit::Malformed)]
    #[case("{}", ClientUnit::MissingInput)]
    #[case("{\"other\": 1}", ClientUnit::MissingInput)]
    #[case("{\"input\": 5}", ClientUnit::MissingInput)]
    #[case(
        "{\"input\": \"brakes squeal\"}",
        ClientUnit::Input("brakes squeal".to_owned())
    )]
    fn classifies_client_units(#[case] text: &str, #[case] expected: ClientUnit) {
        assert_eq!(parse_client_unit(text), expected);
    }

    #[rstest]
    fn unit_shapes_match_wire_contract() {
        assert_eq!(
            serde_json::to_value(SessionOpenedUnit { session_id: 7 }).expect("serialise"),
            json!({ "session_id": 7 })
        );
        assert_eq!(
            serde_json::to_value(ChunkUnit { chunk: "worn " }).expect("serialise"),
            json!({ "chunk": "worn " })
        );
        assert_eq!(
            serde_json::to_value(CompleteUnit {
                complete: true,
                result: "worn pads"
            })
            .expect("serialise"),
            json!({ "complete": true, "result": "worn pads" })
        );
        assert_eq!(
            serde_json::to_value(ErrorUnit {
                error: "Invalid JSON format"
            })
            .expect("serialise"),
            json!({ "error": "Invalid JSON format" })
        );
    }
}
