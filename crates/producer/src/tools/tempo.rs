use producer_core::host::{HostAdapter, MAX_TEMPO, MIN_TEMPO};
use producer_core::tool::{Error as ToolError, ToolResult, to_payload};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::NoParameters;

#[derive(Deserialize, JsonSchema)]
pub struct SetTempoParameters {
    #[schemars(
        description = "The tempo in beats per minute (10-999)",
        range(min = 10, max = 999)
    )]
    bpm: i64,
}

define_tool! {
    /// Reads the project tempo.
    GetTempoTool {
        name: "get_tempo",
        description: "Get the current tempo (BPM) of the project",
        input: NoParameters,
        execute: get_tempo,
    }
}

define_tool! {
    /// Changes the project tempo.
    SetTempoTool {
        name: "set_tempo",
        description: "Set the tempo (BPM) of the project. \
                      Valid range is 10-999 BPM.",
        input: SetTempoParameters,
        execute: set_tempo,
    }
}

fn get_tempo(host: &mut dyn HostAdapter, _: NoParameters) -> ToolResult {
    to_payload(&json!({ "bpm": host.tempo() }))
}

fn set_tempo(
    host: &mut dyn HostAdapter,
    input: SetTempoParameters,
) -> ToolResult {
    let bpm = input.bpm;
    if !(i64::from(MIN_TEMPO)..=i64::from(MAX_TEMPO)).contains(&bpm) {
        return Err(ToolError::invalid_input().with_reason(format!(
            "BPM must be between {MIN_TEMPO} and {MAX_TEMPO}, got {bpm}"
        )));
    }

    host.set_tempo(bpm as u32);
    to_payload(&json!({
        "success": true,
        "bpm": bpm,
        "message": format!("Tempo set to {bpm} BPM"),
    }))
}
