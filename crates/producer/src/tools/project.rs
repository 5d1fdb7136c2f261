use producer_core::host::HostAdapter;
use producer_core::tool::{ToolResult, to_payload};
use serde_json::json;

use super::NoParameters;

define_tool! {
    /// Reports project metadata.
    GetProjectInfoTool {
        name: "get_project_info",
        description: "Get information about the current project",
        input: NoParameters,
        execute: get_project_info,
    }
}

define_tool! {
    /// Starts playback.
    PlayProjectTool {
        name: "play_project",
        description: "Start playing the project",
        input: NoParameters,
        execute: play_project,
    }
}

define_tool! {
    /// Stops playback.
    StopProjectTool {
        name: "stop_project",
        description: "Stop playing the project",
        input: NoParameters,
        execute: stop_project,
    }
}

fn get_project_info(host: &mut dyn HostAdapter, _: NoParameters) -> ToolResult {
    to_payload(&host.project_info())
}

fn play_project(host: &mut dyn HostAdapter, _: NoParameters) -> ToolResult {
    if host.project_info().is_playing {
        return to_payload(&json!({
            "status": "already_playing",
            "message": "Project is already playing",
        }));
    }

    host.play();
    to_payload(&json!({
        "status": "playing",
        "message": "Project playback started",
    }))
}

fn stop_project(host: &mut dyn HostAdapter, _: NoParameters) -> ToolResult {
    host.stop();
    to_payload(&json!({
        "status": "stopped",
        "message": "Project playback stopped",
    }))
}
