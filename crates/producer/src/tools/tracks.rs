use producer_core::host::{HostAdapter, TrackKind};
use producer_core::tool::{ToolResult, to_payload};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::{NoParameters, track_index};

#[derive(Deserialize, JsonSchema)]
pub struct AddInstrumentTrackParameters {
    #[schemars(description = "Name for the new track (optional)")]
    name: Option<String>,
    #[schemars(description = "Instrument plugin to load \
                              (e.g., 'tripleoscillator', 'sf2player'). \
                              Optional.")]
    instrument: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct AddSampleTrackParameters {
    #[schemars(description = "Name for the new track (optional)")]
    name: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct SetTrackNameParameters {
    #[schemars(description = "Index of the track (0-based)")]
    track_index: i64,
    #[schemars(description = "New name for the track")]
    name: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct SetTrackMutedParameters {
    #[schemars(description = "Index of the track (0-based)")]
    track_index: i64,
    #[schemars(description = "True to mute, false to unmute")]
    muted: bool,
}

#[derive(Deserialize, JsonSchema)]
pub struct RemoveTrackParameters {
    #[schemars(description = "Index of the track (0-based)")]
    track_index: i64,
}

define_tool! {
    /// Lists the tracks of the project.
    ListTracksTool {
        name: "list_tracks",
        description: "List all tracks in the current project with their \
                      type, name, and status",
        input: NoParameters,
        execute: list_tracks,
    }
}

define_tool! {
    /// Appends an instrument track, optionally loading an instrument.
    AddInstrumentTrackTool {
        name: "add_instrument_track",
        description: "Add a new instrument track to the project",
        input: AddInstrumentTrackParameters,
        execute: add_instrument_track,
    }
}

define_tool! {
    /// Appends a sample track.
    AddSampleTrackTool {
        name: "add_sample_track",
        description: "Add a new sample track to the project for audio \
                      samples",
        input: AddSampleTrackParameters,
        execute: add_sample_track,
    }
}

define_tool! {
    /// Renames a track.
    SetTrackNameTool {
        name: "set_track_name",
        description: "Set the name of a track",
        input: SetTrackNameParameters,
        execute: set_track_name,
    }
}

define_tool! {
    /// Mutes or unmutes a track.
    SetTrackMutedTool {
        name: "set_track_muted",
        description: "Mute or unmute a track",
        input: SetTrackMutedParameters,
        execute: set_track_muted,
    }
}

define_tool! {
    /// Removes a track.
    RemoveTrackTool {
        name: "remove_track",
        description: "Remove a track from the project. The tracks after it \
                      move down by one index.",
        input: RemoveTrackParameters,
        execute: remove_track,
    }
}

fn list_tracks(host: &mut dyn HostAdapter, _: NoParameters) -> ToolResult {
    let tracks = host.list_tracks();
    to_payload(&json!({
        "count": tracks.len(),
        "tracks": tracks,
    }))
}

fn add_instrument_track(
    host: &mut dyn HostAdapter,
    input: AddInstrumentTrackParameters,
) -> ToolResult {
    let index = host.create_track(TrackKind::Instrument)?;
    if let Some(instrument) =
        input.instrument.as_deref().filter(|name| !name.is_empty())
    {
        host.load_instrument(index, instrument)?;
    }
    if let Some(name) = input.name.as_deref().filter(|name| !name.is_empty()) {
        host.rename_track(index, name)?;
    }
    let name = track_name(host, index);

    to_payload(&json!({
        "success": true,
        "track_index": index,
        "name": name,
        "message": format!("Created instrument track: {name}"),
    }))
}

fn add_sample_track(
    host: &mut dyn HostAdapter,
    input: AddSampleTrackParameters,
) -> ToolResult {
    let index = host.create_track(TrackKind::Sample)?;
    if let Some(name) = input.name.as_deref().filter(|name| !name.is_empty()) {
        host.rename_track(index, name)?;
    }
    let name = track_name(host, index);

    to_payload(&json!({
        "success": true,
        "track_index": index,
        "name": name,
        "message": format!("Created sample track: {name}"),
    }))
}

fn set_track_name(
    host: &mut dyn HostAdapter,
    input: SetTrackNameParameters,
) -> ToolResult {
    let index = track_index(input.track_index)?;
    let old_name = track_name(host, index);
    host.rename_track(index, &input.name)?;

    to_payload(&json!({
        "success": true,
        "old_name": old_name,
        "new_name": input.name,
        "message": format!(
            "Renamed track from '{old_name}' to '{}'",
            input.name
        ),
    }))
}

fn set_track_muted(
    host: &mut dyn HostAdapter,
    input: SetTrackMutedParameters,
) -> ToolResult {
    let index = track_index(input.track_index)?;
    host.set_track_muted(index, input.muted)?;
    let name = track_name(host, index);
    let state = if input.muted { "muted" } else { "unmuted" };

    to_payload(&json!({
        "success": true,
        "track_index": index,
        "muted": input.muted,
        "message": format!("Track '{name}' is now {state}"),
    }))
}

fn remove_track(
    host: &mut dyn HostAdapter,
    input: RemoveTrackParameters,
) -> ToolResult {
    let index = track_index(input.track_index)?;
    let removed = host.remove_track(index)?;

    to_payload(&json!({
        "success": true,
        "message": format!("Removed track: {}", removed.name),
    }))
}

fn track_name(host: &dyn HostAdapter, index: usize) -> String {
    host.list_tracks()
        .into_iter()
        .nth(index)
        .map(|track| track.name)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use producer_core::tool::Tool;
    use serde_json::Value;

    use super::*;
    use crate::host::MemoryProject;

    fn parse(result: ToolResult) -> Value {
        serde_json::from_str(&result.unwrap()).unwrap()
    }

    #[test]
    fn test_add_and_list_tracks() {
        let mut host = MemoryProject::new();
        let result = parse(AddInstrumentTrackTool::new().execute(
            &mut host,
            AddInstrumentTrackParameters {
                name: Some("Lead".to_owned()),
                instrument: Some("tripleoscillator".to_owned()),
            },
        ));
        assert_eq!(result["track_index"], 0);
        assert_eq!(result["message"], "Created instrument track: Lead");

        let result = parse(
            AddSampleTrackTool::new()
                .execute(&mut host, AddSampleTrackParameters { name: None }),
        );
        assert_eq!(result["track_index"], 1);
        assert_eq!(result["name"], "Sample track");

        let result = parse(
            ListTracksTool::new().execute(&mut host, NoParameters {}),
        );
        assert_eq!(result["count"], 2);
        assert_eq!(result["tracks"][0]["name"], "Lead");
        assert_eq!(result["tracks"][0]["type"], "instrument");
        assert_eq!(result["tracks"][0]["instrument"], "tripleoscillator");
        assert_eq!(result["tracks"][1]["type"], "sample");
        assert!(result["tracks"][1].get("instrument").is_none());
    }

    #[test]
    fn test_rename_mute_and_remove() {
        let mut host = MemoryProject::new();
        host.create_track(TrackKind::Instrument).unwrap();
        host.rename_track(0, "Bass").unwrap();

        let result = parse(SetTrackNameTool::new().execute(
            &mut host,
            SetTrackNameParameters {
                track_index: 0,
                name: "Sub Bass".to_owned(),
            },
        ));
        assert_eq!(result["old_name"], "Bass");
        assert_eq!(
            result["message"],
            "Renamed track from 'Bass' to 'Sub Bass'"
        );

        let result = parse(SetTrackMutedTool::new().execute(
            &mut host,
            SetTrackMutedParameters {
                track_index: 0,
                muted: true,
            },
        ));
        assert_eq!(result["message"], "Track 'Sub Bass' is now muted");
        assert!(host.list_tracks()[0].muted);

        let err = RemoveTrackTool::new()
            .execute(&mut host, RemoveTrackParameters { track_index: 3 })
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid track index: 3");

        let result = parse(
            RemoveTrackTool::new()
                .execute(&mut host, RemoveTrackParameters { track_index: 0 }),
        );
        assert_eq!(result["message"], "Removed track: Sub Bass");
        assert!(host.list_tracks().is_empty());
    }
}
