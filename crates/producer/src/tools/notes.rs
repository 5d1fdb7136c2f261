use producer_core::host::{DEFAULT_VOLUME, HostAdapter, MAX_KEY, Note};
use producer_core::tool::{ToolResult, to_payload};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{instrument_track_name, track_index};

#[derive(Deserialize, JsonSchema)]
pub struct NoteParameters {
    #[schemars(description = "MIDI key number (0-127, where 60 is middle C)")]
    key: i64,
    #[schemars(description = "Position in ticks from start of clip \
                              (48 ticks = 1 beat at default)")]
    position: u32,
    #[schemars(description = "Note length in ticks \
                              (48 = quarter note, 24 = eighth note, etc.)")]
    length: u32,
    #[schemars(description = "Note volume (0-100, default 100)")]
    volume: Option<i64>,
}

#[derive(Deserialize, JsonSchema)]
pub struct AddNotesParameters {
    #[schemars(description = "Index of the instrument track (0-based)")]
    track_index: i64,
    #[schemars(description = "Array of notes to add")]
    notes: Vec<NoteParameters>,
    #[schemars(description = "Position of the clip in ticks (default 0)")]
    clip_position: Option<u32>,
}

#[derive(Deserialize, JsonSchema)]
pub struct TrackParameters {
    #[schemars(description = "Index of the track (0-based)")]
    track_index: i64,
}

define_tool! {
    /// Writes notes into a clip of an instrument track.
    AddNotesTool {
        name: "add_notes_to_track",
        description: "Add MIDI notes to an instrument track. \
                      Creates a clip if needed.",
        input: AddNotesParameters,
        execute: add_notes,
    }
}

define_tool! {
    /// Reads every clip of an instrument track.
    GetTrackNotesTool {
        name: "get_track_notes",
        description: "Get all notes from a track's clips",
        input: TrackParameters,
        execute: get_track_notes,
    }
}

define_tool! {
    /// Removes every note of an instrument track.
    ClearTrackNotesTool {
        name: "clear_track_notes",
        description: "Clear all notes from a track",
        input: TrackParameters,
        execute: clear_track_notes,
    }
}

fn add_notes(
    host: &mut dyn HostAdapter,
    input: AddNotesParameters,
) -> ToolResult {
    let index = track_index(input.track_index)?;
    let name = instrument_track_name(host, index)?;
    let clip = host
        .get_or_create_midi_clip(index, input.clip_position.unwrap_or(0))?;

    let mut notes_added = 0;
    for note in input.notes {
        // Keys outside the MIDI range are dropped, not fatal.
        let Ok(key) = u8::try_from(note.key) else {
            continue;
        };
        if key > MAX_KEY {
            continue;
        }
        host.add_note(
            clip,
            Note {
                key,
                position: note.position,
                length: note.length,
                volume: note.volume.map_or(DEFAULT_VOLUME, |volume| {
                    volume.clamp(0, i64::from(DEFAULT_VOLUME)) as u8
                }),
            },
        )?;
        notes_added += 1;
    }

    to_payload(&json!({
        "success": true,
        "notes_added": notes_added,
        "track": name,
        "message": format!("Added {notes_added} notes to track '{name}'"),
    }))
}

fn get_track_notes(
    host: &mut dyn HostAdapter,
    input: TrackParameters,
) -> ToolResult {
    let index = track_index(input.track_index)?;
    let name = instrument_track_name(host, index)?;
    let clips = host
        .list_notes(index)?
        .into_iter()
        .map(|clip| {
            json!({
                "position": clip.position,
                "length": clip.length,
                "note_count": clip.notes.len(),
                "notes": clip.notes,
            })
        })
        .collect::<Vec<Value>>();

    to_payload(&json!({
        "track": name,
        "clip_count": clips.len(),
        "clips": clips,
    }))
}

fn clear_track_notes(
    host: &mut dyn HostAdapter,
    input: TrackParameters,
) -> ToolResult {
    let index = track_index(input.track_index)?;
    let name = instrument_track_name(host, index)?;
    let notes_cleared = host.clear_notes(index)?;

    to_payload(&json!({
        "success": true,
        "notes_cleared": notes_cleared,
        "track": name,
        "message": format!("Cleared {notes_cleared} notes from track '{name}'"),
    }))
}

#[cfg(test)]
mod tests {
    use producer_core::host::TrackKind;
    use producer_core::tool::Tool;

    use super::*;
    use crate::host::MemoryProject;

    fn note(key: i64, position: u32, volume: Option<i64>) -> NoteParameters {
        NoteParameters {
            key,
            position,
            length: 48,
            volume,
        }
    }

    #[test]
    fn test_add_get_and_clear_notes() {
        let mut host = MemoryProject::new();
        host.create_track(TrackKind::Instrument).unwrap();
        host.rename_track(0, "Keys").unwrap();

        let result = AddNotesTool::new()
            .execute(
                &mut host,
                AddNotesParameters {
                    track_index: 0,
                    notes: vec![
                        note(60, 0, None),
                        note(64, 48, Some(80)),
                        note(200, 96, None),
                        note(-1, 96, None),
                        note(67, 96, None),
                    ],
                    clip_position: Some(192),
                },
            )
            .unwrap();
        let result: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(result["notes_added"], 3);
        assert_eq!(result["message"], "Added 3 notes to track 'Keys'");

        let result = GetTrackNotesTool::new()
            .execute(&mut host, TrackParameters { track_index: 0 })
            .unwrap();
        let result: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(result["track"], "Keys");
        assert_eq!(result["clip_count"], 1);
        let clip = &result["clips"][0];
        assert_eq!(clip["position"], 192);
        assert_eq!(clip["note_count"], 3);
        assert_eq!(
            clip["notes"][1],
            json!({"key": 64, "position": 48, "length": 48, "volume": 80})
        );
        assert_eq!(clip["notes"][0]["volume"], 100);

        let result = ClearTrackNotesTool::new()
            .execute(&mut host, TrackParameters { track_index: 0 })
            .unwrap();
        let result: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(result["notes_cleared"], 3);
        assert_eq!(
            result["message"],
            "Cleared 3 notes from track 'Keys'"
        );
    }

    #[test]
    fn test_out_of_range_volumes_and_ticks() {
        let mut host = MemoryProject::new();
        host.create_track(TrackKind::Instrument).unwrap();

        let result = AddNotesTool::new()
            .execute(
                &mut host,
                AddNotesParameters {
                    track_index: 0,
                    notes: vec![
                        note(60, 0, Some(-5)),
                        note(62, 48, Some(300)),
                        NoteParameters {
                            key: 64,
                            position: 4_000_000_000,
                            length: 400_000_000,
                            volume: None,
                        },
                    ],
                    clip_position: None,
                },
            )
            .unwrap();
        let result: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(result["notes_added"], 3);

        let result = GetTrackNotesTool::new()
            .execute(&mut host, TrackParameters { track_index: 0 })
            .unwrap();
        let result: Value = serde_json::from_str(&result).unwrap();
        let clip = &result["clips"][0];
        assert_eq!(clip["length"], u32::MAX);
        assert_eq!(clip["notes"][0]["volume"], 0);
        assert_eq!(clip["notes"][1]["volume"], 100);
    }

    #[test]
    fn test_non_instrument_tracks() {
        let mut host = MemoryProject::new();
        host.create_track(TrackKind::Sample).unwrap();

        let err = GetTrackNotesTool::new()
            .execute(&mut host, TrackParameters { track_index: 0 })
            .unwrap_err();
        assert_eq!(err.to_string(), "Track is not an instrument track");

        let err = ClearTrackNotesTool::new()
            .execute(&mut host, TrackParameters { track_index: -2 })
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid track index: -2");

        let err = AddNotesTool::new()
            .execute(
                &mut host,
                AddNotesParameters {
                    track_index: 1,
                    notes: vec![note(60, 0, None)],
                    clip_position: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid track index: 1");
    }
}
