//! The capability interface through which tools reach the music project.
//!
//! Tools never touch host data structures directly. A host embeds the
//! assistant by implementing [`HostAdapter`] and handing it to the
//! conversation manager, which lends it to one tool at a time.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The lowest tempo a project accepts, in BPM.
pub const MIN_TEMPO: u32 = 10;
/// The highest tempo a project accepts, in BPM.
pub const MAX_TEMPO: u32 = 999;
/// Tick resolution at the default project setting.
pub const TICKS_PER_BEAT: u32 = 48;
/// The highest MIDI key; keys range from 0 and 60 is middle C.
pub const MAX_KEY: u8 = 127;
/// The default (and highest) note volume.
pub const DEFAULT_VOLUME: u8 = 100;

/// The kind of a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Plays notes through an instrument plugin.
    Instrument,
    /// A pattern (beat/bassline) track.
    Pattern,
    /// Plays audio samples.
    Sample,
    /// Automates other controls.
    Automation,
    /// Anything else the host knows about.
    Other,
}

impl Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackKind::Instrument => "instrument",
            TrackKind::Pattern => "pattern",
            TrackKind::Sample => "sample",
            TrackKind::Automation => "automation",
            TrackKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// A snapshot of one track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Zero-based position in the track list.
    pub index: usize,
    /// Display name.
    pub name: String,
    /// Track kind.
    #[serde(rename = "type")]
    pub kind: TrackKind,
    /// Whether the track is muted.
    pub muted: bool,
    /// Whether the track is soloed.
    pub solo: bool,
    /// The loaded instrument plugin, for instrument tracks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
}

/// A note, with positions and lengths in ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    /// MIDI key.
    pub key: u8,
    /// Position relative to the start of the clip.
    pub position: u32,
    /// Length of the note.
    pub length: u32,
    /// Volume, 0 to 100.
    pub volume: u8,
}

/// Opaque reference to a MIDI clip, valid until the track list changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClipHandle {
    /// Index of the track owning the clip.
    pub track: usize,
    /// Host-defined clip slot.
    pub clip: usize,
}

/// The notes of one clip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipNotes {
    /// Start of the clip on the song timeline, in ticks.
    pub position: u32,
    /// Length of the clip in ticks.
    pub length: u32,
    /// Notes in the clip.
    pub notes: Vec<Note>,
}

/// A folder of samples.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleCategory {
    /// Folder name.
    pub name: String,
    /// Full path of the folder.
    pub path: String,
    /// Number of sample files directly inside the folder.
    pub file_count: usize,
}

/// A sample file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleInfo {
    /// File name.
    pub name: String,
    /// Full path of the file.
    pub path: String,
    /// Directory relative to the library root, if not at the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Filters for [`HostAdapter::list_samples`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SampleQuery {
    /// Only list samples below this category folder.
    pub category: Option<String>,
    /// Case-insensitive substring the file name must contain.
    pub search: Option<String>,
    /// Maximum number of results.
    pub limit: usize,
}

/// The time signature of a project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Beats per bar.
    pub numerator: u32,
    /// Beat unit.
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

/// Project metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Tempo in BPM.
    pub tempo: u32,
    /// Master volume, in percent.
    pub master_volume: u32,
    /// Master pitch, in semitones.
    pub master_pitch: i32,
    /// Whether playback is running.
    pub is_playing: bool,
    /// Whether playback is paused.
    pub is_paused: bool,
    /// Number of tracks.
    pub track_count: usize,
    /// Song length in bars.
    pub length_bars: u32,
    /// Time signature.
    pub time_signature: TimeSignature,
    /// The project file, once saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Errors reported by a host.
///
/// The `Display` text is meant for the model and ends up verbatim in tool
/// results.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HostError {
    /// No track at this index.
    InvalidTrackIndex(usize),
    /// The operation needs an instrument track.
    NotInstrumentTrack,
    /// The host failed for its own reasons.
    Failed(String),
}

impl Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::InvalidTrackIndex(index) => {
                write!(f, "Invalid track index: {index}")
            }
            HostError::NotInstrumentTrack => {
                f.write_str("Track is not an instrument track")
            }
            HostError::Failed(reason) => f.write_str(reason),
        }
    }
}

impl std::error::Error for HostError {}

/// Reads and mutates the current project.
///
/// All methods are called on the conversation manager's task, one tool at
/// a time, and must return quickly. Implementations validate track
/// indices themselves and report [`HostError::InvalidTrackIndex`].
pub trait HostAdapter: Send + 'static {
    /// Returns the tempo in BPM.
    fn tempo(&self) -> u32;

    /// Sets the tempo. Callers have checked the range.
    fn set_tempo(&mut self, bpm: u32);

    /// Lists all tracks, in order.
    fn list_tracks(&self) -> Vec<TrackInfo>;

    /// Appends a new track and returns its index.
    fn create_track(&mut self, kind: TrackKind) -> Result<usize, HostError>;

    /// Renames a track.
    fn rename_track(&mut self, index: usize, name: &str)
    -> Result<(), HostError>;

    /// Loads an instrument plugin into an instrument track.
    fn load_instrument(
        &mut self,
        index: usize,
        instrument: &str,
    ) -> Result<(), HostError>;

    /// Mutes or unmutes a track.
    fn set_track_muted(
        &mut self,
        index: usize,
        muted: bool,
    ) -> Result<(), HostError>;

    /// Removes a track, shifting the following ones down.
    fn remove_track(&mut self, index: usize) -> Result<TrackInfo, HostError>;

    /// Returns the MIDI clip starting at `position`, creating it if needed.
    fn get_or_create_midi_clip(
        &mut self,
        track: usize,
        position: u32,
    ) -> Result<ClipHandle, HostError>;

    /// Adds a note to a clip.
    fn add_note(
        &mut self,
        clip: ClipHandle,
        note: Note,
    ) -> Result<(), HostError>;

    /// Lists the notes of every clip of an instrument track.
    fn list_notes(&self, track: usize) -> Result<Vec<ClipNotes>, HostError>;

    /// Removes all notes from an instrument track and returns how many
    /// there were.
    fn clear_notes(&mut self, track: usize) -> Result<usize, HostError>;

    /// Lists the sample folders.
    fn list_sample_categories(&self) -> Vec<SampleCategory>;

    /// Lists samples matching the query, at most `query.limit` of them.
    fn list_samples(&self, query: &SampleQuery) -> Vec<SampleInfo>;

    /// Returns project metadata.
    fn project_info(&self) -> ProjectInfo;

    /// Starts playback.
    fn play(&mut self);

    /// Stops playback.
    fn stop(&mut self);
}
