use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use producer_core::host::{
    ClipHandle, ClipNotes, HostAdapter, HostError, Note, ProjectInfo,
    SampleCategory, SampleInfo, SampleQuery, TICKS_PER_BEAT, TimeSignature,
    TrackInfo, TrackKind,
};

use super::SampleLibrary;

/// A project living entirely in memory.
///
/// Clones share the same project, so a front end can keep one handle for
/// display while the conversation manager owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryProject {
    inner: Arc<Mutex<Project>>,
}

#[derive(Debug)]
struct Project {
    tempo: u32,
    master_volume: u32,
    master_pitch: i32,
    playing: bool,
    paused: bool,
    time_signature: TimeSignature,
    file_name: Option<String>,
    tracks: Vec<Track>,
    samples: SampleLibrary,
}

#[derive(Debug)]
struct Track {
    name: String,
    kind: TrackKind,
    muted: bool,
    solo: bool,
    instrument: Option<String>,
    clips: Vec<Clip>,
}

#[derive(Debug)]
struct Clip {
    position: u32,
    /// Sorted by position; notes at the same position keep their order.
    notes: Vec<Note>,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            tempo: 140,
            master_volume: 100,
            master_pitch: 0,
            playing: false,
            paused: false,
            time_signature: TimeSignature::default(),
            file_name: None,
            tracks: vec![],
            samples: SampleLibrary::default(),
        }
    }
}

impl Project {
    fn ticks_per_bar(&self) -> u32 {
        TICKS_PER_BEAT * self.time_signature.numerator.max(1)
    }

    /// Clip length: the end of the last note, rounded up to whole bars.
    fn clip_length(&self, clip: &Clip) -> u32 {
        let bar = self.ticks_per_bar();
        let end = clip
            .notes
            .iter()
            .map(|note| note.position.saturating_add(note.length))
            .max()
            .unwrap_or(0);
        end.div_ceil(bar).max(1).saturating_mul(bar)
    }

    fn length_bars(&self) -> u32 {
        let end = self
            .tracks
            .iter()
            .flat_map(|track| &track.clips)
            .map(|clip| clip.position.saturating_add(self.clip_length(clip)))
            .max()
            .unwrap_or(0);
        end.div_ceil(self.ticks_per_bar())
    }

    fn track(&self, index: usize) -> Result<&Track, HostError> {
        self.tracks
            .get(index)
            .ok_or(HostError::InvalidTrackIndex(index))
    }

    fn track_mut(&mut self, index: usize) -> Result<&mut Track, HostError> {
        self.tracks
            .get_mut(index)
            .ok_or(HostError::InvalidTrackIndex(index))
    }

    fn instrument_track_mut(
        &mut self,
        index: usize,
    ) -> Result<&mut Track, HostError> {
        let track = self.track_mut(index)?;
        if track.kind != TrackKind::Instrument {
            return Err(HostError::NotInstrumentTrack);
        }
        Ok(track)
    }
}

impl Track {
    fn info(&self, index: usize) -> TrackInfo {
        TrackInfo {
            index,
            name: self.name.clone(),
            kind: self.kind,
            muted: self.muted,
            solo: self.solo,
            instrument: self.instrument.clone(),
        }
    }
}

impl MemoryProject {
    /// Creates an empty project at 140 BPM with no samples.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a sample library.
    pub fn with_samples(self, samples: SampleLibrary) -> Self {
        self.lock().samples = samples;
        self
    }

    /// Sets the file name reported in project info.
    pub fn with_file_name<S: Into<String>>(self, file_name: S) -> Self {
        self.lock().file_name = Some(file_name.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, Project> {
        // The project stays consistent even if a holder panicked, since
        // every mutation is a single assignment or push.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostAdapter for MemoryProject {
    fn tempo(&self) -> u32 {
        self.lock().tempo
    }

    fn set_tempo(&mut self, bpm: u32) {
        self.lock().tempo = bpm;
    }

    fn list_tracks(&self) -> Vec<TrackInfo> {
        let project = self.lock();
        project
            .tracks
            .iter()
            .enumerate()
            .map(|(index, track)| track.info(index))
            .collect()
    }

    fn create_track(&mut self, kind: TrackKind) -> Result<usize, HostError> {
        let name = match kind {
            TrackKind::Instrument => "Instrument track",
            TrackKind::Pattern => "Pattern track",
            TrackKind::Sample => "Sample track",
            TrackKind::Automation => "Automation track",
            TrackKind::Other => "Track",
        };
        let mut project = self.lock();
        project.tracks.push(Track {
            name: name.to_owned(),
            kind,
            muted: false,
            solo: false,
            instrument: None,
            clips: vec![],
        });
        Ok(project.tracks.len() - 1)
    }

    fn rename_track(
        &mut self,
        index: usize,
        name: &str,
    ) -> Result<(), HostError> {
        self.lock().track_mut(index)?.name = name.to_owned();
        Ok(())
    }

    fn load_instrument(
        &mut self,
        index: usize,
        instrument: &str,
    ) -> Result<(), HostError> {
        let mut project = self.lock();
        project.instrument_track_mut(index)?.instrument =
            Some(instrument.to_owned());
        Ok(())
    }

    fn set_track_muted(
        &mut self,
        index: usize,
        muted: bool,
    ) -> Result<(), HostError> {
        self.lock().track_mut(index)?.muted = muted;
        Ok(())
    }

    fn remove_track(&mut self, index: usize) -> Result<TrackInfo, HostError> {
        let mut project = self.lock();
        let info = project.track(index)?.info(index);
        project.tracks.remove(index);
        Ok(info)
    }

    fn get_or_create_midi_clip(
        &mut self,
        track: usize,
        position: u32,
    ) -> Result<ClipHandle, HostError> {
        let mut project = self.lock();
        let clips = &mut project.instrument_track_mut(track)?.clips;
        let clip = match clips.iter().position(|c| c.position == position) {
            Some(clip) => clip,
            None => {
                clips.push(Clip {
                    position,
                    notes: vec![],
                });
                clips.len() - 1
            }
        };
        Ok(ClipHandle { track, clip })
    }

    fn add_note(
        &mut self,
        clip: ClipHandle,
        note: Note,
    ) -> Result<(), HostError> {
        let mut project = self.lock();
        let notes = &mut project
            .instrument_track_mut(clip.track)?
            .clips
            .get_mut(clip.clip)
            .ok_or_else(|| {
                HostError::Failed(format!("No clip at slot {}", clip.clip))
            })?
            .notes;
        let at = notes.partition_point(|n| n.position <= note.position);
        notes.insert(at, note);
        Ok(())
    }

    fn list_notes(&self, track: usize) -> Result<Vec<ClipNotes>, HostError> {
        let project = self.lock();
        let track = project.track(track)?;
        if track.kind != TrackKind::Instrument {
            return Err(HostError::NotInstrumentTrack);
        }
        Ok(track
            .clips
            .iter()
            .map(|clip| ClipNotes {
                position: clip.position,
                length: project.clip_length(clip),
                notes: clip.notes.clone(),
            })
            .collect())
    }

    fn clear_notes(&mut self, track: usize) -> Result<usize, HostError> {
        let mut project = self.lock();
        let clips = &mut project.instrument_track_mut(track)?.clips;
        let mut cleared = 0;
        for clip in clips {
            cleared += clip.notes.len();
            clip.notes.clear();
        }
        Ok(cleared)
    }

    fn list_sample_categories(&self) -> Vec<SampleCategory> {
        let samples = self.lock().samples.clone();
        samples.categories()
    }

    fn list_samples(&self, query: &SampleQuery) -> Vec<SampleInfo> {
        let samples = self.lock().samples.clone();
        samples.samples(query)
    }

    fn project_info(&self) -> ProjectInfo {
        let project = self.lock();
        ProjectInfo {
            tempo: project.tempo,
            master_volume: project.master_volume,
            master_pitch: project.master_pitch,
            is_playing: project.playing,
            is_paused: project.paused,
            track_count: project.tracks.len(),
            length_bars: project.length_bars(),
            time_signature: project.time_signature,
            file_name: project.file_name.clone(),
        }
    }

    fn play(&mut self) {
        let mut project = self.lock();
        project.playing = true;
        project.paused = false;
    }

    fn stop(&mut self) {
        let mut project = self.lock();
        project.playing = false;
        project.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(key: u8, position: u32, length: u32) -> Note {
        Note {
            key,
            position,
            length,
            volume: 100,
        }
    }

    #[test]
    fn test_defaults() {
        let project = MemoryProject::new();
        let info = project.project_info();
        assert_eq!(info.tempo, 140);
        assert_eq!(info.master_volume, 100);
        assert_eq!(info.time_signature, TimeSignature::default());
        assert_eq!(info.length_bars, 0);
        assert!(!info.is_playing);
        assert!(project.list_tracks().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let mut project = MemoryProject::new();
        let view = project.clone();
        project.set_tempo(90);
        project.create_track(TrackKind::Sample).unwrap();
        assert_eq!(view.tempo(), 90);
        assert_eq!(view.list_tracks()[0].name, "Sample track");
    }

    #[test]
    fn test_tracks() {
        let mut project = MemoryProject::new();
        assert_eq!(project.create_track(TrackKind::Instrument).unwrap(), 0);
        assert_eq!(project.create_track(TrackKind::Sample).unwrap(), 1);
        assert_eq!(project.list_tracks()[0].name, "Instrument track");

        assert_eq!(
            project.load_instrument(1, "sf2player"),
            Err(HostError::NotInstrumentTrack)
        );
        assert_eq!(
            project.rename_track(2, "x"),
            Err(HostError::InvalidTrackIndex(2))
        );

        let removed = project.remove_track(0).unwrap();
        assert_eq!(removed.kind, TrackKind::Instrument);
        let tracks = project.list_tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].index, 0);
        assert_eq!(tracks[0].kind, TrackKind::Sample);
    }

    #[test]
    fn test_clips_and_notes() {
        let mut project = MemoryProject::new();
        project.create_track(TrackKind::Instrument).unwrap();

        let clip = project.get_or_create_midi_clip(0, 0).unwrap();
        assert_eq!(project.get_or_create_midi_clip(0, 0).unwrap(), clip);
        project.add_note(clip, note(64, 96, 48)).unwrap();
        project.add_note(clip, note(60, 0, 48)).unwrap();
        project.add_note(clip, note(62, 0, 24)).unwrap();

        let later = project.get_or_create_midi_clip(0, 384).unwrap();
        assert_ne!(later, clip);
        project.add_note(later, note(67, 180, 48)).unwrap();

        let clips = project.list_notes(0).unwrap();
        assert_eq!(clips.len(), 2);
        let keys = clips[0].notes.iter().map(|n| n.key).collect::<Vec<_>>();
        assert_eq!(keys, [60, 62, 64]);
        assert_eq!(clips[0].length, 192);
        assert_eq!(clips[1].length, 384);
        // The second clip spans ticks 384 to 768.
        assert_eq!(project.project_info().length_bars, 4);

        assert_eq!(project.clear_notes(0).unwrap(), 4);
        assert_eq!(project.clear_notes(0).unwrap(), 0);
        assert!(project.list_notes(0).unwrap()[0].notes.is_empty());
    }

    #[test]
    fn test_notes_past_the_tick_range() {
        let mut project = MemoryProject::new();
        project.create_track(TrackKind::Instrument).unwrap();

        let clip = project.get_or_create_midi_clip(0, 0).unwrap();
        project
            .add_note(clip, note(60, 4_000_000_000, 400_000_000))
            .unwrap();

        let clips = project.list_notes(0).unwrap();
        assert_eq!(clips[0].length, u32::MAX);
        let bar = TICKS_PER_BEAT * 4;
        assert_eq!(project.project_info().length_bars, u32::MAX.div_ceil(bar));
    }

    #[test]
    fn test_playback() {
        let mut project = MemoryProject::new().with_file_name("song.mmp");
        project.play();
        assert!(project.project_info().is_playing);
        project.stop();
        let info = project.project_info();
        assert!(!info.is_playing);
        assert_eq!(info.file_name.as_deref(), Some("song.mmp"));
    }
}
