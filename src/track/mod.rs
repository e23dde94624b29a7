//! Track types for local and remote media
//!
//! Tracks are handles owned by the media engine; this crate only names them
//! and decides which rendering surface shows them.

pub mod capture;
pub mod render_surface;
pub mod track_manager;

use std::fmt;

use crate::session::configuration::SessionConfiguration;

/// RTPCodecType determines the kind of media a track carries
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RTPCodecType {
    #[default]
    Unspecified = 0,

    /// RTPCodecTypeAudio indicates this is an audio track
    Audio = 1,

    /// RTPCodecTypeVideo indicates this is a video track
    Video = 2,
}

impl From<&str> for RTPCodecType {
    fn from(raw: &str) -> Self {
        match raw {
            "audio" => RTPCodecType::Audio,
            "video" => RTPCodecType::Video,
            _ => RTPCodecType::Unspecified,
        }
    }
}

impl fmt::Display for RTPCodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTPCodecType::Audio => "audio",
            RTPCodecType::Video => "video",
            RTPCodecType::Unspecified => crate::UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

/// TrackHandle identifies a media track known to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackHandle {
    pub id: String,
    pub kind: RTPCodecType,
}

impl TrackHandle {
    pub fn audio(id: impl Into<String>) -> Self {
        TrackHandle {
            id: id.into(),
            kind: RTPCodecType::Audio,
        }
    }

    pub fn video(id: impl Into<String>) -> Self {
        TrackHandle {
            id: id.into(),
            kind: RTPCodecType::Video,
        }
    }
}

impl fmt::Display for TrackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.id)
    }
}

/// MediaStream is a group of tracks reported together by the engine.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    pub id: String,
    pub tracks: Vec<TrackHandle>,
}

impl MediaStream {
    pub fn video_tracks(&self) -> impl Iterator<Item = &TrackHandle> {
        self.tracks
            .iter()
            .filter(|track| track.kind == RTPCodecType::Video)
    }
}

/// LocalTracks are the microphone and camera tracks a session sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTracks {
    pub audio: TrackHandle,
    pub video: TrackHandle,
}

impl LocalTracks {
    pub(crate) fn from_configuration(configuration: &SessionConfiguration) -> Self {
        LocalTracks {
            audio: TrackHandle::audio(configuration.audio_track_id.clone()),
            video: TrackHandle::video(configuration.video_track_id.clone()),
        }
    }
}
