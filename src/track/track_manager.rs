use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::track::render_surface::{aspect_fit, Rect, RenderSurface, Size};
use crate::track::{MediaStream, TrackHandle};

struct LocalBinding {
    audio: TrackHandle,
    video: TrackHandle,
    surface: Arc<dyn RenderSurface>,
    natural_size: Option<Size>,
}

struct RemoteBinding {
    stream_id: Option<String>,
    track: TrackHandle,
    surface: Arc<dyn RenderSurface>,
    natural_size: Option<Size>,
}

#[derive(Default)]
struct Bindings {
    local: Option<LocalBinding>,
    remote: Option<RemoteBinding>,
}

/// TrackManager owns the bindings between tracks and rendering surfaces.
///
/// Local audio and video are bound together to one surface; at most one
/// remote video track is bound to another. Binding the same track to the
/// same surface again is a no-op. Binding to a different surface detaches
/// the previous binding first, or fails with `ErrBindingConflict` when the
/// manager is strict. Every binding is released by [`TrackManager::detach_all`],
/// which also runs when the manager is dropped.
pub struct TrackManager {
    strict: bool,
    bindings: Mutex<Bindings>,
}

fn same_surface(a: &Arc<dyn RenderSurface>, b: &Arc<dyn RenderSurface>) -> bool {
    a.id() == b.id()
}

impl TrackManager {
    pub fn new(strict: bool) -> Self {
        TrackManager {
            strict,
            bindings: Mutex::new(Bindings::default()),
        }
    }

    fn bindings(&self) -> MutexGuard<'_, Bindings> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// attach_local_tracks binds the local audio and video tracks to `surface`.
    pub fn attach_local_tracks(
        &self,
        audio: TrackHandle,
        video: TrackHandle,
        surface: Arc<dyn RenderSurface>,
    ) -> Result<()> {
        let mut bindings = self.bindings();

        if let Some(current) = &bindings.local {
            if current.audio == audio
                && current.video == video
                && same_surface(&current.surface, &surface)
            {
                log::trace!("local tracks already bound to {}", surface.id());
                return Ok(());
            }
            if self.strict {
                log::warn!(
                    "refusing to rebind local tracks from {} to {}",
                    current.surface.id(),
                    surface.id()
                );
                return Err(Error::ErrBindingConflict {
                    track: current.video.id.clone(),
                    surface: current.surface.id().to_owned(),
                });
            }
        }

        if let Some(previous) = bindings.local.take() {
            previous.surface.detach_track(&previous.audio);
            previous.surface.detach_track(&previous.video);
            log::debug!("detached local tracks from {}", previous.surface.id());
        }

        surface.attach_track(&audio);
        surface.attach_track(&video);
        log::debug!("bound {audio} and {video} to {}", surface.id());
        bindings.local = Some(LocalBinding {
            audio,
            video,
            surface,
            natural_size: None,
        });

        Ok(())
    }

    /// attach_remote_stream binds the first video track of `stream` to
    /// `surface`. Further video tracks of the stream are not rendered.
    pub fn attach_remote_stream(
        &self,
        stream: &MediaStream,
        surface: Arc<dyn RenderSurface>,
    ) -> Result<Option<TrackHandle>> {
        let mut video_tracks = stream.video_tracks();
        let Some(track) = video_tracks.next().cloned() else {
            log::debug!("remote stream {} has no video track", stream.id);
            return Ok(None);
        };
        let ignored = video_tracks.count();
        if ignored > 0 {
            log::debug!(
                "ignoring {ignored} extra video track(s) of remote stream {}",
                stream.id
            );
        }

        self.bind_remote(Some(stream.id.clone()), track.clone(), surface)?;
        Ok(Some(track))
    }

    /// attach_remote_track binds a single remote video track to `surface`.
    pub fn attach_remote_track(
        &self,
        track: TrackHandle,
        surface: Arc<dyn RenderSurface>,
    ) -> Result<()> {
        self.bind_remote(None, track, surface)
    }

    fn bind_remote(
        &self,
        stream_id: Option<String>,
        track: TrackHandle,
        surface: Arc<dyn RenderSurface>,
    ) -> Result<()> {
        let mut bindings = self.bindings();

        if let Some(current) = &bindings.remote {
            if current.track == track && same_surface(&current.surface, &surface) {
                log::trace!("{track} already bound to {}", surface.id());
                return Ok(());
            }
            if self.strict {
                log::warn!(
                    "refusing to bind {track} while {} is bound to {}",
                    current.track,
                    current.surface.id()
                );
                return Err(Error::ErrBindingConflict {
                    track: current.track.id.clone(),
                    surface: current.surface.id().to_owned(),
                });
            }
        }

        if let Some(previous) = bindings.remote.take() {
            previous.surface.detach_track(&previous.track);
            log::debug!("detached {} from {}", previous.track, previous.surface.id());
        }

        surface.attach_track(&track);
        log::debug!("bound remote {track} to {}", surface.id());
        bindings.remote = Some(RemoteBinding {
            stream_id,
            track,
            surface,
            natural_size: None,
        });

        Ok(())
    }

    /// detach_remote_stream releases the remote binding if it came from the
    /// stream `stream_id`.
    pub fn detach_remote_stream(&self, stream_id: &str) -> bool {
        let mut bindings = self.bindings();
        let matches = bindings
            .remote
            .as_ref()
            .is_some_and(|remote| remote.stream_id.as_deref() == Some(stream_id));
        if !matches {
            return false;
        }

        if let Some(remote) = bindings.remote.take() {
            remote.surface.detach_track(&remote.track);
            log::debug!("remote stream {stream_id} removed, detached {}", remote.track);
        }
        true
    }

    pub fn detach_local(&self) {
        if let Some(local) = self.bindings().local.take() {
            local.surface.detach_track(&local.audio);
            local.surface.detach_track(&local.video);
            log::debug!("detached local tracks from {}", local.surface.id());
        }
    }

    pub fn detach_remote(&self) {
        if let Some(remote) = self.bindings().remote.take() {
            remote.surface.detach_track(&remote.track);
            log::debug!("detached {} from {}", remote.track, remote.surface.id());
        }
    }

    /// detach_all releases every binding. Safe to call more than once.
    pub fn detach_all(&self) {
        self.detach_local();
        self.detach_remote();
    }

    /// on_video_size_changed recomputes the render frame of the surface with
    /// id `surface_id` for video of `natural` size.
    pub fn on_video_size_changed(&self, surface_id: &str, natural: Size) -> Option<Rect> {
        let mut bindings = self.bindings();
        let Bindings { local, remote } = &mut *bindings;

        let (surface, natural_size) = if let Some(local) =
            local.as_mut().filter(|l| l.surface.id() == surface_id)
        {
            (&local.surface, &mut local.natural_size)
        } else if let Some(remote) = remote.as_mut().filter(|r| r.surface.id() == surface_id) {
            (&remote.surface, &mut remote.natural_size)
        } else {
            log::trace!("size change for unbound surface {surface_id}");
            return None;
        };

        *natural_size = Some(natural);
        let frame = aspect_fit(natural, surface.bounds())?;
        surface.set_render_frame(frame);
        Some(frame)
    }

    pub fn local_tracks(&self) -> Option<(TrackHandle, TrackHandle)> {
        self.bindings()
            .local
            .as_ref()
            .map(|local| (local.audio.clone(), local.video.clone()))
    }

    pub fn remote_track(&self) -> Option<TrackHandle> {
        self.bindings()
            .remote
            .as_ref()
            .map(|remote| remote.track.clone())
    }

    /// video_size returns the last natural video size reported for the
    /// surface `surface_id`.
    pub fn video_size(&self, surface_id: &str) -> Option<Size> {
        let bindings = self.bindings();
        if let Some(local) = bindings.local.as_ref().filter(|l| l.surface.id() == surface_id) {
            return local.natural_size;
        }
        bindings
            .remote
            .as_ref()
            .filter(|r| r.surface.id() == surface_id)
            .and_then(|r| r.natural_size)
    }
}

impl Drop for TrackManager {
    fn drop(&mut self) {
        self.detach_all();
    }
}
