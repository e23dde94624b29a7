/// Size is a width/height pair in surface points.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }

    fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Rect is a frame inside a surface, origin at the top-left corner.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// aspect_fit places video of `natural` size into `bounds`.
///
/// Portrait video (`w < h`) fills the surface height and is centered
/// horizontally; anything else fills the width and is centered vertically.
/// Returns `None` when either size has no area.
pub fn aspect_fit(natural: Size, bounds: Size) -> Option<Rect> {
    if natural.is_empty() || bounds.is_empty() {
        return None;
    }

    let frame = if natural.width < natural.height {
        let width = natural.width * bounds.height / natural.height;
        Rect {
            x: (bounds.width - width) / 2.0,
            y: 0.0,
            width,
            height: bounds.height,
        }
    } else {
        let height = natural.height * bounds.width / natural.width;
        Rect {
            x: 0.0,
            y: (bounds.height - height) / 2.0,
            width: bounds.width,
            height,
        }
    };

    Some(frame)
}

/// RenderSurface is a view that renders the frames of attached video tracks.
///
/// Surfaces are owned by the UI; the session only tells them which track to
/// show and where to draw it. Implementations must not call back into the
/// session from these methods.
pub trait RenderSurface: Send + Sync {
    /// id identifies the surface; two handles with the same id are the same
    /// surface.
    fn id(&self) -> &str;

    /// bounds is the current size of the surface.
    fn bounds(&self) -> Size;

    fn attach_track(&self, track: &crate::track::TrackHandle);

    fn detach_track(&self, track: &crate::track::TrackHandle);

    /// set_render_frame positions the rendered video inside the surface.
    fn set_render_frame(&self, frame: Rect);
}
