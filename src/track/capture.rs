use serde::{Deserialize, Serialize};

/// CaptureFormat is one capture mode offered by the engine's camera.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFormat {
    pub width: u32,
    pub height: u32,
    pub min_fps: u32,
    pub max_fps: u32,
}

impl CaptureFormat {
    fn supports_fps(&self, fps: u32) -> bool {
        self.min_fps <= fps && fps <= self.max_fps
    }

    fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// CaptureConstraints is the capture mode a session asks for. Without a
/// height only the width has to match.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConstraints {
    pub width: u32,
    pub height: Option<u32>,
    pub fps: u32,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        CaptureConstraints {
            width: 640,
            height: Some(640 * 16 / 9),
            fps: 30,
        }
    }
}

/// select_capture_format picks the format to capture with.
///
/// Only formats supporting the requested frame rate qualify. An exact size
/// match wins. Otherwise the smallest format with the requested width, and
/// failing that the smallest format at least as large as requested in both
/// dimensions. Ties go to the smaller width, then the smaller height, so the
/// result does not depend on the order the engine lists formats in.
pub fn select_capture_format(
    formats: &[CaptureFormat],
    constraints: &CaptureConstraints,
) -> Option<CaptureFormat> {
    let min_height = constraints.height.unwrap_or(0);
    let usable: Vec<&CaptureFormat> = formats
        .iter()
        .filter(|f| f.supports_fps(constraints.fps))
        .collect();

    let exact = usable
        .iter()
        .filter(|f| {
            f.width == constraints.width && constraints.height.map_or(true, |h| f.height == h)
        })
        .min_by_key(|f| (f.area(), f.width, f.height));
    if let Some(format) = exact {
        return Some(**format);
    }

    let same_width = usable
        .iter()
        .filter(|f| f.width == constraints.width)
        .min_by_key(|f| (f.area(), f.height));
    if let Some(format) = same_width {
        return Some(**format);
    }

    usable
        .iter()
        .filter(|f| f.width >= constraints.width && f.height >= min_height)
        .min_by_key(|f| (f.area(), f.width, f.height))
        .map(|f| **f)
}
