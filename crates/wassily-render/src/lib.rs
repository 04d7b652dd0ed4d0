pub mod canvas;
pub mod hit;
pub mod paint;
pub mod recording;

pub use canvas::{Canvas, TextMetrics, TextRun, to_canvas, to_cartesian};
pub use hit::point_in_path;
pub use paint::{paint_path, with_style};
pub use recording::{DrawOp, RecordingCanvas};
