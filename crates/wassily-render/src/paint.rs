//! Styled painting helpers shared by every marking.

use crate::canvas::Canvas;
use kurbo::BezPath;
use wassily_core::Style;

/// Stroke or fill `path` according to the style's stroke flag.
pub fn paint_path(canvas: &mut dyn Canvas, path: &BezPath, style: &Style) {
    if style.stroke {
        canvas.stroke(path);
    } else {
        canvas.fill(path);
    }
}

/// Run `draw` between a save/restore pair with `style` applied.
pub fn with_style<T>(
    canvas: &mut dyn Canvas,
    style: &Style,
    draw: impl FnOnce(&mut dyn Canvas) -> T,
) -> T {
    canvas.save();
    canvas.apply_style(style);
    let result = draw(canvas);
    canvas.restore();
    result
}
