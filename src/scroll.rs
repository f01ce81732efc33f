//! Horizontal scrolling for text wider than the button.
//!
//! Widths are estimated from the character count at a fixed average glyph
//! width for the 24 px line font, not measured. A scrolling line pauses at
//! the start, scrolls left until its end is visible, pauses again and jumps
//! back.

/// Average glyph width of the line font in pixels.
pub const GLYPH_WIDTH: u32 = 14;
/// Width available to a line: the button minus the left margin.
pub const AVAILABLE_WIDTH: u32 = 134;
/// Pixels advanced per animation frame.
pub const SCROLL_STEP: u32 = 2;
/// Frames spent at rest at either end of the scroll.
pub const PAUSE_FRAMES: u32 = 30;
/// Amount the frame counter advances per animation tick.
pub const FRAME_STEP: u32 = 2;

pub fn estimated_width(text: &str) -> u32 {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    chars.saturating_mul(GLYPH_WIDTH)
}

/// Whether `text` overflows the line and has to scroll.
pub fn needs_scroll(text: &str) -> bool {
    estimated_width(text) > AVAILABLE_WIDTH
}

/// Horizontal offset of `text` in pixels for the given frame counter.
///
/// Always `<= 0`; zero for text that fits.
///
/// # Examples
///
/// ```
/// use oebb_deck::scroll::offset;
///
/// assert_eq!(offset("Wien Hbf", 500), 0);
/// assert_eq!(offset("Flughafen Wien", 0), 0);
/// ```
pub fn offset(text: &str, frame: u32) -> i32 {
    let width = estimated_width(text);
    if width <= AVAILABLE_WIDTH {
        return 0;
    }

    let max_scroll = width - AVAILABLE_WIDTH;
    let scroll_frames = max_scroll.div_ceil(SCROLL_STEP);
    let cycle = PAUSE_FRAMES + scroll_frames + PAUSE_FRAMES;
    let pos = (frame / 2) % cycle;

    let shift = if pos < PAUSE_FRAMES {
        0
    } else if pos < PAUSE_FRAMES + scroll_frames {
        ((pos - PAUSE_FRAMES) * SCROLL_STEP).min(max_scroll)
    } else {
        max_scroll
    };
    -i32::try_from(shift).unwrap_or(i32::MAX)
}
