//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate "fit inside" dimensions for a square bounding box.
///
/// The longer edge becomes `bound`, the shorter edge is scaled by the same
/// ratio and rounded (never below 1px). Images that already fit are returned
/// unchanged: this never upscales and never crops.
///
/// # Examples
/// ```
/// # use simple_gallery::imaging::fit_inside;
/// // 4000x3000 landscape into a 150px box → 150x113
/// assert_eq!(fit_inside((4000, 3000), 150), (150, 113));
///
/// // Already small enough → unchanged
/// assert_eq!(fit_inside((100, 80), 150), (100, 80));
/// ```
pub fn fit_inside(original: (u32, u32), bound: u32) -> (u32, u32) {
    let (w, h) = original;
    if w <= bound && h <= bound {
        return (w, h);
    }

    if w >= h {
        // Landscape or square: width hits the box
        let ratio = bound as f64 / w as f64;
        let scaled = ((h as f64 * ratio).round() as u32).clamp(1, bound);
        (bound, scaled)
    } else {
        // Portrait: height hits the box
        let ratio = bound as f64 / h as f64;
        let scaled = ((w as f64 * ratio).round() as u32).clamp(1, bound);
        (scaled, bound)
    }
}
