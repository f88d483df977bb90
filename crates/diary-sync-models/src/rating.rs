/// Lowest rating the diary allows (half a star)
pub const MIN_STARS: f64 = 0.5;
/// Highest rating the diary allows
pub const MAX_STARS: f64 = 5.0;

/// Convert a half-star rating (0.5-5.0) to Trakt's 1-10 scale.
///
/// The value is doubled and rounded half-up, so 0.5 maps to 1 and 5.0 to 10.
/// Anything outside the diary range, or not a number, has no Trakt rating.
pub fn half_stars_to_trakt(stars: f64) -> Option<u8> {
    if !stars.is_finite() || !(MIN_STARS..=MAX_STARS).contains(&stars) {
        return None;
    }
    // non-negative, so f64::round (half away from zero) is half-up
    Some((stars * 2.0).round() as u8)
}
