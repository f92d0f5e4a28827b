//! FFmpeg utility functions

use ffmpeg_next as ffmpeg;

/// Convert timestamps from one timebase to another
///
/// This is essential when copying packets between streams with different timebases.
pub fn rescale_ts(ts: i64, from: ffmpeg::Rational, to: ffmpeg::Rational) -> i64 {
    unsafe { ffmpeg::ffi::av_rescale_q(ts, from.into(), to.into()) }
}

/// Convert a timestamp in timebase units to seconds
pub fn ts_to_seconds(ts: i64, timebase: ffmpeg::Rational) -> f64 {
    let num = timebase.numerator() as f64;
    let den = timebase.denominator() as f64;
    (ts as f64 * num) / den
}

/// Convert seconds to a timestamp in timebase units
pub fn seconds_to_ts(secs: f64, timebase: ffmpeg::Rational) -> i64 {
    let num = timebase.numerator() as f64;
    let den = timebase.denominator() as f64;
    ((secs * den) / num) as i64
}

/// Get the media type name
pub fn media_type_name(media_type: ffmpeg::media::Type) -> &'static str {
    match media_type {
        ffmpeg::media::Type::Video => "video",
        ffmpeg::media::Type::Audio => "audio",
        ffmpeg::media::Type::Subtitle => "subtitle",
        ffmpeg::media::Type::Data => "data",
        ffmpeg::media::Type::Attachment => "attachment",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ts_conversion() {
        let timebase = ffmpeg::Rational::new(1, 90000);

        assert!((ts_to_seconds(90000, timebase) - 1.0).abs() < 0.0001);
        assert!((ts_to_seconds(45000, timebase) - 0.5).abs() < 0.0001);

        let ts = seconds_to_ts(2.5, timebase);
        assert!((ts_to_seconds(ts, timebase) - 2.5).abs() < 0.0001);
    }

    #[test]
    fn test_media_type_name() {
        assert_eq!(media_type_name(ffmpeg::media::Type::Video), "video");
        assert_eq!(media_type_name(ffmpeg::media::Type::Attachment), "attachment");
    }
}
