//! Safe wrappers around FFmpeg FFI calls.
//!
//! Every function in this module is `pub` and **safe** to call.  All `unsafe`
//! blocks are contained here with explicit safety arguments.  Callers outside
//! this module should never need to write `unsafe` for routine FFmpeg access.

use ffmpeg_next as ffmpeg;

// ── Codec-parameter field accessors ─────────────────────────────────────────

/// Read `width` from an `AVCodecParameters` struct.
///
/// `ffmpeg-next` does not expose this field through a safe accessor.
pub fn codec_params_width(params: &ffmpeg::codec::parameters::Parameters) -> u32 {
    // SAFETY: `params.as_ptr()` returns a valid non-null pointer for the
    // lifetime of `params`.  `width` is a plain i32 field with no ownership
    // semantics.
    unsafe { (*params.as_ptr()).width as u32 }
}

/// Read `height` from an `AVCodecParameters` struct.
pub fn codec_params_height(params: &ffmpeg::codec::parameters::Parameters) -> u32 {
    // SAFETY: same as `codec_params_width`.
    unsafe { (*params.as_ptr()).height as u32 }
}

/// Read `bit_rate` from an `AVCodecParameters` struct.
pub fn codec_params_bit_rate(params: &ffmpeg::codec::parameters::Parameters) -> u64 {
    // SAFETY: same as `codec_params_width`.
    unsafe { (*params.as_ptr()).bit_rate as u64 }
}

// ── Output stream setup ─────────────────────────────────────────────────────

/// Zero out `codec_tag` on the `AVCodecParameters` attached to an output
/// stream, so the muxer picks the correct tag for the target container.
///
/// Must be called after `out_stream.set_parameters(...)` and before
/// `write_header`.
pub fn stream_reset_codec_tag(out_stream: &mut ffmpeg::format::stream::StreamMut) {
    // SAFETY: `out_stream.as_mut_ptr()` is valid for the lifetime of the
    // stream.  `codecpar` is set by `set_parameters` and is non-null.
    // Writing 0 to `codec_tag` is always safe — it is a plain u32 field.
    unsafe {
        (*(*out_stream.as_mut_ptr()).codecpar).codec_tag = 0;
    }
}

/// Copy framing fields (`r_frame_rate`, `avg_frame_rate`,
/// `sample_aspect_ratio`) from an input stream onto an output stream.
///
/// `ffmpeg-next` exposes setters for the frame rates but not for the
/// stream-level aspect ratio, so all three are copied here in one place.
pub fn stream_copy_framing(
    out_stream: &mut ffmpeg::format::stream::StreamMut,
    in_stream: &ffmpeg::format::stream::Stream,
) {
    // SAFETY: both pointers are valid for the lifetime of their streams.
    // The copied fields are plain AVRational values with no ownership
    // semantics.
    unsafe {
        let src = in_stream.as_ptr();
        let dst = out_stream.as_mut_ptr();
        (*dst).r_frame_rate = (*src).r_frame_rate;
        (*dst).avg_frame_rate = (*src).avg_frame_rate;
        (*dst).sample_aspect_ratio = (*src).sample_aspect_ratio;
    }
}

/// Copy stream metadata (language tags, titles) from an input stream onto an
/// output stream.
pub fn stream_copy_metadata(
    out_stream: &mut ffmpeg::format::stream::StreamMut,
    in_stream: &ffmpeg::format::stream::Stream,
) {
    // SAFETY: `av_dict_copy` allocates a fresh dictionary owned by the
    // output stream; the destination pointer starts null for a new stream
    // and is freed by `avformat_free_context`.  The source dictionary is
    // only read.
    unsafe {
        let src = in_stream.as_ptr();
        let dst = out_stream.as_mut_ptr();
        ffmpeg::ffi::av_dict_copy(&mut (*dst).metadata, (*src).metadata, 0);
    }
}

#[cfg(test)]
mod tests {
    // The helpers above require live AVStream pointers, which only exist
    // inside an opened format context; they are exercised by the e2e tests
    // in `crate::tests::e2e`.
}
