//! Codec implementations for encoding and decoding protocol frames

pub mod header_codec;
pub mod io;

pub use header_codec::HeaderCodec;
pub use io::{drain, recv_all, recv_exact, recv_filename, recv_header, send_all, send_frame, send_header};
