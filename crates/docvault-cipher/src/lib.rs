//! # DocVault Cipher
//!
//! Streaming authenticated encryption for document blobs.
//!
//! The engine wraps caller-supplied byte streams: the same code path serves
//! uploads, downloads, and in-memory fixtures. Data is processed in bounded
//! chunks so peak memory is independent of stream length.
//!
//! ## Wire format
//!
//! ```text
//! [1 byte: IV length][IV bytes][frame]...[final frame]
//! ```
//!
//! Each frame is a 4-byte big-endian length word (top bit marks the final
//! frame) followed by the frame's ciphertext with its 128-bit tag. Per-frame
//! nonces fold a frame counter and the final-frame marker into the stream IV,
//! so reordering, truncation, or extension of frames fails authentication.

pub mod engine;
pub mod error;

pub use engine::{StreamCipher, CHUNK_SIZE, IV_LEN, TAG_LEN};
pub use error::CipherError;
