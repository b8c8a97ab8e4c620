//! The streaming cipher engine.
//!
//! Encryption generates a fresh random IV per invocation and never derives it
//! from content. Decryption verifies every frame before releasing its bytes;
//! a tag mismatch anywhere fails the whole operation.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use docvault_core::{CipherConfig, CipherKey, CipherNonce};

use crate::error::{CipherError, Result};

/// IV length for ChaCha20-Poly1305, in bytes.
pub const IV_LEN: usize = 12;

/// Poly1305 tag length, in bytes.
pub const TAG_LEN: usize = 16;

/// Plaintext bytes per frame.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Top bit of the frame length word marks the final frame.
const FINAL_FRAME: u32 = 0x8000_0000;

/// Largest ciphertext a frame may carry.
const MAX_FRAME_LEN: usize = CHUNK_SIZE + TAG_LEN;

/// Streaming AEAD engine over caller-supplied byte streams.
///
/// Stateless across calls aside from the configured key and algorithm;
/// a single instance is safely shared between concurrent operations.
#[derive(Clone)]
pub struct StreamCipher {
    key: CipherKey,
}

impl StreamCipher {
    /// Create an engine from the process cipher configuration.
    pub fn new(config: &CipherConfig) -> Self {
        debug_assert_eq!(config.algorithm.iv_len(), IV_LEN);
        Self {
            key: config.key.clone(),
        }
    }

    fn cipher(&self) -> Result<ChaCha20Poly1305> {
        ChaCha20Poly1305::new_from_slice(self.key.as_bytes())
            .map_err(|e| CipherError::Encryption(e.to_string()))
    }

    /// Encrypt `reader` into `writer`. Returns the number of plaintext bytes
    /// consumed.
    pub async fn encrypt<R, W>(&self, mut reader: R, mut writer: W) -> Result<u64>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let cipher = self.cipher()?;
        let iv = CipherNonce::generate();

        writer.write_u8(IV_LEN as u8).await?;
        writer.write_all(iv.as_bytes()).await?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut carry: Option<u8> = None;
        let mut counter: u32 = 0;
        let mut total: u64 = 0;

        loop {
            let mut len = 0;
            if let Some(b) = carry.take() {
                buf[0] = b;
                len = 1;
            }
            len += read_full(&mut reader, &mut buf[len..]).await?;

            // A full chunk needs a one-byte probe to learn whether it is final.
            let is_final = if len == CHUNK_SIZE {
                let mut probe = [0u8; 1];
                let n = reader.read(&mut probe).await?;
                if n == 0 {
                    true
                } else {
                    carry = Some(probe[0]);
                    false
                }
            } else {
                true
            };

            let nonce = frame_nonce(&iv, counter, is_final);
            let ciphertext = cipher
                .encrypt(Nonce::from_slice(&nonce), &buf[..len])
                .map_err(|e| CipherError::Encryption(e.to_string()))?;

            let mut word = ciphertext.len() as u32;
            if is_final {
                word |= FINAL_FRAME;
            }
            writer.write_u32(word).await?;
            writer.write_all(&ciphertext).await?;

            total += len as u64;
            if is_final {
                writer.flush().await?;
                return Ok(total);
            }
            counter = counter.checked_add(1).ok_or(CipherError::StreamTooLong)?;
        }
    }

    /// Decrypt `reader` into `writer`. Returns the number of plaintext bytes
    /// produced.
    ///
    /// Frames are verified before any of their bytes reach `writer`. On any
    /// failure the operation aborts; the caller must discard whatever prefix
    /// was already written.
    pub async fn decrypt<R, W>(&self, mut reader: R, mut writer: W) -> Result<u64>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let cipher = self.cipher()?;

        let iv_len = read_header_u8(&mut reader).await?;
        if iv_len as usize != IV_LEN {
            return Err(CipherError::Decryption(format!(
                "unexpected IV length {iv_len}"
            )));
        }
        let mut iv = [0u8; IV_LEN];
        read_header_exact(&mut reader, &mut iv).await?;
        let iv = CipherNonce::from_bytes(iv);

        let mut counter: u32 = 0;
        let mut total: u64 = 0;

        loop {
            let mut word_bytes = [0u8; 4];
            read_header_exact(&mut reader, &mut word_bytes).await?;
            let word = u32::from_be_bytes(word_bytes);
            let is_final = word & FINAL_FRAME != 0;
            let len = (word & !FINAL_FRAME) as usize;

            if len < TAG_LEN || len > MAX_FRAME_LEN {
                return Err(CipherError::Decryption(format!(
                    "frame length {len} out of range"
                )));
            }

            let mut frame = vec![0u8; len];
            read_header_exact(&mut reader, &mut frame).await?;

            let nonce = frame_nonce(&iv, counter, is_final);
            let plaintext = cipher
                .decrypt(Nonce::from_slice(&nonce), frame.as_ref())
                .map_err(|_| CipherError::Decryption("authentication tag mismatch".into()))?;

            writer.write_all(&plaintext).await?;
            total += plaintext.len() as u64;

            if is_final {
                let mut probe = [0u8; 1];
                if reader.read(&mut probe).await? != 0 {
                    return Err(CipherError::Decryption(
                        "trailing data after final frame".into(),
                    ));
                }
                writer.flush().await?;
                return Ok(total);
            }
            counter = counter
                .checked_add(1)
                .ok_or_else(|| CipherError::Decryption("frame counter overflow".into()))?;
        }
    }

    /// One-shot encryption of an in-memory buffer, same wire format.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = self.cipher()?;
        let iv = CipherNonce::generate();

        let mut out = Vec::with_capacity(1 + IV_LEN + plaintext.len() + TAG_LEN + 4);
        out.push(IV_LEN as u8);
        out.extend_from_slice(iv.as_bytes());

        let mut chunks = plaintext.chunks(CHUNK_SIZE).peekable();
        let mut counter: u32 = 0;
        // Empty plaintext still emits one empty final frame.
        if chunks.peek().is_none() {
            seal_frame(&cipher, &iv, counter, true, &[], &mut out)?;
            return Ok(out);
        }
        while let Some(chunk) = chunks.next() {
            let is_final = chunks.peek().is_none();
            seal_frame(&cipher, &iv, counter, is_final, chunk, &mut out)?;
            counter = counter.checked_add(1).ok_or(CipherError::StreamTooLong)?;
        }
        Ok(out)
    }

    /// One-shot decryption of an in-memory buffer, same wire format.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        let cipher = self.cipher()?;

        let (&iv_len, rest) = sealed
            .split_first()
            .ok_or_else(|| CipherError::Decryption("empty envelope".into()))?;
        if iv_len as usize != IV_LEN {
            return Err(CipherError::Decryption(format!(
                "unexpected IV length {iv_len}"
            )));
        }
        if rest.len() < IV_LEN {
            return Err(CipherError::Decryption("truncated envelope".into()));
        }
        let (iv_bytes, mut rest) = rest.split_at(IV_LEN);
        let iv = CipherNonce::from_bytes(iv_bytes.try_into().expect("split length"));

        let mut out = Vec::new();
        let mut counter: u32 = 0;
        loop {
            if rest.len() < 4 {
                return Err(CipherError::Decryption("truncated frame header".into()));
            }
            let (word_bytes, tail) = rest.split_at(4);
            let word = u32::from_be_bytes(word_bytes.try_into().expect("split length"));
            let is_final = word & FINAL_FRAME != 0;
            let len = (word & !FINAL_FRAME) as usize;

            if len < TAG_LEN || len > MAX_FRAME_LEN {
                return Err(CipherError::Decryption(format!(
                    "frame length {len} out of range"
                )));
            }
            if tail.len() < len {
                return Err(CipherError::Decryption("truncated frame".into()));
            }
            let (frame, tail) = tail.split_at(len);

            let nonce = frame_nonce(&iv, counter, is_final);
            let plaintext = cipher
                .decrypt(Nonce::from_slice(&nonce), frame)
                .map_err(|_| CipherError::Decryption("authentication tag mismatch".into()))?;
            out.extend_from_slice(&plaintext);

            if is_final {
                if !tail.is_empty() {
                    return Err(CipherError::Decryption(
                        "trailing data after final frame".into(),
                    ));
                }
                return Ok(out);
            }
            rest = tail;
            counter = counter
                .checked_add(1)
                .ok_or_else(|| CipherError::Decryption("frame counter overflow".into()))?;
        }
    }
}

/// Encrypt one chunk and append its frame to `out`.
fn seal_frame(
    cipher: &ChaCha20Poly1305,
    iv: &CipherNonce,
    counter: u32,
    is_final: bool,
    chunk: &[u8],
    out: &mut Vec<u8>,
) -> Result<()> {
    let nonce = frame_nonce(iv, counter, is_final);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), chunk)
        .map_err(|e| CipherError::Encryption(e.to_string()))?;
    let mut word = ciphertext.len() as u32;
    if is_final {
        word |= FINAL_FRAME;
    }
    out.extend_from_slice(&word.to_be_bytes());
    out.extend_from_slice(&ciphertext);
    Ok(())
}

/// Derive the nonce for one frame.
///
/// The frame counter is folded into bytes 7..11 of the IV and the final-frame
/// marker into byte 11, so every IV bit participates in every frame and a
/// frame authenticates its position and finality.
fn frame_nonce(iv: &CipherNonce, counter: u32, is_final: bool) -> [u8; IV_LEN] {
    let mut nonce = *iv.as_bytes();
    let c = counter.to_be_bytes();
    for i in 0..4 {
        nonce[7 + i] ^= c[i];
    }
    if is_final {
        nonce[11] ^= 0x80;
    }
    nonce
}

/// Read until `buf` is full or EOF. Returns the number of bytes read.
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Read one byte of envelope framing; EOF is a malformed envelope, not IO.
async fn read_header_u8<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    read_header_exact(reader, &mut byte).await?;
    Ok(byte[0])
}

/// Read exact envelope bytes; EOF is a malformed envelope, not IO.
async fn read_header_exact<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(CipherError::Decryption("truncated stream".into()))
        }
        Err(e) => Err(CipherError::Io(e)),
    }
}
