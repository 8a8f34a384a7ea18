//! Chunked streaming over an incremental cipher or hash state
//!
//! Input is cut into slices of `chunk_size` units and fed to the state in
//! order, one slice per step, with a cooperative yield between steps:
//!
//! ```text
//! [slice 0] update ─ yield ─ [slice 1] update ─ yield ─ ... ─ [slice n] update ─ finalize
//! ```
//!
//! There is always at least one step, even for empty input, so finalize sees
//! the same call sequence regardless of length. Slices are contiguous and
//! cover the input exactly, so the output depends only on the concatenation
//! of the slices, never on where the cuts fall.

use tracing::trace;

use crate::config::ChunkSize;
use crate::error::CodecResult;

/// A cipher or hash context that consumes input incrementally.
pub(crate) trait Incremental {
    type Output;

    fn update(&mut self, slice: &[u8]) -> CodecResult<()>;

    fn finalize(self) -> CodecResult<Self::Output>;
}

/// Split bytes into `chunk` sized slices. Yields one empty slice for empty input.
pub(crate) fn byte_slices(input: &[u8], chunk: ChunkSize) -> impl Iterator<Item = &[u8]> {
    let step = chunk.get();
    let steps = input.len().div_ceil(step).max(1);
    (0..steps).map(move |i| {
        let start = i * step;
        let end = input.len().min(start.saturating_add(step));
        &input[start..end]
    })
}

/// Split text into slices of `chunk` characters, returned as their UTF-8 bytes.
/// Yields one empty slice for empty input.
pub(crate) fn char_slices(text: &str, chunk: ChunkSize) -> Vec<&[u8]> {
    let mut bounds: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .step_by(chunk.get())
        .collect();
    if bounds.is_empty() {
        bounds.push(0);
    }
    bounds.push(text.len());

    let bytes = text.as_bytes();
    bounds.windows(2).map(|w| &bytes[w[0]..w[1]]).collect()
}

/// Feed every slice to `state` in order, yielding to the scheduler between
/// steps, then finalize.
pub(crate) async fn drive<'a, S, I>(mut state: S, slices: I) -> CodecResult<S::Output>
where
    S: Incremental,
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut steps = 0usize;
    for slice in slices {
        if steps > 0 {
            tokio::task::yield_now().await;
        }
        state.update(slice)?;
        steps += 1;
    }
    trace!(steps, "stream finalized");
    state.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every slice it receives.
    #[derive(Default)]
    struct Recorder {
        slices: Vec<Vec<u8>>,
    }

    impl Incremental for Recorder {
        type Output = Vec<Vec<u8>>;

        fn update(&mut self, slice: &[u8]) -> CodecResult<()> {
            self.slices.push(slice.to_vec());
            Ok(())
        }

        fn finalize(self) -> CodecResult<Self::Output> {
            Ok(self.slices)
        }
    }

    fn chunk(n: usize) -> ChunkSize {
        ChunkSize::new(n).unwrap()
    }

    #[test]
    fn byte_slices_cover_input() {
        let data: Vec<u8> = (0..10).collect();
        let slices: Vec<&[u8]> = byte_slices(&data, chunk(4)).collect();
        assert_eq!(slices, vec![&data[0..4], &data[4..8], &data[8..10]]);
    }

    #[test]
    fn byte_slices_exact_multiple() {
        let data = [7u8; 8];
        assert_eq!(byte_slices(&data, chunk(4)).count(), 2);
    }

    #[test]
    fn empty_input_still_takes_one_step() {
        let slices: Vec<&[u8]> = byte_slices(&[], chunk(4)).collect();
        assert_eq!(slices, vec![&[] as &[u8]]);
        assert_eq!(char_slices("", chunk(4)), vec![&[] as &[u8]]);
    }

    #[test]
    fn huge_chunk_is_one_step() {
        let data = [1u8; 5];
        let slices: Vec<&[u8]> = byte_slices(&data, chunk(usize::MAX)).collect();
        assert_eq!(slices, vec![&data[..]]);
    }

    #[test]
    fn char_slices_respect_boundaries() {
        let text = "ałą🦫b";
        let slices = char_slices(text, chunk(2));
        let decoded: Vec<&str> = slices
            .iter()
            .map(|s| std::str::from_utf8(s).unwrap())
            .collect();
        assert_eq!(decoded, vec!["ał", "ą🦫", "b"]);
    }

    #[tokio::test]
    async fn drive_feeds_in_order() {
        let data: Vec<u8> = (0..7).collect();
        let seen = drive(Recorder::default(), byte_slices(&data, chunk(3)))
            .await
            .unwrap();
        assert_eq!(seen, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
    }
}
