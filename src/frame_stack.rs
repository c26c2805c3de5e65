//! Frame preprocessing and stacking.
use crate::base::RawFrame;
use crate::error::PixelqError;
use image::{
    imageops::{resize, FilterType::Triangle},
    ImageBuffer, Luma,
};
use std::collections::VecDeque;
use std::sync::Arc;

/// Side length of a preprocessed square frame.
pub const FRAME_SIDE: u32 = 84;

/// A preprocessed frame: `FRAME_SIDE * FRAME_SIDE` intensities in `[0, 1]`.
///
/// Frames are shared: consecutive stacked states overlap in all but one
/// frame, so each frame is behind an [`Arc`] instead of being copied into
/// every state that contains it.
pub type Frame = Arc<Vec<f32>>;

/// State formed by the K most recent preprocessed frames, oldest first.
#[derive(Clone, Debug)]
pub struct StackedState {
    frames: Vec<Frame>,
}

impl StackedState {
    /// Number of frames in the state.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The frames, oldest first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The most recent frame.
    pub fn latest(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    /// Copies the state into one contiguous buffer, oldest frame first.
    ///
    /// Convenience for approximators that consume a single flat input.
    pub fn to_flat(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.frames.iter().map(|f| f.len()).sum());
        for frame in &self.frames {
            out.extend_from_slice(frame);
        }
        out
    }
}

/// Maintains the sliding window of recent frames forming one state.
///
/// [`preprocess`](FrameStacker::preprocess) is a pure function of its input;
/// all history lives here. [`reset`](FrameStacker::reset) is called at
/// episode boundaries so that no state ever mixes frames from two episodes.
pub struct FrameStacker {
    depth: usize,
    history: VecDeque<Frame>,
}

impl FrameStacker {
    /// Constructs a stacker holding up to `depth` frames per state.
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            history: VecDeque::with_capacity(depth),
        }
    }

    /// Warps a raw frame to `FRAME_SIDE` square, pools color channels by
    /// maximum and rescales bytes to `[0, 1]`.
    pub fn preprocess(raw: &RawFrame) -> Result<Frame, PixelqError> {
        if raw.width == 0 || raw.height == 0 {
            return Err(PixelqError::MalformedFrame("frame has zero extent".into()));
        }
        let expected = raw.width as usize * raw.height as usize * raw.channels as usize;
        if raw.data.len() != expected {
            return Err(PixelqError::MalformedFrame(format!(
                "{}x{}x{} frame holds {} bytes, expected {}",
                raw.width,
                raw.height,
                raw.channels,
                raw.data.len(),
                expected
            )));
        }

        let luma = match raw.channels {
            1 => raw.data.clone(),
            3 => raw
                .data
                .chunks_exact(3)
                .map(|px| px[0].max(px[1]).max(px[2]))
                .collect(),
            c => {
                return Err(PixelqError::MalformedFrame(format!(
                    "unsupported channel count {}",
                    c
                )))
            }
        };

        let img = ImageBuffer::<Luma<u8>, Vec<u8>>::from_vec(raw.width, raw.height, luma)
            .ok_or_else(|| {
                PixelqError::MalformedFrame("buffer does not match dimensions".into())
            })?;
        let img = resize(&img, FRAME_SIDE, FRAME_SIDE, Triangle);
        let buf = img
            .into_raw()
            .iter()
            .map(|&px| px as f32 / 255.0)
            .collect::<Vec<_>>();

        Ok(Arc::new(buf))
    }

    /// Drops all history. The next pushed frame starts a fresh state.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Appends a frame and returns the stacked state ending in it.
    ///
    /// While fewer than `depth` frames have been seen since the last reset,
    /// the oldest available frame is repeated to pad the state; in
    /// particular the first state after a reset is its frame repeated
    /// `depth` times.
    pub fn push(&mut self, frame: Frame) -> StackedState {
        if self.history.len() == self.depth {
            self.history.pop_front();
        }
        self.history.push_back(frame);

        let mut frames = Vec::with_capacity(self.depth);
        let oldest = self.history[0].clone();
        for _ in self.history.len()..self.depth {
            frames.push(oldest.clone());
        }
        frames.extend(self.history.iter().cloned());

        StackedState { frames }
    }
}
