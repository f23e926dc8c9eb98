/// Regroups arbitrary-length device callbacks into fixed-size mono frames.
///
/// The device may deliver any number of samples per callback and more than
/// one channel; the classifier downstream needs exactly one frame size.
pub struct FrameChunker {
    frame_size: usize,
    buffer: Vec<i16>,
}

impl FrameChunker {
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            buffer: Vec::with_capacity(frame_size * 4),
        }
    }

    /// Accept interleaved samples, downmixing to mono by channel average.
    pub fn push(&mut self, interleaved: &[i16], channels: u16) {
        if channels <= 1 {
            self.buffer.extend_from_slice(interleaved);
            return;
        }
        let channels = channels as usize;
        for group in interleaved.chunks_exact(channels) {
            let sum: i32 = group.iter().map(|&s| s as i32).sum();
            self.buffer.push((sum / channels as i32) as i16);
        }
    }

    /// Pop the next complete frame, if one has accumulated.
    pub fn next_frame(&mut self) -> Option<Vec<i16>> {
        if self.buffer.len() < self.frame_size {
            return None;
        }
        Some(self.buffer.drain(..self.frame_size).collect())
    }

    pub fn pending_samples(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regroups_across_callback_boundaries() {
        let mut chunker = FrameChunker::new(480);
        chunker.push(&[1i16; 300], 1);
        assert!(chunker.next_frame().is_none());

        chunker.push(&[1i16; 300], 1);
        let frame = chunker.next_frame().unwrap();
        assert_eq!(frame.len(), 480);
        assert!(chunker.next_frame().is_none());
        assert_eq!(chunker.pending_samples(), 120);
    }

    #[test]
    fn stereo_is_averaged_to_mono() {
        let mut chunker = FrameChunker::new(4);
        // L/R pairs: (100, 300), (-50, 50), (7, 8), (0, 0)
        chunker.push(&[100, 300, -50, 50, 7, 8, 0, 0], 2);
        assert_eq!(chunker.next_frame().unwrap(), vec![200, 0, 7, 0]);
    }

    #[test]
    fn yields_multiple_frames_from_one_push() {
        let mut chunker = FrameChunker::new(10);
        chunker.push(&[5i16; 25], 1);
        assert_eq!(chunker.next_frame().unwrap().len(), 10);
        assert_eq!(chunker.next_frame().unwrap().len(), 10);
        assert!(chunker.next_frame().is_none());
        assert_eq!(chunker.pending_samples(), 5);
    }
}
