use crate::model::{Video, VideoStatus};

/// Where a playlist goes after the current video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SequenceStep<'a> {
    Next(&'a Video),
    /// The current video is the last one.
    Complete,
    /// The current video is not in the list; no navigation is possible.
    NotFound,
}

/// Navigation over an ordered playlist relative to one current video.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VideoSequencer<'a> {
    videos: &'a [Video],
    current: Option<usize>,
}

impl<'a> VideoSequencer<'a> {
    pub(crate) fn new(videos: &'a [Video], current_id: i64) -> Self {
        let current = videos.iter().position(|video| video.id == current_id);
        Self { videos, current }
    }

    pub(crate) fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub(crate) fn previous(&self) -> Option<&'a Video> {
        let idx = self.current?;
        if idx == 0 {
            return None;
        }
        self.videos.get(idx - 1)
    }

    pub(crate) fn next(&self) -> SequenceStep<'a> {
        let Some(idx) = self.current else {
            return SequenceStep::NotFound;
        };
        match self.videos.get(idx + 1) {
            Some(video) => SequenceStep::Next(video),
            None => SequenceStep::Complete,
        }
    }

    /// Strict sequencing: the first video is always open, every later one
    /// needs its predecessor completed.
    pub(crate) fn is_unlocked(&self, index: usize) -> bool {
        is_unlocked(self.videos, index)
    }

    pub(crate) fn current_unlocked(&self, strict: bool) -> bool {
        match self.current {
            Some(idx) if strict => self.is_unlocked(idx),
            _ => true,
        }
    }

    pub(crate) fn position_label(&self) -> String {
        match self.current {
            Some(idx) => format!("{} of {}", idx + 1, self.videos.len()),
            None => format!("- of {}", self.videos.len()),
        }
    }
}

pub(crate) fn is_unlocked(videos: &[Video], index: usize) -> bool {
    if index >= videos.len() {
        return false;
    }
    index == 0 || videos[index - 1].status == VideoStatus::Completed
}
