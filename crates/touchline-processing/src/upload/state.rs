use serde::Serialize;

/// Per-file position in the intake pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Pending,
    Validating,
    Rejected,
    Routing,
    ImagePath,
    VideoPath,
    PassthroughPath,
    Done,
}

impl FileState {
    pub fn can_transition_to(self, next: FileState) -> bool {
        use FileState::*;
        matches!(
            (self, next),
            (Pending, Validating)
                | (Validating, Rejected)
                | (Validating, Routing)
                | (Routing, ImagePath)
                | (Routing, VideoPath)
                | (Routing, PassthroughPath)
                | (ImagePath, Done)
                | (VideoPath, Done)
                | (PassthroughPath, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FileState::Rejected | FileState::Done)
    }
}

impl std::fmt::Display for FileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileState::Pending => "pending",
            FileState::Validating => "validating",
            FileState::Rejected => "rejected",
            FileState::Routing => "routing",
            FileState::ImagePath => "image_path",
            FileState::VideoPath => "video_path",
            FileState::PassthroughPath => "passthrough_path",
            FileState::Done => "done",
        };
        f.write_str(s)
    }
}

/// Tracks and logs one file's state transitions
#[derive(Debug)]
pub struct FileStateMachine {
    file_name: String,
    state: FileState,
}

impl FileStateMachine {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            state: FileState::Pending,
        }
    }

    pub fn state(&self) -> FileState {
        self.state
    }

    pub fn advance(&mut self, next: FileState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(
            file_name = %self.file_name,
            from = %self.state,
            to = %next,
            "File state changed"
        );
        self.state = next;
    }
}
