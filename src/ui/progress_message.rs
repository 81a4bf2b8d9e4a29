#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgressPhase {
    Scanning,
    Resolving,
    Emitting,
}

#[derive(Clone, Debug)]
pub enum ProgressMessage {
    Started {
        phase: ProgressPhase,
        total: usize,
    },
    Progress {
        phase: ProgressPhase,
        item: Option<String>,
    },
    Finished {
        phase: ProgressPhase,
    },
    Error(String),
}
