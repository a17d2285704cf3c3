/// Lines shown while a refresh task runs. Display only; never mixed into the
/// backend message log.
pub const PROGRESS_MESSAGES: [&str; 5] = [
    "Searching job boards for new postings...",
    "Reading your profile and skills...",
    "Comparing postings with your experience...",
    "Scoring job relevance...",
    "Almost there, organizing your matches...",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressTicker {
    index: Option<usize>,
}

impl ProgressTicker {
    pub fn start(&mut self) {
        self.index = Some(0);
    }

    pub fn stop(&mut self) {
        self.index = None;
    }

    pub fn is_running(&self) -> bool {
        self.index.is_some()
    }

    pub fn advance(&mut self) {
        if let Some(index) = self.index {
            self.index = Some((index + 1) % PROGRESS_MESSAGES.len());
        }
    }

    pub fn current(&self) -> Option<&'static str> {
        self.index.map(|index| PROGRESS_MESSAGES[index])
    }
}
