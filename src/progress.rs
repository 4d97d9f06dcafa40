//! Progress bar display for module builds

use indicatif::{ProgressBar, ProgressStyle};

/// Progress display for a run over the manifest's modules
pub struct ProgressDisplay {
    module_pb: ProgressBar,
}

impl ProgressDisplay {
    /// Create a new progress display with total module count
    pub fn new(total_modules: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let module_pb = ProgressBar::new(total_modules);
        module_pb.set_style(style);
        Self { module_pb }
    }

    /// A display that never draws, used when log output is verbose
    pub fn hidden() -> Self {
        Self {
            module_pb: ProgressBar::hidden(),
        }
    }

    /// Show the module and the stage it is in
    pub fn update_module(&self, module: &str, stage: &str) {
        self.module_pb.set_message(format!("{module} ({stage})"));
    }

    /// Mark the current module done
    pub fn inc_module(&self) {
        self.module_pb.inc(1);
    }

    pub fn finish(&self) {
        self.module_pb.finish_and_clear();
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.module_pb.abandon();
    }
}
