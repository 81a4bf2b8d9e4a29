use crate::ui::progress_message::{ProgressMessage, ProgressPhase};
use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, MultiProgress, ProgressBar};
use owo_colors::OwoColorize;
use std::thread;
use std::time::Duration;

struct Bars {
    scanning: ProgressBar,
    resolving: ProgressBar,
    emitting: ProgressBar,
}

impl Bars {
    fn get(&self, phase: ProgressPhase) -> &ProgressBar {
        match phase {
            ProgressPhase::Scanning => &self.scanning,
            ProgressPhase::Resolving => &self.resolving,
            ProgressPhase::Emitting => &self.emitting,
        }
    }
}

pub struct ProgressManager {
    mp: MultiProgress,
    scanning: ProgressBar,
    resolving: ProgressBar,
    emitting: ProgressBar,
    handle: Option<thread::JoinHandle<()>>,
}

fn visible(bar: ProgressBar) -> ProgressBar {
    if console::Term::stdout().is_term() && !crate::output::is_quiet() {
        bar
    } else {
        ProgressBar::hidden()
    }
}

impl ProgressManager {
    pub fn new() -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let mp = MultiProgress::new();

        let scanning = visible(mp.add(ProgressBar::new_spinner().with_message("Scanning source tree")));
        let resolving = visible(mp.add(ProgressBar::new(0).with_message("Resolving scopes")));
        let emitting = visible(mp.add(ProgressBar::new(0).with_message("Writing headers")));

        let bars = Bars {
            scanning: scanning.clone(),
            resolving: resolving.clone(),
            emitting: emitting.clone(),
        };

        let handle = thread::spawn(move || {
            for msg in rx {
                match msg {
                    ProgressMessage::Started {
                        phase: ProgressPhase::Scanning,
                        total: _,
                    } => {
                        bars.get(ProgressPhase::Scanning).enable_steady_tick(Duration::from_millis(100));
                    }
                    ProgressMessage::Started { phase, total } => {
                        bars.get(phase).set_length(total as u64);
                    }
                    ProgressMessage::Progress { phase, item } => {
                        let bar = bars.get(phase);
                        bar.inc(1);
                        if let Some(ref item) = item {
                            bar.set_message(item.clone());
                        }
                    }
                    ProgressMessage::Finished { phase } => {
                        bars.get(phase).finish_with_message("Done");
                    }
                    ProgressMessage::Error(item) => {
                        tracing::debug!("failed: {}", item);
                    }
                }
            }
        });

        (
            Self {
                mp,
                scanning,
                resolving,
                emitting,
                handle: Some(handle),
            },
            tx,
        )
    }

    pub fn clear(&self) {
        self.scanning.finish_and_clear();
        self.resolving.finish_and_clear();
        self.emitting.finish_and_clear();
        self.mp.clear().ok();
    }

    fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
        self.clear();
    }

    /// Wait for the progress thread; every sender must already be dropped
    pub fn join(mut self) {
        self.wait();
    }

    /// Join the progress thread, then print the run summary
    pub fn finish_with_summary(mut self, duration: Duration, directories: usize, scopes: usize, failed: usize) {
        self.wait();
        if crate::output::is_quiet() {
            return;
        }
        println!();
        let icon = if failed == 0 { Icons::CHECK } else { Icons::CROSS };
        let style = theme().outcome(failed);
        println!(
            "{} {}",
            icon.style(style.clone()),
            format!("Complete in {}", HumanDuration(duration)).style(style)
        );
        println!(
            "  {} {}  {} {}  {} {}",
            Icons::FOLDER.style(theme().accent.clone()),
            directories,
            Icons::PACKAGE.style(theme().accent.clone()),
            scopes,
            Icons::CROSS.style(theme().accent.clone()),
            failed
        );
    }
}
