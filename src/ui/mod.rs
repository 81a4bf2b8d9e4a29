pub mod icons;
pub mod output;
pub mod progress;
pub mod progress_message;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{diagnostic, file_new, file_unchanged, header, info, section, status, success, summary_row};
pub use progress::ProgressManager;
pub use progress_message::{ProgressMessage, ProgressPhase};
pub use table::{scope_table, stats_table, survey_table, TableBuilder};
pub use theme::{theme, Theme};
