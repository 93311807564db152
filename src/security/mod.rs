//! Risk classification and gating for model-proposed actions.
//!
//! Leaf validators (`path`, `url`, `command`, `sanitize`) are pure and
//! deterministic; `gate` is the single place a verdict meets the user.

pub mod command;
pub mod gate;
pub mod path;
pub mod sanitize;
pub mod url;

pub use command::{classify, RiskLevel, RiskVerdict};
pub use gate::{authorize, confirm_mutation, ConfirmPrompt, GateDecision, InteractivePrompt};
pub use path::check_path;
pub use sanitize::sanitize_for_log;
pub use url::check_url;
