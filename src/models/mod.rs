mod notification;
mod profile;
mod project;
mod state;
mod user;

pub use notification::{NewNotification, Notification};
pub use profile::{AuditStatus, InvestorProfile, Region, SavedStartup, StartupProfile};
pub use project::{NewProject, Project, ProjectStatus, ProjectVisibility};
pub use state::AppState;
pub use user::{Role, User};
pub(crate) use user::USER_COLUMNS;
