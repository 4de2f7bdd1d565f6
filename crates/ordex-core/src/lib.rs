pub mod codec;
pub mod error;
pub mod export;
pub mod filter;
pub mod normalize;
pub mod record;
pub mod state;
pub mod steplog;
pub mod table;
pub mod transport;

pub use error::{AuthFailure, Error, Result};
pub use record::{OrderField, OrderRecord};
pub use state::AppState;
pub use steplog::{StepEntry, StepLog, StepStatus};
pub use transport::{FormMethod, FormSubmission, Page, Transport};
