pub mod connectivity;
pub mod wizard;
pub mod submission;
pub mod queue;
pub mod reconciler;

pub use connectivity::{ConnectivityMonitor, ConnectivityTransition, ReachabilityProbe, TcpProbe};
pub use wizard::{BookingWizard, WizardSnapshot};
pub use submission::{BookingSubmitter, SubmitOutcome};
pub use queue::{MemoryQueueStore, PendingQueue};
pub use reconciler::{ReconcileOutcome, ReconcileReport, Reconciler, StopReason};
