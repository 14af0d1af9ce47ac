pub mod clock;
pub mod draft;
pub mod error;
pub mod record;
pub mod remote;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use draft::{BookingDraft, DraftField, HourSlot, WizardStep};
pub use error::{BookingError, BookingResult};
pub use record::PendingBookingRecord;
pub use remote::{BookingAcceptance, BookingApi, RemoteError};
pub use storage::{QueueStore, StoreError, DEFAULT_QUEUE_KEY};
