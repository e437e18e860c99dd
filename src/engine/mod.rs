//! Attribution and ledger engine.
//!
//! Components, leaves first: the link registry resolves slugs, the click
//! recorder admits hits, the attribution tracker matches conversions to
//! clicks within their window, and the commission ledger appends the
//! immutable money trail. The reconciler repairs projection counters
//! from ledger rows.

pub mod attribution;
pub mod ledger;
pub mod reconcile;
pub mod recorder;
pub mod registry;

pub use attribution::{AttributionError, AttributionTracker};
pub use ledger::CommissionLedger;
pub use reconcile::{ReconcileReport, Reconciler};
pub use recorder::{ClickRecorder, RecordError};
pub use registry::{CreatedLink, LinkRegistry, RegistryError};
