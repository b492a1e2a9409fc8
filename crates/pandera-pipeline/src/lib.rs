//! pandera-pipeline — Parameterized compute request pipeline.
//! Turns a constraint-driven form into a compute request:
//!   - Default date windows per computation kind
//!   - Slider offset <-> calendar date mapping
//!   - Constraint form rendering and input handling
//!   - Request lifecycle orchestration through the relay
//!   - Visualization payload decoding

pub mod window;
pub mod slider;
pub mod selection;
pub mod form;
pub mod payload;
pub mod render;
pub mod relay;
pub mod progress;
pub mod orchestrator;
pub mod session;

pub use form::{ControlDescriptor, FormError, FormInput};
pub use orchestrator::{LifecycleSnapshot, LifecycleState, Orchestrator, SubmissionId, FAILURE_MESSAGE};
pub use payload::{ComputeParameters, PayloadError, RequestPayload};
pub use relay::{HttpRelayClient, RelayClient, RelayError};
pub use render::{DecodeError, DisplayPanel, PlotSpec};
pub use selection::SelectionMap;
pub use session::FormSession;
pub use slider::SliderDateMapper;
pub use window::{derive_window, Clock, DateWindow, FixedClock, SystemClock};
