//! pandera-relay — Store-and-forward relay in front of the compute service.
//! Accepts `{parameters, graphType}` from the models page and forwards it
//! unmodified downstream, returning the downstream body verbatim.

pub mod router;
pub mod handlers;
pub mod state;
