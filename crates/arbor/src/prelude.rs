//! Commonly used types.
//!
//! ```
//! use arbor::prelude::*;
//! ```

pub use crate::error::{ModelError, ModelResult};
pub use crate::model::{ModelEvent, ModelPolicy, TreeModel, TreeModelBuilder};
pub use arbor_core::{EventBus, NodeId, Observer, SubscriptionId, Tree, TreeDebug, TreeError};
