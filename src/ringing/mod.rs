pub mod coordinator;
pub mod model;
pub mod registry;
pub mod view;

pub use coordinator::{ModuleEvent, RingingCoordinator, RingingFlag, UiCommand};
pub use model::{
    RingRequest, RingingAction, RingingActions, RingingEntry, TimerType, ToolDetails, ToolId,
    ToolKind,
};
