//! Tool infrastructure — catalog, fixed hospital tool set, dispatch.

pub mod catalog;
pub mod dispatcher;
pub mod hospital;

pub use catalog::{ColumnDef, ColumnType, ParamDef, ParamType, ToolCatalog, ToolDefinition};
pub use dispatcher::{Dispatcher, ToolCallRequest, ToolCallResult};
