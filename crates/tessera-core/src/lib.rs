//! Core model for tessera blueprints.
//!
//! Refs and their expression engine, the task graph, and the workflow and
//! agent types that synthesis turns into a manifest. Nothing here does I/O.

pub mod agent;
pub mod config;
pub mod enums;
pub mod env;
pub mod error;
pub mod expr;
pub mod refs;
pub mod task;
pub mod value;
pub mod workflow;

pub use agent::{Agent, McpServer, McpTransport, Skill};
pub use config::{
    CallActivityConfig, CatchBlock, Condition, ForConfig, ForkBranch, ForkConfig, GrpcCallConfig,
    HttpCallConfig, ListenConfig, RaiseConfig, RunConfig, SetConfig, SwitchCase, SwitchConfig,
    TaskConfig, TryConfig, WaitConfig,
};
pub use enums::{HttpMethod, TaskKind};
pub use env::EnvVar;
pub use error::{EncodeError, RefError, TaskError};
pub use expr::{BinaryOp, Expr, Leaf, RuntimeSource, UnaryOp, VarRef};
pub use refs::{BoolRef, IntRef, ObjectRef, Ref, RefCore, RefState, StringRef, ValueRef};
pub use task::{Flow, Task, EXPORT_ALL};
pub use value::ConfigValue;
pub use workflow::Workflow;
