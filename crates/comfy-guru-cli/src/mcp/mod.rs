pub mod server;
pub mod tools;

pub use server::{ComfyGuruServer, run_server};
pub use tools::{
    FindErrorsArgs, FindWorkflowArgs, GpuWarningsArgs, TailLogArgs, ToolError, errors_payload,
    matches_payload, tail_payload, warnings_payload,
};
