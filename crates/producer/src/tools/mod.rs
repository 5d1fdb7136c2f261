//! A set of built-in tools that models can use to work on a project.
//!
//! Every tool answers with a compact JSON object. Tools that change the
//! project include `"success": true` and a human-readable `message`.

macro_rules! define_tool {
    {
        $(#[doc = $doc:expr])*
        $tool:ident {
            name: $name:literal,
            description: $description:literal,
            input: $input:ty,
            execute: $execute:path $(,)?
        }
    } => {
        $(#[doc = $doc])*
        pub struct $tool {
            parameter_schema: ::serde_json::Value,
        }

        impl $tool {
            #[doc = concat!("Creates a new `", $name, "` tool.")]
            #[inline]
            pub fn new() -> Self {
                Self {
                    parameter_schema: ::schemars::schema_for!($input)
                        .to_value(),
                }
            }
        }

        impl Default for $tool {
            #[inline]
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::producer_core::tool::Tool for $tool {
            type Input = $input;

            fn name(&self) -> &str {
                $name
            }

            fn description(&self) -> &str {
                $description
            }

            fn parameter_schema(&self) -> &::serde_json::Value {
                &self.parameter_schema
            }

            fn execute(
                &self,
                host: &mut dyn ::producer_core::host::HostAdapter,
                input: $input,
            ) -> ::producer_core::tool::ToolResult {
                $execute(host, input)
            }
        }
    };
}

mod notes;
mod project;
mod samples;
mod tempo;
mod tracks;

use producer_core::host::{HostAdapter, HostError, TrackKind};
use producer_core::tool::{Error as ToolError, Registry};
use schemars::JsonSchema;
use serde::Deserialize;

pub use notes::{AddNotesTool, ClearTrackNotesTool, GetTrackNotesTool};
pub use project::{GetProjectInfoTool, PlayProjectTool, StopProjectTool};
pub use samples::{GetSampleCategoriesTool, ListSamplesTool};
pub use tempo::{GetTempoTool, SetTempoTool};
pub use tracks::{
    AddInstrumentTrackTool, AddSampleTrackTool, ListTracksTool,
    RemoveTrackTool, SetTrackMutedTool, SetTrackNameTool,
};

/// Input of the tools that take no parameters.
#[derive(Deserialize, JsonSchema)]
pub struct NoParameters {}

/// Creates a registry holding every built-in tool.
pub fn builtin_tools() -> Registry {
    let mut registry = Registry::new();
    registry.register(GetTempoTool::new());
    registry.register(SetTempoTool::new());
    registry.register(ListTracksTool::new());
    registry.register(AddInstrumentTrackTool::new());
    registry.register(AddSampleTrackTool::new());
    registry.register(SetTrackNameTool::new());
    registry.register(SetTrackMutedTool::new());
    registry.register(RemoveTrackTool::new());
    registry.register(ListSamplesTool::new());
    registry.register(GetSampleCategoriesTool::new());
    registry.register(AddNotesTool::new());
    registry.register(GetTrackNotesTool::new());
    registry.register(ClearTrackNotesTool::new());
    registry.register(GetProjectInfoTool::new());
    registry.register(PlayProjectTool::new());
    registry.register(StopProjectTool::new());
    registry
}

/// Converts a model-supplied track index, which may be negative.
fn track_index(index: i64) -> Result<usize, ToolError> {
    usize::try_from(index).map_err(|_| {
        ToolError::invalid_input()
            .with_reason(format!("Invalid track index: {index}"))
    })
}

/// Fails unless `index` names an instrument track, and returns its name.
fn instrument_track_name(
    host: &dyn HostAdapter,
    index: usize,
) -> Result<String, ToolError> {
    let track = host
        .list_tracks()
        .into_iter()
        .nth(index)
        .ok_or(HostError::InvalidTrackIndex(index))?;
    if track.kind != TrackKind::Instrument {
        return Err(HostError::NotInstrumentTrack.into());
    }
    Ok(track.name)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::host::MemoryProject;

    #[test]
    fn test_builtin_tools() {
        let registry = builtin_tools();
        assert_eq!(registry.len(), 16);
        for tool in registry.describe_all() {
            assert_eq!(tool.parameters["type"], "object", "{}", tool.name);
            assert!(!tool.description.is_empty());
        }
    }

    #[test]
    fn test_track_index() {
        assert_eq!(track_index(3).unwrap(), 3);
        assert_eq!(
            track_index(-1).unwrap_err().to_string(),
            "Invalid track index: -1"
        );

        let registry = builtin_tools();
        let mut host = MemoryProject::new();
        let args = json!({"track_index": 4, "name": "x"});
        let err = registry
            .execute("set_track_name", args, &mut host)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid track index: 4");
    }
}
