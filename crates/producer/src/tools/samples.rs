use producer_core::host::{HostAdapter, SampleQuery};
use producer_core::tool::{ToolResult, to_payload};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::NoParameters;

const DEFAULT_LIMIT: usize = 20;

#[derive(Deserialize, JsonSchema)]
pub struct ListSamplesParameters {
    #[schemars(description = "Category to filter by \
                              (e.g., 'drums', 'bass', 'percussion')")]
    category: Option<String>,
    #[schemars(description = "Search term to filter sample names")]
    search: Option<String>,
    #[schemars(description = "Maximum number of samples to return \
                              (default 20)")]
    limit: Option<usize>,
}

define_tool! {
    /// Searches the sample library.
    ListSamplesTool {
        name: "list_samples",
        description: "List available audio samples, optionally filtered by \
                      category or search term",
        input: ListSamplesParameters,
        execute: list_samples,
    }
}

define_tool! {
    /// Lists the sample folders.
    GetSampleCategoriesTool {
        name: "get_sample_categories",
        description: "Get a list of available sample categories/folders",
        input: NoParameters,
        execute: get_sample_categories,
    }
}

fn list_samples(
    host: &mut dyn HostAdapter,
    input: ListSamplesParameters,
) -> ToolResult {
    let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
    let query = SampleQuery {
        category: non_empty(input.category),
        search: non_empty(input.search),
        limit: input.limit.unwrap_or(DEFAULT_LIMIT),
    };
    let samples = host.list_samples(&query);

    let mut result = json!({
        "samples": samples,
        "count": samples.len(),
    });
    if samples.len() >= query.limit {
        result["note"] = json!(format!(
            "Results limited to {}. Use filters to narrow down.",
            query.limit
        ));
    }
    to_payload(&result)
}

fn get_sample_categories(
    host: &mut dyn HostAdapter,
    _: NoParameters,
) -> ToolResult {
    let categories = host.list_sample_categories();
    to_payload(&json!({
        "count": categories.len(),
        "categories": categories,
    }))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use producer_core::tool::Tool;
    use serde_json::Value;
    use tempfile::TempDir;

    use super::*;
    use crate::host::{MemoryProject, SampleLibrary};

    fn library() -> (TempDir, MemoryProject) {
        let dir = TempDir::new().unwrap();
        for path in ["drums/kick.wav", "drums/snare.ogg", "bass/sub.flac"] {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"").unwrap();
        }
        let library = SampleLibrary::new([dir.path()]);
        (dir, MemoryProject::new().with_samples(library))
    }

    fn run(host: &mut MemoryProject, args: ListSamplesParameters) -> Value {
        let result = ListSamplesTool::new().execute(host, args).unwrap();
        serde_json::from_str(&result).unwrap()
    }

    #[test]
    fn test_list_samples() {
        let (_dir, mut host) = library();

        let result = run(
            &mut host,
            ListSamplesParameters {
                category: Some("drums".to_owned()),
                search: Some("KICK".to_owned()),
                limit: None,
            },
        );
        assert_eq!(result["count"], 1);
        assert_eq!(result["samples"][0]["name"], "kick.wav");
        assert_eq!(result["samples"][0]["category"], "drums");
        assert!(result.get("note").is_none());

        let result = run(
            &mut host,
            ListSamplesParameters {
                category: Some(String::new()),
                search: None,
                limit: Some(2),
            },
        );
        assert_eq!(result["count"], 2);
        assert_eq!(
            result["note"],
            "Results limited to 2. Use filters to narrow down."
        );
    }

    #[test]
    fn test_sample_categories() {
        let (_dir, mut host) = library();
        let result = GetSampleCategoriesTool::new()
            .execute(&mut host, NoParameters {})
            .unwrap();
        let result: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(result["count"], 2);
        let names = result["categories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|category| category["name"].as_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(names, ["bass", "drums"]);
    }
}
