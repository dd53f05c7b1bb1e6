use super::registry::{ToolContext, ToolHandler, ToolRegistry};
use crate::core::analysis::{self, DEFAULT_BINS};
use crate::core::mcp::types::Tool;
use crate::error::{AnalysisError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct DescribeColumnArgs {
    csv_path: String,
    column: String,
}

#[derive(Debug, Deserialize)]
struct PlotHistogramArgs {
    csv_path: String,
    column: String,
    #[serde(default = "default_bins")]
    bins: usize,
}

#[derive(Debug, Deserialize)]
struct ModelArgs {
    csv_path: String,
    x_columns: Vec<String>,
    y_column: String,
}

fn default_bins() -> usize {
    DEFAULT_BINS
}

/// Register the data analysis tools, in listing order
pub fn register(registry: &mut ToolRegistry) {
    for definition in get_data_analysis_tools() {
        let handler: ToolHandler = match definition.name.as_str() {
            "describe_column" => handle_describe_column,
            "plot_histogram" => handle_plot_histogram,
            "model" => handle_model,
            _ => continue,
        };
        registry.register(definition, handler);
    }
}

/// Get data analysis tools for the MCP tools list
pub fn get_data_analysis_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "describe_column".to_string(),
            description: "Get summary statistics (count, mean, std, min, max, etc.) for a specific column in a CSV file."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "csv_path": {
                        "type": "string",
                        "description": "The file path to the CSV file"
                    },
                    "column": {
                        "type": "string",
                        "description": "The name of the column to compute statistics for"
                    }
                },
                "required": ["csv_path", "column"]
            }),
        },
        Tool {
            name: "plot_histogram".to_string(),
            description: "Generate and save a density histogram for a specific column in a CSV file. Returns the path of the saved image."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "csv_path": {
                        "type": "string",
                        "description": "The file path to the CSV file"
                    },
                    "column": {
                        "type": "string",
                        "description": "The name of the column to visualize"
                    },
                    "bins": {
                        "type": "integer",
                        "minimum": 1,
                        "default": DEFAULT_BINS,
                        "description": "Number of histogram bins"
                    }
                },
                "required": ["csv_path", "column"]
            }),
        },
        Tool {
            name: "model".to_string(),
            description: "Automatically train a model (classification or regression) based on the target column type and report its held-out score."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "csv_path": {
                        "type": "string",
                        "description": "Path to CSV file"
                    },
                    "x_columns": {
                        "type": "array",
                        "items": {"type": "string"},
                        "minItems": 1,
                        "description": "List of feature column names"
                    },
                    "y_column": {
                        "type": "string",
                        "description": "Target column name"
                    }
                },
                "required": ["csv_path", "x_columns", "y_column"]
            }),
        },
    ]
}

fn handle_describe_column(_context: &ToolContext, arguments: Value) -> Result<Value> {
    let args: DescribeColumnArgs = parse_args("describe_column", arguments)?;
    let summary = analysis::describe_column(&args.csv_path, &args.column)?;
    to_json(&summary)
}

fn handle_plot_histogram(context: &ToolContext, arguments: Value) -> Result<Value> {
    let args: PlotHistogramArgs = parse_args("plot_histogram", arguments)?;
    let path = analysis::plot_histogram(
        &args.csv_path,
        &args.column,
        args.bins,
        context.output_dir.as_deref(),
    )?;
    Ok(Value::String(path.to_string_lossy().into_owned()))
}

fn handle_model(_context: &ToolContext, arguments: Value) -> Result<Value> {
    let args: ModelArgs = parse_args("model", arguments)?;
    let report = analysis::model(&args.csv_path, &args.x_columns, &args.y_column)?;
    to_json(&report)
}

fn parse_args<T: DeserializeOwned>(tool_name: &str, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| {
        AnalysisError::invalid_argument(format!("Invalid arguments for {}: {}", tool_name, e))
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
