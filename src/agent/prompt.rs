//! System prompt template for the agent.

use crate::tools::ToolRegistry;

/// Build the system prompt with tool definitions.
pub fn build_system_prompt(tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful AI assistant with access to computational and visualization functions.
Your goal is to help users accomplish their tasks in the most natural way possible.

## Your Capabilities

You have access to the following tools:
{tool_descriptions}

## Rules and Guidelines

1. **Use your tools** - When a question can be answered by calculating, rendering, or analyzing, call the matching tool instead of guessing.

2. **Combine tools when useful** - You can call several tools to accomplish one task, for example computing statistics and then rendering a plot.

3. **Be proactive** - If someone asks about numbers, consider calculating averages or generating sequences; if they are interested in visuals, create plots or gradients; if they mention text, analyze its statistics.

4. **Report artifact paths** - When a tool stores an image or file, tell the user where it was saved.

5. **Recover from failures** - If a tool call returns an error, adjust the arguments and retry, or explain the problem conversationally.

Keep the conversation natural; answer in plain text once the task is done."#,
        tool_descriptions = tool_descriptions
    )
}
