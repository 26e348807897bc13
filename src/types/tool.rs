//! Built-in tool descriptors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a built-in tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    Chat,
    Image,
    Flow,
    Data,
    Notebook,
    Research,
}

impl ToolId {
    pub const ALL: [ToolId; 6] = [
        ToolId::Chat,
        ToolId::Image,
        ToolId::Flow,
        ToolId::Data,
        ToolId::Notebook,
        ToolId::Research,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Image => "image",
            Self::Flow => "flow",
            Self::Data => "data",
            Self::Notebook => "notebook",
            Self::Research => "research",
        }
    }

    pub fn descriptor(&self) -> &'static Tool {
        // TOOLS is declared in ALL order
        let index = Self::ALL.iter().position(|id| id == self).unwrap_or(0);
        &TOOLS[index]
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown tool: {}", s))
    }
}

/// Static configuration of one tool panel
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: ToolId,
    pub name: &'static str,
    pub model: &'static str,
    pub system_prompt: &'static str,
    pub placeholder: &'static str,
    pub accent: &'static str,
}

pub static TOOLS: [Tool; 6] = [
    Tool {
        id: ToolId::Chat,
        name: "General Assistant",
        model: "gemini-3-flash-preview",
        system_prompt: "You are a general-purpose assistant. Answer concisely. \
                        End with three follow-up questions ///Q1|Q2|Q3",
        placeholder: "What can I help you with?",
        accent: "blue",
    },
    Tool {
        id: ToolId::Image,
        name: "Image Studio",
        model: "gemini-3-pro-image-preview",
        system_prompt: "You are a text-to-image interface. 1. Distill an English image prompt. \
                        2. URL-encode it. \
                        3. Output: ![Img](https://image.pollinations.ai/prompt/{Prompt}?nologo=true) \
                        /// Refine the style | Adjust the composition | Make a variation",
        placeholder: "Describe a scene to draw...",
        accent: "pink",
    },
    Tool {
        id: ToolId::Flow,
        name: "Flowchart Designer",
        model: "gemini-3-pro-preview",
        system_prompt: "You are a flowchart expert. Use Mermaid syntax, always wrapped in \
                        ```mermaid ... ```. \
                        /// Optimize the flow | Turn it into a sequence diagram | Export as SVG",
        placeholder: "Describe a process and I will chart it...",
        accent: "orange",
    },
    Tool {
        id: ToolId::Data,
        name: "Data Tables",
        model: "gemini-3-flash-preview",
        system_prompt: "You are a data analyst. Organize the data as a Markdown table. \
                        Right-align numeric columns (---:). \
                        /// Visualize it | Export to Excel | Analyze further",
        placeholder: "Paste data to tabulate...",
        accent: "green",
    },
    Tool {
        id: ToolId::Notebook,
        name: "Multimodal Analysis",
        model: "gemini-3-pro-preview",
        system_prompt: "You are an analysis assistant. Read the uploaded files carefully. \
                        /// Explain the code | Summarize the document | Extract key points",
        placeholder: "Drop code, PDFs or images...",
        accent: "emerald",
    },
    Tool {
        id: ToolId::Research,
        name: "Deep Reasoning",
        model: "gemini-3-flash-preview",
        system_prompt: "You are a deep reasoning expert. Think step by step. \
                        /// Follow-up 1 | Follow-up 2 | Follow-up 3",
        placeholder: "A problem that needs careful reasoning...",
        accent: "indigo",
    },
];

pub fn tools() -> &'static [Tool] {
    &TOOLS
}
