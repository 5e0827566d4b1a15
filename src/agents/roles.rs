//! Stage roles
//!
//! Each pipeline stage is played by one role. The role fixes the prompt
//! wording, whether the search tool is offered, and the sampling settings.

use crate::llm::GenerationParams;
use crate::search::tool::TOOL_NAME;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageRole {
    Researcher,
    InsightsExpert,
    Writer,
    Editor,
}

impl std::fmt::Display for StageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageRole::Researcher => write!(f, "researcher"),
            StageRole::InsightsExpert => write!(f, "insights_expert"),
            StageRole::Writer => write!(f, "writer"),
            StageRole::Editor => write!(f, "editor"),
        }
    }
}

impl StageRole {
    /// Pipeline order
    pub const ALL: [StageRole; 4] = [
        StageRole::Researcher,
        StageRole::InsightsExpert,
        StageRole::Writer,
        StageRole::Editor,
    ];

    /// Name of the stage this role performs, as reported in failures
    pub fn stage_name(&self) -> &'static str {
        match self {
            StageRole::Researcher => "research",
            StageRole::InsightsExpert => "insights",
            StageRole::Writer => "draft",
            StageRole::Editor => "edit",
        }
    }

    /// Whether the model may call the search tool during this stage
    pub fn uses_search_tool(&self) -> bool {
        matches!(self, StageRole::Researcher | StageRole::InsightsExpert)
    }

    pub fn generation_params(&self) -> GenerationParams {
        if self.uses_search_tool() {
            GenerationParams::factual()
        } else {
            GenerationParams::default()
        }
    }

    pub fn role_description(&self) -> &'static str {
        match self {
            StageRole::Researcher => {
                "You are an AI Researcher tracking the latest advancements and trends in AI, \
                 machine learning, and deep learning."
            }
            StageRole::InsightsExpert => {
                "You are an AI Insights Expert with deep knowledge of the field of AI."
            }
            StageRole::Writer => {
                "You are a Newsletter Content Creator with expertise in writing about AI technologies."
            }
            StageRole::Editor => "You are a meticulous Newsletter Editor for AI content.",
        }
    }

    pub fn core_instructions(&self) -> String {
        match self {
            StageRole::Researcher => format!(
                "Analyze the search results you are given and provide comprehensive research with reliable sources. \
                 You may call the {TOOL_NAME} tool when you need more specific or more recent information; \
                 include the exact search queries you used and summarize the most relevant findings."
            ),
            StageRole::InsightsExpert => format!(
                "Verify and expand upon the research provided, then give detailed analysis on the significance, \
                 applications, and future potential of each development. \
                 You may call the {TOOL_NAME} tool to check or extend a claim with a specific query."
            ),
            StageRole::Writer => "Transform the insights you are given into engaging and reader-friendly newsletter content. \
                 Make complex topics accessible for a diverse audience, highlighting the innovation, relevance, \
                 and potential impact of each development."
                .to_string(),
            StageRole::Editor => "Proofread, refine, and structure the newsletter so it is ready for publication. \
                 Ensure clarity, eliminate errors, enhance readability, and keep a professional yet accessible tone. \
                 Improve flow and make sure key insights stand out."
                .to_string(),
        }
    }

    pub fn output_instructions(&self) -> &'static str {
        match self {
            StageRole::Researcher => {
                "1. Organize your findings into clear sections with source links.\n\
                 2. Highlight the potential impact of each development.\n\
                 3. List any search queries you ran."
            }
            StageRole::InsightsExpert => {
                "1. Organize your analysis into clear sections.\n\
                 2. Include potential industry implications and future directions.\n\
                 3. Keep the source links from the research."
            }
            StageRole::Writer => {
                "Write in a professional yet engaging tone. Structure the content with clear headings \
                 and concise paragraphs."
            }
            StageRole::Editor => {
                "Include valid website URLs to reliable sources for the advancements discussed. \
                 Format the newsletter with proper headings, bullet points, and paragraph spacing. \
                 Ensure all technical terms are adequately explained for the target audience."
            }
        }
    }
}
